use std::cell::RefCell;
use std::rc::Rc;

use crate::body::AppBody;
use crate::environ::Environ;
use crate::error::{BridgeError, Result};
use crate::handler::Handler;
use crate::response::{BridgedResponse, ResponseCell, StartResponse};

/// Invoke the handler against a built environment and collect its response.
///
/// The handler is called with the environment and a fresh start-response
/// handle; its returned body sequence is drained to exhaustion into the
/// accumulation buffer. The sequence's release hook runs exactly once
/// after draining, whether draining completed or faulted; faults are
/// propagated to the caller only after the handshake.
///
/// By the time draining completes the handler must have called
/// start_response at least once; otherwise this is a contract violation
/// reported as [`BridgeError::ResponseNotStarted`].
pub(crate) fn invoke(handler: &dyn Handler, environ: &mut Environ) -> Result<BridgedResponse> {
    let cell = Rc::new(RefCell::new(ResponseCell::default()));

    let mut body = handler
        .call(environ, StartResponse::new(cell.clone()))
        .map_err(BridgeError::Handler)?;

    let drained = drain(&mut body, &cell);
    body.release_now();
    drained?;

    let (status_headers, body) = cell.borrow_mut().finish();
    let (status, headers) = status_headers.ok_or(BridgeError::ResponseNotStarted)?;

    Ok(BridgedResponse {
        status,
        headers,
        body,
    })
}

fn drain(body: &mut AppBody, cell: &Rc<RefCell<ResponseCell>>) -> Result<()> {
    // The handler's lazy chunks may themselves write through a BodyWriter
    // holding this cell; the borrow is scoped to the append so the two
    // never overlap.
    for chunk in body.by_ref() {
        let chunk = chunk?;
        cell.borrow_mut().append(&chunk);
    }
    Ok(())
}
