use std::sync::Arc;

use crate::body::AppBody;
use crate::environ::Environ;
use crate::error::HandlerError;
use crate::response::StartResponse;

/// The request-processing contract being bridged.
///
/// A handler is called once per request with the freshly built environment
/// and the start-response callback, and returns its body sequence. It must
/// declare status and headers via [`StartResponse::start`] before the
/// bridge finishes draining that sequence.
///
/// Handlers must be `Send + Sync`: the embedding host is declared
/// multithreaded and one handler instance serves every request.
///
/// Plain functions and closures with the matching signature are handlers:
///
/// ```rust
/// use gatelink::{AppBody, Environ, HandlerError, StartResponse};
///
/// fn ping(_environ: &mut Environ, start: StartResponse) -> Result<AppBody, HandlerError> {
///     start.start("200 OK", [("Content-Type", "text/plain")]);
///     Ok(AppBody::new("Pong!"))
/// }
/// ```
pub trait Handler: Send + Sync {
    /// Process one request.
    fn call(
        &self,
        environ: &mut Environ,
        start_response: StartResponse,
    ) -> Result<AppBody, HandlerError>;
}

impl<F> Handler for F
where
    F: Fn(&mut Environ, StartResponse) -> Result<AppBody, HandlerError> + Send + Sync,
{
    fn call(
        &self,
        environ: &mut Environ,
        start_response: StartResponse,
    ) -> Result<AppBody, HandlerError> {
        (self)(environ, start_response)
    }
}

impl std::fmt::Debug for dyn Handler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Handler")
    }
}

impl<T: Handler + ?Sized> Handler for Arc<T> {
    fn call(
        &self,
        environ: &mut Environ,
        start_response: StartResponse,
    ) -> Result<AppBody, HandlerError> {
        self.as_ref().call(environ, start_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environ::HostRequest;
    use crate::response::ResponseCell;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn call_direct(handler: &dyn Handler) -> Result<AppBody, HandlerError> {
        let mut environ = Environ::from_host(HostRequest::new()).unwrap();
        let cell = Rc::new(RefCell::new(ResponseCell::default()));
        handler.call(&mut environ, StartResponse::new(cell))
    }

    /// Tests that a closure with the handler signature satisfies the trait.
    #[test]
    fn test_closure_is_handler() {
        let handler = |_environ: &mut Environ,
                       start: StartResponse|
         -> Result<AppBody, HandlerError> {
            start.start("204 No Content", std::iter::empty::<(&str, &str)>());
            Ok(AppBody::empty())
        };

        let body = call_direct(&handler).unwrap();
        assert_eq!(body.count(), 0);
    }

    /// Tests that a shared Arc'd handler still satisfies the trait.
    #[test]
    fn test_arc_is_handler() {
        fn app(
            _environ: &mut Environ,
            start: StartResponse,
        ) -> Result<AppBody, HandlerError> {
            start.start("200 OK", [("Content-Type", "text/plain")]);
            Ok(AppBody::new("shared"))
        }

        let handler: Arc<dyn Handler> = Arc::new(app);
        let chunks: Vec<_> = call_direct(&handler)
            .unwrap()
            .map(|chunk| chunk.unwrap())
            .collect();
        assert_eq!(&chunks[0][..], b"shared");
    }
}
