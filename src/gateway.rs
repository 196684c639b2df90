use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use bytes::Bytes;

use crate::bridge;
use crate::config::BridgeConfig;
use crate::environ::{Environ, HostRequest};
use crate::error::{BridgeError, Result, StartupResult};
use crate::handler::Handler;
use crate::registry::Registry;
use crate::response::BridgedResponse;

/// The host-facing side of the bridge.
///
/// One `Gateway` holds the resolved handler for the lifetime of the
/// process and is called once per request via
/// [`on_request`](Gateway::on_request), the sole host-facing operation.
/// Whatever happens inside, the host always gets a usable response back;
/// no handler fault ever escapes into the host's request loop.
///
/// ```rust
/// use gatelink::{AppBody, Environ, Gateway, HandlerError, HostRequest, StartResponse};
///
/// fn ping(_environ: &mut Environ, start: StartResponse) -> Result<AppBody, HandlerError> {
///     start.start("200 OK", [("Content-Type", "text/plain")]);
///     Ok(AppBody::new("Pong!"))
/// }
///
/// let gateway = Gateway::new(ping);
/// let response = gateway.on_request(HostRequest::new());
/// assert_eq!(response.status, "200 OK");
/// assert_eq!(&response.body[..], b"Pong!");
/// ```
pub struct Gateway {
    handler: Arc<dyn Handler>,
}

impl Gateway {
    /// Wrap a directly supplied handler.
    pub fn new(handler: impl Handler + 'static) -> Gateway {
        Gateway {
            handler: Arc::new(handler),
        }
    }

    /// Resolve the configured `"module.attribute"` path against the
    /// registry. Resolution happens once, at startup; a failure here is
    /// fatal to process startup, there is no request-time recovery.
    pub fn from_config(config: &BridgeConfig, registry: &Registry) -> StartupResult<Gateway> {
        let handler = registry.resolve(&config.handler)?;
        log::info!("gateway handler resolved: {}", config.handler);
        Ok(Gateway { handler })
    }

    /// Process one host request. Never fails and never panics outward:
    /// any fault on the bridging path (build fault, handler fault, drain
    /// fault, contract violation, even a handler panic) is logged with
    /// full detail and collapsed into a degraded plain-text response whose
    /// body carries only a short fault summary.
    pub fn on_request(&self, request: HostRequest) -> BridgedResponse {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.dispatch(request)));

        let fault = match outcome {
            Ok(Ok(response)) => return response,
            Ok(Err(fault)) => fault,
            Err(payload) => BridgeError::Panicked(panic_message(payload)),
        };

        log::error!("request failed at gateway boundary: {}", fault);
        degraded(&fault)
    }

    fn dispatch(&self, request: HostRequest) -> Result<BridgedResponse> {
        let mut environ = Environ::from_host(request)?;
        bridge::invoke(self.handler.as_ref(), &mut environ)
    }
}

/// The degraded response returned for any fault: a generic status, minimal
/// headers, and a short human-readable summary. Formatting only; this
/// must stay trivial enough that the boundary itself cannot fault.
fn degraded(fault: &BridgeError) -> BridgedResponse {
    BridgedResponse {
        status: "500 Internal Server Error".to_owned(),
        headers: vec![("Content-Type".to_owned(), "text/plain".to_owned())],
        body: Bytes::from(format!("Error: {} (see server log for details)", fault)),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "opaque panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::AppBody;
    use crate::error::HandlerError;
    use crate::response::StartResponse;
    use std::io::Read as _;
    // `super::*` re-imports the crate's 1-param `Result` alias; the handler
    // signatures below want the std 2-param `Result`.
    use std::result::Result;

    fn ping(
        _environ: &mut Environ,
        start: StartResponse,
    ) -> Result<AppBody, HandlerError> {
        start.start("200 OK", [("Content-Type", "text/plain")]);
        Ok(AppBody::new("Pong!"))
    }

    /// Tests the reference scenario: a ping handler with no request
    /// content produces exactly the declared triple.
    #[test]
    fn test_ping_scenario() {
        let gateway = Gateway::new(ping);
        let response = gateway.on_request(HostRequest::new());

        assert_eq!(response.status, "200 OK");
        assert_eq!(
            response.headers,
            vec![("Content-Type".to_owned(), "text/plain".to_owned())]
        );
        assert_eq!(&response.body[..], b"Pong!");
    }

    /// Tests that a handler reading the request buffer can echo it back.
    #[test]
    fn test_echo_request_content() {
        fn echo(
            environ: &mut Environ,
            start: StartResponse,
        ) -> Result<AppBody, HandlerError> {
            let mut content = Vec::new();
            environ.input().read_to_end(&mut content)?;
            start.start("200 OK", [("Content-Type", "application/octet-stream")]);
            Ok(AppBody::new(content))
        }

        let gateway = Gateway::new(echo);
        let response = gateway.on_request(HostRequest::new().content("round trip"));
        assert_eq!(&response.body[..], b"round trip");
    }

    /// Tests that a handler fault before start_response still yields a
    /// well-formed triple instead of propagating.
    #[test]
    fn test_fault_before_start_response() {
        fn failing(
            _environ: &mut Environ,
            _start: StartResponse,
        ) -> Result<AppBody, HandlerError> {
            Err("template engine exploded".into())
        }

        let gateway = Gateway::new(failing);
        let response = gateway.on_request(HostRequest::new());

        assert!(!response.status.is_empty());
        assert!(!response.headers.is_empty());
        assert!(!response.body.is_empty());
        let body = String::from_utf8(response.body.to_vec()).unwrap();
        assert!(body.contains("template engine exploded"));
        assert!(body.contains("see server log"));
    }

    /// Tests that a handler which never calls start_response gets a
    /// degraded response rather than a hang or crash.
    #[test]
    fn test_missing_start_response_degrades() {
        fn buggy(
            _environ: &mut Environ,
            _start: StartResponse,
        ) -> Result<AppBody, HandlerError> {
            Ok(AppBody::new("body without a status"))
        }

        let gateway = Gateway::new(buggy);
        let response = gateway.on_request(HostRequest::new());

        assert_eq!(response.status, "500 Internal Server Error");
        assert!(!response.body.is_empty());
    }

    /// Tests that a panicking handler is contained at the boundary and its
    /// message is preserved in the summary.
    #[test]
    fn test_panic_contained() {
        fn panicking(
            _environ: &mut Environ,
            _start: StartResponse,
        ) -> Result<AppBody, HandlerError> {
            panic!("index out of range");
        }

        let gateway = Gateway::new(panicking);
        let response = gateway.on_request(HostRequest::new());

        assert_eq!(response.status, "500 Internal Server Error");
        let body = String::from_utf8(response.body.to_vec()).unwrap();
        assert!(body.contains("index out of range"));
    }

    /// Tests that a malformed host request (content supplied both ways)
    /// surfaces through the boundary, not as an escaping fault.
    #[test]
    fn test_build_fault_degrades() {
        let gateway = Gateway::new(ping);
        let tmp = tempfile::tempfile().unwrap();
        let request = HostRequest::new().content("inline").content_fd(tmp.into());

        let response = gateway.on_request(request);
        assert_eq!(response.status, "500 Internal Server Error");
    }

    /// Tests idempotence: identical side-effect-free input through a pure
    /// handler yields byte-identical results.
    #[test]
    fn test_idempotent_for_pure_handler() {
        let gateway = Gateway::new(ping);

        let first = gateway.on_request(HostRequest::new().var("REQUEST_METHOD", "GET"));
        let second = gateway.on_request(HostRequest::new().var("REQUEST_METHOD", "GET"));
        assert_eq!(first, second);
    }

    /// Tests startup resolution through config and registry.
    #[test]
    fn test_from_config_resolution() {
        let mut registry = Registry::new();
        registry.register("hello", "ping_app", ping);

        let config = BridgeConfig {
            handler: "hello.ping_app".to_owned(),
        };
        let gateway = Gateway::from_config(&config, &registry).unwrap();
        assert_eq!(&gateway.on_request(HostRequest::new()).body[..], b"Pong!");

        let config = BridgeConfig {
            handler: "hello.missing".to_owned(),
        };
        assert!(Gateway::from_config(&config, &registry).is_err());
    }
}
