use std::io;
use thiserror::Error;

/// Fault raised by a handler. Handlers are application code outside this
/// crate, so their error type is an opaque boxed error.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Represents faults that can occur on the per-request bridging path.
///
/// None of these escape to the host: every variant is collapsed into a
/// degraded response at the [`Gateway`](crate::Gateway) boundary.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Error when the host supplies request content both as an in-memory
    /// buffer and as a descriptor; the two representations are mutually
    /// exclusive
    #[error("request content supplied both as buffer and as descriptor")]
    AmbiguousContent,

    /// Fault raised by the handler while it was being invoked
    #[error("handler failed: {0}")]
    Handler(#[source] HandlerError),

    /// Fault raised while draining a chunk from the handler's body sequence
    #[error("body chunk failed: {0}")]
    Chunk(#[from] io::Error),

    /// Error when the handler returned its body without ever declaring a
    /// status and headers
    #[error("handler returned without calling start_response")]
    ResponseNotStarted,

    /// Error when the handler panicked; the payload message is preserved
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Represents errors that can occur while resolving the configured handler
/// at process startup. These are fatal: there is no request-time recovery.
#[derive(Debug, Error)]
pub enum StartupError {
    /// Error loading or deserializing the bridge configuration
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Error when the configured handler path is not in the two-part
    /// dotted form
    #[error("handler path {0:?} is not in the form \"module.attribute\"")]
    MalformedPath(String),

    /// Error when no module with the given name was registered
    #[error("no registered module named {0:?}")]
    UnknownModule(String),

    /// Error when the module exists but has no such attribute
    #[error("module {module:?} has no attribute {attribute:?}")]
    UnknownAttribute { module: String, attribute: String },
}

/// Type alias for Results on the per-request bridging path
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Type alias for Results during startup handler resolution
pub type StartupResult<T> = std::result::Result<T, StartupError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    /// Tests the conversion and formatting of BridgeError with IO errors
    #[test]
    fn test_bridge_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::Other, "test error");
        let bridge_err = BridgeError::from(io_err);

        assert!(matches!(bridge_err, BridgeError::Chunk(_)));
        assert_eq!(bridge_err.to_string(), "body chunk failed: test error");
    }

    /// Tests that handler faults preserve the underlying message
    #[test]
    fn test_handler_fault_display() {
        let source: HandlerError = "database unreachable".into();
        let bridge_err = BridgeError::Handler(source);

        assert_eq!(
            bridge_err.to_string(),
            "handler failed: database unreachable"
        );
    }

    /// Tests the formatting of startup resolution errors
    #[test]
    fn test_startup_error_display() {
        let err = StartupError::UnknownAttribute {
            module: "hello".to_owned(),
            attribute: "pong_app".to_owned(),
        };
        assert_eq!(
            err.to_string(),
            "module \"hello\" has no attribute \"pong_app\""
        );

        let err = StartupError::MalformedPath("hello".to_owned());
        assert!(err.to_string().contains("module.attribute"));
    }
}
