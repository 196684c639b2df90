use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Cursor, Read, Write};
use std::os::fd::OwnedFd;
use std::{fmt, mem};

use bytes::Bytes;

use crate::error::{BridgeError, Result};

/// Version marker of the bridged calling convention.
pub const PROTOCOL_VERSION: (u8, u8) = (1, 0);

/// The raw per-request fields the host hands to the bridge.
///
/// Request content may be supplied either as an in-memory byte value or as
/// a readable descriptor, never both. Everything else is pass-through
/// metadata the bridge forwards to the handler unvalidated.
///
/// ```rust
/// use gatelink::HostRequest;
///
/// let request = HostRequest::new()
///     .var("REQUEST_METHOD", "POST")
///     .var("CONTENT_LENGTH", "11")
///     .content("hello=world");
/// ```
#[derive(Debug, Default)]
pub struct HostRequest {
    content: Option<Bytes>,
    content_fd: Option<OwnedFd>,
    diagnostics: Option<ErrorSink>,
    vars: BTreeMap<String, String>,
}

impl HostRequest {
    /// Create an empty request; all fields are optional.
    pub fn new() -> HostRequest {
        HostRequest::default()
    }

    /// Attach a pass-through metadata field (method, query string, header).
    pub fn var(mut self, key: impl Into<String>, value: impl Into<String>) -> HostRequest {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Supply request content as an in-memory byte value.
    pub fn content(mut self, content: impl Into<Bytes>) -> HostRequest {
        self.content = Some(content.into());
        self
    }

    /// Supply request content as a readable descriptor. Ownership of the
    /// descriptor transfers to the bridge; it is closed when the request's
    /// environment is dropped.
    pub fn content_fd(mut self, fd: OwnedFd) -> HostRequest {
        self.content_fd = Some(fd);
        self
    }

    /// Bind the host's diagnostic stream. Defaults to stderr.
    pub fn diagnostics(mut self, sink: impl Write + Send + 'static) -> HostRequest {
        self.diagnostics = Some(ErrorSink::new(sink));
        self
    }
}

/// The handler-visible input stream, selected from the host's content
/// representation.
///
/// `Absent` is an explicit "no body supplied" sentinel, distinct from a
/// zero-length buffer: reading it never fails and yields no bytes, and
/// handlers that care can test [`RequestInput::is_absent`].
pub enum RequestInput {
    /// In-memory request content.
    Buffer(Cursor<Bytes>),
    /// Content read from a descriptor the host handed over.
    Descriptor(File),
    /// No content was supplied.
    Absent,
}

impl RequestInput {
    /// Whether the host supplied no content at all.
    pub fn is_absent(&self) -> bool {
        matches!(self, RequestInput::Absent)
    }
}

impl Read for RequestInput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            RequestInput::Buffer(cursor) => cursor.read(buf),
            RequestInput::Descriptor(file) => file.read(buf),
            RequestInput::Absent => Ok(0),
        }
    }
}

impl fmt::Debug for RequestInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestInput::Buffer(cursor) => {
                write!(f, "Buffer({} bytes)", cursor.get_ref().len())
            }
            RequestInput::Descriptor(file) => write!(f, "Descriptor({:?})", file),
            RequestInput::Absent => write!(f, "Absent"),
        }
    }
}

/// The diagnostic sink bound into each environment, the convention's
/// error-output channel. Handler diagnostics written here go to the host's
/// log stream, not into the response.
pub struct ErrorSink(Box<dyn Write + Send>);

impl ErrorSink {
    /// Wrap an arbitrary writer as the diagnostic sink.
    pub fn new(writer: impl Write + Send + 'static) -> ErrorSink {
        ErrorSink(Box::new(writer))
    }

    /// The default sink: the process's standard error stream.
    pub fn stderr() -> ErrorSink {
        ErrorSink(Box::new(io::stderr()))
    }
}

impl Default for ErrorSink {
    fn default() -> Self {
        ErrorSink::stderr()
    }
}

impl Write for ErrorSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl fmt::Debug for ErrorSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ErrorSink")
    }
}

/// The per-request environment passed to the handler: input stream,
/// diagnostic sink, declarative facts about the host, and the host's
/// pass-through metadata.
///
/// Built fresh for every request and owned exclusively by it.
#[derive(Debug)]
pub struct Environ {
    version: (u8, u8),
    multithread: bool,
    multiprocess: bool,
    run_once: bool,
    input: RequestInput,
    errors: ErrorSink,
    vars: BTreeMap<String, String>,
}

impl Environ {
    /// Build the environment from the host's raw request fields.
    ///
    /// Selects the input representation (buffer, descriptor, or the absent
    /// sentinel) and stamps the declarative facts: the host serves requests
    /// from multiple threads, runs as a single process, and is long-lived.
    ///
    /// The only build fault is a host that supplies content in both
    /// representations at once.
    pub fn from_host(request: HostRequest) -> Result<Environ> {
        let HostRequest {
            content,
            content_fd,
            diagnostics,
            vars,
        } = request;

        let input = match (content, content_fd) {
            (Some(_), Some(_)) => return Err(BridgeError::AmbiguousContent),
            (Some(bytes), None) => RequestInput::Buffer(Cursor::new(bytes)),
            (None, Some(fd)) => RequestInput::Descriptor(File::from(fd)),
            (None, None) => RequestInput::Absent,
        };

        Ok(Environ {
            version: PROTOCOL_VERSION,
            multithread: true,
            multiprocess: false,
            run_once: false,
            input,
            errors: diagnostics.unwrap_or_default(),
            vars,
        })
    }

    /// Protocol version marker.
    pub fn version(&self) -> (u8, u8) {
        self.version
    }

    /// Whether the host may invoke handlers from multiple threads.
    pub fn multithread(&self) -> bool {
        self.multithread
    }

    /// Whether the host runs handlers across multiple processes.
    pub fn multiprocess(&self) -> bool {
        self.multiprocess
    }

    /// Whether the host will only ever serve a single request.
    pub fn run_once(&self) -> bool {
        self.run_once
    }

    /// The request's input stream.
    pub fn input(&mut self) -> &mut RequestInput {
        &mut self.input
    }

    /// Take the input stream out of the environment, leaving the absent
    /// sentinel behind. Useful for handlers that hand the stream off.
    pub fn take_input(&mut self) -> RequestInput {
        mem::replace(&mut self.input, RequestInput::Absent)
    }

    /// Whether any request content was supplied.
    pub fn has_content(&self) -> bool {
        !self.input.is_absent()
    }

    /// The diagnostic sink.
    pub fn errors(&mut self) -> &mut ErrorSink {
        &mut self.errors
    }

    /// Look up a pass-through metadata field.
    pub fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Insert or replace a metadata field.
    pub fn set_var(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    /// All metadata fields, in sorted key order.
    pub fn vars(&self) -> impl Iterator<Item = (&str, &str)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
