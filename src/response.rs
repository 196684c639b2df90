use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use bytes::{Bytes, BytesMut};

/// Ordered response header pairs, exactly as the handler declared them.
pub type Headers = Vec<(String, String)>;

/// Shared per-request output state: the two-slot status/headers cell and
/// the single accumulation buffer that both drained chunks and sink writes
/// feed. One is allocated per request and never shared across requests.
#[derive(Default)]
pub(crate) struct ResponseCell {
    status_headers: Option<(String, Headers)>,
    buffer: BytesMut,
}

impl ResponseCell {
    pub(crate) fn append(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Split the cell into its final pieces. `None` status means the
    /// handler never called start_response.
    pub(crate) fn finish(&mut self) -> (Option<(String, Headers)>, Bytes) {
        let status_headers = self.status_headers.take();
        let body = std::mem::take(&mut self.buffer).freeze();
        (status_headers, body)
    }
}

/// The callback handle the bridge passes to the handler.
///
/// The handler must call [`start`](StartResponse::start) before (or while)
/// producing its body to declare the response status and headers. Calling
/// it again overwrites the previous declaration; the last call wins.
///
/// ```rust
/// use gatelink::{AppBody, Environ, HandlerError, StartResponse};
///
/// fn app(_environ: &mut Environ, start: StartResponse) -> Result<AppBody, HandlerError> {
///     start.start("200 OK", [("Content-Type", "text/plain")]);
///     Ok(AppBody::new("Pong!"))
/// }
/// ```
pub struct StartResponse {
    cell: Rc<RefCell<ResponseCell>>,
}

impl StartResponse {
    pub(crate) fn new(cell: Rc<RefCell<ResponseCell>>) -> StartResponse {
        StartResponse { cell }
    }

    /// Declare the response status line and headers, and obtain a writable
    /// sink for streaming body bytes.
    ///
    /// Bytes written to the sink and chunks returned from the handler feed
    /// the same buffer, in the order the handler itself interleaves writes
    /// and yields.
    pub fn start<K, V>(
        &self,
        status: impl Into<String>,
        headers: impl IntoIterator<Item = (K, V)>,
    ) -> BodyWriter
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.start_with_context::<K, V>(status, headers, None)
    }

    /// Like [`start`](StartResponse::start), with the convention's optional
    /// error-context argument. The context is recorded in the server log;
    /// it never alters how the response is collected.
    pub fn start_with_context<K, V>(
        &self,
        status: impl Into<String>,
        headers: impl IntoIterator<Item = (K, V)>,
        context: Option<&str>,
    ) -> BodyWriter
    where
        K: Into<String>,
        V: Into<String>,
    {
        if let Some(context) = context {
            log::warn!("start_response called with error context: {}", context);
        }

        let headers = headers
            .into_iter()
            .map(|(name, value)| (name.into(), value.into()))
            .collect();
        self.cell.borrow_mut().status_headers = Some((status.into(), headers));

        BodyWriter {
            cell: self.cell.clone(),
        }
    }
}

/// The writable byte sink returned by [`StartResponse::start`].
///
/// Writing appends to the response's accumulation buffer; flushing is a
/// no-op since the buffer lives in memory until the request completes.
pub struct BodyWriter {
    cell: Rc<RefCell<ResponseCell>>,
}

impl io::Write for BodyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.cell.borrow_mut().append(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// The completed response handed back to the host: a status string, the
/// ordered header pairs, and one concatenated body buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgedResponse {
    pub status: String,
    pub headers: Headers,
    pub body: Bytes,
}

impl BridgedResponse {
    /// Decompose into the three-tuple the host transmits.
    pub fn into_parts(self) -> (String, Headers, Bytes) {
        (self.status, self.headers, self.body)
    }
}
