use core::fmt;
use std::io;
use std::vec;

pub use bytes::Bytes;

/// The body sequence a handler returns: a finite, non-restartable sequence
/// of byte chunks, optionally carrying a release hook for resources the
/// sequence holds open (a file, a connection).
///
/// Two shapes are supported transparently. A fully materialized body:
///
/// ```rust
/// # use gatelink::AppBody;
/// let body = AppBody::from_chunks(["Hello ", "world!"]);
/// ```
///
/// And an incrementally produced one, e.g. streamed out of an implementor
/// of [`io::Read`]:
///
/// ```no_run
/// # use gatelink::AppBody;
/// use std::fs::File;
///
/// let file = File::open("index.html").unwrap();
/// let body = AppBody::from_reader(file);
/// ```
///
/// The bridge drains the sequence to exhaustion and then invokes the
/// release hook, if any, exactly once on every exit path, including a
/// fault partway through draining.
pub struct AppBody {
    chunks: Chunks,
    release: Option<Box<dyn FnOnce()>>,
}

enum Chunks {
    Full(vec::IntoIter<Bytes>),
    Lazy(Box<dyn Iterator<Item = io::Result<Bytes>>>),
}

impl AppBody {
    /// Create a single-chunk body from a string or bytes.
    ///
    /// ```rust
    /// # use gatelink::AppBody;
    /// let string = AppBody::new("Hello world!");
    /// let bytes = AppBody::new(vec![0, 1, 0, 1, 0]);
    /// ```
    pub fn new(data: impl Into<Bytes>) -> AppBody {
        AppBody::from_chunks([data.into()])
    }

    /// Create an empty body.
    pub fn empty() -> AppBody {
        AppBody::from_chunks(std::iter::empty::<Bytes>())
    }

    /// Create a fully materialized body from a sequence of chunks.
    pub fn from_chunks<I>(chunks: I) -> AppBody
    where
        I: IntoIterator,
        I::Item: Into<Bytes>,
    {
        let chunks: Vec<Bytes> = chunks.into_iter().map(Into::into).collect();
        AppBody {
            chunks: Chunks::Full(chunks.into_iter()),
            release: None,
        }
    }

    /// Create a lazily produced body. Chunks are pulled from the iterator
    /// one at a time while the bridge drains; a chunk error aborts the
    /// drain (the release hook still runs).
    pub fn from_iter<I>(iter: I) -> AppBody
    where
        I: Iterator<Item = io::Result<Bytes>> + 'static,
    {
        AppBody {
            chunks: Chunks::Lazy(Box::new(iter)),
            release: None,
        }
    }

    /// Create a body streamed from an implementor of [`io::Read`].
    ///
    /// The reader is consumed in chunks of up to 4kb. Handlers serving
    /// files typically pair this with a release hook:
    ///
    /// ```no_run
    /// # use gatelink::AppBody;
    /// # use std::fs::File;
    /// let file = File::open("report.csv").unwrap();
    /// let body = AppBody::from_reader(file)
    ///     .with_release(|| log::debug!("report.csv streamed out"));
    /// ```
    pub fn from_reader<R>(reader: R) -> AppBody
    where
        R: io::Read + 'static,
    {
        AppBody::from_iter(ReaderChunks::new(reader))
    }

    /// Attach a release hook to this body. The bridge invokes it exactly
    /// once after draining, whether draining completed or faulted.
    pub fn with_release(mut self, hook: impl FnOnce() + 'static) -> AppBody {
        self.release = Some(Box::new(hook));
        self
    }

    /// Fire the release hook, if one is still pending. Idempotent: the
    /// hook is taken out of the body on first call.
    pub(crate) fn release_now(&mut self) {
        if let Some(hook) = self.release.take() {
            hook();
        }
    }
}

impl<T> From<T> for AppBody
where
    Bytes: From<T>,
{
    fn from(data: T) -> AppBody {
        AppBody::new(data)
    }
}

impl Iterator for AppBody {
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.chunks {
            Chunks::Full(chunks) => chunks.next().map(Ok),
            Chunks::Lazy(chunks) => chunks.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.chunks {
            Chunks::Full(chunks) => chunks.size_hint(),
            Chunks::Lazy(_) => (0, None),
        }
    }
}

impl Drop for AppBody {
    /// Backstop for the release guarantee: if the bridge's explicit
    /// handshake never ran (an unwind mid-drain), the hook fires here.
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for AppBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shape = match &self.chunks {
            Chunks::Full(chunks) => format!("Full({} chunks)", chunks.len()),
            Chunks::Lazy(_) => "Lazy".to_owned(),
        };
        f.debug_struct("AppBody")
            .field("chunks", &shape)
            .field("release", &self.release.is_some())
            .finish()
    }
}

impl Default for AppBody {
    fn default() -> Self {
        Self::empty()
    }
}

/// An adapter that converts a [`io::Read`] into a chunk iterator.
///
/// Used internally by [`AppBody::from_reader`]. Reads data in chunks of
/// [`CAP`] bytes and yields them as [`Bytes`]; the reader is dropped as
/// soon as it returns end-of-input or an error.
struct ReaderChunks<R> {
    reader: Option<R>,
    buf: Vec<u8>,
}

/// Default capacity for reader buffer chunks.
const CAP: usize = 4096;

impl<R> ReaderChunks<R> {
    fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            buf: vec![0; CAP],
        }
    }
}

impl<R> Iterator for ReaderChunks<R>
where
    R: io::Read,
{
    type Item = io::Result<Bytes>;

    fn next(&mut self) -> Option<Self::Item> {
        let ReaderChunks { reader, buf } = self;

        let reader = match reader {
            Some(reader) => reader,
            None => return None,
        };

        if buf.capacity() == 0 {
            buf.extend_from_slice(&[0; CAP]);
        }

        match reader.read(buf) {
            Err(err) => {
                self.reader.take();
                Some(Err(err))
            }
            Ok(0) => {
                self.reader.take();
                None
            }
            Ok(n) => {
                let remaining = buf.split_off(n);
                let chunk = std::mem::replace(buf, remaining);
                Some(Ok(Bytes::from(chunk)))
            }
        }
    }
}
