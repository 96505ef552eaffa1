//! # Log source attachment boundary.
//!
//! [`LogSource`] opens one named output stream of the tracked resource; [`LogStream`] is the
//! open, line-oriented read. [`LineStream`] adapts any [`AsyncBufRead`] into a [`LogStream`].
//!
//! Lines are split on `\n` (a trailing `\r` is dropped) and decoded lossily: bytes that are not
//! valid UTF-8 become `U+FFFD` instead of failing the stream.
//!
//! ## Rules
//! - `next_line()` must be cancel-safe: a reader drops a pending read when stop fires.
//! - `close()` releases the remote stream; it is called once, after the last read.

use std::fmt;
use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::error::TailError;

/// Identity of one log attachment: a container of a pod in a namespace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttachmentId {
    /// Namespace of the tracked pod.
    pub namespace: String,
    /// Tracked pod name.
    pub pod: String,
    /// Container (stream) name.
    pub container: String,
}

impl AttachmentId {
    /// Creates an attachment identity.
    pub fn new(
        namespace: impl Into<String>,
        pod: impl Into<String>,
        container: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            pod: pod.into(),
            container: container.into(),
        }
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.pod, self.container)
    }
}

/// An open log stream, exclusively owned by one reader task.
#[async_trait]
pub trait LogStream: Send {
    /// Reads the next complete line, without its terminator; `None` at end of stream.
    async fn next_line(&mut self) -> io::Result<Option<String>>;

    /// Releases the underlying stream.
    async fn close(&mut self) {}
}

/// Opens log streams.
#[async_trait]
pub trait LogSource: Send + Sync + 'static {
    /// Opens the stream identified by `id`.
    ///
    /// With `follow` the stream blocks for new lines instead of ending at the current end.
    /// Failure maps to [`TailError::AttachmentOpen`].
    async fn open(&self, id: &AttachmentId, follow: bool) -> Result<Box<dyn LogStream>, TailError>;
}

/// [`LogStream`] over any buffered async reader.
pub struct LineStream<R> {
    reader: Option<R>,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> LineStream<R> {
    /// Wraps `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            buf: Vec::new(),
        }
    }
}

#[async_trait]
impl<R> LogStream for LineStream<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_line(&mut self) -> io::Result<Option<String>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        // Partial bytes stay in `buf` if this read is dropped mid-line.
        let n = reader.read_until(b'\n', &mut self.buf).await?;
        if n == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Ok(Some(line))
    }

    async fn close(&mut self) {
        self.reader = None;
        self.buf.clear();
    }
}
