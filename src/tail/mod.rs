//! # Concurrent log tail streamer.
//!
//! - [`LogSource`] / [`LogStream`]: the log attachment boundary; [`LineStream`] adapts any
//!   `AsyncBufRead`.
//! - [`Sink`] and its implementations: where formatted lines and errors go.
//! - [`Tail`]: attaches streams on demand and shuts all of them down together.

mod coordinator;
mod reader;
mod sink;
mod source;

pub use coordinator::Tail;
pub use reader::ReaderExit;
pub use sink::{MemorySink, SharedSink, Sink, StderrSink, StdoutSink, WriterSink};
pub use source::{AttachmentId, LineStream, LogSource, LogStream};
