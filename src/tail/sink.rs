//! # Output sinks shared by reader tasks.
//!
//! Sinks are the only resources shared across readers; each implementation serializes writes
//! per line so lines from different attachments interleave but never tear.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

/// Line-oriented output shared across reader tasks.
pub trait Sink: Send + Sync {
    /// Writes `line` followed by a newline, atomically with respect to other writers.
    fn write_line(&self, line: &str) -> io::Result<()>;
}

/// Shared sink handle.
pub type SharedSink = Arc<dyn Sink>;

/// Process standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{line}")
    }
}

/// Process standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

impl Sink for StderrSink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        writeln!(io::stderr().lock(), "{line}")
    }
}

/// Any [`Write`] implementor behind a mutex.
pub struct WriterSink<W> {
    inner: Mutex<W>,
}

impl<W: Write + Send> WriterSink<W> {
    /// Wraps `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            inner: Mutex::new(writer),
        }
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.inner.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send> Sink for WriterSink<W> {
    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut w = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        writeln!(w, "{line}")?;
        w.flush()
    }
}

/// In-memory sink collecting lines, for callers that post-process output.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Sink for MemorySink {
    fn write_line(&self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writer_sink_appends_newlines() {
        let sink = WriterSink::new(Vec::new());
        sink.write_line("[build] a").unwrap();
        sink.write_line("[push] x").unwrap();
        assert_eq!(sink.into_inner(), b"[build] a\n[push] x\n");
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.write_line("one").unwrap();
        sink.write_line("two").unwrap();
        assert_eq!(sink.lines(), vec!["one", "two"]);
    }
}
