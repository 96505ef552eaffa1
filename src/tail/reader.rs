//! # Reader: one task per log attachment.
//!
//! ```text
//! select! (biased) { stop fired → Stopped, open() → stream | error → stderr, OpenFailed }
//! loop select! (biased) {
//!   ├─► stop fired      → drop pending read → Stopped
//!   └─► next_line()
//!         ├─ Some(line) → stdout "[display] line"
//!         ├─ None       → Eof
//!         └─ Err        → stderr, ReadFailed
//! }
//! stream.close()  (every path that opened the stream)
//! ```

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::StopSignal;
use crate::error::TailError;
use crate::events::{Bus, Event, EventKind};
use crate::tail::{AttachmentId, LogSource, SharedSink};

/// How a reader task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderExit {
    /// The remote side closed the stream.
    Eof,
    /// The coordinator asked every reader to stop.
    Stopped,
    /// The stream could not be opened.
    OpenFailed,
    /// The stream failed mid-read.
    ReadFailed,
}

impl ReaderExit {
    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            ReaderExit::Eof => "eof",
            ReaderExit::Stopped => "stopped",
            ReaderExit::OpenFailed => "open_failed",
            ReaderExit::ReadFailed => "read_failed",
        }
    }
}

/// Everything one reader task owns.
pub(crate) struct Reader {
    pub(crate) id: AttachmentId,
    pub(crate) display: String,
    pub(crate) follow: bool,
    pub(crate) source: Arc<dyn LogSource>,
    pub(crate) stdout: SharedSink,
    pub(crate) stderr: SharedSink,
    pub(crate) stop: Arc<StopSignal>,
    pub(crate) bus: Option<Bus>,
}

impl Reader {
    /// Streams the attachment until EOF, error or stop.
    pub(crate) async fn run(self) -> ReaderExit {
        let opened = tokio::select! {
            biased;
            _ = self.stop.fired() => return self.ended(ReaderExit::Stopped, None),
            r = self.source.open(&self.id, self.follow) => r,
        };

        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => {
                warn!(attachment = %self.id, error = %e, "failed to open log stream");
                self.report(&e);
                self.publish(
                    Event::new(EventKind::TailOpenFailed)
                        .with_namespace(self.id.namespace.as_str())
                        .with_pod(self.id.pod.as_str())
                        .with_container(self.id.container.as_str())
                        .with_reason(e.to_string()),
                );
                return ReaderExit::OpenFailed;
            }
        };

        let mut read_error = None;
        let exit = loop {
            let next = tokio::select! {
                biased;
                _ = self.stop.fired() => break ReaderExit::Stopped,
                n = stream.next_line() => n,
            };
            match next {
                Ok(Some(line)) => {
                    let formatted = format!("[{}] {}", self.display, line);
                    if let Err(e) = self.stdout.write_line(&formatted) {
                        debug!(attachment = %self.id, error = %e, "output sink rejected line");
                    }
                }
                Ok(None) => break ReaderExit::Eof,
                Err(error) => {
                    let e = TailError::Read {
                        container: self.id.container.clone(),
                        error,
                    };
                    self.report(&e);
                    read_error = Some(e.to_string());
                    break ReaderExit::ReadFailed;
                }
            }
        };

        stream.close().await;
        self.ended(exit, read_error)
    }

    fn ended(&self, exit: ReaderExit, error: Option<String>) -> ReaderExit {
        debug!(attachment = %self.id, exit = exit.as_label(), "log stream ended");
        self.publish(
            Event::new(EventKind::TailEnded)
                .with_namespace(self.id.namespace.as_str())
                .with_pod(self.id.pod.as_str())
                .with_container(self.id.container.as_str())
                .with_reason(error.unwrap_or_else(|| exit.as_label().to_string())),
        );
        exit
    }

    fn report(&self, e: &TailError) {
        if let Err(io) = self.stderr.write_line(&e.to_string()) {
            debug!(attachment = %self.id, error = %io, "error sink rejected line");
        }
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev);
        }
    }
}
