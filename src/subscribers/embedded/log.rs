//! # LogWriter: lifecycle events rendered through `tracing`
//!
//! A minimal subscriber that forwards incoming [`Event`]s to the `tracing` macros.
//! Install a `tracing` subscriber (see [`logging::init`](crate::logging::init)) to see them.
//!
//! ## Example output
//! ```text
//! INFO watch started namespace="builds"
//! INFO tail attached pod="run-x-pod" container="step-build"
//! WARN tail open failed container="step-push" reason="container not ready"
//! INFO tail ended container="step-build" reason="eof"
//! INFO watch stopped reason="stopped"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let ns = e.namespace.as_deref().unwrap_or("");
        let pod = e.pod.as_deref().unwrap_or("");
        let container = e.container.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");
        let subscriber = e.subscriber.unwrap_or("");

        match e.kind {
            EventKind::WatchStarted => info!(namespace = ns, "watch started"),
            EventKind::NotificationSkipped => {
                debug!(notification = ?e.notification, "notification skipped")
            }
            EventKind::NotificationDropped => {
                debug!(notification = ?e.notification, reason, "notification dropped")
            }
            EventKind::HookFailed => {
                warn!(notification = ?e.notification, reason, "reaction hook failed")
            }
            EventKind::WatchStopped => info!(reason, "watch stopped"),
            EventKind::SubscriptionClosed => warn!("subscription closed by remote"),
            EventKind::TailAttached => info!(namespace = ns, pod, container, "tail attached"),
            EventKind::TailDuplicate => debug!(pod, container, "tail already attached"),
            EventKind::TailOpenFailed => warn!(pod, container, reason, "tail open failed"),
            EventKind::TailEnded => info!(pod, container, reason, "tail ended"),
            EventKind::TailStopRequested => info!("tail stop requested"),
            EventKind::SubscriberOverflow => {
                warn!(subscriber, reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                warn!(subscriber, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
