//! # Lifecycle events emitted by the watcher and the tail coordinator.
//!
//! The [`EventKind`] enum classifies event types across three categories:
//! - **Watch events**: subscription lifecycle and notification dispatch
//! - **Tail events**: log attachment lifecycle
//! - **Subscriber events**: fan-out health (overflow, panic)
//!
//! The [`Event`] struct carries metadata such as the container name, the notification kind
//! and a reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use podreactor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TailOpenFailed)
//!     .with_container("step-build")
//!     .with_reason("not found");
//!
//! assert_eq!(ev.kind, EventKind::TailOpenFailed);
//! assert_eq!(ev.container.as_deref(), Some("step-build"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::reactor::NotificationKind;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    // === Watch events ===
    /// Subscription opened; the loop is about to run.
    ///
    /// Sets:
    /// - `namespace`
    WatchStarted,

    /// Notification suppressed by the skip predicate.
    ///
    /// Sets:
    /// - `notification`: tag of the suppressed notification
    NotificationSkipped,

    /// Notification dropped (no payload or payload of another kind).
    ///
    /// Sets:
    /// - `notification`: tag
    /// - `reason`: "empty" or the foreign kind
    NotificationDropped,

    /// A reaction hook rejected the state; the loop ends.
    ///
    /// Sets:
    /// - `notification`: tag
    /// - `reason`: hook error message
    HookFailed,

    /// Loop ended by stop or cancellation; the subscription was released.
    ///
    /// Sets:
    /// - `reason`: "stopped" or "cancelled"
    WatchStopped,

    /// Remote side ended the event stream.
    SubscriptionClosed,

    // === Tail events ===
    /// Reader task spawned for an attachment.
    ///
    /// Sets:
    /// - `namespace`, `pod`, `container`
    TailAttached,

    /// Attach ignored because the attachment is already open.
    ///
    /// Sets:
    /// - `namespace`, `pod`, `container`
    TailDuplicate,

    /// The log stream could not be opened.
    ///
    /// Sets:
    /// - `namespace`, `pod`, `container`
    /// - `reason`: open error
    TailOpenFailed,

    /// Reader task finished (EOF, read error or stop).
    ///
    /// Sets:
    /// - `namespace`, `pod`, `container`
    /// - `reason`: "eof", "stopped" or the read error
    TailEnded,

    /// Coordinated shutdown requested for all attachments.
    TailStopRequested,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Namespace of the tracked resource.
    pub namespace: Option<Arc<str>>,
    /// Tracked pod name.
    pub pod: Option<Arc<str>>,
    /// Container (log stream) name.
    pub container: Option<Arc<str>>,
    /// Subscriber name, for subscriber events.
    pub subscriber: Option<&'static str>,
    /// Notification tag, for watch events.
    pub notification: Option<NotificationKind>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            namespace: None,
            pod: None,
            container: None,
            subscriber: None,
            notification: None,
            reason: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a namespace.
    #[inline]
    pub fn with_namespace(mut self, namespace: impl Into<Arc<str>>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Attaches a pod name.
    #[inline]
    pub fn with_pod(mut self, pod: impl Into<Arc<str>>) -> Self {
        self.pod = Some(pod.into());
        self
    }

    /// Attaches a container name.
    #[inline]
    pub fn with_container(mut self, container: impl Into<Arc<str>>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Attaches a subscriber name.
    #[inline]
    pub fn with_subscriber(mut self, subscriber: &'static str) -> Self {
        self.subscriber = Some(subscriber);
        self
    }

    /// Attaches a notification tag.
    #[inline]
    pub fn with_notification(mut self, kind: NotificationKind) -> Self {
        self.notification = Some(kind);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_subscriber(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_subscriber(subscriber)
            .with_reason(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seq_is_monotonic() {
        let a = Event::new(EventKind::TailAttached);
        let b = Event::new(EventKind::TailEnded);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn builders_set_fields() {
        let ev = Event::new(EventKind::HookFailed)
            .with_namespace("ns")
            .with_pod("pod-1")
            .with_notification(NotificationKind::Modified)
            .with_reason("boom");
        assert_eq!(ev.namespace.as_deref(), Some("ns"));
        assert_eq!(ev.pod.as_deref(), Some("pod-1"));
        assert_eq!(ev.notification, Some(NotificationKind::Modified));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
    }

    #[test]
    fn subscriber_events_keep_stream_fields_empty() {
        let ev = Event::subscriber_overflow("audit", "full");
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.subscriber, Some("audit"));
        assert_eq!(ev.container, None);
        assert_eq!(ev.reason.as_deref(), Some("full"));

        let ev = Event::subscriber_panicked("audit", "boom".into());
        assert_eq!(ev.subscriber, Some("audit"));
        assert_eq!(ev.container, None);
    }
}
