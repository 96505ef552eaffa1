//! # Notifications delivered by an event subscription.

use std::fmt;

/// Tag of a state-change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    /// The resource appeared (or was listed when the watch started).
    Added,
    /// The resource changed.
    Modified,
    /// The resource was removed.
    Deleted,
}

impl NotificationKind {
    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            NotificationKind::Added => "added",
            NotificationKind::Modified => "modified",
            NotificationKind::Deleted => "deleted",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Payload carried by a notification.
#[derive(Debug, Clone, PartialEq)]
pub enum Object<S> {
    /// A snapshot of the tracked resource.
    Tracked(S),
    /// An object of an unrelated kind interleaved in the stream.
    Foreign {
        /// Kind name reported by the source, for diagnostics.
        kind: String,
    },
}

/// One state-change event for the tracked resource.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification<S> {
    /// Notification tag.
    pub kind: NotificationKind,
    /// Payload, if the source attached one.
    pub object: Option<Object<S>>,
}

impl<S> Notification<S> {
    /// Notification carrying a snapshot of the tracked resource.
    pub fn tracked(kind: NotificationKind, state: S) -> Self {
        Self {
            kind,
            object: Some(Object::Tracked(state)),
        }
    }

    /// Shorthand for an `Added` notification.
    pub fn added(state: S) -> Self {
        Self::tracked(NotificationKind::Added, state)
    }

    /// Shorthand for a `Modified` notification.
    pub fn modified(state: S) -> Self {
        Self::tracked(NotificationKind::Modified, state)
    }

    /// Shorthand for a `Deleted` notification.
    pub fn deleted(state: S) -> Self {
        Self::tracked(NotificationKind::Deleted, state)
    }

    /// Notification without payload.
    pub fn empty(kind: NotificationKind) -> Self {
        Self { kind, object: None }
    }

    /// Notification carrying an object of another kind.
    pub fn foreign(kind: NotificationKind, object_kind: impl Into<String>) -> Self {
        Self {
            kind,
            object: Some(Object::Foreign {
                kind: object_kind.into(),
            }),
        }
    }
}
