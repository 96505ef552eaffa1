//! Error types used by the watcher, the tail coordinator and reaction hooks.
//!
//! This module defines:
//!
//! - [`WatchError`]: errors that end the watcher loop (or its construction).
//! - [`HookError`]: errors returned by user reaction hooks.
//! - [`Failure`]: a [`WatchError`] paired with the last observed resource state.
//! - [`TailError`]: per-attachment errors; never returned, only reported to the error sink.
//!
//! All enums provide `as_label` for logs and lifecycle events.

use std::fmt;

use thiserror::Error;

/// # Errors returned by a reaction hook.
///
/// Any hook error terminates the watcher loop immediately; hooks are never retried.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HookError {
    /// The observed state is a failure of the tracked resource itself.
    #[error("{error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The hook could not do its own work (e.g. a side effect failed).
    #[error("fatal hook error: {error}")]
    Fatal {
        /// The underlying error message.
        error: String,
    },
}

impl HookError {
    /// Shorthand for [`HookError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        HookError::Fail {
            error: error.into(),
        }
    }

    /// Shorthand for [`HookError::Fatal`].
    pub fn fatal(error: impl Into<String>) -> Self {
        HookError::Fatal {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use podreactor::HookError;
    ///
    /// assert_eq!(HookError::fail("pod failed").as_label(), "hook_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HookError::Fail { .. } => "hook_failed",
            HookError::Fatal { .. } => "hook_fatal",
        }
    }
}

/// # Errors produced by the watcher.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    /// The event subscription could not be opened; the loop never started.
    #[error("failed to open subscription: {error}")]
    SubscriptionOpen {
        /// The underlying error message.
        error: String,
    },

    /// The remote side ended the event stream while the loop was running.
    #[error("subscription closed by remote")]
    SubscriptionClosed,

    /// A reaction hook rejected the observed state.
    #[error(transparent)]
    Hook(#[from] HookError),

    /// `run` was called again after the loop reached a terminal state.
    #[error("watcher already finished")]
    Finished,
}

impl WatchError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    ///
    /// # Example
    /// ```
    /// use podreactor::WatchError;
    ///
    /// assert_eq!(WatchError::SubscriptionClosed.as_label(), "subscription_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            WatchError::SubscriptionOpen { .. } => "subscription_open",
            WatchError::SubscriptionClosed => "subscription_closed",
            WatchError::Hook(e) => e.as_label(),
            WatchError::Finished => "watcher_finished",
        }
    }
}

/// A terminal watcher error together with the last observed state, for diagnostics.
pub struct Failure<S> {
    /// Last state seen before the failure (`None` if nothing was observed).
    pub state: Option<S>,
    /// What went wrong.
    pub error: WatchError,
}

impl<S> Failure<S> {
    pub(crate) fn new(state: Option<S>, error: WatchError) -> Self {
        Self { state, error }
    }

    /// Drops the state and keeps the error.
    pub fn into_error(self) -> WatchError {
        self.error
    }
}

impl<S> fmt::Debug for Failure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("has_state", &self.state.is_some())
            .field("error", &self.error)
            .finish()
    }
}

impl<S> fmt::Display for Failure<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl<S> std::error::Error for Failure<S> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// # Errors of a single log attachment.
///
/// Isolated per reader task; they reach the error sink and the event bus only.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TailError {
    /// The log stream could not be opened.
    #[error("failed to open logs for container {container:?}: {error}")]
    AttachmentOpen {
        /// Container (stream) name.
        container: String,
        /// The underlying error message.
        error: String,
    },

    /// The log stream failed mid-read.
    #[error("error reading logs for container {container:?}: {error}")]
    Read {
        /// Container (stream) name.
        container: String,
        /// The underlying I/O error.
        #[source]
        error: std::io::Error,
    },
}

impl TailError {
    /// Returns a short stable label (snake_case) for use in logs/events.
    pub fn as_label(&self) -> &'static str {
        match self {
            TailError::AttachmentOpen { .. } => "attachment_open",
            TailError::Read { .. } => "stream_read",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hook_error_converts_into_watch_error() {
        let err: WatchError = HookError::fail("pod failed").into();
        assert_eq!(err.as_label(), "hook_failed");
        assert_eq!(err.to_string(), "pod failed");
    }

    #[test]
    fn failure_displays_inner_error() {
        let f: Failure<u32> = Failure::new(Some(7), WatchError::SubscriptionClosed);
        assert_eq!(f.to_string(), "subscription closed by remote");
        assert_eq!(f.state, Some(7));
        assert_eq!(f.into_error(), WatchError::SubscriptionClosed);
    }

    #[test]
    fn tail_error_labels() {
        let open = TailError::AttachmentOpen {
            container: "step-build".into(),
            error: "not found".into(),
        };
        assert_eq!(open.as_label(), "attachment_open");
        assert!(open.to_string().contains("step-build"));
    }
}
