//! # Reaction hooks bound to notification tags.

use crate::error::HookError;
use crate::reactor::NotificationKind;

/// Predicate evaluated before dispatch; `true` suppresses every hook for that notification.
pub type SkipFn<S> = Box<dyn Fn(&S) -> bool + Send>;

/// Callback invoked for one notification tag.
pub type HookFn<S> = Box<dyn FnMut(&S) -> Result<(), HookError> + Send>;

/// Optional per-tag callbacks plus an optional skip predicate.
pub struct Hooks<S> {
    pub(crate) skip: Option<SkipFn<S>>,
    pub(crate) on_added: Option<HookFn<S>>,
    pub(crate) on_modified: Option<HookFn<S>>,
    pub(crate) on_deleted: Option<HookFn<S>>,
}

impl<S> Default for Hooks<S> {
    fn default() -> Self {
        Self {
            skip: None,
            on_added: None,
            on_modified: None,
            on_deleted: None,
        }
    }
}

impl<S> Hooks<S> {
    /// Returns `true` if the skip predicate is set and rejects `state`.
    pub(crate) fn skips(&self, state: &S) -> bool {
        self.skip.as_ref().is_some_and(|skip| skip(state))
    }

    /// Runs the hook registered for `kind`; no hook means no-op.
    pub(crate) fn dispatch(&mut self, kind: NotificationKind, state: &S) -> Result<(), HookError> {
        let hook = match kind {
            NotificationKind::Added => self.on_added.as_mut(),
            NotificationKind::Modified => self.on_modified.as_mut(),
            NotificationKind::Deleted => self.on_deleted.as_mut(),
        };
        match hook {
            Some(f) => f(state),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_hook_is_noop() {
        let mut hooks: Hooks<u32> = Hooks::default();
        assert!(hooks.dispatch(NotificationKind::Deleted, &1).is_ok());
        assert!(!hooks.skips(&1));
    }

    #[test]
    fn dispatches_to_matching_tag_only() {
        let mut hooks: Hooks<u32> = Hooks {
            on_modified: Some(Box::new(|_| Err(HookError::fail("modified")))),
            ..Hooks::default()
        };
        assert!(hooks.dispatch(NotificationKind::Added, &1).is_ok());
        assert_eq!(
            hooks.dispatch(NotificationKind::Modified, &1),
            Err(HookError::fail("modified"))
        );
    }
}
