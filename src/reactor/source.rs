//! # Event subscription boundary.
//!
//! [`EventSource`] opens a server-pushed stream of notifications for the resources matching a
//! [`Selector`] in a namespace; [`Subscription`] is the open stream.
//!
//! ## Rules
//! - `next()` must be cancel-safe: the watcher drops a pending `next()` when a signal fires.
//! - `stop()` releases server-side watch state; calling it twice must be harmless.
//! - `next()` returning `None` means the remote side ended the stream.

use async_trait::async_trait;

use crate::config::Selector;
use crate::error::WatchError;
use crate::reactor::Notification;

/// An open stream of notifications, exclusively owned by one watcher.
#[async_trait]
pub trait Subscription<S>: Send {
    /// Waits for the next notification; `None` once the stream ended.
    async fn next(&mut self) -> Option<Notification<S>>;

    /// Releases the subscription.
    fn stop(&mut self);
}

/// Opens subscriptions for a resource type `S`.
#[async_trait]
pub trait EventSource<S>: Send + Sync {
    /// Opens a subscription for resources matching `selector` in `namespace`.
    ///
    /// Failure maps to [`WatchError::SubscriptionOpen`].
    async fn subscribe(
        &self,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Box<dyn Subscription<S>>, WatchError>;
}
