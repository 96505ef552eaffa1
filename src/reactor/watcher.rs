//! # Watcher: reactive dispatcher over one event subscription.
//!
//! Consumes the notifications of a single tracked resource and invokes the reaction hook bound
//! to each notification tag, until the caller stops it, the upstream token is cancelled or a
//! hook rejects a state.
//!
//! ## Architecture
//! ```text
//! EventSource::subscribe ──► Subscription
//!                                │ next()
//!                                ▼
//! loop select! (biased) {
//!   ├─► StopSignal fired   → subscription.stop() → Ok(Exit::Stopped)
//!   ├─► ctx cancelled      → subscription.stop() → Ok(Exit::Cancelled)
//!   └─► notification
//!         ├─ no payload / foreign kind → drop, continue
//!         ├─ skip predicate true       → continue
//!         ├─ hook Ok / no hook         → continue
//!         ├─ hook Err                  → subscription.stop() → Err(Failure{state, Hook})
//!         └─ stream ended              → subscription.stop() → Err(Failure{last, SubscriptionClosed})
//! }
//! ```
//!
//! ## Rules
//! - Notifications are processed strictly in delivery order, one at a time.
//! - A fired signal wins over a notification that is ready at the same time.
//! - Every terminal path releases the subscription exactly once.
//! - Stop and cancellation are normal exits, not errors.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Selector;
use crate::core::StopSignal;
use crate::error::{Failure, HookError, WatchError};
use crate::events::{Bus, Event, EventKind};
use crate::reactor::{EventSource, Hooks, Notification, NotificationKind, Object, Subscription};

/// Why the loop ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// The local stop signal fired.
    Stopped,
    /// The upstream token was cancelled.
    Cancelled,
}

/// Clonable handle that stops a running [`Watcher`] from another task.
#[derive(Clone, Debug)]
pub struct StopHandle(Arc<StopSignal>);

impl StopHandle {
    /// Stops the watcher; returns `false` if it was already stopped.
    pub fn stop(&self) -> bool {
        self.0.fire()
    }

    /// Returns `true` once a stop was requested.
    pub fn is_stopped(&self) -> bool {
        self.0.is_fired()
    }
}

/// Event loop reacting to state changes of one tracked resource.
pub struct Watcher<S> {
    ctx: CancellationToken,
    stop: Arc<StopSignal>,
    namespace: Arc<str>,
    subscription: Option<Box<dyn Subscription<S>>>,
    hooks: Hooks<S>,
    bus: Option<Bus>,
}

impl<S: Send + 'static> Watcher<S> {
    /// Opens the subscription and returns a watcher ready to [`run`](Self::run).
    ///
    /// Fails with [`WatchError::SubscriptionOpen`] before any loop starts.
    pub async fn new<E>(
        ctx: CancellationToken,
        source: &E,
        namespace: &str,
        selector: &Selector,
    ) -> Result<Self, WatchError>
    where
        E: EventSource<S> + ?Sized,
    {
        let subscription = source.subscribe(namespace, selector).await?;
        Ok(Self::from_subscription(ctx, namespace, subscription))
    }

    /// Wraps an already opened subscription.
    pub fn from_subscription(
        ctx: CancellationToken,
        namespace: &str,
        subscription: Box<dyn Subscription<S>>,
    ) -> Self {
        Self {
            ctx,
            stop: Arc::new(StopSignal::new()),
            namespace: namespace.into(),
            subscription: Some(subscription),
            hooks: Hooks::default(),
            bus: None,
        }
    }

    /// Sets the skip predicate; `true` suppresses dispatch for that state.
    pub fn with_skip_fn(mut self, f: impl Fn(&S) -> bool + Send + 'static) -> Self {
        self.hooks.skip = Some(Box::new(f));
        self
    }

    /// Sets the hook executed on `Added` notifications.
    pub fn with_on_added_fn(
        mut self,
        f: impl FnMut(&S) -> Result<(), HookError> + Send + 'static,
    ) -> Self {
        self.hooks.on_added = Some(Box::new(f));
        self
    }

    /// Sets the hook executed on `Modified` notifications.
    pub fn with_on_modified_fn(
        mut self,
        f: impl FnMut(&S) -> Result<(), HookError> + Send + 'static,
    ) -> Self {
        self.hooks.on_modified = Some(Box::new(f));
        self
    }

    /// Sets the hook executed on `Deleted` notifications.
    pub fn with_on_deleted_fn(
        mut self,
        f: impl FnMut(&S) -> Result<(), HookError> + Send + 'static,
    ) -> Self {
        self.hooks.on_deleted = Some(Box::new(f));
        self
    }

    /// Publishes lifecycle events to `bus`.
    pub fn with_bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Returns a handle that stops the loop from another task.
    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Arc::clone(&self.stop))
    }

    /// Stops the loop. Safe to call any number of times.
    pub fn stop(&self) {
        self.stop.fire();
    }

    /// Runs the event loop until stop, cancellation, hook failure or end of stream.
    ///
    /// Returns `Ok(Exit)` for stop and cancellation (no state, no error), and a [`Failure`]
    /// carrying the last observed state otherwise. A second call returns
    /// [`WatchError::Finished`].
    #[tracing::instrument(name = "watch", skip_all, fields(namespace = %self.namespace))]
    pub async fn run(&mut self) -> Result<Exit, Failure<S>> {
        let Some(mut sub) = self.subscription.take() else {
            return Err(Failure::new(None, WatchError::Finished));
        };
        self.publish(Event::new(EventKind::WatchStarted).with_namespace(self.namespace.clone()));

        let mut last: Option<S> = None;
        loop {
            let received = tokio::select! {
                biased;
                _ = self.stop.fired() => {
                    sub.stop();
                    info!("watch stopped by caller");
                    self.publish(Event::new(EventKind::WatchStopped).with_reason("stopped"));
                    return Ok(Exit::Stopped);
                }
                _ = self.ctx.cancelled() => {
                    sub.stop();
                    info!("watch cancelled");
                    self.publish(Event::new(EventKind::WatchStopped).with_reason("cancelled"));
                    return Ok(Exit::Cancelled);
                }
                n = sub.next() => n,
            };

            let Some(Notification { kind, object }) = received else {
                sub.stop();
                warn!("subscription closed by remote");
                self.publish(Event::new(EventKind::SubscriptionClosed));
                return Err(Failure::new(last, WatchError::SubscriptionClosed));
            };

            let state = match object {
                Some(Object::Tracked(state)) => state,
                Some(Object::Foreign { kind: other }) => {
                    debug!(notification = %kind, object_kind = %other, "dropping foreign object");
                    self.publish_dropped(kind, other);
                    continue;
                }
                None => {
                    self.publish_dropped(kind, "empty");
                    continue;
                }
            };

            if self.hooks.skips(&state) {
                self.publish(Event::new(EventKind::NotificationSkipped).with_notification(kind));
                last = Some(state);
                continue;
            }

            if let Err(e) = self.hooks.dispatch(kind, &state) {
                sub.stop();
                warn!(notification = %kind, error = %e, "reaction hook failed");
                self.publish(
                    Event::new(EventKind::HookFailed)
                        .with_notification(kind)
                        .with_reason(e.to_string()),
                );
                return Err(Failure::new(Some(state), e.into()));
            }
            last = Some(state);
        }
    }

    fn publish_dropped(&self, kind: NotificationKind, reason: impl Into<Arc<str>>) {
        self.publish(
            Event::new(EventKind::NotificationDropped)
                .with_notification(kind)
                .with_reason(reason),
        );
    }

    fn publish(&self, ev: Event) {
        if let Some(bus) = &self.bus {
            bus.publish(ev);
        }
    }
}
