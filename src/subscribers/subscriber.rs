//! # Event subscriber trait.
//!
//! Provides [`Subscribe`] an extension point for plugging custom handlers into the lifecycle
//! event stream of a watcher or a tail coordinator.
//!
//! Each subscriber gets:
//! - **Dedicated worker task** (runs independently)
//! - **Per-subscriber bounded queue** (capacity via [`Subscribe::queue_capacity`])
//! - **Panic isolation** (panics are reported as `EventKind::SubscriberPanicked`)
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use podreactor::{Event, EventKind, Subscribe};
//!
//! struct FailedSteps;
//!
//! #[async_trait]
//! impl Subscribe for FailedSteps {
//!     async fn on_event(&self, ev: &Event) {
//!         if matches!(ev.kind, EventKind::TailOpenFailed) {
//!             // record the step whose logs were unavailable
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "failed-steps" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Lifecycle event subscriber.
///
/// ### Implementation requirements
/// - Use async I/O; avoid blocking the executor.
/// - Handle errors internally; do not panic.
/// - Slow processing affects only this subscriber's queue.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes a single event, in FIFO order per subscriber.
    async fn on_event(&self, event: &Event);

    /// Returns the subscriber name used in overflow/panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Returns the preferred queue capacity for this subscriber (clamped to min 1).
    ///
    /// Default: 1024.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
