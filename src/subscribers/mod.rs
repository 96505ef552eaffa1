//! # Lifecycle event subscribers.
//!
//! ```text
//! Watcher / Tail ── publish(Event) ──► Bus ──► SubscriberSet::listen ──► Subscribe::on_event
//! ```
//!
//! - [`Subscribe`]: trait implemented by user subscribers (metrics, audit, UI).
//! - [`SubscriberSet`]: per-subscriber queues, workers and panic isolation.
//! - `LogWriter` (feature `logging`): renders events through `tracing`.

#[cfg(feature = "logging")]
mod embedded;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use embedded::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
