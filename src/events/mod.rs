//! Lifecycle events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Watcher::run`, `Tail::attach`/`Tail::stop`, reader tasks,
//!   `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: `SubscriberSet::listen` (fans out to user subscribers).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
