//! # Reactive dispatcher over a single tracked resource.
//!
//! - [`EventSource`] / [`Subscription`]: the remote event stream boundary.
//! - [`Notification`], [`NotificationKind`], [`Object`]: what the stream delivers.
//! - [`Hooks`]: per-tag reaction callbacks plus a skip predicate.
//! - [`Watcher`]: the event loop, stopped via [`StopHandle`] or upstream cancellation.

mod hooks;
mod notification;
mod source;
mod watcher;

pub use hooks::{HookFn, Hooks, SkipFn};
pub use notification::{Notification, NotificationKind, Object};
pub use source::{EventSource, Subscription};
pub use watcher::{Exit, StopHandle, Watcher};
