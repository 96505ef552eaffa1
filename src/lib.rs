//! # podreactor
//!
//! **podreactor** provides the two async building blocks behind a build-run command-line
//! tool: a reactive watcher dispatching state changes of one tracked pod to user hooks,
//! and a tail coordinator streaming the logs of that pod's step containers concurrently.
//! Both share one shutdown protocol: an idempotent local stop plus an upstream
//! [`CancellationToken`](tokio_util::sync::CancellationToken).
//!
//! ## Architecture
//! ### Overview
//! ```text
//!            EventSource::subscribe                 LogSource::open
//!                   │                                     │
//!                   ▼                                     ▼
//! ┌──────────────────────────────────┐   ┌──────────────────────────────────┐
//! │  Watcher<S>                      │   │  Tail                            │
//! │  - skip predicate                │   │  - one reader task per container │
//! │  - on_added / on_modified /      │   │  - "[display] line" ─► stdout    │
//! │    on_deleted hooks              │──►│  - open/read errors ─► stderr    │
//! │  (hooks call Tail::attach/stop)  │   │                                  │
//! └──────┬───────────────────────────┘   └──────┬───────────────────────────┘
//!        │ StopHandle::stop / ctx.cancel        │ Tail::stop / ctx.cancel
//!        ▼                                      ▼
//!   StopSignal (once-latch + token)        StopSignal (once-latch + token)
//!        │                                      │
//!        └──────────── publish(Event) ──────────┘
//!                           ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                  Bus (broadcast channel, optional)                │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                     SubscriberSet::listen ──► Subscribe::on_event
//! ```
//!
//! ### Watch loop
//! ```text
//! loop select! (biased) {
//!   ├─► stop fired       ─► release subscription, Ok(Exit::Stopped)
//!   ├─► ctx cancelled    ─► release subscription, Ok(Exit::Cancelled)
//!   └─► next notification
//!         ├─ None                  ─► Err(Failure{ last, SubscriptionClosed })
//!         ├─ empty / foreign       ─► drop, continue
//!         ├─ skip(state) == true   ─► remember state, continue
//!         └─ hook(state)
//!               ├─ Ok   ─► continue
//!               └─ Err  ─► release subscription, Err(Failure{ state, Hook(e) })
//! }
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                       |
//! |-------------------|---------------------------------------------------------------|------------------------------------------|
//! | **Watching**      | Dispatch notifications of one resource to hooks.              | [`Watcher`], [`EventSource`]             |
//! | **Tailing**       | Stream many log attachments concurrently, stop them together. | [`Tail`], [`LogSource`], [`Sink`]        |
//! | **Shutdown**      | Idempotent stop latch bridged to a parent token.              | [`StopSignal`], [`StopHandle`]           |
//! | **Subscriber API**| Observe lifecycle events (logging, metrics, audit).           | [`Subscribe`], [`SubscriberSet`], [`Bus`]|
//! | **Errors**        | Typed errors for hooks, watching and tailing.                 | [`HookError`], [`WatchError`], [`TailError`] |
//! | **Requests**      | Build-run request flags and sanitizing.                       | [`request::BuildRunArgs`]                |
//!
//! ## Optional features
//! - `logging`: exports the built-in [`LogWriter`] subscriber.
//! - `kube`: exposes [`k8s::PodEvents`] and [`k8s::PodLogs`] backed by `kube::Api<Pod>`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use async_trait::async_trait;
//! use tokio_util::sync::CancellationToken;
//! use podreactor::{AttachmentId, LineStream, LogSource, LogStream, MemorySink, Tail, TailError};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl LogSource for Canned {
//!     async fn open(&self, id: &AttachmentId, _follow: bool) -> Result<Box<dyn LogStream>, TailError> {
//!         let text = format!("hello from {}\n", id.container);
//!         Ok(Box::new(LineStream::new(std::io::Cursor::new(text.into_bytes()))))
//!     }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let out = Arc::new(MemorySink::new());
//!     let tail = Tail::new(CancellationToken::new(), Arc::new(Canned)).with_stdout(out.clone());
//!
//!     tail.attach(AttachmentId::new("builds", "run-pod", "step-build"));
//!     tail.wait().await;
//!
//!     assert_eq!(out.lines(), ["[build] hello from step-build"]);
//! }
//! ```
mod config;
mod core;
mod error;
mod events;
pub mod logging;
mod reactor;
pub mod request;
mod subscribers;
mod tail;

// Optional: Kubernetes-backed sources.
// Enable with: `--features kube`
#[cfg(feature = "kube")]
pub mod k8s;

// ---- Public re-exports ----

pub use config::{Config, Selector};
pub use core::{StopSignal, bridge, cancel_on_shutdown_signal, wait_for_shutdown_signal};
pub use error::{Failure, HookError, TailError, WatchError};
pub use events::{Bus, Event, EventKind};
pub use reactor::{
    EventSource, Exit, HookFn, Hooks, Notification, NotificationKind, Object, SkipFn, StopHandle,
    Subscription, Watcher,
};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tail::{
    AttachmentId, LineStream, LogSource, LogStream, MemorySink, ReaderExit, SharedSink, Sink,
    StderrSink, StdoutSink, Tail, WriterSink,
};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
