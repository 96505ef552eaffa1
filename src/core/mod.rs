//! Runtime core: the shutdown protocol shared by the watcher and the tail coordinator.
//!
//! - [`shutdown`]: one-shot [`StopSignal`], the parent-to-local bridge task and OS signal helpers.

pub mod shutdown;

pub use shutdown::{StopSignal, bridge, cancel_on_shutdown_signal, wait_for_shutdown_signal};
