//! # Kubernetes adapters (feature `kube`).
//!
//! - [`PodEvents`]: [`EventSource<Pod>`](crate::reactor::EventSource) over `Api<Pod>::watch`.
//! - [`PodLogs`]: [`LogSource`](crate::tail::LogSource) over `Api<Pod>::log_stream`.
//! - [`pod`]: helpers inspecting pod snapshots (phase, started step containers).

mod events;
mod logs;
pub mod pod;

pub use events::PodEvents;
pub use logs::PodLogs;
