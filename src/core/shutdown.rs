//! # Shutdown protocol shared by the watcher and the tail coordinator.
//!
//! Every component instance listens to two signals:
//! - an **upstream** [`CancellationToken`] owned by the caller (timeout, parent abort, OS signal);
//! - a **local** one-shot [`StopSignal`] fired by explicit caller action.
//!
//! Either one produces the same effect: the remote resource is released and every task owned
//! by the instance terminates.
//!
//! ## Architecture
//! ```text
//! parent token ──cancelled()──► bridge task ──fire()──► StopSignal ──► reader 1
//!                                                          │       ──► reader 2
//! caller ──────────stop()─────────────────────────────────┘       ──► reader N
//! ```
//!
//! ## Rules
//! - `fire()` is a compare-and-set latch: only the first call reports `true`.
//! - Firing twice, or after every task already finished, is a no-op.
//! - Cancellation flows downward only; a local stop never cancels the parent.
//!
//! ## Signals
//! [`wait_for_shutdown_signal`] completes on:
//! - **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT` or Ctrl-C
//! - **Windows:** Ctrl-C via [`tokio::signal::ctrl_c`]

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Idempotent one-shot stop signal.
///
/// Cheap to share behind an `Arc`; every task of one instance observes the same latch.
#[derive(Debug, Default)]
pub struct StopSignal {
    fired: AtomicBool,
    token: CancellationToken,
}

impl StopSignal {
    /// Creates an unfired signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fires the signal.
    ///
    /// Returns `true` for the call that actually fired it, `false` for every later call.
    pub fn fire(&self) -> bool {
        let first = self
            .fired
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if first {
            self.token.cancel();
        }
        first
    }

    /// Returns `true` once the signal has fired.
    #[inline]
    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }

    /// Completes when the signal fires (immediately if it already has).
    pub async fn fired(&self) {
        self.token.cancelled().await
    }

    /// Token mirroring this signal, for APIs that take a [`CancellationToken`].
    #[inline]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

/// Spawns the task that fires `signal` once `parent` is cancelled.
///
/// The task ends as soon as either side fires, so it never outlives its instance.
pub fn bridge(parent: CancellationToken, signal: std::sync::Arc<StopSignal>) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = parent.cancelled() => {
                signal.fire();
            }
            _ = signal.fired() => {}
        }
    })
}

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners.
///
/// Returns `Ok(())` when any signal is received, or `Err` if signal registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

/// Cancels `token` when the process receives a termination signal.
///
/// Registration errors are logged and leave the token untouched.
pub fn cancel_on_shutdown_signal(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            res = wait_for_shutdown_signal() => match res {
                Ok(()) => {
                    tracing::info!("termination signal received, cancelling");
                    token.cancel();
                }
                Err(e) => tracing::warn!(error = %e, "failed to register signal handlers"),
            },
            _ = token.cancelled() => {}
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn fire_reports_first_call_only() {
        let s = StopSignal::new();
        assert!(!s.is_fired());
        assert!(s.fire());
        assert!(!s.fire());
        assert!(!s.fire());
        assert!(s.is_fired());
        assert!(s.token().is_cancelled());
    }

    #[tokio::test]
    async fn fired_completes_after_fire() {
        let s = Arc::new(StopSignal::new());
        let waiter = {
            let s = Arc::clone(&s);
            tokio::spawn(async move { s.fired().await })
        };
        s.fire();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[tokio::test]
    async fn bridge_fires_on_parent_cancel() {
        let parent = CancellationToken::new();
        let s = Arc::new(StopSignal::new());
        let h = bridge(parent.clone(), Arc::clone(&s));

        parent.cancel();
        tokio::time::timeout(Duration::from_secs(1), h)
            .await
            .expect("bridge should end")
            .unwrap();
        assert!(s.is_fired());
    }

    #[tokio::test]
    async fn bridge_ends_on_local_fire_without_touching_parent() {
        let parent = CancellationToken::new();
        let s = Arc::new(StopSignal::new());
        let h = bridge(parent.clone(), Arc::clone(&s));

        s.fire();
        tokio::time::timeout(Duration::from_secs(1), h)
            .await
            .expect("bridge should end")
            .unwrap();
        assert!(!parent.is_cancelled());
    }
}
