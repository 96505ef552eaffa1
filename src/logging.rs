//! # Diagnostic logging setup.
//!
//! Tail lines and stream errors go to the sinks; everything else (lifecycle, skipped
//! notifications, hook failures) goes through `tracing`. [`init`] installs a
//! `tracing-subscriber` writing to stderr so diagnostics never mix with tailed output.
//!
//! `RUST_LOG` controls levels (e.g. `podreactor=debug`); the fallback is `warn`.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// JSON structured logs.
    Json,
    /// Single-line human readable logs.
    #[default]
    Compact,
}

/// Initializes the global `tracing` subscriber.
///
/// Safe to call multiple times; only the first call has an effect.
pub fn init(format: LogFormat) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let registry = tracing_subscriber::registry().with(filter);
        let res = match format {
            LogFormat::Json => registry
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .try_init(),
            LogFormat::Compact => registry
                .with(
                    fmt::layer()
                        .compact()
                        .with_target(false)
                        .with_writer(std::io::stderr),
                )
                .try_init(),
        };
        // Err only when the host already installed a global subscriber; keep theirs.
        let _ = res;
    });
}
