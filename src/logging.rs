//! Opt-in logging bootstrap.
//!
//! The crate emits structured diagnostics through `tracing` and works with
//! whatever subscriber the application installs. [`enable_logging`] is a
//! convenience for programs that have none: a formatting subscriber filtered
//! by `RUST_LOG` (default `info`).

use tracing_subscriber::EnvFilter;

/// Installs a default tracing subscriber. Does nothing if one is already
/// installed.
pub fn enable_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
