#![forbid(unsafe_code)]

//! Process-level tracing subscriber.
//!
//! Library code only emits `tracing` events. Binaries and test harnesses
//! that want to see them call [`init`] once at startup. The filter is read
//! from `BIND_LOG` using `tracing_subscriber::EnvFilter` syntax, e.g.
//! `BIND_LOG=bind_core=trace`.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive.
pub const LOG_ENV: &str = "BIND_LOG";

/// Filter used when `BIND_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

/// Build the filter from `BIND_LOG`, falling back to [`DEFAULT_FILTER`].
#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install a formatted subscriber as the global default.
///
/// Returns `false` if a global subscriber was already installed.
pub fn init() -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init()
        .is_ok()
}
