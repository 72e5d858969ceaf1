//! Process-wide log output.
//!
//! Library code only talks to the `log` facade. The binary installs a
//! `tracing_subscriber` formatter on stderr once at start-up; it also bridges
//! `log` records, so nothing else needs a logger handle.

use std::io::IsTerminal;
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_LEVEL: &str = "info";

/// Builds the filter from `RUST_LOG`-style directives.
///
/// Blank or invalid directives fall back to [`DEFAULT_LEVEL`].
#[must_use]
pub fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .and_then(|value| EnvFilter::try_new(value).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LEVEL))
}

/// Installs the stderr subscriber.
///
/// Returns `false` when a global subscriber or logger was already installed,
/// in which case the existing one keeps receiving records.
pub fn init() -> bool {
    let directives = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(directives.as_deref()))
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .try_init()
        .is_ok()
}
