//! Opt-in diagnostics.
//!
//! The library emits `tracing` events but never installs a subscriber on its
//! own; a host that wants them calls [`init_logging`] (exported as
//! `intl_logging_init_v1`). The filter is read from `INTL_CAPI_LOG` using the
//! usual `EnvFilter` directives and defaults to `warn`.

use once_cell::sync::OnceCell;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "INTL_CAPI_LOG";

static INSTALLED: OnceCell<bool> = OnceCell::new();

/// Installs a stderr `fmt` subscriber once. Returns `false` when another
/// global subscriber was already set by the host.
pub fn init_logging() -> bool {
    *INSTALLED.get_or_init(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true)
            .try_init()
            .is_ok()
    })
}
