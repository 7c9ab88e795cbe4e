//! Boundary limits, read once from the environment.

use once_cell::sync::OnceCell;

use crate::error::ErrorCode;

#[derive(Clone, Copy, Debug)]
pub struct Limits {
    /// Largest string input accepted by any entry point.
    pub max_input_bytes: u32,
    /// Registry capacity across all object kinds.
    pub max_handles: u32,
    /// Log lifecycle violations (double destroy, use after destroy).
    pub checked_destroy: bool,
}

static LIMITS: OnceCell<Limits> = OnceCell::new();

pub fn env_bool(name: &str, default: bool) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

pub fn env_u32_nonzero(name: &str, default: u32) -> u32 {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .filter(|&v| v != 0)
        .unwrap_or(default)
}

fn load_limits() -> Limits {
    Limits {
        max_input_bytes: env_u32_nonzero("INTL_CAPI_MAX_INPUT_BYTES", 16 * 1024 * 1024),
        max_handles: env_u32_nonzero("INTL_CAPI_MAX_HANDLES", 1 << 20),
        checked_destroy: env_bool("INTL_CAPI_CHECKED_DESTROY", true),
    }
}

pub fn limits() -> &'static Limits {
    LIMITS.get_or_init(load_limits)
}

pub(crate) fn check_input_len(len: usize) -> Result<(), ErrorCode> {
    if len > limits().max_input_bytes as usize {
        return Err(ErrorCode::InternalLimitExceeded);
    }
    Ok(())
}
