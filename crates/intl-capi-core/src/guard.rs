use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::ErrorCode;
use crate::result::{intl_result, intl_result_void};

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

fn report_panic(op: &'static str, payload: &(dyn Any + Send)) {
    tracing::error!(
        target: "intl_capi::guard",
        op,
        panic = panic_message(payload),
        "panic caught at boundary"
    );
}

/// Runs a fallible entry point body. A panic becomes an `Unknown` failure
/// envelope instead of unwinding into the caller.
pub fn guard<T: Copy>(
    op: &'static str,
    f: impl FnOnce() -> Result<T, ErrorCode>,
) -> intl_result<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(res) => res.into(),
        Err(payload) => {
            report_panic(op, payload.as_ref());
            intl_result::err(ErrorCode::Unknown)
        }
    }
}

/// [`guard`] for operations whose success carries no value.
pub fn guard_void(
    op: &'static str,
    f: impl FnOnce() -> Result<(), ErrorCode>,
) -> intl_result_void {
    guard(op, || f().map(|()| 0))
}

/// Same as [`guard`] for entry points without an envelope: a panic yields
/// `fallback`.
pub fn guard_or<T>(op: &'static str, fallback: T, f: impl FnOnce() -> T) -> T {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => v,
        Err(payload) => {
            report_panic(op, payload.as_ref());
            fallback
        }
    }
}
