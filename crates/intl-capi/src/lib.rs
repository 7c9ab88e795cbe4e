#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]

//! `intl_*_v1` C ABI over a compact internationalization engine.
//!
//! Each module owns one family of object kinds and its exported entry points.
//! The generic boundary pieces (handles, envelopes, sinks, enum marshaling)
//! live in `intl-capi-core`.

use std::fmt::Write as _;

use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::sink::{self as core_sink, fmt_error, with_sink};
use intl_capi_core::{guard_or, guard_void, intl_result_void, intl_write, utf8_from_raw};
use intl_capi_core::{AbiEnum, ErrorCode, Object};

pub mod calendar;
pub mod collator;
pub mod datetime;
pub mod datetime_format;
pub mod locale;
pub mod options;
pub mod pattern;
pub mod provider;
pub mod segmenter;
pub mod sets;
pub mod timezone;
pub mod timezone_mapper;
pub mod units;
pub mod week;

pub use intl_capi_core::{
    intl_result, intl_result_bool, intl_result_handle, intl_result_i32, BorrowedHandle, OwnedHandle,
};

/// Shared body of every `*_destroy_v1`: null is ignored, violations are logged
/// by the registry and otherwise swallowed.
pub(crate) fn destroy<T: Object>(op: &'static str, h: intl_handle) {
    guard_or(op, (), || {
        let _ = handle::release::<T>(h);
    })
}

/// UTF-8 view of a string argument that is about to be parsed. Bad encoding is
/// reported as a parse failure; limit violations keep their own code.
pub(crate) unsafe fn parse_input<'a>(ptr: *const u8, len: usize) -> Result<&'a str, ErrorCode> {
    utf8_from_raw(ptr, len).map_err(|e| match e {
        ErrorCode::InvalidArgument => ErrorCode::ParseFailure,
        other => other,
    })
}

/// Installs the stderr `tracing` subscriber. Returns `false` if the host had
/// already installed one.
#[no_mangle]
pub extern "C" fn intl_logging_init_v1() -> bool {
    guard_or("logging.init", false, intl_capi_core::logging::init_logging)
}

/// Number of live handles across all kinds.
#[no_mangle]
pub extern "C" fn intl_handles_live_v1() -> u32 {
    guard_or("handles.live", 0, || {
        u32::try_from(handle::live_count()).unwrap_or(u32::MAX)
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_error_code_name_v1(
    code: u32,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("error_code.name", || {
        let code = intl_capi_core::decode::<ErrorCode>(code)?;
        with_sink(write, |w| w.write_str(code.name()).map_err(|_| fmt_error(w)))
    })
}

#[no_mangle]
pub extern "C" fn intl_buffer_write_create_v1(cap: usize) -> *mut intl_write {
    guard_or("buffer_write.create", core::ptr::null_mut(), || {
        core_sink::buffer_write_create(cap)
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_buffer_write_get_bytes_v1(write: *const intl_write) -> *const u8 {
    match write.as_ref() {
        Some(w) => w.buf,
        None => core::ptr::null(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn intl_buffer_write_len_v1(write: *const intl_write) -> usize {
    write.as_ref().map_or(0, |w| w.len)
}

#[no_mangle]
pub unsafe extern "C" fn intl_buffer_write_destroy_v1(write: *mut intl_write) {
    core_sink::buffer_write_destroy(write)
}
