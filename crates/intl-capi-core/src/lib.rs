#![allow(non_camel_case_types)]
#![allow(clippy::missing_safety_doc)]

//! Generic pieces of the `intl_*` C ABI.
//!
//! Every exported object kind is built from the same parts: a generational
//! handle registry, the tagged result envelope, the caller-owned write sink,
//! `u32` enum marshaling and the fused iterator cursor. The binding crate only
//! supplies the object types and the `extern "C"` entry points.

pub mod config;
pub mod error;
pub mod guard;
pub mod handle;
pub mod iter;
pub mod logging;
pub mod marshal;
pub mod result;
pub mod scoped;
pub mod sink;

pub use config::{env_bool, env_u32_nonzero, limits, Limits};
pub use error::ErrorCode;
pub use guard::{guard, guard_or, guard_void};
pub use handle::{intl_handle, Object, Ownership};
pub use iter::{Cursor, Stepper, BOUNDARY_SENTINEL};
pub use marshal::{bytes_from_raw, decode, utf16_from_raw, utf8_from_raw, AbiEnum};
pub use result::{
    intl_result, intl_result_bool, intl_result_handle, intl_result_i32, intl_result_payload,
    intl_result_void,
};
pub use scoped::{BorrowedHandle, OwnedHandle};
pub use sink::{intl_write, BufferWrite, Sink};
