//! RAII ownership for Rust callers of the C ABI.
//!
//! `OwnedHandle` releases its handle exactly once, on drop, through the
//! kind's destroy entry point. `BorrowedHandle<'a>` is tied to the owner it was
//! derived from and cannot outlive it.

use core::marker::PhantomData;

use crate::error::ErrorCode;
use crate::handle::intl_handle;
use crate::result::intl_result_handle;

pub type ReleaseFn = extern "C" fn(intl_handle);

#[derive(Debug)]
pub struct OwnedHandle {
    raw: intl_handle,
    release: ReleaseFn,
}

impl OwnedHandle {
    /// Takes ownership of a constructor's success payload.
    pub fn from_result(r: intl_result_handle, release: ReleaseFn) -> Result<Self, ErrorCode> {
        let raw = r.into_result()?;
        Self::from_raw(raw, release).ok_or(ErrorCode::InvalidHandle)
    }

    /// Takes ownership of a possibly-null handle.
    pub fn from_raw(raw: intl_handle, release: ReleaseFn) -> Option<Self> {
        (!raw.is_null()).then_some(Self { raw, release })
    }

    pub fn raw(&self) -> intl_handle {
        self.raw
    }

    /// Wraps a handle derived from this owner.
    pub fn derived(&self, raw: intl_handle) -> Option<BorrowedHandle<'_>> {
        (!raw.is_null()).then_some(BorrowedHandle {
            raw,
            _owner: PhantomData,
        })
    }

    /// Gives the handle back without releasing it.
    pub fn into_raw(self) -> intl_handle {
        let raw = self.raw;
        core::mem::forget(self);
        raw
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        (self.release)(self.raw);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BorrowedHandle<'a> {
    raw: intl_handle,
    _owner: PhantomData<&'a OwnedHandle>,
}

impl BorrowedHandle<'_> {
    pub fn raw(&self) -> intl_handle {
        self.raw
    }
}
