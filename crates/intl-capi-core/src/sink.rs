//! Caller-owned output buffers.
//!
//! Variable-length text never leaves the native side as an allocation the
//! caller must free. Formatting entry points take an `intl_write` and append
//! to it through its `grow` callback, then call `flush` once. On failure the
//! sink holds whatever was appended so far.

use core::ffi::c_void;
use core::fmt;
use core::ptr::{self, NonNull};

use crate::error::ErrorCode;

#[repr(C)]
pub struct intl_write {
    pub context: *mut c_void,
    pub buf: *mut u8,
    pub len: usize,
    pub cap: usize,
    /// Set by the native side once `grow` has refused a request; every later
    /// append fails.
    pub grow_failed: bool,
    pub flush: Option<unsafe extern "C" fn(*mut intl_write)>,
    /// Must leave `cap >= requested` and return `true`, or return `false`.
    pub grow: Option<unsafe extern "C" fn(*mut intl_write, usize) -> bool>,
}

/// Append-only text destination.
pub trait Sink: fmt::Write {
    fn append(&mut self, bytes: &[u8]) -> Result<(), ErrorCode>;

    /// Signals that the current formatting call is done appending.
    fn finish(&mut self) {}
}

impl intl_write {
    fn reserve(&mut self, needed: usize) -> Result<(), ErrorCode> {
        if needed <= self.cap {
            return Ok(());
        }
        let grown = match self.grow {
            Some(grow) => unsafe { grow(self as *mut intl_write, needed) },
            None => false,
        };
        if !grown || self.cap < needed || self.buf.is_null() {
            self.grow_failed = true;
            return Err(ErrorCode::InternalLimitExceeded);
        }
        Ok(())
    }
}

impl Sink for intl_write {
    fn append(&mut self, bytes: &[u8]) -> Result<(), ErrorCode> {
        if self.grow_failed {
            return Err(ErrorCode::InternalLimitExceeded);
        }
        if bytes.is_empty() {
            return Ok(());
        }
        let needed = self
            .len
            .checked_add(bytes.len())
            .ok_or(ErrorCode::InternalLimitExceeded)?;
        self.reserve(needed)?;
        unsafe {
            ptr::copy_nonoverlapping(bytes.as_ptr(), self.buf.add(self.len), bytes.len());
        }
        self.len = needed;
        Ok(())
    }

    fn finish(&mut self) {
        if let Some(flush) = self.flush {
            unsafe { flush(self as *mut intl_write) };
        }
    }
}

impl fmt::Write for intl_write {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.append(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl Sink for String {
    fn append(&mut self, bytes: &[u8]) -> Result<(), ErrorCode> {
        let s = core::str::from_utf8(bytes).map_err(|_| ErrorCode::InvalidArgument)?;
        self.push_str(s);
        Ok(())
    }
}

/// Runs `f` against the sink behind `w` and flushes it afterwards, whether or
/// not `f` succeeded.
pub unsafe fn with_sink<T>(
    w: *mut intl_write,
    f: impl FnOnce(&mut intl_write) -> Result<T, ErrorCode>,
) -> Result<T, ErrorCode> {
    let Some(sink) = w.as_mut() else {
        return Err(ErrorCode::InvalidArgument);
    };
    let res = f(sink);
    sink.finish();
    res
}

/// Maps a formatting failure to the envelope code: a refused `grow` is a limit,
/// anything else is an argument the formatter could not render.
pub fn fmt_error(sink: &intl_write) -> ErrorCode {
    if sink.grow_failed {
        ErrorCode::InternalLimitExceeded
    } else {
        ErrorCode::InvalidArgument
    }
}

// --- native-backed buffer sink ---

unsafe extern "C" fn buffer_grow(w: *mut intl_write, needed: usize) -> bool {
    let Some(w) = w.as_mut() else {
        return false;
    };
    let mut vec = Vec::from_raw_parts(w.buf, w.len, w.cap);
    let extra = needed.saturating_sub(w.len);
    let ok = vec.try_reserve(extra).is_ok();
    w.buf = vec.as_mut_ptr();
    w.cap = vec.capacity();
    core::mem::forget(vec);
    ok
}

unsafe extern "C" fn buffer_flush(_w: *mut intl_write) {}

fn new_buffer(cap: usize) -> Box<intl_write> {
    let mut vec: Vec<u8> = Vec::with_capacity(cap);
    let w = intl_write {
        context: ptr::null_mut(),
        buf: vec.as_mut_ptr(),
        len: 0,
        cap: vec.capacity(),
        grow_failed: false,
        flush: Some(buffer_flush),
        grow: Some(buffer_grow),
    };
    core::mem::forget(vec);
    Box::new(w)
}

/// Allocates a sink whose storage is a native `Vec<u8>`.
pub fn buffer_write_create(cap: usize) -> *mut intl_write {
    Box::into_raw(new_buffer(cap))
}

/// Frees a sink created by [`buffer_write_create`].
pub unsafe fn buffer_write_destroy(w: *mut intl_write) {
    if w.is_null() {
        return;
    }
    let w = Box::from_raw(w);
    drop(Vec::from_raw_parts(w.buf, w.len, w.cap));
}

/// Owning Rust view of a native buffer sink.
pub struct BufferWrite(NonNull<intl_write>);

impl BufferWrite {
    pub fn new(cap: usize) -> Self {
        Self(NonNull::from(Box::leak(new_buffer(cap))))
    }

    pub fn as_mut_ptr(&mut self) -> *mut intl_write {
        self.0.as_ptr()
    }

    pub fn as_bytes(&self) -> &[u8] {
        let w = unsafe { self.0.as_ref() };
        if w.len == 0 {
            return &[];
        }
        unsafe { core::slice::from_raw_parts(w.buf, w.len) }
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(self.as_bytes()).unwrap_or("")
    }

    pub fn clear(&mut self) {
        unsafe { self.0.as_mut().len = 0 };
    }
}

impl Drop for BufferWrite {
    fn drop(&mut self) {
        unsafe { buffer_write_destroy(self.0.as_ptr()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write as _;
    use proptest::prelude::*;

    unsafe extern "C" fn refuse_grow(_w: *mut intl_write, _needed: usize) -> bool {
        false
    }

    #[test]
    fn buffer_grows_and_keeps_prefix() {
        let mut buf = BufferWrite::new(2);
        let res = unsafe {
            with_sink(buf.as_mut_ptr(), |w| {
                w.append(b"hello")?;
                write!(w, ", {}", "world").map_err(|_| fmt_error(w))
            })
        };
        assert_eq!(res, Ok(()));
        assert_eq!(buf.as_str(), "hello, world");
    }

    #[test]
    fn refused_grow_is_sticky() {
        let mut storage = [0u8; 4];
        let mut w = intl_write {
            context: ptr::null_mut(),
            buf: storage.as_mut_ptr(),
            len: 0,
            cap: storage.len(),
            grow_failed: false,
            flush: None,
            grow: Some(refuse_grow),
        };
        assert_eq!(w.append(b"abc"), Ok(()));
        assert_eq!(w.append(b"de"), Err(ErrorCode::InternalLimitExceeded));
        assert!(w.grow_failed);
        assert_eq!(w.append(b""), Err(ErrorCode::InternalLimitExceeded));
        assert_eq!(fmt_error(&w), ErrorCode::InternalLimitExceeded);
        assert_eq!(w.len, 3);
        assert_eq!(&storage[..3], b"abc");
    }

    #[test]
    fn null_sink_is_an_argument_error() {
        let res = unsafe { with_sink(ptr::null_mut(), |_| Ok(())) };
        assert_eq!(res, Err(ErrorCode::InvalidArgument));
    }

    proptest! {
        #[test]
        fn appends_concatenate(
            chunks in proptest::collection::vec(".{0,12}", 0..16),
            cap in 0usize..8,
        ) {
            let mut buf = BufferWrite::new(cap);
            let w = unsafe { &mut *buf.as_mut_ptr() };
            for c in &chunks {
                w.append(c.as_bytes()).unwrap();
            }
            prop_assert_eq!(buf.as_str(), chunks.concat());
        }
    }
}
