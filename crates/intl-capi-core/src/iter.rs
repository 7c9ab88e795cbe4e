//! Forward-only iterator protocol behind iterator handles.

use std::sync::Mutex;

/// Returned by break iterators once no boundary remains.
pub const BOUNDARY_SENTINEL: i32 = -1;

/// Fused cursor remembering the item produced by the most recent advance.
///
/// Once the inner iterator has returned `None` the cursor never polls it
/// again, so exhaustion is sticky.
pub struct Cursor<I: Iterator> {
    inner: I,
    current: Option<I::Item>,
    exhausted: bool,
}

impl<I> Cursor<I>
where
    I: Iterator,
    I::Item: Clone,
{
    pub fn new(inner: I) -> Self {
        Self {
            inner,
            current: None,
            exhausted: false,
        }
    }

    pub fn advance(&mut self) -> Option<I::Item> {
        if self.exhausted {
            return None;
        }
        self.current = self.inner.next();
        if self.current.is_none() {
            self.exhausted = true;
        }
        self.current.clone()
    }

    /// Item returned by the last advance; `None` before the first advance and
    /// after exhaustion.
    pub fn current(&self) -> Option<&I::Item> {
        self.current.as_ref()
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }
}

/// Cursor that can sit behind a shared handle. Advances are serialized by the
/// lock; concurrent callers are a contract violation but cannot corrupt state.
pub struct Stepper<I: Iterator> {
    cursor: Mutex<Cursor<I>>,
}

impl<I> Stepper<I>
where
    I: Iterator,
    I::Item: Clone,
{
    pub fn new(inner: I) -> Self {
        Self {
            cursor: Mutex::new(Cursor::new(inner)),
        }
    }

    pub fn advance(&self) -> Option<I::Item> {
        match self.cursor.lock() {
            Ok(mut c) => c.advance(),
            Err(_) => None,
        }
    }

    pub fn inspect<R>(&self, f: impl FnOnce(Option<&I::Item>) -> R) -> R {
        match self.cursor.lock() {
            Ok(c) => f(c.current()),
            Err(_) => f(None),
        }
    }
}
