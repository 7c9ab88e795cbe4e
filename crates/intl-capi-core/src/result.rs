use crate::error::ErrorCode;
use crate::handle::intl_handle;
use crate::marshal::AbiEnum;

#[repr(C)]
#[derive(Copy, Clone)]
pub union intl_result_payload<T: Copy> {
    pub ok: T,
    pub err: u32, // ErrorCode
}

/// Tagged success/failure envelope returned by every fallible entry point.
///
/// `tag` is `1` when `payload.ok` is valid and `0` when `payload.err` is.
#[repr(C)]
#[derive(Copy, Clone)]
pub struct intl_result<T: Copy> {
    pub tag: u32, // 1 = ok, 0 = err
    pub payload: intl_result_payload<T>,
}

pub type intl_result_handle = intl_result<intl_handle>;
/// `payload.ok` is always `0`.
pub type intl_result_void = intl_result<u8>;
pub type intl_result_i32 = intl_result<i32>;
pub type intl_result_bool = intl_result<bool>;

impl<T: Copy> intl_result<T> {
    #[inline]
    pub fn ok(value: T) -> Self {
        Self {
            tag: 1,
            payload: intl_result_payload { ok: value },
        }
    }

    #[inline]
    pub fn err(code: ErrorCode) -> Self {
        Self {
            tag: 0,
            payload: intl_result_payload { err: code.to_abi() },
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.tag == 1
    }

    pub fn into_result(self) -> Result<T, ErrorCode> {
        if self.tag == 1 {
            Ok(unsafe { self.payload.ok })
        } else {
            Err(ErrorCode::from_raw(unsafe { self.payload.err }))
        }
    }
}

impl<T: Copy> From<Result<T, ErrorCode>> for intl_result<T> {
    fn from(r: Result<T, ErrorCode>) -> Self {
        match r {
            Ok(v) => Self::ok(v),
            Err(code) => Self::err(code),
        }
    }
}

impl From<Result<(), ErrorCode>> for intl_result_void {
    fn from(r: Result<(), ErrorCode>) -> Self {
        match r {
            Ok(()) => Self::ok(0),
            Err(code) => Self::err(code),
        }
    }
}

impl intl_result_void {
    pub fn into_unit(self) -> Result<(), ErrorCode> {
        self.into_result().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_matches_arm() {
        let ok = intl_result_i32::ok(-7);
        assert!(ok.is_ok());
        assert_eq!(ok.into_result(), Ok(-7));

        let err = intl_result_i32::err(ErrorCode::ParseFailure);
        assert_eq!(err.tag, 0);
        assert_eq!(unsafe { err.payload.err }, 3);
        assert_eq!(err.into_result(), Err(ErrorCode::ParseFailure));
    }

    #[test]
    fn unit_envelope() {
        let r = intl_result_void::from(Ok::<(), ErrorCode>(()));
        assert_eq!(r.into_unit(), Ok(()));
        let r = intl_result_void::from(Err::<(), _>(ErrorCode::UnsupportedOption));
        assert_eq!(r.into_unit(), Err(ErrorCode::UnsupportedOption));
    }
}
