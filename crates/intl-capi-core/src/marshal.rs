//! Enum tags and borrowed input views crossing the boundary.
//!
//! Enumerations travel as `u32`. Each one is declared with [`abi_enum!`],
//! which emits the numeric table once and derives both directions from it, so
//! the mapping cannot drift. New variants are appended; existing values never
//! change.

use crate::config::check_input_len;
use crate::error::ErrorCode;

pub trait AbiEnum: Copy + Eq + Sized + 'static {
    const NAME: &'static str;
    const ALL: &'static [Self];

    fn to_abi(self) -> u32;
    fn from_abi(raw: u32) -> Option<Self>;
    fn name(self) -> &'static str;
}

/// Decodes a wire tag, rejecting values outside the declared table.
pub fn decode<E: AbiEnum>(raw: u32) -> Result<E, ErrorCode> {
    E::from_abi(raw).ok_or_else(|| {
        tracing::warn!(target: "intl_capi::marshal", kind = E::NAME, raw, "undeclared enum tag");
        ErrorCode::InvalidArgument
    })
}

#[macro_export]
macro_rules! abi_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $value:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u32)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant = $value ),+
        }

        impl $crate::marshal::AbiEnum for $name {
            const NAME: &'static str = stringify!($name);
            const ALL: &'static [Self] = &[$(Self::$variant),+];

            fn to_abi(self) -> u32 {
                self as u32
            }

            fn from_abi(raw: u32) -> Option<Self> {
                match raw {
                    $( $value => Some(Self::$variant), )+
                    _ => None,
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $( Self::$variant => stringify!($variant), )+
                }
            }
        }
    };
}

/// Views `(ptr, len)` as a byte slice. A null pointer is only accepted with a
/// zero length.
#[inline]
pub unsafe fn bytes_from_raw<'a>(ptr: *const u8, len: usize) -> Result<&'a [u8], ErrorCode> {
    check_input_len(len)?;
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(ErrorCode::InvalidArgument);
    }
    Ok(core::slice::from_raw_parts(ptr, len))
}

#[inline]
pub unsafe fn utf8_from_raw<'a>(ptr: *const u8, len: usize) -> Result<&'a str, ErrorCode> {
    let bytes = bytes_from_raw(ptr, len)?;
    core::str::from_utf8(bytes).map_err(|_| ErrorCode::InvalidArgument)
}

/// Views `(ptr, len)` as UTF-16 code units; `len` counts units, not bytes.
#[inline]
pub unsafe fn utf16_from_raw<'a>(ptr: *const u16, len: usize) -> Result<&'a [u16], ErrorCode> {
    check_input_len(len.saturating_mul(2))?;
    if len == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(ErrorCode::InvalidArgument);
    }
    Ok(core::slice::from_raw_parts(ptr, len))
}
