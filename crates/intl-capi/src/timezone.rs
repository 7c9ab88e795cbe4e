//! Custom time zones: an optional GMT offset, an optional BCP-47 zone id and an
//! optional standard/daylight variant. Each part can be set independently.

use std::fmt::Write as _;
use std::sync::Mutex;

use chrono::{NaiveDateTime, Offset as _, TimeZone as _};
use chrono_tz::OffsetComponents as _;
use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::sink::{fmt_error, with_sink};
use intl_capi_core::{guard, guard_or, guard_void, intl_result_bool, intl_result_handle};
use intl_capi_core::{intl_result_i32, intl_result_void, intl_write, utf8_from_raw};
use intl_capi_core::{ErrorCode, Object};

use crate::datetime::IsoDateTime;
use crate::timezone_mapper::TimeZoneIdMapper;

/// Largest accepted distance from GMT.
pub const MAX_OFFSET_SECONDS: i32 = 18 * 3600;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ZoneError {
    #[error("unparseable offset {0:?}")]
    Offset(String),
    #[error("offset of {0}s exceeds 18 hours")]
    OffsetRange(i32),
    #[error("invalid BCP-47 time zone id {0:?}")]
    ZoneId(String),
    #[error("unknown IANA time zone {0:?}")]
    UnknownIana(String),
}

impl From<ZoneError> for ErrorCode {
    fn from(e: ZoneError) -> Self {
        match e {
            ZoneError::Offset(_) => ErrorCode::ParseFailure,
            ZoneError::OffsetRange(_) | ZoneError::ZoneId(_) => ErrorCode::InvalidArgument,
            ZoneError::UnknownIana(_) => ErrorCode::DataNotFound,
        }
    }
}

/// Parses `Z`, `+hh`, `+hhmm` or `+hh:mm` (and the `-` forms) into seconds
/// east of GMT.
pub fn parse_offset(s: &str) -> Result<i32, ZoneError> {
    let bad = || ZoneError::Offset(s.to_owned());
    if s == "Z" || s == "z" {
        return Ok(0);
    }
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(bad()),
    };
    if !rest.is_ascii() {
        return Err(bad());
    }
    let digits = |t: &str| -> Result<i32, ZoneError> {
        if t.len() == 2 && t.bytes().all(|c| c.is_ascii_digit()) {
            t.parse().map_err(|_| bad())
        } else {
            Err(bad())
        }
    };
    let (hh, mm) = match rest.len() {
        2 => (digits(rest)?, 0),
        4 => (digits(&rest[..2])?, digits(&rest[2..])?),
        5 if rest.as_bytes()[2] == b':' => (digits(&rest[..2])?, digits(&rest[3..])?),
        _ => return Err(bad()),
    };
    if mm >= 60 {
        return Err(bad());
    }
    let secs = sign * (hh * 3600 + mm * 60);
    if secs.abs() > MAX_OFFSET_SECONDS {
        return Err(ZoneError::OffsetRange(secs));
    }
    Ok(secs)
}

fn check_zone_id(id: &str) -> Result<(), ZoneError> {
    let ok = (2..=8).contains(&id.len())
        && id.bytes().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
    if ok {
        Ok(())
    } else {
        Err(ZoneError::ZoneId(id.to_owned()))
    }
}

/// Offset and daylight flag of an IANA zone at a local wall-clock time.
/// Skipped local times resolve as if the wall clock were UTC.
pub fn offset_from_iana(iana: &str, local: NaiveDateTime) -> Result<(i32, bool), ZoneError> {
    let tz: chrono_tz::Tz = iana
        .parse()
        .map_err(|_| ZoneError::UnknownIana(iana.to_owned()))?;
    let offset = tz
        .offset_from_local_datetime(&local)
        .earliest()
        .unwrap_or_else(|| tz.offset_from_utc_datetime(&local));
    let dst = offset.dst_offset().num_seconds() != 0;
    Ok((offset.fix().local_minus_utc(), dst))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneState {
    pub offset: Option<i32>,
    pub bcp47: Option<String>,
    pub daylight: Option<bool>,
}

#[derive(Debug, Default)]
pub struct CustomTimeZone {
    state: Mutex<ZoneState>,
}

impl Object for CustomTimeZone {
    const KIND: &'static str = "CustomTimeZone";
}

impl CustomTimeZone {
    pub fn with_offset(offset: i32) -> Self {
        Self {
            state: Mutex::new(ZoneState {
                offset: Some(offset),
                ..ZoneState::default()
            }),
        }
    }

    pub fn snapshot(&self) -> ZoneState {
        self.state.lock().map(|s| s.clone()).unwrap_or_default()
    }

    fn update<R>(&self, f: impl FnOnce(&mut ZoneState) -> R) -> Result<R, ErrorCode> {
        let mut state = self.state.lock().map_err(|_| ErrorCode::Unknown)?;
        Ok(f(&mut state))
    }
}

#[no_mangle]
pub extern "C" fn intl_custom_time_zone_create_empty_v1() -> intl_result_handle {
    guard("custom_time_zone.create_empty", || {
        handle::insert(CustomTimeZone::default())
    })
}

#[no_mangle]
pub extern "C" fn intl_custom_time_zone_create_utc_v1() -> intl_result_handle {
    guard("custom_time_zone.create_utc", || {
        handle::insert(CustomTimeZone {
            state: Mutex::new(ZoneState {
                offset: Some(0),
                bcp47: Some("utc".to_owned()),
                daylight: Some(false),
            }),
        })
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_custom_time_zone_create_from_string_v1(
    ptr: *const u8,
    len: usize,
) -> intl_result_handle {
    guard("custom_time_zone.create_from_string", || {
        let s = crate::parse_input(ptr, len)?;
        let offset = parse_offset(s).map_err(|e| match e {
            ZoneError::OffsetRange(_) => ErrorCode::ParseFailure,
            other => other.into(),
        })?;
        handle::insert(CustomTimeZone::with_offset(offset))
    })
}

#[no_mangle]
pub extern "C" fn intl_custom_time_zone_try_set_gmt_offset_seconds_v1(
    tz: intl_handle,
    seconds: i32,
) -> intl_result_void {
    guard_void("custom_time_zone.try_set_gmt_offset_seconds", || {
        let z = handle::get::<CustomTimeZone>(tz)?;
        if seconds.checked_abs().map_or(true, |s| s > MAX_OFFSET_SECONDS) {
            return Err(ZoneError::OffsetRange(seconds).into());
        }
        z.update(|s| s.offset = Some(seconds))
    })
}

#[no_mangle]
pub extern "C" fn intl_custom_time_zone_clear_gmt_offset_v1(tz: intl_handle) {
    guard_or("custom_time_zone.clear_gmt_offset", (), || {
        if let Ok(z) = handle::get::<CustomTimeZone>(tz) {
            let _ = z.update(|s| s.offset = None);
        }
    })
}

#[no_mangle]
pub extern "C" fn intl_custom_time_zone_gmt_offset_seconds_v1(tz: intl_handle) -> intl_result_i32 {
    guard("custom_time_zone.gmt_offset_seconds", || {
        let z = handle::get::<CustomTimeZone>(tz)?;
        z.snapshot().offset.ok_or(ErrorCode::DataNotFound)
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_custom_time_zone_try_set_time_zone_id_v1(
    tz: intl_handle,
    ptr: *const u8,
    len: usize,
) -> intl_result_void {
    guard_void("custom_time_zone.try_set_time_zone_id", || {
        let z = handle::get::<CustomTimeZone>(tz)?;
        let id = utf8_from_raw(ptr, len)?;
        check_zone_id(id)?;
        z.update(|s| s.bcp47 = Some(id.to_owned()))
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_custom_time_zone_time_zone_id_v1(
    tz: intl_handle,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("custom_time_zone.time_zone_id", || {
        let z = handle::get::<CustomTimeZone>(tz)?;
        let id = z.snapshot().bcp47.ok_or(ErrorCode::DataNotFound)?;
        with_sink(write, |w| w.write_str(&id).map_err(|_| fmt_error(w)))
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_custom_time_zone_try_set_iana_time_zone_id_v1(
    tz: intl_handle,
    mapper: intl_handle,
    ptr: *const u8,
    len: usize,
) -> intl_result_void {
    guard_void("custom_time_zone.try_set_iana_time_zone_id", || {
        let z = handle::get::<CustomTimeZone>(tz)?;
        let m = handle::get::<TimeZoneIdMapper>(mapper)?;
        let iana = utf8_from_raw(ptr, len)?;
        let bcp47 = m
            .iana_to_bcp47(iana)
            .ok_or_else(|| ZoneError::UnknownIana(iana.to_owned()))?;
        z.update(|s| s.bcp47 = Some(bcp47.to_owned()))
    })
}

#[no_mangle]
pub extern "C" fn intl_custom_time_zone_set_standard_time_v1(tz: intl_handle) {
    guard_or("custom_time_zone.set_standard_time", (), || {
        if let Ok(z) = handle::get::<CustomTimeZone>(tz) {
            let _ = z.update(|s| s.daylight = Some(false));
        }
    })
}

#[no_mangle]
pub extern "C" fn intl_custom_time_zone_set_daylight_time_v1(tz: intl_handle) {
    guard_or("custom_time_zone.set_daylight_time", (), || {
        if let Ok(z) = handle::get::<CustomTimeZone>(tz) {
            let _ = z.update(|s| s.daylight = Some(true));
        }
    })
}

#[no_mangle]
pub extern "C" fn intl_custom_time_zone_is_daylight_time_v1(tz: intl_handle) -> intl_result_bool {
    guard("custom_time_zone.is_daylight_time", || {
        let z = handle::get::<CustomTimeZone>(tz)?;
        z.snapshot().daylight.ok_or(ErrorCode::DataNotFound)
    })
}

/// Sets the offset and the standard/daylight variant that the IANA zone
/// observes at the given local date-time.
#[no_mangle]
pub unsafe extern "C" fn intl_custom_time_zone_set_offset_from_iana_v1(
    tz: intl_handle,
    ptr: *const u8,
    len: usize,
    dt: intl_handle,
) -> intl_result_void {
    guard_void("custom_time_zone.set_offset_from_iana", || {
        let z = handle::get::<CustomTimeZone>(tz)?;
        let local = handle::get::<IsoDateTime>(dt)?;
        let iana = utf8_from_raw(ptr, len)?;
        let (offset, dst) = offset_from_iana(iana, local.0)?;
        tracing::debug!(
            target: "intl_capi::timezone",
            iana,
            offset,
            dst,
            "offset resolved from tz database"
        );
        z.update(|s| {
            s.offset = Some(offset);
            s.daylight = Some(dst);
        })
    })
}

#[no_mangle]
pub extern "C" fn intl_custom_time_zone_destroy_v1(tz: intl_handle) {
    crate::destroy::<CustomTimeZone>("custom_time_zone.destroy", tz);
}
