//! ISO date-times and date-times bound to a calendar.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::{guard, guard_or, intl_result_handle, AbiEnum, ErrorCode, Object};

use crate::calendar::{era_year, Calendar};
use crate::options::{CalendarKind, IsoWeekday};

#[derive(Debug, thiserror::Error)]
pub enum DateTimeError {
    #[error("{0} out of range")]
    OutOfRange(&'static str),
    #[error("unparseable date-time: {0}")]
    Parse(#[from] chrono::ParseError),
}

impl From<DateTimeError> for ErrorCode {
    fn from(e: DateTimeError) -> Self {
        match e {
            DateTimeError::OutOfRange(_) => ErrorCode::InvalidArgument,
            DateTimeError::Parse(_) => ErrorCode::ParseFailure,
        }
    }
}

pub fn naive_from_fields(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    nanosecond: u32,
) -> Result<NaiveDateTime, DateTimeError> {
    let date = NaiveDate::from_ymd_opt(year, month.into(), day.into())
        .ok_or(DateTimeError::OutOfRange("date"))?;
    if nanosecond >= 1_000_000_000 {
        return Err(DateTimeError::OutOfRange("nanosecond"));
    }
    let time = NaiveTime::from_hms_nano_opt(hour.into(), minute.into(), second.into(), nanosecond)
        .ok_or(DateTimeError::OutOfRange("time"))?;
    Ok(date.and_time(time))
}

/// Accepts `YYYY-MM-DDTHH:MM[:SS[.fffffffff]]` and a bare `YYYY-MM-DD`
/// (midnight). A leap second is out of range, as it is for field
/// construction.
pub fn parse_iso(s: &str) -> Result<NaiveDateTime, DateTimeError> {
    if let Ok(dt) = s.parse::<NaiveDateTime>() {
        if dt.nanosecond() >= 1_000_000_000 {
            return Err(DateTimeError::OutOfRange("second"));
        }
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M") {
        return Ok(dt);
    }
    let date = s.parse::<NaiveDate>()?;
    Ok(date.and_time(NaiveTime::MIN))
}

pub fn days_in_month(d: NaiveDate) -> u8 {
    let (y, m) = (d.year(), d.month());
    let next = if m == 12 {
        NaiveDate::from_ymd_opt(y + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(y, m + 1, 1)
    };
    match (NaiveDate::from_ymd_opt(y, m, 1), next) {
        (Some(first), Some(next)) => (next - first).num_days() as u8,
        _ => 31,
    }
}

pub fn days_in_year(year: i32) -> u16 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
        366
    } else {
        365
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoDateTime(pub NaiveDateTime);

impl Object for IsoDateTime {
    const KIND: &'static str = "IsoDateTime";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    pub iso: NaiveDateTime,
    pub calendar: CalendarKind,
}

impl Object for DateTime {
    const KIND: &'static str = "DateTime";
}

impl DateTime {
    pub fn year_in_era(&self) -> i32 {
        era_year(self.calendar, self.iso.year()).1
    }
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_create_v1(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    nanosecond: u32,
) -> intl_result_handle {
    guard("iso_date_time.create", || {
        let dt = naive_from_fields(year, month, day, hour, minute, second, nanosecond)?;
        handle::insert(IsoDateTime(dt))
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_iso_date_time_from_string_v1(
    ptr: *const u8,
    len: usize,
) -> intl_result_handle {
    guard("iso_date_time.from_string", || {
        let s = crate::parse_input(ptr, len)?;
        let dt = parse_iso(s)?;
        handle::insert(IsoDateTime(dt))
    })
}

fn with_iso<R: Copy>(
    op: &'static str,
    dt: intl_handle,
    neutral: R,
    f: impl FnOnce(NaiveDateTime) -> R,
) -> R {
    guard_or(op, neutral, || match handle::get::<IsoDateTime>(dt) {
        Ok(d) => f(d.0),
        Err(_) => neutral,
    })
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_year_v1(dt: intl_handle) -> i32 {
    with_iso("iso_date_time.year", dt, 0, |d| d.year())
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_month_v1(dt: intl_handle) -> u8 {
    with_iso("iso_date_time.month", dt, 0, |d| d.month() as u8)
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_day_v1(dt: intl_handle) -> u8 {
    with_iso("iso_date_time.day", dt, 0, |d| d.day() as u8)
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_hour_v1(dt: intl_handle) -> u8 {
    with_iso("iso_date_time.hour", dt, 0, |d| d.hour() as u8)
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_minute_v1(dt: intl_handle) -> u8 {
    with_iso("iso_date_time.minute", dt, 0, |d| d.minute() as u8)
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_second_v1(dt: intl_handle) -> u8 {
    with_iso("iso_date_time.second", dt, 0, |d| d.second() as u8)
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_nanosecond_v1(dt: intl_handle) -> u32 {
    with_iso("iso_date_time.nanosecond", dt, 0, |d| d.nanosecond())
}

/// `IsoWeekday` tag; `0` for an invalid handle.
#[no_mangle]
pub extern "C" fn intl_iso_date_time_day_of_week_v1(dt: intl_handle) -> u32 {
    with_iso("iso_date_time.day_of_week", dt, 0, |d| {
        IsoWeekday::from_chrono(d.weekday()).to_abi()
    })
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_day_of_year_v1(dt: intl_handle) -> u16 {
    with_iso("iso_date_time.day_of_year", dt, 0, |d| d.ordinal() as u16)
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_days_in_month_v1(dt: intl_handle) -> u8 {
    with_iso("iso_date_time.days_in_month", dt, 0, |d| days_in_month(d.date()))
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_days_in_year_v1(dt: intl_handle) -> u16 {
    with_iso("iso_date_time.days_in_year", dt, 0, |d| days_in_year(d.year()))
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_to_calendar_v1(
    dt: intl_handle,
    calendar: intl_handle,
) -> intl_result_handle {
    guard("iso_date_time.to_calendar", || {
        let d = handle::get::<IsoDateTime>(dt)?;
        let cal = handle::get::<Calendar>(calendar)?;
        handle::insert(DateTime {
            iso: d.0,
            calendar: cal.kind,
        })
    })
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_destroy_v1(dt: intl_handle) {
    crate::destroy::<IsoDateTime>("iso_date_time.destroy", dt);
}

#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn intl_date_time_create_from_iso_in_calendar_v1(
    year: i32,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    nanosecond: u32,
    calendar: intl_handle,
) -> intl_result_handle {
    guard("date_time.create_from_iso_in_calendar", || {
        let cal = handle::get::<Calendar>(calendar)?;
        let iso = naive_from_fields(year, month, day, hour, minute, second, nanosecond)?;
        handle::insert(DateTime {
            iso,
            calendar: cal.kind,
        })
    })
}

#[no_mangle]
pub extern "C" fn intl_date_time_to_iso_v1(dt: intl_handle) -> intl_result_handle {
    guard("date_time.to_iso", || {
        let d = handle::get::<DateTime>(dt)?;
        handle::insert(IsoDateTime(d.iso))
    })
}

#[no_mangle]
pub extern "C" fn intl_date_time_year_in_era_v1(dt: intl_handle) -> i32 {
    guard_or("date_time.year_in_era", 0, || {
        handle::get::<DateTime>(dt).map_or(0, |d| d.year_in_era())
    })
}

#[no_mangle]
pub extern "C" fn intl_date_time_calendar_kind_v1(dt: intl_handle) -> u32 {
    guard_or("date_time.calendar_kind", 0, || {
        handle::get::<DateTime>(dt).map_or(0, |d| d.calendar.to_abi())
    })
}

#[no_mangle]
pub extern "C" fn intl_date_time_destroy_v1(dt: intl_handle) {
    crate::destroy::<DateTime>("date_time.destroy", dt);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_ranges_are_checked() {
        assert!(naive_from_fields(2020, 2, 29, 23, 59, 59, 999_999_999).is_ok());
        assert!(matches!(
            naive_from_fields(2021, 2, 29, 0, 0, 0, 0),
            Err(DateTimeError::OutOfRange("date"))
        ));
        assert!(matches!(
            naive_from_fields(2021, 1, 1, 24, 0, 0, 0),
            Err(DateTimeError::OutOfRange("time"))
        ));
        assert!(matches!(
            naive_from_fields(2021, 1, 1, 0, 0, 59, 1_500_000_000),
            Err(DateTimeError::OutOfRange("nanosecond"))
        ));
    }

    #[test]
    fn parses_iso_forms() {
        let full = parse_iso("2020-09-01T09:01:00").unwrap();
        assert_eq!(full, naive_from_fields(2020, 9, 1, 9, 1, 0, 0).unwrap());
        assert_eq!(parse_iso("2020-09-01T09:01").unwrap(), full);
        assert_eq!(parse_iso("2020-09-01T09:01:00.5").unwrap().nanosecond(), 500_000_000);
        assert_eq!(parse_iso("2020-09-01").unwrap().hour(), 0);
        assert!(parse_iso("2020-13-01").is_err());
        assert!(parse_iso("yesterday").is_err());
    }

    #[test]
    fn leap_seconds_are_out_of_range() {
        assert!(matches!(
            parse_iso("2016-12-31T23:59:60"),
            Err(DateTimeError::OutOfRange("second"))
        ));
        let r = unsafe { intl_iso_date_time_from_string_v1(b"2016-12-31T23:59:60".as_ptr(), 19) };
        assert_eq!(r.into_result(), Err(ErrorCode::InvalidArgument));
        let r = intl_iso_date_time_create_v1(2016, 12, 31, 23, 59, 59, 1_000_000_000);
        assert_eq!(r.into_result(), Err(ErrorCode::InvalidArgument));
    }

    #[test]
    fn month_and_year_lengths() {
        let feb = NaiveDate::from_ymd_opt(2024, 2, 10).unwrap();
        assert_eq!(days_in_month(feb), 29);
        let dec = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(days_in_month(dec), 31);
        assert_eq!(days_in_year(2024), 366);
        assert_eq!(days_in_year(1900), 365);
    }

    #[test]
    fn buddhist_year_in_era() {
        let dt = DateTime {
            iso: naive_from_fields(2020, 1, 1, 0, 0, 0, 0).unwrap(),
            calendar: CalendarKind::Buddhist,
        };
        assert_eq!(dt.year_in_era(), 2563);
    }
}
