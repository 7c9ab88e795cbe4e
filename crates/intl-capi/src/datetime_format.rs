//! Date/time formatters built from locale patterns.
//!
//! A formatter resolves its pattern and every symbol it needs at construction,
//! so formatting only fails on caller input (calendar mismatch, missing
//! offset) or on the sink.

use std::fmt::Write as _;

use chrono::{Datelike, NaiveDateTime, Timelike};
use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::sink::with_sink;
use intl_capi_core::{decode, guard, guard_or, guard_void, intl_result_handle, intl_result_void};
use intl_capi_core::{intl_write, ErrorCode, Object, Sink};

use crate::calendar::{calendar_for_locale, era_year};
use crate::datetime::{DateTime, IsoDateTime};
use crate::locale::Locale;
use crate::options::{
    intl_iso_time_zone_options, CalendarKind, DateLength, IsoTimeZoneFormat,
    IsoTimeZoneMinuteDisplay, IsoTimeZoneOptions, IsoTimeZoneSecondDisplay, TimeLength,
};
use crate::pattern::{Field, Item, Pattern};
use crate::provider::{DataError, DataProvider, LocaleData, ZoneFormatData};
use crate::timezone::CustomTimeZone;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("time zone has no GMT offset")]
    MissingOffset,
    #[error("formatter calendar is {expected:?}, date-time calendar is {found:?}")]
    CalendarMismatch { expected: CalendarKind, found: CalendarKind },
}

impl From<FormatError> for ErrorCode {
    fn from(_: FormatError) -> Self {
        ErrorCode::InvalidArgument
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneStyle {
    LocalizedGmt,
    Iso8601(IsoTimeZoneOptions),
}

/// Rendering of an offset the caller did not supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingOffset {
    Fail,
    Placeholder,
}

#[derive(Debug, Clone)]
struct Symbols {
    months_abbr: [String; 12],
    months_wide: [String; 12],
    weekdays_abbr: [String; 7],
    weekdays_wide: [String; 7],
    day_periods: [String; 2],
    eras: Vec<String>,
    zone: ZoneFormatData,
}

#[derive(Debug, Clone)]
pub struct Formatter {
    pattern: Pattern,
    calendar: CalendarKind,
    symbols: Symbols,
    zone_style: ZoneStyle,
}

/// Which pieces of the locale's patterns a formatter uses.
#[derive(Debug, Clone, Copy)]
pub enum Lengths {
    Date(DateLength),
    Time(TimeLength),
    DateTime(DateLength, TimeLength),
}

fn iso_offset(secs: i32, opts: IsoTimeZoneOptions) -> String {
    let utc = matches!(opts.format, IsoTimeZoneFormat::UtcBasic | IsoTimeZoneFormat::UtcExtended);
    if utc && secs == 0 {
        return "Z".to_owned();
    }
    let extended = matches!(
        opts.format,
        IsoTimeZoneFormat::Extended | IsoTimeZoneFormat::UtcExtended
    );
    let sep = if extended { ":" } else { "" };
    let abs = secs.unsigned_abs();
    let (h, m, s) = (abs / 3600, abs % 3600 / 60, abs % 60);
    let show_seconds = opts.seconds == IsoTimeZoneSecondDisplay::Optional && s != 0;
    let show_minutes = opts.minutes == IsoTimeZoneMinuteDisplay::Required || m != 0 || show_seconds;

    let mut out = String::new();
    out.push(if secs < 0 { '-' } else { '+' });
    let _ = write!(out, "{h:02}");
    if show_minutes {
        let _ = write!(out, "{sep}{m:02}");
    }
    if show_seconds {
        let _ = write!(out, "{sep}{s:02}");
    }
    out
}

fn iso_options_for(field: Field) -> Option<IsoTimeZoneOptions> {
    use IsoTimeZoneFormat::{Basic, Extended, UtcBasic, UtcExtended};
    use IsoTimeZoneMinuteDisplay::{Optional, Required};
    let (format, minutes) = match field {
        Field::ZoneIsoUtc(1) => (UtcBasic, Optional),
        Field::ZoneIsoUtc(2) => (UtcBasic, Required),
        Field::ZoneIsoUtc(_) => (UtcExtended, Required),
        Field::ZoneIso(1) => (Basic, Optional),
        Field::ZoneIso(2) => (Basic, Required),
        Field::ZoneIso(_) => (Extended, Required),
        _ => return None,
    };
    Some(IsoTimeZoneOptions {
        format,
        minutes,
        seconds: IsoTimeZoneSecondDisplay::Never,
    })
}

impl Symbols {
    fn gmt(&self, secs: i32, long: bool) -> String {
        if secs == 0 {
            return self.zone.gmt_zero.clone();
        }
        let abs = secs.unsigned_abs();
        let (h, m, s) = (abs / 3600, abs % 3600 / 60, abs % 60);
        let mut offset = String::new();
        offset.push(if secs < 0 { '-' } else { '+' });
        if long {
            let _ = write!(offset, "{h:02}:{m:02}");
        } else {
            let _ = write!(offset, "{h}");
            if m != 0 || s != 0 {
                let _ = write!(offset, ":{m:02}");
            }
        }
        if s != 0 {
            let _ = write!(offset, ":{s:02}");
        }
        self.zone.gmt.replace("{0}", &offset)
    }
}

impl Formatter {
    pub fn new(
        provider: &DataProvider,
        locale: &Locale,
        lengths: Lengths,
        zoned: Option<ZoneStyle>,
    ) -> Result<Self, ErrorCode> {
        let data = provider.locale_data(locale)?;
        let calendar = calendar_for_locale(provider, locale)?;
        let date = |len: DateLength| Pattern::parse(&data.date[len.to_index()]);
        let time = |len: TimeLength| -> Result<Pattern, crate::pattern::PatternError> {
            let p = Pattern::parse(&data.time[len.to_index()])?;
            Ok(if zoned.is_some() { p } else { p.without_zone() })
        };
        let mut pattern = match lengths {
            Lengths::Date(d) => date(d)?,
            Lengths::Time(t) => time(t)?,
            Lengths::DateTime(d, t) => {
                Pattern::compose(&data.glue[d.to_index()], &[&time(t)?, &date(d)?])?
            }
        };
        if zoned.is_some() && !pattern.has_zone() {
            let zone = Pattern::from_field(Field::ZoneSpecific(1));
            pattern = Pattern::compose(&data.zone.append, &[&pattern, &zone])?;
        }
        let symbols = Self::symbols(data, calendar, locale, &pattern)?;
        Ok(Self {
            pattern,
            calendar,
            symbols,
            zone_style: zoned.unwrap_or(ZoneStyle::LocalizedGmt),
        })
    }

    fn symbols(
        data: &LocaleData,
        calendar: CalendarKind,
        locale: &Locale,
        pattern: &Pattern,
    ) -> Result<Symbols, DataError> {
        let eras = data.eras.get(calendar.data_key()).cloned().unwrap_or_default();
        let eras_needed = if calendar == CalendarKind::Gregorian { 2 } else { 1 };
        if pattern.fields().any(|f| matches!(f, Field::Era(_))) && eras.len() < eras_needed {
            return Err(DataError::MissingEras {
                locale: locale.basename(),
                calendar: calendar.data_key(),
            });
        }
        Ok(Symbols {
            months_abbr: data.months_abbr.clone(),
            months_wide: data.months_wide.clone(),
            weekdays_abbr: data.weekdays_abbr.clone(),
            weekdays_wide: data.weekdays_wide.clone(),
            day_periods: data.day_periods.clone(),
            eras,
            zone: data.zone.clone(),
        })
    }

    pub fn calendar(&self) -> CalendarKind {
        self.calendar
    }

    /// Date-times in the ISO calendar are accepted by every formatter; others
    /// must match the formatter's calendar.
    pub fn check_calendar(&self, dt: &DateTime) -> Result<(), FormatError> {
        if dt.calendar == self.calendar || dt.calendar == CalendarKind::Iso {
            Ok(())
        } else {
            Err(FormatError::CalendarMismatch {
                expected: self.calendar,
                found: dt.calendar,
            })
        }
    }

    /// Renders `dt`. `offset` is `None` for an unzoned format call and
    /// `Some(None)` for a zone without a GMT offset.
    pub fn render(
        &self,
        dt: NaiveDateTime,
        offset: Option<Option<i32>>,
        missing: MissingOffset,
    ) -> Result<String, FormatError> {
        let sym = &self.symbols;
        let mut out = String::new();
        for item in self.pattern.items() {
            let field = match item {
                Item::Literal(s) => {
                    out.push_str(s);
                    continue;
                }
                Item::Field(f) => *f,
            };
            // Writes into a String cannot fail.
            let _ = match field {
                Field::Era(_) => {
                    let (era, _) = era_year(self.calendar, dt.year());
                    write!(out, "{}", sym.eras.get(era).map(String::as_str).unwrap_or_default())
                }
                Field::Year(w) => {
                    let (_, y) = era_year(self.calendar, dt.year());
                    match w {
                        1 => write!(out, "{y}"),
                        2 => write!(out, "{:02}", y.rem_euclid(100)),
                        w => {
                            if y < 0 {
                                out.push('-');
                            }
                            write!(out, "{:0width$}", y.unsigned_abs(), width = w as usize)
                        }
                    }
                }
                Field::Month(w) => {
                    let m = dt.month0() as usize;
                    match w {
                        1 => write!(out, "{}", m + 1),
                        2 => write!(out, "{:02}", m + 1),
                        3 => out.write_str(&sym.months_abbr[m]),
                        _ => out.write_str(&sym.months_wide[m]),
                    }
                }
                Field::Day(w) => write!(out, "{:0width$}", dt.day(), width = w as usize),
                Field::Weekday(w) => {
                    let d = dt.weekday().num_days_from_monday() as usize;
                    if w == 4 {
                        out.write_str(&sym.weekdays_wide[d])
                    } else {
                        out.write_str(&sym.weekdays_abbr[d])
                    }
                }
                Field::Hour12(w) => {
                    let h = match dt.hour() % 12 {
                        0 => 12,
                        h => h,
                    };
                    write!(out, "{:0width$}", h, width = w as usize)
                }
                Field::Hour24(w) => write!(out, "{:0width$}", dt.hour(), width = w as usize),
                Field::Minute(w) => write!(out, "{:0width$}", dt.minute(), width = w as usize),
                Field::Second(w) => write!(out, "{:0width$}", dt.second(), width = w as usize),
                Field::DayPeriod(_) => {
                    out.write_str(&sym.day_periods[usize::from(dt.hour() >= 12)])
                }
                zone => {
                    let text = self.zone_text(zone, offset.flatten(), missing)?;
                    out.write_str(&text)
                }
            };
        }
        Ok(out)
    }

    fn zone_text(
        &self,
        field: Field,
        offset: Option<i32>,
        missing: MissingOffset,
    ) -> Result<String, FormatError> {
        let iso = match (field, self.zone_style) {
            (Field::ZoneSpecific(_), ZoneStyle::Iso8601(opts)) => Some(opts),
            (f, _) => iso_options_for(f),
        };
        let Some(secs) = offset else {
            return match missing {
                MissingOffset::Fail => Err(FormatError::MissingOffset),
                MissingOffset::Placeholder if iso.is_some() => Ok("+?".to_owned()),
                MissingOffset::Placeholder => Ok(self.symbols.zone.unknown.clone()),
            };
        };
        Ok(match (iso, field) {
            (Some(opts), _) => iso_offset(secs, opts),
            (None, Field::ZoneSpecific(4) | Field::ZoneGmt(4)) => self.symbols.gmt(secs, true),
            (None, _) => self.symbols.gmt(secs, false),
        })
    }
}

trait ToIndex {
    fn to_index(self) -> usize;
}

impl ToIndex for DateLength {
    fn to_index(self) -> usize {
        self as usize
    }
}

impl ToIndex for TimeLength {
    fn to_index(self) -> usize {
        self as usize
    }
}

pub struct DateFormatter(Formatter);
pub struct TimeFormatter(Formatter);
pub struct DateTimeFormatter(Formatter);
pub struct ZonedDateTimeFormatter(Formatter);
pub struct GregorianZonedDateTimeFormatter(Formatter);

impl Object for DateFormatter {
    const KIND: &'static str = "DateFormatter";
}

impl Object for TimeFormatter {
    const KIND: &'static str = "TimeFormatter";
}

impl Object for DateTimeFormatter {
    const KIND: &'static str = "DateTimeFormatter";
}

impl Object for ZonedDateTimeFormatter {
    const KIND: &'static str = "ZonedDateTimeFormatter";
}

impl Object for GregorianZonedDateTimeFormatter {
    const KIND: &'static str = "GregorianZonedDateTimeFormatter";
}

fn build(
    provider: intl_handle,
    locale: intl_handle,
    lengths: Lengths,
    zoned: Option<ZoneStyle>,
) -> Result<Formatter, ErrorCode> {
    let p = handle::get::<DataProvider>(provider)?;
    let l = handle::get::<Locale>(locale)?;
    Formatter::new(&p, &l, lengths, zoned)
}

fn gregorian_only(f: Formatter) -> Result<GregorianZonedDateTimeFormatter, ErrorCode> {
    if f.calendar() != CalendarKind::Gregorian {
        tracing::debug!(
            target: "intl_capi::datetime_format",
            calendar = ?f.calendar(),
            "gregorian formatter refused"
        );
        return Err(ErrorCode::UnsupportedOption);
    }
    Ok(GregorianZonedDateTimeFormatter(f))
}

unsafe fn emit(write: *mut intl_write, text: &str) -> Result<(), ErrorCode> {
    with_sink(write, |w| w.append(text.as_bytes()))
}

fn zone_offset(tz: intl_handle) -> Result<Option<i32>, ErrorCode> {
    Ok(handle::get::<CustomTimeZone>(tz)?.snapshot().offset)
}

#[no_mangle]
pub extern "C" fn intl_date_formatter_create_with_length_v1(
    provider: intl_handle,
    locale: intl_handle,
    length: u32,
) -> intl_result_handle {
    guard("date_formatter.create_with_length", || {
        let f = build(provider, locale, Lengths::Date(decode(length)?), None)?;
        handle::insert(DateFormatter(f))
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_date_formatter_format_iso_date_time_v1(
    fmt: intl_handle,
    dt: intl_handle,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("date_formatter.format_iso_date_time", || {
        let f = handle::get::<DateFormatter>(fmt)?;
        let d = handle::get::<IsoDateTime>(dt)?;
        let text = f.0.render(d.0, None, MissingOffset::Fail)?;
        emit(write, &text)
    })
}

/// Date-times in another calendar than the formatter's are rejected.
#[no_mangle]
pub unsafe extern "C" fn intl_date_formatter_format_datetime_v1(
    fmt: intl_handle,
    dt: intl_handle,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("date_formatter.format_datetime", || {
        let f = handle::get::<DateFormatter>(fmt)?;
        let d = handle::get::<DateTime>(dt)?;
        f.0.check_calendar(&d)?;
        let text = f.0.render(d.iso, None, MissingOffset::Fail)?;
        emit(write, &text)
    })
}

#[no_mangle]
pub extern "C" fn intl_date_formatter_destroy_v1(fmt: intl_handle) {
    crate::destroy::<DateFormatter>("date_formatter.destroy", fmt);
}

#[no_mangle]
pub extern "C" fn intl_time_formatter_create_with_length_v1(
    provider: intl_handle,
    locale: intl_handle,
    length: u32,
) -> intl_result_handle {
    guard("time_formatter.create_with_length", || {
        let f = build(provider, locale, Lengths::Time(decode(length)?), None)?;
        handle::insert(TimeFormatter(f))
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_time_formatter_format_iso_date_time_v1(
    fmt: intl_handle,
    dt: intl_handle,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("time_formatter.format_iso_date_time", || {
        let f = handle::get::<TimeFormatter>(fmt)?;
        let d = handle::get::<IsoDateTime>(dt)?;
        let text = f.0.render(d.0, None, MissingOffset::Fail)?;
        emit(write, &text)
    })
}

/// Times carry no calendar fields, so any calendar is accepted.
#[no_mangle]
pub unsafe extern "C" fn intl_time_formatter_format_datetime_v1(
    fmt: intl_handle,
    dt: intl_handle,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("time_formatter.format_datetime", || {
        let f = handle::get::<TimeFormatter>(fmt)?;
        let d = handle::get::<DateTime>(dt)?;
        let text = f.0.render(d.iso, None, MissingOffset::Fail)?;
        emit(write, &text)
    })
}

#[no_mangle]
pub extern "C" fn intl_time_formatter_destroy_v1(fmt: intl_handle) {
    crate::destroy::<TimeFormatter>("time_formatter.destroy", fmt);
}

#[no_mangle]
pub extern "C" fn intl_date_time_formatter_create_with_lengths_v1(
    provider: intl_handle,
    locale: intl_handle,
    date_length: u32,
    time_length: u32,
) -> intl_result_handle {
    guard("date_time_formatter.create_with_lengths", || {
        let lengths = Lengths::DateTime(decode(date_length)?, decode(time_length)?);
        let f = build(provider, locale, lengths, None)?;
        handle::insert(DateTimeFormatter(f))
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_date_time_formatter_format_iso_datetime_v1(
    fmt: intl_handle,
    dt: intl_handle,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("date_time_formatter.format_iso_datetime", || {
        let f = handle::get::<DateTimeFormatter>(fmt)?;
        let d = handle::get::<IsoDateTime>(dt)?;
        let text = f.0.render(d.0, None, MissingOffset::Fail)?;
        emit(write, &text)
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_date_time_formatter_format_datetime_v1(
    fmt: intl_handle,
    dt: intl_handle,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("date_time_formatter.format_datetime", || {
        let f = handle::get::<DateTimeFormatter>(fmt)?;
        let d = handle::get::<DateTime>(dt)?;
        f.0.check_calendar(&d)?;
        let text = f.0.render(d.iso, None, MissingOffset::Fail)?;
        emit(write, &text)
    })
}

#[no_mangle]
pub extern "C" fn intl_date_time_formatter_destroy_v1(fmt: intl_handle) {
    crate::destroy::<DateTimeFormatter>("date_time_formatter.destroy", fmt);
}

#[no_mangle]
pub extern "C" fn intl_zoned_date_time_formatter_create_with_lengths_v1(
    provider: intl_handle,
    locale: intl_handle,
    date_length: u32,
    time_length: u32,
) -> intl_result_handle {
    guard("zoned_date_time_formatter.create_with_lengths", || {
        let lengths = Lengths::DateTime(decode(date_length)?, decode(time_length)?);
        let f = build(provider, locale, lengths, Some(ZoneStyle::LocalizedGmt))?;
        handle::insert(ZonedDateTimeFormatter(f))
    })
}

#[no_mangle]
pub extern "C" fn intl_zoned_date_time_formatter_create_with_lengths_and_iso_8601_time_zone_fallback_v1(
    provider: intl_handle,
    locale: intl_handle,
    date_length: u32,
    time_length: u32,
    zone_options: intl_iso_time_zone_options,
) -> intl_result_handle {
    guard("zoned_date_time_formatter.create_with_iso_fallback", || {
        let lengths = Lengths::DateTime(decode(date_length)?, decode(time_length)?);
        let style = ZoneStyle::Iso8601(IsoTimeZoneOptions::try_from(zone_options)?);
        let f = build(provider, locale, lengths, Some(style))?;
        handle::insert(ZonedDateTimeFormatter(f))
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_zoned_date_time_formatter_format_datetime_with_custom_time_zone_v1(
    fmt: intl_handle,
    dt: intl_handle,
    tz: intl_handle,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("zoned_date_time_formatter.format_datetime_with_zone", || {
        let f = handle::get::<ZonedDateTimeFormatter>(fmt)?;
        let d = handle::get::<DateTime>(dt)?;
        f.0.check_calendar(&d)?;
        let text = f.0.render(d.iso, Some(zone_offset(tz)?), MissingOffset::Fail)?;
        emit(write, &text)
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_zoned_date_time_formatter_format_iso_datetime_with_custom_time_zone_v1(
    fmt: intl_handle,
    dt: intl_handle,
    tz: intl_handle,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("zoned_date_time_formatter.format_iso_datetime_with_zone", || {
        let f = handle::get::<ZonedDateTimeFormatter>(fmt)?;
        let d = handle::get::<IsoDateTime>(dt)?;
        let text = f.0.render(d.0, Some(zone_offset(tz)?), MissingOffset::Fail)?;
        emit(write, &text)
    })
}

#[no_mangle]
pub extern "C" fn intl_zoned_date_time_formatter_destroy_v1(fmt: intl_handle) {
    crate::destroy::<ZonedDateTimeFormatter>("zoned_date_time_formatter.destroy", fmt);
}

#[no_mangle]
pub extern "C" fn intl_gregorian_zoned_date_time_formatter_create_with_lengths_v1(
    provider: intl_handle,
    locale: intl_handle,
    date_length: u32,
    time_length: u32,
) -> intl_result_handle {
    guard("gregorian_zoned_formatter.create_with_lengths", || {
        let lengths = Lengths::DateTime(decode(date_length)?, decode(time_length)?);
        let f = build(provider, locale, lengths, Some(ZoneStyle::LocalizedGmt))?;
        handle::insert(gregorian_only(f)?)
    })
}

#[no_mangle]
pub extern "C" fn intl_gregorian_zoned_date_time_formatter_create_with_lengths_and_iso_8601_time_zone_fallback_v1(
    provider: intl_handle,
    locale: intl_handle,
    date_length: u32,
    time_length: u32,
    zone_options: intl_iso_time_zone_options,
) -> intl_result_handle {
    guard("gregorian_zoned_formatter.create_with_iso_fallback", || {
        let lengths = Lengths::DateTime(decode(date_length)?, decode(time_length)?);
        let style = ZoneStyle::Iso8601(IsoTimeZoneOptions::try_from(zone_options)?);
        let f = build(provider, locale, lengths, Some(style))?;
        handle::insert(gregorian_only(f)?)
    })
}

/// Infallible: a zone without an offset renders the unknown-offset form.
/// Invalid handles and sink failures leave the sink as it was.
#[no_mangle]
pub unsafe extern "C" fn intl_gregorian_zoned_date_time_formatter_format_iso_datetime_with_custom_time_zone_v1(
    fmt: intl_handle,
    dt: intl_handle,
    tz: intl_handle,
    write: *mut intl_write,
) {
    guard_or("gregorian_zoned_formatter.format_iso_datetime_with_zone", (), || {
        let res: Result<(), ErrorCode> = (|| {
            let f = handle::get::<GregorianZonedDateTimeFormatter>(fmt)?;
            let d = handle::get::<IsoDateTime>(dt)?;
            let text = f.0.render(d.0, Some(zone_offset(tz)?), MissingOffset::Placeholder)?;
            emit(write, &text)
        })();
        if let Err(code) = res {
            tracing::warn!(
                target: "intl_capi::datetime_format",
                %code,
                "infallible format produced no output"
            );
        }
    })
}

#[no_mangle]
pub extern "C" fn intl_gregorian_zoned_date_time_formatter_destroy_v1(fmt: intl_handle) {
    crate::destroy::<GregorianZonedDateTimeFormatter>("gregorian_zoned_formatter.destroy", fmt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datetime::naive_from_fields;
    use crate::provider::DataBundle;
    use std::sync::Arc;

    fn provider() -> DataProvider {
        let json = include_str!("../data/compiled.json");
        DataProvider::new(Arc::new(DataBundle::from_json(json.as_bytes()).unwrap()), true)
    }

    fn fmt(locale: &str, lengths: Lengths, zoned: Option<ZoneStyle>) -> Formatter {
        Formatter::new(&provider(), &Locale::parse(locale).unwrap(), lengths, zoned).unwrap()
    }

    fn sample() -> NaiveDateTime {
        naive_from_fields(2020, 9, 1, 9, 1, 0, 0).unwrap()
    }

    fn medium_short(zone: ZoneStyle) -> Formatter {
        fmt("en", Lengths::DateTime(DateLength::Medium, TimeLength::Short), Some(zone))
    }

    fn plain(f: &Formatter) -> String {
        f.render(sample(), None, MissingOffset::Fail).unwrap()
    }

    #[test]
    fn english_medium_short_with_gmt() {
        let f = medium_short(ZoneStyle::LocalizedGmt);
        let s = f.render(sample(), Some(Some(-5 * 3600)), MissingOffset::Fail).unwrap();
        assert_eq!(s, "Sep 1, 2020, 9:01 AM GMT-5");
    }

    #[test]
    fn unzoned_full_time_drops_the_zone() {
        let f = fmt("en-US", Lengths::DateTime(DateLength::Full, TimeLength::Full), None);
        assert_eq!(plain(&f), "Tuesday, September 1, 2020 at 9:01:00 AM");
    }

    #[test]
    fn german_and_thai_patterns() {
        let de = fmt("de-AT", Lengths::DateTime(DateLength::Long, TimeLength::Medium), None);
        assert_eq!(plain(&de), "1. September 2020 um 09:01:00");

        let th = fmt("th", Lengths::Date(DateLength::Long), None);
        assert_eq!(th.calendar(), CalendarKind::Buddhist);
        assert_eq!(plain(&th), "1 กันยายน พ.ศ. 2563");
    }

    #[test]
    fn long_gmt_and_iso_styles() {
        let lengths = Lengths::DateTime(DateLength::Short, TimeLength::Full);
        let f = fmt("en", lengths, Some(ZoneStyle::LocalizedGmt));
        let s = f.render(sample(), Some(Some(5 * 3600 + 1800)), MissingOffset::Fail).unwrap();
        assert_eq!(s, "9/1/20, 9:01:00 AM GMT+05:30");

        let opts = IsoTimeZoneOptions {
            format: IsoTimeZoneFormat::UtcExtended,
            minutes: IsoTimeZoneMinuteDisplay::Required,
            seconds: IsoTimeZoneSecondDisplay::Never,
        };
        let f = medium_short(ZoneStyle::Iso8601(opts));
        let zoned = |offset| f.render(sample(), Some(offset), MissingOffset::Placeholder).unwrap();
        assert_eq!(zoned(Some(0)), "Sep 1, 2020, 9:01 AM Z");
        assert_eq!(zoned(Some(-18000)), "Sep 1, 2020, 9:01 AM -05:00");
        assert_eq!(zoned(None), "Sep 1, 2020, 9:01 AM +?");
    }

    #[test]
    fn missing_offset() {
        let f = medium_short(ZoneStyle::LocalizedGmt);
        let failed = f.render(sample(), Some(None), MissingOffset::Fail);
        assert_eq!(failed, Err(FormatError::MissingOffset));
        assert_eq!(
            f.render(sample(), Some(None), MissingOffset::Placeholder).unwrap(),
            "Sep 1, 2020, 9:01 AM GMT+?"
        );
    }

    #[test]
    fn iso_offset_variants() {
        let opts = |format, minutes, seconds| IsoTimeZoneOptions { format, minutes, seconds };
        use IsoTimeZoneFormat::*;
        use IsoTimeZoneMinuteDisplay as M;
        use IsoTimeZoneSecondDisplay as S;
        assert_eq!(iso_offset(0, opts(Basic, M::Required, S::Never)), "+0000");
        assert_eq!(iso_offset(-3600, opts(Basic, M::Optional, S::Never)), "-01");
        assert_eq!(iso_offset(19800, opts(Extended, M::Optional, S::Never)), "+05:30");
        assert_eq!(iso_offset(3601, opts(Extended, M::Optional, S::Optional)), "+01:00:01");
        assert_eq!(iso_offset(0, opts(UtcBasic, M::Required, S::Never)), "Z");
    }

    #[test]
    fn calendar_mismatch_is_rejected() {
        let f = fmt("en", Lengths::Date(DateLength::Short), None);
        let buddhist = DateTime {
            iso: sample(),
            calendar: CalendarKind::Buddhist,
        };
        assert!(matches!(f.check_calendar(&buddhist), Err(FormatError::CalendarMismatch { .. })));
        let iso = DateTime {
            iso: sample(),
            calendar: CalendarKind::Iso,
        };
        assert!(f.check_calendar(&iso).is_ok());
    }

    #[test]
    fn buddhist_keyword_overrides_locale_calendar() {
        let f = fmt("en-u-ca-buddhist", Lengths::Date(DateLength::Medium), None);
        assert_eq!(f.calendar(), CalendarKind::Buddhist);
        assert_eq!(f.render(sample(), None, MissingOffset::Fail).unwrap(), "Sep 1, 2563");
    }
}
