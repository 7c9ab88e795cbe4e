use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::{decode, guard, guard_or, intl_result_handle, AbiEnum, ErrorCode, Object};

use crate::locale::Locale;
use crate::options::CalendarKind;
use crate::provider::{DataError, DataProvider};

pub struct Calendar {
    pub kind: CalendarKind,
}

impl Object for Calendar {
    const KIND: &'static str = "Calendar";
}

/// Era index and year within that era for an ISO year.
///
/// Era indices follow the order of the locale data: Gregorian is `[BC, AD]`,
/// ISO and Buddhist have a single era.
pub fn era_year(kind: CalendarKind, iso_year: i32) -> (usize, i32) {
    match kind {
        CalendarKind::Iso => (0, iso_year),
        CalendarKind::Gregorian if iso_year > 0 => (1, iso_year),
        CalendarKind::Gregorian => (0, 1 - iso_year),
        CalendarKind::Buddhist => (0, iso_year + 543),
    }
}

/// Calendar a locale formats in: the `ca` keyword wins over locale data.
pub fn calendar_for_locale(
    provider: &DataProvider,
    locale: &Locale,
) -> Result<CalendarKind, DataError> {
    let kind = match locale.calendar_override() {
        Some(kind) => kind,
        None => provider.locale_data(locale)?.calendar,
    };
    if !provider.bundle().has_calendar(kind) {
        return Err(DataError::MissingKey("calendar"));
    }
    Ok(kind)
}

#[no_mangle]
pub extern "C" fn intl_calendar_create_for_kind_v1(
    provider: intl_handle,
    kind: u32,
) -> intl_result_handle {
    guard("calendar.create_for_kind", || {
        let p = handle::get::<DataProvider>(provider)?;
        let kind = decode::<CalendarKind>(kind)?;
        if !p.bundle().has_calendar(kind) {
            return Err(ErrorCode::DataNotFound);
        }
        handle::insert(Calendar { kind })
    })
}

#[no_mangle]
pub extern "C" fn intl_calendar_create_for_locale_v1(
    provider: intl_handle,
    locale: intl_handle,
) -> intl_result_handle {
    guard("calendar.create_for_locale", || {
        let p = handle::get::<DataProvider>(provider)?;
        let l = handle::get::<Locale>(locale)?;
        let kind = calendar_for_locale(&p, &l)?;
        handle::insert(Calendar { kind })
    })
}

#[no_mangle]
pub extern "C" fn intl_calendar_kind_v1(calendar: intl_handle) -> u32 {
    guard_or("calendar.kind", 0, || {
        handle::get::<Calendar>(calendar).map_or(0, |c| c.kind.to_abi())
    })
}

#[no_mangle]
pub extern "C" fn intl_calendar_destroy_v1(calendar: intl_handle) {
    crate::destroy::<Calendar>("calendar.destroy", calendar);
}
