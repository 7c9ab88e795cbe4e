//! Week-of-year arithmetic for a first weekday and a minimum week length.

use chrono::{Datelike, NaiveDate};
use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::{
    decode, guard, guard_or, intl_result, intl_result_handle, AbiEnum, ErrorCode, Object,
};

use crate::datetime::{days_in_year, IsoDateTime};
use crate::locale::Locale;
use crate::options::{intl_week_of, intl_weekend_contains_day, IsoWeekday, WeekRelativeUnit};
use crate::provider::DataProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekCalculator {
    pub first_weekday: IsoWeekday,
    pub min_week_days: u8,
    /// Monday first.
    pub weekend: [bool; 7],
}

impl Object for WeekCalculator {
    const KIND: &'static str = "WeekCalculator";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekOf {
    pub week: u8,
    pub unit: WeekRelativeUnit,
}

impl WeekCalculator {
    pub fn new(first_weekday: IsoWeekday, min_week_days: u8) -> Result<Self, ErrorCode> {
        if !(1..=7).contains(&min_week_days) {
            return Err(ErrorCode::InvalidArgument);
        }
        let mut weekend = [false; 7];
        weekend[IsoWeekday::Saturday.index()] = true;
        weekend[IsoWeekday::Sunday.index()] = true;
        Ok(Self {
            first_weekday,
            min_week_days,
            weekend,
        })
    }

    pub fn for_locale(provider: &DataProvider, locale: &Locale) -> Result<Self, ErrorCode> {
        let week = &provider.locale_data(locale)?.week;
        let mut calc = Self::new(week.first_day, week.min_days)?;
        calc.weekend = [false; 7];
        for day in &week.weekend {
            calc.weekend[day.index()] = true;
        }
        Ok(calc)
    }

    /// Day index (0-based from January 1st, may be negative) at which week 1
    /// of a year starting on `start` begins.
    fn first_week_offset(&self, start: IsoWeekday) -> i32 {
        let days_into = (start.index() as i32 - self.first_weekday.index() as i32).rem_euclid(7);
        if 7 - days_into >= i32::from(self.min_week_days) {
            -days_into
        } else {
            7 - days_into
        }
    }

    fn year_offset(&self, year: i32) -> Option<i32> {
        let jan1 = NaiveDate::from_ymd_opt(year, 1, 1)?;
        Some(self.first_week_offset(IsoWeekday::from_chrono(jan1.weekday())))
    }

    /// Week number of `date`, relative to the year `date` falls in.
    pub fn week_of(&self, date: NaiveDate) -> Option<WeekOf> {
        let year = date.year();
        let day = date.ordinal0() as i32;
        let len = i32::from(days_in_year(year));
        let offset = self.year_offset(year)?;
        let next_start = len + self.year_offset(year + 1)?;

        let (unit, start) = if day >= next_start {
            (WeekRelativeUnit::Next, next_start)
        } else if day >= offset {
            (WeekRelativeUnit::Current, offset)
        } else {
            let prev_len = i32::from(days_in_year(year - 1));
            (WeekRelativeUnit::Previous, self.year_offset(year - 1)? - prev_len)
        };
        let week = (day - start) / 7 + 1;
        Some(WeekOf {
            week: u8::try_from(week).ok()?,
            unit,
        })
    }
}

#[no_mangle]
pub extern "C" fn intl_week_calculator_create_v1(
    provider: intl_handle,
    locale: intl_handle,
) -> intl_result_handle {
    guard("week_calculator.create", || {
        let p = handle::get::<DataProvider>(provider)?;
        let l = handle::get::<Locale>(locale)?;
        handle::insert(WeekCalculator::for_locale(&p, &l)?)
    })
}

#[no_mangle]
pub extern "C" fn intl_week_calculator_from_first_day_of_week_and_min_week_days_v1(
    first_weekday: u32,
    min_week_days: u8,
) -> intl_result_handle {
    guard("week_calculator.from_first_day_of_week_and_min_week_days", || {
        handle::insert(WeekCalculator::new(decode(first_weekday)?, min_week_days)?)
    })
}

#[no_mangle]
pub extern "C" fn intl_week_calculator_first_weekday_v1(calc: intl_handle) -> u32 {
    guard_or("week_calculator.first_weekday", 0, || {
        handle::get::<WeekCalculator>(calc).map_or(0, |c| c.first_weekday.to_abi())
    })
}

#[no_mangle]
pub extern "C" fn intl_week_calculator_min_week_days_v1(calc: intl_handle) -> u8 {
    guard_or("week_calculator.min_week_days", 0, || {
        handle::get::<WeekCalculator>(calc).map_or(0, |c| c.min_week_days)
    })
}

#[no_mangle]
pub extern "C" fn intl_week_calculator_weekend_v1(calc: intl_handle) -> intl_weekend_contains_day {
    guard_or("week_calculator.weekend", intl_weekend_contains_day::default(), || {
        handle::get::<WeekCalculator>(calc)
            .map_or_else(|_| intl_weekend_contains_day::default(), |c| c.weekend.into())
    })
}

#[no_mangle]
pub extern "C" fn intl_week_calculator_destroy_v1(calc: intl_handle) {
    crate::destroy::<WeekCalculator>("week_calculator.destroy", calc);
}

#[no_mangle]
pub extern "C" fn intl_iso_date_time_week_of_year_v1(
    dt: intl_handle,
    calc: intl_handle,
) -> intl_result<intl_week_of> {
    guard("iso_date_time.week_of_year", || {
        let d = handle::get::<IsoDateTime>(dt)?;
        let c = handle::get::<WeekCalculator>(calc)?;
        let w = c.week_of(d.0.date()).ok_or(ErrorCode::InvalidArgument)?;
        Ok(intl_week_of {
            week: w.week,
            unit: w.unit.to_abi(),
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn iso() -> WeekCalculator {
        WeekCalculator::new(IsoWeekday::Monday, 4).unwrap()
    }

    #[test]
    fn iso_year_boundaries() {
        let c = iso();
        assert_eq!(
            c.week_of(date(2021, 1, 1)),
            Some(WeekOf {
                week: 53,
                unit: WeekRelativeUnit::Previous
            })
        );
        assert_eq!(
            c.week_of(date(2021, 1, 4)),
            Some(WeekOf {
                week: 1,
                unit: WeekRelativeUnit::Current
            })
        );
        assert_eq!(
            c.week_of(date(2024, 12, 30)),
            Some(WeekOf {
                week: 1,
                unit: WeekRelativeUnit::Next
            })
        );
        assert_eq!(c.week_of(date(2020, 12, 31)).map(|w| w.week), Some(53));
    }

    #[test]
    fn sunday_start_single_day_minimum() {
        let c = WeekCalculator::new(IsoWeekday::Sunday, 1).unwrap();
        assert_eq!(
            c.week_of(date(2021, 1, 1)),
            Some(WeekOf {
                week: 1,
                unit: WeekRelativeUnit::Current
            })
        );
        assert_eq!(c.week_of(date(2021, 1, 3)).map(|w| w.week), Some(2));
    }

    #[test]
    fn min_days_must_fit_a_week() {
        assert_eq!(WeekCalculator::new(IsoWeekday::Monday, 0), Err(ErrorCode::InvalidArgument));
        assert_eq!(WeekCalculator::new(IsoWeekday::Monday, 8), Err(ErrorCode::InvalidArgument));
    }

    #[test]
    fn weekend_defaults_to_saturday_and_sunday() {
        let w: intl_weekend_contains_day = iso().weekend.into();
        assert!(w.saturday && w.sunday);
        assert!(!w.friday);
    }
}
