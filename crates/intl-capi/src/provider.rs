//! Locale data and the provider handle that serves it.
//!
//! A provider wraps one immutable [`DataBundle`]. Objects built from a provider
//! copy what they need out of it, so they stay usable after the provider is
//! destroyed.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::{bytes_from_raw, guard, guard_void, ErrorCode, Object};
use intl_capi_core::{intl_result_handle, intl_result_void};
use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::locale::Locale;
use crate::options::{CalendarKind, CollatorCaseFirst, IsoWeekday};

#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("no data for locale {0}")]
    MissingLocale(String),
    #[error("no {0} data in provider")]
    MissingKey(&'static str),
    #[error("no {calendar} era names for locale {locale}")]
    MissingEras { locale: String, calendar: &'static str },
    #[error("malformed data payload: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("inconsistent data payload: {0}")]
    Inconsistent(String),
}

impl From<DataError> for ErrorCode {
    fn from(e: DataError) -> Self {
        match e {
            DataError::Malformed(_) | DataError::Inconsistent(_) => ErrorCode::ParseFailure,
            DataError::MissingLocale(_)
            | DataError::MissingKey(_)
            | DataError::MissingEras { .. } => ErrorCode::DataNotFound,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataBundle {
    pub calendars: Vec<CalendarKind>,
    pub segmenters: Vec<String>,
    pub unicode_properties: bool,
    pub collation: bool,
    pub locales: BTreeMap<String, LocaleData>,
    pub time_zones: Vec<ZoneIdRecord>,
    pub units: BTreeMap<String, UnitRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LocaleData {
    pub calendar: CalendarKind,
    /// Indexed by `DateLength`.
    pub date: [String; 4],
    /// Indexed by `TimeLength`.
    pub time: [String; 4],
    /// `{1}` is the date, `{0}` the time. Indexed by `DateLength`.
    pub glue: [String; 4],
    pub months_abbr: [String; 12],
    pub months_wide: [String; 12],
    /// Monday first.
    pub weekdays_abbr: [String; 7],
    pub weekdays_wide: [String; 7],
    pub day_periods: [String; 2],
    pub eras: BTreeMap<String, Vec<String>>,
    pub zone: ZoneFormatData,
    pub week: WeekData,
    #[serde(default)]
    pub collation: CollationDefaults,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneFormatData {
    /// `{0}` receives the signed offset.
    pub gmt: String,
    pub gmt_zero: String,
    pub unknown: String,
    /// `{0}` is the date/time pattern, `{1}` the zone field.
    pub append: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeekData {
    pub first_day: IsoWeekday,
    pub min_days: u8,
    pub weekend: Vec<IsoWeekday>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollationDefaults {
    pub case_first: CollatorCaseFirst,
    pub numeric: bool,
}

impl Default for CollationDefaults {
    fn default() -> Self {
        Self {
            case_first: CollatorCaseFirst::Off,
            numeric: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneIdRecord {
    pub bcp47: String,
    /// Canonical IANA name first, aliases after.
    pub iana: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitRecord {
    #[serde(default)]
    pub dims: BTreeMap<String, i8>,
    pub factor: f64,
    #[serde(default)]
    pub offset: f64,
}

impl DataBundle {
    pub fn from_json(bytes: &[u8]) -> Result<Self, DataError> {
        let bundle: DataBundle = serde_json::from_slice(bytes)?;
        bundle.validate()?;
        Ok(bundle)
    }

    fn validate(&self) -> Result<(), DataError> {
        for (name, data) in &self.locales {
            if !(1..=7).contains(&data.week.min_days) {
                return Err(DataError::Inconsistent(format!("{name}: min_days out of range")));
            }
        }
        for (name, unit) in &self.units {
            if !(unit.factor.is_finite() && unit.factor > 0.0 && unit.offset.is_finite()) {
                return Err(DataError::Inconsistent(format!("{name}: bad conversion factor")));
            }
        }
        Ok(())
    }

    pub fn has_calendar(&self, kind: CalendarKind) -> bool {
        self.calendars.contains(&kind)
    }

    pub fn has_segmenter(&self, name: &str) -> bool {
        self.segmenters.iter().any(|s| s == name)
    }
}

const COMPILED_JSON: &str = include_str!("../data/compiled.json");

static COMPILED: OnceCell<Arc<DataBundle>> = OnceCell::new();

fn compiled() -> Result<Arc<DataBundle>, DataError> {
    COMPILED
        .get_or_try_init(|| DataBundle::from_json(COMPILED_JSON.as_bytes()).map(Arc::new))
        .cloned()
}

pub struct DataProvider {
    bundle: Arc<DataBundle>,
    fallback: AtomicBool,
}

impl Object for DataProvider {
    const KIND: &'static str = "DataProvider";
}

impl DataProvider {
    pub fn new(bundle: Arc<DataBundle>, fallback: bool) -> Self {
        Self {
            bundle,
            fallback: AtomicBool::new(fallback),
        }
    }

    pub fn bundle(&self) -> &DataBundle {
        &self.bundle
    }

    pub fn shared_bundle(&self) -> Arc<DataBundle> {
        self.bundle.clone()
    }

    pub fn fallback_enabled(&self) -> bool {
        self.fallback.load(Ordering::Relaxed)
    }

    /// Resolves locale data along the fallback chain (`de-AT`, `de`, `und`),
    /// or by exact base name when fallback is off.
    pub fn locale_data(&self, locale: &Locale) -> Result<&LocaleData, DataError> {
        let chain = if self.fallback_enabled() {
            locale.fallback_chain()
        } else {
            vec![locale.basename()]
        };
        for key in &chain {
            if let Some(data) = self.bundle.locales.get(key) {
                tracing::trace!(
                    target: "intl_capi::provider",
                    requested = %locale.basename(),
                    resolved = %key,
                    "locale data resolved"
                );
                return Ok(data);
            }
        }
        Err(DataError::MissingLocale(locale.basename()))
    }
}

#[no_mangle]
pub extern "C" fn intl_data_provider_create_compiled_v1() -> intl_result_handle {
    guard("data_provider.create_compiled", || {
        let bundle = compiled().map_err(|e| {
            tracing::error!(target: "intl_capi::provider", error = %e, "compiled data unavailable");
            ErrorCode::from(e)
        })?;
        handle::insert(DataProvider::new(bundle, true))
    })
}

/// Every lookup through this provider fails with `DataNotFound`.
#[no_mangle]
pub extern "C" fn intl_data_provider_create_empty_v1() -> intl_result_handle {
    guard("data_provider.create_empty", || {
        handle::insert(DataProvider::new(Arc::new(DataBundle::default()), false))
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_data_provider_create_from_json_v1(
    ptr: *const u8,
    len: usize,
) -> intl_result_handle {
    guard("data_provider.create_from_json", || {
        let bytes = bytes_from_raw(ptr, len)?;
        let bundle = DataBundle::from_json(bytes).map_err(|e| {
            tracing::debug!(target: "intl_capi::provider", error = %e, "rejected data payload");
            ErrorCode::from(e)
        })?;
        handle::insert(DataProvider::new(Arc::new(bundle), false))
    })
}

#[no_mangle]
pub extern "C" fn intl_data_provider_enable_locale_fallback_v1(
    provider: intl_handle,
) -> intl_result_void {
    guard_void("data_provider.enable_locale_fallback", || {
        let p = handle::get::<DataProvider>(provider)?;
        p.fallback.store(true, Ordering::Relaxed);
        Ok(())
    })
}

#[no_mangle]
pub extern "C" fn intl_data_provider_destroy_v1(provider: intl_handle) {
    crate::destroy::<DataProvider>("data_provider.destroy", provider);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiled_bundle_parses() {
        let b = compiled().unwrap();
        assert!(b.locales.contains_key("und"));
        assert!(b.has_calendar(CalendarKind::Buddhist));
        assert_eq!(b.locales["th"].calendar, CalendarKind::Buddhist);
        assert_eq!(b.locales["en"].week.first_day, IsoWeekday::Sunday);
    }

    #[test]
    fn fallback_chain_is_followed_only_when_enabled() {
        let locale = Locale::parse("de-AT").unwrap();
        let p = DataProvider::new(compiled().unwrap(), false);
        assert!(matches!(p.locale_data(&locale), Err(DataError::MissingLocale(_))));
        p.fallback.store(true, Ordering::Relaxed);
        assert_eq!(p.locale_data(&locale).unwrap().glue[0], "{1} 'um' {0}");

        let unknown = Locale::parse("sw").unwrap();
        assert_eq!(p.locale_data(&unknown).unwrap().months_abbr[0], "M01");
    }

    #[test]
    fn malformed_payloads_are_parse_failures() {
        let e = DataBundle::from_json(b"{ not json").unwrap_err();
        assert_eq!(ErrorCode::from(e), ErrorCode::ParseFailure);
        let e = DataBundle::from_json(br#"{"units":{"x":{"factor":0.0}}}"#).unwrap_err();
        assert_eq!(ErrorCode::from(e), ErrorCode::ParseFailure);
        let empty = DataBundle::from_json(b"{}").unwrap();
        assert!(empty.locales.is_empty());
    }
}
