//! IANA <-> BCP-47 time zone identifier mapping.

use std::collections::HashMap;
use std::fmt::Write as _;

use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::sink::{fmt_error, with_sink};
use intl_capi_core::{guard, guard_void, intl_result_handle, intl_result_void, intl_write};
use intl_capi_core::{utf8_from_raw, ErrorCode, Object};

use crate::provider::{DataProvider, ZoneIdRecord};

pub struct TimeZoneIdMapper {
    records: Vec<ZoneIdRecord>,
    /// Lowercased IANA name -> (record, alias) index.
    by_iana: HashMap<String, (usize, usize)>,
    by_bcp47: HashMap<String, usize>,
}

impl Object for TimeZoneIdMapper {
    const KIND: &'static str = "TimeZoneIdMapper";
}

impl TimeZoneIdMapper {
    pub fn new(records: Vec<ZoneIdRecord>) -> Self {
        let mut by_iana = HashMap::new();
        let mut by_bcp47 = HashMap::new();
        for (r, rec) in records.iter().enumerate() {
            by_bcp47.entry(rec.bcp47.clone()).or_insert(r);
            for (a, name) in rec.iana.iter().enumerate() {
                by_iana.entry(name.to_ascii_lowercase()).or_insert((r, a));
            }
        }
        Self {
            records,
            by_iana,
            by_bcp47,
        }
    }

    fn lookup(&self, iana: &str) -> Option<(usize, usize)> {
        self.by_iana.get(&iana.to_ascii_lowercase()).copied()
    }

    pub fn iana_to_bcp47(&self, iana: &str) -> Option<&str> {
        let (r, _) = self.lookup(iana)?;
        Some(&self.records[r].bcp47)
    }

    /// The IANA name in its registered spelling.
    pub fn normalize_iana(&self, iana: &str) -> Option<&str> {
        let (r, a) = self.lookup(iana)?;
        Some(&self.records[r].iana[a])
    }

    /// The canonical IANA name of the zone `iana` belongs to.
    pub fn canonicalize_iana(&self, iana: &str) -> Option<&str> {
        let (r, _) = self.lookup(iana)?;
        self.records[r].iana.first().map(String::as_str)
    }

    pub fn find_canonical_iana_from_bcp47(&self, bcp47: &str) -> Option<&str> {
        let r = *self.by_bcp47.get(bcp47)?;
        self.records[r].iana.first().map(String::as_str)
    }
}

#[no_mangle]
pub extern "C" fn intl_time_zone_id_mapper_create_v1(provider: intl_handle) -> intl_result_handle {
    guard("time_zone_id_mapper.create", || {
        let p = handle::get::<DataProvider>(provider)?;
        let records = &p.bundle().time_zones;
        if records.is_empty() {
            return Err(ErrorCode::DataNotFound);
        }
        handle::insert(TimeZoneIdMapper::new(records.clone()))
    })
}

unsafe fn mapped(
    op: &'static str,
    mapper: intl_handle,
    ptr: *const u8,
    len: usize,
    write: *mut intl_write,
    f: impl FnOnce(&TimeZoneIdMapper, &str) -> Option<String>,
) -> intl_result_void {
    guard_void(op, || {
        let m = handle::get::<TimeZoneIdMapper>(mapper)?;
        let value = utf8_from_raw(ptr, len)?;
        let out = f(&m, value).ok_or(ErrorCode::DataNotFound)?;
        with_sink(write, |w| w.write_str(&out).map_err(|_| fmt_error(w)))
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_time_zone_id_mapper_iana_to_bcp47_v1(
    mapper: intl_handle,
    ptr: *const u8,
    len: usize,
    write: *mut intl_write,
) -> intl_result_void {
    mapped("time_zone_id_mapper.iana_to_bcp47", mapper, ptr, len, write, |m, v| {
        m.iana_to_bcp47(v).map(str::to_owned)
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_time_zone_id_mapper_normalize_iana_v1(
    mapper: intl_handle,
    ptr: *const u8,
    len: usize,
    write: *mut intl_write,
) -> intl_result_void {
    mapped("time_zone_id_mapper.normalize_iana", mapper, ptr, len, write, |m, v| {
        m.normalize_iana(v).map(str::to_owned)
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_time_zone_id_mapper_canonicalize_iana_v1(
    mapper: intl_handle,
    ptr: *const u8,
    len: usize,
    write: *mut intl_write,
) -> intl_result_void {
    mapped("time_zone_id_mapper.canonicalize_iana", mapper, ptr, len, write, |m, v| {
        m.canonicalize_iana(v).map(str::to_owned)
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_time_zone_id_mapper_find_canonical_iana_from_bcp47_v1(
    mapper: intl_handle,
    ptr: *const u8,
    len: usize,
    write: *mut intl_write,
) -> intl_result_void {
    mapped("time_zone_id_mapper.find_canonical_iana_from_bcp47", mapper, ptr, len, write, |m, v| {
        m.find_canonical_iana_from_bcp47(v).map(str::to_owned)
    })
}

#[no_mangle]
pub extern "C" fn intl_time_zone_id_mapper_destroy_v1(mapper: intl_handle) {
    crate::destroy::<TimeZoneIdMapper>("time_zone_id_mapper.destroy", mapper);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mapper() -> TimeZoneIdMapper {
        TimeZoneIdMapper::new(vec![
            ZoneIdRecord {
                bcp47: "inccu".into(),
                iana: vec!["Asia/Kolkata".into(), "Asia/Calcutta".into()],
            },
            ZoneIdRecord {
                bcp47: "usnyc".into(),
                iana: vec!["America/New_York".into(), "US/Eastern".into()],
            },
        ])
    }

    #[test]
    fn lookups_are_case_insensitive() {
        let m = mapper();
        assert_eq!(m.iana_to_bcp47("asia/calcutta"), Some("inccu"));
        assert_eq!(m.normalize_iana("asia/calcutta"), Some("Asia/Calcutta"));
        assert_eq!(m.canonicalize_iana("ASIA/CALCUTTA"), Some("Asia/Kolkata"));
        assert_eq!(m.find_canonical_iana_from_bcp47("usnyc"), Some("America/New_York"));
    }

    #[test]
    fn unknown_ids_miss() {
        let m = mapper();
        assert_eq!(m.iana_to_bcp47("Mars/Olympus"), None);
        assert_eq!(m.find_canonical_iana_from_bcp47("USNYC"), None);
    }
}
