//! Code point sets and maps: property lookups, a mutable builder and range
//! iterators.
//!
//! Sets cover the whole code space `0..=0x10FFFF`, surrogates included, and
//! are stored as sorted, disjoint, non-adjacent inclusive ranges. Maps assign
//! a `u8` property value to every code point.

use std::sync::{Arc, Mutex};

use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::{guard, guard_or, intl_result_handle, ErrorCode, Object, Stepper};
use once_cell::sync::OnceCell;
use regex_syntax::hir::{Class, HirKind};

use crate::options::intl_code_point_range_result;
use crate::provider::DataProvider;

pub const MAX_CODE_POINT: u32 = 0x10FFFF;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<(u32, u32)>,
}

impl RangeSet {
    pub fn from_ranges(iter: impl IntoIterator<Item = (u32, u32)>) -> Self {
        let mut set = Self::default();
        for (lo, hi) in iter {
            set.add(lo, hi);
        }
        set
    }

    pub fn ranges(&self) -> &[(u32, u32)] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn contains(&self, cp: u32) -> bool {
        let idx = self.ranges.partition_point(|&(_, hi)| hi < cp);
        self.ranges.get(idx).is_some_and(|&(lo, _)| lo <= cp)
    }

    /// Adds `lo..=hi`, clamped to the code space. Empty ranges are ignored.
    pub fn add(&mut self, lo: u32, hi: u32) {
        let hi = hi.min(MAX_CODE_POINT);
        if lo > hi {
            return;
        }
        // First range that touches or follows `lo`, last range that touches `hi`.
        let start = self.ranges.partition_point(|&(_, h)| h.saturating_add(1) < lo);
        let end = self.ranges.partition_point(|&(l, _)| l <= hi.saturating_add(1));
        let (mut new_lo, mut new_hi) = (lo, hi);
        if start < end {
            new_lo = new_lo.min(self.ranges[start].0);
            new_hi = new_hi.max(self.ranges[end - 1].1);
        }
        self.ranges.splice(start..end, [(new_lo, new_hi)]);
    }

    pub fn remove(&mut self, lo: u32, hi: u32) {
        let hi = hi.min(MAX_CODE_POINT);
        if lo > hi {
            return;
        }
        let mut kept = Vec::with_capacity(self.ranges.len() + 1);
        for &(l, h) in &self.ranges {
            if h < lo || l > hi {
                kept.push((l, h));
                continue;
            }
            if l < lo {
                kept.push((l, lo - 1));
            }
            if h > hi {
                kept.push((hi + 1, h));
            }
        }
        self.ranges = kept;
    }

    pub fn complement(&self) -> Self {
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        let mut next = 0u32;
        for &(lo, hi) in &self.ranges {
            if lo > next {
                out.push((next, lo - 1));
            }
            next = hi + 1;
        }
        if next <= MAX_CODE_POINT {
            out.push((next, MAX_CODE_POINT));
        }
        Self { ranges: out }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PropertyError {
    #[error("malformed property name {0:?}")]
    Name(String),
    #[error("unknown property {0:?}")]
    Unknown(String),
}

impl From<PropertyError> for ErrorCode {
    fn from(_: PropertyError) -> Self {
        ErrorCode::DataNotFound
    }
}

const SURROGATES: (u32, u32) = (0xD800, 0xDFFF);

/// How a property relates to the surrogate block, which `regex-syntax` classes
/// cannot hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Surrogates {
    Excluded,
    Only,
    Included,
}

fn surrogate_coverage(name: &str) -> Surrogates {
    let loose: String = name
        .chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let value = ["gc=", "gc:", "generalcategory=", "generalcategory:"]
        .iter()
        .find_map(|p| loose.strip_prefix(p))
        .unwrap_or(loose.as_str());
    match value {
        "cs" | "surrogate" => Surrogates::Only,
        "c" | "other" | "any" | "assigned" => Surrogates::Included,
        _ => Surrogates::Excluded,
    }
}

/// Resolves a binary property, script or general category name through the
/// Unicode tables of `regex-syntax`.
pub fn property_set(name: &str) -> Result<RangeSet, PropertyError> {
    let well_formed = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | ' ' | '=' | ':'));
    if !well_formed {
        return Err(PropertyError::Name(name.to_owned()));
    }
    let coverage = surrogate_coverage(name);
    if coverage == Surrogates::Only {
        return Ok(RangeSet::from_ranges([SURROGATES]));
    }
    let hir = regex_syntax::Parser::new()
        .parse(&format!("\\p{{{name}}}"))
        .map_err(|_| PropertyError::Unknown(name.to_owned()))?;
    let HirKind::Class(Class::Unicode(cls)) = hir.kind() else {
        return Err(PropertyError::Unknown(name.to_owned()));
    };
    let mut set = RangeSet::from_ranges(
        cls.ranges()
            .iter()
            .map(|r| (u32::from(r.start()), u32::from(r.end()))),
    );
    if coverage == Surrogates::Included {
        set.add(SURROGATES.0, SURROGATES.1);
    }
    Ok(set)
}

/// General_Category values, numbered as in ICU's `UCharCategory`. Code points
/// in none of these are `Cn` (0).
pub const GENERAL_CATEGORIES: [(&str, u8); 29] = [
    ("Lu", 1),
    ("Ll", 2),
    ("Lt", 3),
    ("Lm", 4),
    ("Lo", 5),
    ("Mn", 6),
    ("Me", 7),
    ("Mc", 8),
    ("Nd", 9),
    ("Nl", 10),
    ("No", 11),
    ("Zs", 12),
    ("Zl", 13),
    ("Zp", 14),
    ("Cc", 15),
    ("Cf", 16),
    ("Co", 17),
    ("Cs", 18),
    ("Pd", 19),
    ("Ps", 20),
    ("Pe", 21),
    ("Pc", 22),
    ("Po", 23),
    ("Sm", 24),
    ("Sc", 25),
    ("Sk", 26),
    ("So", 27),
    ("Pi", 28),
    ("Pf", 29),
];

/// A total function from code points to `u8` values, stored as sorted runs
/// that cover `0..=0x10FFFF` with no gaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePointMap {
    runs: Vec<(u32, u32, u8)>,
    default: u8,
}

impl CodePointMap {
    /// Builds a map from possibly unsorted ranges. Code points not covered
    /// take `default`; where ranges overlap the earlier start wins.
    pub fn from_assignments(mut assigned: Vec<(u32, u32, u8)>, default: u8) -> Self {
        assigned.sort_unstable();
        let mut map = Self {
            runs: Vec::with_capacity(assigned.len() * 2 + 1),
            default,
        };
        let mut next = 0u32;
        for (lo, hi, value) in assigned {
            let (lo, hi) = (lo.max(next), hi.min(MAX_CODE_POINT));
            if lo > hi {
                continue;
            }
            if lo > next {
                map.push_run(next, lo - 1, default);
            }
            map.push_run(lo, hi, value);
            next = hi + 1;
        }
        if next <= MAX_CODE_POINT {
            map.push_run(next, MAX_CODE_POINT, default);
        }
        map
    }

    fn push_run(&mut self, lo: u32, hi: u32, value: u8) {
        if let Some(last) = self.runs.last_mut() {
            if last.2 == value && last.1 + 1 == lo {
                last.1 = hi;
                return;
            }
        }
        self.runs.push((lo, hi, value));
    }

    pub fn runs(&self) -> &[(u32, u32, u8)] {
        &self.runs
    }

    /// Values outside the code space read as the default.
    pub fn get(&self, cp: u32) -> u8 {
        let idx = self.runs.partition_point(|&(_, hi, _)| hi < cp);
        match self.runs.get(idx) {
            Some(&(lo, _, value)) if lo <= cp => value,
            _ => self.default,
        }
    }

    pub fn ranges_for(&self, value: u8) -> RangeSet {
        RangeSet::from_ranges(
            self.runs
                .iter()
                .filter(|r| r.2 == value)
                .map(|&(lo, hi, _)| (lo, hi)),
        )
    }
}

static GENERAL_CATEGORY: OnceCell<Arc<CodePointMap>> = OnceCell::new();

pub fn general_category_map() -> Result<Arc<CodePointMap>, PropertyError> {
    GENERAL_CATEGORY
        .get_or_try_init(|| {
            let mut assigned = Vec::new();
            for (name, value) in GENERAL_CATEGORIES {
                let set = property_set(name)?;
                assigned.extend(set.ranges().iter().map(|&(lo, hi)| (lo, hi, value)));
            }
            Ok(Arc::new(CodePointMap::from_assignments(assigned, 0)))
        })
        .cloned()
}

pub struct CodePointSetData {
    set: RangeSet,
}

impl Object for CodePointSetData {
    const KIND: &'static str = "CodePointSetData";
}

pub struct CodePointSetBuilder {
    set: Mutex<RangeSet>,
}

impl Object for CodePointSetBuilder {
    const KIND: &'static str = "CodePointSetBuilder";
}

pub struct CodePointMapData8 {
    map: Arc<CodePointMap>,
}

impl Object for CodePointMapData8 {
    const KIND: &'static str = "CodePointMapData8";
}

pub struct CodePointRangeIterator(Stepper<std::vec::IntoIter<(u32, u32)>>);

impl Object for CodePointRangeIterator {
    const KIND: &'static str = "CodePointRangeIterator";
}

fn require_properties(provider: intl_handle) -> Result<(), ErrorCode> {
    let p = handle::get::<DataProvider>(provider)?;
    if p.bundle().unicode_properties {
        Ok(())
    } else {
        Err(ErrorCode::DataNotFound)
    }
}

/// Iterators are bound to the set or map they walk.
fn range_iterator(owner: intl_handle, ranges: RangeSet) -> Result<intl_handle, ErrorCode> {
    let steps = Stepper::new(ranges.ranges.into_iter());
    handle::insert_dependent(owner, CodePointRangeIterator(steps))
}

#[no_mangle]
pub unsafe extern "C" fn intl_code_point_set_data_load_for_property_v1(
    provider: intl_handle,
    ptr: *const u8,
    len: usize,
) -> intl_result_handle {
    guard("code_point_set_data.load_for_property", || {
        require_properties(provider)?;
        let name = crate::parse_input(ptr, len)?;
        let set = property_set(name).map_err(|e| {
            tracing::debug!(target: "intl_capi::sets", error = %e, "property lookup failed");
            ErrorCode::from(e)
        })?;
        handle::insert(CodePointSetData { set })
    })
}

#[no_mangle]
pub extern "C" fn intl_code_point_set_data_contains_v1(set: intl_handle, cp: u32) -> bool {
    guard_or("code_point_set_data.contains", false, || {
        handle::get::<CodePointSetData>(set).is_ok_and(|s| s.set.contains(cp))
    })
}

#[no_mangle]
pub extern "C" fn intl_code_point_set_data_iter_ranges_v1(set: intl_handle) -> intl_result_handle {
    guard("code_point_set_data.iter_ranges", || {
        let s = handle::get::<CodePointSetData>(set)?;
        range_iterator(set, s.set.clone())
    })
}

#[no_mangle]
pub extern "C" fn intl_code_point_set_data_iter_ranges_complemented_v1(
    set: intl_handle,
) -> intl_result_handle {
    guard("code_point_set_data.iter_ranges_complemented", || {
        let s = handle::get::<CodePointSetData>(set)?;
        range_iterator(set, s.set.complement())
    })
}

#[no_mangle]
pub extern "C" fn intl_code_point_set_data_destroy_v1(set: intl_handle) {
    crate::destroy::<CodePointSetData>("code_point_set_data.destroy", set);
}

#[no_mangle]
pub extern "C" fn intl_code_point_map_data8_load_general_category_v1(
    provider: intl_handle,
) -> intl_result_handle {
    guard("code_point_map_data8.load_general_category", || {
        require_properties(provider)?;
        let map = general_category_map().map_err(|e| {
            tracing::error!(target: "intl_capi::sets", error = %e, "general category table");
            ErrorCode::from(e)
        })?;
        handle::insert(CodePointMapData8 { map })
    })
}

/// `0` for an invalid handle.
#[no_mangle]
pub extern "C" fn intl_code_point_map_data8_get_v1(map: intl_handle, cp: u32) -> u8 {
    guard_or("code_point_map_data8.get", 0, || {
        handle::get::<CodePointMapData8>(map).map_or(0, |m| m.map.get(cp))
    })
}

#[no_mangle]
pub extern "C" fn intl_code_point_map_data8_iter_ranges_for_value_v1(
    map: intl_handle,
    value: u8,
) -> intl_result_handle {
    guard("code_point_map_data8.iter_ranges_for_value", || {
        let m = handle::get::<CodePointMapData8>(map)?;
        range_iterator(map, m.map.ranges_for(value))
    })
}

#[no_mangle]
pub extern "C" fn intl_code_point_map_data8_iter_ranges_for_value_complemented_v1(
    map: intl_handle,
    value: u8,
) -> intl_result_handle {
    guard("code_point_map_data8.iter_ranges_for_value_complemented", || {
        let m = handle::get::<CodePointMapData8>(map)?;
        range_iterator(map, m.map.ranges_for(value).complement())
    })
}

/// The set is an independent object; it outlives the map.
#[no_mangle]
pub extern "C" fn intl_code_point_map_data8_get_set_for_value_v1(
    map: intl_handle,
    value: u8,
) -> intl_result_handle {
    guard("code_point_map_data8.get_set_for_value", || {
        let m = handle::get::<CodePointMapData8>(map)?;
        handle::insert(CodePointSetData {
            set: m.map.ranges_for(value),
        })
    })
}

#[no_mangle]
pub extern "C" fn intl_code_point_map_data8_destroy_v1(map: intl_handle) {
    crate::destroy::<CodePointMapData8>("code_point_map_data8.destroy", map);
}

#[no_mangle]
pub extern "C" fn intl_code_point_range_iterator_next_v1(
    it: intl_handle,
) -> intl_code_point_range_result {
    let done = intl_code_point_range_result::DONE;
    guard_or("code_point_range_iterator.next", done, || {
        let next = handle::get::<CodePointRangeIterator>(it).map(|i| i.0.advance());
        match next {
            Ok(Some((start, end))) => intl_code_point_range_result {
                start,
                end,
                done: false,
            },
            _ => done,
        }
    })
}

#[no_mangle]
pub extern "C" fn intl_code_point_range_iterator_destroy_v1(it: intl_handle) {
    crate::destroy::<CodePointRangeIterator>("code_point_range_iterator.destroy", it);
}

#[no_mangle]
pub extern "C" fn intl_code_point_set_builder_create_v1() -> intl_result_handle {
    guard("code_point_set_builder.create", || {
        handle::insert(CodePointSetBuilder {
            set: Mutex::new(RangeSet::default()),
        })
    })
}

fn with_builder<R>(builder: intl_handle, neutral: R, f: impl FnOnce(&mut RangeSet) -> R) -> R {
    let Ok(b) = handle::get::<CodePointSetBuilder>(builder) else {
        return neutral;
    };
    let result = match b.set.lock() {
        Ok(mut set) => f(&mut set),
        Err(_) => neutral,
    };
    result
}

#[no_mangle]
pub extern "C" fn intl_code_point_set_builder_add_char_v1(builder: intl_handle, cp: u32) {
    guard_or("code_point_set_builder.add_char", (), || {
        with_builder(builder, (), |s| s.add(cp, cp))
    })
}

#[no_mangle]
pub extern "C" fn intl_code_point_set_builder_add_inclusive_range_v1(
    builder: intl_handle,
    start: u32,
    end: u32,
) {
    guard_or("code_point_set_builder.add_inclusive_range", (), || {
        with_builder(builder, (), |s| s.add(start, end))
    })
}

#[no_mangle]
pub extern "C" fn intl_code_point_set_builder_remove_inclusive_range_v1(
    builder: intl_handle,
    start: u32,
    end: u32,
) {
    guard_or("code_point_set_builder.remove_inclusive_range", (), || {
        with_builder(builder, (), |s| s.remove(start, end))
    })
}

#[no_mangle]
pub extern "C" fn intl_code_point_set_builder_complement_v1(builder: intl_handle) {
    guard_or("code_point_set_builder.complement", (), || {
        with_builder(builder, (), |s| *s = s.complement())
    })
}

/// `true` for an invalid handle.
#[no_mangle]
pub extern "C" fn intl_code_point_set_builder_is_empty_v1(builder: intl_handle) -> bool {
    guard_or("code_point_set_builder.is_empty", true, || {
        with_builder(builder, true, |s| s.is_empty())
    })
}

/// Moves the accumulated ranges into a new set; the builder is left empty.
#[no_mangle]
pub extern "C" fn intl_code_point_set_builder_build_v1(builder: intl_handle) -> intl_result_handle {
    guard("code_point_set_builder.build", || {
        let b = handle::get::<CodePointSetBuilder>(builder)?;
        let set = {
            let mut pending = b.set.lock().map_err(|_| ErrorCode::Unknown)?;
            std::mem::take(&mut *pending)
        };
        handle::insert(CodePointSetData { set })
    })
}

#[no_mangle]
pub extern "C" fn intl_code_point_set_builder_destroy_v1(builder: intl_handle) {
    crate::destroy::<CodePointSetBuilder>("code_point_set_builder.destroy", builder);
}
