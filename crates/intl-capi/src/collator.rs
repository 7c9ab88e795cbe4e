//! Multi-level string comparison over canonical decompositions.

use std::cmp::Ordering;

use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::{
    bytes_from_raw, decode, guard, guard_or, intl_result_handle, AbiEnum, ErrorCode, Object,
};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::locale::Locale;
use crate::options::{intl_collator_options, CollatorCaseFirst, CollatorNumeric, CollatorStrength};
use crate::provider::DataProvider;

/// Options with every `Auto` resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub strength: CollatorStrength,
    pub case_first: CollatorCaseFirst,
    pub numeric: bool,
}

impl ResolvedOptions {
    pub fn to_abi(self) -> intl_collator_options {
        intl_collator_options {
            strength: self.strength.to_abi(),
            case_first: self.case_first.to_abi(),
            numeric: if self.numeric { CollatorNumeric::On } else { CollatorNumeric::Off }.to_abi(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum Primary {
    /// A digit run compared by value: fewer significant digits sort first.
    Number { len: usize, digits: String },
    Char(char),
}

#[derive(Debug, Default)]
struct SortKey {
    primary: Vec<Primary>,
    /// Combining marks attached to each base character.
    secondary: Vec<Vec<char>>,
    /// Case rank of each base character.
    tertiary: Vec<u8>,
    nfd: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Collator {
    options: ResolvedOptions,
}

impl Object for Collator {
    const KIND: &'static str = "Collator";
}

fn keyword_case_first(value: &str) -> Option<CollatorCaseFirst> {
    match value {
        "upper" => Some(CollatorCaseFirst::UpperFirst),
        "lower" => Some(CollatorCaseFirst::LowerFirst),
        "false" => Some(CollatorCaseFirst::Off),
        _ => None,
    }
}

fn keyword_numeric(value: &str) -> Option<bool> {
    match value {
        "" | "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

impl Collator {
    pub fn new(
        provider: &DataProvider,
        locale: &Locale,
        raw: intl_collator_options,
    ) -> Result<Self, ErrorCode> {
        if !provider.bundle().collation {
            return Err(ErrorCode::DataNotFound);
        }
        let strength: CollatorStrength = decode(raw.strength)?;
        let case_first: CollatorCaseFirst = decode(raw.case_first)?;
        let numeric: CollatorNumeric = decode(raw.numeric)?;
        let defaults = &provider.locale_data(locale)?.collation;

        let strength = match strength {
            CollatorStrength::Auto => CollatorStrength::Tertiary,
            CollatorStrength::Quaternary => return Err(ErrorCode::UnsupportedOption),
            s => s,
        };
        let case_first = match case_first {
            CollatorCaseFirst::Auto => locale
                .keyword("kf")
                .and_then(keyword_case_first)
                .unwrap_or(defaults.case_first),
            c => c,
        };
        let case_first = match case_first {
            CollatorCaseFirst::Auto => CollatorCaseFirst::Off,
            c => c,
        };
        let numeric = match numeric {
            CollatorNumeric::Auto => locale
                .keyword("kn")
                .and_then(keyword_numeric)
                .unwrap_or(defaults.numeric),
            CollatorNumeric::On => true,
            CollatorNumeric::Off => false,
        };
        Ok(Self::with_options(ResolvedOptions {
            strength,
            case_first,
            numeric,
        }))
    }

    pub fn with_options(options: ResolvedOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> ResolvedOptions {
        self.options
    }

    fn case_rank(&self, c: char) -> u8 {
        let upper = c.is_uppercase();
        match self.options.case_first {
            CollatorCaseFirst::UpperFirst => u8::from(!upper),
            _ => u8::from(upper),
        }
    }

    fn sort_key(&self, s: &str) -> SortKey {
        let mut key = SortKey {
            nfd: s.nfd().collect(),
            ..SortKey::default()
        };
        let mut digits = String::new();
        // Leading zeros carry no weight at any level, so "007" and "7" tie.
        let flush = |digits: &mut String, key: &mut SortKey| {
            if digits.is_empty() {
                return;
            }
            let trimmed = digits.trim_start_matches('0');
            let significant = if trimmed.is_empty() { "0" } else { trimmed };
            for d in significant.chars() {
                key.secondary.push(Vec::new());
                key.tertiary.push(self.case_rank(d));
            }
            key.primary.push(Primary::Number {
                len: significant.len(),
                digits: significant.to_owned(),
            });
            digits.clear();
        };
        let nfd = key.nfd.clone();
        for c in nfd.chars() {
            if is_combining_mark(c) {
                flush(&mut digits, &mut key);
                match key.secondary.last_mut() {
                    Some(marks) => marks.push(c),
                    None => key.secondary.push(vec![c]),
                }
                continue;
            }
            if self.options.numeric && c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            flush(&mut digits, &mut key);
            key.secondary.push(Vec::new());
            key.tertiary.push(self.case_rank(c));
            key.primary.extend(c.to_lowercase().map(Primary::Char));
        }
        flush(&mut digits, &mut key);
        key
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        let (ka, kb) = (self.sort_key(a), self.sort_key(b));
        let strength = self.options.strength;
        let mut ord = ka.primary.cmp(&kb.primary);
        if strength >= CollatorStrength::Secondary {
            ord = ord.then_with(|| ka.secondary.cmp(&kb.secondary));
        }
        if strength >= CollatorStrength::Tertiary {
            ord = ord.then_with(|| ka.tertiary.cmp(&kb.tertiary));
        }
        if strength == CollatorStrength::Identical {
            ord = ord.then_with(|| ka.nfd.cmp(&kb.nfd));
        }
        ord
    }
}

#[no_mangle]
pub extern "C" fn intl_collator_create_v1(
    provider: intl_handle,
    locale: intl_handle,
    options: intl_collator_options,
) -> intl_result_handle {
    guard("collator.create", || {
        let p = handle::get::<DataProvider>(provider)?;
        let l = handle::get::<Locale>(locale)?;
        handle::insert(Collator::new(&p, &l, options)?)
    })
}

/// Ill-formed UTF-8 compares as if each bad sequence were U+FFFD. Returns 0
/// for an invalid handle.
#[no_mangle]
pub unsafe extern "C" fn intl_collator_compare_utf8_v1(
    collator: intl_handle,
    a: *const u8,
    a_len: usize,
    b: *const u8,
    b_len: usize,
) -> i8 {
    guard_or("collator.compare_utf8", 0, || {
        let compared = (|| {
            let c = handle::get::<Collator>(collator)?;
            let a = String::from_utf8_lossy(bytes_from_raw(a, a_len)?);
            let b = String::from_utf8_lossy(bytes_from_raw(b, b_len)?);
            Ok::<_, ErrorCode>(c.compare(&a, &b))
        })();
        match compared {
            Ok(Ordering::Less) => -1,
            Ok(Ordering::Greater) => 1,
            Ok(Ordering::Equal) | Err(_) => 0,
        }
    })
}

#[no_mangle]
pub extern "C" fn intl_collator_resolved_options_v1(
    collator: intl_handle,
) -> intl_collator_options {
    let auto = intl_collator_options {
        strength: CollatorStrength::Auto.to_abi(),
        case_first: CollatorCaseFirst::Auto.to_abi(),
        numeric: CollatorNumeric::Auto.to_abi(),
    };
    guard_or("collator.resolved_options", auto, || {
        handle::get::<Collator>(collator).map_or(auto, |c| c.options().to_abi())
    })
}

#[no_mangle]
pub extern "C" fn intl_collator_destroy_v1(collator: intl_handle) {
    crate::destroy::<Collator>("collator.destroy", collator);
}
