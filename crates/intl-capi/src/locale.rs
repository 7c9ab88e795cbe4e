//! BCP-47 locales: a `unic-langid` identifier plus Unicode `-u-` keywords.

use std::fmt;
use std::fmt::Write as _;

use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::sink::{fmt_error, with_sink};
use intl_capi_core::{guard, guard_void, intl_result_handle, intl_result_void};
use intl_capi_core::{intl_write, utf8_from_raw, ErrorCode, Object};
use unic_langid::LanguageIdentifier;

use crate::options::CalendarKind;

#[derive(Debug, thiserror::Error)]
pub enum LocaleError {
    #[error("invalid language identifier: {0}")]
    Identifier(#[from] unic_langid::LanguageIdentifierError),
    #[error("malformed extension near {0:?}")]
    Extension(String),
    #[error("empty locale string")]
    Empty,
}

impl From<LocaleError> for ErrorCode {
    fn from(_: LocaleError) -> Self {
        ErrorCode::ParseFailure
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    id: LanguageIdentifier,
    /// Sorted by key, unique.
    keywords: Vec<(String, String)>,
}

impl Object for Locale {
    const KIND: &'static str = "Locale";
}

fn is_key(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 2 && b[0].is_ascii_alphanumeric() && b[1].is_ascii_alphabetic()
}

fn is_type(s: &str) -> bool {
    (3..=8).contains(&s.len()) && s.bytes().all(|c| c.is_ascii_alphanumeric())
}

fn parse_keywords(ext: &str) -> Result<Vec<(String, String)>, LocaleError> {
    let mut out: Vec<(String, String)> = Vec::new();
    let mut subtags = ext.split('-').peekable();
    while let Some(key) = subtags.next() {
        if !is_key(key) {
            return Err(LocaleError::Extension(key.to_owned()));
        }
        let mut value = String::new();
        while let Some(&next) = subtags.peek() {
            if !is_type(next) {
                break;
            }
            if !value.is_empty() {
                value.push('-');
            }
            value.push_str(next);
            subtags.next();
        }
        if value.is_empty() {
            value.push_str("true");
        }
        if !out.iter().any(|(k, _)| k == key) {
            out.push((key.to_owned(), value));
        }
    }
    out.sort();
    Ok(out)
}

impl Locale {
    pub fn und() -> Self {
        Self {
            id: LanguageIdentifier::default(),
            keywords: Vec::new(),
        }
    }

    pub fn parse(input: &str) -> Result<Self, LocaleError> {
        if input.is_empty() {
            return Err(LocaleError::Empty);
        }
        let lowered = input.replace('_', "-").to_ascii_lowercase();
        let (base, ext) = if let Some(rest) = lowered.strip_prefix("u-") {
            ("und", Some(rest))
        } else {
            match lowered.find("-u-") {
                Some(at) => (&lowered[..at], Some(&lowered[at + 3..])),
                None => (lowered.as_str(), None),
            }
        };
        let id = LanguageIdentifier::from_bytes(base.as_bytes())?;
        let keywords = match ext {
            Some(ext) if !ext.is_empty() => parse_keywords(ext)?,
            Some(_) => return Err(LocaleError::Extension(String::new())),
            None => Vec::new(),
        };
        Ok(Self { id, keywords })
    }

    pub fn basename(&self) -> String {
        self.id.to_string()
    }

    pub fn language(&self) -> String {
        self.id.language.to_string()
    }

    pub fn keyword(&self, key: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Calendar requested through the `ca` keyword, if any.
    pub fn calendar_override(&self) -> Option<CalendarKind> {
        self.keyword("ca").and_then(CalendarKind::from_keyword)
    }

    /// Data lookup keys, most specific first, ending at `und`.
    pub fn fallback_chain(&self) -> Vec<String> {
        let mut chain = vec![self.basename()];
        let language = self.language();
        if let (Some(script), true) = (self.id.script.as_ref(), self.id.region.is_some()) {
            chain.push(format!("{language}-{script}"));
        }
        chain.push(language);
        chain.push("und".to_owned());
        chain.dedup();
        chain
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)?;
        if !self.keywords.is_empty() {
            f.write_str("-u")?;
            for (k, v) in &self.keywords {
                write!(f, "-{k}")?;
                if v != "true" {
                    write!(f, "-{v}")?;
                }
            }
        }
        Ok(())
    }
}

#[no_mangle]
pub unsafe extern "C" fn intl_locale_create_from_string_v1(
    ptr: *const u8,
    len: usize,
) -> intl_result_handle {
    guard("locale.create_from_string", || {
        let s = crate::parse_input(ptr, len)?;
        let locale = Locale::parse(s).map_err(|e| {
            tracing::debug!(target: "intl_capi::locale", error = %e, "locale rejected");
            ErrorCode::from(e)
        })?;
        handle::insert(locale)
    })
}

#[no_mangle]
pub extern "C" fn intl_locale_create_und_v1() -> intl_result_handle {
    guard("locale.create_und", || handle::insert(Locale::und()))
}

#[no_mangle]
pub extern "C" fn intl_locale_clone_v1(locale: intl_handle) -> intl_result_handle {
    guard("locale.clone", || {
        let l = handle::get::<Locale>(locale)?;
        handle::insert(Locale::clone(&l))
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_locale_basename_v1(
    locale: intl_handle,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("locale.basename", || {
        let l = handle::get::<Locale>(locale)?;
        with_sink(write, |w| w.write_str(&l.basename()).map_err(|_| fmt_error(w)))
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_locale_language_v1(
    locale: intl_handle,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("locale.language", || {
        let l = handle::get::<Locale>(locale)?;
        with_sink(write, |w| w.write_str(&l.language()).map_err(|_| fmt_error(w)))
    })
}

/// Writes the value of a Unicode extension keyword (`ca`, `kn`, ...).
#[no_mangle]
pub unsafe extern "C" fn intl_locale_get_unicode_extension_v1(
    locale: intl_handle,
    key_ptr: *const u8,
    key_len: usize,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("locale.get_unicode_extension", || {
        let l = handle::get::<Locale>(locale)?;
        let key = utf8_from_raw(key_ptr, key_len)?;
        let value = l.keyword(key).ok_or(ErrorCode::DataNotFound)?;
        with_sink(write, |w| w.write_str(value).map_err(|_| fmt_error(w)))
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_locale_normalize_v1(
    ptr: *const u8,
    len: usize,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("locale.normalize", || {
        let s = crate::parse_input(ptr, len)?;
        let locale = Locale::parse(s)?;
        with_sink(write, |w| write!(w, "{locale}").map_err(|_| fmt_error(w)))
    })
}

#[no_mangle]
pub extern "C" fn intl_locale_destroy_v1(locale: intl_handle) {
    crate::destroy::<Locale>("locale.destroy", locale);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonicalizes_case_and_separators() {
        let l = Locale::parse("EN_us").unwrap();
        assert_eq!(l.basename(), "en-US");
        assert_eq!(l.language(), "en");
        assert_eq!(Locale::parse("und").unwrap(), Locale::und());
    }

    #[test]
    fn keywords_are_sorted_and_true_is_implicit() {
        let l = Locale::parse("th-TH-u-nu-thai-ca-buddhist-kn").unwrap();
        assert_eq!(l.to_string(), "th-TH-u-ca-buddhist-kn-nu-thai");
        assert_eq!(l.keyword("kn"), Some("true"));
        assert_eq!(l.calendar_override(), Some(CalendarKind::Buddhist));
    }

    #[test]
    fn rejects_garbage() {
        assert!(Locale::parse("").is_err());
        assert!(Locale::parse("not a locale").is_err());
        assert!(Locale::parse("en-u-").is_err());
        assert!(Locale::parse("en-u-c").is_err());
    }

    #[test]
    fn fallback_chain_ends_at_root() {
        let l = Locale::parse("de-AT").unwrap();
        assert_eq!(l.fallback_chain(), vec!["de-AT", "de", "und"]);
        let l = Locale::parse("sr-Latn-RS").unwrap();
        assert_eq!(l.fallback_chain(), vec!["sr-Latn-RS", "sr-Latn", "sr", "und"]);
        assert_eq!(Locale::und().fallback_chain(), vec!["und"]);
    }
}
