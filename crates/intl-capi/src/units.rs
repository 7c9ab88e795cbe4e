//! Measurement unit identifiers and conversions between them.
//!
//! Identifiers follow the CLDR core unit grammar:
//! `[per-]product(-per-product)?` where a product is `single(-single)*` and a
//! single is `(square-|cubic-|powN-)? prefix? simple`. Conversion works on
//! base dimensions: two units convert when their dimension vectors are equal
//! (direct) or opposite (reciprocal).

use std::collections::BTreeMap;
use std::fmt::{self, Write as _};
use std::sync::Arc;

use intl_capi_core::handle::{self, intl_handle};
use intl_capi_core::sink::{fmt_error, with_sink};
use intl_capi_core::{guard, guard_or, guard_void, intl_result_handle, intl_result_void};
use intl_capi_core::{intl_write, utf8_from_raw, ErrorCode, Object};

use crate::provider::{DataProvider, UnitRecord};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum UnitParseError {
    #[error("empty unit identifier")]
    Empty,
    #[error("unit identifiers are lowercase ASCII: {0:?}")]
    Charset(String),
    #[error("mixed units are not measure units")]
    Mixed,
    #[error("second `per` in unit identifier")]
    DoublePer,
    #[error("power or `per` without a unit after it")]
    Dangling,
    #[error("unknown unit {0:?}")]
    Unknown(String),
    #[error("{0:?} raised beyond pow15")]
    PowerRange(String),
}

impl From<UnitParseError> for ErrorCode {
    fn from(_: UnitParseError) -> Self {
        ErrorCode::ParseFailure
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    Decimal(i8),
    Binary(u8),
}

const DECIMAL_PREFIXES: &[(&str, i8)] = &[
    ("quecto", -30),
    ("ronto", -27),
    ("yocto", -24),
    ("zepto", -21),
    ("atto", -18),
    ("femto", -15),
    ("pico", -12),
    ("nano", -9),
    ("micro", -6),
    ("milli", -3),
    ("centi", -2),
    ("deci", -1),
    ("deka", 1),
    ("hecto", 2),
    ("kilo", 3),
    ("mega", 6),
    ("giga", 9),
    ("tera", 12),
    ("peta", 15),
    ("exa", 18),
    ("zetta", 21),
    ("yotta", 24),
    ("ronna", 27),
    ("quetta", 30),
];

const BINARY_PREFIXES: &[(&str, u8)] = &[
    ("kibi", 1),
    ("mebi", 2),
    ("gibi", 3),
    ("tebi", 4),
    ("pebi", 5),
    ("exbi", 6),
    ("zebi", 7),
    ("yobi", 8),
];

impl Prefix {
    fn split(token: &str) -> Option<(Prefix, &str)> {
        let decimal = DECIMAL_PREFIXES.iter().find_map(|&(p, e)| {
            let rest = token.strip_prefix(p)?;
            Some((Prefix::Decimal(e), rest))
        });
        decimal.or_else(|| {
            BINARY_PREFIXES.iter().find_map(|&(p, e)| {
                let rest = token.strip_prefix(p)?;
                Some((Prefix::Binary(e), rest))
            })
        })
    }

    fn factor(self) -> f64 {
        match self {
            Prefix::Decimal(e) => 10f64.powi(e.into()),
            Prefix::Binary(e) => 1024f64.powi(e.into()),
        }
    }

    fn name(self) -> &'static str {
        let found = match self {
            Prefix::Decimal(e) => DECIMAL_PREFIXES.iter().find(|&&(_, x)| x == e).map(|p| p.0),
            Prefix::Binary(e) => BINARY_PREFIXES.iter().find(|&&(_, x)| x == e).map(|p| p.0),
        };
        found.unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleUnit {
    pub power: i8,
    pub prefix: Option<Prefix>,
    pub simple: String,
}

/// A parsed unit with its dimension vector and factor to base units resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasureUnit {
    singles: Vec<SingleUnit>,
    dims: BTreeMap<String, i32>,
    factor: f64,
    offset: f64,
}

impl Object for MeasureUnit {
    const KIND: &'static str = "MeasureUnit";
}

const MAX_POWER: i8 = 15;

fn power_of(token: &str) -> Option<i8> {
    match token {
        "square" => Some(2),
        "cubic" => Some(3),
        _ => {
            let digits = token.strip_prefix("pow")?;
            if digits.starts_with('0') {
                return None;
            }
            let n: i8 = digits.parse().ok()?;
            (2..=MAX_POWER).contains(&n).then_some(n)
        }
    }
}

impl MeasureUnit {
    pub fn parse(
        id: &str,
        units: &BTreeMap<String, UnitRecord>,
    ) -> Result<Self, UnitParseError> {
        if id.is_empty() {
            return Err(UnitParseError::Empty);
        }
        if !id.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-') {
            return Err(UnitParseError::Charset(id.to_owned()));
        }
        let mut singles: Vec<SingleUnit> = Vec::new();
        let mut sign = 1i8;
        let mut pending_power: Option<i8> = None;
        let mut expecting_unit = false;
        for token in id.split('-') {
            if token == "and" {
                return Err(UnitParseError::Mixed);
            }
            if token == "per" {
                if sign < 0 {
                    return Err(UnitParseError::DoublePer);
                }
                if pending_power.is_some() {
                    return Err(UnitParseError::Dangling);
                }
                sign = -1;
                expecting_unit = true;
                continue;
            }
            if pending_power.is_none() {
                if let Some(p) = power_of(token) {
                    pending_power = Some(p);
                    expecting_unit = true;
                    continue;
                }
            }
            let (prefix, simple) = if units.contains_key(token) {
                (None, token)
            } else {
                match Prefix::split(token) {
                    Some((p, rest)) if units.contains_key(rest) => (Some(p), rest),
                    _ => return Err(UnitParseError::Unknown(token.to_owned())),
                }
            };
            let power = pending_power.take().unwrap_or(1) * sign;
            Self::push_single(&mut singles, power, prefix, simple)?;
            expecting_unit = false;
        }
        if expecting_unit || singles.is_empty() {
            return Err(UnitParseError::Dangling);
        }
        Ok(Self::resolve(singles, units))
    }

    /// Repeated units on the same side of `per` merge into one power, which
    /// must stay printable as a unit identifier.
    fn push_single(
        singles: &mut Vec<SingleUnit>,
        power: i8,
        prefix: Option<Prefix>,
        simple: &str,
    ) -> Result<(), UnitParseError> {
        let same = singles.iter_mut().find(|s| {
            s.prefix == prefix && s.simple == simple && s.power.signum() == power.signum()
        });
        match same {
            Some(s) => {
                let merged = s.power + power;
                if merged.abs() > MAX_POWER {
                    return Err(UnitParseError::PowerRange(simple.to_owned()));
                }
                s.power = merged;
            }
            None => singles.push(SingleUnit {
                power,
                prefix,
                simple: simple.to_owned(),
            }),
        }
        Ok(())
    }

    fn resolve(singles: Vec<SingleUnit>, units: &BTreeMap<String, UnitRecord>) -> Self {
        let mut dims: BTreeMap<String, i32> = BTreeMap::new();
        let mut factor = 1.0;
        for s in &singles {
            let Some(rec) = units.get(&s.simple) else { continue };
            for (d, n) in &rec.dims {
                *dims.entry(d.clone()).or_default() += i32::from(*n) * i32::from(s.power);
            }
            let unit_factor = rec.factor * s.prefix.map_or(1.0, Prefix::factor);
            factor *= unit_factor.powi(s.power.into());
        }
        dims.retain(|_, n| *n != 0);
        let offset = match singles.as_slice() {
            [only] if only.power == 1 => units.get(&only.simple).map_or(0.0, |r| r.offset),
            _ => 0.0,
        };
        Self {
            singles,
            dims,
            factor,
            offset,
        }
    }

    pub fn singles(&self) -> &[SingleUnit] {
        &self.singles
    }
}

impl fmt::Display for SingleUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.power.unsigned_abs() {
            1 => {}
            2 => f.write_str("square-")?,
            3 => f.write_str("cubic-")?,
            n => write!(f, "pow{n}-")?,
        }
        if let Some(p) = self.prefix {
            f.write_str(p.name())?;
        }
        f.write_str(&self.simple)
    }
}

impl fmt::Display for MeasureUnit {
    /// Canonical form: numerator singles, then `-per-` and the denominator.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (num, den): (Vec<_>, Vec<_>) = self.singles.iter().partition(|s| s.power > 0);
        for (i, s) in num.iter().enumerate() {
            if i > 0 {
                f.write_char('-')?;
            }
            write!(f, "{s}")?;
        }
        if !den.is_empty() {
            f.write_str(if num.is_empty() { "per-" } else { "-per-" })?;
            for (i, s) in den.iter().enumerate() {
                if i > 0 {
                    f.write_char('-')?;
                }
                write!(f, "{s}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Conversion {
    /// `(value * from_factor + from_offset - to_offset) / to_factor`.
    Direct {
        from_factor: f64,
        from_offset: f64,
        to_factor: f64,
        to_offset: f64,
    },
    /// `1 / (value * from_factor * to_factor)`.
    Reciprocal { scale: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitsConverter {
    conversion: Conversion,
}

impl Object for UnitsConverter {
    const KIND: &'static str = "UnitsConverter";
}

fn opposite(a: &BTreeMap<String, i32>, b: &BTreeMap<String, i32>) -> bool {
    !a.is_empty() && a.len() == b.len() && a.iter().all(|(d, n)| b.get(d) == Some(&-n))
}

impl UnitsConverter {
    pub fn new(from: &MeasureUnit, to: &MeasureUnit) -> Option<Self> {
        let conversion = if from.dims == to.dims {
            Conversion::Direct {
                from_factor: from.factor,
                from_offset: from.offset,
                to_factor: to.factor,
                to_offset: to.offset,
            }
        } else if opposite(&from.dims, &to.dims) {
            Conversion::Reciprocal {
                scale: from.factor * to.factor,
            }
        } else {
            return None;
        };
        Some(Self { conversion })
    }

    pub fn convert(&self, value: f64) -> f64 {
        match self.conversion {
            Conversion::Direct {
                from_factor,
                from_offset,
                to_factor,
                to_offset,
            } if from_offset == 0.0 && to_offset == 0.0 => value * (from_factor / to_factor),
            Conversion::Direct {
                from_factor,
                from_offset,
                to_factor,
                to_offset,
            } => (value * from_factor + from_offset - to_offset) / to_factor,
            Conversion::Reciprocal { scale } => 1.0 / (value * scale),
        }
    }
}

pub struct UnitsConverterFactory {
    units: Arc<BTreeMap<String, UnitRecord>>,
}

impl Object for UnitsConverterFactory {
    const KIND: &'static str = "UnitsConverterFactory";
}

pub struct MeasureUnitParser {
    units: Arc<BTreeMap<String, UnitRecord>>,
}

impl Object for MeasureUnitParser {
    const KIND: &'static str = "MeasureUnitParser";
}

#[no_mangle]
pub extern "C" fn intl_units_converter_factory_create_v1(
    provider: intl_handle,
) -> intl_result_handle {
    guard("units_converter_factory.create", || {
        let p = handle::get::<DataProvider>(provider)?;
        let units = &p.bundle().units;
        if units.is_empty() {
            return Err(ErrorCode::DataNotFound);
        }
        handle::insert(UnitsConverterFactory {
            units: Arc::new(units.clone()),
        })
    })
}

/// Borrowed parser view of the factory; invalidated when the factory is
/// destroyed and never destroyed on its own.
#[no_mangle]
pub extern "C" fn intl_units_converter_factory_parser_v1(
    factory: intl_handle,
) -> intl_result_handle {
    guard("units_converter_factory.parser", || {
        let f = handle::get::<UnitsConverterFactory>(factory)?;
        handle::borrow_or_insert(factory, || {
            Arc::new(MeasureUnitParser {
                units: f.units.clone(),
            })
        })
    })
}

/// Null when the units are not convertible.
#[no_mangle]
pub extern "C" fn intl_units_converter_factory_converter_v1(
    factory: intl_handle,
    from: intl_handle,
    to: intl_handle,
) -> intl_handle {
    guard_or("units_converter_factory.converter", intl_handle::NULL, || {
        let built = (|| {
            handle::get::<UnitsConverterFactory>(factory)?;
            let from = handle::get::<MeasureUnit>(from)?;
            let to = handle::get::<MeasureUnit>(to)?;
            let Some(conv) = UnitsConverter::new(&from, &to) else {
                tracing::debug!(
                    target: "intl_capi::units",
                    from = %from,
                    to = %to,
                    "units are not convertible"
                );
                return Ok(intl_handle::NULL);
            };
            handle::insert(conv)
        })();
        built.unwrap_or(intl_handle::NULL)
    })
}

#[no_mangle]
pub extern "C" fn intl_units_converter_factory_destroy_v1(factory: intl_handle) {
    crate::destroy::<UnitsConverterFactory>("units_converter_factory.destroy", factory);
}

/// Null for a malformed or unknown identifier.
#[no_mangle]
pub unsafe extern "C" fn intl_measure_unit_parser_parse_v1(
    parser: intl_handle,
    ptr: *const u8,
    len: usize,
) -> intl_handle {
    guard_or("measure_unit_parser.parse", intl_handle::NULL, || {
        let parsed = (|| {
            let p = handle::get::<MeasureUnitParser>(parser)?;
            let id = utf8_from_raw(ptr, len)?;
            let unit = MeasureUnit::parse(id, &p.units).map_err(|e| {
                tracing::debug!(target: "intl_capi::units", error = %e, "unit identifier rejected");
                ErrorCode::from(e)
            })?;
            handle::insert(unit)
        })();
        parsed.unwrap_or(intl_handle::NULL)
    })
}

#[no_mangle]
pub unsafe extern "C" fn intl_measure_unit_to_string_v1(
    unit: intl_handle,
    write: *mut intl_write,
) -> intl_result_void {
    guard_void("measure_unit.to_string", || {
        let u = handle::get::<MeasureUnit>(unit)?;
        with_sink(write, |w| write!(w, "{u}").map_err(|_| fmt_error(w)))
    })
}

#[no_mangle]
pub extern "C" fn intl_measure_unit_destroy_v1(unit: intl_handle) {
    crate::destroy::<MeasureUnit>("measure_unit.destroy", unit);
}

/// NaN for an invalid converter handle.
#[no_mangle]
pub extern "C" fn intl_units_converter_convert_f64_v1(conv: intl_handle, value: f64) -> f64 {
    guard_or("units_converter.convert_f64", f64::NAN, || {
        handle::get::<UnitsConverter>(conv).map_or(f64::NAN, |c| c.convert(value))
    })
}

#[no_mangle]
pub extern "C" fn intl_units_converter_destroy_v1(conv: intl_handle) {
    crate::destroy::<UnitsConverter>("units_converter.destroy", conv);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DataBundle;

    fn table() -> BTreeMap<String, UnitRecord> {
        let json = include_str!("../data/compiled.json");
        DataBundle::from_json(json.as_bytes()).unwrap().units
    }

    fn parse(id: &str) -> Result<MeasureUnit, UnitParseError> {
        MeasureUnit::parse(id, &table())
    }

    fn convert(from: &str, to: &str, value: f64) -> Option<f64> {
        let conv = UnitsConverter::new(&parse(from).unwrap(), &parse(to).unwrap())?;
        Some(conv.convert(value))
    }

    #[test]
    fn canonical_strings() {
        assert_eq!(parse("kilometer-per-hour").unwrap().to_string(), "kilometer-per-hour");
        assert_eq!(parse("meter-meter").unwrap().to_string(), "square-meter");
        assert_eq!(parse("per-second").unwrap().to_string(), "per-second");
        assert_eq!(
            parse("pow4-meter-per-cubic-second").unwrap().to_string(),
            "pow4-meter-per-cubic-second"
        );
        assert_eq!(parse("gibibyte").unwrap().to_string(), "gibibyte");
    }

    #[test]
    fn malformed_identifiers() {
        assert_eq!(parse(""), Err(UnitParseError::Empty));
        assert!(matches!(parse("Meter"), Err(UnitParseError::Charset(_))));
        assert_eq!(parse("foot-and-inch"), Err(UnitParseError::Mixed));
        assert_eq!(parse("meter-per-second-per-second"), Err(UnitParseError::DoublePer));
        assert_eq!(parse("meter-per"), Err(UnitParseError::Dangling));
        assert_eq!(parse("square"), Err(UnitParseError::Dangling));
        assert!(matches!(parse("pow16-meter"), Err(UnitParseError::Unknown(_))));
        assert!(matches!(parse("furlong"), Err(UnitParseError::Unknown(_))));
        assert!(matches!(parse("meter--second"), Err(UnitParseError::Unknown(_))));
        assert!(matches!(parse("pow02-meter"), Err(UnitParseError::Unknown(_))));
        assert!(matches!(parse("pow0-meter"), Err(UnitParseError::Unknown(_))));
    }

    #[test]
    fn merged_powers_stay_printable() {
        let merged = parse("pow14-meter-meter").unwrap();
        assert_eq!(merged.to_string(), "pow15-meter");
        assert_eq!(parse(&merged.to_string()).unwrap(), merged);
        assert_eq!(
            parse("pow15-meter-meter"),
            Err(UnitParseError::PowerRange("meter".to_owned()))
        );
        assert_eq!(
            parse("per-cubic-second-pow13-second"),
            Err(UnitParseError::PowerRange("second".to_owned()))
        );
    }

    #[test]
    fn direct_conversions() {
        let ft = convert("meter", "foot", 1.0).unwrap();
        assert!((ft - 3.280_839_895).abs() < 1e-9);
        let kmh = convert("meter-per-second", "kilometer-per-hour", 10.0).unwrap();
        assert!((kmh - 36.0).abs() < 1e-9);
        let bits = convert("kibibyte", "bit", 1.0).unwrap();
        assert!((bits - 8192.0).abs() < 1e-9);
        assert_eq!(convert("meter", "second", 1.0), None);
    }

    #[test]
    fn temperature_offsets() {
        let f = convert("celsius", "fahrenheit", 100.0).unwrap();
        assert!((f - 212.0).abs() < 1e-9);
        let k = convert("fahrenheit", "kelvin", 32.0).unwrap();
        assert!((k - 273.15).abs() < 1e-9);
    }

    #[test]
    fn reciprocal_conversion() {
        let per_second = convert("second", "hertz", 0.5).unwrap();
        assert!((per_second - 2.0).abs() < 1e-12);
        let liters_per_km = convert("kilometer-per-liter", "liter-per-kilometer", 4.0).unwrap();
        assert!((liters_per_km - 0.25).abs() < 1e-12);
    }
}
