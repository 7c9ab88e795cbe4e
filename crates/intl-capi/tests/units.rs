use intl_capi::provider::*;
use intl_capi::units::*;
use intl_capi::OwnedHandle;
use intl_capi_core::{intl_handle, BufferWrite, ErrorCode};

struct Units {
    _provider: OwnedHandle,
    factory: OwnedHandle,
}

impl Units {
    fn new() -> Self {
        let r = intl_data_provider_create_compiled_v1();
        let provider = OwnedHandle::from_result(r, intl_data_provider_destroy_v1).unwrap();
        let r = intl_units_converter_factory_create_v1(provider.raw());
        let factory = OwnedHandle::from_result(r, intl_units_converter_factory_destroy_v1).unwrap();
        Self {
            _provider: provider,
            factory,
        }
    }

    fn parser(&self) -> intl_handle {
        intl_units_converter_factory_parser_v1(self.factory.raw())
            .into_result()
            .unwrap()
    }

    fn parse(&self, id: &str) -> Option<OwnedHandle> {
        let raw =
            unsafe { intl_measure_unit_parser_parse_v1(self.parser(), id.as_ptr(), id.len()) };
        OwnedHandle::from_raw(raw, intl_measure_unit_destroy_v1)
    }

    fn converter(&self, from: &str, to: &str) -> Option<OwnedHandle> {
        let (from, to) = (self.parse(from)?, self.parse(to)?);
        let raw =
            intl_units_converter_factory_converter_v1(self.factory.raw(), from.raw(), to.raw());
        OwnedHandle::from_raw(raw, intl_units_converter_destroy_v1)
    }
}

#[test]
fn malformed_identifiers_yield_null() {
    let u = Units::new();
    let malformed = [
        "",
        "meter-per-per-second",
        "Meter",
        "foot-and-inch",
        "square",
        "parsec",
        "kilo",
        "meter-",
        "pow02-meter",
        "pow9-meter-pow9-meter",
    ];
    for id in malformed {
        assert!(u.parse(id).is_none(), "{id:?} should not parse");
    }
    let bad_utf8 = [0xF0u8, 0x28];
    let (ptr, len) = (bad_utf8.as_ptr(), bad_utf8.len());
    let raw = unsafe { intl_measure_unit_parser_parse_v1(u.parser(), ptr, len) };
    assert!(raw.is_null());
}

#[test]
fn canonical_output() {
    let u = Units::new();
    let unit = u.parse("meter-kilogram-per-second-second").unwrap();
    let mut out = BufferWrite::new(0);
    let r = unsafe { intl_measure_unit_to_string_v1(unit.raw(), out.as_mut_ptr()) };
    assert_eq!(r.into_unit(), Ok(()));
    assert_eq!(out.as_str(), "meter-kilogram-per-square-second");

    let r = unsafe { intl_measure_unit_to_string_v1(intl_handle::NULL, out.as_mut_ptr()) };
    assert_eq!(r.into_unit(), Err(ErrorCode::InvalidHandle));
}

#[test]
fn conversions() {
    let u = Units::new();
    let c = u.converter("mile-per-hour", "meter-per-second").unwrap();
    let v = intl_units_converter_convert_f64_v1(c.raw(), 60.0);
    assert!((v - 26.8224).abs() < 1e-9, "{v}");

    let c = u.converter("newton", "kilogram-meter-per-square-second").unwrap();
    assert!((intl_units_converter_convert_f64_v1(c.raw(), 3.0) - 3.0).abs() < 1e-12);

    let c = u.converter("celsius", "kelvin").unwrap();
    assert!((intl_units_converter_convert_f64_v1(c.raw(), -273.15)).abs() < 1e-9);

    assert!(u.converter("meter", "kilogram").is_none());
    assert!(intl_units_converter_convert_f64_v1(intl_handle::NULL, 1.0).is_nan());
}

#[test]
fn empty_provider_has_no_units() {
    let r = intl_data_provider_create_empty_v1();
    let p = OwnedHandle::from_result(r, intl_data_provider_destroy_v1).unwrap();
    let r = intl_units_converter_factory_create_v1(p.raw());
    assert_eq!(r.into_result(), Err(ErrorCode::DataNotFound));
}
