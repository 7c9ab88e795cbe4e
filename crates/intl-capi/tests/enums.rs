use intl_capi::options::*;
use intl_capi_core::{decode, AbiEnum, BufferWrite, ErrorCode};
use proptest::prelude::*;

fn declared_round_trip<E: AbiEnum + std::fmt::Debug>() {
    for v in E::ALL {
        assert_eq!(decode::<E>(v.to_abi()), Ok(*v), "{}::{}", E::NAME, v.name());
    }
}

fn decodes_iff_declared<E: AbiEnum + std::fmt::Debug>(raw: u32) -> bool {
    let declared = E::ALL.iter().any(|v| v.to_abi() == raw);
    match decode::<E>(raw) {
        Ok(v) => declared && v.to_abi() == raw,
        Err(code) => !declared && code == ErrorCode::InvalidArgument,
    }
}

#[test]
fn every_declared_value_round_trips() {
    declared_round_trip::<IsoWeekday>();
    declared_round_trip::<DateLength>();
    declared_round_trip::<TimeLength>();
    declared_round_trip::<IsoTimeZoneFormat>();
    declared_round_trip::<IsoTimeZoneMinuteDisplay>();
    declared_round_trip::<IsoTimeZoneSecondDisplay>();
    declared_round_trip::<CollatorCaseFirst>();
    declared_round_trip::<CollatorStrength>();
    declared_round_trip::<CollatorNumeric>();
    declared_round_trip::<CalendarKind>();
    declared_round_trip::<SegmenterWordType>();
    declared_round_trip::<WeekRelativeUnit>();
    declared_round_trip::<ErrorCode>();
}

#[test]
fn error_code_names_cross_the_boundary() {
    for code in ErrorCode::ALL {
        let mut out = BufferWrite::new(0);
        let r = unsafe { intl_capi::intl_error_code_name_v1(code.to_abi(), out.as_mut_ptr()) };
        assert_eq!(r.into_unit(), Ok(()));
        assert_eq!(out.as_str(), code.name());
    }
}

proptest! {
    #[test]
    fn undeclared_tags_are_rejected(raw in prop_oneof![0u32..16, any::<u32>()]) {
        prop_assert!(decodes_iff_declared::<IsoWeekday>(raw));
        prop_assert!(decodes_iff_declared::<DateLength>(raw));
        prop_assert!(decodes_iff_declared::<IsoTimeZoneFormat>(raw));
        prop_assert!(decodes_iff_declared::<CollatorStrength>(raw));
        prop_assert!(decodes_iff_declared::<CalendarKind>(raw));
        prop_assert!(decodes_iff_declared::<WeekRelativeUnit>(raw));
        prop_assert!(decodes_iff_declared::<ErrorCode>(raw));
    }

    #[test]
    fn zone_options_validate_every_field(
        format in 0u32..6,
        minutes in 0u32..4,
        seconds in 0u32..4,
    ) {
        let raw = intl_iso_time_zone_options { format, minutes, seconds };
        let valid = format < 4 && minutes < 2 && seconds < 2;
        prop_assert_eq!(IsoTimeZoneOptions::try_from(raw).is_ok(), valid);
    }
}
