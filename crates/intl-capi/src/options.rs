//! Wire enums and flat option structs.
//!
//! Tag values are part of the ABI. Append only.

use intl_capi_core::{abi_enum, decode, ErrorCode};
use serde::Deserialize;

abi_enum! {
    #[derive(Deserialize, PartialOrd, Ord)]
    #[serde(rename_all = "lowercase")]
    pub enum IsoWeekday {
        Monday = 1,
        Tuesday = 2,
        Wednesday = 3,
        Thursday = 4,
        Friday = 5,
        Saturday = 6,
        Sunday = 7,
    }
}

impl IsoWeekday {
    pub fn from_chrono(w: chrono::Weekday) -> Self {
        match w {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }

    /// Zero-based position with Monday first.
    pub fn index(self) -> usize {
        self as usize - 1
    }
}

abi_enum! {
    pub enum DateLength {
        Full = 0,
        Long = 1,
        Medium = 2,
        Short = 3,
    }
}

abi_enum! {
    pub enum TimeLength {
        Full = 0,
        Long = 1,
        Medium = 2,
        Short = 3,
    }
}

abi_enum! {
    pub enum IsoTimeZoneFormat {
        Basic = 0,
        Extended = 1,
        UtcBasic = 2,
        UtcExtended = 3,
    }
}

abi_enum! {
    pub enum IsoTimeZoneMinuteDisplay {
        Required = 0,
        Optional = 1,
    }
}

abi_enum! {
    pub enum IsoTimeZoneSecondDisplay {
        Optional = 0,
        Never = 1,
    }
}

abi_enum! {
    #[derive(Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum CollatorCaseFirst {
        Auto = 0,
        Off = 1,
        LowerFirst = 2,
        UpperFirst = 3,
    }
}

abi_enum! {
    #[derive(PartialOrd, Ord)]
    pub enum CollatorStrength {
        Auto = 0,
        Primary = 1,
        Secondary = 2,
        Tertiary = 3,
        Quaternary = 4,
        Identical = 5,
    }
}

abi_enum! {
    pub enum CollatorNumeric {
        Auto = 0,
        Off = 1,
        On = 2,
    }
}

abi_enum! {
    #[derive(Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum CalendarKind {
        Iso = 0,
        Gregorian = 1,
        Buddhist = 2,
    }
}

impl CalendarKind {
    /// BCP-47 `ca` keyword value.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Iso => "iso8601",
            Self::Gregorian => "gregory",
            Self::Buddhist => "buddhist",
        }
    }

    pub fn from_keyword(value: &str) -> Option<Self> {
        match value {
            "iso8601" => Some(Self::Iso),
            "gregory" => Some(Self::Gregorian),
            "buddhist" => Some(Self::Buddhist),
            _ => None,
        }
    }

    /// Key used for this calendar in data tables.
    pub fn data_key(self) -> &'static str {
        match self {
            Self::Iso => "iso",
            Self::Gregorian => "gregorian",
            Self::Buddhist => "buddhist",
        }
    }
}

abi_enum! {
    pub enum SegmenterWordType {
        None = 0,
        Number = 1,
        Letter = 2,
    }
}

abi_enum! {
    pub enum WeekRelativeUnit {
        Previous = 0,
        Current = 1,
        Next = 2,
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct intl_iso_time_zone_options {
    pub format: u32,     // IsoTimeZoneFormat
    pub minutes: u32,    // IsoTimeZoneMinuteDisplay
    pub seconds: u32,    // IsoTimeZoneSecondDisplay
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IsoTimeZoneOptions {
    pub format: IsoTimeZoneFormat,
    pub minutes: IsoTimeZoneMinuteDisplay,
    pub seconds: IsoTimeZoneSecondDisplay,
}

impl TryFrom<intl_iso_time_zone_options> for IsoTimeZoneOptions {
    type Error = ErrorCode;

    fn try_from(raw: intl_iso_time_zone_options) -> Result<Self, ErrorCode> {
        Ok(Self {
            format: decode(raw.format)?,
            minutes: decode(raw.minutes)?,
            seconds: decode(raw.seconds)?,
        })
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct intl_collator_options {
    pub strength: u32,   // CollatorStrength
    pub case_first: u32, // CollatorCaseFirst
    pub numeric: u32,    // CollatorNumeric
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct intl_week_of {
    pub week: u8,
    pub unit: u32, // WeekRelativeUnit
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct intl_weekend_contains_day {
    pub monday: bool,
    pub tuesday: bool,
    pub wednesday: bool,
    pub thursday: bool,
    pub friday: bool,
    pub saturday: bool,
    pub sunday: bool,
}

impl From<[bool; 7]> for intl_weekend_contains_day {
    fn from(d: [bool; 7]) -> Self {
        Self {
            monday: d[0],
            tuesday: d[1],
            wednesday: d[2],
            thursday: d[3],
            friday: d[4],
            saturday: d[5],
            sunday: d[6],
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct intl_code_point_range_result {
    pub start: u32,
    pub end: u32,
    pub done: bool,
}

impl intl_code_point_range_result {
    pub const DONE: Self = Self {
        start: 0,
        end: 0,
        done: true,
    };
}
