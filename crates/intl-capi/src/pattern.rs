//! Date/time pattern strings (a subset of the CLDR pattern language).
//!
//! ASCII letters are fields, runs of the same letter set the field width,
//! `'...'` quotes literal text and `''` is a single quote. Every other
//! character is literal.

use intl_capi_core::ErrorCode;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("unknown pattern field {0:?}")]
    UnknownField(char),
    #[error("field {symbol:?} does not support width {width}")]
    Width { symbol: char, width: usize },
    #[error("unterminated quoted literal")]
    UnterminatedQuote,
    #[error("placeholder {{{0}}} has no argument")]
    Placeholder(usize),
}

impl From<PatternError> for ErrorCode {
    fn from(_: PatternError) -> Self {
        ErrorCode::ParseFailure
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Era(u8),
    Year(u8),
    Month(u8),
    Day(u8),
    Weekday(u8),
    Hour12(u8),
    Hour24(u8),
    Minute(u8),
    Second(u8),
    DayPeriod(u8),
    /// `z`: specific zone, rendered in GMT form.
    ZoneSpecific(u8),
    /// `O`: localized GMT.
    ZoneGmt(u8),
    /// `X`: ISO 8601 with `Z` for zero.
    ZoneIsoUtc(u8),
    /// `x`: ISO 8601.
    ZoneIso(u8),
}

impl Field {
    fn from_run(symbol: char, width: usize) -> Result<Self, PatternError> {
        let w = width as u8;
        let in_range = |lo: usize, hi: usize| (lo..=hi).contains(&width);
        let field = match symbol {
            'G' if in_range(1, 5) => Field::Era(w),
            'y' if in_range(1, 4) => Field::Year(w),
            'M' if in_range(1, 4) => Field::Month(w),
            'd' if in_range(1, 2) => Field::Day(w),
            'E' if in_range(1, 4) => Field::Weekday(w),
            'h' if in_range(1, 2) => Field::Hour12(w),
            'H' if in_range(1, 2) => Field::Hour24(w),
            'm' if in_range(1, 2) => Field::Minute(w),
            's' if in_range(1, 2) => Field::Second(w),
            'a' if in_range(1, 3) => Field::DayPeriod(w),
            'z' if in_range(1, 4) => Field::ZoneSpecific(w),
            'O' if width == 1 || width == 4 => Field::ZoneGmt(w),
            'X' if in_range(1, 3) => Field::ZoneIsoUtc(w),
            'x' if in_range(1, 3) => Field::ZoneIso(w),
            'G' | 'y' | 'M' | 'd' | 'E' | 'h' | 'H' | 'm' | 's' | 'a' | 'z' | 'O' | 'X' | 'x' => {
                return Err(PatternError::Width { symbol, width })
            }
            other => return Err(PatternError::UnknownField(other)),
        };
        Ok(field)
    }

    pub fn is_zone(self) -> bool {
        matches!(
            self,
            Field::ZoneSpecific(_) | Field::ZoneGmt(_) | Field::ZoneIsoUtc(_) | Field::ZoneIso(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    Literal(String),
    Field(Field),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    items: Vec<Item>,
}

impl Pattern {
    pub fn parse(src: &str) -> Result<Self, PatternError> {
        let mut out = Pattern::default();
        let mut chars = src.chars().peekable();
        while let Some(c) = chars.next() {
            if c.is_ascii_alphabetic() {
                let mut width = 1;
                while chars.peek() == Some(&c) {
                    chars.next();
                    width += 1;
                }
                out.items.push(Item::Field(Field::from_run(c, width)?));
            } else if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    out.push_literal("'");
                    continue;
                }
                let mut lit = String::new();
                loop {
                    match chars.next() {
                        None => return Err(PatternError::UnterminatedQuote),
                        Some('\'') if chars.peek() == Some(&'\'') => {
                            chars.next();
                            lit.push('\'');
                        }
                        Some('\'') => break,
                        Some(other) => lit.push(other),
                    }
                }
                out.push_literal(&lit);
            } else {
                let mut buf = [0u8; 4];
                out.push_literal(c.encode_utf8(&mut buf));
            }
        }
        Ok(out)
    }

    pub fn from_field(field: Field) -> Self {
        Self {
            items: vec![Item::Field(field)],
        }
    }

    /// Fills `{0}`, `{1}`, ... in `template` with `parts`. Text between
    /// placeholders is parsed as pattern text.
    pub fn compose(template: &str, parts: &[&Pattern]) -> Result<Self, PatternError> {
        let mut out = Pattern::default();
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}').map(|c| open + c) else {
                break;
            };
            let Ok(idx) = rest[open + 1..close].parse::<usize>() else {
                out.extend(Pattern::parse(&rest[..=close])?);
                rest = &rest[close + 1..];
                continue;
            };
            out.extend(Pattern::parse(&rest[..open])?);
            let part = parts.get(idx).ok_or(PatternError::Placeholder(idx))?;
            out.extend((*part).clone());
            rest = &rest[close + 1..];
        }
        out.extend(Pattern::parse(rest)?);
        Ok(out)
    }

    fn push_literal(&mut self, s: &str) {
        if let Some(Item::Literal(prev)) = self.items.last_mut() {
            prev.push_str(s);
        } else if !s.is_empty() {
            self.items.push(Item::Literal(s.to_owned()));
        }
    }

    fn extend(&mut self, other: Pattern) {
        for item in other.items {
            match item {
                Item::Literal(s) => self.push_literal(&s),
                field => self.items.push(field),
            }
        }
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.items.iter().filter_map(|i| match i {
            Item::Field(f) => Some(*f),
            Item::Literal(_) => None,
        })
    }

    pub fn has_zone(&self) -> bool {
        self.fields().any(Field::is_zone)
    }

    /// Drops zone fields together with the whitespace that separated them
    /// from the preceding field.
    pub fn without_zone(&self) -> Self {
        let mut out = Pattern::default();
        for item in &self.items {
            match item {
                Item::Field(f) if f.is_zone() => {
                    if let Some(Item::Literal(prev)) = out.items.last_mut() {
                        let trimmed = prev.trim_end().len();
                        prev.truncate(trimmed);
                        if prev.is_empty() {
                            out.items.pop();
                        }
                    }
                }
                Item::Literal(s) => out.push_literal(s),
                Item::Field(f) => out.items.push(Item::Field(*f)),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> Item {
        Item::Literal(s.to_owned())
    }

    #[test]
    fn parses_fields_and_literals() {
        let p = Pattern::parse("MMM d, y").unwrap();
        assert_eq!(
            p.items(),
            &[
                Item::Field(Field::Month(3)),
                lit(" "),
                Item::Field(Field::Day(1)),
                lit(", "),
                Item::Field(Field::Year(1)),
            ]
        );
    }

    #[test]
    fn quoting() {
        let p = Pattern::parse("h 'o''clock' ''a").unwrap();
        assert_eq!(
            p.items(),
            &[
                Item::Field(Field::Hour12(1)),
                lit(" o'clock '"),
                Item::Field(Field::DayPeriod(1)),
            ]
        );
        assert_eq!(Pattern::parse("'open"), Err(PatternError::UnterminatedQuote));
    }

    #[test]
    fn rejects_unknown_and_overlong_fields() {
        assert_eq!(Pattern::parse("Q"), Err(PatternError::UnknownField('Q')));
        assert_eq!(Pattern::parse("ddd"), Err(PatternError::Width { symbol: 'd', width: 3 }));
        assert_eq!(Pattern::parse("OO"), Err(PatternError::Width { symbol: 'O', width: 2 }));
    }

    #[test]
    fn compose_fills_placeholders() {
        let date = Pattern::parse("MMM d, y").unwrap();
        let time = Pattern::parse("h:mm a").unwrap();
        let p = Pattern::compose("{1} 'at' {0}", &[&time, &date]).unwrap();
        assert_eq!(p, Pattern::parse("MMM d, y 'at' h:mm a").unwrap());
        assert_eq!(Pattern::compose("{2}", &[&time]), Err(PatternError::Placeholder(2)));
    }

    #[test]
    fn zone_stripping() {
        let p = Pattern::parse("h:mm:ss a zzzz").unwrap();
        assert!(p.has_zone());
        let stripped = p.without_zone();
        assert!(!stripped.has_zone());
        assert_eq!(stripped, Pattern::parse("h:mm:ss a").unwrap());
    }
}
