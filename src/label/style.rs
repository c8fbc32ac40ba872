//! Page numbering styles and number formatting.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serializer};

use crate::error::Error;

/// Numbering style of a page label range (the `/S` entry).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberingStyle {
    /// Decimal arabic numerals (`/D`)
    Decimal,
    /// Uppercase roman numerals (`/R`)
    UpperRoman,
    /// Lowercase roman numerals (`/r`)
    LowerRoman,
    /// Uppercase letters (`/A`)
    UpperAlpha,
    /// Lowercase letters (`/a`)
    LowerAlpha,
}

impl NumberingStyle {
    /// The PDF name for this style, without the leading slash.
    pub fn pdf_name(self) -> &'static str {
        match self {
            NumberingStyle::Decimal => "D",
            NumberingStyle::UpperRoman => "R",
            NumberingStyle::LowerRoman => "r",
            NumberingStyle::UpperAlpha => "A",
            NumberingStyle::LowerAlpha => "a",
        }
    }

    /// Look up a style by its PDF name (`D`, `R`, `r`, `A`, `a`).
    pub fn from_pdf_name(name: &[u8]) -> Option<Self> {
        match name {
            b"D" => Some(NumberingStyle::Decimal),
            b"R" => Some(NumberingStyle::UpperRoman),
            b"r" => Some(NumberingStyle::LowerRoman),
            b"A" => Some(NumberingStyle::UpperAlpha),
            b"a" => Some(NumberingStyle::LowerAlpha),
            _ => None,
        }
    }

    /// Parse a configuration value. `None` means "no numbering".
    ///
    /// Accepts PDF names (optionally with a leading `/`), the descriptive
    /// names `decimal`, `upperRoman`, `lowerRoman`, `upperAlpha`,
    /// `lowerAlpha`, and `none` or the empty string.
    pub fn parse_config(value: &str) -> Result<Option<Self>, Error> {
        let value = value.trim();
        let name = value.strip_prefix('/').unwrap_or(value);
        if name.is_empty() || name.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        if let Some(style) = Self::from_pdf_name(name.as_bytes()) {
            return Ok(Some(style));
        }
        name.parse().map(Some)
    }

    /// Format a page number (1-based) in this style.
    ///
    /// Roman and letter numbering grow with the number, so past
    /// [`MAX_SYMBOLIC_NUMBER`] every style falls back to decimal digits.
    pub fn format(self, number: u32) -> String {
        if number > MAX_SYMBOLIC_NUMBER {
            return number.to_string();
        }
        match self {
            NumberingStyle::Decimal => number.to_string(),
            NumberingStyle::UpperRoman => to_roman(number),
            NumberingStyle::LowerRoman => to_roman(number).to_lowercase(),
            NumberingStyle::UpperAlpha => to_alpha(number),
            NumberingStyle::LowerAlpha => to_alpha(number).to_lowercase(),
        }
    }
}

impl FromStr for NumberingStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "decimal" => Ok(NumberingStyle::Decimal),
            "upperRoman" | "upper_roman" => Ok(NumberingStyle::UpperRoman),
            "lowerRoman" | "lower_roman" => Ok(NumberingStyle::LowerRoman),
            "upperAlpha" | "upper_alpha" => Ok(NumberingStyle::UpperAlpha),
            "lowerAlpha" | "lower_alpha" => Ok(NumberingStyle::LowerAlpha),
            _ => Err(Error::Config(format!("unknown numbering style {:?}", s))),
        }
    }
}

impl fmt::Display for NumberingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NumberingStyle::Decimal => "decimal",
            NumberingStyle::UpperRoman => "upperRoman",
            NumberingStyle::LowerRoman => "lowerRoman",
            NumberingStyle::UpperAlpha => "upperAlpha",
            NumberingStyle::LowerAlpha => "lowerAlpha",
        };
        f.write_str(name)
    }
}

/// Serde adapter for `Option<NumberingStyle>` fields in configuration files.
pub(crate) mod optional_style {
    use super::*;

    pub fn serialize<S: Serializer>(
        style: &Option<NumberingStyle>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match style {
            Some(style) => serializer.serialize_some(style.pdf_name()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NumberingStyle>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(raw) => NumberingStyle::parse_config(&raw).map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

/// Largest number written in roman numerals or letters (1000 repeated letters).
pub const MAX_SYMBOLIC_NUMBER: u32 = 26_000;

const ROMAN: &[(u32, &str)] = &[
    (1000, "M"),
    (900, "CM"),
    (500, "D"),
    (400, "CD"),
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

fn to_roman(mut n: u32) -> String {
    let mut out = String::new();
    for &(value, digits) in ROMAN {
        while n >= value {
            out.push_str(digits);
            n -= value;
        }
    }
    out
}

// A..Z, then AA..ZZ, then AAA..ZZZ.
fn to_alpha(n: u32) -> String {
    if n == 0 {
        return String::new();
    }
    let index = (n - 1) % 26;
    let repeat = (n - 1) / 26 + 1;
    let letter = char::from(b'A' + index as u8);
    std::iter::repeat(letter).take(repeat as usize).collect()
}
