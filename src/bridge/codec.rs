//! Cell token classes and their encodings.
//!
//! Decimal cells are written with a fixed number of decimals. Hexadecimal and
//! binary-text cells hold the signed integer `round(value × 10^decimal_places)`
//! with a `0x` / `0b` prefix.

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{MapError, Result};

static DECIMAL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?$").expect("Invalid regex pattern")
});

static HEX_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?0[xX][0-9a-fA-F]+$").expect("Invalid regex pattern"));

static BINARY_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?0[bB][01]+$").expect("Invalid regex pattern"));

/// Lexical class of a cell token
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenClass {
    Decimal,
    Hexadecimal,
    Binary,
}

impl TokenClass {
    pub const ALL: [TokenClass; 3] = [
        TokenClass::Decimal,
        TokenClass::Hexadecimal,
        TokenClass::Binary,
    ];

    pub fn matches(&self, token: &str) -> bool {
        match self {
            TokenClass::Decimal => DECIMAL_TOKEN.is_match(token),
            TokenClass::Hexadecimal => HEX_TOKEN.is_match(token),
            TokenClass::Binary => BINARY_TOKEN.is_match(token),
        }
    }

    /// Class of `token`, if it is a value at all
    pub fn of(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|class| class.matches(token))
    }

    fn radix(&self) -> u32 {
        match self {
            TokenClass::Decimal => 10,
            TokenClass::Hexadecimal => 16,
            TokenClass::Binary => 2,
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            TokenClass::Decimal => "",
            TokenClass::Hexadecimal => "0x",
            TokenClass::Binary => "0b",
        }
    }
}

/// Number of digits after the decimal point of a decimal token
pub fn fraction_digits(token: &str) -> usize {
    let mantissa = token.split(['e', 'E']).next().unwrap_or(token);
    mantissa.split_once('.').map_or(0, |(_, frac)| frac.len())
}

fn scale(decimal_places: u8) -> f64 {
    10f64.powi(i32::from(decimal_places))
}

fn invalid(token: &str, class: TokenClass) -> MapError {
    MapError::Validation(format!("'{}' is not a {:?} cell", token, class))
}

/// Decode one cell token
pub fn decode(token: &str, class: TokenClass, decimal_places: u8) -> Result<f64> {
    if !class.matches(token) {
        return Err(invalid(token, class));
    }
    if class == TokenClass::Decimal {
        return token.parse::<f64>().map_err(|_| invalid(token, class));
    }
    let (negative, body) = match token.as_bytes()[0] {
        b'-' => (true, &token[1..]),
        b'+' => (false, &token[1..]),
        _ => (false, token),
    };
    // Skip the 0x / 0b prefix
    let digits = &body[2..];
    let magnitude = i64::from_str_radix(digits, class.radix()).map_err(|_| invalid(token, class))?;
    let scaled = if negative { -magnitude } else { magnitude };
    Ok(scaled as f64 / scale(decimal_places))
}

/// Encode one cell value
pub fn encode(value: f64, class: TokenClass, decimal_places: u8) -> Result<String> {
    if !value.is_finite() {
        return Err(MapError::Range(format!("cannot encode {}", value)));
    }
    if class == TokenClass::Decimal {
        return Ok(format!("{:.*}", usize::from(decimal_places), value));
    }
    let scaled = (value * scale(decimal_places)).round();
    if scaled.abs() >= i64::MAX as f64 {
        return Err(MapError::Range(format!(
            "{} does not fit a {}-decimal integer cell",
            value, decimal_places
        )));
    }
    let scaled = scaled as i64;
    let sign = if scaled < 0 { "-" } else { "" };
    let magnitude = scaled.unsigned_abs();
    let digits = match class {
        TokenClass::Hexadecimal => format!("{:X}", magnitude),
        TokenClass::Binary => format!("{:b}", magnitude),
        TokenClass::Decimal => magnitude.to_string(),
    };
    Ok(format!("{}{}{}", sign, class.prefix(), digits))
}
