//! Ordering for Kubernetes resource quantities.
//!
//! `k8s-openapi` keeps quantities as opaque strings, so `"1Gi"` and
//! `"1073741824"` do not compare equal. [`ParsedQuantity`] normalizes the
//! canonical serialization formats (binary SI, decimal SI and decimal
//! exponent) to an exact integer count of nano-units.

use std::cmp::Ordering;
use std::fmt;

use k8s_openapi::apimachinery::pkg::api::resource::Quantity;

use crate::error::{Error, Result};

const NANOS_PER_UNIT: i128 = 1_000_000_000;

/// A quantity as an exact number of nano-units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParsedQuantity {
    nanos: i128,
}

impl ParsedQuantity {
    /// Parse a Kubernetes quantity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidQuantity`] for malformed input or values that
    /// do not fit the internal representation.
    pub fn parse(quantity: &Quantity) -> Result<Self> {
        parse_str(quantity.0.trim())
    }

    /// Whole units, rounded up.
    pub fn units(self) -> i128 {
        let whole = self.nanos / NANOS_PER_UNIT;
        if self.nanos % NANOS_PER_UNIT > 0 {
            whole.saturating_add(1)
        } else {
            whole
        }
    }
}

impl fmt::Display for ParsedQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.units())
    }
}

/// Compare two quantities numerically.
///
/// # Errors
///
/// Returns [`Error::InvalidQuantity`] if either side fails to parse.
pub fn compare(left: &Quantity, right: &Quantity) -> Result<Ordering> {
    Ok(ParsedQuantity::parse(left)?.cmp(&ParsedQuantity::parse(right)?))
}

/// Scale factor of a suffix as a fraction `numerator / denominator`.
fn suffix_scale(suffix: &str) -> Option<(i128, i128)> {
    let scale = match suffix {
        "" => (1, 1),
        "Ki" => (1 << 10, 1),
        "Mi" => (1 << 20, 1),
        "Gi" => (1 << 30, 1),
        "Ti" => (1 << 40, 1),
        "Pi" => (1 << 50, 1),
        "Ei" => (1 << 60, 1),
        "n" => (1, 1_000_000_000),
        "u" => (1, 1_000_000),
        "m" => (1, 1_000),
        "k" => (1_000, 1),
        "M" => (1_000_000, 1),
        "G" => (1_000_000_000, 1),
        "T" => (1_000_000_000_000, 1),
        "P" => (1_000_000_000_000_000, 1),
        "E" => (1_000_000_000_000_000_000, 1),
        exponent => return exponent_scale(exponent),
    };
    Some(scale)
}

/// `e<N>` / `E<N>` decimal exponent suffixes.
fn exponent_scale(suffix: &str) -> Option<(i128, i128)> {
    let digits = suffix.strip_prefix(['e', 'E'])?;
    let exponent: i32 = digits.parse().ok()?;
    let power = 10_i128.checked_pow(exponent.unsigned_abs())?;
    if exponent >= 0 {
        Some((power, 1))
    } else {
        Some((1, power))
    }
}

fn parse_str(raw: &str) -> Result<ParsedQuantity> {
    let invalid = |reason: &str| Error::invalid_quantity(raw, reason);

    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    let number_len = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, suffix) = unsigned.split_at(number_len);
    if number.is_empty() || number == "." {
        return Err(invalid("missing numeric part"));
    }

    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if fraction.contains('.') {
        return Err(invalid("more than one decimal point"));
    }

    let digits = format!("{whole}{fraction}");
    let mantissa: i128 = digits
        .parse()
        .map_err(|_| invalid("numeric part out of range"))?;
    let fraction_scale = u32::try_from(fraction.len())
        .ok()
        .and_then(|len| 10_i128.checked_pow(len))
        .ok_or_else(|| invalid("too many fractional digits"))?;

    let (numerator, denominator) = suffix_scale(suffix).ok_or_else(|| invalid("unknown suffix"))?;

    let top = mantissa
        .checked_mul(numerator)
        .and_then(|v| v.checked_mul(NANOS_PER_UNIT))
        .ok_or_else(|| invalid("value out of range"))?;
    let bottom = fraction_scale
        .checked_mul(denominator)
        .ok_or_else(|| invalid("value out of range"))?;

    // Sub-nano remainders round up, matching the API server.
    let mut nanos = top / bottom;
    if top % bottom != 0 {
        nanos = nanos.saturating_add(1);
    }
    if negative {
        nanos = -nanos;
    }
    Ok(ParsedQuantity { nanos })
}
