//! Exact resource quantities
//!
//! A [`Quantity`] stores its amount as an integer number of milli-units, so
//! CPU is held in millicores and memory in thousandths of a byte. All
//! arithmetic is integer arithmetic; nothing goes through `f64`.
//!
//! Parsing follows the Kubernetes quantity grammar:
//! - decimal SI suffixes (`m`, `k`, `M`, `G`, `T`, `P`, `E`)
//! - binary SI suffixes (`Ki`, `Mi`, `Gi`, `Ti`, `Pi`, `Ei`)
//! - decimal exponents (`1e3`, `5E-3`)
//!
//! and [`Display`](fmt::Display) renders the canonical form
//! (`4400m`, `17184Mi`, `12`, `48Gi`).

use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use thiserror::Error;

/// Milli-units in one whole unit
const MILLIS_PER_UNIT: i128 = 1000;

/// Binary suffixes, indexed by power of 1024
const BINARY_SUFFIXES: [&str; 7] = ["", "Ki", "Mi", "Gi", "Ti", "Pi", "Ei"];

/// Errors produced while parsing a quantity string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuantityError {
    #[error("quantity is empty")]
    Empty,
    #[error("quantities must match the regular expression '^([+-]?[0-9.]+)([eEinumkKMGTP]*[-+]?[0-9]*)$'")]
    Malformed,
    #[error("quantity must not be negative")]
    Negative,
    #[error("quantity is too large")]
    Overflow,
}

/// How a quantity is rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Format {
    /// `m`, `k`, `M`, ... suffixes
    #[default]
    DecimalSI,
    /// `Ki`, `Mi`, `Gi`, ... suffixes
    BinarySI,
    /// `e3`, `e-3`, ... exponents
    DecimalExponent,
}

/// Smallest representable step a result is rounded to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    /// One thousandth of a unit (millicores)
    Milli,
    /// One whole unit (bytes)
    Whole,
}

impl Unit {
    fn millis(self) -> i128 {
        match self {
            Unit::Milli => 1,
            Unit::Whole => MILLIS_PER_UNIT,
        }
    }
}

/// An exact, non-negative resource amount
///
/// Equality, ordering and hashing look at the normalized amount only, so
/// `4Gi` and `4294967296` are the same quantity.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quantity {
    millis: i128,
    format: Format,
}

impl Quantity {
    /// The zero quantity
    pub const fn zero() -> Self {
        Self {
            millis: 0,
            format: Format::DecimalSI,
        }
    }

    /// Build a quantity from milli-units. Negative amounts saturate at zero.
    pub fn from_millis(millis: i128, format: Format) -> Self {
        Self {
            millis: millis.max(0),
            format,
        }
    }

    /// Build a quantity from whole units
    pub fn from_units(units: i64, format: Format) -> Self {
        Self::from_millis(i128::from(units) * MILLIS_PER_UNIT, format)
    }

    /// Amount in milli-units
    pub fn milli_value(&self) -> i128 {
        self.millis
    }

    /// Amount in whole units, rounded up
    pub fn value(&self) -> i128 {
        ceil_div(self.millis, MILLIS_PER_UNIT)
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn is_zero(&self) -> bool {
        self.millis == 0
    }

    /// Round up to a multiple of `unit`
    pub fn round_up_to(self, unit: Unit) -> Self {
        let step = unit.millis();
        Self {
            millis: ceil_div(self.millis, step) * step,
            format: self.format,
        }
    }

    /// Multiply by an integer. Negative factors yield zero.
    pub fn scale(self, factor: i64) -> Self {
        Self::from_millis(self.millis.saturating_mul(i128::from(factor)), self.format)
    }

    /// Multiply by `numerator / denominator` and round half away from zero
    /// to a multiple of `unit`.
    ///
    /// The product is exact before rounding. A negative result saturates at
    /// zero; a zero denominator yields zero.
    pub fn mul_ratio(self, numerator: i64, denominator: i64, unit: Unit) -> Self {
        if denominator == 0 {
            return Self {
                millis: 0,
                format: self.format,
            };
        }

        let step = unit.millis();
        let mut num = self.millis.saturating_mul(i128::from(numerator));
        let mut den = i128::from(denominator) * step;
        if den < 0 {
            num = -num;
            den = -den;
        }

        let steps = round_half_away_from_zero(num, den);
        Self::from_millis(steps.saturating_mul(step), self.format)
    }
}

/// Ceiling division for a positive divisor
fn ceil_div(n: i128, d: i128) -> i128 {
    -((-n).div_euclid(d))
}

/// Rounded division for a positive divisor, ties away from zero
fn round_half_away_from_zero(n: i128, d: i128) -> i128 {
    let quotient = n / d;
    let remainder = n % d;
    if remainder.unsigned_abs() * 2 >= d.unsigned_abs() {
        quotient + n.signum()
    } else {
        quotient
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        self.millis == other.millis
    }
}

impl Eq for Quantity {}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Quantity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.millis.cmp(&other.millis)
    }
}

impl Hash for Quantity {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.millis.hash(state);
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, rhs: Self) {
        // a zero accumulator takes the format of the first amount added
        if self.millis == 0 {
            self.format = rhs.format;
        }
        self.millis = self.millis.saturating_add(rhs.millis);
    }
}

impl Add for Quantity {
    type Output = Quantity;

    fn add(mut self, rhs: Self) -> Self::Output {
        self += rhs;
        self
    }
}

impl Sum for Quantity {
    fn sum<I: Iterator<Item = Quantity>>(iter: I) -> Self {
        iter.fold(Quantity::zero(), Add::add)
    }
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(QuantityError::Empty);
        }

        let (negative, rest) = match s.as_bytes()[0] {
            b'-' => (true, &s[1..]),
            b'+' => (false, &s[1..]),
            _ => (false, s),
        };

        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, suffix) = rest.split_at(number_len);
        let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
        if (whole.is_empty() && fraction.is_empty()) || fraction.contains('.') {
            return Err(QuantityError::Malformed);
        }

        let (format, exp10, exp2) = parse_suffix(suffix)?;
        let fraction = fraction.trim_end_matches('0');

        let mut digits: i128 = 0;
        for b in whole.bytes().chain(fraction.bytes()) {
            digits = digits
                .checked_mul(10)
                .and_then(|d| d.checked_add(i128::from(b - b'0')))
                .ok_or(QuantityError::Overflow)?;
        }

        if digits == 0 {
            return Ok(Self { millis: 0, format });
        }
        if negative {
            return Err(QuantityError::Negative);
        }

        let mut millis = digits
            .checked_mul(1i128 << exp2)
            .ok_or(QuantityError::Overflow)?;

        // shift to milli-units, dropping the fraction digits already folded in
        let shift = i64::from(exp10) + 3 - fraction.len() as i64;
        if shift >= 0 {
            let factor = u32::try_from(shift)
                .ok()
                .and_then(|e| 10i128.checked_pow(e))
                .ok_or(QuantityError::Overflow)?;
            millis = millis.checked_mul(factor).ok_or(QuantityError::Overflow)?;
        } else {
            // finer than a milli-unit: round up, as Kubernetes does
            millis = match u32::try_from(-shift).ok().and_then(|e| 10i128.checked_pow(e)) {
                Some(divisor) => ceil_div(millis, divisor),
                None => 1,
            };
        }

        Ok(Self { millis, format })
    }
}

/// Returns (format, power of ten, power of two) for a suffix
fn parse_suffix(suffix: &str) -> Result<(Format, i32, u32), QuantityError> {
    let parsed = match suffix {
        "" => (Format::DecimalSI, 0, 0),
        "m" => (Format::DecimalSI, -3, 0),
        "k" => (Format::DecimalSI, 3, 0),
        "M" => (Format::DecimalSI, 6, 0),
        "G" => (Format::DecimalSI, 9, 0),
        "T" => (Format::DecimalSI, 12, 0),
        "P" => (Format::DecimalSI, 15, 0),
        "E" => (Format::DecimalSI, 18, 0),
        "Ki" => (Format::BinarySI, 0, 10),
        "Mi" => (Format::BinarySI, 0, 20),
        "Gi" => (Format::BinarySI, 0, 30),
        "Ti" => (Format::BinarySI, 0, 40),
        "Pi" => (Format::BinarySI, 0, 50),
        "Ei" => (Format::BinarySI, 0, 60),
        _ => {
            let exponent = suffix
                .strip_prefix(|c: char| c == 'e' || c == 'E')
                .ok_or(QuantityError::Malformed)?;
            let exponent: i32 = exponent.parse().map_err(|_| QuantityError::Malformed)?;
            (Format::DecimalExponent, exponent, 0)
        }
    };
    Ok(parsed)
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.millis == 0 {
            return f.write_str("0");
        }

        match self.format {
            // below 1Ki, or not a whole number of bytes: binary suffixes
            // would lose precision, fall back to decimal
            Format::BinarySI
                if self.millis % MILLIS_PER_UNIT == 0 && self.millis >= 1024 * MILLIS_PER_UNIT =>
            {
                write_binary(self.millis / MILLIS_PER_UNIT, f)
            }
            Format::DecimalExponent => write_decimal(self.millis, true, f),
            _ => write_decimal(self.millis, false, f),
        }
    }
}

fn write_binary(units: i128, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut mantissa = units;
    let mut power = 0;
    while power < BINARY_SUFFIXES.len() - 1 && mantissa % 1024 == 0 {
        mantissa /= 1024;
        power += 1;
    }
    write!(f, "{}{}", mantissa, BINARY_SUFFIXES[power])
}

fn write_decimal(millis: i128, exponent: bool, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut mantissa = millis;
    let mut exp = -3;
    while exp < 18 && mantissa % 1000 == 0 {
        mantissa /= 1000;
        exp += 3;
    }

    if exponent {
        return match exp {
            0 => write!(f, "{}", mantissa),
            _ => write!(f, "{}e{}", mantissa, exp),
        };
    }

    let suffix = match exp {
        -3 => "m",
        0 => "",
        3 => "k",
        6 => "M",
        9 => "G",
        12 => "T",
        15 => "P",
        _ => "E",
    };
    write!(f, "{}{}", mantissa, suffix)
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(s: &str) -> Quantity {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_decimal_suffixes() {
        assert_eq!(q("100m").milli_value(), 100);
        assert_eq!(q("1").milli_value(), 1000);
        assert_eq!(q("1.5").milli_value(), 1500);
        assert_eq!(q("2k").milli_value(), 2_000_000);
        assert_eq!(q("1M").value(), 1_000_000);
        assert_eq!(q("500m").format(), Format::DecimalSI);
    }

    #[test]
    fn test_parse_binary_suffixes() {
        assert_eq!(q("4Gi").value(), 4_294_967_296);
        assert_eq!(q("200Mi").value(), 209_715_200);
        assert_eq!(q("1.5Gi").value(), 1_610_612_736);
        assert_eq!(q("1Ki").format(), Format::BinarySI);
    }

    #[test]
    fn test_parse_exponent() {
        assert_eq!(q("1e3").value(), 1000);
        assert_eq!(q("5E-3").milli_value(), 5);
        assert_eq!(q("1e3").format(), Format::DecimalExponent);
    }

    #[test]
    fn test_sub_milli_precision_rounds_up() {
        assert_eq!(q("0.0001").milli_value(), 1);
        assert_eq!(q("1.0001").milli_value(), 1001);
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert_eq!("".parse::<Quantity>(), Err(QuantityError::Empty));
        assert_eq!("abc".parse::<Quantity>(), Err(QuantityError::Malformed));
        assert_eq!("1Xi".parse::<Quantity>(), Err(QuantityError::Malformed));
        assert_eq!("1.2.3".parse::<Quantity>(), Err(QuantityError::Malformed));
        assert_eq!("-1".parse::<Quantity>(), Err(QuantityError::Negative));
        assert_eq!("1e400".parse::<Quantity>(), Err(QuantityError::Overflow));
    }

    #[test]
    fn test_equality_ignores_suffix() {
        assert_eq!(q("4Gi"), q("4294967296"));
        assert_eq!(q("1"), q("1000m"));
        assert_eq!(q("-0"), Quantity::zero());
        assert!(q("1Gi") > q("1G"));
    }

    #[test]
    fn test_display_canonical() {
        assert_eq!(q("4400m").to_string(), "4400m");
        assert_eq!(q("12000m").to_string(), "12");
        assert_eq!(q("1000").to_string(), "1k");
        assert_eq!(q("1.5").to_string(), "1500m");
        assert_eq!(q("48Gi").to_string(), "48Gi");
        assert_eq!(q("17184Mi").to_string(), "17184Mi");
        assert_eq!(q("1024Mi").to_string(), "1Gi");
        assert_eq!(q("512Ki").to_string(), "512Ki");
        assert_eq!(q("0Gi").to_string(), "0");
        assert_eq!(q("1e3").to_string(), "1e3");
        assert_eq!(q("4400e-3").to_string(), "4400e-3");
    }

    #[test]
    fn test_display_binary_falls_back_to_decimal() {
        // below 1Ki
        assert_eq!(Quantity::from_units(1000, Format::BinarySI).to_string(), "1k");
        // not divisible by 1024
        assert_eq!(Quantity::from_units(1_000_001, Format::BinarySI).to_string(), "1000001");
    }

    #[test]
    fn test_add_adopts_first_format() {
        let total = Quantity::zero() + q("4Gi") + q("200Mi");
        assert_eq!(total.format(), Format::BinarySI);
        assert_eq!(total.to_string(), "4296Mi");

        let cpu: Quantity = [q("1"), q("100m")].into_iter().sum();
        assert_eq!(cpu.to_string(), "1100m");
    }

    #[test]
    fn test_scale() {
        assert_eq!(q("500m").scale(3), q("1500m"));
        assert_eq!(q("4Gi").scale(0), Quantity::zero());
        assert_eq!(q("4Gi").scale(-2), Quantity::zero());
    }

    #[test]
    fn test_mul_ratio_exact() {
        // 1100m * 3 * (4/3)
        assert_eq!(q("1100m").mul_ratio(12, 3, Unit::Milli), q("4400m"));
        // 4Gi * 10 * 1.1
        assert_eq!(q("4Gi").mul_ratio(110, 10, Unit::Whole), q("44Gi"));
    }

    #[test]
    fn test_mul_ratio_rounds_half_away_from_zero() {
        assert_eq!(q("1m").mul_ratio(1, 2, Unit::Milli).milli_value(), 1);
        assert_eq!(q("1m").mul_ratio(1, 3, Unit::Milli).milli_value(), 0);
        assert_eq!(q("3").mul_ratio(1, 2, Unit::Whole).value(), 2);
        assert_eq!(q("5").mul_ratio(1, 4, Unit::Whole).value(), 1);
        assert_eq!(q("1").mul_ratio(1, -2, Unit::Milli), Quantity::zero());
    }

    #[test]
    fn test_mul_ratio_zero_denominator() {
        assert!(q("1").mul_ratio(1, 0, Unit::Milli).is_zero());
    }

    #[test]
    fn test_round_up_to_whole() {
        let q = Quantity::from_millis(1500, Format::DecimalSI);
        assert_eq!(q.round_up_to(Unit::Whole).milli_value(), 2000);
        assert_eq!(q.round_up_to(Unit::Milli).milli_value(), 1500);
    }

    #[test]
    fn test_serialize_as_string() {
        let json = serde_json::to_string(&q("4Gi")).unwrap();
        assert_eq!(json, "\"4Gi\"");
    }
}
