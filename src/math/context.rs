//! Arithmetic context: precision and rounding applied to every decimal result.
//!
//! The context is a plain `Copy` value handed to each operation. Operations
//! that need a different rounding direction derive a new context with
//! [`MathContext::with_rounding`] instead of mutating shared state.
//! Rounding and square roots delegate to [`bigdecimal::Context`].

use crate::errors::{EngineError, Result};
use bigdecimal::{BigDecimal, Context, RoundingMode};
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU64;

/// Significant digits used when no precision is configured.
pub const DEFAULT_PRECISION: u64 = 60;
/// Lowest precision a market may be configured with.
pub const MIN_MARKET_PRECISION: u64 = 50;
/// Upper bound keeping the series expansions tractable.
pub const MAX_PRECISION: u64 = 500;
/// Extra digits carried through transcendental evaluation before the final rounding.
pub const GUARD_DIGITS: u64 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rounding {
    /// Truncate.
    #[default]
    TowardZero,
    AwayFromZero,
    /// Ceiling.
    Up,
    /// Floor.
    Down,
}

impl Rounding {
    fn mode(self) -> RoundingMode {
        match self {
            Self::TowardZero => RoundingMode::Down,
            Self::AwayFromZero => RoundingMode::Up,
            Self::Up => RoundingMode::Ceiling,
            Self::Down => RoundingMode::Floor,
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::TowardZero => "toward_zero",
            Self::AwayFromZero => "away_from_zero",
            Self::Up => "up",
            Self::Down => "down",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MathContext {
    pub precision: u64,
    pub rounding: Rounding,
}

impl Default for MathContext {
    fn default() -> Self {
        Self {
            precision: DEFAULT_PRECISION,
            rounding: Rounding::TowardZero,
        }
    }
}

impl MathContext {
    pub fn new(precision: u64, rounding: Rounding) -> Result<Self> {
        if precision == 0 || precision > MAX_PRECISION {
            return Err(EngineError::config(format!(
                "precision must be within 1..={MAX_PRECISION}, got {precision}"
            )));
        }
        Ok(Self {
            precision,
            rounding,
        })
    }

    #[must_use]
    pub fn with_rounding(self, rounding: Rounding) -> Self {
        Self { rounding, ..self }
    }

    /// Same rounding, [`GUARD_DIGITS`] more precision.
    #[must_use]
    pub fn guarded(self) -> Self {
        Self {
            precision: self.precision + GUARD_DIGITS,
            ..self
        }
    }

    /// The equivalent `bigdecimal` context.
    pub fn decimal_context(&self) -> Context {
        let precision = NonZeroU64::new(self.precision).unwrap_or(NonZeroU64::MIN);
        Context::new(precision, self.rounding.mode())
    }

    /// Round `value` to `precision` significant digits; shorter values are kept as is.
    pub fn round(&self, value: &BigDecimal) -> BigDecimal {
        if value.digits() <= self.precision {
            return value.clone();
        }
        self.decimal_context().round_decimal_ref(value)
    }

    /// Round `value` to a fixed number of decimal places.
    pub fn round_places(&self, value: &BigDecimal, places: i64) -> BigDecimal {
        value.with_scale_round(places, self.rounding.mode())
    }

    /// Round to an integer and convert; fails when the result does not fit.
    pub fn to_integer(&self, value: &BigDecimal) -> Result<i64> {
        self.round_places(value, 0)
            .to_i64()
            .ok_or_else(|| EngineError::domain(format!("{value} does not fit an integer limit")))
    }

    pub fn add(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(&(a + b))
    }

    pub fn sub(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(&(a - b))
    }

    pub fn mul(&self, a: &BigDecimal, b: &BigDecimal) -> BigDecimal {
        self.round(&(a * b))
    }

    /// Long division carried to `precision + 2` digits with a sticky digit, so
    /// every rounding direction lands on the correctly rounded quotient.
    pub fn div(&self, a: &BigDecimal, b: &BigDecimal) -> Result<BigDecimal> {
        if b.is_zero() {
            return Err(EngineError::domain(format!("division of {a} by zero")));
        }
        if a.is_zero() {
            return Ok(BigDecimal::zero());
        }
        let shift = (self.precision as i64 + 2 + b.digits() as i64 - a.digits() as i64).max(0);
        let (num, num_scale) = a.as_bigint_and_exponent();
        let (den, den_scale) = b.as_bigint_and_exponent();
        let scaled = num * pow10_int(shift as u64);
        let mut quotient = &scaled / &den;
        let mut scale = num_scale - den_scale + shift;
        if !(&scaled % &den).is_zero() {
            let sticky = if scaled.is_negative() != den.is_negative() {
                BigInt::from(-1)
            } else {
                BigInt::from(1)
            };
            quotient = quotient * 10 + sticky;
            scale += 1;
        }
        Ok(self.round(&BigDecimal::new(quotient, scale)))
    }

    /// `a * b / c`.
    pub fn mul_div(&self, a: &BigDecimal, b: &BigDecimal, c: &BigDecimal) -> Result<BigDecimal> {
        self.div(&self.mul(a, b), c)
    }

    pub fn sqrt(&self, value: &BigDecimal) -> Result<BigDecimal> {
        value
            .sqrt_with_context(&self.decimal_context())
            .ok_or_else(|| EngineError::domain(format!("square root of negative value {value}")))
    }
}

/// Exact `10^exponent`.
pub fn pow10(exponent: i64) -> BigDecimal {
    BigDecimal::new(BigInt::from(1), -exponent)
}

pub(crate) fn pow10_int(exponent: u64) -> BigInt {
    BigInt::from(10).pow(exponent as u32)
}

/// Split a non-zero `value` into `(m, e)` with `value = m * 10^e` and `1 <= |m| < 10`.
pub(crate) fn split_exponent(value: &BigDecimal) -> (BigDecimal, i64) {
    let digits = value.digits() as i64;
    let (int_val, scale) = value.as_bigint_and_exponent();
    (BigDecimal::new(int_val, digits - 1), digits - 1 - scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[test]
    fn round_respects_direction() {
        let ctx = MathContext::new(3, Rounding::TowardZero).unwrap();
        assert_eq!(ctx.round(&dec("1.239")), dec("1.23"));
        assert_eq!(ctx.round(&dec("-1.239")), dec("-1.23"));
        assert_eq!(ctx.with_rounding(Rounding::AwayFromZero).round(&dec("1.231")), dec("1.24"));
        assert_eq!(ctx.with_rounding(Rounding::Up).round(&dec("-1.239")), dec("-1.23"));
        assert_eq!(ctx.with_rounding(Rounding::Down).round(&dec("-1.231")), dec("-1.24"));
    }

    #[test]
    fn round_counts_significant_not_decimal_digits() {
        let ctx = MathContext::new(4, Rounding::TowardZero).unwrap();
        assert_eq!(ctx.round(&dec("123456")), dec("123400"));
        assert_eq!(ctx.round(&dec("0.000123456")), dec("0.0001234"));
    }

    #[test]
    fn division_rounds_per_context() {
        let ctx = MathContext::new(5, Rounding::TowardZero).unwrap();
        assert_eq!(ctx.div(&dec("2"), &dec("3")).unwrap(), dec("0.66666"));
        let up = ctx.with_rounding(Rounding::AwayFromZero);
        assert_eq!(up.div(&dec("2"), &dec("3")).unwrap(), dec("0.66667"));
        assert_eq!(up.div(&dec("-2"), &dec("3")).unwrap(), dec("-0.66667"));
        assert_eq!(ctx.div(&dec("1"), &dec("4")).unwrap(), dec("0.25"));
    }

    #[test]
    fn division_by_zero_is_domain_error() {
        let ctx = MathContext::default();
        assert!(matches!(
            ctx.div(&dec("1"), &BigDecimal::zero()),
            Err(EngineError::Domain(_))
        ));
    }

    #[test]
    fn sqrt_matches_known_digits() {
        let ctx = MathContext::default();
        let root = ctx.sqrt(&dec("0.8")).unwrap();
        let expected = dec("0.894427190999915878563669467492510494176247343844610289708358");
        assert_eq!(root, expected);
        assert_eq!(ctx.sqrt(&dec("1e12")).unwrap(), dec("1000000"));
    }

    #[test]
    fn sqrt_rounds_per_context() {
        let down = MathContext::new(5, Rounding::TowardZero).unwrap();
        assert_eq!(down.sqrt(&dec("2")).unwrap(), dec("1.4142"));
        let up = down.with_rounding(Rounding::AwayFromZero);
        assert_eq!(up.sqrt(&dec("2")).unwrap(), dec("1.4143"));
    }

    #[test]
    fn decimal_context_carries_precision_and_rounding() {
        let ctx = MathContext::new(7, Rounding::Down).unwrap();
        let inner = ctx.decimal_context();
        assert_eq!(inner.precision().get(), 7);
        assert_eq!(inner.rounding_mode(), RoundingMode::Floor);
    }

    #[test]
    fn sqrt_of_negative_fails() {
        assert!(MathContext::default().sqrt(&dec("-1")).is_err());
    }

    #[test]
    fn precision_bounds_are_validated() {
        assert!(MathContext::new(0, Rounding::TowardZero).is_err());
        assert!(MathContext::new(MAX_PRECISION + 1, Rounding::TowardZero).is_err());
        assert_eq!(MathContext::default().precision, DEFAULT_PRECISION);
    }

    #[test]
    fn split_exponent_normalizes_mantissa() {
        let (m, e) = split_exponent(&dec("2500"));
        assert_eq!(m, dec("2.5"));
        assert_eq!(e, 3);
        let (m, e) = split_exponent(&dec("0.00042"));
        assert_eq!(m, dec("4.2"));
        assert_eq!(e, -4);
    }
}
