//! Conversions between limits (discretized log-price index) and sqrt prices.
//!
//! A limit `l` at width `w` denotes the sqrt price `BASE^((l - offset(w)) / 2)`.
//! Shifting by the offset keeps every valid limit non-negative.

use super::context::{MathContext, Rounding};
use super::transcendental;
use crate::errors::{EngineError, Result};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::Signed;

/// Price step per limit unit, `1.00001`.
pub const BASE: &str = "1.00001";
pub const OFFSET: i64 = 7_906_625;
pub const MAX_LIMIT: i64 = 7_906_625;

fn base() -> BigDecimal {
    BigDecimal::new(BigInt::from(100_001), 5)
}

fn check_width(width: i64) -> Result<()> {
    if width <= 0 {
        return Err(EngineError::domain(format!("width must be positive, got {width}")));
    }
    Ok(())
}

fn check_positive(what: &str, value: &BigDecimal) -> Result<()> {
    if !value.is_positive() {
        return Err(EngineError::domain(format!("{what} must be positive, got {value}")));
    }
    Ok(())
}

pub fn offset(width: i64) -> Result<i64> {
    check_width(width)?;
    Ok(OFFSET.div_euclid(width) * width)
}

pub fn shift_limit(limit: i64, width: i64) -> Result<i64> {
    Ok(limit + offset(width)?)
}

pub fn unshift_limit(limit: i64, width: i64) -> Result<i64> {
    Ok(limit - offset(width)?)
}

/// Largest valid shifted limit for `width`.
pub fn max_limit(width: i64) -> Result<i64> {
    Ok(offset(width)? + MAX_LIMIT.div_euclid(width) * width)
}

/// Fails unless `0 <= limit <= max_limit(width)`.
pub fn check_limit(limit: i64, width: i64) -> Result<()> {
    let max = max_limit(width)?;
    if !(0..=max).contains(&limit) {
        return Err(EngineError::domain(format!(
            "limit {limit} outside [0, {max}] at width {width}"
        )));
    }
    Ok(())
}

pub fn limit_to_sqrt_price(ctx: &MathContext, limit: i64, width: i64) -> Result<BigDecimal> {
    let unshifted = unshift_limit(limit, width)?;
    // unshifted / 2, exactly
    let exponent = BigDecimal::new(BigInt::from(unshifted) * 5, 1);
    transcendental::pow(ctx, &base(), &exponent)
}

/// Inverse of [`limit_to_sqrt_price`]; the raw index is truncated toward zero before shifting.
pub fn sqrt_price_to_limit(ctx: &MathContext, sqrt_price: &BigDecimal, width: i64) -> Result<i64> {
    check_width(width)?;
    check_positive("sqrt price", sqrt_price)?;
    let work = ctx.guarded();
    let doubled = work.mul(&transcendental::ln_raw(&work, sqrt_price)?, &BigDecimal::from(2));
    let raw = work.div(&doubled, &transcendental::ln_raw(&work, &base())?)?;
    let limit = work.with_rounding(Rounding::TowardZero).to_integer(&raw)?;
    shift_limit(limit, width)
}

/// Limit for `price`, rounded after shifting: ceiling when `round_up`, floor otherwise.
///
/// Rounding before the shift would flip the direction for prices below 1,
/// whose raw index is negative.
pub fn price_to_limit(
    ctx: &MathContext,
    price: &BigDecimal,
    width: i64,
    round_up: bool,
) -> Result<i64> {
    let offset = BigDecimal::from(offset(width)?);
    check_positive("price", price)?;
    let work = ctx.guarded();
    let raw = work.div(
        &transcendental::ln_raw(&work, price)?,
        &transcendental::ln_raw(&work, &base())?,
    )?;
    let shifted = work.add(&raw, &offset);
    let direction = if round_up { Rounding::Up } else { Rounding::Down };
    work.with_rounding(direction).to_integer(&shifted)
}
