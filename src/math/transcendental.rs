//! Natural logarithm, exponential and real powers over `BigDecimal`.
//!
//! Evaluation runs at [`MathContext::guarded`] precision; only the public
//! entry points round back to the caller's context. `bigdecimal` supplies
//! `exp`; the logarithm is computed here.

use super::context::{MathContext, pow10, split_exponent};
use crate::errors::{EngineError, Result};
use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};

/// Square roots taken before the atanh series; keeps its argument below ~0.005.
const LN_SQRT_STEPS_LIMIT: usize = 64;
/// Largest `|x|` accepted by `exp`.
const MAX_EXP_ARGUMENT: i64 = 1_000_000;

pub fn ln(ctx: &MathContext, value: &BigDecimal) -> Result<BigDecimal> {
    let work = ctx.guarded();
    Ok(ctx.round(&ln_raw(&work, value)?))
}

pub fn exp(ctx: &MathContext, value: &BigDecimal) -> Result<BigDecimal> {
    let work = ctx.guarded();
    Ok(ctx.round(&exp_raw(&work, value)?))
}

/// `base^exponent` for `base > 0` and any real exponent.
pub fn pow(ctx: &MathContext, base: &BigDecimal, exponent: &BigDecimal) -> Result<BigDecimal> {
    if exponent.is_zero() {
        return Ok(BigDecimal::one());
    }
    let work = ctx.guarded();
    let scaled = work.mul(exponent, &ln_raw(&work, base)?);
    Ok(ctx.round(&exp_raw(&work, &scaled)?))
}

/// `log_base(value)`.
pub fn log(ctx: &MathContext, value: &BigDecimal, base: &BigDecimal) -> Result<BigDecimal> {
    let work = ctx.guarded();
    let ratio = work.div(&ln_raw(&work, value)?, &ln_raw(&work, base)?)?;
    Ok(ctx.round(&ratio))
}

/// `10^(exponent / 2)`; exact for even exponents.
pub fn pow10_half(ctx: &MathContext, exponent: i64) -> Result<BigDecimal> {
    let whole = pow10(exponent.div_euclid(2));
    if exponent.rem_euclid(2) == 0 {
        return Ok(whole);
    }
    let root_ten = ctx.guarded().sqrt(&BigDecimal::from(10))?;
    Ok(ctx.round(&(&root_ten * &whole)))
}

pub(crate) fn ln_raw(work: &MathContext, value: &BigDecimal) -> Result<BigDecimal> {
    if !value.is_positive() {
        return Err(EngineError::domain(format!(
            "logarithm undefined for non-positive value {value}"
        )));
    }
    if value.is_one() {
        return Ok(BigDecimal::zero());
    }
    let (mantissa, exponent) = split_exponent(value);
    let ln_mantissa = ln_at_least_one(work, &mantissa)?;
    if exponent == 0 {
        return Ok(ln_mantissa);
    }
    let ln_ten = ln_at_least_one(work, &BigDecimal::from(10))?;
    Ok(work.add(&ln_mantissa, &work.mul(&BigDecimal::from(exponent), &ln_ten)))
}

/// ln(x) for x >= 1: square-root reduction, then `2 * atanh((r - 1) / (r + 1))`.
fn ln_at_least_one(work: &MathContext, value: &BigDecimal) -> Result<BigDecimal> {
    let one = BigDecimal::one();
    let near_one = BigDecimal::new(BigInt::from(101), 2);
    let mut reduced = value.clone();
    let mut steps = 0u32;
    while reduced > near_one && (steps as usize) < LN_SQRT_STEPS_LIMIT {
        reduced = work.sqrt(&reduced)?;
        steps += 1;
    }
    let z = work.div(&work.sub(&reduced, &one), &work.add(&reduced, &one))?;
    let series = atanh_series(work, &z)?;
    let multiplier = BigDecimal::new(BigInt::from(2u8).pow(steps + 1), 0);
    Ok(work.mul(&series, &multiplier))
}

fn atanh_series(work: &MathContext, z: &BigDecimal) -> Result<BigDecimal> {
    if z.is_zero() {
        return Ok(BigDecimal::zero());
    }
    let epsilon = pow10(-(work.precision as i64 + 2));
    let z_squared = work.mul(z, z);
    let mut power = z.clone();
    let mut sum = z.clone();
    let mut k: u64 = 1;
    loop {
        power = work.mul(&power, &z_squared);
        let term = work.div(&power, &BigDecimal::from(2 * k + 1))?;
        if term.abs() < epsilon {
            break;
        }
        sum = work.add(&sum, &term);
        k += 1;
    }
    Ok(sum)
}

pub(crate) fn exp_raw(work: &MathContext, value: &BigDecimal) -> Result<BigDecimal> {
    if value.is_zero() {
        return Ok(BigDecimal::one());
    }
    if value.abs() > BigDecimal::from(MAX_EXP_ARGUMENT) {
        return Err(EngineError::domain(format!("exponential of {value} overflows")));
    }
    Ok(value.exp_with_context(&work.decimal_context()))
}
