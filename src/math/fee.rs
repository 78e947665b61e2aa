//! Gross/net fee conversions and fee growth inside a limit range.

use super::context::MathContext;
use crate::errors::{EngineError, Result};
use bigdecimal::BigDecimal;
use num_traits::{One, Signed};
use serde::{Deserialize, Serialize};

const BPS_DENOMINATOR: u32 = 10_000;

/// Fails with [`EngineError::InvalidRate`] unless `0 <= rate < 1`.
pub fn check_rate(rate: &BigDecimal) -> Result<()> {
    if rate.is_negative() || *rate >= BigDecimal::one() {
        return Err(EngineError::InvalidRate(rate.clone()));
    }
    Ok(())
}

/// Fee rate from basis points; `30` gives `0.003`.
pub fn fee_rate_from_bps(ctx: &MathContext, bps: u32) -> Result<BigDecimal> {
    let rate = ctx.div(&BigDecimal::from(bps), &BigDecimal::from(BPS_DENOMINATOR))?;
    check_rate(&rate)?;
    Ok(rate)
}

pub fn calc_fee(ctx: &MathContext, gross_amount: &BigDecimal, rate: &BigDecimal) -> Result<BigDecimal> {
    check_rate(rate)?;
    Ok(ctx.mul(gross_amount, rate))
}

/// Fee owed on top of `net_amount` so that `net + fee` is the gross amount.
pub fn net_to_fee(ctx: &MathContext, net_amount: &BigDecimal, rate: &BigDecimal) -> Result<BigDecimal> {
    check_rate(rate)?;
    ctx.mul_div(net_amount, rate, &complement(ctx, rate))
}

pub fn net_to_gross(ctx: &MathContext, net_amount: &BigDecimal, rate: &BigDecimal) -> Result<BigDecimal> {
    check_rate(rate)?;
    ctx.div(net_amount, &complement(ctx, rate))
}

pub fn gross_to_net(ctx: &MathContext, gross_amount: &BigDecimal, rate: &BigDecimal) -> Result<BigDecimal> {
    check_rate(rate)?;
    Ok(ctx.mul(gross_amount, &complement(ctx, rate)))
}

fn complement(ctx: &MathContext, rate: &BigDecimal) -> BigDecimal {
    ctx.sub(&BigDecimal::one(), rate)
}

/// Cumulative fee growth per unit of liquidity, one factor per token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeFactors {
    pub base: BigDecimal,
    pub quote: BigDecimal,
}

impl FeeFactors {
    pub fn new(base: BigDecimal, quote: BigDecimal) -> Self {
        Self { base, quote }
    }
}

/// Fee growth accrued inside `[lower_limit, upper_limit)`.
///
/// `lower` and `upper` are the outside factors recorded at each bounding
/// limit; `global` is the market-wide growth. The outside factor flips to
/// `global - outside` when the current limit sits on the other side.
pub fn fee_inside(
    ctx: &MathContext,
    lower: &FeeFactors,
    upper: &FeeFactors,
    lower_limit: i64,
    upper_limit: i64,
    curr_limit: i64,
    global: &FeeFactors,
) -> FeeFactors {
    let above_lower = curr_limit >= lower_limit;
    let below_upper = curr_limit < upper_limit;
    let inside = |lower_outside: &BigDecimal, upper_outside: &BigDecimal, total: &BigDecimal| {
        let below = if above_lower {
            lower_outside.clone()
        } else {
            ctx.sub(total, lower_outside)
        };
        let above = if below_upper {
            upper_outside.clone()
        } else {
            ctx.sub(total, upper_outside)
        };
        ctx.sub(&ctx.sub(total, &below), &above)
    };
    FeeFactors {
        base: inside(&lower.base, &upper.base, &global.base),
        quote: inside(&lower.quote, &upper.quote, &global.quote),
    }
}
