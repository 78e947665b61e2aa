//! Spread engine: places bid/ask limit ranges around an oracle price.
//!
//! Three placement policies share the inventory skew helpers below:
//! - [`basic`]: fixed minimum spread plus a skew-driven delta.
//! - [`replicating`]: decimal-normalized oracle, spread from skew alone.
//! - [`reversion`]: trend-aware hysteresis against a cached reference price.

pub mod basic;
pub mod replicating;
pub mod reversion;

pub use basic::BasicSpread;
pub use replicating::ReplicatingSpread;
pub use reversion::ReversionSpread;

use crate::errors::{EngineError, Result};
use crate::math::context::{MathContext, Rounding};
use crate::math::{liquidity, price};
use crate::models::{BidAskRanges, MarketState, PositionRange, TokenDecimals, VirtualPosition};
use bigdecimal::BigDecimal;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

const SKEW_PLACES: i64 = 4;
const SKEW_BPS: i64 = 10_000;

/// A bid/ask placement policy.
pub trait SpreadStrategy {
    fn name(&self) -> &'static str;

    fn ranges(
        &self,
        ctx: &MathContext,
        state: &MarketState,
        decimals: TokenDecimals,
    ) -> Result<BidAskRanges>;
}

/// Strategy selected per market, tagged by `type` in config files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Strategy {
    Basic(BasicSpread),
    Replicating(ReplicatingSpread),
    Reversion(ReversionSpread),
}

impl Strategy {
    fn inner(&self) -> &dyn SpreadStrategy {
        match self {
            Self::Basic(s) => s,
            Self::Replicating(s) => s,
            Self::Reversion(s) => s,
        }
    }
}

impl SpreadStrategy for Strategy {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn ranges(
        &self,
        ctx: &MathContext,
        state: &MarketState,
        decimals: TokenDecimals,
    ) -> Result<BidAskRanges> {
        let ranges = self.inner().ranges(ctx, state, decimals)?;
        tracing::debug!(
            strategy = self.name(),
            bid_lower = ranges.bid.lower,
            bid_upper = ranges.bid.upper,
            ask_lower = ranges.ask.lower,
            ask_upper = ranges.ask.upper,
            "[SPREAD] ranges placed"
        );
        Ok(ranges)
    }
}

/// Inventory imbalance `(q - b·p) / (q + b·p)`, truncated to 4 places.
///
/// Positive when quote value exceeds base value. Empty inventory has no skew.
pub fn get_skew(
    ctx: &MathContext,
    base_reserves: &BigDecimal,
    quote_reserves: &BigDecimal,
    price: &BigDecimal,
) -> Result<BigDecimal> {
    let base_in_quote = ctx.mul(base_reserves, price);
    let total = ctx.add(quote_reserves, &base_in_quote);
    if total.is_zero() {
        return Ok(BigDecimal::zero());
    }
    let skew = ctx.div(&ctx.sub(quote_reserves, &base_in_quote), &total)?;
    Ok(ctx
        .with_rounding(Rounding::TowardZero)
        .round_places(&skew, SKEW_PLACES))
}

/// Limit shift `max_delta · skew`, truncated toward zero.
pub fn get_delta(
    ctx: &MathContext,
    max_delta: i64,
    base_reserves: &BigDecimal,
    quote_reserves: &BigDecimal,
    price: &BigDecimal,
) -> Result<i64> {
    let skew = get_skew(ctx, base_reserves, quote_reserves, price)?;
    delta_for_skew(ctx, max_delta, &skew)
}

/// `limit + by`, failing instead of overflowing.
pub(crate) fn add_limit(limit: i64, by: i64) -> Result<i64> {
    limit
        .checked_add(by)
        .ok_or_else(|| EngineError::domain(format!("limit {limit} plus {by} overflows")))
}

pub(crate) fn sub_limit(limit: i64, by: i64) -> Result<i64> {
    limit
        .checked_sub(by)
        .ok_or_else(|| EngineError::domain(format!("limit {limit} minus {by} overflows")))
}

pub(crate) fn delta_for_skew(ctx: &MathContext, max_delta: i64, skew: &BigDecimal) -> Result<i64> {
    ctx.with_rounding(Rounding::TowardZero)
        .to_integer(&ctx.mul(&BigDecimal::from(max_delta), skew))
}

/// Withdraw the side that would deepen an imbalance beyond `max_skew` bps.
///
/// Excess quote pulls the ask, excess base pulls the bid. Zero disables the gate.
pub fn apply_skew_gate(ranges: BidAskRanges, skew: &BigDecimal, max_skew: i64) -> BidAskRanges {
    if max_skew <= 0 {
        return ranges;
    }
    let skew_bps = skew * &BigDecimal::from(SKEW_BPS);
    let limit = BigDecimal::from(max_skew);
    if skew_bps >= limit {
        tracing::debug!(%skew, max_skew, "[SPREAD] ask withdrawn on quote-heavy inventory");
        BidAskRanges::new(ranges.bid, PositionRange::EMPTY)
    } else if skew_bps <= -limit {
        tracing::debug!(%skew, max_skew, "[SPREAD] bid withdrawn on base-heavy inventory");
        BidAskRanges::new(PositionRange::EMPTY, ranges.ask)
    } else {
        ranges
    }
}

/// Liquidity backing one side of the book.
///
/// Bids are funded with quote reserves, asks with base reserves. An empty
/// range yields a degenerate position; edges outside `[0, max_limit(1)]` fail.
pub fn virtual_position(
    ctx: &MathContext,
    is_bid: bool,
    range: &PositionRange,
    amount: &BigDecimal,
) -> Result<VirtualPosition> {
    if range.is_empty() {
        return Ok(VirtualPosition::empty());
    }
    price::check_limit(range.lower, 1)?;
    price::check_limit(range.upper, 1)?;
    let lower_sqrt_price = price::limit_to_sqrt_price(ctx, range.lower, 1)?;
    let upper_sqrt_price = price::limit_to_sqrt_price(ctx, range.upper, 1)?;
    let liquidity = if is_bid {
        liquidity::quote_to_liquidity(ctx, &lower_sqrt_price, &upper_sqrt_price, amount)?
    } else {
        liquidity::base_to_liquidity(ctx, &lower_sqrt_price, &upper_sqrt_price, amount)?
    };
    Ok(VirtualPosition::new(lower_sqrt_price, upper_sqrt_price, liquidity))
}
