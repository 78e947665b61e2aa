use super::{SpreadStrategy, add_limit, apply_skew_gate, delta_for_skew, get_skew, sub_limit};
use crate::errors::Result;
use crate::math::context::MathContext;
use crate::math::price;
use crate::models::{BidAskRanges, MarketState, PositionRange, TokenDecimals};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Ranges a fixed `min_spread` away from the oracle limit, shifted by skew.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasicSpread {
    pub min_spread: i64,
    pub range: i64,
    pub max_delta: i64,
    /// Skew in bps beyond which the overweight side is withdrawn; 0 disables.
    #[serde(default)]
    pub max_skew: i64,
}

impl BasicSpread {
    pub fn new(min_spread: i64, range: i64, max_delta: i64) -> Self {
        Self {
            min_spread,
            range,
            max_delta,
            max_skew: 0,
        }
    }
}

/// One side of the book. Bids anchor on the floor limit, asks on the ceiling.
pub fn position_range(
    ctx: &MathContext,
    is_bid: bool,
    min_spread: i64,
    delta: i64,
    range: i64,
    oracle_price: &BigDecimal,
) -> Result<PositionRange> {
    let limit = price::price_to_limit(ctx, oracle_price, 1, !is_bid)?;
    if is_bid {
        let upper = add_limit(sub_limit(limit, min_spread)?, delta)?;
        Ok(PositionRange::new(sub_limit(upper, range)?, upper))
    } else {
        let lower = add_limit(add_limit(limit, min_spread)?, delta)?;
        Ok(PositionRange::new(lower, add_limit(lower, range)?))
    }
}

impl SpreadStrategy for BasicSpread {
    fn name(&self) -> &'static str {
        "basic"
    }

    fn ranges(
        &self,
        ctx: &MathContext,
        state: &MarketState,
        _decimals: TokenDecimals,
    ) -> Result<BidAskRanges> {
        let skew = get_skew(ctx, &state.base_reserves, &state.quote_reserves, &state.oracle_price)?;
        let delta = delta_for_skew(ctx, self.max_delta, &skew)?;
        let bid = position_range(ctx, true, self.min_spread, delta, self.range, &state.oracle_price)?;
        let ask = position_range(ctx, false, self.min_spread, delta, self.range, &state.oracle_price)?;
        Ok(apply_skew_gate(BidAskRanges::new(bid, ask), &skew, self.max_skew))
    }
}
