use super::{SpreadStrategy, add_limit, apply_skew_gate, delta_for_skew, get_skew, sub_limit};
use crate::errors::Result;
use crate::math::context::{MathContext, pow10};
use crate::math::price;
use crate::models::{BidAskRanges, MarketState, PositionRange, TokenDecimals};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

/// Both sides anchor at the oracle limit; only inventory skew opens a spread.
///
/// The oracle quotes whole tokens, so it is rescaled to raw token units
/// before conversion to a limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicatingSpread {
    pub range: i64,
    pub max_delta: i64,
    #[serde(default)]
    pub max_skew: i64,
}

impl ReplicatingSpread {
    pub fn new(range: i64, max_delta: i64) -> Self {
        Self {
            range,
            max_delta,
            max_skew: 0,
        }
    }
}

pub fn position_range(
    ctx: &MathContext,
    is_bid: bool,
    delta: i64,
    range: i64,
    oracle_price: &BigDecimal,
    decimals: TokenDecimals,
) -> Result<PositionRange> {
    let scaled_price = ctx.mul(oracle_price, &pow10(decimals.quote_minus_base()));
    let anchor = add_limit(price::price_to_limit(ctx, &scaled_price, 1, !is_bid)?, delta)?;
    if is_bid {
        Ok(PositionRange::new(sub_limit(anchor, range)?, anchor))
    } else {
        Ok(PositionRange::new(anchor, add_limit(anchor, range)?))
    }
}

impl SpreadStrategy for ReplicatingSpread {
    fn name(&self) -> &'static str {
        "replicating"
    }

    fn ranges(
        &self,
        ctx: &MathContext,
        state: &MarketState,
        decimals: TokenDecimals,
    ) -> Result<BidAskRanges> {
        let skew = get_skew(ctx, &state.base_reserves, &state.quote_reserves, &state.oracle_price)?;
        let delta = delta_for_skew(ctx, self.max_delta, &skew)?;
        let bid = position_range(ctx, true, delta, self.range, &state.oracle_price, decimals)?;
        let ask = position_range(ctx, false, delta, self.range, &state.oracle_price, decimals)?;
        Ok(apply_skew_gate(BidAskRanges::new(bid, ask), &skew, self.max_skew))
    }
}
