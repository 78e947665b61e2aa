//! Trend-following placement with hysteresis.
//!
//! A fresh bid/ask pair is placed around the oracle and a cached pair
//! around the previous reference price. While trending, the book keeps
//! quoting against the cached anchor until the oracle moves clean past it,
//! so a reversal is not immediately chased.

use super::{SpreadStrategy, add_limit, sub_limit};
use crate::errors::{EngineError, Result};
use crate::math::context::MathContext;
use crate::math::price;
use crate::models::{BidAskRanges, MarketState, PositionRange, TokenDecimals, Trend};
use bigdecimal::BigDecimal;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReversionSpread {
    pub range: i64,
}

impl ReversionSpread {
    pub fn new(range: i64) -> Self {
        Self { range }
    }
}

fn pair_around(limit: i64, range: i64) -> Result<BidAskRanges> {
    Ok(BidAskRanges::new(
        PositionRange::new(sub_limit(limit, range)?, limit),
        PositionRange::new(limit, add_limit(limit, range)?),
    ))
}

/// Bid/ask ranges for `trend`. A missing or zero `cached_price` falls back to the oracle.
pub fn position_ranges(
    ctx: &MathContext,
    trend: Trend,
    range: i64,
    cached_price: Option<&BigDecimal>,
    oracle_price: &BigDecimal,
) -> Result<BidAskRanges> {
    if oracle_price.is_zero() {
        return Err(EngineError::domain("oracle price is zero"));
    }
    let fresh = pair_around(price::price_to_limit(ctx, oracle_price, 1, false)?, range)?;
    let anchor = cached_price.filter(|p| !p.is_zero()).unwrap_or(oracle_price);
    let cached = pair_around(price::price_to_limit(ctx, anchor, 1, false)?, range)?;
    let empty = PositionRange::EMPTY;

    let (branch, ranges) = match trend {
        Trend::Range => ("range", fresh),
        Trend::Up => {
            let cached_bid = cached.bid;
            if fresh.bid.upper > cached_bid.upper {
                ("up:breakout", BidAskRanges::new(fresh.bid, empty))
            } else if fresh.ask.lower <= cached_bid.lower {
                ("up:crossed", BidAskRanges::new(empty, cached_bid))
            } else if fresh.ask.lower >= cached_bid.upper {
                (
                    "up:extend",
                    BidAskRanges::new(PositionRange::new(cached_bid.lower, fresh.bid.upper), empty),
                )
            } else {
                (
                    "up:split",
                    BidAskRanges::new(
                        PositionRange::new(cached_bid.lower, fresh.bid.upper),
                        PositionRange::new(fresh.ask.lower, cached_bid.upper),
                    ),
                )
            }
        }
        Trend::Down => {
            let cached_ask = cached.ask;
            if fresh.ask.lower < cached_ask.lower {
                ("down:breakout", BidAskRanges::new(empty, fresh.ask))
            } else if fresh.bid.upper >= cached_ask.upper {
                ("down:crossed", BidAskRanges::new(cached_ask, empty))
            } else if fresh.bid.upper <= cached_ask.lower {
                (
                    "down:extend",
                    BidAskRanges::new(empty, PositionRange::new(fresh.ask.lower, cached_ask.upper)),
                )
            } else {
                (
                    "down:split",
                    BidAskRanges::new(
                        PositionRange::new(cached_ask.lower, fresh.bid.upper),
                        PositionRange::new(fresh.ask.lower, cached_ask.upper),
                    ),
                )
            }
        }
    };
    tracing::debug!(branch, ?trend, "[REVERSION] branch selected");
    Ok(ranges)
}

impl SpreadStrategy for ReversionSpread {
    fn name(&self) -> &'static str {
        "reversion"
    }

    fn ranges(
        &self,
        ctx: &MathContext,
        state: &MarketState,
        _decimals: TokenDecimals,
    ) -> Result<BidAskRanges> {
        position_ranges(
            ctx,
            state.trend,
            self.range,
            state.cached_price.as_ref(),
            &state.oracle_price,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn ranges(trend: Trend, cached: &str, oracle: &str) -> BidAskRanges {
        let ctx = MathContext::default();
        position_ranges(&ctx, trend, 1000, Some(&dec(cached)), &dec(oracle)).unwrap()
    }

    fn pr(lower: i64, upper: i64) -> PositionRange {
        PositionRange::new(lower, upper)
    }

    #[test]
    fn range_trend_is_symmetric_about_oracle_limit() {
        let out = ranges(Trend::Range, "1.2", "1");
        assert_eq!(out.bid, pr(7_905_625, 7_906_625));
        assert_eq!(out.ask, pr(7_906_625, 7_907_625));
    }

    #[test]
    fn up_breakout_adopts_fresh_bid() {
        let out = ranges(Trend::Up, "1", "1.1");
        assert_eq!(out.bid, pr(7_915_156, 7_916_156));
        assert_eq!(out.ask, PositionRange::EMPTY);
    }

    #[test]
    fn up_at_cached_price_extends_bid_without_ask() {
        let out = ranges(Trend::Up, "1", "1");
        assert_eq!(out.bid, pr(7_905_625, 7_906_625));
        assert_eq!(out.ask, PositionRange::EMPTY);
    }

    #[test]
    fn up_pullback_splits_cached_bid() {
        let out = ranges(Trend::Up, "1", "0.995");
        assert_eq!(out.bid, pr(7_905_625, 7_906_123));
        assert_eq!(out.ask, pr(7_906_123, 7_906_625));
    }

    #[test]
    fn up_reversal_relabels_cached_bid_as_ask() {
        for oracle in ["0.99005", "0.95"] {
            let out = ranges(Trend::Up, "1", oracle);
            assert_eq!(out.bid, PositionRange::EMPTY, "{oracle}");
            assert_eq!(out.ask, pr(7_905_625, 7_906_625), "{oracle}");
        }
    }

    #[test]
    fn down_breakout_adopts_fresh_ask() {
        let out = ranges(Trend::Down, "1", "0.95");
        assert_eq!(out.bid, PositionRange::EMPTY);
        assert_eq!(out.ask, pr(7_901_495, 7_902_495));
    }

    #[test]
    fn down_reversal_relabels_cached_ask_as_bid() {
        let out = ranges(Trend::Down, "1", "1.01006");
        assert_eq!(out.bid, pr(7_906_625, 7_907_625));
        assert_eq!(out.ask, PositionRange::EMPTY);
    }

    #[test]
    fn down_bounce_splits_cached_ask() {
        let out = ranges(Trend::Down, "1", "1.005");
        assert_eq!(out.bid, pr(7_906_625, 7_907_123));
        assert_eq!(out.ask, pr(7_907_123, 7_907_625));
    }

    #[test]
    fn down_at_cached_price_keeps_ask_only() {
        let out = ranges(Trend::Down, "1", "1");
        assert_eq!(out.bid, PositionRange::EMPTY);
        assert_eq!(out.ask, pr(7_906_625, 7_907_625));
    }

    #[test]
    fn zero_cached_price_falls_back_to_oracle() {
        let ctx = MathContext::default();
        let zero = BigDecimal::zero();
        let with_zero = position_ranges(&ctx, Trend::Up, 1000, Some(&zero), &dec("1.1")).unwrap();
        let with_none = position_ranges(&ctx, Trend::Up, 1000, None, &dec("1.1")).unwrap();
        assert_eq!(with_zero, with_none);
        assert_eq!(with_zero.bid, pr(7_915_156, 7_916_156));
        assert_eq!(with_zero.ask, PositionRange::EMPTY);
    }

    #[test]
    fn oversized_range_fails_instead_of_overflowing() {
        let ctx = MathContext::default();
        let err = position_ranges(&ctx, Trend::Range, i64::MAX, None, &dec("1"));
        assert!(matches!(err, Err(EngineError::Domain(_))));
    }

    #[test]
    fn zero_oracle_price_is_rejected() {
        let ctx = MathContext::default();
        let err = position_ranges(&ctx, Trend::Range, 1000, None, &BigDecimal::zero());
        assert!(matches!(err, Err(EngineError::Domain(_))));
    }
}
