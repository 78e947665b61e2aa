//! Value types shared by the spread and swap engines.
//!
//! Nothing here outlives a single call: positions and ranges are recomputed
//! from caller-supplied market state every time.

use crate::errors::{EngineError, Result};
use bigdecimal::BigDecimal;
use num_traits::Zero;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Market direction signal consumed by the reversion strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    #[default]
    Range,
}

impl FromStr for Trend {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "range" => Ok(Self::Range),
            other => Err(EngineError::config(format!("unknown trend '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TokenDecimals {
    pub base: u32,
    pub quote: u32,
}

impl TokenDecimals {
    pub fn new(base: u32, quote: u32) -> Self {
        Self { base, quote }
    }

    /// `quote - base`, the power of ten separating raw and human prices.
    pub fn quote_minus_base(&self) -> i64 {
        i64::from(self.quote) - i64::from(self.base)
    }
}

/// A `[lower, upper]` limit range. `[0, 0]` marks a side that is not quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PositionRange {
    pub lower: i64,
    pub upper: i64,
}

impl PositionRange {
    pub const EMPTY: Self = Self { lower: 0, upper: 0 };

    pub fn new(lower: i64, upper: i64) -> Self {
        Self { lower, upper }
    }

    pub fn is_empty(&self) -> bool {
        self.upper <= self.lower
    }

    pub fn width(&self) -> i64 {
        (self.upper - self.lower).max(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BidAskRanges {
    pub bid: PositionRange,
    pub ask: PositionRange,
}

impl BidAskRanges {
    pub fn new(bid: PositionRange, ask: PositionRange) -> Self {
        Self { bid, ask }
    }
}

/// Synthetic liquidity over a sqrt price interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualPosition {
    pub lower_sqrt_price: BigDecimal,
    pub upper_sqrt_price: BigDecimal,
    pub liquidity: BigDecimal,
}

impl VirtualPosition {
    pub fn new(lower_sqrt_price: BigDecimal, upper_sqrt_price: BigDecimal, liquidity: BigDecimal) -> Self {
        Self {
            lower_sqrt_price,
            upper_sqrt_price,
            liquidity,
        }
    }

    /// Zero-liquidity position; swaps against it move nothing.
    pub fn empty() -> Self {
        Self::new(BigDecimal::zero(), BigDecimal::zero(), BigDecimal::zero())
    }

    pub fn is_degenerate(&self) -> bool {
        self.liquidity.is_zero() || self.lower_sqrt_price >= self.upper_sqrt_price
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAmounts {
    pub base_amount: BigDecimal,
    pub quote_amount: BigDecimal,
}

/// A trade against one virtual position.
///
/// Buys pay quote and receive base; sells pay base and receive quote.
/// `threshold_sqrt_price` is in position coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapRequest {
    pub is_buy: bool,
    pub exact_input: bool,
    pub amount: BigDecimal,
    pub fee_rate: BigDecimal,
    #[serde(default)]
    pub threshold_sqrt_price: Option<BigDecimal>,
    #[serde(default)]
    pub threshold_amount: Option<BigDecimal>,
    /// When set, position sqrt prices are rescaled by `10^((base - quote) / 2)` before the walk.
    #[serde(default)]
    pub decimals: Option<TokenDecimals>,
}

impl SwapRequest {
    pub fn new(is_buy: bool, exact_input: bool, amount: BigDecimal, fee_rate: BigDecimal) -> Self {
        Self {
            is_buy,
            exact_input,
            amount,
            fee_rate,
            threshold_sqrt_price: None,
            threshold_amount: None,
            decimals: None,
        }
    }

    #[must_use]
    pub fn with_threshold_sqrt_price(mut self, sqrt_price: BigDecimal) -> Self {
        self.threshold_sqrt_price = Some(sqrt_price);
        self
    }

    #[must_use]
    pub fn with_threshold_amount(mut self, amount: BigDecimal) -> Self {
        self.threshold_amount = Some(amount);
        self
    }

    #[must_use]
    pub fn with_decimals(mut self, decimals: TokenDecimals) -> Self {
        self.decimals = Some(decimals);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapResult {
    /// Gross input including fees.
    pub amount_in: BigDecimal,
    pub amount_out: BigDecimal,
    pub fees: BigDecimal,
    pub next_sqrt_price: BigDecimal,
}

impl SwapResult {
    /// No-op result parked at `sqrt_price`.
    pub fn zero(sqrt_price: BigDecimal) -> Self {
        Self {
            amount_in: BigDecimal::zero(),
            amount_out: BigDecimal::zero(),
            fees: BigDecimal::zero(),
            next_sqrt_price: sqrt_price,
        }
    }
}

/// Caller-owned inputs for one quoting round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketState {
    pub oracle_price: BigDecimal,
    pub base_reserves: BigDecimal,
    pub quote_reserves: BigDecimal,
    #[serde(default)]
    pub trend: Trend,
    /// Previous reference price anchoring the reversion hysteresis.
    #[serde(default)]
    pub cached_price: Option<BigDecimal>,
}

impl MarketState {
    pub fn new(oracle_price: BigDecimal, base_reserves: BigDecimal, quote_reserves: BigDecimal) -> Self {
        Self {
            oracle_price,
            base_reserves,
            quote_reserves,
            trend: Trend::Range,
            cached_price: None,
        }
    }

    #[must_use]
    pub fn with_trend(mut self, trend: Trend, cached_price: BigDecimal) -> Self {
        self.trend = trend;
        self.cached_price = Some(cached_price);
        self
    }
}
