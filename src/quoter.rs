//! Quoting pipeline: spread placement, then liquidity, then the swap walk.
//!
//! Market state and trade amounts are in whole-token units. Replicating
//! markets place their limits in raw token units, so the quoter rescales
//! reserves and amounts on the way in and results on the way out.

use crate::config::MarketConfig;
use crate::errors::{EngineError, Result, Slippage};
use crate::math::context::MathContext;
use crate::models::{BidAskRanges, MarketState, SwapRequest, SwapResult, VirtualPosition};
use crate::spread::{self, SpreadStrategy, Strategy};
use crate::swap::SwapEngine;
use crate::utils;
use bigdecimal::BigDecimal;

/// Bid and ask liquidity for one quoting round.
#[derive(Debug, Clone, PartialEq)]
pub struct BookPositions {
    pub ranges: BidAskRanges,
    pub bid: VirtualPosition,
    pub ask: VirtualPosition,
}

#[derive(Debug, Clone)]
pub struct Quoter {
    config: MarketConfig,
    ctx: MathContext,
    engine: SwapEngine,
}

impl Quoter {
    pub fn new(config: MarketConfig) -> Result<Self> {
        config.validate()?;
        let ctx = config.math_context()?;
        let engine = SwapEngine::new(ctx, config.settlement());
        tracing::debug!(
            strategy = config.strategy.name(),
            settlement = ?engine.settlement(),
            precision = ctx.precision,
            "[QUOTER] ready"
        );
        Ok(Self {
            config,
            ctx,
            engine,
        })
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn context(&self) -> &MathContext {
        &self.ctx
    }

    fn raw_units(&self) -> bool {
        matches!(self.config.strategy, Strategy::Replicating(_))
    }

    fn scale_in(&self, amount: &BigDecimal, decimals: u32) -> BigDecimal {
        if self.raw_units() {
            utils::to_raw(amount, decimals)
        } else {
            amount.clone()
        }
    }

    fn scale_out(&self, amount: &BigDecimal, decimals: u32) -> BigDecimal {
        if self.raw_units() {
            utils::to_decimals(amount, decimals)
        } else {
            amount.clone()
        }
    }

    pub fn ranges(&self, state: &MarketState) -> Result<BidAskRanges> {
        self.config
            .strategy
            .ranges(&self.ctx, state, self.config.decimals)
    }

    /// Bid funded by quote reserves, ask by base reserves.
    pub fn positions(&self, state: &MarketState) -> Result<BookPositions> {
        let ranges = self.ranges(state)?;
        let decimals = self.config.decimals;
        let quote_reserves = self.scale_in(&state.quote_reserves, decimals.quote);
        let base_reserves = self.scale_in(&state.base_reserves, decimals.base);
        Ok(BookPositions {
            ranges,
            bid: spread::virtual_position(&self.ctx, true, &ranges.bid, &quote_reserves)?,
            ask: spread::virtual_position(&self.ctx, false, &ranges.ask, &base_reserves)?,
        })
    }

    /// A request carrying this market's fee rate.
    pub fn request(&self, is_buy: bool, exact_input: bool, amount: BigDecimal) -> SwapRequest {
        SwapRequest::new(is_buy, exact_input, amount, self.config.fee_rate.clone())
    }

    /// Fill `request` against the ask for buys and the bid for sells.
    pub fn quote(&self, state: &MarketState, request: &SwapRequest) -> Result<SwapResult> {
        let positions = self.positions(state)?;
        let position = if request.is_buy {
            &positions.ask
        } else {
            &positions.bid
        };

        let decimals = self.config.decimals;
        let (in_decimals, out_decimals) = if request.is_buy {
            (decimals.quote, decimals.base)
        } else {
            (decimals.base, decimals.quote)
        };
        let (amount_decimals, threshold_decimals) = if request.exact_input {
            (in_decimals, out_decimals)
        } else {
            (out_decimals, in_decimals)
        };
        let mut scaled = request.clone();
        scaled.amount = self.scale_in(&request.amount, amount_decimals);
        scaled.threshold_amount = request
            .threshold_amount
            .as_ref()
            .map(|t| self.scale_in(t, threshold_decimals));

        let result = self
            .engine
            .get_swap_amounts(&scaled, position)
            .map_err(|err| match err {
                EngineError::SlippageExceeded(Slippage::OutputBelowMinimum { amount_out, threshold }) => {
                    EngineError::SlippageExceeded(Slippage::OutputBelowMinimum {
                        amount_out: self.scale_out(&amount_out, out_decimals),
                        threshold: self.scale_out(&threshold, out_decimals),
                    })
                }
                EngineError::SlippageExceeded(Slippage::InputAboveMaximum { amount_in, threshold }) => {
                    EngineError::SlippageExceeded(Slippage::InputAboveMaximum {
                        amount_in: self.scale_out(&amount_in, in_decimals),
                        threshold: self.scale_out(&threshold, in_decimals),
                    })
                }
                other => other,
            })?;
        let result = SwapResult {
            amount_in: self.scale_out(&result.amount_in, in_decimals),
            amount_out: self.scale_out(&result.amount_out, out_decimals),
            fees: self.scale_out(&result.fees, in_decimals),
            next_sqrt_price: result.next_sqrt_price,
        };
        tracing::info!(
            strategy = self.config.strategy.name(),
            is_buy = request.is_buy,
            amount_in = %result.amount_in,
            amount_out = %result.amount_out,
            fees = %result.fees,
            "[QUOTE] computed"
        );
        Ok(result)
    }
}
