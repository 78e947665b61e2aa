//! Swap engine: prices a trade against one virtual position.

pub mod curve;

pub use curve::{CurveStep, compute_swap_amount};

use crate::errors::{EngineError, Result, Slippage};
use crate::math::context::MathContext;
use crate::math::fee;
use crate::math::transcendental::pow10_half;
use crate::models::{SwapRequest, SwapResult, VirtualPosition};
use bigdecimal::BigDecimal;
use num_traits::Signed;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the swap fee is assessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeSettlement {
    /// Walk the raw amount; charge `net_to_fee` on the input actually consumed.
    #[serde(alias = "realized")]
    OnRealizedInput,
    /// Net the fee out of an exact input before walking; gross the consumed input back up.
    #[serde(alias = "requested")]
    OnRequestedInput,
}

impl FromStr for FeeSettlement {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "realized" | "on_realized_input" => Ok(Self::OnRealizedInput),
            "requested" | "on_requested_input" => Ok(Self::OnRequestedInput),
            other => Err(EngineError::config(format!("unknown fee settlement '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SwapEngine {
    ctx: MathContext,
    settlement: FeeSettlement,
}

impl SwapEngine {
    pub fn new(ctx: MathContext, settlement: FeeSettlement) -> Self {
        Self { ctx, settlement }
    }

    pub fn settlement(&self) -> FeeSettlement {
        self.settlement
    }

    /// Amounts in, out and fees for `request` against `position`.
    ///
    /// A degenerate position yields an all-zero result parked at the start edge.
    pub fn get_swap_amounts(
        &self,
        request: &SwapRequest,
        position: &VirtualPosition,
    ) -> Result<SwapResult> {
        let ctx = &self.ctx;
        if position.is_degenerate() {
            let start = if request.is_buy {
                &position.lower_sqrt_price
            } else {
                &position.upper_sqrt_price
            };
            tracing::debug!(liquidity = %position.liquidity, "[SWAP] degenerate position, nothing to fill");
            return Ok(SwapResult::zero(start.clone()));
        }
        if request.amount.is_negative() {
            return Err(EngineError::domain(format!(
                "swap amount must not be negative, got {}",
                request.amount
            )));
        }
        fee::check_rate(&request.fee_rate)?;

        let scale = match request.decimals {
            Some(decimals) => Some(pow10_half(ctx, -decimals.quote_minus_base())?),
            None => None,
        };
        let to_curve = |value: &BigDecimal| match &scale {
            Some(factor) => ctx.mul(value, factor),
            None => value.clone(),
        };
        let lower = to_curve(&position.lower_sqrt_price);
        let upper = to_curve(&position.upper_sqrt_price);
        let threshold = request.threshold_sqrt_price.as_ref().map(|t| to_curve(t));

        let (start, target) = if request.is_buy {
            let mut target = match threshold {
                Some(t) if t < upper => t,
                _ => upper.clone(),
            };
            if target < lower {
                tracing::debug!(%target, start = %lower, "[SWAP] threshold behind start, no movement");
                target = lower.clone();
            }
            (lower, target)
        } else {
            let mut target = match threshold {
                Some(t) if t > lower => t,
                _ => lower.clone(),
            };
            if target > upper {
                tracing::debug!(%target, start = %upper, "[SWAP] threshold behind start, no movement");
                target = upper.clone();
            }
            (upper, target)
        };

        let (step, amount_in, fees) = match self.settlement {
            FeeSettlement::OnRequestedInput => {
                let walk_amount = if request.exact_input {
                    fee::gross_to_net(ctx, &request.amount, &request.fee_rate)?
                } else {
                    request.amount.clone()
                };
                let step = compute_swap_amount(
                    ctx,
                    &start,
                    &target,
                    &position.liquidity,
                    &walk_amount,
                    request.exact_input,
                )?;
                let gross = fee::net_to_gross(ctx, &step.amount_in, &request.fee_rate)?;
                let fees = ctx.sub(&gross, &step.amount_in);
                (step, gross, fees)
            }
            FeeSettlement::OnRealizedInput => {
                let step = compute_swap_amount(
                    ctx,
                    &start,
                    &target,
                    &position.liquidity,
                    &request.amount,
                    request.exact_input,
                )?;
                let fees = fee::net_to_fee(ctx, &step.amount_in, &request.fee_rate)?;
                let gross = ctx.add(&step.amount_in, &fees);
                (step, gross, fees)
            }
        };

        if let Some(threshold_amount) = &request.threshold_amount {
            if request.exact_input && step.amount_out < *threshold_amount {
                let slippage = Slippage::OutputBelowMinimum {
                    amount_out: step.amount_out,
                    threshold: threshold_amount.clone(),
                };
                tracing::warn!(%slippage, "[SWAP] rejected");
                return Err(EngineError::SlippageExceeded(slippage));
            }
            if !request.exact_input && amount_in > *threshold_amount {
                let slippage = Slippage::InputAboveMaximum {
                    amount_in,
                    threshold: threshold_amount.clone(),
                };
                tracing::warn!(%slippage, "[SWAP] rejected");
                return Err(EngineError::SlippageExceeded(slippage));
            }
        }

        let next_sqrt_price = match &scale {
            Some(factor) => ctx.div(&step.next_sqrt_price, factor)?,
            None => step.next_sqrt_price,
        };
        tracing::debug!(
            is_buy = request.is_buy,
            exact_input = request.exact_input,
            amount_in = %amount_in,
            amount_out = %step.amount_out,
            fees = %fees,
            "[SWAP] filled"
        );
        Ok(SwapResult {
            amount_in,
            amount_out: step.amount_out,
            fees,
            next_sqrt_price,
        })
    }
}
