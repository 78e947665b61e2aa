//! Single-segment walk along the constant-liquidity curve.
//!
//! Buys pay quote and move the sqrt price up; sells pay base and move it down.

use crate::errors::{EngineError, Result};
use crate::math::context::MathContext;
use crate::math::liquidity::{liquidity_to_base, liquidity_to_quote};
use bigdecimal::BigDecimal;
use num_traits::Signed;

/// Net amounts exchanged by one walk and the price it stopped at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveStep {
    pub amount_in: BigDecimal,
    pub amount_out: BigDecimal,
    pub next_sqrt_price: BigDecimal,
}

/// Walk from `curr_sqrt_price` toward `target_sqrt_price` until either the
/// target is reached or `amount_rem` is used up.
///
/// Input left over after reaching the target is not consumed and not
/// charged. For exact output the reported `amount_out` never exceeds
/// `amount_rem`.
pub fn compute_swap_amount(
    ctx: &MathContext,
    curr_sqrt_price: &BigDecimal,
    target_sqrt_price: &BigDecimal,
    liquidity: &BigDecimal,
    amount_rem: &BigDecimal,
    exact_input: bool,
) -> Result<CurveStep> {
    let is_buy = target_sqrt_price > curr_sqrt_price;
    // quote for buys, base for sells
    let input_between = |from: &BigDecimal, to: &BigDecimal| -> Result<BigDecimal> {
        if is_buy {
            Ok(liquidity_to_quote(ctx, from, to, liquidity))
        } else {
            liquidity_to_base(ctx, to, from, liquidity)
        }
    };
    let output_between = |from: &BigDecimal, to: &BigDecimal| -> Result<BigDecimal> {
        if is_buy {
            liquidity_to_base(ctx, from, to, liquidity)
        } else {
            Ok(liquidity_to_quote(ctx, to, from, liquidity))
        }
    };

    let (next_sqrt_price, reached, sized) = if exact_input {
        let to_target = input_between(curr_sqrt_price, target_sqrt_price)?;
        if *amount_rem >= to_target {
            (target_sqrt_price.clone(), true, to_target)
        } else {
            let next = next_sqrt_price_amount_in(ctx, curr_sqrt_price, liquidity, amount_rem, is_buy)?;
            (next, false, to_target)
        }
    } else {
        let to_target = output_between(curr_sqrt_price, target_sqrt_price)?;
        if *amount_rem >= to_target {
            (target_sqrt_price.clone(), true, to_target)
        } else {
            let next = next_sqrt_price_amount_out(ctx, curr_sqrt_price, liquidity, amount_rem, is_buy)?;
            (next, false, to_target)
        }
    };

    let amount_in = if reached && exact_input {
        sized.clone()
    } else {
        input_between(curr_sqrt_price, &next_sqrt_price)?
    };
    let mut amount_out = if reached && !exact_input {
        sized
    } else {
        output_between(curr_sqrt_price, &next_sqrt_price)?
    };
    if !exact_input && amount_out > *amount_rem {
        amount_out = amount_rem.clone();
    }

    Ok(CurveStep {
        amount_in,
        amount_out,
        next_sqrt_price,
    })
}

/// Sqrt price after paying `amount_in` into the curve.
///
/// Buy: `curr + amount_in / L`. Sell: `L·curr / (L + amount_in·curr)`.
pub fn next_sqrt_price_amount_in(
    ctx: &MathContext,
    curr_sqrt_price: &BigDecimal,
    liquidity: &BigDecimal,
    amount_in: &BigDecimal,
    is_buy: bool,
) -> Result<BigDecimal> {
    if is_buy {
        Ok(ctx.add(curr_sqrt_price, &ctx.div(amount_in, liquidity)?))
    } else {
        let denominator = ctx.add(liquidity, &ctx.mul(amount_in, curr_sqrt_price));
        ctx.mul_div(liquidity, curr_sqrt_price, &denominator)
    }
}

/// Sqrt price after taking `amount_out` from the curve.
///
/// Buy: `L·curr / (L - amount_out·curr)`. Sell: `curr - amount_out / L`.
pub fn next_sqrt_price_amount_out(
    ctx: &MathContext,
    curr_sqrt_price: &BigDecimal,
    liquidity: &BigDecimal,
    amount_out: &BigDecimal,
    is_buy: bool,
) -> Result<BigDecimal> {
    if is_buy {
        let denominator = ctx.sub(liquidity, &ctx.mul(amount_out, curr_sqrt_price));
        if !denominator.is_positive() {
            return Err(EngineError::domain(format!(
                "output {amount_out} exceeds what liquidity {liquidity} can supply"
            )));
        }
        ctx.mul_div(liquidity, curr_sqrt_price, &denominator)
    } else {
        Ok(ctx.sub(curr_sqrt_price, &ctx.div(amount_out, liquidity)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    fn assert_close(actual: &BigDecimal, expected: &BigDecimal) {
        let diff = (actual - expected).abs();
        assert!(diff < dec("1e-50"), "expected {expected}, got {actual}");
    }

    #[test]
    fn exact_input_buy_stops_inside_the_range() {
        let ctx = MathContext::default();
        let lower = ctx.sqrt(&dec("0.8")).unwrap();
        let step =
            compute_swap_amount(&ctx, &lower, &dec("1"), &dec("10000"), &dec("1"), true).unwrap();
        assert_close(&step.next_sqrt_price, &(&lower + &dec("0.0001")));
        assert_close(&step.amount_in, &dec("1"));
        assert_close(
            &step.amount_out,
            &dec("1.24986026137465953032721855573593624193448798553362409881"),
        );
    }

    #[test]
    fn exact_input_beyond_target_leaves_remainder_unspent() {
        let ctx = MathContext::default();
        let step =
            compute_swap_amount(&ctx, &dec("1"), &dec("1.1"), &dec("100"), &dec("50"), true).unwrap();
        assert_eq!(step.next_sqrt_price, dec("1.1"));
        assert_eq!(step.amount_in, dec("10"));
        assert_close(&step.amount_out, &(dec("10") / dec("1.1")));
    }

    #[test]
    fn exact_input_sell_moves_price_down() {
        let ctx = MathContext::default();
        let step =
            compute_swap_amount(&ctx, &dec("1"), &dec("0.5"), &dec("100"), &dec("25"), true).unwrap();
        // 100 * 1 / (100 + 25) = 0.8
        assert_eq!(step.next_sqrt_price, dec("0.8"));
        assert_close(&step.amount_in, &dec("25"));
        assert_close(&step.amount_out, &dec("20"));
    }

    #[test]
    fn exact_output_buy_is_capped_at_request() {
        let ctx = MathContext::default();
        let step =
            compute_swap_amount(&ctx, &dec("1"), &dec("2"), &dec("100"), &dec("20"), false).unwrap();
        // 100 * 1 / (100 - 20) = 1.25
        assert_eq!(step.next_sqrt_price, dec("1.25"));
        assert!(step.amount_out <= dec("20"));
        assert_close(&step.amount_out, &dec("20"));
        assert_close(&step.amount_in, &dec("25"));
    }

    #[test]
    fn exact_output_sell_reaching_target() {
        let ctx = MathContext::default();
        let step =
            compute_swap_amount(&ctx, &dec("1"), &dec("0.9"), &dec("100"), &dec("1000"), false).unwrap();
        assert_eq!(step.next_sqrt_price, dec("0.9"));
        assert_close(&step.amount_out, &dec("10"));
        assert_close(&step.amount_in, &(dec("10") / dec("0.9")));
    }

    #[test]
    fn zero_movement_walk_exchanges_nothing() {
        let ctx = MathContext::default();
        let step =
            compute_swap_amount(&ctx, &dec("1"), &dec("1"), &dec("100"), &dec("5"), true).unwrap();
        assert!(step.amount_in.is_zero());
        assert!(step.amount_out.is_zero());
        assert_eq!(step.next_sqrt_price, dec("1"));
    }

    #[test]
    fn next_price_formulas() {
        let ctx = MathContext::default();
        let (curr, liquidity) = (dec("2"), dec("10"));
        assert_eq!(
            next_sqrt_price_amount_in(&ctx, &curr, &liquidity, &dec("5"), true).unwrap(),
            dec("2.5")
        );
        // 10 * 2 / (10 + 5 * 2) = 1
        assert_eq!(
            next_sqrt_price_amount_in(&ctx, &curr, &liquidity, &dec("5"), false).unwrap(),
            dec("1")
        );
        // 10 * 2 / (10 - 2.5 * 2) = 4
        assert_eq!(
            next_sqrt_price_amount_out(&ctx, &curr, &liquidity, &dec("2.5"), true).unwrap(),
            dec("4")
        );
        assert_eq!(
            next_sqrt_price_amount_out(&ctx, &curr, &liquidity, &dec("5"), false).unwrap(),
            dec("1.5")
        );
        assert!(next_sqrt_price_amount_out(&ctx, &curr, &liquidity, &dec("5"), true).is_err());
    }
}
