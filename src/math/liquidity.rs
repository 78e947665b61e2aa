//! Liquidity <-> token amount conversions over a sqrt price interval.

use super::context::MathContext;
use crate::errors::{EngineError, Result};
use crate::models::TokenAmounts;
use bigdecimal::BigDecimal;
use num_traits::{Signed, Zero};

/// Apply a signed liquidity delta. A negative result is rejected.
pub fn add_delta(ctx: &MathContext, liquidity: &BigDecimal, delta: &BigDecimal) -> Result<BigDecimal> {
    let updated = ctx.add(liquidity, delta);
    if updated.is_negative() {
        return Err(EngineError::domain(format!(
            "liquidity {liquidity} cannot absorb delta {delta}"
        )));
    }
    Ok(updated)
}

/// `ΔL * (upper - lower)`.
pub fn liquidity_to_quote(
    ctx: &MathContext,
    lower_sqrt_price: &BigDecimal,
    upper_sqrt_price: &BigDecimal,
    liquidity_delta: &BigDecimal,
) -> BigDecimal {
    ctx.mul(liquidity_delta, &ctx.sub(upper_sqrt_price, lower_sqrt_price))
}

/// `ΔL * (upper - lower) / (upper * lower)`.
pub fn liquidity_to_base(
    ctx: &MathContext,
    lower_sqrt_price: &BigDecimal,
    upper_sqrt_price: &BigDecimal,
    liquidity_delta: &BigDecimal,
) -> Result<BigDecimal> {
    let spread = ctx.sub(upper_sqrt_price, lower_sqrt_price);
    ctx.div(
        &ctx.mul(liquidity_delta, &spread),
        &ctx.mul(upper_sqrt_price, lower_sqrt_price),
    )
}

pub fn quote_to_liquidity(
    ctx: &MathContext,
    lower_sqrt_price: &BigDecimal,
    upper_sqrt_price: &BigDecimal,
    quote_amount: &BigDecimal,
) -> Result<BigDecimal> {
    let spread = interval(ctx, lower_sqrt_price, upper_sqrt_price)?;
    ctx.div(quote_amount, &spread)
}

pub fn base_to_liquidity(
    ctx: &MathContext,
    lower_sqrt_price: &BigDecimal,
    upper_sqrt_price: &BigDecimal,
    base_amount: &BigDecimal,
) -> Result<BigDecimal> {
    let spread = interval(ctx, lower_sqrt_price, upper_sqrt_price)?;
    ctx.div(
        &ctx.mul(base_amount, &ctx.mul(upper_sqrt_price, lower_sqrt_price)),
        &spread,
    )
}

fn interval(ctx: &MathContext, lower: &BigDecimal, upper: &BigDecimal) -> Result<BigDecimal> {
    let spread = ctx.sub(upper, lower);
    if spread.is_zero() {
        return Err(EngineError::domain(format!(
            "zero-width sqrt price interval at {lower}"
        )));
    }
    Ok(spread)
}

/// Token amounts backing `liquidity_delta` over `[lower, upper]` seen from `curr`.
///
/// Below the current price the interval is all quote, above it all base;
/// a straddling interval is split at `curr`.
pub fn liquidity_to_amounts(
    ctx: &MathContext,
    liquidity_delta: &BigDecimal,
    curr_sqrt_price: &BigDecimal,
    lower_sqrt_price: &BigDecimal,
    upper_sqrt_price: &BigDecimal,
) -> Result<TokenAmounts> {
    if upper_sqrt_price <= curr_sqrt_price {
        Ok(TokenAmounts {
            base_amount: BigDecimal::zero(),
            quote_amount: liquidity_to_quote(ctx, lower_sqrt_price, upper_sqrt_price, liquidity_delta),
        })
    } else if lower_sqrt_price <= curr_sqrt_price {
        Ok(TokenAmounts {
            base_amount: liquidity_to_base(ctx, curr_sqrt_price, upper_sqrt_price, liquidity_delta)?,
            quote_amount: liquidity_to_quote(ctx, lower_sqrt_price, curr_sqrt_price, liquidity_delta),
        })
    } else {
        Ok(TokenAmounts {
            base_amount: liquidity_to_base(ctx, lower_sqrt_price, upper_sqrt_price, liquidity_delta)?,
            quote_amount: BigDecimal::zero(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).expect("valid decimal")
    }

    #[test]
    fn quote_and_base_over_unit_interval() {
        let ctx = MathContext::default();
        let quote = liquidity_to_quote(&ctx, &dec("1"), &dec("1.1"), &dec("1000"));
        assert_eq!(quote, dec("100"));
        let base = liquidity_to_base(&ctx, &dec("1"), &dec("1.25"), &dec("1000")).unwrap();
        assert_eq!(base, dec("200"));
    }

    #[test]
    fn inverse_conversions_recover_liquidity() {
        let ctx = MathContext::default();
        let (lower, upper) = (dec("0.8"), dec("1.25"));
        let liquidity = dec("12345.678");
        let quote = liquidity_to_quote(&ctx, &lower, &upper, &liquidity);
        let base = liquidity_to_base(&ctx, &lower, &upper, &liquidity).unwrap();
        assert_eq!(quote_to_liquidity(&ctx, &lower, &upper, &quote).unwrap(), liquidity);
        let recovered = base_to_liquidity(&ctx, &lower, &upper, &base).unwrap();
        assert!((&recovered - &liquidity).abs() < dec("1e-50"));
    }

    #[test]
    fn inverse_conversions_reject_zero_width() {
        let ctx = MathContext::default();
        assert!(matches!(
            quote_to_liquidity(&ctx, &dec("1"), &dec("1"), &dec("5")),
            Err(EngineError::Domain(_))
        ));
        assert!(matches!(
            base_to_liquidity(&ctx, &dec("1"), &dec("1"), &dec("5")),
            Err(EngineError::Domain(_))
        ));
    }

    #[test]
    fn add_delta_rejects_negative_liquidity() {
        let ctx = MathContext::default();
        assert_eq!(add_delta(&ctx, &dec("10"), &dec("-4")).unwrap(), dec("6"));
        assert_eq!(add_delta(&ctx, &dec("10"), &dec("-10")).unwrap(), dec("0"));
        assert!(matches!(
            add_delta(&ctx, &dec("10"), &dec("-10.5")),
            Err(EngineError::Domain(_))
        ));
    }

    #[test]
    fn amounts_below_current_price_are_all_quote() {
        let ctx = MathContext::default();
        let amounts =
            liquidity_to_amounts(&ctx, &dec("100"), &dec("2"), &dec("1"), &dec("1.5")).unwrap();
        assert!(amounts.base_amount.is_zero());
        assert_eq!(amounts.quote_amount, dec("50"));
    }

    #[test]
    fn amounts_above_current_price_are_all_base() {
        let ctx = MathContext::default();
        let amounts =
            liquidity_to_amounts(&ctx, &dec("100"), &dec("0.5"), &dec("1"), &dec("2")).unwrap();
        assert_eq!(amounts.base_amount, dec("50"));
        assert!(amounts.quote_amount.is_zero());
    }

    #[test]
    fn straddling_interval_splits_at_current_price() {
        let ctx = MathContext::default();
        let (liquidity, curr, lower, upper) = (dec("100"), dec("1.2"), dec("1"), dec("1.5"));
        let amounts = liquidity_to_amounts(&ctx, &liquidity, &curr, &lower, &upper).unwrap();
        assert!(amounts.base_amount.is_positive());
        assert!(amounts.quote_amount.is_positive());
        assert_eq!(
            amounts.base_amount,
            liquidity_to_base(&ctx, &curr, &upper, &liquidity).unwrap()
        );
        assert_eq!(
            amounts.quote_amount,
            liquidity_to_quote(&ctx, &lower, &curr, &liquidity)
        );
    }
}
