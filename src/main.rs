use anyhow::{Context, Result};
use bigdecimal::BigDecimal;
use clmm_quoter::{
    MarketConfig, Quoter,
    models::{MarketState, Trend},
    spread::SpreadStrategy,
    utils,
};
use std::str::FromStr;

fn env_decimal(key: &str, default: &str) -> Result<BigDecimal> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.into());
    BigDecimal::from_str(raw.trim()).with_context(|| format!("{key} must be a decimal, got '{raw}'"))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    utils::init_logging();

    let config = MarketConfig::from_env().context("loading market config")?;
    tracing::info!(
        strategy = config.strategy.name(),
        base_decimals = config.decimals.base,
        quote_decimals = config.decimals.quote,
        fee_rate = %config.fee_rate,
        settlement = ?config.settlement(),
        "[INIT] clmm-quoter starting"
    );
    let quoter = Quoter::new(config)?;

    // Market snapshot
    let oracle_price = env_decimal("ORACLE_PRICE", "2500")?;
    let mut state = MarketState::new(
        oracle_price,
        env_decimal("BASE_RESERVES", "10")?,
        env_decimal("QUOTE_RESERVES", "25000")?,
    );
    if let Ok(trend) = std::env::var("TREND") {
        state.trend = Trend::from_str(&trend)?;
        state.cached_price = Some(env_decimal("CACHED_PRICE", "0")?);
    }

    let positions = quoter.positions(&state)?;
    tracing::info!(
        bid_lower = positions.ranges.bid.lower,
        bid_upper = positions.ranges.bid.upper,
        ask_lower = positions.ranges.ask.lower,
        ask_upper = positions.ranges.ask.upper,
        bid_liquidity = %positions.bid.liquidity,
        ask_liquidity = %positions.ask.liquidity,
        "[BOOK] virtual positions"
    );

    let is_buy = std::env::var("SIDE").map(|s| s != "sell").unwrap_or(true);
    let exact_input = std::env::var("EXACT_OUTPUT").map(|s| s != "1").unwrap_or(true);
    let amount = env_decimal("AMOUNT", "1000")?;
    let request = quoter.request(is_buy, exact_input, amount);
    let result = quoter.quote(&state, &request)?;
    let decimals = quoter.config().decimals;
    let (in_decimals, out_decimals) = if is_buy {
        (decimals.quote, decimals.base)
    } else {
        (decimals.base, decimals.quote)
    };
    tracing::info!(
        is_buy,
        exact_input,
        amount_in = %result.amount_in,
        amount_out = %result.amount_out,
        amount_in_raw = %utils::to_fixed(&result.amount_in, in_decimals),
        amount_out_raw = %utils::to_fixed(&result.amount_out, out_decimals),
        fees = %result.fees,
        next_sqrt_price = %result.next_sqrt_price,
        "[SWAP] quote"
    );
    Ok(())
}
