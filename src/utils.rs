//! Miscellaneous helper utilities.

use crate::math::context::pow10;
use bigdecimal::{BigDecimal, RoundingMode};
use num_bigint::BigInt;
use tracing_subscriber::{EnvFilter, fmt};

/// Initialize `tracing` subscriber with env-based filter.
///
/// If `RUST_LOG` is not set, defaults to `info` level.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Whole-token `amount` in raw token units, exactly.
pub fn to_raw(amount: &BigDecimal, decimals: u32) -> BigDecimal {
    amount * &pow10(i64::from(decimals))
}

/// Whole-token `amount` as a raw integer amount, truncating sub-unit dust.
pub fn to_fixed(amount: &BigDecimal, decimals: u32) -> BigInt {
    let (int_val, _) = to_raw(amount, decimals)
        .with_scale_round(0, RoundingMode::Down)
        .into_bigint_and_exponent();
    int_val
}

/// Raw token units as whole tokens, exactly.
pub fn to_decimals(raw: &BigDecimal, decimals: u32) -> BigDecimal {
    raw * &pow10(-i64::from(decimals))
}
