//! Market configuration loaded from JSON or environment variables.

use crate::errors::{EngineError, Result};
use crate::math::context::{DEFAULT_PRECISION, MIN_MARKET_PRECISION, MathContext, Rounding};
use crate::math::{fee, price};
use crate::models::TokenDecimals;
use crate::spread::{BasicSpread, ReplicatingSpread, ReversionSpread, Strategy};
use crate::swap::FeeSettlement;
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::env::VarError;
use std::path::Path;
use std::str::FromStr;

fn default_precision() -> u64 {
    DEFAULT_PRECISION
}

/// Everything needed to quote one market.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketConfig {
    pub strategy: Strategy,
    pub decimals: TokenDecimals,
    pub fee_rate: BigDecimal,
    /// Falls back to the strategy's customary policy when absent.
    #[serde(default)]
    pub fee_settlement: Option<FeeSettlement>,
    #[serde(default = "default_precision")]
    pub precision: u64,
}

impl MarketConfig {
    pub fn new(strategy: Strategy, decimals: TokenDecimals, fee_rate: BigDecimal) -> Self {
        Self {
            strategy,
            decimals,
            fee_rate,
            fee_settlement: None,
            precision: DEFAULT_PRECISION,
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Load from `MARKET_CONFIG_PATH` if set, otherwise from individual variables.
    pub fn from_env() -> Result<Self> {
        match std::env::var("MARKET_CONFIG_PATH") {
            Ok(path) => Self::from_path(path),
            Err(VarError::NotPresent) => Self::from_lookup(|key| std::env::var(key).ok()),
            Err(e) => Err(e.into()),
        }
    }

    /// Build from a key lookup using the environment variable names.
    ///
    /// Unset keys take the defaults of a standard ETH/USDC market.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let int = |key: &str, default: &str| -> Result<i64> {
            let raw = get(key, default);
            raw.trim()
                .parse()
                .map_err(|_| EngineError::config(format!("{key} must be an integer, got '{raw}'")))
        };
        let decimals = |key: &str, default: &str| -> Result<u32> {
            let raw = get(key, default);
            raw.trim()
                .parse()
                .map_err(|_| EngineError::config(format!("{key} must be a token decimal count, got '{raw}'")))
        };

        let range = int("RANGE", "5000")?;
        let max_delta = int("MAX_DELTA", "500")?;
        let max_skew = int("MAX_SKEW", "0")?;
        let strategy = match get("STRATEGY", "basic").trim().to_ascii_lowercase().as_str() {
            "basic" => Strategy::Basic(BasicSpread {
                min_spread: int("MIN_SPREAD", "25")?,
                range,
                max_delta,
                max_skew,
            }),
            "replicating" => Strategy::Replicating(ReplicatingSpread {
                range,
                max_delta,
                max_skew,
            }),
            "reversion" => Strategy::Reversion(ReversionSpread { range }),
            other => return Err(EngineError::config(format!("unknown strategy '{other}'"))),
        };
        let fee_settlement = lookup("FEE_SETTLEMENT")
            .map(|raw| FeeSettlement::from_str(&raw))
            .transpose()?;
        let precision = int("PRECISION", "60")?;

        let config = Self {
            strategy,
            decimals: TokenDecimals::new(decimals("BASE_DECIMALS", "18")?, decimals("QUOTE_DECIMALS", "6")?),
            fee_rate: BigDecimal::from_str(get("FEE_RATE", "0").trim())?,
            fee_settlement,
            precision: u64::try_from(precision)
                .map_err(|_| EngineError::config(format!("PRECISION must be positive, got {precision}")))?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Range, min spread and max delta are each bounded by the width of the
    /// limit domain, `max_limit(1)`.
    pub fn validate(&self) -> Result<()> {
        let (range, spreads) = match &self.strategy {
            Strategy::Basic(s) => (s.range, [s.min_spread, s.max_delta, s.max_skew]),
            Strategy::Replicating(s) => (s.range, [0, s.max_delta, s.max_skew]),
            Strategy::Reversion(s) => (s.range, [0, 0, 0]),
        };
        let domain = price::max_limit(1)?;
        if range <= 0 || range > domain {
            return Err(EngineError::config(format!(
                "range must be within 1..={domain}, got {range}"
            )));
        }
        if spreads.iter().any(|v| *v < 0) {
            return Err(EngineError::config(
                "min_spread, max_delta and max_skew must not be negative",
            ));
        }
        let [min_spread, max_delta, _] = spreads;
        if min_spread > domain || max_delta > domain {
            return Err(EngineError::config(format!(
                "min_spread and max_delta must not exceed {domain}"
            )));
        }
        if self.precision < MIN_MARKET_PRECISION {
            return Err(EngineError::config(format!(
                "precision must be at least {MIN_MARKET_PRECISION}, got {}",
                self.precision
            )));
        }
        fee::check_rate(&self.fee_rate)?;
        MathContext::new(self.precision, Rounding::TowardZero)?;
        Ok(())
    }

    /// Fee settlement in effect: explicit setting, else realized for basic markets
    /// and requested for the others.
    pub fn settlement(&self) -> FeeSettlement {
        self.fee_settlement.unwrap_or(match self.strategy {
            Strategy::Basic(_) => FeeSettlement::OnRealizedInput,
            Strategy::Replicating(_) | Strategy::Reversion(_) => FeeSettlement::OnRequestedInput,
        })
    }

    pub fn math_context(&self) -> Result<MathContext> {
        MathContext::new(self.precision, Rounding::TowardZero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::Zero;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_describe_a_basic_market() {
        let config = MarketConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.strategy, Strategy::Basic(BasicSpread::new(25, 5000, 500)));
        assert_eq!(config.decimals, TokenDecimals::new(18, 6));
        assert_eq!(config.precision, 60);
        assert_eq!(config.settlement(), FeeSettlement::OnRealizedInput);
        assert!(config.fee_rate.is_zero());
    }

    #[test]
    fn reversion_from_variables() {
        let config = MarketConfig::from_lookup(lookup(&[
            ("STRATEGY", "Reversion"),
            ("RANGE", "1000"),
            ("FEE_RATE", "0.003"),
            ("PRECISION", "80"),
        ]))
        .unwrap();
        assert_eq!(config.strategy, Strategy::Reversion(ReversionSpread::new(1000)));
        assert_eq!(config.settlement(), FeeSettlement::OnRequestedInput);
        assert_eq!(config.math_context().unwrap().precision, 80);
    }

    #[test]
    fn explicit_settlement_overrides_strategy_default() {
        let config = MarketConfig::from_lookup(lookup(&[("FEE_SETTLEMENT", "requested")])).unwrap();
        assert_eq!(config.settlement(), FeeSettlement::OnRequestedInput);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            MarketConfig::from_lookup(lookup(&[("RANGE", "0")])),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            MarketConfig::from_lookup(lookup(&[("PRECISION", "30")])),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            MarketConfig::from_lookup(lookup(&[("FEE_RATE", "1")])),
            Err(EngineError::InvalidRate(_))
        ));
        assert!(matches!(
            MarketConfig::from_lookup(lookup(&[("FEE_RATE", "abc")])),
            Err(EngineError::ParseDecimal(_))
        ));
        assert!(matches!(
            MarketConfig::from_lookup(lookup(&[("STRATEGY", "grid")])),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            MarketConfig::from_lookup(lookup(&[("MIN_SPREAD", "-1")])),
            Err(EngineError::Config(_))
        ));
    }

    #[test]
    fn values_wider_than_the_limit_domain_are_rejected() {
        let huge = MarketConfig::new(
            Strategy::Basic(BasicSpread::new(25, i64::MAX, 0)),
            TokenDecimals::new(18, 6),
            BigDecimal::zero(),
        );
        assert!(matches!(huge.validate(), Err(EngineError::Config(_))));
        assert!(matches!(
            MarketConfig::from_lookup(lookup(&[("RANGE", "20000000")])),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            MarketConfig::from_lookup(lookup(&[("MAX_DELTA", "15813251")])),
            Err(EngineError::Config(_))
        ));
        assert!(matches!(
            MarketConfig::from_lookup(lookup(&[("MIN_SPREAD", "15813251")])),
            Err(EngineError::Config(_))
        ));
        assert!(MarketConfig::from_lookup(lookup(&[("RANGE", "15813250")])).is_ok());
    }

    #[test]
    fn json_round_trips_through_validation() {
        let json = r#"{
            "strategy": {"type": "replicating", "range": 2000, "max_delta": 300, "max_skew": 5000},
            "decimals": {"base": 18, "quote": 6},
            "fee_rate": "0.001",
            "fee_settlement": "realized"
        }"#;
        let config = MarketConfig::from_json(json).unwrap();
        assert_eq!(config.precision, DEFAULT_PRECISION);
        assert_eq!(config.settlement(), FeeSettlement::OnRealizedInput);
        assert!(matches!(config.strategy, Strategy::Replicating(ref s) if s.max_skew == 5000));
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            MarketConfig::from_path("/nonexistent/market.json"),
            Err(EngineError::Io(_))
        ));
    }
}
