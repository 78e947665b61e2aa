//! Pricing and swap simulation for a concentrated-liquidity market maker.
//!
//! The crate converts between limits, sqrt prices, liquidity and token
//! amounts, places virtual bid/ask positions around an oracle price, and
//! prices trades against them exactly as the settlement contract would.
//! Every operation takes an explicit [`math::MathContext`].

pub mod config;
pub mod errors;
pub mod math;
pub mod models;
pub mod quoter;
pub mod spread;
pub mod swap;
pub mod utils;

pub use config::MarketConfig;
pub use errors::{EngineError, Result};
pub use quoter::Quoter;
