pub mod context;
pub mod fee;
pub mod liquidity;
pub mod price;
pub mod transcendental;

pub use context::{MathContext, Rounding};
