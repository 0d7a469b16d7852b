pub mod calculator;
pub mod types;

pub use calculator::TrendCalculator;
pub use types::TrendRow;
