pub mod equipment;
pub mod financials;
pub mod pricing;
pub mod quote;
pub mod ravs;
pub mod sizing;
