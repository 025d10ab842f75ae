use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// All monetary values (USD). Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Never as percentages.
pub type Rate = Decimal;

/// Electrical power in kilowatts
pub type Kilowatts = Decimal;

/// Electrical power in megawatts
pub type Megawatts = Decimal;

/// Hours (durations, outage hours)
pub type Hours = Decimal;

/// Year fractions or counts
pub type Years = Decimal;

/// Version of the formula set in `financials` and `ravs`. Bump whenever a
/// formula or constant in those modules changes so stored quotes remain
/// reproducible against the version that produced them.
pub const FORMULA_VERSION: &str = "2.3.0";

/// Standard computation output envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation. Contains nothing that varies between
/// two runs with the same input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub formula_version: String,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            formula_version: FORMULA_VERSION.to_string(),
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
