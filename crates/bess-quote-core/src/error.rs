use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("Unsupported industry: {0}")]
    UnsupportedIndustry(String),

    #[error("Invalid attribute: {attribute} — {reason}")]
    InvalidAttribute { attribute: String, reason: String },

    #[error("Unknown equipment category: {0}")]
    UnknownCategory(String),

    #[error("Invalid capacity: {field} = {value} (capacities must be >= 0)")]
    InvalidCapacity { field: String, value: Decimal },

    #[error("Invalid project lifetime: {0} years (must be between 1 and 50)")]
    InvalidProjectLifetime(i32),

    #[error("Invalid discount rate: {0} (must be in [0, 1))")]
    InvalidDiscountRate(Decimal),

    #[error("No convergence: {function} did not converge after {iterations} iterations (last NPV: {last_npv})")]
    NoConvergence {
        function: String,
        iterations: u32,
        last_npv: Decimal,
    },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid pricing table for {category}: {reason}")]
    InvalidPricingTable { category: String, reason: String },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for QuoteError {
    fn from(e: serde_json::Error) -> Self {
        QuoteError::SerializationError(e.to_string())
    }
}
