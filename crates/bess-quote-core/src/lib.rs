pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "pricing")]
pub mod pricing;

#[cfg(feature = "sizing")]
pub mod sizing;

#[cfg(feature = "equipment")]
pub mod equipment;

#[cfg(feature = "financials")]
pub mod financials;

#[cfg(feature = "analysis")]
pub mod analysis;

#[cfg(feature = "ravs")]
pub mod ravs;

#[cfg(feature = "quote")]
pub mod quote;

pub use error::QuoteError;
pub use types::*;

/// Standard result type for all quote-engine operations
pub type QuoteResult<T> = Result<T, QuoteError>;
