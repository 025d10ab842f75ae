use clap::Args;
use serde_json::Value;

use bess_quote_core::pricing::PricingCatalog;
use bess_quote_core::quote::{build_quote, QuoteRequest};

use crate::input;

/// Arguments for the end-to-end quote
#[derive(Args)]
pub struct QuoteArgs {
    /// Path to JSON quote request
    #[arg(long)]
    pub input: Option<String>,

    /// Price as of this date (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<chrono::NaiveDate>,
}

pub fn run_quote(args: QuoteArgs, catalog: &PricingCatalog) -> Result<Value, Box<dyn std::error::Error>> {
    let mut request: QuoteRequest = input::read_request(args.input.as_deref(), "quote")?;
    if args.as_of.is_some() {
        request.install.as_of = args.as_of;
    }
    let result = build_quote(&request, catalog)?;
    Ok(serde_json::to_value(result)?)
}
