use clap::Args;
use serde::Deserialize;
use serde_json::Value;

use bess_quote_core::financials::FinancialResult;
use bess_quote_core::ravs::{calculate_ravs, MarketRiskContext, OperationalContext, ProjectContext};

use crate::input;

/// Arguments for RAVS scoring
#[derive(Args)]
pub struct RavsArgs {
    /// Path to JSON input file: {"financials": <financials result>, "project": {...}, "market_risk": {...}, "operational": {...}}
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Deserialize)]
struct RavsRequest {
    financials: FinancialResult,
    #[serde(default)]
    project: ProjectContext,
    #[serde(default)]
    market_risk: MarketRiskContext,
    #[serde(default)]
    operational: OperationalContext,
}

pub fn run_ravs(args: RavsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: RavsRequest = input::read_request(args.input.as_deref(), "ravs")?;
    let result = calculate_ravs(
        &request.financials,
        &request.project,
        &request.market_risk,
        &request.operational,
    );
    Ok(serde_json::to_value(result)?)
}
