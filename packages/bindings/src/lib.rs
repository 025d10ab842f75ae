use napi::Result as NapiResult;
use napi_derive::napi;
use rust_decimal::Decimal;
use serde::Deserialize;

use bess_quote_core::equipment::{InstallOptions, RenewablesOptions};
use bess_quote_core::financials::{AdvancedOptions, FinancialResult, MarketContext};
use bess_quote_core::pricing::{EquipmentCategory, PricingCatalog};
use bess_quote_core::ravs::{MarketRiskContext, OperationalContext, ProjectContext};
use bess_quote_core::sizing::{FacilityProfile, PowerSizingResult};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Optional catalog JSON, falling back to the built-in tables.
fn catalog(pricing_json: Option<String>) -> NapiResult<std::borrow::Cow<'static, PricingCatalog>> {
    match pricing_json {
        Some(json) => PricingCatalog::from_json(&json)
            .map(std::borrow::Cow::Owned)
            .map_err(to_napi_error),
        None => Ok(std::borrow::Cow::Borrowed(PricingCatalog::standard())),
    }
}

// ---------------------------------------------------------------------------
// Sizing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct SizeInput {
    industry: String,
    #[serde(default)]
    profile: FacilityProfile,
}

#[napi]
pub fn size_power(input_json: String) -> NapiResult<String> {
    let input: SizeInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output =
        bess_quote_core::sizing::size_power(&input.industry, &input.profile).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Equipment & pricing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct EquipmentInput {
    sizing: PowerSizingResult,
    #[serde(default)]
    renewables: RenewablesOptions,
    #[serde(default)]
    install: InstallOptions,
}

#[napi]
pub fn build_equipment_breakdown(input_json: String, pricing_json: Option<String>) -> NapiResult<String> {
    let input: EquipmentInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let catalog = catalog(pricing_json)?;
    let output = bess_quote_core::equipment::build_equipment_breakdown(
        &input.sizing,
        &input.renewables,
        &input.install,
        &catalog,
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct PriceInput {
    category: EquipmentCategory,
    capacity: Decimal,
    #[serde(default)]
    as_of: Option<chrono::NaiveDate>,
}

#[napi]
pub fn resolve_unit_price(input_json: String, pricing_json: Option<String>) -> NapiResult<String> {
    let input: PriceInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let catalog = catalog(pricing_json)?;
    let price = catalog
        .resolve_unit_price(input.category, input.capacity, input.as_of)
        .map_err(to_napi_error)?;
    serde_json::to_string(&price).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Financials & scoring
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct FinancialsInput {
    breakdown: bess_quote_core::equipment::EquipmentBreakdown,
    market: MarketContext,
    #[serde(default)]
    advanced: Option<AdvancedOptions>,
}

#[napi]
pub fn calculate_financials(input_json: String) -> NapiResult<String> {
    let input: FinancialsInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = bess_quote_core::financials::calculate_financials(
        &input.breakdown,
        &input.market,
        input.advanced.as_ref(),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[derive(Deserialize)]
struct RavsInput {
    financials: FinancialResult,
    #[serde(default)]
    project: ProjectContext,
    #[serde(default)]
    market_risk: MarketRiskContext,
    #[serde(default)]
    operational: OperationalContext,
}

#[napi]
pub fn calculate_ravs(input_json: String) -> NapiResult<String> {
    let input: RavsInput = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = bess_quote_core::ravs::calculate_ravs(
        &input.financials,
        &input.project,
        &input.market_risk,
        &input.operational,
    );
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[napi]
pub fn build_quote(input_json: String, pricing_json: Option<String>) -> NapiResult<String> {
    let input: bess_quote_core::quote::QuoteRequest =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let catalog = catalog(pricing_json)?;
    let output = bess_quote_core::quote::build_quote(&input, &catalog).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
