use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::equipment::{build_equipment_breakdown, EquipmentBreakdown, InstallOptions, RenewablesOptions, SystemSpec};
use crate::financials::{calculate_financials, AdvancedOptions, FinancialResult, MarketContext};
use crate::pricing::PricingCatalog;
use crate::ravs::{calculate_ravs, MarketRiskContext, OperationalContext, ProjectContext, RavsScore, SystemType};
use crate::sizing::{size_power, FacilityProfile, PowerSizingResult};
use crate::types::*;
use crate::QuoteResult;

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Everything needed to take a facility from questionnaire answers to a
/// scored quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub industry: String,
    #[serde(default)]
    pub profile: FacilityProfile,
    #[serde(default)]
    pub renewables: RenewablesOptions,
    #[serde(default)]
    pub install: InstallOptions,
    pub market: MarketContext,
    #[serde(default)]
    pub advanced: Option<AdvancedOptions>,
    /// Size and system type are taken from the breakdown when absent
    #[serde(default)]
    pub project: Option<ProjectContext>,
    /// Demand charge is taken from `market` when absent
    #[serde(default)]
    pub market_risk: Option<MarketRiskContext>,
    #[serde(default)]
    pub operational: Option<OperationalContext>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub sizing: PowerSizingResult,
    pub equipment: EquipmentBreakdown,
    pub financials: FinancialResult,
    pub ravs: RavsScore,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Size, price, evaluate and score one facility.
pub fn build_quote(request: &QuoteRequest, catalog: &PricingCatalog) -> QuoteResult<ComputationOutput<Quote>> {
    let sizing = size_power(&request.industry, &request.profile)?;
    let equipment = build_equipment_breakdown(&sizing, &request.renewables, &request.install, catalog)?;
    let financials = calculate_financials(&equipment, &request.market, request.advanced.as_ref())?;

    let project = project_context(request.project.as_ref(), &equipment.system);
    let market_risk = request.market_risk.clone().unwrap_or_else(|| MarketRiskContext {
        demand_charge: request.market.demand_charge,
        ..MarketRiskContext::default()
    });
    let operational = request.operational.clone().unwrap_or_default();
    let ravs = calculate_ravs(&financials.result, &project, &market_risk, &operational);

    let mut warnings: Vec<String> = sizing.warnings.iter().map(|w| format!("sizing: {w}")).collect();
    warnings.extend(financials.warnings.into_iter().map(|w| format!("financials: {w}")));
    warnings.extend(ravs.warnings.into_iter().map(|w| format!("ravs: {w}")));

    tracing::debug!(
        industry = %sizing.industry,
        total_project_cost = %equipment.total_project_cost,
        ravs = ravs.result.total_score,
        "quote built"
    );

    let assumptions = serde_json::json!({
        "pricing_version": catalog.version_label(),
        "install": &request.install,
        "market": &request.market,
        "advanced": &request.advanced,
        "project": &project,
        "market_risk": &market_risk,
        "operational": &operational,
    });

    Ok(with_metadata(
        "Quote pipeline: power sizing, tiered equipment pricing, savings and lifetime financials, RAVS",
        &assumptions,
        warnings,
        Quote {
            sizing,
            equipment,
            financials: financials.result,
            ravs: ravs.result,
        },
    ))
}

/// Caller-supplied context with blanks filled from the priced system.
fn project_context(supplied: Option<&ProjectContext>, system: &SystemSpec) -> ProjectContext {
    match supplied {
        Some(p) if p.system_size_mw > Decimal::ZERO => p.clone(),
        Some(p) => ProjectContext {
            system_size_mw: system.power_mw,
            ..p.clone()
        },
        None => ProjectContext {
            system_type: system_type(system),
            system_size_mw: system.power_mw,
            ..ProjectContext::default()
        },
    }
}

fn system_type(system: &SystemSpec) -> SystemType {
    let solar = system.solar_mw > Decimal::ZERO;
    let wind = system.wind_mw > Decimal::ZERO;
    match (solar, wind) {
        (true, true) => SystemType::Hybrid,
        (true, false) => SystemType::SolarStorage,
        (false, true) => SystemType::WindStorage,
        (false, false) => SystemType::StandaloneStorage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ravs::EquipmentTier;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn request() -> QuoteRequest {
        QuoteRequest {
            industry: "hotel".into(),
            profile: FacilityProfile::new().with("roomCount", 200i64),
            renewables: RenewablesOptions::default(),
            install: InstallOptions::default(),
            market: MarketContext::new(dec!(0.16), dec!(18)),
            advanced: Some(AdvancedOptions::default()),
            project: None,
            market_risk: None,
            operational: None,
        }
    }

    #[test]
    fn test_pipeline_connects_stages() {
        let out = build_quote(&request(), PricingCatalog::standard()).unwrap();
        let q = &out.result;
        assert_eq!(q.equipment.system.power_mw, q.sizing.peak_power_mw);
        assert_eq!(q.financials.total_project_cost, q.equipment.total_project_cost);
        assert!(q.financials.npv.is_some());
        assert!(q.ravs.total_score <= 100);
    }

    #[test]
    fn test_project_context_derived_from_system() {
        let mut req = request();
        req.renewables.solar_mw = dec!(0.2);
        let out = build_quote(&req, PricingCatalog::standard()).unwrap();
        let project = &out.assumptions["project"];
        assert_eq!(project["system_type"], "solar_storage");
    }

    #[test]
    fn test_supplied_project_keeps_its_fields() {
        let system = SystemSpec {
            power_mw: dec!(2),
            energy_mwh: dec!(8),
            duration_hours: dec!(4),
            inverter_kw: dec!(2000),
            transformer_kva: dec!(2500),
            solar_mw: dec!(1),
            wind_mw: dec!(1),
            generator_mw: Decimal::ZERO,
            level2_chargers: 0,
            dcfc_chargers: 0,
            hpc_chargers: 0,
        };
        let supplied = ProjectContext {
            equipment_tier: EquipmentTier::Tier1,
            ..ProjectContext::default()
        };
        let p = project_context(Some(&supplied), &system);
        assert_eq!(p.system_size_mw, dec!(2));
        assert_eq!(p.system_type, SystemType::StandaloneStorage);
        assert_eq!(p.equipment_tier, EquipmentTier::Tier1);

        assert_eq!(project_context(None, &system).system_type, SystemType::Hybrid);
    }

    #[test]
    fn test_sizing_warnings_carried() {
        // 200 rooms × 3.5 kW = 0.7 MW behind a 0.5 MW connection
        let mut req = request();
        req.profile = req
            .profile
            .with("gridConnection", "limited")
            .with("gridCapacity", dec!(0.5));
        let out = build_quote(&req, PricingCatalog::standard()).unwrap();
        assert_eq!(out.result.sizing.grid_import_limit_mw, Some(dec!(0.5)));
        assert!(out.warnings.iter().any(|w| w.starts_with("sizing: ")));
    }

    #[test]
    fn test_unknown_industry_fails() {
        let mut req = request();
        req.industry = "spaceport".into();
        assert!(build_quote(&req, PricingCatalog::standard()).is_err());
    }
}
