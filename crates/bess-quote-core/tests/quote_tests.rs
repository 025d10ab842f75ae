use bess_quote_core::equipment::{InstallOptions, RenewablesOptions};
use bess_quote_core::financials::{AdvancedOptions, MarketContext};
use bess_quote_core::pricing::{EquipmentCategory, PricingCatalog, PricingTier};
use bess_quote_core::quote::{build_quote, QuoteRequest};
use bess_quote_core::sizing::FacilityProfile;
use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

fn hospital_request() -> QuoteRequest {
    QuoteRequest {
        industry: "healthcare".into(),
        profile: FacilityProfile::new()
            .with("numberOfBeds", 250i64)
            .with("gridConnection", "limited"),
        renewables: RenewablesOptions {
            solar_mw: dec!(0.5),
            ..RenewablesOptions::default()
        },
        install: InstallOptions::default(),
        market: MarketContext::new(dec!(0.17), dec!(22)),
        advanced: Some(AdvancedOptions {
            include_sensitivity: true,
            include_scenarios: true,
            ..AdvancedOptions::default()
        }),
        project: None,
        market_risk: None,
        operational: None,
    }
}

#[test]
fn test_quote_is_deterministic() {
    let request = hospital_request();
    let first = build_quote(&request, PricingCatalog::standard()).unwrap();
    for _ in 0..3 {
        assert_eq!(build_quote(&request, PricingCatalog::standard()).unwrap(), first);
    }
}

#[test]
fn test_quote_stages_agree() {
    let out = build_quote(&hospital_request(), PricingCatalog::standard()).unwrap();
    let q = &out.result;

    assert!(q.sizing.recommended_duration_hours >= dec!(8));
    assert_eq!(q.equipment.system.duration_hours, q.sizing.recommended_duration_hours);
    assert_eq!(q.equipment.system.solar_mw, dec!(0.5));
    assert!(q.equipment.costs.balance_of_system < q.equipment.costs.installation);
    assert_eq!(q.financials.total_project_cost, q.equipment.total_project_cost);
    assert!(q.financials.savings_breakdown.solar > dec!(0));
    assert!(q.financials.sensitivity.is_some());
    assert!(q.financials.scenarios.is_some());
    assert_eq!(out.assumptions["project"]["system_type"], "solar_storage");
    assert_eq!(out.metadata.formula_version, q.financials.formula_version);
}

#[test]
fn test_quote_reflects_catalog_snapshot() {
    let effective = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    let cheaper = PricingCatalog::standard()
        .with_schedule(
            EquipmentCategory::Battery,
            vec![PricingTier {
                lower_bound: dec!(0),
                upper_bound: None,
                unit_price: dec!(150),
                effective_date: effective,
            }],
        )
        .unwrap();

    let request = hospital_request();
    let standard = build_quote(&request, PricingCatalog::standard()).unwrap().result;
    let discounted = build_quote(&request, &cheaper).unwrap().result;

    assert!(discounted.equipment.total_project_cost < standard.equipment.total_project_cost);
    assert!(discounted.financials.payback_years < standard.financials.payback_years);
    assert_eq!(discounted.equipment.pricing_version, cheaper.version_label());

    // Quoting as of a date before the new schedule uses the original prices
    let mut backdated = request.clone();
    backdated.install.as_of = NaiveDate::from_ymd_opt(2025, 6, 1);
    let backdated = build_quote(&backdated, &cheaper).unwrap().result;
    assert_eq!(backdated.equipment.total_project_cost, standard.equipment.total_project_cost);
}

#[test]
fn test_quote_request_from_json() {
    let json = r#"{
        "industry": "data_center",
        "profile": { "rackCount": 5000, "rackDensityKW": 8 },
        "market": { "electricity_rate": "0.11", "demand_charge": "16" },
        "advanced": { "project_lifetime_years": 20 }
    }"#;
    let request: QuoteRequest = serde_json::from_str(json).unwrap();
    let out = build_quote(&request, PricingCatalog::standard()).unwrap();
    let q = &out.result;
    assert!(q.sizing.peak_power_mw >= dec!(55) && q.sizing.peak_power_mw <= dec!(65));
    assert_eq!(q.financials.cash_flows.as_ref().unwrap().len(), 21);
    assert!(q.ravs.total_score <= 100);
}
