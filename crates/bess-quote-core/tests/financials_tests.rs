use bess_quote_core::equipment::{build_equipment_breakdown, EquipmentBreakdown, InstallOptions, RenewablesOptions};
use bess_quote_core::financials::cashflow::net_flows;
use bess_quote_core::financials::{calculate_financials, AdvancedOptions, FinancialCase, MarketContext};
use bess_quote_core::pricing::PricingCatalog;
use bess_quote_core::sizing::{size_power, FacilityProfile};
use bess_quote_core::time_value::npv;
use bess_quote_core::QuoteError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn office_breakdown(square_feet: i64) -> EquipmentBreakdown {
    let sizing = size_power("office", &FacilityProfile::new().with("squareFeet", square_feet)).unwrap();
    build_equipment_breakdown(
        &sizing,
        &RenewablesOptions::default(),
        &InstallOptions::default(),
        PricingCatalog::standard(),
    )
    .unwrap()
}

fn advanced() -> AdvancedOptions {
    AdvancedOptions::default()
}

// ===========================================================================
// Simple metrics
// ===========================================================================

#[test]
fn test_financials_deterministic() {
    let breakdown = office_breakdown(150000);
    let market = MarketContext::new(dec!(0.18), dec!(20));
    let first = calculate_financials(&breakdown, &market, Some(&advanced())).unwrap();
    for _ in 0..3 {
        assert_eq!(calculate_financials(&breakdown, &market, Some(&advanced())).unwrap(), first);
    }
}

#[test]
fn test_rate_increase_improves_economics() {
    let breakdown = office_breakdown(150000);
    let low = calculate_financials(&breakdown, &MarketContext::new(dec!(0.12), dec!(15)), Some(&advanced())).unwrap();
    let high = calculate_financials(&breakdown, &MarketContext::new(dec!(0.24), dec!(15)), Some(&advanced())).unwrap();

    assert!(high.result.annual_savings > low.result.annual_savings);
    assert!(high.result.payback_years < low.result.payback_years);
    assert!(high.result.npv.unwrap() > low.result.npv.unwrap());
}

#[test]
fn test_demand_charge_increase_improves_economics() {
    let breakdown = office_breakdown(150000);
    let low = calculate_financials(&breakdown, &MarketContext::new(dec!(0.15), dec!(10)), None).unwrap();
    let high = calculate_financials(&breakdown, &MarketContext::new(dec!(0.15), dec!(25)), None).unwrap();
    assert!(high.result.annual_savings > low.result.annual_savings);
    assert!(high.result.roi_25_year > low.result.roi_25_year);
}

#[test]
fn test_simple_mode_skips_lifetime_model() {
    let out = calculate_financials(&office_breakdown(80000), &MarketContext::new(dec!(0.15), dec!(15)), None).unwrap();
    assert!(out.result.npv.is_none());
    assert!(out.result.irr.is_none());
    assert!(out.result.cash_flows.is_none());
    assert_eq!(out.result.net_cost, out.result.total_project_cost - out.result.tax_credit);
}

#[test]
fn test_invalid_advanced_options() {
    let breakdown = office_breakdown(80000);
    let market = MarketContext::new(dec!(0.15), dec!(15));

    let lifetime = AdvancedOptions { project_lifetime_years: 0, ..advanced() };
    assert!(matches!(
        calculate_financials(&breakdown, &market, Some(&lifetime)),
        Err(QuoteError::InvalidProjectLifetime(0))
    ));

    let discount = AdvancedOptions { discount_rate: dec!(1.2), ..advanced() };
    assert!(matches!(
        calculate_financials(&breakdown, &market, Some(&discount)),
        Err(QuoteError::InvalidDiscountRate(_))
    ));
}

// ===========================================================================
// Lifetime model
// ===========================================================================

#[test]
fn test_npv_bounded_by_undiscounted_sum() {
    let out = calculate_financials(&office_breakdown(150000), &MarketContext::new(dec!(0.18), dec!(20)), Some(&advanced())).unwrap();
    let rows = out.result.cash_flows.as_ref().unwrap();
    let undiscounted: Decimal = rows.iter().map(|r| r.net_cash_flow).sum();
    assert!(out.result.npv.unwrap() <= undiscounted);
    assert_eq!(rows.len(), 26);
}

#[test]
fn test_npv_at_irr_is_zero() {
    let breakdown = office_breakdown(150000);
    let market = MarketContext::new(dec!(0.18), dec!(20));
    let case = FinancialCase::from_breakdown(&breakdown, &market, &advanced());
    let metrics = case.evaluate().unwrap();
    let irr = metrics.irr.unwrap();
    let flows = net_flows(&metrics.cash_flows);
    let residual = npv(irr, &flows).unwrap();
    // IRR is reported to 6 dp
    let tolerance = flows[0].abs() * dec!(0.0001);
    assert!(residual.abs() < tolerance, "NPV at IRR = {residual}");
}

#[test]
fn test_degradation_lowers_npv() {
    let breakdown = office_breakdown(150000);
    let market = MarketContext::new(dec!(0.18), dec!(20));
    let none = AdvancedOptions { degradation_rate: Decimal::ZERO, ..advanced() };
    let heavy = AdvancedOptions { degradation_rate: dec!(0.05), ..advanced() };
    let a = calculate_financials(&breakdown, &market, Some(&none)).unwrap();
    let b = calculate_financials(&breakdown, &market, Some(&heavy)).unwrap();
    assert!(b.result.npv.unwrap() < a.result.npv.unwrap());
}

#[test]
fn test_unsolvable_irr_is_not_fatal() {
    let breakdown = office_breakdown(80000);
    let mut market = MarketContext::new(Decimal::ZERO, Decimal::ZERO);
    market.value_of_lost_load = Decimal::ZERO;

    let out = calculate_financials(&breakdown, &market, Some(&advanced())).unwrap();
    assert!(out.result.irr.is_none());
    assert!(out.result.npv.unwrap() < Decimal::ZERO);
    assert!(out.warnings.iter().any(|w| w.contains("IRR")));
}

// ===========================================================================
// Analyses
// ===========================================================================

#[test]
fn test_tornado_ordering() {
    let options = AdvancedOptions { include_sensitivity: true, ..advanced() };
    let out = calculate_financials(&office_breakdown(150000), &MarketContext::new(dec!(0.18), dec!(20)), Some(&options)).unwrap();
    let tornado = out.result.sensitivity.unwrap();
    assert_eq!(tornado.rows.len(), 6);
    for pair in tornado.rows.windows(2) {
        assert!(pair[0].elasticity.unwrap().abs() >= pair[1].elasticity.unwrap().abs());
        assert!(pair[0].rank < pair[1].rank);
    }
}

#[test]
fn test_scenario_ordering() {
    let options = AdvancedOptions { include_scenarios: true, ..advanced() };
    let out = calculate_financials(&office_breakdown(150000), &MarketContext::new(dec!(0.18), dec!(20)), Some(&options)).unwrap();
    let scenarios = out.result.scenarios.unwrap();
    let npv_of = |name: &str| scenarios.results.iter().find(|r| r.name == name).unwrap().npv;
    assert!(npv_of("Optimistic") > npv_of("Base"));
    assert!(npv_of("Base") > npv_of("Pessimistic"));
    assert_eq!(Some(npv_of("Base")), out.result.npv);
}
