use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::cashflow::{net_flows, project_cash_flows, AdvancedOptions, CashFlowYear};
use super::savings::{annual_savings, MarketContext, SavingsBasis, SavingsBreakdown};
use crate::equipment::EquipmentBreakdown;
use crate::time_value;
use crate::types::*;
use crate::QuoteResult;

/// Reported when annual savings are zero or negative.
pub const PAYBACK_NEVER: Years = dec!(999);

const KW_PER_MW: Decimal = dec!(1000);

const SAVINGS_SOURCE: &str = "Utility tariff inputs; demand capture 75%; 250 cycles/yr at 85% round-trip; \
solar 1,400 kWh/kW-yr and wind 2,600 kWh/kW-yr (NREL typical yields); ITC on storage and renewables \
(IRA section 48E), excluding generators and EV chargers";

// ---------------------------------------------------------------------------
// Financial case
// ---------------------------------------------------------------------------

/// Everything the lifetime model needs, detached from the equipment breakdown
/// so that sensitivity and scenario analysis can perturb it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialCase {
    pub basis: SavingsBasis,
    pub total_project_cost: Money,
    /// Total less generator and EV charger cost
    pub itc_eligible_cost: Money,
    pub market: MarketContext,
    pub options: AdvancedOptions,
}

/// Lifetime metrics of one case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LifetimeMetrics {
    pub npv: Money,
    pub irr: Option<Rate>,
    /// Why IRR is absent, when it is
    pub irr_failure: Option<String>,
    pub discounted_payback_years: Option<Years>,
    /// $/kWh discharged over the project life
    pub levelized_cost_of_storage: Option<Money>,
    pub cash_flows: Vec<CashFlowYear>,
}

impl FinancialCase {
    pub fn from_breakdown(
        breakdown: &EquipmentBreakdown,
        market: &MarketContext,
        options: &AdvancedOptions,
    ) -> Self {
        let system = &breakdown.system;
        let excluded = breakdown.costs.generator + breakdown.costs.ev_chargers;
        FinancialCase {
            basis: SavingsBasis {
                power_kw: system.power_kw(),
                energy_kwh: system.energy_kwh(),
                duration_hours: system.duration_hours,
                solar_kw: system.solar_mw * KW_PER_MW,
                wind_kw: system.wind_mw * KW_PER_MW,
            },
            total_project_cost: breakdown.total_project_cost,
            itc_eligible_cost: (breakdown.total_project_cost - excluded).max(Decimal::ZERO),
            market: market.clone(),
            options: options.clone(),
        }
    }

    pub fn savings(&self) -> SavingsBreakdown {
        annual_savings(&self.basis, &self.market)
    }

    pub fn tax_credit(&self) -> Money {
        (self.itc_eligible_cost * self.market.itc_rate).round_dp(2)
    }

    pub fn net_cost(&self) -> Money {
        self.total_project_cost - self.tax_credit()
    }

    pub fn annual_om(&self) -> Money {
        (self.total_project_cost * self.options.om_cost_pct).round_dp(2)
    }

    /// Same case with all capital cost scaled by `factor`.
    pub fn scale_cost(&self, factor: Decimal) -> Self {
        let mut scaled = self.clone();
        scaled.total_project_cost = (self.total_project_cost * factor).round_dp(2);
        scaled.itc_eligible_cost = (self.itc_eligible_cost * factor).round_dp(2);
        scaled
    }

    /// NPV, IRR, discounted payback and LCOS over the project life. An IRR
    /// that cannot be solved is reported as `None`, never as an error.
    pub fn evaluate(&self) -> QuoteResult<LifetimeMetrics> {
        let net_cost = self.net_cost();
        let annual_om = self.annual_om();
        let rows = project_cash_flows(net_cost, self.savings().total(), annual_om, &self.options)?;
        let flows = net_flows(&rows);

        let npv = time_value::npv(self.options.discount_rate, &flows)?.round_dp(2);

        let (irr, irr_failure) = match time_value::solve_irr(&flows) {
            Ok(rate) => (Some(rate.round_dp(6)), None),
            Err(e) => {
                tracing::warn!(error = %e, "IRR did not converge; omitting it");
                (None, Some(e.to_string()))
            }
        };

        let discounted: Vec<Money> = rows.iter().map(|r| r.discounted_cash_flow).collect();
        let discounted_payback_years =
            time_value::payback_period(&discounted).map(|y| y.round_dp(2));

        let levelized_cost_of_storage = self.lcos(net_cost, &rows)?;

        Ok(LifetimeMetrics {
            npv,
            irr,
            irr_failure,
            discounted_payback_years,
            levelized_cost_of_storage,
            cash_flows: rows,
        })
    }

    /// (net cost + PV of O&M) / PV of delivered energy.
    fn lcos(&self, net_cost: Money, rows: &[CashFlowYear]) -> QuoteResult<Option<Money>> {
        let annual_throughput = self.basis.energy_kwh
            * self.market.cycles_per_year
            * self.market.round_trip_efficiency;

        let operating: Vec<Money> = rows.iter().map(|r| r.om_cost).collect();
        let delivered: Vec<Decimal> = rows
            .iter()
            .map(|r| {
                if r.year == 0 {
                    Decimal::ZERO
                } else {
                    annual_throughput * r.remaining_capacity
                }
            })
            .collect();

        let pv_om = time_value::npv(self.options.discount_rate, &operating)?;
        let pv_energy = time_value::npv(self.options.discount_rate, &delivered)?;

        if pv_energy <= Decimal::ZERO {
            return Ok(None);
        }
        Ok(Some(((net_cost + pv_om) / pv_energy).round_dp(4)))
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialResult {
    pub total_project_cost: Money,
    pub tax_credit: Money,
    pub net_cost: Money,
    pub annual_savings: Money,
    pub savings_breakdown: SavingsBreakdown,
    pub payback_years: Years,
    /// Percent
    pub roi_10_year: Decimal,
    /// Percent
    pub roi_25_year: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npv: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irr: Option<Rate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounted_payback_years: Option<Years>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub levelized_cost_of_storage: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_flows: Option<Vec<CashFlowYear>>,
    #[cfg(feature = "analysis")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sensitivity: Option<crate::analysis::TornadoAnalysis>,
    #[cfg(feature = "analysis")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<crate::analysis::ScenarioAnalysis>,
    pub formula_version: String,
    pub data_source: String,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Savings, tax credit, payback and ROI for a priced system, plus the
/// lifetime model and optional analyses when `advanced` asks for them.
///
/// A failed IRR solve does not fail the call: `irr` is omitted and the
/// reason is added to `warnings` and `data_source`.
pub fn calculate_financials(
    breakdown: &EquipmentBreakdown,
    market: &MarketContext,
    advanced: Option<&AdvancedOptions>,
) -> QuoteResult<ComputationOutput<FinancialResult>> {
    market.validate()?;
    if let Some(options) = advanced {
        options.validate()?;
    }

    let mut warnings: Vec<String> = Vec::new();
    let options = advanced.cloned().unwrap_or_default();
    let case = FinancialCase::from_breakdown(breakdown, market, &options);

    let savings_breakdown = case.savings();
    let annual_savings = savings_breakdown.total();
    let tax_credit = case.tax_credit();
    let net_cost = case.net_cost();

    let payback_years = simple_payback(net_cost, annual_savings, &mut warnings);
    if net_cost <= Decimal::ZERO {
        warnings.push("Net cost is zero or negative; ROI reported as 0".into());
    }
    let roi_10_year = simple_roi(net_cost, annual_savings, 10);
    let roi_25_year = simple_roi(net_cost, annual_savings, 25);

    let mut data_source = SAVINGS_SOURCE.to_string();
    let mut result = FinancialResult {
        total_project_cost: breakdown.total_project_cost,
        tax_credit,
        net_cost,
        annual_savings,
        savings_breakdown,
        payback_years,
        roi_10_year,
        roi_25_year,
        npv: None,
        irr: None,
        discounted_payback_years: None,
        levelized_cost_of_storage: None,
        cash_flows: None,
        #[cfg(feature = "analysis")]
        sensitivity: None,
        #[cfg(feature = "analysis")]
        scenarios: None,
        formula_version: FORMULA_VERSION.to_string(),
        data_source: String::new(),
    };

    if let Some(options) = advanced {
        if options.include_npv {
            let lifetime = case.evaluate()?;
            if let Some(reason) = &lifetime.irr_failure {
                warnings.push(format!("IRR omitted: {reason}"));
                data_source.push_str("; IRR omitted (solver did not converge)");
            }
            result.npv = Some(lifetime.npv);
            result.irr = lifetime.irr;
            result.discounted_payback_years = lifetime.discounted_payback_years;
            result.levelized_cost_of_storage = lifetime.levelized_cost_of_storage;
            result.cash_flows = Some(lifetime.cash_flows);
        }

        attach_analyses(&mut result, &case, options, &mut warnings)?;
    }

    result.data_source = data_source;

    tracing::debug!(
        %annual_savings,
        %net_cost,
        %payback_years,
        npv = ?result.npv,
        irr = ?result.irr,
        "financials calculated"
    );

    let assumptions = serde_json::json!({
        "market": market,
        "advanced": advanced,
    });

    Ok(with_metadata(
        "Simple payback and ROI; lifetime DCF with escalation, degradation and O&M",
        &assumptions,
        warnings,
        result,
    ))
}

#[cfg(feature = "analysis")]
fn attach_analyses(
    result: &mut FinancialResult,
    case: &FinancialCase,
    options: &AdvancedOptions,
    warnings: &mut Vec<String>,
) -> QuoteResult<()> {
    if options.include_sensitivity {
        let tornado = crate::analysis::tornado(case)?;
        warnings.extend(tornado.warnings.iter().cloned());
        result.sensitivity = Some(tornado);
    }
    if options.include_scenarios {
        result.scenarios = Some(crate::analysis::run_standard_scenarios(case)?);
    }
    Ok(())
}

#[cfg(not(feature = "analysis"))]
fn attach_analyses(
    _result: &mut FinancialResult,
    _case: &FinancialCase,
    options: &AdvancedOptions,
    warnings: &mut Vec<String>,
) -> QuoteResult<()> {
    if options.include_sensitivity || options.include_scenarios {
        warnings.push("Sensitivity and scenario analysis require the `analysis` feature".into());
    }
    Ok(())
}

fn simple_payback(net_cost: Money, annual_savings: Money, warnings: &mut Vec<String>) -> Years {
    if annual_savings <= Decimal::ZERO {
        warnings.push("Annual savings are zero or negative; the project never pays back".into());
        return PAYBACK_NEVER;
    }
    if net_cost <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (net_cost / annual_savings).round_dp(2)
}

fn simple_roi(net_cost: Money, annual_savings: Money, years: u32) -> Decimal {
    if net_cost <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    ((annual_savings * Decimal::from(years) - net_cost) / net_cost * dec!(100)).round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equipment::{build_equipment_breakdown, InstallOptions, RenewablesOptions};
    use crate::pricing::PricingCatalog;
    use crate::sizing::{size_power, FacilityProfile};
    use pretty_assertions::assert_eq;

    fn breakdown() -> EquipmentBreakdown {
        let mut sizing = size_power("office", &FacilityProfile::new()).unwrap();
        sizing.peak_power_mw = dec!(1);
        build_equipment_breakdown(
            &sizing,
            &RenewablesOptions::default(),
            &InstallOptions::default(),
            PricingCatalog::standard(),
        )
        .unwrap()
    }

    fn market() -> MarketContext {
        MarketContext::new(dec!(0.15), dec!(15))
    }

    #[test]
    fn test_simple_metrics() {
        let out = calculate_financials(&breakdown(), &market(), None).unwrap();
        let r = &out.result;
        // 30% of 2,147,904
        assert_eq!(r.tax_credit, dec!(644371.20));
        assert_eq!(r.net_cost, dec!(1503532.80));
        assert_eq!(r.annual_savings, dec!(206000));
        assert_eq!(r.payback_years, dec!(7.30));
        assert!(r.npv.is_none());
        assert_eq!(r.formula_version, FORMULA_VERSION);
    }

    #[test]
    fn test_roi_sign_follows_payback() {
        let r = calculate_financials(&breakdown(), &market(), None).unwrap().result;
        // Payback ≈ 7.3 years: negative never, positive at both horizons
        assert!(r.roi_10_year > Decimal::ZERO);
        assert!(r.roi_25_year > r.roi_10_year);
    }

    #[test]
    fn test_zero_savings_payback_sentinel() {
        let mut m = MarketContext::new(Decimal::ZERO, Decimal::ZERO);
        m.value_of_lost_load = Decimal::ZERO;
        let out = calculate_financials(&breakdown(), &m, None).unwrap();
        assert_eq!(out.result.payback_years, PAYBACK_NEVER);
        assert!(!out.warnings.is_empty());
    }

    #[test]
    fn test_fully_credited_cost_warns_once() {
        let mut m = market();
        m.itc_rate = Decimal::ONE;
        let out = calculate_financials(&breakdown(), &m, None).unwrap();
        assert_eq!(out.result.net_cost, Decimal::ZERO);
        assert_eq!(out.result.roi_10_year, Decimal::ZERO);
        assert_eq!(out.result.roi_25_year, Decimal::ZERO);
        assert_eq!(out.result.payback_years, Decimal::ZERO);
        let roi_warnings = out.warnings.iter().filter(|w| w.contains("ROI")).count();
        assert_eq!(roi_warnings, 1);
    }

    #[test]
    fn test_advanced_metrics() {
        let options = AdvancedOptions::default();
        let r = calculate_financials(&breakdown(), &market(), Some(&options))
            .unwrap()
            .result;
        let npv = r.npv.unwrap();
        let irr = r.irr.unwrap();
        assert!(npv > Decimal::ZERO);
        assert!(irr > options.discount_rate);
        let flows = r.cash_flows.unwrap();
        assert_eq!(flows.len(), 26);
        assert!(r.levelized_cost_of_storage.unwrap() > Decimal::ZERO);
        assert!(r.discounted_payback_years.unwrap() > r.payback_years);
    }

    #[test]
    fn test_npv_at_irr_is_zero() {
        let case = FinancialCase::from_breakdown(&breakdown(), &market(), &AdvancedOptions::default());
        let metrics = case.evaluate().unwrap();
        let flows = net_flows(&metrics.cash_flows);
        let at_irr = time_value::npv(metrics.irr.unwrap(), &flows).unwrap();
        assert!(at_irr.abs() < flows[0].abs() * dec!(0.0001), "NPV at IRR = {at_irr}");
    }

    #[test]
    fn test_unsolvable_irr_is_not_fatal() {
        // Savings never cover O&M: no sign change, no IRR
        let mut options = AdvancedOptions::default();
        options.om_cost_pct = dec!(0.5);
        let out = calculate_financials(&breakdown(), &market(), Some(&options)).unwrap();
        assert!(out.result.npv.is_some());
        assert!(out.result.irr.is_none());
        assert!(out.warnings.iter().any(|w| w.contains("IRR omitted")));
        assert!(out.result.data_source.contains("IRR omitted"));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let options = AdvancedOptions {
            project_lifetime_years: 0,
            ..AdvancedOptions::default()
        };
        assert!(calculate_financials(&breakdown(), &market(), Some(&options)).is_err());
    }

    #[test]
    fn test_generator_excluded_from_itc() {
        let mut b = breakdown();
        b.costs.generator = dec!(100000);
        b.total_project_cost += dec!(100000);
        let r = calculate_financials(&b, &market(), None).unwrap().result;
        assert_eq!(r.tax_credit, dec!(644371.20));
    }
}
