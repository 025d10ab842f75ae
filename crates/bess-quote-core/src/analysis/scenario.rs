use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;
use crate::financials::FinancialCase;
use crate::types::*;
use crate::QuoteResult;

const PROBABILITY_TOLERANCE: Decimal = dec!(0.001);

/// A coherent set of assumption shifts applied to the base case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    pub probability: Rate,
    /// Multiplies energy rate, spread and demand charge
    pub rate_multiplier: Decimal,
    pub cost_multiplier: Decimal,
    /// Added to the escalation rate. A downward shift does not take a
    /// non-negative rate below zero.
    pub escalation_shift: Rate,
    pub degradation_multiplier: Decimal,
}

impl ScenarioDefinition {
    fn base() -> Self {
        ScenarioDefinition {
            name: "Base".into(),
            probability: dec!(0.50),
            rate_multiplier: Decimal::ONE,
            cost_multiplier: Decimal::ONE,
            escalation_shift: Decimal::ZERO,
            degradation_multiplier: Decimal::ONE,
        }
    }

    /// Optimistic, base and pessimistic at 25/50/25.
    pub fn standard_set() -> Vec<ScenarioDefinition> {
        vec![
            ScenarioDefinition {
                name: "Optimistic".into(),
                probability: dec!(0.25),
                rate_multiplier: dec!(1.10),
                cost_multiplier: dec!(0.95),
                escalation_shift: dec!(0.01),
                degradation_multiplier: dec!(0.75),
            },
            ScenarioDefinition::base(),
            ScenarioDefinition {
                name: "Pessimistic".into(),
                probability: dec!(0.25),
                rate_multiplier: dec!(0.90),
                cost_multiplier: dec!(1.10),
                escalation_shift: dec!(-0.01),
                degradation_multiplier: dec!(1.5),
            },
        ]
    }

    pub fn apply(&self, case: &FinancialCase) -> FinancialCase {
        let mut next = case.scale_cost(self.cost_multiplier);
        next.market = case.market.scale_rates(self.rate_multiplier);
        let escalation = case.options.escalation_rate;
        let shifted = escalation + self.escalation_shift;
        next.options.escalation_rate =
            if self.escalation_shift < Decimal::ZERO && escalation >= Decimal::ZERO {
                shifted.max(Decimal::ZERO)
            } else {
                shifted
            };
        next.options.degradation_rate =
            (case.options.degradation_rate * self.degradation_multiplier).min(dec!(0.99));
        next
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub name: String,
    pub probability: Rate,
    pub annual_savings: Money,
    pub net_cost: Money,
    pub npv: Money,
    pub irr: Option<Rate>,
    pub payback_years: Option<Years>,
    pub deviation_from_base: Money,
    pub deviation_pct: Rate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioAnalysis {
    pub results: Vec<ScenarioResult>,
    pub base_npv: Money,
    pub probability_weighted_npv: Money,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Optimistic / base / pessimistic analysis of `case`.
pub fn run_standard_scenarios(case: &FinancialCase) -> QuoteResult<ScenarioAnalysis> {
    analyze_scenarios(case, &ScenarioDefinition::standard_set())
}

/// Rerun `case` through the lifetime model under each scenario and compare
/// against the unshifted case. Probabilities must sum to 1.
pub fn analyze_scenarios(
    case: &FinancialCase,
    scenarios: &[ScenarioDefinition],
) -> QuoteResult<ScenarioAnalysis> {
    if scenarios.is_empty() {
        return Err(QuoteError::InvalidInput {
            field: "scenarios".into(),
            reason: "At least one scenario required".into(),
        });
    }

    for s in scenarios {
        if s.probability < Decimal::ZERO || s.probability > Decimal::ONE {
            return Err(QuoteError::InvalidInput {
                field: format!("scenario:{} probability", s.name),
                reason: "Probability must be between 0 and 1".into(),
            });
        }
    }

    let total_prob: Decimal = scenarios.iter().map(|s| s.probability).sum();
    if (total_prob - Decimal::ONE).abs() > PROBABILITY_TOLERANCE {
        return Err(QuoteError::InvalidInput {
            field: "probabilities".into(),
            reason: format!("Probabilities must sum to 1.0 (got {total_prob})"),
        });
    }

    let mut warnings = Vec::new();
    if total_prob != Decimal::ONE {
        warnings.push(format!(
            "Probabilities sum to {total_prob}; treated as approximately 1.0"
        ));
    }

    let base_npv = case.evaluate()?.npv;
    let mut results = Vec::with_capacity(scenarios.len());
    let mut probability_weighted_npv = Decimal::ZERO;

    for scenario in scenarios {
        let shifted = scenario.apply(case);
        let metrics = shifted.evaluate()?;
        let annual_savings = shifted.savings().total();
        let net_cost = shifted.net_cost();

        let deviation = metrics.npv - base_npv;
        let deviation_pct = if base_npv.is_zero() {
            if !deviation.is_zero() {
                warnings.push(format!(
                    "Base NPV is zero; cannot compute deviation_pct for scenario '{}'",
                    scenario.name
                ));
            }
            Decimal::ZERO
        } else {
            (deviation / base_npv.abs()).round_dp(4)
        };

        probability_weighted_npv += scenario.probability * metrics.npv;

        results.push(ScenarioResult {
            name: scenario.name.clone(),
            probability: scenario.probability,
            annual_savings,
            net_cost,
            npv: metrics.npv,
            irr: metrics.irr,
            payback_years: (annual_savings > Decimal::ZERO)
                .then(|| (net_cost / annual_savings).round_dp(2)),
            deviation_from_base: deviation,
            deviation_pct,
        });
    }

    Ok(ScenarioAnalysis {
        results,
        base_npv,
        probability_weighted_npv: probability_weighted_npv.round_dp(2),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financials::{AdvancedOptions, MarketContext, SavingsBasis};
    use pretty_assertions::assert_eq;

    fn case() -> FinancialCase {
        FinancialCase {
            basis: SavingsBasis {
                power_kw: dec!(2000),
                energy_kwh: dec!(8000),
                duration_hours: dec!(4),
                solar_kw: dec!(500),
                wind_kw: Decimal::ZERO,
            },
            total_project_cost: dec!(4000000),
            itc_eligible_cost: dec!(4000000),
            market: MarketContext::new(dec!(0.14), dec!(18)),
            options: AdvancedOptions::default(),
        }
    }

    #[test]
    fn test_standard_ordering() {
        let a = run_standard_scenarios(&case()).unwrap();
        assert_eq!(a.results.len(), 3);
        let [opt, base, pess] = [&a.results[0], &a.results[1], &a.results[2]];
        assert!(opt.npv > base.npv);
        assert!(base.npv > pess.npv);
        assert_eq!(base.npv, a.base_npv);
        assert_eq!(base.deviation_from_base, Decimal::ZERO);
    }

    #[test]
    fn test_probability_weighted_npv() {
        let a = run_standard_scenarios(&case()).unwrap();
        let expected: Decimal = a.results.iter().map(|r| r.probability * r.npv).sum();
        assert_eq!(a.probability_weighted_npv, expected.round_dp(2));
    }

    #[test]
    fn test_pessimistic_escalation_floored() {
        let mut c = case();
        c.options.escalation_rate = dec!(0.005);
        let shifted = ScenarioDefinition::standard_set()[2].apply(&c);
        assert_eq!(shifted.options.escalation_rate, Decimal::ZERO);
    }

    #[test]
    fn test_base_keeps_negative_escalation() {
        let mut c = case();
        c.options.escalation_rate = dec!(-0.01);
        let set = ScenarioDefinition::standard_set();
        assert_eq!(set[1].apply(&c).options.escalation_rate, dec!(-0.01));
        assert_eq!(set[0].apply(&c).options.escalation_rate, Decimal::ZERO);
        assert_eq!(set[2].apply(&c).options.escalation_rate, dec!(-0.02));

        let a = run_standard_scenarios(&c).unwrap();
        let base = &a.results[1];
        assert_eq!(base.npv, a.base_npv);
        assert_eq!(base.deviation_from_base, Decimal::ZERO);
    }

    #[test]
    fn test_probabilities_must_sum_to_one() {
        let mut set = ScenarioDefinition::standard_set();
        set[1].probability = dec!(0.30);
        assert!(analyze_scenarios(&case(), &set).is_err());
    }

    #[test]
    fn test_negative_probability_error() {
        let mut set = ScenarioDefinition::standard_set();
        set[0].probability = dec!(-0.25);
        set[1].probability = dec!(1.0);
        assert!(analyze_scenarios(&case(), &set).is_err());
    }

    #[test]
    fn test_empty_scenarios() {
        assert!(analyze_scenarios(&case(), &[]).is_err());
    }
}
