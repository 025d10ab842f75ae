use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::error::QuoteError;
use crate::financials::FinancialCase;
use crate::types::*;
use crate::QuoteResult;

/// Perturbed discount and degradation rates are kept below this so the
/// lifetime model stays valid.
const MAX_PERTURBED_RATE: Rate = dec!(0.99);

/// Input driving one tornado bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensitivityParameter {
    EnergyRate,
    DemandCharge,
    ProjectCost,
    DiscountRate,
    Degradation,
    Escalation,
}

impl SensitivityParameter {
    pub const ALL: [SensitivityParameter; 6] = [
        SensitivityParameter::EnergyRate,
        SensitivityParameter::DemandCharge,
        SensitivityParameter::ProjectCost,
        SensitivityParameter::DiscountRate,
        SensitivityParameter::Degradation,
        SensitivityParameter::Escalation,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SensitivityParameter::EnergyRate => "Energy rate",
            SensitivityParameter::DemandCharge => "Demand charge",
            SensitivityParameter::ProjectCost => "Project cost",
            SensitivityParameter::DiscountRate => "Discount rate",
            SensitivityParameter::Degradation => "Degradation",
            SensitivityParameter::Escalation => "Rate escalation",
        }
    }

    /// Relative perturbation applied in each direction.
    pub fn perturbation(&self) -> Rate {
        match self {
            SensitivityParameter::EnergyRate | SensitivityParameter::DemandCharge => dec!(0.20),
            SensitivityParameter::ProjectCost => dec!(0.15),
            SensitivityParameter::DiscountRate => dec!(0.25),
            SensitivityParameter::Degradation | SensitivityParameter::Escalation => dec!(0.50),
        }
    }

    /// Current value of the parameter in `case`.
    pub fn value(&self, case: &FinancialCase) -> Decimal {
        match self {
            SensitivityParameter::EnergyRate => case.market.electricity_rate,
            SensitivityParameter::DemandCharge => case.market.demand_charge,
            SensitivityParameter::ProjectCost => case.total_project_cost,
            SensitivityParameter::DiscountRate => case.options.discount_rate,
            SensitivityParameter::Degradation => case.options.degradation_rate,
            SensitivityParameter::Escalation => case.options.escalation_rate,
        }
    }

    /// `case` with this parameter multiplied by `factor`.
    pub fn apply(&self, case: &FinancialCase, factor: Decimal) -> FinancialCase {
        let mut next = case.clone();
        match self {
            SensitivityParameter::EnergyRate => {
                next.market.electricity_rate *= factor;
                next.market.peak_spread = case.market.peak_spread.map(|s| s * factor);
            }
            SensitivityParameter::DemandCharge => next.market.demand_charge *= factor,
            SensitivityParameter::ProjectCost => return case.scale_cost(factor),
            SensitivityParameter::DiscountRate => {
                next.options.discount_rate = (case.options.discount_rate * factor).min(MAX_PERTURBED_RATE);
            }
            SensitivityParameter::Degradation => {
                next.options.degradation_rate =
                    (case.options.degradation_rate * factor).min(MAX_PERTURBED_RATE);
            }
            SensitivityParameter::Escalation => next.options.escalation_rate *= factor,
        }
        next
    }
}

/// One tornado bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensitivityRow {
    pub parameter: SensitivityParameter,
    pub label: String,
    pub perturbation: Rate,
    pub base_value: Decimal,
    pub low_value: Decimal,
    pub high_value: Decimal,
    /// NPV with the parameter lowered
    pub npv_low: Option<Money>,
    /// NPV with the parameter raised
    pub npv_high: Option<Money>,
    pub irr_low: Option<Rate>,
    pub irr_high: Option<Rate>,
    /// |npv_high − npv_low|
    pub npv_swing: Option<Money>,
    /// % change in NPV per % change in the parameter
    pub elasticity: Option<Decimal>,
    /// 1 = most influential
    pub rank: usize,
}

/// Rows ordered by rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TornadoAnalysis {
    pub base_npv: Money,
    pub base_irr: Option<Rate>,
    pub rows: Vec<SensitivityRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// One-at-a-time sensitivity of NPV to every [`SensitivityParameter`].
pub fn tornado(case: &FinancialCase) -> QuoteResult<TornadoAnalysis> {
    tornado_for(case, &SensitivityParameter::ALL)
}

/// Tornado over a chosen parameter set. Failed evaluations leave gaps in
/// their row and add a warning rather than failing the analysis.
pub fn tornado_for(
    case: &FinancialCase,
    parameters: &[SensitivityParameter],
) -> QuoteResult<TornadoAnalysis> {
    if parameters.is_empty() {
        return Err(QuoteError::InvalidInput {
            field: "parameters".into(),
            reason: "At least one sensitivity parameter is required".into(),
        });
    }

    let base = case.evaluate()?;
    let mut warnings = Vec::new();
    let mut rows = Vec::with_capacity(parameters.len());

    for parameter in parameters {
        let x = parameter.perturbation();
        let low_case = parameter.apply(case, Decimal::ONE - x);
        let high_case = parameter.apply(case, Decimal::ONE + x);

        let mut run = |c: &FinancialCase, direction: &str| match c.evaluate() {
            Ok(m) => (Some(m.npv), m.irr),
            Err(e) => {
                warnings.push(format!(
                    "Sensitivity evaluation failed for {} ({direction}): {e}",
                    parameter.label()
                ));
                (None, None)
            }
        };
        let (npv_low, irr_low) = run(&low_case, "low");
        let (npv_high, irr_high) = run(&high_case, "high");

        let npv_swing = npv_low.zip(npv_high).map(|(lo, hi)| (hi - lo).abs());
        let elasticity = match (npv_low, npv_high) {
            (Some(lo), Some(hi)) if !base.npv.is_zero() && !x.is_zero() => {
                Some(((hi - lo) / (dec!(2) * base.npv.abs()) / x).round_dp(4))
            }
            _ => None,
        };

        rows.push(SensitivityRow {
            parameter: *parameter,
            label: parameter.label().to_string(),
            perturbation: x,
            base_value: parameter.value(case),
            low_value: parameter.value(&low_case),
            high_value: parameter.value(&high_case),
            npv_low,
            npv_high,
            irr_low,
            irr_high,
            npv_swing,
            elasticity,
            rank: 0,
        });
    }

    if base.npv.is_zero() {
        warnings.push("Base NPV is zero; elasticities unavailable, ranked by NPV swing".into());
    }

    rows.sort_by(compare_influence);
    for (i, row) in rows.iter_mut().enumerate() {
        row.rank = i + 1;
    }

    Ok(TornadoAnalysis {
        base_npv: base.npv,
        base_irr: base.irr,
        rows,
        warnings,
    })
}

/// Larger |elasticity| first, then larger swing; rows missing both go last.
fn compare_influence(a: &SensitivityRow, b: &SensitivityRow) -> Ordering {
    let key = |r: &SensitivityRow| (r.elasticity.map(|e| e.abs()), r.npv_swing);
    key(b).cmp(&key(a))
}
