use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::factors::{InterconnectionStatus, OmContract, OperationalContext, ProjectContext};
use super::score::RavsComponents;
use crate::financials::FinancialResult;

const STRENGTH_THRESHOLD: Decimal = dec!(80);
const RISK_THRESHOLD: Decimal = dec!(60);
const LONG_PAYBACK_YEARS: Decimal = dec!(10);

#[derive(Debug, Default)]
pub(crate) struct Insights {
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub recommendations: Vec<String>,
}

fn component_recommendation(name: &str) -> &'static str {
    match name {
        "financial" => "Revisit system sizing or pricing to improve project economics",
        "execution" => "Prefer a Tier 1 supplier and an experienced installer",
        "market" => "Stress-test savings against flat or falling utility rates",
        _ => "Negotiate a longer warranty and a full-service O&M agreement",
    }
}

pub(crate) fn generate_insights(
    components: &RavsComponents,
    financials: &FinancialResult,
    project: &ProjectContext,
    operational: &OperationalContext,
) -> Insights {
    let mut out = Insights::default();

    for (name, component) in components.iter() {
        if component.score >= STRENGTH_THRESHOLD {
            out.strengths
                .push(format!("Strong {name} profile (score {})", component.score.normalize()));
        } else if component.score < RISK_THRESHOLD {
            out.risks
                .push(format!("Weak {name} profile (score {})", component.score.normalize()));
            out.recommendations.push(component_recommendation(name).into());
        }
    }

    if financials.irr.is_none() {
        out.risks.push("IRR could not be determined".into());
        out.recommendations
            .push("Run the lifetime cash flow model to confirm returns".into());
    }

    if financials.payback_years > LONG_PAYBACK_YEARS {
        out.risks.push(format!(
            "Payback of {} years exceeds {LONG_PAYBACK_YEARS} years",
            financials.payback_years.round_dp(1).normalize()
        ));
        out.recommendations
            .push("Check eligibility for additional incentives or grid services programs".into());
    }

    if project.interconnection_status != InterconnectionStatus::Approved {
        out.risks.push("Interconnection not yet approved".into());
        out.recommendations
            .push("Start or advance the utility interconnection application early".into());
    }

    if operational.om_contract == OmContract::None {
        out.risks.push("No O&M contract in place".into());
        out.recommendations
            .push("Secure an O&M agreement with availability guarantees".into());
    }

    out.recommendations.dedup();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ravs::score::ComponentScore;

    fn component(score: Decimal) -> ComponentScore {
        ComponentScore {
            score,
            weight: dec!(0.25),
            factors: Vec::new(),
        }
    }

    fn components(fin: Decimal, exec: Decimal) -> RavsComponents {
        RavsComponents {
            financial: component(fin),
            execution: component(exec),
            market: component(dec!(70)),
            operational: component(dec!(70)),
        }
    }

    fn financials(irr: Option<Decimal>, payback: Decimal) -> FinancialResult {
        FinancialResult {
            total_project_cost: dec!(1000000),
            tax_credit: dec!(300000),
            net_cost: dec!(700000),
            annual_savings: dec!(100000),
            savings_breakdown: Default::default(),
            payback_years: payback,
            roi_10_year: Decimal::ZERO,
            roi_25_year: Decimal::ZERO,
            npv: None,
            irr,
            discounted_payback_years: None,
            levelized_cost_of_storage: None,
            cash_flows: None,
            #[cfg(feature = "analysis")]
            sensitivity: None,
            #[cfg(feature = "analysis")]
            scenarios: None,
            formula_version: String::new(),
            data_source: String::new(),
        }
    }

    #[test]
    fn test_component_thresholds() {
        let project = ProjectContext {
            interconnection_status: InterconnectionStatus::Approved,
            ..ProjectContext::default()
        };
        let operational = OperationalContext {
            om_contract: OmContract::FullService,
            ..OperationalContext::default()
        };
        let out = generate_insights(
            &components(dec!(85), dec!(55)),
            &financials(Some(dec!(0.12)), dec!(6)),
            &project,
            &operational,
        );
        assert_eq!(out.strengths.len(), 1);
        assert!(out.strengths[0].contains("financial"));
        assert_eq!(out.risks.len(), 1);
        assert!(out.risks[0].contains("execution"));
        assert_eq!(out.recommendations.len(), 1);
    }

    #[test]
    fn test_factor_rules() {
        let out = generate_insights(
            &components(dec!(70), dec!(70)),
            &financials(None, dec!(12)),
            &ProjectContext::default(),
            &OperationalContext::default(),
        );
        assert!(out.strengths.is_empty());
        assert_eq!(out.risks.len(), 4);
        assert_eq!(out.recommendations.len(), 4);
    }
}
