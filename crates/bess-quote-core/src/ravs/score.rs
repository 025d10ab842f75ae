use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::factors::{
    execution_factors, financial_factors, market_factors, operational_factors, EquipmentTier,
    FactorScore, MarketRiskContext, OperationalContext, ProjectContext, SystemType,
};
use super::insights::{generate_insights, Insights};
use crate::financials::FinancialResult;
use crate::types::*;

// ---------------------------------------------------------------------------
// Weights
// ---------------------------------------------------------------------------

/// Component weights in basis points.
pub const FINANCIAL_WEIGHT_BPS: u32 = 4000;
pub const EXECUTION_WEIGHT_BPS: u32 = 2500;
pub const MARKET_WEIGHT_BPS: u32 = 2000;
pub const OPERATIONAL_WEIGHT_BPS: u32 = 1500;

const _: () = assert!(
    FINANCIAL_WEIGHT_BPS + EXECUTION_WEIGHT_BPS + MARKET_WEIGHT_BPS + OPERATIONAL_WEIGHT_BPS == 10_000
);

fn weight(bps: u32) -> Decimal {
    Decimal::from(bps) / dec!(10000)
}

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

const BASE_VARIANCE: i64 = 8;
const LARGE_SYSTEM_MW: Decimal = dec!(5);
const UTILITY_SCALE_MW: Decimal = dec!(20);
/// Component gap above which the score is internally inconsistent.
const COMPONENT_DIVERGENCE: Decimal = dec!(20);

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LetterGrade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "A-")]
    AMinus,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "B-")]
    BMinus,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "C-")]
    CMinus,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
}

impl LetterGrade {
    pub fn from_score(score: u32) -> Self {
        match score {
            97.. => LetterGrade::APlus,
            93..=96 => LetterGrade::A,
            90..=92 => LetterGrade::AMinus,
            87..=89 => LetterGrade::BPlus,
            83..=86 => LetterGrade::B,
            80..=82 => LetterGrade::BMinus,
            77..=79 => LetterGrade::CPlus,
            73..=76 => LetterGrade::C,
            70..=72 => LetterGrade::CMinus,
            60..=69 => LetterGrade::D,
            _ => LetterGrade::F,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    Elevated,
    High,
}

impl RiskLevel {
    pub fn from_score(score: u32) -> Self {
        match score {
            80.. => RiskLevel::Low,
            65..=79 => RiskLevel::Moderate,
            50..=64 => RiskLevel::Elevated,
            _ => RiskLevel::High,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentScore {
    pub score: Decimal,
    pub weight: Decimal,
    pub factors: Vec<FactorScore>,
}

impl ComponentScore {
    fn from_factors(factors: Vec<FactorScore>, weight_bps: u32) -> Self {
        let score: Decimal = factors.iter().map(|f| f.score * f.weight).sum();
        ComponentScore {
            score: score.round_dp(2),
            weight: weight(weight_bps),
            factors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RavsComponents {
    pub financial: ComponentScore,
    pub execution: ComponentScore,
    pub market: ComponentScore,
    pub operational: ComponentScore,
}

impl RavsComponents {
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ComponentScore)> {
        [
            ("financial", &self.financial),
            ("execution", &self.execution),
            ("market", &self.market),
            ("operational", &self.operational),
        ]
        .into_iter()
    }

    /// Σ score × weight, before rounding.
    pub fn weighted_sum(&self) -> Decimal {
        self.iter().map(|(_, c)| c.score * c.weight).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: u32,
    pub mid: u32,
    pub high: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RavsScore {
    /// 0–100
    pub total_score: u32,
    pub letter_grade: LetterGrade,
    pub risk_level: RiskLevel,
    pub confidence_level: ConfidenceLevel,
    pub components: RavsComponents,
    pub confidence_interval: ConfidenceInterval,
    pub strengths: Vec<String>,
    pub risks: Vec<String>,
    pub recommendations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Core computation
// ---------------------------------------------------------------------------

/// Risk-adjusted value score. Never fails: out-of-range context values are
/// clamped into the scoring tables.
pub fn calculate_ravs(
    financials: &FinancialResult,
    project: &ProjectContext,
    market: &MarketRiskContext,
    operational: &OperationalContext,
) -> ComputationOutput<RavsScore> {
    let mut warnings = Vec::new();

    let components = RavsComponents {
        financial: ComponentScore::from_factors(financial_factors(financials), FINANCIAL_WEIGHT_BPS),
        execution: ComponentScore::from_factors(execution_factors(project), EXECUTION_WEIGHT_BPS),
        market: ComponentScore::from_factors(market_factors(market), MARKET_WEIGHT_BPS),
        operational: ComponentScore::from_factors(
            operational_factors(operational),
            OPERATIONAL_WEIGHT_BPS,
        ),
    };

    let total_score = round_score(components.weighted_sum());
    let variance = confidence_variance(&components, project);
    let confidence_interval = ConfidenceInterval {
        low: (total_score as i64 - variance).clamp(0, 100) as u32,
        mid: total_score,
        high: (total_score as i64 + variance).clamp(0, 100) as u32,
    };
    let confidence_level = match variance {
        ..=6 => ConfidenceLevel::High,
        7..=10 => ConfidenceLevel::Medium,
        _ => ConfidenceLevel::Low,
    };

    if financials.irr.is_none() {
        warnings.push("IRR unavailable; financial component uses a neutral IRR score".into());
    }

    let Insights {
        strengths,
        risks,
        recommendations,
    } = generate_insights(&components, financials, project, operational);

    tracing::debug!(total_score, variance, "RAVS calculated");

    let score = RavsScore {
        total_score,
        letter_grade: LetterGrade::from_score(total_score),
        risk_level: RiskLevel::from_score(total_score),
        confidence_level,
        components,
        confidence_interval,
        strengths,
        risks,
        recommendations,
    };

    with_metadata(
        "Risk-Adjusted Value Score (weighted financial, execution, market, operational)",
        &serde_json::json!({
            "weights_bps": {
                "financial": FINANCIAL_WEIGHT_BPS,
                "execution": EXECUTION_WEIGHT_BPS,
                "market": MARKET_WEIGHT_BPS,
                "operational": OPERATIONAL_WEIGHT_BPS,
            },
            "project": project,
            "market": market,
            "operational": operational,
        }),
        warnings,
        score,
    )
}

/// Nearest integer, halves away from zero, clamped to 0–100.
pub fn round_score(value: Decimal) -> u32 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, dec!(100))
        .to_u32()
        .unwrap_or(0)
}

fn confidence_variance(components: &RavsComponents, project: &ProjectContext) -> i64 {
    let mut variance = BASE_VARIANCE;

    if project.system_size_mw > UTILITY_SCALE_MW {
        variance += 4;
    } else if project.system_size_mw > LARGE_SYSTEM_MW {
        variance += 2;
    }

    variance += match project.system_type {
        SystemType::WindStorage | SystemType::Hybrid => 3,
        SystemType::SolarStorage => 1,
        SystemType::StandaloneStorage => 0,
    };

    if (components.financial.score - components.execution.score).abs() > COMPONENT_DIVERGENCE {
        variance += 4;
    }

    if project.equipment_tier == EquipmentTier::Tier1 {
        variance -= 2;
    }

    variance
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::financials::SavingsBreakdown;
    use crate::ravs::factors::{
        ClimateExposure, IncentiveStability, InterconnectionStatus, OmContract, RegulatoryClimate,
    };
    use pretty_assertions::assert_eq;

    fn financials(irr: Option<Decimal>, payback: Decimal) -> FinancialResult {
        FinancialResult {
            total_project_cost: dec!(2000000),
            tax_credit: dec!(600000),
            net_cost: dec!(1400000),
            annual_savings: dec!(200000),
            savings_breakdown: SavingsBreakdown {
                demand_charge: dec!(130000),
                peak_shaving: dec!(50000),
                backup_power: dec!(20000),
                ..SavingsBreakdown::default()
            },
            payback_years: payback,
            roi_10_year: dec!(42.86),
            roi_25_year: dec!(257.14),
            npv: Some(dec!(500000)),
            irr,
            discounted_payback_years: None,
            levelized_cost_of_storage: None,
            cash_flows: None,
            #[cfg(feature = "analysis")]
            sensitivity: None,
            #[cfg(feature = "analysis")]
            scenarios: None,
            formula_version: FORMULA_VERSION.into(),
            data_source: String::new(),
        }
    }

    #[test]
    fn test_total_is_rounded_weighted_sum() {
        let out = calculate_ravs(
            &financials(Some(dec!(0.13)), dec!(7)),
            &ProjectContext::default(),
            &MarketRiskContext::default(),
            &OperationalContext::default(),
        );
        let s = &out.result;
        assert_eq!(s.total_score, round_score(s.components.weighted_sum()));
        let weights: Decimal = s.components.iter().map(|(_, c)| c.weight).sum();
        assert_eq!(weights, Decimal::ONE);
    }

    #[test]
    fn test_grade_boundaries() {
        assert_eq!(LetterGrade::from_score(97), LetterGrade::APlus);
        assert_eq!(LetterGrade::from_score(96), LetterGrade::A);
        assert_eq!(LetterGrade::from_score(90), LetterGrade::AMinus);
        assert_eq!(LetterGrade::from_score(80), LetterGrade::BMinus);
        assert_eq!(LetterGrade::from_score(70), LetterGrade::CMinus);
        assert_eq!(LetterGrade::from_score(60), LetterGrade::D);
        assert_eq!(LetterGrade::from_score(59), LetterGrade::F);
        assert_eq!(RiskLevel::from_score(80), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(65), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(50), RiskLevel::Elevated);
        assert_eq!(RiskLevel::from_score(49), RiskLevel::High);
    }

    #[test]
    fn test_grade_serializes_with_sign() {
        assert_eq!(serde_json::to_string(&LetterGrade::AMinus).unwrap(), "\"A-\"");
    }

    #[test]
    fn test_confidence_widens_with_size_and_hybrid() {
        let small = ProjectContext::default();
        let big_hybrid = ProjectContext {
            system_size_mw: dec!(25),
            system_type: SystemType::Hybrid,
            ..ProjectContext::default()
        };
        let f = financials(Some(dec!(0.13)), dec!(7));
        let a = calculate_ravs(&f, &small, &MarketRiskContext::default(), &OperationalContext::default());
        let b = calculate_ravs(&f, &big_hybrid, &MarketRiskContext::default(), &OperationalContext::default());
        let width = |s: &RavsScore| s.confidence_interval.high - s.confidence_interval.low;
        assert!(width(&b.result) > width(&a.result));
        assert_eq!(b.result.confidence_level, ConfidenceLevel::Low);
    }

    #[test]
    fn test_tier1_narrows_confidence() {
        let project = ProjectContext {
            equipment_tier: EquipmentTier::Tier1,
            interconnection_status: InterconnectionStatus::Approved,
            installer_projects_completed: 60,
            ..ProjectContext::default()
        };
        let operational = OperationalContext {
            om_contract: OmContract::FullService,
            ..OperationalContext::default()
        };
        let out = calculate_ravs(
            &financials(Some(dec!(0.13)), dec!(7)),
            &project,
            &MarketRiskContext::default(),
            &operational,
        );
        assert_eq!(out.result.confidence_level, ConfidenceLevel::High);
    }

    #[test]
    fn test_interval_clamped_at_top() {
        let strong = FinancialResult {
            npv: Some(dec!(2000000)),
            ..financials(Some(dec!(0.22)), dec!(3))
        };
        let project = ProjectContext {
            system_type: SystemType::Hybrid,
            system_size_mw: dec!(30),
            equipment_tier: EquipmentTier::Tier2,
            installer_projects_completed: 80,
            interconnection_status: InterconnectionStatus::Approved,
        };
        let market = MarketRiskContext {
            utility_rate_escalation: dec!(0.05),
            demand_charge: dec!(25),
            incentive_stability: IncentiveStability::Stable,
            regulatory_climate: RegulatoryClimate::Supportive,
        };
        let operational = OperationalContext {
            warranty_years: dec!(20),
            annual_cycles: dec!(200),
            om_contract: OmContract::FullService,
            climate_exposure: ClimateExposure::Mild,
        };

        let s = calculate_ravs(&strong, &project, &market, &operational).result;
        let variance = confidence_variance(&s.components, &project);
        assert_eq!(variance, 15);
        assert_eq!(s.total_score, 92);
        assert_eq!(
            s.confidence_interval,
            ConfidenceInterval { low: 77, mid: 92, high: 100 }
        );
        assert_eq!(s.confidence_level, ConfidenceLevel::Low);
    }

    #[test]
    fn test_interval_low_end_stays_in_range() {
        let weak = FinancialResult {
            npv: Some(dec!(-5000000)),
            savings_breakdown: SavingsBreakdown::default(),
            ..financials(Some(dec!(-0.4)), dec!(999))
        };
        let project = ProjectContext {
            system_type: SystemType::Hybrid,
            system_size_mw: dec!(30),
            equipment_tier: EquipmentTier::Tier3,
            installer_projects_completed: 0,
            interconnection_status: InterconnectionStatus::NotStarted,
        };
        let s = calculate_ravs(
            &weak,
            &project,
            &MarketRiskContext::default(),
            &OperationalContext::default(),
        )
        .result;
        assert_eq!(confidence_variance(&s.components, &project), 19);
        let ci = s.confidence_interval;
        assert_eq!(ci.low, s.total_score.saturating_sub(19));
        assert!(ci.low <= ci.mid && ci.mid <= ci.high && ci.high <= 100);
    }

    #[test]
    fn test_round_score() {
        assert_eq!(round_score(dec!(150)), 100);
        assert_eq!(round_score(dec!(-3)), 0);
        assert_eq!(round_score(dec!(72.5)), 73);
    }

    #[test]
    fn test_missing_irr_warns() {
        let out = calculate_ravs(
            &financials(None, dec!(7)),
            &ProjectContext::default(),
            &MarketRiskContext::default(),
            &OperationalContext::default(),
        );
        assert!(!out.warnings.is_empty());
        let irr = &out.result.components.financial.factors[0];
        assert_eq!(irr.score, dec!(40));
    }
}
