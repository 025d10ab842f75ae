use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::financials::FinancialResult;
use crate::types::{Megawatts, Money, Rate};

// ---------------------------------------------------------------------------
// Context types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemType {
    #[default]
    StandaloneStorage,
    SolarStorage,
    WindStorage,
    /// Solar, wind and storage together
    Hybrid,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentTier {
    Tier1,
    #[default]
    Tier2,
    Tier3,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterconnectionStatus {
    Approved,
    UnderReview,
    Submitted,
    #[default]
    NotStarted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncentiveStability {
    Stable,
    #[default]
    Moderate,
    Uncertain,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegulatoryClimate {
    Supportive,
    #[default]
    Neutral,
    Restrictive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OmContract {
    FullService,
    Partial,
    #[default]
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClimateExposure {
    Mild,
    #[default]
    Moderate,
    Extreme,
}

/// Who is building what, and how far along the grid paperwork is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectContext {
    pub system_type: SystemType,
    pub system_size_mw: Megawatts,
    pub equipment_tier: EquipmentTier,
    pub installer_projects_completed: u32,
    pub interconnection_status: InterconnectionStatus,
}

fn default_rate_escalation() -> Rate {
    dec!(0.03)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketRiskContext {
    /// Expected annual utility rate escalation
    pub utility_rate_escalation: Rate,
    /// $/kW-month
    pub demand_charge: Money,
    pub incentive_stability: IncentiveStability,
    pub regulatory_climate: RegulatoryClimate,
}

impl Default for MarketRiskContext {
    fn default() -> Self {
        Self {
            utility_rate_escalation: default_rate_escalation(),
            demand_charge: Decimal::ZERO,
            incentive_stability: IncentiveStability::default(),
            regulatory_climate: RegulatoryClimate::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationalContext {
    pub warranty_years: Decimal,
    pub annual_cycles: Decimal,
    pub om_contract: OmContract,
    pub climate_exposure: ClimateExposure,
}

impl Default for OperationalContext {
    fn default() -> Self {
        Self {
            warranty_years: dec!(10),
            annual_cycles: dec!(250),
            om_contract: OmContract::default(),
            climate_exposure: ClimateExposure::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Factor scores
// ---------------------------------------------------------------------------

/// One scored input. `weight` is the share within its component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorScore {
    pub name: String,
    /// The input as displayed
    pub metric: String,
    pub score: Decimal,
    pub weight: Decimal,
    pub detail: String,
}

fn factor(name: &str, metric: String, score: Decimal, weight: Decimal, detail: &str) -> FactorScore {
    FactorScore {
        name: name.into(),
        metric,
        score,
        weight,
        detail: detail.into(),
    }
}

/// Score of the first `(threshold, score)` row whose threshold `value`
/// reaches, else `floor`. Rows descend by threshold.
fn step_down(value: Decimal, rows: &[(Decimal, Decimal)], floor: Decimal) -> Decimal {
    rows.iter()
        .find(|(threshold, _)| value >= *threshold)
        .map_or(floor, |(_, score)| *score)
}

/// Score of the first row whose ceiling `value` does not exceed, else
/// `floor`. Rows ascend by ceiling.
fn step_up(value: Decimal, rows: &[(Decimal, Decimal)], floor: Decimal) -> Decimal {
    rows.iter()
        .find(|(ceiling, _)| value <= *ceiling)
        .map_or(floor, |(_, score)| *score)
}

/// Serialized (snake_case) name of an enum value.
fn wire_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn pct(rate: Rate) -> String {
    format!("{}%", (rate * dec!(100)).round_dp(2).normalize())
}

/// Score given when a metric was not computed.
pub const MISSING_METRIC_SCORE: Decimal = dec!(40);

pub fn financial_factors(financials: &FinancialResult) -> Vec<FactorScore> {
    let irr = match financials.irr {
        Some(irr) => {
            // Solver bracket is [-50%, 500%]
            let irr = irr.clamp(dec!(-1), dec!(10));
            factor(
                "irr",
                pct(irr),
                step_down(
                    irr,
                    &[
                        (dec!(0.20), dec!(98)),
                        (dec!(0.15), dec!(90)),
                        (dec!(0.12), dec!(80)),
                        (dec!(0.10), dec!(70)),
                        (dec!(0.08), dec!(60)),
                        (dec!(0.05), dec!(45)),
                        (dec!(0), dec!(30)),
                    ],
                    dec!(10),
                ),
                dec!(0.35),
                "Project IRR against an 8% hurdle",
            )
        }
        None => factor(
            "irr",
            "n/a".into(),
            MISSING_METRIC_SCORE,
            dec!(0.35),
            "IRR not available (lifetime model not run or solver did not converge)",
        ),
    };

    let payback_years = financials.payback_years.max(Decimal::ZERO);
    let payback = factor(
        "payback",
        format!("{} years", payback_years.round_dp(1).normalize()),
        step_up(
            payback_years,
            &[
                (dec!(3), dec!(100)),
                (dec!(5), dec!(90)),
                (dec!(7), dec!(75)),
                (dec!(10), dec!(60)),
                (dec!(15), dec!(40)),
                (dec!(25), dec!(20)),
            ],
            dec!(5),
        ),
        dec!(0.30),
        "Simple payback on net cost",
    );

    let npv_ratio = match financials.npv {
        Some(npv) if financials.net_cost > Decimal::ZERO => {
            let ratio = (npv / financials.net_cost).clamp(dec!(-10), dec!(10));
            factor(
                "npv_to_cost",
                format!("{}x", ratio.round_dp(2).normalize()),
                step_down(
                    ratio,
                    &[
                        (dec!(1.0), dec!(100)),
                        (dec!(0.5), dec!(85)),
                        (dec!(0.25), dec!(70)),
                        (dec!(0), dec!(55)),
                        (dec!(-0.25), dec!(35)),
                    ],
                    dec!(15),
                ),
                dec!(0.20),
                "NPV per dollar of net investment",
            )
        }
        Some(npv) => factor(
            "npv_to_cost",
            format!("NPV {}", npv.round_dp(0)),
            if npv >= Decimal::ZERO { dec!(100) } else { dec!(15) },
            dec!(0.20),
            "Net cost is zero; scored on the sign of NPV",
        ),
        None => factor(
            "npv_to_cost",
            "n/a".into(),
            MISSING_METRIC_SCORE,
            dec!(0.20),
            "NPV not available (lifetime model not run)",
        ),
    };

    let total = financials.savings_breakdown.total();
    let firmness = if total > Decimal::ZERO {
        let share = (financials.savings_breakdown.firm() / total).clamp(Decimal::ZERO, Decimal::ONE);
        factor(
            "savings_firmness",
            pct(share),
            step_down(
                share,
                &[
                    (dec!(0.90), dec!(100)),
                    (dec!(0.75), dec!(85)),
                    (dec!(0.60), dec!(70)),
                    (dec!(0.40), dec!(50)),
                ],
                dec!(30),
            ),
            dec!(0.15),
            "Share of savings from bill reductions rather than outage value or market programs",
        )
    } else {
        factor(
            "savings_firmness",
            "0%".into(),
            dec!(20),
            dec!(0.15),
            "No positive savings",
        )
    };

    vec![irr, payback, npv_ratio, firmness]
}

pub fn execution_factors(project: &ProjectContext) -> Vec<FactorScore> {
    let (tech_score, tech_detail) = match project.system_type {
        SystemType::StandaloneStorage => (dec!(90), "Standalone lithium-ion storage is bankable and mature"),
        SystemType::SolarStorage => (dec!(85), "Solar-plus-storage is a mature pairing"),
        SystemType::WindStorage => (dec!(70), "Wind-plus-storage has fewer reference projects"),
        SystemType::Hybrid => (dec!(65), "Multi-source hybrids add controls integration risk"),
    };
    let (tier_score, tier_detail) = match project.equipment_tier {
        EquipmentTier::Tier1 => (dec!(95), "Tier 1 manufacturer"),
        EquipmentTier::Tier2 => (dec!(75), "Tier 2 manufacturer"),
        EquipmentTier::Tier3 => (dec!(50), "Tier 3 or unrated manufacturer"),
    };
    let installs = Decimal::from(project.installer_projects_completed);
    let (ic_score, ic_detail) = match project.interconnection_status {
        InterconnectionStatus::Approved => (dec!(95), "Interconnection approved"),
        InterconnectionStatus::UnderReview => (dec!(75), "Interconnection under utility review"),
        InterconnectionStatus::Submitted => (dec!(60), "Interconnection application submitted"),
        InterconnectionStatus::NotStarted => (dec!(40), "Interconnection process not started"),
    };

    vec![
        factor(
            "technology_maturity",
            wire_name(&project.system_type),
            tech_score,
            dec!(0.25),
            tech_detail,
        ),
        factor(
            "equipment_tier",
            wire_name(&project.equipment_tier),
            tier_score,
            dec!(0.30),
            tier_detail,
        ),
        factor(
            "installer_experience",
            format!("{} projects", project.installer_projects_completed),
            step_down(
                installs,
                &[
                    (dec!(50), dec!(95)),
                    (dec!(20), dec!(85)),
                    (dec!(10), dec!(70)),
                    (dec!(3), dec!(55)),
                ],
                dec!(35),
            ),
            dec!(0.25),
            "Completed storage installations",
        ),
        factor(
            "interconnection",
            wire_name(&project.interconnection_status),
            ic_score,
            dec!(0.20),
            ic_detail,
        ),
    ]
}

pub fn market_factors(market: &MarketRiskContext) -> Vec<FactorScore> {
    let escalation = market.utility_rate_escalation.clamp(dec!(-0.5), dec!(0.5));
    let demand = market.demand_charge.max(Decimal::ZERO);
    let (incentive_score, incentive_detail) = match market.incentive_stability {
        IncentiveStability::Stable => (dec!(90), "Incentives locked in or statutory"),
        IncentiveStability::Moderate => (dec!(65), "Incentives subject to periodic revision"),
        IncentiveStability::Uncertain => (dec!(40), "Incentives at risk of reduction"),
    };
    let (reg_score, reg_detail) = match market.regulatory_climate {
        RegulatoryClimate::Supportive => (dec!(90), "Storage-friendly tariffs and programs"),
        RegulatoryClimate::Neutral => (dec!(65), "No specific storage policy"),
        RegulatoryClimate::Restrictive => (dec!(35), "Standby charges or restrictive rules"),
    };

    vec![
        factor(
            "rate_escalation",
            pct(escalation),
            step_down(
                escalation,
                &[
                    (dec!(0.04), dec!(90)),
                    (dec!(0.03), dec!(80)),
                    (dec!(0.02), dec!(70)),
                    (dec!(0.01), dec!(55)),
                    (dec!(0), dec!(40)),
                ],
                dec!(25),
            ),
            dec!(0.30),
            "Rising rates grow future savings",
        ),
        factor(
            "demand_charge_level",
            format!("${}/kW-mo", demand.round_dp(2).normalize()),
            step_down(
                demand,
                &[
                    (dec!(20), dec!(95)),
                    (dec!(15), dec!(85)),
                    (dec!(10), dec!(70)),
                    (dec!(5), dec!(50)),
                ],
                dec!(30),
            ),
            dec!(0.30),
            "Higher demand charges mean more value per kW of storage",
        ),
        factor(
            "incentive_stability",
            wire_name(&market.incentive_stability),
            incentive_score,
            dec!(0.20),
            incentive_detail,
        ),
        factor(
            "regulatory_climate",
            wire_name(&market.regulatory_climate),
            reg_score,
            dec!(0.20),
            reg_detail,
        ),
    ]
}

pub fn operational_factors(operational: &OperationalContext) -> Vec<FactorScore> {
    let warranty = operational.warranty_years.max(Decimal::ZERO);
    let cycles = operational.annual_cycles.max(Decimal::ZERO);
    let (om_score, om_detail) = match operational.om_contract {
        OmContract::FullService => (dec!(95), "Full-service O&M with performance guarantee"),
        OmContract::Partial => (dec!(70), "Partial O&M coverage"),
        OmContract::None => (dec!(40), "No O&M contract"),
    };
    let (climate_score, climate_detail) = match operational.climate_exposure {
        ClimateExposure::Mild => (dec!(90), "Mild climate; low thermal stress"),
        ClimateExposure::Moderate => (dec!(75), "Seasonal extremes within HVAC design range"),
        ClimateExposure::Extreme => (dec!(50), "Extreme heat or cold accelerates degradation"),
    };

    vec![
        factor(
            "warranty",
            format!("{} years", warranty.normalize()),
            step_down(
                warranty,
                &[
                    (dec!(15), dec!(95)),
                    (dec!(10), dec!(85)),
                    (dec!(7), dec!(65)),
                    (dec!(5), dec!(50)),
                ],
                dec!(30),
            ),
            dec!(0.30),
            "Manufacturer capacity warranty",
        ),
        factor(
            "cycling",
            format!("{} cycles/yr", cycles.normalize()),
            step_up(
                cycles,
                &[
                    (dec!(250), dec!(90)),
                    (dec!(365), dec!(75)),
                    (dec!(500), dec!(55)),
                ],
                dec!(35),
            ),
            dec!(0.25),
            "Heavier cycling consumes warranty throughput faster",
        ),
        factor(
            "om_contract",
            wire_name(&operational.om_contract),
            om_score,
            dec!(0.25),
            om_detail,
        ),
        factor(
            "climate_exposure",
            wire_name(&operational.climate_exposure),
            climate_score,
            dec!(0.20),
            climate_detail,
        ),
    ]
}
