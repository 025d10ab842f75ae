use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;
use crate::types::{Money, Rate};
use crate::QuoteResult;

pub const DEFAULT_PROJECT_LIFETIME_YEARS: i32 = 25;
pub const MAX_PROJECT_LIFETIME_YEARS: i32 = 50;
pub const DEFAULT_DISCOUNT_RATE: Rate = dec!(0.08);
pub const DEFAULT_ESCALATION_RATE: Rate = dec!(0.02);
/// Annual loss of usable capacity.
pub const DEFAULT_DEGRADATION_RATE: Rate = dec!(0.02);
/// Annual O&M as a share of total project cost, escalating with prices.
pub const DEFAULT_OM_COST_PCT: Rate = dec!(0.01);

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Lifetime-model assumptions and which optional analyses to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvancedOptions {
    pub include_npv: bool,
    pub include_sensitivity: bool,
    pub include_scenarios: bool,
    pub project_lifetime_years: i32,
    pub discount_rate: Rate,
    /// Utility price escalation per year
    pub escalation_rate: Rate,
    pub degradation_rate: Rate,
    pub om_cost_pct: Rate,
}

impl Default for AdvancedOptions {
    fn default() -> Self {
        Self {
            include_npv: true,
            include_sensitivity: false,
            include_scenarios: false,
            project_lifetime_years: DEFAULT_PROJECT_LIFETIME_YEARS,
            discount_rate: DEFAULT_DISCOUNT_RATE,
            escalation_rate: DEFAULT_ESCALATION_RATE,
            degradation_rate: DEFAULT_DEGRADATION_RATE,
            om_cost_pct: DEFAULT_OM_COST_PCT,
        }
    }
}

impl AdvancedOptions {
    pub fn validate(&self) -> QuoteResult<()> {
        if self.project_lifetime_years <= 0
            || self.project_lifetime_years > MAX_PROJECT_LIFETIME_YEARS
        {
            return Err(QuoteError::InvalidProjectLifetime(self.project_lifetime_years));
        }
        if self.discount_rate < Decimal::ZERO || self.discount_rate >= Decimal::ONE {
            return Err(QuoteError::InvalidDiscountRate(self.discount_rate));
        }
        if self.degradation_rate < Decimal::ZERO || self.degradation_rate >= Decimal::ONE {
            return Err(QuoteError::InvalidInput {
                field: "degradation_rate".into(),
                reason: "Must be in [0, 1)".into(),
            });
        }
        if self.escalation_rate <= dec!(-1) {
            return Err(QuoteError::InvalidInput {
                field: "escalation_rate".into(),
                reason: "Must be greater than -100%".into(),
            });
        }
        if self.om_cost_pct < Decimal::ZERO {
            return Err(QuoteError::InvalidInput {
                field: "om_cost_pct".into(),
                reason: "Cannot be negative".into(),
            });
        }
        Ok(())
    }

    /// Validated lifetime as a year count.
    pub fn lifetime(&self) -> u32 {
        self.project_lifetime_years.clamp(0, MAX_PROJECT_LIFETIME_YEARS) as u32
    }
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// One year of the lifetime projection. Year 0 holds the net investment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowYear {
    pub year: u32,
    pub savings: Money,
    pub om_cost: Money,
    pub net_cash_flow: Money,
    pub cumulative_cash_flow: Money,
    pub discounted_cash_flow: Money,
    pub cumulative_discounted: Money,
    /// Usable capacity as a share of nameplate
    pub remaining_capacity: Rate,
}

/// Year-by-year cash flows: year 0 is `-net_cost`; year t ≥ 1 is
/// `savings × (1+esc)^(t−1) × (1−deg)^(t−1) − O&M × (1+esc)^(t−1)`.
pub fn project_cash_flows(
    net_cost: Money,
    annual_savings: Money,
    annual_om: Money,
    options: &AdvancedOptions,
) -> QuoteResult<Vec<CashFlowYear>> {
    options.validate()?;
    let years = options.lifetime();

    let escalation = Decimal::ONE + options.escalation_rate;
    let retention = Decimal::ONE - options.degradation_rate;
    let one_plus_r = Decimal::ONE + options.discount_rate;

    let mut rows = Vec::with_capacity(years as usize + 1);
    rows.push(CashFlowYear {
        year: 0,
        savings: Decimal::ZERO,
        om_cost: Decimal::ZERO,
        net_cash_flow: -net_cost,
        cumulative_cash_flow: -net_cost,
        discounted_cash_flow: -net_cost,
        cumulative_discounted: -net_cost,
        remaining_capacity: Decimal::ONE,
    });

    let mut price_factor = Decimal::ONE;
    let mut capacity = Decimal::ONE;
    let mut discount = Decimal::ONE;
    let mut cumulative = -net_cost;
    let mut cumulative_discounted = -net_cost;

    for year in 1..=years {
        if year > 1 {
            price_factor *= escalation;
            capacity *= retention;
        }
        discount *= one_plus_r;

        let savings = (annual_savings * price_factor * capacity).round_dp(2);
        let om_cost = (annual_om * price_factor).round_dp(2);
        let net = savings - om_cost;
        let discounted = (net / discount).round_dp(2);
        cumulative += net;
        cumulative_discounted += discounted;

        rows.push(CashFlowYear {
            year,
            savings,
            om_cost,
            net_cash_flow: net,
            cumulative_cash_flow: cumulative,
            discounted_cash_flow: discounted,
            cumulative_discounted,
            remaining_capacity: capacity.round_dp(6),
        });
    }

    Ok(rows)
}

pub fn net_flows(rows: &[CashFlowYear]) -> Vec<Money> {
    rows.iter().map(|r| r.net_cash_flow).collect()
}
