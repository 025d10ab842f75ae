use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;
use crate::types::{Hours, Kilowatts, Money, Rate};
use crate::QuoteResult;

/// Share of the billed demand charge a battery reliably removes.
pub const DEMAND_CHARGE_CAPTURE: Rate = dec!(0.75);
pub const DEFAULT_CYCLES_PER_YEAR: Decimal = dec!(250);
/// Peak/off-peak spread as a share of the energy rate when none is given.
pub const DEFAULT_SPREAD_RATIO: Rate = dec!(0.40);
pub const DEFAULT_ROUND_TRIP_EFFICIENCY: Rate = dec!(0.85);
pub const DEFAULT_OUTAGE_HOURS_PER_YEAR: Hours = dec!(4);
/// $/kWh of load carried through an outage.
pub const DEFAULT_VALUE_OF_LOST_LOAD: Money = dec!(5.00);
pub const DEFAULT_ITC_RATE: Rate = dec!(0.30);
/// kWh produced per kW of nameplate per year.
pub const SOLAR_YIELD_KWH_PER_KW: Decimal = dec!(1400);
pub const WIND_YIELD_KWH_PER_KW: Decimal = dec!(2600);

const MONTHS_PER_YEAR: Decimal = dec!(12);

// ---------------------------------------------------------------------------
// Market context
// ---------------------------------------------------------------------------

fn default_cycles() -> Decimal {
    DEFAULT_CYCLES_PER_YEAR
}
fn default_rte() -> Rate {
    DEFAULT_ROUND_TRIP_EFFICIENCY
}
fn default_outage_hours() -> Hours {
    DEFAULT_OUTAGE_HOURS_PER_YEAR
}
fn default_voll() -> Money {
    DEFAULT_VALUE_OF_LOST_LOAD
}
fn default_itc() -> Rate {
    DEFAULT_ITC_RATE
}

/// Utility tariff and incentive context for the site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketContext {
    /// Blended energy rate ($/kWh)
    pub electricity_rate: Money,
    /// Demand charge ($/kW-month)
    pub demand_charge: Money,
    /// Peak minus off-peak energy price ($/kWh); 40% of the energy rate when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak_spread: Option<Money>,
    /// Frequency regulation / capacity payments ($/kW-year)
    #[serde(default)]
    pub grid_services_rate: Money,
    #[serde(default = "default_outage_hours")]
    pub outage_hours_per_year: Hours,
    #[serde(default = "default_voll")]
    pub value_of_lost_load: Money,
    #[serde(default = "default_cycles")]
    pub cycles_per_year: Decimal,
    #[serde(default = "default_rte")]
    pub round_trip_efficiency: Rate,
    /// Investment tax credit rate
    #[serde(default = "default_itc")]
    pub itc_rate: Rate,
}

impl MarketContext {
    pub fn new(electricity_rate: Money, demand_charge: Money) -> Self {
        Self {
            electricity_rate,
            demand_charge,
            peak_spread: None,
            grid_services_rate: Decimal::ZERO,
            outage_hours_per_year: DEFAULT_OUTAGE_HOURS_PER_YEAR,
            value_of_lost_load: DEFAULT_VALUE_OF_LOST_LOAD,
            cycles_per_year: DEFAULT_CYCLES_PER_YEAR,
            round_trip_efficiency: DEFAULT_ROUND_TRIP_EFFICIENCY,
            itc_rate: DEFAULT_ITC_RATE,
        }
    }

    pub fn effective_spread(&self) -> Money {
        self.peak_spread
            .unwrap_or(self.electricity_rate * DEFAULT_SPREAD_RATIO)
    }

    /// Scale every utility price (energy, spread, demand) by `factor`.
    pub fn scale_rates(&self, factor: Decimal) -> Self {
        let mut scaled = self.clone();
        scaled.electricity_rate *= factor;
        scaled.demand_charge *= factor;
        scaled.peak_spread = self.peak_spread.map(|s| s * factor);
        scaled
    }

    pub fn validate(&self) -> QuoteResult<()> {
        let non_negative = [
            ("electricity_rate", self.electricity_rate),
            ("demand_charge", self.demand_charge),
            ("grid_services_rate", self.grid_services_rate),
            ("outage_hours_per_year", self.outage_hours_per_year),
            ("value_of_lost_load", self.value_of_lost_load),
            ("cycles_per_year", self.cycles_per_year),
        ];
        for (field, value) in non_negative {
            if value < Decimal::ZERO {
                return Err(QuoteError::InvalidInput {
                    field: field.into(),
                    reason: "Cannot be negative".into(),
                });
            }
        }
        if let Some(spread) = self.peak_spread {
            if spread < Decimal::ZERO {
                return Err(QuoteError::InvalidInput {
                    field: "peak_spread".into(),
                    reason: "Cannot be negative".into(),
                });
            }
        }
        if self.round_trip_efficiency <= Decimal::ZERO || self.round_trip_efficiency > Decimal::ONE {
            return Err(QuoteError::InvalidInput {
                field: "round_trip_efficiency".into(),
                reason: "Must be in (0, 1]".into(),
            });
        }
        if self.itc_rate < Decimal::ZERO || self.itc_rate > Decimal::ONE {
            return Err(QuoteError::InvalidInput {
                field: "itc_rate".into(),
                reason: "Must be between 0 and 1".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Savings streams
// ---------------------------------------------------------------------------

/// Annual value of each savings stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavingsBreakdown {
    pub peak_shaving: Money,
    pub demand_charge: Money,
    pub grid_services: Money,
    pub backup_power: Money,
    pub solar: Money,
    pub wind: Money,
}

impl SavingsBreakdown {
    pub fn total(&self) -> Money {
        self.peak_shaving
            + self.demand_charge
            + self.grid_services
            + self.backup_power
            + self.solar
            + self.wind
    }

    /// Streams backed by the customer's own bill rather than by outage
    /// valuation or market programs.
    pub fn firm(&self) -> Money {
        self.demand_charge + self.peak_shaving + self.solar + self.wind
    }
}

pub fn demand_charge_savings(power_kw: Kilowatts, demand_charge: Money) -> Money {
    power_kw * demand_charge * MONTHS_PER_YEAR * DEMAND_CHARGE_CAPTURE
}

/// Energy arbitrage: one full discharge per cycle at the peak/off-peak spread,
/// net of round-trip losses.
pub fn peak_shaving_savings(
    energy_kwh: Decimal,
    cycles_per_year: Decimal,
    spread: Money,
    round_trip_efficiency: Rate,
) -> Money {
    energy_kwh * cycles_per_year * spread * round_trip_efficiency
}

pub fn grid_services_revenue(power_kw: Kilowatts, rate_per_kw_year: Money) -> Money {
    power_kw * rate_per_kw_year
}

/// Load carried through outages; capped by the hours the battery can run.
pub fn backup_power_value(
    power_kw: Kilowatts,
    duration_hours: Hours,
    outage_hours_per_year: Hours,
    value_of_lost_load: Money,
) -> Money {
    outage_hours_per_year.min(duration_hours) * power_kw * value_of_lost_load
}

pub fn solar_savings(solar_kw: Kilowatts, electricity_rate: Money) -> Money {
    solar_kw * SOLAR_YIELD_KWH_PER_KW * electricity_rate
}

pub fn wind_savings(wind_kw: Kilowatts, electricity_rate: Money) -> Money {
    wind_kw * WIND_YIELD_KWH_PER_KW * electricity_rate
}

/// Physical quantities the savings streams depend on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavingsBasis {
    pub power_kw: Kilowatts,
    pub energy_kwh: Decimal,
    pub duration_hours: Hours,
    pub solar_kw: Kilowatts,
    pub wind_kw: Kilowatts,
}

/// All streams for one year at today's prices, rounded to cents.
pub fn annual_savings(basis: &SavingsBasis, market: &MarketContext) -> SavingsBreakdown {
    let cents = |m: Money| m.round_dp(2);
    SavingsBreakdown {
        peak_shaving: cents(peak_shaving_savings(
            basis.energy_kwh,
            market.cycles_per_year,
            market.effective_spread(),
            market.round_trip_efficiency,
        )),
        demand_charge: cents(demand_charge_savings(basis.power_kw, market.demand_charge)),
        grid_services: cents(grid_services_revenue(basis.power_kw, market.grid_services_rate)),
        backup_power: cents(backup_power_value(
            basis.power_kw,
            basis.duration_hours,
            market.outage_hours_per_year,
            market.value_of_lost_load,
        )),
        solar: cents(solar_savings(basis.solar_kw, market.electricity_rate)),
        wind: cents(wind_savings(basis.wind_kw, market.electricity_rate)),
    }
}
