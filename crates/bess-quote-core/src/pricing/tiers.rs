use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QuoteError;
use crate::types::Money;
use crate::QuoteResult;

// ---------------------------------------------------------------------------
// Equipment categories
// ---------------------------------------------------------------------------

/// Priced equipment categories. Each category has a fixed price unit and a
/// fixed capacity basis used for tier selection; the resolver never converts
/// between units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentCategory {
    Battery,
    Inverter,
    Transformer,
    Switchgear,
    Solar,
    Wind,
    Generator,
    EvChargerLevel2,
    EvChargerDcfc,
    EvChargerHpc,
}

impl EquipmentCategory {
    pub const ALL: [EquipmentCategory; 10] = [
        EquipmentCategory::Battery,
        EquipmentCategory::Inverter,
        EquipmentCategory::Transformer,
        EquipmentCategory::Switchgear,
        EquipmentCategory::Solar,
        EquipmentCategory::Wind,
        EquipmentCategory::Generator,
        EquipmentCategory::EvChargerLevel2,
        EquipmentCategory::EvChargerDcfc,
        EquipmentCategory::EvChargerHpc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EquipmentCategory::Battery => "battery",
            EquipmentCategory::Inverter => "inverter",
            EquipmentCategory::Transformer => "transformer",
            EquipmentCategory::Switchgear => "switchgear",
            EquipmentCategory::Solar => "solar",
            EquipmentCategory::Wind => "wind",
            EquipmentCategory::Generator => "generator",
            EquipmentCategory::EvChargerLevel2 => "ev_charger_level2",
            EquipmentCategory::EvChargerDcfc => "ev_charger_dcfc",
            EquipmentCategory::EvChargerHpc => "ev_charger_hpc",
        }
    }

    /// Unit the tier prices are quoted in.
    pub fn price_unit(&self) -> &'static str {
        match self {
            EquipmentCategory::Battery => "$/kWh",
            EquipmentCategory::Inverter
            | EquipmentCategory::Switchgear
            | EquipmentCategory::Wind
            | EquipmentCategory::Generator => "$/kW",
            EquipmentCategory::Transformer => "$/kVA",
            EquipmentCategory::Solar => "$/W",
            EquipmentCategory::EvChargerLevel2
            | EquipmentCategory::EvChargerDcfc
            | EquipmentCategory::EvChargerHpc => "$/unit",
        }
    }

    /// Unit the capacity passed to the resolver must already be in.
    pub fn capacity_unit(&self) -> &'static str {
        match self {
            EquipmentCategory::Battery => "kWh",
            EquipmentCategory::Inverter
            | EquipmentCategory::Switchgear
            | EquipmentCategory::Wind
            | EquipmentCategory::Generator => "kW",
            EquipmentCategory::Transformer => "kVA",
            EquipmentCategory::Solar => "kWp",
            EquipmentCategory::EvChargerLevel2
            | EquipmentCategory::EvChargerDcfc
            | EquipmentCategory::EvChargerHpc => "units",
        }
    }
}

impl fmt::Display for EquipmentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EquipmentCategory {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        EquipmentCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| QuoteError::UnknownCategory(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tiers
// ---------------------------------------------------------------------------

/// One capacity bucket: `[lower_bound, upper_bound)` priced at `unit_price`.
/// `upper_bound = None` means unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTier {
    pub lower_bound: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<Decimal>,
    pub unit_price: Money,
    pub effective_date: NaiveDate,
}

impl PricingTier {
    pub fn contains(&self, capacity: Decimal) -> bool {
        capacity >= self.lower_bound && self.upper_bound.map_or(true, |upper| capacity < upper)
    }
}

/// All tiers of one category that took effect on the same date. Validated on
/// construction: starts at zero, contiguous, non-overlapping, top tier
/// unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierSchedule {
    pub effective_date: NaiveDate,
    pub tiers: Vec<PricingTier>,
}

impl TierSchedule {
    pub fn new(category: EquipmentCategory, tiers: Vec<PricingTier>) -> QuoteResult<Self> {
        validate_tiers(category, &tiers)?;
        let effective_date = tiers[0].effective_date;
        Ok(TierSchedule {
            effective_date,
            tiers,
        })
    }

    /// The single tier containing `capacity`. Capacities below the first
    /// tier (negative values) resolve to the bottom tier.
    pub fn select(&self, capacity: Decimal) -> &PricingTier {
        let bottom = &self.tiers[0];
        if capacity < bottom.lower_bound {
            return bottom;
        }
        self.tiers
            .iter()
            .find(|t| t.contains(capacity))
            .unwrap_or(&self.tiers[self.tiers.len() - 1])
    }
}

fn invalid(category: EquipmentCategory, reason: String) -> QuoteError {
    QuoteError::InvalidPricingTable {
        category: category.to_string(),
        reason,
    }
}

fn validate_tiers(category: EquipmentCategory, tiers: &[PricingTier]) -> QuoteResult<()> {
    let Some(first) = tiers.first() else {
        return Err(invalid(category, "At least one tier is required".into()));
    };

    if !first.lower_bound.is_zero() {
        return Err(invalid(
            category,
            format!("First tier must start at 0 (starts at {})", first.lower_bound),
        ));
    }

    for (i, tier) in tiers.iter().enumerate() {
        if tier.unit_price < Decimal::ZERO {
            return Err(invalid(category, format!("Tier {i} has a negative unit price")));
        }
        if tier.effective_date != first.effective_date {
            return Err(invalid(
                category,
                format!("Tier {i} effective date differs from the rest of its schedule"),
            ));
        }

        let is_last = i + 1 == tiers.len();
        match (tier.upper_bound, is_last) {
            (None, true) => {}
            (None, false) => {
                return Err(invalid(category, format!("Only the last tier may be unbounded (tier {i})")));
            }
            (Some(_), true) => {
                return Err(invalid(category, "Top tier must be unbounded".into()));
            }
            (Some(upper), false) => {
                if upper <= tier.lower_bound {
                    return Err(invalid(category, format!("Tier {i} upper bound must exceed its lower bound")));
                }
                let next = &tiers[i + 1];
                if next.lower_bound != upper {
                    return Err(invalid(
                        category,
                        format!(
                            "Gap or overlap between tier {i} (upper {upper}) and tier {} (lower {})",
                            i + 1,
                            next.lower_bound
                        ),
                    ));
                }
            }
        }
    }

    Ok(())
}
