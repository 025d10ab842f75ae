use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::QuoteError;
use crate::pricing::{EquipmentCategory, PricingCatalog};
use crate::sizing::PowerSizingResult;
use crate::types::{Hours, Kilowatts, Megawatts, Money, Rate};
use crate::QuoteResult;

/// Transformer kVA per kW of peak power.
pub const TRANSFORMER_SAFETY_MARGIN: Decimal = dec!(1.25);

pub const DEFAULT_INVERTER_RATIO: Decimal = dec!(1.0);
pub const DEFAULT_BOS_PCT: Rate = dec!(0.12);
pub const DEFAULT_EPC_PCT: Rate = dec!(0.15);
pub const DEFAULT_CONTINGENCY_PCT: Rate = dec!(0.05);
pub const DEFAULT_SHIPPING_PCT: Rate = dec!(0.03);
pub const DEFAULT_TARIFF_PCT: Rate = dec!(0);

const KW_PER_MW: Decimal = dec!(1000);
const WATTS_PER_KW: Decimal = dec!(1000);

// ---------------------------------------------------------------------------
// Input types
// ---------------------------------------------------------------------------

/// Optional equipment the customer asked for. Every capacity here is taken
/// as given; sizing recommendations are never substituted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenewablesOptions {
    pub solar_mw: Megawatts,
    pub wind_mw: Megawatts,
    pub generator_mw: Megawatts,
    pub level2_chargers: u32,
    pub dcfc_chargers: u32,
    pub hpc_chargers: u32,
}

/// Installation and soft-cost assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallOptions {
    /// Replaces the sizing recommendation when set
    pub duration_hours_override: Option<Hours>,
    /// Inverter kW per kW of peak power
    pub inverter_ratio: Decimal,
    /// Balance of system (racking, cabling, controls), on the hardware subtotal
    pub bos_pct: Rate,
    /// Engineering, procurement and construction, on subtotal + BOS
    pub epc_pct: Rate,
    pub contingency_pct: Rate,
    /// On the BESS hardware subtotal
    pub shipping_pct: Rate,
    /// On the BESS hardware subtotal
    pub tariff_pct: Rate,
    /// Pricing date; latest schedules when `None`
    pub as_of: Option<NaiveDate>,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            duration_hours_override: None,
            inverter_ratio: DEFAULT_INVERTER_RATIO,
            bos_pct: DEFAULT_BOS_PCT,
            epc_pct: DEFAULT_EPC_PCT,
            contingency_pct: DEFAULT_CONTINGENCY_PCT,
            shipping_pct: DEFAULT_SHIPPING_PCT,
            tariff_pct: DEFAULT_TARIFF_PCT,
            as_of: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// The physical system being priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSpec {
    pub power_mw: Megawatts,
    pub energy_mwh: Decimal,
    pub duration_hours: Hours,
    pub inverter_kw: Kilowatts,
    pub transformer_kva: Decimal,
    pub solar_mw: Megawatts,
    pub wind_mw: Megawatts,
    pub generator_mw: Megawatts,
    pub level2_chargers: u32,
    pub dcfc_chargers: u32,
    pub hpc_chargers: u32,
}

impl SystemSpec {
    pub fn power_kw(&self) -> Kilowatts {
        self.power_mw * KW_PER_MW
    }

    pub fn energy_kwh(&self) -> Decimal {
        self.energy_mwh * KW_PER_MW
    }
}

/// One priced category: `quantity` in `capacity_unit` at `unit_price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentLine {
    pub category: EquipmentCategory,
    pub quantity: Decimal,
    pub capacity_unit: String,
    pub unit_price: Money,
    pub price_unit: String,
    pub cost: Money,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EquipmentCosts {
    pub battery: Money,
    pub inverter: Money,
    pub transformer: Money,
    pub switchgear: Money,
    pub solar: Money,
    pub wind: Money,
    pub generator: Money,
    pub ev_chargers: Money,
    pub balance_of_system: Money,
    pub installation: Money,
    pub contingency: Money,
    pub shipping: Money,
    pub tariff: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentBreakdown {
    pub system: SystemSpec,
    pub lines: Vec<EquipmentLine>,
    pub costs: EquipmentCosts,
    /// Battery + inverter + transformer + switchgear
    pub equipment_subtotal: Money,
    /// Subtotal after BOS, EPC and contingency
    pub installed_bess_cost: Money,
    pub total_project_cost: Money,
    /// Catalog version label the prices came from
    pub pricing_version: String,
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Price the system implied by `sizing` plus any requested renewables and
/// chargers.
///
/// Cost order: hardware subtotal, then BOS, then EPC on the running total,
/// then contingency; renewables and chargers are added at cost; shipping and
/// tariff are charged on the hardware subtotal only.
pub fn build_equipment_breakdown(
    sizing: &PowerSizingResult,
    renewables: &RenewablesOptions,
    install: &InstallOptions,
    catalog: &PricingCatalog,
) -> QuoteResult<EquipmentBreakdown> {
    validate_breakdown_input(sizing, renewables, install)?;

    let duration = install
        .duration_hours_override
        .unwrap_or(sizing.recommended_duration_hours);
    let power_kw = sizing.peak_power_mw * KW_PER_MW;
    let battery_kwh = power_kw * duration;
    let inverter_kw = power_kw * install.inverter_ratio;
    let transformer_kva = power_kw * TRANSFORMER_SAFETY_MARGIN;

    let mut pricer = LinePricer {
        catalog,
        as_of: install.as_of,
        lines: Vec::new(),
    };

    let mut costs = EquipmentCosts {
        battery: pricer.price(EquipmentCategory::Battery, battery_kwh, Decimal::ONE)?,
        inverter: pricer.price(EquipmentCategory::Inverter, inverter_kw, Decimal::ONE)?,
        transformer: pricer.price(EquipmentCategory::Transformer, transformer_kva, Decimal::ONE)?,
        switchgear: pricer.price(EquipmentCategory::Switchgear, power_kw, Decimal::ONE)?,
        ..EquipmentCosts::default()
    };

    let subtotal = costs.battery + costs.inverter + costs.transformer + costs.switchgear;

    costs.balance_of_system = round_money(subtotal * install.bos_pct);
    let after_bos = subtotal + costs.balance_of_system;
    costs.installation = round_money(after_bos * install.epc_pct);
    let after_epc = after_bos + costs.installation;
    costs.contingency = round_money(after_epc * install.contingency_pct);
    let installed_bess_cost = after_epc + costs.contingency;

    // Solar tiers are on kWp, priced per W
    costs.solar = pricer.price(
        EquipmentCategory::Solar,
        renewables.solar_mw * KW_PER_MW,
        WATTS_PER_KW,
    )?;
    costs.wind = pricer.price(EquipmentCategory::Wind, renewables.wind_mw * KW_PER_MW, Decimal::ONE)?;
    costs.generator = pricer.price(
        EquipmentCategory::Generator,
        renewables.generator_mw * KW_PER_MW,
        Decimal::ONE,
    )?;

    costs.ev_chargers = pricer.price(
        EquipmentCategory::EvChargerLevel2,
        Decimal::from(renewables.level2_chargers),
        Decimal::ONE,
    )? + pricer.price(
        EquipmentCategory::EvChargerDcfc,
        Decimal::from(renewables.dcfc_chargers),
        Decimal::ONE,
    )? + pricer.price(
        EquipmentCategory::EvChargerHpc,
        Decimal::from(renewables.hpc_chargers),
        Decimal::ONE,
    )?;

    costs.shipping = round_money(subtotal * install.shipping_pct);
    costs.tariff = round_money(subtotal * install.tariff_pct);

    let total_project_cost = installed_bess_cost
        + costs.solar
        + costs.wind
        + costs.generator
        + costs.ev_chargers
        + costs.shipping
        + costs.tariff;

    tracing::debug!(
        power_kw = %power_kw,
        battery_kwh = %battery_kwh,
        %subtotal,
        %total_project_cost,
        pricing_version = %catalog.version_label(),
        "equipment priced"
    );

    Ok(EquipmentBreakdown {
        system: SystemSpec {
            power_mw: sizing.peak_power_mw,
            energy_mwh: battery_kwh / KW_PER_MW,
            duration_hours: duration,
            inverter_kw,
            transformer_kva,
            solar_mw: renewables.solar_mw,
            wind_mw: renewables.wind_mw,
            generator_mw: renewables.generator_mw,
            level2_chargers: renewables.level2_chargers,
            dcfc_chargers: renewables.dcfc_chargers,
            hpc_chargers: renewables.hpc_chargers,
        },
        lines: pricer.lines,
        costs,
        equipment_subtotal: subtotal,
        installed_bess_cost,
        total_project_cost,
        pricing_version: catalog.version_label(),
    })
}

struct LinePricer<'a> {
    catalog: &'a PricingCatalog,
    as_of: Option<NaiveDate>,
    lines: Vec<EquipmentLine>,
}

impl LinePricer<'_> {
    /// Cost of `quantity` (in the category's capacity unit). `price_scale`
    /// converts one capacity unit into price units (1000 W per kWp for
    /// solar). Zero quantities are free and skip the catalog entirely.
    fn price(
        &mut self,
        category: EquipmentCategory,
        quantity: Decimal,
        price_scale: Decimal,
    ) -> QuoteResult<Money> {
        if quantity.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let unit_price = self.catalog.resolve_unit_price(category, quantity, self.as_of)?;
        let cost = round_money(quantity * price_scale * unit_price);
        self.lines.push(EquipmentLine {
            category,
            quantity,
            capacity_unit: category.capacity_unit().to_string(),
            unit_price,
            price_unit: category.price_unit().to_string(),
            cost,
        });
        Ok(cost)
    }
}

fn round_money(value: Money) -> Money {
    value.round_dp(2)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn non_negative_capacity(field: &str, value: Decimal) -> QuoteResult<()> {
    if value < Decimal::ZERO {
        return Err(QuoteError::InvalidCapacity {
            field: field.into(),
            value,
        });
    }
    Ok(())
}

fn validate_breakdown_input(
    sizing: &PowerSizingResult,
    renewables: &RenewablesOptions,
    install: &InstallOptions,
) -> QuoteResult<()> {
    non_negative_capacity("peak_power_mw", sizing.peak_power_mw)?;
    non_negative_capacity("recommended_duration_hours", sizing.recommended_duration_hours)?;
    if let Some(hours) = install.duration_hours_override {
        non_negative_capacity("duration_hours_override", hours)?;
    }
    non_negative_capacity("inverter_ratio", install.inverter_ratio)?;
    non_negative_capacity("solar_mw", renewables.solar_mw)?;
    non_negative_capacity("wind_mw", renewables.wind_mw)?;
    non_negative_capacity("generator_mw", renewables.generator_mw)?;

    let percentages = [
        ("bos_pct", install.bos_pct),
        ("epc_pct", install.epc_pct),
        ("contingency_pct", install.contingency_pct),
        ("shipping_pct", install.shipping_pct),
        ("tariff_pct", install.tariff_pct),
    ];
    for (field, pct) in percentages {
        if pct < Decimal::ZERO {
            return Err(QuoteError::InvalidInput {
                field: field.into(),
                reason: "Percentage cannot be negative".into(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::PricingTier;
    use crate::sizing::{size_power, FacilityProfile};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    /// Office sizing pinned to 1 MW / 4 h
    fn one_mw() -> PowerSizingResult {
        let mut sizing = size_power("office", &FacilityProfile::new()).unwrap();
        sizing.peak_power_mw = dec!(1);
        sizing
    }

    #[test]
    fn test_soft_costs_compound_in_order() {
        let b = build_equipment_breakdown(
            &one_mw(),
            &RenewablesOptions::default(),
            &InstallOptions::default(),
            PricingCatalog::standard(),
        )
        .unwrap();

        // 4,000 kWh × 325 + 1,000 kW × 140 + 1,250 kVA × 55 + 1,000 kW × 45
        assert_eq!(b.equipment_subtotal, dec!(1553750));
        assert_eq!(b.costs.balance_of_system, dec!(186450));
        // EPC applies to subtotal + BOS
        assert_eq!(b.costs.installation, dec!(261030));
        assert_eq!(b.costs.contingency, dec!(100061.50));
        assert_eq!(b.installed_bess_cost, dec!(2101291.50));
        assert_eq!(b.costs.shipping, dec!(46612.50));
        assert_eq!(b.total_project_cost, dec!(2147904.00));
        assert_eq!(b.system.energy_mwh, dec!(4));
        assert_eq!(b.lines.len(), 4);
        assert_eq!(b.pricing_version, "2025.1-r0");
    }

    #[test]
    fn test_recommended_solar_not_priced() {
        let sizing = size_power("warehouse", &FacilityProfile::new()).unwrap();
        assert!(sizing.recommended_solar_mw > Decimal::ZERO);
        let b = build_equipment_breakdown(
            &sizing,
            &RenewablesOptions::default(),
            &InstallOptions::default(),
            PricingCatalog::standard(),
        )
        .unwrap();
        assert_eq!(b.costs.solar, Decimal::ZERO);
        assert_eq!(b.system.solar_mw, Decimal::ZERO);
    }

    #[test]
    fn test_renewables_and_chargers_added_at_cost() {
        let renewables = RenewablesOptions {
            solar_mw: dec!(0.5),
            dcfc_chargers: 2,
            ..RenewablesOptions::default()
        };
        let base = build_equipment_breakdown(
            &one_mw(),
            &RenewablesOptions::default(),
            &InstallOptions::default(),
            PricingCatalog::standard(),
        )
        .unwrap();
        let b = build_equipment_breakdown(
            &one_mw(),
            &renewables,
            &InstallOptions::default(),
            PricingCatalog::standard(),
        )
        .unwrap();

        // 500 kWp × 1,000 W × $1.85
        assert_eq!(b.costs.solar, dec!(925000));
        assert_eq!(b.costs.ev_chargers, dec!(190000));
        assert_eq!(
            b.total_project_cost - base.total_project_cost,
            dec!(925000) + dec!(190000)
        );
    }

    #[test]
    fn test_duration_override() {
        let install = InstallOptions {
            duration_hours_override: Some(dec!(2)),
            ..InstallOptions::default()
        };
        let b = build_equipment_breakdown(
            &one_mw(),
            &RenewablesOptions::default(),
            &install,
            PricingCatalog::standard(),
        )
        .unwrap();
        assert_eq!(b.system.duration_hours, dec!(2));
        assert_eq!(b.costs.battery, dec!(650000));
    }

    #[test]
    fn test_negative_capacity_rejected() {
        let renewables = RenewablesOptions {
            wind_mw: dec!(-1),
            ..RenewablesOptions::default()
        };
        let err = build_equipment_breakdown(
            &one_mw(),
            &renewables,
            &InstallOptions::default(),
            PricingCatalog::standard(),
        )
        .unwrap_err();
        assert!(matches!(err, QuoteError::InvalidCapacity { ref field, .. } if field == "wind_mw"));
    }

    #[test]
    fn test_negative_percentage_rejected() {
        let install = InstallOptions {
            epc_pct: dec!(-0.1),
            ..InstallOptions::default()
        };
        assert!(matches!(
            build_equipment_breakdown(
                &one_mw(),
                &RenewablesOptions::default(),
                &install,
                PricingCatalog::standard()
            ),
            Err(QuoteError::InvalidInput { .. })
        ));
    }

    #[test]
    fn test_sparse_catalog_prices_requested_categories_only() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let flat = |price| {
            vec![PricingTier {
                lower_bound: dec!(0),
                upper_bound: None,
                unit_price: price,
                effective_date: date,
            }]
        };
        let mut tables = BTreeMap::new();
        tables.insert(EquipmentCategory::Battery, flat(dec!(300)));
        tables.insert(EquipmentCategory::Inverter, flat(dec!(100)));
        tables.insert(EquipmentCategory::Transformer, flat(dec!(50)));
        tables.insert(EquipmentCategory::Switchgear, flat(dec!(40)));
        let catalog = PricingCatalog::new("sparse", tables).unwrap();

        let ok = build_equipment_breakdown(
            &one_mw(),
            &RenewablesOptions::default(),
            &InstallOptions::default(),
            &catalog,
        );
        assert!(ok.is_ok());

        let with_wind = RenewablesOptions {
            wind_mw: dec!(1),
            ..RenewablesOptions::default()
        };
        assert!(matches!(
            build_equipment_breakdown(&one_mw(), &with_wind, &InstallOptions::default(), &catalog),
            Err(QuoteError::UnknownCategory(_))
        ));
    }
}
