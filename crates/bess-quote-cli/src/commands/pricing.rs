use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use bess_quote_core::pricing::{EquipmentCategory, PricingCatalog};

/// Arguments for a single unit-price lookup
#[derive(Args)]
pub struct PriceArgs {
    /// Equipment category (battery, inverter, transformer, switchgear, solar,
    /// wind, generator, ev_charger_level2, ev_charger_dcfc, ev_charger_hpc)
    #[arg(long)]
    pub category: EquipmentCategory,

    /// Capacity in the category's tier unit (kWh, kW, kVA, kWp or units)
    #[arg(long)]
    pub capacity: Decimal,

    /// Resolve against the schedule in force on this date (YYYY-MM-DD)
    #[arg(long)]
    pub as_of: Option<chrono::NaiveDate>,
}

/// Arguments for dumping the catalog
#[derive(Args)]
pub struct PricingArgs {
    /// Only this category
    #[arg(long)]
    pub category: Option<EquipmentCategory>,
}

pub fn run_price(args: PriceArgs, catalog: &PricingCatalog) -> Result<Value, Box<dyn std::error::Error>> {
    let tier = catalog.resolve_tier(args.category, args.capacity, args.as_of)?;
    Ok(json!({
        "category": args.category,
        "capacity": args.capacity,
        "capacity_unit": args.category.capacity_unit(),
        "unit_price": tier.unit_price,
        "price_unit": args.category.price_unit(),
        "tier_lower_bound": tier.lower_bound,
        "tier_upper_bound": tier.upper_bound,
        "effective_date": tier.effective_date,
        "pricing_version": catalog.version_label(),
    }))
}

pub fn run_pricing(args: PricingArgs, catalog: &PricingCatalog) -> Result<Value, Box<dyn std::error::Error>> {
    let Some(category) = args.category else {
        return Ok(serde_json::to_value(catalog)?);
    };

    let schedules = catalog.schedules(category)?;
    let tiers: Vec<Value> = schedules
        .iter()
        .flat_map(|s| s.tiers.iter())
        .map(|t| {
            json!({
                "effective_date": t.effective_date,
                "lower_bound": t.lower_bound,
                "upper_bound": t.upper_bound,
                "unit_price": t.unit_price,
                "price_unit": category.price_unit(),
            })
        })
        .collect();
    Ok(Value::Array(tiers))
}
