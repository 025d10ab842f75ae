pub mod catalog;
pub mod tiers;

pub use catalog::{resolve_unit_price, PricingCatalog};
pub use tiers::{EquipmentCategory, PricingTier, TierSchedule};
