pub mod breakdown;

pub use breakdown::{
    build_equipment_breakdown, EquipmentBreakdown, EquipmentCosts, EquipmentLine, InstallOptions,
    RenewablesOptions, SystemSpec,
};
