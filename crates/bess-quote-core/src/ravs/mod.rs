pub mod factors;
mod insights;
pub mod score;

pub use factors::{
    ClimateExposure, EquipmentTier, FactorScore, IncentiveStability, InterconnectionStatus,
    MarketRiskContext, OmContract, OperationalContext, ProjectContext, RegulatoryClimate,
    SystemType,
};
pub use score::{
    calculate_ravs, ComponentScore, ConfidenceInterval, ConfidenceLevel, LetterGrade,
    RavsComponents, RavsScore, RiskLevel,
};
