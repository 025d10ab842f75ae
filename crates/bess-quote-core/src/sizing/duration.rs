use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QuoteError;
use crate::types::Hours;

/// Quality of the facility's grid connection, as answered in the question
/// flow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridReliability {
    #[default]
    Reliable,
    /// Grid undersized for the facility
    Limited,
    /// Frequent outages
    Unreliable,
    OffGrid,
    Microgrid,
}

impl GridReliability {
    fn index(self) -> usize {
        match self {
            GridReliability::Reliable => 0,
            GridReliability::Limited => 1,
            GridReliability::Unreliable => 2,
            GridReliability::OffGrid => 3,
            GridReliability::Microgrid => 4,
        }
    }
}

impl FromStr for GridReliability {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "reliable" | "reliable_grid" | "stable" => Ok(GridReliability::Reliable),
            "limited" | "limited_capacity" => Ok(GridReliability::Limited),
            "unreliable" | "unreliable_grid" => Ok(GridReliability::Unreliable),
            "off_grid" | "offgrid" => Ok(GridReliability::OffGrid),
            "microgrid" | "micro_grid" => Ok(GridReliability::Microgrid),
            _ => Err(QuoteError::InvalidAttribute {
                attribute: "gridConnection".into(),
                reason: format!("Unknown grid connection '{s}'"),
            }),
        }
    }
}

impl fmt::Display for GridReliability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GridReliability::Reliable => "reliable",
            GridReliability::Limited => "limited",
            GridReliability::Unreliable => "unreliable",
            GridReliability::OffGrid => "off_grid",
            GridReliability::Microgrid => "microgrid",
        };
        f.write_str(s)
    }
}

/// How much the facility depends on backup power.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criticality {
    Standard,
    /// Hospitals: code-mandated long backup
    LifeSafety,
    /// Data centers: UPS bridges the first minutes, storage covers hours
    UpsBacked,
    /// EV charging and car washes: storage exists to clip short demand peaks
    DemandShaving,
}

impl Criticality {
    fn index(self) -> usize {
        match self {
            Criticality::Standard => 0,
            Criticality::LifeSafety => 1,
            Criticality::UpsBacked => 2,
            Criticality::DemandShaving => 3,
        }
    }
}

/// Rows: grid reliability (reliable, limited, unreliable, off-grid,
/// microgrid). Columns: criticality (standard, life-safety, UPS-backed,
/// demand-shaving).
const DURATION_TABLE: [[Hours; 4]; 5] = [
    [dec!(4), dec!(8), dec!(4), dec!(2)],
    [dec!(4), dec!(8), dec!(4), dec!(4)],
    [dec!(6), dec!(12), dec!(6), dec!(4)],
    [dec!(8), dec!(12), dec!(8), dec!(8)],
    [dec!(6), dec!(8), dec!(4), dec!(4)],
];

/// Recommended storage duration in hours.
pub fn recommended_duration(grid: GridReliability, criticality: Criticality) -> Hours {
    DURATION_TABLE[grid.index()][criticality.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_examples() {
        assert_eq!(
            recommended_duration(GridReliability::Unreliable, Criticality::Standard),
            dec!(6)
        );
        assert_eq!(
            recommended_duration(GridReliability::Reliable, Criticality::LifeSafety),
            dec!(8)
        );
        assert_eq!(
            recommended_duration(GridReliability::Reliable, Criticality::UpsBacked),
            dec!(4)
        );
    }

    #[test]
    fn test_hospital_never_below_eight_hours() {
        for grid in [
            GridReliability::Reliable,
            GridReliability::Limited,
            GridReliability::Unreliable,
            GridReliability::OffGrid,
            GridReliability::Microgrid,
        ] {
            assert!(recommended_duration(grid, Criticality::LifeSafety) >= dec!(8));
        }
    }

    #[test]
    fn test_grid_parsing() {
        assert_eq!("off-grid".parse::<GridReliability>().unwrap(), GridReliability::OffGrid);
        assert_eq!("Unreliable".parse::<GridReliability>().unwrap(), GridReliability::Unreliable);
        assert!("sometimes".parse::<GridReliability>().is_err());
    }
}
