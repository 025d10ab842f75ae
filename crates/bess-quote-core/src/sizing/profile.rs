use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::QuoteError;
use crate::QuoteResult;

// ---------------------------------------------------------------------------
// Raw values
// ---------------------------------------------------------------------------

/// A raw answer from the question flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Flag(bool),
    Number(Decimal),
    Text(String),
    Null,
}

impl AttributeValue {
    /// Null and blank text count as "not answered".
    fn is_present(&self) -> bool {
        match self {
            AttributeValue::Null => false,
            AttributeValue::Text(s) => !s.trim().is_empty(),
            _ => true,
        }
    }
}

impl AttributeValue {
    fn is_blank_or_zero(&self) -> bool {
        match self {
            AttributeValue::Number(n) => n.is_zero(),
            AttributeValue::Text(s) => {
                let s = s.trim();
                s.is_empty() || Decimal::from_str(s).is_ok_and(|n| n.is_zero())
            }
            AttributeValue::Null => true,
            AttributeValue::Flag(_) => false,
        }
    }
}

impl From<Decimal> for AttributeValue {
    fn from(v: Decimal) -> Self {
        AttributeValue::Number(v)
    }
}

impl From<i64> for AttributeValue {
    fn from(v: i64) -> Self {
        AttributeValue::Number(Decimal::from(v))
    }
}

impl From<u32> for AttributeValue {
    fn from(v: u32) -> Self {
        AttributeValue::Number(Decimal::from(v))
    }
}

impl From<bool> for AttributeValue {
    fn from(v: bool) -> Self {
        AttributeValue::Flag(v)
    }
}

impl From<&str> for AttributeValue {
    fn from(v: &str) -> Self {
        AttributeValue::Text(v.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(v: String) -> Self {
        AttributeValue::Text(v)
    }
}

// ---------------------------------------------------------------------------
// Logical attributes and their aliases
// ---------------------------------------------------------------------------

/// A logical facility attribute. Each has an ordered list of raw key names;
/// lookup uses the first alias that is present and non-null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    RoomCount,
    HotelClass,
    BedCount,
    UnitCount,
    AnnualPassengersMillions,
    RackCount,
    RackDensityKw,
    ItLoadKw,
    Pue,
    SquareFeet,
    ManufacturingType,
    ColdStorage,
    Level2Chargers,
    DcfcChargers,
    HpcChargers,
    TunnelCount,
    InBayAutomaticCount,
    SelfServeBays,
    VacuumStations,
    GridConnection,
    /// Utility connection limit in MW; 0 means unlimited
    GridCapacityMw,
    OperatingHours,
}

impl Attribute {
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Attribute::RoomCount => &["roomCount", "numberOfRooms", "rooms", "room_count", "hotelRooms"],
            Attribute::HotelClass => &["hotelClass", "hotelType", "propertyClass", "hotel_class"],
            Attribute::BedCount => &["bedCount", "numberOfBeds", "beds", "bed_count", "licensedBeds"],
            Attribute::UnitCount => &["unitCount", "numberOfUnits", "apartmentUnits", "units", "unit_count"],
            Attribute::AnnualPassengersMillions => &[
                "annualPassengersMillions",
                "annualPassengers",
                "passengersMillions",
                "annual_passengers_millions",
            ],
            Attribute::RackCount => &["rackCount", "numberOfRacks", "racks", "rack_count"],
            Attribute::RackDensityKw => &["rackDensityKW", "rackDensityKw", "kwPerRack", "rackDensity", "rack_density_kw"],
            Attribute::ItLoadKw => &["itLoadKW", "itLoadKw", "itLoad", "it_load_kw"],
            Attribute::Pue => &["pue", "PUE", "powerUsageEffectiveness"],
            Attribute::SquareFeet => &[
                "squareFeet",
                "squareFootage",
                "facilitySize",
                "sqft",
                "square_feet",
                "buildingSqFt",
                "warehouseSqFt",
            ],
            Attribute::ManufacturingType => &["manufacturingType", "industryType", "processIntensity", "manufacturing_type"],
            Attribute::ColdStorage => &["isColdStorage", "coldStorage", "refrigerated", "cold_storage"],
            Attribute::Level2Chargers => &["level2Chargers", "level2Count", "numberOfLevel2Chargers", "l2Chargers", "level2_chargers"],
            Attribute::DcfcChargers => &["dcfcChargers", "dcFastChargers", "numberOfDCFastChargers", "dcfcCount", "dcfc_chargers"],
            Attribute::HpcChargers => &["hpcChargers", "ultraFastChargers", "numberOfHPCChargers", "hpcCount", "hpc_chargers"],
            Attribute::TunnelCount => &["tunnelCount", "tunnels", "numberOfTunnels", "tunnel_count"],
            Attribute::InBayAutomaticCount => &["inBayAutomaticCount", "automaticBays", "inBayAutomatics", "in_bay_automatic_count"],
            Attribute::SelfServeBays => &["selfServeBays", "washBays", "bayCount", "numberOfBays", "self_serve_bays"],
            Attribute::VacuumStations => &["vacuumStations", "vacuums", "numberOfVacuums", "vacuum_stations"],
            Attribute::GridConnection => &["gridConnection", "gridReliability", "gridQuality", "grid_connection"],
            Attribute::GridCapacityMw => &["gridCapacity", "gridCapacityMW", "utilityCapacityMW", "grid_capacity"],
            Attribute::OperatingHours => &["operatingHours", "dailyOperatingHours", "hoursPerDay", "operating_hours"],
        }
    }

    /// Canonical key, used in error messages and descriptions.
    pub fn name(&self) -> &'static str {
        self.aliases()[0]
    }
}

/// Keys that name engine outputs. A profile carrying any of them would feed
/// a previous result back in as an input.
pub const DERIVED_KEYS: [&str; 8] = [
    "peakPowerMW",
    "peakDemandKW",
    "peakLoad",
    "peakKW",
    "annualEnergyKWh",
    "annualEnergyMWh",
    "recommendedDurationHours",
    "recommendedSolarMW",
];

// ---------------------------------------------------------------------------
// Facility profile
// ---------------------------------------------------------------------------

/// Raw, industry-agnostic answers supplied by the question flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FacilityProfile(BTreeMap<String, AttributeValue>);

impl FacilityProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reject profiles that contain engine outputs. Null or zero means
    /// "calculate it" and is ignored.
    pub fn ensure_no_derived_fields(&self) -> QuoteResult<()> {
        let supplied = |key: &&&str| self.0.get(**key).is_some_and(|v| !v.is_blank_or_zero());
        if let Some(key) = DERIVED_KEYS.iter().find(supplied) {
            return Err(QuoteError::InvalidAttribute {
                attribute: (*key).to_string(),
                reason: "Derived values cannot be supplied as facility inputs".into(),
            });
        }
        Ok(())
    }

    /// First present, non-null alias of `attribute`, with the key it was
    /// found under.
    pub fn lookup(&self, attribute: Attribute) -> Option<(&'static str, &AttributeValue)> {
        attribute
            .aliases()
            .iter()
            .find_map(|alias| match self.0.get(*alias) {
                Some(v) if v.is_present() => Some((*alias, v)),
                _ => None,
            })
    }

    pub fn has(&self, attribute: Attribute) -> bool {
        self.lookup(attribute).is_some()
    }

    /// Non-negative numeric value of `attribute`, `None` when unanswered.
    /// Numeric text ("1,200") is accepted; anything else is an error.
    pub fn number(&self, attribute: Attribute) -> QuoteResult<Option<Decimal>> {
        let Some((key, value)) = self.lookup(attribute) else {
            return Ok(None);
        };

        let number = match value {
            AttributeValue::Number(n) => *n,
            AttributeValue::Text(s) => {
                let cleaned: String = s.trim().chars().filter(|c| *c != ',' && *c != '_').collect();
                Decimal::from_str(&cleaned).map_err(|_| QuoteError::InvalidAttribute {
                    attribute: key.to_string(),
                    reason: format!("Expected a number, got '{s}'"),
                })?
            }
            AttributeValue::Flag(b) => {
                return Err(QuoteError::InvalidAttribute {
                    attribute: key.to_string(),
                    reason: format!("Expected a number, got boolean {b}"),
                });
            }
            AttributeValue::Null => return Ok(None),
        };

        if number < Decimal::ZERO {
            return Err(QuoteError::InvalidAttribute {
                attribute: key.to_string(),
                reason: format!("Must be non-negative, got {number}"),
            });
        }

        Ok(Some(number))
    }

    pub fn number_or(&self, attribute: Attribute, default: Decimal) -> QuoteResult<Decimal> {
        Ok(self.number(attribute)?.unwrap_or(default))
    }

    /// Normalized (trimmed, lower-case, `-`/space → `_`) text value.
    pub fn text(&self, attribute: Attribute) -> QuoteResult<Option<String>> {
        match self.lookup(attribute) {
            None => Ok(None),
            Some((_, AttributeValue::Text(s))) => {
                Ok(Some(s.trim().to_ascii_lowercase().replace(['-', ' '], "_")))
            }
            Some((key, other)) => Err(QuoteError::InvalidAttribute {
                attribute: key.to_string(),
                reason: format!("Expected text, got {other:?}"),
            }),
        }
    }

    /// Boolean value; unanswered is `false`. Accepts yes/no style text and
    /// 0/1.
    pub fn flag(&self, attribute: Attribute) -> QuoteResult<bool> {
        match self.lookup(attribute) {
            None => Ok(false),
            Some((_, AttributeValue::Flag(b))) => Ok(*b),
            Some((key, AttributeValue::Number(n))) => match n {
                n if n.is_zero() => Ok(false),
                n if *n == Decimal::ONE => Ok(true),
                _ => Err(QuoteError::InvalidAttribute {
                    attribute: key.to_string(),
                    reason: format!("Expected a yes/no value, got {n}"),
                }),
            },
            Some((key, AttributeValue::Text(s))) => {
                match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "yes" | "y" | "1" => Ok(true),
                    "false" | "no" | "n" | "0" => Ok(false),
                    _ => Err(QuoteError::InvalidAttribute {
                        attribute: key.to_string(),
                        reason: format!("Expected a yes/no value, got '{s}'"),
                    }),
                }
            }
            Some((_, AttributeValue::Null)) => Ok(false),
        }
    }
}

impl FromIterator<(String, AttributeValue)> for FacilityProfile {
    fn from_iter<I: IntoIterator<Item = (String, AttributeValue)>>(iter: I) -> Self {
        FacilityProfile(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_alias_priority() {
        // "roomCount" outranks "rooms"
        let profile = FacilityProfile::new().with("rooms", 80i64).with("roomCount", 120i64);
        assert_eq!(profile.number(Attribute::RoomCount).unwrap(), Some(dec!(120)));
    }

    #[test]
    fn test_null_alias_skipped() {
        let profile = FacilityProfile::new()
            .with("roomCount", AttributeValue::Null)
            .with("numberOfRooms", 90i64);
        assert_eq!(profile.number(Attribute::RoomCount).unwrap(), Some(dec!(90)));
    }

    #[test]
    fn test_numeric_text_accepted() {
        let profile = FacilityProfile::new().with("squareFeet", "120,000");
        assert_eq!(profile.number(Attribute::SquareFeet).unwrap(), Some(dec!(120000)));
    }

    #[test]
    fn test_non_numeric_text_rejected() {
        let profile = FacilityProfile::new().with("squareFeet", "large");
        let err = profile.number(Attribute::SquareFeet).unwrap_err();
        assert!(matches!(err, QuoteError::InvalidAttribute { .. }));
    }

    #[test]
    fn test_negative_rejected() {
        let profile = FacilityProfile::new().with("beds", -3i64);
        assert!(profile.number(Attribute::BedCount).is_err());
    }

    #[test]
    fn test_flag_parsing() {
        let yes = FacilityProfile::new().with("coldStorage", "Yes");
        let no = FacilityProfile::new().with("isColdStorage", false);
        let bad = FacilityProfile::new().with("isColdStorage", "sometimes");
        assert!(yes.flag(Attribute::ColdStorage).unwrap());
        assert!(!no.flag(Attribute::ColdStorage).unwrap());
        assert!(!FacilityProfile::new().flag(Attribute::ColdStorage).unwrap());
        assert!(bad.flag(Attribute::ColdStorage).is_err());
    }

    #[test]
    fn test_derived_fields_rejected() {
        let profile = FacilityProfile::new().with("roomCount", 100i64).with("peakPowerMW", dec!(2.5));
        assert!(profile.ensure_no_derived_fields().is_err());
    }

    #[test]
    fn test_zero_or_null_derived_fields_ignored() {
        let zero = FacilityProfile::new().with("roomCount", 100i64).with("peakLoad", 0i64);
        let null = FacilityProfile::new().with("peakLoad", AttributeValue::Null);
        let text = FacilityProfile::new().with("peakLoad", "0");
        assert!(zero.ensure_no_derived_fields().is_ok());
        assert!(null.ensure_no_derived_fields().is_ok());
        assert!(text.ensure_no_derived_fields().is_ok());

        let supplied = FacilityProfile::new().with("peakLoad", dec!(1.5));
        assert!(supplied.ensure_no_derived_fields().is_err());
    }

    #[test]
    fn test_deserialize_mixed_values() {
        let json = r#"{"rooms": 100, "hotelClass": "upscale", "coldStorage": true, "pue": null}"#;
        let profile: FacilityProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.get("rooms"), Some(&AttributeValue::Number(dec!(100))));
        assert_eq!(profile.get("hotelClass"), Some(&AttributeValue::Text("upscale".into())));
        assert_eq!(profile.get("coldStorage"), Some(&AttributeValue::Flag(true)));
        assert_eq!(profile.get("pue"), Some(&AttributeValue::Null));
    }
}
