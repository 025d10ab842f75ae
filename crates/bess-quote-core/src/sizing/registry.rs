use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::duration::Criticality;
use super::profile::Attribute;
use crate::error::QuoteError;
use crate::types::{Hours, Kilowatts};
use crate::QuoteResult;

// ---------------------------------------------------------------------------
// Industry identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryId {
    Hotel,
    Hospital,
    Datacenter,
    Office,
    Retail,
    ShoppingCenter,
    Warehouse,
    Manufacturing,
    College,
    Apartment,
    Casino,
    IndoorFarm,
    Government,
    Airport,
    EvCharging,
    CarWash,
}

impl IndustryId {
    pub const ALL: [IndustryId; 16] = [
        IndustryId::Hotel,
        IndustryId::Hospital,
        IndustryId::Datacenter,
        IndustryId::Office,
        IndustryId::Retail,
        IndustryId::ShoppingCenter,
        IndustryId::Warehouse,
        IndustryId::Manufacturing,
        IndustryId::College,
        IndustryId::Apartment,
        IndustryId::Casino,
        IndustryId::IndoorFarm,
        IndustryId::Government,
        IndustryId::Airport,
        IndustryId::EvCharging,
        IndustryId::CarWash,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndustryId::Hotel => "hotel",
            IndustryId::Hospital => "hospital",
            IndustryId::Datacenter => "datacenter",
            IndustryId::Office => "office",
            IndustryId::Retail => "retail",
            IndustryId::ShoppingCenter => "shopping_center",
            IndustryId::Warehouse => "warehouse",
            IndustryId::Manufacturing => "manufacturing",
            IndustryId::College => "college",
            IndustryId::Apartment => "apartment",
            IndustryId::Casino => "casino",
            IndustryId::IndoorFarm => "indoor_farm",
            IndustryId::Government => "government",
            IndustryId::Airport => "airport",
            IndustryId::EvCharging => "ev_charging",
            IndustryId::CarWash => "car_wash",
        }
    }

    /// Other spellings used by callers (after lower-casing and `-`/space →
    /// `_`).
    fn aliases(&self) -> &'static [&'static str] {
        match self {
            IndustryId::Hotel => &["hospitality"],
            IndustryId::Hospital => &["healthcare"],
            IndustryId::Datacenter => &["data_center", "datacentre", "data_centre"],
            IndustryId::Office => &["office_building"],
            IndustryId::Retail => &["retail_store"],
            IndustryId::ShoppingCenter => &["shopping_mall", "mall"],
            IndustryId::Warehouse => &["logistics", "distribution_center"],
            IndustryId::Manufacturing => &["factory", "industrial"],
            IndustryId::College => &["university", "campus"],
            IndustryId::Apartment => &["apartments", "multifamily"],
            IndustryId::Casino => &["gaming"],
            IndustryId::IndoorFarm => &["vertical_farm", "agriculture_indoor"],
            IndustryId::Government => &["public_building", "municipal"],
            IndustryId::Airport => &["aviation"],
            IndustryId::EvCharging => &["ev_charging_hub", "ev_hub", "ev_charging_station"],
            IndustryId::CarWash => &["carwash"],
        }
    }
}

impl fmt::Display for IndustryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndustryId {
    type Err = QuoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        IndustryId::ALL
            .iter()
            .copied()
            .find(|id| id.as_str() == normalized || id.aliases().contains(&normalized.as_str()))
            .ok_or_else(|| QuoteError::UnsupportedIndustry(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Load formulas
// ---------------------------------------------------------------------------

/// A named per-unit load (hotel class, for example).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitClass {
    pub name: &'static str,
    pub kw_per_unit: Kilowatts,
}

/// W/sqft density applying from `min_square_feet` upward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityBand {
    pub min_square_feet: Decimal,
    pub watts_per_sqft: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaSubtype {
    pub name: &'static str,
    /// Ascending by `min_square_feet`; the first band starts at zero
    pub bands: &'static [DensityBand],
}

impl AreaSubtype {
    /// Density of the largest band whose minimum area does not exceed
    /// `square_feet`.
    pub fn density_for(&self, square_feet: Decimal) -> Decimal {
        self.bands
            .iter()
            .rev()
            .find(|b| b.min_square_feet <= square_feet)
            .or(self.bands.first())
            .map(|b| b.watts_per_sqft)
            .unwrap_or(Decimal::ZERO)
    }
}

/// How a per-area industry picks its subtype from the profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubtypeSelector {
    Fixed,
    Flag {
        attribute: Attribute,
        when_set: &'static str,
        when_unset: &'static str,
    },
    Text {
        attribute: Attribute,
        default: &'static str,
    },
}

/// One bottom-up load line for composite industries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquipmentLoad {
    pub attribute: Attribute,
    pub label: &'static str,
    pub kw_per_unit: Kilowatts,
    pub default_count: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FormulaSpec {
    /// `count × kW/unit`, the kW/unit optionally chosen by a class attribute
    PerUnit {
        count: Attribute,
        unit_label: &'static str,
        default_count: Decimal,
        class_attribute: Option<Attribute>,
        classes: &'static [UnitClass],
        default_class: &'static str,
    },
    /// Data centers: IT load (direct, or racks × density) × PUE
    ItLoad {
        default_racks: Decimal,
        default_density_kw: Kilowatts,
        default_pue: Decimal,
    },
    /// `squareFeet × W/sqft / 1000`
    PerArea {
        default_square_feet: Decimal,
        selector: SubtypeSelector,
        subtypes: &'static [AreaSubtype],
    },
    /// `Σ(count × unit kW) × concurrency`
    Composite {
        equipment: &'static [EquipmentLoad],
        concurrency: Decimal,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndustrySpec {
    pub id: IndustryId,
    pub label: &'static str,
    pub formula: FormulaSpec,
    pub criticality: Criticality,
    /// Daily operating hours when the profile does not say
    pub default_operating_hours: Hours,
    /// Recommended solar MW per MW of peak demand
    pub solar_ratio: Decimal,
    pub data_source: &'static str,
    pub standard_detail: Option<&'static str>,
}

// ---------------------------------------------------------------------------
// Concurrency factors
// ---------------------------------------------------------------------------

/// Share of installed charger nameplate drawing power at the site peak of a
/// dedicated charging hub.
pub const EV_CHARGING_CONCURRENCY: Decimal = dec!(0.5);

/// Share of car wash equipment nameplate running at peak (dryers and pumps
/// cycle per vehicle).
pub const CAR_WASH_CONCURRENCY: Decimal = dec!(0.45);

/// Share of amenity chargers (hotel, office, retail parking) active at the
/// host facility's peak.
pub const EV_AMENITY_CONCURRENCY: Decimal = dec!(0.3);

pub const LEVEL2_CHARGER_KW: Kilowatts = dec!(7.2);
pub const DCFC_CHARGER_KW: Kilowatts = dec!(150);
pub const HPC_CHARGER_KW: Kilowatts = dec!(350);

const EV_HUB_EQUIPMENT: [EquipmentLoad; 3] = [
    EquipmentLoad {
        attribute: Attribute::Level2Chargers,
        label: "Level 2 chargers",
        kw_per_unit: LEVEL2_CHARGER_KW,
        default_count: dec!(12),
    },
    EquipmentLoad {
        attribute: Attribute::DcfcChargers,
        label: "DC fast chargers",
        kw_per_unit: DCFC_CHARGER_KW,
        default_count: dec!(8),
    },
    EquipmentLoad {
        attribute: Attribute::HpcChargers,
        label: "high-power chargers",
        kw_per_unit: HPC_CHARGER_KW,
        default_count: dec!(0),
    },
];

/// Chargers a non-charging facility may host; no defaults.
pub const EV_AMENITY_EQUIPMENT: [EquipmentLoad; 3] = [
    EquipmentLoad {
        attribute: Attribute::Level2Chargers,
        label: "Level 2 chargers",
        kw_per_unit: LEVEL2_CHARGER_KW,
        default_count: dec!(0),
    },
    EquipmentLoad {
        attribute: Attribute::DcfcChargers,
        label: "DC fast chargers",
        kw_per_unit: DCFC_CHARGER_KW,
        default_count: dec!(0),
    },
    EquipmentLoad {
        attribute: Attribute::HpcChargers,
        label: "high-power chargers",
        kw_per_unit: HPC_CHARGER_KW,
        default_count: dec!(0),
    },
];

const CAR_WASH_EQUIPMENT: [EquipmentLoad; 4] = [
    // conveyor 11 + high-pressure pumps 30 + dryers 112 + reclaim 7.5 + misc 22
    EquipmentLoad {
        attribute: Attribute::TunnelCount,
        label: "tunnels",
        kw_per_unit: dec!(182.5),
        default_count: dec!(1),
    },
    EquipmentLoad {
        attribute: Attribute::InBayAutomaticCount,
        label: "in-bay automatics",
        kw_per_unit: dec!(70),
        default_count: dec!(0),
    },
    EquipmentLoad {
        attribute: Attribute::SelfServeBays,
        label: "self-serve bays",
        kw_per_unit: dec!(10.5),
        default_count: dec!(0),
    },
    EquipmentLoad {
        attribute: Attribute::VacuumStations,
        label: "vacuum stations",
        kw_per_unit: dec!(3.7),
        default_count: dec!(10),
    },
];

// ---------------------------------------------------------------------------
// Per-unit and per-area tables
// ---------------------------------------------------------------------------

const HOTEL_CLASSES: [UnitClass; 4] = [
    UnitClass { name: "economy", kw_per_unit: dec!(2.5) },
    UnitClass { name: "midscale", kw_per_unit: dec!(3.5) },
    UnitClass { name: "upscale", kw_per_unit: dec!(5.0) },
    UnitClass { name: "luxury", kw_per_unit: dec!(7.0) },
];

const HOSPITAL_CLASSES: [UnitClass; 1] = [UnitClass { name: "acute_care", kw_per_unit: dec!(10) }];

const APARTMENT_CLASSES: [UnitClass; 1] = [UnitClass { name: "multifamily", kw_per_unit: dec!(1.8) }];

/// kW per million annual passengers
const AIRPORT_CLASSES: [UnitClass; 1] = [UnitClass { name: "commercial", kw_per_unit: dec!(1500) }];

const fn flat(watts_per_sqft: Decimal) -> [DensityBand; 1] {
    [DensityBand { min_square_feet: dec!(0), watts_per_sqft }]
}

const OFFICE_BANDS: [DensityBand; 1] = flat(dec!(6.0));
const RETAIL_BANDS: [DensityBand; 1] = flat(dec!(5.0));
const SHOPPING_CENTER_BANDS: [DensityBand; 1] = flat(dec!(6.5));
const COLLEGE_BANDS: [DensityBand; 1] = flat(dec!(7.0));
const CASINO_BANDS: [DensityBand; 1] = flat(dec!(15.0));
const INDOOR_FARM_BANDS: [DensityBand; 1] = flat(dec!(35.0));
const GOVERNMENT_BANDS: [DensityBand; 1] = flat(dec!(5.0));
const MFG_LIGHT_BANDS: [DensityBand; 1] = flat(dec!(8.0));
const MFG_MEDIUM_BANDS: [DensityBand; 1] = flat(dec!(15.0));
const MFG_HEAVY_BANDS: [DensityBand; 1] = flat(dec!(25.0));

/// Large warehouses are automated distribution centers (conveyors, sortation,
/// charging for material-handling fleets).
const WAREHOUSE_AUTOMATION_THRESHOLD_SQFT: Decimal = dec!(150000);

const WAREHOUSE_STANDARD_BANDS: [DensityBand; 2] = [
    DensityBand { min_square_feet: dec!(0), watts_per_sqft: dec!(2.0) },
    DensityBand { min_square_feet: WAREHOUSE_AUTOMATION_THRESHOLD_SQFT, watts_per_sqft: dec!(3.5) },
];

const WAREHOUSE_COLD_BANDS: [DensityBand; 2] = [
    DensityBand { min_square_feet: dec!(0), watts_per_sqft: dec!(6.0) },
    DensityBand { min_square_feet: WAREHOUSE_AUTOMATION_THRESHOLD_SQFT, watts_per_sqft: dec!(8.0) },
];

macro_rules! single_subtype {
    ($name:expr, $bands:expr) => {
        &[AreaSubtype { name: $name, bands: &$bands }]
    };
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

static REGISTRY: [IndustrySpec; 16] = [
    IndustrySpec {
        id: IndustryId::Hotel,
        label: "Hotel",
        formula: FormulaSpec::PerUnit {
            count: Attribute::RoomCount,
            unit_label: "rooms",
            default_count: dec!(150),
            class_attribute: Some(Attribute::HotelClass),
            classes: &HOTEL_CLASSES,
            default_class: "midscale",
        },
        criticality: Criticality::Standard,
        default_operating_hours: dec!(24),
        solar_ratio: dec!(0.3),
        data_source: "CBECS 2018 lodging end-use intensity",
        standard_detail: Some("ASHRAE 90.1 lodging; diversified peak per guest room"),
    },
    IndustrySpec {
        id: IndustryId::Hospital,
        label: "Hospital",
        formula: FormulaSpec::PerUnit {
            count: Attribute::BedCount,
            unit_label: "beds",
            default_count: dec!(200),
            class_attribute: None,
            classes: &HOSPITAL_CLASSES,
            default_class: "acute_care",
        },
        criticality: Criticality::LifeSafety,
        default_operating_hours: dec!(24),
        solar_ratio: dec!(0.25),
        data_source: "ASHE hospital energy benchmarking",
        standard_detail: Some("NFPA 99/110 essential electrical system; 8 h minimum backup"),
    },
    IndustrySpec {
        id: IndustryId::Datacenter,
        label: "Data Center",
        formula: FormulaSpec::ItLoad {
            default_racks: dec!(400),
            default_density_kw: dec!(8),
            default_pue: dec!(1.5),
        },
        criticality: Criticality::UpsBacked,
        default_operating_hours: dec!(24),
        solar_ratio: dec!(0.05),
        data_source: "Uptime Institute global PUE survey",
        standard_detail: Some("Uptime Tier III; UPS bridges to storage, storage bridges to generation"),
    },
    IndustrySpec {
        id: IndustryId::Office,
        label: "Office Building",
        formula: FormulaSpec::PerArea {
            default_square_feet: dec!(50000),
            selector: SubtypeSelector::Fixed,
            subtypes: single_subtype!("office", OFFICE_BANDS),
        },
        criticality: Criticality::Standard,
        default_operating_hours: dec!(12),
        solar_ratio: dec!(0.4),
        data_source: "CBECS 2018 office end-use intensity",
        standard_detail: None,
    },
    IndustrySpec {
        id: IndustryId::Retail,
        label: "Retail",
        formula: FormulaSpec::PerArea {
            default_square_feet: dec!(20000),
            selector: SubtypeSelector::Fixed,
            subtypes: single_subtype!("retail", RETAIL_BANDS),
        },
        criticality: Criticality::Standard,
        default_operating_hours: dec!(12),
        solar_ratio: dec!(0.5),
        data_source: "CBECS 2018 mercantile end-use intensity",
        standard_detail: None,
    },
    IndustrySpec {
        id: IndustryId::ShoppingCenter,
        label: "Shopping Center",
        formula: FormulaSpec::PerArea {
            default_square_feet: dec!(200000),
            selector: SubtypeSelector::Fixed,
            subtypes: single_subtype!("shopping_center", SHOPPING_CENTER_BANDS),
        },
        criticality: Criticality::Standard,
        default_operating_hours: dec!(12),
        solar_ratio: dec!(0.5),
        data_source: "CBECS 2018 enclosed mall end-use intensity",
        standard_detail: None,
    },
    IndustrySpec {
        id: IndustryId::Warehouse,
        label: "Warehouse",
        formula: FormulaSpec::PerArea {
            default_square_feet: dec!(100000),
            selector: SubtypeSelector::Flag {
                attribute: Attribute::ColdStorage,
                when_set: "cold_storage",
                when_unset: "standard",
            },
            subtypes: &[
                AreaSubtype { name: "standard", bands: &WAREHOUSE_STANDARD_BANDS },
                AreaSubtype { name: "cold_storage", bands: &WAREHOUSE_COLD_BANDS },
            ],
        },
        criticality: Criticality::Standard,
        default_operating_hours: dec!(12),
        solar_ratio: dec!(1.0),
        data_source: "CBECS 2018 warehouse and storage end-use intensity",
        standard_detail: Some("Distribution centers above 150,000 sq ft carry automation load"),
    },
    IndustrySpec {
        id: IndustryId::Manufacturing,
        label: "Manufacturing",
        formula: FormulaSpec::PerArea {
            default_square_feet: dec!(100000),
            selector: SubtypeSelector::Text {
                attribute: Attribute::ManufacturingType,
                default: "medium",
            },
            subtypes: &[
                AreaSubtype { name: "light", bands: &MFG_LIGHT_BANDS },
                AreaSubtype { name: "medium", bands: &MFG_MEDIUM_BANDS },
                AreaSubtype { name: "heavy", bands: &MFG_HEAVY_BANDS },
            ],
        },
        criticality: Criticality::Standard,
        default_operating_hours: dec!(16),
        solar_ratio: dec!(0.4),
        data_source: "DOE Manufacturing Energy Consumption Survey",
        standard_detail: None,
    },
    IndustrySpec {
        id: IndustryId::College,
        label: "College / University",
        formula: FormulaSpec::PerArea {
            default_square_feet: dec!(500000),
            selector: SubtypeSelector::Fixed,
            subtypes: single_subtype!("campus", COLLEGE_BANDS),
        },
        criticality: Criticality::Standard,
        default_operating_hours: dec!(14),
        solar_ratio: dec!(0.4),
        data_source: "CBECS 2018 education end-use intensity",
        standard_detail: None,
    },
    IndustrySpec {
        id: IndustryId::Apartment,
        label: "Apartment Complex",
        formula: FormulaSpec::PerUnit {
            count: Attribute::UnitCount,
            unit_label: "units",
            default_count: dec!(100),
            class_attribute: None,
            classes: &APARTMENT_CLASSES,
            default_class: "multifamily",
        },
        criticality: Criticality::Standard,
        default_operating_hours: dec!(24),
        solar_ratio: dec!(0.3),
        data_source: "RECS 2020 multifamily diversified demand",
        standard_detail: Some("NEC 220.84 optional calculation for multifamily dwellings"),
    },
    IndustrySpec {
        id: IndustryId::Casino,
        label: "Casino",
        formula: FormulaSpec::PerArea {
            default_square_feet: dec!(150000),
            selector: SubtypeSelector::Fixed,
            subtypes: single_subtype!("gaming_floor", CASINO_BANDS),
        },
        criticality: Criticality::Standard,
        default_operating_hours: dec!(24),
        solar_ratio: dec!(0.2),
        data_source: "ENERGY STAR Portfolio Manager entertainment benchmarks",
        standard_detail: None,
    },
    IndustrySpec {
        id: IndustryId::IndoorFarm,
        label: "Indoor Farm",
        formula: FormulaSpec::PerArea {
            default_square_feet: dec!(50000),
            selector: SubtypeSelector::Fixed,
            subtypes: single_subtype!("grow_room", INDOOR_FARM_BANDS),
        },
        criticality: Criticality::Standard,
        default_operating_hours: dec!(18),
        solar_ratio: dec!(0.3),
        data_source: "Resource Innovation Institute controlled-environment agriculture benchmarks",
        standard_detail: None,
    },
    IndustrySpec {
        id: IndustryId::Government,
        label: "Government / Public Building",
        formula: FormulaSpec::PerArea {
            default_square_feet: dec!(75000),
            selector: SubtypeSelector::Fixed,
            subtypes: single_subtype!("public", GOVERNMENT_BANDS),
        },
        criticality: Criticality::Standard,
        default_operating_hours: dec!(10),
        solar_ratio: dec!(0.4),
        data_source: "CBECS 2018 public order and safety end-use intensity",
        standard_detail: None,
    },
    IndustrySpec {
        id: IndustryId::Airport,
        label: "Airport",
        formula: FormulaSpec::PerUnit {
            count: Attribute::AnnualPassengersMillions,
            unit_label: "million annual passengers",
            default_count: dec!(5),
            class_attribute: None,
            classes: &AIRPORT_CLASSES,
            default_class: "commercial",
        },
        criticality: Criticality::Standard,
        default_operating_hours: dec!(20),
        solar_ratio: dec!(0.4),
        data_source: "ACRP Report 220 airport energy benchmarks",
        standard_detail: None,
    },
    IndustrySpec {
        id: IndustryId::EvCharging,
        label: "EV Charging Hub",
        formula: FormulaSpec::Composite {
            equipment: &EV_HUB_EQUIPMENT,
            concurrency: EV_CHARGING_CONCURRENCY,
        },
        criticality: Criticality::DemandShaving,
        default_operating_hours: dec!(16),
        solar_ratio: dec!(0.2),
        data_source: "NREL EVI-Pro charging load profiles",
        standard_detail: Some("SAE J1772 Level 2 at 7.2 kW; CCS DCFC at 150 kW; HPC at 350 kW"),
    },
    IndustrySpec {
        id: IndustryId::CarWash,
        label: "Car Wash",
        formula: FormulaSpec::Composite {
            equipment: &CAR_WASH_EQUIPMENT,
            concurrency: CAR_WASH_CONCURRENCY,
        },
        criticality: Criticality::DemandShaving,
        default_operating_hours: dec!(12),
        solar_ratio: dec!(0.5),
        data_source: "International Carwash Association equipment ratings",
        standard_detail: None,
    },
];

/// Load formula and metadata for `id`.
pub fn lookup(id: IndustryId) -> QuoteResult<&'static IndustrySpec> {
    REGISTRY
        .iter()
        .find(|spec| spec.id == id)
        .ok_or_else(|| QuoteError::UnsupportedIndustry(id.to_string()))
}
