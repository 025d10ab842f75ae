use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use super::tiers::{EquipmentCategory, PricingTier, TierSchedule};
use crate::error::QuoteError;
use crate::types::Money;
use crate::QuoteResult;

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Versioned, immutable set of tiered unit-cost tables.
///
/// A catalog is never mutated in place: [`PricingCatalog::with_schedule`]
/// returns a new snapshot with a bumped revision, so a catalog shared across
/// threads or captured by an in-flight quote never changes under it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PricingCatalogData", into = "PricingCatalogData")]
pub struct PricingCatalog {
    version: String,
    revision: u32,
    /// Schedules per category, ascending by effective date
    tables: BTreeMap<EquipmentCategory, Vec<TierSchedule>>,
}

/// Serialized form: a flat tier list per category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingCatalogData {
    pub version: String,
    #[serde(default)]
    pub revision: u32,
    pub tables: BTreeMap<EquipmentCategory, Vec<PricingTier>>,
}

impl TryFrom<PricingCatalogData> for PricingCatalog {
    type Error = QuoteError;

    fn try_from(data: PricingCatalogData) -> Result<Self, Self::Error> {
        let mut catalog = PricingCatalog::new(data.version, data.tables)?;
        catalog.revision = data.revision;
        Ok(catalog)
    }
}

impl From<PricingCatalog> for PricingCatalogData {
    fn from(catalog: PricingCatalog) -> Self {
        let tables = catalog
            .tables
            .into_iter()
            .map(|(category, schedules)| {
                let tiers = schedules.into_iter().flat_map(|s| s.tiers).collect();
                (category, tiers)
            })
            .collect();
        PricingCatalogData {
            version: catalog.version,
            revision: catalog.revision,
            tables,
        }
    }
}

impl PricingCatalog {
    /// Build a catalog from flat tier lists. Tiers of one category are grouped
    /// into schedules by effective date and each schedule is validated.
    pub fn new(
        version: impl Into<String>,
        tables: BTreeMap<EquipmentCategory, Vec<PricingTier>>,
    ) -> QuoteResult<Self> {
        let mut grouped = BTreeMap::new();
        for (category, tiers) in tables {
            grouped.insert(category, group_schedules(category, tiers)?);
        }
        Ok(PricingCatalog {
            version: version.into(),
            revision: 0,
            tables: grouped,
        })
    }

    /// The built-in tables, constructed once per process and shared.
    pub fn standard() -> &'static PricingCatalog {
        static STANDARD: OnceLock<PricingCatalog> = OnceLock::new();
        STANDARD.get_or_init(build_standard)
    }

    /// Parse and validate a catalog from JSON.
    pub fn from_json(json: &str) -> QuoteResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// `version` plus revision, recorded on every breakdown priced from this
    /// catalog.
    pub fn version_label(&self) -> String {
        format!("{}-r{}", self.version, self.revision)
    }

    pub fn categories(&self) -> impl Iterator<Item = EquipmentCategory> + '_ {
        self.tables.keys().copied()
    }

    pub fn schedules(&self, category: EquipmentCategory) -> QuoteResult<&[TierSchedule]> {
        self.tables
            .get(&category)
            .map(Vec::as_slice)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| QuoteError::UnknownCategory(category.to_string()))
    }

    /// Schedule in force on `as_of`: the latest one effective on or before
    /// that date, the latest overall when `as_of` is `None`, and the earliest
    /// when `as_of` predates every schedule.
    pub fn schedule_as_of(
        &self,
        category: EquipmentCategory,
        as_of: Option<NaiveDate>,
    ) -> QuoteResult<&TierSchedule> {
        let schedules = self.schedules(category)?;
        let chosen = match as_of {
            None => schedules.last(),
            Some(date) => schedules
                .iter()
                .rev()
                .find(|s| s.effective_date <= date)
                .or_else(|| schedules.first()),
        };
        chosen.ok_or_else(|| QuoteError::UnknownCategory(category.to_string()))
    }

    pub fn resolve_tier(
        &self,
        category: EquipmentCategory,
        capacity: Decimal,
        as_of: Option<NaiveDate>,
    ) -> QuoteResult<&PricingTier> {
        let schedule = self.schedule_as_of(category, as_of)?;
        let tier = schedule.select(capacity);
        tracing::trace!(
            %category,
            %capacity,
            unit_price = %tier.unit_price,
            effective = %schedule.effective_date,
            "resolved pricing tier"
        );
        Ok(tier)
    }

    /// Unit price for `capacity` (already in `category.capacity_unit()`).
    pub fn resolve_unit_price(
        &self,
        category: EquipmentCategory,
        capacity: Decimal,
        as_of: Option<NaiveDate>,
    ) -> QuoteResult<Money> {
        Ok(self.resolve_tier(category, capacity, as_of)?.unit_price)
    }

    /// New snapshot with `tiers` added as a schedule for `category` (replacing
    /// any schedule with the same effective date). `self` is left unchanged.
    pub fn with_schedule(
        &self,
        category: EquipmentCategory,
        tiers: Vec<PricingTier>,
    ) -> QuoteResult<PricingCatalog> {
        let schedule = TierSchedule::new(category, tiers)?;
        let mut next = self.clone();
        let schedules = next.tables.entry(category).or_default();
        schedules.retain(|s| s.effective_date != schedule.effective_date);
        schedules.push(schedule);
        schedules.sort_by_key(|s| s.effective_date);
        next.revision = self.revision + 1;
        tracing::debug!(%category, revision = next.revision, "pricing catalog snapshot created");
        Ok(next)
    }
}

/// Free-function form of [`PricingCatalog::resolve_unit_price`].
pub fn resolve_unit_price(
    catalog: &PricingCatalog,
    category: EquipmentCategory,
    capacity: Decimal,
    as_of: Option<NaiveDate>,
) -> QuoteResult<Money> {
    catalog.resolve_unit_price(category, capacity, as_of)
}

fn group_schedules(
    category: EquipmentCategory,
    tiers: Vec<PricingTier>,
) -> QuoteResult<Vec<TierSchedule>> {
    if tiers.is_empty() {
        return Err(QuoteError::InvalidPricingTable {
            category: category.to_string(),
            reason: "At least one tier is required".into(),
        });
    }

    let mut by_date: BTreeMap<NaiveDate, Vec<PricingTier>> = BTreeMap::new();
    for tier in tiers {
        by_date.entry(tier.effective_date).or_default().push(tier);
    }

    by_date
        .into_values()
        .map(|mut group| {
            group.sort_by(|a, b| a.lower_bound.cmp(&b.lower_bound));
            TierSchedule::new(category, group)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Standard tables
// ---------------------------------------------------------------------------

pub const STANDARD_CATALOG_VERSION: &str = "2025.1";

type TierRow = (Decimal, Option<Decimal>, Money);

const BATTERY_PER_KWH: [TierRow; 5] = [
    (dec!(0), Some(dec!(1000)), dec!(400)),
    (dec!(1000), Some(dec!(5000)), dec!(325)),
    (dec!(5000), Some(dec!(20000)), dec!(275)),
    (dec!(20000), Some(dec!(100000)), dec!(225)),
    (dec!(100000), None, dec!(185)),
];

const INVERTER_PER_KW: [TierRow; 4] = [
    (dec!(0), Some(dec!(500)), dec!(180)),
    (dec!(500), Some(dec!(2000)), dec!(140)),
    (dec!(2000), Some(dec!(10000)), dec!(110)),
    (dec!(10000), None, dec!(85)),
];

const TRANSFORMER_PER_KVA: [TierRow; 3] = [
    (dec!(0), Some(dec!(1000)), dec!(75)),
    (dec!(1000), Some(dec!(5000)), dec!(55)),
    (dec!(5000), None, dec!(40)),
];

const SWITCHGEAR_PER_KW: [TierRow; 3] = [
    (dec!(0), Some(dec!(1000)), dec!(60)),
    (dec!(1000), Some(dec!(5000)), dec!(45)),
    (dec!(5000), None, dec!(30)),
];

/// $/W, tiered on kWp
const SOLAR_PER_WATT: [TierRow; 4] = [
    (dec!(0), Some(dec!(100)), dec!(2.50)),
    (dec!(100), Some(dec!(1000)), dec!(1.85)),
    (dec!(1000), Some(dec!(5000)), dec!(1.35)),
    (dec!(5000), None, dec!(1.05)),
];

const WIND_PER_KW: [TierRow; 4] = [
    (dec!(0), Some(dec!(100)), dec!(5000)),
    (dec!(100), Some(dec!(1000)), dec!(2500)),
    (dec!(1000), Some(dec!(10000)), dec!(1600)),
    (dec!(10000), None, dec!(1350)),
];

const GENERATOR_PER_KW: [TierRow; 3] = [
    (dec!(0), Some(dec!(500)), dec!(800)),
    (dec!(500), Some(dec!(2000)), dec!(600)),
    (dec!(2000), None, dec!(500)),
];

/// Per unit, tiered on unit count (volume discount)
const EV_LEVEL2_PER_UNIT: [TierRow; 3] = [
    (dec!(0), Some(dec!(10)), dec!(8000)),
    (dec!(10), Some(dec!(50)), dec!(6500)),
    (dec!(50), None, dec!(5500)),
];

const EV_DCFC_PER_UNIT: [TierRow; 3] = [
    (dec!(0), Some(dec!(4)), dec!(95000)),
    (dec!(4), Some(dec!(12)), dec!(85000)),
    (dec!(12), None, dec!(75000)),
];

const EV_HPC_PER_UNIT: [TierRow; 3] = [
    (dec!(0), Some(dec!(4)), dec!(165000)),
    (dec!(4), Some(dec!(12)), dec!(150000)),
    (dec!(12), None, dec!(135000)),
];

fn standard_effective_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default()
}

fn schedule_from_rows(rows: &[TierRow], effective_date: NaiveDate) -> TierSchedule {
    TierSchedule {
        effective_date,
        tiers: rows
            .iter()
            .map(|&(lower_bound, upper_bound, unit_price)| PricingTier {
                lower_bound,
                upper_bound,
                unit_price,
                effective_date,
            })
            .collect(),
    }
}

fn build_standard() -> PricingCatalog {
    let date = standard_effective_date();
    let rows: [(EquipmentCategory, &[TierRow]); 10] = [
        (EquipmentCategory::Battery, &BATTERY_PER_KWH),
        (EquipmentCategory::Inverter, &INVERTER_PER_KW),
        (EquipmentCategory::Transformer, &TRANSFORMER_PER_KVA),
        (EquipmentCategory::Switchgear, &SWITCHGEAR_PER_KW),
        (EquipmentCategory::Solar, &SOLAR_PER_WATT),
        (EquipmentCategory::Wind, &WIND_PER_KW),
        (EquipmentCategory::Generator, &GENERATOR_PER_KW),
        (EquipmentCategory::EvChargerLevel2, &EV_LEVEL2_PER_UNIT),
        (EquipmentCategory::EvChargerDcfc, &EV_DCFC_PER_UNIT),
        (EquipmentCategory::EvChargerHpc, &EV_HPC_PER_UNIT),
    ];

    let tables = rows
        .into_iter()
        .map(|(category, table)| (category, vec![schedule_from_rows(table, date)]))
        .collect();

    PricingCatalog {
        version: STANDARD_CATALOG_VERSION.to_string(),
        revision: 0,
        tables,
    }
}
