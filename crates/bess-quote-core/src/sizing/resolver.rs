use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::duration::{recommended_duration, Criticality, GridReliability};
use super::profile::{Attribute, FacilityProfile};
use super::registry::{
    self, AreaSubtype, EquipmentLoad, FormulaSpec, IndustryId, IndustrySpec, SubtypeSelector,
    EV_AMENITY_CONCURRENCY, EV_AMENITY_EQUIPMENT,
};
use crate::error::QuoteError;
use crate::types::{Hours, Kilowatts, Megawatts};
use crate::QuoteResult;

/// Decimal places kept on every MW figure.
const MW_PRECISION: u32 = 4;

const KW_PER_MW: Decimal = dec!(1000);
const WATTS_PER_KW: Decimal = dec!(1000);

/// Average demand over the operating day as a share of peak.
pub const DAILY_LOAD_FACTOR: Decimal = dec!(0.6);
const HOURS_PER_DAY: Decimal = dec!(24);

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Peak demand and storage recommendation derived from a facility profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerSizingResult {
    pub industry: IndustryId,
    pub peak_power_mw: Megawatts,
    pub recommended_duration_hours: Hours,
    pub recommended_solar_mw: Megawatts,
    /// Human-readable derivation of the peak figure
    pub description: String,
    pub data_source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry_standard_detail: Option<String>,
    pub grid_reliability: GridReliability,
    pub criticality: Criticality,
    #[serde(default)]
    pub operating_hours: Hours,
    /// Peak × operating hours × [`DAILY_LOAD_FACTOR`]
    #[serde(default)]
    pub daily_energy_mwh: Decimal,
    /// Utility import cap on a limited grid connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_import_limit_mw: Option<Megawatts>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl PowerSizingResult {
    pub fn peak_power_kw(&self) -> Kilowatts {
        self.peak_power_mw * KW_PER_MW
    }
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Size the facility identified by `industry_id` from its raw answers.
pub fn size_power(industry_id: &str, profile: &FacilityProfile) -> QuoteResult<PowerSizingResult> {
    let id: IndustryId = industry_id.parse()?;
    size_power_for(id, profile)
}

/// [`size_power`] for an already-parsed industry.
pub fn size_power_for(id: IndustryId, profile: &FacilityProfile) -> QuoteResult<PowerSizingResult> {
    profile.ensure_no_derived_fields()?;
    let spec = registry::lookup(id)?;

    let (mut peak_kw, mut description) = evaluate(&spec.formula, profile)?;

    if !matches!(spec.formula, FormulaSpec::Composite { .. }) {
        let (raw_kw, parts) = composite_load(&EV_AMENITY_EQUIPMENT, profile, false)?;
        if raw_kw > Decimal::ZERO {
            let amenity_kw = raw_kw * EV_AMENITY_CONCURRENCY;
            peak_kw += amenity_kw;
            description = format!(
                "{description} + EV amenity ({}) × {EV_AMENITY_CONCURRENCY} concurrency = {} kW",
                parts.join(" + "),
                amenity_kw.normalize()
            );
        }
    }

    let grid = match profile.text(Attribute::GridConnection)? {
        Some(text) => text.parse()?,
        None => GridReliability::default(),
    };

    let peak_power_mw = (peak_kw / KW_PER_MW).round_dp(MW_PRECISION);
    let recommended_solar_mw = (peak_power_mw * spec.solar_ratio).round_dp(MW_PRECISION);
    let recommended_duration_hours = recommended_duration(grid, spec.criticality);

    let operating_hours = profile.number_or(Attribute::OperatingHours, spec.default_operating_hours)?;
    if operating_hours.is_zero() || operating_hours > HOURS_PER_DAY {
        return Err(QuoteError::InvalidAttribute {
            attribute: Attribute::OperatingHours.name().into(),
            reason: format!("Must be between 0 and 24 hours, got {operating_hours}"),
        });
    }
    let daily_energy_mwh = (peak_power_mw * operating_hours * DAILY_LOAD_FACTOR).round_dp(MW_PRECISION);

    let mut warnings = Vec::new();
    let grid_import_limit_mw = grid_import_limit(grid, profile)?;
    if let Some(limit) = grid_import_limit_mw {
        if peak_power_mw > limit {
            warnings.push(format!(
                "Peak demand {} MW exceeds the {} MW utility connection; storage must cover {} MW",
                peak_power_mw.normalize(),
                limit.normalize(),
                (peak_power_mw - limit).normalize()
            ));
        }
    }

    tracing::debug!(
        industry = %id,
        %peak_power_mw,
        %recommended_duration_hours,
        %grid,
        "facility sized"
    );

    Ok(PowerSizingResult {
        industry: id,
        peak_power_mw,
        recommended_duration_hours,
        recommended_solar_mw,
        description: format!("{}: {description}", spec.label),
        data_source: spec.data_source.to_string(),
        industry_standard_detail: spec.standard_detail.map(str::to_string),
        grid_reliability: grid,
        criticality: spec.criticality,
        operating_hours,
        daily_energy_mwh,
        grid_import_limit_mw,
        warnings,
    })
}

/// Utility connection cap. Only a `limited` grid has one; zero or an
/// unanswered capacity means unlimited.
fn grid_import_limit(grid: GridReliability, profile: &FacilityProfile) -> QuoteResult<Option<Megawatts>> {
    let capacity = profile.number(Attribute::GridCapacityMw)?.filter(|c| !c.is_zero());
    match (grid, capacity) {
        (GridReliability::Limited, Some(mw)) => Ok(Some(mw.round_dp(MW_PRECISION))),
        (_, Some(mw)) => {
            tracing::debug!(%grid, capacity_mw = %mw, "grid capacity ignored outside a limited connection");
            Ok(None)
        }
        (_, None) => Ok(None),
    }
}

/// Formula metadata for `id` (label, criticality, solar ratio, source).
pub fn industry_spec(id: IndustryId) -> QuoteResult<&'static IndustrySpec> {
    registry::lookup(id)
}

// ---------------------------------------------------------------------------
// Formula evaluation
// ---------------------------------------------------------------------------

fn evaluate(formula: &FormulaSpec, profile: &FacilityProfile) -> QuoteResult<(Kilowatts, String)> {
    match *formula {
        FormulaSpec::PerUnit {
            count,
            unit_label,
            default_count,
            class_attribute,
            classes,
            default_class,
        } => {
            let n = profile.number_or(count, default_count)?;
            let class_name = match class_attribute {
                Some(attr) => profile.text(attr)?.unwrap_or_else(|| default_class.to_string()),
                None => default_class.to_string(),
            };
            let class = classes
                .iter()
                .find(|c| c.name == class_name)
                .ok_or_else(|| QuoteError::InvalidAttribute {
                    attribute: class_attribute.map_or(count.name(), |a| a.name()).to_string(),
                    reason: format!(
                        "Unknown class '{class_name}' (expected one of: {})",
                        classes.iter().map(|c| c.name).collect::<Vec<_>>().join(", ")
                    ),
                })?;
            let kw = n * class.kw_per_unit;
            Ok((
                kw,
                format!(
                    "{} {unit_label} × {} kW ({}) = {} kW",
                    n.normalize(),
                    class.kw_per_unit.normalize(),
                    class.name,
                    kw.normalize()
                ),
            ))
        }

        FormulaSpec::ItLoad {
            default_racks,
            default_density_kw,
            default_pue,
        } => {
            let pue = profile.number_or(Attribute::Pue, default_pue)?;
            if pue < Decimal::ONE {
                return Err(QuoteError::InvalidAttribute {
                    attribute: Attribute::Pue.name().into(),
                    reason: format!("PUE must be at least 1.0, got {pue}"),
                });
            }
            let (it_kw, basis) = match profile.number(Attribute::ItLoadKw)? {
                Some(it) => (it, format!("IT load {} kW", it.normalize())),
                None => {
                    let racks = profile.number_or(Attribute::RackCount, default_racks)?;
                    let density = profile.number_or(Attribute::RackDensityKw, default_density_kw)?;
                    (
                        racks * density,
                        format!("{} racks × {} kW", racks.normalize(), density.normalize()),
                    )
                }
            };
            let kw = it_kw * pue;
            Ok((
                kw,
                format!("{basis} × PUE {} = {} kW", pue.normalize(), kw.normalize()),
            ))
        }

        FormulaSpec::PerArea {
            default_square_feet,
            selector,
            subtypes,
        } => {
            let sqft = profile.number_or(Attribute::SquareFeet, default_square_feet)?;
            let subtype = select_subtype(selector, subtypes, profile)?;
            let density = subtype.density_for(sqft);
            let kw = sqft * density / WATTS_PER_KW;
            Ok((
                kw,
                format!(
                    "{} sq ft × {} W/sq ft ({}) = {} kW",
                    sqft.normalize(),
                    density.normalize(),
                    subtype.name,
                    kw.normalize()
                ),
            ))
        }

        FormulaSpec::Composite {
            equipment,
            concurrency,
        } => {
            let (raw_kw, parts) = composite_load(equipment, profile, true)?;
            let kw = raw_kw * concurrency;
            Ok((
                kw,
                format!(
                    "({}) × {concurrency} concurrency = {} kW",
                    parts.join(" + "),
                    kw.normalize()
                ),
            ))
        }
    }
}

fn select_subtype(
    selector: SubtypeSelector,
    subtypes: &'static [AreaSubtype],
    profile: &FacilityProfile,
) -> QuoteResult<&'static AreaSubtype> {
    let (name, attribute) = match selector {
        SubtypeSelector::Fixed => {
            return subtypes.first().ok_or_else(|| QuoteError::InvalidInput {
                field: "subtypes".into(),
                reason: "Per-area formula has no subtypes".into(),
            });
        }
        SubtypeSelector::Flag {
            attribute,
            when_set,
            when_unset,
        } => {
            let name = if profile.flag(attribute)? { when_set } else { when_unset };
            (name.to_string(), attribute)
        }
        SubtypeSelector::Text { attribute, default } => (
            profile.text(attribute)?.unwrap_or_else(|| default.to_string()),
            attribute,
        ),
    };

    subtypes
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| QuoteError::InvalidAttribute {
            attribute: attribute.name().into(),
            reason: format!(
                "Unknown type '{name}' (expected one of: {})",
                subtypes.iter().map(|s| s.name).collect::<Vec<_>>().join(", ")
            ),
        })
}

/// Nameplate sum of `equipment`. With `use_defaults`, a profile that answers
/// none of the counts gets every default; once any count is answered, the
/// unanswered ones are zero.
fn composite_load(
    equipment: &[EquipmentLoad],
    profile: &FacilityProfile,
    use_defaults: bool,
) -> QuoteResult<(Kilowatts, Vec<String>)> {
    let any_answered = equipment.iter().any(|e| profile.has(e.attribute));

    let mut total = Decimal::ZERO;
    let mut parts = Vec::new();
    for item in equipment {
        let fallback = if use_defaults && !any_answered {
            item.default_count
        } else {
            Decimal::ZERO
        };
        let count = profile.number_or(item.attribute, fallback)?;
        if count.is_zero() {
            continue;
        }
        total += count * item.kw_per_unit;
        parts.push(format!(
            "{} {} × {} kW",
            count.normalize(),
            item.label,
            item.kw_per_unit.normalize()
        ));
    }
    Ok((total, parts))
}
