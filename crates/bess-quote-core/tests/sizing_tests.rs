use bess_quote_core::sizing::{size_power, FacilityProfile, GridReliability, IndustryId};
use bess_quote_core::QuoteError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// ===========================================================================
// Registry coverage
// ===========================================================================

#[test]
fn test_every_industry_sizes_with_empty_profile() {
    for id in IndustryId::ALL {
        let result = size_power(id.as_str(), &FacilityProfile::new())
            .unwrap_or_else(|e| panic!("{id} failed: {e}"));
        assert!(result.peak_power_mw >= Decimal::ZERO, "{id}");
        assert!(result.recommended_duration_hours > Decimal::ZERO, "{id}");
        assert!(!result.description.is_empty(), "{id}");
        assert!(!result.data_source.is_empty(), "{id}");
    }
}

#[test]
fn test_unknown_industry() {
    let err = size_power("lunar_base", &FacilityProfile::new()).unwrap_err();
    assert!(matches!(err, QuoteError::UnsupportedIndustry(_)));
}

#[test]
fn test_sizing_is_deterministic() {
    let profile = FacilityProfile::new()
        .with("squareFeet", 120000i64)
        .with("isColdStorage", true)
        .with("level2Chargers", 6i64);
    let first = size_power("warehouse", &profile).unwrap();
    for _ in 0..3 {
        assert_eq!(size_power("warehouse", &profile).unwrap(), first);
    }
}

// ===========================================================================
// Field aliasing
// ===========================================================================

#[test]
fn test_hotel_room_aliases_are_equivalent() {
    let canonical = size_power("hotel", &FacilityProfile::new().with("roomCount", 250i64)).unwrap();
    for alias in ["numberOfRooms", "rooms", "room_count", "hotelRooms"] {
        let aliased = size_power("hotel", &FacilityProfile::new().with(alias, 250i64)).unwrap();
        assert_eq!(aliased.peak_power_mw, canonical.peak_power_mw, "{alias}");
    }
}

#[test]
fn test_first_alias_wins() {
    let profile = FacilityProfile::new()
        .with("roomCount", 100i64)
        .with("rooms", 400i64);
    let only_first = size_power("hotel", &FacilityProfile::new().with("roomCount", 100i64)).unwrap();
    assert_eq!(size_power("hotel", &profile).unwrap().peak_power_mw, only_first.peak_power_mw);
}

#[test]
fn test_derived_fields_rejected() {
    let profile = FacilityProfile::new()
        .with("roomCount", 100i64)
        .with("peakPowerMW", dec!(2));
    assert!(matches!(
        size_power("hotel", &profile),
        Err(QuoteError::InvalidAttribute { .. })
    ));
}

// ===========================================================================
// Reference facilities
// ===========================================================================

#[test]
fn test_warehouse_peak_band_and_scaling() {
    let small = size_power("warehouse", &FacilityProfile::new().with("squareFeet", 100000i64)).unwrap();
    assert!(small.peak_power_mw >= dec!(0.1) && small.peak_power_mw <= dec!(0.4));

    let large = size_power("warehouse", &FacilityProfile::new().with("squareFeet", 200000i64)).unwrap();
    let ratio = large.peak_power_mw / small.peak_power_mw;
    assert!(ratio >= dec!(3) && ratio <= dec!(5), "ratio {ratio}");
}

#[test]
fn test_datacenter_reference() {
    let profile = FacilityProfile::new()
        .with("rackCount", 5000i64)
        .with("rackDensityKW", 8i64);
    let result = size_power("data_center", &profile).unwrap();
    assert!(result.peak_power_mw >= dec!(55) && result.peak_power_mw <= dec!(65));
    assert_eq!(result.recommended_duration_hours, dec!(4));
}

#[test]
fn test_hospital_duration_floor() {
    for grid in ["reliable", "limited", "unreliable", "off-grid"] {
        let profile = FacilityProfile::new().with("bedCount", 300i64).with("gridConnection", grid);
        let result = size_power("hospital", &profile).unwrap();
        assert!(result.recommended_duration_hours >= dec!(8), "{grid}");
    }
}

#[test]
fn test_grid_reliability_lengthens_duration() {
    let reliable = size_power("office", &FacilityProfile::new()).unwrap();
    let off_grid = size_power("office", &FacilityProfile::new().with("gridConnection", "off_grid")).unwrap();
    assert_eq!(reliable.grid_reliability, GridReliability::Reliable);
    assert_eq!(off_grid.grid_reliability, GridReliability::OffGrid);
    assert!(off_grid.recommended_duration_hours > reliable.recommended_duration_hours);
}

#[test]
fn test_ev_chargers_add_load() {
    let base = size_power("retail", &FacilityProfile::new().with("squareFeet", 40000i64)).unwrap();
    let with_chargers = size_power(
        "retail",
        &FacilityProfile::new()
            .with("squareFeet", 40000i64)
            .with("dcfcChargers", 4i64),
    )
    .unwrap();
    assert!(with_chargers.peak_power_mw > base.peak_power_mw);
}

// ===========================================================================
// Universal questions
// ===========================================================================

/// Answers every template carries, with their stock defaults.
fn universal(profile: FacilityProfile) -> FacilityProfile {
    profile
        .with("facilitySize", 10000i64)
        .with("operatingHours", 12i64)
        .with("peakLoad", 0i64)
        .with("gridConnection", "reliable")
        .with("gridCapacity", 0i64)
}

#[test]
fn test_zero_peak_load_means_calculate() {
    let plain = size_power("hotel", &FacilityProfile::new().with("roomCount", 180i64)).unwrap();
    let with_zero = size_power(
        "hotel",
        &FacilityProfile::new().with("roomCount", 180i64).with("peakLoad", 0i64),
    )
    .unwrap();
    assert_eq!(with_zero, plain);

    let with_value = FacilityProfile::new().with("roomCount", 180i64).with("peakLoad", dec!(0.9));
    assert!(matches!(
        size_power("hotel", &with_value),
        Err(QuoteError::InvalidAttribute { .. })
    ));
}

#[test]
fn test_universal_answers_size_every_industry() {
    for id in IndustryId::ALL {
        let result = size_power(id.as_str(), &universal(FacilityProfile::new()))
            .unwrap_or_else(|e| panic!("{id} failed: {e}"));
        assert_eq!(result.operating_hours, dec!(12), "{id}");
        assert_eq!(result.grid_import_limit_mw, None, "{id}");
    }
}

#[test]
fn test_operating_hours_scale_daily_energy() {
    let profile = |hours: i64| {
        FacilityProfile::new()
            .with("squareFeet", 100000i64)
            .with("operatingHours", hours)
    };
    let single_shift = size_power("manufacturing", &profile(8)).unwrap();
    let three_shift = size_power("manufacturing", &profile(24)).unwrap();

    assert_eq!(single_shift.peak_power_mw, three_shift.peak_power_mw);
    assert_eq!(three_shift.daily_energy_mwh, single_shift.daily_energy_mwh * dec!(3));
    // 1.5 MW × 8 h × 0.6
    assert_eq!(single_shift.daily_energy_mwh, dec!(7.2));

    // Unanswered: industry default (round the clock for hospitals)
    let hospital = size_power("hospital", &FacilityProfile::new()).unwrap();
    assert_eq!(hospital.operating_hours, dec!(24));
}

#[test]
fn test_limited_grid_capacity() {
    // 250 rooms × 3.5 kW = 0.875 MW
    let hotel = |grid: &str, capacity: Decimal| {
        FacilityProfile::new()
            .with("roomCount", 250i64)
            .with("gridConnection", grid)
            .with("gridCapacity", capacity)
    };

    let constrained = size_power("hotel", &hotel("limited", dec!(0.5))).unwrap();
    assert_eq!(constrained.grid_import_limit_mw, Some(dec!(0.5)));
    assert_eq!(constrained.warnings.len(), 1);

    let ample = size_power("hotel", &hotel("limited", dec!(2))).unwrap();
    assert_eq!(ample.grid_import_limit_mw, Some(dec!(2)));
    assert!(ample.warnings.is_empty());

    let unlimited = size_power("hotel", &hotel("limited", Decimal::ZERO)).unwrap();
    assert_eq!(unlimited.grid_import_limit_mw, None);

    let reliable = size_power("hotel", &hotel("reliable", dec!(0.5))).unwrap();
    assert_eq!(reliable.grid_import_limit_mw, None);
    assert!(reliable.warnings.is_empty());
}
