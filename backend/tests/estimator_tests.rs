//! Water-demand estimator tests
//!
//! Property tests over the deterministic estimator:
//! - Index always within 0-100
//! - ET0 rises with temperature and wind, falls with humidity
//! - Crop coefficient table and the unknown-crop default

mod common;

use common::conditions;
use proptest::prelude::*;
use shared::{
    crop_coefficient, estimate, etc, normalize_index, reference_et, CropType, EstimateError,
    WaterDemand, WaterNeedLevel, WeatherSnapshot, DEFAULT_CROP_COEFFICIENT,
};

fn crop_strategy() -> impl Strategy<Value = CropType> {
    prop_oneof![
        Just(CropType::Corn),
        Just(CropType::Wheat),
        Just(CropType::Soybean),
        Just(CropType::Default),
        "[a-z]{3,12}".prop_map(|name| CropType::parse(&name)),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn index_stays_in_range(etc_value in proptest::num::f64::ANY) {
        prop_assert!(normalize_index(etc_value) <= 100);
    }

    #[test]
    fn index_never_decreases_with_etc(a in 0.0f64..50.0, b in 0.0f64..50.0) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(normalize_index(low) <= normalize_index(high));
    }

    #[test]
    fn estimate_is_deterministic(
        t in -16.0f64..55.0,
        h in 0.0f64..=100.0,
        w in 0.0f64..150.0,
        crop in crop_strategy(),
    ) {
        let snapshot = WeatherSnapshot::Available(conditions(t, h, w));
        let first = estimate(&snapshot, &crop).unwrap();
        let second = estimate(&snapshot, &crop).unwrap();
        prop_assert_eq!(&first, &second);

        let e = first.estimate().unwrap();
        prop_assert!(e.reference_et >= 0.0);
        prop_assert!(e.index <= 100);
        prop_assert!((e.etc - e.reference_et * e.crop_coefficient).abs() < 1e-12);
    }

    #[test]
    fn reference_et_rises_with_wind(
        t in -16.0f64..55.0,
        h in 0.0f64..99.0,
        w in 0.0f64..100.0,
        extra in 1.0f64..50.0,
    ) {
        let calm = reference_et(&conditions(t, h, w)).unwrap();
        let windy = reference_et(&conditions(t, h, w + extra)).unwrap();
        prop_assert!(windy > calm);
    }

    #[test]
    fn reference_et_falls_with_humidity(
        t in -16.0f64..55.0,
        h in 0.0f64..90.0,
        extra in 1.0f64..10.0,
        w in 0.0f64..100.0,
    ) {
        let dry = reference_et(&conditions(t, h, w)).unwrap();
        let damp = reference_et(&conditions(t, h + extra, w)).unwrap();
        prop_assert!(damp < dry);
    }

    #[test]
    fn reference_et_rises_with_temperature(
        t in -16.0f64..50.0,
        extra in 1.0f64..5.0,
        h in 0.0f64..99.0,
        w in 0.0f64..100.0,
    ) {
        let cool = reference_et(&conditions(t, h, w)).unwrap();
        let warm = reference_et(&conditions(t + extra, h, w)).unwrap();
        prop_assert!(warm > cool);
    }

    #[test]
    fn unknown_crops_use_default_coefficient(name in "[a-z]{3,12}") {
        prop_assume!(!matches!(name.as_str(), "corn" | "maize" | "wheat" | "soy" | "soybean" | "soybeans" | "default"));
        prop_assert_eq!(crop_coefficient(&CropType::parse(&name)), DEFAULT_CROP_COEFFICIENT);
    }
}

#[test]
fn test_reference_scenario() {
    let weather = conditions(25.0, 50.0, 10.0);

    let et0 = reference_et(&weather).unwrap();
    assert!((et0 - 0.007352813523931871).abs() < 1e-12);

    let corn = etc(&weather, &CropType::Corn).unwrap();
    assert!((corn - 0.008823376228718245).abs() < 1e-12);
    assert_eq!(normalize_index(corn), 0);
    assert_eq!(WaterNeedLevel::from_index(0), WaterNeedLevel::Low);
}

#[test]
fn test_saturated_air_means_no_demand() {
    let weather = conditions(30.0, 100.0, 20.0);
    assert_eq!(reference_et(&weather).unwrap(), 0.0);
    assert_eq!(normalize_index(etc(&weather, &CropType::Wheat).unwrap()), 0);
}

#[test]
fn test_unavailable_weather_is_insufficient_data() {
    let demand = estimate(&WeatherSnapshot::Unavailable, &CropType::Corn).unwrap();
    assert_eq!(demand, WaterDemand::InsufficientData);
    assert!(demand.estimate().is_none());
}

#[test]
fn test_rejects_impossible_readings() {
    assert!(matches!(
        reference_et(&conditions(-17.0, 50.0, 10.0)),
        Err(EstimateError::TemperatureOutOfRange(_))
    ));
    assert!(matches!(
        reference_et(&conditions(20.0, 101.0, 10.0)),
        Err(EstimateError::HumidityOutOfRange(_))
    ));
    assert!(matches!(
        reference_et(&conditions(20.0, 50.0, -3.0)),
        Err(EstimateError::Negative { .. })
    ));
    assert!(matches!(
        reference_et(&conditions(f64::NAN, 50.0, 10.0)),
        Err(EstimateError::NotFinite { .. })
    ));
}

#[test]
fn test_index_extremes() {
    assert_eq!(normalize_index(0.0), 0);
    assert_eq!(normalize_index(-4.0), 0);
    assert_eq!(normalize_index(5.0), 50);
    assert_eq!(normalize_index(10.0), 100);
    assert_eq!(normalize_index(25.0), 100);
    assert_eq!(normalize_index(f64::NAN), 0);
}
