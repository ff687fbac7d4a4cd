//! Tests for forcing and lifecycle projection.

use approx::assert_relative_eq;

use crate::atmosphere::{
    lifecycle_emissions, radiative_forcing, InferenceWorkload, ATMOSPHERE_CO2_KG, CO2_CURRENT_PPM,
    CO2_PREINDUSTRIAL_PPM, FORCING_ALPHA,
};

#[test]
fn test_forcing_is_zero_without_emissions() {
    assert_eq!(radiative_forcing(0.).unwrap(), 0.);
}

#[test]
fn test_forcing_is_strictly_increasing() {
    let mut prev = 0.;
    for kg in [1e-3, 0.5, 1., 2.5, 10., 1e3, 1e9] {
        let forcing = radiative_forcing(kg).unwrap();
        assert!(forcing > prev, "{} kg -> {}", kg, forcing);
        prev = forcing;
    }
}

#[test]
fn test_forcing_matches_log_difference() {
    // large enough for the naive formula to be accurate
    let kg = 1e13;
    let c_new = CO2_CURRENT_PPM + kg * CO2_CURRENT_PPM / ATMOSPHERE_CO2_KG;
    let naive = FORCING_ALPHA * (c_new / CO2_PREINDUSTRIAL_PPM).ln()
        - FORCING_ALPHA * (CO2_CURRENT_PPM / CO2_PREINDUSTRIAL_PPM).ln();
    assert_relative_eq!(radiative_forcing(kg).unwrap(), naive, max_relative = 1e-9);
}

#[test]
fn test_forcing_rejects_negative_emissions() {
    assert!(radiative_forcing(-1.).is_err());
}

#[test]
fn test_inference_workload_energy() {
    let workload = InferenceWorkload::default();
    assert_eq!(workload.deployment_days, 360.);
    // 7 × 1e-6 kWh × 10 000 queries × 360 days
    assert_relative_eq!(workload.energy_kwh(), 25.2, max_relative = 1e-12);
}

#[test]
fn test_lifecycle_projection() {
    let workload = InferenceWorkload {
        params_billions: 70.,
        queries_per_day: 1_000_000.,
        deployment_days: 365.,
    };
    let projection = lifecycle_emissions(2.5, 0.05, &workload, 400.).unwrap();
    assert_relative_eq!(projection.inference_kg, 70. * 1e-6 * 1e6 * 365. * 0.4, max_relative = 1e-12);
    assert_relative_eq!(projection.total_kg, 2.5 + 0.05 + projection.inference_kg, max_relative = 1e-12);
    assert!(projection.inference_kg > projection.training_kg);
}

#[test]
fn test_lifecycle_rejects_negative_workload() {
    let workload = InferenceWorkload::from_months(-1., 10., 1.);
    assert!(lifecycle_emissions(1., 0.1, &workload, 400.).is_err());
}
