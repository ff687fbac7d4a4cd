//! Tests for the GPU registry.

use crate::gpu::{GpuProfile, REFERENCE_GPU};

#[test]
fn test_known_models() {
    assert_eq!(GpuProfile::lookup("H100").tdp_w, 700.);
    assert_eq!(GpuProfile::lookup("T4").embodied_kg, 30.);
    assert_eq!(GpuProfile::lookup("l40s").model, "L40S");
}

#[test]
fn test_unknown_model_falls_back_to_reference() {
    assert!(GpuProfile::find("TPUv5").is_none());
    let profile = GpuProfile::lookup("TPUv5");
    assert_eq!(profile.model, REFERENCE_GPU);
    assert_eq!(profile, GpuProfile::reference());
}

#[test]
fn test_profiles_are_consistent() {
    for profile in GpuProfile::all() {
        assert!(profile.tdp_w > 0.);
        assert!(profile.embodied_kg > 0.);
        assert!(profile.throttle.max_fraction > 0. && profile.throttle.max_fraction < 1.);
        assert!(profile.throttle.range_c > 0.);
        assert_eq!(GpuProfile::find(profile.model), Some(profile));
    }
}
