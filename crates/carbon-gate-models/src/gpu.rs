//! GPU reference profiles.

use log::warn;
use serde::Serialize;

/// Parameters of the junction-temperature throttling response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThrottleParams {
    /// Junction temperature in °C at which throttling starts.
    pub threshold_c: f64,
    /// Temperature span in °C over which throttling ramps up to its maximum.
    pub range_c: f64,
    /// Maximum fraction of TDP shed at full throttle (0-1).
    pub max_fraction: f64,
    /// Lumped steady-state thermal resistance of the cooling solution in °C/W.
    pub thermal_resistance: f64,
}

/// Static reference data for one accelerator model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GpuProfile {
    /// Hardware model identifier, e.g. `"H100"`.
    pub model: &'static str,
    /// Thermal design power in W.
    pub tdp_w: f64,
    /// Whole-lifecycle manufacturing emissions in kgCO2e.
    pub embodied_kg: f64,
    /// Throttling behaviour under heat.
    pub throttle: ThrottleParams,
}

/// Identifier of the reference profile used for unknown hardware.
pub const REFERENCE_GPU: &str = "A100";

const fn profile(
    model: &'static str,
    tdp_w: f64,
    embodied_kg: f64,
    threshold_c: f64,
    max_fraction: f64,
    thermal_resistance: f64,
) -> GpuProfile {
    GpuProfile {
        model,
        tdp_w,
        embodied_kg,
        throttle: ThrottleParams {
            threshold_c,
            range_c: 10.,
            max_fraction,
            thermal_resistance,
        },
    }
}

// Embodied figures follow published LCA estimates (Gupta et al. 2022, Patterson et al. 2021).
static GPU_PROFILES: [GpuProfile; 8] = [
    profile("H100", 700., 150., 83., 0.20, 0.08),
    profile("A100", 400., 100., 85., 0.18, 0.09),
    profile("V100", 300., 75., 88., 0.15, 0.10),
    profile("A10", 150., 50., 90., 0.12, 0.12),
    profile("A10G", 150., 50., 90., 0.12, 0.12),
    profile("T4", 70., 30., 88., 0.10, 0.15),
    profile("L40", 300., 90., 85., 0.18, 0.09),
    profile("L40S", 350., 100., 85., 0.18, 0.09),
];

impl GpuProfile {
    /// Returns all known profiles.
    pub fn all() -> &'static [GpuProfile] {
        &GPU_PROFILES
    }

    /// Looks up a profile by hardware identifier (case-insensitive).
    pub fn find(model: &str) -> Option<&'static GpuProfile> {
        GPU_PROFILES.iter().find(|p| p.model.eq_ignore_ascii_case(model))
    }

    /// Looks up a profile by hardware identifier, falling back to the reference GPU ([`REFERENCE_GPU`])
    /// for unknown identifiers.
    pub fn lookup(model: &str) -> &'static GpuProfile {
        match Self::find(model) {
            Some(profile) => profile,
            None => {
                warn!("unknown GPU model '{}', using {} reference profile", model, REFERENCE_GPU);
                Self::reference()
            }
        }
    }

    /// Returns the reference profile.
    pub fn reference() -> &'static GpuProfile {
        &GPU_PROFILES[1]
    }
}
