//! Embodied (manufacturing) carbon amortized over the GPU service life.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, InputError};
use crate::gpu::GpuProfile;

/// Reference GPU service life in hours.
pub const GPU_LIFETIME_HOURS: f64 = 35_000.;
/// Reference share of the service life spent doing useful work.
pub const GPU_UTILIZATION_RATE: f64 = 0.70;
/// Relative uncertainty of LCA manufacturing figures.
pub const EMBODIED_UNCERTAINTY: f64 = 0.30;

/// Embodied carbon attributed to a job.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EmbodiedResult {
    /// Amortized manufacturing emissions in kgCO2e.
    pub embodied_kg: f64,
    /// Standard deviation, a fixed share of the estimate.
    pub sigma: f64,
}

/// Linear amortization: `per_hour = embodied_mass / (lifetime_hours × utilization)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmbodiedCarbonModel {
    lifetime_hours: f64,
    utilization: f64,
}

impl EmbodiedCarbonModel {
    /// Creates a model with the given service life in hours and utilization rate (0-1].
    pub fn new(lifetime_hours: f64, utilization: f64) -> Self {
        Self {
            lifetime_hours,
            utilization,
        }
    }

    /// Returns the embodied emissions in kgCO2e attributed to one hour of GPU use.
    pub fn per_hour(&self, profile: &GpuProfile) -> f64 {
        profile.embodied_kg / (self.lifetime_hours * self.utilization)
    }

    /// Computes the embodied emissions of a job running for `hours`.
    pub fn compute(&self, profile: &GpuProfile, hours: f64) -> Result<EmbodiedResult, InputError> {
        let hours = ensure_non_negative("job duration", hours)?;
        let embodied_kg = self.per_hour(profile) * hours;
        Ok(EmbodiedResult {
            embodied_kg,
            sigma: embodied_kg * EMBODIED_UNCERTAINTY,
        })
    }
}

impl Default for EmbodiedCarbonModel {
    fn default() -> Self {
        Self::new(GPU_LIFETIME_HOURS, GPU_UTILIZATION_RATE)
    }
}
