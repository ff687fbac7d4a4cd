//! Secondary climate metrics: radiative forcing of a run and the lifecycle projection of the
//! trained model.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_non_negative, InputError};

/// IPCC AR6 logarithmic forcing coefficient in W/m².
pub const FORCING_ALPHA: f64 = 5.35;
/// Pre-industrial CO2 concentration in ppm.
pub const CO2_PREINDUSTRIAL_PPM: f64 = 280.;
/// Current CO2 concentration in ppm (NOAA Mauna Loa).
pub const CO2_CURRENT_PPM: f64 = 422.;
/// Mass of CO2 in the whole atmosphere in kg.
pub const ATMOSPHERE_CO2_KG: f64 = 3.16e15;
/// Inference energy per billion parameters per query in kWh.
pub const KWH_PER_QUERY_PER_BILLION_PARAMS: f64 = 1e-6;

/// Returns the forcing delta in W/m² caused by adding `emissions_kg` of CO2 to the atmosphere:
///
/// ```text
/// ΔF = α·ln(C_new / C_pre) - α·ln(C_now / C_pre) = α·ln(1 + ΔC / C_now)
/// ```
///
/// The second form keeps precision for the tiny ΔC of a single run.
pub fn radiative_forcing(emissions_kg: f64) -> Result<f64, InputError> {
    let emissions_kg = ensure_non_negative("emissions", emissions_kg)?;
    let delta_ppm = emissions_kg * CO2_CURRENT_PPM / ATMOSPHERE_CO2_KG;
    Ok(FORCING_ALPHA * (delta_ppm / CO2_CURRENT_PPM).ln_1p())
}

/// Serving workload of the trained model after deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceWorkload {
    /// Model size in billions of parameters.
    pub params_billions: f64,
    /// Served queries per day.
    pub queries_per_day: f64,
    /// Deployment duration in days.
    pub deployment_days: f64,
}

impl InferenceWorkload {
    /// Creates a workload with the deployment duration given in 30-day months.
    pub fn from_months(params_billions: f64, queries_per_day: f64, deployment_months: f64) -> Self {
        Self {
            params_billions,
            queries_per_day,
            deployment_days: deployment_months * 30.,
        }
    }

    /// Returns the inference energy over the whole deployment in kWh.
    pub fn energy_kwh(&self) -> f64 {
        self.params_billions * KWH_PER_QUERY_PER_BILLION_PARAMS * self.queries_per_day * self.deployment_days
    }

    fn validate(&self) -> Result<(), InputError> {
        ensure_non_negative("model parameters", self.params_billions)?;
        ensure_non_negative("queries per day", self.queries_per_day)?;
        ensure_non_negative("deployment days", self.deployment_days)?;
        Ok(())
    }
}

impl Default for InferenceWorkload {
    fn default() -> Self {
        Self::from_months(7., 10_000., 12.)
    }
}

/// Training + embodied + inference emissions of a model over its deployment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LifecycleProjection {
    /// Operational emissions of the training run in kg.
    pub training_kg: f64,
    /// Embodied emissions of the training run in kg.
    pub embodied_kg: f64,
    /// Emissions of serving the model in kg.
    pub inference_kg: f64,
    /// Sum of all parts in kg.
    pub total_kg: f64,
}

/// Projects lifecycle emissions, with inference served from a grid of `intensity_g_kwh`.
pub fn lifecycle_emissions(
    operational_kg: f64,
    embodied_kg: f64,
    workload: &InferenceWorkload,
    intensity_g_kwh: f64,
) -> Result<LifecycleProjection, InputError> {
    workload.validate()?;
    let intensity_g_kwh = ensure_non_negative("carbon intensity", intensity_g_kwh)?;
    let inference_kg = workload.energy_kwh() * intensity_g_kwh / 1000.;
    Ok(LifecycleProjection {
        training_kg: operational_kg,
        embodied_kg,
        inference_kg,
        total_kg: operational_kg + embodied_kg + inference_kg,
    })
}
