//! Single estimate-and-decide call composing all models.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use carbon_gate_forecast::forecast::ForecastResult;
use carbon_gate_forecast::region::RegionGrid;
use carbon_gate_forecast::stats::std_dev;
use carbon_gate_models::atmosphere::{lifecycle_emissions, radiative_forcing, InferenceWorkload, LifecycleProjection};
use carbon_gate_models::cooling::{CoolingKind, PueResult, MAX_AMBIENT_C, MIN_AMBIENT_C};
use carbon_gate_models::error::{ensure_finite, ensure_non_negative, ensure_within, InputError};
use carbon_gate_models::gpu::{GpuProfile, REFERENCE_GPU};
use carbon_gate_models::thermal::{ThermalModel, ThrottleResult, MAX_DURATION_H};

use crate::config::EngineConfig;
use crate::diff::CarbonDiff;
use crate::gate::{GateDecision, GateInputs, LegacyStatus};

/// Relative σ assumed for a supplied intensity without its own σ.
pub const SUPPLIED_INTENSITY_UNCERTAINTY: f64 = 0.10;

/// A job to estimate, together with the budget state of its owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobSpec {
    /// GPU model identifier; unknown models use the reference GPU.
    pub gpu: String,
    /// Runtime in hours, at most [`MAX_DURATION_H`].
    pub hours: f64,
    /// Cloud region the job runs in.
    pub region: String,
    /// Outside air temperature at the facility in °C.
    pub ambient_temp_c: f64,
    /// Grid intensity now in g/kWh; the regional estimate is used when absent.
    pub carbon_intensity: Option<f64>,
    /// σ of `carbon_intensity`; 10% of it when absent.
    pub intensity_sigma: Option<f64>,
    /// Hourly intensity samples, most recent last.
    pub intensity_history: Vec<f64>,
    /// Current hour, indexes the static profile of the region. Taken modulo 24.
    pub hour_of_day: usize,
    /// Emissions budget of the month in kg.
    pub monthly_budget_kg: f64,
    /// Emissions already spent this month in kg.
    pub monthly_used_kg: f64,
    /// Emissions of the previous run of this workload.
    pub previous_emissions_kg: Option<f64>,
    /// Cooling of the facility the job is scheduled on.
    pub primary_cooling: CoolingKind,
    /// Whether the job may be moved to the alternative facility.
    pub alternative_available: bool,
    /// Inference deployment of the trained model, for the lifecycle projection.
    pub workload: InferenceWorkload,
}

impl Default for JobSpec {
    fn default() -> Self {
        Self {
            gpu: REFERENCE_GPU.to_string(),
            hours: 1.,
            region: "us-east-1".to_string(),
            ambient_temp_c: 20.,
            carbon_intensity: None,
            intensity_sigma: None,
            intensity_history: Vec::new(),
            hour_of_day: 0,
            monthly_budget_kg: 50.,
            monthly_used_kg: 0.,
            previous_emissions_kg: None,
            primary_cooling: CoolingKind::Air,
            alternative_available: false,
            workload: InferenceWorkload::default(),
        }
    }
}

/// Where the carbon intensity of an estimate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IntensitySource {
    /// Given in the job.
    Supplied,
    /// Static band of the region.
    RegionalFallback,
}

/// Emissions of a job, their uncertainty, and the gate decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmissionsEstimate {
    /// Model of the GPU profile actually used.
    pub gpu: &'static str,
    /// Region of the job.
    pub region: String,
    /// Operational plus embodied emissions in kg CO₂e.
    pub emissions_kg: f64,
    /// 1σ of `emissions_kg`.
    pub emissions_sigma_kg: f64,
    /// Emissions of the electricity drawn.
    pub operational_kg: f64,
    /// Amortized manufacturing emissions.
    pub embodied_kg: f64,
    /// 1σ of `embodied_kg`.
    pub embodied_sigma_kg: f64,
    /// Emissions of the same job at the alternative facility.
    pub alternative_emissions_kg: f64,
    /// PUE of the primary facility.
    pub pue: PueResult,
    /// PUE of the alternative facility.
    pub alternative_pue: PueResult,
    /// Thermal simulation of the run.
    pub throttle: ThrottleResult,
    /// Facility energy (IT energy × PUE) in kWh.
    pub energy_kwh: f64,
    /// Intensity used, in g/kWh.
    pub carbon_intensity: f64,
    /// σ of `carbon_intensity`.
    pub intensity_sigma: f64,
    /// Origin of `carbon_intensity`.
    pub intensity_source: IntensitySource,
    /// Lowest-carbon window ahead.
    pub forecast: ForecastResult,
    /// Standard deviation of the intensity history.
    pub volatility: f64,
    /// Training, embodied and inference emissions over the model's life.
    pub lifecycle: LifecycleProjection,
    /// Forcing added by `emissions_kg`, in W/m².
    pub radiative_forcing_w_m2: f64,
    /// Change since the previous run.
    pub carbon_diff: CarbonDiff,
    /// Budget verdict.
    pub gate: GateDecision,
}

impl EmissionsEstimate {
    /// Ternary status of the gate decision.
    pub fn legacy_status(&self) -> LegacyStatus {
        self.gate.legacy_status
    }
}

/// Estimates jobs under one engine configuration.
pub struct Estimator {
    config: EngineConfig,
}

impl Default for Estimator {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Estimator {
    /// Creates an estimator with the given configuration.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn intensity(&self, job: &JobSpec) -> Result<(f64, f64, IntensitySource), InputError> {
        match job.carbon_intensity {
            Some(intensity) => {
                let intensity = ensure_non_negative("carbon intensity", intensity)?;
                let sigma = match job.intensity_sigma {
                    Some(sigma) => ensure_non_negative("carbon intensity sigma", sigma)?,
                    None => intensity * SUPPLIED_INTENSITY_UNCERTAINTY,
                };
                Ok((intensity, sigma, IntensitySource::Supplied))
            }
            None => {
                let grid = match RegionGrid::find(&job.region) {
                    Some(grid) => *grid,
                    None => {
                        warn!("no grid data for region {}, using generic estimate", job.region);
                        RegionGrid::lookup(&job.region)
                    }
                };
                let (intensity, sigma) = grid.fallback_intensity();
                debug!("{}: regional intensity estimate {:.1} ± {:.1} g/kWh", job.region, intensity, sigma);
                Ok((intensity, sigma, IntensitySource::RegionalFallback))
            }
        }
    }

    /// Estimates the emissions of a job and decides whether it fits the budget.
    ///
    /// Fails only on malformed numbers in the job, including durations above [`MAX_DURATION_H`]
    /// and ambient temperatures outside [`MIN_AMBIENT_C`, `MAX_AMBIENT_C`].
    pub fn estimate(&self, job: &JobSpec) -> Result<EmissionsEstimate, InputError> {
        let hours = ensure_within("job duration", job.hours, 0., MAX_DURATION_H)?;
        let ambient_c = ensure_within("ambient temperature", job.ambient_temp_c, MIN_AMBIENT_C, MAX_AMBIENT_C)?;
        let budget = ensure_non_negative("monthly budget", job.monthly_budget_kg)?;
        let used = ensure_non_negative("monthly usage", job.monthly_used_kg)?;
        let previous = job
            .previous_emissions_kg
            .map(|kg| ensure_finite("previous emissions", kg))
            .transpose()?;
        let (intensity, intensity_sigma, intensity_source) = self.intensity(job)?;

        let profile = GpuProfile::lookup(&job.gpu);
        let pue = job.primary_cooling.pue_model().compute(ambient_c)?;
        let alternative_pue = self.config.alternative_cooling.pue_model().compute(ambient_c)?;
        debug!(
            "PUE at {:.1} °C: {:.3} ± {:.3}, alternative {:.3}",
            ambient_c, pue.pue, pue.sigma, alternative_pue.pue
        );

        let throttle = ThermalModel::for_gpu(profile).simulate(hours, ambient_c)?;
        debug!(
            "{} × {}h: {:.3} kWh drawn, throttled {:.1}%",
            profile.model, hours, throttle.energy_kwh, throttle.throttle_pct
        );
        let energy_kwh = throttle.energy_kwh * pue.pue;
        let operational_kg = energy_kwh * intensity / 1000.;
        let alternative_operational_kg =
            throttle.energy_kwh * alternative_pue.pue * self.config.alternative_intensity / 1000.;

        let embodied = self.config.embodied.compute(profile, hours)?;
        debug!("embodied {:.4} ± {:.4} kg", embodied.embodied_kg, embodied.sigma);

        let emissions_kg = operational_kg + embodied.embodied_kg;
        let alternative_emissions_kg = alternative_operational_kg + embodied.embodied_kg;
        // σ_op = E/1000 × I × sqrt((σ_pue/pue)² + (σ_I/I)²), kept free of the division by I
        let operational_sigma =
            energy_kwh / 1000. * (pue.sigma / pue.pue * intensity).hypot(intensity_sigma);
        let emissions_sigma_kg = operational_sigma.hypot(embodied.sigma);

        let forecast = self.config.forecaster().forecast(
            &job.intensity_history,
            intensity,
            self.config.static_profiles.get(&job.region),
            job.hour_of_day % 24,
        )?;
        debug!(
            "forecast via {:?}: wait {}h, savings {:.1}%, confidence {:.2}",
            forecast.source, forecast.optimal_wait_h, forecast.savings_pct, forecast.confidence
        );

        let lifecycle = lifecycle_emissions(operational_kg, embodied.embodied_kg, &job.workload, intensity)?;
        let radiative_forcing_w_m2 = radiative_forcing(emissions_kg)?;
        let carbon_diff = CarbonDiff::compute(emissions_kg, previous);

        let gate = self.config.gate.decide(&GateInputs {
            emissions_kg,
            sigma_kg: emissions_sigma_kg,
            monthly_budget_kg: budget,
            monthly_used_kg: used,
            forecast: &forecast,
            alternative_kg: job.alternative_available.then_some(alternative_emissions_kg),
        });
        info!(
            "{:.3} ± {:.3} kg, gate {:?}: {}",
            emissions_kg, emissions_sigma_kg, gate.state, gate.message
        );

        Ok(EmissionsEstimate {
            gpu: profile.model,
            region: job.region.clone(),
            emissions_kg,
            emissions_sigma_kg,
            operational_kg,
            embodied_kg: embodied.embodied_kg,
            embodied_sigma_kg: embodied.sigma,
            alternative_emissions_kg,
            pue,
            alternative_pue,
            throttle,
            energy_kwh,
            carbon_intensity: intensity,
            intensity_sigma,
            intensity_source,
            volatility: std_dev(&job.intensity_history),
            forecast,
            lifecycle,
            radiative_forcing_w_m2,
            carbon_diff,
            gate,
        })
    }
}
