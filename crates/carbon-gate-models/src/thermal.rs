//! GPU thermal throttling.
//!
//! Delivered power depends on the junction temperature, and the junction temperature relaxes
//! towards a steady state that depends on the delivered power:
//!
//! ```text
//! P(Tj)    = P_tdp × (1 - α × clamp((Tj - T_threshold) / T_range, 0, 1))
//! dTj / dt = (T_ambient + P(Tj) × R_thermal - Tj) / τ
//! ```
//!
//! The system is integrated with classic fixed-step RK4 together with the consumed energy
//! `dE / dt = P(Tj)`. Long high-load runs with marginal cooling end up 10-15% below the naive
//! `TDP × hours` estimate.

use dyn_clone::{clone_trait_object, DynClone};
use serde::Serialize;

use crate::error::{ensure_finite, ensure_within, InputError};
use crate::gpu::GpuProfile;

/// Thermal time constant of a 2U server chassis in seconds.
pub const THERMAL_TIME_CONSTANT_S: f64 = 60.;
/// Nominal integration step in seconds.
pub const STEP_S: f64 = 30.;
/// Minimum number of integration steps regardless of the job length.
pub const MIN_STEPS: usize = 200;
/// Longest accepted job in hours (about 11 years), which bounds the integration to 12M steps.
pub const MAX_DURATION_H: f64 = 100_000.;

const JOULES_PER_KWH: f64 = 3_600_000.;

/// Model of GPU power draw as a function of the junction temperature.
pub trait GpuPowerModel: DynClone {
    /// Returns power draw in W at the given junction temperature in °C.
    fn get_power(&self, junction_temp_c: f64) -> f64;
}

clone_trait_object!(GpuPowerModel);

/// GPU drawing a constant power regardless of temperature.
#[derive(Clone)]
pub struct ConstantGpuPowerModel {
    power: f64,
}

impl ConstantGpuPowerModel {
    /// Creates a model drawing `power` W.
    pub fn new(power: f64) -> Self {
        Self { power }
    }
}

impl GpuPowerModel for ConstantGpuPowerModel {
    fn get_power(&self, _junction_temp_c: f64) -> f64 {
        self.power
    }
}

/// GPU shedding up to a fixed fraction of its TDP as the junction heats past a threshold.
#[derive(Clone)]
pub struct ThrottlingGpuPowerModel {
    tdp: f64,
    threshold: f64,
    range: f64,
    max_fraction: f64,
}

impl ThrottlingGpuPowerModel {
    /// Creates a throttling model.
    ///
    /// * `tdp` - Power draw in W below the threshold.
    /// * `threshold` - Junction temperature in °C where throttling starts.
    /// * `range` - Temperature span in °C until throttling saturates.
    /// * `max_fraction` - Fraction of TDP shed at saturation.
    pub fn new(tdp: f64, threshold: f64, range: f64, max_fraction: f64) -> Self {
        Self {
            tdp,
            threshold,
            range,
            max_fraction,
        }
    }

    /// Creates the model for a reference GPU profile.
    pub fn from_profile(profile: &GpuProfile) -> Self {
        Self::new(
            profile.tdp_w,
            profile.throttle.threshold_c,
            profile.throttle.range_c,
            profile.throttle.max_fraction,
        )
    }
}

impl GpuPowerModel for ThrottlingGpuPowerModel {
    fn get_power(&self, junction_temp_c: f64) -> f64 {
        let level = ((junction_temp_c - self.threshold) / self.range).clamp(0., 1.);
        self.tdp * (1. - self.max_fraction * level)
    }
}

/// Energy drawn over a job and the share removed by throttling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ThrottleResult {
    /// IT energy drawn by the GPU in kWh.
    pub energy_kwh: f64,
    /// Reduction relative to running at TDP for the whole job, in percent.
    pub throttle_pct: f64,
}

/// First-order thermal lag between a GPU and its cooling solution.
#[derive(Clone)]
pub struct ThermalModel {
    power_model: Box<dyn GpuPowerModel>,
    nominal_power: f64,
    thermal_resistance: f64,
    time_constant: f64,
}

impl ThermalModel {
    /// Creates a thermal model.
    ///
    /// * `power_model` - Temperature-dependent power draw.
    /// * `nominal_power` - Power in W used for the non-throttled baseline.
    /// * `thermal_resistance` - Steady-state thermal resistance in °C/W.
    pub fn new(power_model: Box<dyn GpuPowerModel>, nominal_power: f64, thermal_resistance: f64) -> Self {
        Self {
            power_model,
            nominal_power,
            thermal_resistance,
            time_constant: THERMAL_TIME_CONSTANT_S,
        }
    }

    /// Creates the thermal model of a reference GPU profile.
    pub fn for_gpu(profile: &GpuProfile) -> Self {
        Self::new(
            Box::new(ThrottlingGpuPowerModel::from_profile(profile)),
            profile.tdp_w,
            profile.throttle.thermal_resistance,
        )
    }

    /// Returns `(dTj/dt, P)` at the given junction temperature.
    fn derivative(&self, junction_c: f64, ambient_c: f64) -> (f64, f64) {
        let power = self.power_model.get_power(junction_c);
        let steady_state = ambient_c + power * self.thermal_resistance;
        ((steady_state - junction_c) / self.time_constant, power)
    }

    /// Returns the number of RK4 steps used for a job of the given length in seconds.
    pub fn steps_for(duration_s: f64) -> usize {
        ((duration_s / STEP_S).ceil() as usize).max(MIN_STEPS)
    }

    /// Integrates the junction temperature over a job starting at ambient temperature and returns
    /// the consumed energy. Jobs longer than [`MAX_DURATION_H`] are rejected.
    pub fn simulate(&self, hours: f64, ambient_c: f64) -> Result<ThrottleResult, InputError> {
        let hours = ensure_within("job duration", hours, 0., MAX_DURATION_H)?;
        let ambient_c = ensure_finite("ambient temperature", ambient_c)?;

        let duration = hours * 3600.;
        let steps = Self::steps_for(duration);
        let dt = duration / steps as f64;

        let mut junction = ambient_c;
        let mut energy_j = 0.;
        for _ in 0..steps {
            let (k1, p1) = self.derivative(junction, ambient_c);
            let (k2, p2) = self.derivative(junction + 0.5 * dt * k1, ambient_c);
            let (k3, p3) = self.derivative(junction + 0.5 * dt * k2, ambient_c);
            let (k4, p4) = self.derivative(junction + dt * k3, ambient_c);
            junction += dt / 6. * (k1 + 2. * k2 + 2. * k3 + k4);
            energy_j += dt / 6. * (p1 + 2. * p2 + 2. * p3 + p4);
        }

        let energy_kwh = energy_j / JOULES_PER_KWH;
        let naive_kwh = self.nominal_power * hours / 1000.;
        let throttle_pct = if naive_kwh > 0. {
            ((1. - energy_kwh / naive_kwh) * 100.).max(0.)
        } else {
            0.
        };
        Ok(ThrottleResult {
            energy_kwh,
            throttle_pct,
        })
    }
}
