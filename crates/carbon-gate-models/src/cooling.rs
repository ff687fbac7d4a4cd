//! Cooling overhead (PUE) derived from the Carnot limit of the facility chillers.
//!
//! ```text
//! COP_carnot = T_cold / (T_hot - T_cold)    [K]
//! COP_actual = η × COP_carnot
//! PUE        = 1 + 1 / COP_actual
//! ```
//!
//! The cold reservoir is either the ambient air or a ground loop held at a fixed temperature.
//! The COP grows as the cold side approaches the hot aisle, so a ground loop only beats air
//! cooling while the air is colder than the ground. At moderate ambient temperatures it has
//! the higher PUE of the two.

use dyn_clone::{clone_trait_object, DynClone};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_within, InputError};

/// Offset between °C and K.
pub const KELVIN_OFFSET: f64 = 273.15;
/// Hot-aisle setpoint in °C.
pub const HOT_AISLE_C: f64 = 35.;
/// Fraction of the Carnot COP reached by real chiller systems.
pub const COOLING_EFFICIENCY: f64 = 0.60;
/// Ground-loop temperature of a geothermal facility in K (about 12 °C year-round).
pub const GROUND_LOOP_K: f64 = 285.;
/// Weather forecast error in °C used for the PUE uncertainty.
pub const WEATHER_UNCERTAINTY_C: f64 = 2.;
/// Coldest accepted ambient temperature in °C. The lower σ evaluation point stays above absolute zero.
pub const MIN_AMBIENT_C: f64 = -KELVIN_OFFSET + WEATHER_UNCERTAINTY_C + 1.;
/// Hottest accepted ambient temperature in °C.
pub const MAX_AMBIENT_C: f64 = 100.;

/// PUE point estimate with its uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PueResult {
    /// Total facility power over IT power, always above 1.
    pub pue: f64,
    /// Standard deviation of the estimate.
    pub sigma: f64,
}

/// Source of the cold reservoir temperature for the chillers.
pub trait CoolingModel: DynClone {
    /// Returns the cold reservoir temperature in K for the given ambient air temperature in °C.
    fn cold_reservoir_k(&self, ambient_c: f64) -> f64;
}

clone_trait_object!(CoolingModel);

/// Chillers rejecting heat to the ambient air.
#[derive(Clone)]
pub struct AirCooling;

impl CoolingModel for AirCooling {
    fn cold_reservoir_k(&self, ambient_c: f64) -> f64 {
        ambient_c + KELVIN_OFFSET
    }
}

/// Chillers rejecting heat to a ground loop with a constant temperature.
#[derive(Clone)]
pub struct GroundLoopCooling {
    ground_k: f64,
}

impl GroundLoopCooling {
    /// Creates a ground loop held at `ground_k` Kelvin.
    pub fn new(ground_k: f64) -> Self {
        Self { ground_k }
    }
}

impl Default for GroundLoopCooling {
    fn default() -> Self {
        Self::new(GROUND_LOOP_K)
    }
}

impl CoolingModel for GroundLoopCooling {
    fn cold_reservoir_k(&self, _ambient_c: f64) -> f64 {
        self.ground_k
    }
}

/// Facility cooling technology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoolingKind {
    /// Conventional air-side heat rejection.
    #[default]
    Air,
    /// Geothermal ground loop.
    GroundLoop,
}

impl CoolingKind {
    /// Builds the reference PUE model for this cooling technology.
    pub fn pue_model(self) -> CarnotPueModel {
        match self {
            CoolingKind::Air => CarnotPueModel::new(Box::new(AirCooling)),
            CoolingKind::GroundLoop => CarnotPueModel::new(Box::new(GroundLoopCooling::default())),
        }
    }
}

/// PUE model based on the Carnot coefficient of performance of the facility chillers.
#[derive(Clone)]
pub struct CarnotPueModel {
    cooling: Box<dyn CoolingModel>,
    hot_k: f64,
    efficiency: f64,
}

impl CarnotPueModel {
    /// Creates a model with the reference hot-aisle setpoint and chiller efficiency.
    pub fn new(cooling: Box<dyn CoolingModel>) -> Self {
        Self::with_params(cooling, HOT_AISLE_C, COOLING_EFFICIENCY)
    }

    /// Creates a model with explicit parameters.
    ///
    /// * `hot_aisle_c` - Hot-aisle setpoint in °C.
    /// * `efficiency` - Fraction of the Carnot COP reached by the chillers (0-1].
    pub fn with_params(cooling: Box<dyn CoolingModel>, hot_aisle_c: f64, efficiency: f64) -> Self {
        Self {
            cooling,
            hot_k: hot_aisle_c + KELVIN_OFFSET,
            efficiency,
        }
    }

    /// Returns PUE for a given cold reservoir temperature in K.
    ///
    /// The cold side is clamped to 1 K below the hot aisle, so the result stays finite.
    pub fn pue_at(&self, cold_k: f64) -> f64 {
        let cold_k = cold_k.min(self.hot_k - 1.);
        let cop_carnot = cold_k / (self.hot_k - cold_k);
        1. + 1. / (self.efficiency * cop_carnot)
    }

    /// Computes PUE and its σ at the given ambient temperature.
    ///
    /// σ is half the spread of PUE evaluated at ±[`WEATHER_UNCERTAINTY_C`] around the cold reservoir.
    /// Ambient temperatures below [`MIN_AMBIENT_C`] or above [`MAX_AMBIENT_C`] are rejected.
    pub fn compute(&self, ambient_c: f64) -> Result<PueResult, InputError> {
        let ambient_c = ensure_within("ambient temperature", ambient_c, MIN_AMBIENT_C, MAX_AMBIENT_C)?;
        let cold_k = self.cooling.cold_reservoir_k(ambient_c);
        let pue = self.pue_at(cold_k);
        let pue_hi = self.pue_at(cold_k + WEATHER_UNCERTAINTY_C);
        let pue_lo = self.pue_at(cold_k - WEATHER_UNCERTAINTY_C);
        Ok(PueResult {
            pue,
            sigma: (pue_hi - pue_lo).abs() / 2.,
        })
    }
}
