//! Engine configuration and its YAML form.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use carbon_gate_forecast::forecast::{
    Forecaster, DEFAULT_DAILY_HARMONICS, DEFAULT_LOOKAHEAD_H, DEFAULT_WEEKLY_HARMONICS,
};
use carbon_gate_forecast::profile::{DailyProfile, StaticProfiles};
use carbon_gate_models::cooling::CoolingKind;
use carbon_gate_models::embodied::{EmbodiedCarbonModel, GPU_LIFETIME_HOURS, GPU_UTILIZATION_RATE};

use crate::estimate::JobSpec;
use crate::gate::{
    GatePolicy, DEFAULT_REROUTE_COST_DELTA, DEFAULT_SOFT_BLOCK_THRESHOLD, DEFAULT_WAIT_MIN_SAVINGS_PCT,
    DEFAULT_WARN_THRESHOLD,
};

/// Carbon intensity of the alternative (geothermal) facility in g/kWh.
pub const ALTERNATIVE_INTENSITY_G_KWH: f64 = 50.;

/// Daily harmonics must stay below the Nyquist limit of hourly sampling.
const MAX_DAILY_HARMONICS: usize = 11;
/// The 7th weekly harmonic coincides with the first daily one.
const MAX_WEEKLY_HARMONICS: usize = 6;

/// Failure to load or validate a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    /// The YAML is malformed or has the wrong shape.
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// A static profile does not have one value per hour.
    #[error("static profile of {region} has {len} values, expected 24")]
    ProfileLength {
        /// Region the profile belongs to.
        region: String,
        /// Number of values given.
        len: usize,
    },
    /// A numeric setting is outside its valid range.
    #[error("{name} is out of range: {value}")]
    OutOfRange {
        /// Name of the setting.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// More harmonics were requested than hourly sampling can resolve.
    #[error("{name} = {value} exceeds the maximum of {max}")]
    TooManyHarmonics {
        /// Name of the setting.
        name: &'static str,
        /// Requested count.
        value: usize,
        /// Largest allowed count.
        max: usize,
    },
}

/// YAML-serializable config
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawConfig {
    /// Overage fraction up to which the gate only warns.
    #[serde(default)]
    pub warn_threshold: Option<f64>,
    /// Overage fraction up to which the block can be overridden.
    #[serde(default)]
    pub soft_block_threshold: Option<f64>,
    /// Savings in percent a wait must exceed to be offered.
    #[serde(default)]
    pub wait_min_savings_pct: Option<f64>,
    /// Cost multiplier reported for rerouting.
    #[serde(default)]
    pub reroute_cost_delta: Option<f64>,
    /// Forecast window in hours.
    #[serde(default)]
    pub lookahead_h: Option<usize>,
    /// Daily harmonic pairs of the spectral fit.
    #[serde(default)]
    pub daily_harmonics: Option<usize>,
    /// Weekly harmonic pairs of the spectral fit.
    #[serde(default)]
    pub weekly_harmonics: Option<usize>,
    /// Intensity of the alternative facility in g/kWh.
    #[serde(default)]
    pub alternative_intensity: Option<f64>,
    /// Cooling of the alternative facility.
    #[serde(default)]
    pub alternative_cooling: Option<CoolingKind>,
    /// Service life of a GPU in hours.
    #[serde(default)]
    pub gpu_lifetime_hours: Option<f64>,
    /// Average utilization over the GPU's life, in (0, 1].
    #[serde(default)]
    pub gpu_utilization: Option<f64>,
    /// 24 hourly values per region.
    #[serde(default)]
    pub static_profiles: HashMap<String, Vec<f64>>,
}

/// Engine configuration. `Default` holds the reference constants, so you can create the default
/// config and change only the fields you need.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Thresholds and option rules of the gate.
    pub gate: GatePolicy,
    /// Forecast window in hours, at least 1.
    pub lookahead_h: usize,
    /// Daily harmonic pairs, at most 11.
    pub daily_harmonics: usize,
    /// Weekly harmonic pairs, at most 6.
    pub weekly_harmonics: usize,
    /// Carbon intensity of the alternative facility in g/kWh.
    pub alternative_intensity: f64,
    /// Cooling of the alternative facility.
    pub alternative_cooling: CoolingKind,
    /// Amortization of manufacturing emissions.
    pub embodied: EmbodiedCarbonModel,
    /// Hour-of-day profiles keyed by region.
    pub static_profiles: StaticProfiles,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gate: GatePolicy::default(),
            lookahead_h: DEFAULT_LOOKAHEAD_H,
            daily_harmonics: DEFAULT_DAILY_HARMONICS,
            weekly_harmonics: DEFAULT_WEEKLY_HARMONICS,
            alternative_intensity: ALTERNATIVE_INTENSITY_G_KWH,
            alternative_cooling: CoolingKind::GroundLoop,
            embodied: EmbodiedCarbonModel::default(),
            static_profiles: StaticProfiles::new(),
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0. {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0. {
        Ok(value)
    } else {
        Err(ConfigError::OutOfRange { name, value })
    }
}

fn harmonics(name: &'static str, value: usize, max: usize) -> Result<usize, ConfigError> {
    if value > max {
        return Err(ConfigError::TooManyHarmonics { name, value, max });
    }
    Ok(value)
}

impl EngineConfig {
    /// Fills unset fields with the reference constants and validates the result.
    pub fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let warn_threshold = positive("warn_threshold", raw.warn_threshold.unwrap_or(DEFAULT_WARN_THRESHOLD))?;
        let soft_block_threshold = positive(
            "soft_block_threshold",
            raw.soft_block_threshold.unwrap_or(DEFAULT_SOFT_BLOCK_THRESHOLD),
        )?;
        if soft_block_threshold < warn_threshold {
            return Err(ConfigError::OutOfRange {
                name: "soft_block_threshold",
                value: soft_block_threshold,
            });
        }
        let gate = GatePolicy {
            warn_threshold,
            soft_block_threshold,
            wait_min_savings_pct: non_negative(
                "wait_min_savings_pct",
                raw.wait_min_savings_pct.unwrap_or(DEFAULT_WAIT_MIN_SAVINGS_PCT),
            )?,
            reroute_cost_delta: non_negative(
                "reroute_cost_delta",
                raw.reroute_cost_delta.unwrap_or(DEFAULT_REROUTE_COST_DELTA),
            )?,
        };

        let lookahead_h = raw.lookahead_h.unwrap_or(DEFAULT_LOOKAHEAD_H);
        if lookahead_h == 0 {
            return Err(ConfigError::OutOfRange {
                name: "lookahead_h",
                value: 0.,
            });
        }

        let utilization = positive("gpu_utilization", raw.gpu_utilization.unwrap_or(GPU_UTILIZATION_RATE))?;
        if utilization > 1. {
            return Err(ConfigError::OutOfRange {
                name: "gpu_utilization",
                value: utilization,
            });
        }
        let embodied = EmbodiedCarbonModel::new(
            positive("gpu_lifetime_hours", raw.gpu_lifetime_hours.unwrap_or(GPU_LIFETIME_HOURS))?,
            utilization,
        );

        let mut static_profiles = StaticProfiles::new();
        for (region, values) in raw.static_profiles {
            for &value in &values {
                non_negative("static profile value", value)?;
            }
            let profile = DailyProfile::from_slice(&values).ok_or_else(|| ConfigError::ProfileLength {
                region: region.clone(),
                len: values.len(),
            })?;
            static_profiles.insert(&region, profile);
        }

        Ok(Self {
            gate,
            lookahead_h,
            daily_harmonics: harmonics(
                "daily_harmonics",
                raw.daily_harmonics.unwrap_or(DEFAULT_DAILY_HARMONICS),
                MAX_DAILY_HARMONICS,
            )?,
            weekly_harmonics: harmonics(
                "weekly_harmonics",
                raw.weekly_harmonics.unwrap_or(DEFAULT_WEEKLY_HARMONICS),
                MAX_WEEKLY_HARMONICS,
            )?,
            alternative_intensity: non_negative(
                "alternative_intensity",
                raw.alternative_intensity.unwrap_or(ALTERNATIVE_INTENSITY_G_KWH),
            )?,
            alternative_cooling: raw.alternative_cooling.unwrap_or(CoolingKind::GroundLoop),
            embodied,
            static_profiles,
        })
    }

    /// Reads a [`RawConfig`] from a YAML file and validates it.
    pub fn from_yaml(path: &Path) -> Result<Self, ConfigError> {
        let f = File::open(path)?;
        Self::from_raw(serde_yaml::from_reader(f)?)
    }

    /// Returns the forecaster configured by these settings.
    pub fn forecaster(&self) -> Forecaster {
        Forecaster::new(self.lookahead_h, self.daily_harmonics, self.weekly_harmonics)
    }
}

/// Contents of a gate file: a job and optional engine settings under the `carbon-gate` key.
#[derive(Debug, Clone, Deserialize)]
pub struct GateFile {
    /// Everything under the `carbon-gate` key.
    #[serde(rename = "carbon-gate")]
    pub carbon_gate: GateSection,
}

/// Body of a gate file.
#[derive(Debug, Clone, Deserialize)]
pub struct GateSection {
    /// Job to estimate.
    pub job: JobSpec,
    /// Engine overrides; defaults apply when absent.
    #[serde(default)]
    pub engine: RawConfig,
}

impl GateFile {
    /// Reads a gate file from disk.
    pub fn from_yaml(path: &Path) -> Result<Self, ConfigError> {
        let f = File::open(path)?;
        Ok(serde_yaml::from_reader(f)?)
    }

    /// Parses a gate file from a YAML string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Splits the file into the job and the validated engine config.
    pub fn into_parts(self) -> Result<(JobSpec, EngineConfig), ConfigError> {
        let GateSection { job, engine } = self.carbon_gate;
        Ok((job, EngineConfig::from_raw(engine)?))
    }
}
