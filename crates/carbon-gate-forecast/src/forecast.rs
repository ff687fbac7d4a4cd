//! Lowest-carbon window forecasting.

use carbon_gate_models::error::{ensure_finite, ensure_non_negative, InputError};
use log::{debug, warn};
use serde::Serialize;

use crate::harmonic::{HarmonicBasis, HarmonicFit, R2Breakdown};
use crate::profile::DailyProfile;
use crate::stats::std_dev;

/// Default forecast window in hours.
pub const DEFAULT_LOOKAHEAD_H: usize = 48;
/// Default number of daily harmonic pairs.
pub const DEFAULT_DAILY_HARMONICS: usize = 5;
/// Default number of weekly harmonic pairs.
pub const DEFAULT_WEEKLY_HARMONICS: usize = 2;
/// Shortest history (two days of hourly samples) the harmonic fit is attempted on.
pub const MIN_HISTORY_SAMPLES: usize = 48;
/// Fixed confidence of a static-profile forecast.
pub const STATIC_PROFILE_CONFIDENCE: f64 = 0.70;

// Calibrated on typical regional σ: ~20 g/kWh for Nordic hydro, ~100 g/kWh for PJM.
const VOLATILITY_CEILING: f64 = 100.;
const VOLATILITY_WEIGHT: f64 = 0.40;
const FLAT_FORECAST_CONFIDENCE: f64 = 0.5;

/// Estimation path that produced a forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastSource {
    /// Harmonic fit with daily terms only.
    SpectralDaily,
    /// Harmonic fit with daily and weekly terms.
    SpectralWeekly,
    /// Static hour-of-day profile of the region.
    StaticProfile,
    /// Neither enough history nor a profile; not a usable forecast.
    InsufficientData,
}

impl ForecastSource {
    /// Whether the forecast carries a prediction.
    pub fn is_usable(&self) -> bool {
        *self != ForecastSource::InsufficientData
    }
}

/// Confidence bucket shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    /// 0.75 and above.
    High,
    /// 0.50 up to 0.75.
    Moderate,
    /// 0.25 up to 0.50.
    Low,
    /// Below 0.25.
    VeryLow,
}

impl ConfidenceLevel {
    /// Buckets a 0-1 confidence.
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= 0.75 {
            ConfidenceLevel::High
        } else if confidence >= 0.50 {
            ConfidenceLevel::Moderate
        } else if confidence >= 0.25 {
            ConfidenceLevel::Low
        } else {
            ConfidenceLevel::VeryLow
        }
    }

    /// Human-readable name used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Moderate => "moderate",
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::VeryLow => "very low",
        }
    }
}

/// Fit quality figures of a spectral forecast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectralDiagnostics {
    /// Explained variance of the fit.
    pub r2: R2Breakdown,
    /// Number of fitted coefficients, including the constant.
    pub n_coefficients: usize,
    /// In-sample residual σ in g/kWh.
    pub residual_std: f64,
    /// Confidence before the volatility discount.
    pub base_confidence: f64,
    /// Standard deviation of the raw history.
    pub volatility: f64,
    /// Multiplier applied to the base confidence, 0.6-1.
    pub volatility_discount: f64,
    /// Max minus min of the predicted intensities.
    pub forecast_range: f64,
}

/// Lowest-carbon window within the lookahead and how far to trust it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastResult {
    /// Hours to wait for the lowest predicted intensity.
    pub optimal_wait_h: usize,
    /// Trust in the forecast, 0-1.
    pub confidence: f64,
    /// Bucketed `confidence`.
    pub confidence_level: ConfidenceLevel,
    /// Reduction of intensity versus now, in percent, never negative.
    pub savings_pct: f64,
    /// Path that produced the forecast.
    pub source: ForecastSource,
    /// Lowest predicted intensity in g/kWh.
    pub min_intensity: Option<f64>,
    /// Fit figures, present on the spectral paths only.
    pub diagnostics: Option<SpectralDiagnostics>,
}

impl ForecastResult {
    /// Result when no forecast could be made: no wait, no savings, zero confidence.
    pub fn insufficient_data() -> Self {
        Self {
            optimal_wait_h: 0,
            confidence: 0.,
            confidence_level: ConfidenceLevel::VeryLow,
            savings_pct: 0.,
            source: ForecastSource::InsufficientData,
            min_intensity: None,
            diagnostics: None,
        }
    }
}

fn savings_pct(current: f64, min: f64) -> f64 {
    if current <= 0. {
        return 0.;
    }
    ((current - min) / current * 100.).max(0.)
}

/// Predicts the cheapest hour within a lookahead window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Forecaster {
    lookahead_h: usize,
    daily_harmonics: usize,
    weekly_harmonics: usize,
}

impl Default for Forecaster {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKAHEAD_H, DEFAULT_DAILY_HARMONICS, DEFAULT_WEEKLY_HARMONICS)
    }
}

impl Forecaster {
    /// Creates a forecaster. A zero lookahead is treated as one hour.
    pub fn new(lookahead_h: usize, daily_harmonics: usize, weekly_harmonics: usize) -> Self {
        Self {
            lookahead_h: lookahead_h.max(1),
            daily_harmonics,
            weekly_harmonics,
        }
    }

    /// Forecast window in hours.
    pub fn lookahead_h(&self) -> usize {
        self.lookahead_h
    }

    /// Forecasts the lowest-carbon window.
    ///
    /// * `history` - Hourly intensity samples in g/kWh, most recent last.
    /// * `current_intensity` - Intensity now in g/kWh, the reference for savings.
    /// * `profile` - Static profile of the region, used when the history is too short.
    /// * `hour_of_day` - Current hour (0-23), used to index the static profile.
    pub fn forecast(
        &self,
        history: &[f64],
        current_intensity: f64,
        profile: Option<&DailyProfile>,
        hour_of_day: usize,
    ) -> Result<ForecastResult, InputError> {
        let current_intensity = ensure_non_negative("current carbon intensity", current_intensity)?;
        for &sample in history {
            ensure_finite("intensity history sample", sample)?;
        }

        if history.len() >= MIN_HISTORY_SAMPLES {
            if let Some(result) = self.spectral(history, current_intensity) {
                return Ok(result);
            }
            warn!("harmonic fit of {} samples is singular, falling back", history.len());
        }

        match profile {
            Some(profile) => {
                debug!("history of {} samples, using static profile", history.len());
                Ok(self.from_profile(profile, hour_of_day, current_intensity))
            }
            None => {
                warn!("history of {} samples and no static profile: insufficient data", history.len());
                Ok(ForecastResult::insufficient_data())
            }
        }
    }

    fn from_profile(&self, profile: &DailyProfile, hour_of_day: usize, current: f64) -> ForecastResult {
        let (wait, min) = profile.min_within(hour_of_day, self.lookahead_h);
        ForecastResult {
            optimal_wait_h: wait,
            confidence: STATIC_PROFILE_CONFIDENCE,
            confidence_level: ConfidenceLevel::from_confidence(STATIC_PROFILE_CONFIDENCE),
            savings_pct: savings_pct(current, min),
            source: ForecastSource::StaticProfile,
            min_intensity: Some(min),
            diagnostics: None,
        }
    }

    fn spectral(&self, history: &[f64], current: f64) -> Option<ForecastResult> {
        let n = history.len();
        let basis = HarmonicBasis::for_history(n, self.daily_harmonics, self.weekly_harmonics);
        let fit = HarmonicFit::fit(history, basis)?;

        let predicted: Vec<f64> = (n..n + self.lookahead_h).map(|t| fit.predict(t as f64)).collect();
        let (wait, min) = predicted
            .iter()
            .copied()
            .enumerate()
            .fold((0, f64::INFINITY), |best, (i, v)| if v < best.1 { (i, v) } else { best });
        let max = predicted.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let forecast_range = max - min;

        let base_confidence = if forecast_range > 0. {
            (1. - fit.residual_std() / forecast_range).clamp(0., 1.)
        } else {
            FLAT_FORECAST_CONFIDENCE
        };
        let volatility = std_dev(history);
        let volatility_discount = VOLATILITY_WEIGHT * (volatility / VOLATILITY_CEILING).min(1.);
        let confidence = (base_confidence * (1. - volatility_discount)).clamp(0., 1.);

        let source = if basis.has_weekly() {
            ForecastSource::SpectralWeekly
        } else {
            ForecastSource::SpectralDaily
        };
        debug!(
            "{:?} fit: r2 = {:.3}, residual σ = {:.2}, wait {}h to {:.1} g/kWh, confidence {:.3}",
            source,
            fit.r2().total,
            fit.residual_std(),
            wait,
            min,
            confidence
        );

        Some(ForecastResult {
            optimal_wait_h: wait,
            confidence,
            confidence_level: ConfidenceLevel::from_confidence(confidence),
            savings_pct: savings_pct(current, min),
            source,
            min_intensity: Some(min),
            diagnostics: Some(SpectralDiagnostics {
                r2: fit.r2(),
                n_coefficients: fit.coefficients().len(),
                residual_std: fit.residual_std(),
                base_confidence,
                volatility,
                volatility_discount,
                forecast_range,
            }),
        })
    }
}
