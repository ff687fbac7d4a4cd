use std::f64::consts::PI;

use approx::assert_abs_diff_eq;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_pcg::Pcg64;

use carbon_gate_forecast::forecast::{
    ConfidenceLevel, ForecastSource, Forecaster, MIN_HISTORY_SAMPLES, STATIC_PROFILE_CONFIDENCE,
};
use carbon_gate_forecast::harmonic::{HarmonicBasis, HarmonicFit, WEEKLY_MIN_SAMPLES};
use carbon_gate_forecast::profile::{DailyProfile, StaticProfiles};
use carbon_gate_forecast::region::{RegionGrid, UNKNOWN_REGION};

fn daily_sine(len: usize, mean: f64, amplitude: f64) -> Vec<f64> {
    (0..len)
        .map(|t| mean + amplitude * (2. * PI * t as f64 / 24.).sin())
        .collect()
}

/// Daily and weekly cycles plus gaussian noise, reproducible by seed.
fn noisy_grid(len: usize, noise: f64, seed: u64) -> Vec<f64> {
    let mut rng = Pcg64::seed_from_u64(seed);
    let normal = Normal::new(0., noise).unwrap();
    (0..len)
        .map(|t| {
            let t = t as f64;
            350. + 80. * (2. * PI * t / 24.).sin() + 30. * (2. * PI * t / 168.).sin() + normal.sample(&mut rng)
        })
        .collect()
}

fn stepped_profile() -> DailyProfile {
    let mut values = [0.; 24];
    for (h, v) in values.iter_mut().enumerate() {
        *v = 300. + 10. * h as f64;
    }
    values[3] = 100.;
    DailyProfile::new(values)
}

#[test]
fn test_short_history_uses_static_profile() {
    let profile = stepped_profile();
    let history = daily_sine(MIN_HISTORY_SAMPLES - 1, 300., 50.);
    let result = Forecaster::default().forecast(&history, 400., Some(&profile), 20).unwrap();
    assert_eq!(result.source, ForecastSource::StaticProfile);
    assert_eq!(result.confidence, STATIC_PROFILE_CONFIDENCE);
    assert_eq!(result.confidence_level, ConfidenceLevel::Moderate);
    // 20:00 -> 03:00 wraps past midnight
    assert_eq!(result.optimal_wait_h, 7);
    assert_abs_diff_eq!(result.savings_pct, 75., epsilon = 1e-9);
    assert_eq!(result.min_intensity, Some(100.));
    assert!(result.diagnostics.is_none());
}

#[test]
fn test_static_profile_respects_lookahead() {
    let profile = stepped_profile();
    let forecaster = Forecaster::new(4, 5, 2);
    let result = forecaster.forecast(&[], 400., Some(&profile), 20).unwrap();
    // 03:00 is 7 hours away, out of reach: the cheapest reachable hour is now
    assert_eq!(result.optimal_wait_h, 0);
    assert_eq!(result.min_intensity, Some(500.));
    assert_eq!(result.savings_pct, 0.);
}

#[test]
fn test_no_history_no_profile_is_insufficient() {
    let result = Forecaster::default().forecast(&[350.; 10], 400., None, 0).unwrap();
    assert_eq!(result.source, ForecastSource::InsufficientData);
    assert!(!result.source.is_usable());
    assert_eq!(result.confidence, 0.);
    assert_eq!(result.optimal_wait_h, 0);
    assert_eq!(result.savings_pct, 0.);
}

#[test]
fn test_pure_daily_cycle() {
    let history = daily_sine(72, 300., 100.);
    let result = Forecaster::default().forecast(&history, 300., None, 0).unwrap();
    assert_eq!(result.source, ForecastSource::SpectralDaily);
    // the sine bottoms out at 18:00
    assert_eq!(result.optimal_wait_h % 24, 18);
    assert_abs_diff_eq!(result.min_intensity.unwrap(), 200., epsilon = 1e-6);
    assert_abs_diff_eq!(result.savings_pct, 100. / 3., epsilon = 1e-6);

    let diagnostics = result.diagnostics.unwrap();
    assert_eq!(diagnostics.n_coefficients, 11);
    assert!(diagnostics.residual_std < 1e-6);
    assert_abs_diff_eq!(diagnostics.r2.total, 1., epsilon = 1e-9);
    assert_eq!(diagnostics.r2.weekly, 0.);
    assert_abs_diff_eq!(diagnostics.base_confidence, 1., epsilon = 1e-6);
    // σ of the sine is 100/√2
    assert_abs_diff_eq!(diagnostics.volatility_discount, 0.4 * 100. / 2f64.sqrt() / 100., epsilon = 1e-9);
    assert_abs_diff_eq!(result.confidence, 1. - 0.4 / 2f64.sqrt(), epsilon = 1e-6);
}

#[test]
fn test_weekly_terms_engage_with_two_weeks_of_history() {
    let short = noisy_grid(WEEKLY_MIN_SAMPLES - 1, 15., 42);
    let result = Forecaster::default().forecast(&short, 420., None, 0).unwrap();
    assert_eq!(result.source, ForecastSource::SpectralDaily);
    assert_eq!(result.diagnostics.unwrap().n_coefficients, 11);

    let long = noisy_grid(WEEKLY_MIN_SAMPLES, 15., 42);
    let result = Forecaster::default().forecast(&long, 420., None, 0).unwrap();
    assert_eq!(result.source, ForecastSource::SpectralWeekly);
    let diagnostics = result.diagnostics.unwrap();
    assert_eq!(diagnostics.n_coefficients, 15);
    assert!(diagnostics.r2.weekly > 0.);
    assert!(diagnostics.r2.daily > diagnostics.r2.weekly);
    assert!(diagnostics.r2.total >= diagnostics.r2.daily);
}

#[test]
fn test_noisy_forecast_is_bounded() {
    let history = noisy_grid(2160, 15., 7);
    let forecaster = Forecaster::default();
    let result = forecaster.forecast(&history, 420., None, 0).unwrap();
    assert!(result.optimal_wait_h < forecaster.lookahead_h());
    assert!((0. ..=1.).contains(&result.confidence));
    assert!(result.savings_pct >= 0.);
    assert_eq!(result.confidence_level, ConfidenceLevel::from_confidence(result.confidence));
    assert!(result.savings_pct > 10.);
}

#[test]
fn test_savings_never_negative() {
    let history = daily_sine(96, 300., 100.);
    let result = Forecaster::default().forecast(&history, 150., None, 0).unwrap();
    assert_eq!(result.savings_pct, 0.);
    let result = Forecaster::default().forecast(&history, 0., None, 0).unwrap();
    assert_eq!(result.savings_pct, 0.);
}

#[test]
fn test_volatile_grid_is_less_trusted() {
    let stable = Forecaster::default().forecast(&daily_sine(96, 300., 10.), 300., None, 0).unwrap();
    let volatile = Forecaster::default().forecast(&daily_sine(96, 300., 150.), 300., None, 0).unwrap();
    assert!(stable.confidence > volatile.confidence);
    // the discount is capped at 40%
    assert_abs_diff_eq!(volatile.diagnostics.unwrap().volatility_discount, 0.4, epsilon = 1e-12);
}

#[test]
fn test_flat_history() {
    let result = Forecaster::default().forecast(&[250.; 100], 250., None, 0).unwrap();
    assert_eq!(result.source, ForecastSource::SpectralDaily);
    assert_abs_diff_eq!(result.min_intensity.unwrap(), 250., epsilon = 1e-6);
    assert!(result.savings_pct < 1e-6);
    assert!((0. ..=1.).contains(&result.confidence));
}

#[test]
fn test_forecast_is_deterministic() {
    let history = noisy_grid(500, 20., 3);
    let profile = stepped_profile();
    let a = Forecaster::default().forecast(&history, 400., Some(&profile), 5).unwrap();
    let b = Forecaster::default().forecast(&history, 400., Some(&profile), 5).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_malformed_history_is_rejected() {
    let mut history = daily_sine(60, 300., 50.);
    history[10] = f64::NAN;
    assert!(Forecaster::default().forecast(&history, 300., None, 0).is_err());
    assert!(Forecaster::default().forecast(&[], -1., None, 0).is_err());
}

#[test]
fn test_harmonic_fit_extrapolates() {
    let history = daily_sine(48, 200., 40.);
    let fit = HarmonicFit::fit(&history, HarmonicBasis::new(1, 0)).unwrap();
    assert_eq!(fit.coefficients().len(), 3);
    for t in 48..96 {
        let expected = 200. + 40. * (2. * PI * t as f64 / 24.).sin();
        assert_abs_diff_eq!(fit.predict(t as f64), expected, epsilon = 1e-6);
    }
    assert!(HarmonicFit::fit(&history[..2], HarmonicBasis::new(1, 0)).is_none());
}

#[test]
fn test_basis_for_history() {
    assert_eq!(HarmonicBasis::for_history(100, 5, 2), HarmonicBasis::new(5, 0));
    assert_eq!(HarmonicBasis::for_history(336, 5, 2), HarmonicBasis::new(5, 2));
    assert_eq!(HarmonicBasis::new(5, 2).n_columns(), 15);
    assert_eq!(HarmonicBasis::new(5, 2).evaluate(0.)[..3], [1., 1., 0.]);
}

#[test]
fn test_profile_registry() {
    let mut profiles = StaticProfiles::new();
    assert!(profiles.is_empty());
    profiles.insert("eu-north-1", stepped_profile());
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles.get("eu-north-1").unwrap().at(27), 100.);
    assert!(profiles.get("us-east-1").is_none());
    assert!(DailyProfile::from_slice(&[1.; 23]).is_none());
    assert!(DailyProfile::from_slice(&[1.; 24]).is_some());
}

#[test]
fn test_regional_fallback_intensity() {
    let (intensity, sigma) = RegionGrid::lookup("us-east-1").fallback_intensity();
    assert_abs_diff_eq!(intensity, 150. + 0.4 * 350., epsilon = 1e-9);
    assert_abs_diff_eq!(sigma, 0.15 * 350., epsilon = 1e-9);
    assert_eq!(RegionGrid::lookup("mars-1"), UNKNOWN_REGION);
    assert_eq!(RegionGrid::all().len(), 10);
}
