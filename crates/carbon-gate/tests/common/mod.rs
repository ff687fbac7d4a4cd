use carbon_gate_forecast::forecast::{ConfidenceLevel, ForecastResult, ForecastSource};

pub fn assert_float_eq(x: f64, y: f64, eps: f64) {
    assert!(x > y - eps && x < y + eps, "{} != {} (eps {})", x, y, eps);
}

pub fn forecast(wait_h: usize, savings_pct: f64, confidence: f64) -> ForecastResult {
    ForecastResult {
        optimal_wait_h: wait_h,
        confidence,
        confidence_level: ConfidenceLevel::from_confidence(confidence),
        savings_pct,
        source: ForecastSource::SpectralDaily,
        min_intensity: None,
        diagnostics: None,
    }
}
