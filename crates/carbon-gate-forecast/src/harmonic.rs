//! Harmonic (Fourier) regression of hourly carbon intensity.
//!
//! The model is a constant plus cosine/sine pairs at multiples of the daily frequency and,
//! with enough history, of the weekly frequency:
//!
//! ```text
//! I(t) = c0 + Σn [an cos(2πnt/24) + bn sin(2πnt/24)] + Σm [am cos(2πmt/168) + bm sin(2πmt/168)]
//! ```

use std::f64::consts::PI;
use std::ops::Range;

use serde::Serialize;

use crate::linalg::{dot, least_squares, Matrix};
use crate::stats::{mean, std_dev};

/// Period of the daily cycle in hours.
pub const DAILY_PERIOD_H: f64 = 24.;
/// Period of the weekly cycle in hours.
pub const WEEKLY_PERIOD_H: f64 = 168.;
/// History length (two weeks of hourly samples) needed to engage the weekly harmonics.
pub const WEEKLY_MIN_SAMPLES: usize = 336;

/// Set of regressors of the harmonic model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HarmonicBasis {
    /// Number of daily cosine/sine pairs.
    pub daily: usize,
    /// Number of weekly cosine/sine pairs.
    pub weekly: usize,
}

impl HarmonicBasis {
    /// Creates a basis with `daily` and `weekly` harmonic pairs.
    pub fn new(daily: usize, weekly: usize) -> Self {
        Self { daily, weekly }
    }

    /// Returns the basis for a history of `len` samples. Weekly harmonics are dropped for histories
    /// shorter than [`WEEKLY_MIN_SAMPLES`], which can't pin down a weekly cycle.
    pub fn for_history(len: usize, daily: usize, weekly: usize) -> Self {
        let weekly = if len >= WEEKLY_MIN_SAMPLES { weekly } else { 0 };
        Self::new(daily, weekly)
    }

    /// Number of regressors, including the constant.
    pub fn n_columns(&self) -> usize {
        1 + 2 * (self.daily + self.weekly)
    }

    /// Whether any weekly harmonics are fitted.
    pub fn has_weekly(&self) -> bool {
        self.weekly > 0
    }

    fn daily_columns(&self) -> Range<usize> {
        1..1 + 2 * self.daily
    }

    fn weekly_columns(&self) -> Range<usize> {
        let start = 1 + 2 * self.daily;
        start..start + 2 * self.weekly
    }

    /// Returns the regressors at hour `t`.
    pub fn evaluate(&self, t: f64) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.n_columns());
        row.push(1.);
        for (count, period) in [(self.daily, DAILY_PERIOD_H), (self.weekly, WEEKLY_PERIOD_H)] {
            for n in 1..=count {
                let phase = 2. * PI * n as f64 * t / period;
                row.push(phase.cos());
                row.push(phase.sin());
            }
        }
        row
    }

    /// Returns the design matrix for hours `0, 1, .., len - 1`.
    pub fn design_matrix(&self, len: usize) -> Matrix {
        let mut x = Matrix::zeros(len, self.n_columns());
        for t in 0..len {
            for (j, value) in self.evaluate(t as f64).into_iter().enumerate() {
                x.set(t, j, value);
            }
        }
        x
    }
}

/// Share of the variance explained by parts of the model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct R2Breakdown {
    /// Constant plus daily harmonics only.
    pub daily: f64,
    /// Constant plus weekly harmonics only, 0 when the weekly terms are not engaged.
    pub weekly: f64,
    /// Full model.
    pub total: f64,
}

/// Harmonic model fitted to a history by ordinary least squares.
#[derive(Debug, Clone)]
pub struct HarmonicFit {
    basis: HarmonicBasis,
    coefficients: Vec<f64>,
    residual_std: f64,
    r2: R2Breakdown,
}

impl HarmonicFit {
    /// Fits the model to `history`, whose samples are taken at hours `0, 1, ..`.
    ///
    /// Returns `None` if the history is too short for the basis or the normal equations are singular.
    pub fn fit(history: &[f64], basis: HarmonicBasis) -> Option<Self> {
        if history.len() < basis.n_columns() {
            return None;
        }
        let x = basis.design_matrix(history.len());
        let coefficients = least_squares(&x, history)?;

        let residuals: Vec<f64> = x
            .mul_vec(&coefficients)
            .iter()
            .zip(history)
            .map(|(fitted, y)| y - fitted)
            .collect();
        let y_mean = mean(history);
        let ss_total: f64 = history.iter().map(|y| (y - y_mean) * (y - y_mean)).sum();
        let ss_res: f64 = residuals.iter().map(|r| r * r).sum();

        let r2 = R2Breakdown {
            daily: partial_r2(&x, history, basis.daily_columns(), ss_total),
            weekly: partial_r2(&x, history, basis.weekly_columns(), ss_total),
            total: r2_score(ss_res, ss_total),
        };

        Some(Self {
            basis,
            coefficients,
            residual_std: std_dev(&residuals),
            r2,
        })
    }

    /// Returns the modelled intensity at hour `t` (on the same clock as the history).
    pub fn predict(&self, t: f64) -> f64 {
        dot(&self.basis.evaluate(t), &self.coefficients)
    }

    /// Basis the model was fitted with.
    pub fn basis(&self) -> HarmonicBasis {
        self.basis
    }

    /// Fitted coefficients in basis column order, the constant first.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// In-sample standard deviation of the residuals.
    pub fn residual_std(&self) -> f64 {
        self.residual_std
    }

    /// Explained variance of the full model and its parts.
    pub fn r2(&self) -> R2Breakdown {
        self.r2
    }
}

fn r2_score(ss_res: f64, ss_total: f64) -> f64 {
    if ss_total > 0. {
        (1. - ss_res / ss_total).max(0.)
    } else {
        0.
    }
}

/// R² of the constant plus the given columns.
fn partial_r2(x: &Matrix, y: &[f64], columns: Range<usize>, ss_total: f64) -> f64 {
    if columns.is_empty() {
        return 0.;
    }
    let selected: Vec<usize> = std::iter::once(0).chain(columns).collect();
    let rows: Vec<Vec<f64>> = (0..x.rows())
        .map(|r| selected.iter().map(|&c| x.get(r, c)).collect())
        .collect();
    let sub = Matrix::from_rows(&rows);
    match least_squares(&sub, y) {
        Some(beta) => {
            let ss_res: f64 = sub.mul_vec(&beta).iter().zip(y).map(|(f, y)| (y - f) * (y - f)).sum();
            r2_score(ss_res, ss_total)
        }
        None => 0.,
    }
}
