//! Trend against the previous run of the same workload.

use serde::Serialize;

/// Direction of the change since the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// More emitted than last time.
    Increase,
    /// Less or the same.
    Decrease,
    /// No usable previous value to compare with.
    Baseline,
}

/// Change in emissions against the previous run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CarbonDiff {
    /// Current minus previous emissions in kg.
    pub delta_kg: f64,
    /// `delta_kg` relative to the previous emissions, in percent.
    pub delta_pct: f64,
    /// Sign of the change.
    pub direction: Direction,
}

impl CarbonDiff {
    /// Result when there is nothing to compare with.
    pub fn baseline() -> Self {
        Self {
            delta_kg: 0.,
            delta_pct: 0.,
            direction: Direction::Baseline,
        }
    }

    /// Compares `current_kg` with `previous_kg`. A missing or non-positive previous value yields
    /// a baseline, an unchanged value counts as a decrease.
    pub fn compute(current_kg: f64, previous_kg: Option<f64>) -> Self {
        match previous_kg {
            Some(previous) if previous > 0. => {
                let delta_kg = current_kg - previous;
                Self {
                    delta_kg,
                    delta_pct: delta_kg / previous * 100.,
                    direction: if delta_kg > 0. {
                        Direction::Increase
                    } else {
                        Direction::Decrease
                    },
                }
            }
            _ => Self::baseline(),
        }
    }
}
