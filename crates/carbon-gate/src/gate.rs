//! Graduated budget gate.

use serde::Serialize;

use carbon_gate_forecast::forecast::ForecastResult;

/// Savings claimed by the reduce-scope option. A fixed heuristic: halving the iteration count of a
/// workload roughly halves its energy and runtime.
pub const REDUCE_SCOPE_SAVINGS_PCT: f64 = 44.;

/// Default largest overage fraction that only warns.
pub const DEFAULT_WARN_THRESHOLD: f64 = 0.10;
/// Default largest overage fraction that is a soft block.
pub const DEFAULT_SOFT_BLOCK_THRESHOLD: f64 = 0.50;
/// Default savings in percent a wait must exceed.
pub const DEFAULT_WAIT_MIN_SAVINGS_PCT: f64 = 5.;
/// Default extra cost in USD of rerouting.
pub const DEFAULT_REROUTE_COST_DELTA: f64 = 2.20;

/// Outcome of the budget check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// The ±σ interval straddles the remaining budget.
    Uncertain,
    /// Fits in the remaining budget.
    Pass,
    /// Over budget by at most the warn threshold.
    Warn,
    /// Over budget by at most the soft-block threshold; can be overridden.
    SoftBlock,
    /// Over budget beyond the soft-block threshold; needs escalation.
    HardBlock,
}

impl GateState {
    /// Maps the state onto the ternary legacy status.
    pub fn legacy(&self) -> LegacyStatus {
        match self {
            GateState::Pass => LegacyStatus::Pass,
            GateState::Warn | GateState::Uncertain => LegacyStatus::Warn,
            GateState::SoftBlock | GateState::HardBlock => LegacyStatus::Block,
        }
    }

    /// Whether the caller may proceed with a justification.
    pub fn allows_override(&self) -> bool {
        matches!(self, GateState::SoftBlock | GateState::HardBlock | GateState::Uncertain)
    }
}

/// Ternary status for consumers that predate the graduated states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyStatus {
    /// [`GateState::Pass`].
    Pass,
    /// [`GateState::Warn`] or [`GateState::Uncertain`].
    Warn,
    /// Either block state.
    Block,
}

/// Work the caller has to do to apply an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    /// Nothing to change.
    None,
    /// A setting or flag.
    Low,
    /// Changes to the workload.
    Medium,
    /// Approval from someone else.
    High,
}

/// Kind of resolution option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// Start later, in a cleaner window.
    Wait,
    /// Run at the alternative facility.
    Reroute,
    /// Shrink the job.
    ReduceScope,
    /// Proceed anyway with a justification.
    Override,
}

/// A way to bring a job back under budget.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionOption {
    /// Kind of the option.
    pub id: ResolutionKind,
    /// Short title, e.g. `Wait 6h`.
    pub label: String,
    /// One sentence shown below the label.
    pub description: String,
    /// Expected reduction of emissions in percent.
    pub savings_pct: f64,
    /// Extra cost in USD.
    pub cost_delta: f64,
    /// Work needed to apply it.
    pub effort: Effort,
}

/// Everything the gate looks at.
#[derive(Debug, Clone)]
pub struct GateInputs<'a> {
    /// Estimated emissions of the job.
    pub emissions_kg: f64,
    /// 1σ uncertainty of `emissions_kg`.
    pub sigma_kg: f64,
    /// Budget of the month.
    pub monthly_budget_kg: f64,
    /// Spent so far this month.
    pub monthly_used_kg: f64,
    /// Lowest-carbon window, drives the wait option.
    pub forecast: &'a ForecastResult,
    /// Emissions of the job at the alternative facility, `None` if it is unreachable.
    pub alternative_kg: Option<f64>,
}

/// Verdict of the gate with its explanation and the ways out.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateDecision {
    /// Graduated state.
    pub state: GateState,
    /// `state` mapped for legacy consumers.
    pub legacy_status: LegacyStatus,
    /// Emissions beyond the remaining budget, never negative.
    pub overage_kg: f64,
    /// `overage_kg` relative to the monthly budget.
    pub overage_fraction: f64,
    /// Human-readable summary.
    pub message: String,
    /// Sorted by descending savings.
    pub options: Vec<ResolutionOption>,
}

/// Thresholds and option parameters of the gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GatePolicy {
    /// Largest overage fraction that only warns.
    pub warn_threshold: f64,
    /// Largest overage fraction that can still be resolved without escalation.
    pub soft_block_threshold: f64,
    /// Forecast savings in percent needed to offer waiting.
    pub wait_min_savings_pct: f64,
    /// Extra cost in USD of moving the job to the alternative facility.
    pub reroute_cost_delta: f64,
}

impl Default for GatePolicy {
    fn default() -> Self {
        Self {
            warn_threshold: DEFAULT_WARN_THRESHOLD,
            soft_block_threshold: DEFAULT_SOFT_BLOCK_THRESHOLD,
            wait_min_savings_pct: DEFAULT_WAIT_MIN_SAVINGS_PCT,
            reroute_cost_delta: DEFAULT_REROUTE_COST_DELTA,
        }
    }
}

fn overage(emissions_kg: f64, remaining_kg: f64) -> f64 {
    (emissions_kg - remaining_kg).max(0.)
}

impl GatePolicy {
    /// Classifies the job against the remaining budget and lists resolution options.
    pub fn decide(&self, inputs: &GateInputs) -> GateDecision {
        let remaining = inputs.monthly_budget_kg - inputs.monthly_used_kg;
        let overage_kg = overage(inputs.emissions_kg, remaining);
        let overage_fraction = if inputs.monthly_budget_kg > 0. {
            overage_kg / inputs.monthly_budget_kg
        } else if overage_kg > 0. {
            1.
        } else {
            0.
        };
        let lower = overage(inputs.emissions_kg - inputs.sigma_kg, remaining);
        let upper = overage(inputs.emissions_kg + inputs.sigma_kg, remaining);

        let state = if lower == 0. && upper > 0. {
            GateState::Uncertain
        } else if overage_fraction == 0. {
            GateState::Pass
        } else if overage_fraction <= self.warn_threshold {
            GateState::Warn
        } else if overage_fraction <= self.soft_block_threshold {
            GateState::SoftBlock
        } else {
            GateState::HardBlock
        };

        let message = match state {
            GateState::Pass => format!("Under budget: {:.1} kg remaining this month.", remaining),
            GateState::Warn => format!(
                "{:.2} kg over budget (+{:.0}%). Consider scheduling later or rerouting.",
                overage_kg,
                overage_fraction * 100.
            ),
            GateState::SoftBlock => format!(
                "Blocked: {:.2} kg over budget. Pick a resolution option to proceed.",
                overage_kg
            ),
            GateState::HardBlock => format!(
                "Hard block: {:.2} kg over budget ({:.0}%). Escalation required.",
                overage_kg,
                overage_fraction * 100.
            ),
            GateState::Uncertain => format!(
                "Uncertain: emissions estimate spans the budget threshold (±{:.2} kg).",
                inputs.sigma_kg
            ),
        };

        GateDecision {
            state,
            legacy_status: state.legacy(),
            overage_kg,
            overage_fraction,
            message,
            options: self.options(inputs, state),
        }
    }

    fn options(&self, inputs: &GateInputs, state: GateState) -> Vec<ResolutionOption> {
        let mut options = Vec::new();
        let forecast = inputs.forecast;

        if forecast.optimal_wait_h > 0 && forecast.savings_pct > self.wait_min_savings_pct {
            options.push(ResolutionOption {
                id: ResolutionKind::Wait,
                label: format!("Wait {}h", forecast.optimal_wait_h),
                description: format!(
                    "Carbon drops {:.0}%, forecast confidence: {}",
                    forecast.savings_pct,
                    forecast.confidence_level.label()
                ),
                savings_pct: forecast.savings_pct,
                cost_delta: 0.,
                effort: Effort::None,
            });
        }

        if let Some(alternative_kg) = inputs.alternative_kg {
            if alternative_kg < inputs.emissions_kg {
                let savings_pct = (1. - alternative_kg / inputs.emissions_kg) * 100.;
                options.push(ResolutionOption {
                    id: ResolutionKind::Reroute,
                    label: "Reroute to alternative facility".to_string(),
                    description: format!("{:.0}% cleaner on geothermal infrastructure", savings_pct),
                    savings_pct,
                    cost_delta: self.reroute_cost_delta,
                    effort: Effort::Low,
                });
            }
        }

        options.push(ResolutionOption {
            id: ResolutionKind::ReduceScope,
            label: "Reduce training epochs".to_string(),
            description: format!(
                "Halving epochs saves ~{:.0}% carbon and cuts runtime proportionally",
                REDUCE_SCOPE_SAVINGS_PCT
            ),
            savings_pct: REDUCE_SCOPE_SAVINGS_PCT,
            cost_delta: 0.,
            effort: Effort::Medium,
        });

        if state.allows_override() {
            options.push(ResolutionOption {
                id: ResolutionKind::Override,
                label: "Override (justify)".to_string(),
                description: "Proceed anyway with a written justification".to_string(),
                savings_pct: 0.,
                cost_delta: 0.,
                effort: Effort::High,
            });
        }

        // stable, so equal savings keep insertion order
        options.sort_by(|a, b| b.savings_pct.total_cmp(&a.savings_pct));
        options
    }
}
