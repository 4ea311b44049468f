//! Charging-load rescheduling to lower the daily peak.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::lp;
use super::profile::{HOURS, LoadProfile, validate_loads};
use crate::error::{InputError, SolverIssue};

/// Hours above this multiple of the mean are shaved by the heuristic.
const SHAVE_THRESHOLD: f64 = 1.2;
/// Hours below this multiple of the mean absorb shaved load.
const VALLEY_THRESHOLD: f64 = 0.8;
/// Relative tolerance on energy conservation for an accepted LP solution.
const CONSERVATION_TOLERANCE: f64 = 1e-6;

/// Default share of an hour's load that may move.
pub const DEFAULT_SHIFT_FRACTION: f64 = 0.3;
/// Default ceiling on a single LP solve.
pub const DEFAULT_SOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Which algorithm to try first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStrategy {
    /// Linear program, falling back to the heuristic on any solver issue.
    #[default]
    LinearProgram,
    /// Peak-shaving heuristic only.
    Heuristic,
}

/// The algorithm that actually produced a schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScheduleMethod {
    #[serde(rename = "Linear Programming")]
    LinearProgram,
    #[serde(rename = "Heuristic (Peak Shaving)")]
    Heuristic,
}

impl fmt::Display for ScheduleMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleMethod::LinearProgram => write!(f, "Linear Programming"),
            ScheduleMethod::Heuristic => write!(f, "Heuristic (Peak Shaving)"),
        }
    }
}

/// Original and optimized profiles side by side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleResult {
    pub original_load: Vec<f64>,
    pub optimized_load: Vec<f64>,
    pub original_peak: f64,
    pub optimized_peak: f64,
    /// `(1 - optimized_peak / original_peak) * 100`, never negative.
    pub peak_reduction_pct: f64,
    pub method: ScheduleMethod,
    pub shift_fraction: f64,
    /// Shaved load the heuristic could not place; always 0 for the LP.
    pub unallocated_load: f64,
    /// Why the LP was skipped, when it was requested but not used.
    pub solver_issue: Option<SolverIssue>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleOptimizer {
    shift_fraction: f64,
    strategy: ScheduleStrategy,
    solve_timeout: Duration,
}

impl ScheduleOptimizer {
    /// Creates an optimizer that may move up to `shift_fraction` of any
    /// hour's load.
    ///
    /// # Errors
    ///
    /// Returns `InputError::ShiftFractionOutOfRange` unless
    /// `0 < shift_fraction <= 1`.
    pub fn new(shift_fraction: f64) -> Result<Self, InputError> {
        if shift_fraction.is_nan() || shift_fraction <= 0.0 || shift_fraction > 1.0 {
            return Err(InputError::ShiftFractionOutOfRange(shift_fraction));
        }
        Ok(Self {
            shift_fraction,
            strategy: ScheduleStrategy::default(),
            solve_timeout: DEFAULT_SOLVE_TIMEOUT,
        })
    }

    pub fn with_strategy(mut self, strategy: ScheduleStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_solve_timeout(mut self, timeout: Duration) -> Self {
        self.solve_timeout = timeout;
        self
    }

    pub fn shift_fraction(&self) -> f64 {
        self.shift_fraction
    }

    /// Reshapes a 24-hour load profile to lower its peak.
    ///
    /// With [`ScheduleStrategy::LinearProgram`] any solver issue (no
    /// backend, non-optimal status, timeout, or a solution that fails the
    /// conservation check) switches to the heuristic and is recorded in
    /// [`ScheduleResult::solver_issue`].
    ///
    /// # Errors
    ///
    /// Returns an `InputError` unless `original` has 24 finite, non-negative
    /// entries.
    pub fn optimize(&self, original: &[f64]) -> Result<ScheduleResult, InputError> {
        self.optimize_with(original, lp::solve)
    }

    /// [`Self::optimize`] with the LP solve supplied by the caller.
    fn optimize_with<S>(&self, original: &[f64], solve: S) -> Result<ScheduleResult, InputError>
    where
        S: FnOnce(&[f64], f64, Duration) -> Result<Vec<f64>, SolverIssue>,
    {
        validate_loads(original)?;

        let (optimized, method, unallocated, solver_issue) = match self.strategy {
            ScheduleStrategy::Heuristic => {
                let (optimized, unallocated) = self.heuristic(original);
                (optimized, ScheduleMethod::Heuristic, unallocated, None)
            }
            ScheduleStrategy::LinearProgram => match self.linear_program(original, solve) {
                Ok(optimized) => (optimized, ScheduleMethod::LinearProgram, 0.0, None),
                Err(issue) => {
                    warn!(%issue, "falling back to peak-shaving heuristic");
                    let (optimized, unallocated) = self.heuristic(original);
                    (optimized, ScheduleMethod::Heuristic, unallocated, Some(issue))
                }
            },
        };

        let original_peak = peak(original);
        let optimized_peak = peak(&optimized);
        let peak_reduction_pct = if original_peak > 0.0 {
            ((1.0 - optimized_peak / original_peak) * 100.0).max(0.0)
        } else {
            0.0
        };

        info!(
            %method,
            original_peak,
            optimized_peak,
            peak_reduction_pct,
            unallocated,
            "schedule optimized"
        );

        Ok(ScheduleResult {
            original_load: original.to_vec(),
            optimized_load: optimized,
            original_peak,
            optimized_peak,
            peak_reduction_pct,
            method,
            shift_fraction: self.shift_fraction,
            unallocated_load: unallocated,
            solver_issue,
        })
    }

    /// Optimizes the hourly loads of an analyzed profile.
    ///
    /// # Errors
    ///
    /// See [`Self::optimize`].
    pub fn optimize_profile(&self, profile: &LoadProfile) -> Result<ScheduleResult, InputError> {
        self.optimize(&profile.loads())
    }

    /// Runs the LP and sanitizes its answer.
    ///
    /// Solver noise is clamped into `[floor, original peak]` per hour; the
    /// result is rejected if the total then drifts from the original.
    fn linear_program<S>(&self, original: &[f64], solve: S) -> Result<Vec<f64>, SolverIssue>
    where
        S: FnOnce(&[f64], f64, Duration) -> Result<Vec<f64>, SolverIssue>,
    {
        let raw = solve(original, self.shift_fraction, self.solve_timeout)?;
        if raw.len() != HOURS || raw.iter().any(|v| !v.is_finite()) {
            return Err(SolverIssue::Failure("malformed solution".to_string()));
        }

        let ceiling = peak(original);
        let optimized: Vec<f64> = raw
            .iter()
            .zip(original)
            .map(|(&x, &o)| x.clamp(o * (1.0 - self.shift_fraction), ceiling))
            .collect();

        let total: f64 = original.iter().sum();
        let drift = (optimized.iter().sum::<f64>() - total).abs();
        if drift > CONSERVATION_TOLERANCE * total.max(1.0) {
            return Err(SolverIssue::Failure(format!(
                "solution changes total load by {drift:.3e}"
            )));
        }
        Ok(optimized)
    }

    /// Two-pass peak shaving.
    ///
    /// Pass 1 takes `shift_fraction` of every hour above 1.2x the mean into a
    /// pool. Pass 2 walks the hours in order and lets each hour below 0.8x
    /// the mean absorb up to `mean - load` from the pool. Returns the new
    /// profile and whatever is left in the pool.
    fn heuristic(&self, original: &[f64]) -> (Vec<f64>, f64) {
        let total: f64 = original.iter().sum();
        let mean = total / original.len() as f64;
        let mut optimized = original.to_vec();
        let mut pool = 0.0;

        for load in optimized.iter_mut() {
            if *load > SHAVE_THRESHOLD * mean {
                let shaved = *load * self.shift_fraction;
                *load -= shaved;
                pool += shaved;
            }
        }

        for load in optimized.iter_mut() {
            if pool <= 0.0 {
                break;
            }
            if *load < VALLEY_THRESHOLD * mean {
                let absorbed = pool.min(mean - *load);
                *load += absorbed;
                pool -= absorbed;
            }
        }

        // float dust from the subtraction chain is not a residual
        let unallocated = if pool > CONSERVATION_TOLERANCE * total.max(1.0) {
            pool
        } else {
            0.0
        };
        (optimized, unallocated)
    }
}

impl Default for ScheduleOptimizer {
    fn default() -> Self {
        Self {
            shift_fraction: DEFAULT_SHIFT_FRACTION,
            strategy: ScheduleStrategy::default(),
            solve_timeout: DEFAULT_SOLVE_TIMEOUT,
        }
    }
}

fn peak(loads: &[f64]) -> f64 {
    loads.iter().copied().fold(0.0, f64::max)
}
