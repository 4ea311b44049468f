//! Peak-minimizing linear program.
//!
//! Variables: one load per hour plus a scalar `peak`.
//!
//! ```text
//! minimise   peak
//! subject to x[h] <= peak                        for every hour
//!            sum(x) == sum(original)
//!            x[h] >= original[h] * (1 - shift)   for every hour
//! ```
//!
//! The original profile is always feasible, so the optimum never exceeds the
//! original peak. The solve runs on its own thread and is abandoned once the
//! time limit passes.

use std::time::Duration;

use crate::error::SolverIssue;

/// Solves the program, giving up after `limit`.
///
/// # Errors
///
/// Returns the [`SolverIssue`] that prevented an optimal solution.
#[cfg(feature = "lp")]
pub fn solve(original: &[f64], shift_fraction: f64, limit: Duration) -> Result<Vec<f64>, SolverIssue> {
    let input = original.to_vec();
    with_time_limit(limit, move || backend::minimise_peak(&input, shift_fraction))
}

/// Runs `work` on its own thread and waits at most `limit` for it.
#[cfg(feature = "lp")]
fn with_time_limit<F>(limit: Duration, work: F) -> Result<Vec<f64>, SolverIssue>
where
    F: FnOnce() -> Result<Vec<f64>, String> + Send + 'static,
{
    use std::sync::mpsc::{self, RecvTimeoutError};

    let (tx, rx) = mpsc::channel();
    std::thread::Builder::new()
        .name("schedule-lp".to_string())
        .spawn(move || {
            // the receiver may have timed out and gone away
            let _ = tx.send(work());
        })
        .map_err(|e| SolverIssue::Failure(format!("cannot start solver thread: {e}")))?;

    match rx.recv_timeout(limit) {
        Ok(result) => result.map_err(SolverIssue::Failure),
        Err(RecvTimeoutError::Timeout) => Err(SolverIssue::TimedOut {
            limit_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
        Err(RecvTimeoutError::Disconnected) => Err(SolverIssue::Failure(
            "solver thread ended without a result".to_string(),
        )),
    }
}

/// Without the `lp` feature there is no backend to call.
///
/// # Errors
///
/// Always returns [`SolverIssue::Unavailable`].
#[cfg(not(feature = "lp"))]
pub fn solve(_original: &[f64], _shift_fraction: f64, _limit: Duration) -> Result<Vec<f64>, SolverIssue> {
    Err(SolverIssue::Unavailable)
}

#[cfg(feature = "lp")]
mod backend {
    use good_lp::solvers::clarabel::clarabel;
    use good_lp::{Expression, Solution, SolverModel, Variable, constraint, variable, variables};

    pub(super) fn minimise_peak(original: &[f64], shift_fraction: f64) -> Result<Vec<f64>, String> {
        let total: f64 = original.iter().sum();
        let mut vars = variables!();

        let peak = vars.add(variable().min(0.0));
        let hours: Vec<Variable> = original
            .iter()
            .map(|_| vars.add(variable().min(0.0)))
            .collect();

        let mut model = vars.minimise(peak).using(clarabel);
        let mut assigned = Expression::from(0.0);
        for (&x, &load) in hours.iter().zip(original) {
            model = model.with(constraint!(x <= peak));
            model = model.with(constraint!(x >= load * (1.0 - shift_fraction)));
            assigned += x;
        }
        model = model.with(constraint!(assigned == total));

        let solution = model.solve().map_err(|e| format!("{e:?}"))?;
        Ok(hours.iter().map(|&x| solution.value(x)).collect())
    }
}
