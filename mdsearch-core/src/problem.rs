//! Search configuration, controller boundary, and result types.

use std::fmt;

use crate::point::Point;

/// Tunable parameters of a search.
#[derive(Debug, Clone)]
pub struct SearchSettings {
    /// Initial step size: the scale of the first simplex and of every
    /// coordinate-search probe.
    pub initial_step: f64,

    /// Whether to speculatively compute and test the expansion set after
    /// a successful reflection. Off by default: expansion rarely pays off
    /// for the bounded problems this optimizer is typically fed.
    pub use_expansion: bool,

    /// Worker threads for objective evaluation, `0` = available
    /// parallelism. Consumed when the function cache is built (see
    /// [`optimize`](crate::optimize)); an optimizer constructed over an
    /// existing cache keeps that cache's pool.
    pub threads: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            initial_step: 0.5,
            use_expansion: false,
            threads: 0,
        }
    }
}

/// Why the optimization loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// The controller declined to continue.
    ControllerStop,

    /// The cancellation token fired; the last incumbent is reported.
    Interrupted,
}

impl fmt::Display for SearchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchStatus::ControllerStop => write!(f, "stopped by controller"),
            SearchStatus::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Outcome of a completed search.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// Why the loop ended.
    pub status: SearchStatus,

    /// Best point found.
    pub optimum: Point,

    /// Objective value at the best point.
    pub optimum_value: f64,

    /// Counters accumulated over the run.
    pub statistics: SearchStatistics,
}

/// Counters describing which acceptance branches a search took.
///
/// Purely observational: resetting or reading them never changes the
/// algorithm's decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStatistics {
    /// Iterations started.
    pub steps: u64,

    /// Iterations that kept the reflected simplex.
    pub reflection_acceptance: u64,

    /// Iterations where expansion beat the accepted reflection.
    pub expansion_acceptance: u64,

    /// Iterations where coordinate search rebuilt the simplex.
    pub coordinate_acceptance: u64,

    /// Iterations that fell back to contraction and halved the step.
    pub reduction_fallback: u64,
}

impl SearchStatistics {
    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for SearchStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "steps={} reflection={} expansion={} coordinate={} reduction={}",
            self.steps,
            self.reflection_acceptance,
            self.expansion_acceptance,
            self.coordinate_acceptance,
            self.reduction_fallback
        )
    }
}

/// Per-iteration continuation decision, supplied by the caller.
///
/// Invoked once at the end of every iteration with the incumbent before
/// and after the step and the current step size; returning `false`
/// terminates the search with the current incumbent as the result.
/// External stopping criteria (value thresholds, iteration caps,
/// wall-clock budgets) belong here.
pub trait OptimizationController {
    /// Reports a completed iteration; `true` continues the search.
    fn step_taken(
        &mut self,
        previous: &Point,
        previous_value: f64,
        new: &Point,
        new_value: f64,
        step: f64,
    ) -> bool;
}

impl<F> OptimizationController for F
where
    F: FnMut(&Point, f64, &Point, f64, f64) -> bool,
{
    fn step_taken(
        &mut self,
        previous: &Point,
        previous_value: f64,
        new: &Point,
        new_value: f64,
        step: f64,
    ) -> bool {
        self(previous, previous_value, new, new_value, step)
    }
}
