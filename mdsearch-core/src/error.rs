//! Error types for the search core.

use thiserror::Error;

/// Errors an objective function can report for a single point.
///
/// How a failed evaluation is resolved is the function cache's policy, not
/// the optimizer's: the cache records the point as "worse than everything"
/// (`f64::INFINITY`) so the search simply steers away from it.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// The point was rejected by the caller's own feasibility logic
    /// (e.g. a constraint encoded inside the objective).
    #[error("point rejected: {0}")]
    Rejected(String),

    /// The underlying model failed to produce a value.
    #[error("objective failed: {0}")]
    Failed(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Returned by blocking waits when the cancellation token fired.
///
/// This is a normal termination signal, not a fault: the optimizer unwinds
/// cleanly and reports the best incumbent found so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("search interrupted by cancellation")]
pub struct Interrupted;
