//! Parallel multidirectional search for expensive black-box objectives.
//!
//! This library implements the multidirectional search algorithm of
//! Dennis and Torczon, a derivative-free pattern search that iteratively
//! reshapes a simplex of candidate points. It is built for objectives
//! that are expensive to evaluate: candidate sets are evaluated
//! concurrently on a worker pool, and the branches of the algorithm that
//! *might* be needed next are computed speculatively while the current
//! decision is still pending. Work that turns out to be unneeded is
//! cancelled best-effort.
//!
//! # Algorithm
//!
//! Each iteration, with incumbent `c` (the best vertex):
//!
//! - **Reflection**: every other vertex `v` maps to `2c - v`; accepted if
//!   any reflected point strictly improves on the incumbent value.
//! - **Expansion** (optional): `3c - 2v`, tried after a successful
//!   reflection; doubles the step on success.
//! - **Coordinate search**: probes `c +- step` along every axis, computed
//!   speculatively while the reflection outcome is pending; success
//!   rebuilds the simplex around the incumbent.
//! - **Contraction**: on total failure every vertex moves halfway toward
//!   the incumbent and the step is halved.
//!
//! Decisions depend only on resolved objective values, never on
//! evaluation scheduling, so runs are reproducible for deterministic
//! objectives.
//!
//! # Example
//!
//! ```
//! use mdsearch_core::{optimize, CancellationToken, Point, SearchSettings};
//!
//! // Minimize a shifted 2-d quadratic bowl from the origin.
//! let objective = |p: &Point| {
//!     let (x, y) = (p.coord(0), p.coord(1));
//!     (x - 3.0).powi(2) + (y + 1.0).powi(2)
//! };
//!
//! let mut iterations = 0;
//! let mut controller = |_: &Point, _: f64, _: &Point, value: f64, _: f64| {
//!     iterations += 1;
//!     value > 1e-6 && iterations < 200
//! };
//!
//! let result = optimize(
//!     objective,
//!     Point::new(vec![0.0, 0.0]),
//!     SearchSettings::default(),
//!     &mut controller,
//!     &CancellationToken::new(),
//! );
//! assert!(result.optimum_value < 1e-6);
//! ```

pub mod cache;
pub mod cancel;
pub mod error;
pub mod optimizer;
pub mod ordering;
pub mod pattern;
pub mod point;
pub mod problem;

pub use cache::{CacheStatistics, ObjectiveFunction, ParallelFunctionCache, PointStatus};
pub use cancel::CancellationToken;
pub use error::{EvaluationError, Interrupted};
pub use optimizer::MultidirectionalSearchOptimizer;
pub use ordering::ValueOrdering;
pub use pattern::SearchPattern;
pub use point::Point;
pub use problem::{
    OptimizationController, SearchResult, SearchSettings, SearchStatistics, SearchStatus,
};

/// Convenience entry point: builds a cache and optimizer from `settings`
/// and runs the search to completion.
///
/// The token should not be cancelled before the first iteration has
/// completed; with no incumbent evaluated yet there is no result to
/// report and the accessors fail fast. Long-lived callers that need
/// statistics reset or cache introspection should drive
/// [`MultidirectionalSearchOptimizer`] directly.
pub fn optimize(
    objective: impl ObjectiveFunction + 'static,
    initial: Point,
    settings: SearchSettings,
    controller: &mut dyn OptimizationController,
    token: &CancellationToken,
) -> SearchResult {
    let cache = ParallelFunctionCache::with_threads(objective, settings.threads);
    let mut optimizer = MultidirectionalSearchOptimizer::with_settings(cache, settings);
    let status = optimizer.optimize(initial, controller, token);
    SearchResult {
        status,
        optimum: optimizer.optimum_point().clone(),
        optimum_value: optimizer.optimum_value(),
        statistics: optimizer.statistics(),
    }
}
