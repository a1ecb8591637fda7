//! The multidirectional search state machine.
//!
//! A customized parallel variant of the Dennis-Torczon multidirectional
//! search. Each iteration reflects every non-incumbent vertex through the
//! incumbent and, *speculatively and concurrently*, submits the
//! coordinate-search probes (and optionally the expansion set) before the
//! reflection outcome is known. The control thread blocks only on the set
//! whose outcome decides the next branch; whichever speculative set ends
//! up unused is aborted best-effort.
//!
//! Decision order is fixed: reflection is checked before coordinate
//! search. The sequence of accepted branches is therefore reproducible
//! whenever the objective values are deterministic, regardless of how
//! evaluations are scheduled.

use crate::cache::ParallelFunctionCache;
use crate::cancel::CancellationToken;
use crate::ordering::ValueOrdering;
use crate::pattern::SearchPattern;
use crate::point::Point;
use crate::problem::{OptimizationController, SearchSettings, SearchStatistics, SearchStatus};

/// Parallel multidirectional search optimizer.
///
/// Owns the simplex, the step size, and the acceptance counters; the
/// function cache is the only shared resource. The instance itself is
/// driven by a single control thread and needs no locking.
pub struct MultidirectionalSearchOptimizer {
    cache: ParallelFunctionCache,
    settings: SearchSettings,
    simplex: Vec<Point>,
    stats: SearchStatistics,
}

impl MultidirectionalSearchOptimizer {
    /// Creates an optimizer over `cache` with default settings.
    pub fn new(cache: ParallelFunctionCache) -> Self {
        Self::with_settings(cache, SearchSettings::default())
    }

    /// Creates an optimizer over `cache` with explicit settings.
    pub fn with_settings(cache: ParallelFunctionCache, settings: SearchSettings) -> Self {
        Self {
            cache,
            settings,
            simplex: Vec::new(),
            stats: SearchStatistics::default(),
        }
    }

    /// Runs the search from `initial` until `controller` declines to
    /// continue or `token` is cancelled.
    ///
    /// Cancellation is a normal termination path: the loop exits within
    /// one iteration, outstanding aborts are fire-and-forget, and the
    /// last incumbent remains available through the accessors (provided
    /// at least one evaluation pass completed).
    pub fn optimize(
        &mut self,
        initial: Point,
        controller: &mut dyn OptimizationController,
        token: &CancellationToken,
    ) -> SearchStatus {
        let pattern = SearchPattern::square(initial.dim());
        let ordering = ValueOrdering::new(&self.cache);

        let mut step = self.settings.initial_step;
        let use_expansion = self.settings.use_expansion;
        let mut simplex_computed = false;

        log::info!("starting optimization at {initial} with step {step}");

        self.simplex.clear();
        self.simplex.push(initial.clone());
        for direction in &pattern {
            self.simplex.push(initial.add(&direction.mul(step)));
        }

        let status = loop {
            if token.is_cancelled() {
                break SearchStatus::Interrupted;
            }
            self.stats.steps += 1;
            log::debug!(
                "starting step {} with simplex {}{}",
                self.stats.steps,
                fmt_points(&self.simplex),
                if simplex_computed { "" } else { " (not computed)" }
            );

            // A fresh simplex (first iteration, or after a coordinate
            // rebuild) must be fully resolved and sorted before any
            // candidate set can be derived from it.
            if !simplex_computed {
                self.cache.compute(&self.simplex);
                if self.cache.wait_for(&self.simplex, token).is_err() {
                    break SearchStatus::Interrupted;
                }
                ordering.sort(&mut self.simplex);
                simplex_computed = true;
            }

            let current = self.simplex[0].clone();
            let current_value = self.cache.value(&current);

            // Queue the candidate sets in likely order of usefulness.
            // Only the reflection outcome is needed first; coordinate
            // search (and expansion) are computed speculatively to hide
            // their latency behind the reflection decision.
            let reflection = create_reflection(&self.simplex);
            let coordinate_search = create_coordinate_search(&current, step);
            let expansion = if use_expansion {
                create_expansion(&self.simplex)
            } else {
                Vec::new()
            };

            self.cache.compute(&reflection);
            self.cache.compute(&coordinate_search);
            if use_expansion {
                self.cache.compute(&expansion);
            }

            log::debug!("computing reflection");
            if self.cache.wait_for(&reflection, token).is_err() {
                break SearchStatus::Interrupted;
            }

            if accept(&self.cache, &reflection, current_value) {
                log::debug!(
                    "reflection accepted, aborting coordinate search, {} expansion",
                    if use_expansion { "computing" } else { "skipping" }
                );
                self.cache.abort(&coordinate_search);

                self.simplex.clear();
                self.simplex.push(current.clone());
                self.simplex.extend(reflection.iter().cloned());
                ordering.sort(&mut self.simplex);

                if use_expansion {
                    // Assume expansion fails: queue the next iteration's
                    // reflection while the expansion set resolves. If
                    // expansion loses, that work is already in flight for
                    // the next step; if it wins, it is aborted.
                    let next_reflection = create_reflection(&self.simplex);
                    self.cache.compute(&next_reflection);
                    if self.cache.wait_for(&expansion, token).is_err() {
                        break SearchStatus::Interrupted;
                    }

                    if accept(&self.cache, &expansion, current_value) {
                        log::debug!("expansion accepted, aborting speculative reflection");
                        self.cache.abort(&next_reflection);

                        self.simplex.clear();
                        self.simplex.push(current.clone());
                        self.simplex.extend(expansion.iter().cloned());
                        step *= 2.0;
                        ordering.sort(&mut self.simplex);
                        self.stats.expansion_acceptance += 1;
                    } else {
                        log::debug!("expansion failed");
                        self.stats.reflection_acceptance += 1;
                    }
                } else {
                    self.stats.reflection_acceptance += 1;
                }
            } else {
                log::debug!("reflection rejected, aborting expansion, computing coordinate search");
                if use_expansion {
                    self.cache.abort(&expansion);
                }

                // Assume coordinate search fails: contract toward the
                // incumbent and resubmit speculatively while the
                // coordinate probes (already in flight) resolve.
                contract(&mut self.simplex);
                self.cache.compute(&self.simplex);
                if self.cache.wait_for(&coordinate_search, token).is_err() {
                    break SearchStatus::Interrupted;
                }

                if accept(&self.cache, &coordinate_search, current_value) {
                    log::debug!("coordinate search accepted, rebuilding simplex");
                    let mut leftovers: Vec<Point> = self.simplex.drain(..).collect();
                    leftovers.extend(coordinate_search.iter().cloned());

                    self.simplex.push(current.clone());
                    for direction in &pattern {
                        self.simplex.push(current.add(&direction.mul(step)));
                    }
                    leftovers.retain(|p| !self.simplex.contains(p));
                    self.cache.abort(&leftovers);
                    simplex_computed = false;
                    self.stats.coordinate_acceptance += 1;
                } else {
                    log::debug!("coordinate search failed, halving step");
                    step /= 2.0;
                    self.stats.reduction_fallback += 1;
                }
            }

            log::debug!("ending step with simplex {}", fmt_points(&self.simplex));

            // The incumbent slot is always resolved here: a sorted set on
            // acceptance paths, the untouched incumbent otherwise.
            let new_value = self.cache.value(&self.simplex[0]);
            if !controller.step_taken(&current, current_value, &self.simplex[0], new_value, step) {
                break SearchStatus::ControllerStop;
            }
        };

        match status {
            SearchStatus::Interrupted => log::info!("optimization interrupted"),
            SearchStatus::ControllerStop => log::info!(
                "finishing optimization at {} value {} after {} steps",
                self.simplex[0],
                self.cache.value(&self.simplex[0]),
                self.stats.steps
            ),
        }
        status
    }

    /// Best point found so far.
    ///
    /// Valid once the first evaluation pass of [`optimize`] has
    /// completed; panics before that.
    pub fn optimum_point(&self) -> &Point {
        self.simplex
            .first()
            .expect("optimize has not produced an incumbent yet")
    }

    /// Objective value at [`optimum_point`](Self::optimum_point).
    pub fn optimum_value(&self) -> f64 {
        self.cache.value(self.optimum_point())
    }

    /// The current simplex, best-first. Read-only observability.
    pub fn simplex(&self) -> &[Point] {
        &self.simplex
    }

    /// The function cache driving this optimizer.
    pub fn function_cache(&self) -> &ParallelFunctionCache {
        &self.cache
    }

    /// Snapshot of the acceptance counters.
    pub fn statistics(&self) -> SearchStatistics {
        self.stats
    }

    /// Zeroes the acceptance counters.
    pub fn reset_statistics(&mut self) {
        self.stats.reset();
    }
}

/// Point-reflection of every non-incumbent vertex through the incumbent:
/// `2c - v`.
fn create_reflection(simplex: &[Point]) -> Vec<Point> {
    let current = &simplex[0];
    simplex
        .iter()
        .skip(1)
        .map(|v| current.mul(2.0).sub(v))
        .collect()
}

/// Extension of each reflected vertex further out: `3c - 2v`.
fn create_expansion(simplex: &[Point]) -> Vec<Point> {
    let current = &simplex[0];
    simplex
        .iter()
        .skip(1)
        .map(|v| current.mul(3.0).sub(&v.mul(2.0)))
        .collect()
}

/// The axis probes `c +- step * e_i` for every coordinate axis.
fn create_coordinate_search(current: &Point, step: f64) -> Vec<Point> {
    let mut points = Vec::with_capacity(2 * current.dim());
    for axis in 0..current.dim() {
        let offset = Point::zeros(current.dim()).set(axis, step);
        points.push(current.add(&offset));
        points.push(current.sub(&offset));
    }
    points
}

/// Moves every non-incumbent vertex halfway toward the incumbent.
fn contract(simplex: &mut [Point]) {
    let current = simplex[0].clone();
    for vertex in simplex.iter_mut().skip(1) {
        *vertex = vertex.add(&current).mul(0.5);
    }
}

/// A set is accepted iff some member strictly improves on the incumbent
/// value. Ties are rejected.
fn accept(cache: &ParallelFunctionCache, points: &[Point], current_value: f64) -> bool {
    points.iter().any(|p| cache.value(p) < current_value)
}

fn fmt_points(points: &[Point]) -> String {
    let rendered: Vec<String> = points.iter().map(Point::to_string).collect();
    format!("[{}]", rendered.join(", "))
}
