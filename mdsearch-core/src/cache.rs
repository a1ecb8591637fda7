//! Memoizing, concurrent objective-function evaluator.
//!
//! The cache is the substrate that lets the optimizer overlap speculative
//! work with decision-making: candidate points are submitted with
//! [`compute`](ParallelFunctionCache::compute) (non-blocking), the control
//! thread blocks only in [`wait_for`](ParallelFunctionCache::wait_for),
//! and work that turns out to be unneeded is cancelled best-effort with
//! [`abort`](ParallelFunctionCache::abort).
//!
//! Evaluations run on a dedicated rayon pool sized to available
//! parallelism by default. A point whose evaluation has already started
//! may still complete after an abort; the contract only guarantees that
//! no *new* evaluation is started for an aborted point. Resolved values
//! are memoized for the lifetime of the cache, so re-submitting a known
//! point is a no-op.

use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::cancel::CancellationToken;
use crate::error::{EvaluationError, Interrupted};
use crate::point::Point;

/// How long a blocked wait sleeps between cancellation checks. Point
/// resolutions wake waiters immediately; this bounds only the latency of
/// observing an external cancellation.
const CANCEL_CHECK_INTERVAL: Duration = Duration::from_millis(25);

const LOCK_POISONED: &str = "function cache lock poisoned";

/// A black-box objective: lower values are better.
///
/// Implementations must be safe to call concurrently for distinct points.
/// A returned error is resolved by the cache as `f64::INFINITY` ("worse
/// than everything") and logged; the optimizer never sees it.
pub trait ObjectiveFunction: Send + Sync {
    /// Evaluates the objective at `point`.
    fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError>;
}

impl<F> ObjectiveFunction for F
where
    F: Fn(&Point) -> f64 + Send + Sync,
{
    fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError> {
        Ok(self(point))
    }
}

/// Externally observable state of a submitted point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointStatus {
    /// Submitted and not yet terminal (queued or currently evaluating).
    Pending,
    /// Evaluation finished; the value can be read with `value`.
    Resolved,
    /// Cancelled before its evaluation started.
    Aborted,
}

/// Read-only counters describing the cache's workload.
///
/// Purely observational; `evaluated` lagging `submitted` is the saving
/// bought by aborting speculative work.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStatistics {
    /// Evaluation requests scheduled on the pool (a point resubmitted
    /// after an abort counts again).
    pub submitted: u64,
    /// Objective evaluations actually run to completion.
    pub evaluated: u64,
    /// Points covered by abort requests, whether or not the request
    /// could be honored.
    pub abort_requests: u64,
    /// Points whose queued evaluation was cancelled before it started.
    pub aborted: u64,
}

#[derive(Debug, Clone, Copy)]
enum Entry {
    Queued,
    Running,
    Resolved(f64),
    Aborted,
}

impl Entry {
    fn is_terminal(&self) -> bool {
        matches!(self, Entry::Resolved(_) | Entry::Aborted)
    }
}

struct State {
    entries: HashMap<Point, Entry>,
    stats: CacheStatistics,
}

struct Shared {
    objective: Box<dyn ObjectiveFunction>,
    state: Mutex<State>,
    resolved: Condvar,
}

/// Thread-safe memoizing evaluator backed by a worker pool.
pub struct ParallelFunctionCache {
    shared: Arc<Shared>,
    pool: rayon::ThreadPool,
}

impl ParallelFunctionCache {
    /// Creates a cache whose pool is sized to available parallelism.
    pub fn new(objective: impl ObjectiveFunction + 'static) -> Self {
        Self::with_threads(objective, 0)
    }

    /// Creates a cache with an explicit worker count (`0` = automatic).
    pub fn with_threads(objective: impl ObjectiveFunction + 'static, threads: usize) -> Self {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("mdsearch-eval-{i}"))
            .build()
            .expect("failed to build evaluation thread pool");
        Self {
            shared: Arc::new(Shared {
                objective: Box::new(objective),
                state: Mutex::new(State {
                    entries: HashMap::new(),
                    stats: CacheStatistics::default(),
                }),
                resolved: Condvar::new(),
            }),
            pool,
        }
    }

    /// Schedules evaluation of every point in `points` that is not
    /// already queued, running, or resolved. Idempotent and non-blocking;
    /// an aborted point is re-queued.
    pub fn compute(&self, points: &[Point]) {
        let mut state = self.shared.state.lock().expect(LOCK_POISONED);
        for point in points {
            match state.entries.get(point).copied() {
                Some(Entry::Queued | Entry::Running | Entry::Resolved(_)) => continue,
                Some(Entry::Aborted) | None => {}
            }
            state.entries.insert(point.clone(), Entry::Queued);
            state.stats.submitted += 1;
            let shared = Arc::clone(&self.shared);
            let point = point.clone();
            self.pool.spawn(move || evaluate_task(&shared, point));
        }
    }

    /// Blocks until every point in `points` is terminal (resolved or
    /// aborted), or `token` is cancelled.
    ///
    /// Does not submit work. Panics if a point was never submitted: a
    /// wait on unsubmitted work would block forever, which is a contract
    /// violation on the caller's side.
    pub fn wait_for(&self, points: &[Point], token: &CancellationToken) -> Result<(), Interrupted> {
        let mut state = self.shared.state.lock().expect(LOCK_POISONED);
        loop {
            if token.is_cancelled() {
                return Err(Interrupted);
            }
            let pending = points.iter().any(|point| match state.entries.get(point) {
                Some(entry) => !entry.is_terminal(),
                None => panic!("wait_for called on a point that was never submitted: {point}"),
            });
            if !pending {
                return Ok(());
            }
            let (guard, _) = self
                .shared
                .resolved
                .wait_timeout(state, CANCEL_CHECK_INTERVAL)
                .expect(LOCK_POISONED);
            state = guard;
        }
    }

    /// Best-effort cancellation of the given points. Non-blocking: only
    /// queued evaluations are cancelled; a running evaluation may still
    /// resolve, and its value is simply left unused. Unknown or already
    /// terminal points are ignored.
    pub fn abort(&self, points: &[Point]) {
        let mut state = self.shared.state.lock().expect(LOCK_POISONED);
        let mut any_cancelled = false;
        for point in points {
            state.stats.abort_requests += 1;
            if matches!(state.entries.get(point).copied(), Some(Entry::Queued)) {
                state.entries.insert(point.clone(), Entry::Aborted);
                state.stats.aborted += 1;
                any_cancelled = true;
            }
        }
        // An aborted point is terminal, so waiters may now be done.
        if any_cancelled {
            self.shared.resolved.notify_all();
        }
    }

    /// The resolved value of `point`.
    ///
    /// Panics unless the point is resolved; callers must `wait_for` it
    /// first. Querying an aborted or never-submitted point is a
    /// programming error.
    pub fn value(&self, point: &Point) -> f64 {
        let state = self.shared.state.lock().expect(LOCK_POISONED);
        match state.entries.get(point) {
            Some(Entry::Resolved(value)) => *value,
            Some(entry) => panic!("value queried for unresolved point {point} ({entry:?})"),
            None => panic!("value queried for a point that was never submitted: {point}"),
        }
    }

    /// Current state of `point`, or `None` if it was never submitted.
    pub fn status(&self, point: &Point) -> Option<PointStatus> {
        let state = self.shared.state.lock().expect(LOCK_POISONED);
        state.entries.get(point).map(|entry| match entry {
            Entry::Queued | Entry::Running => PointStatus::Pending,
            Entry::Resolved(_) => PointStatus::Resolved,
            Entry::Aborted => PointStatus::Aborted,
        })
    }

    /// Snapshot of the workload counters.
    pub fn statistics(&self) -> CacheStatistics {
        self.shared.state.lock().expect(LOCK_POISONED).stats
    }
}

fn evaluate_task(shared: &Shared, point: Point) {
    {
        let mut state = shared.state.lock().expect(LOCK_POISONED);
        match state.entries.get(&point).copied() {
            // Claim the point so a later abort no longer applies.
            Some(Entry::Queued) => {
                state.entries.insert(point.clone(), Entry::Running);
            }
            // Aborted before starting, resolved by an earlier duplicate
            // task, or already claimed by another worker.
            _ => return,
        }
    }

    let value = match shared.objective.evaluate(&point) {
        Ok(value) => value,
        Err(err) => {
            log::warn!("objective failed at {point}: {err}; treating as +inf");
            f64::INFINITY
        }
    };

    let mut state = shared.state.lock().expect(LOCK_POISONED);
    state.entries.insert(point, Entry::Resolved(value));
    state.stats.evaluated += 1;
    shared.resolved.notify_all();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sum_of_squares(point: &Point) -> f64 {
        point.coords().iter().map(|c| c * c).sum()
    }

    /// Objective that blocks every evaluation until released, giving
    /// tests deterministic control over which points ever start.
    struct GatedObjective {
        gate: Arc<(Mutex<bool>, Condvar)>,
        started: Arc<AtomicUsize>,
    }

    impl GatedObjective {
        #[allow(clippy::type_complexity)]
        fn new() -> (Self, Arc<(Mutex<bool>, Condvar)>, Arc<AtomicUsize>) {
            let gate = Arc::new((Mutex::new(false), Condvar::new()));
            let started = Arc::new(AtomicUsize::new(0));
            let objective = Self {
                gate: Arc::clone(&gate),
                started: Arc::clone(&started),
            };
            (objective, gate, started)
        }

        fn release(gate: &Arc<(Mutex<bool>, Condvar)>) {
            let (lock, cvar) = gate.as_ref();
            *lock.lock().unwrap() = true;
            cvar.notify_all();
        }

        fn wait_until_started(started: &Arc<AtomicUsize>, count: usize) {
            while started.load(Ordering::SeqCst) < count {
                std::thread::yield_now();
            }
        }
    }

    impl ObjectiveFunction for GatedObjective {
        fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError> {
            self.started.fetch_add(1, Ordering::SeqCst);
            let (lock, cvar) = self.gate.as_ref();
            let mut open = lock.lock().unwrap();
            while !*open {
                open = cvar.wait(open).unwrap();
            }
            drop(open);
            Ok(sum_of_squares(point))
        }
    }

    #[test]
    fn compute_then_wait_then_value() {
        let cache = ParallelFunctionCache::new(sum_of_squares);
        let points = vec![
            Point::new(vec![1.0, 2.0]),
            Point::new(vec![3.0, 4.0]),
            Point::new(vec![0.0, 0.0]),
        ];
        cache.compute(&points);
        cache.wait_for(&points, &CancellationToken::new()).unwrap();
        assert_eq!(cache.value(&points[0]), 5.0);
        assert_eq!(cache.value(&points[1]), 25.0);
        assert_eq!(cache.value(&points[2]), 0.0);
    }

    #[test]
    fn resubmission_is_a_no_op() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let cache = ParallelFunctionCache::new(move |point: &Point| {
            counter.fetch_add(1, Ordering::SeqCst);
            sum_of_squares(point)
        });
        let points = vec![Point::new(vec![1.0]), Point::new(vec![2.0])];
        cache.compute(&points);
        cache.compute(&points);
        cache.wait_for(&points, &CancellationToken::new()).unwrap();
        cache.compute(&points);
        cache.wait_for(&points, &CancellationToken::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.statistics().submitted, 2);
    }

    #[test]
    fn abort_cancels_queued_points_only() {
        let blocked = Point::new(vec![9.0]);
        let queued = Point::new(vec![2.0]);
        let (objective, gate, started) = GatedObjective::new();
        // One worker: once it is inside the gate, later points stay queued.
        let cache = ParallelFunctionCache::with_threads(objective, 1);
        let token = CancellationToken::new();

        cache.compute(&[blocked.clone()]);
        GatedObjective::wait_until_started(&started, 1);
        cache.compute(&[queued.clone()]);
        cache.abort(&[queued.clone()]);
        assert_eq!(cache.status(&queued), Some(PointStatus::Aborted));

        GatedObjective::release(&gate);
        cache.wait_for(&[blocked.clone(), queued.clone()], &token).unwrap();
        assert_eq!(cache.value(&blocked), 81.0);
        assert_eq!(cache.status(&queued), Some(PointStatus::Aborted));

        let stats = cache.statistics();
        assert_eq!(stats.evaluated, 1);
        assert_eq!(stats.aborted, 1);
        assert_eq!(stats.abort_requests, 1);
    }

    #[test]
    fn aborted_point_can_be_resubmitted() {
        let blocked = Point::new(vec![9.0]);
        let victim = Point::new(vec![3.0]);
        let (objective, gate, started) = GatedObjective::new();
        let cache = ParallelFunctionCache::with_threads(objective, 1);
        let token = CancellationToken::new();

        cache.compute(&[blocked.clone()]);
        GatedObjective::wait_until_started(&started, 1);
        cache.compute(&[victim.clone()]);
        cache.abort(&[victim.clone()]);
        GatedObjective::release(&gate);

        cache.compute(&[victim.clone()]);
        cache.wait_for(&[blocked.clone(), victim.clone()], &token).unwrap();
        assert_eq!(cache.value(&victim), 9.0);
        assert_eq!(cache.statistics().submitted, 3);
    }

    #[test]
    fn abort_of_resolved_or_unknown_points_is_ignored() {
        let cache = ParallelFunctionCache::new(sum_of_squares);
        let known = Point::new(vec![1.0]);
        let unknown = Point::new(vec![7.0]);
        cache.compute(&[known.clone()]);
        cache.wait_for(&[known.clone()], &CancellationToken::new()).unwrap();

        cache.abort(&[known.clone(), unknown.clone()]);
        assert_eq!(cache.status(&known), Some(PointStatus::Resolved));
        assert_eq!(cache.status(&unknown), None);
        assert_eq!(cache.statistics().aborted, 0);
        assert_eq!(cache.statistics().abort_requests, 2);
    }

    #[test]
    fn failed_evaluation_resolves_to_infinity() {
        struct Failing;
        impl ObjectiveFunction for Failing {
            fn evaluate(&self, point: &Point) -> Result<f64, EvaluationError> {
                if point.coord(0) < 0.0 {
                    Err(EvaluationError::Rejected("negative region".into()))
                } else {
                    Ok(point.coord(0))
                }
            }
        }
        let cache = ParallelFunctionCache::new(Failing);
        let good = Point::new(vec![2.0]);
        let bad = Point::new(vec![-1.0]);
        cache.compute(&[good.clone(), bad.clone()]);
        cache
            .wait_for(&[good.clone(), bad.clone()], &CancellationToken::new())
            .unwrap();
        assert_eq!(cache.value(&good), 2.0);
        assert_eq!(cache.value(&bad), f64::INFINITY);
    }

    #[test]
    fn cancellation_wakes_a_blocked_wait() {
        let blocked = Point::new(vec![5.0]);
        let (objective, gate, _started) = GatedObjective::new();
        let cache = ParallelFunctionCache::with_threads(objective, 1);
        let token = CancellationToken::new();

        cache.compute(&[blocked.clone()]);
        let canceller = token.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            canceller.cancel();
        });

        assert_eq!(cache.wait_for(&[blocked.clone()], &token), Err(Interrupted));
        handle.join().unwrap();

        // Release the worker so the pool can shut down cleanly.
        GatedObjective::release(&gate);
        cache
            .wait_for(&[blocked], &CancellationToken::new())
            .unwrap();
    }

    #[test]
    #[should_panic(expected = "never submitted")]
    fn value_of_unknown_point_is_a_contract_violation() {
        let cache = ParallelFunctionCache::new(sum_of_squares);
        let _ = cache.value(&Point::new(vec![1.0]));
    }

    #[test]
    #[should_panic(expected = "never submitted")]
    fn wait_for_unknown_point_is_a_contract_violation() {
        let cache = ParallelFunctionCache::new(sum_of_squares);
        let _ = cache.wait_for(&[Point::new(vec![1.0])], &CancellationToken::new());
    }
}
