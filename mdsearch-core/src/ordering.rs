//! Ordering of points by cached objective value.

use std::cmp::Ordering;

use crate::cache::ParallelFunctionCache;
use crate::point::Point;

/// Total order over points by their resolved value, ascending, so that a
/// sorted simplex carries the incumbent at index 0.
///
/// Every compared point must already be resolved; the optimizer only
/// sorts after a `wait_for`. Comparing an unresolved point panics via
/// [`ParallelFunctionCache::value`]. NaN orders after every real value,
/// i.e. worse than everything.
pub struct ValueOrdering<'a> {
    cache: &'a ParallelFunctionCache,
}

impl<'a> ValueOrdering<'a> {
    /// Creates an ordering backed by `cache`.
    pub fn new(cache: &'a ParallelFunctionCache) -> Self {
        Self { cache }
    }

    /// Compares two points by resolved value.
    pub fn compare(&self, a: &Point, b: &Point) -> Ordering {
        self.cache.value(a).total_cmp(&self.cache.value(b))
    }

    /// Sorts `points` ascending by resolved value. The sort is stable,
    /// so ties keep their submission order and runs stay reproducible.
    pub fn sort(&self, points: &mut [Point]) {
        points.sort_by(|a, b| self.compare(a, b));
    }
}
