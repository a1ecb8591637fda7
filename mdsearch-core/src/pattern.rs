//! Search pattern generation.
//!
//! The initial simplex is seeded by adding each pattern direction, scaled
//! by the step size, to the caller's starting point. The directions must
//! be linearly independent so the simplex spans the search space, and
//! deterministic so repeated runs take identical decisions.

use crate::point::Point;

/// Generators for the fixed direction sets that shape an initial simplex.
pub struct SearchPattern;

impl SearchPattern {
    /// The "square" pattern for dimension `dim`: one unit vector per
    /// coordinate axis. Panics if `dim` is zero.
    pub fn square(dim: usize) -> Vec<Point> {
        assert!(dim >= 1, "search pattern requires dimension >= 1");
        (0..dim).map(|axis| Point::zeros(dim).set(axis, 1.0)).collect()
    }
}
