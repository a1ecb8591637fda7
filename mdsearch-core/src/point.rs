//! Immutable n-dimensional points.
//!
//! A [`Point`] is a simplex vertex and, at the same time, the key under
//! which its objective value is memoized. All arithmetic returns new
//! points; equality and hashing are bitwise per coordinate, so two points
//! produced by the same sequence of operations on the same inputs are the
//! same cache key.

use std::fmt;
use std::hash::{Hash, Hasher};

use nalgebra::DVector;

/// An immutable point in n-dimensional search space.
///
/// All points participating in one optimization run share the same
/// dimension; mixing dimensions in an arithmetic operation is a
/// programming error and panics.
#[derive(Debug, Clone)]
pub struct Point {
    coords: DVector<f64>,
}

impl Point {
    /// Creates a point from its coordinates. Panics if `coords` is empty.
    pub fn new(coords: Vec<f64>) -> Self {
        assert!(!coords.is_empty(), "a point must have at least one coordinate");
        Self {
            coords: DVector::from_vec(coords),
        }
    }

    /// Creates the origin of a `dim`-dimensional space.
    pub fn zeros(dim: usize) -> Self {
        assert!(dim >= 1, "a point must have at least one coordinate");
        Self {
            coords: DVector::zeros(dim),
        }
    }

    /// Number of coordinates.
    pub fn dim(&self) -> usize {
        self.coords.len()
    }

    /// The coordinate at `index`. Panics if out of range.
    pub fn coord(&self, index: usize) -> f64 {
        self.coords[index]
    }

    /// The coordinates as a slice.
    pub fn coords(&self) -> &[f64] {
        self.coords.as_slice()
    }

    /// Element-wise sum. Panics on dimension mismatch.
    pub fn add(&self, other: &Point) -> Point {
        self.check_dim(other);
        Point {
            coords: &self.coords + &other.coords,
        }
    }

    /// Element-wise difference. Panics on dimension mismatch.
    pub fn sub(&self, other: &Point) -> Point {
        self.check_dim(other);
        Point {
            coords: &self.coords - &other.coords,
        }
    }

    /// Uniform scaling by `scalar`.
    pub fn mul(&self, scalar: f64) -> Point {
        Point {
            coords: &self.coords * scalar,
        }
    }

    /// A copy with the coordinate at `index` replaced by `value`.
    pub fn set(&self, index: usize, value: f64) -> Point {
        assert!(
            index < self.dim(),
            "coordinate index {} out of range for dimension {}",
            index,
            self.dim()
        );
        let mut coords = self.coords.clone();
        coords[index] = value;
        Point { coords }
    }

    fn check_dim(&self, other: &Point) {
        assert_eq!(
            self.dim(),
            other.dim(),
            "point dimension mismatch: {} vs {}",
            self.dim(),
            other.dim()
        );
    }
}

impl From<Vec<f64>> for Point {
    fn from(coords: Vec<f64>) -> Self {
        Point::new(coords)
    }
}

impl From<&[f64]> for Point {
    fn from(coords: &[f64]) -> Self {
        Point::new(coords.to_vec())
    }
}

// Normalized bit view of a coordinate: both zero signs collapse to one
// key, NaN equals itself. Keeps Eq reflexive and Hash consistent with Eq.
fn key_bits(value: f64) -> u64 {
    if value == 0.0 {
        0
    } else {
        value.to_bits()
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Point) -> bool {
        self.dim() == other.dim()
            && self
                .coords()
                .iter()
                .zip(other.coords())
                .all(|(a, b)| key_bits(*a) == key_bits(*b))
    }
}

impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for c in self.coords() {
            key_bits(*c).hash(state);
        }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.coords().iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}
