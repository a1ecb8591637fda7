//! Quadratic bowl example demonstrating the multidirectional search.
//!
//! Minimizes:
//!   f(x, y) = (x - 3)^2 + (y + 1)^2
//! starting from the origin.
//!
//! Optimal solution: (3, -1), objective = 0

use mdsearch_core::{optimize, CancellationToken, Point, SearchSettings};

fn main() {
    println!("mdsearch - Quadratic Bowl Example");
    println!("=================================");
    println!();

    // The objective only sees a Point; everything else about the model
    // stays on the caller's side of the boundary.
    let objective = |p: &Point| {
        let (x, y) = (p.coord(0), p.coord(1));
        (x - 3.0).powi(2) + (y + 1.0).powi(2)
    };

    // Stop below 1e-9 or after 200 iterations, printing the trajectory.
    let mut iterations = 0;
    let mut controller = |_prev: &Point, _prev_value: f64, new: &Point, value: f64, step: f64| {
        iterations += 1;
        println!("iter {iterations:>3}: best = {new}  f = {value:.3e}  step = {step}");
        value > 1e-9 && iterations < 200
    };

    let result = optimize(
        objective,
        Point::new(vec![0.0, 0.0]),
        SearchSettings::default(),
        &mut controller,
        &CancellationToken::new(),
    );

    println!();
    println!("=== Solution ===");
    println!("Status: {}", result.status);
    println!("Optimum: {}", result.optimum);
    println!("Objective value: {:.6e}", result.optimum_value);
    println!("Branches taken: {}", result.statistics);
}
