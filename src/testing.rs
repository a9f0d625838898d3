use crate::grid::{Grid, Sample};
use std::fmt::Debug;
use std::ops::Sub;

pub fn assert_eq_approx<T>(a: T, b: T, tolerance: T)
where
    T: PartialOrd + Sub<Output = T> + Copy + Debug,
{
    let diff = if a > b { a - b } else { b - a };
    if diff > tolerance {
        panic!(
            "assertion failed: `(left ~= right)`\n  left: `{:?}`,\n right: `{:?}`",
            a, b
        );
    }
}

/// Asserts that every sample of the grid equals `expected`.
pub fn assert_grid_constant<T: Sample>(grid: &Grid<T>, expected: T) {
    for (y, row) in grid.rows().enumerate() {
        for (x, value) in row.iter().enumerate() {
            if *value != expected {
                panic!(
                    "sample at ({}, {}) is {:?}, expected {:?}",
                    x, y, value, expected
                );
            }
        }
    }
}
