//! Testing utilities, do not depend on any of these in production!

use std::f64::consts::TAU;

use fastrand::Rng;
use itertools::Itertools;
use num::complex::Complex64;

use crate::{Config, Context};

/// Seeded stream of positive coefficient moduli spanning roughly
/// `10^-span ..= 10^span`, the magnitude spread the radii builder is
/// designed for.
pub struct ModuliStream {
    state: Rng,
    span: f64,
}

impl ModuliStream {
    #[must_use]
    pub fn new(seed: u64, span: f64) -> Self {
        Self {
            state: Rng::with_seed(seed),
            span,
        }
    }
}

impl Iterator for ModuliStream {
    type Item = f64;

    fn next(&mut self) -> Option<Self::Item> {
        Some(10f64.powf(self.state.f64().mul_add(2.0, -1.0) * self.span))
    }
}

/// Context over a polynomial with the given real coefficients.
///
/// # Panics
/// On degenerate input (degree below one, zero leading coefficient).
#[must_use]
pub fn context_from_real(coeffs: &[f64], cfg: Config) -> Context {
    let coeffs: Vec<Complex64> = coeffs.iter().map(|&c| Complex64::new(c, 0.0)).collect();
    Context::new(&coeffs, cfg).expect("test polynomial should be valid")
}

/// Checks that the points sit at exactly the expected angles (mod 2π),
/// each matched once, to within `tol` radians.
#[must_use]
pub fn check_angles(points: &[Complex64], expected: &[f64], tol: f64) -> bool {
    if points.len() != expected.len() {
        return false;
    }
    let mut remaining = expected.to_vec();
    for p in points {
        let Some(idx) = remaining
            .iter()
            .map(|&e| angle_distance(p.arg(), e))
            .position_min_by(f64::total_cmp)
        else {
            return false;
        };
        if angle_distance(p.arg(), remaining[idx]) > tol {
            return false;
        }
        remaining.remove(idx);
    }
    true
}

fn angle_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(TAU);
    d.min(TAU - d)
}
