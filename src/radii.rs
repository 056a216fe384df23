//! Annular radii from the Newton polygon.
//!
//! The slopes of the upper convex hull of `(i, ln|a_i|)` bound the root
//! moduli annulus by annulus (Rouché-based criterion of
//! [Bini 1996](https://doi.org/10.1007/BF02207694)). The same walk runs at
//! every arithmetic tier; only the radius type changes.

use std::f64::consts::LN_2;

use num::Zero;

use crate::dpe::Rdpe;
use crate::hull::upper_convex_hull;
use crate::scalar::RadiusScalar;

/// A partition of a cluster's slots onto concentric circles.
///
/// Annulus `i` has radius `radii[i]` and owns the slot indices
/// `partitioning[i]..partitioning[i + 1]`; `partitioning` starts at 0 and
/// ends at the cluster size.
#[derive(Clone, Debug, PartialEq)]
pub struct Annuli<R> {
    pub radii: Vec<R>,
    pub partitioning: Vec<usize>,
}

impl<R> Annuli<R> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }
}

/// Log-moduli with vanishing coefficients replaced by a pseudo-value.
///
/// Inside a recentred sub-problem (`g ≠ 0`) trailing coefficients may have
/// been annihilated by the shift; they are refilled from the first
/// surviving modulus, scaled by the working precision and the shift
/// magnitude. Outside a shift the substitute is simply twice the log of
/// the smallest positive value of the tier.
pub fn log_moduli<R: RadiusScalar>(moduli: &[R], g: R) -> Vec<f64> {
    let temp = if g.is_zero() {
        2.0 * R::ln_min_positive()
    } else {
        let ni = moduli.iter().position(|a| !a.is_zero()).unwrap_or(0);
        if ni == 0 {
            2.0 * R::ln_min_positive()
        } else {
            moduli[ni].ln()
                + ni as f64 * (f64::EPSILON.ln() + (g * R::from_usize(ni * 10)).ln())
        }
    };
    moduli
        .iter()
        .map(|&a| if a.is_zero() { temp } else { a.ln() })
        .collect()
}

/// Multiprecision fill-in: a vanishing constant term stands in for
/// `2^-mpwp`, and every other vanishing modulus copies slot zero.
pub fn log_moduli_mp(moduli: &[Rdpe], mpwp: u32) -> Vec<f64> {
    let y0 = if moduli[0].is_zero() {
        -f64::from(mpwp) * LN_2
    } else {
        moduli[0].ln()
    };
    moduli
        .iter()
        .enumerate()
        .map(|(i, &a)| {
            if i == 0 || a.is_zero() {
                y0
            } else {
                a.ln()
            }
        })
        .collect()
}

/// Derives the annuli for one placement call from filled-in log-moduli.
///
/// Hull slopes are exponentiated with clamping at the tier extremes; a
/// non-zero `cluster_rad` additionally caps every radius. Neighbouring
/// annuli closer than `delta` (relative) are merged afterwards.
pub fn starting_annuli<R: RadiusScalar>(y: &[f64], cluster_rad: R, delta: f64) -> Annuli<R> {
    let n = y.len() - 1;
    let h = upper_convex_hull(y);

    let mut radii: Vec<R> = Vec::new();
    let mut partitioning: Vec<usize> = vec![0];
    for i in 1..=n {
        if !h[i] {
            continue;
        }
        let iold = *partitioning.last().expect("starts non-empty");
        let nzeros = i - iold;
        let t = (y[iold] - y[i]) / nzeros as f64;
        let mut r = R::exp_clamped(t);
        if !cluster_rad.is_zero() && r > cluster_rad {
            r = cluster_rad;
        }
        radii.push(r);
        partitioning.push(i);
    }
    debug_assert_eq!(*partitioning.last().expect("non-empty"), n);

    compact(&mut radii, &mut partitioning, delta);
    Annuli {
        radii,
        partitioning,
    }
}

/// Merges runs of annuli whose radii sit within `delta` of the first of
/// the run. The merged annulus takes the arithmetic mean radius and
/// inherits the run's upper slot boundary.
pub(crate) fn compact<R: RadiusScalar>(
    radii: &mut Vec<R>,
    partitioning: &mut Vec<usize>,
    delta: f64,
) {
    let mut i = 0;
    while i < radii.len() {
        let mut j = i + 1;
        while j < radii.len() && ((radii[j] - radii[i]) / radii[i]).to_f64() <= delta {
            j += 1;
        }
        if j - i > 1 {
            log::debug!("compacting circles from {i} to {j}");
            let mut sum = radii[i];
            for k in i + 1..j {
                sum = sum + radii[k];
            }
            radii[i] = sum / R::from_usize(j - i);
            partitioning[i + 1] = partitioning[j];
            radii.drain(i + 1..j);
            partitioning.drain(i + 2..=j);
        }
        i += 1;
    }
}
