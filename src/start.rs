//! Placement of starting approximations.
//!
//! Each tier distributes a cluster's approximations over the annuli
//! derived by the radii builder, rotating every cluster's angular grid by
//! a scheduled offset so that successive clusters interleave instead of
//! aligning. Out-of-range radii are tagged on the root status; annuli
//! negligibly narrow relative to the shift mark their whole cluster
//! output-ready.

use std::f64::consts::{PI, TAU};

use num::complex::Complex64;
use num::{One, Zero};

use crate::context::{Context, Phase, Stage};
use crate::dpe::{self, Rdpe};
use crate::radii;
use crate::scalar::RadiusScalar;

pub(crate) fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// Advances the shared angular offset for cluster `i_cluster` of size `n`
/// so the new grid of `n` points avoids the previous cluster's grid of
/// `m` points: the step is `π·m·gcd(m, n) / (4n)`, a quarter of the
/// interleaving angle `π / lcm(m, n) · m²`.
pub(crate) fn maximize_distance(s: &mut Context, i_cluster: usize, n: usize) -> f64 {
    let m = s.clusters.size(i_cluster - 1);
    let delta_sigma = PI * (m * gcd(m, n)) as f64 / (4 * n) as f64;
    s.last_sigma += delta_sigma;
    s.last_sigma
}

fn pick_sigma(s: &mut Context, i_cluster: usize, n: usize) -> f64 {
    if s.cfg.random_seed.is_some() {
        return s.rng.f64() * TAU;
    }
    if i_cluster == 0 {
        s.last_sigma = 0.0;
        0.0
    } else {
        maximize_distance(s, i_cluster, n)
    }
}

/// Places fresh starting approximations for the whole polynomial at the
/// context's current tier.
pub fn fresh(s: &mut Context) {
    let n = s.n;
    let eps = s.cfg.eps_out;
    match s.phase {
        Phase::Float => {
            let fap = s.fap.clone();
            float(s, n, 0, 0.0, 0.0, eps, &fap);
        }
        Phase::Dpe => {
            let dap = s.dap.clone();
            dpe(s, n, 0, Rdpe::ZERO, Rdpe::ZERO, eps, &dap);
        }
        Phase::Mp => {
            let dap = s.dap.clone();
            mp(s, n, 0, Rdpe::ZERO, Rdpe::ZERO, eps, &dap);
        }
    }
}

/// Hardware-double placement.
///
/// `n` is the size of the cluster being placed, `g` the magnitude of the
/// shift (zero outside a restart), `fap` the `n + 1` coefficient moduli of
/// the (sub-)polynomial. Roots put on a clamped extreme radius are tagged
/// [`Stage::FloatOutOfRange`].
pub fn float(
    s: &mut Context,
    n: usize,
    i_cluster: usize,
    cluster_rad: f64,
    g: f64,
    eps: Rdpe,
    fap: &[f64],
) {
    debug_assert_eq!(fap.len(), n + 1);
    let sigma = pick_sigma(s, i_cluster, n);

    // user-supplied evaluation-only polynomials: equispaced unit circle
    if s.cfg.user_defined {
        let ang = TAU / n as f64;
        for i in 0..n {
            s.froot[i] = Complex64::from_polar(1.0, ang * i as f64 + sigma);
        }
        return;
    }

    let th = TAU / n as f64;
    let y = radii::log_moduli(fap, g);
    let ann = radii::starting_annuli::<f64>(&y, cluster_rad, s.cfg.circle_relative_distance);
    log::trace!("placing {n} roots on {} circles (sigma {sigma})", ann.len());

    for i in 0..ann.len() {
        let lo = ann.partitioning[i];
        let hi = ann.partitioning[i + 1];
        let nzeros = hi - lo;
        let ang = TAU / nzeros as f64;
        let r = ann.radii[i];

        for j in lo..hi {
            let l = if g == 0.0 { j } else { s.clusters.index(i_cluster, j) };
            if r.is_extreme() {
                s.status[l].stage = Stage::FloatOutOfRange;
            }
            let theta = ang * (j - lo) as f64 + th * hi as f64 + sigma;
            s.froot[l] = Complex64::from_polar(r, theta);
        }

        // a ring negligibly narrow relative to the shift means the whole
        // cluster is already good enough to report
        if g != 0.0 && r * nzeros as f64 <= (eps * Rdpe::from(g)).to_f64() {
            for j in 0..s.clusters.size(i_cluster) {
                let l = s.clusters.index(i_cluster, j);
                s.status[l].stage = Stage::OutputReady;
                s.frad[l] = r * nzeros as f64;
            }
        }
    }
}

/// Extended-exponent placement.
///
/// When the previous tier left [`Stage::FloatOutOfRange`] tags, only those
/// entries are re-placed; everything else keeps its float-tier value.
/// Roots on a clamped extreme radius are tagged
/// [`Stage::NotRepresentable`].
pub fn dpe(
    s: &mut Context,
    n: usize,
    i_cluster: usize,
    cluster_rad: Rdpe,
    g: Rdpe,
    eps: Rdpe,
    dap: &[Rdpe],
) {
    debug_assert_eq!(dap.len(), n + 1);
    let sigma = pick_sigma(s, i_cluster, n);

    if s.cfg.user_defined {
        let ang = TAU / n as f64;
        for i in 0..n {
            s.droot[i] = dpe::from_polar(Rdpe::one(), ang * i as f64 + sigma);
        }
        return;
    }

    let after_float = (0..n).any(|i| s.status[i].stage == Stage::FloatOutOfRange);

    let th = TAU / n as f64;
    let y = radii::log_moduli(dap, g);
    let ann = radii::starting_annuli::<Rdpe>(&y, cluster_rad, s.cfg.circle_relative_distance);
    log::trace!("placing {n} roots on {} circles (sigma {sigma})", ann.len());

    for i in 0..ann.len() {
        let lo = ann.partitioning[i];
        let hi = ann.partitioning[i + 1];
        let nzeros = hi - lo;
        let ang = TAU / nzeros as f64;
        let r = ann.radii[i];

        for j in lo..hi {
            let l = if g.is_zero() {
                j
            } else {
                s.clusters.index(i_cluster, j)
            };
            let theta = ang * (j - lo) as f64 + th * hi as f64 + sigma;

            if after_float {
                // recompute only the approximations the float tier lost
                if s.status[l].stage == Stage::FloatOutOfRange {
                    s.droot[l] = dpe::from_polar(r, theta);
                    s.status[l].stage = if r.is_extreme() {
                        Stage::NotRepresentable
                    } else {
                        Stage::Iterating
                    };
                }
            } else {
                s.droot[l] = dpe::from_polar(r, theta);
                if r.is_extreme() {
                    s.status[l].stage = Stage::NotRepresentable;
                }
            }
        }

        if !g.is_zero() && r * Rdpe::from_usize(nzeros) <= g * eps {
            for j in 0..s.clusters.size(i_cluster) {
                let l = s.clusters.index(i_cluster, j);
                s.status[l].stage = Stage::OutputReady;
                s.drad[l] = r * Rdpe::from_usize(nzeros);
            }
        }
    }
}

/// Multiprecision placement.
///
/// Placement geometry never needs more than DPE accuracy, so the points
/// land in the DPE root vector; the multiprecision restart promotes them
/// into `mroot` once the shift is accepted. Returns the radius of the
/// outermost annulus, the new width of the cluster being placed.
pub fn mp(
    s: &mut Context,
    n: usize,
    i_cluster: usize,
    cluster_rad: Rdpe,
    g: Rdpe,
    eps: Rdpe,
    dap: &[Rdpe],
) -> Rdpe {
    debug_assert_eq!(dap.len(), n + 1);
    let sigma = pick_sigma(s, i_cluster, n);

    if s.cfg.user_defined {
        let ang = TAU / n as f64;
        for i in 0..n {
            s.droot[i] = dpe::from_polar(Rdpe::one(), ang * i as f64 + sigma);
        }
        return cluster_rad;
    }

    let th = TAU / n as f64;
    let y = radii::log_moduli_mp(dap, s.mpwp);
    let ann = radii::starting_annuli::<Rdpe>(&y, cluster_rad, s.cfg.circle_relative_distance);
    log::trace!("placing {n} roots on {} circles (sigma {sigma})", ann.len());

    let mut new_rad = cluster_rad;
    for i in 0..ann.len() {
        let lo = ann.partitioning[i];
        let hi = ann.partitioning[i + 1];
        let nzeros = hi - lo;
        let ang = TAU / nzeros as f64;
        let r = ann.radii[i];

        for j in lo..hi {
            let l = if g.is_zero() {
                j
            } else {
                s.clusters.index(i_cluster, j)
            };
            let theta = ang * (j - lo) as f64 + th * hi as f64 + sigma;
            s.droot[l] = dpe::from_polar(r, theta);
            if r.is_extreme() {
                s.status[l].stage = Stage::NotRepresentable;
            }
        }

        if !g.is_zero() && r * Rdpe::from_usize(nzeros) <= g * eps {
            for j in 0..s.clusters.size(i_cluster) {
                let l = s.clusters.index(i_cluster, j);
                s.status[l].stage = Stage::OutputReady;
                s.drad[l] = r * Rdpe::from_usize(nzeros);
            }
        }
        new_rad = r;
    }
    new_rad
}
