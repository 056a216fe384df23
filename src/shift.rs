//! Horner deflation: recentring the polynomial at a gravity centre.
//!
//! Computes the first `m + 1` coefficients of `p(x + g)` by iterated
//! Horner divisions and hands their moduli straight to the placer for the
//! recentred sub-problem. The multiprecision variant raises its working
//! precision until the constant term carries at least one correct bit.

use num::complex::Complex64;
use num::{Complex, Num};

use crate::config::Config;
use crate::context::Context;
use crate::dpe::{self, Rdpe};
use crate::mp;
use crate::start;

/// First `m + 1` coefficients of `p(x + g)`.
///
/// The working vector starts as the input coefficients, so the first pass
/// folds in `a_j` and later passes fold in the previous pass's values.
pub(crate) fn deflate<T: Num + Clone>(
    coeffs: &[Complex<T>],
    m: usize,
    g: &Complex<T>,
) -> Vec<Complex<T>> {
    let n = coeffs.len() - 1;
    debug_assert!(m <= n);

    let mut b = coeffs.to_vec();
    let mut out = Vec::with_capacity(m + 1);
    for i in 0..=m {
        let mut t = b[n].clone();
        for j in (i..n).rev() {
            t = t * g.clone() + b[j].clone();
            b[j] = t.clone();
        }
        out.push(b[i].clone());
    }
    out
}

/// Shift at the hardware-double tier, then reseed the cluster.
pub fn float(s: &mut Context, m: usize, i_cluster: usize, cluster_rad: f64, g: Complex64, eps: Rdpe) {
    let c = deflate(&s.fpc, m, &g);
    let fap1: Vec<f64> = c.iter().map(|z| num::Complex::norm(*z)).collect();
    start::float(s, m, i_cluster, cluster_rad, g.norm(), eps, &fap1);
}

/// Shift at the extended-exponent tier, then reseed the cluster.
pub fn dpe(
    s: &mut Context,
    m: usize,
    i_cluster: usize,
    cluster_rad: Rdpe,
    g: Complex<Rdpe>,
    eps: Rdpe,
) {
    let c = deflate(&s.dpc, m, &g);
    let dap1: Vec<Rdpe> = c.iter().map(dpe::cmod).collect();
    start::dpe(s, m, i_cluster, cluster_rad, dpe::cmod(&g), eps, &dap1);
}

/// Shift at the multiprecision tier, then reseed the cluster.
///
/// The first deflation pass re-runs at increasing working precision until
/// `|c_0|` exceeds its forward error bound `4(n+1)·ε_wp·Σ_j j·|g|^{n-j}·|a_j|`,
/// capped at `max(wp so far, 2·m·prec_out)`. Later passes decay back
/// towards the base precision one unit per pass. If the bound is never
/// beaten the placer gets uniformly degenerate moduli, which downstream
/// tags the cluster out-of-range rather than failing.
///
/// Returns the new width of the cluster, as reported by the placer.
pub fn mp(s: &mut Context, m: usize, i_cluster: usize, cluster_rad: Rdpe, g: &rug::Complex) -> Rdpe {
    let n = s.n;
    let base = s.mpwp;
    let cap = (u64::from(s.cfg.prec_out) * m as u64 * 2).min(u64::from(u32::MAX)) as u32;
    let ag = mp::cmod(g);

    let mut wp = base;
    let mut wp_max = base;
    let mut mp_ep = Config::mp_epsilon(wp);
    let mut gw = g.clone();
    let mut b: Vec<rug::Complex> = s.mfpc.clone();
    let mut c: Vec<rug::Complex> = vec![rug::Complex::with_val(base, (0.0, 0.0)); m + 1];

    let mut value;
    let mut bound;
    let mut k = 0;
    loop {
        // first pass, accumulating the forward error bound alongside
        let mut t = b[n].clone();
        let mut ap = mp::cmod(&s.mfpc[n]);
        for j in (0..n).rev() {
            let abp = mp::cmod(&s.mfpc[j]) * Rdpe::from(j as f64);
            ap = ap * ag + abp;
            t *= &gw;
            t += &b[j];
            b[j] = t.clone();
        }
        c[0] = t.clone();
        value = mp::cmod(&t);
        bound = ap * mp_ep * Rdpe::from(4.0 * (n + 1) as f64);
        k += 1;

        if value < bound {
            wp += base;
            if wp > wp_max.max(cap) {
                log::debug!("reached the maximum allowed precision in shift");
                break;
            }
            log::trace!("raising shift working precision to {wp} bits");
            mp_ep = Config::mp_epsilon(wp);
            gw.set_prec(wp);
            mp::set_prec_all(&mut b, wp);
            mp::set_prec_all(&mut c, wp);
            if wp_max < wp {
                wp_max = wp;
            }
            // re-expand the inputs at the new precision
            for (bj, aj) in b.iter_mut().zip(&s.mfpc) {
                *bj = rug::Complex::with_val(wp, aj);
            }
        }
        if !(value < bound && k <= m) {
            break;
        }
    }

    // later passes may run at progressively lower precision
    for i in 1..=m {
        wp = wp.saturating_sub(base).max(base);
        gw.set_prec(wp);
        mp::set_prec_all(&mut b, wp);
        let mut t = b[n].clone();
        for j in (i..n).rev() {
            t *= &gw;
            t += &b[j];
            b[j] = t.clone();
        }
        c[i] = t;
    }

    // every scratch value returns to the base precision before placement
    mp::set_prec_all(&mut c, base);

    let dap1: Vec<Rdpe> = if value < bound {
        // precision exhausted: degenerate moduli, placer will tag the
        // cluster accordingly
        vec![value; m + 1]
    } else {
        c.iter().map(mp::cmod).collect()
    };

    let eps = s.cfg.eps_out;
    start::mp(s, m, i_cluster, cluster_rad, ag, eps, &dap1)
}
