//! Cluster restarts.
//!
//! Scans the registry for clusters worth recentring: computes the
//! weighted super-centre and enclosing super-radius, verifies the cluster
//! is far enough from everything else for Newton iteration to stay in its
//! basin, walks a gravity centre to a zero of the (m−1)-st derivative,
//! shifts the polynomial there and reseeds the cluster's approximations.
//! Every failure tags the cluster and defers to a later pass of the outer
//! iteration; nothing here aborts the solve.

use num::complex::Complex64;
use num::{Complex, Zero};

use crate::config::Goal;
use crate::context::{Context, Isolation, Phase, Stage};
use crate::dpe::{self, Rdpe};
use crate::mp;
use crate::newton;
use crate::shift;

/// Runs the restart pass at the context's current tier.
pub fn run(s: &mut Context) {
    match s.phase {
        Phase::Float => float(s),
        Phase::Dpe => dpe(s),
        Phase::Mp => mp(s),
    }
}

/// A cluster qualifies for a shift attempt when every member still wants
/// iteration and at least one member is iterating with unknown isolation
/// (or known isolation, unless the goal is only to count roots).
fn shift_eligible(s: &Context, i: usize) -> bool {
    let members = s.clusters.indices(i);
    if members.iter().any(|&l| !s.again[l]) {
        return false;
    }
    members.iter().any(|&l| {
        let st = s.status[l];
        st.stage == Stage::Iterating
            && (st.isolation == Isolation::Unknown
                || (s.cfg.goal != Goal::Count && st.isolation == Isolation::Isolated))
    })
}

/// Weighted centre of cluster `i` and the radius of the disk that holds
/// all of its members' inclusion disks. The weights are the inclusion
/// radii themselves.
fn super_disk_float(s: &Context, i: usize) -> (Complex64, f64) {
    let mut wsum = 0.0;
    let mut sc = Complex64::zero();
    for &l in s.clusters.indices(i) {
        wsum += s.frad[l];
        sc += s.froot[l] * s.frad[l];
    }
    sc /= wsum;
    let mut sr = 0.0f64;
    for &l in s.clusters.indices(i) {
        sr = sr.max((sc - s.froot[l]).norm() + s.frad[l]);
    }
    (sc, sr)
}

fn super_disk_dpe(s: &Context, i: usize) -> (Complex<Rdpe>, Rdpe) {
    let mut wsum = Rdpe::ZERO;
    let mut sc = Complex::new(Rdpe::ZERO, Rdpe::ZERO);
    for &l in s.clusters.indices(i) {
        wsum = wsum + s.drad[l];
        sc = sc + s.droot[l] * s.drad[l];
    }
    sc = sc / wsum;
    let mut sr = Rdpe::ZERO;
    for &l in s.clusters.indices(i) {
        let r = dpe::cmod(&(sc - s.droot[l])) + s.drad[l];
        if sr < r {
            sr = r;
        }
    }
    (sc, sr)
}

fn super_disk_mp(s: &Context, i: usize) -> (rug::Complex, Rdpe) {
    let wp = s.mpwp;
    let mut wsum = rug::Float::with_val(wp, 0.0);
    for &l in s.clusters.indices(i) {
        wsum += mp::rdpe_to_float(s.drad[l], wp);
    }
    let mut sc = rug::Complex::with_val(wp, (0.0, 0.0));
    for &l in s.clusters.indices(i) {
        let mut t = s.mroot[l].clone();
        t *= &mp::rdpe_to_float(s.drad[l], wp);
        sc += &t;
    }
    sc /= &wsum;
    let mut sr = Rdpe::ZERO;
    for &l in s.clusters.indices(i) {
        let mut d = sc.clone();
        d -= &s.mroot[l];
        let r = mp::cmod(&d) + s.drad[l];
        if sr < r {
            sr = r;
        }
    }
    (sc, sr)
}

/// Restart pass at the hardware-double tier.
pub fn float(s: &mut Context) {
    // user-supplied polynomials cannot be recentred: no coefficients
    if s.cfg.user_defined {
        return;
    }

    for i in 0..s.clusters.count() {
        if s.clusters.size(i) == 1 {
            continue;
        }
        if !shift_eligible(s, i) {
            continue;
        }

        let (sc, sr) = super_disk_float(s, i);

        // a cluster straddling the origin cannot be recentred
        if sr > sc.norm() {
            s.tag_cluster(i, Stage::Iterating);
            log::debug!("cluster {i} relatively large, skipping restart");
            continue;
        }

        // Newton isolation against every root outside the cluster
        let kn = 5.0 * s.n as f64;
        let mut isolated = true;
        'isolation: for k in 0..s.clusters.count() {
            if k == i {
                continue;
            }
            for &p in s.clusters.indices(k) {
                if (sc - s.froot[p]).norm() < (sr + s.frad[p]) * kn {
                    isolated = false;
                    break 'isolation;
                }
            }
        }
        if !isolated {
            s.tag_cluster(i, Stage::Iterating);
            log::debug!("cluster {i} not Newton isolated, skipping restart");
            continue;
        }

        let m = s.clusters.size(i);

        // (m-1)-st derivative of p; the modulus sum feeds the overflow
        // guard below
        let mut sum = 0.0;
        let mut der: Vec<Complex64> = Vec::with_capacity(s.n + 1);
        for a in &s.fpc {
            sum += a.norm();
            der.push(*a);
        }
        for j in 1..m {
            for k in 0..=(s.n - j) {
                der[k] = der[k + 1] * (k + 1) as f64;
            }
        }
        der.truncate(s.n - m + 2);
        let moduli: Vec<f64> = der.iter().map(|c| num::Complex::norm(*c)).collect();

        // bounded Newton from the super centre towards a gravity centre
        let np = s.n - m + 1;
        let mut g = sc;
        let mut converged = false;
        for _ in 0..s.cfg.max_newt_it {
            let step = newton::float(np, g, &der, &moduli);
            g -= step.correction;
            if !step.keep_going {
                converged = true;
                break;
            }
        }
        if !converged {
            log::debug!("exceeded maximum Newton iterations in restart");
            continue;
        }
        if (sc - g).norm() > sr {
            log::debug!("gravity centre falls outside the cluster");
            continue;
        }

        // predicted overflow of the shifted coefficients: leave this
        // cluster for a higher tier
        if s.n as f64 * g.norm().ln() + sum.ln() > f64::MAX.ln() {
            continue;
        }

        let eps = s.cfg.eps_out;
        shift::float(s, m, i, sr, g, eps);

        // fresh inclusion radii proportional to the recentred moduli,
        // floored at the shift's own roundoff
        let floor = g.norm() * f64::EPSILON * 2.0;
        for j in 0..m {
            let l = s.clusters.index(i, j);
            s.frad[l] = 2.0 * m as f64 * s.froot[l].norm();
            s.froot[l] += g;
            if s.frad[l] < floor {
                s.frad[l] = floor;
            }
        }
    }
}

/// Restart pass at the extended-exponent tier.
pub fn dpe(s: &mut Context) {
    if s.cfg.user_defined {
        return;
    }

    for i in 0..s.clusters.count() {
        if s.clusters.size(i) == 1 {
            continue;
        }
        if !shift_eligible(s, i) {
            continue;
        }

        let (sc, sr) = super_disk_dpe(s, i);

        if sr > dpe::cmod(&sc) {
            s.tag_cluster(i, Stage::Iterating);
            log::debug!("cluster {i} relatively large, skipping restart");
            continue;
        }

        let kn = Rdpe::from(5.0 * s.n as f64);
        let mut isolated = true;
        'isolation: for k in 0..s.clusters.count() {
            if k == i {
                continue;
            }
            for &p in s.clusters.indices(k) {
                if dpe::cmod(&(sc - s.droot[p])) < (sr + s.drad[p]) * kn {
                    isolated = false;
                    break 'isolation;
                }
            }
        }
        if !isolated {
            s.tag_cluster(i, Stage::Iterating);
            log::debug!("cluster {i} not Newton isolated, skipping restart");
            continue;
        }

        let m = s.clusters.size(i);

        let mut der: Vec<Complex<Rdpe>> = s.dpc.clone();
        for j in 1..m {
            for k in 0..=(s.n - j) {
                der[k] = der[k + 1] * Rdpe::from((k + 1) as f64);
            }
        }
        der.truncate(s.n - m + 2);
        let moduli: Vec<Rdpe> = der.iter().map(dpe::cmod).collect();

        let np = s.n - m + 1;
        let mut g = sc;
        let mut converged = false;
        for _ in 0..s.cfg.max_newt_it {
            let step = newton::dpe(np, g, &der, &moduli);
            g = g - step.correction;
            if !step.keep_going {
                converged = true;
                break;
            }
        }
        if !converged {
            log::debug!("exceeded maximum Newton iterations in restart");
            continue;
        }
        if dpe::cmod(&(sc - g)) > sr {
            log::debug!("gravity centre falls outside the cluster");
            continue;
        }

        let eps = s.cfg.eps_out;
        shift::dpe(s, m, i, sr, g, eps);

        let floor = dpe::cmod(&g) * Rdpe::from(f64::EPSILON * 2.0);
        for j in 0..m {
            let l = s.clusters.index(i, j);
            s.drad[l] = dpe::cmod(&s.droot[l]) * Rdpe::from((2 * m) as f64);
            s.droot[l] = s.droot[l] + g;
            if s.drad[l] < floor {
                s.drad[l] = floor;
            }
        }
    }
}

/// Restart pass at the multiprecision tier.
pub fn mp(s: &mut Context) {
    if s.cfg.user_defined {
        return;
    }

    for i in 0..s.clusters.count() {
        if s.clusters.size(i) == 1 {
            continue;
        }
        if !shift_eligible(s, i) {
            continue;
        }

        let (sc, sr) = super_disk_mp(s, i);
        log::trace!("restarting cluster {i}: sr {sr}");

        if sr > mp::cmod(&sc) {
            s.tag_cluster(i, Stage::Iterating);
            log::debug!("cluster {i} relatively large, skipping restart");
            continue;
        }

        // Newton isolation, accumulated form: the attraction of every
        // outside disk on the super disk must stay small
        if !mp_isolated(s, i, &sc, sr) {
            s.tag_cluster(i, Stage::Iterating);
            log::debug!("cluster {i} not Newton isolated, skipping restart");
            continue;
        }

        let m = s.clusters.size(i);

        let mut der: Vec<rug::Complex> = s.mfpc.clone();
        for j in 1..m {
            for k in 0..=(s.n - j) {
                let t = rug::Complex::with_val(s.mpwp, &der[k + 1] * (k + 1) as u32);
                der[k] = t;
            }
        }
        der.truncate(s.n - m + 2);
        let moduli: Vec<Rdpe> = der.iter().map(mp::cmod).collect();
        let spar1: Option<Vec<bool>> = if s.cfg.sparse {
            Some(moduli.iter().map(|a| !a.is_zero()).collect())
        } else {
            None
        };

        let np = s.n - m + 1;
        let mut g = sc.clone();
        let mut converged = false;
        for _ in 0..s.cfg.max_newt_it {
            let step = newton::mp(np, &g, &der, &moduli, spar1.as_deref(), s.mpwp);
            if step.keep_going {
                g -= &step.correction;
            } else {
                converged = true;
                break;
            }
        }
        if !converged {
            log::debug!("exceeded maximum Newton iterations in restart");
            continue;
        }
        let mut d = sc.clone();
        d -= &g;
        if mp::cmod(&d) > sr {
            log::debug!("gravity centre falls outside the cluster");
            continue;
        }

        // stage the current approximations at dpe precision; the shift
        // places the new ones into the same vector
        for j in 0..m {
            let l = s.clusters.index(i, j);
            s.droot[l] = mp::to_cdpe(&s.mroot[l]);
        }

        // accept the shift only if it shrank the cluster to a quarter
        let threshold = sr * Rdpe::from(0.25);
        let new_sr = shift::mp(s, m, i, sr, &g);
        if new_sr < threshold {
            let floor = mp::cmod(&g) * s.mp_epsilon() * Rdpe::from(2.0);
            for j in 0..m {
                let l = s.clusters.index(i, j);
                s.mroot[l] = mp::from_cdpe(&s.droot[l], s.mpwp);
                s.mroot[l] += &g;
                let r = dpe::cmod(&s.droot[l]) * Rdpe::from((2 * m) as f64);
                s.drad[l] = if r < floor { floor } else { r };
            }
        } else {
            log::debug!("restart of cluster {i} not performed: new radius is larger");
        }
    }
}

/// The accumulated isolation test of the multiprecision tier: the sum of
/// `sr / (|sc - root| - sr - rad)` over all outside roots must not
/// exceed 0.3.
fn mp_isolated(s: &Context, i: usize, sc: &rug::Complex, sr: Rdpe) -> bool {
    let mut total = Rdpe::ZERO;
    for k in 0..s.clusters.count() {
        if k == i {
            continue;
        }
        for &p in s.clusters.indices(k) {
            let mut d = sc.clone();
            d -= &s.mroot[p];
            let t = mp::cmod(&d) - s.drad[p] - sr;
            total = total + Rdpe::ONE / t;
        }
    }
    total * sr <= Rdpe::from(0.3)
}

/// Isolation-only probe at the multiprecision tier: runs the eligibility,
/// width and isolation checks of a restart without shifting anything, and
/// records success on the context.
pub fn mp_isolation_probe(s: &mut Context) {
    if s.cfg.user_defined {
        return;
    }

    for i in 0..s.clusters.count() {
        if s.clusters.size(i) == 1 {
            continue;
        }
        if !shift_eligible(s, i) {
            continue;
        }

        let (sc, sr) = super_disk_mp(s, i);

        if sr > mp::cmod(&sc) {
            s.tag_cluster(i, Stage::Iterating);
            log::debug!("cluster {i} relatively large, skipping probe");
            continue;
        }
        if !mp_isolated(s, i, &sc, sr) {
            s.tag_cluster(i, Stage::Iterating);
            log::debug!("cluster {i} not Newton isolated");
            continue;
        }
        s.newton_isolated = true;
    }
}
