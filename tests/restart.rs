//! Restart behaviour through the public API.

use num::complex::Complex64;
use num::Complex;
use polystart::util::testing::context_from_real;
use polystart::{dpe, restart, shift, Clusters, Config, Context, Phase, Rdpe, Stage};

/// p(x) = (x-1)²(x+5) = x³ + 3x² - 9x + 5: a double root with a distant
/// simple root, the textbook shift-worthy cluster.
fn double_root_context() -> Context {
    let mut s = context_from_real(&[5.0, -9.0, 3.0, 1.0], Config::default());
    s.set_clusters(Clusters::from_parts(vec![0, 1, 2], vec![0, 2, 3]).unwrap())
        .unwrap();
    s
}

#[test]
fn float_restart_recentres_a_double_root() {
    let mut s = double_root_context();
    s.froot[0] = Complex64::new(1.05, 0.02);
    s.froot[1] = Complex64::new(0.95, -0.02);
    s.froot[2] = Complex64::new(-5.0, 0.0);
    s.frad = vec![0.1, 0.1, 1e-10];

    restart::run(&mut s);

    for l in 0..2 {
        assert!(
            (s.froot[l] - Complex64::new(1.0, 0.0)).norm() < 1e-6,
            "member {l} should be recentred on the double root, got {}",
            s.froot[l]
        );
        assert!(s.frad[l] < 1e-6);
    }
    // the far simple root is not touched
    assert_eq!(s.froot[2], Complex64::new(-5.0, 0.0));
    assert_eq!(s.frad[2], 1e-10);
}

#[test]
fn restart_skips_a_cluster_straddling_the_origin() {
    let mut s = double_root_context();
    s.froot[0] = Complex64::new(0.1, 0.0);
    s.froot[1] = Complex64::new(-0.1, 0.0);
    s.froot[2] = Complex64::new(-5.0, 0.0);
    s.frad = vec![0.5, 0.5, 1e-10];
    let before = s.froot.clone();

    restart::run(&mut s);

    assert_eq!(s.froot, before);
    assert_eq!(s.status[0].stage, Stage::Iterating);
}

#[test]
fn restart_skips_a_cluster_without_newton_isolation() {
    let mut s = double_root_context();
    s.froot[0] = Complex64::new(1.05, 0.0);
    s.froot[1] = Complex64::new(0.95, 0.0);
    // outsider close enough to violate the 5n separation factor
    s.froot[2] = Complex64::new(1.5, 0.0);
    s.frad = vec![0.1, 0.1, 1e-10];
    let before = s.froot.clone();

    restart::run(&mut s);

    assert_eq!(s.froot, before);
}

#[test]
fn restart_respects_the_again_flags() {
    let mut s = double_root_context();
    s.froot[0] = Complex64::new(1.05, 0.0);
    s.froot[1] = Complex64::new(0.95, 0.0);
    s.froot[2] = Complex64::new(-5.0, 0.0);
    s.frad = vec![0.1, 0.1, 1e-10];
    s.again[1] = false;
    let before = s.froot.clone();

    restart::run(&mut s);

    assert_eq!(s.froot, before);
}

#[test]
fn dpe_restart_recentres_a_double_root() {
    let mut s = double_root_context();
    s.phase = Phase::Dpe;
    s.droot[0] = Complex::new(Rdpe::from(1.05), Rdpe::from(0.02));
    s.droot[1] = Complex::new(Rdpe::from(0.95), Rdpe::from(-0.02));
    s.droot[2] = Complex::new(Rdpe::from(-5.0), Rdpe::ZERO);
    s.drad = vec![Rdpe::from(0.1), Rdpe::from(0.1), Rdpe::from(1e-10)];

    restart::run(&mut s);

    for l in 0..2 {
        let d = dpe::cmod(&(s.droot[l] - Complex::new(Rdpe::ONE, Rdpe::ZERO)));
        assert!(d.to_f64() < 1e-6);
        assert!(s.drad[l].to_f64() < 1e-6);
    }
    assert_eq!(s.droot[2], Complex::new(Rdpe::from(-5.0), Rdpe::ZERO));
}

/// p(x) = (x-√2)²(x+5): the double root is not representable, so the
/// shifted constant term is tiny but non-zero.
fn surd_double_root_context() -> Context {
    let r = std::f64::consts::SQRT_2;
    let coeffs = [10.0, 2.0 - 10.0 * r, 5.0 - 2.0 * r, 1.0];
    let mut s = context_from_real(&coeffs, Config::default());
    s.set_clusters(Clusters::from_parts(vec![0, 1, 2], vec![0, 2, 3]).unwrap())
        .unwrap();
    s
}

#[test]
fn mp_restart_recentres_a_double_root() {
    let r = std::f64::consts::SQRT_2;
    let mut s = surd_double_root_context();
    s.phase = Phase::Mp;
    s.mroot[0] = rug::Complex::with_val(64, (r + 0.05, 0.01));
    s.mroot[1] = rug::Complex::with_val(64, (r - 0.05, -0.01));
    s.mroot[2] = rug::Complex::with_val(64, (-5.0, 0.0));
    s.drad = vec![Rdpe::from(0.1), Rdpe::from(0.1), Rdpe::from(1e-10)];

    restart::run(&mut s);

    for l in 0..2 {
        let err = (s.mroot[l].real().to_f64() - r).abs() + s.mroot[l].imag().to_f64().abs();
        assert!(err < 1e-4, "member {l} should land near the double root");
        assert!(s.drad[l].to_f64() < 1e-4);
    }
    assert_eq!(s.mroot[2].real().to_f64(), -5.0);
}

#[test]
fn mp_restart_rejects_an_unisolated_cluster() {
    let mut s = double_root_context();
    s.phase = Phase::Mp;
    s.set_clusters(Clusters::from_parts(vec![0, 1, 2], vec![0, 2, 3]).unwrap())
        .unwrap();
    // three-ish cluster at 1 with an outsider at distance 2·sr
    s.mroot[0] = rug::Complex::with_val(64, (1.0, 0.0));
    s.mroot[1] = rug::Complex::with_val(64, (1.0, 0.0));
    s.mroot[2] = rug::Complex::with_val(64, (1.02, 0.0));
    s.drad = vec![Rdpe::from(0.01), Rdpe::from(0.01), Rdpe::from(1e-6)];
    let before: Vec<f64> = s.mroot.iter().map(|z| z.real().to_f64()).collect();

    restart::run(&mut s);

    let after: Vec<f64> = s.mroot.iter().map(|z| z.real().to_f64()).collect();
    assert_eq!(before, after);
}

#[test]
fn isolation_probe_confirms_and_rejects() {
    // isolated: the outsider is far away
    let mut s = double_root_context();
    s.mroot[0] = rug::Complex::with_val(64, (1.0, 0.0));
    s.mroot[1] = rug::Complex::with_val(64, (1.0, 0.0));
    s.mroot[2] = rug::Complex::with_val(64, (-5.0, 0.0));
    s.drad = vec![Rdpe::from(0.01), Rdpe::from(0.01), Rdpe::from(1e-6)];
    restart::mp_isolation_probe(&mut s);
    assert!(s.newton_isolated);

    // not isolated: outsider at twice the super radius
    let mut s = double_root_context();
    s.mroot[0] = rug::Complex::with_val(64, (1.0, 0.0));
    s.mroot[1] = rug::Complex::with_val(64, (1.0, 0.0));
    s.mroot[2] = rug::Complex::with_val(64, (1.02, 0.0));
    s.drad = vec![Rdpe::from(0.01), Rdpe::from(0.01), Rdpe::from(1e-6)];
    restart::mp_isolation_probe(&mut s);
    assert!(!s.newton_isolated);
    assert_eq!(s.status[0].stage, Stage::Iterating);
}

#[test]
fn mp_shift_degenerates_gracefully_on_an_exact_multiple_root() {
    // the shifted constant term is exactly zero, so no working precision
    // can beat the error bound; the placer still gets usable moduli
    let mut s = double_root_context();
    let g = rug::Complex::with_val(64, (1.0, 0.0));
    let new_sr = shift::mp(&mut s, 2, 0, Rdpe::from(0.1), &g);

    assert_eq!(new_sr, Rdpe::from(0.1));
    for l in 0..2 {
        assert!((dpe::cmod(&s.droot[l]).to_f64() - 0.1).abs() < 1e-12);
    }
    // scratch precision changes must not leak into the context
    assert_eq!(s.mpwp, 64);
    assert_eq!(s.mfpc[0].prec(), (64, 64));
}

#[test]
fn singleton_clusters_are_never_restarted() {
    let mut s = context_from_real(&[5.0, -9.0, 3.0, 1.0], Config::default());
    s.froot[0] = Complex64::new(1.05, 0.0);
    s.froot[1] = Complex64::new(0.95, 0.0);
    s.froot[2] = Complex64::new(-5.0, 0.0);
    let before = s.froot.clone();

    restart::run(&mut s);

    assert_eq!(s.froot, before);
}
