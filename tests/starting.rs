//! Placement behaviour through the public API.

use std::f64::consts::TAU;

use num::complex::Complex64;
use polystart::util::testing::{check_angles, context_from_real, ModuliStream};
use polystart::{radii, start, Clusters, Config, Phase, Rdpe, Stage};

#[test]
fn monomial_gets_unit_circle_with_zero_offset() {
    // p(x) = x^5 - 1
    let mut s = context_from_real(&[-1.0, 0.0, 0.0, 0.0, 0.0, 1.0], Config::default());
    start::fresh(&mut s);

    assert_eq!(s.last_sigma, 0.0);
    for z in &s.froot {
        assert!((z.norm() - 1.0).abs() < 1e-14);
    }
    let expected: Vec<f64> = (0..5).map(|k| TAU * k as f64 / 5.0).collect();
    assert!(check_angles(&s.froot, &expected, 1e-14));
}

#[test]
fn monomial_on_the_dpe_tier() {
    let mut s = context_from_real(&[-1.0, 0.0, 0.0, 0.0, 0.0, 1.0], Config::default());
    s.phase = Phase::Dpe;
    start::fresh(&mut s);
    for z in &s.droot {
        assert!((polystart::dpe::cmod(z).to_f64() - 1.0).abs() < 1e-14);
    }
}

#[test]
fn degree_one_places_a_single_point() {
    // p(x) = 3x - 6: one annulus of radius 2
    let mut s = context_from_real(&[-6.0, 3.0], Config::default());
    start::fresh(&mut s);
    assert!((s.froot[0].norm() - 2.0).abs() < 1e-14);
}

#[test]
fn cluster_permutation_routes_slots_to_members() {
    let mut s = context_from_real(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0], Config::default());
    s.set_clusters(Clusters::from_parts(vec![5, 2, 0, 1, 3, 4], vec![0, 3, 6]).unwrap())
        .unwrap();
    for z in &mut s.froot {
        *z = Complex64::new(f64::NAN, f64::NAN);
    }

    // place only cluster 1 (members 1, 3 and 4) of a recentred sub-problem
    let moduli = [1.0, 2.0, 1.0, 0.5];
    let eps = s.cfg.eps_out;
    start::float(&mut s, 3, 1, 0.0, 0.5, eps, &moduli);

    for l in [1, 3, 4] {
        assert!(s.froot[l].re.is_finite(), "member {l} must be placed");
    }
    for l in [0, 2, 5] {
        assert!(s.froot[l].re.is_nan(), "outsider {l} must be untouched");
    }
}

#[test]
fn negligible_annulus_marks_cluster_output_ready() {
    let mut s = context_from_real(&[1.0, 1.0, 1.0], Config::default());
    s.set_clusters(Clusters::from_parts(vec![0, 1], vec![0, 2]).unwrap())
        .unwrap();

    // sub-problem whose innermost ring is far below eps_out * |g|
    let moduli = [1e-30, 1e30, 1.0];
    let eps = s.cfg.eps_out;
    start::float(&mut s, 2, 0, 0.0, 0.7, eps, &moduli);

    for l in 0..2 {
        assert_eq!(s.status[l].stage, Stage::OutputReady);
        assert!(s.frad[l] <= 1e-16);
    }
}

#[test]
fn annuli_structure_holds_for_wild_moduli() {
    for seed in 0..32 {
        let moduli: Vec<f64> = ModuliStream::new(seed, 40.0).take(24).collect();
        let y = radii::log_moduli(&moduli, 0.0);
        let ann = radii::starting_annuli::<f64>(&y, 0.0, 0.005);

        assert_eq!(ann.partitioning[0], 0);
        assert_eq!(*ann.partitioning.last().unwrap(), 23);
        assert!(ann.partitioning.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(ann.partitioning.len(), ann.len() + 1);
        assert!(ann.radii.windows(2).all(|w| w[0] <= w[1]));
        for r in &ann.radii {
            assert!(*r >= f64::MIN_POSITIVE && *r <= f64::MAX);
        }
    }
}

#[test]
fn dpe_radii_agree_with_float_when_in_range() {
    let moduli_f: Vec<f64> = ModuliStream::new(9, 6.0).take(10).collect();
    let moduli_d: Vec<Rdpe> = moduli_f.iter().map(|&a| Rdpe::from(a)).collect();
    let yf = radii::log_moduli(&moduli_f, 0.0);
    let yd = radii::log_moduli(&moduli_d, Rdpe::ZERO);
    let af = radii::starting_annuli::<f64>(&yf, 0.0, 0.005);
    let ad = radii::starting_annuli::<Rdpe>(&yd, Rdpe::ZERO, 0.005);

    assert_eq!(af.partitioning, ad.partitioning);
    for (rf, rd) in af.radii.iter().zip(&ad.radii) {
        assert!((rf - rd.to_f64()).abs() <= 1e-12 * rf);
    }
}

#[test]
fn sigma_advances_per_cluster_and_resets_on_first() {
    let mut s = context_from_real(&[1.0; 13], Config::default());
    s.set_clusters(
        Clusters::from_parts((0..12).collect(), vec![0, 3, 8, 12]).unwrap(),
    )
    .unwrap();

    let eps = s.cfg.eps_out;
    start::float(&mut s, 3, 0, 0.0, 0.0, eps, &[1.0; 4]);
    start::float(&mut s, 5, 1, 0.0, 0.0, eps, &[1.0; 6]);
    start::float(&mut s, 4, 2, 0.0, 0.0, eps, &[1.0; 5]);
    let first_run = s.last_sigma;
    assert!(first_run > 0.0);

    // placing a first cluster again resets the schedule
    start::float(&mut s, 3, 0, 0.0, 0.0, eps, &[1.0; 4]);
    assert_eq!(s.last_sigma, 0.0);
}
