//! One bounded Newton step per tier.
//!
//! The restart stage walks a gravity-centre candidate towards a zero of
//! the deflated derivative with these steps. Each evaluation runs Horner
//! on the value and its derivative together while accumulating a modulus
//! bound of the round-off, so the step can tell when further iterations
//! would only chase noise.

use num::complex::Complex64;
use num::{Complex, Zero};

use crate::config::Config;
use crate::dpe::{self, Rdpe};
use crate::mp;

/// Outcome of a single step: the correction to subtract from the current
/// point, an inclusion-radius estimate, and whether another step can still
/// improve it.
#[derive(Clone, Debug)]
pub struct Step<C, R> {
    pub correction: C,
    pub radius: R,
    pub keep_going: bool,
}

/// Newton step at the hardware-double tier.
///
/// `n` is the degree of `coeffs`; `moduli` carries the coefficient moduli
/// used for the round-off bound.
#[must_use]
pub fn float(n: usize, x: Complex64, coeffs: &[Complex64], moduli: &[f64]) -> Step<Complex64, f64> {
    debug_assert!(coeffs.len() > n && moduli.len() > n);

    let ax = x.norm();
    let mut p = coeffs[n];
    let mut p1 = Complex64::zero();
    let mut ap = moduli[n];
    for j in (0..n).rev() {
        p1 = p1 * x + p;
        p = p * x + coeffs[j];
        ap = ap.mul_add(ax, moduli[j]);
    }

    let bound = 4.0 * (n + 1) as f64 * f64::EPSILON * ap;
    if p1.is_zero() {
        // stationary point: a correction cannot be trusted from here
        return Step {
            correction: Complex64::zero(),
            radius: f64::MAX,
            keep_going: false,
        };
    }
    let correction = p / p1;
    Step {
        correction,
        radius: n as f64 * correction.norm(),
        keep_going: p.norm() > bound,
    }
}

/// Newton step at the extended-exponent tier.
#[must_use]
pub fn dpe(
    n: usize,
    x: Complex<Rdpe>,
    coeffs: &[Complex<Rdpe>],
    moduli: &[Rdpe],
) -> Step<Complex<Rdpe>, Rdpe> {
    debug_assert!(coeffs.len() > n && moduli.len() > n);

    let ax = dpe::cmod(&x);
    let mut p = coeffs[n];
    let mut p1 = Complex::new(Rdpe::ZERO, Rdpe::ZERO);
    let mut ap = moduli[n];
    for j in (0..n).rev() {
        p1 = p1 * x + p;
        p = p * x + coeffs[j];
        ap = ap * ax + moduli[j];
    }

    let bound = Rdpe::from(4.0 * (n + 1) as f64 * f64::EPSILON) * ap;
    if p1.is_zero() {
        return Step {
            correction: Complex::new(Rdpe::ZERO, Rdpe::ZERO),
            radius: Rdpe::MAX,
            keep_going: false,
        };
    }
    let correction = p / p1;
    Step {
        correction,
        radius: Rdpe::from(n as f64) * dpe::cmod(&correction),
        keep_going: dpe::cmod(&p) > bound,
    }
}

/// Newton step at the multiprecision tier.
///
/// `spar`, when given, masks coefficients known to vanish so their terms
/// are skipped. The round-off bound uses the unit roundoff at `wp`.
#[must_use]
pub fn mp(
    n: usize,
    x: &rug::Complex,
    coeffs: &[rug::Complex],
    moduli: &[Rdpe],
    spar: Option<&[bool]>,
    wp: u32,
) -> Step<rug::Complex, Rdpe> {
    debug_assert!(coeffs.len() > n && moduli.len() > n);

    let ax = mp::cmod(x);
    let mut p = coeffs[n].clone();
    let mut p1 = rug::Complex::with_val(wp, (0.0, 0.0));
    let mut ap = moduli[n];
    for j in (0..n).rev() {
        p1 *= x;
        p1 += &p;
        p *= x;
        if spar.map_or(true, |m| m[j]) {
            p += &coeffs[j];
        }
        ap = ap * ax + moduli[j];
    }

    let bound = Rdpe::from(4.0 * (n + 1) as f64) * Config::mp_epsilon(wp) * ap;
    if p1.real().is_zero() && p1.imag().is_zero() {
        return Step {
            correction: rug::Complex::with_val(wp, (0.0, 0.0)),
            radius: Rdpe::MAX,
            keep_going: false,
        };
    }
    let mut correction = p.clone();
    correction /= &p1;
    let radius = Rdpe::from(n as f64) * mp::cmod(&correction);
    Step {
        correction,
        radius,
        keep_going: mp::cmod(&p) > bound,
    }
}

#[cfg(test)]
mod test {
    use super::{dpe, float, mp};
    use crate::dpe::Rdpe;
    use num::complex::Complex64;
    use num::Complex;

    // p(x) = x^2 - 2
    const COEFFS: [f64; 3] = [-2.0, 0.0, 1.0];

    #[test]
    fn float_converges_to_sqrt_two() {
        let coeffs: Vec<Complex64> = COEFFS.iter().map(|&c| Complex64::new(c, 0.0)).collect();
        let moduli: Vec<f64> = COEFFS.iter().map(|c| c.abs()).collect();
        let mut x = Complex64::new(1.0, 0.0);
        for _ in 0..20 {
            let step = float(2, x, &coeffs, &moduli);
            if !step.keep_going {
                break;
            }
            x -= step.correction;
        }
        assert!((x.re - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn float_stops_at_noise_level() {
        let coeffs: Vec<Complex64> = COEFFS.iter().map(|&c| Complex64::new(c, 0.0)).collect();
        let moduli: Vec<f64> = COEFFS.iter().map(|c| c.abs()).collect();
        let step = float(2, Complex64::new(std::f64::consts::SQRT_2, 0.0), &coeffs, &moduli);
        assert!(!step.keep_going);
    }

    #[test]
    fn float_refuses_stationary_point() {
        let coeffs: Vec<Complex64> = COEFFS.iter().map(|&c| Complex64::new(c, 0.0)).collect();
        let moduli: Vec<f64> = COEFFS.iter().map(|c| c.abs()).collect();
        let step = float(2, Complex64::new(0.0, 0.0), &coeffs, &moduli);
        assert!(!step.keep_going);
    }

    #[test]
    fn dpe_matches_float() {
        let coeffs: Vec<Complex<Rdpe>> = COEFFS
            .iter()
            .map(|&c| Complex::new(Rdpe::from(c), Rdpe::ZERO))
            .collect();
        let moduli: Vec<Rdpe> = COEFFS.iter().map(|c| Rdpe::from(c.abs())).collect();
        let step = dpe(2, Complex::new(Rdpe::from(1.5), Rdpe::ZERO), &coeffs, &moduli);
        assert!(step.keep_going);
        // p/p' at 1.5 is 0.25 / 3
        assert!((step.correction.re.to_f64() - 0.25 / 3.0).abs() < 1e-14);
    }

    #[test]
    fn mp_converges_to_sqrt_two() {
        let wp = 128;
        let coeffs: Vec<rug::Complex> = COEFFS
            .iter()
            .map(|&c| rug::Complex::with_val(wp, (c, 0.0)))
            .collect();
        let moduli: Vec<Rdpe> = COEFFS.iter().map(|c| Rdpe::from(c.abs())).collect();
        let mut x = rug::Complex::with_val(wp, (1.0, 0.0));
        for _ in 0..20 {
            let step = mp(2, &x, &coeffs, &moduli, None, wp);
            if !step.keep_going {
                break;
            }
            x -= &step.correction;
        }
        let err = (x.real().to_f64() - std::f64::consts::SQRT_2).abs();
        assert!(err < 1e-15);
    }
}
