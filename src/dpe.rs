//! Double-with-extended-exponent arithmetic.
//!
//! [`Rdpe`] is a real number stored as a normalized mantissa in `[0.5, 1)`
//! and a separate 64-bit binary exponent, so products and quotients of
//! values far outside the `f64` range stay representable. Complex values
//! at this tier are plain [`num::Complex<Rdpe>`].

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign};

use anyhow::bail;
use num::{Complex, Num, One, Zero};

/// A real number `m · 2^e` with `|m| ∈ [0.5, 1)` (or `m = 0`).
#[derive(Clone, Copy, Debug, Default)]
pub struct Rdpe {
    m: f64,
    e: i64,
}

/// Mantissa and binary exponent of a finite `f64`, with `|m| ∈ [0.5, 1)`.
fn frexp(x: f64) -> (f64, i64) {
    if x == 0.0 {
        return (0.0, 0);
    }
    let bits = x.to_bits();
    let exp_field = ((bits >> 52) & 0x7ff) as i64;
    if exp_field == 0 {
        // subnormal: renormalize through a scaled recursion
        let (m, e) = frexp(x * 2f64.powi(64));
        return (m, e - 64);
    }
    let m = f64::from_bits((bits & !(0x7ffu64 << 52)) | (1022u64 << 52));
    (m, exp_field - 1022)
}

impl Rdpe {
    pub const ZERO: Self = Self { m: 0.0, e: 0 };
    pub const ONE: Self = Self { m: 0.5, e: 1 };

    /// Smallest positive value of the tier. The exponent leaves headroom so
    /// that products of extremes cannot wrap the exponent field.
    pub const MIN: Self = Self {
        m: 0.5,
        e: i64::MIN / 2,
    };

    /// Largest value of the tier.
    pub const MAX: Self = Self {
        m: 0.5,
        e: i64::MAX / 2,
    };

    /// Builds `m · 2^e`, renormalizing the mantissa.
    #[must_use]
    pub fn from_parts(m: f64, e: i64) -> Self {
        if m == 0.0 {
            return Self::ZERO;
        }
        let (fm, fe) = frexp(m);
        Self {
            m: fm,
            e: fe.saturating_add(e),
        }
    }

    #[must_use]
    pub fn mantissa(self) -> f64 {
        self.m
    }

    #[must_use]
    pub fn exponent(self) -> i64 {
        self.e
    }

    /// Saturating conversion back to hardware double.
    #[must_use]
    pub fn to_f64(self) -> f64 {
        if self.m == 0.0 {
            return 0.0;
        }
        if self.e > 1024 {
            return if self.m > 0.0 { f64::MAX } else { -f64::MAX };
        }
        if self.e < -1073 {
            return 0.0;
        }
        if self.e == 1024 {
            // 2^1024 itself overflows, so split off one doubling
            return self.m * 2f64.powi(1023) * 2.0;
        }
        self.m * 2f64.powi(self.e as i32)
    }

    /// Natural logarithm as a hardware double. The result of `ln` fits an
    /// `f64` for every representable `Rdpe`, which is what makes the
    /// log-modulus Newton polygon computable at one common precision.
    #[must_use]
    pub fn ln(self) -> f64 {
        if self.m == 0.0 {
            return f64::NEG_INFINITY;
        }
        self.m.abs().ln() + self.e as f64 * std::f64::consts::LN_2
    }

    /// `e^x` for an `f64` exponent that may be far outside the `f64` range.
    #[must_use]
    pub fn exp(x: f64) -> Self {
        let k = (x / std::f64::consts::LN_2).floor();
        if k >= (i64::MAX / 2) as f64 {
            return Self::MAX;
        }
        if k <= (i64::MIN / 2) as f64 {
            return Self::MIN;
        }
        let f = x - k * std::f64::consts::LN_2;
        Self::from_parts(f.exp(), k as i64)
    }

    #[must_use]
    pub fn abs(self) -> Self {
        Self {
            m: self.m.abs(),
            e: self.e,
        }
    }

    #[must_use]
    pub fn sqrt(self) -> Self {
        debug_assert!(self.m >= 0.0, "sqrt of a negative value");
        if self.m == 0.0 {
            return Self::ZERO;
        }
        let (m, e) = if self.e & 1 == 0 {
            (self.m, self.e)
        } else {
            (self.m * 2.0, self.e - 1)
        };
        Self::from_parts(m.sqrt(), e / 2)
    }

    /// `sqrt(a² + b²)` without leaving the tier.
    #[must_use]
    pub fn hypot(a: Self, b: Self) -> Self {
        let a = a.abs();
        let b = b.abs();
        let (hi, lo) = if a < b { (b, a) } else { (a, b) };
        if hi.is_zero() {
            return Self::ZERO;
        }
        let r = (lo / hi).to_f64();
        hi * Self::from(r.mul_add(r, 1.0).sqrt())
    }

    fn sign(self) -> i8 {
        if self.m == 0.0 {
            0
        } else if self.m > 0.0 {
            1
        } else {
            -1
        }
    }
}

impl From<f64> for Rdpe {
    fn from(x: f64) -> Self {
        Self::from_parts(x, 0)
    }
}

impl PartialEq for Rdpe {
    fn eq(&self, other: &Self) -> bool {
        self.m == other.m && (self.e == other.e || self.m == 0.0)
    }
}

impl PartialOrd for Rdpe {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        let (s1, s2) = (self.sign(), other.sign());
        if s1 != s2 {
            return s1.partial_cmp(&s2);
        }
        if s1 == 0 {
            return Some(Ordering::Equal);
        }
        let by_exp = self.e.cmp(&other.e);
        Some(match by_exp {
            Ordering::Equal => self.m.partial_cmp(&other.m)?,
            // the exponent ranks magnitudes; flip it for negative values
            _ if s1 > 0 => by_exp,
            _ => by_exp.reverse(),
        })
    }
}

impl Neg for Rdpe {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            m: -self.m,
            e: self.e,
        }
    }
}

impl Add for Rdpe {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.m == 0.0 {
            return rhs;
        }
        if rhs.m == 0.0 {
            return self;
        }
        let d = self.e - rhs.e;
        // past 54 bits of misalignment the smaller operand cannot perturb
        // the larger one
        if d > 54 {
            return self;
        }
        if d < -54 {
            return rhs;
        }
        Self::from_parts(self.m + rhs.m * 2f64.powi(-(d as i32)), self.e)
    }
}

impl Sub for Rdpe {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Mul for Rdpe {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        if self.m == 0.0 || rhs.m == 0.0 {
            return Self::ZERO;
        }
        Self::from_parts(self.m * rhs.m, self.e.saturating_add(rhs.e))
    }
}

impl Div for Rdpe {
    type Output = Self;

    fn div(self, rhs: Self) -> Self {
        debug_assert!(rhs.m != 0.0, "division by zero");
        if self.m == 0.0 {
            return Self::ZERO;
        }
        Self::from_parts(self.m / rhs.m, self.e.saturating_sub(rhs.e))
    }
}

impl Rem for Rdpe {
    type Output = Self;

    fn rem(self, _rhs: Self) -> Self {
        unimplemented!()
    }
}

impl AddAssign for Rdpe {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Rdpe {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign for Rdpe {
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

impl DivAssign for Rdpe {
    fn div_assign(&mut self, rhs: Self) {
        *self = *self / rhs;
    }
}

impl RemAssign for Rdpe {
    fn rem_assign(&mut self, rhs: Self) {
        *self = *self % rhs;
    }
}

impl Zero for Rdpe {
    fn zero() -> Self {
        Self::ZERO
    }

    fn is_zero(&self) -> bool {
        self.m == 0.0
    }
}

impl One for Rdpe {
    fn one() -> Self {
        Self::ONE
    }
}

impl Num for Rdpe {
    type FromStrRadixErr = anyhow::Error;

    fn from_str_radix(_str: &str, _radix: u32) -> Result<Self, Self::FromStrRadixErr> {
        bail!("unimplemented")
    }
}

impl fmt::Display for Rdpe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.m == 0.0 {
            return write!(f, "0");
        }
        // re-express the binary exponent in decimal for readability
        let d = self.e as f64 * std::f64::consts::LOG10_2;
        let k = d.floor();
        let mantissa = self.m * 10f64.powf(d - k);
        write!(f, "{mantissa}e{k}")
    }
}

/// Modulus of a complex value at the DPE tier.
#[must_use]
pub fn cmod(z: &Complex<Rdpe>) -> Rdpe {
    Rdpe::hypot(z.re, z.im)
}

/// Complex value of modulus `r` at angle `theta`.
#[must_use]
pub fn from_polar(r: Rdpe, theta: f64) -> Complex<Rdpe> {
    Complex::new(r * Rdpe::from(theta.cos()), r * Rdpe::from(theta.sin()))
}

#[cfg(test)]
mod test {
    use super::{cmod, Rdpe};
    use num::{Complex, One, Zero};

    #[test]
    fn roundtrip_f64() {
        for x in [1.0, -1.0, 0.5, 1234.5678, -1e-300, 3.7e250, 0.0] {
            assert_eq!(Rdpe::from(x).to_f64(), x);
        }
    }

    #[test]
    fn arithmetic_matches_f64() {
        let a = Rdpe::from(3.25);
        let b = Rdpe::from(-1.5);
        assert_eq!((a + b).to_f64(), 1.75);
        assert_eq!((a - b).to_f64(), 4.75);
        assert_eq!((a * b).to_f64(), -4.875);
        assert_eq!((a / b).to_f64(), 3.25 / -1.5);
    }

    #[test]
    fn survives_f64_overflow() {
        let big = Rdpe::from(1e300);
        let huge = big * big * big;
        assert_eq!(huge.to_f64(), f64::MAX);
        let back = huge / big / big;
        assert!((back.to_f64() - 1e300).abs() / 1e300 < 1e-14);
    }

    #[test]
    fn ln_exp_inverse() {
        for x in [1.0, 700.0, -700.0, 12_345.678, -98_765.4] {
            let r = Rdpe::exp(x);
            assert!((r.ln() - x).abs() < 1e-9 * x.abs().max(1.0));
        }
    }

    #[test]
    fn ordering() {
        assert!(Rdpe::from(2.0) > Rdpe::from(1.0));
        assert!(Rdpe::from(-2.0) < Rdpe::from(-1.0));
        assert!(Rdpe::from(-1.0) < Rdpe::from(0.5));
        assert!(Rdpe::MIN < Rdpe::from(1e-300));
        assert!(Rdpe::MAX > Rdpe::from(1e300));
        assert!(Rdpe::zero() < Rdpe::one());
        assert_eq!(Rdpe::MAX, Rdpe::MAX);
    }

    #[test]
    fn sqrt_and_hypot() {
        let r = Rdpe::from(2.0).sqrt();
        assert!((r.to_f64() - std::f64::consts::SQRT_2).abs() < 1e-15);
        let h = Rdpe::hypot(Rdpe::from(3.0), Rdpe::from(4.0));
        assert!((h.to_f64() - 5.0).abs() < 1e-14);
        // way out of f64 range
        let h = Rdpe::hypot(Rdpe::exp(2000.0), Rdpe::zero());
        assert!((h.ln() - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn complex_ops() {
        let a = Complex::new(Rdpe::from(1.0), Rdpe::from(2.0));
        let b = Complex::new(Rdpe::from(-2.0), Rdpe::from(0.5));
        let p = a * b;
        assert!((p.re.to_f64() - -3.0).abs() < 1e-14);
        assert!((p.im.to_f64() - -3.5).abs() < 1e-14);
        assert!((cmod(&a).to_f64() - 5f64.sqrt()).abs() < 1e-14);
    }
}
