//! Bridges between the multiprecision tier and the DPE tier.
//!
//! Moduli, radii and geometric tests at the multiprecision tier are done
//! in DPE arithmetic — only roots and coefficients carry full precision —
//! so conversions in both directions are needed throughout restart and
//! shift.

use num::Complex;
use rug::Float;

use crate::dpe::Rdpe;

/// Saturating exponent clamp for shifts applied to a `rug::Float`.
fn shift_exp(e: i64) -> i32 {
    e.clamp(i64::from(i32::MIN / 2), i64::from(i32::MAX / 2)) as i32
}

pub(crate) fn float_to_rdpe(f: &Float) -> Rdpe {
    if f.is_zero() {
        return Rdpe::ZERO;
    }
    let (m, e) = f.to_f64_exp();
    Rdpe::from_parts(m, i64::from(e))
}

pub(crate) fn rdpe_to_float(r: Rdpe, prec: u32) -> Float {
    let mut f = Float::with_val(prec, r.mantissa());
    f <<= shift_exp(r.exponent());
    f
}

/// Modulus of a multiprecision complex value, in DPE range.
pub(crate) fn cmod(z: &rug::Complex) -> Rdpe {
    Rdpe::hypot(float_to_rdpe(z.real()), float_to_rdpe(z.imag()))
}

pub(crate) fn to_cdpe(z: &rug::Complex) -> Complex<Rdpe> {
    Complex::new(float_to_rdpe(z.real()), float_to_rdpe(z.imag()))
}

pub(crate) fn from_cdpe(z: &Complex<Rdpe>, prec: u32) -> rug::Complex {
    rug::Complex::with_val(prec, (rdpe_to_float(z.re, prec), rdpe_to_float(z.im, prec)))
}

/// Re-expresses every scratch coefficient at the given working precision.
pub(crate) fn set_prec_all(values: &mut [rug::Complex], prec: u32) {
    for v in values {
        v.set_prec(prec);
    }
}
