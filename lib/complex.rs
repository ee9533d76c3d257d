//! Helpers for working with complex amplitudes.
//!
//! Amplitudes are plain [`num_complex::Complex64`]s; everything here is
//! implemented as an extension on that type so that the usual arithmetic
//! operators remain available.

use std::f64::consts::TAU;
use num_complex::Complex64 as C64;
use crate::tensor::{ TensorError, TensorResult };

/// Return `true` if `a` and `b` are within `1e-12` of each other.
pub fn c64_eq<A, B>(a: A, b: B) -> bool
where
    A: Into<C64>,
    B: Into<C64>,
{
    (a.into() - b.into()).norm() < 1e-12
}

/// Rendering style for [`ComplexExt::format_with`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ComplexFormat {
    /// `(re +imi)`
    #[default]
    Cartesian,
    /// `r exp(φi)`, with *φ* in radians.
    Polar,
    /// `r exp(tτi)`, with the phase *t* given in turns.
    PolarTau,
}

/// Operations on [`C64`] that `num_complex` doesn't provide directly.
pub trait ComplexExt: Sized {
    /// Divide `self` by `rhs`, failing if `rhs` is exactly zero.
    fn checked_div(&self, rhs: Self) -> TensorResult<Self>;

    /// Return the argument of `self`, mapped to `[0, 2π)`.
    fn arg_pos(&self) -> f64;

    /// Rescale `self` to unit magnitude, failing if `self` is exactly zero.
    fn to_unit(&self) -> TensorResult<Self>;

    /// Return `true` if the Euclidean distance between `self` and `other` is
    /// less than `eps`.
    fn is_close_to(&self, other: &Self, eps: f64) -> bool;

    /// Render `self` in the given format with `precision` decimal places.
    fn format_with(&self, format: ComplexFormat, precision: usize) -> String;
}

// fixed-precision float formatting without a negative zero
fn fmt_fixed(x: f64, precision: usize) -> String {
    let s = format!("{:.*}", precision, x);
    match s.strip_prefix('-') {
        Some(rest) if rest.chars().all(|c| c == '0' || c == '.') => rest.to_string(),
        _ => s,
    }
}

impl ComplexExt for C64 {
    fn checked_div(&self, rhs: Self) -> TensorResult<Self> {
        if rhs.norm_sqr() == 0.0 {
            Err(TensorError::DivideByZero)
        } else {
            Ok(self / rhs)
        }
    }

    fn arg_pos(&self) -> f64 {
        let arg = self.im.atan2(self.re);
        if arg < 0.0 { arg + TAU } else { arg }
    }

    fn to_unit(&self) -> TensorResult<Self> {
        let r = self.norm();
        if r == 0.0 {
            Err(TensorError::ZeroNorm)
        } else {
            Ok(self.unscale(r))
        }
    }

    fn is_close_to(&self, other: &Self, eps: f64) -> bool {
        (self - other).norm() < eps
    }

    fn format_with(&self, format: ComplexFormat, precision: usize) -> String {
        match format {
            ComplexFormat::Cartesian => {
                let re = fmt_fixed(self.re, precision);
                let im = fmt_fixed(self.im, precision);
                let sign = if im.starts_with('-') { "" } else { "+" };
                format!("({} {}{}i)", re, sign, im)
            },
            ComplexFormat::Polar => {
                format!(
                    "{} exp({}i)",
                    fmt_fixed(self.norm(), precision),
                    fmt_fixed(self.arg_pos(), precision),
                )
            },
            ComplexFormat::PolarTau => {
                format!(
                    "{} exp({}τi)",
                    fmt_fixed(self.norm(), precision),
                    fmt_fixed(self.arg_pos() / TAU, precision),
                )
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;
    use num_traits::{ One, Zero };
    use super::*;
    use crate::c;

    #[test]
    fn arithmetic() {
        let z = c!(1.0 + i 2.0);
        let w = c!(3.0 - i 1.0);
        assert!(c64_eq(z + w, c!(4.0 + i 1.0)));
        assert!(c64_eq(z - w, c!(-2.0, 3.0)));
        assert!(c64_eq(z * w, c!(5.0 + i 5.0)));
        assert!(c64_eq(z.checked_div(w).unwrap(), c!(0.1, 0.7)));
        assert!(c64_eq(z.conj(), c!(1.0 - i 2.0)));
        assert!((z.norm_sqr() - 5.0).abs() < 1e-12);
        assert!((z.norm() - 5.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn divide_by_zero() {
        assert!(matches!(
            c!(1.0).checked_div(C64::zero()),
            Err(TensorError::DivideByZero)
        ));
    }

    #[test]
    fn arg_range() {
        assert!((c!(1.0).arg_pos()).abs() < 1e-12);
        assert!((c!(i 1.0).arg_pos() - PI / 2.0).abs() < 1e-12);
        assert!((c!(-1.0).arg_pos() - PI).abs() < 1e-12);
        assert!((c!(i (-1.0)).arg_pos() - 3.0 * PI / 2.0).abs() < 1e-12);
        assert!(c!(1.0, -1e-9).arg_pos() < TAU);
    }

    #[test]
    fn unit() {
        let z = c!(3.0 + i 4.0).to_unit().unwrap();
        assert!(c64_eq(z, c!(0.6 + i 0.8)));
        assert!(matches!(C64::zero().to_unit(), Err(TensorError::ZeroNorm)));
    }

    #[test]
    fn closeness() {
        assert!(c!(1.0).is_close_to(&c!(1.0, 1e-7), 1e-6));
        assert!(!c!(1.0).is_close_to(&c!(1.0, 1e-5), 1e-6));
        assert!(C64::zero().is_zero());
        assert!(C64::one().is_one());
        assert!(c64_eq(C64::from_polar(2.0, PI / 2.0), c!(i 2.0)));
    }

    #[test]
    fn formatting() {
        let z = c!(0.0, std::f64::consts::FRAC_1_SQRT_2);
        assert_eq!(z.format_with(ComplexFormat::Cartesian, 2), "(0.00 +0.71i)");
        assert_eq!(c!(-1.0, -0.5).format_with(ComplexFormat::Cartesian, 2), "(-1.00 -0.50i)");
        assert_eq!(c!(-0.0, -0.0001).format_with(ComplexFormat::Cartesian, 2), "(0.00 +0.00i)");
        assert_eq!(c!(i (-2.0)).format_with(ComplexFormat::Polar, 2), "2.00 exp(4.71i)");
        assert_eq!(c!(i (-2.0)).format_with(ComplexFormat::PolarTau, 2), "2.00 exp(0.75τi)");
    }
}
