//! Elementary operators on single-photon direction and polarization.
//!
//! Polarization operators act on [`Dimension::polarization`] and are given as
//! 2×2 matrices over `(H, V)`; direction operators act on
//! [`Dimension::direction`]. Angles of polarization are in radians, while
//! angles of planes on the board are in degrees, measured counter-clockwise
//! from the positive *x* direction.

use std::f64::consts::TAU;
use num_complex::Complex64 as C64;
use crate::{
    photons::{ Direction, PhotonError, PhotonResult },
    tensor::{ Dimension, Operator, OperatorEntry, Vector, VectorEntry },
};

// build a polarization operator from a dense 2×2 matrix, skipping zeros
fn pol_matrix(m: [[C64; 2]; 2]) -> Operator {
    let entries: Vec<OperatorEntry>
        = m.iter().enumerate()
        .flat_map(|(i, row)| {
            row.iter().enumerate()
                .filter(|(_, a)| a.norm_sqr() != 0.0)
                .map(move |(j, a)| OperatorEntry::new([i], [j], *a))
        })
        .collect();
    Operator::new_unchecked(
        entries,
        vec![Dimension::polarization()],
        vec![Dimension::polarization()],
    )
}

// diagonal direction operator with unit entries where `keep` holds
fn dir_projector<F>(keep: F) -> Operator
where F: Fn(Direction) -> bool
{
    let entries: Vec<OperatorEntry>
        = Direction::ALL.into_iter()
        .filter(|d| keep(*d))
        .map(|d| OperatorEntry::new([d.index()], [d.index()], 1.0.into()))
        .collect();
    Operator::new_unchecked(
        entries,
        vec![Dimension::direction()],
        vec![Dimension::direction()],
    )
}

/// Identity on [`Dimension::direction`].
pub fn identity_direction() -> Operator {
    Operator::identity(vec![Dimension::direction()])
}

/// Identity on [`Dimension::polarization`].
pub fn identity_polarization() -> Operator {
    Operator::identity(vec![Dimension::polarization()])
}

/// Identity on direction ⊗ polarization.
pub fn identity_dir_pol() -> Operator {
    Operator::identity(vec![Dimension::direction(), Dimension::polarization()])
}

/// Reversal of the direction of travel, `> ↔ <` and `^ ↔ v`.
pub fn reverse_direction() -> Operator {
    let entries: Vec<OperatorEntry>
        = Direction::ALL.into_iter()
        .map(|d| OperatorEntry::new([d.reversed().index()], [d.index()], 1.0.into()))
        .collect();
    Operator::new_unchecked(
        entries,
        vec![Dimension::direction()],
        vec![Dimension::direction()],
    )
}

/// Linear polarization state at angle `alpha` from horizontal,
/// `cos(α) |H⟩ + sin(α) |V⟩`.
///
/// Components below machine epsilon are dropped, so that e.g. `α = π/2` gives
/// exactly `|V⟩`.
pub fn linear_polarization(alpha: f64) -> Vector {
    let (s, c) = alpha.sin_cos();
    let entries: Vec<VectorEntry>
        = [c, s].into_iter().enumerate()
        .filter(|(_, a)| a.abs() > f64::EPSILON)
        .map(|(k, a)| VectorEntry::new([k], a.into()))
        .collect();
    Vector::new_unchecked(entries, vec![Dimension::polarization()])
}

/// Rotation of the polarization plane by `alpha`:
/// ```math
/// \begin{pmatrix}
///     \cos\alpha & -\sin\alpha \\
///     \sin\alpha & \cos\alpha
/// \end{pmatrix}
/// ```
pub fn rotation_matrix(alpha: f64) -> Operator {
    let (s, c) = alpha.sin_cos();
    pol_matrix([[c.into(), (-s).into()], [s.into(), c.into()]])
}

/// Projection onto linear polarization at angle `alpha`:
/// ```math
/// \begin{pmatrix}
///     \cos^2\alpha & \cos\alpha \sin\alpha \\
///     \cos\alpha \sin\alpha & \sin^2\alpha
/// \end{pmatrix}
/// ```
pub fn projection_matrix(alpha: f64) -> Operator {
    let (s, c) = alpha.sin_cos();
    pol_matrix([[(c * c).into(), (c * s).into()], [(c * s).into(), (s * s).into()]])
}

/// Phase shift with real eigenvectors at angles `alpha` and `alpha + π/2`,
/// with respective phases `phase0` and `phase1` given in turns.
///
/// This is a rotation by `-alpha`, followed by
/// `diag(exp(iτ phase0), exp(iτ phase1))`, followed by a rotation by `alpha`.
pub fn phase_shift_for_real_eigenvectors(alpha: f64, phase0: f64, phase1: f64)
    -> Operator
{
    let (s, c) = alpha.sin_cos();
    let e0 = C64::cis(TAU * phase0);
    let e1 = C64::cis(TAU * phase1);
    let off = (e0 - e1) * c * s;
    pol_matrix([
        [e0 * c * c + e1 * s * s, off],
        [off, e0 * s * s + e1 * c * c],
    ])
}

/// Sign flip of horizontal polarization on reflection off a denser medium,
/// `diag(-1, 1)`.
pub fn reflect_phase_from_denser() -> Operator {
    pol_matrix([[(-1.0).into(), 0.0.into()], [0.0.into(), 1.0.into()]])
}

// index k such that the plane lies at k × 45°, modulo 180°
fn plane_index(angle: f64) -> PhotonResult<usize> {
    let k = angle / 45.0;
    let kr = k.round();
    if !angle.is_finite() || (k - kr).abs() > 1e-9 {
        return Err(PhotonError::UnsupportedAngle(angle));
    }
    Ok((kr as i64).rem_euclid(4) as usize)
}

/// Direction of travel after reflection off a plane at `angle` degrees.
///
/// Only multiples of 45° are supported. Directions parallel to the plane are
/// left unchanged.
pub fn reflected_direction(dir: Direction, angle: f64) -> PhotonResult<Direction> {
    let k = plane_index(angle)?;
    Ok(Direction::from_index(k + 4 - dir.index()))
}

/// Reflection of all four directions off a plane at `angle` degrees.
///
/// This is a permutation of the directions, fixing those parallel to the
/// plane.
pub fn reflect_from_plane_direction(angle: f64) -> PhotonResult<Operator> {
    let entries: Vec<OperatorEntry>
        = Direction::ALL.into_iter()
        .map(|d| {
            reflected_direction(d, angle)
                .map(|r| OperatorEntry::new([r.index()], [d.index()], 1.0.into()))
        })
        .collect::<PhotonResult<_>>()?;
    Ok(Operator::new_unchecked(
        entries,
        vec![Dimension::direction()],
        vec![Dimension::direction()],
    ))
}

/// Projection onto the directions parallel to a plane at `angle` degrees.
///
/// Diagonal planes have no parallel directions, giving the zero operator.
pub fn plane_parallel_directions(angle: f64) -> PhotonResult<Operator> {
    let k = plane_index(angle)?;
    Ok(dir_projector(|d| Direction::from_index(k + 4 - d.index()) == d))
}

/// Projection onto the directions a beam splitter at `angle` degrees acts on,
/// i.e. all those not parallel to its plane.
pub fn beamsplitter_transmit_directions(angle: f64) -> PhotonResult<Operator> {
    let k = plane_index(angle)?;
    Ok(dir_projector(|d| Direction::from_index(k + 4 - d.index()) != d))
}

#[cfg(test)]
mod tests {
    use std::f64::consts::{ FRAC_PI_2, FRAC_PI_4, PI };
    use super::*;
    use crate::{ c, complex::c64_eq };

    #[test]
    fn rotations_and_projections() {
        for alpha in [0.0, 0.3, FRAC_PI_4, 2.0] {
            assert!(rotation_matrix(alpha).is_close_to_unitary(1e-12));
            assert!(projection_matrix(alpha).is_close_to_projection(1e-12));
        }
        let h = linear_polarization(0.0);
        let v = rotation_matrix(FRAC_PI_2).mul_vec(&h).unwrap();
        assert!(c64_eq(v.amplitude_at(&[1]), c!(1.0)));
        assert!(v.amplitude_at(&[0]).norm() < 1e-12);
        let d = linear_polarization(FRAC_PI_4);
        let p = projection_matrix(FRAC_PI_4).mul_vec(&d).unwrap();
        assert!(p.is_close_to(&d, 1e-12).unwrap());
    }

    #[test]
    fn wave_plates() {
        let h = linear_polarization(0.0);
        let half = phase_shift_for_real_eigenvectors(FRAC_PI_4, 0.0, 0.5);
        assert!(half.is_close_to_unitary(1e-12));
        let out = half.mul_vec(&h).unwrap();
        assert!(c64_eq(out.amplitude_at(&[1]), c!(1.0)));
        assert!(out.amplitude_at(&[0]).norm() < 1e-12);
        let quarter = phase_shift_for_real_eigenvectors(0.3, 0.0, 0.25);
        assert!(quarter.is_close_to_unitary(1e-12));
        assert!(quarter.mul_op(&quarter).unwrap()
            .is_close_to(&phase_shift_for_real_eigenvectors(0.3, 0.0, 0.5), 1e-12)
            .unwrap());
        let none = phase_shift_for_real_eigenvectors(PI / 3.0, 0.0, 0.0);
        assert!(none.is_close_to_identity(1e-12));
    }

    #[test]
    fn plane_reflections() {
        use Direction::*;
        let cases = [
            (0.0, [Right, Down, Left, Up]),
            (45.0, [Up, Right, Down, Left]),
            (90.0, [Left, Up, Right, Down]),
            (135.0, [Down, Left, Up, Right]),
            (180.0, [Right, Down, Left, Up]),
        ];
        for (angle, expected) in cases {
            for (d, e) in Direction::ALL.into_iter().zip(expected) {
                assert_eq!(reflected_direction(d, angle).unwrap(), e);
            }
            let refl = reflect_from_plane_direction(angle).unwrap();
            assert!(refl.is_close_to_unitary(1e-12));
            let par = plane_parallel_directions(angle).unwrap();
            let trans = beamsplitter_transmit_directions(angle).unwrap();
            assert!(par.add(&trans).unwrap().is_close_to_identity(1e-12));
        }
        assert!(plane_parallel_directions(45.0).unwrap().is_empty());
        assert_eq!(plane_parallel_directions(90.0).unwrap().len(), 2);
        assert!(matches!(
            reflect_from_plane_direction(30.0),
            Err(PhotonError::UnsupportedAngle(_))
        ));
    }

    #[test]
    fn denser_phase() {
        let op = reflect_phase_from_denser();
        assert!(op.is_close_to_unitary(1e-12));
        assert!(op.is_close_to_hermitian(1e-12));
        assert_eq!(op.to_string(), "(-1.00 +0.00i) |H⟩⟨H| + (1.00 +0.00i) |V⟩⟨V|");
    }
}
