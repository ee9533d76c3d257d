//! Single-photon operators for optical elements placed on a board.
//!
//! Every element acts on direction ⊗ polarization. Rotations of elements are
//! given in degrees, counter-clockwise from the positive *x* direction;
//! polarization axes of polarizers and wave plates are also in degrees, from
//! horizontal.

use std::f64::consts::{ FRAC_1_SQRT_2, TAU };
use num_complex::Complex64 as C64;
use serde::{ Deserialize, Serialize };
use crate::{
    photons::{ PhotonResult, ops },
    tensor::{ Dimension, Operator },
};

/// Global phase shift of a quarter turn backward.
pub fn vacuum_jar() -> Operator {
    ops::identity_dir_pol().mul_constant(C64::cis(-TAU / 4.0))
}

/// Global phase shift of a quarter turn forward.
pub fn glass_slab() -> Operator {
    ops::identity_dir_pol().mul_constant(C64::cis(TAU / 4.0))
}

/// Uniform loss, scaling amplitudes by `r`.
pub fn attenuator(r: f64) -> Operator {
    ops::identity_dir_pol().mul_constant(r.into())
}

/// Complete absorption; used for detectors, rocks, and mines.
pub fn absorber() -> Operator {
    Operator::zeros(
        vec![Dimension::direction(), Dimension::polarization()],
        vec![Dimension::direction(), Dimension::polarization()],
    )
}

/// One-sided mirror along a plane at `angle` degrees.
///
/// Reflected photons pick up the phase of [`ops::reflect_phase_from_denser`];
/// photons travelling parallel to the plane pass unaffected.
pub fn mirror(angle: f64) -> PhotonResult<Operator> {
    let reflected
        = ops::reflect_from_plane_direction(angle)?
        .mul_op(&ops::beamsplitter_transmit_directions(angle)?)?
        .outer(&ops::reflect_phase_from_denser());
    let parallel
        = ops::plane_parallel_directions(angle)?
        .outer(&ops::identity_polarization());
    Ok(Operator::add_all([&reflected, &parallel])?)
}

/// Non-polarizing 50:50 beam splitter along a plane at `angle` degrees.
pub fn beam_splitter(angle: f64) -> PhotonResult<Operator> {
    beam_splitter_with_reflectance(angle, 0.5)
}

/// Non-polarizing beam splitter along a plane at `angle` degrees, reflecting
/// the fraction `reflectance` of the probability.
///
/// For each direction not parallel to the plane, with `r` the reflected
/// direction and `P` the reflection phase,
/// ```math
/// \ket{d} \mapsto \sqrt{1 - R} \ket{d} + i \sqrt{R} \, P \ket{r}
/// ```
pub fn beam_splitter_with_reflectance(angle: f64, reflectance: f64)
    -> PhotonResult<Operator>
{
    let trans_dirs = ops::beamsplitter_transmit_directions(angle)?;
    let transmitted
        = trans_dirs
        .outer(&ops::identity_polarization())
        .mul_constant((1.0 - reflectance).sqrt().into());
    let reflected
        = ops::reflect_from_plane_direction(angle)?
        .mul_op(&trans_dirs)?
        .outer(&ops::reflect_phase_from_denser())
        .mul_constant(C64::new(0.0, reflectance.sqrt()));
    let parallel
        = ops::plane_parallel_directions(angle)?
        .outer(&ops::identity_polarization());
    Ok(Operator::add_all([&transmitted, &reflected, &parallel])?)
}

/// Polarizing beam splitter along a plane at `angle` degrees: horizontal
/// polarization is transmitted and vertical polarization is reflected.
pub fn polarizing_beam_splitter(angle: f64) -> PhotonResult<Operator> {
    let h = Operator::indicator(vec![Dimension::polarization()], &["H"])?;
    let v = Operator::indicator(vec![Dimension::polarization()], &["V"])?;
    let transmitted = ops::identity_direction().outer(&h);
    let reflected = ops::reflect_from_plane_direction(angle)?.outer(&v);
    Ok(Operator::add_all([&transmitted, &reflected])?)
}

/// Retroreflector, reversing the direction of travel.
pub fn corner_cube() -> Operator {
    ops::reverse_direction().outer(&ops::identity_polarization())
}

/// Linear polarizer transmitting polarization at `angle` degrees.
pub fn polarizer(angle: f64) -> Operator {
    ops::identity_direction()
        .outer(&ops::projection_matrix(angle.to_radians()))
}

/// Half-wave plate with its fast axis at `angle` degrees.
pub fn half_wave_plate(angle: f64) -> Operator {
    ops::identity_direction()
        .outer(&ops::phase_shift_for_real_eigenvectors(angle.to_radians(), 0.0, 0.5))
}

/// Quarter-wave plate with its fast axis at `angle` degrees.
pub fn quarter_wave_plate(angle: f64) -> Operator {
    ops::identity_direction()
        .outer(&ops::phase_shift_for_real_eigenvectors(angle.to_radians(), 0.0, 0.25))
}

/// Optically active medium rotating polarization by `rotation` turns.
pub fn sugar_solution(rotation: f64) -> Operator {
    ops::identity_direction()
        .outer(&ops::rotation_matrix(TAU * rotation))
}

/// Kind of content of a single board cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    Void,
    Laser,
    Mirror,
    BeamSplitter,
    PolarizingBeamSplitter,
    CornerCube,
    Polarizer,
    HalfWavePlate,
    QuarterWavePlate,
    SugarSolution,
    VacuumJar,
    Glass,
    Attenuator,
    Detector,
    Rock,
    Mine,
}

impl ElementKind {
    /// Return the single-photon operator of the element, if it interacts with
    /// photons at all.
    ///
    /// `rotation` orients mirrors and beam splitters; `polarization` sets the
    /// axis of polarizers and wave plates. Empty cells and lasers have no
    /// operator.
    pub fn operator(&self, rotation: f64, polarization: f64)
        -> PhotonResult<Option<Operator>>
    {
        let op = match self {
            Self::Void | Self::Laser => None,
            Self::Mirror => Some(mirror(rotation)?),
            Self::BeamSplitter => Some(beam_splitter(rotation)?),
            Self::PolarizingBeamSplitter
                => Some(polarizing_beam_splitter(rotation)?),
            Self::CornerCube => Some(corner_cube()),
            Self::Polarizer => Some(polarizer(polarization)),
            Self::HalfWavePlate => Some(half_wave_plate(polarization)),
            Self::QuarterWavePlate => Some(quarter_wave_plate(polarization)),
            Self::SugarSolution => Some(sugar_solution(0.125)),
            Self::VacuumJar => Some(vacuum_jar()),
            Self::Glass => Some(glass_slab()),
            Self::Attenuator => Some(attenuator(FRAC_1_SQRT_2)),
            Self::Detector | Self::Rock | Self::Mine => Some(absorber()),
        };
        Ok(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        c,
        complex::c64_eq,
        photons::PhotonError,
        tensor::Vector,
    };

    fn dir_pol(dir: &str, pol: &str) -> Vector {
        Vector::indicator(
            vec![Dimension::direction(), Dimension::polarization()],
            &[dir, pol],
        ).unwrap()
    }

    #[test]
    fn unitary_elements() {
        let mut elems: Vec<Operator> = vec![
            vacuum_jar(),
            glass_slab(),
            corner_cube(),
            half_wave_plate(22.5),
            quarter_wave_plate(45.0),
            sugar_solution(0.125),
        ];
        for angle in [0.0, 45.0, 90.0, 135.0] {
            elems.push(mirror(angle).unwrap());
            elems.push(beam_splitter(angle).unwrap());
            elems.push(polarizing_beam_splitter(angle).unwrap());
        }
        for op in elems.iter() {
            assert!(op.is_close_to_unitary(1e-12));
        }
    }

    #[test]
    fn lossy_elements() {
        assert!(polarizer(30.0).is_close_to_projection(1e-12));
        assert!(!polarizer(30.0).is_close_to_unitary(1e-9));
        let att = attenuator(0.5);
        let v = att.mul_vec(&dir_pol(">", "H")).unwrap();
        assert!((v.norm_squared() - 0.25).abs() < 1e-12);
        assert!(absorber().mul_vec(&dir_pol("^", "V")).unwrap().is_empty());
    }

    #[test]
    fn beam_splitter_amplitudes() {
        let bs = beam_splitter(135.0).unwrap();
        let out = bs.mul_vec(&dir_pol(">", "V")).unwrap();
        assert!(c64_eq(out.amplitude_at(&[0, 1]), c!(FRAC_1_SQRT_2)));
        assert!(c64_eq(out.amplitude_at(&[3, 1]), c!(i FRAC_1_SQRT_2)));
        let out_h = bs.mul_vec(&dir_pol("v", "H")).unwrap();
        assert!(c64_eq(out_h.amplitude_at(&[0, 0]), c!(i -FRAC_1_SQRT_2)));
        // a photon running along the plane is untouched
        let flat = beam_splitter(0.0).unwrap();
        let along = flat.mul_vec(&dir_pol("<", "V")).unwrap();
        assert_eq!(along.to_string(), "(1.00 +0.00i) |<,V⟩");
    }

    #[test]
    fn mirror_and_pbs() {
        let m = mirror(45.0).unwrap();
        let out = m.mul_vec(&dir_pol(">", "H")).unwrap();
        assert_eq!(out.to_string(), "(-1.00 +0.00i) |^,H⟩");
        let pbs = polarizing_beam_splitter(135.0).unwrap();
        assert_eq!(pbs.mul_vec(&dir_pol(">", "H")).unwrap().to_string(), "(1.00 +0.00i) |>,H⟩");
        assert_eq!(pbs.mul_vec(&dir_pol(">", "V")).unwrap().to_string(), "(1.00 +0.00i) |v,V⟩");
        let cc = corner_cube();
        assert_eq!(cc.mul_vec(&dir_pol("^", "V")).unwrap().to_string(), "(1.00 +0.00i) |v,V⟩");
        assert!(matches!(mirror(10.0), Err(PhotonError::UnsupportedAngle(_))));
    }

    #[test]
    fn element_kinds() {
        let kinds: Vec<ElementKind>
            = serde_json::from_str(r#"["Mirror", "BeamSplitter", "Laser", "Rock"]"#)
            .unwrap();
        assert_eq!(
            kinds,
            vec![
                ElementKind::Mirror,
                ElementKind::BeamSplitter,
                ElementKind::Laser,
                ElementKind::Rock,
            ],
        );
        assert!(ElementKind::Laser.operator(0.0, 0.0).unwrap().is_none());
        assert!(ElementKind::Rock.operator(0.0, 0.0).unwrap().unwrap().is_empty());
        let op = ElementKind::BeamSplitter.operator(45.0, 0.0).unwrap().unwrap();
        assert!(op.is_close_to(&beam_splitter(45.0).unwrap(), 1e-12).unwrap());
        assert!(ElementKind::Mirror.operator(20.0, 0.0).is_err());
    }
}
