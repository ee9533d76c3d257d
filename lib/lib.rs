//! This package implements sparse tensor algebra for simulating quantum states
//! of discrete systems, along with a simple driver for photons moving on a
//! two-dimensional board of optical elements.
//!
//! - [`tensor`] provides [`Vector`][tensor::Vector]s and
//! [`Operator`][tensor::Operator]s over lists of named, labeled
//! [`Dimension`][tensor::Dimension]s, stored as lists of nonzero [kets and
//! bras][dirac-bra-ket].
//! - [`photons`] describes one or two photons on a board as a state over
//! position, direction, and polarization, with free-space propagation and
//! localized interactions with optical elements.
//! - [`simulation`] steps a [`Photons`][photons::Photons] state through a
//! board, recording the probability absorbed at each step.
//! - [`measurement`] splits states into ensembles of named branches by
//! projective and non-destructive (POVM) measurements.
//!
//! [dirac-bra-ket]: https://en.wikipedia.org/wiki/Bra%E2%80%93ket_notation
//!
//! # See also
//! - [Quantum Game](https://quantumgame.io): a puzzle game built on the same
//! kind of photon simulation.
//!
//! # Further reading
//! - C. K. Hong, Z. Y. Ou, and L. Mandel, "Measurement of subpicosecond time
//! intervals between two photons by interference."
//! [Phys. Rev. Lett. 59, 2044](https://doi.org/10.1103/PhysRevLett.59.2044)
//! - M. A. Nielsen and I. L. Chuang, *Quantum Computation and Quantum
//! Information*, ch. 2.2 (measurements and POVMs).
//!

pub mod complex;
pub mod tensor;
pub mod photons;
pub mod simulation;
pub mod measurement;

pub extern crate num_complex;
/// Shorthand for writing [`Complex64`][num_complex::Complex64] amplitudes.
///
/// - `c!(x)`: the real number `x`
/// - `c!(i y)`: the imaginary number `iy`
/// - `c!(e φ)`: the unit phase `exp(iφ)`
/// - `c!(x, y)` and `c!(r, e φ)`: Cartesian and polar forms
/// - `c!(a + i b)` and `c!(a - i b)`: Cartesian form for literals
///
/// ```
/// use std::f64::consts::{ FRAC_1_SQRT_2, FRAC_PI_2 };
/// use num_complex::Complex64;
/// use quantum_tensors::c;
///
/// // beam splitter amplitudes
/// let transmit = c!(FRAC_1_SQRT_2);
/// let reflect = c!(i FRAC_1_SQRT_2);
/// assert_eq!(reflect, Complex64::new(0.0, FRAC_1_SQRT_2));
/// assert!((transmit * c!(e FRAC_PI_2) - reflect).norm() < 1e-15);
/// assert_eq!(c!(0.5 - i 0.5), Complex64::new(0.5, -0.5));
/// assert_eq!(c!(2.0, e 0.0), c!(2.0, 0.0));
/// ```
#[macro_export]
macro_rules! c {
    ( i $im:expr )
        => { $crate::num_complex::Complex64::new(0.0, $im) };
    ( e $ph:expr )
        => { $crate::num_complex::Complex64::cis($ph) };
    ( $re:expr )
        => { $crate::num_complex::Complex64::new($re, 0.0) };
    ( $re:literal + i $im:literal )
        => { $crate::num_complex::Complex64::new($re, $im) };
    ( $re:literal - i $im:literal )
        => { $crate::num_complex::Complex64::new($re, -$im) };
    ( $r:expr, e $ph:expr )
        => { $crate::num_complex::Complex64::from_polar($r, $ph) };
    ( $re:expr, $im:expr )
        => { $crate::num_complex::Complex64::new($re, $im) };
}

pub use complex::{ ComplexExt, ComplexFormat, c64_eq };
pub use tensor::{
    Dimension,
    Operator,
    OperatorEntry,
    TensorError,
    TensorResult,
    Vector,
    VectorEntry,
};
pub use photons::{ Direction, Photons, Polarization };
pub use simulation::{ Grid, Simulation, SimulationConfig };
pub use measurement::Measurement;
