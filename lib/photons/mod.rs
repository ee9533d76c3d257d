//! One or two photons on a rectangular board.
//!
//! Each photon is described by four dimensions, `[x, y, direction,
//! polarization]`, so that an `n`-photon state is a [`Vector`] over `4n`
//! dimensions with photon `i` at positions `4i..4i + 4`. Two-photon states are
//! symmetrized, as appropriate for indistinguishable bosons.
//!
//! A single time step consists of free-space propagation, which moves every
//! photon one tile in its direction of travel (dropping any amplitude that
//! leaves the board), followed by interaction with the optical elements placed
//! on the board.

use std::{ fmt, str::FromStr };
use std::f64::consts::FRAC_1_SQRT_2;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use rustc_hash::FxHashMap as HashMap;
use thiserror::Error;
use tracing::debug;
use crate::{
    complex::ComplexFormat,
    tensor::{
        Accumulator,
        Dimension,
        Operator,
        OperatorEntry,
        TensorError,
        Vector,
        VectorEntry,
    },
};

#[derive(Debug, Error)]
pub enum PhotonError {
    /// `add_photon: photons must be in orthogonal modes`
    #[error("add_photon: new photon is not orthogonal to the existing state (overlap {0})")]
    NonOrthogonalPhotonAddition(C64),

    /// `add_photon: too many photons`
    #[error("photons: at most {max} photons are supported here, got {found}")]
    TooManyPhotons { max: usize, found: usize },

    /// `polarization: unknown name`
    #[error("polarization: unsupported polarization {0:?}")]
    UnsupportedPolarization(String),

    /// `direction: unknown name`
    #[error("direction: unsupported direction {0:?}")]
    UnsupportedDirection(String),

    /// `element: angle is not supported`
    #[error("element: unsupported angle {0}°")]
    UnsupportedAngle(f64),

    /// `board: position out of range`
    #[error("board: position ({x}, {y}) is outside the {size_x}×{size_y} board")]
    OutOfBoard { x: usize, y: usize, size_x: usize, size_y: usize },

    #[error("tensor error: {0}")]
    Tensor(#[from] TensorError),
}
pub type PhotonResult<T> = Result<T, PhotonError>;

pub mod ops;
pub mod elements;

/// Maximum number of photons a [`Photons`] state can hold.
pub const MAX_PHOTONS: usize = 2;

/// Direction of travel on the board.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// `>`
    Right,
    /// `^`
    Up,
    /// `<`
    Left,
    /// `v`
    Down,
}

impl Direction {
    /// All directions, in the coordinate order of [`Dimension::direction`].
    pub const ALL: [Self; 4] = [Self::Right, Self::Up, Self::Left, Self::Down];

    /// Return the coordinate index in [`Dimension::direction`].
    pub fn index(self) -> usize { self as usize }

    /// Return the direction at coordinate index `k`, modulo 4.
    pub fn from_index(k: usize) -> Self { Self::ALL[k % 4] }

    /// Return the coordinate name in [`Dimension::direction`].
    pub fn name(self) -> &'static str {
        match self {
            Self::Right => ">",
            Self::Up => "^",
            Self::Left => "<",
            Self::Down => "v",
        }
    }

    /// Return the opposite direction.
    pub fn reversed(self) -> Self { Self::from_index(self.index() + 2) }

    /// Convert a rotation in degrees, counter-clockwise from `>`, into a
    /// direction.
    ///
    /// Fails if `degrees` is not a multiple of 90.
    pub fn from_rotation(degrees: f64) -> PhotonResult<Self> {
        let k = degrees / 90.0;
        let kr = k.round();
        if !degrees.is_finite() || (k - kr).abs() > 1e-9 {
            return Err(PhotonError::UnsupportedAngle(degrees));
        }
        Ok(Self::from_index((kr as i64).rem_euclid(4) as usize))
    }

    /// Return the `(Δx, Δy)` of a single step.
    ///
    /// If `y_dir_means_down`, `^` decreases *y* and `v` increases it, as for
    /// rows of a grid listed from the top.
    pub fn step(self, y_dir_means_down: bool) -> (isize, isize) {
        let up = if y_dir_means_down { -1 } else { 1 };
        match self {
            Self::Right => (1, 0),
            Self::Up => (0, up),
            Self::Left => (-1, 0),
            Self::Down => (0, -up),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Direction {
    type Err = PhotonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter()
            .find(|d| d.name() == s)
            .ok_or_else(|| PhotonError::UnsupportedDirection(s.to_string()))
    }
}

/// Named polarization states.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Polarization {
    /// Horizontal.
    H,
    /// Vertical.
    V,
    /// Diagonal, `(H + V) / √2`.
    D,
    /// Anti-diagonal, `(H - V) / √2`.
    A,
    /// Left-handed circular, `(H + iV) / √2`.
    L,
    /// Right-handed circular, `(H - iV) / √2`.
    R,
}

impl Polarization {
    /// Return the state as a vector over [`Dimension::polarization`].
    pub fn to_vector(self) -> Vector {
        let s = FRAC_1_SQRT_2;
        let amps: [C64; 2] = match self {
            Self::H => [1.0.into(), 0.0.into()],
            Self::V => [0.0.into(), 1.0.into()],
            Self::D => [s.into(), s.into()],
            Self::A => [s.into(), (-s).into()],
            Self::L => [s.into(), C64::new(0.0, s)],
            Self::R => [s.into(), C64::new(0.0, -s)],
        };
        let entries: Vec<VectorEntry>
            = amps.into_iter().enumerate()
            .filter(|(_, a)| !a.is_zero())
            .map(|(k, a)| VectorEntry::new([k], a))
            .collect();
        Vector::new_unchecked(entries, vec![Dimension::polarization()])
    }
}

impl FromStr for Polarization {
    type Err = PhotonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "H" => Ok(Self::H),
            "V" => Ok(Self::V),
            "D" => Ok(Self::D),
            "A" => Ok(Self::A),
            "L" => Ok(Self::L),
            "R" => Ok(Self::R),
            _ => Err(PhotonError::UnsupportedPolarization(s.to_string())),
        }
    }
}

/// Amplitudes of horizontal and vertical polarization for a single photon at
/// one tile, moving in one direction.
#[derive(Clone, Debug, PartialEq)]
pub struct TileAmplitudes {
    pub x: usize,
    pub y: usize,
    pub direction: Direction,
    pub h: C64,
    pub v: C64,
}

// |x, y⟩⟨x, y| ⊗ op
fn localize(dim_x: &Dimension, dim_y: &Dimension, x: usize, y: usize, op: &Operator)
    -> PhotonResult<Operator>
{
    if x >= dim_x.size() || y >= dim_y.size() {
        return Err(PhotonError::OutOfBoard {
            x,
            y,
            size_x: dim_x.size(),
            size_y: dim_y.size(),
        });
    }
    let dir_pol = [Dimension::direction(), Dimension::polarization()];
    Dimension::check_dimensions(op.dimensions_out(), &dir_pol)?;
    Dimension::check_dimensions(op.dimensions_in(), &dir_pol)?;
    let tile = Operator::new_unchecked(
        vec![OperatorEntry::new([x, y], [x, y], 1.0.into())],
        vec![dim_x.clone(), dim_y.clone()],
        vec![dim_x.clone(), dim_y.clone()],
    );
    Ok(tile.outer(op))
}

/// The quantum state of up to [`MAX_PHOTONS`] photons on a board.
#[derive(Clone, Debug)]
pub struct Photons {
    size_x: usize,
    size_y: usize,
    dim_x: Dimension,
    dim_y: Dimension,
    vector: Vector,
    n_photons: usize,
}

impl Photons {
    /// Create an empty board with no photons.
    pub fn new(size_x: usize, size_y: usize) -> Self {
        Self {
            size_x,
            size_y,
            dim_x: Dimension::position(size_x, "x"),
            dim_y: Dimension::position(size_y, "y"),
            vector: Vector::scalar(1.0.into()),
            n_photons: 0,
        }
    }

    /// Wrap an existing state over `4n` photon dimensions.
    ///
    /// Fails if the dimensions of `vector` do not follow the per-photon layout
    /// for a board of the given size.
    pub fn from_vector(size_x: usize, size_y: usize, vector: Vector)
        -> PhotonResult<Self>
    {
        let mut photons = Self::new(size_x, size_y);
        let n = vector.dimensions().len() / 4;
        if n > MAX_PHOTONS {
            return Err(PhotonError::TooManyPhotons { max: MAX_PHOTONS, found: n });
        }
        let expected: Vec<Dimension>
            = (0..n).flat_map(|_| photons.photon_dimensions()).collect();
        Dimension::check_dimensions(&expected, vector.dimensions())?;
        photons.vector = vector;
        photons.n_photons = n;
        Ok(photons)
    }

    /// Return the width of the board.
    pub fn size_x(&self) -> usize { self.size_x }

    /// Return the height of the board.
    pub fn size_y(&self) -> usize { self.size_y }

    /// Return the number of photons.
    pub fn n_photons(&self) -> usize { self.n_photons }

    /// Return the state.
    pub fn vector(&self) -> &Vector { &self.vector }

    /// Return the state, consuming `self`.
    pub fn into_vector(self) -> Vector { self.vector }

    /// Return the dimensions of a single photon, `[x, y, direction,
    /// polarization]`.
    pub fn photon_dimensions(&self) -> Vec<Dimension> {
        vec![
            self.dim_x.clone(),
            self.dim_y.clone(),
            Dimension::direction(),
            Dimension::polarization(),
        ]
    }

    /// Return the positions of the dimensions of photon `i` in the state.
    pub fn photon_indices(i: usize) -> [usize; 4] {
        [4 * i, 4 * i + 1, 4 * i + 2, 4 * i + 3]
    }

    /// Create a single-photon state at `(x, y)` moving in direction `dir` with
    /// polarization state `pol`.
    pub fn photon_vector(&self, x: usize, y: usize, dir: Direction, pol: &Vector)
        -> PhotonResult<Vector>
    {
        if x >= self.size_x || y >= self.size_y {
            return Err(PhotonError::OutOfBoard {
                x,
                y,
                size_x: self.size_x,
                size_y: self.size_y,
            });
        }
        Dimension::check_dimensions(pol.dimensions(), &[Dimension::polarization()])?;
        let position = Vector::new_unchecked(
            vec![VectorEntry::new([x, y, dir.index()], 1.0.into())],
            vec![self.dim_x.clone(), self.dim_y.clone(), Dimension::direction()],
        );
        Ok(position.outer(pol))
    }

    /// Add a photon at `(x, y)` moving in direction `dir` with polarization
    /// state `pol`.
    ///
    /// The second photon must be in a mode exactly orthogonal to the first;
    /// the resulting state is symmetrized:
    /// ```math
    /// \ket{\psi} \mapsto \frac{1}{\sqrt{2}}
    ///     \left( \ket{\psi} \otimes \ket{\phi} + \ket{\phi} \otimes \ket{\psi} \right)
    /// ```
    pub fn add_photon_with_polarization(
        &mut self,
        x: usize,
        y: usize,
        dir: Direction,
        pol: &Vector,
    ) -> PhotonResult<()>
    {
        if self.n_photons >= MAX_PHOTONS {
            return Err(PhotonError::TooManyPhotons {
                max: MAX_PHOTONS,
                found: self.n_photons + 1,
            });
        }
        let new = self.photon_vector(x, y, dir, pol)?;
        if self.n_photons == 0 {
            self.vector = new;
        } else {
            let overlap = self.vector.inner(&new)?;
            if !overlap.is_zero() {
                return Err(PhotonError::NonOrthogonalPhotonAddition(overlap));
            }
            self.vector
                = Vector::add_all([&self.vector.outer(&new), &new.outer(&self.vector)])?
                .mul_constant(FRAC_1_SQRT_2.into());
        }
        self.n_photons += 1;
        debug!(x, y, direction = %dir, n_photons = self.n_photons, "added photon");
        Ok(())
    }

    /// Add a photon in one of the named polarization states.
    pub fn add_photon(&mut self, x: usize, y: usize, dir: Direction, pol: Polarization)
        -> PhotonResult<()>
    {
        self.add_photon_with_polarization(x, y, dir, &pol.to_vector())
    }

    /// Add a photon with direction and polarization given by name, e.g. `">"`
    /// and `"V"`.
    pub fn add_photon_from_indicator(&mut self, x: usize, y: usize, dir: &str, pol: &str)
        -> PhotonResult<()>
    {
        self.add_photon(x, y, dir.parse()?, pol.parse()?)
    }

    /// Return the single-photon propagator over `[x, y, direction]`.
    ///
    /// This is the sum over directions of a shift along the direction of
    /// travel, tensored with the projector onto that direction. Amplitude
    /// leaving the board is dropped.
    pub fn propagation_operator(&self, y_dir_means_down: bool) -> PhotonResult<Operator> {
        let id_x = Operator::identity(vec![self.dim_x.clone()]);
        let id_y = Operator::identity(vec![self.dim_y.clone()]);
        let terms: Vec<Operator>
            = Direction::ALL.into_iter()
            .map(|d| -> PhotonResult<Operator> {
                let (dx, dy) = d.step(y_dir_means_down);
                let shift_x
                    = if dx == 0 { id_x.clone() }
                    else { Operator::shift(&self.dim_x, dx) };
                let shift_y
                    = if dy == 0 { id_y.clone() }
                    else { Operator::shift(&self.dim_y, dy) };
                let proj
                    = Operator::indicator(vec![Dimension::direction()], &[d.name()])?;
                Ok(Operator::outer_all([&shift_x, &shift_y, &proj]))
            })
            .collect::<PhotonResult<_>>()?;
        Ok(Operator::add_all(terms.iter())?)
    }

    /// Propagate every photon by one step, applying
    /// [`Self::propagation_operator`] to each photon in turn.
    pub fn propagate_photons_with_operator(&mut self, y_dir_means_down: bool)
        -> PhotonResult<()>
    {
        let op = self.propagation_operator(y_dir_means_down)?;
        for i in 0..self.n_photons {
            let [ix, iy, idir, _] = Self::photon_indices(i);
            self.vector = op.mul_vec_partial(&[ix, iy, idir], &self.vector)?;
        }
        Ok(())
    }

    /// Propagate every photon by one step.
    ///
    /// Coordinates are shifted directly, producing the same entries in the same
    /// order as [`Self::propagate_photons_with_operator`].
    pub fn propagate_photons(&mut self, y_dir_means_down: bool) {
        let size_x = self.size_x as isize;
        let size_y = self.size_y as isize;
        for i in 0..self.n_photons {
            let [ix, iy, idir, _] = Self::photon_indices(i);
            let mut acc: Accumulator<Vec<usize>>
                = Accumulator::with_capacity(self.vector.len());
            for e in self.vector.entries() {
                let (dx, dy)
                    = Direction::from_index(e.coord[idir]).step(y_dir_means_down);
                let x = e.coord[ix] as isize + dx;
                let y = e.coord[iy] as isize + dy;
                if (0..size_x).contains(&x) && (0..size_y).contains(&y) {
                    let mut coord = e.coord.clone();
                    coord[ix] = x as usize;
                    coord[iy] = y as usize;
                    acc.add(coord, e.value);
                }
            }
            let entries: Vec<VectorEntry>
                = acc.into_nonzero()
                .map(|(coord, value)| VectorEntry { coord, value })
                .collect();
            self.vector
                = Vector::new_unchecked(entries, self.vector.dimensions().to_vec());
        }
    }

    /// Embed a direction ⊗ polarization operator at tile `(x, y)`, giving
    /// `|x, y⟩⟨x, y| ⊗ op` over a single photon's dimensions.
    pub fn localize_operator(&self, x: usize, y: usize, op: &Operator)
        -> PhotonResult<Operator>
    {
        localize(&self.dim_x, &self.dim_y, x, y, op)
    }

    /// Apply the element interactions to every photon in turn.
    pub fn interact(&mut self, interaction: &InteractionOperator) -> PhotonResult<()> {
        for i in 0..self.n_photons {
            self.vector = interaction.apply(&Self::photon_indices(i), &self.vector)?;
        }
        Ok(())
    }

    /// Compute the probability that would be lost by applying `op` at tile
    /// `(x, y)`.
    ///
    /// This is the squared norm of the part of the state with any photon at
    /// the tile, less the squared norm of the same part after `op` has been
    /// applied to every photon there.
    pub fn measure_absorption_at_operator(&self, x: usize, y: usize, op: &Operator)
        -> PhotonResult<f64>
    {
        let tile_op = InteractionOperator::new(self.size_x, self.size_y, [(x, y, op)])?;
        let photons: Vec<[usize; 4]>
            = (0..self.n_photons).map(Self::photon_indices).collect();
        let local: Vec<VectorEntry>
            = self.vector.entries().iter()
            .filter(|e| {
                photons.iter()
                    .any(|[ix, iy, _, _]| e.coord[*ix] == x && e.coord[*iy] == y)
            })
            .cloned()
            .collect();
        if local.is_empty() { return Ok(0.0); }
        let local
            = Vector::new_unchecked(local, self.vector.dimensions().to_vec());
        let mut after = local.clone();
        for indices in photons.iter() {
            after = tile_op.apply(indices, &after)?;
        }
        Ok(local.norm_squared() - after.norm_squared())
    }

    /// Return the squared norm of the state.
    pub fn total_probability(&self) -> f64 { self.vector.norm_squared() }

    /// Collect the horizontal and vertical amplitudes of a single photon for
    /// every occupied tile and direction, in order of first appearance.
    ///
    /// An empty board gives an empty list; fails if there is more than one
    /// photon.
    pub fn aggregate_polarization(&self) -> PhotonResult<Vec<TileAmplitudes>> {
        if self.n_photons > 1 {
            return Err(PhotonError::TooManyPhotons { max: 1, found: self.n_photons });
        }
        let mut index: HashMap<(usize, usize, usize), usize> = HashMap::default();
        let mut tiles: Vec<TileAmplitudes> = Vec::new();
        for e in self.vector.entries() {
            let key = (e.coord[0], e.coord[1], e.coord[2]);
            let k
                = *index.entry(key)
                .or_insert_with(|| {
                    tiles.push(TileAmplitudes {
                        x: key.0,
                        y: key.1,
                        direction: Direction::from_index(key.2),
                        h: C64::zero(),
                        v: C64::zero(),
                    });
                    tiles.len() - 1
                });
            if e.coord[3] == 0 {
                tiles[k].h += e.value;
            } else {
                tiles[k].v += e.value;
            }
        }
        Ok(tiles)
    }

    /// Render the state as a ket string; see [`Vector::to_ket_string`].
    pub fn to_ket_string(&self, format: ComplexFormat, precision: usize) -> String {
        self.vector.to_ket_string(format, precision)
    }
}

impl fmt::Display for Photons {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(2);
        write!(f, "{}", self.to_ket_string(ComplexFormat::Cartesian, precision))
    }
}

/// Compose operators placed on the same tile.
///
/// Tiles keep their order of first appearance; on a shared tile, later
/// operators act after earlier ones.
pub fn merge_placements<'a, I>(placements: I)
    -> PhotonResult<Vec<(usize, usize, Operator)>>
where I: IntoIterator<Item = (usize, usize, &'a Operator)>
{
    let mut index: HashMap<(usize, usize), usize> = HashMap::default();
    let mut merged: Vec<(usize, usize, Operator)> = Vec::new();
    for (x, y, op) in placements.into_iter() {
        if let Some(k) = index.get(&(x, y)) {
            merged[*k].2 = op.mul_op(&merged[*k].2)?;
        } else {
            index.insert((x, y), merged.len());
            merged.push((x, y, op.clone()));
        }
    }
    Ok(merged)
}

/// Single-photon interaction with all elements on a board.
///
/// Only the difference from the identity,
/// ```math
/// \Delta = \sum_{(x, y)} \ket{x, y}\bra{x, y} \otimes (M_{x, y} - I)
/// ```
/// is stored, so that applying it as `v + Δv` leaves photons on empty tiles
/// exactly as they are.
#[derive(Clone, Debug)]
pub struct InteractionOperator {
    delta: Operator,
}

impl InteractionOperator {
    /// Build the interaction from `(x, y, operator)` placements on a board of
    /// the given size, each operator acting on direction ⊗ polarization.
    ///
    /// Operators sharing a tile are composed; see [`merge_placements`].
    pub fn new<'a, I>(size_x: usize, size_y: usize, placements: I)
        -> PhotonResult<Self>
    where I: IntoIterator<Item = (usize, usize, &'a Operator)>
    {
        let dim_x = Dimension::position(size_x, "x");
        let dim_y = Dimension::position(size_y, "y");
        let id = ops::identity_dir_pol();
        let mut terms: Vec<Operator> = vec![
            Operator::zeros(
                vec![
                    dim_x.clone(),
                    dim_y.clone(),
                    Dimension::direction(),
                    Dimension::polarization(),
                ],
                vec![
                    dim_x.clone(),
                    dim_y.clone(),
                    Dimension::direction(),
                    Dimension::polarization(),
                ],
            ),
        ];
        for (x, y, op) in merge_placements(placements)? {
            terms.push(localize(&dim_x, &dim_y, x, y, &op.sub(&id)?)?);
        }
        let delta = Operator::add_all(terms.iter())?;
        Ok(Self { delta })
    }

    /// Return the stored difference from the identity.
    pub fn delta(&self) -> &Operator { &self.delta }

    /// Apply the interaction to the photon dimensions of `v` at `indices`.
    pub fn apply(&self, indices: &[usize], v: &Vector) -> PhotonResult<Vector> {
        let dv = self.delta.mul_vec_partial(indices, v)?;
        Ok(v.add(&dv)?)
    }

    /// Return the full single-photon operator, `I + Δ`.
    pub fn to_operator(&self) -> PhotonResult<Operator> {
        let id = Operator::identity(self.delta.dimensions_in().to_vec());
        Ok(self.delta.add(&id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ c, complex::c64_eq };

    #[test]
    fn parse_modes() {
        assert_eq!(">".parse::<Direction>().unwrap(), Direction::Right);
        assert_eq!("v".parse::<Direction>().unwrap(), Direction::Down);
        assert!(matches!(
            "x".parse::<Direction>(),
            Err(PhotonError::UnsupportedDirection(_))
        ));
        assert_eq!("L".parse::<Polarization>().unwrap(), Polarization::L);
        assert!(matches!(
            "Q".parse::<Polarization>(),
            Err(PhotonError::UnsupportedPolarization(_))
        ));
        assert_eq!(Direction::from_rotation(270.0).unwrap(), Direction::Down);
        assert_eq!(Direction::from_rotation(-90.0).unwrap(), Direction::Down);
        assert!(Direction::from_rotation(45.0).is_err());
        for pol in [Polarization::D, Polarization::A, Polarization::L, Polarization::R] {
            assert!((pol.to_vector().norm_squared() - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn propagation_off_edge() {
        let mut photons = Photons::new(3, 5);
        photons.add_photon_from_indicator(0, 2, ">", "V").unwrap();
        assert_eq!(photons.to_string(), "(1.00 +0.00i) |0,2,>,V⟩");
        photons.propagate_photons(true);
        assert_eq!(photons.to_string(), "(1.00 +0.00i) |1,2,>,V⟩");
        photons.propagate_photons(true);
        assert_eq!(photons.to_string(), "(1.00 +0.00i) |2,2,>,V⟩");
        photons.propagate_photons(true);
        assert_eq!(photons.to_string(), "");
        assert_eq!(photons.total_probability(), 0.0);
    }

    #[test]
    fn vertical_orientation() {
        let mut down = Photons::new(2, 3);
        down.add_photon_from_indicator(1, 1, "^", "H").unwrap();
        down.propagate_photons(true);
        assert_eq!(down.to_string(), "(1.00 +0.00i) |1,0,^,H⟩");
        let mut up = Photons::new(2, 3);
        up.add_photon_from_indicator(1, 1, "^", "H").unwrap();
        up.propagate_photons(false);
        assert_eq!(up.to_string(), "(1.00 +0.00i) |1,2,^,H⟩");
    }

    #[test]
    fn fast_propagation_matches_operator() {
        for y_down in [true, false] {
            let mut fast = Photons::new(4, 3);
            fast.add_photon(1, 1, Direction::Up, Polarization::D).unwrap();
            fast.add_photon(2, 0, Direction::Left, Polarization::H).unwrap();
            let mut slow = fast.clone();
            for _ in 0..4 {
                fast.propagate_photons(y_down);
                slow.propagate_photons_with_operator(y_down).unwrap();
                assert_eq!(fast.vector().entries(), slow.vector().entries());
                assert_eq!(fast.to_string(), slow.to_string());
            }
        }
    }

    #[test]
    fn photon_addition() {
        let mut photons = Photons::new(3, 3);
        photons.add_photon(0, 0, Direction::Right, Polarization::D).unwrap();
        assert!(matches!(
            photons.add_photon(0, 0, Direction::Right, Polarization::H),
            Err(PhotonError::NonOrthogonalPhotonAddition(_))
        ));
        photons.add_photon(0, 0, Direction::Right, Polarization::A).unwrap();
        assert_eq!(photons.n_photons(), 2);
        assert_eq!(photons.vector().dimensions().len(), 8);
        assert!((photons.total_probability() - 1.0).abs() < 1e-12);
        assert!(matches!(
            photons.add_photon(1, 1, Direction::Up, Polarization::H),
            Err(PhotonError::TooManyPhotons { max: 2, found: 3 })
        ));
        assert!(matches!(
            Photons::new(3, 3).add_photon(3, 0, Direction::Up, Polarization::H),
            Err(PhotonError::OutOfBoard { .. })
        ));
    }

    #[test]
    fn wrap_vector() {
        let mut photons = Photons::new(3, 3);
        photons.add_photon(2, 1, Direction::Left, Polarization::V).unwrap();
        let wrapped = Photons::from_vector(3, 3, photons.vector().clone()).unwrap();
        assert_eq!(wrapped.n_photons(), 1);
        assert!(Photons::from_vector(4, 3, photons.into_vector()).is_err());
    }

    #[test]
    fn hong_ou_mandel() {
        let bs = elements::beam_splitter(135.0).unwrap();
        let interaction = InteractionOperator::new(3, 3, [(1, 1, &bs)]).unwrap();
        let mut photons = Photons::new(3, 3);
        photons.add_photon_from_indicator(0, 1, ">", "V").unwrap();
        photons.add_photon_from_indicator(1, 0, "v", "V").unwrap();
        photons.propagate_photons(true);
        photons.interact(&interaction).unwrap();
        assert_eq!(
            photons.to_string(),
            "(0.00 +0.71i) |1,1,v,V,1,1,v,V⟩ + (0.00 +0.71i) |1,1,>,V,1,1,>,V⟩"
        );
        assert!(photons.vector().amplitude_at(&[1, 1, 0, 1, 1, 1, 3, 1]).norm() < 1e-12);
        assert!(photons.vector().amplitude_at(&[1, 1, 3, 1, 1, 1, 0, 1]).norm() < 1e-12);
        assert!((photons.total_probability() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn interaction_forms_agree() {
        let m = elements::mirror(45.0).unwrap();
        let bs = elements::beam_splitter(135.0).unwrap();
        let interaction
            = InteractionOperator::new(3, 2, [(0, 0, &m), (2, 1, &bs)]).unwrap();
        let full = interaction.to_operator().unwrap();
        assert!(full.is_close_to_unitary(1e-12));
        let mut photons = Photons::new(3, 2);
        photons.add_photon(2, 1, Direction::Down, Polarization::L).unwrap();
        let v = photons.vector().clone();
        let a = interaction.apply(&Photons::photon_indices(0), &v).unwrap();
        let b = full.mul_vec_partial(&Photons::photon_indices(0), &v).unwrap();
        assert!(a.is_close_to(&b, 1e-12).unwrap());
        let localized = photons.localize_operator(2, 1, &bs).unwrap();
        assert_eq!(localized.names_out(), vec!["x", "y", "direction", "polarization"]);
        assert_eq!(localized.len(), bs.len());
        assert!(photons.localize_operator(3, 0, &bs).is_err());
    }

    #[test]
    fn absorption() {
        let mut photons = Photons::new(2, 2);
        photons.add_photon(1, 0, Direction::Up, Polarization::D).unwrap();
        let rock = elements::absorber();
        let half = elements::attenuator(FRAC_1_SQRT_2);
        let pol = elements::polarizer(0.0);
        assert!((photons.measure_absorption_at_operator(1, 0, &rock).unwrap() - 1.0).abs() < 1e-12);
        assert!((photons.measure_absorption_at_operator(1, 0, &half).unwrap() - 0.5).abs() < 1e-12);
        assert!((photons.measure_absorption_at_operator(1, 0, &pol).unwrap() - 0.5).abs() < 1e-12);
        assert_eq!(photons.measure_absorption_at_operator(0, 0, &rock).unwrap(), 0.0);
        assert!(matches!(
            photons.measure_absorption_at_operator(2, 0, &rock),
            Err(PhotonError::OutOfBoard { .. })
        ));
    }

    #[test]
    fn absorption_with_shared_tile() {
        let mut photons = Photons::new(3, 3);
        photons.add_photon(0, 1, Direction::Right, Polarization::H).unwrap();
        photons.add_photon(2, 1, Direction::Left, Polarization::H).unwrap();
        photons.propagate_photons(true);
        let rock = elements::absorber();
        let before = photons.total_probability();
        let absorbed = photons.measure_absorption_at_operator(1, 1, &rock).unwrap();
        let interaction = InteractionOperator::new(3, 3, [(1, 1, &rock)]).unwrap();
        photons.interact(&interaction).unwrap();
        let after = photons.total_probability();
        assert!((absorbed - 1.0).abs() < 1e-12);
        assert!((absorbed - (before - after)).abs() < 1e-12);

        // only one photon reaches the tile
        let mut photons = Photons::new(3, 3);
        photons.add_photon(0, 1, Direction::Right, Polarization::H).unwrap();
        photons.add_photon(2, 2, Direction::Up, Polarization::V).unwrap();
        photons.propagate_photons(true);
        let half = elements::attenuator(FRAC_1_SQRT_2);
        let absorbed = photons.measure_absorption_at_operator(1, 1, &half).unwrap();
        assert!((absorbed - 0.5).abs() < 1e-12);
    }

    #[test]
    fn shared_tile_placements_compose() {
        let half = elements::attenuator(FRAC_1_SQRT_2);
        let hwp = elements::half_wave_plate(45.0);
        let merged = merge_placements([(1, 0, &half), (0, 0, &hwp), (1, 0, &half)]).unwrap();
        assert_eq!(merged.len(), 2);
        assert_eq!((merged[0].0, merged[0].1), (1, 0));
        assert!(merged[0].2.is_close_to(&elements::attenuator(0.5), 1e-12).unwrap());

        let interaction
            = InteractionOperator::new(2, 1, [(1, 0, &half), (1, 0, &half)]).unwrap();
        let mut photons = Photons::new(2, 1);
        photons.add_photon(1, 0, Direction::Left, Polarization::V).unwrap();
        photons.interact(&interaction).unwrap();
        assert!((photons.total_probability() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn polarization_per_tile() {
        let mut photons = Photons::new(3, 3);
        photons.add_photon(1, 2, Direction::Left, Polarization::R).unwrap();
        let tiles = photons.aggregate_polarization().unwrap();
        assert_eq!(tiles.len(), 1);
        assert_eq!((tiles[0].x, tiles[0].y, tiles[0].direction), (1, 2, Direction::Left));
        assert!(c64_eq(tiles[0].h, c!(FRAC_1_SQRT_2)));
        assert!(c64_eq(tiles[0].v, c!(i -FRAC_1_SQRT_2)));
        photons.add_photon(0, 0, Direction::Up, Polarization::H).unwrap();
        assert!(matches!(
            photons.aggregate_polarization(),
            Err(PhotonError::TooManyPhotons { max: 1, found: 2 })
        ));
        assert!(Photons::new(3, 3).aggregate_polarization().unwrap().is_empty());
    }
}
