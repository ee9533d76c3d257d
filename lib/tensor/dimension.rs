//! Named, sized axes of a tensor product space.

use std::{ fmt, sync::Arc };
use itertools::Itertools;
use crate::tensor::{ TensorError, TensorResult };

/// A single named axis with an ordered list of coordinate labels.
///
/// `Dimension`s are plain value descriptors: two dimensions are equal if and
/// only if their names, sizes, and coordinate names (in order) are equal.
/// Clones share the underlying label storage, so they are cheap to pass
/// around between the many vectors and operators defined over them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Dimension {
    name: Arc<str>,
    size: usize,
    coord_names: Arc<[String]>,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#Dimension [{}] of size [{}] has coordinates named: [{}]",
            self.name, self.size, self.coord_names.iter().join(","))
    }
}

impl Dimension {
    /// Create a new `Dimension`.
    ///
    /// Fails if the number of coordinate names is not equal to `size`.
    pub fn new<S, I, T>(name: S, size: usize, coord_names: I)
        -> TensorResult<Self>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let coord_names: Vec<String>
            = coord_names.into_iter().map(|s| s.into()).collect();
        if coord_names.len() != size {
            return Err(TensorError::DimensionMismatch {
                name: name.as_ref().to_string(),
                size,
                coords: coord_names.len(),
            });
        }
        Ok(Self {
            name: name.as_ref().into(),
            size,
            coord_names: coord_names.into(),
        })
    }

    // for the factories below, whose labels are known to be consistent
    fn new_unchecked(name: &str, coord_names: Vec<String>) -> Self {
        Self {
            name: name.into(),
            size: coord_names.len(),
            coord_names: coord_names.into(),
        }
    }

    /// Two-state photon polarization, `H` (horizontal) and `V` (vertical).
    pub fn polarization() -> Self {
        Self::new_unchecked("polarization", vec!["H".into(), "V".into()])
    }

    /// Four-state direction of motion on a grid: `>`, `^`, `<`, and `v`, in
    /// counter-clockwise order starting from the positive *x* direction.
    pub fn direction() -> Self {
        Self::new_unchecked(
            "direction",
            vec![">".into(), "^".into(), "<".into(), "v".into()],
        )
    }

    /// Spin-1/2, `u` (up) and `d` (down).
    pub fn spin() -> Self {
        Self::new_unchecked("spin", vec!["u".into(), "d".into()])
    }

    /// Qubit in the computational basis, `0` and `1`.
    pub fn qubit() -> Self {
        Self::new_unchecked("qubit", vec!["0".into(), "1".into()])
    }

    /// Discrete position with `size` sites labeled `0, 1, ..., size - 1`.
    pub fn position<S>(size: usize, name: S) -> Self
    where S: AsRef<str>
    {
        Self::new_unchecked(
            name.as_ref(),
            (0..size).map(|k| k.to_string()).collect(),
        )
    }

    /// Return the name of the dimension.
    pub fn name(&self) -> &str { &self.name }

    /// Return the number of coordinates.
    pub fn size(&self) -> usize { self.size }

    /// Return the coordinate names, in index order.
    pub fn coord_names(&self) -> &[String] { &self.coord_names }

    /// Return the name of the coordinate at index `k`, if it exists.
    pub fn coord_name(&self, k: usize) -> Option<&str> {
        self.coord_names.get(k).map(|s| s.as_str())
    }

    /// Look up the index of a coordinate by name.
    ///
    /// Duplicate names resolve to the first match.
    pub fn coord_name_to_index(&self, name: &str) -> TensorResult<usize> {
        self.coord_names.iter()
            .position(|s| s == name)
            .ok_or_else(|| TensorError::CoordinateNotFound {
                dimension: self.name.to_string(),
                coord: name.to_string(),
            })
    }

    /// Join the names of a list of dimensions with commas.
    pub fn concat_dim_names(dims: &[Dimension]) -> String {
        dims.iter().map(|d| d.name()).join(",")
    }

    /// Return the sizes of a list of dimensions.
    pub fn sizes(dims: &[Dimension]) -> Vec<usize> {
        dims.iter().map(|d| d.size).collect()
    }

    /// Return the size of the product space spanned by a list of dimensions.
    pub fn total_size(dims: &[Dimension]) -> usize {
        dims.iter().map(|d| d.size).product()
    }

    /// Check that two lists of dimensions are equal, in order.
    ///
    /// Fails with [`TensorError::DimensionSequenceMismatch`] if the lists have
    /// different lengths and [`TensorError::DimensionOrderMismatch`] at the
    /// first position where they differ.
    pub fn check_dimensions(lhs: &[Dimension], rhs: &[Dimension])
        -> TensorResult<()>
    {
        if lhs.len() != rhs.len() {
            return Err(TensorError::DimensionSequenceMismatch(
                Self::concat_dim_names(lhs),
                Self::concat_dim_names(rhs),
            ));
        }
        if let Some(index)
            = lhs.iter().zip(rhs).position(|(l, r)| l != r)
        {
            return Err(TensorError::DimensionOrderMismatch {
                index,
                lhs: Self::concat_dim_names(lhs),
                rhs: Self::concat_dim_names(rhs),
            });
        }
        Ok(())
    }

    /// Convert a tuple of coordinate names into a tuple of indices.
    pub fn indices_from_names<S>(dims: &[Dimension], names: &[S])
        -> TensorResult<Vec<usize>>
    where S: AsRef<str>
    {
        if names.len() != dims.len() {
            return Err(TensorError::CoordNameCount {
                expected: dims.len(),
                found: names.len(),
            });
        }
        dims.iter().zip(names)
            .map(|(d, s)| d.coord_name_to_index(s.as_ref()))
            .collect()
    }

    /// Convert a tuple of coordinate indices into a tuple of names.
    ///
    /// Out-of-range indices are rendered as `?`.
    pub fn names_from_indices<'a>(dims: &'a [Dimension], coord: &[usize])
        -> Vec<&'a str>
    {
        dims.iter().zip(coord)
            .map(|(d, k)| d.coord_name(*k).unwrap_or("?"))
            .collect()
    }
}
