//! Sparse matrix elements of [`Vector`][super::Vector]s and
//! [`Operator`][super::Operator]s.
//!
//! Flat indices into a product space are computed with the *first* dimension
//! varying fastest, i.e. for sizes `$(n_0, n_1, \dots)$` the coordinate
//! `$(c_0, c_1, \dots)$` sits at `$c_0 + n_0 (c_1 + n_1 (c_2 + \cdots))$`.

use std::fmt;
use num_complex::Complex64 as C64;
use crate::{
    complex::{ ComplexExt, ComplexFormat },
    tensor::Dimension,
};

/// Convert a coordinate tuple into a flat index.
pub fn coord_to_index(coord: &[usize], sizes: &[usize]) -> usize {
    coord.iter().zip(sizes).rev()
        .fold(0, |acc, (c, n)| acc * n + c)
}

/// Convert a flat index into a coordinate tuple.
pub fn index_to_coord(mut index: usize, sizes: &[usize]) -> Vec<usize> {
    sizes.iter()
        .map(|n| {
            let c = index % n;
            index /= n;
            c
        })
        .collect()
}

// true if `coord` has one in-range index per size
pub(crate) fn coord_fits(coord: &[usize], sizes: &[usize]) -> bool {
    coord.len() == sizes.len()
        && coord.iter().zip(sizes).all(|(c, n)| c < n)
}

/// A single basis ket `a |c⟩`.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorEntry {
    pub coord: Vec<usize>,
    pub value: C64,
}

impl VectorEntry {
    /// Create a new `VectorEntry`.
    pub fn new<I>(coord: I, value: C64) -> Self
    where I: IntoIterator<Item = usize>
    {
        Self { coord: coord.into_iter().collect(), value }
    }

    /// Create a new `VectorEntry` from a flat index into a space of the given
    /// sizes.
    pub fn from_index(index: usize, sizes: &[usize], value: C64) -> Self {
        Self { coord: index_to_coord(index, sizes), value }
    }

    /// Return the flat index of the entry in a space of the given sizes.
    pub fn to_index(&self, sizes: &[usize]) -> usize {
        coord_to_index(&self.coord, sizes)
    }

    /// Tensor product with another entry: coordinates are concatenated and
    /// values multiplied.
    pub fn outer(&self, other: &Self) -> Self {
        Self {
            coord: self.coord.iter().chain(&other.coord).copied().collect(),
            value: self.value * other.value,
        }
    }

    /// Render the entry as `value |names⟩` with respect to `dims`.
    pub fn to_ket_string(
        &self,
        dims: &[Dimension],
        format: ComplexFormat,
        precision: usize,
    ) -> String
    {
        format!(
            "{} |{}⟩",
            self.value.format_with(format, precision),
            Dimension::names_from_indices(dims, &self.coord).join(","),
        )
    }
}

impl fmt::Display for VectorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sparse vector entry [{:?}] has value {}",
            self.coord, self.value)
    }
}

/// A single matrix element `a |c_out⟩⟨c_in|`.
#[derive(Clone, Debug, PartialEq)]
pub struct OperatorEntry {
    pub coord_out: Vec<usize>,
    pub coord_in: Vec<usize>,
    pub value: C64,
}

impl OperatorEntry {
    /// Create a new `OperatorEntry`.
    pub fn new<I, J>(coord_out: I, coord_in: J, value: C64) -> Self
    where
        I: IntoIterator<Item = usize>,
        J: IntoIterator<Item = usize>,
    {
        Self {
            coord_out: coord_out.into_iter().collect(),
            coord_in: coord_in.into_iter().collect(),
            value,
        }
    }

    /// Create a new `OperatorEntry` from flat output and input indices.
    pub fn from_indices(
        index_out: usize,
        index_in: usize,
        sizes_out: &[usize],
        sizes_in: &[usize],
        value: C64,
    ) -> Self
    {
        Self {
            coord_out: index_to_coord(index_out, sizes_out),
            coord_in: index_to_coord(index_in, sizes_in),
            value,
        }
    }

    /// Return the flat `(output, input)` indices of the entry.
    pub fn to_indices(&self, sizes_out: &[usize], sizes_in: &[usize])
        -> (usize, usize)
    {
        (
            coord_to_index(&self.coord_out, sizes_out),
            coord_to_index(&self.coord_in, sizes_in),
        )
    }

    /// Tensor product with another entry: output and input coordinates are
    /// each concatenated and values multiplied.
    pub fn outer(&self, other: &Self) -> Self {
        Self {
            coord_out:
                self.coord_out.iter().chain(&other.coord_out)
                .copied().collect(),
            coord_in:
                self.coord_in.iter().chain(&other.coord_in)
                .copied().collect(),
            value: self.value * other.value,
        }
    }

    /// Render the entry as `value |out⟩⟨in|` with respect to the given output
    /// and input dimensions.
    pub fn to_ket_bra_string(
        &self,
        dims_out: &[Dimension],
        dims_in: &[Dimension],
        format: ComplexFormat,
        precision: usize,
    ) -> String
    {
        format!(
            "{} |{}⟩⟨{}|",
            self.value.format_with(format, precision),
            Dimension::names_from_indices(dims_out, &self.coord_out).join(","),
            Dimension::names_from_indices(dims_in, &self.coord_in).join(","),
        )
    }
}

impl fmt::Display for OperatorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sparse operator entry [{:?}, {:?}] has value {}",
            self.coord_out, self.coord_in, self.value)
    }
}
