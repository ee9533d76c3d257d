//! Sparse vectors and operators over named, labeled dimensions.
//!
//! A [`Vector`] is a sum of basis kets, each stored as a coordinate tuple with
//! one index per [`Dimension`] and a complex amplitude. An [`Operator`] is the
//! analogous sum of ket-bras, with separate output and input dimension lists.
//! Every operation returns a new value; nothing is mutated in place.

use std::hash::Hash;
use num_complex::Complex64 as C64;
use rustc_hash::FxHashMap as HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TensorError {
    /// `dimension: number of coordinate names must match size`
    #[error("dimension {name}: size {size} does not match the number of coordinate names ({coords})")]
    DimensionMismatch { name: String, size: usize, coords: usize },

    /// `dimension: unknown coordinate name`
    #[error("dimension {dimension}: no coordinate named {coord:?}")]
    CoordinateNotFound { dimension: String, coord: String },

    /// `complex: division by zero`
    #[error("complex: division by zero")]
    DivideByZero,

    /// `complex: cannot normalize zero`
    #[error("complex: cannot normalize a value with zero magnitude")]
    ZeroNorm,

    /// `vector: cannot normalize the zero vector`
    #[error("vector: cannot normalize the zero vector")]
    ZeroVector,

    /// `dimensions: sequences have different lengths`
    #[error("dimensions: sequences have different lengths;\nlhs: [{0}]\nrhs: [{1}]")]
    DimensionSequenceMismatch(String, String),

    /// `dimensions: sequences differ at some position`
    #[error("dimensions: sequences differ at position {index};\nlhs: [{lhs}]\nrhs: [{rhs}]")]
    DimensionOrderMismatch { index: usize, lhs: String, rhs: String },

    /// `array: rows have different lengths`
    #[error("array: row {row} has length {found}, expected {expected}")]
    NonRectangularArray { row: usize, expected: usize, found: usize },

    /// `array: shape does not match the declared dimensions`
    #[error("array: shape {found:?} does not match the declared dimensions {expected:?}")]
    DimensionInconsistency { expected: Box<[usize]>, found: Box<[usize]> },

    /// `permute: not a permutation`
    #[error("permute: {0:?} is not a permutation of the dimension indices")]
    InvalidPermutation(Box<[usize]>),

    /// `entry: coordinate does not fit the dimensions`
    #[error("entry: coordinate {coord:?} does not fit dimension sizes {sizes:?}")]
    CoordinateOutOfBounds { coord: Box<[usize]>, sizes: Box<[usize]> },

    /// `coordinates: wrong number of coordinate names`
    #[error("coordinates: expected {expected} coordinate names, got {found}")]
    CoordNameCount { expected: usize, found: usize },

    /// `partial: invalid dimension position indices`
    #[error("partial: invalid dimension position indices {indices:?} for {n} dimensions")]
    InvalidCoordIndices { indices: Box<[usize]>, n: usize },

    /// `sum: no terms`
    #[error("sum: cannot add an empty list of terms")]
    EmptySum,
}
pub type TensorResult<T> = Result<T, TensorError>;

pub mod dimension;
pub use dimension::*;

pub mod entry;
pub use entry::*;

pub mod vector;
pub use vector::*;

pub mod operator;
pub use operator::*;

// check that `indices` are distinct and all less than `n`
pub(crate) fn check_indices(indices: &[usize], n: usize) -> TensorResult<()> {
    let mut seen = vec![false; n];
    for &k in indices.iter() {
        if k >= n || seen[k] {
            return Err(TensorError::InvalidCoordIndices {
                indices: indices.into(),
                n,
            });
        }
        seen[k] = true;
    }
    Ok(())
}

// the positions in `0..n` that are not in `indices`, in increasing order
pub(crate) fn complement_indices(indices: &[usize], n: usize) -> Vec<usize> {
    (0..n).filter(|k| !indices.contains(k)).collect()
}

// sums values by exact key, keeping keys in order of first appearance
pub(crate) struct Accumulator<K> {
    index: HashMap<K, usize>,
    items: Vec<(K, C64)>,
}

impl<K> Accumulator<K>
where K: Clone + Eq + Hash
{
    pub(crate) fn with_capacity(cap: usize) -> Self {
        let mut index: HashMap<K, usize> = HashMap::default();
        index.reserve(cap);
        Self { index, items: Vec::with_capacity(cap) }
    }

    pub(crate) fn add(&mut self, key: K, value: C64) {
        if let Some(k) = self.index.get(&key) {
            self.items[*k].1 += value;
        } else {
            self.index.insert(key.clone(), self.items.len());
            self.items.push((key, value));
        }
    }

    // exact zeros are dropped; near-zeros are kept
    pub(crate) fn into_nonzero(self) -> impl Iterator<Item = (K, C64)> {
        self.items.into_iter()
            .filter(|(_, value)| value.re != 0.0 || value.im != 0.0)
    }
}
