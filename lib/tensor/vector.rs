//! Sparse kets over lists of [`Dimension`]s.

use std::fmt;
use itertools::Itertools;
use ndarray as nd;
use num_complex::Complex64 as C64;
use rustc_hash::FxHashMap as HashMap;
use crate::{
    complex::ComplexFormat,
    tensor::{
        Accumulator,
        Dimension,
        TensorError,
        TensorResult,
        VectorEntry,
        check_indices,
        complement_indices,
        coord_fits,
    },
};

/// Entries whose squared magnitude is below this value are left out of
/// [`Vector::to_ket_string`].
pub const KET_STRING_THRESHOLD: f64 = 1e-6;

/// A sparse vector (ket) as a list of [`VectorEntry`]s over an ordered list of
/// [`Dimension`]s.
///
/// Entries are kept in the order in which they were produced; this order is
/// observable through [`Vector::to_ket_string`]. Entries are not required to
/// have distinct coordinates, but all operations that combine vectors merge
/// duplicates by summing their values.
#[derive(Clone, Debug)]
pub struct Vector {
    pub(crate) entries: Vec<VectorEntry>,
    pub(crate) dimensions: Vec<Dimension>,
}

impl Vector {
    /// Create a new `Vector`.
    ///
    /// Fails if any entry's coordinate has the wrong length or is out of range
    /// for `dimensions`.
    pub fn new(entries: Vec<VectorEntry>, dimensions: Vec<Dimension>)
        -> TensorResult<Self>
    {
        let sizes = Dimension::sizes(&dimensions);
        if let Some(bad)
            = entries.iter().find(|e| !coord_fits(&e.coord, &sizes))
        {
            return Err(TensorError::CoordinateOutOfBounds {
                coord: bad.coord.clone().into(),
                sizes: sizes.into(),
            });
        }
        Ok(Self { entries, dimensions })
    }

    pub(crate) fn new_unchecked(
        entries: Vec<VectorEntry>,
        dimensions: Vec<Dimension>,
    ) -> Self
    {
        Self { entries, dimensions }
    }

    /// Create a vector with no dimensions holding a single scalar.
    ///
    /// This is the identity of [`Self::outer`].
    pub fn scalar(value: C64) -> Self {
        Self { entries: vec![VectorEntry::new([], value)], dimensions: vec![] }
    }

    /// Create the zero vector over `dimensions`.
    pub fn zeros(dimensions: Vec<Dimension>) -> Self {
        Self { entries: Vec::new(), dimensions }
    }

    /// Create a basis vector with amplitude `1` at the coordinate named by
    /// `coord_names`.
    pub fn indicator<S>(dimensions: Vec<Dimension>, coord_names: &[S])
        -> TensorResult<Self>
    where S: AsRef<str>
    {
        let coord = Dimension::indices_from_names(&dimensions, coord_names)?;
        Ok(Self {
            entries: vec![VectorEntry::new(coord, 1.0.into())],
            dimensions,
        })
    }

    /// Create a vector from a list of `(coordinate names, value)` pairs.
    pub fn from_sparse_coord_names<I, N, S>(items: I, dimensions: Vec<Dimension>)
        -> TensorResult<Self>
    where
        I: IntoIterator<Item = (N, C64)>,
        N: AsRef<[S]>,
        S: AsRef<str>,
    {
        let entries: Vec<VectorEntry>
            = items.into_iter()
            .map(|(names, value)| {
                Dimension::indices_from_names(&dimensions, names.as_ref())
                    .map(|coord| VectorEntry::new(coord, value))
            })
            .collect::<TensorResult<_>>()?;
        Ok(Self { entries, dimensions })
    }

    /// Create a vector from a dense list of values, indexed with the first
    /// dimension varying fastest.
    ///
    /// Zero values are not stored. Fails if the number of values is not equal
    /// to the total size of `dimensions`.
    pub fn from_dense(values: &[C64], dimensions: Vec<Dimension>)
        -> TensorResult<Self>
    {
        let sizes = Dimension::sizes(&dimensions);
        let total: usize = sizes.iter().product();
        if values.len() != total {
            return Err(TensorError::DimensionInconsistency {
                expected: Box::new([total]),
                found: Box::new([values.len()]),
            });
        }
        let entries: Vec<VectorEntry>
            = values.iter().enumerate()
            .filter(|(_, a)| a.norm_sqr() != 0.0)
            .map(|(k, a)| VectorEntry::from_index(k, &sizes, *a))
            .collect();
        Ok(Self { entries, dimensions })
    }

    /// Convert to a dense array, indexed with the first dimension varying
    /// fastest.
    pub fn to_dense(&self) -> nd::Array1<C64> {
        let sizes = self.size();
        let mut array: nd::Array1<C64>
            = nd::Array1::zeros(sizes.iter().product::<usize>());
        self.entries.iter()
            .for_each(|e| { array[e.to_index(&sizes)] += e.value; });
        array
    }

    /// Return the stored entries.
    pub fn entries(&self) -> &[VectorEntry] { &self.entries }

    /// Return the stored entries, consuming `self`.
    pub fn into_entries(self) -> Vec<VectorEntry> { self.entries }

    /// Return the dimensions.
    pub fn dimensions(&self) -> &[Dimension] { &self.dimensions }

    /// Return the number of stored entries.
    pub fn len(&self) -> usize { self.entries.len() }

    /// Return `true` if no entries are stored.
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Return the sizes of all dimensions.
    pub fn size(&self) -> Vec<usize> { Dimension::sizes(&self.dimensions) }

    /// Return the size of the full product space.
    pub fn total_size(&self) -> usize {
        Dimension::total_size(&self.dimensions)
    }

    /// Return the names of all dimensions.
    pub fn names(&self) -> Vec<&str> {
        self.dimensions.iter().map(|d| d.name()).collect()
    }

    /// Return the coordinate names of all dimensions.
    pub fn coord_names(&self) -> Vec<&[String]> {
        self.dimensions.iter().map(|d| d.coord_names()).collect()
    }

    /// Return the total amplitude stored at `coord`, zero if absent.
    pub fn amplitude_at(&self, coord: &[usize]) -> C64 {
        self.entries.iter()
            .filter(|e| e.coord == coord)
            .map(|e| e.value)
            .sum()
    }

    /// Compute the tensor product `self ⊗ other`.
    ///
    /// Dimensions are concatenated, and every pair of entries is combined into
    /// a single entry; the result has exactly `self.len() * other.len()`
    /// entries.
    pub fn outer(&self, other: &Self) -> Self {
        let entries: Vec<VectorEntry>
            = Itertools::cartesian_product(
                self.entries.iter(),
                other.entries.iter(),
            )
            .map(|(l, r)| l.outer(r))
            .collect();
        let dimensions: Vec<Dimension>
            = self.dimensions.iter()
            .chain(other.dimensions.iter())
            .cloned()
            .collect();
        Self { entries, dimensions }
    }

    /// Compute the tensor product of many vectors, in order.
    pub fn outer_all<'a, I>(vectors: I) -> Self
    where I: IntoIterator<Item = &'a Vector>
    {
        vectors.into_iter()
            .fold(Self::scalar(1.0.into()), |acc, v| acc.outer(v))
    }

    /// Compute the sum of many vectors defined over the same dimensions.
    ///
    /// Entries with identical coordinates are merged; coordinates appear in
    /// the order in which they are first encountered.
    pub fn add_all<'a, I>(vectors: I) -> TensorResult<Self>
    where I: IntoIterator<Item = &'a Vector>
    {
        let mut iter = vectors.into_iter();
        let first = iter.next().ok_or(TensorError::EmptySum)?;
        let mut acc: Accumulator<Vec<usize>>
            = Accumulator::with_capacity(first.len());
        first.entries.iter()
            .for_each(|e| { acc.add(e.coord.clone(), e.value); });
        for v in iter {
            Dimension::check_dimensions(&first.dimensions, &v.dimensions)?;
            v.entries.iter()
                .for_each(|e| { acc.add(e.coord.clone(), e.value); });
        }
        let entries: Vec<VectorEntry>
            = acc.into_nonzero()
            .map(|(coord, value)| VectorEntry { coord, value })
            .collect();
        Ok(Self { entries, dimensions: first.dimensions.clone() })
    }

    /// Compute `self + other`.
    pub fn add(&self, other: &Self) -> TensorResult<Self> {
        Self::add_all([self, other])
    }

    /// Compute `self - other`.
    pub fn sub(&self, other: &Self) -> TensorResult<Self> {
        Self::add_all([self, &other.mul_constant((-1.0).into())])
    }

    /// Multiply every entry by a constant.
    pub fn mul_constant(&self, c: C64) -> Self {
        let entries: Vec<VectorEntry>
            = self.entries.iter()
            .map(|e| VectorEntry { coord: e.coord.clone(), value: e.value * c })
            .collect();
        Self { entries, dimensions: self.dimensions.clone() }
    }

    /// Complex-conjugate every entry.
    pub fn conj(&self) -> Self {
        let entries: Vec<VectorEntry>
            = self.entries.iter()
            .map(|e| VectorEntry { coord: e.coord.clone(), value: e.value.conj() })
            .collect();
        Self { entries, dimensions: self.dimensions.clone() }
    }

    // sum `f(a, b)` over all pairs of entries with matching coordinates
    fn contract_with<F>(&self, other: &Self, f: F) -> C64
    where F: Fn(C64, C64) -> C64
    {
        let mut lhs: HashMap<&[usize], C64> = HashMap::default();
        self.entries.iter()
            .for_each(|e| { *lhs.entry(e.coord.as_slice()).or_default() += e.value; });
        other.entries.iter()
            .filter_map(|e| {
                lhs.get(e.coord.as_slice()).map(|a| f(*a, e.value))
            })
            .sum()
    }

    /// Compute the bilinear product `Σ a_c b_c` without complex conjugation.
    pub fn dot(&self, other: &Self) -> TensorResult<C64> {
        Dimension::check_dimensions(&self.dimensions, &other.dimensions)?;
        Ok(self.contract_with(other, |a, b| a * b))
    }

    /// Compute the inner product `⟨self|other⟩ = Σ conj(a_c) b_c`.
    pub fn inner(&self, other: &Self) -> TensorResult<C64> {
        Dimension::check_dimensions(&self.dimensions, &other.dimensions)?;
        Ok(self.contract_with(other, |a, b| a.conj() * b))
    }

    /// Compute `⟨self|self⟩`.
    pub fn norm_squared(&self) -> f64 {
        self.contract_with(self, |a, b| a.conj() * b).re
    }

    /// Rescale `self` to unit norm.
    ///
    /// Fails if `self` is the zero vector.
    pub fn normalize(&self) -> TensorResult<Self> {
        let norm2 = self.norm_squared();
        if norm2 == 0.0 {
            Err(TensorError::ZeroVector)
        } else {
            Ok(self.mul_constant((1.0 / norm2.sqrt()).into()))
        }
    }

    /// Reorder dimensions such that the `k`-th dimension of the result is the
    /// `order[k]`-th dimension of `self`.
    ///
    /// Fails if `order` is not a permutation of `0..self.dimensions().len()`.
    pub fn permute(&self, order: &[usize]) -> TensorResult<Self> {
        let n = self.dimensions.len();
        if order.len() != n || check_indices(order, n).is_err() {
            return Err(TensorError::InvalidPermutation(order.into()));
        }
        let entries: Vec<VectorEntry>
            = self.entries.iter()
            .map(|e| VectorEntry {
                coord: order.iter().map(|k| e.coord[*k]).collect(),
                value: e.value,
            })
            .collect();
        let dimensions: Vec<Dimension>
            = order.iter().map(|k| self.dimensions[*k].clone()).collect();
        Ok(Self { entries, dimensions })
    }

    /// Contract `self`, as a bra, against the dimensions of `other` at
    /// positions `indices`.
    ///
    /// `self`'s dimensions must equal those of `other` at `indices`, in order.
    /// The result is defined over the remaining dimensions of `other`, in
    /// their original relative order:
    /// ```math
    /// \ket{r} = \sum_{c, d} \overline{s_c} \, o_{c \oplus d} \ket{d}
    /// ```
    pub fn inner_partial(&self, indices: &[usize], other: &Self)
        -> TensorResult<Self>
    {
        let n = other.dimensions.len();
        check_indices(indices, n)?;
        let targeted: Vec<Dimension>
            = indices.iter().map(|k| other.dimensions[*k].clone()).collect();
        Dimension::check_dimensions(&self.dimensions, &targeted)?;
        let rest = complement_indices(indices, n);

        let mut bra: HashMap<&[usize], C64> = HashMap::default();
        self.entries.iter()
            .for_each(|e| {
                *bra.entry(e.coord.as_slice()).or_default() += e.value.conj();
            });

        let mut acc: Accumulator<Vec<usize>>
            = Accumulator::with_capacity(other.len());
        let mut key: Vec<usize> = Vec::with_capacity(indices.len());
        for e in other.entries.iter() {
            key.clear();
            key.extend(indices.iter().map(|k| e.coord[*k]));
            if let Some(a) = bra.get(key.as_slice()) {
                let coord: Vec<usize> = rest.iter().map(|k| e.coord[*k]).collect();
                acc.add(coord, *a * e.value);
            }
        }
        let entries: Vec<VectorEntry>
            = acc.into_nonzero()
            .map(|(coord, value)| VectorEntry { coord, value })
            .collect();
        let dimensions: Vec<Dimension>
            = rest.iter().map(|k| other.dimensions[*k].clone()).collect();
        Ok(Self { entries, dimensions })
    }

    /// Return `true` if `self` and `other` differ by less than `eps` at every
    /// coordinate.
    ///
    /// Fails if the two vectors are defined over different dimensions.
    pub fn is_close_to(&self, other: &Self, eps: f64) -> TensorResult<bool> {
        let diff = self.sub(other)?;
        Ok(diff.entries.iter().all(|e| e.value.norm() < eps))
    }

    /// Render `self` as a sum of kets, `a |c_0,c_1,...⟩ + ...`, in entry
    /// order.
    ///
    /// Entries with squared magnitude below [`KET_STRING_THRESHOLD`] are left
    /// out; the zero vector renders as an empty string.
    pub fn to_ket_string(&self, format: ComplexFormat, precision: usize)
        -> String
    {
        self.entries.iter()
            .filter(|e| e.value.norm_sqr() >= KET_STRING_THRESHOLD)
            .map(|e| e.to_ket_string(&self.dimensions, format, precision))
            .join(" + ")
    }
}

impl fmt::Display for Vector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(2);
        write!(f, "{}", self.to_ket_string(ComplexFormat::Cartesian, precision))
    }
}
