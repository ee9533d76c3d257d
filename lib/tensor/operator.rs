//! Sparse linear maps between lists of [`Dimension`]s.

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
        OperatorEntry,
        TensorError,
        TensorResult,
        Vector,
        VectorEntry,
        check_indices,
        complement_indices,
        coord_fits,
        index_to_coord,
        vector::KET_STRING_THRESHOLD,
    },
};

/// A sparse operator as a list of [`OperatorEntry`]s, mapping a space over
/// `dimensions_in` to one over `dimensions_out`.
///
/// The two dimension lists may differ in length and content, although most
/// physical operators are square with equal lists.
#[derive(Clone, Debug)]
pub struct Operator {
    pub(crate) entries: Vec<OperatorEntry>,
    pub(crate) dimensions_out: Vec<Dimension>,
    pub(crate) dimensions_in: Vec<Dimension>,
}

// dense closeness for equal-shaped matrices
fn dense_close(a: &nd::Array2<C64>, b: &nd::Array2<C64>, eps: f64) -> bool {
    a.shape() == b.shape()
        && a.iter().zip(b.iter()).all(|(x, y)| (x - y).norm() < eps)
}

// conjugate transpose of a dense matrix
fn dense_dag(a: &nd::Array2<C64>) -> nd::Array2<C64> {
    a.t().mapv(|z| z.conj())
}

// coordinate `coord` with positions `indices` replaced by `repl`
fn splice(coord: &[usize], indices: &[usize], repl: &[usize]) -> Vec<usize> {
    let mut new = coord.to_vec();
    indices.iter().zip(repl).for_each(|(k, c)| { new[*k] = *c; });
    new
}

impl Operator {
    /// Create a new `Operator`.
    ///
    /// Fails if any entry's output or input coordinate has the wrong length or
    /// is out of range for the corresponding dimensions.
    pub fn new(
        entries: Vec<OperatorEntry>,
        dimensions_out: Vec<Dimension>,
        dimensions_in: Vec<Dimension>,
    ) -> TensorResult<Self>
    {
        let sizes_out = Dimension::sizes(&dimensions_out);
        let sizes_in = Dimension::sizes(&dimensions_in);
        for e in entries.iter() {
            if !coord_fits(&e.coord_out, &sizes_out) {
                return Err(TensorError::CoordinateOutOfBounds {
                    coord: e.coord_out.clone().into(),
                    sizes: sizes_out.into(),
                });
            }
            if !coord_fits(&e.coord_in, &sizes_in) {
                return Err(TensorError::CoordinateOutOfBounds {
                    coord: e.coord_in.clone().into(),
                    sizes: sizes_in.into(),
                });
            }
        }
        Ok(Self { entries, dimensions_out, dimensions_in })
    }

    pub(crate) fn new_unchecked(
        entries: Vec<OperatorEntry>,
        dimensions_out: Vec<Dimension>,
        dimensions_in: Vec<Dimension>,
    ) -> Self
    {
        Self { entries, dimensions_out, dimensions_in }
    }

    /// Create the zero operator.
    pub fn zeros(dimensions_out: Vec<Dimension>, dimensions_in: Vec<Dimension>)
        -> Self
    {
        Self { entries: Vec::new(), dimensions_out, dimensions_in }
    }

    /// Create an operator with no dimensions holding a single scalar.
    ///
    /// This is the identity of [`Self::outer`].
    pub fn scalar(value: C64) -> Self {
        Self {
            entries: vec![OperatorEntry::new([], [], value)],
            dimensions_out: vec![],
            dimensions_in: vec![],
        }
    }

    /// Create the identity operator on `dimensions`.
    pub fn identity(dimensions: Vec<Dimension>) -> Self {
        let sizes = Dimension::sizes(&dimensions);
        let total: usize = sizes.iter().product();
        let entries: Vec<OperatorEntry>
            = (0..total)
            .map(|k| {
                let coord = index_to_coord(k, &sizes);
                OperatorEntry {
                    coord_out: coord.clone(),
                    coord_in: coord,
                    value: 1.0.into(),
                }
            })
            .collect();
        Self {
            entries,
            dimensions_out: dimensions.clone(),
            dimensions_in: dimensions,
        }
    }

    /// Create the projector `|c⟩⟨c|` onto the basis state named by
    /// `coord_names`.
    pub fn indicator<S>(dimensions: Vec<Dimension>, coord_names: &[S])
        -> TensorResult<Self>
    where S: AsRef<str>
    {
        let coord = Dimension::indices_from_names(&dimensions, coord_names)?;
        Ok(Self {
            entries: vec![OperatorEntry::new(coord.clone(), coord, 1.0.into())],
            dimensions_out: dimensions.clone(),
            dimensions_in: dimensions,
        })
    }

    /// Create the ket-bra `|ket⟩⟨bra|`.
    pub fn ket_bra(ket: &Vector, bra: &Vector) -> Self {
        let entries: Vec<OperatorEntry>
            = Itertools::cartesian_product(ket.entries.iter(), bra.entries.iter())
            .map(|(k, b)| OperatorEntry {
                coord_out: k.coord.clone(),
                coord_in: b.coord.clone(),
                value: k.value * b.value.conj(),
            })
            .collect();
        Self {
            entries,
            dimensions_out: ket.dimensions.clone(),
            dimensions_in: bra.dimensions.clone(),
        }
    }

    /// Create the projector `|v⟩⟨v|`.
    ///
    /// This is a proper projection only if `v` is normalized.
    pub fn projector(v: &Vector) -> Self { Self::ket_bra(v, v) }

    /// Create the operator shifting every coordinate `c` of `dimension` to
    /// `c + delta`.
    ///
    /// Coordinates shifted out of `0..size` are dropped rather than wrapped
    /// around, so the result is not unitary for `delta != 0`.
    pub fn shift(dimension: &Dimension, delta: isize) -> Self {
        let size = dimension.size() as isize;
        let entries: Vec<OperatorEntry>
            = (0..size)
            .filter_map(|c| {
                let target = c + delta;
                (0..size).contains(&target)
                    .then(|| {
                        OperatorEntry::new(
                            [target as usize], [c as usize], 1.0.into())
                    })
            })
            .collect();
        Self {
            entries,
            dimensions_out: vec![dimension.clone()],
            dimensions_in: vec![dimension.clone()],
        }
    }

    /// Create an operator from a dense matrix given as a list of rows.
    ///
    /// Row indices run over `dimensions_out` and column indices over
    /// `dimensions_in`, each with the first dimension varying fastest. Zero
    /// values are not stored.
    ///
    /// Fails if rows have different lengths or if the shape of the matrix does
    /// not match the total sizes of the dimensions.
    pub fn from_array<R>(
        rows: &[R],
        dimensions_out: Vec<Dimension>,
        dimensions_in: Vec<Dimension>,
    ) -> TensorResult<Self>
    where R: AsRef<[C64]>
    {
        let ncols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        if let Some((row, r))
            = rows.iter().enumerate().find(|(_, r)| r.as_ref().len() != ncols)
        {
            return Err(TensorError::NonRectangularArray {
                row,
                expected: ncols,
                found: r.as_ref().len(),
            });
        }
        let sizes_out = Dimension::sizes(&dimensions_out);
        let sizes_in = Dimension::sizes(&dimensions_in);
        let total_out: usize = sizes_out.iter().product();
        let total_in: usize = sizes_in.iter().product();
        if rows.len() != total_out || ncols != total_in {
            return Err(TensorError::DimensionInconsistency {
                expected: Box::new([total_out, total_in]),
                found: Box::new([rows.len(), ncols]),
            });
        }
        let entries: Vec<OperatorEntry>
            = rows.iter().enumerate()
            .flat_map(|(i, row)| {
                row.as_ref().iter().enumerate()
                    .filter(|(_, a)| a.norm_sqr() != 0.0)
                    .map(move |(j, a)| (i, j, *a))
            })
            .map(|(i, j, a)| {
                OperatorEntry::from_indices(i, j, &sizes_out, &sizes_in, a)
            })
            .collect();
        Ok(Self { entries, dimensions_out, dimensions_in })
    }

    /// Like [`Self::from_array`], but taking an [`ndarray`] matrix.
    pub fn from_ndarray(
        array: &nd::Array2<C64>,
        dimensions_out: Vec<Dimension>,
        dimensions_in: Vec<Dimension>,
    ) -> TensorResult<Self>
    {
        let rows: Vec<Vec<C64>>
            = array.outer_iter().map(|row| row.to_vec()).collect();
        if rows.is_empty() && array.ncols() > 0 {
            return Err(TensorError::DimensionInconsistency {
                expected: Box::new([
                    Dimension::total_size(&dimensions_out),
                    Dimension::total_size(&dimensions_in),
                ]),
                found: Box::new([0, array.ncols()]),
            });
        }
        Self::from_array(&rows, dimensions_out, dimensions_in)
    }

    /// Convert to a dense matrix; see [`Self::from_array`] for index
    /// conventions.
    pub fn to_dense(&self) -> nd::Array2<C64> {
        let sizes_out = self.size_out();
        let sizes_in = self.size_in();
        let mut array: nd::Array2<C64>
            = nd::Array2::zeros((
                sizes_out.iter().product::<usize>(),
                sizes_in.iter().product::<usize>(),
            ));
        self.entries.iter()
            .for_each(|e| {
                let (i, j) = e.to_indices(&sizes_out, &sizes_in);
                array[[i, j]] += e.value;
            });
        array
    }

    /// Create an operator from a list of `(output names, input names, value)`
    /// triples.
    pub fn from_sparse_coord_names<I, N, M, S>(
        items: I,
        dimensions_out: Vec<Dimension>,
        dimensions_in: Vec<Dimension>,
    ) -> TensorResult<Self>
    where
        I: IntoIterator<Item = (N, M, C64)>,
        N: AsRef<[S]>,
        M: AsRef<[S]>,
        S: AsRef<str>,
    {
        let entries: Vec<OperatorEntry>
            = items.into_iter()
            .map(|(names_out, names_in, value)| {
                let coord_out = Dimension::indices_from_names(
                    &dimensions_out, names_out.as_ref())?;
                let coord_in = Dimension::indices_from_names(
                    &dimensions_in, names_in.as_ref())?;
                Ok(OperatorEntry { coord_out, coord_in, value })
            })
            .collect::<TensorResult<_>>()?;
        Ok(Self { entries, dimensions_out, dimensions_in })
    }

    /// Return the stored entries.
    pub fn entries(&self) -> &[OperatorEntry] { &self.entries }

    /// Return the output dimensions.
    pub fn dimensions_out(&self) -> &[Dimension] { &self.dimensions_out }

    /// Return the input dimensions.
    pub fn dimensions_in(&self) -> &[Dimension] { &self.dimensions_in }

    /// Return the number of stored entries.
    pub fn len(&self) -> usize { self.entries.len() }

    /// Return `true` if no entries are stored.
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// Return the sizes of all output dimensions.
    pub fn size_out(&self) -> Vec<usize> {
        Dimension::sizes(&self.dimensions_out)
    }

    /// Return the sizes of all input dimensions.
    pub fn size_in(&self) -> Vec<usize> {
        Dimension::sizes(&self.dimensions_in)
    }

    /// Return the names of all output dimensions.
    pub fn names_out(&self) -> Vec<&str> {
        self.dimensions_out.iter().map(|d| d.name()).collect()
    }

    /// Return the names of all input dimensions.
    pub fn names_in(&self) -> Vec<&str> {
        self.dimensions_in.iter().map(|d| d.name()).collect()
    }

    /// Compute the tensor product `self ⊗ other`.
    pub fn outer(&self, other: &Self) -> Self {
        let entries: Vec<OperatorEntry>
            = Itertools::cartesian_product(
                self.entries.iter(),
                other.entries.iter(),
            )
            .map(|(l, r)| l.outer(r))
            .collect();
        Self {
            entries,
            dimensions_out:
                self.dimensions_out.iter()
                .chain(other.dimensions_out.iter())
                .cloned()
                .collect(),
            dimensions_in:
                self.dimensions_in.iter()
                .chain(other.dimensions_in.iter())
                .cloned()
                .collect(),
        }
    }

    /// Compute the tensor product of many operators, in order.
    pub fn outer_all<'a, I>(ops: I) -> Self
    where I: IntoIterator<Item = &'a Operator>
    {
        ops.into_iter()
            .fold(Self::scalar(1.0.into()), |acc, op| acc.outer(op))
    }

    /// Compute the sum of many operators defined over the same dimensions.
    ///
    /// Entries with identical coordinates are merged; coordinates appear in
    /// the order in which they are first encountered.
    pub fn add_all<'a, I>(ops: I) -> TensorResult<Self>
    where I: IntoIterator<Item = &'a Operator>
    {
        let mut iter = ops.into_iter();
        let first = iter.next().ok_or(TensorError::EmptySum)?;
        let mut acc: Accumulator<(Vec<usize>, Vec<usize>)>
            = Accumulator::with_capacity(first.len());
        first.entries.iter()
            .for_each(|e| {
                acc.add((e.coord_out.clone(), e.coord_in.clone()), e.value);
            });
        for op in iter {
            Dimension::check_dimensions(&first.dimensions_out, &op.dimensions_out)?;
            Dimension::check_dimensions(&first.dimensions_in, &op.dimensions_in)?;
            op.entries.iter()
                .for_each(|e| {
                    acc.add((e.coord_out.clone(), e.coord_in.clone()), e.value);
                });
        }
        let entries: Vec<OperatorEntry>
            = acc.into_nonzero()
            .map(|((coord_out, coord_in), value)| {
                OperatorEntry { coord_out, coord_in, value }
            })
            .collect();
        Ok(Self {
            entries,
            dimensions_out: first.dimensions_out.clone(),
            dimensions_in: first.dimensions_in.clone(),
        })
    }

    /// Compute `self + other`.
    pub fn add(&self, other: &Self) -> TensorResult<Self> {
        Self::add_all([self, other])
    }

    /// Compute `self - other`.
    pub fn sub(&self, other: &Self) -> TensorResult<Self> {
        Self::add_all([self, &other.mul_constant((-1.0).into())])
    }

    // apply `f` to every entry, keeping dimensions
    fn map_entries<F>(&self, f: F) -> Self
    where F: Fn(&OperatorEntry) -> OperatorEntry
    {
        Self {
            entries: self.entries.iter().map(f).collect(),
            dimensions_out: self.dimensions_out.clone(),
            dimensions_in: self.dimensions_in.clone(),
        }
    }

    /// Multiply every entry by a constant.
    pub fn mul_constant(&self, c: C64) -> Self {
        self.map_entries(|e| OperatorEntry { value: e.value * c, ..e.clone() })
    }

    /// Complex-conjugate every entry.
    pub fn conj(&self) -> Self {
        self.map_entries(|e| OperatorEntry { value: e.value.conj(), ..e.clone() })
    }

    /// Swap the roles of outputs and inputs.
    pub fn transpose(&self) -> Self {
        let entries: Vec<OperatorEntry>
            = self.entries.iter()
            .map(|e| OperatorEntry {
                coord_out: e.coord_in.clone(),
                coord_in: e.coord_out.clone(),
                value: e.value,
            })
            .collect();
        Self {
            entries,
            dimensions_out: self.dimensions_in.clone(),
            dimensions_in: self.dimensions_out.clone(),
        }
    }

    /// Compute the Hermitian conjugate (conjugate transpose).
    pub fn dag(&self) -> Self { self.transpose().conj() }

    /// Reorder output dimensions by `order_out` and input dimensions by
    /// `order_in`; see [`Vector::permute`].
    pub fn permute_dims(&self, order_out: &[usize], order_in: &[usize])
        -> TensorResult<Self>
    {
        let n_out = self.dimensions_out.len();
        if order_out.len() != n_out || check_indices(order_out, n_out).is_err() {
            return Err(TensorError::InvalidPermutation(order_out.into()));
        }
        let n_in = self.dimensions_in.len();
        if order_in.len() != n_in || check_indices(order_in, n_in).is_err() {
            return Err(TensorError::InvalidPermutation(order_in.into()));
        }
        let entries: Vec<OperatorEntry>
            = self.entries.iter()
            .map(|e| OperatorEntry {
                coord_out: order_out.iter().map(|k| e.coord_out[*k]).collect(),
                coord_in: order_in.iter().map(|k| e.coord_in[*k]).collect(),
                value: e.value,
            })
            .collect();
        Ok(Self {
            entries,
            dimensions_out:
                order_out.iter()
                .map(|k| self.dimensions_out[*k].clone())
                .collect(),
            dimensions_in:
                order_in.iter()
                .map(|k| self.dimensions_in[*k].clone())
                .collect(),
        })
    }

    /// Reorder both output and input dimensions by `order`.
    pub fn permute(&self, order: &[usize]) -> TensorResult<Self> {
        self.permute_dims(order, order)
    }

    /// Compute the composition `self ∘ other`.
    ///
    /// `self`'s input dimensions must equal `other`'s output dimensions.
    pub fn mul_op(&self, other: &Self) -> TensorResult<Self> {
        Dimension::check_dimensions(&self.dimensions_in, &other.dimensions_out)?;
        let mut by_out: HashMap<&[usize], Vec<&OperatorEntry>>
            = HashMap::default();
        other.entries.iter()
            .for_each(|e| {
                by_out.entry(e.coord_out.as_slice()).or_default().push(e);
            });
        let mut acc: Accumulator<(Vec<usize>, Vec<usize>)>
            = Accumulator::with_capacity(self.len().max(other.len()));
        for a in self.entries.iter() {
            if let Some(bs) = by_out.get(a.coord_in.as_slice()) {
                for b in bs.iter() {
                    acc.add(
                        (a.coord_out.clone(), b.coord_in.clone()),
                        a.value * b.value,
                    );
                }
            }
        }
        let entries: Vec<OperatorEntry>
            = acc.into_nonzero()
            .map(|((coord_out, coord_in), value)| {
                OperatorEntry { coord_out, coord_in, value }
            })
            .collect();
        Ok(Self {
            entries,
            dimensions_out: self.dimensions_out.clone(),
            dimensions_in: other.dimensions_in.clone(),
        })
    }

    /// Compute `self |v⟩`.
    ///
    /// `self`'s input dimensions must equal those of `v`; the result is
    /// defined over `self`'s output dimensions.
    pub fn mul_vec(&self, v: &Vector) -> TensorResult<Vector> {
        Dimension::check_dimensions(&self.dimensions_in, &v.dimensions)?;
        let mut amps: HashMap<&[usize], C64> = HashMap::default();
        v.entries.iter()
            .for_each(|e| {
                *amps.entry(e.coord.as_slice()).or_default() += e.value;
            });
        let mut acc: Accumulator<Vec<usize>>
            = Accumulator::with_capacity(self.len());
        for e in self.entries.iter() {
            if let Some(a) = amps.get(e.coord_in.as_slice()) {
                acc.add(e.coord_out.clone(), e.value * a);
            }
        }
        let entries: Vec<VectorEntry>
            = acc.into_nonzero()
            .map(|(coord, value)| VectorEntry { coord, value })
            .collect();
        Ok(Vector::new_unchecked(entries, self.dimensions_out.clone()))
    }

    /// Apply `self` to the dimensions of `v` at positions `indices`, leaving
    /// all other dimensions untouched.
    ///
    /// `self`'s input dimensions must equal those of `v` at `indices`, in
    /// order, and `self` must have as many output dimensions as input
    /// dimensions; the targeted dimensions of the result are replaced by
    /// `self`'s output dimensions in place. This is equivalent to permuting the
    /// targeted dimensions to the front, applying `self ⊗ 1`, and permuting
    /// back, but never builds the identity part: the cost scales with the
    /// number of stored entries of `self` and `v`.
    pub fn mul_vec_partial(&self, indices: &[usize], v: &Vector)
        -> TensorResult<Vector>
    {
        let n = v.dimensions.len();
        check_indices(indices, n)?;
        let targeted: Vec<Dimension>
            = indices.iter().map(|k| v.dimensions[*k].clone()).collect();
        Dimension::check_dimensions(&self.dimensions_in, &targeted)?;
        if self.dimensions_out.len() != self.dimensions_in.len() {
            return Err(TensorError::DimensionSequenceMismatch(
                Dimension::concat_dim_names(&self.dimensions_out),
                Dimension::concat_dim_names(&self.dimensions_in),
            ));
        }

        let mut by_in: HashMap<&[usize], Vec<(&[usize], C64)>>
            = HashMap::default();
        self.entries.iter()
            .for_each(|e| {
                by_in.entry(e.coord_in.as_slice()).or_default()
                    .push((e.coord_out.as_slice(), e.value));
            });

        let mut acc: Accumulator<Vec<usize>>
            = Accumulator::with_capacity(v.len());
        let mut key: Vec<usize> = Vec::with_capacity(indices.len());
        for e in v.entries.iter() {
            key.clear();
            key.extend(indices.iter().map(|k| e.coord[*k]));
            if let Some(outs) = by_in.get(key.as_slice()) {
                for &(out, a) in outs.iter() {
                    acc.add(splice(&e.coord, indices, out), a * e.value);
                }
            }
        }
        let entries: Vec<VectorEntry>
            = acc.into_nonzero()
            .map(|(coord, value)| VectorEntry { coord, value })
            .collect();
        let mut dimensions = v.dimensions.clone();
        indices.iter().zip(self.dimensions_out.iter())
            .for_each(|(k, d)| { dimensions[*k] = d.clone(); });
        Ok(Vector::new_unchecked(entries, dimensions))
    }

    /// Trace out the dimensions at positions `indices`.
    ///
    /// `self` must have equal numbers of output and input dimensions, with
    /// those at `indices` equal.
    pub fn partial_trace(&self, indices: &[usize]) -> TensorResult<Self> {
        let n = self.dimensions_out.len();
        if self.dimensions_in.len() != n {
            return Err(TensorError::DimensionSequenceMismatch(
                Dimension::concat_dim_names(&self.dimensions_out),
                Dimension::concat_dim_names(&self.dimensions_in),
            ));
        }
        check_indices(indices, n)?;
        let traced_out: Vec<Dimension>
            = indices.iter().map(|k| self.dimensions_out[*k].clone()).collect();
        let traced_in: Vec<Dimension>
            = indices.iter().map(|k| self.dimensions_in[*k].clone()).collect();
        Dimension::check_dimensions(&traced_out, &traced_in)?;
        let rest = complement_indices(indices, n);

        let mut acc: Accumulator<(Vec<usize>, Vec<usize>)>
            = Accumulator::with_capacity(self.len());
        self.entries.iter()
            .filter(|e| indices.iter().all(|k| e.coord_out[*k] == e.coord_in[*k]))
            .for_each(|e| {
                acc.add(
                    (
                        rest.iter().map(|k| e.coord_out[*k]).collect(),
                        rest.iter().map(|k| e.coord_in[*k]).collect(),
                    ),
                    e.value,
                );
            });
        let entries: Vec<OperatorEntry>
            = acc.into_nonzero()
            .map(|((coord_out, coord_in), value)| {
                OperatorEntry { coord_out, coord_in, value }
            })
            .collect();
        Ok(Self {
            entries,
            dimensions_out:
                rest.iter().map(|k| self.dimensions_out[*k].clone()).collect(),
            dimensions_in:
                rest.iter().map(|k| self.dimensions_in[*k].clone()).collect(),
        })
    }

    /// Compute the trace, summing over all diagonal entries.
    pub fn trace(&self) -> C64 {
        self.entries.iter()
            .filter(|e| e.coord_out == e.coord_in)
            .map(|e| e.value)
            .sum()
    }

    /// Return `true` if every entry of `self - other` has magnitude less than
    /// `eps`.
    ///
    /// Fails if the operators are defined over different dimensions.
    pub fn is_close_to(&self, other: &Self, eps: f64) -> TensorResult<bool> {
        let diff = self.sub(other)?;
        Ok(diff.entries.iter().all(|e| e.value.norm() < eps))
    }

    /// Return `true` if `self` is square with equal dimensions and close to
    /// the identity.
    pub fn is_close_to_identity(&self, eps: f64) -> bool {
        if self.dimensions_out != self.dimensions_in { return false; }
        let m = self.to_dense();
        let id: nd::Array2<C64> = nd::Array2::eye(m.nrows());
        dense_close(&m, &id, eps)
    }

    /// Return `true` if `self` is close to Hermitian, `M ≈ M†`.
    pub fn is_close_to_hermitian(&self, eps: f64) -> bool {
        if self.dimensions_out != self.dimensions_in { return false; }
        let m = self.to_dense();
        dense_close(&m, &dense_dag(&m), eps)
    }

    /// Return `true` if `self` is close to unitary, `M M† ≈ 1`.
    pub fn is_close_to_unitary(&self, eps: f64) -> bool {
        let m = self.to_dense();
        if m.nrows() != m.ncols() { return false; }
        let id: nd::Array2<C64> = nd::Array2::eye(m.nrows());
        dense_close(&m.dot(&dense_dag(&m)), &id, eps)
    }

    /// Return `true` if `self` is close to an orthogonal projection,
    /// `M² ≈ M = M†`.
    pub fn is_close_to_projection(&self, eps: f64) -> bool {
        if !self.is_close_to_hermitian(eps) { return false; }
        let m = self.to_dense();
        dense_close(&m.dot(&m), &m, eps)
    }

    /// Return `true` if `self` is close to unitary when restricted to its
    /// support, i.e. if `M† M` is a projection.
    pub fn is_close_to_unitary_on_subspace(&self, eps: f64) -> bool {
        let m = self.to_dense();
        let mdm = dense_dag(&m).dot(&m);
        dense_close(&mdm, &dense_dag(&mdm), eps) && dense_close(&mdm.dot(&mdm), &mdm, eps)
    }

    /// Render `self` as a sum of ket-bras, `a |out⟩⟨in| + ...`, in entry
    /// order.
    ///
    /// Entries with squared magnitude below [`KET_STRING_THRESHOLD`] are left
    /// out.
    pub fn to_ket_bra_string(&self, format: ComplexFormat, precision: usize)
        -> String
    {
        self.entries.iter()
            .filter(|e| e.value.norm_sqr() >= KET_STRING_THRESHOLD)
            .map(|e| {
                e.to_ket_bra_string(
                    &self.dimensions_out,
                    &self.dimensions_in,
                    format,
                    precision,
                )
            })
            .join(" + ")
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(2);
        write!(f, "{}", self.to_ket_bra_string(ComplexFormat::Cartesian, precision))
    }
}
