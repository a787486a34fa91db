//! Dense, strided, fixed-rank tensors.
//!
//! A [`Tensor<R>`] owns a flat row-major `f32` buffer plus its shape and strides. The rank
//! `R` is part of the type; shapes are `[usize; R]`.
//!
//! Two flavours of element access are provided:
//!
//! - [`Tensor::get`], [`Tensor::get_mut`], [`Tensor::set`] return [`Error::Shape`] on an
//!   out-of-range index.
//! - `tensor[[i, j]]` (the `Index`/`IndexMut` impls) panics on an out-of-range index and is
//!   meant for loops whose bounds are already known to be valid.
//!
//! Elementwise `add`/`sub`/`mul` follow NumPy broadcasting: per axis, equal sizes are kept
//! and a size-1 axis is virtually repeated to match the other operand.

use std::ops::{Index, IndexMut, Mul};

use crate::matmul::{MatRef, gemm};
use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Tensor<const R: usize> {
    shape: [usize; R],
    strides: [usize; R],
    data: Vec<f32>,
}

/// Rank-1 tensor.
pub type Vector = Tensor<1>;

/// Rank-2 tensor, `[rows, cols]`.
pub type Matrix = Tensor<2>;

#[inline]
fn row_major_strides<const R: usize>(shape: &[usize; R]) -> [usize; R] {
    let mut strides = [0; R];
    let mut acc = 1;
    for d in (0..R).rev() {
        strides[d] = acc;
        acc *= shape[d];
    }
    strides
}

#[inline]
fn numel<const R: usize>(shape: &[usize; R]) -> usize {
    shape.iter().product()
}

/// Result shape of broadcasting `a` against `b`.
///
/// Returns [`Error::Shape`] if some axis has two different sizes, neither of which is 1.
pub fn broadcast_shape<const R: usize>(a: &[usize; R], b: &[usize; R]) -> Result<[usize; R]> {
    let mut out = [0; R];
    for d in 0..R {
        out[d] = match (a[d], b[d]) {
            (x, y) if x == y => x,
            (1, y) => y,
            (x, 1) => x,
            (x, y) => {
                return Err(Error::shape(format!(
                    "cannot broadcast {a:?} with {b:?}: axis {d} has sizes {x} and {y}"
                )));
            }
        };
    }
    Ok(out)
}

impl<const R: usize> Tensor<R> {
    /// Zero-filled tensor of the given shape.
    pub fn zeros(shape: [usize; R]) -> Self {
        Self::full(shape, 0.0)
    }

    pub fn full(shape: [usize; R], value: f32) -> Self {
        Self {
            strides: row_major_strides(&shape),
            data: vec![value; numel(&shape)],
            shape,
        }
    }

    /// Build a tensor from a row-major buffer.
    pub fn from_vec(shape: [usize; R], data: Vec<f32>) -> Result<Self> {
        let expected = numel(&shape);
        if data.len() != expected {
            return Err(Error::shape(format!(
                "buffer of {} elements does not fit shape {shape:?} ({expected} elements)",
                data.len()
            )));
        }
        Ok(Self {
            strides: row_major_strides(&shape),
            shape,
            data,
        })
    }

    #[inline]
    pub fn shape(&self) -> &[usize; R] {
        &self.shape
    }

    #[inline]
    pub fn strides(&self) -> &[usize; R] {
        &self.strides
    }

    /// Number of axes.
    #[inline]
    pub const fn rank(&self) -> usize {
        R
    }

    /// Total number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    #[inline]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, f32> {
        self.data.iter()
    }

    /// Flat buffer offset of `index`, bounds-checked per axis.
    pub fn offset(&self, index: &[usize; R]) -> Result<usize> {
        let mut offset = 0;
        for d in 0..R {
            if index[d] >= self.shape[d] {
                return Err(Error::shape(format!(
                    "index {} out of range for axis {d} (size {})",
                    index[d], self.shape[d]
                )));
            }
            offset += index[d] * self.strides[d];
        }
        Ok(offset)
    }

    pub fn get(&self, index: [usize; R]) -> Result<f32> {
        let offset = self.offset(&index)?;
        Ok(self.data[offset])
    }

    pub fn get_mut(&mut self, index: [usize; R]) -> Result<&mut f32> {
        let offset = self.offset(&index)?;
        Ok(&mut self.data[offset])
    }

    pub fn set(&mut self, index: [usize; R], value: f32) -> Result<()> {
        *self.get_mut(index)? = value;
        Ok(())
    }

    /// Reinterpret the buffer with a new shape of the same rank.
    ///
    /// Element order is unchanged; only shape and strides are recomputed.
    pub fn reshape(&mut self, new_shape: [usize; R]) -> Result<()> {
        let new_len = numel(&new_shape);
        if new_len != self.data.len() {
            return Err(Error::shape(format!(
                "cannot reshape {:?} ({} elements) into {new_shape:?} ({new_len} elements)",
                self.shape,
                self.data.len()
            )));
        }
        self.shape = new_shape;
        self.strides = row_major_strides(&new_shape);
        Ok(())
    }

    /// Like [`Tensor::reshape`], but the target may have a different rank.
    pub fn into_shape<const S: usize>(self, new_shape: [usize; S]) -> Result<Tensor<S>> {
        let shape = self.shape;
        Tensor::from_vec(new_shape, self.data).map_err(|_| {
            Error::shape(format!(
                "cannot reshape {shape:?} ({} elements) into {new_shape:?} ({} elements)",
                numel(&shape),
                numel(&new_shape)
            ))
        })
    }

    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Apply `f` to every element, producing a tensor of the same shape.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> Self {
        Self {
            shape: self.shape,
            strides: self.strides,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Multiply every element by `value`.
    pub fn scale(&self, value: f32) -> Self {
        self.map(|v| v * value)
    }

    /// Broadcasting elementwise sum.
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_broadcast(other, |a, b| a + b)
    }

    /// Broadcasting elementwise difference.
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_broadcast(other, |a, b| a - b)
    }

    /// Broadcasting elementwise (Hadamard) product.
    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.zip_broadcast(other, |a, b| a * b)
    }

    fn zip_broadcast(&self, other: &Self, op: impl Fn(f32, f32) -> f32) -> Result<Self> {
        let shape = broadcast_shape(&self.shape, &other.shape)?;
        let mut out = Self::zeros(shape);

        // Result coordinates in row-major order, advanced odometer-style.
        let mut idx = [0usize; R];
        for slot in out.data.iter_mut() {
            let a = self.data[self.broadcast_offset(&idx)];
            let b = other.data[other.broadcast_offset(&idx)];
            *slot = op(a, b);

            for d in (0..R).rev() {
                idx[d] += 1;
                if idx[d] < shape[d] {
                    break;
                }
                idx[d] = 0;
            }
        }
        Ok(out)
    }

    /// Offset of a result coordinate in this operand; size-1 axes read coordinate 0.
    #[inline]
    fn broadcast_offset(&self, idx: &[usize; R]) -> usize {
        let mut offset = 0;
        for d in 0..R {
            if self.shape[d] != 1 {
                offset += idx[d] * self.strides[d];
            }
        }
        offset
    }
}

impl<const R: usize> Index<[usize; R]> for Tensor<R> {
    type Output = f32;

    fn index(&self, index: [usize; R]) -> &f32 {
        match self.offset(&index) {
            Ok(offset) => &self.data[offset],
            Err(e) => panic!("{e}"),
        }
    }
}

impl<const R: usize> IndexMut<[usize; R]> for Tensor<R> {
    fn index_mut(&mut self, index: [usize; R]) -> &mut f32 {
        match self.offset(&index) {
            Ok(offset) => &mut self.data[offset],
            Err(e) => panic!("{e}"),
        }
    }
}

impl<const R: usize> Mul<f32> for &Tensor<R> {
    type Output = Tensor<R>;

    fn mul(self, rhs: f32) -> Tensor<R> {
        self.scale(rhs)
    }
}

impl Tensor<1> {
    pub fn from_slice(values: &[f32]) -> Self {
        Self {
            shape: [values.len()],
            strides: [1],
            data: values.to_vec(),
        }
    }
}

impl Tensor<2> {
    /// Build a matrix from equally sized rows.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::shape(format!(
                    "row {i} has {} columns, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Self::from_vec([rows.len(), cols], data)
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.shape[0]
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.shape[1]
    }

    /// Row `i` as a contiguous slice.
    pub fn row(&self, i: usize) -> Result<&[f32]> {
        if i >= self.rows() {
            return Err(Error::shape(format!(
                "row {i} out of range ({} rows)",
                self.rows()
            )));
        }
        let cols = self.cols();
        Ok(&self.data[i * cols..(i + 1) * cols])
    }

    /// New matrix with axes swapped: `result[[j, i]] == self[[i, j]]`.
    pub fn transpose_2d(&self) -> Self {
        let (rows, cols) = (self.rows(), self.cols());
        let mut out = Self::zeros([cols, rows]);
        for i in 0..rows {
            for j in 0..cols {
                out.data[j * rows + i] = self.data[i * cols + j];
            }
        }
        out
    }

    #[inline]
    fn view(&self) -> MatRef<'_> {
        MatRef::new(
            &self.data,
            self.shape[0],
            self.shape[1],
            self.strides[0],
            self.strides[1],
        )
    }

    /// Matrix product `self · rhs`.
    pub fn matmul(&self, rhs: &Self) -> Result<Self> {
        product(self.view(), rhs.view())
    }

    /// `selfᵀ · rhs` without materializing the transpose.
    pub fn transpose_matmul(&self, rhs: &Self) -> Result<Self> {
        product(self.view().t(), rhs.view())
    }

    /// `self · rhsᵀ` without materializing the transpose.
    pub fn matmul_transpose(&self, rhs: &Self) -> Result<Self> {
        product(self.view(), rhs.view().t())
    }

    /// Column sums over the batch axis: `out[j] = Σ_i self[[i, j]]`.
    pub fn sum_rows(&self) -> Vector {
        let cols = self.cols();
        let mut out = vec![0.0; cols];
        if cols > 0 {
            for row in self.data.chunks_exact(cols) {
                for (acc, v) in out.iter_mut().zip(row) {
                    *acc += v;
                }
            }
        }
        Tensor::from_slice(&out)
    }
}

fn product(a: MatRef<'_>, b: MatRef<'_>) -> Result<Matrix> {
    if a.cols() != b.rows() {
        return Err(Error::shape(format!(
            "matmul inner dimensions disagree: ({}, {}) x ({}, {})",
            a.rows(),
            a.cols(),
            b.rows(),
            b.cols()
        )));
    }
    let mut out = Matrix::zeros([a.rows(), b.cols()]);
    if !out.is_empty() {
        gemm(a, b, &mut out.data);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iota<const R: usize>(shape: [usize; R]) -> Tensor<R> {
        let n = numel(&shape);
        Tensor::from_vec(shape, (0..n).map(|v| v as f32).collect()).unwrap()
    }

    #[test]
    fn zeros_has_row_major_strides() {
        let t = Tensor::zeros([2, 3, 4]);
        assert_eq!(t.len(), 24);
        assert_eq!(t.strides(), &[12, 4, 1]);
        assert!(t.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn access_is_bounds_checked_per_axis() {
        let mut t = Tensor::zeros([2, 3]);
        t.set([1, 2], 5.0).unwrap();
        assert_eq!(t.get([1, 2]).unwrap(), 5.0);
        assert_eq!(t[[1, 2]], 5.0);

        assert!(matches!(t.get([2, 0]), Err(Error::Shape(_))));
        assert!(matches!(t.get([0, 3]), Err(Error::Shape(_))));
        assert!(matches!(t.set([5, 5], 1.0), Err(Error::Shape(_))));
    }

    #[test]
    #[should_panic]
    fn index_panics_out_of_range() {
        let t = Tensor::zeros([2, 2]);
        let _ = t[[0, 2]];
    }

    #[test]
    fn from_vec_rejects_wrong_length() {
        assert!(matches!(
            Tensor::from_vec([2, 2], vec![1.0; 3]),
            Err(Error::Shape(_))
        ));
    }

    #[test]
    fn reshape_keeps_linear_order() {
        let mut t = iota([2, 6]);
        let before = t.as_slice().to_vec();
        t.reshape([3, 4]).unwrap();
        assert_eq!(t.shape(), &[3, 4]);
        assert_eq!(t.strides(), &[4, 1]);
        assert_eq!(t.as_slice(), before.as_slice());
        assert_eq!(t[[2, 1]], 9.0);

        assert!(matches!(t.reshape([5, 2]), Err(Error::Shape(_))));
        // A failed reshape leaves the tensor untouched.
        assert_eq!(t.shape(), &[3, 4]);
    }

    #[test]
    fn into_shape_changes_rank() {
        let t = iota([2, 3, 2]);
        let flat: Vector = t.clone().into_shape([12]).unwrap();
        assert_eq!(flat.as_slice(), t.as_slice());
        assert!(t.into_shape([5]).is_err());
    }

    #[test]
    fn fill_sets_every_element() {
        let mut t = Tensor::zeros([3, 2]);
        t.fill(1.5);
        assert!(t.iter().all(|&v| v == 1.5));
    }

    #[test]
    fn broadcast_shape_is_per_axis_max() {
        assert_eq!(broadcast_shape(&[2, 1, 3], &[1, 4, 3]).unwrap(), [2, 4, 3]);
        assert_eq!(broadcast_shape(&[5, 1], &[5, 1]).unwrap(), [5, 1]);
        assert!(broadcast_shape(&[2, 3], &[3, 3]).is_err());
    }

    #[test]
    fn broadcast_values_read_zeroed_size_one_axes() {
        let a = iota([2, 1, 3]);
        let b = iota([1, 4, 3]).scale(10.0);

        let cases: [(Tensor<3>, fn(f32, f32) -> f32); 3] = [
            (a.add(&b).unwrap(), |x, y| x + y),
            (a.sub(&b).unwrap(), |x, y| x - y),
            (a.mul(&b).unwrap(), |x, y| x * y),
        ];
        for (out, op) in cases {
            assert_eq!(out.shape(), &[2, 4, 3]);
            for i in 0..2 {
                for j in 0..4 {
                    for k in 0..3 {
                        let expected = op(a[[i, 0, k]], b[[0, j, k]]);
                        assert_eq!(out[[i, j, k]], expected);
                    }
                }
            }
        }
    }

    #[test]
    fn bias_row_broadcasts_over_batch() {
        let x = iota([3, 2]);
        let bias = Tensor::from_vec([1, 2], vec![100.0, 200.0]).unwrap();
        let out = x.add(&bias).unwrap();
        assert_eq!(out.as_slice(), &[100.0, 201.0, 102.0, 203.0, 104.0, 205.0]);
    }

    #[test]
    fn incompatible_broadcast_is_a_shape_error() {
        let a = Tensor::zeros([2, 3]);
        let b = Tensor::zeros([4, 3]);
        assert!(matches!(a.add(&b), Err(Error::Shape(_))));
    }

    #[test]
    fn scale_multiplies_every_element() {
        let t = iota([2, 2]);
        assert_eq!((&t * 2.0).as_slice(), &[0.0, 2.0, 4.0, 6.0]);
    }

    #[test]
    fn transpose_swaps_axes_and_is_an_involution() {
        let t = iota([2, 3]);
        let tt = t.transpose_2d();
        assert_eq!(tt.shape(), &[3, 2]);
        for i in 0..2 {
            for j in 0..3 {
                assert_eq!(tt[[j, i]], t[[i, j]]);
            }
        }
        assert_eq!(tt.transpose_2d(), t);
    }

    #[test]
    fn matmul_checks_inner_dimension() {
        let a = iota([2, 3]);
        let b = iota([3, 2]);
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), &[2, 2]);
        assert_eq!(c.as_slice(), &[10.0, 13.0, 28.0, 40.0]);

        assert!(matches!(a.matmul(&a), Err(Error::Shape(_))));
    }

    #[test]
    fn strided_transpose_products_match_explicit_transpose() {
        let a = iota([4, 3]);
        let b = iota([4, 2]).scale(0.5);
        assert_eq!(
            a.transpose_matmul(&b).unwrap(),
            a.transpose_2d().matmul(&b).unwrap()
        );

        let w = iota([3, 2]);
        let g = iota([4, 2]);
        assert_eq!(
            g.matmul_transpose(&w).unwrap(),
            g.matmul(&w.transpose_2d()).unwrap()
        );
    }

    #[test]
    fn sum_rows_reduces_batch_axis() {
        let t = iota([3, 2]);
        assert_eq!(t.sum_rows().as_slice(), &[6.0, 9.0]);
    }

    #[test]
    fn from_rows_requires_equal_lengths() {
        let m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.row(1).unwrap(), &[3.0, 4.0]);
        assert!(Matrix::from_rows(&[vec![1.0], vec![1.0, 2.0]]).is_err());
        assert!(m.row(2).is_err());
    }
}
