//! Strided GEMM used by the rank-2 tensor ops.
//!
//! Operands are described by [`MatRef`] views carrying explicit row/column strides, so a
//! transposed operand is just a view with its strides swapped. This lets the dense layer
//! compute `xᵀ · grad` and `grad · Wᵀ` without materializing the transposes.

#[derive(Debug, Clone, Copy)]
pub(crate) struct MatRef<'a> {
    data: &'a [f32],
    rows: usize,
    cols: usize,
    row_stride: usize,
    col_stride: usize,
}

impl<'a> MatRef<'a> {
    #[inline]
    pub(crate) fn new(
        data: &'a [f32],
        rows: usize,
        cols: usize,
        row_stride: usize,
        col_stride: usize,
    ) -> Self {
        debug_assert!(
            rows == 0 || cols == 0 || (rows - 1) * row_stride + (cols - 1) * col_stride < data.len()
        );
        Self {
            data,
            rows,
            cols,
            row_stride,
            col_stride,
        }
    }

    /// Same storage, axes swapped.
    #[inline]
    pub(crate) fn t(self) -> Self {
        Self {
            data: self.data,
            rows: self.cols,
            cols: self.rows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
        }
    }

    #[inline]
    pub(crate) fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub(crate) fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    fn at(&self, r: usize, c: usize) -> f32 {
        self.data[r * self.row_stride + c * self.col_stride]
    }
}

/// `out = a · b`, with `out` row-major `(a.rows, b.cols)` and overwritten.
///
/// Callers validate `a.cols == b.rows` and the output length.
#[inline]
pub(crate) fn gemm(a: MatRef<'_>, b: MatRef<'_>, out: &mut [f32]) {
    debug_assert_eq!(a.cols, b.rows);
    debug_assert_eq!(out.len(), a.rows * b.cols);

    let n = b.cols;
    out.fill(0.0);

    // i-k-j order: the innermost loop walks a contiguous output row.
    for i in 0..a.rows {
        let row = &mut out[i * n..(i + 1) * n];
        for k in 0..a.cols {
            let av = a.at(i, k);
            for (j, slot) in row.iter_mut().enumerate() {
                *slot = av.mul_add(b.at(k, j), *slot);
            }
        }
    }
}
