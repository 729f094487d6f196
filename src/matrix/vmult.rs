//! Matrix-vector products and related reductions
//!
//! `vmult_add` splits the block rows into contiguous subranges and runs them
//! on the rayon pool; each subrange owns the matching slice of the
//! destination, so no two tasks write the same entry. The transposed product
//! scatters into arbitrary destination entries and always runs sequentially.
//!
//! Every traversal picks the full-chunk kernel for chunks without padding and
//! the partial kernel for chunks in the last block row or column.

use std::ops::Range;

use crate::matrix::chunk_sparse::{chunks_in_rows, ChunkSparseMatrix};
use crate::matrix::kernels::{
    chunk_matrix_scalar_product, chunk_tvmult_add, chunk_vmult_add, chunk_vmult_subtract,
    partial_matrix_scalar_product, partial_tvmult_add, partial_vmult_add, partial_vmult_subtract,
};
use crate::parallel::apply_to_subranges_mut;
use crate::scalar::Scalar;
use crate::sparsity::ChunkSparsityPattern;
use crate::utils::l2_norm;

/// Accumulates the product of the block rows in `block_rows` into `dst`.
///
/// `dst` begins at element row `block_rows.start * chunk_size`.
fn vmult_add_on_subrange<T, S>(
    pattern: &ChunkSparsityPattern,
    values: &[T],
    block_rows: Range<usize>,
    src: &[S],
    dst: &mut [S],
) where
    T: Scalar,
    S: Scalar + From<T>,
{
    let cs = pattern.chunk_size();
    let first_row = block_rows.start * cs;

    for chunk in chunks_in_rows(pattern, values, block_rows) {
        let dst_rows = &mut dst[chunk.block_row * cs - first_row..];
        let src_cols = &src[chunk.block_col * cs..];

        if chunk.is_regular(cs) {
            chunk_vmult_add(cs, chunk.values, src_cols, dst_rows);
        } else {
            partial_vmult_add(cs, chunk.rows, chunk.cols, chunk.values, src_cols, dst_rows);
        }
    }
}

impl<'a, T: Scalar> ChunkSparseMatrix<'a, T> {
    /// `dst = A · src`
    ///
    /// # Panics
    ///
    /// Panics if no pattern or storage is present, or if
    /// `dst.len() != n_rows()` or `src.len() != n_cols()`.
    pub fn vmult<S>(&self, dst: &mut [S], src: &[S])
    where
        S: Scalar + From<T>,
    {
        self.assert_vmult_dims(dst.len(), src.len());
        dst.fill(S::zero());
        self.vmult_add(dst, src);
    }

    /// `dst += A · src`, parallel over block rows
    pub fn vmult_add<S>(&self, dst: &mut [S], src: &[S])
    where
        S: Scalar + From<T>,
    {
        self.assert_vmult_dims(dst.len(), src.len());

        let pattern = self.pattern();
        let values = self.allocated();
        let cs = pattern.chunk_size();
        let grain_size = self.parallel_config().block_row_grain_size(cs);

        apply_to_subranges_mut(
            0..pattern.n_block_rows(),
            dst,
            cs,
            grain_size,
            |block_rows, dst_segment| {
                vmult_add_on_subrange(pattern, values, block_rows, src, dst_segment)
            },
        );
    }

    /// `dst = Aᵀ · src`
    ///
    /// # Panics
    ///
    /// Panics if no pattern or storage is present, or if
    /// `dst.len() != n_cols()` or `src.len() != n_rows()`.
    pub fn tvmult<S>(&self, dst: &mut [S], src: &[S])
    where
        S: Scalar + From<T>,
    {
        self.assert_tvmult_dims(dst.len(), src.len());
        dst.fill(S::zero());
        self.tvmult_add(dst, src);
    }

    /// `dst += Aᵀ · src`
    pub fn tvmult_add<S>(&self, dst: &mut [S], src: &[S])
    where
        S: Scalar + From<T>,
    {
        self.assert_tvmult_dims(dst.len(), src.len());

        let cs = self.pattern().chunk_size();
        for chunk in self.chunks() {
            let src_rows = &src[chunk.block_row * cs..];
            let dst_cols = &mut dst[chunk.block_col * cs..];

            if chunk.is_regular(cs) {
                chunk_tvmult_add(cs, chunk.values, src_rows, dst_cols);
            } else {
                partial_tvmult_add(cs, chunk.rows, chunk.cols, chunk.values, src_rows, dst_cols);
            }
        }
    }

    /// `uᵀ · A · v`
    ///
    /// # Panics
    ///
    /// Panics if `u.len() != n_rows()` or `v.len() != n_cols()`.
    pub fn matrix_scalar_product<S>(&self, u: &[S], v: &[S]) -> S
    where
        S: Scalar + From<T>,
    {
        let pattern = self.pattern();
        self.allocated();
        assert_eq!(u.len(), pattern.n_rows(), "dimension mismatch: u has {} entries, matrix has {} rows", u.len(), pattern.n_rows());
        assert_eq!(v.len(), pattern.n_cols(), "dimension mismatch: v has {} entries, matrix has {} columns", v.len(), pattern.n_cols());

        let cs = pattern.chunk_size();
        let mut result = S::zero();
        for chunk in self.chunks() {
            let u_rows = &u[chunk.block_row * cs..];
            let v_cols = &v[chunk.block_col * cs..];

            result += if chunk.is_regular(cs) {
                chunk_matrix_scalar_product(cs, chunk.values, u_rows, v_cols)
            } else {
                partial_matrix_scalar_product(cs, chunk.rows, chunk.cols, chunk.values, u_rows, v_cols)
            };
        }
        result
    }

    /// `vᵀ · A · v` for a square matrix
    pub fn matrix_norm_square<S>(&self, v: &[S]) -> S
    where
        S: Scalar + From<T>,
    {
        self.assert_square();
        self.matrix_scalar_product(v, v)
    }

    /// Writes `b - A · u` into `dst` and returns its l2 norm
    ///
    /// # Panics
    ///
    /// Panics if `dst.len()` or `b.len()` differ from `n_rows()`, or
    /// `u.len() != n_cols()`.
    pub fn residual<S>(&self, dst: &mut [S], u: &[S], b: &[S]) -> S
    where
        S: Scalar + From<T>,
    {
        self.assert_vmult_dims(dst.len(), u.len());
        assert_eq!(b.len(), dst.len(), "dimension mismatch: b has {} entries, dst has {}", b.len(), dst.len());

        dst.copy_from_slice(b);

        let cs = self.pattern().chunk_size();
        for chunk in self.chunks() {
            let dst_rows = &mut dst[chunk.block_row * cs..];
            let u_cols = &u[chunk.block_col * cs..];

            if chunk.is_regular(cs) {
                chunk_vmult_subtract(cs, chunk.values, u_cols, dst_rows);
            } else {
                partial_vmult_subtract(cs, chunk.rows, chunk.cols, chunk.values, u_cols, dst_rows);
            }
        }

        l2_norm(dst)
    }

    fn assert_vmult_dims(&self, dst_len: usize, src_len: usize) {
        let pattern = self.pattern();
        self.allocated();
        assert_eq!(dst_len, pattern.n_rows(), "dimension mismatch: dst has {} entries, matrix has {} rows", dst_len, pattern.n_rows());
        assert_eq!(src_len, pattern.n_cols(), "dimension mismatch: src has {} entries, matrix has {} columns", src_len, pattern.n_cols());
    }

    fn assert_tvmult_dims(&self, dst_len: usize, src_len: usize) {
        let pattern = self.pattern();
        self.allocated();
        assert_eq!(dst_len, pattern.n_cols(), "dimension mismatch: dst has {} entries, matrix has {} columns", dst_len, pattern.n_cols());
        assert_eq!(src_len, pattern.n_rows(), "dimension mismatch: src has {} entries, matrix has {} rows", src_len, pattern.n_rows());
    }
}
