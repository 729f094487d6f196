//! Matrix norms
//!
//! The l1 and l∞ norms accumulate over full chunks, padding included, into
//! scratch vectors sized to whole block columns or block rows; padding is
//! always zero, so it never changes a sum.

use crate::matrix::chunk_sparse::ChunkSparseMatrix;
use crate::scalar::Scalar;

impl<'a, T: Scalar> ChunkSparseMatrix<'a, T> {
    /// Maximum absolute column sum
    pub fn l1_norm(&self) -> T {
        let pattern = self.pattern();
        self.allocated();
        let cs = pattern.chunk_size();

        let mut column_sums = vec![T::zero(); pattern.n_block_cols() * cs];
        for chunk in self.chunks() {
            let sums = &mut column_sums[chunk.block_col * cs..(chunk.block_col + 1) * cs];
            for row in chunk.values.chunks_exact(cs) {
                for (sum, &a) in sums.iter_mut().zip(row) {
                    *sum += a.abs();
                }
            }
        }

        column_sums.into_iter().fold(T::zero(), T::max)
    }

    /// Maximum absolute row sum
    pub fn linfty_norm(&self) -> T {
        let pattern = self.pattern();
        self.allocated();
        let cs = pattern.chunk_size();

        let mut row_sums = vec![T::zero(); pattern.n_block_rows() * cs];
        for chunk in self.chunks() {
            let sums = &mut row_sums[chunk.block_row * cs..(chunk.block_row + 1) * cs];
            for (sum, row) in sums.iter_mut().zip(chunk.values.chunks_exact(cs)) {
                *sum += row.iter().fold(T::zero(), |acc, a| acc + a.abs());
            }
        }

        row_sums.into_iter().fold(T::zero(), T::max)
    }

    /// Square root of the sum of squares of every buffer entry
    pub fn frobenius_norm(&self) -> T {
        self.values()
            .iter()
            .fold(T::zero(), |acc, &a| acc + a * a)
            .sqrt()
    }
}
