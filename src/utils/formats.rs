//! Utilities for converting between chunked matrices and sprs

use sprs::{CsMat, TriMat};

use crate::matrix::ChunkSparseMatrix;
use crate::scalar::{widen, Scalar};
use crate::sparsity::ChunkSparsityPattern;

/// Converts a chunked matrix to sprs CsMat format (CSR).
///
/// Every stored real entry is emitted, explicit zeros included; padding is
/// dropped.
pub fn to_sprs_csr<T: Scalar>(matrix: &ChunkSparseMatrix<'_, T>) -> CsMat<T> {
    let pattern = matrix.sparsity_pattern();
    let n_rows = pattern.n_rows();
    let nnz = pattern.n_nonzero_elements();

    let capacity = pattern.sparsity_pattern().max_entries_per_row() * pattern.chunk_size();
    let mut row_cols = vec![0; capacity];
    let mut row_vals = vec![T::zero(); capacity];

    let mut indptr = Vec::with_capacity(n_rows + 1);
    let mut indices = Vec::with_capacity(nnz);
    let mut data = Vec::with_capacity(nnz);
    indptr.push(0);

    for row in 0..n_rows {
        let len = matrix.extract_row_copy(row, &mut row_cols, &mut row_vals);
        indices.extend_from_slice(&row_cols[..len]);
        data.extend_from_slice(&row_vals[..len]);
        indptr.push(indices.len());
    }

    CsMat::new((n_rows, pattern.n_cols()), indptr, indices, data)
}

/// Builds a compressed chunk pattern covering every stored entry of a sprs
/// matrix (CSR or CSC)
pub fn pattern_from_sprs<N>(matrix: &CsMat<N>, chunk_size: usize) -> ChunkSparsityPattern {
    let (n_rows, n_cols) = matrix.shape();
    let mut pattern = ChunkSparsityPattern::new(n_rows, n_cols, chunk_size);

    for (_, (row, col)) in matrix.iter() {
        pattern.add(row, col);
    }

    pattern.compress();
    pattern
}

/// Overwrites `target` with the entries of a sprs matrix.
///
/// Zero entries outside the pattern are skipped like in
/// [`ChunkSparseMatrix::copy_from_dense`].
///
/// # Panics
///
/// Panics if the shapes differ or a nonzero entry is outside the pattern.
pub fn fill_from_sprs<T, U>(target: &mut ChunkSparseMatrix<'_, T>, matrix: &CsMat<U>)
where
    T: Scalar + From<U>,
    U: Scalar,
{
    assert_eq!(
        matrix.shape(),
        (target.n_rows(), target.n_cols()),
        "dimension mismatch between sprs matrix and chunked matrix"
    );

    target.set_zero();
    for (&value, (row, col)) in matrix.iter() {
        if value != U::zero() {
            target.add(row, col, widen::<U, T>(value));
        }
    }
}

/// Collects the stored entries of a chunked matrix as sprs triplets
pub fn to_sprs_triplets<T: Scalar>(matrix: &ChunkSparseMatrix<'_, T>) -> TriMat<T> {
    let pattern = matrix.sparsity_pattern();
    let cs = pattern.chunk_size();
    let mut triplets = TriMat::with_capacity((pattern.n_rows(), pattern.n_cols()), pattern.n_nonzero_elements());

    for chunk in matrix.chunks() {
        for r in 0..chunk.rows {
            for c in 0..chunk.cols {
                triplets.add_triplet(
                    chunk.block_row * cs + r,
                    chunk.block_col * cs + c,
                    chunk.values[r * cs + c],
                );
            }
        }
    }

    triplets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> CsMat<f64> {
        // [ 1.0  0.0  2.0 ]
        // [ 0.0  3.0  0.0 ]
        // [ 4.0  0.0  5.0 ]
        CsMat::new(
            (3, 3),
            vec![0, 2, 3, 5],
            vec![0, 2, 1, 0, 2],
            vec![1.0, 2.0, 3.0, 4.0, 5.0],
        )
    }

    #[test]
    fn test_pattern_from_sprs() {
        let pattern = pattern_from_sprs(&sample(), 2);
        assert!(pattern.is_compressed());
        // block (0,0), (0,1), (1,0), (1,1) are all touched
        assert_eq!(pattern.n_blocks(), 4);

        let pattern = pattern_from_sprs(&sample(), 3);
        assert_eq!(pattern.n_blocks(), 1);
    }

    #[test]
    fn test_sprs_roundtrip_keeps_entries() {
        let source = sample();
        let pattern = pattern_from_sprs(&source, 2);
        let mut matrix = ChunkSparseMatrix::<f64>::from_pattern(&pattern);
        fill_from_sprs(&mut matrix, &source);

        assert_eq!(matrix.get(0, 2), 2.0);
        assert_eq!(matrix.get(2, 0), 4.0);

        let csr = to_sprs_csr(&matrix);
        assert!(csr.is_csr());
        // stored entries include explicit zeros of the touched chunks
        assert_eq!(csr.nnz(), pattern.n_nonzero_elements());
        assert_eq!(csr.get(1, 1), Some(&3.0));
        assert_eq!(csr.get(0, 1), Some(&0.0));
        assert_eq!(csr.to_dense(), source.to_dense());
    }

    #[test]
    fn test_triplets_match_csr() {
        let source = sample();
        let pattern = pattern_from_sprs(&source, 2);
        let mut matrix = ChunkSparseMatrix::<f64>::from_pattern(&pattern);
        fill_from_sprs(&mut matrix, &source);

        let triplets = to_sprs_triplets(&matrix);
        assert_eq!(triplets.nnz(), 9);

        let from_triplets: CsMat<f64> = triplets.to_csr();
        assert_eq!(from_triplets.to_dense(), matrix.to_dense());
    }
}
