//! Relaxation preconditioners and smoothers
//!
//! Chunked storage keeps the diagonal inside dense blocks, so the pointwise
//! Jacobi and Gauss-Seidel sweeps of a scalar CSR matrix do not carry over.
//! These entry points check their arguments the same way a working sweep
//! would and then report [`ChunkSparseError::NotImplemented`].

use tracing::warn;

use crate::error::{ChunkSparseError, Result};
use crate::matrix::chunk_sparse::ChunkSparseMatrix;
use crate::scalar::Scalar;

fn not_implemented(operation: &'static str) -> Result<()> {
    warn!(operation, "relaxation requested on chunked storage");
    Err(ChunkSparseError::NotImplemented { operation })
}

impl<'a, T: Scalar> ChunkSparseMatrix<'a, T> {
    /// Jacobi preconditioner `dst = omega · D⁻¹ · src`
    pub fn precondition_jacobi<S>(&self, dst: &mut [S], src: &[S], omega: T) -> Result<()>
    where
        S: Scalar + From<T>,
    {
        let _ = omega;
        self.assert_relaxation_dims(dst.len());
        self.assert_relaxation_dims(src.len());
        not_implemented("precondition_jacobi")
    }

    /// SSOR preconditioner applied to `src`
    pub fn precondition_ssor<S>(&self, dst: &mut [S], src: &[S], omega: T) -> Result<()>
    where
        S: Scalar + From<T>,
    {
        let _ = omega;
        self.assert_relaxation_dims(dst.len());
        self.assert_relaxation_dims(src.len());
        not_implemented("precondition_ssor")
    }

    /// SOR preconditioner: copies `src` into `dst`, then sweeps in place
    pub fn precondition_sor<S>(&self, dst: &mut [S], src: &[S], omega: T) -> Result<()>
    where
        S: Scalar + From<T>,
    {
        self.assert_relaxation_dims(src.len());
        self.assert_relaxation_dims(dst.len());
        dst.copy_from_slice(src);
        self.sor(dst, omega)
    }

    /// Transposed SOR preconditioner: copies `src` into `dst`, then sweeps in place
    pub fn precondition_tsor<S>(&self, dst: &mut [S], src: &[S], omega: T) -> Result<()>
    where
        S: Scalar + From<T>,
    {
        self.assert_relaxation_dims(src.len());
        self.assert_relaxation_dims(dst.len());
        dst.copy_from_slice(src);
        self.tsor(dst, omega)
    }

    /// In-place forward SOR sweep
    pub fn sor<S>(&self, dst: &mut [S], omega: T) -> Result<()>
    where
        S: Scalar + From<T>,
    {
        let _ = omega;
        self.assert_relaxation_dims(dst.len());
        not_implemented("SOR")
    }

    /// In-place backward SOR sweep
    pub fn tsor<S>(&self, dst: &mut [S], omega: T) -> Result<()>
    where
        S: Scalar + From<T>,
    {
        let _ = omega;
        self.assert_relaxation_dims(dst.len());
        not_implemented("TSOR")
    }

    /// In-place symmetric SOR sweep
    pub fn ssor<S>(&self, dst: &mut [S], omega: T) -> Result<()>
    where
        S: Scalar + From<T>,
    {
        let _ = omega;
        self.assert_relaxation_dims(dst.len());
        not_implemented("SSOR")
    }

    /// Forward SOR sweep in the order given by `permutation`
    pub fn psor<S>(&self, dst: &mut [S], permutation: &[usize], inverse_permutation: &[usize], omega: T) -> Result<()>
    where
        S: Scalar + From<T>,
    {
        let _ = omega;
        self.assert_relaxation_dims(dst.len());
        self.assert_relaxation_dims(permutation.len());
        self.assert_relaxation_dims(inverse_permutation.len());
        not_implemented("PSOR")
    }

    /// Backward SOR sweep in the order given by `permutation`
    pub fn tpsor<S>(&self, dst: &mut [S], permutation: &[usize], inverse_permutation: &[usize], omega: T) -> Result<()>
    where
        S: Scalar + From<T>,
    {
        let _ = omega;
        self.assert_relaxation_dims(dst.len());
        self.assert_relaxation_dims(permutation.len());
        self.assert_relaxation_dims(inverse_permutation.len());
        not_implemented("TPSOR")
    }

    /// One forward SOR step on `v` towards the solution of `A · v = b`
    pub fn sor_step<S>(&self, v: &mut [S], b: &[S], omega: T) -> Result<()>
    where
        S: Scalar + From<T>,
    {
        let _ = omega;
        self.assert_relaxation_dims(v.len());
        self.assert_relaxation_dims(b.len());
        not_implemented("SOR_step")
    }

    /// One backward SOR step on `v` towards the solution of `A · v = b`
    pub fn tsor_step<S>(&self, v: &mut [S], b: &[S], omega: T) -> Result<()>
    where
        S: Scalar + From<T>,
    {
        let _ = omega;
        self.assert_relaxation_dims(v.len());
        self.assert_relaxation_dims(b.len());
        not_implemented("TSOR_step")
    }

    /// A forward step followed by a backward step
    pub fn ssor_step<S>(&self, v: &mut [S], b: &[S], omega: T) -> Result<()>
    where
        S: Scalar + From<T>,
    {
        self.sor_step(v, b, omega)?;
        self.tsor_step(v, b, omega)
    }

    fn assert_relaxation_dims(&self, len: usize) {
        self.assert_square();
        self.allocated();
        let n = self.pattern().n_rows();
        assert_eq!(len, n, "dimension mismatch: vector has {} entries, matrix has {} rows", len, n);
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ChunkSparseError;
    use crate::matrix::ChunkSparseMatrix;
    use crate::sparsity::ChunkSparsityPattern;

    fn diagonal_pattern() -> ChunkSparsityPattern {
        let mut p = ChunkSparsityPattern::new(4, 4, 2);
        p.add_block(0, 0);
        p.add_block(1, 1);
        p.compress();
        p
    }

    #[test]
    fn test_smoothers_report_not_implemented() {
        let p = diagonal_pattern();
        let m = ChunkSparseMatrix::<f64>::from_pattern(&p);
        let mut v = vec![0.0f64; 4];
        let b = vec![1.0f64; 4];

        assert!(matches!(
            m.precondition_jacobi(&mut v, &b, 1.0),
            Err(ChunkSparseError::NotImplemented { operation: "precondition_jacobi" })
        ));
        assert!(matches!(
            m.ssor(&mut v, 1.2),
            Err(ChunkSparseError::NotImplemented { operation: "SSOR" })
        ));
        assert!(matches!(
            m.ssor_step(&mut v, &b, 1.0),
            Err(ChunkSparseError::NotImplemented { operation: "SOR_step" })
        ));
    }

    #[test]
    fn test_precondition_sor_copies_before_sweeping() {
        let p = diagonal_pattern();
        let m = ChunkSparseMatrix::<f64>::from_pattern(&p);
        let mut dst = vec![0.0f64; 4];
        let src = vec![2.0f64; 4];

        assert!(m.precondition_sor(&mut dst, &src, 1.0).is_err());
        assert_eq!(dst, src);
    }

    #[test]
    #[should_panic(expected = "matrix must be square")]
    fn test_smoother_requires_square_matrix() {
        let mut p = ChunkSparsityPattern::new(4, 2, 2);
        p.add_block(0, 0);
        p.compress();
        let m = ChunkSparseMatrix::<f64>::from_pattern(&p);
        let mut v = vec![0.0f64; 4];
        let _ = m.sor(&mut v, 1.0);
    }
}
