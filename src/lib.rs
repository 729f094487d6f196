//! # chunksparse: block-structured sparse matrices
//!
//! A sparse matrix whose nonzeros are grouped into dense square chunks of a
//! fixed size, with the products, reductions and persistence an iterative
//! solver needs.
//!
//! ## Overview
//!
//! The library is split into two layers:
//!
//! - **Sparsity**: [`ChunkSparsityPattern`] records which `chunk_size × chunk_size`
//!   blocks of an `m × n` matrix are stored, as a compressed row graph over
//!   block indices.
//! - **Values**: [`ChunkSparseMatrix`] borrows a compressed pattern and owns
//!   one flat, aligned buffer holding every stored chunk in row-major order.
//!
//! When `m` or `n` is not a multiple of the chunk size, the last block row or
//! column hangs over the matrix edge. Those padding entries are stored, always
//! zero, and skipped by every kernel, row query and count.
//!
//! ## Operations
//!
//! - **Products**: `vmult`, `vmult_add` (parallel over block rows), `tvmult`,
//!   `tvmult_add`, `matrix_scalar_product`, `matrix_norm_square`, `residual`
//! - **Norms**: `l1_norm`, `linfty_norm`, `frobenius_norm`
//! - **Persistence**: `block_write` / `block_read` of the raw value buffer
//!
//! ## Usage
//!
//! ```
//! use chunksparse::{ChunkSparseMatrix, ChunkSparsityPattern};
//!
//! let mut pattern = ChunkSparsityPattern::new(4, 4, 2);
//! pattern.add_block(0, 0);
//! pattern.add_block(1, 1);
//! pattern.compress();
//!
//! let mut matrix = ChunkSparseMatrix::<f64>::from_pattern(&pattern);
//! for i in 0..4 {
//!     matrix.set(i, i, 2.0);
//! }
//!
//! let mut dst = vec![0.0; 4];
//! matrix.vmult(&mut dst, &[1.0, 2.0, 3.0, 4.0]);
//! assert_eq!(dst, vec![2.0, 4.0, 6.0, 8.0]);
//! ```

pub mod constants;
pub mod error;
pub mod matrix;
pub mod parallel;
pub mod scalar;
pub mod sparsity;
pub mod utils;

// Re-export primary components
pub use error::{ChunkSparseError, Result};
pub use matrix::{ChunkEntry, ChunkSparseMatrix, IdentityMatrix, ParallelConfig, PrintFormat};
pub use scalar::Scalar;
pub use sparsity::{ChunkSparsityPattern, SparsityPattern};
pub use utils::{fill_from_sprs, pattern_from_sprs, to_sprs_csr, to_sprs_triplets};

/// Version information for the chunksparse library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
