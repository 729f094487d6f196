//! Error types for chunked sparse matrix operations
//!
//! Contract violations (missing pattern, dimension mismatch, foreign pattern,
//! undersized buffers) panic at the call site. The variants here cover the
//! conditions a caller can meaningfully react to: stream failures, malformed
//! persisted data, and operations that exist but have no chunk-aware body.

use thiserror::Error;

/// Errors that can occur in chunked sparse matrix operations.
#[derive(Debug, Error)]
pub enum ChunkSparseError {
    /// Underlying stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A bracket marker of the persistence frame was missing.
    #[error("malformed frame: expected '{expected}', found {found:?}")]
    MalformedFrame {
        expected: char,
        found: Option<char>,
    },

    /// The length recorded in a persisted frame could not be parsed.
    #[error("invalid frame header: {0}")]
    InvalidHeader(String),

    /// The operation is declared but has no chunk-aware implementation.
    #[error("{operation} is not implemented for chunked sparse matrices")]
    NotImplemented { operation: &'static str },
}

/// Result type for chunked sparse matrix operations
pub type Result<T> = std::result::Result<T, ChunkSparseError>;
