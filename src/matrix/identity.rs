//! Identity matrix marker

/// An `n × n` identity matrix that is never materialized.
///
/// Used to initialize a chunked matrix to unit diagonal via
/// [`ChunkSparseMatrix::assign_identity`](crate::ChunkSparseMatrix::assign_identity).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityMatrix {
    size: usize,
}

impl IdentityMatrix {
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Number of rows
    pub fn m(&self) -> usize {
        self.size
    }

    /// Number of columns
    pub fn n(&self) -> usize {
        self.size
    }
}
