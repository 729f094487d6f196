//! Configuration for parallel dispatch

use crate::constants::MINIMUM_PARALLEL_GRAIN_SIZE;

/// Parallel tuning parameters of a chunked sparse matrix
#[derive(Debug, Clone, PartialEq)]
pub struct ParallelConfig {
    /// Minimum number of rows worth of work handed to one task
    pub minimum_parallel_grain_size: usize,
    /// Number of threads to use; one or less disables dispatch
    pub n_threads: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            minimum_parallel_grain_size: MINIMUM_PARALLEL_GRAIN_SIZE,
            n_threads: num_cpus::get(), // Use all available cores
        }
    }
}

impl ParallelConfig {
    /// A config that runs every operation on the calling thread
    pub fn sequential() -> Self {
        Self {
            minimum_parallel_grain_size: MINIMUM_PARALLEL_GRAIN_SIZE,
            n_threads: 1,
        }
    }

    pub fn is_parallel(&self) -> bool {
        self.n_threads > 1
    }

    /// Grain size in block rows for a row-wise product with the given chunk size.
    ///
    /// Shrinks as chunks grow so the element volume per task stays roughly
    /// constant.
    pub fn block_row_grain_size(&self, chunk_size: usize) -> usize {
        if !self.is_parallel() {
            return usize::MAX;
        }
        self.minimum_parallel_grain_size / chunk_size + 1
    }

    /// Grain size in buffer entries for zeroing a buffer of `matrix_size`
    /// entries belonging to a matrix with `n_rows` rows.
    ///
    /// Scales the row grain by the average number of stored entries per row.
    pub fn buffer_grain_size(&self, matrix_size: usize, n_rows: usize) -> usize {
        if !self.is_parallel() || n_rows == 0 {
            return usize::MAX;
        }
        (self.minimum_parallel_grain_size * (matrix_size + n_rows) / n_rows).max(1)
    }
}
