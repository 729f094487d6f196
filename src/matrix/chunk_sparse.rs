//! Chunked sparse matrix: storage and lifecycle
//!
//! Values live in one flat, cache-line aligned buffer. Each stored chunk
//! occupies `chunk_size²` consecutive entries in row-major order, and chunks
//! follow the order of the pattern's row-start/column-index arrays, so chunk
//! `k` of the block graph starts at `k * chunk_size²`.
//!
//! The matrix borrows its [`ChunkSparsityPattern`]; the borrow checker keeps
//! the pattern alive and unmodified while it is attached.

use std::fmt;
use std::ops::Range;
use std::ptr;

use aligned_vec::AVec;
use ndarray::{Array2, ArrayView2};
use tracing::debug;

use crate::constants::{BUFFER_ALIGNMENT, DEBUG_SAMPLE_ENTRIES, DEBUG_SAMPLE_ROWS};
use crate::error::{ChunkSparseError, Result};
use crate::matrix::config::ParallelConfig;
use crate::matrix::identity::IdentityMatrix;
use crate::parallel::apply_to_subranges_mut;
use crate::scalar::{widen, Scalar};
use crate::sparsity::ChunkSparsityPattern;

/// A stored chunk together with its block position and the extent of its
/// non-padding part
#[derive(Debug, Clone, Copy)]
pub struct ChunkEntry<'v, T> {
    /// Block row of the chunk
    pub block_row: usize,
    /// Block column of the chunk
    pub block_col: usize,
    /// Number of real rows (less than `chunk_size` only in a padded last block row)
    pub rows: usize,
    /// Number of real columns (less than `chunk_size` only in a padded last block column)
    pub cols: usize,
    /// All `chunk_size²` values of the chunk, row-major, padding included
    pub values: &'v [T],
}

impl<T> ChunkEntry<'_, T> {
    /// True if the chunk has no padding
    pub fn is_regular(&self, chunk_size: usize) -> bool {
        self.rows == chunk_size && self.cols == chunk_size
    }
}

/// Iterates the stored chunks of the block rows in `rows`, in storage order
pub(crate) fn chunks_in_rows<'v, T>(
    pattern: &'v ChunkSparsityPattern,
    values: &'v [T],
    rows: Range<usize>,
) -> impl Iterator<Item = ChunkEntry<'v, T>> + 'v {
    let chunk_len = pattern.chunk_size() * pattern.chunk_size();
    let sp = pattern.sparsity_pattern();
    let rowstart = sp.rowstart();
    let colnums = sp.colnums();

    rows.flat_map(move |block_row| {
        let n_real_rows = pattern.rows_in_block_row(block_row);
        (rowstart[block_row]..rowstart[block_row + 1]).map(move |index| {
            let block_col = colnums[index];
            ChunkEntry {
                block_row,
                block_col,
                rows: n_real_rows,
                cols: pattern.cols_in_block_col(block_col),
                values: &values[index * chunk_len..(index + 1) * chunk_len],
            }
        })
    })
}

/// A sparse matrix whose nonzeros are stored in dense square chunks
///
/// Lifecycle: [`ChunkSparseMatrix::new`] creates an empty matrix,
/// [`reinit`](ChunkSparseMatrix::reinit) attaches a compressed pattern and
/// allocates zeroed storage, `set`/`add` fill in values, and
/// [`clear`](ChunkSparseMatrix::clear) detaches and frees.
///
/// The buffer only grows across `reinit` calls; `max_len` records its size.
pub struct ChunkSparseMatrix<'a, T> {
    cols: Option<&'a ChunkSparsityPattern>,
    val: Option<AVec<T>>,
    max_len: usize,
    config: ParallelConfig,
}

impl<'a, T: Scalar> Default for ChunkSparseMatrix<'a, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Scalar> ChunkSparseMatrix<'a, T> {
    /// Creates an empty matrix with no pattern and no storage
    pub fn new() -> Self {
        Self::with_config(ParallelConfig::default())
    }

    /// Creates an empty matrix with the given parallel tuning
    pub fn with_config(config: ParallelConfig) -> Self {
        Self {
            cols: None,
            val: None,
            max_len: 0,
            config,
        }
    }

    /// Creates a zeroed matrix attached to `pattern`
    pub fn from_pattern(pattern: &'a ChunkSparsityPattern) -> Self {
        let mut matrix = Self::new();
        matrix.reinit(pattern);
        matrix
    }

    /// Creates a matrix attached to `pattern` holding the identity
    pub fn from_pattern_identity(pattern: &'a ChunkSparsityPattern, id: &IdentityMatrix) -> Self {
        let mut matrix = Self::from_pattern(pattern);
        matrix.assign_identity(id);
        matrix
    }

    pub fn config(&self) -> &ParallelConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ParallelConfig) {
        self.config = config;
    }

    /// Attaches `pattern` and resets every entry to zero.
    ///
    /// An empty pattern releases the storage. Otherwise the buffer is
    /// reallocated only if the pattern needs more entries than it holds, and
    /// the whole buffer is zeroed, not just the part the pattern uses.
    ///
    /// # Panics
    ///
    /// Panics if a non-empty pattern is not compressed.
    pub fn reinit(&mut self, pattern: &'a ChunkSparsityPattern) {
        self.cols = Some(pattern);

        if pattern.is_empty() {
            debug!("empty pattern attached, releasing chunk storage");
            self.val = None;
            self.max_len = 0;
            return;
        }

        assert!(
            pattern.is_compressed(),
            "sparsity pattern must be compressed before attaching a matrix"
        );

        let chunk_size = pattern.chunk_size();
        let required = pattern.n_blocks() * chunk_size * chunk_size;
        if required > self.max_len || self.val.is_none() {
            debug!(
                required,
                previous = self.max_len,
                chunk_size,
                "allocating chunk storage"
            );
            self.val = Some(AVec::from_iter(
                BUFFER_ALIGNMENT,
                std::iter::repeat(T::zero()).take(required),
            ));
            self.max_len = required;
        }

        self.set_zero();
    }

    /// Detaches the pattern and frees the storage
    pub fn clear(&mut self) {
        self.cols = None;
        self.val = None;
        self.max_len = 0;
    }

    /// True if no pattern is attached or the attached pattern is empty
    pub fn is_empty(&self) -> bool {
        self.cols.map_or(true, |p| p.is_empty())
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.pattern().n_rows()
    }

    /// Number of columns
    pub fn n_cols(&self) -> usize {
        self.pattern().n_cols()
    }

    /// The attached pattern
    ///
    /// # Panics
    ///
    /// Panics if no pattern is attached.
    pub fn sparsity_pattern(&self) -> &'a ChunkSparsityPattern {
        self.pattern()
    }

    /// Size of the value buffer, padding and unused tail included
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// The raw value buffer; empty if no storage is allocated
    pub fn values(&self) -> &[T] {
        self.val.as_deref().unwrap_or(&[])
    }

    /// Number of stored real entries, padding excluded
    pub fn n_nonzero_elements(&self) -> usize {
        self.pattern().n_nonzero_elements()
    }

    /// Number of stored entries that are not zero.
    ///
    /// Scans the whole buffer; padding entries are always zero and never count.
    pub fn n_actually_nonzero_elements(&self) -> usize {
        self.pattern();
        self.values().iter().filter(|&&x| x != T::zero()).count()
    }

    /// Assigns a scalar to every entry. Only zero is accepted.
    ///
    /// Large buffers are zeroed through the parallel dispatcher with a grain
    /// proportional to the average number of stored entries per row.
    ///
    /// # Panics
    ///
    /// Panics if `d` is not zero or no pattern is attached.
    pub fn assign_scalar(&mut self, d: T) {
        assert!(d == T::zero(), "only zero can be assigned to a chunked sparse matrix");

        let pattern = self.pattern();
        if pattern.is_empty() {
            return;
        }
        assert!(
            pattern.is_compressed(),
            "sparsity pattern must be compressed before attaching a matrix"
        );

        let chunk_size = pattern.chunk_size();
        let matrix_size = pattern.n_blocks() * chunk_size * chunk_size;
        let grain_size = self.config.buffer_grain_size(matrix_size, pattern.n_rows());

        let Some(val) = self.val.as_mut() else {
            return;
        };
        let len = val.len();
        if matrix_size > grain_size {
            apply_to_subranges_mut(0..len, &mut val[..], 1, grain_size, |_, segment| {
                segment.fill(T::zero())
            });
        } else {
            val.fill(T::zero());
        }
    }

    /// Sets every entry, padding included, to zero
    pub fn set_zero(&mut self) {
        self.assign_scalar(T::zero());
    }

    /// Overwrites the matrix with the identity
    ///
    /// # Panics
    ///
    /// Panics if the dimensions differ from `id` or a diagonal entry is not
    /// in the pattern.
    pub fn assign_identity(&mut self, id: &IdentityMatrix) {
        assert_eq!(self.n_rows(), id.m(), "dimension mismatch: {} rows vs identity of size {}", self.n_rows(), id.m());
        assert_eq!(self.n_cols(), id.n(), "dimension mismatch: {} columns vs identity of size {}", self.n_cols(), id.n());

        self.set_zero();
        for i in 0..self.n_cols() {
            self.set(i, i, T::one());
        }
    }

    /// Sets entry `(i, j)`.
    ///
    /// Writing zero to an entry outside the pattern is silently ignored.
    ///
    /// # Panics
    ///
    /// Panics if `(i, j)` is out of range, or is outside the pattern and
    /// `value` is not zero.
    pub fn set(&mut self, i: usize, j: usize, value: T) {
        debug_assert!(value.is_finite(), "value must be finite");

        match self.compute_location(i, j) {
            Some(index) => self.allocated_mut()[index] = value,
            None => assert!(
                value == T::zero(),
                "entry ({}, {}) does not exist in the sparsity pattern",
                i,
                j
            ),
        }
    }

    /// Adds `value` to entry `(i, j)`. Adding zero is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if `(i, j)` is out of range, or is outside the pattern and
    /// `value` is not zero.
    pub fn add(&mut self, i: usize, j: usize, value: T) {
        debug_assert!(value.is_finite(), "value must be finite");

        if value == T::zero() {
            return;
        }
        match self.compute_location(i, j) {
            Some(index) => self.allocated_mut()[index] += value,
            None => panic!("entry ({}, {}) does not exist in the sparsity pattern", i, j),
        }
    }

    /// Value of entry `(i, j)`
    ///
    /// # Panics
    ///
    /// Panics if the entry is not in the pattern.
    pub fn get(&self, i: usize, j: usize) -> T {
        match self.compute_location(i, j) {
            Some(index) => self.allocated()[index],
            None => panic!("entry ({}, {}) does not exist in the sparsity pattern", i, j),
        }
    }

    /// Value of entry `(i, j)`, or zero if it is not in the pattern
    pub fn el(&self, i: usize, j: usize) -> T {
        self.compute_location(i, j)
            .map_or(T::zero(), |index| self.allocated()[index])
    }

    /// Diagonal entry `i` of a square matrix
    pub fn diag_element(&self, i: usize) -> T {
        self.assert_square();
        self.get(i, i)
    }

    /// Values of chunk `(block_row, block_col)`, or `None` if it is not stored
    pub fn block(&self, block_row: usize, block_col: usize) -> Option<&[T]> {
        let index = self.block_index(block_row, block_col)?;
        Some(self.chunk(index))
    }

    /// Mutable values of chunk `(block_row, block_col)`.
    ///
    /// Writing nonzero values into the padding part of a boundary chunk breaks
    /// the padding invariant and is the caller's responsibility to avoid.
    pub fn block_mut(&mut self, block_row: usize, block_col: usize) -> Option<&mut [T]> {
        let index = self.block_index(block_row, block_col)?;
        let chunk_len = self.chunk_len();
        let val = self.allocated_mut();
        debug_assert!((index + 1) * chunk_len <= val.len(), "chunk {} out of bounds", index);
        Some(&mut val[index * chunk_len..(index + 1) * chunk_len])
    }

    /// Iterates all stored chunks in storage order
    pub fn chunks(&self) -> impl Iterator<Item = ChunkEntry<'_, T>> + '_ {
        let pattern = self.pattern();
        chunks_in_rows(pattern, self.allocated(), 0..pattern.n_block_rows())
    }

    /// Copies all values, padding included, from a matrix on the same pattern
    ///
    /// # Panics
    ///
    /// Panics unless both matrices are attached to the very same pattern
    /// object; equal but distinct patterns are rejected.
    pub fn copy_from<U>(&mut self, matrix: &ChunkSparseMatrix<'_, U>)
    where
        U: Scalar,
        T: From<U>,
    {
        self.assert_same_pattern(matrix);

        let len = self.used_len();
        let source = &matrix.allocated()[..len];
        for (dst, &src) in self.allocated_mut()[..len].iter_mut().zip(source) {
            *dst = widen::<U, T>(src);
        }
    }

    /// Replaces the contents by the nonzero entries of a dense matrix.
    ///
    /// Entries that are exactly zero in `matrix` are skipped rather than
    /// written; every stored position has already been zeroed beforehand, so
    /// the only effect is that zero entries outside the pattern are accepted.
    pub fn copy_from_dense<U>(&mut self, matrix: ArrayView2<'_, U>)
    where
        U: Scalar,
        T: From<U>,
    {
        self.set_zero();

        for ((row, col), &value) in matrix.indexed_iter() {
            if value != U::zero() {
                self.set(row, col, widen::<U, T>(value));
            }
        }
    }

    /// `self += factor * matrix` over the raw buffers of two matrices on the
    /// same pattern
    pub fn add_scaled<U>(&mut self, factor: T, matrix: &ChunkSparseMatrix<'_, U>)
    where
        U: Scalar,
        T: From<U>,
    {
        self.assert_same_pattern(matrix);

        let len = self.used_len();
        let source = &matrix.allocated()[..len];
        for (dst, &src) in self.allocated_mut()[..len].iter_mut().zip(source) {
            *dst += factor * widen::<U, T>(src);
        }
    }

    /// Copies the stored entries of row `row` into the output buffers and
    /// returns how many were written.
    ///
    /// Column indices are element columns; padding columns of the last block
    /// column are not reported.
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of range or either buffer is shorter than the
    /// row.
    pub fn extract_row_copy(&self, row: usize, column_indices: &mut [usize], values: &mut [T]) -> usize {
        let pattern = self.pattern();
        let val = self.allocated();
        assert!(row < pattern.n_rows(), "Row index {} out of bounds (n_rows = {})", row, pattern.n_rows());

        let row_length = pattern.row_length(row);
        let capacity = column_indices.len().min(values.len());
        assert!(
            capacity >= row_length,
            "row {} has {} entries but the output buffers hold only {}",
            row,
            row_length,
            capacity
        );

        let chunk_size = pattern.chunk_size();
        let chunk_len = chunk_size * chunk_size;
        let reduced_row = row / chunk_size;
        let offset_in_chunk = (row % chunk_size) * chunk_size;
        let sp = pattern.sparsity_pattern();
        let first_chunk = sp.rowstart()[reduced_row];

        let mut written = 0;
        for (k, &block_col) in sp.row(reduced_row).iter().enumerate() {
            let start = (first_chunk + k) * chunk_len + offset_in_chunk;
            let n_real_cols = pattern.cols_in_block_col(block_col);
            for (c, &value) in val[start..start + n_real_cols].iter().enumerate() {
                column_indices[written] = block_col * chunk_size + c;
                values[written] = value;
                written += 1;
            }
        }

        debug_assert_eq!(written, row_length);
        written
    }

    /// Makes the matrix symmetric. Not available for chunked storage.
    pub fn symmetrize(&mut self) -> Result<()> {
        self.assert_square();
        Err(ChunkSparseError::NotImplemented {
            operation: "symmetrize",
        })
    }

    /// Bytes used by this object and its value buffer
    pub fn memory_consumption(&self) -> usize {
        std::mem::size_of::<Self>() + self.max_len * std::mem::size_of::<T>()
    }

    /// Dense copy of the matrix, padding dropped
    pub fn to_dense(&self) -> Array2<T> {
        let chunk_size = self.pattern().chunk_size();
        let mut dense = Array2::zeros((self.n_rows(), self.n_cols()));

        for chunk in self.chunks() {
            for r in 0..chunk.rows {
                for c in 0..chunk.cols {
                    dense[[chunk.block_row * chunk_size + r, chunk.block_col * chunk_size + c]] =
                        chunk.values[r * chunk_size + c];
                }
            }
        }

        dense
    }

    // ------------------------------------------------------------------
    // Internal helpers shared by the arithmetic modules
    // ------------------------------------------------------------------

    pub(crate) fn pattern(&self) -> &'a ChunkSparsityPattern {
        match self.cols {
            Some(pattern) => pattern,
            None => panic!("matrix has no sparsity pattern attached"),
        }
    }

    pub(crate) fn attached_pattern(&self) -> Option<&'a ChunkSparsityPattern> {
        self.cols
    }

    pub(crate) fn allocated(&self) -> &[T] {
        match &self.val {
            Some(val) => &val[..],
            None => panic!("matrix storage is not allocated"),
        }
    }

    pub(crate) fn allocated_mut(&mut self) -> &mut [T] {
        match &mut self.val {
            Some(val) => &mut val[..],
            None => panic!("matrix storage is not allocated"),
        }
    }

    pub(crate) fn parallel_config(&self) -> &ParallelConfig {
        &self.config
    }

    pub(crate) fn assert_square(&self) {
        let pattern = self.pattern();
        assert_eq!(
            pattern.n_rows(),
            pattern.n_cols(),
            "matrix must be square: got {}x{}",
            pattern.n_rows(),
            pattern.n_cols()
        );
    }

    pub(crate) fn replace_storage(&mut self, val: AVec<T>) {
        self.max_len = val.len();
        self.val = Some(val);
    }

    fn chunk_len(&self) -> usize {
        let chunk_size = self.pattern().chunk_size();
        chunk_size * chunk_size
    }

    /// Number of buffer entries the attached pattern uses
    fn used_len(&self) -> usize {
        self.pattern().n_blocks() * self.chunk_len()
    }

    fn chunk(&self, index: usize) -> &[T] {
        let chunk_len = self.chunk_len();
        let val = self.allocated();
        debug_assert!((index + 1) * chunk_len <= val.len(), "chunk {} out of bounds", index);
        &val[index * chunk_len..(index + 1) * chunk_len]
    }

    fn block_index(&self, block_row: usize, block_col: usize) -> Option<usize> {
        let pattern = self.pattern();
        debug_assert!(block_row < pattern.n_block_rows(), "block row {} out of bounds", block_row);
        debug_assert!(block_col < pattern.n_block_cols(), "block column {} out of bounds", block_col);
        pattern.sparsity_pattern().index_of(block_row, block_col)
    }

    /// Buffer position of element `(i, j)`, or `None` outside the pattern
    fn compute_location(&self, i: usize, j: usize) -> Option<usize> {
        let pattern = self.pattern();
        assert!(i < pattern.n_rows(), "Row index {} out of bounds (n_rows = {})", i, pattern.n_rows());
        assert!(j < pattern.n_cols(), "Column index {} out of bounds (n_cols = {})", j, pattern.n_cols());

        let chunk_size = pattern.chunk_size();
        let chunk_index = pattern
            .sparsity_pattern()
            .index_of(i / chunk_size, j / chunk_size)?;

        Some(chunk_index * chunk_size * chunk_size + (i % chunk_size) * chunk_size + j % chunk_size)
    }

    fn assert_same_pattern<U>(&self, matrix: &ChunkSparseMatrix<'_, U>) {
        let pattern = self.pattern();
        self.allocated();
        let same = matrix.cols.map_or(false, |other| ptr::eq(pattern, other));
        assert!(same, "matrices must share the same sparsity pattern object");
    }
}

impl<T: Scalar> fmt::Debug for ChunkSparseMatrix<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ChunkSparseMatrix {{")?;

        let Some(pattern) = self.cols else {
            writeln!(f, "  (no sparsity pattern)")?;
            return write!(f, "}}");
        };

        writeln!(f, "  dimensions: {} × {}", pattern.n_rows(), pattern.n_cols())?;
        writeln!(f, "  chunk_size: {}", pattern.chunk_size())?;
        writeln!(f, "  max_len: {}", self.max_len)?;

        if self.val.is_none() || pattern.is_empty() {
            return write!(f, "}}");
        }

        // Print a sample of the matrix content
        let max_rows_to_print = DEBUG_SAMPLE_ROWS.min(pattern.n_rows());
        let capacity = pattern.sparsity_pattern().max_entries_per_row() * pattern.chunk_size();
        let mut columns = vec![0; capacity];
        let mut values = vec![T::zero(); capacity];

        writeln!(f, "  content sample:")?;
        for i in 0..max_rows_to_print {
            write!(f, "    row {}: ", i)?;
            let len = self.extract_row_copy(i, &mut columns, &mut values);

            if len == 0 {
                writeln!(f, "(empty)")?;
                continue;
            }

            let max_elements = DEBUG_SAMPLE_ENTRIES.min(len);
            for k in 0..max_elements {
                write!(f, "({}, {:?}) ", columns[k], values[k])?;
            }
            if len > max_elements {
                write!(f, "... ({} more)", len - max_elements)?;
            }
            writeln!(f)?;
        }

        if pattern.n_rows() > max_rows_to_print {
            writeln!(f, "    ... ({} more rows)", pattern.n_rows() - max_rows_to_print)?;
        }

        write!(f, "}}")
    }
}
