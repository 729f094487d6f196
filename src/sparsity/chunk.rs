//! Sparsity pattern at chunk granularity
//!
//! A [`ChunkSparsityPattern`] describes an `n_rows × n_cols` matrix whose
//! nonzeros are grouped into dense `chunk_size × chunk_size` blocks. Internally
//! it holds a [`SparsityPattern`] over block indices. When a dimension is not
//! a multiple of the chunk size, the last block row or column reaches past the
//! matrix; that overhang is padding and never corresponds to a real element.

use std::fmt;

use crate::sparsity::SparsityPattern;
use crate::utils::div_ceil;

/// Block-granularity sparsity pattern of a chunked sparse matrix
#[derive(Clone, PartialEq, Eq)]
pub struct ChunkSparsityPattern {
    rows: usize,
    cols: usize,
    chunk_size: usize,
    sparsity_pattern: SparsityPattern,
}

impl ChunkSparsityPattern {
    /// Creates an empty, uncompressed pattern for an `rows × cols` matrix
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    pub fn new(rows: usize, cols: usize, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");

        Self {
            rows,
            cols,
            chunk_size,
            sparsity_pattern: SparsityPattern::new(div_ceil(rows, chunk_size), div_ceil(cols, chunk_size)),
        }
    }

    /// Wraps an existing block-level graph
    ///
    /// # Panics
    ///
    /// Panics if the graph's dimensions are not the block dimensions of an
    /// `rows × cols` matrix with the given chunk size.
    pub fn from_block_pattern(
        rows: usize,
        cols: usize,
        chunk_size: usize,
        sparsity_pattern: SparsityPattern,
    ) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        assert_eq!(
            sparsity_pattern.n_rows(),
            div_ceil(rows, chunk_size),
            "block pattern has the wrong number of block rows"
        );
        assert_eq!(
            sparsity_pattern.n_cols(),
            div_ceil(cols, chunk_size),
            "block pattern has the wrong number of block columns"
        );

        Self {
            rows,
            cols,
            chunk_size,
            sparsity_pattern,
        }
    }

    /// Marks the chunk containing element `(i, j)` as nonzero
    pub fn add(&mut self, i: usize, j: usize) {
        assert!(i < self.rows, "Row index {} out of bounds (n_rows = {})", i, self.rows);
        assert!(j < self.cols, "Column index {} out of bounds (n_cols = {})", j, self.cols);

        self.sparsity_pattern.add(i / self.chunk_size, j / self.chunk_size);
    }

    /// Marks chunk `(block_row, block_col)` as nonzero
    pub fn add_block(&mut self, block_row: usize, block_col: usize) {
        self.sparsity_pattern.add(block_row, block_col);
    }

    pub fn compress(&mut self) {
        self.sparsity_pattern.compress();
    }

    pub fn is_compressed(&self) -> bool {
        self.sparsity_pattern.is_compressed()
    }

    /// Number of element rows
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Number of element columns
    pub fn n_cols(&self) -> usize {
        self.cols
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn n_block_rows(&self) -> usize {
        self.sparsity_pattern.n_rows()
    }

    pub fn n_block_cols(&self) -> usize {
        self.sparsity_pattern.n_cols()
    }

    /// True if the matrix has no rows or no columns
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// The underlying graph over block indices
    pub fn sparsity_pattern(&self) -> &SparsityPattern {
        &self.sparsity_pattern
    }

    /// Number of stored chunks
    pub fn n_blocks(&self) -> usize {
        self.sparsity_pattern.n_nonzero_elements()
    }

    /// Number of real (non-padding) rows covered by `block_row`
    pub fn rows_in_block_row(&self, block_row: usize) -> usize {
        extent(block_row, self.rows, self.chunk_size)
    }

    /// Number of real (non-padding) columns covered by `block_col`
    pub fn cols_in_block_col(&self, block_col: usize) -> usize {
        extent(block_col, self.cols, self.chunk_size)
    }

    /// True if element `(i, j)` lies in a stored chunk
    pub fn exists(&self, i: usize, j: usize) -> bool {
        self.sparsity_pattern
            .exists(i / self.chunk_size, j / self.chunk_size)
    }

    /// Number of stored real elements in element row `i`
    pub fn row_length(&self, i: usize) -> usize {
        assert!(i < self.rows, "Row index {} out of bounds (n_rows = {})", i, self.rows);
        let reduced_row = i / self.chunk_size;

        if self.cols % self.chunk_size == 0 {
            return self.sparsity_pattern.row_length(reduced_row) * self.chunk_size;
        }

        self.sparsity_pattern
            .row(reduced_row)
            .iter()
            .map(|&block_col| self.cols_in_block_col(block_col))
            .sum()
    }

    /// Number of stored real elements, padding excluded
    pub fn n_nonzero_elements(&self) -> usize {
        let cs = self.chunk_size;
        if self.rows % cs == 0 && self.cols % cs == 0 {
            return self.n_blocks() * cs * cs;
        }

        (0..self.n_block_rows())
            .map(|block_row| {
                let rows_in = self.rows_in_block_row(block_row);
                self.sparsity_pattern
                    .row(block_row)
                    .iter()
                    .map(|&block_col| rows_in * self.cols_in_block_col(block_col))
                    .sum::<usize>()
            })
            .sum()
    }

    pub fn memory_consumption(&self) -> usize {
        std::mem::size_of::<Self>() - std::mem::size_of::<SparsityPattern>()
            + self.sparsity_pattern.memory_consumption()
    }
}

/// Number of real indices covered by block `block` of a dimension of `len`
fn extent(block: usize, len: usize, chunk_size: usize) -> usize {
    let begin = block * chunk_size;
    debug_assert!(begin < len, "block {} lies outside the matrix", block);
    chunk_size.min(len - begin)
}

impl fmt::Debug for ChunkSparsityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ChunkSparsityPattern {{")?;
        writeln!(f, "  dimensions: {} × {}", self.rows, self.cols)?;
        writeln!(f, "  chunk_size: {}", self.chunk_size)?;
        writeln!(
            f,
            "  blocks: {} × {}",
            self.n_block_rows(),
            self.n_block_cols()
        )?;
        if self.is_compressed() {
            writeln!(f, "  stored chunks: {}", self.n_blocks())?;
        } else {
            writeln!(f, "  (not compressed)")?;
        }
        write!(f, "}}")
    }
}
