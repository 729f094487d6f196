//! Scalar sparsity graph in compressed row form
//!
//! The chunked pattern stores one of these over block indices. It is built
//! incrementally with [`SparsityPattern::add`] and then frozen with
//! [`SparsityPattern::compress`]; only compressed graphs can carry a matrix.

use std::fmt;

use crate::utils::exclusive_scan;

/// A sparsity graph over `n_rows × n_cols` indices
///
/// After compression the graph is stored like the index part of a CSR matrix:
/// - rowstart: Array of size n_rows + 1 with the offset of each row's first entry
/// - colnums: Array of size n_entries with the sorted column indices of each row
///
/// The linear position of an entry in `colnums` is also the position of its
/// value in any matrix built on this graph.
#[derive(Clone, PartialEq, Eq)]
pub struct SparsityPattern {
    n_rows: usize,
    n_cols: usize,
    rowstart: Vec<usize>,
    colnums: Vec<usize>,
    /// Entries added since construction; drained by `compress`
    pending: Vec<Vec<usize>>,
    compressed: bool,
}

impl SparsityPattern {
    /// Creates an empty, uncompressed graph
    pub fn new(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            rowstart: Vec::new(),
            colnums: Vec::new(),
            pending: vec![Vec::new(); n_rows],
            compressed: false,
        }
    }

    /// Creates a compressed graph from raw row offsets and column indices
    ///
    /// # Panics
    ///
    /// Panics if the input arrays are inconsistent:
    /// - rowstart.len() must be n_rows + 1
    /// - rowstart[n_rows] must equal colnums.len()
    /// - column indices must be in bounds and strictly increasing within a row
    pub fn from_raw_parts(
        n_rows: usize,
        n_cols: usize,
        rowstart: Vec<usize>,
        colnums: Vec<usize>,
    ) -> Self {
        assert_eq!(rowstart.len(), n_rows + 1, "rowstart.len() must be n_rows + 1");
        assert_eq!(
            rowstart[n_rows],
            colnums.len(),
            "rowstart[n_rows] must equal colnums.len()"
        );

        for row in 0..n_rows {
            assert!(
                rowstart[row] <= rowstart[row + 1],
                "rowstart must be non-decreasing (row {})",
                row
            );
            let cols = &colnums[rowstart[row]..rowstart[row + 1]];
            for &col in cols {
                assert!(col < n_cols, "Column index {} out of bounds (n_cols = {})", col, n_cols);
            }
            assert!(
                cols.windows(2).all(|w| w[0] < w[1]),
                "column indices of row {} must be sorted and unique",
                row
            );
        }

        Self {
            n_rows,
            n_cols,
            rowstart,
            colnums,
            pending: Vec::new(),
            compressed: true,
        }
    }

    /// Adds the entry `(i, j)`; duplicates are merged by `compress`
    ///
    /// # Panics
    ///
    /// Panics if the graph is already compressed or the index is out of range.
    pub fn add(&mut self, i: usize, j: usize) {
        assert!(!self.compressed, "cannot add entries to a compressed sparsity pattern");
        assert!(i < self.n_rows, "Row index {} out of bounds (n_rows = {})", i, self.n_rows);
        assert!(j < self.n_cols, "Column index {} out of bounds (n_cols = {})", j, self.n_cols);

        self.pending[i].push(j);
    }

    /// Freezes the graph: sorts and deduplicates each row and builds the
    /// row offsets. Compressing twice is a no-op.
    pub fn compress(&mut self) {
        if self.compressed {
            return;
        }

        let mut rows = std::mem::take(&mut self.pending);
        for row in &mut rows {
            row.sort_unstable();
            row.dedup();
        }

        let lengths: Vec<usize> = rows.iter().map(Vec::len).collect();
        self.rowstart = exclusive_scan(&lengths);
        self.colnums = rows.into_iter().flatten().collect();
        self.compressed = true;
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// True if either dimension is zero
    pub fn is_empty(&self) -> bool {
        self.n_rows == 0 || self.n_cols == 0
    }

    /// Number of stored entries
    pub fn n_nonzero_elements(&self) -> usize {
        self.assert_compressed();
        self.colnums.len()
    }

    /// Number of stored entries in row `row`
    pub fn row_length(&self, row: usize) -> usize {
        self.assert_compressed();
        assert!(row < self.n_rows, "Row index out of bounds");
        self.rowstart[row + 1] - self.rowstart[row]
    }

    pub fn max_entries_per_row(&self) -> usize {
        (0..self.n_rows).map(|r| self.row_length(r)).max().unwrap_or(0)
    }

    /// Row offsets (size: n_rows + 1)
    pub fn rowstart(&self) -> &[usize] {
        self.assert_compressed();
        &self.rowstart
    }

    /// Column indices of all rows, concatenated
    pub fn colnums(&self) -> &[usize] {
        self.assert_compressed();
        &self.colnums
    }

    /// Sorted column indices of row `row`
    pub fn row(&self, row: usize) -> &[usize] {
        self.assert_compressed();
        assert!(row < self.n_rows, "Row index out of bounds");
        &self.colnums[self.rowstart[row]..self.rowstart[row + 1]]
    }

    /// Linear position of entry `(i, j)`, or `None` if it is not stored
    pub fn index_of(&self, i: usize, j: usize) -> Option<usize> {
        self.assert_compressed();
        assert!(i < self.n_rows, "Row index {} out of bounds (n_rows = {})", i, self.n_rows);
        assert!(j < self.n_cols, "Column index {} out of bounds (n_cols = {})", j, self.n_cols);

        self.row(i)
            .binary_search(&j)
            .ok()
            .map(|offset| self.rowstart[i] + offset)
    }

    pub fn exists(&self, i: usize, j: usize) -> bool {
        self.index_of(i, j).is_some()
    }

    /// Bytes used by this object and its index arrays
    pub fn memory_consumption(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.rowstart.capacity() * std::mem::size_of::<usize>()
            + self.colnums.capacity() * std::mem::size_of::<usize>()
            + self
                .pending
                .iter()
                .map(|row| row.capacity() * std::mem::size_of::<usize>())
                .sum::<usize>()
    }

    fn assert_compressed(&self) {
        assert!(self.compressed, "sparsity pattern must be compressed");
    }
}

impl fmt::Debug for SparsityPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SparsityPattern {{")?;
        writeln!(f, "  dimensions: {} × {}", self.n_rows, self.n_cols)?;
        if self.compressed {
            writeln!(f, "  entries: {}", self.colnums.len())?;
        } else {
            writeln!(f, "  (not compressed)")?;
        }
        write!(f, "}}")
    }
}
