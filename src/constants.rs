//! Centralized constants for the chunked sparse matrix library
//!
//! This module contains all hardcoded constants used throughout the codebase.
//! All new constants should be added here rather than scattered throughout the code.
//! Constants are organized by category for easy reference and maintenance.

// ============================================================================
// PARALLEL DISPATCH
// ============================================================================

/// Minimum number of rows handed to one parallel task.
///
/// Block-row dispatch divides this by the chunk size, so the element volume
/// per task stays roughly constant as blocks grow.
pub const MINIMUM_PARALLEL_GRAIN_SIZE: usize = 1000;

// ============================================================================
// MEMORY LAYOUT
// ============================================================================

/// Alignment in bytes of the block value buffer (one cache line)
pub const BUFFER_ALIGNMENT: usize = 64;

// ============================================================================
// PERSISTENCE FRAME
// ============================================================================

/// Opens each bracketed section of the `block_write` frame
pub const FRAME_OPEN: u8 = b'[';

/// Closes each bracketed section of the `block_write` frame
pub const FRAME_CLOSE: u8 = b']';

// ============================================================================
// TEXTUAL OUTPUT
// ============================================================================

/// Marker for a cell with no stored chunk in `print_pattern`
pub const PATTERN_EMPTY: char = '.';

/// Marker for a stored chunk whose entries are all below the threshold
pub const PATTERN_SMALL: char = ':';

/// Marker for a stored chunk with at least one entry above the threshold
pub const PATTERN_LARGE: char = '*';

/// Number of rows shown by the `Debug` content sample
pub const DEBUG_SAMPLE_ROWS: usize = 5;

/// Number of entries per row shown by the `Debug` content sample
pub const DEBUG_SAMPLE_ENTRIES: usize = 5;
