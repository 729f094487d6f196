//! Binary persistence and text output
//!
//! The binary frame is `[max_len][raw value bytes]`: the buffer length in
//! ASCII decimal between brackets, then the native-endian bytes of every
//! buffer entry between brackets. Only the values are written; the pattern
//! must be persisted separately and attached to the matrix before reading.

use std::io::{self, Read, Write};

use aligned_vec::AVec;
use bytemuck::Pod;
use tracing::{debug, warn};

use crate::constants::{BUFFER_ALIGNMENT, FRAME_CLOSE, FRAME_OPEN, PATTERN_EMPTY, PATTERN_LARGE, PATTERN_SMALL};
use crate::error::{ChunkSparseError, Result};
use crate::matrix::chunk_sparse::ChunkSparseMatrix;
use crate::scalar::Scalar;

/// Layout options for [`ChunkSparseMatrix::print_formatted`]
#[derive(Debug, Clone, PartialEq)]
pub struct PrintFormat {
    /// Digits after the decimal point
    pub precision: usize,
    /// Use scientific notation
    pub scientific: bool,
    /// Column width; 0 picks a width from the precision
    pub width: usize,
    /// Text printed for entries outside the pattern
    pub zero_string: String,
    /// Scale applied to every entry before printing
    pub denominator: f64,
}

impl Default for PrintFormat {
    fn default() -> Self {
        Self {
            precision: 3,
            scientific: true,
            width: 0,
            zero_string: " ".to_string(),
            denominator: 1.0,
        }
    }
}

impl<'a, T: Scalar + Pod> ChunkSparseMatrix<'a, T> {
    /// Writes the value buffer as a binary frame
    pub fn block_write<W: Write>(&self, out: &mut W) -> Result<()> {
        let values = self.values();
        write!(out, "{}{}{}", FRAME_OPEN as char, self.max_len(), FRAME_CLOSE as char)?;
        out.write_all(&[FRAME_OPEN])?;
        out.write_all(bytemuck::cast_slice(values))?;
        out.write_all(&[FRAME_CLOSE])?;
        out.flush()?;

        debug!(max_len = self.max_len(), "wrote chunk value frame");
        Ok(())
    }

    /// Replaces the value buffer with one read from a binary frame.
    ///
    /// The buffer is reallocated to the persisted length. Nothing is checked
    /// against the attached pattern beyond a warning when the frame is too
    /// short for it.
    pub fn block_read<R: Read>(&mut self, input: &mut R) -> Result<()> {
        expect_marker(input, FRAME_OPEN)?;
        let max_len = read_length(input)?;
        expect_marker(input, FRAME_OPEN)?;

        let mut val = AVec::from_iter(BUFFER_ALIGNMENT, std::iter::repeat(T::zero()).take(max_len));
        input.read_exact(bytemuck::cast_slice_mut(&mut val[..]))?;

        expect_marker(input, FRAME_CLOSE)?;

        if let Some(pattern) = self.attached_pattern() {
            let required = pattern.n_blocks() * pattern.chunk_size() * pattern.chunk_size();
            if !pattern.is_empty() && required > max_len {
                warn!(required, max_len, "persisted frame is smaller than the attached pattern needs");
            }
        }

        debug!(max_len, "read chunk value frame");
        self.replace_storage(val);
        Ok(())
    }
}

impl<'a, T: Scalar> ChunkSparseMatrix<'a, T> {
    /// Prints a character map of the pattern, `chunk_size` characters per
    /// block column and `chunk_size` lines per block row.
    ///
    /// Unstored chunks print as `.`, chunks whose largest magnitude exceeds
    /// `threshold` as `*`, other stored chunks as `:`.
    pub fn print_pattern<W: Write>(&self, out: &mut W, threshold: T) -> Result<()> {
        let pattern = self.pattern();
        self.allocated();
        let cs = pattern.chunk_size();

        for block_row in 0..pattern.n_block_rows() {
            let mut line = String::with_capacity(pattern.n_block_cols() * cs);
            for block_col in 0..pattern.n_block_cols() {
                let symbol = match self.block(block_row, block_col) {
                    None => PATTERN_EMPTY,
                    Some(values) => {
                        let largest = values.iter().fold(T::zero(), |acc, a| acc.max(a.abs()));
                        if largest > threshold {
                            PATTERN_LARGE
                        } else {
                            PATTERN_SMALL
                        }
                    }
                };
                line.extend(std::iter::repeat(symbol).take(cs));
            }

            for _ in 0..cs {
                writeln!(out, "{}", line)?;
            }
        }

        out.flush()?;
        Ok(())
    }

    /// Prints every stored entry as `(row,col) value`. Not available for
    /// chunked storage.
    pub fn print<W: Write>(&self, out: &mut W) -> Result<()> {
        let _ = out;
        self.pattern();
        self.allocated();
        Err(ChunkSparseError::NotImplemented { operation: "print" })
    }

    /// Prints the matrix as a dense table. Not available for chunked storage.
    pub fn print_formatted<W: Write>(&self, out: &mut W, format: &PrintFormat) -> Result<()> {
        let _ = (out, format);
        self.pattern();
        self.allocated();
        Err(ChunkSparseError::NotImplemented {
            operation: "print_formatted",
        })
    }
}

fn next_byte<R: Read>(input: &mut R) -> Result<Option<u8>> {
    let mut byte = [0u8; 1];
    loop {
        match input.read(&mut byte) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(byte[0])),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Next byte that is not ASCII whitespace
fn next_token<R: Read>(input: &mut R) -> Result<Option<u8>> {
    loop {
        match next_byte(input)? {
            Some(b) if b.is_ascii_whitespace() => continue,
            other => return Ok(other),
        }
    }
}

fn expect_marker<R: Read>(input: &mut R, marker: u8) -> Result<()> {
    match next_token(input)? {
        Some(b) if b == marker => Ok(()),
        found => Err(ChunkSparseError::MalformedFrame {
            expected: marker as char,
            found: found.map(char::from),
        }),
    }
}

/// Parses the decimal length and consumes the closing bracket after it
fn read_length<R: Read>(input: &mut R) -> Result<usize> {
    let mut length: usize = match next_token(input)? {
        Some(b) if b.is_ascii_digit() => usize::from(b - b'0'),
        Some(b) => return Err(ChunkSparseError::InvalidHeader(format!("expected a length, found '{}'", char::from(b)))),
        None => return Err(ChunkSparseError::InvalidHeader("stream ended before the length".to_string())),
    };

    loop {
        match next_byte(input)? {
            Some(b) if b.is_ascii_digit() => {
                length = length
                    .checked_mul(10)
                    .and_then(|l| l.checked_add(usize::from(b - b'0')))
                    .ok_or_else(|| ChunkSparseError::InvalidHeader("length overflows usize".to_string()))?;
            }
            Some(b) if b == FRAME_CLOSE => return Ok(length),
            Some(b) if b.is_ascii_whitespace() => {
                expect_marker(input, FRAME_CLOSE)?;
                return Ok(length);
            }
            found => {
                return Err(ChunkSparseError::MalformedFrame {
                    expected: FRAME_CLOSE as char,
                    found: found.map(char::from),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sparsity::ChunkSparsityPattern;
    use std::io::Cursor;

    fn pattern() -> ChunkSparsityPattern {
        let mut p = ChunkSparsityPattern::new(3, 3, 2);
        p.add_block(0, 0);
        p.add_block(1, 1);
        p.compress();
        p
    }

    #[test]
    fn test_frame_layout() {
        let p = pattern();
        let mut m = ChunkSparseMatrix::<f32>::from_pattern(&p);
        m.set(0, 0, 1.0);

        let mut bytes = Vec::new();
        m.block_write(&mut bytes).unwrap();

        assert_eq!(&bytes[..4], b"[8][");
        assert_eq!(bytes.len(), 4 + 8 * 4 + 1);
        assert_eq!(*bytes.last().unwrap(), b']');
        assert_eq!(&bytes[4..8], &1.0f32.to_ne_bytes());
    }

    #[test]
    fn test_read_restores_values() {
        let p = pattern();
        let mut m = ChunkSparseMatrix::<f64>::from_pattern(&p);
        m.set(1, 0, -2.5);
        m.set(2, 2, 4.0);

        let mut bytes = Vec::new();
        m.block_write(&mut bytes).unwrap();

        let mut restored = ChunkSparseMatrix::<f64>::from_pattern(&p);
        restored.block_read(&mut Cursor::new(bytes)).unwrap();

        assert_eq!(restored.max_len(), m.max_len());
        assert_eq!(restored.values(), m.values());
        assert_eq!(restored.get(2, 2), 4.0);
    }

    #[test]
    fn test_read_tolerates_whitespace_between_frames() {
        let p = pattern();
        let m = ChunkSparseMatrix::<f64>::from_pattern(&p);

        let mut bytes = b"  ".to_vec();
        m.block_write(&mut bytes).unwrap();
        let split = bytes.iter().position(|&b| b == b']').unwrap() + 1;
        bytes.insert(split, b'\n');

        let mut restored = ChunkSparseMatrix::<f64>::new();
        restored.block_read(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(restored.max_len(), 8);
    }

    #[test]
    fn test_read_rejects_missing_marker() {
        let mut m = ChunkSparseMatrix::<f64>::new();
        let err = m.block_read(&mut Cursor::new(b"8][".to_vec())).unwrap_err();
        assert!(matches!(
            err,
            ChunkSparseError::MalformedFrame { expected: '[', found: Some('8') }
        ));
    }

    #[test]
    fn test_read_rejects_bad_length() {
        let mut m = ChunkSparseMatrix::<f64>::new();
        let err = m.block_read(&mut Cursor::new(b"[x]".to_vec())).unwrap_err();
        assert!(matches!(err, ChunkSparseError::InvalidHeader(_)));
    }

    #[test]
    fn test_read_truncated_payload() {
        let mut m = ChunkSparseMatrix::<f64>::new();
        let err = m.block_read(&mut Cursor::new(b"[2][abc".to_vec())).unwrap_err();
        assert!(matches!(err, ChunkSparseError::Io(_)));
    }

    #[test]
    fn test_print_pattern() {
        let mut p = ChunkSparsityPattern::new(4, 4, 2);
        p.add_block(0, 0);
        p.add_block(1, 0);
        p.compress();
        let mut m = ChunkSparseMatrix::<f64>::from_pattern(&p);
        m.set(0, 1, 3.0);
        m.set(3, 0, 0.1);

        let mut out = Vec::new();
        m.print_pattern(&mut out, 1.0).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "**..\n**..\n::..\n::..\n");
    }

    #[test]
    fn test_print_not_implemented() {
        let p = pattern();
        let m = ChunkSparseMatrix::<f64>::from_pattern(&p);
        let mut out = Vec::new();
        assert!(matches!(
            m.print(&mut out),
            Err(ChunkSparseError::NotImplemented { operation: "print" })
        ));
        assert!(m.print_formatted(&mut out, &PrintFormat::default()).is_err());
        assert!(out.is_empty());
    }
}
