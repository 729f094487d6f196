//! Dense kernels operating on a single chunk
//!
//! A chunk is a `chunk_size × chunk_size` block stored row-major in a slice.
//! Each kernel reads `chunk_size` entries of the source vector fragment and
//! updates (or reduces against) `chunk_size` entries of the destination
//! fragment. Arithmetic happens in the vector scalar type `S`, which may be
//! wider than the matrix scalar type `T`.
//!
//! The `partial_*` variants restrict the loops to the leading `rows × cols`
//! corner of the chunk. They handle chunks in the last block row or column,
//! where the remaining entries are padding and the vector fragments are
//! shorter than a full chunk.

use crate::scalar::{widen, Scalar};

/// `dst[0..n) += block · src[0..n)`
#[inline]
pub fn chunk_vmult_add<T, S>(chunk_size: usize, block: &[T], src: &[S], dst: &mut [S])
where
    T: Scalar,
    S: Scalar + From<T>,
{
    debug_assert!(block.len() >= chunk_size * chunk_size);

    for (block_row, d) in block.chunks_exact(chunk_size).zip(&mut dst[..chunk_size]) {
        let mut sum = S::zero();
        for (&a, &x) in block_row.iter().zip(&src[..chunk_size]) {
            sum += widen::<T, S>(a) * x;
        }
        *d += sum;
    }
}

/// `dst[0..n) -= block · src[0..n)`, used by the residual
#[inline]
pub fn chunk_vmult_subtract<T, S>(chunk_size: usize, block: &[T], src: &[S], dst: &mut [S])
where
    T: Scalar,
    S: Scalar + From<T>,
{
    debug_assert!(block.len() >= chunk_size * chunk_size);

    for (block_row, d) in block.chunks_exact(chunk_size).zip(&mut dst[..chunk_size]) {
        let mut sum = S::zero();
        for (&a, &x) in block_row.iter().zip(&src[..chunk_size]) {
            sum += widen::<T, S>(a) * x;
        }
        *d -= sum;
    }
}

/// `dst[0..n) += blockᵀ · src[0..n)` without forming the transpose
#[inline]
pub fn chunk_tvmult_add<T, S>(chunk_size: usize, block: &[T], src: &[S], dst: &mut [S])
where
    T: Scalar,
    S: Scalar + From<T>,
{
    debug_assert!(block.len() >= chunk_size * chunk_size);

    for (i, d) in dst[..chunk_size].iter_mut().enumerate() {
        let mut sum = S::zero();
        for (j, &x) in src[..chunk_size].iter().enumerate() {
            sum += widen::<T, S>(block[j * chunk_size + i]) * x;
        }
        *d += sum;
    }
}

/// `uᵀ · block · v` for one chunk
#[inline]
pub fn chunk_matrix_scalar_product<T, S>(chunk_size: usize, block: &[T], u: &[S], v: &[S]) -> S
where
    T: Scalar,
    S: Scalar + From<T>,
{
    debug_assert!(block.len() >= chunk_size * chunk_size);

    let mut result = S::zero();
    for (block_row, &u_i) in block.chunks_exact(chunk_size).zip(&u[..chunk_size]) {
        let mut sum = S::zero();
        for (&a, &v_j) in block_row.iter().zip(&v[..chunk_size]) {
            sum += widen::<T, S>(a) * v_j;
        }
        result += u_i * sum;
    }
    result
}

/// Like [`chunk_vmult_add`] on the leading `rows × cols` corner only
#[inline]
pub fn partial_vmult_add<T, S>(
    chunk_size: usize,
    rows: usize,
    cols: usize,
    block: &[T],
    src: &[S],
    dst: &mut [S],
) where
    T: Scalar,
    S: Scalar + From<T>,
{
    for r in 0..rows {
        for c in 0..cols {
            dst[r] += widen::<T, S>(block[r * chunk_size + c]) * src[c];
        }
    }
}

/// Like [`chunk_vmult_subtract`] on the leading `rows × cols` corner only
#[inline]
pub fn partial_vmult_subtract<T, S>(
    chunk_size: usize,
    rows: usize,
    cols: usize,
    block: &[T],
    src: &[S],
    dst: &mut [S],
) where
    T: Scalar,
    S: Scalar + From<T>,
{
    for r in 0..rows {
        for c in 0..cols {
            dst[r] -= widen::<T, S>(block[r * chunk_size + c]) * src[c];
        }
    }
}

/// Like [`chunk_tvmult_add`] on the leading `rows × cols` corner only.
///
/// `src` is indexed by chunk row, `dst` by chunk column.
#[inline]
pub fn partial_tvmult_add<T, S>(
    chunk_size: usize,
    rows: usize,
    cols: usize,
    block: &[T],
    src: &[S],
    dst: &mut [S],
) where
    T: Scalar,
    S: Scalar + From<T>,
{
    for r in 0..rows {
        for c in 0..cols {
            dst[c] += widen::<T, S>(block[r * chunk_size + c]) * src[r];
        }
    }
}

/// Like [`chunk_matrix_scalar_product`] on the leading `rows × cols` corner only
#[inline]
pub fn partial_matrix_scalar_product<T, S>(
    chunk_size: usize,
    rows: usize,
    cols: usize,
    block: &[T],
    u: &[S],
    v: &[S],
) -> S
where
    T: Scalar,
    S: Scalar + From<T>,
{
    let mut result = S::zero();
    for r in 0..rows {
        for c in 0..cols {
            result += u[r] * (widen::<T, S>(block[r * chunk_size + c]) * v[c]);
        }
    }
    result
}
