//! Utility functions and helpers

pub mod formats;

pub use formats::{fill_from_sprs, pattern_from_sprs, to_sprs_csr, to_sprs_triplets};

use crate::scalar::Scalar;

/// Computes an exclusive prefix sum (scan) for a vector
pub fn exclusive_scan(input: &[usize]) -> Vec<usize> {
    let mut result = Vec::with_capacity(input.len() + 1);
    let mut sum = 0;

    result.push(0); // First element is always 0

    for &val in input {
        sum += val;
        result.push(sum);
    }

    result
}

/// Euclidean norm of a vector
pub fn l2_norm<S: Scalar>(v: &[S]) -> S {
    v.iter().fold(S::zero(), |acc, &x| acc + x * x).sqrt()
}

/// Integer division rounding up, used for element → block dimensions
pub fn div_ceil(n: usize, d: usize) -> usize {
    (n + d - 1) / d
}
