//! Scalar bound shared by matrix entries and vector entries

use num_traits::Float;
use std::fmt;
use std::ops::{AddAssign, MulAssign, SubAssign};

/// Entry type of a chunked sparse matrix or of the vectors it acts on.
///
/// Implemented for every real floating point type. Matrix and vector scalars
/// may differ; operations accumulate in the vector type, which must be
/// constructible from the matrix type (e.g. `f32` matrix, `f64` vectors).
pub trait Scalar:
    Float + AddAssign + SubAssign + MulAssign + Default + fmt::Debug + fmt::Display + Send + Sync + 'static
{
}

impl<T> Scalar for T where
    T: Float
        + AddAssign
        + SubAssign
        + MulAssign
        + Default
        + fmt::Debug
        + fmt::Display
        + Send
        + Sync
        + 'static
{
}

/// Converts a matrix entry into the vector scalar type.
///
/// Spelled out because `S::from` is ambiguous between `From` and `NumCast`.
#[inline(always)]
pub fn widen<T, S: From<T>>(value: T) -> S {
    <S as From<T>>::from(value)
}
