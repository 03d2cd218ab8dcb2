//! Field element traits for block matrices.
//!
//! [`Field`] is the small arithmetic capability set the block algorithms are
//! written against: `+`, `-`, `*`, `/`, negation, zero and one. Native floats
//! implement it with the built-in operators, so the generic code compiles down
//! to the same loops a hand-specialized `f64` matrix would use. Exact element
//! types such as [`Rational64`] go through the same code path.

use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

use num_complex::{Complex32, Complex64};
use num_rational::{Rational32, Rational64};
use num_traits::{Float, One, Zero};

/// Block side length used for native floating point elements.
///
/// Three 52 × 52 blocks of doubles (two operands, one output) fit in 64 KiB.
pub const REAL_BLOCK_SIZE: usize = 52;

/// Block side length used for every other field element.
pub const FIELD_BLOCK_SIZE: usize = 36;

/// Element type of a block matrix.
pub trait Field:
    Copy
    + Debug
    + PartialEq
    + Zero
    + One
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + Send
    + Sync
    + 'static
{
    /// Side length of the square blocks a matrix of this element is cut into.
    const BLOCK_SIZE: usize = FIELD_BLOCK_SIZE;

    /// Create an element from a small integer.
    fn from_i64(value: i64) -> Self;
}

/// Field elements with an ordering and real-valued magnitude (norms, pivoting).
pub trait RealField: Field + Float {}

impl<T: Field + Float> RealField for T {}

impl Field for f64 {
    const BLOCK_SIZE: usize = REAL_BLOCK_SIZE;

    #[inline]
    fn from_i64(value: i64) -> Self {
        value as f64
    }
}

impl Field for f32 {
    const BLOCK_SIZE: usize = REAL_BLOCK_SIZE;

    #[inline]
    fn from_i64(value: i64) -> Self {
        value as f32
    }
}

impl Field for Complex64 {
    #[inline]
    fn from_i64(value: i64) -> Self {
        Complex64::new(value as f64, 0.0)
    }
}

impl Field for Complex32 {
    #[inline]
    fn from_i64(value: i64) -> Self {
        Complex32::new(value as f32, 0.0)
    }
}

impl Field for Rational64 {
    #[inline]
    fn from_i64(value: i64) -> Self {
        Rational64::from_integer(value)
    }
}

impl Field for Rational32 {
    /// Values outside the `i32` range saturate to `i32::MIN` / `i32::MAX`.
    #[inline]
    fn from_i64(value: i64) -> Self {
        let clamped = value.clamp(i64::from(i32::MIN), i64::from(i32::MAX));
        Rational32::from_integer(clamped as i32)
    }
}

/// Generate `f64` and `Rational64` variants of a generic test function.
///
/// # Example
///
/// ```ignore
/// fn test_operation_generic<T: Field>() {
///     // test implementation
/// }
///
/// blockmat::field_tests!(test_operation, test_operation_generic);
/// // Generates:
/// // #[test] fn test_operation_f64() { test_operation_generic::<f64>(); }
/// // #[test] fn test_operation_rational() { test_operation_generic::<Rational64>(); }
/// ```
#[macro_export]
macro_rules! field_tests {
    ($name:ident, $test_fn:ident) => {
        $crate::paste::paste! {
            #[test]
            fn [<$name _f64>]() {
                $test_fn::<f64>();
            }

            #[test]
            fn [<$name _rational>]() {
                $test_fn::<$crate::num_rational::Rational64>();
            }
        }
    };
}
