//! Cache-blocked dense matrices
//!
//! This crate provides a dense matrix stored as square blocks so that the
//! inner loops of multiplication and traversal stay cache resident:
//! - `BlockMatrix`: the block-laid-out matrix with arithmetic, row/column and
//!   sub-matrix access, and visitor walks
//! - `Matrix` / `Vector`: the abstract interfaces operations accept
//! - `DenseMatrix` / `ArrayVector`: plain row-major implementations of them
//!
//! Entries are any [`Field`]: `f32`, `f64`, complex numbers and rationals.
//!
//! # Example
//!
//! ```
//! use blockmat::{BlockMatrix, DenseMatrix};
//!
//! let a = BlockMatrix::from_raw(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
//! let b = DenseMatrix::from_vec2d(vec![vec![1.0], vec![0.0], vec![-1.0]]).unwrap();
//!
//! let product = a.multiply(&b).unwrap();
//! assert_eq!(product.data(), vec![vec![-2.0], vec![-2.0]]);
//! assert_eq!(a.frobenius_norm(), 91.0_f64.sqrt());
//! ```

pub mod error;
pub mod layout;
pub mod matrix;
pub mod scalar;
pub mod vector;
pub mod visitor;

mod block_matrix;

// Re-export main types
pub use block_matrix::BlockMatrix;
pub use error::{IndexKind, MatrixError, Result};
pub use layout::BlockGeometry;
pub use matrix::{DenseMatrix, Matrix};
pub use scalar::{Field, RealField};
pub use vector::{ArrayVector, Vector};
pub use visitor::{MatrixChangingVisitor, MatrixPreservingVisitor};

// Used by `field_tests!`
#[doc(hidden)]
pub use num_rational;
#[doc(hidden)]
pub use paste;
