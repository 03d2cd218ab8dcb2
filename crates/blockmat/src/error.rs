//! Error types for blockmat

use std::fmt;

use thiserror::Error;

/// Which kind of index a range check failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    /// A row index (or row count)
    Row,
    /// A column index (or column count)
    Column,
    /// A vector entry index
    Entry,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Row => f.write_str("row"),
            IndexKind::Column => f.write_str("column"),
            IndexKind::Entry => f.write_str("entry"),
        }
    }
}

/// Errors raised by matrix construction, indexing and arithmetic.
///
/// Every check runs before any allocation of a result or mutation of an
/// operand, so an error never leaves a matrix partially updated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    /// A dimension that must be strictly positive was zero
    #[error("Number of {kind}s must be strictly positive, got {value}")]
    NotStrictlyPositive { kind: IndexKind, value: usize },

    /// A length does not match the expected one (ragged raw data, vector length)
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A block buffer handed to a block constructor has the wrong length
    #[error("Block ({block_row}, {block_column}) has length {actual}, expected {expected}")]
    BlockDimensionMismatch {
        block_row: usize,
        block_column: usize,
        expected: usize,
        actual: usize,
    },

    /// Operand shapes are incompatible
    #[error("Matrix dimension mismatch: expected {expected_rows}x{expected_columns}, got {actual_rows}x{actual_columns}")]
    MatrixDimensionMismatch {
        expected_rows: usize,
        expected_columns: usize,
        actual_rows: usize,
        actual_columns: usize,
    },

    /// An index is outside `[min, max]`
    #[error("{kind} index {index} out of range [{min}, {max}]")]
    OutOfRange {
        kind: IndexKind,
        index: usize,
        min: usize,
        max: usize,
    },

    /// A sub-range whose end precedes its start
    #[error("Initial {kind} {start} after final {kind} {end}")]
    InvertedRange {
        kind: IndexKind,
        start: usize,
        end: usize,
    },

    /// Empty input where data is required
    #[error("Empty {kind} data")]
    NoData { kind: IndexKind },

    /// Operation requires a square matrix
    #[error("Non-square matrix: {rows}x{columns}")]
    NonSquare { rows: usize, columns: usize },
}

impl MatrixError {
    pub(crate) fn matrix_mismatch(
        expected: (usize, usize),
        actual: (usize, usize),
    ) -> Self {
        MatrixError::MatrixDimensionMismatch {
            expected_rows: expected.0,
            expected_columns: expected.1,
            actual_rows: actual.0,
            actual_columns: actual.1,
        }
    }
}

/// Result type for matrix operations
pub type Result<T> = std::result::Result<T, MatrixError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_conflicting_values() {
        let err = MatrixError::OutOfRange {
            kind: IndexKind::Row,
            index: 7,
            min: 0,
            max: 4,
        };
        assert_eq!(err.to_string(), "row index 7 out of range [0, 4]");

        let err = MatrixError::BlockDimensionMismatch {
            block_row: 1,
            block_column: 0,
            expected: 416,
            actual: 415,
        };
        assert_eq!(
            err.to_string(),
            "Block (1, 0) has length 415, expected 416"
        );

        let err = MatrixError::matrix_mismatch((2, 3), (3, 2));
        assert_eq!(
            err.to_string(),
            "Matrix dimension mismatch: expected 2x3, got 3x2"
        );
    }
}
