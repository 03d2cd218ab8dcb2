//! Generic matrix interface and a plain row-major implementation.
//!
//! [`Matrix`] is the read contract every operand of a [`BlockMatrix`]
//! operation satisfies. Operations check [`Matrix::as_block_matrix`] to decide
//! between the block-copy path and the per-entry path.

use std::ops::{Index, IndexMut};

use num_traits::Zero;

use crate::block_matrix::BlockMatrix;
use crate::error::{IndexKind, MatrixError, Result};
use crate::scalar::Field;

/// Read access to a rectangular matrix.
pub trait Matrix<T: Field> {
    /// Number of rows
    fn row_dimension(&self) -> usize;

    /// Number of columns
    fn column_dimension(&self) -> usize;

    /// Entry at `(row, column)`.
    ///
    /// # Errors
    /// Returns [`MatrixError::OutOfRange`] if the position is outside the matrix.
    fn entry(&self, row: usize, column: usize) -> Result<T>;

    /// Whether the matrix is square
    fn is_square(&self) -> bool {
        self.row_dimension() == self.column_dimension()
    }

    /// Block view of this matrix, if it is stored in block layout.
    fn as_block_matrix(&self) -> Option<&BlockMatrix<T>> {
        None
    }
}

/// Simple 2D matrix backed by a row-major `Vec`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
}

impl<T: Clone> DenseMatrix<T> {
    /// Create a new matrix from dimensions and initial value
    pub fn from_elem(nrows: usize, ncols: usize, elem: T) -> Self {
        Self {
            data: vec![elem; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create a matrix from row-major data
    ///
    /// # Errors
    /// Returns [`MatrixError::DimensionMismatch`] if `data.len() != nrows * ncols`.
    pub fn from_vec(nrows: usize, ncols: usize, data: Vec<T>) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(MatrixError::DimensionMismatch {
                expected: nrows * ncols,
                actual: data.len(),
            });
        }
        Ok(Self { data, nrows, ncols })
    }

    /// Number of rows
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Row-major data
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T: Clone + Zero> DenseMatrix<T> {
    /// Create a zeros matrix
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self::from_elem(nrows, ncols, T::zero())
    }

    /// Create a matrix from a 2D vector (row-major)
    ///
    /// # Errors
    /// Returns [`MatrixError::DimensionMismatch`] if the rows have different lengths.
    pub fn from_vec2d(data: Vec<Vec<T>>) -> Result<Self> {
        let nrows = data.len();
        let ncols = data.first().map_or(0, Vec::len);
        let mut flat = Vec::with_capacity(nrows * ncols);
        for row in data {
            if row.len() != ncols {
                return Err(MatrixError::DimensionMismatch {
                    expected: ncols,
                    actual: row.len(),
                });
            }
            flat.extend(row);
        }
        Ok(Self {
            data: flat,
            nrows,
            ncols,
        })
    }
}

impl<T> Index<[usize; 2]> for DenseMatrix<T> {
    type Output = T;

    fn index(&self, idx: [usize; 2]) -> &Self::Output {
        &self.data[idx[0] * self.ncols + idx[1]]
    }
}

impl<T> IndexMut<[usize; 2]> for DenseMatrix<T> {
    fn index_mut(&mut self, idx: [usize; 2]) -> &mut Self::Output {
        &mut self.data[idx[0] * self.ncols + idx[1]]
    }
}

impl<T: Field> Matrix<T> for DenseMatrix<T> {
    fn row_dimension(&self) -> usize {
        self.nrows
    }

    fn column_dimension(&self) -> usize {
        self.ncols
    }

    fn entry(&self, row: usize, column: usize) -> Result<T> {
        check_row_index(self, row)?;
        check_column_index(self, column)?;
        Ok(self[[row, column]])
    }
}

pub(crate) fn check_index(kind: IndexKind, index: usize, dimension: usize) -> Result<()> {
    if index >= dimension {
        return Err(MatrixError::OutOfRange {
            kind,
            index,
            min: 0,
            max: dimension.saturating_sub(1),
        });
    }
    Ok(())
}

/// Check that `row` is a valid row index of `m`
pub fn check_row_index<T: Field, M: Matrix<T> + ?Sized>(m: &M, row: usize) -> Result<()> {
    check_index(IndexKind::Row, row, m.row_dimension())
}

/// Check that `column` is a valid column index of `m`
pub fn check_column_index<T: Field, M: Matrix<T> + ?Sized>(m: &M, column: usize) -> Result<()> {
    check_index(IndexKind::Column, column, m.column_dimension())
}

/// Check that the inclusive sub-range is inside `m` and not inverted
pub fn check_sub_matrix_index<T: Field, M: Matrix<T> + ?Sized>(
    m: &M,
    start_row: usize,
    end_row: usize,
    start_column: usize,
    end_column: usize,
) -> Result<()> {
    check_row_index(m, start_row)?;
    check_row_index(m, end_row)?;
    if end_row < start_row {
        return Err(MatrixError::InvertedRange {
            kind: IndexKind::Row,
            start: start_row,
            end: end_row,
        });
    }
    check_column_index(m, start_column)?;
    check_column_index(m, end_column)?;
    if end_column < start_column {
        return Err(MatrixError::InvertedRange {
            kind: IndexKind::Column,
            start: start_column,
            end: end_column,
        });
    }
    Ok(())
}

/// Check that `left` and `right` have the same shape
pub fn check_addition_compatible<T, L, R>(left: &L, right: &R) -> Result<()>
where
    T: Field,
    L: Matrix<T> + ?Sized,
    R: Matrix<T> + ?Sized,
{
    if left.row_dimension() != right.row_dimension()
        || left.column_dimension() != right.column_dimension()
    {
        return Err(MatrixError::matrix_mismatch(
            (left.row_dimension(), left.column_dimension()),
            (right.row_dimension(), right.column_dimension()),
        ));
    }
    Ok(())
}

/// Check that `left * right` is defined
pub fn check_multiplication_compatible<T, L, R>(left: &L, right: &R) -> Result<()>
where
    T: Field,
    L: Matrix<T> + ?Sized,
    R: Matrix<T> + ?Sized,
{
    if left.column_dimension() != right.row_dimension() {
        return Err(MatrixError::DimensionMismatch {
            expected: left.column_dimension(),
            actual: right.row_dimension(),
        });
    }
    Ok(())
}
