//! Cache-blocked dense matrix.
//!
//! The matrix is cut into square blocks of side [`Field::BLOCK_SIZE`], stored
//! in row-major block order, each block a flat row-major buffer:
//!
//! ```text
//!  block(0,0) block(0,1) ... block(0,bc-1)      full blocks are BS × BS
//!  block(1,0) ...                               the last block row is shorter,
//!  ...                                          the last block column narrower
//! ```
//!
//! Arithmetic walks the matrix block by block so that the working set of the
//! inner loops stays inside one or three blocks.
//!
//! # Example
//!
//! ```
//! use blockmat::BlockMatrix;
//!
//! let m = BlockMatrix::from_raw(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
//! let product = m.multiply(&m.transpose()).unwrap();
//! assert_eq!(product.entry(0, 1).unwrap(), 11.0);
//! ```

mod arith;
mod sub_matrix;
mod walk;

use crate::error::{IndexKind, MatrixError, Result};
use crate::layout::{self, BlockGeometry};
use crate::matrix::{check_column_index, check_index, check_row_index, Matrix};
use crate::scalar::Field;
use crate::vector::{ArrayVector, Vector};

/// Dense matrix stored as square blocks.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockMatrix<T> {
    geometry: BlockGeometry,
    blocks: Vec<Vec<T>>,
}

impl<T: Field> BlockMatrix<T> {
    /// Side length of the square blocks
    pub const BLOCK_SIZE: usize = T::BLOCK_SIZE;

    /// Create a zero-filled `rows × columns` matrix.
    ///
    /// # Errors
    /// Returns [`MatrixError::NotStrictlyPositive`] if either dimension is zero.
    pub fn zeros(rows: usize, columns: usize) -> Result<Self> {
        check_dimensions(rows, columns)?;
        Ok(Self {
            geometry: BlockGeometry::new(rows, columns, T::BLOCK_SIZE),
            blocks: layout::create_blocks_layout(rows, columns, T::BLOCK_SIZE),
        })
    }

    /// Create an `n × n` identity matrix.
    pub fn identity(n: usize) -> Result<Self> {
        let mut m = Self::zeros(n, n)?;
        for i in 0..n {
            let (index, offset) = m.geometry.locate(i, i);
            m.blocks[index][offset] = T::one();
        }
        Ok(m)
    }

    /// Create a matrix from row-major raw data.
    ///
    /// # Errors
    /// * [`MatrixError::NoData`] if `raw` is empty
    /// * [`MatrixError::DimensionMismatch`] if `raw` is not rectangular
    pub fn from_raw(raw: &[Vec<T>]) -> Result<Self> {
        let blocks = layout::to_block_layout(raw, T::BLOCK_SIZE)?;
        let rows = raw.len();
        let columns = raw[0].len();
        tracing::debug!(rows, columns, blocks = blocks.len(), "converted raw data to block layout");
        Ok(Self {
            geometry: BlockGeometry::new(rows, columns, T::BLOCK_SIZE),
            blocks,
        })
    }

    /// Create a matrix taking ownership of data already in block layout.
    ///
    /// No element is copied.
    ///
    /// # Errors
    /// * [`MatrixError::NotStrictlyPositive`] if either dimension is zero
    /// * [`MatrixError::DimensionMismatch`] if the number of blocks is wrong
    /// * [`MatrixError::BlockDimensionMismatch`] naming the first block whose
    ///   length is not `block_height * block_width`
    pub fn from_blocks(rows: usize, columns: usize, blocks: Vec<Vec<T>>) -> Result<Self> {
        check_dimensions(rows, columns)?;
        let geometry = BlockGeometry::new(rows, columns, T::BLOCK_SIZE);
        check_blocks(&geometry, &blocks)?;
        tracing::debug!(rows, columns, blocks = blocks.len(), "adopted block layout");
        Ok(Self { geometry, blocks })
    }

    /// Create a matrix from a deep copy of data already in block layout.
    ///
    /// # Errors
    /// Same as [`BlockMatrix::from_blocks`].
    pub fn from_block_slices(rows: usize, columns: usize, blocks: &[Vec<T>]) -> Result<Self> {
        check_dimensions(rows, columns)?;
        let geometry = BlockGeometry::new(rows, columns, T::BLOCK_SIZE);
        check_blocks(&geometry, blocks)?;
        Ok(Self {
            geometry,
            blocks: blocks.to_vec(),
        })
    }

    /// Copy any matrix into block layout.
    pub fn from_matrix<M: Matrix<T> + ?Sized>(m: &M) -> Result<Self> {
        if let Some(block) = m.as_block_matrix() {
            return Ok(block.clone());
        }
        let mut out = Self::zeros(m.row_dimension(), m.column_dimension())?;
        out.fill_from(|row, column| m.entry(row, column))?;
        Ok(out)
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.geometry.rows()
    }

    /// Number of columns
    #[inline]
    pub fn columns(&self) -> usize {
        self.geometry.columns()
    }

    /// Block partition of this matrix
    #[inline]
    pub fn geometry(&self) -> &BlockGeometry {
        &self.geometry
    }

    /// Number of block rows
    #[inline]
    pub fn block_rows(&self) -> usize {
        self.geometry.block_rows()
    }

    /// Number of block columns
    #[inline]
    pub fn block_columns(&self) -> usize {
        self.geometry.block_columns()
    }

    /// Row-major contents of block `(block_row, block_column)`.
    ///
    /// # Errors
    /// Returns [`MatrixError::OutOfRange`] if the block coordinates are outside
    /// the block grid.
    pub fn block(&self, block_row: usize, block_column: usize) -> Result<&[T]> {
        check_index(IndexKind::Row, block_row, self.block_rows())?;
        check_index(IndexKind::Column, block_column, self.block_columns())?;
        Ok(&self.blocks[self.geometry.block_index(block_row, block_column)])
    }

    /// All blocks in row-major block order
    pub fn blocks(&self) -> &[Vec<T>] {
        &self.blocks
    }

    /// Consume the matrix and return its blocks
    pub fn into_blocks(self) -> Vec<Vec<T>> {
        self.blocks
    }

    /// Export the entries as a row-major 2D array
    pub fn data(&self) -> Vec<Vec<T>> {
        layout::to_raw_layout(&self.blocks, self.rows(), self.columns(), T::BLOCK_SIZE)
    }

    /// Entry at `(row, column)`.
    ///
    /// # Errors
    /// Returns [`MatrixError::OutOfRange`] if the position is outside the matrix.
    pub fn entry(&self, row: usize, column: usize) -> Result<T> {
        let (index, offset) = self.checked_locate(row, column)?;
        Ok(self.blocks[index][offset])
    }

    /// Set the entry at `(row, column)`.
    pub fn set_entry(&mut self, row: usize, column: usize, value: T) -> Result<()> {
        let (index, offset) = self.checked_locate(row, column)?;
        self.blocks[index][offset] = value;
        Ok(())
    }

    /// Add `increment` to the entry at `(row, column)`.
    pub fn add_to_entry(&mut self, row: usize, column: usize, increment: T) -> Result<()> {
        let (index, offset) = self.checked_locate(row, column)?;
        let entry = &mut self.blocks[index][offset];
        *entry = *entry + increment;
        Ok(())
    }

    /// Multiply the entry at `(row, column)` by `factor`.
    pub fn multiply_entry(&mut self, row: usize, column: usize, factor: T) -> Result<()> {
        let (index, offset) = self.checked_locate(row, column)?;
        let entry = &mut self.blocks[index][offset];
        *entry = *entry * factor;
        Ok(())
    }

    /// Entries of row `row`, left to right.
    pub fn row(&self, row: usize) -> Result<Vec<T>> {
        check_row_index(self, row)?;
        let bs = T::BLOCK_SIZE;
        let i_block = row / bs;
        let i_row = row - i_block * bs;
        let mut out = Vec::with_capacity(self.columns());
        for j_block in 0..self.block_columns() {
            let j_width = self.geometry.block_width(j_block);
            let block = &self.blocks[self.geometry.block_index(i_block, j_block)];
            out.extend_from_slice(&block[i_row * j_width..(i_row + 1) * j_width]);
        }
        Ok(out)
    }

    /// Replace row `row`.
    ///
    /// # Errors
    /// * [`MatrixError::OutOfRange`] if `row` is outside the matrix
    /// * [`MatrixError::MatrixDimensionMismatch`] if `values.len() != columns`
    pub fn set_row(&mut self, row: usize, values: &[T]) -> Result<()> {
        check_row_index(self, row)?;
        if values.len() != self.columns() {
            return Err(MatrixError::matrix_mismatch(
                (1, self.columns()),
                (1, values.len()),
            ));
        }
        let bs = T::BLOCK_SIZE;
        let i_block = row / bs;
        let i_row = row - i_block * bs;
        let mut in_index = 0;
        for j_block in 0..self.block_columns() {
            let j_width = self.geometry.block_width(j_block);
            let index = self.geometry.block_index(i_block, j_block);
            self.blocks[index][i_row * j_width..(i_row + 1) * j_width]
                .copy_from_slice(&values[in_index..in_index + j_width]);
            in_index += j_width;
        }
        Ok(())
    }

    /// Entries of column `column`, top to bottom.
    pub fn column(&self, column: usize) -> Result<Vec<T>> {
        check_column_index(self, column)?;
        let bs = T::BLOCK_SIZE;
        let j_block = column / bs;
        let j_column = column - j_block * bs;
        let j_width = self.geometry.block_width(j_block);
        let mut out = Vec::with_capacity(self.rows());
        for i_block in 0..self.block_rows() {
            let i_height = self.geometry.block_height(i_block);
            let block = &self.blocks[self.geometry.block_index(i_block, j_block)];
            out.extend((0..i_height).map(|i| block[i * j_width + j_column]));
        }
        Ok(out)
    }

    /// Replace column `column`.
    ///
    /// # Errors
    /// * [`MatrixError::OutOfRange`] if `column` is outside the matrix
    /// * [`MatrixError::MatrixDimensionMismatch`] if `values.len() != rows`
    pub fn set_column(&mut self, column: usize, values: &[T]) -> Result<()> {
        check_column_index(self, column)?;
        if values.len() != self.rows() {
            return Err(MatrixError::matrix_mismatch(
                (self.rows(), 1),
                (values.len(), 1),
            ));
        }
        let bs = T::BLOCK_SIZE;
        let j_block = column / bs;
        let j_column = column - j_block * bs;
        let j_width = self.geometry.block_width(j_block);
        let mut in_index = 0;
        for i_block in 0..self.block_rows() {
            let i_height = self.geometry.block_height(i_block);
            let index = self.geometry.block_index(i_block, j_block);
            let block = &mut self.blocks[index];
            for i in 0..i_height {
                block[i * j_width + j_column] = values[in_index];
                in_index += 1;
            }
        }
        Ok(())
    }

    /// Row `row` as a `1 × columns` matrix.
    pub fn row_matrix(&self, row: usize) -> Result<BlockMatrix<T>> {
        check_row_index(self, row)?;
        let bs = T::BLOCK_SIZE;
        let i_block = row / bs;
        let i_row = row - i_block * bs;
        // same column partition, one block row of height 1
        let mut out = BlockMatrix::zeros(1, self.columns())?;
        for j_block in 0..self.block_columns() {
            let j_width = self.geometry.block_width(j_block);
            let block = &self.blocks[self.geometry.block_index(i_block, j_block)];
            out.blocks[j_block].copy_from_slice(&block[i_row * j_width..(i_row + 1) * j_width]);
        }
        Ok(out)
    }

    /// Replace row `row` with the single row of `m`.
    ///
    /// # Errors
    /// Returns [`MatrixError::MatrixDimensionMismatch`] unless `m` is `1 × columns`.
    pub fn set_row_matrix<M: Matrix<T> + ?Sized>(&mut self, row: usize, m: &M) -> Result<()> {
        check_row_index(self, row)?;
        if m.row_dimension() != 1 || m.column_dimension() != self.columns() {
            return Err(MatrixError::matrix_mismatch(
                (1, self.columns()),
                (m.row_dimension(), m.column_dimension()),
            ));
        }
        match m.as_block_matrix() {
            Some(source) => {
                tracing::trace!("set_row_matrix: block path");
                let bs = T::BLOCK_SIZE;
                let i_block = row / bs;
                let i_row = row - i_block * bs;
                for j_block in 0..self.block_columns() {
                    let j_width = self.geometry.block_width(j_block);
                    let index = self.geometry.block_index(i_block, j_block);
                    self.blocks[index][i_row * j_width..(i_row + 1) * j_width]
                        .copy_from_slice(&source.blocks[j_block]);
                }
            }
            None => {
                tracing::trace!("set_row_matrix: entry path");
                for column in 0..self.columns() {
                    let value = m.entry(0, column)?;
                    let (index, offset) = self.geometry.locate(row, column);
                    self.blocks[index][offset] = value;
                }
            }
        }
        Ok(())
    }

    /// Column `column` as a `rows × 1` matrix.
    pub fn column_matrix(&self, column: usize) -> Result<BlockMatrix<T>> {
        check_column_index(self, column)?;
        let bs = T::BLOCK_SIZE;
        let j_block = column / bs;
        let j_column = column - j_block * bs;
        let j_width = self.geometry.block_width(j_block);
        // same row partition, one block column of width 1
        let mut out = BlockMatrix::zeros(self.rows(), 1)?;
        for i_block in 0..self.block_rows() {
            let i_height = self.geometry.block_height(i_block);
            let block = &self.blocks[self.geometry.block_index(i_block, j_block)];
            let out_block = &mut out.blocks[i_block];
            for (i, out_value) in out_block.iter_mut().enumerate().take(i_height) {
                *out_value = block[i * j_width + j_column];
            }
        }
        Ok(out)
    }

    /// Replace column `column` with the single column of `m`.
    ///
    /// # Errors
    /// Returns [`MatrixError::MatrixDimensionMismatch`] unless `m` is `rows × 1`.
    pub fn set_column_matrix<M: Matrix<T> + ?Sized>(
        &mut self,
        column: usize,
        m: &M,
    ) -> Result<()> {
        check_column_index(self, column)?;
        if m.row_dimension() != self.rows() || m.column_dimension() != 1 {
            return Err(MatrixError::matrix_mismatch(
                (self.rows(), 1),
                (m.row_dimension(), m.column_dimension()),
            ));
        }
        match m.as_block_matrix() {
            Some(source) => {
                tracing::trace!("set_column_matrix: block path");
                let bs = T::BLOCK_SIZE;
                let j_block = column / bs;
                let j_column = column - j_block * bs;
                let j_width = self.geometry.block_width(j_block);
                for i_block in 0..self.block_rows() {
                    let index = self.geometry.block_index(i_block, j_block);
                    let block = &mut self.blocks[index];
                    for (i, &value) in source.blocks[i_block].iter().enumerate() {
                        block[i * j_width + j_column] = value;
                    }
                }
            }
            None => {
                tracing::trace!("set_column_matrix: entry path");
                for row in 0..self.rows() {
                    let value = m.entry(row, 0)?;
                    let (index, offset) = self.geometry.locate(row, column);
                    self.blocks[index][offset] = value;
                }
            }
        }
        Ok(())
    }

    /// Row `row` as a vector.
    pub fn row_vector(&self, row: usize) -> Result<ArrayVector<T>> {
        self.row(row).map(ArrayVector::from_vec)
    }

    /// Replace row `row` with the entries of `v`.
    ///
    /// # Errors
    /// Returns [`MatrixError::MatrixDimensionMismatch`] unless `v` has `columns` entries.
    pub fn set_row_vector<V: Vector<T> + ?Sized>(&mut self, row: usize, v: &V) -> Result<()> {
        check_row_index(self, row)?;
        if v.dimension() != self.columns() {
            return Err(MatrixError::matrix_mismatch(
                (1, self.columns()),
                (1, v.dimension()),
            ));
        }
        match v.as_slice() {
            Some(values) => self.set_row(row, values),
            None => {
                for column in 0..self.columns() {
                    let value = v.entry(column)?;
                    let (index, offset) = self.geometry.locate(row, column);
                    self.blocks[index][offset] = value;
                }
                Ok(())
            }
        }
    }

    /// Column `column` as a vector.
    pub fn column_vector(&self, column: usize) -> Result<ArrayVector<T>> {
        self.column(column).map(ArrayVector::from_vec)
    }

    /// Replace column `column` with the entries of `v`.
    ///
    /// # Errors
    /// Returns [`MatrixError::MatrixDimensionMismatch`] unless `v` has `rows` entries.
    pub fn set_column_vector<V: Vector<T> + ?Sized>(
        &mut self,
        column: usize,
        v: &V,
    ) -> Result<()> {
        check_column_index(self, column)?;
        if v.dimension() != self.rows() {
            return Err(MatrixError::matrix_mismatch(
                (self.rows(), 1),
                (v.dimension(), 1),
            ));
        }
        match v.as_slice() {
            Some(values) => self.set_column(column, values),
            None => {
                for row in 0..self.rows() {
                    let value = v.entry(row)?;
                    let (index, offset) = self.geometry.locate(row, column);
                    self.blocks[index][offset] = value;
                }
                Ok(())
            }
        }
    }

    fn checked_locate(&self, row: usize, column: usize) -> Result<(usize, usize)> {
        check_row_index(self, row)?;
        check_column_index(self, column)?;
        Ok(self.geometry.locate(row, column))
    }

    /// Fill every entry from `f(row, column)`, block by block.
    fn fill_from<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(usize, usize) -> Result<T>,
    {
        let bs = T::BLOCK_SIZE;
        for i_block in 0..self.block_rows() {
            let p_start = i_block * bs;
            let p_end = p_start + self.geometry.block_height(i_block);
            for j_block in 0..self.block_columns() {
                let q_start = j_block * bs;
                let q_end = q_start + self.geometry.block_width(j_block);
                let index = self.geometry.block_index(i_block, j_block);
                let block = &mut self.blocks[index];
                let mut k = 0;
                for p in p_start..p_end {
                    for q in q_start..q_end {
                        block[k] = f(p, q)?;
                        k += 1;
                    }
                }
            }
        }
        Ok(())
    }
}

impl<T: Field> Matrix<T> for BlockMatrix<T> {
    fn row_dimension(&self) -> usize {
        self.rows()
    }

    fn column_dimension(&self) -> usize {
        self.columns()
    }

    fn entry(&self, row: usize, column: usize) -> Result<T> {
        BlockMatrix::entry(self, row, column)
    }

    fn as_block_matrix(&self) -> Option<&BlockMatrix<T>> {
        Some(self)
    }
}

fn check_dimensions(rows: usize, columns: usize) -> Result<()> {
    if rows == 0 {
        return Err(MatrixError::NotStrictlyPositive {
            kind: IndexKind::Row,
            value: rows,
        });
    }
    if columns == 0 {
        return Err(MatrixError::NotStrictlyPositive {
            kind: IndexKind::Column,
            value: columns,
        });
    }
    Ok(())
}

fn check_blocks<T>(geometry: &BlockGeometry, blocks: &[Vec<T>]) -> Result<()> {
    if blocks.len() != geometry.num_blocks() {
        return Err(MatrixError::DimensionMismatch {
            expected: geometry.num_blocks(),
            actual: blocks.len(),
        });
    }
    for i_block in 0..geometry.block_rows() {
        for j_block in 0..geometry.block_columns() {
            let expected = geometry.block_len(i_block, j_block);
            let actual = blocks[geometry.block_index(i_block, j_block)].len();
            if actual != expected {
                return Err(MatrixError::BlockDimensionMismatch {
                    block_row: i_block,
                    block_column: j_block,
                    expected,
                    actual,
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_tests;
    use crate::matrix::DenseMatrix;
    use num_complex::Complex64;

    fn counting_raw<T: Field>(rows: usize, columns: usize) -> Vec<Vec<T>> {
        (0..rows)
            .map(|i| {
                (0..columns)
                    .map(|j| T::from_i64((i * 1000 + j) as i64))
                    .collect()
            })
            .collect()
    }

    /// Vector exposing no contiguous view, forcing the per-entry path.
    struct EntryOnly<T>(Vec<T>);

    impl<T: Field> Vector<T> for EntryOnly<T> {
        fn dimension(&self) -> usize {
            self.0.len()
        }

        fn entry(&self, index: usize) -> Result<T> {
            check_index(IndexKind::Entry, index, self.0.len())?;
            Ok(self.0[index])
        }

        fn set_entry(&mut self, index: usize, value: T) -> Result<()> {
            check_index(IndexKind::Entry, index, self.0.len())?;
            self.0[index] = value;
            Ok(())
        }

        fn to_vec(&self) -> Vec<T> {
            self.0.clone()
        }
    }

    #[test]
    fn test_layout_100_by_60() {
        let raw = counting_raw::<f64>(100, 60);
        let m = BlockMatrix::from_raw(&raw).unwrap();

        assert_eq!(BlockMatrix::<f64>::BLOCK_SIZE, 52);
        assert_eq!(m.block_rows(), 2);
        assert_eq!(m.block_columns(), 2);
        let lengths: Vec<usize> = m.blocks().iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![2704, 416, 2496, 384]);

        // (60, 55) lives in block (1, 1), local (8, 3), block width 8
        assert_eq!(m.block(1, 1).unwrap()[8 * 8 + 3], 60055.0);
        for (i, row) in raw.iter().enumerate() {
            for (j, &value) in row.iter().enumerate() {
                assert_eq!(m.entry(i, j).unwrap(), value);
            }
        }
        assert_eq!(m.data(), raw);
    }

    #[test]
    fn test_block_accessor_bounds() {
        let m: BlockMatrix<f64> = BlockMatrix::zeros(60, 10).unwrap();
        assert_eq!(m.block(1, 0).unwrap().len(), 8 * 10);
        assert_eq!(
            m.block(2, 0).unwrap_err(),
            MatrixError::OutOfRange {
                kind: IndexKind::Row,
                index: 2,
                min: 0,
                max: 1,
            }
        );
        assert_eq!(
            m.block(0, 1).unwrap_err(),
            MatrixError::OutOfRange {
                kind: IndexKind::Column,
                index: 1,
                min: 0,
                max: 0,
            }
        );
    }

    #[test]
    fn test_complex_block_size() {
        assert_eq!(BlockMatrix::<Complex64>::BLOCK_SIZE, 36);
        let m: BlockMatrix<Complex64> = BlockMatrix::zeros(37, 72).unwrap();
        assert_eq!(m.block_rows(), 2);
        assert_eq!(m.block_columns(), 2);
        assert_eq!(m.block(1, 1).unwrap().len(), 36);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert_eq!(
            BlockMatrix::<f64>::zeros(0, 3).unwrap_err(),
            MatrixError::NotStrictlyPositive {
                kind: IndexKind::Row,
                value: 0,
            }
        );
        assert_eq!(
            BlockMatrix::<f64>::zeros(3, 0).unwrap_err(),
            MatrixError::NotStrictlyPositive {
                kind: IndexKind::Column,
                value: 0,
            }
        );
        assert_eq!(
            BlockMatrix::<f64>::from_raw(&[]).unwrap_err(),
            MatrixError::NoData { kind: IndexKind::Row }
        );
    }

    #[test]
    fn test_from_raw_rejects_ragged_rows() {
        let err = BlockMatrix::from_raw(&[vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(
            err,
            MatrixError::DimensionMismatch {
                expected: 2,
                actual: 1,
            }
        );
    }

    fn test_entry_access_generic<T: Field>() {
        let bs = T::BLOCK_SIZE;
        let (rows, columns) = (bs + 3, 2 * bs + 1);
        let mut m: BlockMatrix<T> = BlockMatrix::zeros(rows, columns).unwrap();

        let positions = [
            (0, 0),
            (bs - 1, bs - 1),
            (bs, bs),
            (rows - 1, columns - 1),
            (2, 2 * bs),
        ];
        for (n, &(i, j)) in positions.iter().enumerate() {
            m.set_entry(i, j, T::from_i64(n as i64 + 1)).unwrap();
        }
        for (n, &(i, j)) in positions.iter().enumerate() {
            assert_eq!(m.entry(i, j).unwrap(), T::from_i64(n as i64 + 1));
        }

        m.add_to_entry(bs, bs, T::from_i64(10)).unwrap();
        assert_eq!(m.entry(bs, bs).unwrap(), T::from_i64(13));
        m.multiply_entry(bs, bs, T::from_i64(2)).unwrap();
        assert_eq!(m.entry(bs, bs).unwrap(), T::from_i64(26));

        assert_eq!(
            m.entry(rows, 0).unwrap_err(),
            MatrixError::OutOfRange {
                kind: IndexKind::Row,
                index: rows,
                min: 0,
                max: rows - 1,
            }
        );
        assert_eq!(
            m.set_entry(0, columns, T::one()).unwrap_err(),
            MatrixError::OutOfRange {
                kind: IndexKind::Column,
                index: columns,
                min: 0,
                max: columns - 1,
            }
        );
        assert!(m.add_to_entry(rows, columns, T::one()).is_err());
        assert!(m.multiply_entry(rows, 0, T::one()).is_err());
    }

    field_tests!(test_entry_access, test_entry_access_generic);

    #[test]
    fn test_from_blocks_adopts_and_validates() {
        let source = BlockMatrix::from_raw(&counting_raw::<f64>(60, 55)).unwrap();
        let blocks = source.clone().into_blocks();

        let adopted = BlockMatrix::from_blocks(60, 55, blocks.clone()).unwrap();
        assert_eq!(adopted, source);
        let copied = BlockMatrix::from_block_slices(60, 55, &blocks).unwrap();
        assert_eq!(copied, source);

        assert_eq!(
            BlockMatrix::from_blocks(60, 55, blocks[..3].to_vec()).unwrap_err(),
            MatrixError::DimensionMismatch {
                expected: 4,
                actual: 3,
            }
        );

        let mut short = blocks.clone();
        short[2].pop();
        assert_eq!(
            BlockMatrix::from_block_slices(60, 55, &short).unwrap_err(),
            MatrixError::BlockDimensionMismatch {
                block_row: 1,
                block_column: 0,
                expected: 8 * 52,
                actual: 8 * 52 - 1,
            }
        );
        assert!(BlockMatrix::from_blocks(0, 55, blocks).is_err());
    }

    #[test]
    fn test_identity_and_from_matrix() {
        let id: BlockMatrix<f64> = BlockMatrix::identity(60).unwrap();
        for i in 0..60 {
            for j in 0..60 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_eq!(id.entry(i, j).unwrap(), expected);
            }
        }

        let dense = DenseMatrix::from_vec2d(counting_raw::<f64>(7, 58)).unwrap();
        let m = BlockMatrix::from_matrix(&dense).unwrap();
        assert_eq!(m.data(), counting_raw::<f64>(7, 58));
        assert_eq!(BlockMatrix::from_matrix(&m).unwrap(), m);
    }

    fn test_rows_and_columns_generic<T: Field>() {
        let bs = T::BLOCK_SIZE;
        let (rows, columns) = (2 * bs + 5, bs + 7);
        let raw = counting_raw::<T>(rows, columns);
        let mut m = BlockMatrix::from_raw(&raw).unwrap();

        for &i in &[0, bs - 1, bs, rows - 1] {
            assert_eq!(m.row(i).unwrap(), raw[i]);
            assert_eq!(m.row_vector(i).unwrap().into_vec(), raw[i]);
            assert_eq!(m.row_matrix(i).unwrap().data(), vec![raw[i].clone()]);
        }
        for &j in &[0, bs - 1, bs, columns - 1] {
            let expected: Vec<T> = raw.iter().map(|row| row[j]).collect();
            assert_eq!(m.column(j).unwrap(), expected);
            assert_eq!(m.column_vector(j).unwrap().into_vec(), expected);
            let as_matrix: Vec<T> = m
                .column_matrix(j)
                .unwrap()
                .data()
                .into_iter()
                .map(|row| row[0])
                .collect();
            assert_eq!(as_matrix, expected);
        }

        // a row set then read back through the column view
        let new_row: Vec<T> = (0..columns).map(|j| T::from_i64(-(j as i64))).collect();
        m.set_row(bs + 1, &new_row).unwrap();
        assert_eq!(m.row(bs + 1).unwrap(), new_row);
        assert_eq!(m.column(bs).unwrap()[bs + 1], T::from_i64(-(bs as i64)));

        let new_column: Vec<T> = (0..rows).map(|i| T::from_i64(7 * i as i64)).collect();
        m.set_column(bs + 2, &new_column).unwrap();
        assert_eq!(m.column(bs + 2).unwrap(), new_column);
        assert_eq!(m.row(rows - 1).unwrap()[bs + 2], T::from_i64(7 * (rows - 1) as i64));

        assert_eq!(
            m.set_row(0, &new_column).unwrap_err(),
            MatrixError::MatrixDimensionMismatch {
                expected_rows: 1,
                expected_columns: columns,
                actual_rows: 1,
                actual_columns: rows,
            }
        );
        assert!(m.set_column(0, &new_row).is_err());
        assert!(m.row(rows).is_err());
        assert!(m.column(columns).is_err());
    }

    field_tests!(test_rows_and_columns, test_rows_and_columns_generic);

    #[test]
    fn test_set_row_and_column_matrix_both_paths() {
        let raw = counting_raw::<f64>(70, 60);
        let mut block_target = BlockMatrix::from_raw(&raw).unwrap();
        let mut dense_target = block_target.clone();

        let row: Vec<f64> = (0..60).map(|j| 0.5 * j as f64).collect();
        let row_block = BlockMatrix::from_raw(&[row.clone()]).unwrap();
        let row_dense = DenseMatrix::from_vec(1, 60, row.clone()).unwrap();
        block_target.set_row_matrix(55, &row_block).unwrap();
        dense_target.set_row_matrix(55, &row_dense).unwrap();
        assert_eq!(block_target.row(55).unwrap(), row);
        assert_eq!(block_target, dense_target);

        let column: Vec<f64> = (0..70).map(|i| -(i as f64)).collect();
        let column_block =
            BlockMatrix::from_raw(&column.iter().map(|&x| vec![x]).collect::<Vec<_>>()).unwrap();
        let column_dense = DenseMatrix::from_vec(70, 1, column.clone()).unwrap();
        block_target.set_column_matrix(53, &column_block).unwrap();
        dense_target.set_column_matrix(53, &column_dense).unwrap();
        assert_eq!(block_target.column(53).unwrap(), column);
        assert_eq!(block_target, dense_target);

        // untouched rows keep their values
        assert_eq!(block_target.entry(54, 0).unwrap(), 54000.0);

        assert_eq!(
            block_target.set_row_matrix(0, &column_dense).unwrap_err(),
            MatrixError::MatrixDimensionMismatch {
                expected_rows: 1,
                expected_columns: 60,
                actual_rows: 70,
                actual_columns: 1,
            }
        );
        assert!(block_target.set_column_matrix(0, &row_block).is_err());
        assert!(block_target.set_row_matrix(70, &row_block).is_err());
    }

    #[test]
    fn test_set_row_and_column_vector_both_paths() {
        let mut slice_target: BlockMatrix<f64> = BlockMatrix::zeros(57, 54).unwrap();
        let mut entry_target = slice_target.clone();

        let row: Vec<f64> = (0..54).map(|j| j as f64 + 1.0).collect();
        slice_target
            .set_row_vector(53, &ArrayVector::from_vec(row.clone()))
            .unwrap();
        entry_target
            .set_row_vector(53, &EntryOnly(row.clone()))
            .unwrap();
        assert_eq!(slice_target, entry_target);
        assert_eq!(slice_target.row(53).unwrap(), row);

        let column: Vec<f64> = (0..57).map(|i| 2.0 * i as f64).collect();
        slice_target
            .set_column_vector(52, &ArrayVector::from_vec(column.clone()))
            .unwrap();
        entry_target
            .set_column_vector(52, &EntryOnly(column.clone()))
            .unwrap();
        assert_eq!(slice_target, entry_target);
        assert_eq!(slice_target.column(52).unwrap(), column);

        assert!(slice_target
            .set_row_vector(0, &ArrayVector::from_vec(column.clone()))
            .is_err());
        assert!(entry_target
            .set_column_vector(0, &EntryOnly(row))
            .is_err());
    }

    #[test]
    fn test_matrix_trait_view() {
        let m = BlockMatrix::from_raw(&counting_raw::<f64>(3, 4)).unwrap();
        let view: &dyn Matrix<f64> = &m;
        assert_eq!(view.row_dimension(), 3);
        assert_eq!(view.column_dimension(), 4);
        assert!(!view.is_square());
        assert_eq!(view.entry(2, 3).unwrap(), 2003.0);
        assert!(view.as_block_matrix().is_some());
    }
}
