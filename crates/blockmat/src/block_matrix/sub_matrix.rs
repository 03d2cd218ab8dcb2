//! Sub-matrix extraction and insertion.
//!
//! A sub-range generally does not start on a block boundary. With
//! `row_shift = start_row % BS` and `column_shift = start_column % BS`, each
//! output block overlaps one, two or four source blocks depending on whether
//! `height + row_shift` and `width + column_shift` exceed `BS`.

use super::BlockMatrix;
use crate::error::{IndexKind, MatrixError, Result};
use crate::layout::copy_block_part;
use crate::matrix::{check_column_index, check_row_index, check_sub_matrix_index};
use crate::scalar::Field;

impl<T: Field> BlockMatrix<T> {
    /// Copy the inclusive range `start_row..=end_row × start_column..=end_column`
    /// into a new matrix.
    ///
    /// # Errors
    /// * [`MatrixError::OutOfRange`] if a bound is outside the matrix
    /// * [`MatrixError::InvertedRange`] if an end precedes its start
    pub fn sub_matrix(
        &self,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<BlockMatrix<T>> {
        check_sub_matrix_index(self, start_row, end_row, start_column, end_column)?;

        let bs = T::BLOCK_SIZE;
        let mut out = BlockMatrix::zeros(end_row - start_row + 1, end_column - start_column + 1)?;
        let block_start_row = start_row / bs;
        let row_shift = start_row % bs;
        let block_start_column = start_column / bs;
        let column_shift = start_column % bs;
        let source_columns = self.block_columns();

        for i_block in 0..out.block_rows() {
            let p_block = block_start_row + i_block;
            let i_height = out.geometry.block_height(i_block);
            // rows of the output block that spill into the next source block row
            let heights_excess = (i_height + row_shift).saturating_sub(bs);

            for j_block in 0..out.block_columns() {
                let q_block = block_start_column + j_block;
                let j_width = out.geometry.block_width(j_block);
                let widths_excess = (j_width + column_shift).saturating_sub(bs);

                let index = self.geometry.block_index(p_block, q_block);
                let width = self.geometry.block_width(q_block);
                let out_index = out.geometry.block_index(i_block, j_block);
                let out_block = &mut out.blocks[out_index];

                match (heights_excess > 0, widths_excess > 0) {
                    (true, true) => {
                        let width2 = self.geometry.block_width(q_block + 1);
                        copy_block_part(
                            &self.blocks[index],
                            width,
                            row_shift..bs,
                            column_shift..bs,
                            out_block,
                            j_width,
                            0,
                            0,
                        );
                        copy_block_part(
                            &self.blocks[index + 1],
                            width2,
                            row_shift..bs,
                            0..widths_excess,
                            out_block,
                            j_width,
                            0,
                            j_width - widths_excess,
                        );
                        copy_block_part(
                            &self.blocks[index + source_columns],
                            width,
                            0..heights_excess,
                            column_shift..bs,
                            out_block,
                            j_width,
                            i_height - heights_excess,
                            0,
                        );
                        copy_block_part(
                            &self.blocks[index + source_columns + 1],
                            width2,
                            0..heights_excess,
                            0..widths_excess,
                            out_block,
                            j_width,
                            i_height - heights_excess,
                            j_width - widths_excess,
                        );
                    }
                    (true, false) => {
                        copy_block_part(
                            &self.blocks[index],
                            width,
                            row_shift..bs,
                            column_shift..j_width + column_shift,
                            out_block,
                            j_width,
                            0,
                            0,
                        );
                        copy_block_part(
                            &self.blocks[index + source_columns],
                            width,
                            0..heights_excess,
                            column_shift..j_width + column_shift,
                            out_block,
                            j_width,
                            i_height - heights_excess,
                            0,
                        );
                    }
                    (false, true) => {
                        let width2 = self.geometry.block_width(q_block + 1);
                        copy_block_part(
                            &self.blocks[index],
                            width,
                            row_shift..i_height + row_shift,
                            column_shift..bs,
                            out_block,
                            j_width,
                            0,
                            0,
                        );
                        copy_block_part(
                            &self.blocks[index + 1],
                            width2,
                            row_shift..i_height + row_shift,
                            0..widths_excess,
                            out_block,
                            j_width,
                            0,
                            j_width - widths_excess,
                        );
                    }
                    (false, false) => {
                        copy_block_part(
                            &self.blocks[index],
                            width,
                            row_shift..i_height + row_shift,
                            column_shift..j_width + column_shift,
                            out_block,
                            j_width,
                            0,
                            0,
                        );
                    }
                }
            }
        }
        Ok(out)
    }

    /// Copy the rows `selected_rows` and columns `selected_columns`, in the
    /// given order, into a new matrix.
    ///
    /// # Errors
    /// * [`MatrixError::NoData`] if either index set is empty
    /// * [`MatrixError::OutOfRange`] if an index is outside the matrix
    pub fn select_sub_matrix(
        &self,
        selected_rows: &[usize],
        selected_columns: &[usize],
    ) -> Result<BlockMatrix<T>> {
        self.check_selection(selected_rows, selected_columns)?;
        let mut out = BlockMatrix::zeros(selected_rows.len(), selected_columns.len())?;
        out.fill_from(|p, q| {
            let (index, offset) = self
                .geometry
                .locate(selected_rows[p], selected_columns[q]);
            Ok(self.blocks[index][offset])
        })?;
        Ok(out)
    }

    /// Copy the inclusive range into the top-left corner of `destination`.
    ///
    /// # Errors
    /// * [`MatrixError::OutOfRange`] / [`MatrixError::InvertedRange`] for a bad range
    /// * [`MatrixError::MatrixDimensionMismatch`] if `destination` is too small
    pub fn copy_sub_matrix(
        &self,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
        destination: &mut [Vec<T>],
    ) -> Result<()> {
        check_sub_matrix_index(self, start_row, end_row, start_column, end_column)?;
        let rows_count = end_row - start_row + 1;
        let columns_count = end_column - start_column + 1;
        let too_small = destination.len() < rows_count
            || destination[..rows_count]
                .iter()
                .any(|row| row.len() < columns_count);
        if too_small {
            return Err(MatrixError::matrix_mismatch(
                (rows_count, columns_count),
                (
                    destination.len(),
                    destination.first().map_or(0, Vec::len),
                ),
            ));
        }

        let bs = T::BLOCK_SIZE;
        for i_block in start_row / bs..=end_row / bs {
            let p0 = i_block * bs;
            let p_start = start_row.max(p0);
            let p_end = (end_row + 1).min(p0 + self.geometry.block_height(i_block));
            for j_block in start_column / bs..=end_column / bs {
                let q0 = j_block * bs;
                let q_start = start_column.max(q0);
                let q_end = (end_column + 1).min(q0 + self.geometry.block_width(j_block));
                let j_width = self.geometry.block_width(j_block);
                let block = &self.blocks[self.geometry.block_index(i_block, j_block)];
                for p in p_start..p_end {
                    let src = (p - p0) * j_width + (q_start - q0);
                    let dst_row = &mut destination[p - start_row];
                    dst_row[q_start - start_column..q_end - start_column]
                        .copy_from_slice(&block[src..src + (q_end - q_start)]);
                }
            }
        }
        Ok(())
    }

    /// Overwrite the entries starting at `(row, column)` with `sub`.
    ///
    /// # Errors
    /// * [`MatrixError::NoData`] if `sub` or its first row is empty
    /// * [`MatrixError::DimensionMismatch`] if `sub` is not rectangular
    /// * [`MatrixError::OutOfRange`] if `sub` does not fit inside the matrix
    pub fn set_sub_matrix(&mut self, sub: &[Vec<T>], row: usize, column: usize) -> Result<()> {
        let ref_length = match sub.first() {
            None => {
                return Err(MatrixError::NoData {
                    kind: IndexKind::Row,
                })
            }
            Some(first) if first.is_empty() => {
                return Err(MatrixError::NoData {
                    kind: IndexKind::Column,
                })
            }
            Some(first) => first.len(),
        };
        // start indices first: the end computations below need them in range
        check_row_index(self, row)?;
        check_column_index(self, column)?;
        let end_row = row + sub.len() - 1;
        let end_column = column + ref_length - 1;
        check_sub_matrix_index(self, row, end_row, column, end_column)?;
        for sub_row in sub {
            if sub_row.len() != ref_length {
                return Err(MatrixError::DimensionMismatch {
                    expected: ref_length,
                    actual: sub_row.len(),
                });
            }
        }

        let bs = T::BLOCK_SIZE;
        let block_start_row = row / bs;
        let block_end_row = (end_row + bs) / bs;
        let block_start_column = column / bs;
        let block_end_column = (end_column + bs) / bs;

        for i_block in block_start_row..block_end_row {
            let i_height = self.geometry.block_height(i_block);
            let first_row = i_block * bs;
            let i_start = row.max(first_row);
            let i_end = (end_row + 1).min(first_row + i_height);

            for j_block in block_start_column..block_end_column {
                let j_width = self.geometry.block_width(j_block);
                let first_column = j_block * bs;
                let j_start = column.max(first_column);
                let j_end = (end_column + 1).min(first_column + j_width);
                let j_length = j_end - j_start;

                let index = self.geometry.block_index(i_block, j_block);
                let block = &mut self.blocks[index];
                for i in i_start..i_end {
                    let dst = (i - first_row) * j_width + (j_start - first_column);
                    let src = j_start - column;
                    block[dst..dst + j_length]
                        .copy_from_slice(&sub[i - row][src..src + j_length]);
                }
            }
        }
        Ok(())
    }

    fn check_selection(&self, selected_rows: &[usize], selected_columns: &[usize]) -> Result<()> {
        if selected_rows.is_empty() {
            return Err(MatrixError::NoData {
                kind: IndexKind::Row,
            });
        }
        if selected_columns.is_empty() {
            return Err(MatrixError::NoData {
                kind: IndexKind::Column,
            });
        }
        for &row in selected_rows {
            check_row_index(self, row)?;
        }
        for &column in selected_columns {
            check_column_index(self, column)?;
        }
        Ok(())
    }
}
