//! Visitor traversal in row order and in block (storage) order.

use super::BlockMatrix;
use crate::error::Result;
use crate::matrix::check_sub_matrix_index;
use crate::scalar::Field;
use crate::visitor::{MatrixChangingVisitor, MatrixPreservingVisitor};

impl<T: Field> BlockMatrix<T> {
    /// Visit every entry in row-major order, replacing it with the visitor's result.
    pub fn walk_in_row_order_mut<V>(&mut self, visitor: &mut V) -> T
    where
        V: MatrixChangingVisitor<T> + ?Sized,
    {
        let (rows, columns) = (self.rows(), self.columns());
        visitor.start(rows, columns, 0, rows - 1, 0, columns - 1);
        self.row_order_mut(visitor, 0, rows - 1, 0, columns - 1);
        visitor.end()
    }

    /// Visit every entry in row-major order.
    pub fn walk_in_row_order<V>(&self, visitor: &mut V) -> T
    where
        V: MatrixPreservingVisitor<T> + ?Sized,
    {
        let (rows, columns) = (self.rows(), self.columns());
        visitor.start(rows, columns, 0, rows - 1, 0, columns - 1);
        self.row_order(visitor, 0, rows - 1, 0, columns - 1);
        visitor.end()
    }

    /// Visit an inclusive sub-range in row-major order, replacing entries.
    ///
    /// # Errors
    /// Returns an index error if the range is outside the matrix or inverted;
    /// the visitor is not called in that case.
    pub fn walk_in_row_order_mut_range<V>(
        &mut self,
        visitor: &mut V,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<T>
    where
        V: MatrixChangingVisitor<T> + ?Sized,
    {
        check_sub_matrix_index(self, start_row, end_row, start_column, end_column)?;
        visitor.start(
            self.rows(),
            self.columns(),
            start_row,
            end_row,
            start_column,
            end_column,
        );
        self.row_order_mut(visitor, start_row, end_row, start_column, end_column);
        Ok(visitor.end())
    }

    /// Visit an inclusive sub-range in row-major order.
    pub fn walk_in_row_order_range<V>(
        &self,
        visitor: &mut V,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<T>
    where
        V: MatrixPreservingVisitor<T> + ?Sized,
    {
        check_sub_matrix_index(self, start_row, end_row, start_column, end_column)?;
        visitor.start(
            self.rows(),
            self.columns(),
            start_row,
            end_row,
            start_column,
            end_column,
        );
        self.row_order(visitor, start_row, end_row, start_column, end_column);
        Ok(visitor.end())
    }

    /// Visit every entry block by block, replacing it with the visitor's result.
    pub fn walk_in_optimized_order_mut<V>(&mut self, visitor: &mut V) -> T
    where
        V: MatrixChangingVisitor<T> + ?Sized,
    {
        let (rows, columns) = (self.rows(), self.columns());
        visitor.start(rows, columns, 0, rows - 1, 0, columns - 1);
        self.block_order_mut(visitor, 0, rows - 1, 0, columns - 1);
        visitor.end()
    }

    /// Visit every entry block by block.
    pub fn walk_in_optimized_order<V>(&self, visitor: &mut V) -> T
    where
        V: MatrixPreservingVisitor<T> + ?Sized,
    {
        let (rows, columns) = (self.rows(), self.columns());
        visitor.start(rows, columns, 0, rows - 1, 0, columns - 1);
        self.block_order(visitor, 0, rows - 1, 0, columns - 1);
        visitor.end()
    }

    /// Visit an inclusive sub-range block by block, replacing entries.
    pub fn walk_in_optimized_order_mut_range<V>(
        &mut self,
        visitor: &mut V,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<T>
    where
        V: MatrixChangingVisitor<T> + ?Sized,
    {
        check_sub_matrix_index(self, start_row, end_row, start_column, end_column)?;
        visitor.start(
            self.rows(),
            self.columns(),
            start_row,
            end_row,
            start_column,
            end_column,
        );
        self.block_order_mut(visitor, start_row, end_row, start_column, end_column);
        Ok(visitor.end())
    }

    /// Visit an inclusive sub-range block by block.
    pub fn walk_in_optimized_order_range<V>(
        &self,
        visitor: &mut V,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) -> Result<T>
    where
        V: MatrixPreservingVisitor<T> + ?Sized,
    {
        check_sub_matrix_index(self, start_row, end_row, start_column, end_column)?;
        visitor.start(
            self.rows(),
            self.columns(),
            start_row,
            end_row,
            start_column,
            end_column,
        );
        self.block_order(visitor, start_row, end_row, start_column, end_column);
        Ok(visitor.end())
    }

    fn row_order_mut<V>(
        &mut self,
        visitor: &mut V,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) where
        V: MatrixChangingVisitor<T> + ?Sized,
    {
        let bs = T::BLOCK_SIZE;
        for i_block in start_row / bs..=end_row / bs {
            let p0 = i_block * bs;
            let p_start = start_row.max(p0);
            let p_end = (end_row + 1).min(p0 + bs);
            for p in p_start..p_end {
                for j_block in start_column / bs..=end_column / bs {
                    let j_width = self.geometry.block_width(j_block);
                    let q0 = j_block * bs;
                    let q_start = start_column.max(q0);
                    let q_end = (end_column + 1).min(q0 + bs);
                    let index = self.geometry.block_index(i_block, j_block);
                    let block = &mut self.blocks[index];
                    let mut k = (p - p0) * j_width + q_start - q0;
                    for q in q_start..q_end {
                        block[k] = visitor.visit(p, q, block[k]);
                        k += 1;
                    }
                }
            }
        }
    }

    fn row_order<V>(
        &self,
        visitor: &mut V,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) where
        V: MatrixPreservingVisitor<T> + ?Sized,
    {
        let bs = T::BLOCK_SIZE;
        for i_block in start_row / bs..=end_row / bs {
            let p0 = i_block * bs;
            let p_start = start_row.max(p0);
            let p_end = (end_row + 1).min(p0 + bs);
            for p in p_start..p_end {
                for j_block in start_column / bs..=end_column / bs {
                    let j_width = self.geometry.block_width(j_block);
                    let q0 = j_block * bs;
                    let q_start = start_column.max(q0);
                    let q_end = (end_column + 1).min(q0 + bs);
                    let block = &self.blocks[self.geometry.block_index(i_block, j_block)];
                    let mut k = (p - p0) * j_width + q_start - q0;
                    for q in q_start..q_end {
                        visitor.visit(p, q, block[k]);
                        k += 1;
                    }
                }
            }
        }
    }

    fn block_order_mut<V>(
        &mut self,
        visitor: &mut V,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) where
        V: MatrixChangingVisitor<T> + ?Sized,
    {
        let bs = T::BLOCK_SIZE;
        for i_block in start_row / bs..=end_row / bs {
            let p0 = i_block * bs;
            let p_start = start_row.max(p0);
            let p_end = (end_row + 1).min(p0 + bs);
            for j_block in start_column / bs..=end_column / bs {
                let j_width = self.geometry.block_width(j_block);
                let q0 = j_block * bs;
                let q_start = start_column.max(q0);
                let q_end = (end_column + 1).min(q0 + bs);
                let index = self.geometry.block_index(i_block, j_block);
                let block = &mut self.blocks[index];
                for p in p_start..p_end {
                    let mut k = (p - p0) * j_width + q_start - q0;
                    for q in q_start..q_end {
                        block[k] = visitor.visit(p, q, block[k]);
                        k += 1;
                    }
                }
            }
        }
    }

    fn block_order<V>(
        &self,
        visitor: &mut V,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) where
        V: MatrixPreservingVisitor<T> + ?Sized,
    {
        let bs = T::BLOCK_SIZE;
        for i_block in start_row / bs..=end_row / bs {
            let p0 = i_block * bs;
            let p_start = start_row.max(p0);
            let p_end = (end_row + 1).min(p0 + bs);
            for j_block in start_column / bs..=end_column / bs {
                let j_width = self.geometry.block_width(j_block);
                let q0 = j_block * bs;
                let q_start = start_column.max(q0);
                let q_end = (end_column + 1).min(q0 + bs);
                let block = &self.blocks[self.geometry.block_index(i_block, j_block)];
                for p in p_start..p_end {
                    let mut k = (p - p0) * j_width + q_start - q0;
                    for q in q_start..q_end {
                        visitor.visit(p, q, block[k]);
                        k += 1;
                    }
                }
            }
        }
    }
}
