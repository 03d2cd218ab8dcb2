//! Block geometry and layout conversion.
//!
//! A matrix with `rows × columns` entries is cut into square blocks of side
//! `block_size`. Blocks in the last block row are `rows - (block_rows - 1) *
//! block_size` high and blocks in the last block column are narrowed the same
//! way; every other block is full. Blocks are stored in row-major block order
//! and each block is a flat row-major buffer.
//!
//! The functions here are pure. [`BlockGeometry`] bundles the numbers a matrix
//! needs to turn `(row, column)` into `(block, offset)`.

use num_traits::Zero;

use crate::error::{IndexKind, MatrixError, Result};

/// Number of blocks needed to cover `dimension` entries: `ceil(dimension / block_size)`.
#[inline]
pub fn block_count(dimension: usize, block_size: usize) -> usize {
    debug_assert!(block_size > 0);
    dimension.div_ceil(block_size)
}

/// Height of block row `block_row`.
#[inline]
pub fn block_height(block_row: usize, rows: usize, block_rows: usize, block_size: usize) -> usize {
    if block_row + 1 == block_rows {
        rows - block_row * block_size
    } else {
        block_size
    }
}

/// Width of block column `block_column`.
#[inline]
pub fn block_width(
    block_column: usize,
    columns: usize,
    block_columns: usize,
    block_size: usize,
) -> usize {
    block_height(block_column, columns, block_columns, block_size)
}

/// Shape of the block partition of a `rows × columns` matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockGeometry {
    rows: usize,
    columns: usize,
    block_size: usize,
    block_rows: usize,
    block_columns: usize,
}

impl BlockGeometry {
    /// Create the geometry of a `rows × columns` matrix cut into `block_size` blocks.
    pub fn new(rows: usize, columns: usize, block_size: usize) -> Self {
        Self {
            rows,
            columns,
            block_size,
            block_rows: block_count(rows, block_size),
            block_columns: block_count(columns, block_size),
        }
    }

    /// Number of rows
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Side length of a full block
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of block rows
    #[inline]
    pub fn block_rows(&self) -> usize {
        self.block_rows
    }

    /// Number of block columns
    #[inline]
    pub fn block_columns(&self) -> usize {
        self.block_columns
    }

    /// Total number of blocks
    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.block_rows * self.block_columns
    }

    /// Height of the blocks in block row `block_row`
    #[inline]
    pub fn block_height(&self, block_row: usize) -> usize {
        block_height(block_row, self.rows, self.block_rows, self.block_size)
    }

    /// Width of the blocks in block column `block_column`
    #[inline]
    pub fn block_width(&self, block_column: usize) -> usize {
        block_width(block_column, self.columns, self.block_columns, self.block_size)
    }

    /// Number of elements in block `(block_row, block_column)`
    #[inline]
    pub fn block_len(&self, block_row: usize, block_column: usize) -> usize {
        self.block_height(block_row) * self.block_width(block_column)
    }

    /// Storage position of block `(block_row, block_column)`
    #[inline]
    pub fn block_index(&self, block_row: usize, block_column: usize) -> usize {
        block_row * self.block_columns + block_column
    }

    /// Map a logical `(row, column)` to `(storage position, offset in block)`.
    ///
    /// The caller is responsible for bounds checking.
    #[inline]
    pub fn locate(&self, row: usize, column: usize) -> (usize, usize) {
        let block_row = row / self.block_size;
        let block_column = column / self.block_size;
        let offset = (row - block_row * self.block_size) * self.block_width(block_column)
            + (column - block_column * self.block_size);
        (self.block_index(block_row, block_column), offset)
    }

    /// Geometry of the transposed matrix
    pub fn transposed(&self) -> Self {
        Self::new(self.columns, self.rows, self.block_size)
    }
}

/// Allocate zero-filled blocks for a `rows × columns` matrix.
pub fn create_blocks_layout<T: Zero + Clone>(
    rows: usize,
    columns: usize,
    block_size: usize,
) -> Vec<Vec<T>> {
    let geometry = BlockGeometry::new(rows, columns, block_size);
    let mut blocks = Vec::with_capacity(geometry.num_blocks());
    for i_block in 0..geometry.block_rows() {
        for j_block in 0..geometry.block_columns() {
            blocks.push(vec![T::zero(); geometry.block_len(i_block, j_block)]);
        }
    }
    blocks
}

/// Convert a row-major 2D array into block layout.
///
/// The column count is taken from `raw[0]`; every other row must have the same
/// length.
///
/// # Errors
/// * [`MatrixError::NoData`] if `raw` or its first row is empty
/// * [`MatrixError::DimensionMismatch`] if `raw` is ragged
pub fn to_block_layout<T: Copy>(raw: &[Vec<T>], block_size: usize) -> Result<Vec<Vec<T>>> {
    let rows = raw.len();
    if rows == 0 {
        return Err(MatrixError::NoData {
            kind: IndexKind::Row,
        });
    }
    let columns = raw[0].len();
    if columns == 0 {
        return Err(MatrixError::NoData {
            kind: IndexKind::Column,
        });
    }
    for row in raw {
        if row.len() != columns {
            return Err(MatrixError::DimensionMismatch {
                expected: columns,
                actual: row.len(),
            });
        }
    }

    let geometry = BlockGeometry::new(rows, columns, block_size);
    let mut blocks = Vec::with_capacity(geometry.num_blocks());
    for i_block in 0..geometry.block_rows() {
        let p_start = i_block * block_size;
        let p_end = p_start + geometry.block_height(i_block);
        for j_block in 0..geometry.block_columns() {
            let q_start = j_block * block_size;
            let q_end = q_start + geometry.block_width(j_block);
            let mut block = Vec::with_capacity(geometry.block_len(i_block, j_block));
            for raw_row in &raw[p_start..p_end] {
                block.extend_from_slice(&raw_row[q_start..q_end]);
            }
            blocks.push(block);
        }
    }
    Ok(blocks)
}

/// Convert block layout back into a row-major 2D array.
///
/// `blocks` must satisfy the layout invariant for `rows × columns`.
pub fn to_raw_layout<T: Copy>(
    blocks: &[Vec<T>],
    rows: usize,
    columns: usize,
    block_size: usize,
) -> Vec<Vec<T>> {
    let geometry = BlockGeometry::new(rows, columns, block_size);
    let mut raw = Vec::with_capacity(rows);
    for i_block in 0..geometry.block_rows() {
        for p in 0..geometry.block_height(i_block) {
            let mut raw_row = Vec::with_capacity(columns);
            for j_block in 0..geometry.block_columns() {
                let width = geometry.block_width(j_block);
                let block = &blocks[geometry.block_index(i_block, j_block)];
                raw_row.extend_from_slice(&block[p * width..(p + 1) * width]);
            }
            raw.push(raw_row);
        }
    }
    raw
}

/// Copy a rectangle between two flat row-major buffers with different strides.
///
/// Rows `src_rows` and columns `src_columns` of `src` (row stride
/// `src_width`) land in `dst` (row stride `dst_width`) with their top-left
/// corner at `(dst_start_row, dst_start_column)`.
#[allow(clippy::too_many_arguments)]
pub fn copy_block_part<T: Copy>(
    src: &[T],
    src_width: usize,
    src_rows: std::ops::Range<usize>,
    src_columns: std::ops::Range<usize>,
    dst: &mut [T],
    dst_width: usize,
    dst_start_row: usize,
    dst_start_column: usize,
) {
    let length = src_columns.end - src_columns.start;
    let mut src_pos = src_rows.start * src_width + src_columns.start;
    let mut dst_pos = dst_start_row * dst_width + dst_start_column;
    for _ in src_rows {
        dst[dst_pos..dst_pos + length].copy_from_slice(&src[src_pos..src_pos + length]);
        src_pos += src_width;
        dst_pos += dst_width;
    }
}
