//! Block-wise arithmetic.

use super::BlockMatrix;
use crate::error::{MatrixError, Result};
use crate::layout::{self, BlockGeometry};
use crate::matrix::{check_addition_compatible, check_multiplication_compatible, Matrix};
use crate::scalar::{Field, RealField};
use crate::visitor::FrobeniusAccumulator;

impl<T: Field> BlockMatrix<T> {
    /// Compute `self + m`.
    ///
    /// # Errors
    /// Returns [`MatrixError::MatrixDimensionMismatch`] if the shapes differ.
    pub fn add<M: Matrix<T> + ?Sized>(&self, m: &M) -> Result<BlockMatrix<T>> {
        self.combine(m, |a, b| a + b)
    }

    /// Compute `self - m`.
    ///
    /// # Errors
    /// Returns [`MatrixError::MatrixDimensionMismatch`] if the shapes differ.
    pub fn subtract<M: Matrix<T> + ?Sized>(&self, m: &M) -> Result<BlockMatrix<T>> {
        self.combine(m, |a, b| a - b)
    }

    /// Add `d` to every entry.
    pub fn scalar_add(&self, d: T) -> BlockMatrix<T> {
        self.map_blocks(|a| a + d)
    }

    /// Multiply every entry by `d`.
    pub fn scalar_multiply(&self, d: T) -> BlockMatrix<T> {
        self.map_blocks(|a| a * d)
    }

    /// Compute `self * m`.
    ///
    /// # Errors
    /// Returns [`MatrixError::DimensionMismatch`] if `self.columns() != m.row_dimension()`.
    pub fn multiply<M: Matrix<T> + ?Sized>(&self, m: &M) -> Result<BlockMatrix<T>> {
        check_multiplication_compatible(self, m)?;
        tracing::debug!(
            rows = self.rows(),
            inner = self.columns(),
            columns = m.column_dimension(),
            block_path = m.as_block_matrix().is_some(),
            "block multiply"
        );
        match m.as_block_matrix() {
            Some(block) => Ok(self.multiply_blocks(block)),
            None => self.multiply_entries(m),
        }
    }

    /// Transpose of this matrix.
    pub fn transpose(&self) -> BlockMatrix<T> {
        let geometry = self.geometry.transposed();
        let mut blocks = Vec::with_capacity(geometry.num_blocks());
        for i_block in 0..geometry.block_rows() {
            let p_height = geometry.block_height(i_block);
            for j_block in 0..geometry.block_columns() {
                let q_width = geometry.block_width(j_block);
                // block (j_block, i_block) of self is q_width high, p_height wide
                let t_block = &self.blocks[self.geometry.block_index(j_block, i_block)];
                let mut out_block = Vec::with_capacity(p_height * q_width);
                for p in 0..p_height {
                    let mut l = p;
                    for _ in 0..q_width {
                        out_block.push(t_block[l]);
                        l += p_height;
                    }
                }
                blocks.push(out_block);
            }
        }
        BlockMatrix { geometry, blocks }
    }

    /// Compute `self * v`.
    ///
    /// # Errors
    /// Returns [`MatrixError::DimensionMismatch`] if `v.len() != columns`.
    pub fn operate(&self, v: &[T]) -> Result<Vec<T>> {
        if v.len() != self.columns() {
            return Err(MatrixError::DimensionMismatch {
                expected: self.columns(),
                actual: v.len(),
            });
        }
        let bs = T::BLOCK_SIZE;
        let mut out = vec![T::zero(); self.rows()];
        for i_block in 0..self.block_rows() {
            let p_start = i_block * bs;
            let p_end = p_start + self.geometry.block_height(i_block);
            for j_block in 0..self.block_columns() {
                let q_start = j_block * bs;
                let j_width = self.geometry.block_width(j_block);
                let block = &self.blocks[self.geometry.block_index(i_block, j_block)];
                let v_part = &v[q_start..q_start + j_width];
                for (p, block_row) in (p_start..p_end).zip(block.chunks_exact(j_width)) {
                    let sum = block_row
                        .iter()
                        .zip(v_part)
                        .fold(T::zero(), |acc, (&a, &x)| acc + a * x);
                    out[p] = out[p] + sum;
                }
            }
        }
        Ok(out)
    }

    /// Compute `vᵀ * self`.
    ///
    /// # Errors
    /// Returns [`MatrixError::DimensionMismatch`] if `v.len() != rows`.
    pub fn pre_multiply(&self, v: &[T]) -> Result<Vec<T>> {
        if v.len() != self.rows() {
            return Err(MatrixError::DimensionMismatch {
                expected: self.rows(),
                actual: v.len(),
            });
        }
        let bs = T::BLOCK_SIZE;
        let mut out = vec![T::zero(); self.columns()];
        for j_block in 0..self.block_columns() {
            let j_width = self.geometry.block_width(j_block);
            let q_start = j_block * bs;
            for i_block in 0..self.block_rows() {
                let p_start = i_block * bs;
                let i_height = self.geometry.block_height(i_block);
                let block = &self.blocks[self.geometry.block_index(i_block, j_block)];
                for q in 0..j_width {
                    let mut k = q;
                    let mut sum = T::zero();
                    for &x in &v[p_start..p_start + i_height] {
                        sum = sum + block[k] * x;
                        k += j_width;
                    }
                    out[q_start + q] = out[q_start + q] + sum;
                }
            }
        }
        Ok(out)
    }

    /// Sum of the diagonal entries.
    ///
    /// # Errors
    /// Returns [`MatrixError::NonSquare`] if the matrix is not square.
    pub fn trace(&self) -> Result<T> {
        self.check_square()?;
        let mut trace = T::zero();
        for i in 0..self.rows() {
            let (index, offset) = self.geometry.locate(i, i);
            trace = trace + self.blocks[index][offset];
        }
        Ok(trace)
    }

    /// Raise a square matrix to the non-negative integer power `p`.
    ///
    /// `p == 0` gives the identity.
    ///
    /// # Errors
    /// Returns [`MatrixError::NonSquare`] if the matrix is not square.
    pub fn power(&self, p: u32) -> Result<BlockMatrix<T>> {
        self.check_square()?;
        let mut result = BlockMatrix::identity(self.rows())?;
        let mut base = self.clone();
        let mut exponent = p;
        while exponent > 0 {
            if exponent & 1 == 1 {
                result = result.multiply_blocks(&base);
            }
            exponent >>= 1;
            if exponent > 0 {
                base = base.multiply_blocks(&base);
            }
        }
        Ok(result)
    }

    fn check_square(&self) -> Result<()> {
        if self.rows() != self.columns() {
            return Err(MatrixError::NonSquare {
                rows: self.rows(),
                columns: self.columns(),
            });
        }
        Ok(())
    }

    fn map_blocks<F: Fn(T) -> T>(&self, f: F) -> BlockMatrix<T> {
        BlockMatrix {
            geometry: self.geometry,
            blocks: self
                .blocks
                .iter()
                .map(|block| block.iter().map(|&a| f(a)).collect())
                .collect(),
        }
    }

    fn combine<M, F>(&self, m: &M, op: F) -> Result<BlockMatrix<T>>
    where
        M: Matrix<T> + ?Sized,
        F: Fn(T, T) -> T,
    {
        check_addition_compatible(self, m)?;
        if let Some(other) = m.as_block_matrix() {
            tracing::trace!("element-wise op: block path");
            let blocks = self
                .blocks
                .iter()
                .zip(&other.blocks)
                .map(|(a, b)| a.iter().zip(b).map(|(&x, &y)| op(x, y)).collect())
                .collect();
            return Ok(BlockMatrix {
                geometry: self.geometry,
                blocks,
            });
        }

        tracing::trace!("element-wise op: entry path");
        let bs = T::BLOCK_SIZE;
        let mut out = self.clone();
        for i_block in 0..out.block_rows() {
            let p_start = i_block * bs;
            let p_end = p_start + out.geometry.block_height(i_block);
            for j_block in 0..out.block_columns() {
                let q_start = j_block * bs;
                let q_end = q_start + out.geometry.block_width(j_block);
                let index = out.geometry.block_index(i_block, j_block);
                let out_block = &mut out.blocks[index];
                let mut k = 0;
                for p in p_start..p_end {
                    for q in q_start..q_end {
                        out_block[k] = op(out_block[k], m.entry(p, q)?);
                        k += 1;
                    }
                }
            }
        }
        Ok(out)
    }

    /// Blocked product against another block matrix; shapes already checked.
    fn multiply_blocks(&self, m: &BlockMatrix<T>) -> BlockMatrix<T> {
        let bs = T::BLOCK_SIZE;
        let mut out = BlockMatrix {
            geometry: BlockGeometry::new(self.rows(), m.columns(), bs),
            blocks: layout::create_blocks_layout(self.rows(), m.columns(), bs),
        };

        for i_block in 0..out.block_rows() {
            let i_height = out.geometry.block_height(i_block);
            for j_block in 0..out.block_columns() {
                let j_width = out.geometry.block_width(j_block);
                let j_width2 = j_width + j_width;
                let j_width3 = j_width2 + j_width;
                let j_width4 = j_width3 + j_width;
                let out_index = out.geometry.block_index(i_block, j_block);
                let out_block = &mut out.blocks[out_index];

                // contraction over the shared block dimension
                for k_block in 0..self.block_columns() {
                    let k_width = self.geometry.block_width(k_block);
                    let t_block = &self.blocks[self.geometry.block_index(i_block, k_block)];
                    let m_block = &m.blocks[m.geometry.block_index(k_block, j_block)];
                    let mut k = 0;
                    for p in 0..i_height {
                        let l_start = p * k_width;
                        let l_end = l_start + k_width;
                        for n_column in 0..j_width {
                            let mut sum = T::zero();
                            let mut l = l_start;
                            let mut n = n_column;
                            while l + 3 < l_end {
                                sum = sum
                                    + t_block[l] * m_block[n]
                                    + t_block[l + 1] * m_block[n + j_width]
                                    + t_block[l + 2] * m_block[n + j_width2]
                                    + t_block[l + 3] * m_block[n + j_width3];
                                l += 4;
                                n += j_width4;
                            }
                            while l < l_end {
                                sum = sum + t_block[l] * m_block[n];
                                l += 1;
                                n += j_width;
                            }
                            out_block[k] = out_block[k] + sum;
                            k += 1;
                        }
                    }
                }
            }
        }
        out
    }

    /// Blocked product reading the right operand through `entry`.
    fn multiply_entries<M: Matrix<T> + ?Sized>(&self, m: &M) -> Result<BlockMatrix<T>> {
        let bs = T::BLOCK_SIZE;
        let mut out = BlockMatrix::zeros(self.rows(), m.column_dimension())?;

        for i_block in 0..out.block_rows() {
            let i_height = out.geometry.block_height(i_block);
            for j_block in 0..out.block_columns() {
                let q_start = j_block * bs;
                let q_end = q_start + out.geometry.block_width(j_block);
                let out_index = out.geometry.block_index(i_block, j_block);
                let out_block = &mut out.blocks[out_index];

                for k_block in 0..self.block_columns() {
                    let k_width = self.geometry.block_width(k_block);
                    let r_start = k_block * bs;
                    let t_block = &self.blocks[self.geometry.block_index(i_block, k_block)];
                    let mut k = 0;
                    for p in 0..i_height {
                        let t_row = &t_block[p * k_width..(p + 1) * k_width];
                        for q in q_start..q_end {
                            let mut sum = T::zero();
                            for (r, &t) in t_row.iter().enumerate() {
                                sum = sum + t * m.entry(r_start + r, q)?;
                            }
                            out_block[k] = out_block[k] + sum;
                            k += 1;
                        }
                    }
                }
            }
        }
        Ok(out)
    }
}

impl<T: RealField> BlockMatrix<T> {
    /// Maximum absolute column sum.
    pub fn norm1(&self) -> T {
        let bs = T::BLOCK_SIZE;
        let mut col_sums = vec![T::zero(); bs];
        let mut max_col_sum = T::zero();
        for j_block in 0..self.block_columns() {
            let j_width = self.geometry.block_width(j_block);
            col_sums[..j_width].fill(T::zero());
            for i_block in 0..self.block_rows() {
                let block = &self.blocks[self.geometry.block_index(i_block, j_block)];
                for block_row in block.chunks_exact(j_width) {
                    for (sum, &a) in col_sums.iter_mut().zip(block_row) {
                        *sum = *sum + a.abs();
                    }
                }
            }
            for &sum in &col_sums[..j_width] {
                max_col_sum = max_col_sum.max(sum);
            }
        }
        max_col_sum
    }

    /// Maximum absolute row sum.
    pub fn norm_infinity(&self) -> T {
        let bs = T::BLOCK_SIZE;
        let mut row_sums = vec![T::zero(); bs];
        let mut max_row_sum = T::zero();
        for i_block in 0..self.block_rows() {
            let i_height = self.geometry.block_height(i_block);
            row_sums[..i_height].fill(T::zero());
            for j_block in 0..self.block_columns() {
                let j_width = self.geometry.block_width(j_block);
                let block = &self.blocks[self.geometry.block_index(i_block, j_block)];
                for (sum, block_row) in row_sums.iter_mut().zip(block.chunks_exact(j_width)) {
                    *sum = block_row.iter().fold(*sum, |acc, &a| acc + a.abs());
                }
            }
            for &sum in &row_sums[..i_height] {
                max_row_sum = max_row_sum.max(sum);
            }
        }
        max_row_sum
    }

    /// Square root of the sum of squares of all entries.
    pub fn frobenius_norm(&self) -> T {
        self.walk_in_optimized_order(&mut FrobeniusAccumulator::new())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use num_rational::Rational64;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::field_tests;
    use crate::matrix::DenseMatrix;

    fn random_raw(rows: usize, columns: usize, seed: u64) -> Vec<Vec<f64>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..rows)
            .map(|_| (0..columns).map(|_| rng.random::<f64>() - 0.5).collect())
            .collect()
    }

    fn integer_raw<T: Field>(rows: usize, columns: usize, seed: u64) -> Vec<Vec<T>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..rows)
            .map(|_| {
                (0..columns)
                    .map(|_| T::from_i64(rng.random_range(-9..10)))
                    .collect()
            })
            .collect()
    }

    fn naive_product<T: Field>(a: &[Vec<T>], b: &[Vec<T>]) -> Vec<Vec<T>> {
        let n = b[0].len();
        a.iter()
            .map(|a_row| {
                (0..n)
                    .map(|j| {
                        a_row
                            .iter()
                            .enumerate()
                            .fold(T::zero(), |acc, (k, &x)| acc + x * b[k][j])
                    })
                    .collect()
            })
            .collect()
    }

    fn test_multiply_matches_naive_generic<T: Field>() {
        let bs = T::BLOCK_SIZE;
        // spans several blocks with ragged edges in all three dimensions
        let (m, k, n) = (bs + 7, 2 * bs + 3, bs - 5);
        let a_raw = integer_raw::<T>(m, k, 1);
        let b_raw = integer_raw::<T>(k, n, 2);
        let a = BlockMatrix::from_raw(&a_raw).unwrap();
        let b = BlockMatrix::from_raw(&b_raw).unwrap();
        let expected = naive_product(&a_raw, &b_raw);

        assert_eq!(a.multiply(&b).unwrap().data(), expected);

        // entry path gives the same answer
        let b_dense = DenseMatrix::from_vec2d(b_raw).unwrap();
        assert_eq!(a.multiply(&b_dense).unwrap().data(), expected);
    }

    field_tests!(test_multiply_matches_naive, test_multiply_matches_naive_generic);

    fn test_add_subtract_generic<T: Field>() {
        let bs = T::BLOCK_SIZE;
        let (rows, columns) = (bs + 3, 2 * bs + 1);
        let a_raw = integer_raw::<T>(rows, columns, 3);
        let b_raw = integer_raw::<T>(rows, columns, 4);
        let a = BlockMatrix::from_raw(&a_raw).unwrap();
        let b = BlockMatrix::from_raw(&b_raw).unwrap();
        let b_dense = DenseMatrix::from_vec2d(b_raw.clone()).unwrap();

        let sum = a.add(&b).unwrap();
        let diff = a.subtract(&b).unwrap();
        assert_eq!(sum, a.add(&b_dense).unwrap());
        assert_eq!(diff, a.subtract(&b_dense).unwrap());
        for i in 0..rows {
            for j in 0..columns {
                assert_eq!(sum.entry(i, j).unwrap(), a_raw[i][j] + b_raw[i][j]);
                assert_eq!(diff.entry(i, j).unwrap(), a_raw[i][j] - b_raw[i][j]);
            }
        }
        // a - b + b == a
        assert_eq!(diff.add(&b).unwrap(), a);
    }

    field_tests!(test_add_subtract, test_add_subtract_generic);

    fn test_scalar_ops_generic<T: Field>() {
        let bs = T::BLOCK_SIZE;
        let a_raw = integer_raw::<T>(bs + 1, 3, 5);
        let a = BlockMatrix::from_raw(&a_raw).unwrap();
        let three = T::from_i64(3);

        let scaled = a.scalar_multiply(three);
        let shifted = a.scalar_add(three);
        for i in 0..bs + 1 {
            for j in 0..3 {
                assert_eq!(scaled.entry(i, j).unwrap(), a_raw[i][j] * three);
                assert_eq!(shifted.entry(i, j).unwrap(), a_raw[i][j] + three);
            }
        }
    }

    field_tests!(test_scalar_ops, test_scalar_ops_generic);

    fn test_transpose_generic<T: Field>() {
        let bs = T::BLOCK_SIZE;
        let (rows, columns) = (2 * bs + 5, bs + 2);
        let a_raw = integer_raw::<T>(rows, columns, 6);
        let a = BlockMatrix::from_raw(&a_raw).unwrap();
        let t = a.transpose();

        assert_eq!(t.rows(), columns);
        assert_eq!(t.columns(), rows);
        for i in 0..rows {
            for j in 0..columns {
                assert_eq!(t.entry(j, i).unwrap(), a_raw[i][j]);
            }
        }
        assert_eq!(t.transpose(), a);
    }

    field_tests!(test_transpose, test_transpose_generic);

    #[test]
    fn test_add_dimension_mismatch() {
        let a: BlockMatrix<f64> = BlockMatrix::zeros(3, 4).unwrap();
        let b: BlockMatrix<f64> = BlockMatrix::zeros(4, 3).unwrap();
        assert_eq!(
            a.add(&b),
            Err(MatrixError::MatrixDimensionMismatch {
                expected_rows: 3,
                expected_columns: 4,
                actual_rows: 4,
                actual_columns: 3
            })
        );
        assert!(a.subtract(&b).is_err());
    }

    #[test]
    fn test_multiply_dimension_mismatch() {
        let a: BlockMatrix<f64> = BlockMatrix::zeros(3, 4).unwrap();
        assert_eq!(
            a.multiply(&a),
            Err(MatrixError::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        );
    }

    #[test]
    fn test_multiply_random_f64() {
        let a_raw = random_raw(70, 110, 7);
        let b_raw = random_raw(110, 60, 8);
        let a = BlockMatrix::from_raw(&a_raw).unwrap();
        let b = BlockMatrix::from_raw(&b_raw).unwrap();
        let product = a.multiply(&b).unwrap();
        let expected = naive_product(&a_raw, &b_raw);
        for i in 0..70 {
            for j in 0..60 {
                assert_relative_eq!(
                    product.entry(i, j).unwrap(),
                    expected[i][j],
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_operate_and_pre_multiply() {
        let a_raw = random_raw(60, 110, 9);
        let a = BlockMatrix::from_raw(&a_raw).unwrap();
        let v: Vec<f64> = (0..110).map(|i| i as f64 * 0.25 - 3.0).collect();
        let w: Vec<f64> = (0..60).map(|i| 1.0 - i as f64 * 0.1).collect();

        let av = a.operate(&v).unwrap();
        for i in 0..60 {
            let expected: f64 = (0..110).map(|j| a_raw[i][j] * v[j]).sum();
            assert_relative_eq!(av[i], expected, epsilon = 1e-12);
        }

        let wa = a.pre_multiply(&w).unwrap();
        for j in 0..110 {
            let expected: f64 = (0..60).map(|i| w[i] * a_raw[i][j]).sum();
            assert_relative_eq!(wa[j], expected, epsilon = 1e-12);
        }

        assert!(a.operate(&w).is_err());
        assert!(a.pre_multiply(&v).is_err());
    }

    #[test]
    fn test_trace_and_power_exact() {
        // [[1, 1], [1, 0]]^n holds Fibonacci numbers
        let one = Rational64::from_integer(1);
        let zero = Rational64::from_integer(0);
        let fib = BlockMatrix::from_raw(&[vec![one, one], vec![one, zero]]).unwrap();

        let p10 = fib.power(10).unwrap();
        assert_eq!(p10.entry(0, 0).unwrap(), Rational64::from_integer(89));
        assert_eq!(p10.entry(0, 1).unwrap(), Rational64::from_integer(55));
        assert_eq!(p10.trace().unwrap(), Rational64::from_integer(89 + 34));

        assert_eq!(fib.power(0).unwrap(), BlockMatrix::identity(2).unwrap());
        assert_eq!(fib.power(1).unwrap(), fib);

        let rect: BlockMatrix<Rational64> = BlockMatrix::zeros(2, 3).unwrap();
        assert_eq!(
            rect.trace(),
            Err(MatrixError::NonSquare {
                rows: 2,
                columns: 3
            })
        );
        assert!(rect.power(2).is_err());
    }

    #[test]
    fn test_power_spanning_blocks() {
        let a_raw = integer_raw::<f64>(60, 60, 10);
        let a = BlockMatrix::from_raw(&a_raw).unwrap();
        let cube = a.multiply(&a).unwrap().multiply(&a).unwrap();
        assert_eq!(a.power(3).unwrap(), cube);
    }

    #[test]
    fn test_norms() {
        let a = BlockMatrix::from_raw(&[vec![1.0, -2.0], vec![-3.0, 4.0]]).unwrap();
        assert_relative_eq!(a.norm1(), 6.0);
        assert_relative_eq!(a.norm_infinity(), 7.0);
        assert_relative_eq!(a.frobenius_norm(), 30.0_f64.sqrt());

        // across block boundaries: column 70 holds the largest sum
        let mut b: BlockMatrix<f64> = BlockMatrix::zeros(80, 90).unwrap();
        for i in 0..80 {
            b.set_entry(i, 70, -1.0).unwrap();
        }
        b.set_entry(60, 3, 5.0).unwrap();
        assert_relative_eq!(b.norm1(), 80.0);
        assert_relative_eq!(b.norm_infinity(), 6.0);
        assert_relative_eq!(b.frobenius_norm(), 105.0_f64.sqrt());
    }
}
