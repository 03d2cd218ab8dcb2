//! Rank-revealing QR decomposition.
//!
//! Householder QR with column pivoting: `A · P = Q · R`, where at every step
//! the remaining column with the largest Euclidean norm becomes the pivot.
//! The magnitudes of `R`'s diagonal are then non-increasing, which is what
//! [`RrqrDecomposition::rank`] relies on.

use std::sync::atomic::{AtomicU64, Ordering};

use blockmat::{BlockMatrix, MatrixError, RealField};
use thiserror::Error;

/// Error type for RRQR operations in blockmat-linalg.
#[derive(Debug, Error)]
pub enum RrqrError {
    #[error(transparent)]
    Matrix(#[from] MatrixError),
    #[error("Invalid threshold value: {0}. threshold must be finite and non-negative.")]
    InvalidThreshold(f64),
    #[error("Matrix is singular: |R[{column}, {column}]| is at or below the threshold")]
    Singular { column: usize },
    #[error("Least squares needs rows >= columns, got {rows}x{columns}")]
    NotOverdetermined { rows: usize, columns: usize },
}

/// Result type for RRQR operations
pub type Result<T> = std::result::Result<T, RrqrError>;

/// Options for the RRQR decomposition.
#[derive(Debug, Clone, Copy, Default)]
pub struct RrqrOptions {
    /// Singularity threshold: `solve` fails when some `|R[k, k]|` is at or
    /// below it. If `None`, uses the global default threshold.
    pub threshold: Option<f64>,
}

impl RrqrOptions {
    /// Create new RRQR options with the specified threshold.
    pub fn with_threshold(threshold: f64) -> Self {
        Self {
            threshold: Some(threshold),
        }
    }
}

// Global default threshold stored as AtomicU64 (f64::to_bits())
static DEFAULT_RRQR_THRESHOLD: AtomicU64 = AtomicU64::new(0);

/// Get the global default singularity threshold.
///
/// The default value is 0.0: only an exactly zero diagonal entry is singular.
pub fn default_rrqr_threshold() -> f64 {
    f64::from_bits(DEFAULT_RRQR_THRESHOLD.load(Ordering::Relaxed))
}

/// Set the global default singularity threshold.
///
/// # Errors
/// Returns `RrqrError::InvalidThreshold` if `threshold` is not finite or is negative.
pub fn set_default_rrqr_threshold(threshold: f64) -> Result<()> {
    check_threshold(threshold)?;
    DEFAULT_RRQR_THRESHOLD.store(threshold.to_bits(), Ordering::Relaxed);
    Ok(())
}

fn check_threshold(threshold: f64) -> Result<()> {
    if !threshold.is_finite() || threshold < 0.0 {
        return Err(RrqrError::InvalidThreshold(threshold));
    }
    Ok(())
}

/// Rank-revealing QR decomposition of a `rows × columns` matrix.
#[derive(Debug, Clone)]
pub struct RrqrDecomposition<T> {
    /// Transposed working storage: `qrt[column][row]`. Below the diagonal it
    /// holds the Householder vectors, above it the strict upper part of `R`.
    qrt: Vec<Vec<T>>,
    r_diagonal: Vec<T>,
    permutation: Vec<usize>,
    rows: usize,
    threshold: T,
}

impl<T: RealField> RrqrDecomposition<T> {
    /// Decompose `matrix`.
    ///
    /// # Errors
    /// Returns `RrqrError::InvalidThreshold` if the configured threshold is
    /// negative, not finite, or not representable in `T`.
    pub fn new(matrix: &BlockMatrix<T>, options: Option<RrqrOptions>) -> Result<Self> {
        let options = options.unwrap_or_default();
        let threshold = options.threshold.unwrap_or_else(default_rrqr_threshold);
        check_threshold(threshold)?;
        let threshold_t: T =
            num_traits::cast(threshold).ok_or(RrqrError::InvalidThreshold(threshold))?;

        let rows = matrix.rows();
        let columns = matrix.columns();
        let mut qrt = matrix.transpose().data();
        let mut permutation: Vec<usize> = (0..columns).collect();
        let steps = rows.min(columns);
        let mut r_diagonal = Vec::with_capacity(steps);
        for minor in 0..steps {
            pivot_largest_column(&mut qrt, &mut permutation, minor);
            r_diagonal.push(householder_reflection(&mut qrt, minor));
        }
        tracing::debug!(rows, columns, ?permutation, "computed rank-revealing QR");

        Ok(Self {
            qrt,
            r_diagonal,
            permutation,
            rows,
            threshold: threshold_t,
        })
    }

    fn columns(&self) -> usize {
        self.qrt.len()
    }

    /// Diagonal of `R`, `min(rows, columns)` entries of non-increasing magnitude
    pub fn r_diagonal(&self) -> &[T] {
        &self.r_diagonal
    }

    /// Column order: column `k` of `A · P` is column `permutation()[k]` of `A`
    pub fn permutation(&self) -> &[usize] {
        &self.permutation
    }

    /// The `rows × columns` upper trapezoidal factor `R`.
    pub fn r(&self) -> Result<BlockMatrix<T>> {
        let columns = self.columns();
        let mut ra = vec![vec![T::zero(); columns]; self.rows];
        for (row, &diagonal) in self.r_diagonal.iter().enumerate() {
            ra[row][row] = diagonal;
            for column in row + 1..columns {
                ra[row][column] = self.qrt[column][row];
            }
        }
        Ok(BlockMatrix::from_raw(&ra)?)
    }

    /// Transpose of the orthogonal factor, accumulated from the reflections.
    pub fn qt(&self) -> Result<BlockMatrix<T>> {
        let m = self.rows;
        let mut qta = vec![vec![T::zero(); m]; m];
        for (minor, row) in qta.iter_mut().enumerate().skip(self.r_diagonal.len()) {
            row[minor] = T::one();
        }
        for minor in (0..self.r_diagonal.len()).rev() {
            let v = &self.qrt[minor];
            qta[minor][minor] = T::one();
            if v[minor] != T::zero() {
                let scale = self.r_diagonal[minor] * v[minor];
                for row in qta.iter_mut().skip(minor) {
                    let alpha = -dot(&row[minor..], &v[minor..]) / scale;
                    for (x, &vi) in row[minor..].iter_mut().zip(&v[minor..]) {
                        *x = *x - alpha * vi;
                    }
                }
            }
        }
        Ok(BlockMatrix::from_raw(&qta)?)
    }

    /// The `rows × rows` orthogonal factor `Q`.
    pub fn q(&self) -> Result<BlockMatrix<T>> {
        Ok(self.qt()?.transpose())
    }

    /// The `columns × columns` permutation matrix `P`.
    pub fn p(&self) -> Result<BlockMatrix<T>> {
        let n = self.columns();
        let mut pa = vec![vec![T::zero(); n]; n];
        for (k, &column) in self.permutation.iter().enumerate() {
            pa[column][k] = T::one();
        }
        Ok(BlockMatrix::from_raw(&pa)?)
    }

    /// Numerical rank.
    ///
    /// Starting from 1, the rank grows while the Frobenius norm of the trailing
    /// block of `R`, relative to the previous trailing block and scaled by the
    /// norm of `R`, stays at or above `drop_threshold`.
    pub fn rank(&self, drop_threshold: T) -> Result<usize> {
        let r = self.r()?;
        let (rows, columns) = (r.rows(), r.columns());
        let r_norm = r.frobenius_norm();
        let mut last_norm = r_norm;
        let mut rank = 1;
        while rank < rows.min(columns) {
            let this_norm = r
                .sub_matrix(rank, rows - 1, rank, columns - 1)?
                .frobenius_norm();
            if this_norm == T::zero() || this_norm / last_norm * r_norm < drop_threshold {
                break;
            }
            last_norm = this_norm;
            rank += 1;
        }
        tracing::debug!(rank, "numerical rank from RRQR");
        Ok(rank)
    }

    /// Least-squares solution of `A · x = b`.
    ///
    /// # Errors
    /// * `RrqrError::NotOverdetermined` if `rows < columns`
    /// * `RrqrError::Singular` naming the first pivot position whose
    ///   `|R[k, k]|` is at or below the threshold
    /// * `RrqrError::Matrix` if `b.len() != rows`
    pub fn solve(&self, b: &[T]) -> Result<Vec<T>> {
        let columns = self.columns();
        if self.rows < columns {
            return Err(RrqrError::NotOverdetermined {
                rows: self.rows,
                columns,
            });
        }
        if let Some(column) = self
            .r_diagonal
            .iter()
            .position(|d| d.abs() <= self.threshold)
        {
            return Err(RrqrError::Singular { column });
        }

        let mut y = self.qt()?.operate(b)?;
        let mut z = vec![T::zero(); columns];
        for row in (0..columns).rev() {
            let value = y[row] / self.r_diagonal[row];
            z[row] = value;
            for (i, yi) in y.iter_mut().enumerate().take(row) {
                *yi = *yi - value * self.qrt[row][i];
            }
        }

        let mut x = vec![T::zero(); columns];
        for (k, &column) in self.permutation.iter().enumerate() {
            x[column] = z[k];
        }
        Ok(x)
    }
}

fn dot<T: RealField>(a: &[T], b: &[T]) -> T {
    a.iter()
        .zip(b)
        .fold(T::zero(), |acc, (&x, &y)| acc + x * y)
}

/// Swap the column with the largest remaining norm into position `minor`.
fn pivot_largest_column<T: RealField>(
    qrt: &mut [Vec<T>],
    permutation: &mut [usize],
    minor: usize,
) {
    let mut best_norm = T::zero();
    let mut best = minor;
    for (i, column) in qrt.iter().enumerate().skip(minor) {
        let norm = dot(&column[minor..], &column[minor..]);
        if norm > best_norm {
            best_norm = norm;
            best = i;
        }
    }
    if best != minor {
        qrt.swap(minor, best);
        permutation.swap(minor, best);
    }
}

/// Apply the Householder reflection zeroing column `minor` below the
/// diagonal to every later column; returns `R[minor, minor]`.
fn householder_reflection<T: RealField>(qrt: &mut [Vec<T>], minor: usize) -> T {
    let (head, tail) = qrt.split_at_mut(minor + 1);
    let v = &mut head[minor];
    let norm = dot(&v[minor..], &v[minor..]).sqrt();
    let a = if v[minor] > T::zero() { -norm } else { norm };
    if a != T::zero() {
        v[minor] = v[minor] - a;
        let scale = a * v[minor];
        let v = &v[minor..];
        for column in tail.iter_mut() {
            let alpha = -dot(&column[minor..], v) / scale;
            for (x, &vi) in column[minor..].iter_mut().zip(v) {
                *x = *x - alpha * vi;
            }
        }
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pivot_picks_largest_remaining_column() {
        // columns stored transposed: norms 1, 25, 4
        let mut qrt = vec![vec![1.0, 0.0], vec![3.0, 4.0], vec![0.0, 2.0]];
        let mut permutation = vec![0, 1, 2];
        pivot_largest_column(&mut qrt, &mut permutation, 0);
        assert_eq!(permutation, vec![1, 0, 2]);
        assert_eq!(qrt[0], vec![3.0, 4.0]);

        // only the trailing part counts from step 1 on
        pivot_largest_column(&mut qrt, &mut permutation, 1);
        assert_eq!(permutation, vec![1, 2, 0]);
    }

    #[test]
    fn test_householder_step_zeroes_below_diagonal() {
        let mut qrt = vec![vec![3.0, 4.0], vec![1.0, 2.0]];
        let diagonal = householder_reflection(&mut qrt, 0);
        assert_eq!(diagonal, -5.0);
        // reflected second column keeps its norm
        let norm_squared: f64 = qrt[1][0] * qrt[1][0] + qrt[1][1] * qrt[1][1];
        assert!((norm_squared - 5.0).abs() < 1e-12);
        // first component is R[0, 1] = -(3*1 + 4*2) / 5
        assert!((qrt[1][0] + 11.0 / 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_column_gives_zero_diagonal() {
        let mut qrt = vec![vec![0.0, 0.0, 0.0]];
        assert_eq!(householder_reflection(&mut qrt, 0), 0.0);
        assert_eq!(qrt[0], vec![0.0, 0.0, 0.0]);
    }
}
