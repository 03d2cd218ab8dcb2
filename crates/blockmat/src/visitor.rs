//! Matrix traversal visitors.
//!
//! A walk calls [`start`](MatrixPreservingVisitor::start) once, then `visit`
//! once per entry in the order the walk promises, then returns the value of
//! `end`. Row-order walks promise strict row-major order; optimized-order walks
//! only promise that every entry is visited exactly once.

use crate::scalar::Field;

/// Visitor that may replace the entries it visits.
pub trait MatrixChangingVisitor<T: Field> {
    /// Called once before the first entry.
    ///
    /// `start_row..=end_row` and `start_column..=end_column` is the region
    /// about to be walked inside a `rows × columns` matrix.
    #[allow(unused_variables)]
    fn start(
        &mut self,
        rows: usize,
        columns: usize,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) {
    }

    /// Visit one entry and return its new value.
    fn visit(&mut self, row: usize, column: usize, value: T) -> T;

    /// Called once after the last entry; the result of the walk.
    fn end(&mut self) -> T;
}

/// Visitor that only reads the entries it visits.
pub trait MatrixPreservingVisitor<T: Field> {
    /// Called once before the first entry.
    #[allow(unused_variables)]
    fn start(
        &mut self,
        rows: usize,
        columns: usize,
        start_row: usize,
        end_row: usize,
        start_column: usize,
        end_column: usize,
    ) {
    }

    /// Visit one entry.
    fn visit(&mut self, row: usize, column: usize, value: T);

    /// Called once after the last entry; the result of the walk.
    fn end(&mut self) -> T;
}

/// Preserving visitor accumulating the sum of squares of the visited entries.
///
/// `end` returns the square root of the sum, i.e. the Frobenius norm of the
/// visited region.
#[derive(Debug, Clone, Copy)]
pub(crate) struct FrobeniusAccumulator<T> {
    sum: T,
}

impl<T: crate::scalar::RealField> FrobeniusAccumulator<T> {
    pub(crate) fn new() -> Self {
        Self { sum: T::zero() }
    }
}

impl<T: crate::scalar::RealField> MatrixPreservingVisitor<T> for FrobeniusAccumulator<T> {
    fn start(&mut self, _: usize, _: usize, _: usize, _: usize, _: usize, _: usize) {
        self.sum = T::zero();
    }

    fn visit(&mut self, _row: usize, _column: usize, value: T) {
        self.sum = self.sum + value * value;
    }

    fn end(&mut self) -> T {
        self.sum.sqrt()
    }
}
