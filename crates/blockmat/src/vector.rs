//! Generic vector interface and an array-backed implementation.

use crate::error::{IndexKind, MatrixError, Result};
use crate::matrix::check_index;
use crate::scalar::Field;

/// Read/write access to a vector.
pub trait Vector<T: Field> {
    /// Number of entries
    fn dimension(&self) -> usize;

    /// Entry at `index`.
    ///
    /// # Errors
    /// Returns [`MatrixError::OutOfRange`] if `index >= dimension()`.
    fn entry(&self, index: usize) -> Result<T>;

    /// Set the entry at `index`.
    ///
    /// # Errors
    /// Returns [`MatrixError::OutOfRange`] if `index >= dimension()`.
    fn set_entry(&mut self, index: usize, value: T) -> Result<()>;

    /// Copy the entries out
    fn to_vec(&self) -> Vec<T>;

    /// Contiguous view of the entries, if the vector stores them densely.
    fn as_slice(&self) -> Option<&[T]> {
        None
    }
}

/// Dense vector backed by a `Vec`.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayVector<T> {
    data: Vec<T>,
}

impl<T: Field> ArrayVector<T> {
    /// Zero vector of the given dimension
    pub fn zeros(dimension: usize) -> Self {
        Self {
            data: vec![T::zero(); dimension],
        }
    }

    /// Wrap existing data
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    /// Unwrap into the underlying data
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Dot product with another vector of the same dimension.
    ///
    /// # Errors
    /// Returns [`MatrixError::DimensionMismatch`] if the dimensions differ.
    pub fn dot<V: Vector<T> + ?Sized>(&self, other: &V) -> Result<T> {
        if other.dimension() != self.data.len() {
            return Err(MatrixError::DimensionMismatch {
                expected: self.data.len(),
                actual: other.dimension(),
            });
        }
        match other.as_slice() {
            Some(slice) => Ok(self
                .data
                .iter()
                .zip(slice)
                .fold(T::zero(), |acc, (&a, &b)| acc + a * b)),
            None => {
                let mut sum = T::zero();
                for (i, &a) in self.data.iter().enumerate() {
                    sum = sum + a * other.entry(i)?;
                }
                Ok(sum)
            }
        }
    }
}

impl<T: Field> From<Vec<T>> for ArrayVector<T> {
    fn from(data: Vec<T>) -> Self {
        Self::from_vec(data)
    }
}

impl<T: Field> Vector<T> for ArrayVector<T> {
    fn dimension(&self) -> usize {
        self.data.len()
    }

    fn entry(&self, index: usize) -> Result<T> {
        check_index(IndexKind::Entry, index, self.data.len())?;
        Ok(self.data[index])
    }

    fn set_entry(&mut self, index: usize, value: T) -> Result<()> {
        check_index(IndexKind::Entry, index, self.data.len())?;
        self.data[index] = value;
        Ok(())
    }

    fn to_vec(&self) -> Vec<T> {
        self.data.clone()
    }

    fn as_slice(&self) -> Option<&[T]> {
        Some(&self.data)
    }
}
