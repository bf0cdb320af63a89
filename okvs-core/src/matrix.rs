//! A row-major matrix of fixed-width elements.
//!
//! Every structure moved by the protocol (per-party values, the encoded
//! OKVS, the combined result) is one of these, with the key order as the
//! implicit row index.

use serde::{Deserialize, Serialize};

use crate::Block;

/// Shape disagreement between two matrices combined elementwise.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("shape mismatch: {lhs_rows}x{lhs_cols} vs {rhs_rows}x{rhs_cols}")]
pub struct ShapeMismatchError {
    /// Rows of the left-hand matrix.
    pub lhs_rows: usize,
    /// Columns of the left-hand matrix.
    pub lhs_cols: usize,
    /// Rows of the right-hand matrix.
    pub rhs_rows: usize,
    /// Columns of the right-hand matrix.
    pub rhs_cols: usize,
}

/// A rows x cols matrix stored in row-major order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Matrix<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> Matrix<T> {
    /// Creates a matrix of the given shape filled with the default element.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }

    /// Builds a matrix from a row-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            rows * cols,
            "buffer length does not match shape"
        );
        Self { rows, cols, data }
    }

    /// Builds a single-column matrix from a vector.
    pub fn from_column(data: Vec<T>) -> Self {
        Self {
            rows: data.len(),
            cols: 1,
            data,
        }
    }
}

impl<T> Matrix<T> {
    /// Number of rows.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// The `(rows, cols)` pair.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// True if the matrix holds no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The underlying row-major buffer.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// The underlying row-major buffer, mutable.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// One row as a slice.
    #[inline]
    pub fn row(&self, r: usize) -> &[T] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// One row as a mutable slice.
    #[inline]
    pub fn row_mut(&mut self, r: usize) -> &mut [T] {
        &mut self.data[r * self.cols..(r + 1) * self.cols]
    }
}

impl<T> std::ops::Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (r, c): (usize, usize)) -> &T {
        &self.data[r * self.cols + c]
    }
}

impl<T> std::ops::IndexMut<(usize, usize)> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, (r, c): (usize, usize)) -> &mut T {
        &mut self.data[r * self.cols + c]
    }
}

impl Matrix<Block> {
    /// XORs `rhs` into `self` elementwise.
    ///
    /// Fails when the shapes differ; nothing is written in that case.
    pub fn xor_assign(&mut self, rhs: &Self) -> Result<(), ShapeMismatchError> {
        if self.shape() != rhs.shape() {
            return Err(ShapeMismatchError {
                lhs_rows: self.rows,
                lhs_cols: self.cols,
                rhs_rows: rhs.rows,
                rhs_cols: rhs.cols,
            });
        }
        for (a, b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a ^= *b;
        }
        Ok(())
    }
}
