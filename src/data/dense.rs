//! Dense `f32` matrix with configurable layout.
//!
//! The pursuit loop scores and updates whole dictionary columns, so the
//! dictionary lives in a [`ColMatrix`] where `col_slice()` is O(1) and
//! contiguous. Sample matrices (training points, basis components) are
//! [`RowMatrix`]es where `row_slice()` is O(1).

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use super::layout::{ColMajor, Layout, RowMajor};

/// Row-major dense matrix: rows are contiguous.
pub type RowMatrix = DenseMatrix<RowMajor>;

/// Column-major dense matrix: columns are contiguous.
pub type ColMatrix = DenseMatrix<ColMajor>;

/// Dense `f32` matrix with layout determined by the `L` type parameter.
///
/// # Example
///
/// ```
/// use pursue_rs::data::{ColMatrix, RowMatrix};
///
/// let rm = RowMatrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
/// assert_eq!(rm.row_slice(0), &[1.0, 2.0, 3.0]);
///
/// let cm = ColMatrix::from_vec(vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0], 2, 3);
/// assert_eq!(cm.col_slice(0), &[1.0, 4.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseMatrix<L: Layout> {
    data: Box<[f32]>,
    num_rows: usize,
    num_cols: usize,
    _marker: PhantomData<L>,
}

impl<L: Layout> DenseMatrix<L> {
    /// Create a matrix from a Vec in the layout specified by `L`.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != num_rows * num_cols`.
    pub fn from_vec(data: Vec<f32>, num_rows: usize, num_cols: usize) -> Self {
        assert_eq!(
            data.len(),
            num_rows * num_cols,
            "Data length {} does not match dimensions {}x{}",
            data.len(),
            num_rows,
            num_cols
        );
        Self {
            data: data.into_boxed_slice(),
            num_rows,
            num_cols,
            _marker: PhantomData,
        }
    }

    /// Create an all-zero matrix.
    pub fn zeros(num_rows: usize, num_cols: usize) -> Self {
        Self::from_vec(vec![0.0; num_rows * num_cols], num_rows, num_cols)
    }

    /// Number of rows.
    #[inline]
    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    /// Number of columns.
    #[inline]
    pub fn num_cols(&self) -> usize {
        self.num_cols
    }

    /// Get element at (row, col), or `None` if out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.num_rows || col >= self.num_cols {
            return None;
        }
        Some(self.data[L::index(row, col, self.num_rows, self.num_cols)])
    }

    /// The underlying data in layout order.
    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    /// Mutable view of the underlying data in layout order.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Convert to the other layout. O(rows × cols).
    pub fn to_layout<L2: Layout>(&self) -> DenseMatrix<L2> {
        let mut data = vec![0.0; self.num_rows * self.num_cols];
        for row in 0..self.num_rows {
            for col in 0..self.num_cols {
                let src = L::index(row, col, self.num_rows, self.num_cols);
                let dst = L2::index(row, col, self.num_rows, self.num_cols);
                data[dst] = self.data[src];
            }
        }
        DenseMatrix {
            data: data.into_boxed_slice(),
            num_rows: self.num_rows,
            num_cols: self.num_cols,
            _marker: PhantomData,
        }
    }
}

impl DenseMatrix<RowMajor> {
    /// Get a row as a contiguous slice. O(1).
    ///
    /// # Panics
    ///
    /// Panics if `row >= num_rows`.
    #[inline]
    pub fn row_slice(&self, row: usize) -> &[f32] {
        assert!(row < self.num_rows, "Row index {} out of bounds", row);
        let start = row * self.num_cols;
        &self.data[start..start + self.num_cols]
    }

    /// Get a mutable row slice. O(1).
    #[inline]
    pub fn row_slice_mut(&mut self, row: usize) -> &mut [f32] {
        assert!(row < self.num_rows, "Row index {} out of bounds", row);
        let start = row * self.num_cols;
        &mut self.data[start..start + self.num_cols]
    }

    /// Build a matrix by stacking rows.
    ///
    /// # Panics
    ///
    /// Panics if the rows have inconsistent lengths.
    pub fn from_rows(rows: &[&[f32]], num_cols: usize) -> Self {
        let mut data = Vec::with_capacity(rows.len() * num_cols);
        for row in rows {
            assert_eq!(row.len(), num_cols, "Inconsistent row length");
            data.extend_from_slice(row);
        }
        Self::from_vec(data, rows.len(), num_cols)
    }
}

impl DenseMatrix<ColMajor> {
    /// Get a column as a contiguous slice. O(1).
    ///
    /// # Panics
    ///
    /// Panics if `col >= num_cols`.
    #[inline]
    pub fn col_slice(&self, col: usize) -> &[f32] {
        assert!(col < self.num_cols, "Column index {} out of bounds", col);
        let start = col * self.num_rows;
        &self.data[start..start + self.num_rows]
    }

    /// Get a mutable column slice. O(1).
    #[inline]
    pub fn col_slice_mut(&mut self, col: usize) -> &mut [f32] {
        assert!(col < self.num_cols, "Column index {} out of bounds", col);
        let start = col * self.num_rows;
        &mut self.data[start..start + self.num_rows]
    }

    /// Build a matrix by stacking columns.
    ///
    /// # Panics
    ///
    /// Panics if the columns have inconsistent lengths.
    pub fn from_columns(cols: &[&[f32]], num_rows: usize) -> Self {
        let mut data = Vec::with_capacity(cols.len() * num_rows);
        for col in cols {
            assert_eq!(col.len(), num_rows, "Inconsistent column length");
            data.extend_from_slice(col);
        }
        Self::from_vec(data, num_rows, cols.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_from_vec() {
        let m = RowMatrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        assert_eq!(m.num_rows(), 2);
        assert_eq!(m.num_cols(), 3);
    }

    #[test]
    #[should_panic(expected = "does not match dimensions")]
    fn create_wrong_size_panics() {
        RowMatrix::from_vec(vec![1.0, 2.0, 3.0], 2, 3);
    }

    #[test]
    fn get_element_both_layouts() {
        let rm = RowMatrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let cm = ColMatrix::from_vec(vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0], 2, 3);

        for row in 0..2 {
            for col in 0..3 {
                assert_eq!(rm.get(row, col), cm.get(row, col));
            }
        }
        assert_eq!(rm.get(2, 0), None);
        assert_eq!(rm.get(0, 3), None);
    }

    #[test]
    fn row_slices() {
        let m = RowMatrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        assert_eq!(m.row_slice(0), &[1.0, 2.0, 3.0]);
        assert_eq!(m.row_slice(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn col_slices() {
        let m = ColMatrix::from_vec(vec![1.0, 4.0, 2.0, 5.0, 3.0, 6.0], 2, 3);
        assert_eq!(m.col_slice(0), &[1.0, 4.0]);
        assert_eq!(m.col_slice(1), &[2.0, 5.0]);
        assert_eq!(m.col_slice(2), &[3.0, 6.0]);
    }

    #[test]
    fn row_slice_mut_writes_through() {
        let mut m = RowMatrix::zeros(2, 2);
        m.row_slice_mut(1).copy_from_slice(&[5.0, 6.0]);
        assert_eq!(m.get(1, 0), Some(5.0));
        assert_eq!(m.get(1, 1), Some(6.0));
    }

    #[test]
    fn col_slice_mut_writes_through() {
        let mut m = ColMatrix::zeros(2, 2);
        m.col_slice_mut(1).copy_from_slice(&[7.0, 8.0]);
        assert_eq!(m.get(0, 1), Some(7.0));
        assert_eq!(m.get(1, 1), Some(8.0));
    }

    #[test]
    fn from_columns_stacks() {
        let m = ColMatrix::from_columns(&[&[1.0, 2.0], &[3.0, 4.0]], 2);
        assert_eq!(m.num_rows(), 2);
        assert_eq!(m.num_cols(), 2);
        assert_eq!(m.col_slice(1), &[3.0, 4.0]);
    }

    #[test]
    fn from_rows_stacks() {
        let m = RowMatrix::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]], 3);
        assert_eq!(m.row_slice(1), &[4.0, 5.0, 6.0]);
    }

    #[test]
    fn roundtrip_layout_conversion() {
        let rm = RowMatrix::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], 2, 3);
        let cm: ColMatrix = rm.to_layout();
        assert_eq!(cm.col_slice(0), &[1.0, 4.0]);
        let back: RowMatrix = cm.to_layout();
        assert_eq!(rm.as_slice(), back.as_slice());
    }
}
