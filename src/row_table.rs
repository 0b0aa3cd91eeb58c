//! Dense integer table with a fixed shape, the physical storage for
//! all measurement kinds.

use ndarray::{Array2, ArrayView1};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RowTableError {
    #[error("row id {row_id} is outside of the table with {num_rows} rows")]
    RowOutOfRange { row_id: usize, num_rows: usize },
    #[error("got {got} fields for a table with {num_cols} columns")]
    WidthMismatch { got: usize, num_cols: usize },
}

/// Rows that have never been written read as all zeroes.
#[derive(Debug, Clone, PartialEq)]
pub struct RowTable {
    array: Array2<i64>,
}

impl RowTable {
    pub fn new(num_rows: usize, num_cols: usize) -> Self {
        Self {
            array: Array2::zeros((num_rows, num_cols)),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.array.nrows()
    }

    pub fn num_cols(&self) -> usize {
        self.array.ncols()
    }

    /// Overwrite row `row_id` with `fields`; last write wins. There
    /// is no notion of which rows belong to which run here, the
    /// callers have to keep to their blocks.
    pub fn insert(&mut self, row_id: usize, fields: &[i64]) -> Result<(), RowTableError> {
        let num_rows = self.num_rows();
        let num_cols = self.num_cols();
        if row_id >= num_rows {
            return Err(RowTableError::RowOutOfRange { row_id, num_rows });
        }
        if fields.len() != num_cols {
            return Err(RowTableError::WidthMismatch {
                got: fields.len(),
                num_cols,
            });
        }
        for (cell, value) in self.array.row_mut(row_id).iter_mut().zip(fields) {
            *cell = *value;
        }
        Ok(())
    }

    /// Panics if out of range, like indexing.
    pub fn get(&self, row_id: usize, col: usize) -> i64 {
        self.array[[row_id, col]]
    }

    /// Panics if out of range, like indexing.
    pub fn row(&self, row_id: usize) -> ArrayView1<'_, i64> {
        self.array.row(row_id)
    }

    pub fn rows(&self) -> impl Iterator<Item = ArrayView1<'_, i64>> + '_ {
        self.array.rows().into_iter()
    }

    /// Panics if out of range, like indexing.
    pub fn column(&self, col: usize) -> ArrayView1<'_, i64> {
        self.array.column(col)
    }

    pub fn array(&self) -> &Array2<i64> {
        &self.array
    }
}
