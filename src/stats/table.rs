//! A contingency table with quick row and column-based access
//!
//! Imagine the following table of two genotype groups (rows) and
//! the presence of a phenotype (columns)
//!
//! | Genotype |  Yes |   No |
//! |:-------- | ----:| ----:|
//! | **A**    |    1 |    9 |
//! | **B**    |   11 |    3 |
//!
//! ```
//! use phenocorr::stats::ContingencyTable;
//!
//! let table = ContingencyTable::from_rows(&[[1, 9], [11, 3]]).unwrap();
//!
//! assert_eq!(table.dim(), (2, 2));
//! assert_eq!(table.row_sums(), vec![10, 14]);
//! assert_eq!(table.col_sums(), vec![12, 12]);
//!
//! let rows: Vec<&[u32]> = table.rows().collect();
//! assert_eq!(rows[1], [11u32, 3].as_slice());
//!
//! let first_col: Vec<u32> = table.col(0).collect();
//! assert_eq!(first_col, vec![1, 11]);
//! ```
use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::{GpcError, GpcResult};

/// Counts of genotype groups (rows) by phenotype categories (columns)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContingencyTable {
    rows: usize,
    cols: usize,
    data: Vec<u32>,
}

impl ContingencyTable {
    /// Creates a new table with all counts set to 0
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    /// Creates a table from its rows
    ///
    /// # Errors
    ///
    /// [`GpcError::InvalidInput`] if there are no rows or columns or the rows differ in length
    pub fn from_rows<R: AsRef<[u32]>>(rows: &[R]) -> GpcResult<Self> {
        let cols = rows.first().map_or(0, |row| row.as_ref().len());
        if cols == 0 {
            return Err(GpcError::InvalidInput(
                "a contingency table needs at least one row and column".to_string(),
            ));
        }
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(GpcError::InvalidInput(format!(
                    "expected {cols} columns, found {}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Returns a Tuple with number of rows and number of columns
    pub fn dim(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the count at `row` and `col`
    ///
    /// Returns `None` if the position is outside of the table
    pub fn get(&self, row: usize, col: usize) -> Option<u32> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    /// Adds one to the count at `row` and `col`
    ///
    /// Positions outside of the table are ignored
    pub fn increment(&mut self, row: usize, col: usize) {
        if row < self.rows && col < self.cols {
            self.data[row * self.cols + col] += 1;
        }
    }

    /// The sum of all counts
    pub fn total(&self) -> u32 {
        self.data.iter().sum()
    }

    /// Iterates the rows of the table
    pub fn rows(&self) -> std::slice::Chunks<'_, u32> {
        self.data.chunks(self.cols.max(1))
    }

    /// Iterates the values of a single column
    pub fn col(&self, col: usize) -> impl Iterator<Item = u32> + '_ {
        self.data
            .iter()
            .skip(col)
            .step_by(self.cols.max(1))
            .take(if col < self.cols { self.rows } else { 0 })
            .copied()
    }

    pub fn row_sums(&self) -> Vec<u32> {
        self.rows().map(|row| row.iter().sum()).collect()
    }

    pub fn col_sums(&self) -> Vec<u32> {
        (0..self.cols).map(|col| self.col(col).sum()).collect()
    }

    /// Checks that the table has at least one count in every row and every column
    ///
    /// # Errors
    ///
    /// [`GpcError::DegenerateTable`] naming the first empty row or column
    pub fn check_not_degenerate(&self) -> GpcResult<()> {
        if self.total() == 0 {
            return Err(GpcError::DegenerateTable("all counts are zero".to_string()));
        }
        if let Some(row) = self.row_sums().iter().position(|sum| *sum == 0) {
            return Err(GpcError::DegenerateTable(format!("row {row} is empty")));
        }
        if let Some(col) = self.col_sums().iter().position(|sum| *sum == 0) {
            return Err(GpcError::DegenerateTable(format!("column {col} is empty")));
        }
        Ok(())
    }
}

impl Display for ContingencyTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in self.rows() {
            let v: Vec<String> = row.iter().map(|v| format!("{v}")).collect();
            writeln!(f, "[{}]", v.join(", "))?;
        }
        Ok(())
    }
}
