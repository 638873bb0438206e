use crate::types::Cell;

/// A complete row of one output table.
///
/// Values are ordered to match the column order of the table's
/// [`crate::types::TableSchema`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    values: Vec<Cell>,
}

impl TableRow {
    /// Creates a new table row with the given cell values.
    pub fn new(values: Vec<Cell>) -> Self {
        Self { values }
    }

    /// Returns the row values in table column order.
    pub fn values(&self) -> &[Cell] {
        &self.values
    }

    /// Returns the value at `index`, or [`None`] if the row is shorter.
    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.values.get(index)
    }

    /// Consumes the row and returns its values in table column order.
    pub fn into_values(self) -> Vec<Cell> {
        self.values
    }
}
