use crate::types::{Cell, TableRow, TableSchema};

/// Returns the value of `column` in `row`, panicking if the schema lacks the column.
pub fn cell<'a>(schema: &TableSchema, row: &'a TableRow, column: &str) -> &'a Cell {
    let index = schema
        .column_index(column)
        .unwrap_or_else(|| panic!("table {} has no column {column}", schema.name));

    row.get(index)
        .unwrap_or_else(|| panic!("row of {} is shorter than its schema", schema.name))
}

/// Returns the text values of `column` across `rows`.
pub fn text_column(schema: &TableSchema, rows: &[TableRow], column: &str) -> Vec<Option<String>> {
    rows.iter()
        .map(|row| cell(schema, row, column).as_str().map(str::to_string))
        .collect()
}

/// Returns the integer values of `column` across `rows`.
pub fn int_column(schema: &TableSchema, rows: &[TableRow], column: &str) -> Vec<Option<i64>> {
    rows.iter()
        .map(|row| cell(schema, row, column).as_i64())
        .collect()
}
