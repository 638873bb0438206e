use std::collections::BTreeMap;

use lakestar::types::{Cell, TableRow, TableSchema};

/// Directory value used for null or empty partition values, as Hive spells it.
pub const HIVE_DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Rows of one partition directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionedRows {
    /// Relative directory such as `year=2018/month=11`; empty for unpartitioned tables.
    pub path: String,
    pub rows: Vec<TableRow>,
}

/// Groups rows by the values of the schema's partition columns.
///
/// Groups are returned ordered by directory path and rows keep their input order inside a
/// group. Unpartitioned tables yield a single group with an empty path, even without rows.
pub fn partition_rows(schema: &TableSchema, rows: Vec<TableRow>) -> Vec<PartitionedRows> {
    let partition_indices = schema.partition_column_indices();
    if partition_indices.is_empty() {
        return vec![PartitionedRows {
            path: String::new(),
            rows,
        }];
    }

    let mut groups: BTreeMap<String, Vec<TableRow>> = BTreeMap::new();
    for row in rows {
        let path = partition_indices
            .iter()
            .map(|&index| {
                let name = schema.column_schemas[index].name;
                partition_segment(name, row.get(index).unwrap_or(&Cell::Null))
            })
            .collect::<Vec<_>>()
            .join("/");

        groups.entry(path).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(path, rows)| PartitionedRows { path, rows })
        .collect()
}

/// Renders one `key=value` directory name.
fn partition_segment(name: &str, value: &Cell) -> String {
    let value = value.to_string();
    if value.is_empty() {
        return format!("{}={HIVE_DEFAULT_PARTITION}", escape_path_name(name));
    }

    format!("{}={}", escape_path_name(name), escape_path_name(&value))
}

/// Percent-encodes the characters Hive does not allow in partition directory names.
fn escape_path_name(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if needs_escape(c) {
            escaped.push_str(&format!("%{:02X}", c as u32));
        } else {
            escaped.push(c);
        }
    }

    escaped
}

fn needs_escape(c: char) -> bool {
    matches!(
        c,
        '\u{01}'..='\u{1F}'
            | '"'
            | '#'
            | '%'
            | '\''
            | '*'
            | '/'
            | ':'
            | '='
            | '?'
            | '\\'
            | '\u{7F}'
            | '{'
            | '['
            | ']'
            | '^'
    )
}
