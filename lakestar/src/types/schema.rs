use std::fmt;

/// Type of a column in an output table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    Bool,
    Int32,
    Int64,
    Float64,
    Text,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Bool => "bool",
            ColumnType::Int32 => "int32",
            ColumnType::Int64 => "int64",
            ColumnType::Float64 => "float64",
            ColumnType::Text => "text",
        };

        f.write_str(name)
    }
}

/// Schema of a single column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    pub name: &'static str,
    pub typ: ColumnType,
    pub nullable: bool,
}

impl ColumnSchema {
    /// Creates a non-nullable column.
    pub const fn required(name: &'static str, typ: ColumnType) -> Self {
        Self {
            name,
            typ,
            nullable: false,
        }
    }

    /// Creates a nullable column.
    pub const fn nullable(name: &'static str, typ: ColumnType) -> Self {
        Self {
            name,
            typ,
            nullable: true,
        }
    }
}

/// Schema of an output table, including its partitioning scheme.
///
/// Partition keys name columns of the table in the order the partition directories nest. Rows
/// handed to a destination always carry the partition columns; it is up to the destination to
/// strip them from the stored body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub column_schemas: Vec<ColumnSchema>,
    pub partition_keys: Vec<&'static str>,
}

impl TableSchema {
    /// Returns the position of the column named `name`.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_schemas
            .iter()
            .position(|column| column.name == name)
    }

    /// Returns the positions of the partition columns in partition order.
    ///
    /// Partition keys that name no column are skipped. [`TableSchema::validate`] reports them.
    pub fn partition_column_indices(&self) -> Vec<usize> {
        self.partition_keys
            .iter()
            .filter_map(|key| self.column_index(key))
            .collect()
    }

    /// Returns `true` if the table is split into partition directories.
    pub fn is_partitioned(&self) -> bool {
        !self.partition_keys.is_empty()
    }

    /// Checks that every partition key names a column.
    pub fn validate(&self) -> Result<(), &'static str> {
        match self
            .partition_keys
            .iter()
            .find(|key| self.column_index(key).is_none())
        {
            Some(key) => Err(*key),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TableSchema {
        TableSchema {
            name: "sample",
            column_schemas: vec![
                ColumnSchema::required("id", ColumnType::Text),
                ColumnSchema::nullable("year", ColumnType::Int32),
                ColumnSchema::nullable("month", ColumnType::Int32),
            ],
            partition_keys: vec!["year", "month"],
        }
    }

    #[test]
    fn partition_columns_follow_key_order() {
        let mut schema = sample();
        assert_eq!(schema.partition_column_indices(), vec![1, 2]);

        schema.partition_keys = vec!["month", "year"];
        assert_eq!(schema.partition_column_indices(), vec![2, 1]);
    }

    #[test]
    fn unknown_partition_key_fails_validation() {
        let mut schema = sample();
        assert!(schema.validate().is_ok());

        schema.partition_keys.push("day");
        assert_eq!(schema.validate(), Err("day"));
    }
}
