use std::fmt;

/// A single typed value of a [`crate::types::TableRow`].
///
/// The variants cover the column types produced by the transforms. [`Cell::Null`] stands for a
/// missing value in any nullable column.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    String(String),
    I32(i32),
    I64(i64),
    F64(f64),
}

impl Cell {
    /// Returns `true` if the cell holds no value.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Returns the string value, if this is a [`Cell::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the value widened to `i64`, if this is an integer cell.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::I32(value) => Some(i64::from(*value)),
            Cell::I64(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the value as `f64`, if this is a numeric cell.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::F64(value) => Some(*value),
            Cell::I32(value) => Some(f64::from(*value)),
            _ => None,
        }
    }
}

impl fmt::Display for Cell {
    /// Renders the value the way partition directories spell it.
    ///
    /// [`Cell::Null`] renders as an empty string. Callers decide how to name null partitions.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Bool(value) => write!(f, "{value}"),
            Cell::String(value) => f.write_str(value),
            Cell::I32(value) => write!(f, "{value}"),
            Cell::I64(value) => write!(f, "{value}"),
            Cell::F64(value) => write!(f, "{value}"),
        }
    }
}

impl From<Option<String>> for Cell {
    fn from(value: Option<String>) -> Self {
        value.map(Cell::String).unwrap_or(Cell::Null)
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::String(value)
    }
}

impl From<Option<i32>> for Cell {
    fn from(value: Option<i32>) -> Self {
        value.map(Cell::I32).unwrap_or(Cell::Null)
    }
}

impl From<i32> for Cell {
    fn from(value: i32) -> Self {
        Cell::I32(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::I64(value)
    }
}

impl From<Option<f64>> for Cell {
    fn from(value: Option<f64>) -> Self {
        value.map(Cell::F64).unwrap_or(Cell::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_values_map_to_null() {
        assert_eq!(Cell::from(None::<String>), Cell::Null);
        assert_eq!(Cell::from(Some(2020)), Cell::I32(2020));
        assert!(Cell::from(None::<f64>).is_null());
    }

    #[test]
    fn display_renders_partition_values() {
        assert_eq!(Cell::I32(2018).to_string(), "2018");
        assert_eq!(Cell::String("AR123".to_string()).to_string(), "AR123");
        assert_eq!(Cell::Null.to_string(), "");
    }
}
