use std::path::PathBuf;

use bytes::Bytes;
use lakestar::destination::Destination;
use lakestar::error::{ErrorKind, EtlResult};
use lakestar::etl_error;
use lakestar::metrics::TABLE_NAME_LABEL;
use lakestar::types::{TableRow, TableSchema};
use lakestar_config::shared::StorageConfig;
use metrics::counter;
use tracing::info;

use crate::metrics::{
    LAKESTAR_PARQUET_BYTES_WRITTEN_TOTAL, LAKESTAR_PARQUET_FILES_WRITTEN_TOTAL, register_metrics,
};
use crate::parquet::encoding::{encode_parquet, rows_to_record_batch};
use crate::parquet::partition::partition_rows;
use crate::parquet::storage::{LocalStorage, StorageBackend, TableFile};

/// Name of the single data file written into every partition directory.
pub const PART_FILE_NAME: &str = "part-00000.parquet";

/// Empty marker file written last into every table directory.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Destination writing every table as Hive-partitioned Parquet files.
///
/// A table lands in `<output_root>/<table>/<key>=<value>/.../part-00000.parquet`, one directory
/// level per partition key. Partition columns are only encoded in the directory names, not in
/// the file bodies.
#[derive(Debug, Clone)]
pub struct ParquetDestination {
    storage: StorageBackend,
}

impl ParquetDestination {
    /// Creates a destination over the given storage backend.
    pub fn new(storage: StorageBackend) -> Self {
        register_metrics();

        Self { storage }
    }

    /// Creates a destination writing below a local directory.
    pub fn local(output_root: impl Into<PathBuf>) -> Self {
        Self::new(StorageBackend::Local(LocalStorage::new(output_root)))
    }

    /// Creates a destination for `output_root`, which may be a local path or an object storage
    /// URI.
    pub fn from_output_root(
        output_root: &str,
        storage: Option<&StorageConfig>,
    ) -> EtlResult<Self> {
        let storage = StorageBackend::for_output_root(output_root, storage)?;

        Ok(Self::new(storage))
    }
}

impl Destination for ParquetDestination {
    fn name() -> &'static str {
        "parquet"
    }

    async fn write_table(
        &self,
        schema: &TableSchema,
        table_rows: Vec<TableRow>,
    ) -> EtlResult<()> {
        let table = schema.name;
        let row_count = table_rows.len();

        let encode_schema = schema.clone();
        let files =
            tokio::task::spawn_blocking(move || encode_table(&encode_schema, table_rows)).await??;

        let file_count = files.len() as u64;
        let byte_count: u64 = files.iter().map(|file| file.contents.len() as u64).sum();

        self.storage
            .replace_table(table, files)
            .await
            .map_err(|err| {
                etl_error!(
                    ErrorKind::WriteFailure,
                    "Failed to write table",
                    self.storage.table_location(table),
                    source: err
                )
            })?;

        counter!(LAKESTAR_PARQUET_FILES_WRITTEN_TOTAL, TABLE_NAME_LABEL => table)
            .increment(file_count);
        counter!(LAKESTAR_PARQUET_BYTES_WRITTEN_TOTAL, TABLE_NAME_LABEL => table)
            .increment(byte_count);

        info!(
            table,
            rows = row_count,
            files = file_count,
            bytes = byte_count,
            location = %self.storage.table_location(table),
            "wrote parquet table"
        );

        Ok(())
    }
}

/// Encodes all rows of a table into its partition files plus the success marker.
fn encode_table(schema: &TableSchema, rows: Vec<TableRow>) -> EtlResult<Vec<TableFile>> {
    let partition_indices = schema.partition_column_indices();
    let body_indices: Vec<usize> = (0..schema.column_schemas.len())
        .filter(|index| !partition_indices.contains(index))
        .collect();

    let mut files = Vec::new();
    for partition in partition_rows(schema, rows) {
        let batch = rows_to_record_batch(schema, &body_indices, &partition.rows)?;
        let contents = encode_parquet(&batch)?;

        let path = if partition.path.is_empty() {
            PART_FILE_NAME.to_string()
        } else {
            format!("{}/{PART_FILE_NAME}", partition.path)
        };
        files.push(TableFile { path, contents });
    }

    files.push(TableFile {
        path: SUCCESS_MARKER.to_string(),
        contents: Bytes::new(),
    });

    Ok(files)
}

#[cfg(test)]
mod tests {
    use lakestar::types::{Cell, ColumnSchema, ColumnType};

    use super::*;

    fn schema(partition_keys: Vec<&'static str>) -> TableSchema {
        TableSchema {
            name: "time",
            column_schemas: vec![
                ColumnSchema::required("audit_id", ColumnType::Int64),
                ColumnSchema::required("month", ColumnType::Int32),
                ColumnSchema::required("year", ColumnType::Int32),
            ],
            partition_keys,
        }
    }

    fn row(audit_id: i64, month: i32, year: i32) -> TableRow {
        TableRow::new(vec![Cell::I64(audit_id), Cell::I32(month), Cell::I32(year)])
    }

    #[test]
    fn partitioned_tables_get_one_file_per_partition() {
        let files = encode_table(
            &schema(vec!["year", "month"]),
            vec![row(1, 11, 2018), row(2, 1, 2020), row(3, 11, 2018)],
        )
        .unwrap();

        let paths: Vec<_> = files.iter().map(|file| file.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "year=2018/month=11/part-00000.parquet",
                "year=2020/month=1/part-00000.parquet",
                "_SUCCESS",
            ]
        );
    }

    #[test]
    fn empty_tables_only_write_the_marker_when_partitioned() {
        let partitioned = encode_table(&schema(vec!["year"]), vec![]).unwrap();
        assert_eq!(partitioned.len(), 1);
        assert_eq!(partitioned[0].path, SUCCESS_MARKER);

        let unpartitioned = encode_table(&schema(vec![]), vec![]).unwrap();
        assert_eq!(unpartitioned.len(), 2);
        assert_eq!(unpartitioned[0].path, PART_FILE_NAME);
    }
}
