//! Data encoding utilities for converting table rows to Arrow and Parquet.

use std::sync::Arc;

use arrow::array::{
    ArrayRef, BooleanBuilder, Float64Builder, Int32Builder, Int64Builder, StringBuilder,
};
use arrow::datatypes::{DataType, Field, Schema as ArrowSchema, SchemaRef};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use lakestar::error::{ErrorKind, EtlResult};
use lakestar::etl_error;
use lakestar::types::{Cell, ColumnSchema, ColumnType, TableRow, TableSchema};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::debug;

/// Converts a column type to its Arrow data type.
fn column_type_to_arrow(typ: ColumnType) -> DataType {
    match typ {
        ColumnType::Bool => DataType::Boolean,
        ColumnType::Int32 => DataType::Int32,
        ColumnType::Int64 => DataType::Int64,
        ColumnType::Float64 => DataType::Float64,
        ColumnType::Text => DataType::Utf8,
    }
}

/// Builds the Arrow schema of the columns at `column_indices`.
///
/// The destination passes the indices of the non-partition columns, since partition values live
/// in the directory names.
pub fn arrow_schema(schema: &TableSchema, column_indices: &[usize]) -> SchemaRef {
    let fields: Vec<Field> = column_indices
        .iter()
        .map(|&index| {
            let column = &schema.column_schemas[index];
            Field::new(column.name, column_type_to_arrow(column.typ), column.nullable)
        })
        .collect();

    Arc::new(ArrowSchema::new(fields))
}

/// Converts table rows to an Arrow [`RecordBatch`] holding the columns at `column_indices`.
///
/// Fails with [`ErrorKind::ConversionError`] when a cell does not fit its column type or a
/// non-nullable column holds a null.
pub fn rows_to_record_batch(
    schema: &TableSchema,
    column_indices: &[usize],
    rows: &[TableRow],
) -> EtlResult<RecordBatch> {
    let arrow_schema = arrow_schema(schema, column_indices);

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(column_indices.len());
    for &index in column_indices {
        let column = &schema.column_schemas[index];
        arrays.push(build_array_for_column(rows, index, column)?);
    }

    let batch = RecordBatch::try_new(arrow_schema, arrays).map_err(|err| {
        etl_error!(
            ErrorKind::ConversionError,
            "Failed to create Arrow RecordBatch",
            format!("{}: {err}", schema.name),
            source: err
        )
    })?;

    debug!(
        table = schema.name,
        rows = batch.num_rows(),
        columns = batch.num_columns(),
        "created arrow record batch"
    );

    Ok(batch)
}

/// Builds an Arrow array for one column from the table rows.
fn build_array_for_column(
    rows: &[TableRow],
    index: usize,
    column: &ColumnSchema,
) -> EtlResult<ArrayRef> {
    match column.typ {
        ColumnType::Bool => build_boolean_array(rows, index, column),
        ColumnType::Int32 => build_int32_array(rows, index, column),
        ColumnType::Int64 => build_int64_array(rows, index, column),
        ColumnType::Float64 => build_float64_array(rows, index, column),
        ColumnType::Text => build_string_array(rows, index, column),
    }
}

/// Returns the typed value of a cell, [`None`] for nulls, or an error on a type mismatch.
fn typed_value<'a, T>(
    row: &'a TableRow,
    index: usize,
    column: &ColumnSchema,
    extract: impl FnOnce(&'a Cell) -> Option<T>,
) -> EtlResult<Option<T>> {
    let cell = row.get(index).unwrap_or(&Cell::Null);
    if cell.is_null() {
        if !column.nullable {
            return Err(etl_error!(
                ErrorKind::ConversionError,
                "Null value in non-nullable column",
                column.name
            ));
        }

        return Ok(None);
    }

    match extract(cell) {
        Some(value) => Ok(Some(value)),
        None => Err(etl_error!(
            ErrorKind::ConversionError,
            "Cell does not match column type",
            format!("{} ({}): {cell:?}", column.name, column.typ)
        )),
    }
}

/// Builds a boolean array from cell values.
fn build_boolean_array(
    rows: &[TableRow],
    index: usize,
    column: &ColumnSchema,
) -> EtlResult<ArrayRef> {
    let mut builder = BooleanBuilder::with_capacity(rows.len());

    for row in rows {
        let value = typed_value(row, index, column, |cell| match cell {
            Cell::Bool(value) => Some(*value),
            _ => None,
        })?;
        builder.append_option(value);
    }

    Ok(Arc::new(builder.finish()))
}

/// Builds an int32 array from cell values.
fn build_int32_array(
    rows: &[TableRow],
    index: usize,
    column: &ColumnSchema,
) -> EtlResult<ArrayRef> {
    let mut builder = Int32Builder::with_capacity(rows.len());

    for row in rows {
        let value = typed_value(row, index, column, |cell| match cell {
            Cell::I32(value) => Some(*value),
            _ => None,
        })?;
        builder.append_option(value);
    }

    Ok(Arc::new(builder.finish()))
}

/// Builds an int64 array from cell values.
fn build_int64_array(
    rows: &[TableRow],
    index: usize,
    column: &ColumnSchema,
) -> EtlResult<ArrayRef> {
    let mut builder = Int64Builder::with_capacity(rows.len());

    for row in rows {
        let value = typed_value(row, index, column, Cell::as_i64)?;
        builder.append_option(value);
    }

    Ok(Arc::new(builder.finish()))
}

/// Builds a float64 array from cell values.
fn build_float64_array(
    rows: &[TableRow],
    index: usize,
    column: &ColumnSchema,
) -> EtlResult<ArrayRef> {
    let mut builder = Float64Builder::with_capacity(rows.len());

    for row in rows {
        let value = typed_value(row, index, column, Cell::as_f64)?;
        builder.append_option(value);
    }

    Ok(Arc::new(builder.finish()))
}

/// Builds a string array from cell values.
fn build_string_array(
    rows: &[TableRow],
    index: usize,
    column: &ColumnSchema,
) -> EtlResult<ArrayRef> {
    let mut builder = StringBuilder::with_capacity(rows.len(), rows.len() * 16);

    for row in rows {
        let value = typed_value(row, index, column, Cell::as_str)?;
        builder.append_option(value);
    }

    Ok(Arc::new(builder.finish()))
}

/// Serializes a record batch into an in-memory Parquet file.
pub fn encode_parquet(batch: &RecordBatch) -> EtlResult<Bytes> {
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut buffer = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buffer, batch.schema(), Some(props)).map_err(
        |err| {
            etl_error!(
                ErrorKind::DestinationError,
                "Failed to create Parquet writer",
                source: err
            )
        },
    )?;

    writer.write(batch).map_err(|err| {
        etl_error!(
            ErrorKind::DestinationError,
            "Failed to write Parquet row group",
            source: err
        )
    })?;
    writer.close().map_err(|err| {
        etl_error!(
            ErrorKind::DestinationError,
            "Failed to finish Parquet file",
            source: err
        )
    })?;

    Ok(Bytes::from(buffer))
}
