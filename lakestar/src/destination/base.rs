use std::future::Future;

use crate::error::EtlResult;
use crate::types::{TableRow, TableSchema};

/// Trait for systems that can store the tables produced by a run.
///
/// Every run hands each table to the destination exactly once, as a complete set of rows.
/// Writes use overwrite semantics: after a successful [`Destination::write_table`] the
/// destination holds exactly the given rows for that table, whatever it held before.
///
/// Writes of different tables run concurrently, so implementations must tolerate parallel
/// calls for distinct tables.
pub trait Destination {
    /// Returns the name of the destination.
    fn name() -> &'static str;

    /// Replaces the contents of the table described by `schema` with `table_rows`.
    ///
    /// Rows carry every column of the schema, partition columns included. How partitions are
    /// laid out is up to the destination. The method is also called with an empty list of rows so
    /// that an empty run still clears the previous output of the table.
    fn write_table(
        &self,
        schema: &TableSchema,
        table_rows: Vec<TableRow>,
    ) -> impl Future<Output = EtlResult<()>> + Send;

    /// Flushes or releases resources held by the destination at the end of a run.
    ///
    /// The default implementation is a no-op.
    fn shutdown(&self) -> impl Future<Output = EtlResult<()>> + Send {
        async { Ok(()) }
    }
}
