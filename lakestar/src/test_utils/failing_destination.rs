use std::collections::HashSet;

use crate::destination::Destination;
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::types::{TableRow, TableSchema};

/// Destination wrapper that fails writes of the configured tables.
///
/// Writes of every other table are forwarded to the wrapped destination.
#[derive(Debug, Clone)]
pub struct FailingDestination<D> {
    wrapped_destination: D,
    failing_tables: HashSet<&'static str>,
}

impl<D> FailingDestination<D> {
    pub fn wrap(destination: D, failing_tables: &[&'static str]) -> Self {
        Self {
            wrapped_destination: destination,
            failing_tables: failing_tables.iter().copied().collect(),
        }
    }

    pub fn inner(&self) -> &D {
        &self.wrapped_destination
    }
}

impl<D> Destination for FailingDestination<D>
where
    D: Destination + Send + Sync,
{
    fn name() -> &'static str {
        "failing"
    }

    async fn write_table(&self, schema: &TableSchema, table_rows: Vec<TableRow>) -> EtlResult<()> {
        if self.failing_tables.contains(schema.name) {
            return Err(etl_error!(
                ErrorKind::WriteFailure,
                "Injected table write failure",
                schema.name
            ));
        }

        self.wrapped_destination
            .write_table(schema, table_rows)
            .await
    }
}
