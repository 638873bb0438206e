use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use crate::destination::Destination;
use crate::error::EtlResult;
use crate::types::{TableRow, TableSchema};

#[derive(Debug)]
struct Inner {
    tables: HashMap<String, StoredTable>,
    writes: usize,
}

/// A table as last written to a [`MemoryDestination`].
#[derive(Debug, Clone)]
pub struct StoredTable {
    pub schema: TableSchema,
    pub rows: Vec<TableRow>,
}

/// In-memory destination for testing and development purposes.
///
/// [`MemoryDestination`] keeps the last written rows of every table. Clones share the same
/// storage, so a test can hand one clone to the pipeline and inspect another afterwards.
#[derive(Debug, Clone)]
pub struct MemoryDestination {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryDestination {
    /// Creates a new empty memory destination.
    pub fn new() -> Self {
        let inner = Inner {
            tables: HashMap::new(),
            writes: 0,
        };

        Self {
            inner: Arc::new(Mutex::new(inner)),
        }
    }

    /// Returns a copy of the rows last written to `table_name`.
    pub async fn table_rows(&self, table_name: &str) -> Option<Vec<TableRow>> {
        let inner = self.inner.lock().await;
        inner
            .tables
            .get(table_name)
            .map(|table| table.rows.clone())
    }

    /// Returns a copy of every stored table.
    pub async fn tables(&self) -> HashMap<String, StoredTable> {
        let inner = self.inner.lock().await;
        inner.tables.clone()
    }

    /// Returns how many table writes this destination received.
    pub async fn write_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.writes
    }

    /// Clears all stored tables.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.tables.clear();
        inner.writes = 0;
    }
}

impl Default for MemoryDestination {
    fn default() -> Self {
        Self::new()
    }
}

impl Destination for MemoryDestination {
    fn name() -> &'static str {
        "memory"
    }

    async fn write_table(&self, schema: &TableSchema, table_rows: Vec<TableRow>) -> EtlResult<()> {
        let mut inner = self.inner.lock().await;

        info!(
            table = schema.name,
            row_count = table_rows.len(),
            "writing table rows"
        );

        inner.writes += 1;
        inner.tables.insert(
            schema.name.to_string(),
            StoredTable {
                schema: schema.clone(),
                rows: table_rows,
            },
        );

        Ok(())
    }
}
