use futures::future::join_all;
use lakestar_config::shared::PipelineConfig;
use metrics::counter;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::destination::Destination;
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::metrics::{LAKESTAR_TABLE_ROWS_WRITTEN_TOTAL, TABLE_NAME_LABEL, register_metrics};
use crate::source::{Dataset, SourceReader};
use crate::transform::catalog::transform_catalog;
use crate::transform::fact::{Dimensions, FactAssembler, JoinCounts};
use crate::transform::log::transform_logs;
use crate::types::{
    ActorRecord, EVENTS_TABLE, EventRecord, ItemRecord, PublisherRecord, Record, TableRow,
    TableSchema, TimeRecord, into_table_rows,
};

/// Row counts of one written table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub table: &'static str,
    pub rows: usize,
}

/// Counts describing a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub catalog_files: usize,
    pub catalog_records: usize,
    pub catalog_records_skipped: u64,
    pub catalog_rows_without_item_id: u64,
    pub log_files: usize,
    pub log_records: usize,
    pub log_records_skipped: u64,
    pub log_rows_not_play: u64,
    pub log_rows_failed_quality: u64,
    pub log_rows_invalid_timestamp: u64,
    pub publisher_join_unmatched: u64,
    pub publisher_join_ambiguous: u64,
    pub actor_join_unmatched: u64,
    pub item_join_unmatched: u64,
    pub item_join_ambiguous: u64,
    pub tables: Vec<TableSummary>,
}

impl RunSummary {
    /// Returns the number of rows written to `table`.
    pub fn table_rows(&self, table: &str) -> Option<usize> {
        self.tables
            .iter()
            .find(|summary| summary.table == table)
            .map(|summary| summary.rows)
    }

    /// Total malformed records skipped across both datasets.
    pub fn records_skipped(&self) -> u64 {
        self.catalog_records_skipped + self.log_records_skipped
    }

    fn record_joins(&mut self, joins: &JoinCounts) {
        self.publisher_join_unmatched = joins.publisher_unmatched;
        self.publisher_join_ambiguous = joins.publisher_ambiguous;
        self.actor_join_unmatched = joins.actor_unmatched;
        self.item_join_unmatched = joins.item_unmatched;
        self.item_join_ambiguous = joins.item_ambiguous;
    }
}

/// A table ready to be handed to the destination.
struct TableOutput {
    schema: TableSchema,
    rows: Vec<TableRow>,
}

impl TableOutput {
    fn from_records<R: Record>(records: Vec<R>) -> Self {
        Self {
            schema: R::table_schema(),
            rows: into_table_rows(records),
        }
    }
}

/// A single batch run from raw datasets to the five output tables.
#[derive(Debug)]
pub struct Pipeline<D> {
    config: PipelineConfig,
    destination: D,
}

impl<D> Pipeline<D>
where
    D: Destination + Clone + Send + Sync + 'static,
{
    pub fn new(config: PipelineConfig, destination: D) -> Self {
        Self {
            config,
            destination,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Runs the pipeline once.
    ///
    /// Source and transformation failures abort the run before anything is written. Table writes
    /// run concurrently and a failing write does not stop the others; all write failures are
    /// returned together once every write finished.
    pub async fn run(&self) -> EtlResult<RunSummary> {
        register_metrics();

        info!(
            input_root = %self.config.input_root,
            destination = D::name(),
            "starting pipeline run"
        );

        let mut summary = RunSummary::default();

        // We read both datasets up front, a missing dataset aborts the run before any work.
        let reader = SourceReader::new(&self.config);
        let (catalog, logs) =
            tokio::try_join!(reader.read(Dataset::Catalog), reader.read(Dataset::Logs))?;

        summary.catalog_files = catalog.files;
        summary.catalog_records = catalog.len();
        summary.catalog_records_skipped = catalog.skipped;
        summary.log_files = logs.files;
        summary.log_records = logs.len();
        summary.log_records_skipped = logs.skipped;

        let catalog_output = transform_catalog(&catalog);
        summary.catalog_rows_without_item_id = catalog_output.rows_without_item_id;

        let log_output = transform_logs(&logs, &self.config.play_page);
        summary.log_rows_not_play = log_output.filtered.non_play;
        summary.log_rows_failed_quality = log_output.filtered.failed_quality;
        summary.log_rows_invalid_timestamp = log_output.filtered.invalid_timestamp;

        // The fact table depends on the generated time keys, so it is assembled only once the
        // log transform completed.
        let assembler = FactAssembler::new(self.config.publisher_match, self.config.item_match);
        let fact_output = assembler.assemble(
            &log_output.plays,
            Dimensions {
                items: &catalog_output.items,
                publishers: &catalog_output.publishers,
                actors: &log_output.actors,
                times: &log_output.times,
            },
        )?;
        summary.record_joins(&fact_output.joins);

        let outputs = vec![
            TableOutput::from_records::<ItemRecord>(catalog_output.items),
            TableOutput::from_records::<PublisherRecord>(catalog_output.publishers),
            TableOutput::from_records::<ActorRecord>(log_output.actors),
            TableOutput::from_records::<TimeRecord>(log_output.times),
            TableOutput::from_records::<EventRecord>(fact_output.events),
        ];
        summary.tables = outputs
            .iter()
            .map(|output| TableSummary {
                table: output.schema.name,
                rows: output.rows.len(),
            })
            .collect();

        self.write_tables(outputs).await?;

        if summary.records_skipped() > 0 {
            warn!(
                catalog = summary.catalog_records_skipped,
                logs = summary.log_records_skipped,
                "malformed source records were skipped"
            );
        }

        info!(
            tables = summary.tables.len(),
            events = summary.table_rows(EVENTS_TABLE).unwrap_or_default(),
            "pipeline run completed"
        );

        Ok(summary)
    }

    /// Writes every table concurrently and aggregates the failures.
    async fn write_tables(&self, outputs: Vec<TableOutput>) -> EtlResult<()> {
        let writes = outputs.into_iter().map(|output| self.write_table(output));

        let errors: Vec<_> = join_all(writes)
            .await
            .into_iter()
            .filter_map(Result::err)
            .collect();

        if !errors.is_empty() {
            info!("{} table writes failed with an error", errors.len());

            return Err(errors.into());
        }

        self.destination.shutdown().await
    }

    async fn write_table(&self, output: TableOutput) -> EtlResult<()> {
        let TableOutput { schema, rows } = output;

        schema.validate().map_err(|key| {
            etl_error!(
                ErrorKind::InvalidState,
                "Partition key names no column",
                format!("{}.{key}", schema.name)
            )
        })?;

        let row_count = rows.len();
        if let Err(err) = self.destination.write_table(&schema, rows).await {
            error!(table = schema.name, error = %err, "table write failed");

            return Err(err);
        }

        counter!(LAKESTAR_TABLE_ROWS_WRITTEN_TOTAL, TABLE_NAME_LABEL => schema.name)
            .increment(row_count as u64);
        info!(table = schema.name, rows = row_count, "table written");

        Ok(())
    }
}
