use lakestar::destination::Destination;
use lakestar::destination::memory::MemoryDestination;
use lakestar::pipeline::{Pipeline, RunSummary};
use lakestar_config::shared::{
    DestinationConfig, PipelineConfig, RunnerConfig, RunnerConfigWithoutSecrets,
};
use lakestar_destinations::parquet::ParquetDestination;
use tracing::{debug, info, warn};

use crate::error::RunnerResult;

/// Runs the pipeline once against the configured destination.
///
/// Destinations are dispatched statically, so every arm builds its own [`Pipeline`].
pub async fn start_run_with_config(runner_config: RunnerConfig) -> RunnerResult<RunSummary> {
    info!("starting lakestar run");

    log_config(&runner_config);

    let summary = match &runner_config.destination {
        DestinationConfig::Memory => {
            warn!("memory destination configured, tables are discarded when the run ends");
            let destination = MemoryDestination::new();

            run_pipeline(runner_config.pipeline, destination).await?
        }
        DestinationConfig::Parquet {
            output_root,
            storage,
        } => {
            let destination = ParquetDestination::from_output_root(output_root, storage.as_ref())?;

            run_pipeline(runner_config.pipeline, destination).await?
        }
    };

    log_summary(&summary);

    info!("lakestar run completed");

    Ok(summary)
}

async fn run_pipeline<D>(config: PipelineConfig, destination: D) -> RunnerResult<RunSummary>
where
    D: Destination + Clone + Send + Sync + 'static,
{
    let pipeline = Pipeline::new(config, destination);
    let summary = pipeline.run().await?;

    Ok(summary)
}

fn log_config(config: &RunnerConfig) {
    let without_secrets = RunnerConfigWithoutSecrets::from(config.clone());

    match serde_json::to_string(&without_secrets) {
        Ok(rendered) => debug!(config = %rendered, "loaded runner configuration"),
        Err(err) => warn!(error = %err, "failed to render runner configuration"),
    }

    let pipeline = &config.pipeline;
    info!(
        input_root = %pipeline.input_root,
        catalog_dir = %pipeline.catalog_dir,
        logs_dir = %pipeline.logs_dir,
        publisher_match = pipeline.publisher_match.as_str(),
        item_match = pipeline.item_match.as_str(),
        "pipeline config"
    );
}

fn log_summary(summary: &RunSummary) {
    for table in &summary.tables {
        info!(table = table.table, rows = table.rows, "table written");
    }

    info!(
        catalog_files = summary.catalog_files,
        log_files = summary.log_files,
        records_skipped = summary.records_skipped(),
        rows_without_item_id = summary.catalog_rows_without_item_id,
        non_play = summary.log_rows_not_play,
        failed_quality = summary.log_rows_failed_quality,
        invalid_timestamp = summary.log_rows_invalid_timestamp,
        "source summary"
    );

    info!(
        publisher_unmatched = summary.publisher_join_unmatched,
        publisher_ambiguous = summary.publisher_join_ambiguous,
        actor_unmatched = summary.actor_join_unmatched,
        item_unmatched = summary.item_join_unmatched,
        item_ambiguous = summary.item_join_ambiguous,
        "join summary"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use lakestar::test_utils::fixtures::{
        NEW_YEAR_2020_MILLIS, SourceTree, catalog_record, play_event,
    };
    use lakestar::types::EVENTS_TABLE;

    #[tokio::test(flavor = "multi_thread")]
    async fn parquet_run_reports_every_table() {
        let tree = SourceTree::new();
        tree.write_catalog(&[catalog_record("SOABC", "Intro", "AR1", "Band", 2001)]);
        tree.write_logs(
            "2020/01/events.json",
            &[play_event("7", 1, NEW_YEAR_2020_MILLIS, "Intro", "Band")],
        );
        let output = tempfile::tempdir().unwrap();

        let config = RunnerConfig {
            pipeline: tree.config(),
            destination: DestinationConfig::Parquet {
                output_root: output.path().display().to_string(),
                storage: None,
            },
            metrics_file: None,
        };

        let summary = start_run_with_config(config).await.unwrap();

        assert_eq!(summary.tables.len(), 5);
        assert_eq!(summary.table_rows(EVENTS_TABLE), Some(1));
        assert!(output.path().join(EVENTS_TABLE).is_dir());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_input_fails_the_run() {
        let output = tempfile::tempdir().unwrap();
        let config = RunnerConfig {
            pipeline: PipelineConfig::new(output.path().join("missing").display().to_string()),
            destination: DestinationConfig::Memory,
            metrics_file: None,
        };

        assert!(start_run_with_config(config).await.is_err());
    }
}
