//! Lakestar batch runner.
//!
//! Loads the configuration, installs tracing and the metrics recorder and runs the star schema
//! pipeline once. A failed run prints a report to stderr and exits with a non-zero status.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use lakestar_config::shared::RunnerConfig;
use lakestar_telemetry::metrics::{init_metrics_handle, write_metrics_snapshot};
use lakestar_telemetry::tracing::{app_span, init_tracing};
use tracing::{Instrument, error, info};

use crate::config::{ConfigOverrides, load_runner_config};
use crate::core::start_run_with_config;
use crate::error::{RunnerError, RunnerResult};

mod config;
mod core;
mod error;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Root directory of the raw datasets, overrides `pipeline.input_root`.
    #[arg(long)]
    input_root: Option<String>,

    /// Local directory or `s3://` URI receiving the tables, overrides
    /// `destination.parquet.output_root`.
    #[arg(long)]
    output_root: Option<String>,

    /// Directory holding `base.yaml` and the environment files. Defaults to `./configuration`.
    #[arg(long)]
    config_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprint!("{}", err.render_report());
            ExitCode::FAILURE
        }
    }
}

fn run() -> RunnerResult<()> {
    let args = Args::parse();

    init_tracing().map_err(RunnerError::config)?;

    let overrides = ConfigOverrides {
        input_root: args.input_root,
        output_root: args.output_root,
    };
    let runner_config = load_runner_config(args.config_dir.as_deref(), overrides)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(async_main(runner_config))
}

async fn async_main(runner_config: RunnerConfig) -> RunnerResult<()> {
    let run_id = uuid::Uuid::new_v4().to_string();
    let span = app_span(env!("CARGO_BIN_NAME"), &run_id);

    async move {
        // The recorder spawns its upkeep task, so it is installed inside the runtime.
        let metrics_handle = init_metrics_handle().map_err(RunnerError::config)?;
        let metrics_file = runner_config.metrics_file.clone();

        let result = start_run_with_config(runner_config).await;
        if let Err(err) = &result {
            error!("{err}");
        }

        // Failed runs get a snapshot too.
        if let Some(metrics_file) = metrics_file {
            write_metrics_snapshot(&metrics_handle, &metrics_file).await?;
            info!(path = %metrics_file, "metrics snapshot written");
        }

        result.map(|_| ())
    }
    .instrument(span)
    .await
}
