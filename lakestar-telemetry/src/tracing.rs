use std::sync::Once;

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter directive applied when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

/// Filter directive applied to tests when `RUST_LOG` is not set.
const DEFAULT_TEST_FILTER: &str = "debug";

static INIT_TEST_TRACING: Once = Once::new();

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TracingError {
    /// The `RUST_LOG` directives could not be parsed.
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    /// A global subscriber was already installed.
    #[error("failed to install the global subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Builds the filter from `RUST_LOG`, falling back to `default_directive`.
fn env_filter(default_directive: &str) -> Result<EnvFilter, TracingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(default_directive)?),
    }
}

/// Installs the global tracing subscriber for a binary.
///
/// Output goes to stdout through the fmt layer and is filtered with `RUST_LOG`
/// (default `info`). Every event carries the `app` name through the root span
/// the caller enters with [`app_span`].
pub fn init_tracing() -> Result<(), TracingError> {
    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER)?)
        .with(fmt::layer().with_target(false))
        .try_init()?;

    Ok(())
}

/// Returns the root span of a run, tagging every nested event with the app name and run id.
pub fn app_span(app_name: &'static str, run_id: &str) -> tracing::Span {
    tracing::info_span!("run", app = app_name, run_id = run_id)
}

/// Installs a test subscriber once per process.
///
/// Safe to call from every test; only the first call has an effect. Output is captured by
/// the test harness.
pub fn init_test_tracing() {
    INIT_TEST_TRACING.call_once(|| {
        let filter = env_filter(DEFAULT_TEST_FILTER)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_TEST_FILTER));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_test_writer())
            .try_init();
    });
}
