use std::path::Path;
use std::{sync::Mutex, time::Duration};

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing::trace;

// Global cache for the Prometheus handle. Only the first install of the recorder succeeds.
static PROMETHEUS_HANDLE: Mutex<Option<PrometheusHandle>> = Mutex::new(None);

/// Interval between two upkeep passes of the recorder.
const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Installs the Prometheus recorder and returns a handle for rendering.
///
/// Initialization happens only once, subsequent calls return clones of the cached handle.
/// Must be called from within a Tokio runtime, which runs the periodic upkeep task.
pub fn init_metrics_handle() -> Result<PrometheusHandle, BuildError> {
    let mut prometheus_handle = PROMETHEUS_HANDLE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    if let Some(handle) = &*prometheus_handle {
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    *prometheus_handle = Some(handle.clone());

    let handle_clone = handle.clone();

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(UPKEEP_INTERVAL).await;
            trace!("running metrics upkeep");
            handle_clone.run_upkeep();
        }
    });

    Ok(handle)
}

/// Renders the current metrics snapshot to `path` in the Prometheus text format.
/// The file is meant for a textfile collector.
pub async fn write_metrics_snapshot(
    handle: &PrometheusHandle,
    path: impl AsRef<Path>,
) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    tokio::fs::write(path, handle.render()).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn handle_is_cached_and_snapshot_is_written() {
        let first = init_metrics_handle().unwrap();
        let second = init_metrics_handle().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("lakestar.prom");

        write_metrics_snapshot(&second, &path).await.unwrap();

        assert!(path.is_file());
        assert_eq!(first.render(), second.render());
    }
}
