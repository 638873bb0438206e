use std::sync::Once;

use metrics::{Unit, describe_counter};

static REGISTER_METRICS: Once = Once::new();

/// Counter for Parquet files written, labeled by table.
pub const LAKESTAR_PARQUET_FILES_WRITTEN_TOTAL: &str = "lakestar_parquet_files_written_total";

/// Counter for bytes of Parquet data written, labeled by table.
pub const LAKESTAR_PARQUET_BYTES_WRITTEN_TOTAL: &str = "lakestar_parquet_bytes_written_total";

/// Register destination-specific metrics.
///
/// This should be called before using any destination metrics.
/// It's safe to call this method multiple times. It uses a `Once` internally.
pub(crate) fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            LAKESTAR_PARQUET_FILES_WRITTEN_TOTAL,
            Unit::Count,
            "Parquet files written, labeled by table"
        );

        describe_counter!(
            LAKESTAR_PARQUET_BYTES_WRITTEN_TOTAL,
            Unit::Bytes,
            "Bytes of Parquet data written, labeled by table"
        );
    });
}
