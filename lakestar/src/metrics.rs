//! Metrics definitions for pipeline runs.

use std::sync::Once;

use metrics::{Unit, describe_counter};

static REGISTER_METRICS: Once = Once::new();

/// Label for the source dataset in metrics.
pub const DATASET_LABEL: &str = "dataset";

/// Label for the output table in metrics.
pub const TABLE_NAME_LABEL: &str = "table_name";

/// Label for the join in metrics.
pub const JOIN_LABEL: &str = "join";

/// Label for the reason a row was filtered.
pub const REASON_LABEL: &str = "reason";

/// Counter for records parsed from source files.
pub const LAKESTAR_SOURCE_RECORDS_TOTAL: &str = "lakestar_source_records_total";

/// Counter for malformed source records that were skipped.
pub const LAKESTAR_SOURCE_RECORDS_SKIPPED_TOTAL: &str = "lakestar_source_records_skipped_total";

/// Counter for log rows removed by the play filter or the quality filter.
pub const LAKESTAR_LOG_ROWS_FILTERED_TOTAL: &str = "lakestar_log_rows_filtered_total";

/// Counter for rows dropped by an inner join or left unmatched by a left join.
pub const LAKESTAR_JOIN_UNMATCHED_TOTAL: &str = "lakestar_join_unmatched_total";

/// Counter for text matches that had more than one candidate.
pub const LAKESTAR_JOIN_AMBIGUOUS_TOTAL: &str = "lakestar_join_ambiguous_total";

/// Counter for rows handed to the destination.
pub const LAKESTAR_TABLE_ROWS_WRITTEN_TOTAL: &str = "lakestar_table_rows_written_total";

/// Registers the descriptions of the pipeline metrics.
///
/// Safe to call multiple times. Descriptions are only registered once.
pub fn register_metrics() {
    REGISTER_METRICS.call_once(|| {
        describe_counter!(
            LAKESTAR_SOURCE_RECORDS_TOTAL,
            Unit::Count,
            "Records parsed from source files, labeled by dataset"
        );

        describe_counter!(
            LAKESTAR_SOURCE_RECORDS_SKIPPED_TOTAL,
            Unit::Count,
            "Malformed source records skipped, labeled by dataset"
        );

        describe_counter!(
            LAKESTAR_LOG_ROWS_FILTERED_TOTAL,
            Unit::Count,
            "Log rows removed before dimension derivation, labeled by reason"
        );

        describe_counter!(
            LAKESTAR_JOIN_UNMATCHED_TOTAL,
            Unit::Count,
            "Fact rows without a dimension match, labeled by join"
        );

        describe_counter!(
            LAKESTAR_JOIN_AMBIGUOUS_TOTAL,
            Unit::Count,
            "Text matches resolved among several candidates, labeled by join"
        );

        describe_counter!(
            LAKESTAR_TABLE_ROWS_WRITTEN_TOTAL,
            Unit::Count,
            "Rows handed to the destination, labeled by table"
        );
    });
}
