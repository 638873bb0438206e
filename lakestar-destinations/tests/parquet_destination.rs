use std::fs::File;
use std::path::Path;

use arrow::array::{Array, AsArray};
use arrow::datatypes::Int64Type;
use arrow::record_batch::RecordBatch;
use lakestar::destination::Destination;
use lakestar::error::ErrorKind;
use lakestar::pipeline::Pipeline;
use lakestar::test_utils::fixtures::{
    NEW_YEAR_2020_MILLIS, SourceTree, catalog_record, play_event,
};
use lakestar::types::{Cell, ColumnSchema, ColumnType, TableRow, TableSchema};
use lakestar_destinations::parquet::{
    HIVE_DEFAULT_PARTITION, PART_FILE_NAME, ParquetDestination, SUCCESS_MARKER,
};
use lakestar_telemetry::tracing::init_test_tracing;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tempfile::TempDir;

fn read_parquet(path: &Path) -> Vec<RecordBatch> {
    let file = File::open(path).unwrap_or_else(|err| panic!("{}: {err}", path.display()));
    ParquetRecordBatchReaderBuilder::try_new(file)
        .unwrap()
        .build()
        .unwrap()
        .map(Result::unwrap)
        .collect()
}

fn row_count(batches: &[RecordBatch]) -> usize {
    batches.iter().map(RecordBatch::num_rows).sum()
}

fn column_names(batches: &[RecordBatch]) -> Vec<String> {
    batches[0]
        .schema()
        .fields()
        .iter()
        .map(|field| field.name().clone())
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_writes_hive_partitioned_tables() {
    init_test_tracing();

    let tree = SourceTree::new();
    tree.write_catalog(&[
        catalog_record("SO1", "Intro", "AR1", "The Band", 2004),
        catalog_record("SO2", "Unknown Year", "AR1", "The Band", 0),
    ]);
    tree.write_logs(
        "2020/01/events.json",
        &[
            play_event("10", 1, NEW_YEAR_2020_MILLIS + 1_000, "Intro", "The Band"),
            play_event("11", 2, NEW_YEAR_2020_MILLIS + 2_000, "Missing", "The Band"),
        ],
    );

    let output = TempDir::new().unwrap();
    let destination = ParquetDestination::local(output.path());
    Pipeline::new(tree.config(), destination).run().await.unwrap();

    let root = output.path();
    for table in ["items", "publishers", "actors", "time", "events"] {
        assert!(root.join(table).join(SUCCESS_MARKER).exists(), "{table}");
    }

    let items = read_parquet(
        &root.join("items/release_year=2004/publisher_id=AR1").join(PART_FILE_NAME),
    );
    assert_eq!(row_count(&items), 1);
    assert_eq!(column_names(&items), vec!["item_id", "title", "duration_seconds"]);
    assert!(root.join("items/release_year=0/publisher_id=AR1").is_dir());

    let publishers = read_parquet(&root.join("publishers").join(PART_FILE_NAME));
    assert_eq!(row_count(&publishers), 1);

    let events = read_parquet(&root.join("events/year=2020/month=1").join(PART_FILE_NAME));
    assert_eq!(row_count(&events), 2);
    assert!(!column_names(&events).contains(&"year".to_string()));

    let batch = &events[0];
    let songplay_ids = batch
        .column_by_name("songplay_id")
        .unwrap()
        .as_primitive::<Int64Type>();
    assert_eq!(songplay_ids.values().to_vec(), vec![1, 2]);
    let item_ids = batch.column_by_name("item_id").unwrap().as_string::<i32>();
    assert_eq!(item_ids.value(0), "SO1");
    assert!(item_ids.is_null(1));

    let time = read_parquet(&root.join("time/year=2020/month=1").join(PART_FILE_NAME));
    assert_eq!(row_count(&time), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn rewriting_a_table_drops_stale_partitions() {
    init_test_tracing();

    let output = TempDir::new().unwrap();
    let destination = ParquetDestination::local(output.path());
    let schema = TableSchema {
        name: "items",
        column_schemas: vec![
            ColumnSchema::required("item_id", ColumnType::Text),
            ColumnSchema::nullable("publisher_id", ColumnType::Text),
        ],
        partition_keys: vec!["publisher_id"],
    };

    destination
        .write_table(
            &schema,
            vec![TableRow::new(vec![
                Cell::String("SO1".to_string()),
                Cell::String("AR1".to_string()),
            ])],
        )
        .await
        .unwrap();
    destination
        .write_table(
            &schema,
            vec![TableRow::new(vec![Cell::String("SO2".to_string()), Cell::Null])],
        )
        .await
        .unwrap();

    let table_dir = output.path().join("items");
    assert!(!table_dir.join("publisher_id=AR1").exists());
    let batches = read_parquet(
        &table_dir
            .join(format!("publisher_id={HIVE_DEFAULT_PARTITION}"))
            .join(PART_FILE_NAME),
    );
    assert_eq!(batches[0].column(0).as_string::<i32>().value(0), "SO2");
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_rows_fail_the_write_and_keep_the_previous_table() {
    init_test_tracing();

    let output = TempDir::new().unwrap();
    let destination = ParquetDestination::local(output.path());
    let schema = TableSchema {
        name: "actors",
        column_schemas: vec![ColumnSchema::required("actor_id", ColumnType::Text)],
        partition_keys: vec![],
    };

    destination
        .write_table(
            &schema,
            vec![TableRow::new(vec![Cell::String("10".to_string())])],
        )
        .await
        .unwrap();

    let err = destination
        .write_table(&schema, vec![TableRow::new(vec![Cell::Null])])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConversionError);

    let batches = read_parquet(&output.path().join("actors").join(PART_FILE_NAME));
    assert_eq!(row_count(&batches), 1);
}

#[test]
fn object_storage_root_requires_credentials() {
    let err = ParquetDestination::from_output_root("s3://bucket/lake", None).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConfigError);
}
