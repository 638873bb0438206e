//! Parquet destination with Hive-style partitioning.

mod core;
mod encoding;
mod partition;
mod storage;

pub use self::core::{PART_FILE_NAME, ParquetDestination, SUCCESS_MARKER};
pub use encoding::{arrow_schema, encode_parquet, rows_to_record_batch};
pub use partition::{HIVE_DEFAULT_PARTITION, PartitionedRows, partition_rows};
pub use storage::{LocalStorage, ObjectStorage, StorageBackend, TableFile};
