//! Destination implementations for lakestar.
//!
//! Provides the Parquet destination, which lays every table out as Hive-style partition
//! directories on the local filesystem or on S3-compatible object storage.

mod metrics;
pub mod parquet;
