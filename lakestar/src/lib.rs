//! Core of the lakestar star-schema pipeline.
//!
//! Reads raw catalog and usage-log records from a file tree, derives the `items`, `publishers`,
//! `actors` and `time` dimensions plus the `events` fact table, and hands every table to a
//! [`destination::Destination`] together with its partitioning scheme.
//!
//! The stages run along a fixed dependency graph:
//!
//! ```text
//! source reader ──┬─> catalog transform ──┐
//!                 └─> log transform ──────┴─> fact assembler ──> destination
//! ```
//!
//! [`pipeline::Pipeline`] drives a complete run and returns a [`pipeline::RunSummary`] with the
//! counts of every skipped, filtered and unmatched row.

pub mod destination;
pub mod error;
mod macros;
pub mod metrics;
pub mod pipeline;
pub mod source;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod transform;
pub mod types;
