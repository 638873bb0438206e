//! Utilities for testing pipeline runs.
//!
//! - [`fixtures`] writes raw catalog and log trees into temporary directories and builds the
//!   JSON records that go into them.
//! - [`failing_destination`] wraps a destination and fails writes of selected tables.
//! - [`table`] reads typed values back out of written rows.

pub mod failing_destination;
pub mod fixtures;
pub mod table;
