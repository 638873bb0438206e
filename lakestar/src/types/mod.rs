//! Common types used throughout the pipeline.
//!
//! Holds the generic row representation handed to destinations and the typed records of the
//! five output tables.

mod cell;
mod records;
mod schema;
mod table_row;

pub use cell::*;
pub use records::*;
pub use schema::*;
pub use table_row::*;
