//! Reading of the raw nested-record datasets.

mod fields;
mod reader;

pub use fields::*;
pub use reader::*;
