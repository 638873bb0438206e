//! Derivation of the dimension and fact tables from the raw datasets.

pub mod catalog;
pub mod fact;
pub mod keys;
pub mod log;
pub mod matching;
pub mod time;
