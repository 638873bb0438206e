//! Configuration for lakestar batch runs.
//!
//! Provides the hierarchical configuration loader (files plus `APP_` environment overrides),
//! the runtime [`environment::Environment`] and the shared configuration types consumed by the
//! pipeline, the destinations and the runner binary.

pub mod environment;
mod load;
pub mod shared;

pub use load::{ConfigLoader, LoadConfigError, load_config, load_config_from};
