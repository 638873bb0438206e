//! Shared configuration types for lakestar runs.

mod base;
mod destination;
mod matching;
mod pipeline;
mod runner;
mod storage;

pub use base::ValidationError;
pub use destination::{DestinationConfig, DestinationConfigWithoutSecrets, is_remote_uri};
pub use matching::TextMatchMode;
pub use pipeline::PipelineConfig;
pub use runner::{RunnerConfig, RunnerConfigWithoutSecrets};
pub use storage::{StorageConfig, StorageConfigWithoutSecrets};
