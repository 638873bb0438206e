use serde::{Deserialize, Serialize};

use crate::shared::{
    DestinationConfig, DestinationConfigWithoutSecrets, PipelineConfig, ValidationError,
};

/// Complete configuration of a batch run.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
pub struct RunnerConfig {
    /// Configuration of the transformation pipeline.
    pub pipeline: PipelineConfig,
    /// Configuration of the destination receiving the five tables.
    pub destination: DestinationConfig,
    /// Optional file receiving the final metrics snapshot in Prometheus text format.
    #[serde(default)]
    pub metrics_file: Option<String>,
}

impl RunnerConfig {
    /// Validates the complete runner configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.pipeline.validate()?;
        self.destination.validate()
    }
}

/// Same as [`RunnerConfig`] but without secrets.
///
/// This type implements [`Serialize`] because it does not contain secrets
/// so is safe to serialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfigWithoutSecrets {
    pub pipeline: PipelineConfig,
    pub destination: DestinationConfigWithoutSecrets,
    pub metrics_file: Option<String>,
}

impl From<RunnerConfig> for RunnerConfigWithoutSecrets {
    fn from(value: RunnerConfig) -> Self {
        RunnerConfigWithoutSecrets {
            pipeline: value.pipeline,
            destination: value.destination.into(),
            metrics_file: value.metrics_file,
        }
    }
}
