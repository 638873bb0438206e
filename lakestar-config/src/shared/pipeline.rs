use serde::{Deserialize, Serialize};

use crate::shared::{TextMatchMode, ValidationError};

/// Configuration of the transformation pipeline.
///
/// Describes where the raw datasets live and how the fuzzy joins of the fact table behave.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Root directory holding both raw datasets.
    pub input_root: String,
    /// Directory, relative to `input_root`, with the catalog records.
    #[serde(default = "default_catalog_dir")]
    pub catalog_dir: String,
    /// Directory, relative to `input_root`, with the usage logs.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: String,
    /// Value of the log `page` field that marks a play action.
    #[serde(default = "default_play_page")]
    pub play_page: String,
    /// How the log's publisher name is matched against `publishers.name`.
    #[serde(default)]
    pub publisher_match: TextMatchMode,
    /// How the log's item title is matched against `items.title`.
    #[serde(default)]
    pub item_match: TextMatchMode,
}

impl PipelineConfig {
    /// Default catalog directory, matching the upstream corpus layout.
    pub const DEFAULT_CATALOG_DIR: &'static str = "song_data";

    /// Default log directory, matching the upstream corpus layout.
    pub const DEFAULT_LOGS_DIR: &'static str = "log_data";

    /// Default page value of play actions.
    pub const DEFAULT_PLAY_PAGE: &'static str = "NextSong";

    /// Creates a configuration with defaults for everything but the input root.
    pub fn new(input_root: impl Into<String>) -> Self {
        Self {
            input_root: input_root.into(),
            catalog_dir: default_catalog_dir(),
            logs_dir: default_logs_dir(),
            play_page: default_play_page(),
            publisher_match: TextMatchMode::default(),
            item_match: TextMatchMode::default(),
        }
    }

    /// Validates pipeline configuration settings.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.input_root.trim().is_empty() {
            return Err(ValidationError::EmptyField("pipeline.input_root"));
        }

        if self.catalog_dir.trim().is_empty() {
            return Err(ValidationError::EmptyField("pipeline.catalog_dir"));
        }

        if self.logs_dir.trim().is_empty() {
            return Err(ValidationError::EmptyField("pipeline.logs_dir"));
        }

        if self.play_page.is_empty() {
            return Err(ValidationError::EmptyField("pipeline.play_page"));
        }

        if self.catalog_dir == self.logs_dir {
            return Err(ValidationError::SameDatasetDirectory(
                self.catalog_dir.clone(),
            ));
        }

        Ok(())
    }
}

fn default_catalog_dir() -> String {
    PipelineConfig::DEFAULT_CATALOG_DIR.to_string()
}

fn default_logs_dir() -> String {
    PipelineConfig::DEFAULT_LOGS_DIR.to_string()
}

fn default_play_page() -> String {
    PipelineConfig::DEFAULT_PLAY_PAGE.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_upstream_layout() {
        let config = PipelineConfig::new("data");

        assert_eq!(config.catalog_dir, "song_data");
        assert_eq!(config.logs_dir, "log_data");
        assert_eq!(config.play_page, "NextSong");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn same_dataset_directory_is_rejected() {
        let mut config = PipelineConfig::new("data");
        config.logs_dir = config.catalog_dir.clone();

        assert!(matches!(
            config.validate(),
            Err(ValidationError::SameDatasetDirectory(_))
        ));
    }

    #[test]
    fn empty_input_root_is_rejected() {
        let config = PipelineConfig::new("  ");

        assert!(matches!(
            config.validate(),
            Err(ValidationError::EmptyField("pipeline.input_root"))
        ));
    }
}
