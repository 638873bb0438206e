use std::path::Path;

use lakestar_config::shared::{DestinationConfig, RunnerConfig};
use lakestar_config::{load_config, load_config_from};

use crate::error::{RunnerError, RunnerResult};

/// Command line values taking precedence over every configuration source.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub input_root: Option<String>,
    pub output_root: Option<String>,
}

impl ConfigOverrides {
    /// Applies the overrides to `config`.
    ///
    /// An output root override on a memory destination switches it to a Parquet destination
    /// without storage credentials.
    fn apply(self, config: &mut RunnerConfig) {
        if let Some(input_root) = self.input_root {
            config.pipeline.input_root = input_root;
        }

        if let Some(new_root) = self.output_root {
            match &mut config.destination {
                DestinationConfig::Parquet { output_root, .. } => *output_root = new_root,
                DestinationConfig::Memory => {
                    config.destination = DestinationConfig::Parquet {
                        output_root: new_root,
                        storage: None,
                    }
                }
            }
        }
    }
}

/// Loads, overrides and validates the runner configuration.
///
/// Without an explicit directory the `configuration` directory of the working directory is used.
pub fn load_runner_config(
    configuration_directory: Option<&Path>,
    overrides: ConfigOverrides,
) -> RunnerResult<RunnerConfig> {
    let mut config = match configuration_directory {
        Some(directory) => load_config_from::<RunnerConfig>(directory),
        None => load_config::<RunnerConfig>(),
    }
    .map_err(RunnerError::config)?;

    overrides.apply(&mut config);
    config.validate().map_err(RunnerError::config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn configuration_dir(base: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("base.yaml"), base).unwrap();
        fs::write(dir.path().join("dev.yaml"), "{}").unwrap();
        dir
    }

    #[test]
    fn overrides_replace_configured_roots() {
        let dir = configuration_dir(
            r#"
pipeline:
  input_root: "data"
destination:
  parquet:
    output_root: "output"
"#,
        );

        let config = load_runner_config(
            Some(dir.path()),
            ConfigOverrides {
                input_root: Some("/mnt/raw".to_string()),
                output_root: Some("/mnt/publish".to_string()),
            },
        )
        .unwrap();

        assert_eq!(config.pipeline.input_root, "/mnt/raw");
        assert!(matches!(
            config.destination,
            DestinationConfig::Parquet { ref output_root, .. } if output_root == "/mnt/publish"
        ));
    }

    #[test]
    fn output_root_override_turns_memory_into_parquet() {
        let dir = configuration_dir(
            r#"
pipeline:
  input_root: "data"
destination: "memory"
"#,
        );

        let config = load_runner_config(
            Some(dir.path()),
            ConfigOverrides {
                input_root: None,
                output_root: Some("publish".to_string()),
            },
        )
        .unwrap();

        assert!(matches!(
            config.destination,
            DestinationConfig::Parquet { ref output_root, storage: None } if output_root == "publish"
        ));
    }

    #[test]
    fn remote_override_without_credentials_fails_validation() {
        let dir = configuration_dir(
            r#"
pipeline:
  input_root: "data"
destination:
  parquet:
    output_root: "output"
"#,
        );

        let err = load_runner_config(
            Some(dir.path()),
            ConfigOverrides {
                input_root: None,
                output_root: Some("s3a://bucket/publish".to_string()),
            },
        )
        .unwrap_err();

        assert!(matches!(err, RunnerError::Config(_, _)));
    }
}
