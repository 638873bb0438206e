use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::environment::{Environment, UnknownEnvironment};

/// Directory searched by [`load_config`], relative to the working directory.
const CONFIGURATION_DIR: &str = "configuration";

/// Extensions tried, in order, for every configuration file.
const FILE_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

/// Stem of the file every environment starts from.
const BASE_FILE_STEM: &str = "base";

/// Prefix of the variables overriding file values, e.g. `APP_PIPELINE__INPUT_ROOT`.
const ENV_PREFIX: &str = "APP";

/// Separates nested keys in override variables.
const ENV_KEY_SEPARATOR: &str = "__";

#[derive(Debug, Error)]
pub enum LoadConfigError {
    #[error("failed to determine the current directory: {0}")]
    CurrentDir(#[source] io::Error),

    #[error("configuration directory `{}` does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error(transparent)]
    Environment(#[from] UnknownEnvironment),

    #[error("no `{stem}` configuration file (.yaml, .yml or .json) in `{}`", directory.display())]
    MissingFile { stem: &'static str, directory: PathBuf },

    #[error("failed to read configuration: {0}")]
    Read(#[source] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Deserialize(#[source] config::ConfigError),
}

/// Layers `base`, the environment file and `APP_` variables, later layers winning.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    directory: PathBuf,
    environment: Environment,
}

impl ConfigLoader {
    /// Creates a loader for `directory` in the given environment.
    pub fn new(directory: impl Into<PathBuf>, environment: Environment) -> Self {
        Self {
            directory: directory.into(),
            environment,
        }
    }

    /// Reads every layer and deserializes the merged result.
    pub fn load<T: DeserializeOwned>(&self) -> Result<T, LoadConfigError> {
        if !self.directory.is_dir() {
            return Err(LoadConfigError::MissingDirectory(self.directory.clone()));
        }

        let base = self.layer_file(BASE_FILE_STEM)?;
        let overrides = self.layer_file(self.environment.file_stem())?;

        config::Config::builder()
            .add_source(config::File::from(base))
            .add_source(config::File::from(overrides))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator(ENV_KEY_SEPARATOR),
            )
            .build()
            .map_err(LoadConfigError::Read)?
            .try_deserialize()
            .map_err(LoadConfigError::Deserialize)
    }

    fn layer_file(&self, stem: &'static str) -> Result<PathBuf, LoadConfigError> {
        FILE_EXTENSIONS
            .iter()
            .map(|extension| self.directory.join(format!("{stem}.{extension}")))
            .find(|path| path.is_file())
            .ok_or_else(|| LoadConfigError::MissingFile {
                stem,
                directory: self.directory.clone(),
            })
    }
}

/// Loads `T` from `./configuration` in the environment named by `APP_ENVIRONMENT`.
pub fn load_config<T: DeserializeOwned>() -> Result<T, LoadConfigError> {
    let directory = std::env::current_dir().map_err(LoadConfigError::CurrentDir)?;

    load_config_from(directory.join(CONFIGURATION_DIR))
}

/// Loads `T` from `directory` in the environment named by `APP_ENVIRONMENT`.
pub fn load_config_from<T: DeserializeOwned>(
    directory: impl AsRef<Path>,
) -> Result<T, LoadConfigError> {
    ConfigLoader::new(directory.as_ref(), Environment::from_env()?).load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::{DestinationConfig, RunnerConfig, TextMatchMode};
    use std::fs;

    const BASE: &str = r#"
pipeline:
  input_root: "data"
destination:
  parquet:
    output_root: "output"
"#;

    fn configuration_dir(files: &[(&str, &str)]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            fs::write(dir.path().join(name), contents).unwrap();
        }
        dir
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let err = ConfigLoader::new(&missing, Environment::Dev)
            .load::<RunnerConfig>()
            .unwrap_err();

        assert!(matches!(err, LoadConfigError::MissingDirectory(path) if path == missing));
    }

    #[test]
    fn missing_environment_file_names_its_stem() {
        let dir = configuration_dir(&[("base.yaml", BASE)]);

        let err = ConfigLoader::new(dir.path(), Environment::Prod)
            .load::<RunnerConfig>()
            .unwrap_err();

        assert!(matches!(err, LoadConfigError::MissingFile { stem: "prod", .. }));
    }

    #[test]
    fn environment_file_overrides_base_file() {
        let dir = configuration_dir(&[
            ("base.yaml", BASE),
            (
                "dev.yml",
                r#"
pipeline:
  input_root: "dev-data"
  item_match: "substring"
"#,
            ),
        ]);

        let config = ConfigLoader::new(dir.path(), Environment::Dev)
            .load::<RunnerConfig>()
            .unwrap();

        assert_eq!(config.pipeline.input_root, "dev-data");
        assert_eq!(config.pipeline.catalog_dir, "song_data");
        assert_eq!(config.pipeline.item_match, TextMatchMode::Substring);
        assert_eq!(
            config.pipeline.publisher_match,
            TextMatchMode::CaseInsensitive
        );
        assert!(matches!(
            config.destination,
            DestinationConfig::Parquet { ref output_root, storage: None } if output_root == "output"
        ));
    }

    #[test]
    fn prod_reads_its_own_json_file() {
        let dir = configuration_dir(&[
            ("base.yaml", BASE),
            ("dev.yaml", "{}"),
            ("prod.json", r#"{"pipeline": {"input_root": "/var/lib/lakestar"}}"#),
        ]);

        let config = ConfigLoader::new(dir.path(), Environment::Prod)
            .load::<RunnerConfig>()
            .unwrap();

        assert_eq!(config.pipeline.input_root, "/var/lib/lakestar");
    }

    #[test]
    fn unparsable_file_is_a_read_error() {
        let dir = configuration_dir(&[("base.yaml", "pipeline: [unclosed"), ("dev.yaml", "{}")]);

        let err = ConfigLoader::new(dir.path(), Environment::Dev)
            .load::<RunnerConfig>()
            .unwrap_err();

        assert!(matches!(err, LoadConfigError::Read(_)));
    }
}
