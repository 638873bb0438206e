use serde::{Deserialize, Serialize};

use crate::shared::{StorageConfig, StorageConfigWithoutSecrets, ValidationError};

/// URI schemes that are written through the object storage backend.
const REMOTE_SCHEMES: &[&str] = &["s3://", "s3a://"];

/// Returns whether `root` points to remote object storage rather than the local filesystem.
pub fn is_remote_uri(root: &str) -> bool {
    REMOTE_SCHEMES.iter().any(|scheme| root.starts_with(scheme))
}

/// Configuration for supported output destinations.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationConfig {
    /// Keeps every table in memory. Only useful for dry runs and tests.
    Memory,
    /// Writes every table as partitioned Parquet files.
    Parquet {
        /// Local directory or `s3://`/`s3a://` URI under which tables are written.
        output_root: String,
        /// Credentials for remote output roots.
        #[serde(default)]
        storage: Option<StorageConfig>,
    },
}

impl DestinationConfig {
    /// Validates the destination configuration.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            DestinationConfig::Memory => Ok(()),
            DestinationConfig::Parquet {
                output_root,
                storage,
            } => {
                if output_root.trim().is_empty() {
                    return Err(ValidationError::EmptyField("destination.parquet.output_root"));
                }

                if is_remote_uri(output_root) && storage.is_none() {
                    return Err(ValidationError::MissingStorageCredentials(
                        output_root.clone(),
                    ));
                }

                Ok(())
            }
        }
    }
}

/// Same as [`DestinationConfig`] but without secrets. This type
/// implements [`Serialize`] because it does not contain secrets
/// so is safe to serialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationConfigWithoutSecrets {
    Memory,
    Parquet {
        output_root: String,
        storage: Option<StorageConfigWithoutSecrets>,
    },
}

impl From<DestinationConfig> for DestinationConfigWithoutSecrets {
    fn from(value: DestinationConfig) -> Self {
        match value {
            DestinationConfig::Memory => DestinationConfigWithoutSecrets::Memory,
            DestinationConfig::Parquet {
                output_root,
                storage,
            } => DestinationConfigWithoutSecrets::Parquet {
                output_root,
                storage: storage.map(Into::into),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn remote_root_requires_credentials() {
        let config = DestinationConfig::Parquet {
            output_root: "s3a://bucket/publish".to_string(),
            storage: None,
        };

        assert!(matches!(
            config.validate(),
            Err(ValidationError::MissingStorageCredentials(root)) if root == "s3a://bucket/publish"
        ));
    }

    #[test]
    fn remote_root_with_credentials_is_valid() {
        let config = DestinationConfig::Parquet {
            output_root: "s3://bucket/publish".to_string(),
            storage: Some(StorageConfig {
                access_key_id: SecretString::from("key".to_string()),
                secret_access_key: SecretString::from("secret".to_string()),
                region: None,
                endpoint: None,
            }),
        };

        assert!(config.validate().is_ok());
    }

    #[test]
    fn local_root_needs_no_credentials() {
        let config = DestinationConfig::Parquet {
            output_root: "/tmp/output".to_string(),
            storage: None,
        };

        assert!(config.validate().is_ok());
        assert!(!is_remote_uri("/tmp/output"));
    }

    #[test]
    fn secrets_are_dropped_when_serializing() {
        let config = DestinationConfig::Parquet {
            output_root: "s3://bucket".to_string(),
            storage: Some(StorageConfig {
                access_key_id: SecretString::from("key".to_string()),
                secret_access_key: SecretString::from("super-secret".to_string()),
                region: Some("eu-west-1".to_string()),
                endpoint: None,
            }),
        };

        let without_secrets: DestinationConfigWithoutSecrets = config.into();
        let json = serde_json::to_string(&without_secrets).unwrap();

        assert!(!json.contains("super-secret"));
        assert!(json.contains("eu-west-1"));
    }
}
