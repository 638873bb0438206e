use secrecy::SecretString;
use serde::{Deserialize, Serialize};

/// Credentials and endpoint settings of an S3-compatible storage backend.
///
/// This intentionally does not implement [`Serialize`] to avoid accidentally
/// leaking secrets in the config into serialized forms.
#[derive(Clone, Debug, Deserialize)]
pub struct StorageConfig {
    /// Access key id used to authenticate storage reads and writes.
    pub access_key_id: SecretString,
    /// Secret access key paired with `access_key_id`.
    pub secret_access_key: SecretString,
    /// Optional bucket region.
    #[serde(default)]
    pub region: Option<String>,
    /// Optional custom endpoint (MinIO, R2 and similar).
    #[serde(default)]
    pub endpoint: Option<String>,
}

/// Same as [`StorageConfig`] but without secrets. This type
/// implements [`Serialize`] because it does not contain secrets
/// so is safe to serialize.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfigWithoutSecrets {
    /// Optional bucket region.
    pub region: Option<String>,
    /// Optional custom endpoint.
    pub endpoint: Option<String>,
}

impl From<StorageConfig> for StorageConfigWithoutSecrets {
    fn from(value: StorageConfig) -> Self {
        StorageConfigWithoutSecrets {
            region: value.region,
            endpoint: value.endpoint,
        }
    }
}
