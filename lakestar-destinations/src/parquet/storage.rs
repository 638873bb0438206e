use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use iceberg::io::{FileIO, S3_ACCESS_KEY_ID, S3_ENDPOINT, S3_REGION, S3_SECRET_ACCESS_KEY};
use lakestar::error::{ErrorKind, EtlError, EtlResult};
use lakestar::{bail, etl_error};
use lakestar_config::shared::{StorageConfig, is_remote_uri};
use secrecy::ExposeSecret;
use tracing::{debug, warn};

/// A file of a table, addressed relative to the table directory.
#[derive(Debug, Clone, PartialEq)]
pub struct TableFile {
    pub path: String,
    pub contents: Bytes,
}

/// Where the Parquet destination stores its tables.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Local(LocalStorage),
    Object(ObjectStorage),
}

impl StorageBackend {
    /// Picks the backend matching the scheme of `output_root`.
    ///
    /// `s3://` and `s3a://` roots need credentials; anything else is a local directory.
    pub fn for_output_root(output_root: &str, storage: Option<&StorageConfig>) -> EtlResult<Self> {
        if !is_remote_uri(output_root) {
            return Ok(StorageBackend::Local(LocalStorage::new(output_root)));
        }

        let Some(storage) = storage else {
            bail!(
                ErrorKind::ConfigError,
                "Object storage output requires credentials",
                output_root
            );
        };

        Ok(StorageBackend::Object(ObjectStorage::new(output_root, storage)?))
    }

    /// Returns the location of `table`, for logging.
    pub fn table_location(&self, table: &str) -> String {
        match self {
            StorageBackend::Local(storage) => storage.table_dir(table).display().to_string(),
            StorageBackend::Object(storage) => storage.table_location(table),
        }
    }

    /// Replaces every file of `table` with `files`.
    pub async fn replace_table(&self, table: &str, files: Vec<TableFile>) -> EtlResult<()> {
        match self {
            StorageBackend::Local(storage) => storage.replace_table(table, files).await,
            StorageBackend::Object(storage) => storage.replace_table(table, files).await,
        }
    }
}

/// Tables stored as directories on the local filesystem.
///
/// A replacement is staged in a hidden sibling directory and swapped in with renames, so a
/// failed write leaves the previous table untouched.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn table_dir(&self, table: &str) -> PathBuf {
        self.root.join(table)
    }

    async fn replace_table(&self, table: &str, files: Vec<TableFile>) -> EtlResult<()> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|err| io_error("Failed to create output root", &self.root, err))?;

        let run_id = uuid::Uuid::new_v4();
        let staging_dir = self.root.join(format!(".{table}-staging-{run_id}"));
        if let Err(err) = write_files(&staging_dir, files).await {
            remove_dir_quietly(&staging_dir).await;
            return Err(err);
        }

        let table_dir = self.table_dir(table);
        let retired_dir = self.root.join(format!(".{table}-retired-{run_id}"));
        let had_previous = tokio::fs::try_exists(&table_dir)
            .await
            .map_err(|err| io_error("Failed to inspect table directory", &table_dir, err))?;

        if had_previous {
            if let Err(err) = tokio::fs::rename(&table_dir, &retired_dir).await {
                remove_dir_quietly(&staging_dir).await;
                return Err(io_error("Failed to retire previous table", &table_dir, err));
            }
        }

        if let Err(err) = tokio::fs::rename(&staging_dir, &table_dir).await {
            if had_previous {
                if let Err(restore_err) = tokio::fs::rename(&retired_dir, &table_dir).await {
                    warn!(
                        table,
                        error = %restore_err,
                        "failed to restore previous table after a failed swap"
                    );
                }
            }
            remove_dir_quietly(&staging_dir).await;

            return Err(io_error("Failed to publish staged table", &table_dir, err));
        }

        if had_previous {
            remove_dir_quietly(&retired_dir).await;
        }

        debug!(table, location = %table_dir.display(), "replaced local table");

        Ok(())
    }
}

async fn write_files(dir: &Path, files: Vec<TableFile>) -> EtlResult<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|err| io_error("Failed to create staging directory", dir, err))?;

    for file in files {
        let path = dir.join(&file.path);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| io_error("Failed to create partition directory", parent, err))?;
        }

        tokio::fs::write(&path, &file.contents)
            .await
            .map_err(|err| io_error("Failed to write table file", &path, err))?;
    }

    Ok(())
}

async fn remove_dir_quietly(dir: &Path) {
    if let Err(err) = tokio::fs::remove_dir_all(dir).await {
        if err.kind() != std::io::ErrorKind::NotFound {
            warn!(path = %dir.display(), error = %err, "failed to remove directory");
        }
    }
}

fn io_error(description: &'static str, path: &Path, err: std::io::Error) -> EtlError {
    etl_error!(
        ErrorKind::DestinationIoError,
        description,
        path.display(),
        source: err
    )
}

/// Tables stored under an `s3://` or `s3a://` prefix, accessed through Iceberg's [`FileIO`].
///
/// Object stores cannot rename directories, so a replacement deletes the previous objects of
/// the table before uploading the new ones.
#[derive(Debug, Clone)]
pub struct ObjectStorage {
    root: String,
    file_io: FileIO,
}

impl ObjectStorage {
    pub fn new(root: &str, storage: &StorageConfig) -> EtlResult<Self> {
        let mut props: HashMap<String, String> = HashMap::new();
        props.insert(
            S3_ACCESS_KEY_ID.to_string(),
            storage.access_key_id.expose_secret().to_string(),
        );
        props.insert(
            S3_SECRET_ACCESS_KEY.to_string(),
            storage.secret_access_key.expose_secret().to_string(),
        );
        if let Some(region) = &storage.region {
            props.insert(S3_REGION.to_string(), region.clone());
        }
        if let Some(endpoint) = &storage.endpoint {
            props.insert(S3_ENDPOINT.to_string(), endpoint.clone());
        }

        let file_io = FileIO::from_path(root)
            .and_then(|builder| builder.with_props(props).build())
            .map_err(|err| {
                etl_error!(
                    ErrorKind::ConfigError,
                    "Failed to configure object storage",
                    root,
                    source: err
                )
            })?;

        Ok(Self {
            root: root.trim_end_matches('/').to_string(),
            file_io,
        })
    }

    pub fn table_location(&self, table: &str) -> String {
        format!("{}/{table}", self.root)
    }

    async fn replace_table(&self, table: &str, files: Vec<TableFile>) -> EtlResult<()> {
        let location = self.table_location(table);

        self.file_io
            .remove_all(format!("{location}/"))
            .await
            .map_err(|err| {
                etl_error!(
                    ErrorKind::DestinationIoError,
                    "Failed to remove previous table objects",
                    location,
                    source: err
                )
            })?;

        for file in files {
            let path = format!("{location}/{}", file.path);
            let output = self.file_io.new_output(&path).map_err(|err| {
                etl_error!(
                    ErrorKind::DestinationIoError,
                    "Failed to open table object",
                    path,
                    source: err
                )
            })?;

            output.write(file.contents).await.map_err(|err| {
                etl_error!(
                    ErrorKind::DestinationIoError,
                    "Failed to upload table object",
                    path,
                    source: err
                )
            })?;
        }

        debug!(table, location, "replaced object storage table");

        Ok(())
    }
}
