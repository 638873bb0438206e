use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is empty.
    #[error("`{0}` cannot be empty")]
    EmptyField(&'static str),
    /// The catalog and log datasets point to the same directory.
    #[error("`catalog_dir` and `logs_dir` must differ, both are `{0}`")]
    SameDatasetDirectory(String),
    /// A remote output root was configured without storage credentials.
    #[error("output root `{0}` is remote but no `storage` credentials are configured")]
    MissingStorageCredentials(String),
    /// A field value violates a constraint.
    #[error("invalid value for `{field}`: {constraint}")]
    InvalidFieldValue { field: String, constraint: String },
}
