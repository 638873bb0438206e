use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexSet;
use lakestar_config::shared::PipelineConfig;
use metrics::counter;
use serde_json::{Deserializer, Value};
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::bail;
use crate::error::{ErrorKind, EtlResult};
use crate::etl_error;
use crate::metrics::{
    DATASET_LABEL, LAKESTAR_SOURCE_RECORDS_SKIPPED_TOTAL, LAKESTAR_SOURCE_RECORDS_TOTAL,
};
use crate::source::SourceRecord;

/// Extensions of the files picked up by discovery.
const SOURCE_EXTENSIONS: [&str; 2] = ["json", "jsonl"];

/// The two raw datasets a run reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    Catalog,
    Logs,
}

impl Dataset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dataset::Catalog => "catalog",
            Dataset::Logs => "logs",
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// All records of one dataset in a uniform tabular form.
///
/// `columns` is the union of field names observed across the records, in first-seen order.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub dataset: Dataset,
    pub files: usize,
    pub columns: IndexSet<String>,
    pub records: Vec<SourceRecord>,
    /// Number of malformed records skipped while parsing.
    pub skipped: u64,
}

impl SourceTable {
    fn new(dataset: Dataset) -> Self {
        Self {
            dataset,
            files: 0,
            columns: IndexSet::new(),
            records: Vec::new(),
            skipped: 0,
        }
    }

    fn push_value(&mut self, value: Value) {
        match value {
            Value::Object(fields) => {
                for name in fields.keys() {
                    if !self.columns.contains(name) {
                        self.columns.insert(name.clone());
                    }
                }
                self.records.push(SourceRecord::new(fields));
            }
            _ => self.skipped += 1,
        }
    }

    /// Number of records successfully parsed.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Discovers and parses the raw dataset files under the configured input root.
#[derive(Debug, Clone)]
pub struct SourceReader {
    input_root: PathBuf,
    catalog_dir: String,
    logs_dir: String,
}

impl SourceReader {
    /// Creates a reader for the datasets described by `config`.
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            input_root: PathBuf::from(&config.input_root),
            catalog_dir: config.catalog_dir.clone(),
            logs_dir: config.logs_dir.clone(),
        }
    }

    /// Returns the directory holding `dataset`.
    pub fn dataset_dir(&self, dataset: Dataset) -> PathBuf {
        match dataset {
            Dataset::Catalog => self.input_root.join(&self.catalog_dir),
            Dataset::Logs => self.input_root.join(&self.logs_dir),
        }
    }

    /// Reads every record of `dataset`.
    ///
    /// Discovery and parsing run on the blocking thread pool. Fails with
    /// [`ErrorKind::SourceNotFound`] when the dataset directory is missing or holds no source
    /// files. Malformed records are skipped and counted in [`SourceTable::skipped`].
    pub async fn read(&self, dataset: Dataset) -> EtlResult<SourceTable> {
        let dir = self.dataset_dir(dataset);

        let table = tokio::task::spawn_blocking(move || read_dataset(dataset, &dir)).await??;

        counter!(LAKESTAR_SOURCE_RECORDS_TOTAL, DATASET_LABEL => dataset.as_str())
            .increment(table.records.len() as u64);
        if table.skipped > 0 {
            counter!(LAKESTAR_SOURCE_RECORDS_SKIPPED_TOTAL, DATASET_LABEL => dataset.as_str())
                .increment(table.skipped);
        }

        info!(
            %dataset,
            files = table.files,
            records = table.records.len(),
            columns = table.columns.len(),
            skipped = table.skipped,
            "read source dataset"
        );

        Ok(table)
    }
}

/// Reads a whole dataset synchronously.
pub fn read_dataset(dataset: Dataset, dir: &Path) -> EtlResult<SourceTable> {
    let files = discover_files(dir)?;
    if files.is_empty() {
        bail!(
            ErrorKind::SourceNotFound,
            "No source files found for dataset",
            format!("{dataset}: {}", dir.display())
        );
    }

    let mut table = SourceTable::new(dataset);
    for path in &files {
        let contents = fs::read_to_string(path).map_err(|err| {
            etl_error!(
                ErrorKind::SourceIoError,
                "Failed to read source file",
                path.display(),
                source: err
            )
        })?;

        let skipped_before = table.skipped;
        let records_before = table.records.len();
        if is_json_lines(path) {
            parse_lines(&contents, &mut table);
        } else {
            parse_document(&contents, &mut table);
        }

        let skipped = table.skipped - skipped_before;
        if skipped > 0 {
            warn!(path = %path.display(), skipped, "skipped malformed source records");
        }
        debug!(
            path = %path.display(),
            records = table.records.len() - records_before,
            "parsed source file"
        );

        table.files += 1;
    }

    Ok(table)
}

/// Lists the source files below `dir` in lexicographic path order.
///
/// Hidden files and directories are ignored.
pub fn discover_files(dir: &Path) -> EtlResult<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!(
            ErrorKind::SourceNotFound,
            "Source directory does not exist",
            dir.display()
        );
    }

    let mut files = Vec::new();
    let walker = WalkDir::new(dir)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && has_source_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }

    files.sort();

    Ok(files)
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn has_source_extension(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| {
            SOURCE_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
}

fn is_json_lines(path: &Path) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jsonl"))
}

/// Parses a file holding one object, an array of objects, or a sequence of objects.
///
/// When the file is not a valid JSON value sequence it is re-read line by line so that one
/// broken line of a JSON Lines file only costs that record.
fn parse_document(contents: &str, table: &mut SourceTable) {
    let values: Result<Vec<Value>, _> = Deserializer::from_str(contents)
        .into_iter::<Value>()
        .collect();

    match values {
        Ok(values) => {
            for value in values {
                match value {
                    Value::Array(elements) => {
                        for element in elements {
                            table.push_value(element);
                        }
                    }
                    value => table.push_value(value),
                }
            }
        }
        Err(_) => parse_lines(contents, table),
    }
}

/// Parses one record per non-empty line.
fn parse_lines(contents: &str, table: &mut SourceTable) {
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<Value>(line) {
            Ok(value) => table.push_value(value),
            Err(_) => table.skipped += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::source::Field;

    fn write(dir: &Path, relative: &str, contents: &str) {
        let path = dir.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn discovery_is_recursive_sorted_and_skips_hidden_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "B/b.json", "{}");
        write(dir.path(), "A/z/a.json", "{}");
        write(dir.path(), "A/c.jsonl", "{}");
        write(dir.path(), "A/.hidden.json", "{}");
        write(dir.path(), ".cache/x.json", "{}");
        write(dir.path(), "A/readme.txt", "{}");

        let files = discover_files(dir.path()).unwrap();
        let relative: Vec<_> = files
            .iter()
            .map(|path| path.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();

        assert_eq!(
            relative,
            vec![
                PathBuf::from("A/c.jsonl"),
                PathBuf::from("A/z/a.json"),
                PathBuf::from("B/b.json"),
            ]
        );
    }

    #[test]
    fn missing_directory_is_source_not_found() {
        let dir = TempDir::new().unwrap();

        let err = read_dataset(Dataset::Catalog, &dir.path().join("song_data")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceNotFound);
    }

    #[test]
    fn directory_without_source_files_is_source_not_found() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "notes.txt", "nothing here");

        let err = read_dataset(Dataset::Logs, dir.path()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceNotFound);
    }

    #[test]
    fn objects_arrays_and_lines_are_all_read() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "a.json", r#"{"song_id": "S1", "title": "One"}"#);
        write(
            dir.path(),
            "b.json",
            r#"[{"song_id": "S2"}, {"song_id": "S3", "year": 2001}]"#,
        );
        write(
            dir.path(),
            "c.json",
            "{\"song_id\": \"S4\"}\n{\"song_id\": \"S5\", \"duration\": 1.5}\n",
        );

        let table = read_dataset(Dataset::Catalog, dir.path()).unwrap();

        assert_eq!(table.files, 3);
        assert_eq!(table.skipped, 0);
        let ids: Vec<_> = table
            .records
            .iter()
            .filter_map(|record| record.text(Field::ItemId))
            .collect();
        assert_eq!(ids, vec!["S1", "S2", "S3", "S4", "S5"]);
        let columns: Vec<_> = table.columns.iter().map(String::as_str).collect();
        assert_eq!(columns, vec!["song_id", "title", "year", "duration"]);
    }

    #[test]
    fn malformed_records_are_skipped_and_counted() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "events.json",
            "{\"userId\": \"1\"}\n{\"userId\": \n{\"userId\": \"2\"}\n42\n",
        );
        write(dir.path(), "more.jsonl", "[1, 2]\n{\"userId\": \"3\"}\n");

        let table = read_dataset(Dataset::Logs, dir.path()).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.skipped, 3);
    }

    #[tokio::test]
    async fn reader_resolves_dataset_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "log_data/2018/11/a.json", r#"{"page": "NextSong"}"#);

        let config = PipelineConfig::new(dir.path().to_string_lossy());
        let reader = SourceReader::new(&config);

        let logs = reader.read(Dataset::Logs).await.unwrap();
        assert_eq!(logs.len(), 1);

        let err = reader.read(Dataset::Catalog).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceNotFound);
    }
}
