use std::fs;
use std::path::PathBuf;

use lakestar_config::shared::PipelineConfig;
use serde_json::{Value, json};
use tempfile::TempDir;

/// 2020-01-01T00:00:00Z in epoch milliseconds.
pub const NEW_YEAR_2020_MILLIS: i64 = 1_577_836_800_000;

/// A raw input tree living in a temporary directory.
///
/// The directory is removed when the tree is dropped.
#[derive(Debug)]
pub struct SourceTree {
    dir: TempDir,
    config: PipelineConfig,
}

impl SourceTree {
    /// Creates an empty tree using the default dataset directories.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create source tree directory");
        let config = PipelineConfig::new(dir.path().to_string_lossy());

        Self { dir, config }
    }

    /// Returns a pipeline configuration reading from this tree.
    pub fn config(&self) -> PipelineConfig {
        self.config.clone()
    }

    /// Writes catalog records as one JSON object per file, the way the upstream corpus does.
    ///
    /// Files are named after their position so discovery order equals slice order.
    pub fn write_catalog(&self, records: &[Value]) {
        for (index, record) in records.iter().enumerate() {
            let relative = format!("A/B/C/item-{index:04}.json");
            self.write_file(&self.config.catalog_dir, &relative, &record.to_string());
        }
    }

    /// Writes log records into a single JSON Lines file.
    pub fn write_logs(&self, relative: &str, records: &[Value]) {
        let contents = records
            .iter()
            .map(Value::to_string)
            .collect::<Vec<_>>()
            .join("\n");

        self.write_file(&self.config.logs_dir, relative, &contents);
    }

    /// Writes raw text below a dataset directory.
    pub fn write_file(&self, dataset_dir: &str, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(dataset_dir).join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("failed to create fixture directory");
        }
        fs::write(&path, contents).expect("failed to write fixture file");

        path
    }
}

impl Default for SourceTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds a catalog record using the upstream field names.
pub fn catalog_record(
    item_id: &str,
    title: &str,
    publisher_id: &str,
    publisher_name: &str,
    year: i32,
) -> Value {
    json!({
        "num_songs": 1,
        "song_id": item_id,
        "title": title,
        "artist_id": publisher_id,
        "artist_name": publisher_name,
        "artist_location": "Portland, OR",
        "artist_latitude": 45.5,
        "artist_longitude": null,
        "duration": 218.93179,
        "year": year,
    })
}

/// Builds a play log record using the upstream field names.
pub fn play_event(
    actor_id: &str,
    session_id: i64,
    ts_millis: i64,
    song: &str,
    artist: &str,
) -> Value {
    json!({
        "page": "NextSong",
        "userId": actor_id,
        "sessionId": session_id,
        "ts": ts_millis,
        "song": song,
        "artist": artist,
        "firstName": "Lily",
        "lastName": "Koch",
        "gender": "F",
        "level": "paid",
        "location": "Chicago-Naperville-Elgin, IL-IN-WI",
        "userAgent": "Mozilla/5.0",
        "auth": "Logged In",
        "method": "PUT",
        "status": 200,
    })
}

/// Builds a non-play log record.
pub fn page_event(page: &str, actor_id: &str, session_id: i64, ts_millis: i64) -> Value {
    json!({
        "page": page,
        "userId": actor_id,
        "sessionId": session_id,
        "ts": ts_millis,
        "level": "free",
    })
}
