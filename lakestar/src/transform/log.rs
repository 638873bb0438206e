//! Cleaning of the usage logs and derivation of the `actors` and `time` dimensions.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use indexmap::map::Entry;
use metrics::counter;
use tracing::{info, warn};

use crate::metrics::{LAKESTAR_LOG_ROWS_FILTERED_TOTAL, REASON_LABEL};
use crate::source::{Field, SourceRecord, SourceTable};
use crate::transform::time::{build_time_dimension, epoch_millis_to_utc};
use crate::types::{ActorRecord, TimeRecord};

/// A play event that passed every log filter.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRow {
    /// Position of the record in the log dataset, used as the last ordering tiebreaker.
    pub source_index: usize,
    pub actor_id: String,
    pub session_id: i64,
    pub ts_millis: i64,
    pub timestamp: DateTime<Utc>,
    pub subscription_level: Option<String>,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl PlayRow {
    /// Returns the second the event happened in, the key of its [`TimeRecord`].
    pub fn epoch_seconds(&self) -> i64 {
        self.timestamp.timestamp()
    }
}

/// Counts of log rows removed by each filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogFilterCounts {
    /// Rows whose `page` is not the play action.
    pub non_play: u64,
    /// Play rows with a null or empty `actor_id`, or a null `session_id`.
    pub failed_quality: u64,
    /// Clean rows whose `ts` is missing or out of range.
    pub invalid_timestamp: u64,
}

/// Output of [`transform_logs`].
#[derive(Debug, Clone, Default)]
pub struct LogOutput {
    /// Clean plays in source order.
    pub plays: Vec<PlayRow>,
    /// Actors in first-seen order, unique by `actor_id`.
    pub actors: Vec<ActorRecord>,
    /// Time dimension, one row per distinct event second.
    pub times: Vec<TimeRecord>,
    pub filtered: LogFilterCounts,
}

/// A play row after the quality filter but before timestamp conversion.
struct CleanRow<'a> {
    source_index: usize,
    record: &'a SourceRecord,
    actor_id: String,
    session_id: i64,
    ts_millis: Option<i64>,
}

/// Filters and cleans the logs, then derives the actor and time dimensions.
///
/// The steps run in a fixed order: play filter, quality filter, actor derivation, timestamp
/// conversion, time derivation. Actors are derived before timestamps are validated, so an actor
/// whose only plays carry a broken `ts` is still present in `actors`.
pub fn transform_logs(logs: &SourceTable, play_page: &str) -> LogOutput {
    let mut filtered = LogFilterCounts::default();

    let mut clean_rows = Vec::new();
    for (source_index, record) in logs.records.iter().enumerate() {
        if record.text(Field::Page).as_deref() != Some(play_page) {
            filtered.non_play += 1;
            continue;
        }

        let actor_id = record.text(Field::ActorId).filter(|id| !id.is_empty());
        let session_id = record.i64(Field::SessionId);
        let (Some(actor_id), Some(session_id)) = (actor_id, session_id) else {
            filtered.failed_quality += 1;
            continue;
        };

        clean_rows.push(CleanRow {
            source_index,
            record,
            actor_id,
            session_id,
            ts_millis: record.i64(Field::Ts),
        });
    }

    let actors = derive_actors(&clean_rows);

    let mut plays = Vec::with_capacity(clean_rows.len());
    let mut seconds = BTreeSet::new();
    for row in clean_rows {
        let Some((ts_millis, timestamp)) = row
            .ts_millis
            .and_then(|ts| epoch_millis_to_utc(ts).map(|timestamp| (ts, timestamp)))
        else {
            filtered.invalid_timestamp += 1;
            continue;
        };

        seconds.insert(timestamp.timestamp());
        plays.push(PlayRow {
            source_index: row.source_index,
            actor_id: row.actor_id,
            session_id: row.session_id,
            ts_millis,
            timestamp,
            subscription_level: row.record.text(Field::Level),
            song: row.record.text(Field::Song),
            artist: row.record.text(Field::Artist),
            location: row.record.text(Field::Location),
            user_agent: row.record.text(Field::UserAgent),
        });
    }

    let times = build_time_dimension(seconds);

    record_filter_counts(&filtered);
    info!(
        plays = plays.len(),
        actors = actors.len(),
        times = times.len(),
        non_play = filtered.non_play,
        failed_quality = filtered.failed_quality,
        invalid_timestamp = filtered.invalid_timestamp,
        "transformed usage logs"
    );

    LogOutput {
        plays,
        actors,
        times,
        filtered,
    }
}

/// Collapses clean rows into one actor per `actor_id`.
///
/// The attributes of the latest event win; rows without a timestamp count as the oldest, and
/// among equal timestamps the later row in source order wins.
fn derive_actors(rows: &[CleanRow<'_>]) -> Vec<ActorRecord> {
    let mut latest: IndexMap<&str, &CleanRow<'_>> = IndexMap::new();
    for row in rows {
        match latest.entry(row.actor_id.as_str()) {
            Entry::Vacant(entry) => {
                entry.insert(row);
            }
            Entry::Occupied(mut entry) => {
                if row.ts_millis >= entry.get().ts_millis {
                    entry.insert(row);
                }
            }
        }
    }

    latest
        .into_values()
        .map(|row| ActorRecord {
            actor_id: row.actor_id.clone(),
            first_name: row.record.text(Field::FirstName),
            last_name: row.record.text(Field::LastName),
            gender: row.record.text(Field::Gender),
            subscription_level: row.record.text(Field::Level),
        })
        .collect()
}

fn record_filter_counts(filtered: &LogFilterCounts) {
    let reasons = [
        ("non_play", filtered.non_play),
        ("failed_quality", filtered.failed_quality),
        ("invalid_timestamp", filtered.invalid_timestamp),
    ];

    for (reason, count) in reasons {
        if count > 0 {
            counter!(LAKESTAR_LOG_ROWS_FILTERED_TOTAL, REASON_LABEL => reason).increment(count);
        }
    }

    if filtered.invalid_timestamp > 0 {
        warn!(
            rows = filtered.invalid_timestamp,
            "dropped play rows with a missing or out-of-range timestamp"
        );
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::*;
    use crate::source::Dataset;

    fn logs(values: Vec<Value>) -> SourceTable {
        let records = values
            .into_iter()
            .map(|value| match value {
                Value::Object(fields) => SourceRecord::new(fields),
                _ => panic!("fixture must be an object"),
            })
            .collect();

        SourceTable {
            dataset: Dataset::Logs,
            files: 1,
            columns: Default::default(),
            records,
            skipped: 0,
        }
    }

    fn play(user: Value, session: Value, ts: i64, level: &str) -> Value {
        json!({
            "page": "NextSong",
            "userId": user,
            "sessionId": session,
            "ts": ts,
            "level": level,
            "firstName": "Ada",
            "song": "Intro",
            "artist": "Band",
        })
    }

    #[test]
    fn only_play_rows_are_kept() {
        let output = transform_logs(
            &logs(vec![
                json!({"page": "Home", "userId": "1", "sessionId": 1, "ts": 0}),
                play(json!("1"), json!(1), 1_000, "free"),
            ]),
            "NextSong",
        );

        assert_eq!(output.plays.len(), 1);
        assert_eq!(output.filtered.non_play, 1);
    }

    #[test]
    fn quality_filter_drops_empty_actor_and_null_session() {
        let output = transform_logs(
            &logs(vec![
                play(json!(""), json!(1), 1_000, "free"),
                play(Value::Null, json!(1), 1_000, "free"),
                play(json!("2"), Value::Null, 1_000, "free"),
                play(json!("3"), json!(4), 1_000, "free"),
            ]),
            "NextSong",
        );

        assert_eq!(output.filtered.failed_quality, 3);
        assert_eq!(output.plays.len(), 1);
        assert!(
            output
                .plays
                .iter()
                .all(|play| !play.actor_id.is_empty())
        );
        assert_eq!(output.actors.len(), 1);
        assert_eq!(output.actors[0].actor_id, "3");
    }

    #[test]
    fn latest_event_decides_actor_attributes() {
        let output = transform_logs(
            &logs(vec![
                play(json!("7"), json!(1), 2_000, "paid"),
                play(json!("7"), json!(1), 1_000, "free"),
            ]),
            "NextSong",
        );

        assert_eq!(output.actors.len(), 1);
        assert_eq!(output.actors[0].subscription_level.as_deref(), Some("paid"));
        assert_eq!(output.actors[0].first_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn broken_timestamps_drop_the_play_but_keep_the_actor() {
        let mut broken = play(json!("9"), json!(1), 0, "free");
        broken["ts"] = json!("not a number");

        let output = transform_logs(&logs(vec![broken]), "NextSong");

        assert!(output.plays.is_empty());
        assert!(output.times.is_empty());
        assert_eq!(output.filtered.invalid_timestamp, 1);
        assert_eq!(output.actors.len(), 1);
    }

    #[test]
    fn time_rows_are_distinct_per_second() {
        let output = transform_logs(
            &logs(vec![
                play(json!("1"), json!(1), 1_580_515_200_900, "free"),
                play(json!("2"), json!(2), 1_580_515_200_100, "free"),
                play(json!("1"), json!(1), 1_580_515_100_000, "free"),
            ]),
            "NextSong",
        );

        assert_eq!(output.plays.len(), 3);
        assert_eq!(output.times.len(), 2);
        assert_eq!(output.times[0].epoch_seconds, 1_580_515_100);
        assert_eq!(output.times[0].audit_id, 1);
        assert_eq!(output.times[1].audit_id, 2);
        assert_eq!(output.times[1].start_time, "00:00:00");
    }
}
