use crate::types::{Cell, ColumnSchema, ColumnType, TableRow, TableSchema};

/// Name of the item dimension table.
pub const ITEMS_TABLE: &str = "items";
/// Name of the publisher dimension table.
pub const PUBLISHERS_TABLE: &str = "publishers";
/// Name of the actor dimension table.
pub const ACTORS_TABLE: &str = "actors";
/// Name of the time dimension table.
pub const TIME_TABLE: &str = "time";
/// Name of the event fact table.
pub const EVENTS_TABLE: &str = "events";

/// A typed record of one output table.
pub trait Record {
    /// Returns the schema, with partitioning, of the table holding this record.
    fn table_schema() -> TableSchema;

    /// Converts the record into a row ordered like [`Record::table_schema`].
    fn into_table_row(self) -> TableRow;
}

/// Converts a batch of records into table rows.
pub fn into_table_rows<R: Record>(records: Vec<R>) -> Vec<TableRow> {
    records.into_iter().map(Record::into_table_row).collect()
}

/// A catalog item, keyed by `item_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRecord {
    pub item_id: String,
    pub publisher_id: Option<String>,
    pub title: Option<String>,
    pub duration_seconds: Option<f64>,
    pub release_year: Option<i32>,
}

impl Record for ItemRecord {
    fn table_schema() -> TableSchema {
        TableSchema {
            name: ITEMS_TABLE,
            column_schemas: vec![
                ColumnSchema::required("item_id", ColumnType::Text),
                ColumnSchema::nullable("publisher_id", ColumnType::Text),
                ColumnSchema::nullable("title", ColumnType::Text),
                ColumnSchema::nullable("duration_seconds", ColumnType::Float64),
                ColumnSchema::nullable("release_year", ColumnType::Int32),
            ],
            partition_keys: vec!["release_year", "publisher_id"],
        }
    }

    fn into_table_row(self) -> TableRow {
        TableRow::new(vec![
            self.item_id.into(),
            self.publisher_id.into(),
            self.title.into(),
            self.duration_seconds.into(),
            self.release_year.into(),
        ])
    }
}

/// A publisher, deduplicated by `name`.
#[derive(Debug, Clone, PartialEq)]
pub struct PublisherRecord {
    pub publisher_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl Record for PublisherRecord {
    fn table_schema() -> TableSchema {
        TableSchema {
            name: PUBLISHERS_TABLE,
            column_schemas: vec![
                ColumnSchema::required("publisher_id", ColumnType::Text),
                ColumnSchema::required("name", ColumnType::Text),
                ColumnSchema::nullable("location", ColumnType::Text),
                ColumnSchema::nullable("latitude", ColumnType::Float64),
                ColumnSchema::nullable("longitude", ColumnType::Float64),
            ],
            partition_keys: vec![],
        }
    }

    fn into_table_row(self) -> TableRow {
        TableRow::new(vec![
            self.publisher_id.into(),
            self.name.into(),
            self.location.into(),
            self.latitude.into(),
            self.longitude.into(),
        ])
    }
}

/// A user of the application, keyed by `actor_id`.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorRecord {
    pub actor_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub subscription_level: Option<String>,
}

impl Record for ActorRecord {
    fn table_schema() -> TableSchema {
        TableSchema {
            name: ACTORS_TABLE,
            column_schemas: vec![
                ColumnSchema::required("actor_id", ColumnType::Text),
                ColumnSchema::nullable("first_name", ColumnType::Text),
                ColumnSchema::nullable("last_name", ColumnType::Text),
                ColumnSchema::nullable("gender", ColumnType::Text),
                ColumnSchema::nullable("subscription_level", ColumnType::Text),
            ],
            partition_keys: vec![],
        }
    }

    fn into_table_row(self) -> TableRow {
        TableRow::new(vec![
            self.actor_id.into(),
            self.first_name.into(),
            self.last_name.into(),
            self.gender.into(),
            self.subscription_level.into(),
        ])
    }
}

/// One distinct event timestamp, decomposed into calendar parts.
///
/// `epoch_seconds` links the record to the events that happened in the same second. It is not
/// part of the stored table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeRecord {
    pub audit_id: i64,
    pub epoch_seconds: i64,
    pub start_time: String,
    pub hour: i32,
    pub day: i32,
    pub week_of_year: i32,
    pub month: i32,
    pub year: i32,
    pub weekday: i32,
}

impl Record for TimeRecord {
    fn table_schema() -> TableSchema {
        TableSchema {
            name: TIME_TABLE,
            column_schemas: vec![
                ColumnSchema::required("audit_id", ColumnType::Int64),
                ColumnSchema::required("start_time", ColumnType::Text),
                ColumnSchema::required("hour", ColumnType::Int32),
                ColumnSchema::required("day", ColumnType::Int32),
                ColumnSchema::required("week_of_year", ColumnType::Int32),
                ColumnSchema::required("month", ColumnType::Int32),
                ColumnSchema::required("year", ColumnType::Int32),
                ColumnSchema::required("weekday", ColumnType::Int32),
            ],
            partition_keys: vec!["year", "month"],
        }
    }

    fn into_table_row(self) -> TableRow {
        TableRow::new(vec![
            self.audit_id.into(),
            self.start_time.into(),
            self.hour.into(),
            self.day.into(),
            self.week_of_year.into(),
            self.month.into(),
            self.year.into(),
            self.weekday.into(),
        ])
    }
}

/// One play of an item by an actor.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub songplay_id: i64,
    pub publisher_id: String,
    pub actor_id: String,
    pub subscription_level: Option<String>,
    pub item_id: Option<String>,
    pub start_time: String,
    pub location: Option<String>,
    pub session_id: i64,
    pub user_agent: Option<String>,
    pub item_title: Option<String>,
    pub year: i32,
    pub month: i32,
}

impl Record for EventRecord {
    fn table_schema() -> TableSchema {
        TableSchema {
            name: EVENTS_TABLE,
            column_schemas: vec![
                ColumnSchema::required("songplay_id", ColumnType::Int64),
                ColumnSchema::required("publisher_id", ColumnType::Text),
                ColumnSchema::required("actor_id", ColumnType::Text),
                ColumnSchema::nullable("subscription_level", ColumnType::Text),
                ColumnSchema::nullable("item_id", ColumnType::Text),
                ColumnSchema::required("start_time", ColumnType::Text),
                ColumnSchema::nullable("location", ColumnType::Text),
                ColumnSchema::required("session_id", ColumnType::Int64),
                ColumnSchema::nullable("user_agent", ColumnType::Text),
                ColumnSchema::nullable("item_title", ColumnType::Text),
                ColumnSchema::required("year", ColumnType::Int32),
                ColumnSchema::required("month", ColumnType::Int32),
            ],
            partition_keys: vec!["year", "month"],
        }
    }

    fn into_table_row(self) -> TableRow {
        TableRow::new(vec![
            self.songplay_id.into(),
            self.publisher_id.into(),
            self.actor_id.into(),
            self.subscription_level.into(),
            self.item_id.into(),
            self.start_time.into(),
            self.location.into(),
            self.session_id.into(),
            self.user_agent.into(),
            self.item_title.into(),
            self.year.into(),
            self.month.into(),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_row_matches_schema<R: Record>(record: R) {
        let schema = R::table_schema();
        let row = record.into_table_row();

        assert!(schema.validate().is_ok());
        assert_eq!(row.values().len(), schema.column_schemas.len());
        for (cell, column) in row.values().iter().zip(&schema.column_schemas) {
            assert!(column.nullable || !cell.is_null(), "{} is null", column.name);
        }
    }

    #[test]
    fn rows_line_up_with_their_schemas() {
        assert_row_matches_schema(ItemRecord {
            item_id: "SOABC".to_string(),
            publisher_id: None,
            title: Some("Intro".to_string()),
            duration_seconds: Some(201.5),
            release_year: None,
        });
        assert_row_matches_schema(PublisherRecord {
            publisher_id: "AR1".to_string(),
            name: "Band".to_string(),
            location: None,
            latitude: None,
            longitude: None,
        });
        assert_row_matches_schema(ActorRecord {
            actor_id: "7".to_string(),
            first_name: None,
            last_name: None,
            gender: None,
            subscription_level: Some("free".to_string()),
        });
        assert_row_matches_schema(TimeRecord {
            audit_id: 1,
            epoch_seconds: 0,
            start_time: "00:00:00".to_string(),
            hour: 0,
            day: 1,
            week_of_year: 1,
            month: 1,
            year: 1970,
            weekday: 4,
        });
        assert_row_matches_schema(EventRecord {
            songplay_id: 1,
            publisher_id: "AR1".to_string(),
            actor_id: "7".to_string(),
            subscription_level: None,
            item_id: None,
            start_time: "00:00:00".to_string(),
            location: None,
            session_id: 3,
            user_agent: None,
            item_title: None,
            year: 1970,
            month: 1,
        });
    }

    #[test]
    fn time_rows_omit_the_link_key() {
        let schema = TimeRecord::table_schema();
        assert!(schema.column_index("epoch_seconds").is_none());
        assert_eq!(schema.partition_column_indices(), vec![6, 5]);
    }
}
