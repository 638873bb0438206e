use serde_json::{Map, Number, Value};

/// A logical field of the raw datasets.
///
/// Upstream producers spell the same field differently, so each logical field resolves through
/// a fixed list of accepted names. The canonical name comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    // Catalog fields
    ItemId,
    Title,
    Duration,
    Year,
    PublisherId,
    PublisherName,
    PublisherLocation,
    Latitude,
    Longitude,

    // Log fields
    Page,
    ActorId,
    FirstName,
    LastName,
    Gender,
    Level,
    Ts,
    SessionId,
    Location,
    UserAgent,
    Song,
    Artist,
}

impl Field {
    /// Returns the accepted source names of the field, canonical name first.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::ItemId => &["item_id", "song_id"],
            Field::Title => &["title"],
            Field::Duration => &["duration", "duration_seconds"],
            Field::Year => &["year", "release_year"],
            Field::PublisherId => &["publisher_id", "artist_id"],
            Field::PublisherName => &["publisher_name", "publisher", "artist_name"],
            Field::PublisherLocation => &["publisher_location", "artist_location"],
            Field::Latitude => &["latitude", "publisher_latitude", "artist_latitude"],
            Field::Longitude => &["longitude", "publisher_longitude", "artist_longitude"],
            Field::Page => &["page"],
            Field::ActorId => &["actor_id", "userId", "user_id"],
            Field::FirstName => &["first_name", "firstName"],
            Field::LastName => &["last_name", "lastName"],
            Field::Gender => &["gender"],
            Field::Level => &["subscription_level", "level"],
            Field::Ts => &["ts"],
            Field::SessionId => &["session_id", "sessionId"],
            Field::Location => &["location"],
            Field::UserAgent => &["user_agent", "userAgent"],
            Field::Song => &["song", "item_title"],
            Field::Artist => &["artist"],
        }
    }

    /// Returns the canonical name of the field.
    pub fn name(&self) -> &'static str {
        self.aliases()[0]
    }
}

/// One raw record of a source dataset.
///
/// Fields absent from the record read as null. Accessors coerce between JSON strings and
/// numbers so that identifiers and measures parse regardless of how the producer encoded them.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRecord {
    fields: Map<String, Value>,
}

impl SourceRecord {
    /// Wraps a parsed JSON object.
    pub fn new(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Returns the raw value of `field`, trying every alias in order.
    ///
    /// An alias holding JSON `null` is treated as absent.
    pub fn get(&self, field: Field) -> Option<&Value> {
        field
            .aliases()
            .iter()
            .filter_map(|alias| self.fields.get(*alias))
            .find(|value| !value.is_null())
    }

    /// Returns the field rendered as text.
    ///
    /// Integral numbers render without a fractional part, so `42` and `42.0` both read as `"42"`.
    /// Empty strings are returned as-is.
    pub fn text(&self, field: Field) -> Option<String> {
        match self.get(field)? {
            Value::String(value) => Some(value.clone()),
            Value::Number(number) => Some(render_number(number)),
            Value::Bool(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// Returns the field as a float, parsing numeric strings.
    pub fn f64(&self, field: Field) -> Option<f64> {
        match self.get(field)? {
            Value::Number(number) => number.as_f64(),
            Value::String(value) => value.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }

    /// Returns the field as an integer, parsing numeric strings.
    ///
    /// Floats are accepted only when integral.
    pub fn i64(&self, field: Field) -> Option<i64> {
        match self.get(field)? {
            Value::Number(number) => number_to_i64(number),
            Value::String(value) => {
                let value = value.trim();
                value
                    .parse::<i64>()
                    .ok()
                    .or_else(|| value.parse::<f64>().ok().and_then(float_to_i64))
            }
            _ => None,
        }
    }

    /// Returns the field as a 32-bit integer.
    pub fn i32(&self, field: Field) -> Option<i32> {
        self.i64(field).and_then(|value| i32::try_from(value).ok())
    }
}

fn render_number(number: &Number) -> String {
    if number.is_f64()
        && let Some(value) = number.as_f64().and_then(float_to_i64)
    {
        return value.to_string();
    }

    number.to_string()
}

fn number_to_i64(number: &Number) -> Option<i64> {
    number
        .as_i64()
        .or_else(|| number.as_f64().and_then(float_to_i64))
}

fn float_to_i64(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}
