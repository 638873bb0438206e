//! Timestamp decomposition for the time dimension.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, Timelike, Utc};

use crate::transform::keys::assign_surrogate_keys;
use crate::types::TimeRecord;

/// Format of the `start_time` column.
pub const START_TIME_FORMAT: &str = "%H:%M:%S";

/// Converts epoch milliseconds into a UTC datetime.
///
/// Returns [`None`] when the value is outside the range chrono can represent.
pub fn epoch_millis_to_utc(ts_millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ts_millis)
}

/// Builds the time dimension from the distinct event seconds.
///
/// `audit_id` is assigned in ascending timestamp order, starting at 1. Seconds that cannot be
/// represented are skipped; callers only pass seconds produced by [`epoch_millis_to_utc`].
pub fn build_time_dimension(epoch_seconds: BTreeSet<i64>) -> Vec<TimeRecord> {
    let datetimes = epoch_seconds
        .into_iter()
        .filter_map(|seconds| DateTime::from_timestamp(seconds, 0));

    assign_surrogate_keys(datetimes)
        .map(|(audit_id, datetime)| decompose(audit_id, datetime))
        .collect()
}

/// Splits `datetime` into the calendar parts of a [`TimeRecord`].
///
/// `week_of_year` is the ISO week number and `weekday` the ISO day of week, Monday being 1.
pub fn decompose(audit_id: i64, datetime: DateTime<Utc>) -> TimeRecord {
    TimeRecord {
        audit_id,
        epoch_seconds: datetime.timestamp(),
        start_time: datetime.format(START_TIME_FORMAT).to_string(),
        hour: datetime.hour() as i32,
        day: datetime.day() as i32,
        week_of_year: datetime.iso_week().week() as i32,
        month: datetime.month() as i32,
        year: datetime.year(),
        weekday: datetime.weekday().number_from_monday() as i32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decomposes_into_iso_calendar_parts() {
        // 2018-11-15T00:30:26.796Z, a Thursday in ISO week 46.
        let datetime = epoch_millis_to_utc(1_542_241_826_796).unwrap();
        let record = decompose(1, datetime);

        assert_eq!(record.start_time, "00:30:26");
        assert_eq!(record.hour, 0);
        assert_eq!(record.day, 15);
        assert_eq!(record.week_of_year, 46);
        assert_eq!(record.month, 11);
        assert_eq!(record.year, 2018);
        assert_eq!(record.weekday, 4);
        assert_eq!(record.epoch_seconds, 1_542_241_826);
    }

    #[test]
    fn iso_week_can_belong_to_the_previous_year() {
        // 2021-01-01 is a Friday in ISO week 53 of 2020.
        let record = decompose(1, epoch_millis_to_utc(1_609_459_200_000).unwrap());

        assert_eq!(record.year, 2021);
        assert_eq!(record.week_of_year, 53);
        assert_eq!(record.weekday, 5);
    }

    #[test]
    fn audit_ids_follow_timestamp_order() {
        let seconds = BTreeSet::from([1_600_000_100, 1_600_000_000, 1_600_000_050]);

        let records = build_time_dimension(seconds);

        let keyed: Vec<_> = records
            .iter()
            .map(|record| (record.audit_id, record.epoch_seconds))
            .collect();
        assert_eq!(
            keyed,
            vec![(1, 1_600_000_000), (2, 1_600_000_050), (3, 1_600_000_100)]
        );
    }

    #[test]
    fn out_of_range_millis_are_rejected() {
        assert!(epoch_millis_to_utc(i64::MAX).is_none());
    }
}
