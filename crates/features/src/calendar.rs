//! Calendar features from row timestamps.

use crate::transform::Transform;
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};
use predictor_core::{Error, FeatureTable, Result, Value, TIMESTAMP};

/// Timestamp layouts carrying a UTC offset.
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Timestamp layouts without zone information, read as UTC.
const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp into a UTC wall-clock time.
///
/// Accepts ISO-8601 / RFC 3339 date-times (space or `T` separated, optional
/// fraction and offset), bare dates, and integer epoch milliseconds as
/// delivered by exchange candle APIs.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if s.bytes().all(|b| b.is_ascii_digit()) {
        let ms: i64 = s.parse().ok()?;
        return DateTime::from_timestamp_millis(ms).map(|dt| dt.naive_utc());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.naive_utc());
        }
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Calendar fields of one timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarFields {
    /// Hour of day, 0-23.
    pub hour: u32,
    /// Day of week, 0 = Monday .. 6 = Sunday.
    pub day_of_week: u32,
    /// ISO week of year, 1-53.
    pub week_of_year: u32,
}

impl CalendarFields {
    pub fn from_datetime(dt: &NaiveDateTime) -> Self {
        Self {
            hour: dt.hour(),
            day_of_week: dt.weekday().num_days_from_monday(),
            week_of_year: dt.iso_week().week(),
        }
    }
}

/// Appends `hour`, `day_of_week` and `week_of_year`.
#[derive(Debug, Clone, Default)]
pub struct CalendarExtractor;

impl CalendarExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Transform for CalendarExtractor {
    fn name(&self) -> &'static str {
        "calendar"
    }

    fn required_columns(&self) -> Vec<String> {
        vec![TIMESTAMP.to_string()]
    }

    fn output_columns(&self) -> Vec<String> {
        vec![
            "hour".to_string(),
            "day_of_week".to_string(),
            "week_of_year".to_string(),
        ]
    }

    fn apply(&self, table: &mut FeatureTable) -> Result<()> {
        let mut hours: Vec<Value> = Vec::with_capacity(table.len());
        let mut weekdays: Vec<Value> = Vec::with_capacity(table.len());
        let mut weeks: Vec<Value> = Vec::with_capacity(table.len());

        for (row, raw) in table.timestamps().enumerate() {
            if raw.trim().is_empty() {
                return Err(Error::parse(row, "missing timestamp"));
            }
            let dt = parse_timestamp(raw)
                .ok_or_else(|| Error::parse(row, format!("unrecognized timestamp '{raw}'")))?;
            let fields = CalendarFields::from_datetime(&dt);
            hours.push(Some(f64::from(fields.hour)));
            weekdays.push(Some(f64::from(fields.day_of_week)));
            weeks.push(Some(f64::from(fields.week_of_year)));
        }

        table.set_column("hour", hours)?;
        table.set_column("day_of_week", weekdays)?;
        table.set_column("week_of_year", weeks)?;
        Ok(())
    }
}
