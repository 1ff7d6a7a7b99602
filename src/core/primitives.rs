use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};
use serde_json::Value;

/// Parses a series date key.
///
/// Date-only values (`YYYY-MM-DD`) resolve to UTC midnight. RFC 3339 values keep
/// their offset and are converted to UTC. Naive date-times are read as UTC.
#[must_use]
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Some(time.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Join key: millisecond-resolution instant.
#[must_use]
pub fn date_key(date: DateTime<Utc>) -> i64 {
    date.timestamp_millis()
}

/// Short human form used in reports: the calendar date for midnight instants.
#[must_use]
pub fn format_date(date: DateTime<Utc>) -> String {
    if date.num_seconds_from_midnight() == 0 && date.nanosecond() == 0 {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Coerces a raw cell into a finite number. `null` becomes `0`.
///
/// Returns `None` for booleans, containers, unparsable strings and non-finite
/// values.
#[must_use]
pub fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Null => return Some(0.0),
        Value::Number(number) => number.as_f64()?,
        Value::String(text) => text.trim().parse::<f64>().ok()?,
        Value::Bool(_) | Value::Array(_) | Value::Object(_) => return None,
    };
    number.is_finite().then_some(number)
}

/// Compact text form of a raw cell for error messages.
#[must_use]
pub fn describe_value(value: &Value) -> String {
    match value {
        Value::String(text) => format!("{text:?}"),
        other => other.to_string(),
    }
}
