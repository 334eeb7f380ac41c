use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
use serde_json::Value;

/// Closed interval `[start, end]` in UTC.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// The whole calendar month: from the first instant of the month to one
    /// nanosecond before the next month starts.
    pub fn for_month(year: i32, month: u32) -> Option<Self> {
        let start = month_start(year, month)?;
        let (next_year, next_month) = if month == 12 {
            (year + 1, 1)
        } else {
            (year, month + 1)
        };
        let end = month_start(next_year, next_month)? - TimeDelta::nanoseconds(1);
        Some(Self { start, end })
    }

    /// Both bounds taken as whole UTC days. `None` when `from` is after `to`.
    /// A `to` of `NaiveDate::MAX` runs to the last representable instant.
    pub fn for_dates(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        if from > to {
            return None;
        }
        let start = Utc.from_utc_datetime(&from.and_hms_opt(0, 0, 0)?);
        let end = match to.succ_opt() {
            Some(next) => Utc.from_utc_datetime(&next.and_hms_opt(0, 0, 0)?) - TimeDelta::nanoseconds(1),
            None => DateTime::<Utc>::MAX_UTC,
        };
        Some(Self { start, end })
    }

    /// Everything strictly before this window starts.
    pub fn before(&self) -> Self {
        Self {
            start: DateTime::<Utc>::MIN_UTC,
            end: self.start - TimeDelta::nanoseconds(1),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }

    /// Tests a raw record field. Missing or unparseable values never match.
    pub fn contains_field(&self, record: &Value, field: &str) -> bool {
        record
            .get(field)
            .and_then(parse_timestamp)
            .is_some_and(|at| self.contains(at))
    }

    /// Value for the API `since` parameter.
    pub fn since_hint(&self) -> String {
        self.start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
    }
}

fn month_start(year: i32, month: u32) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(year, month, 1)?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Normalises every timestamp shape found in exports to UTC: RFC 3339 with
/// an offset, naive date-times (read as UTC), bare dates (midnight UTC) and
/// integer epoch milliseconds.
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(text) => parse_timestamp_str(text),
        Value::Number(number) => DateTime::from_timestamp_millis(number.as_i64()?),
        _ => None,
    }
}

pub fn parse_timestamp_str(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(aware) = DateTime::parse_from_rfc3339(text) {
        return Some(aware.with_timezone(&Utc));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let date = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}
