//! Time utilities: local wall-clock formats shared by storage and reminders.
//!
//! Everything in duecycle is naive local time. There is no timezone handling;
//! callers pass `Local::now().naive_local()` (or a fixed instant in tests).

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Storage form of a date-only due value (10 chars).
pub const DATE_FMT: &str = "%Y-%m-%d";

/// Storage form of a precise due value (16 chars).
pub const MINUTE_FMT: &str = "%Y-%m-%d %H:%M";

/// Checkpoint keys: ISO-8601 truncated to minutes, `T` separator.
pub const CHECKPOINT_KEY_FMT: &str = "%Y-%m-%dT%H:%M";

/// Timestamps such as `created_at` / `completed_at`.
pub const SECONDS_FMT: &str = "%Y-%m-%dT%H:%M:%S";

/// Sentinel time used for "midnight" in due input.
pub fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

/// Build a wall-clock time, `None` when out of range.
pub fn hm(hour: u32, minute: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Zero seconds and sub-second parts.
pub fn truncate_to_minute(dt: NaiveDateTime) -> NaiveDateTime {
    dt.with_second(0)
        .and_then(|d| d.with_nanosecond(0))
        .unwrap_or(dt)
}

pub fn checkpoint_key(dt: NaiveDateTime) -> String {
    dt.format(CHECKPOINT_KEY_FMT).to_string()
}

pub fn iso_seconds(dt: NaiveDateTime) -> String {
    dt.format(SECONDS_FMT).to_string()
}

/// Parse an ISO timestamp as written by [`iso_seconds`].
///
/// Also accepts fractional seconds and minute precision, since older data
/// files were not consistent about it.
pub fn parse_iso_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, CHECKPOINT_KEY_FMT))
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Same wall-clock instant one calendar year earlier (Feb 29 clamps to Feb 28).
pub fn one_year_before(now: NaiveDateTime) -> NaiveDateTime {
    now.checked_sub_months(Months::new(12)).unwrap_or(now)
}

pub fn start_of_day(d: NaiveDate) -> NaiveDateTime {
    d.and_time(NaiveTime::MIN)
}

/// Serde adapters for optional timestamps stored as `""` when absent.
///
/// Unparseable values decode to `None` so one bad record cannot block loading
/// the rest of the file.
pub mod lenient_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(v: &Option<NaiveDateTime>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(dt) => s.serialize_str(&super::iso_seconds(*dt)),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDateTime>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let parsed = super::parse_iso_timestamp(&raw);
        if parsed.is_none() {
            tracing::warn!(value = %raw, "ignoring malformed stored timestamp");
        }
        Ok(parsed)
    }
}
