//! Task model shared by the scheduler, the reminder checkpointer and the store.
//!
//! The on-disk shape is a flat JSON object per task. Due values keep their
//! legacy string encoding (10 chars = date-only, 16 chars = precise) but only at
//! the serde boundary; in memory they are a tagged [`DueValue`].

use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use crate::time::{self, DATE_FMT, MINUTE_FMT};

/// Normalized due date of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DueValue {
    DateOnly(NaiveDate),
    /// Always minute precision.
    Precise(NaiveDateTime),
}

impl DueValue {
    /// Precise value truncated to the minute.
    pub fn precise(dt: NaiveDateTime) -> Self {
        DueValue::Precise(time::truncate_to_minute(dt))
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            DueValue::DateOnly(d) => *d,
            DueValue::Precise(dt) => dt.date(),
        }
    }

    /// Time of day carried by a precise value.
    pub fn time(&self) -> Option<NaiveTime> {
        match self {
            DueValue::DateOnly(_) => None,
            DueValue::Precise(dt) => Some(dt.time()),
        }
    }

    pub fn has_time(&self) -> bool {
        matches!(self, DueValue::Precise(_))
    }

    /// The instant this value stands for. Date-only values are due at 00:00.
    pub fn instant(&self) -> NaiveDateTime {
        match self {
            DueValue::DateOnly(d) => time::start_of_day(*d),
            DueValue::Precise(dt) => *dt,
        }
    }

    /// Same precision, different calendar date.
    pub fn with_date(&self, date: NaiveDate) -> Self {
        match self {
            DueValue::DateOnly(_) => DueValue::DateOnly(date),
            DueValue::Precise(dt) => DueValue::Precise(date.and_time(dt.time())),
        }
    }

    /// `YYYY-MM-DD` or `YYYY-MM-DD HH:MM`.
    pub fn to_storage(&self) -> String {
        match self {
            DueValue::DateOnly(d) => d.format(DATE_FMT).to_string(),
            DueValue::Precise(dt) => dt.format(MINUTE_FMT).to_string(),
        }
    }

    /// Decode a stored due string. Empty or malformed input yields `None`.
    pub fn from_storage(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        if s.len() == 10 {
            NaiveDate::parse_from_str(s, DATE_FMT)
                .ok()
                .map(DueValue::DateOnly)
        } else {
            NaiveDateTime::parse_from_str(s, MINUTE_FMT)
                .ok()
                .map(DueValue::Precise)
        }
    }
}

impl fmt::Display for DueValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage())
    }
}

/// Serde adapter for `Option<DueValue>` stored as a plain string.
pub mod due_storage {
    use super::*;

    pub fn serialize<S: Serializer>(v: &Option<DueValue>, s: S) -> Result<S::Ok, S::Error> {
        match v {
            Some(due) => s.serialize_str(&due.to_storage()),
            None => s.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<DueValue>, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        let parsed = DueValue::from_storage(&raw);
        if parsed.is_none() && !raw.trim().is_empty() {
            tracing::warn!(value = %raw, "ignoring malformed stored due value");
        }
        Ok(parsed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid repeat '{0}': use none/daily/weekdays/weekly/bi-weekly/monthly/custom:<days>")]
pub struct RepeatParseError(pub String);

/// Recurrence rule tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Repeat {
    #[default]
    None,
    Daily,
    Weekdays,
    Weekly,
    BiWeekly,
    Monthly,
    /// Every N days.
    Custom(NonZeroU32),
}

impl Repeat {
    pub fn is_repeating(&self) -> bool {
        !matches!(self, Repeat::None)
    }

    /// Decode a stored tag; anything unrecognized is treated as `none`.
    pub fn from_storage(s: &str) -> Self {
        match s.parse() {
            Ok(r) => r,
            Err(_) => {
                tracing::warn!(value = %s, "unrecognized repeat rule, treating as none");
                Repeat::None
            }
        }
    }
}

impl FromStr for Repeat {
    type Err = RepeatParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let norm = s.trim().to_lowercase();
        match norm.as_str() {
            "" | "none" => Ok(Repeat::None),
            "daily" => Ok(Repeat::Daily),
            "weekdays" => Ok(Repeat::Weekdays),
            "weekly" => Ok(Repeat::Weekly),
            "bi-weekly" | "biweekly" => Ok(Repeat::BiWeekly),
            "monthly" => Ok(Repeat::Monthly),
            other => {
                let days = other
                    .strip_prefix("custom:")
                    .and_then(|n| n.trim().parse::<u32>().ok())
                    .and_then(NonZeroU32::new);
                days.map(Repeat::Custom)
                    .ok_or_else(|| RepeatParseError(s.trim().to_string()))
            }
        }
    }
}

impl fmt::Display for Repeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Repeat::None => f.write_str("none"),
            Repeat::Daily => f.write_str("daily"),
            Repeat::Weekdays => f.write_str("weekdays"),
            Repeat::Weekly => f.write_str("weekly"),
            Repeat::BiWeekly => f.write_str("bi-weekly"),
            Repeat::Monthly => f.write_str("monthly"),
            Repeat::Custom(n) => write!(f, "custom:{n}"),
        }
    }
}

impl Serialize for Repeat {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Repeat {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        Ok(Repeat::from_storage(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriorityParseError {
    #[error("unknown priority '{0}': use H, M, L, D or misc")]
    Unknown(String),
    #[error("priority U is reserved for hazard escalation")]
    Reserved,
}

/// Task priority.
///
/// Severity is compared with [`Priority::rank`]: `Misc` and `Daily` share the
/// lowest rank, `Urgent` is the hazard level reached only through escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Priority {
    Misc,
    Daily,
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn rank(self) -> u8 {
        match self {
            Priority::Misc | Priority::Daily => 0,
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }

    pub fn at_least(self, other: Priority) -> bool {
        self.rank() >= other.rank()
    }

    pub fn code(self) -> &'static str {
        match self {
            Priority::Misc => "X",
            Priority::Daily => "D",
            Priority::Low => "L",
            Priority::Medium => "M",
            Priority::High => "H",
            Priority::Urgent => "U",
        }
    }

    /// Decode a stored code; unknown codes fall back to `M`.
    pub fn from_storage(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "U" => Priority::Urgent,
            other => Priority::parse_user(other).unwrap_or_default(),
        }
    }

    /// Parse a code typed by the user. `U` is refused.
    pub fn parse_user(s: &str) -> Result<Self, PriorityParseError> {
        let norm = s.trim().to_uppercase();
        match norm.as_str() {
            "X" | "MISC" => Ok(Priority::Misc),
            "D" => Ok(Priority::Daily),
            "L" => Ok(Priority::Low),
            "M" => Ok(Priority::Medium),
            "H" => Ok(Priority::High),
            "U" => Err(PriorityParseError::Reserved),
            _ => Err(PriorityParseError::Unknown(s.trim().to_string())),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for Priority {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.code())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(d)?.unwrap_or_default();
        Ok(Priority::from_storage(&raw))
    }
}

/// A tracked task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub group: String,

    #[serde(default)]
    pub priority: Priority,
    /// Pre-escalation priority, present only while escalation is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_priority: Option<Priority>,

    #[serde(default, with = "due_storage")]
    pub due: Option<DueValue>,
    #[serde(default)]
    pub repeat: Repeat,

    #[serde(default, with = "time::lenient_timestamp")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, with = "time::lenient_timestamp")]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(
        default,
        with = "time::lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<NaiveDateTime>,

    #[serde(default)]
    pub times_completed: u32,
    #[serde(default)]
    pub bumped_count: u32,
    /// Consecutive missed cycles since the last completion or reset.
    #[serde(default)]
    pub skip_count: u32,

    /// Days on which a cycle was completed.
    #[serde(default)]
    pub history: BTreeSet<NaiveDate>,
    /// Checkpoint keys (`YYYY-MM-DDTHH:MM`) the user already dismissed.
    #[serde(default)]
    pub acknowledged_checkpoints: BTreeSet<String>,

    #[serde(default)]
    pub is_deleted: bool,
    #[serde(
        default,
        with = "time::lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub deleted_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub is_suspended: bool,
}

impl Task {
    pub fn new(id: u64, title: impl Into<String>, created_at: NaiveDateTime) -> Self {
        Self {
            id,
            title: title.into(),
            notes: String::new(),
            group: String::new(),
            priority: Priority::Medium,
            base_priority: None,
            due: None,
            repeat: Repeat::None,
            created_at: Some(created_at.with_nanosecond(0).unwrap_or(created_at)),
            completed_at: None,
            updated_at: None,
            times_completed: 0,
            bumped_count: 0,
            skip_count: 0,
            history: BTreeSet::new(),
            acknowledged_checkpoints: BTreeSet::new(),
            is_deleted: false,
            deleted_at: None,
            is_suspended: false,
        }
    }

    pub fn with_due(mut self, due: DueValue) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn is_open(&self) -> bool {
        !self.is_deleted && self.completed_at.is_none()
    }
}
