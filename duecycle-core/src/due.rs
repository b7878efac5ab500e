//! Free-form due-date parsing.
//!
//! Grammars, first match wins:
//! 1. `midnight` → today 23:59
//! 2. daypart (`morning`, `noon`, `afternoon`, `evening`) → today at that time
//! 3. weekday name, optionally followed by a time, daypart or `midnight`
//! 4. `YYYY-MM-DD` [`HH:MM` | `HHMM` | `midnight`]
//! 5. `MM/DD` (current year) with the same qualifiers
//! 6. relative offsets `+2d -3h +15m +1w`, optionally with `midnight`
//!
//! A weekday name that matches today resolves to today, not a week out.

use std::sync::LazyLock;

use chrono::{Datelike, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use regex::Regex;
use thiserror::Error;

use crate::task::DueValue;
use crate::time::{end_of_day, hm};

pub const SUPPORTED_FORMATS: &str = "YYYY-MM-DD [HH:MM], MM/DD [HH:MM], HH:MM, HHMM, weekday names, \
morning/noon/afternoon/evening, or relative like '+2d +5h' (use 'midnight' for 23:59)";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DueParseError {
    #[error("Due must be one of the supported formats: {formats} (got '{0}')", formats = SUPPORTED_FORMATS)]
    Unrecognized(String),
    #[error("'{0}' is not a valid calendar date")]
    InvalidDate(String),
    #[error("'{0}' is not a valid time of day")]
    InvalidTime(String),
    #[error("relative offset in '{0}' is out of range")]
    OutOfRange(String),
}

static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?P<h>\d{1,2}):(?P<m>\d{2})|(?P<compact>\d{3,4}))$").expect("valid clock regex")
});

static ISO_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?P<y>\d{4})-(?P<mo>\d{2})-(?P<d>\d{2})",
        r"(?:\s+(?:(?P<hh>\d{2}):?(?P<mm>\d{2})|(?P<midnight>midnight)))?$"
    ))
    .expect("valid iso date regex")
});

static SLASH_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?P<mo>\d{1,2})/(?P<d>\d{1,2})",
        r"(?:\s+(?:(?P<hh>\d{2}):?(?P<mm>\d{2})|(?P<midnight>midnight)))?$"
    ))
    .expect("valid slash date regex")
});

static OFFSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<sign>[+-])(?P<amount>\d+)(?P<unit>[dhmw])$").expect("valid offset regex")
});

/// Parse user due text relative to `now`.
///
/// `Ok(None)` means "no due date" (empty or whitespace input).
pub fn parse_due(text: &str, now: NaiveDateTime) -> Result<Option<DueValue>, DueParseError> {
    let s = text.trim();
    if s.is_empty() {
        return Ok(None);
    }
    let lower = s.to_lowercase();
    let today = now.date();

    if lower == "midnight" {
        return Ok(Some(DueValue::Precise(today.and_time(end_of_day()))));
    }

    if let Some(t) = daypart(&lower) {
        return Ok(Some(DueValue::Precise(today.and_time(t))));
    }

    let tokens: Vec<&str> = lower.split_whitespace().collect();
    if let Some(target) = tokens.first().and_then(|t| weekday(t)) {
        return parse_weekday(s, today, target, &tokens[1..]).map(Some);
    }

    if let Some(caps) = ISO_DATE_RE.captures(s) {
        let date = NaiveDate::from_ymd_opt(
            num(&caps, "y"),
            num(&caps, "mo") as u32,
            num(&caps, "d") as u32,
        )
        .ok_or_else(|| DueParseError::InvalidDate(s.to_string()))?;
        return with_qualifier(s, date, &caps).map(Some);
    }

    if let Some(caps) = SLASH_DATE_RE.captures(s) {
        let date =
            NaiveDate::from_ymd_opt(today.year(), num(&caps, "mo") as u32, num(&caps, "d") as u32)
                .ok_or_else(|| DueParseError::InvalidDate(s.to_string()))?;
        return with_qualifier(s, date, &caps).map(Some);
    }

    parse_relative(s, &tokens, now).map(Some)
}

/// `HH:MM` / `HHMM` typed on its own means today at that time.
///
/// Returns `None` when the text is not clock-shaped or the clock is out of range,
/// so the caller can fall through to [`parse_due`].
pub fn parse_quick_time(text: &str, now: NaiveDateTime) -> Option<NaiveDateTime> {
    match parse_clock(text.trim()) {
        Some(Ok(t)) => Some(now.date().and_time(t)),
        _ => None,
    }
}

/// Entry point for due fields typed by a user: quick time first, then the full grammar.
pub fn parse_due_entry(text: &str, now: NaiveDateTime) -> Result<Option<DueValue>, DueParseError> {
    if let Some(dt) = parse_quick_time(text, now) {
        return Ok(Some(DueValue::Precise(dt)));
    }
    parse_due(text, now)
}

fn parse_weekday(
    raw: &str,
    today: NaiveDate,
    target: Weekday,
    tail: &[&str],
) -> Result<DueValue, DueParseError> {
    let ahead = (7 + target.num_days_from_monday() - today.weekday().num_days_from_monday()) % 7;
    let date = today
        .checked_add_days(Days::new(u64::from(ahead)))
        .ok_or_else(|| DueParseError::OutOfRange(raw.to_string()))?;

    if tail.is_empty() {
        return Ok(DueValue::DateOnly(date));
    }

    let tail = tail.join(" ");
    if tail == "midnight" {
        return Ok(DueValue::Precise(date.and_time(end_of_day())));
    }
    if let Some(t) = daypart(&tail) {
        return Ok(DueValue::Precise(date.and_time(t)));
    }
    match parse_clock(&tail) {
        Some(Ok(t)) => Ok(DueValue::Precise(date.and_time(t))),
        Some(Err(())) => Err(DueParseError::InvalidTime(raw.to_string())),
        None => Err(DueParseError::Unrecognized(raw.to_string())),
    }
}

fn with_qualifier(
    raw: &str,
    date: NaiveDate,
    caps: &regex::Captures<'_>,
) -> Result<DueValue, DueParseError> {
    if caps.name("midnight").is_some() {
        return Ok(DueValue::Precise(date.and_time(end_of_day())));
    }
    match (caps.name("hh"), caps.name("mm")) {
        (Some(h), Some(m)) => {
            let t = h
                .as_str()
                .parse()
                .ok()
                .zip(m.as_str().parse().ok())
                .and_then(|(h, m)| hm(h, m))
                .ok_or_else(|| DueParseError::InvalidTime(raw.to_string()))?;
            Ok(DueValue::Precise(date.and_time(t)))
        }
        _ => Ok(DueValue::DateOnly(date)),
    }
}

fn parse_relative(
    raw: &str,
    tokens: &[&str],
    now: NaiveDateTime,
) -> Result<DueValue, DueParseError> {
    let midnight = tokens.iter().any(|t| *t == "midnight");
    let offsets: Vec<&str> = tokens.iter().copied().filter(|t| *t != "midnight").collect();
    if offsets.is_empty() {
        return Err(DueParseError::Unrecognized(raw.to_string()));
    }

    let out_of_range = || DueParseError::OutOfRange(raw.to_string());
    let mut total = Duration::zero();
    let mut has_time = false;

    for tok in offsets {
        let caps = OFFSET_RE
            .captures(tok)
            .ok_or_else(|| DueParseError::Unrecognized(raw.to_string()))?;
        let amount: i64 = caps["amount"].parse().map_err(|_| out_of_range())?;
        let amount = if &caps["sign"] == "-" { -amount } else { amount };
        let step = match &caps["unit"] {
            "m" => {
                has_time = true;
                Duration::try_minutes(amount)
            }
            "h" => {
                has_time = true;
                Duration::try_hours(amount)
            }
            "d" => Duration::try_days(amount),
            _ => Duration::try_weeks(amount),
        }
        .ok_or_else(out_of_range)?;
        total = total.checked_add(&step).ok_or_else(out_of_range)?;
    }

    let target = now.checked_add_signed(total).ok_or_else(out_of_range)?;
    if has_time {
        Ok(DueValue::precise(target))
    } else if midnight {
        Ok(DueValue::Precise(target.date().and_time(end_of_day())))
    } else {
        Ok(DueValue::DateOnly(target.date()))
    }
}

/// `Some(Ok)` for a valid clock token, `Some(Err)` for a clock-shaped token out
/// of range, `None` when the text is not clock-shaped at all.
fn parse_clock(s: &str) -> Option<Result<NaiveTime, ()>> {
    let caps = CLOCK_RE.captures(s)?;
    let (h, m) = match caps.name("compact") {
        Some(c) => {
            let raw = format!("{:0>4}", c.as_str());
            (raw[..2].parse::<u32>().ok()?, raw[2..].parse::<u32>().ok()?)
        }
        None => (caps["h"].parse::<u32>().ok()?, caps["m"].parse::<u32>().ok()?),
    };
    Some(hm(h, m).ok_or(()))
}

fn daypart(s: &str) -> Option<NaiveTime> {
    match s {
        "morning" => hm(8, 0),
        "noon" => hm(12, 0),
        "afternoon" => hm(16, 0),
        "evening" => hm(20, 0),
        _ => None,
    }
}

fn weekday(s: &str) -> Option<Weekday> {
    Some(match s {
        "mon" | "monday" => Weekday::Mon,
        "tue" | "tues" | "tuesday" => Weekday::Tue,
        "wed" | "weds" | "wednesday" => Weekday::Wed,
        "thu" | "thur" | "thurs" | "thursday" => Weekday::Thu,
        "fri" | "friday" => Weekday::Fri,
        "sat" | "saturday" => Weekday::Sat,
        "sun" | "sunday" => Weekday::Sun,
        _ => return None,
    })
}

fn num(caps: &regex::Captures<'_>, name: &str) -> i32 {
    caps.name(name)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}
