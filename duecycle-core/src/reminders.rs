//! Reminder checkpoints between a task's creation and its due instant.
//!
//! Checkpoints are derived, never stored. Only the acknowledged keys live on
//! the task, so a key must be reproduced byte-for-byte by [`checkpoint_key`].

use chrono::{Days, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::settings::Settings;
use crate::task::{Priority, Task};
use crate::time::{checkpoint_key, one_year_before, start_of_day, truncate_to_minute};

/// Checkpoints strictly between `start` and `end`.
///
/// The span is split into `count + 1` equal steps. When a step would be shorter
/// than a day, one checkpoint per calendar day (at 00:00, starting the day
/// after `start`) is produced instead and `count` is ignored.
pub fn checkpoints_between(start: NaiveDateTime, end: NaiveDateTime, count: u32) -> Vec<NaiveDateTime> {
    let total = end - start;
    if total <= Duration::zero() {
        return vec![];
    }
    let count = count.max(1);
    let slots = i64::from(count) + 1;

    if total < Duration::days(slots) {
        let mut out = Vec::new();
        let mut cur = start
            .date()
            .checked_add_days(Days::new(1))
            .map(start_of_day);
        while let Some(cp) = cur.filter(|cp| *cp < end) {
            out.push(cp);
            cur = cp.date().checked_add_days(Days::new(1)).map(start_of_day);
        }
        return out;
    }

    let total_secs = i128::from(total.num_seconds());
    (1..=i64::from(count))
        .map(|i| {
            // i128: span seconds times count can exceed i64. The quotient never exceeds the span.
            let offset = total_secs * i128::from(i) / i128::from(slots);
            let offset = i64::try_from(offset).unwrap_or_else(|_| total.num_seconds());
            truncate_to_minute(start + Duration::seconds(offset))
        })
        .collect()
}

/// Checkpoints for a task as seen at `now`.
///
/// The start is the task's creation time (or `now` when unknown), clamped to
/// one year before `now`. Tasks without a due value have no checkpoints.
pub fn checkpoints(task: &Task, now: NaiveDateTime, count: u32) -> Vec<NaiveDateTime> {
    let Some(due) = task.due else {
        return vec![];
    };
    let created = task.created_at.unwrap_or(now);
    let start = created.max(one_year_before(now));
    checkpoints_between(start, due.instant(), count)
}

/// Most recent checkpoint at or before `now` that has not been acknowledged.
///
/// `None` when reminders are off, the task ranks below the configured
/// minimum, the task is closed or already past due, or nothing is pending.
pub fn pending_key(now: NaiveDateTime, task: &Task, settings: &Settings) -> Option<String> {
    if !eligible(task, now, settings) {
        return None;
    }
    checkpoints(task, now, settings.checkpoint_count())
        .into_iter()
        .filter(|cp| *cp <= now)
        .map(checkpoint_key)
        .filter(|key| !task.acknowledged_checkpoints.contains(key))
        .last()
}

/// Whether the task should show a pending-reminder indicator.
pub fn has_pending(now: NaiveDateTime, task: &Task, settings: &Settings) -> bool {
    pending_key(now, task, settings).is_some()
}

fn eligible(task: &Task, now: NaiveDateTime, settings: &Settings) -> bool {
    if !settings.reminders.enabled || !task.is_open() {
        return false;
    }
    if !task.priority.at_least(settings.reminders.min_priority) {
        return false;
    }
    task.due.is_some_and(|due| due.instant() > now)
}

/// One row of the pending-reminders list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingReminder {
    pub task_id: u64,
    pub title: String,
    pub priority: Priority,
    /// Due value in storage form.
    pub due: String,
    pub checkpoint_key: String,
}

/// Batch query across all tasks, in task order.
pub fn pending_reminders<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    now: NaiveDateTime,
    settings: &Settings,
) -> Vec<PendingReminder> {
    tasks
        .into_iter()
        .filter_map(|t| {
            let key = pending_key(now, t, settings)?;
            Some(PendingReminder {
                task_id: t.id,
                title: t.title.clone(),
                priority: t.priority,
                due: t.due.map(|d| d.to_storage()).unwrap_or_default(),
                checkpoint_key: key,
            })
        })
        .collect()
}

/// Mark a checkpoint as seen. Returns `false` if it was already acknowledged.
pub fn acknowledge(task: &mut Task, key: &str) -> bool {
    task.acknowledged_checkpoints.insert(key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::DueValue;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, hh: u32, mm: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hh, mm, 0)
            .unwrap()
    }

    fn enabled() -> Settings {
        let mut s = Settings::default();
        s.reminders.enabled = true;
        s
    }

    #[test]
    fn even_subdivision_for_long_spans() {
        let t0 = at(2024, 1, 1, 9, 0);
        let cps = checkpoints_between(t0, t0 + Duration::days(40), 4);
        assert_eq!(
            cps,
            vec![
                at(2024, 1, 9, 9, 0),
                at(2024, 1, 17, 9, 0),
                at(2024, 1, 25, 9, 0),
                at(2024, 2, 2, 9, 0),
            ]
        );
    }

    #[test]
    fn day_granularity_for_short_spans() {
        let t0 = at(2024, 1, 1, 9, 30);
        let cps = checkpoints_between(t0, t0 + Duration::days(3), 4);
        assert_eq!(
            cps,
            vec![at(2024, 1, 2, 0, 0), at(2024, 1, 3, 0, 0), at(2024, 1, 4, 0, 0)]
        );
    }

    #[test]
    fn even_checkpoints_are_minute_truncated() {
        let t0 = at(2024, 1, 1, 0, 0) + Duration::seconds(17);
        let cps = checkpoints_between(t0, t0 + Duration::days(10) + Duration::seconds(7), 2);
        assert_eq!(cps.len(), 2);
        assert!(cps.iter().all(|cp| cp.time().format("%S").to_string() == "00"));
    }

    #[test]
    fn extreme_span_and_count_stay_in_order() {
        let start = NaiveDate::from_ymd_opt(-200_000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let end = NaiveDate::from_ymd_opt(200_000, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let cps = checkpoints_between(start, end, 2_000_000);
        assert_eq!(cps.len(), 2_000_000);
        assert!(cps[0] > start);
        assert!(cps.windows(2).all(|w| w[0] < w[1]));
        assert!(cps[cps.len() - 1] < end);
    }

    #[test]
    fn past_or_equal_due_has_no_checkpoints() {
        let t0 = at(2024, 1, 1, 9, 0);
        assert!(checkpoints_between(t0, t0, 4).is_empty());
        assert!(checkpoints_between(t0, t0 - Duration::hours(1), 4).is_empty());
    }

    #[test]
    fn start_clamped_to_one_year_back() {
        let now = at(2024, 6, 1, 12, 0);
        let t = Task::new(1, "renew passport", at(2010, 1, 1, 0, 0))
            .with_due(DueValue::DateOnly(NaiveDate::from_ymd_opt(2024, 6, 11).unwrap()));
        let cps = checkpoints(&t, now, 1);
        // One checkpoint halfway between 2023-06-01 12:00 and 2024-06-11 00:00.
        assert_eq!(cps.len(), 1);
        assert!(cps[0] > at(2023, 11, 1, 0, 0) && cps[0] < at(2023, 12, 31, 0, 0));
    }

    #[test]
    fn pending_key_picks_latest_unacknowledged() {
        let t0 = at(2024, 1, 1, 9, 0);
        let mut t = Task::new(1, "tax return", t0)
            .with_due(DueValue::Precise(t0 + Duration::days(40)))
            .with_priority(Priority::High);
        let s = enabled();

        // Before the first checkpoint.
        assert_eq!(pending_key(at(2024, 1, 5, 0, 0), &t, &s), None);

        let now = at(2024, 1, 20, 0, 0);
        assert_eq!(pending_key(now, &t, &s).as_deref(), Some("2024-01-17T09:00"));

        assert!(acknowledge(&mut t, "2024-01-17T09:00"));
        assert!(!acknowledge(&mut t, "2024-01-17T09:00"));
        assert_eq!(pending_key(now, &t, &s).as_deref(), Some("2024-01-09T09:00"));

        acknowledge(&mut t, "2024-01-09T09:00");
        assert_eq!(pending_key(now, &t, &s), None);
        assert!(!has_pending(now, &t, &s));
    }

    #[test]
    fn pending_key_respects_settings_and_state() {
        let t0 = at(2024, 1, 1, 9, 0);
        let now = at(2024, 1, 20, 0, 0);
        let base = Task::new(1, "dentist", t0).with_due(DueValue::Precise(t0 + Duration::days(40)));

        assert_eq!(pending_key(now, &base, &Settings::default()), None);
        assert!(pending_key(now, &base, &enabled()).is_some());

        let low = base.clone().with_priority(Priority::Low);
        assert_eq!(pending_key(now, &low, &enabled()), None);

        let mut done = base.clone();
        done.completed_at = Some(now);
        assert_eq!(pending_key(now, &done, &enabled()), None);

        let overdue = base.clone();
        assert_eq!(pending_key(t0 + Duration::days(41), &overdue, &enabled()), None);

        let mut no_due = base.clone();
        no_due.due = None;
        assert_eq!(pending_key(now, &no_due, &enabled()), None);
    }

    #[test]
    fn batch_query_lists_only_pending_tasks() {
        let t0 = at(2024, 1, 1, 9, 0);
        let now = at(2024, 1, 20, 0, 0);
        let due = DueValue::DateOnly(NaiveDate::from_ymd_opt(2024, 2, 10).unwrap());
        let pending = Task::new(1, "pending", t0).with_due(due);
        let mut acked = Task::new(2, "acked", t0).with_due(due);
        for cp in checkpoints(&acked, now, 4) {
            acknowledge(&mut acked, &checkpoint_key(cp));
        }
        let rows = pending_reminders([&pending, &acked], now, &enabled());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].task_id, 1);
        assert_eq!(rows[0].due, "2024-02-10");
        // 39d15h split five ways: steps of 7d22h12m from Jan 1 09:00.
        assert_eq!(rows[0].checkpoint_key, "2024-01-17T05:24");
    }
}
