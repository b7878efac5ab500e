//! User actions that move a task's due value: mark done and bump.

use chrono::{Days, NaiveDateTime};
use tracing::debug;

use crate::hazard;
use crate::recurrence::{add_months_clamped, next_occurrence};
use crate::settings::Settings;
use crate::task::{DueValue, Task};

/// Complete the current cycle.
///
/// Repeating tasks move to their next occurrence and stay open as a checklist
/// item; one-off tasks keep `completed_at`.
pub fn mark_done(task: &mut Task, now: NaiveDateTime) {
    let before = task.due;

    task.completed_at = Some(now);
    task.times_completed = task.times_completed.saturating_add(1);
    task.history.insert(now.date());
    hazard::on_complete(task);

    if task.repeat.is_repeating() {
        let due = task.due.unwrap_or(DueValue::DateOnly(now.date()));
        task.due = Some(due.with_date(next_occurrence(due.date(), task.repeat)));
        task.completed_at = None;
    }

    debug!(
        task_id = task.id,
        repeat = %task.repeat,
        before = ?before.map(|d| d.to_storage()),
        after = ?task.due.map(|d| d.to_storage()),
        "marked done"
    );
}

/// Shift the due value by `days` (may be negative).
///
/// A task without a due value is bumped from `now` and becomes precise.
pub fn bump_days(task: &mut Task, days: i64, now: NaiveDateTime, settings: &Settings) {
    let due = task.due.unwrap_or(DueValue::precise(now));
    let date = shift_days(due.date(), days);
    task.due = Some(due.with_date(date));
    record_bump(task, settings);
}

pub fn bump_weeks(task: &mut Task, weeks: i64, now: NaiveDateTime, settings: &Settings) {
    bump_days(task, weeks.saturating_mul(7), now, settings);
}

/// One month forward. Date-only values keep the day of month (clamped);
/// precise values move 30 days.
pub fn bump_months(task: &mut Task, now: NaiveDateTime, settings: &Settings) {
    let due = task.due.unwrap_or(DueValue::precise(now));
    task.due = Some(match due {
        DueValue::DateOnly(d) => DueValue::DateOnly(add_months_clamped(d, 1)),
        DueValue::Precise(_) => due.with_date(shift_days(due.date(), 30)),
    });
    record_bump(task, settings);
}

fn shift_days(date: chrono::NaiveDate, days: i64) -> chrono::NaiveDate {
    let n = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(n)
    } else {
        date.checked_sub_days(n)
    };
    shifted.unwrap_or(date)
}

fn record_bump(task: &mut Task, settings: &Settings) {
    task.bumped_count = task.bumped_count.saturating_add(1);
    // Pushing a repeating task out is a skipped cycle.
    if settings.hazard.escalation_enabled && task.repeat.is_repeating() {
        hazard::on_skip(task);
    }
}
