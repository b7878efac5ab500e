//! Catch-up scheduler for repeating tasks.
//!
//! Runs on process start and at every local midnight. A repeating task whose
//! next theoretical occurrence is already on or before `today` is advanced one
//! occurrence at a time until the following one lies in the future. Each
//! advance is one missed cycle and feeds hazard escalation.

use chrono::NaiveDate;
use tracing::debug;

use crate::hazard;
use crate::recurrence::next_occurrence;
use crate::settings::Settings;
use crate::task::{DueValue, Task};

/// Advance one task. Returns whether any field changed.
///
/// Never fails: a missing or unparseable due value is treated as today, date-only.
pub fn advance(task: &mut Task, today: NaiveDate, settings: &Settings) -> bool {
    if !task.repeat.is_repeating() {
        return false;
    }

    let original = task.due;
    // Precision (date-only vs precise) and time of day survive every rewrite.
    let mut due = original.unwrap_or(DueValue::DateOnly(today));
    let mut skipped = 0u32;

    loop {
        let current = due.date();
        let next = next_occurrence(current, task.repeat);
        if next > today || next <= current {
            break;
        }
        due = due.with_date(next);
        skipped += 1;
        if settings.hazard.escalation_enabled {
            hazard::on_skip(task);
        }
    }

    let mut changed = skipped > 0;

    if task.completed_at.is_some() && due.date() == today {
        task.completed_at = None;
        changed = true;
    }

    if original != Some(due) {
        task.due = Some(due);
        changed = true;
    }

    if changed {
        debug!(
            task_id = task.id,
            skipped,
            due = %due,
            "caught up repeating task"
        );
    }

    changed
}

/// Advance every task. Returns the number of tasks that changed.
pub fn advance_all<'a>(
    tasks: impl IntoIterator<Item = &'a mut Task>,
    today: NaiveDate,
    settings: &Settings,
) -> usize {
    tasks
        .into_iter()
        .filter_map(|t| advance(t, today, settings).then_some(()))
        .count()
}
