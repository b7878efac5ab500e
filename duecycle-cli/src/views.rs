use chrono::{Duration, NaiveDateTime};
use clap::ValueEnum;
use duecycle_core::{Repeat, Settings, Task, has_pending};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Scope {
    /// Open tasks (default)
    #[default]
    Open,
    /// Open tasks due today or overdue
    Today,
    /// Open tasks past their due instant
    Overdue,
    /// Open tasks due within the next seven days
    Week,
    /// Open repeating tasks
    Habits,
    Done,
    Suspended,
    Deleted,
    /// Everything except deleted tasks
    All,
}

pub fn matches(task: &Task, scope: Scope, now: NaiveDateTime) -> bool {
    if scope == Scope::Deleted {
        return task.is_deleted;
    }
    if task.is_deleted {
        return false;
    }
    if scope == Scope::Suspended {
        return task.is_suspended;
    }
    if scope == Scope::All {
        return true;
    }
    if task.is_suspended {
        return false;
    }

    let done = task.completed_at.is_some();
    if scope == Scope::Done {
        return done;
    }
    if done {
        return false;
    }

    let due = task.due.map(|d| d.instant());
    match scope {
        Scope::Today => due.is_some_and(|d| d.date() == now.date() || d < now),
        Scope::Overdue => due.is_some_and(|d| d < now),
        Scope::Week => due.is_some_and(|d| d <= now + Duration::days(7)),
        Scope::Habits => task.repeat != Repeat::None,
        _ => true,
    }
}

/// Open tasks first by due instant (undated last), then by severity, then id.
pub fn sort(tasks: &mut [&Task]) {
    tasks.sort_by(|a, b| {
        let da = a.due.map(|d| d.instant());
        let db = b.due.map(|d| d.instant());
        da.is_none()
            .cmp(&db.is_none())
            .then(da.cmp(&db))
            .then(b.priority.rank().cmp(&a.priority.rank()))
            .then(a.id.cmp(&b.id))
    });
}

/// One line of `duecycle list`. `*` marks a pending reminder.
pub fn render_row(task: &Task, now: NaiveDateTime, settings: &Settings) -> String {
    let due = task.due.map(|d| d.to_storage()).unwrap_or_default();
    let flag = if has_pending(now, task, settings) { "*" } else { " " };
    let mut row = format!(
        "{flag}{:>4}  [{}]  {:<16}  {:<10}  {}",
        task.id, task.priority, due, task.repeat, task.title
    );
    if task.skip_count > 0 {
        row.push_str(&format!("  (skipped {})", task.skip_count));
    }
    if !task.group.is_empty() {
        row.push_str(&format!("  #{}", task.group));
    }
    row
}
