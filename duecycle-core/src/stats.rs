//! Completion statistics and streaks.

use chrono::{Days, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::task::Task;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub title: String,
    pub days: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub open: usize,
    pub done_today: usize,
    pub done_7: usize,
    pub done_30: usize,
    /// Top five repeating tasks by current streak.
    pub top_streaks: Vec<Streak>,
}

/// Consecutive completion days ending yesterday.
///
/// Today does not count yet, so an unfinished today never breaks a streak.
pub fn streak(task: &Task, today: NaiveDate) -> u32 {
    let mut days = 0;
    let mut cur = today.checked_sub_days(Days::new(1));
    while let Some(d) = cur.filter(|d| task.history.contains(d)) {
        days += 1;
        cur = d.checked_sub_days(Days::new(1));
    }
    days
}

pub fn summary<'a>(tasks: impl IntoIterator<Item = &'a Task>, now: NaiveDateTime) -> StatsSummary {
    let today = now.date();
    let seven = now - Duration::days(7);
    let thirty = now - Duration::days(30);

    let mut out = StatsSummary::default();
    let mut streaks = Vec::new();

    for t in tasks {
        match t.completed_at {
            Some(done) => {
                if done.date() == today {
                    out.done_today += 1;
                }
                if done >= seven {
                    out.done_7 += 1;
                }
                if done >= thirty {
                    out.done_30 += 1;
                }
            }
            None => out.open += 1,
        }

        if t.repeat.is_repeating() {
            streaks.push(Streak {
                title: t.title.clone(),
                days: streak(t, today),
            });
        }
    }

    // Stable: ties keep task order.
    streaks.sort_by(|a, b| b.days.cmp(&a.days));
    streaks.truncate(5);
    out.top_streaks = streaks;
    out
}
