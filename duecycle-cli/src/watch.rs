//! Live mode: run catch-up at every local midnight.

use anyhow::Result;
use chrono::{Days, Local, NaiveDateTime, NaiveTime};
use duecycle_core::Settings;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

use crate::store;

/// Seconds past midnight at which the daily pass fires.
const FIRE_AT_SECS: u32 = 5;

/// Delay until the next `00:00:05` after `now` (never under one second).
pub fn until_next_midnight(now: NaiveDateTime) -> Duration {
    let fire = NaiveTime::from_hms_opt(0, 0, FIRE_AT_SECS).unwrap_or(NaiveTime::MIN);
    let next = now
        .date()
        .checked_add_days(Days::new(1))
        .map(|d| d.and_time(fire));
    let secs = next.map_or(86_400, |n| (n - now).num_seconds());
    Duration::from_secs(secs.max(1).unsigned_abs())
}

/// Load, catch up, and persist when anything moved. Returns how many tasks changed.
pub fn run_pass(tasks_path: &Path, settings: &Settings, now: NaiveDateTime) -> Result<usize> {
    let mut db = store::load(tasks_path)?;
    let changed = duecycle_core::advance_all(db.tasks.iter_mut(), now.date(), settings);
    if changed > 0 {
        store::save(tasks_path, &db)?;
    }
    Ok(changed)
}

pub async fn run(tasks_path: &Path, settings: &Settings) -> Result<()> {
    let changed = run_pass(tasks_path, settings, Local::now().naive_local())?;
    info!(changed, "start-up catch-up");

    loop {
        let delay = until_next_midnight(Local::now().naive_local());
        info!(secs = delay.as_secs(), "sleeping until next midnight");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                // The file is re-read each night so edits made by other commands are kept.
                match run_pass(tasks_path, settings, Local::now().naive_local()) {
                    Ok(changed) => info!(changed, "midnight catch-up"),
                    Err(err) => warn!(error = %format!("{err:#}"), "midnight catch-up failed"),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("stopping watch");
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use duecycle_core::{DueValue, Repeat, Task};

    #[test]
    fn delay_targets_five_past_midnight() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 8)
            .unwrap()
            .and_hms_opt(23, 59, 0)
            .unwrap();
        assert_eq!(until_next_midnight(now), Duration::from_secs(65));

        let early = NaiveDate::from_ymd_opt(2024, 3, 8)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(until_next_midnight(early), Duration::from_secs(86_405));
    }

    #[test]
    fn pass_persists_only_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("tasks.json");
        let created = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut db = store::Db::default();
        db.insert_with(|id| {
            Task::new(id, "journal", created)
                .with_repeat(Repeat::Daily)
                .with_due(DueValue::DateOnly(created.date()))
        })
        .unwrap();
        store::save(&p, &db).unwrap();

        let now = created + chrono::Duration::days(2);
        assert_eq!(run_pass(&p, &Settings::default(), now).unwrap(), 1);
        assert_eq!(run_pass(&p, &Settings::default(), now).unwrap(), 0);
        let back = store::load(&p).unwrap();
        assert_eq!(back.tasks[0].due, Some(DueValue::DateOnly(now.date())));
        assert_eq!(back.tasks[0].skip_count, 2);
    }
}
