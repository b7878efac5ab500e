//! Hazard escalation: raise priority after consecutive missed cycles.
//!
//! Thresholds:
//! - 2 skips: priority becomes H, the original priority is parked in `base_priority`
//! - 3+ skips: priority becomes U (hazard)
//!
//! Completion or an explicit reset restores the parked priority.

use tracing::debug;

use crate::task::{Priority, Task};

pub const HIGH_AT: u32 = 2;
pub const HAZARD_AT: u32 = 3;

/// Record one missed cycle.
pub fn on_skip(task: &mut Task) {
    task.skip_count = task.skip_count.saturating_add(1);

    if task.skip_count >= HIGH_AT && task.base_priority.is_none() {
        task.base_priority = Some(task.priority);
    }

    if task.skip_count >= HAZARD_AT {
        task.priority = Priority::Urgent;
    } else if task.skip_count == HIGH_AT {
        task.priority = Priority::High;
    }

    debug!(
        task_id = task.id,
        skip_count = task.skip_count,
        priority = %task.priority,
        "hazard skip recorded"
    );
}

/// A cycle was marked done.
pub fn on_complete(task: &mut Task) {
    restore(task);
}

/// Administrative reset across every task. Returns how many tasks changed.
pub fn reset_all<'a>(tasks: impl IntoIterator<Item = &'a mut Task>) -> usize {
    tasks
        .into_iter()
        .map(|t| {
            let touched = t.skip_count != 0 || t.base_priority.is_some();
            restore(t);
            touched
        })
        .filter(|touched| *touched)
        .count()
}

fn restore(task: &mut Task) {
    task.skip_count = 0;
    if let Some(base) = task.base_priority.take() {
        task.priority = base;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Repeat;
    use chrono::NaiveDate;

    fn task(priority: Priority) -> Task {
        let created = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        Task::new(1, "stretch", created)
            .with_repeat(Repeat::Daily)
            .with_priority(priority)
    }

    #[test]
    fn escalates_through_thresholds() {
        let mut t = task(Priority::Low);

        on_skip(&mut t);
        assert_eq!(t.skip_count, 1);
        assert_eq!(t.priority, Priority::Low);
        assert_eq!(t.base_priority, None);

        on_skip(&mut t);
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.base_priority, Some(Priority::Low));

        on_skip(&mut t);
        assert_eq!(t.priority, Priority::Urgent);

        on_skip(&mut t);
        assert_eq!(t.skip_count, 4);
        assert_eq!(t.priority, Priority::Urgent);
        assert_eq!(t.base_priority, Some(Priority::Low));
    }

    #[test]
    fn complete_restores_base_priority() {
        let mut t = task(Priority::Medium);
        for _ in 0..3 {
            on_skip(&mut t);
        }
        on_complete(&mut t);
        assert_eq!(t.skip_count, 0);
        assert_eq!(t.priority, Priority::Medium);
        assert_eq!(t.base_priority, None);
    }

    #[test]
    fn complete_after_single_skip_keeps_priority() {
        let mut t = task(Priority::High);
        on_skip(&mut t);
        on_complete(&mut t);
        assert_eq!(t.skip_count, 0);
        assert_eq!(t.priority, Priority::High);
    }

    #[test]
    fn reset_all_restores_every_task() {
        let mut escalated = task(Priority::Low);
        for _ in 0..5 {
            on_skip(&mut escalated);
        }
        let mut once = task(Priority::Medium);
        on_skip(&mut once);
        let clean = task(Priority::Daily);

        let mut tasks = vec![escalated, once, clean.clone()];
        let changed = reset_all(tasks.iter_mut());

        assert_eq!(changed, 2);
        assert!(tasks.iter().all(|t| t.skip_count == 0 && t.base_priority.is_none()));
        assert_eq!(tasks[0].priority, Priority::Low);
        assert_eq!(tasks[1].priority, Priority::Medium);
        assert_eq!(tasks[2], clean);
    }
}
