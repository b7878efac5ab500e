//! duecycle-core: recurring-task scheduling and reminder checkpoints.
//!
//! All operations are synchronous and clock-free: callers pass `now` / `today`
//! and the settings they want applied, then persist whatever changed.

pub mod catch_up;
pub mod completion;
pub mod due;
pub mod hazard;
pub mod recurrence;
pub mod reminders;
pub mod settings;
pub mod stats;
pub mod task;
pub mod time;

pub use catch_up::{advance, advance_all};
pub use completion::{bump_days, bump_months, bump_weeks, mark_done};
pub use due::{DueParseError, SUPPORTED_FORMATS, parse_due, parse_due_entry, parse_quick_time};
pub use recurrence::next_occurrence;
pub use reminders::{
    PendingReminder, acknowledge, checkpoints, checkpoints_between, has_pending, pending_key,
    pending_reminders,
};
pub use settings::{HazardSettings, ReminderSettings, Settings};
pub use stats::{StatsSummary, Streak};
pub use task::{DueValue, Priority, PriorityParseError, Repeat, RepeatParseError, Task};
