//! Settings consumed read-only by the scheduling core.

use serde::{Deserialize, Serialize};

use crate::task::Priority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderSettings {
    pub enabled: bool,
    /// Desired checkpoints between creation and due; values below 1 count as 1.
    pub count: u32,
    /// Tasks ranked below this never get reminders.
    pub min_priority: Priority,
}

impl Default for ReminderSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            count: 4,
            min_priority: Priority::Medium,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardSettings {
    pub escalation_enabled: bool,
}

impl Default for HazardSettings {
    fn default() -> Self {
        Self {
            escalation_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub reminders: ReminderSettings,
    pub hazard: HazardSettings,
}

impl Settings {
    pub fn checkpoint_count(&self) -> u32 {
        self.reminders.count.max(1)
    }
}
