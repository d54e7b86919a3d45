use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Staff groups that receive notifications
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Kitchen,
    Waiters,
    Management,
}

impl StaffRole {
    pub const ALL: [StaffRole; 3] = [StaffRole::Kitchen, StaffRole::Waiters, StaffRole::Management];

    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Kitchen => "kitchen",
            StaffRole::Waiters => "waiters",
            StaffRole::Management => "management",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Staff directory lookup: who receives a role's notifications
pub trait StaffRoster: Send + Sync {
    fn recipient_for(&self, role: StaffRole) -> Option<String>;
}

/// Roster backed by a fixed role → recipient map
#[derive(Debug, Clone, Default)]
pub struct StaticRoster {
    recipients: HashMap<StaffRole, String>,
}

impl StaticRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_recipient(mut self, role: StaffRole, recipient: impl Into<String>) -> Self {
        self.recipients.insert(role, recipient.into());
        self
    }
}

impl StaffRoster for StaticRoster {
    fn recipient_for(&self, role: StaffRole) -> Option<String> {
        self.recipients.get(&role).cloned()
    }
}
