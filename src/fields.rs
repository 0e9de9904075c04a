//! Enumerations shared by users, projects and teams.
//!
//! `Status` carries the project lifecycle table, `Role` names the closed set of
//! user variants. Both parse case-insensitively and display their canonical
//! spelling.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Project lifecycle status.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Status {
    Planned,
    #[strum(to_string = "InProgress", serialize = "in-progress", serialize = "in progress")]
    InProgress,
    Completed,
    Cancelled,
    Paused,
}

impl Status {
    /// Statuses reachable from `self` in one guarded step.
    pub fn allowed_next(self) -> &'static [Status] {
        use Status::*;
        match self {
            Planned => &[InProgress, Cancelled],
            InProgress => &[Paused, Completed, Cancelled],
            Paused => &[InProgress, Completed, Cancelled],
            Completed | Cancelled => &[],
        }
    }

    /// Check if transition to the given status is valid.
    pub fn can_transition_to(self, next: Status) -> bool {
        self.allowed_next().contains(&next)
    }

    /// Progress percentage implied by the status.
    pub fn progress(self) -> u8 {
        match self {
            Status::Planned => 0,
            Status::InProgress => 50,
            Status::Completed => 100,
            Status::Cancelled => 0,
            Status::Paused => 25,
        }
    }

    /// Planned or in progress.
    pub fn is_active(self) -> bool {
        matches!(self, Status::Planned | Status::InProgress)
    }

    /// Completed or cancelled; nothing leaves these states.
    pub fn is_finished(self) -> bool {
        matches!(self, Status::Completed | Status::Cancelled)
    }
}

/// The variant a user was registered as.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Role {
    Administrator,
    Manager,
    Collaborator,
}

/// Whether two names match, ignoring case (Unicode-aware) and surrounding
/// whitespace.
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}
