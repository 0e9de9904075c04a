//! Projects and their status lifecycle.
//!
//! Every status change except `force_status` goes through `transition_to`, which
//! enforces the table in `Status::allowed_next`. The named operations (`start`,
//! `pause`, ...) add a narrower precondition on top of it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PmError, Result};
use crate::fields::Status;

/// Date layouts accepted when checking deadlines.
const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];

/// A tracked project. Ids are handed out by `ProjectRegistry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    id: u64,
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub planned_end: String,
    status: Status,
    /// Login of the responsible manager.
    manager: Option<String>,
}

/// Input for `ProjectRegistry::register`.
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub start_date: String,
    pub planned_end: String,
    pub manager: Option<String>,
}

impl NewProject {
    pub fn new(name: &str, description: &str) -> Self {
        NewProject {
            name: name.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    pub fn dates(mut self, start_date: &str, planned_end: &str) -> Self {
        self.start_date = start_date.to_string();
        self.planned_end = planned_end.to_string();
        self
    }

    pub fn managed_by(mut self, login: &str) -> Self {
        self.manager = Some(login.to_string());
        self
    }
}

impl Project {
    pub(crate) fn from_new(id: u64, new: NewProject) -> Self {
        Project {
            id,
            name: new.name.trim().to_string(),
            description: new.description,
            start_date: new.start_date,
            planned_end: new.planned_end,
            status: Status::Planned,
            manager: new.manager,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn manager(&self) -> Option<&str> {
        self.manager.as_deref()
    }

    pub(crate) fn set_manager(&mut self, login: Option<String>) {
        self.manager = login;
    }

    pub fn is_managed_by(&self, login: &str) -> bool {
        self.manager.as_deref() == Some(login)
    }

    pub fn progress(&self) -> u8 {
        self.status.progress()
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Move to `next` if the lifecycle table allows it.
    pub fn transition_to(&mut self, next: Status) -> Result<Status> {
        if !self.status.can_transition_to(next) {
            return Err(PmError::InvalidTransition { from: self.status, to: next });
        }
        Ok(self.apply(next))
    }

    /// Set the status without consulting the lifecycle table.
    ///
    /// Correction path for administrators; everything else uses `transition_to`.
    pub fn force_status(&mut self, next: Status) -> Status {
        self.apply(next)
    }

    /// Planned -> InProgress.
    pub fn start(&mut self) -> Result<Status> {
        self.guarded(Status::InProgress, &[Status::Planned])
    }

    /// InProgress | Paused -> Completed.
    pub fn finish(&mut self) -> Result<Status> {
        self.guarded(Status::Completed, &[Status::InProgress, Status::Paused])
    }

    /// InProgress -> Paused.
    pub fn pause(&mut self) -> Result<Status> {
        self.guarded(Status::Paused, &[Status::InProgress])
    }

    /// Anything but Completed -> Cancelled.
    pub fn cancel(&mut self) -> Result<Status> {
        self.guarded(
            Status::Cancelled,
            &[Status::Planned, Status::InProgress, Status::Paused],
        )
    }

    /// Paused -> InProgress.
    pub fn reactivate(&mut self) -> Result<Status> {
        self.guarded(Status::InProgress, &[Status::Paused])
    }

    fn guarded(&mut self, next: Status, from: &[Status]) -> Result<Status> {
        if !from.contains(&self.status) {
            return Err(PmError::InvalidTransition { from: self.status, to: next });
        }
        self.transition_to(next)
    }

    /// Returns the previous status.
    fn apply(&mut self, next: Status) -> Status {
        let previous = std::mem::replace(&mut self.status, next);
        debug!(project = self.id, %previous, %next, "project status changed");
        previous
    }

    /// Unfinished and past a parseable planned end date.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        if self.is_finished() {
            return false;
        }
        parse_date(&self.planned_end).is_some_and(|end| end < today)
    }

    pub fn summary(&self) -> String {
        format!(
            "Project #{}: {} [{}] - {}% complete",
            self.id,
            self.name,
            self.status,
            self.progress()
        )
    }
}

impl PartialEq for Project {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Project {}

impl std::fmt::Display for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Project #{}: {} ({})", self.id, self.name, self.status)
    }
}

/// Parse a free-text date in one of the accepted layouts.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}
