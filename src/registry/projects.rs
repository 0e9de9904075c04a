//! In-memory project registry.
//!
//! The registry owns the id counter, so ids are unique per registry, increase
//! in creation order and are never handed out twice, even after removal.

use std::str::FromStr;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::error::{PmError, Result};
use crate::fields::{same_name, Status};
use crate::project::{NewProject, Project};
use crate::user::User;

#[derive(Debug, Default)]
pub struct ProjectRegistry {
    projects: Vec<Project>,
    last_id: u64,
}

/// Parse a status name, case-insensitively.
pub fn parse_status(s: &str) -> Result<Status> {
    Status::from_str(s.trim()).map_err(|_| {
        PmError::invalid_input(format!(
            "unknown status '{}' (valid: Planned, InProgress, Completed, Cancelled, Paused)",
            s.trim()
        ))
    })
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new project and return its id.
    ///
    /// `manager`, when given, must be the user named in `new.manager`.
    pub fn register(&mut self, new: NewProject, manager: Option<&User>) -> Result<u64> {
        if new.name.trim().is_empty() {
            return Err(PmError::invalid_argument("project name cannot be empty"));
        }
        if self.find_by_name(&new.name).is_some() {
            warn!(name = %new.name, "project name already registered");
            return Err(PmError::duplicate("project", new.name.trim()));
        }
        check_manager(new.manager.as_deref(), manager)?;

        self.last_id += 1;
        let project = Project::from_new(self.last_id, new);
        debug!(id = project.id(), name = %project.name, manager = ?project.manager(), "project registered");
        self.projects.push(project);
        Ok(self.last_id)
    }

    /// Case-insensitive, ignoring surrounding whitespace.
    pub fn find_by_name(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| same_name(&p.name, name))
    }

    pub fn find_by_id(&self, id: u64) -> Option<&Project> {
        self.projects.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id() == id)
    }

    fn require_mut(&mut self, id: u64) -> Result<&mut Project> {
        self.get_mut(id).ok_or_else(|| PmError::not_found("project", id))
    }

    pub fn list(&self) -> &[Project] {
        &self.projects
    }

    pub fn list_by_status(&self, status: Status) -> Vec<&Project> {
        self.projects.iter().filter(|p| p.status() == status).collect()
    }

    /// Like `list_by_status`, taking the status by name.
    pub fn list_by_status_str(&self, status: &str) -> Result<Vec<&Project>> {
        Ok(self.list_by_status(parse_status(status)?))
    }

    /// Projects whose responsible manager has this login.
    pub fn list_by_manager(&self, login: &str) -> Vec<&Project> {
        self.projects.iter().filter(|p| p.is_managed_by(login)).collect()
    }

    /// Planned or in-progress projects managed by `login`.
    pub fn workload(&self, login: &str) -> usize {
        self.projects
            .iter()
            .filter(|p| p.is_managed_by(login) && p.is_active())
            .count()
    }

    /// Guarded status change by name. Returns the previous status.
    pub fn update_status(&mut self, id: u64, status: &str) -> Result<Status> {
        let project = self.require_mut(id)?;
        let next = parse_status(status)?;
        project.transition_to(next).inspect_err(|e| warn!(id, error = %e, "status change refused"))
    }

    /// Unguarded status change by name. Returns the previous status.
    pub fn force_status(&mut self, id: u64, status: &str) -> Result<Status> {
        let project = self.require_mut(id)?;
        let next = parse_status(status)?;
        warn!(id, from = %project.status(), to = %next, "status forced past lifecycle guard");
        Ok(project.force_status(next))
    }

    /// Run one of the named lifecycle operations on project `id`.
    pub fn apply(&mut self, id: u64, op: fn(&mut Project) -> Result<Status>) -> Result<Status> {
        let project = self.require_mut(id)?;
        op(project).inspect_err(|e| warn!(id, error = %e, "lifecycle operation refused"))
    }

    /// Replace the responsible manager.
    pub fn set_manager(&mut self, id: u64, manager: Option<&User>) -> Result<()> {
        let login = manager.map(|m| m.login().to_string());
        check_manager(login.as_deref(), manager)?;
        let project = self.require_mut(id)?;
        debug!(id, from = ?project.manager(), to = ?login, "project manager changed");
        project.set_manager(login);
        Ok(())
    }

    pub fn remove(&mut self, id: u64) -> Result<Project> {
        let idx = self
            .projects
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| PmError::not_found("project", id))?;
        debug!(id, "project removed");
        Ok(self.projects.remove(idx))
    }

    /// Case-insensitive match in name or description.
    pub fn search(&self, keyword: &str) -> Vec<&Project> {
        let keyword = keyword.trim().to_lowercase();
        self.projects
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&keyword)
                    || p.description.to_lowercase().contains(&keyword)
            })
            .collect()
    }

    /// Mean progress over all projects; 0 when there are none.
    pub fn average_progress(&self) -> f64 {
        if self.projects.is_empty() {
            return 0.0;
        }
        let total: u32 = self.projects.iter().map(|p| u32::from(p.progress())).sum();
        f64::from(total) / self.projects.len() as f64
    }

    pub fn overdue(&self, today: NaiveDate) -> Vec<&Project> {
        self.projects.iter().filter(|p| p.is_overdue(today)).collect()
    }

    /// Projects per manager login, in first-seen order.
    pub fn count_by_manager(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for login in self.projects.iter().filter_map(Project::manager) {
            match counts.iter_mut().find(|(l, _)| l == login) {
                Some((_, n)) => *n += 1,
                None => counts.push((login.to_string(), 1)),
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

fn check_manager(login: Option<&str>, manager: Option<&User>) -> Result<()> {
    match (login, manager) {
        (None, None) => Ok(()),
        (Some(login), Some(user)) if user.login() == login => {
            if user.is_manager() {
                Ok(())
            } else {
                Err(PmError::invalid_argument(format!("{} is not a manager", user.login())))
            }
        }
        (Some(login), _) => Err(PmError::not_found("manager", login)),
        (None, Some(user)) => Err(PmError::invalid_argument(format!(
            "manager {} given without being named on the project",
            user.login()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joao() -> User {
        User::manager("Joao Silva", "111.111.111-11", "joao@automax.com", "joao", "123")
    }

    fn ana() -> User {
        User::manager("Ana Lima", "444.444.444-44", "ana@automax.com", "ana", "123")
    }

    fn website() -> NewProject {
        NewProject::new("Website", "Dealer website")
            .dates("01/01/2025", "30/06/2025")
            .managed_by("joao")
    }

    #[test]
    fn test_register_assigns_increasing_ids() {
        let mut reg = ProjectRegistry::new();
        let joao = joao();
        let a = reg.register(website(), Some(&joao)).unwrap();
        let b = reg.register(NewProject::new("Inventory", "Stock control"), None).unwrap();
        assert_eq!((a, b), (1, 2));
        assert_eq!(reg.find_by_id(1).unwrap().name, "Website");
    }

    #[test]
    fn test_duplicate_name_is_case_insensitive() {
        let mut reg = ProjectRegistry::new();
        reg.register(NewProject::new("Website", ""), None).unwrap();
        let err = reg.register(NewProject::new("  WEBSITE ", ""), None).unwrap_err();
        assert!(matches!(err, PmError::Duplicate { .. }));
        assert_eq!(reg.len(), 1);
        assert!(reg.find_by_name("website").is_some());
    }

    #[test]
    fn test_duplicate_accented_name() {
        let mut reg = ProjectRegistry::new();
        reg.register(NewProject::new("Migração", ""), None).unwrap();
        let err = reg.register(NewProject::new("MIGRAÇÃO", ""), None).unwrap_err();
        assert!(matches!(err, PmError::Duplicate { .. }));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.find_by_name("migração").unwrap().id(), 1);
    }

    #[test]
    fn test_failed_registration_does_not_consume_id() {
        let mut reg = ProjectRegistry::new();
        reg.register(NewProject::new("A", ""), None).unwrap();
        assert!(reg.register(NewProject::new("a", ""), None).is_err());
        assert!(reg.register(NewProject::new(" ", ""), None).is_err());
        assert_eq!(reg.register(NewProject::new("B", ""), None).unwrap(), 2);
    }

    #[test]
    fn test_manager_must_be_a_manager() {
        let mut reg = ProjectRegistry::new();
        let maria = User::collaborator("Maria", "", "m@x", "maria", "1");
        let new = NewProject::new("Website", "").managed_by("maria");
        assert!(matches!(reg.register(new, Some(&maria)), Err(PmError::InvalidArgument(_))));

        let new = NewProject::new("Website", "").managed_by("joao");
        assert!(matches!(reg.register(new, None), Err(PmError::NotFound { .. })));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_removed_id_is_not_reused() {
        let mut reg = ProjectRegistry::new();
        let id = reg.register(NewProject::new("Website", ""), None).unwrap();
        reg.remove(id).unwrap();
        assert!(reg.find_by_id(id).is_none());
        assert!(matches!(reg.remove(id), Err(PmError::NotFound { .. })));
        let next = reg.register(NewProject::new("Website", ""), None).unwrap();
        assert!(next > id);
    }

    #[test]
    fn test_update_status() {
        let mut reg = ProjectRegistry::new();
        let id = reg.register(NewProject::new("Website", ""), None).unwrap();

        assert_eq!(reg.update_status(id, "inprogress"), Ok(Status::Planned));
        assert!(matches!(reg.update_status(id, "archived"), Err(PmError::InvalidInput(_))));
        assert!(matches!(reg.update_status(id, "planned"), Err(PmError::InvalidTransition { .. })));
        assert!(matches!(reg.update_status(99, "paused"), Err(PmError::NotFound { .. })));
        assert_eq!(reg.find_by_id(id).unwrap().status(), Status::InProgress);
    }

    #[test]
    fn test_force_status() {
        let mut reg = ProjectRegistry::new();
        let id = reg.register(NewProject::new("Website", ""), None).unwrap();
        reg.force_status(id, "COMPLETED").unwrap();
        assert_eq!(reg.force_status(id, "planned"), Ok(Status::Completed));
        assert_eq!(reg.find_by_id(id).unwrap().status(), Status::Planned);
        assert!(reg.force_status(id, "nope").is_err());
        assert_eq!(reg.find_by_id(id).unwrap().status(), Status::Planned);
    }

    #[test]
    fn test_apply_named_operation() {
        let mut reg = ProjectRegistry::new();
        let id = reg.register(NewProject::new("Website", ""), None).unwrap();
        assert!(reg.apply(id, Project::pause).is_err());
        reg.apply(id, Project::start).unwrap();
        reg.apply(id, Project::pause).unwrap();
        assert_eq!(reg.find_by_id(id).unwrap().status(), Status::Paused);
        assert!(reg.apply(42, Project::start).is_err());
    }

    #[test]
    fn test_list_by_status() {
        let mut reg = ProjectRegistry::new();
        let a = reg.register(NewProject::new("A", ""), None).unwrap();
        reg.register(NewProject::new("B", ""), None).unwrap();
        reg.apply(a, Project::start).unwrap();
        assert_eq!(reg.list_by_status(Status::Planned).len(), 1);
        assert_eq!(reg.list_by_status_str("IN-PROGRESS").unwrap()[0].id(), a);
        assert!(reg.list_by_status_str("unknown").is_err());
    }

    #[test]
    fn test_manager_projects_follow_reassignment() {
        let mut reg = ProjectRegistry::new();
        let (joao, ana) = (joao(), ana());
        let id = reg.register(website(), Some(&joao)).unwrap();
        assert_eq!(reg.list_by_manager("joao").len(), 1);

        reg.set_manager(id, Some(&ana)).unwrap();
        assert!(reg.list_by_manager("joao").is_empty());
        assert_eq!(reg.list_by_manager("ana").len(), 1);

        reg.set_manager(id, None).unwrap();
        assert!(reg.list_by_manager("ana").is_empty());

        let maria = User::collaborator("Maria", "", "m@x", "maria", "1");
        assert!(reg.set_manager(id, Some(&maria)).is_err());
    }

    #[test]
    fn test_workload_counts_active_projects() {
        let mut reg = ProjectRegistry::new();
        let joao = joao();
        let a = reg.register(website(), Some(&joao)).unwrap();
        let b = reg
            .register(NewProject::new("CRM", "").managed_by("joao"), Some(&joao))
            .unwrap();
        reg.register(NewProject::new("Fleet", "").managed_by("joao"), Some(&joao))
            .unwrap();
        reg.apply(a, Project::start).unwrap();
        reg.apply(b, Project::cancel).unwrap();
        assert_eq!(reg.workload("joao"), 2);
    }

    #[test]
    fn test_search_and_average() {
        let mut reg = ProjectRegistry::new();
        assert_eq!(reg.average_progress(), 0.0);
        let a = reg.register(NewProject::new("Website", "public DEALER site"), None).unwrap();
        reg.register(NewProject::new("Inventory", "stock"), None).unwrap();
        assert_eq!(reg.search("dealer").len(), 1);
        assert_eq!(reg.search("IN").len(), 1);
        reg.apply(a, Project::start).unwrap();
        assert_eq!(reg.average_progress(), 25.0);
    }

    #[test]
    fn test_overdue_and_manager_counts() {
        let mut reg = ProjectRegistry::new();
        let joao = joao();
        reg.register(website(), Some(&joao)).unwrap();
        reg.register(NewProject::new("Later", "").dates("", "2099-01-01"), None)
            .unwrap();
        let today = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
        let overdue: Vec<&str> = reg.overdue(today).into_iter().map(|p| p.name.as_str()).collect();
        assert_eq!(overdue, ["Website"]);
        assert_eq!(reg.count_by_manager(), vec![("joao".to_string(), 1)]);
    }
}
