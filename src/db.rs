//! The in-memory database and table formatting helpers.
//!
//! `Database` owns the three registries for the lifetime of one run. Operations
//! that touch more than one registry (removing a user, resolving a project's
//! manager by login) live here so each registry stays unaware of the others.

use tracing::{debug, info, warn};

use crate::error::{PmError, Result};
use crate::project::{NewProject, Project};
use crate::registry::projects::ProjectRegistry;
use crate::registry::teams::TeamRegistry;
use crate::registry::users::UserDirectory;
use crate::team::Team;
use crate::user::User;

/// Login of the administrator every database starts with.
pub const DEFAULT_ADMIN_LOGIN: &str = "admin";
/// Password of the default administrator.
pub const DEFAULT_ADMIN_PASSWORD: &str = "123456";

#[derive(Debug, Default)]
pub struct Database {
    pub users: UserDirectory,
    pub projects: ProjectRegistry,
    pub teams: TeamRegistry,
}

impl Database {
    /// Empty registries, no users at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Database with the default administrator and, when `with_examples` is
    /// set, one example manager and one example collaborator.
    pub fn seeded(with_examples: bool) -> Result<Self> {
        let mut db = Database::new();
        db.users.register(User::administrator(
            "Admin Sistema",
            "000.000.000-00",
            "admin@automax.com",
            DEFAULT_ADMIN_LOGIN,
            DEFAULT_ADMIN_PASSWORD,
        ))?;
        if with_examples {
            db.users.register(User::manager(
                "Joao Silva",
                "111.111.111-11",
                "joao@automax.com",
                "joao",
                "123",
            ))?;
            db.users.register(User::collaborator(
                "Maria Santos",
                "222.222.222-22",
                "maria@automax.com",
                "maria",
                "123",
            ))?;
        }
        info!(users = db.users.len(), "database seeded");
        Ok(db)
    }

    /// Register a project, resolving the manager named in `new` against the
    /// user directory.
    pub fn register_project(&mut self, new: NewProject) -> Result<u64> {
        let manager = new.manager.as_deref().and_then(|login| self.users.find_by_login(login));
        self.projects.register(new, manager)
    }

    /// Point project `id` at the manager with `login`, or clear it with `None`.
    pub fn assign_manager(&mut self, id: u64, login: Option<&str>) -> Result<()> {
        let manager = match login {
            Some(login) => Some(
                self.users
                    .find_by_login(login)
                    .ok_or_else(|| PmError::not_found("user", login))?,
            ),
            None => None,
        };
        self.projects.set_manager(id, manager)
    }

    pub fn add_team_member(&mut self, team_name: &str, login: &str) -> Result<()> {
        let user = self
            .users
            .find_by_login(login)
            .ok_or_else(|| PmError::not_found("user", login))?;
        self.teams.add_member(team_name, user)
    }

    /// Remove a user and every reference to them: team memberships are
    /// dropped and projects they managed are left without a manager.
    ///
    /// The last administrator cannot be removed.
    pub fn remove_user(&mut self, login: &str) -> Result<User> {
        let user = self
            .users
            .find_by_login(login)
            .ok_or_else(|| PmError::not_found("user", login))?;
        if user.is_administrator() && self.users.list_by_role(user.role()).len() == 1 {
            warn!(login, "refusing to remove the last administrator");
            return Err(PmError::invalid_argument("cannot remove the last administrator"));
        }

        let managed: Vec<u64> = self.projects.list_by_manager(login).iter().map(|p| p.id()).collect();
        for id in &managed {
            self.projects.set_manager(*id, None)?;
        }
        let teams_left = self.teams.remove_user_everywhere(login);
        debug!(login, projects = managed.len(), teams = teams_left, "user references cleared");
        self.users.remove(login)
    }

    pub fn manager_of(&self, project: &Project) -> Option<&User> {
        project.manager().and_then(|login| self.users.find_by_login(login))
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Format projects as table rows, header first.
pub fn project_table(projects: &[&Project]) -> Vec<String> {
    let mut rows = vec![format!(
        "{:<5} {:<20} {:<11} {:>4} {:<12} {:<12} {}",
        "ID", "Name", "Status", "%", "Start", "Planned end", "Manager"
    )];
    for p in projects {
        rows.push(format!(
            "{:<5} {:<20} {:<11} {:>4} {:<12} {:<12} {}",
            p.id(),
            truncate(&p.name, 20),
            p.status().to_string(),
            p.progress(),
            truncate(or_dash(&p.start_date), 12),
            truncate(or_dash(&p.planned_end), 12),
            p.manager().unwrap_or("-"),
        ));
    }
    rows
}

/// Format users as numbered table rows, header first.
pub fn user_table(users: &[&User]) -> Vec<String> {
    let mut rows = vec![format!(
        "{:<4} {:<12} {:<20} {:<14} {}",
        "#", "Login", "Name", "Type", "Email"
    )];
    for (i, u) in users.iter().enumerate() {
        rows.push(format!(
            "{:<4} {:<12} {:<20} {:<14} {}",
            i + 1,
            truncate(u.login(), 12),
            truncate(u.name(), 20),
            u.role().to_string(),
            u.email(),
        ));
    }
    rows
}

/// Format teams as table rows, header first.
pub fn team_table(teams: &[&Team]) -> Vec<String> {
    let mut rows = vec![format!("{:<5} {:<20} {:>7} {}", "ID", "Name", "Members", "Description")];
    for t in teams {
        rows.push(format!(
            "{:<5} {:<20} {:>7} {}",
            t.id(),
            truncate(&t.name, 20),
            t.size(),
            truncate(&t.description, 40),
        ));
    }
    rows
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::{Role, Status};

    #[test]
    fn test_seed() {
        let db = Database::seeded(true).unwrap();
        assert_eq!(db.users.len(), 3);
        assert!(db.users.authenticate("admin", "123456").is_some());
        assert_eq!(db.users.find_by_login("joao").unwrap().role(), Role::Manager);
        assert_eq!(db.users.find_by_login("maria").unwrap().role(), Role::Collaborator);
        assert!(db.projects.is_empty());
        assert!(db.teams.is_empty());

        let bare = Database::seeded(false).unwrap();
        assert_eq!(bare.users.len(), 1);
        assert!(bare.users.has_administrator());
    }

    #[test]
    fn test_manager_project_scenario() {
        let mut db = Database::seeded(true).unwrap();
        let id = db
            .register_project(NewProject::new("Website", "Dealer website").managed_by("joao"))
            .unwrap();
        assert_eq!(db.projects.list_by_manager("joao").len(), 1);

        let steps: [(fn(&mut Project) -> Result<Status>, Status, u8); 3] = [
            (Project::start, Status::InProgress, 50),
            (Project::pause, Status::Paused, 25),
            (Project::finish, Status::Completed, 100),
        ];
        for (op, status, progress) in steps {
            db.projects.apply(id, op).unwrap();
            let p = db.projects.find_by_id(id).unwrap();
            assert_eq!((p.status(), p.progress()), (status, progress));
        }

        assert!(db.projects.apply(id, Project::cancel).is_err());
        assert_eq!(db.projects.find_by_id(id).unwrap().status(), Status::Completed);
    }

    #[test]
    fn test_register_project_with_unknown_or_wrong_manager() {
        let mut db = Database::seeded(true).unwrap();
        let ghost = NewProject::new("Website", "").managed_by("ghost");
        assert!(matches!(db.register_project(ghost), Err(PmError::NotFound { .. })));
        let maria = NewProject::new("Website", "").managed_by("maria");
        assert!(matches!(db.register_project(maria), Err(PmError::InvalidArgument(_))));
        assert!(db.projects.is_empty());
    }

    #[test]
    fn test_assign_manager() {
        let mut db = Database::seeded(true).unwrap();
        let id = db.register_project(NewProject::new("Website", "")).unwrap();
        db.assign_manager(id, Some("joao")).unwrap();
        assert_eq!(db.manager_of(db.projects.find_by_id(id).unwrap()).map(User::login), Some("joao"));
        assert!(db.assign_manager(id, Some("ghost")).is_err());
        db.assign_manager(id, None).unwrap();
        assert!(db.projects.list_by_manager("joao").is_empty());
    }

    #[test]
    fn test_remove_user_clears_references() {
        let mut db = Database::seeded(true).unwrap();
        let id = db
            .register_project(NewProject::new("Website", "").managed_by("joao"))
            .unwrap();
        db.teams.create_team("Sales", "").unwrap();
        db.add_team_member("Sales", "joao").unwrap();
        db.add_team_member("Sales", "maria").unwrap();

        db.remove_user("joao").unwrap();
        assert!(db.users.find_by_login("joao").is_none());
        assert_eq!(db.projects.find_by_id(id).unwrap().manager(), None);
        assert_eq!(db.teams.find_by_name("Sales").unwrap().size(), 1);
        assert!(matches!(db.remove_user("joao"), Err(PmError::NotFound { .. })));
    }

    #[test]
    fn test_last_administrator_stays() {
        let mut db = Database::seeded(false).unwrap();
        assert!(db.remove_user(DEFAULT_ADMIN_LOGIN).is_err());
        db.users
            .register(User::administrator("Second", "", "s@automax.com", "second", "pw"))
            .unwrap();
        assert!(db.remove_user(DEFAULT_ADMIN_LOGIN).is_ok());
        assert!(db.users.has_administrator());
    }

    #[test]
    fn test_add_team_member_unknown_user() {
        let mut db = Database::seeded(true).unwrap();
        db.teams.create_team("Sales", "").unwrap();
        assert!(matches!(db.add_team_member("Sales", "ghost"), Err(PmError::NotFound { .. })));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a long project name", 6), "a lon…");
    }

    #[test]
    fn test_tables() {
        let mut db = Database::seeded(true).unwrap();
        db.register_project(NewProject::new("Website", "").managed_by("joao"))
            .unwrap();
        let projects: Vec<&Project> = db.projects.list().iter().collect();
        let rows = project_table(&projects);
        assert_eq!(rows.len(), 2);
        assert!(rows[1].contains("Website"));
        assert!(rows[1].contains("Planned"));
        assert!(rows[1].ends_with("joao"));

        let users: Vec<&User> = db.users.list().iter().collect();
        let rows = user_table(&users);
        assert_eq!(rows.len(), 4);
        assert!(rows[2].starts_with("2"));
        assert!(rows[2].contains("joao"));
    }
}
