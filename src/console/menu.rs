//! Numbered text menus over the in-memory database.
//!
//! A `Session` walks a small state machine (login screen, main menu, one
//! submenu per area). Each step reads one selection and runs one action.
//! Domain errors are printed and the session returns to the same menu; any
//! other failure is logged and the session carries on. "Quit" or the end of
//! input stops it cleanly. A broken input or output stream ends it with an
//! error.

use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Result};
use chrono::Local;
use strum::IntoEnumIterator;
use tracing::{debug, error, info, warn};

use crate::console::colors::Palette;
use crate::console::input::{EndOfInput, Prompt};
use crate::db::{project_table, team_table, user_table, Database, DEFAULT_ADMIN_LOGIN, DEFAULT_ADMIN_PASSWORD};
use crate::error::PmError;
use crate::fields::{Role, Status};
use crate::project::{NewProject, Project};
use crate::report;
use crate::team::Team;
use crate::user::{User, GENERAL_SPECIALTY};

/// Which screen the next step renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuState {
    Login,
    Main,
    Users,
    Projects,
    Teams,
    Tasks,
    Reports,
    Exit,
}

type LifecycleOp = fn(&mut Project) -> crate::error::Result<Status>;

const LIFECYCLE_ACTIONS: [(&str, LifecycleOp); 5] = [
    ("Start", Project::start),
    ("Pause", Project::pause),
    ("Resume", Project::reactivate),
    ("Finish", Project::finish),
    ("Cancel", Project::cancel),
];

/// Reading or writing the console itself failed; retrying cannot help.
fn is_stream_failure(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<io::Error>())
}

pub struct Session<R, W> {
    db: Database,
    io: Prompt<R, W>,
    state: MenuState,
    /// Login of the signed-in user.
    current: Option<String>,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(db: Database, reader: R, writer: W, palette: Palette) -> Self {
        Session {
            db,
            io: Prompt::new(reader, writer, palette),
            state: MenuState::Login,
            current: None,
        }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn into_database(self) -> Database {
        self.db
    }

    /// Drive the menus until the user quits or input runs out.
    pub fn run(&mut self) -> Result<()> {
        info!("console session started");
        self.io.heading("AUTOMAX PROJECT MANAGEMENT")?;
        self.io.say(format!("Default login: {DEFAULT_ADMIN_LOGIN} / {DEFAULT_ADMIN_PASSWORD}"))?;

        while self.state != MenuState::Exit {
            if let Err(err) = self.step() {
                if err.is::<EndOfInput>() {
                    info!("input closed, ending session");
                    break;
                }
                if is_stream_failure(&err) {
                    error!(error = %err, "console stream failed, ending session");
                    return Err(err.context("console I/O failed"));
                }
                self.recover(err)?;
            }
        }
        Ok(())
    }

    /// Report a failed action and stay on the current menu.
    fn recover(&mut self, err: anyhow::Error) -> Result<()> {
        match err.downcast_ref::<PmError>() {
            Some(e) => self.io.error(&e.to_string()),
            None => {
                error!(error = %err, "menu action failed");
                self.io.error("unexpected error, returning to menu")
            }
        }
    }

    fn step(&mut self) -> Result<()> {
        match self.state {
            MenuState::Login => self.login_menu(),
            MenuState::Main => self.main_menu(),
            MenuState::Users => self.users_menu(),
            MenuState::Projects => self.projects_menu(),
            MenuState::Teams => self.teams_menu(),
            MenuState::Tasks => self.tasks_menu(),
            MenuState::Reports => self.reports_menu(),
            MenuState::Exit => Ok(()),
        }
    }

    /// Print a numbered menu and read the 1-based selection.
    fn menu(&mut self, title: &str, items: &[&str]) -> Result<Option<usize>> {
        self.io.heading(title)?;
        self.io.lines(items.iter().enumerate().map(|(i, item)| format!("{}. {item}", i + 1)))?;
        self.io.ask_number("Choose an option")
    }

    fn current_user(&self) -> Result<&User> {
        self.current
            .as_deref()
            .and_then(|login| self.db.users.find_by_login(login))
            .ok_or_else(|| anyhow!("no user signed in"))
    }

    fn require(&self, allowed: fn(&User) -> bool, reason: &str) -> Result<()> {
        let user = self.current_user()?;
        if allowed(user) {
            return Ok(());
        }
        warn!(login = user.login(), reason, "action refused");
        Err(PmError::PermissionDenied(reason.to_string()).into())
    }

    fn back(&mut self) -> Result<()> {
        self.state = MenuState::Main;
        Ok(())
    }

    // Login and main menu

    fn login_menu(&mut self) -> Result<()> {
        match self.menu("LOGIN", &["Log in", "Quit"])? {
            Some(1) => self.log_in(),
            Some(2) => {
                self.state = MenuState::Exit;
                self.io.say("Goodbye!")
            }
            Some(_) => self.io.error("invalid option"),
            None => Ok(()),
        }
    }

    fn log_in(&mut self) -> Result<()> {
        let login = self.io.ask("Login")?;
        let password = self.io.ask_secret("Password")?;
        let Some(user) = self.db.users.authenticate(&login, &password) else {
            warn!(login = %login, "failed login attempt");
            return self.io.error("login or password incorrect");
        };
        info!(login = %login, role = %user.role(), "user logged in");
        let welcome = format!("Welcome, {}!", user.name());
        let profile = user.profile();
        self.io.ok(&welcome)?;
        self.io.lines(profile)?;
        self.current = Some(login);
        self.state = MenuState::Main;
        Ok(())
    }

    fn log_out(&mut self) -> Result<()> {
        if let Some(login) = self.current.take() {
            info!(login = %login, "user logged out");
        }
        self.state = MenuState::Login;
        self.io.ok("logged out")
    }

    fn main_menu(&mut self) -> Result<()> {
        let title = format!("MAIN MENU - {}", self.current_user()?.name());
        let items = [
            "Users",
            "Projects",
            "Teams",
            "Collaborator tasks",
            "Reports",
            "My profile",
            "Log out",
        ];
        match self.menu(&title, &items)? {
            Some(1) => {
                self.require(User::is_administrator, "only administrators can manage users")?;
                self.state = MenuState::Users;
            }
            Some(2) => self.state = MenuState::Projects,
            Some(3) => self.state = MenuState::Teams,
            Some(4) => self.state = MenuState::Tasks,
            Some(5) => self.state = MenuState::Reports,
            Some(6) => self.show_profile()?,
            Some(7) => self.log_out()?,
            Some(_) => self.io.error("invalid option")?,
            None => {}
        }
        Ok(())
    }

    fn show_profile(&mut self) -> Result<()> {
        let user = self.current_user()?;
        let mut lines = user.details();
        lines.extend(user.profile());
        if user.is_manager() {
            let managed = self.db.projects.list_by_manager(user.login());
            lines.push(format!(
                "Managed projects: {} ({} active)",
                managed.len(),
                self.db.projects.workload(user.login())
            ));
            lines.extend(managed.iter().map(|p| format!("  - {}", p.summary())));
        }
        if let Some(profile) = user.collaborator_profile() {
            lines.push(profile.status_line());
        }
        let teams: Vec<&str> = self
            .db
            .teams
            .teams_of(user.login())
            .into_iter()
            .map(|t| t.name.as_str())
            .collect();
        lines.push(format!("Teams: {}", if teams.is_empty() { "-".to_string() } else { teams.join(", ") }));

        self.io.heading("MY PROFILE")?;
        self.io.lines(lines)
    }

    // Selection helpers

    /// Pick a user, optionally restricted to one role, returning their login.
    fn pick_user(&mut self, label: &str, role: Option<Role>) -> Result<Option<String>> {
        let candidates: Vec<(String, String)> = self
            .db
            .users
            .list()
            .iter()
            .filter(|u| role.map_or(true, |r| u.role() == r))
            .map(|u| (u.login().to_string(), format!("{u} [{}]", u.login())))
            .collect();
        if candidates.is_empty() {
            let what = role.map_or("users".to_string(), |r| format!("{r} users"));
            self.io.error(&format!("no {what} registered"))?;
            return Ok(None);
        }
        let labels: Vec<String> = candidates.iter().map(|(_, shown)| shown.clone()).collect();
        Ok(self.io.pick(label, &labels)?.map(|i| candidates[i].0.clone()))
    }

    fn pick_project(&mut self) -> Result<Option<u64>> {
        let projects: Vec<(u64, String)> = self
            .db
            .projects
            .list()
            .iter()
            .map(|p| (p.id(), p.to_string()))
            .collect();
        if projects.is_empty() {
            self.io.error("no projects registered")?;
            return Ok(None);
        }
        let labels: Vec<String> = projects.iter().map(|(_, shown)| shown.clone()).collect();
        Ok(self.io.pick("Project", &labels)?.map(|i| projects[i].0))
    }

    /// Returns the team's id and name.
    fn pick_team(&mut self) -> Result<Option<(u64, String)>> {
        let teams: Vec<(u64, String, String)> = self
            .db
            .teams
            .list()
            .iter()
            .map(|t| (t.id(), t.name.clone(), t.to_string()))
            .collect();
        if teams.is_empty() {
            self.io.error("no teams registered")?;
            return Ok(None);
        }
        let labels: Vec<String> = teams.iter().map(|(_, _, shown)| shown.clone()).collect();
        Ok(self
            .io
            .pick("Team", &labels)?
            .map(|i| (teams[i].0, teams[i].1.clone())))
    }

    // Users

    fn users_menu(&mut self) -> Result<()> {
        let items = [
            "Register user",
            "List users",
            "Search by name",
            "Update email/password",
            "Remove user",
            "Back",
        ];
        match self.menu("USERS", &items)? {
            Some(1) => self.register_user(),
            Some(2) => self.list_users(),
            Some(3) => self.search_users(),
            Some(4) => self.update_user(),
            Some(5) => self.remove_user(),
            Some(6) => self.back(),
            Some(_) => self.io.error("invalid option"),
            None => Ok(()),
        }
    }

    fn register_user(&mut self) -> Result<()> {
        let name = self.io.ask("Name")?;
        let tax_id = self.io.ask("CPF")?;
        let email = self.io.ask("Email")?;
        let login = self.io.ask("Login")?;
        let password = self.io.ask_secret("Password")?;
        if name.is_empty() || login.is_empty() || password.is_empty() {
            return Err(PmError::invalid_argument("name, login and password are required").into());
        }

        let roles: Vec<Role> = Role::iter().collect();
        let labels: Vec<String> = roles.iter().map(Role::to_string).collect();
        let Some(idx) = self.io.pick("User type", &labels)? else {
            return Ok(());
        };
        let user = match roles[idx] {
            Role::Collaborator => {
                let specialty = self.io.ask("Specialty (blank for General)")?;
                let specialty = if specialty.is_empty() { GENERAL_SPECIALTY } else { specialty.as_str() };
                User::collaborator_with_specialty(&name, &tax_id, &email, &login, &password, specialty)
            }
            role => User::new(role, &name, &tax_id, &email, &login, &password),
        };
        self.db.users.register(user)?;
        self.io.ok(&format!("user {login} registered"))
    }

    fn list_users(&mut self) -> Result<()> {
        let users: Vec<&User> = self.db.users.list().iter().collect();
        let rows = user_table(&users);
        self.io.lines(rows)
    }

    fn search_users(&mut self) -> Result<()> {
        let needle = self.io.ask("Name contains")?;
        let found = self.db.users.find_by_name(&needle);
        if found.is_empty() {
            return self.io.say("No users found.");
        }
        let rows = user_table(&found);
        self.io.lines(rows)
    }

    fn update_user(&mut self) -> Result<()> {
        let Some(login) = self.pick_user("User", None)? else {
            return Ok(());
        };
        let email = self.io.ask("New email (blank to keep)")?;
        let password = self.io.ask_secret("New password (blank to keep)")?;
        self.db.users.update(&login, Some(email.as_str()), Some(password.as_str()))?;
        self.io.ok(&format!("user {login} updated"))
    }

    fn remove_user(&mut self) -> Result<()> {
        let Some(login) = self.pick_user("User", None)? else {
            return Ok(());
        };
        if self.current.as_deref() == Some(login.as_str()) {
            return Err(PmError::PermissionDenied("you cannot remove your own account".into()).into());
        }
        self.db.remove_user(&login)?;
        self.io.ok(&format!("user {login} removed"))
    }

    // Projects

    fn projects_menu(&mut self) -> Result<()> {
        let items = [
            "Register project",
            "List projects",
            "Change status",
            "Force status",
            "Remove project",
            "Search projects",
            "Back",
        ];
        match self.menu("PROJECTS", &items)? {
            Some(1) => self.register_project(),
            Some(2) => self.list_projects(),
            Some(3) => self.change_status(),
            Some(4) => self.force_status(),
            Some(5) => self.remove_project(),
            Some(6) => self.search_projects(),
            Some(7) => self.back(),
            Some(_) => self.io.error("invalid option"),
            None => Ok(()),
        }
    }

    fn register_project(&mut self) -> Result<()> {
        self.require(
            User::can_manage_projects,
            "only administrators and managers can register projects",
        )?;
        let name = self.io.ask("Name")?;
        let description = self.io.ask("Description")?;
        let start = self.io.ask("Start date (dd/mm/yyyy)")?;
        let end = self.io.ask("Planned end date (dd/mm/yyyy)")?;
        self.io.say("Responsible manager:")?;
        let Some(manager) = self.pick_user("Manager", Some(Role::Manager))? else {
            return Ok(());
        };

        let new = NewProject::new(&name, &description)
            .dates(&start, &end)
            .managed_by(&manager);
        let id = self.db.register_project(new)?;
        self.io.ok(&format!("project #{id} registered"))
    }

    fn list_projects(&mut self) -> Result<()> {
        if self.db.projects.is_empty() {
            return self.io.say("No projects registered.");
        }
        let projects: Vec<&Project> = self.db.projects.list().iter().collect();
        let rows = project_table(&projects);
        let overdue: Vec<String> = self
            .db
            .projects
            .overdue(Local::now().date_naive())
            .into_iter()
            .map(|p| format!("  ! {}", p.summary()))
            .collect();
        self.io.lines(rows)?;
        if !overdue.is_empty() {
            self.io.say("Overdue:")?;
            self.io.lines(overdue)?;
        }
        Ok(())
    }

    fn status_of(&self, id: u64) -> Result<Status> {
        Ok(self
            .db
            .projects
            .find_by_id(id)
            .ok_or_else(|| PmError::not_found("project", id))?
            .status())
    }

    fn change_status(&mut self) -> Result<()> {
        let Some(id) = self.pick_project()? else {
            return Ok(());
        };
        let labels: Vec<String> = LIFECYCLE_ACTIONS.iter().map(|(name, _)| name.to_string()).collect();
        let Some(i) = self.io.pick("Action", &labels)? else {
            return Ok(());
        };
        let previous = self.db.projects.apply(id, LIFECYCLE_ACTIONS[i].1)?;
        let now = self.status_of(id)?;
        let palette = self.io.palette();
        self.io.ok(&format!(
            "status changed: {} -> {}",
            palette.status(previous),
            palette.status(now)
        ))
    }

    fn force_status(&mut self) -> Result<()> {
        self.require(User::is_administrator, "only administrators can force a status")?;
        let Some(id) = self.pick_project()? else {
            return Ok(());
        };
        let answer = self.io.ask("New status (Planned, InProgress, Completed, Cancelled, Paused)")?;
        let previous = self.db.projects.force_status(id, &answer)?;
        let now = self.status_of(id)?;
        let palette = self.io.palette();
        self.io.ok(&format!(
            "status forced: {} -> {}",
            palette.status(previous),
            palette.status(now)
        ))
    }

    fn remove_project(&mut self) -> Result<()> {
        self.require(
            User::can_manage_projects,
            "only administrators and managers can remove projects",
        )?;
        let Some(id) = self.pick_project()? else {
            return Ok(());
        };
        let removed = self.db.projects.remove(id)?;
        self.io.ok(&format!("project #{} {} removed", removed.id(), removed.name))
    }

    fn search_projects(&mut self) -> Result<()> {
        let keyword = self.io.ask("Keyword")?;
        let found: Vec<String> = self
            .db
            .projects
            .search(&keyword)
            .into_iter()
            .map(Project::summary)
            .collect();
        if found.is_empty() {
            return self.io.say("No projects found.");
        }
        self.io.lines(found)
    }

    // Teams

    fn teams_menu(&mut self) -> Result<()> {
        let items = [
            "Create team",
            "List teams",
            "Add member",
            "Remove member",
            "Remove team",
            "Back",
        ];
        match self.menu("TEAMS", &items)? {
            Some(1) => self.create_team(),
            Some(2) => self.list_teams(),
            Some(3) => self.add_member(),
            Some(4) => self.remove_member(),
            Some(5) => self.remove_team(),
            Some(6) => self.back(),
            Some(_) => self.io.error("invalid option"),
            None => Ok(()),
        }
    }

    fn create_team(&mut self) -> Result<()> {
        self.require(
            User::can_manage_projects,
            "only administrators and managers can create teams",
        )?;
        let name = self.io.ask("Name")?;
        let description = self.io.ask("Description")?;
        let id = self.db.teams.create_team(&name, &description)?;
        self.io.ok(&format!("team #{id} created"))
    }

    fn list_teams(&mut self) -> Result<()> {
        if self.db.teams.is_empty() {
            return self.io.say("No teams registered.");
        }
        let teams: Vec<&Team> = self.db.teams.list().iter().collect();
        let mut lines = team_table(&teams);
        for team in teams.iter().filter(|t| !t.is_empty()) {
            lines.push(format!("{}:", team.name));
            lines.extend(team.members().iter().map(|m| format!("  - {} ({})", m.login, m.role)));
        }
        self.io.lines(lines)
    }

    fn add_member(&mut self) -> Result<()> {
        let Some((_, team)) = self.pick_team()? else {
            return Ok(());
        };
        let Some(login) = self.pick_user("User", None)? else {
            return Ok(());
        };
        self.db.add_team_member(&team, &login)?;
        self.io.ok(&format!("{login} added to {team}"))
    }

    fn remove_member(&mut self) -> Result<()> {
        let Some((id, team)) = self.pick_team()? else {
            return Ok(());
        };
        let members: Vec<String> = self
            .db
            .teams
            .find_by_id(id)
            .map(|t| t.members().iter().map(|m| m.login.clone()).collect())
            .unwrap_or_default();
        if members.is_empty() {
            return self.io.error(&format!("team {team} has no members"));
        }
        let Some(i) = self.io.pick("Member", &members)? else {
            return Ok(());
        };
        let removed = self.db.teams.remove_member(&team, &members[i])?;
        self.io.ok(&format!("{} removed from {team}", removed.login))
    }

    fn remove_team(&mut self) -> Result<()> {
        self.require(
            User::can_manage_projects,
            "only administrators and managers can remove teams",
        )?;
        let Some((id, _)) = self.pick_team()? else {
            return Ok(());
        };
        let removed = self.db.teams.remove(id)?;
        self.io.ok(&format!("team {} removed", removed.name))
    }

    // Collaborator tasks

    fn tasks_menu(&mut self) -> Result<()> {
        match self.menu("COLLABORATOR TASKS", &["Assign task", "Complete task", "List tasks", "Back"])? {
            Some(1) => self.assign_task(),
            Some(2) => self.complete_task(),
            Some(3) => self.list_tasks(),
            Some(4) => self.back(),
            Some(_) => self.io.error("invalid option"),
            None => Ok(()),
        }
    }

    /// Collaborators work on their own tasks; everyone else picks one.
    fn task_owner(&mut self) -> Result<Option<String>> {
        let user = self.current_user()?;
        if user.role() == Role::Collaborator {
            return Ok(Some(user.login().to_string()));
        }
        self.pick_user("Collaborator", Some(Role::Collaborator))
    }

    fn task_labels(&self, login: &str) -> Result<Vec<String>> {
        let profile = self
            .db
            .users
            .find_by_login(login)
            .and_then(User::collaborator_profile)
            .ok_or_else(|| PmError::not_found("collaborator", login))?;
        Ok(profile
            .tasks
            .iter()
            .map(|t| format!("[{}] {}", if t.completed { "x" } else { " " }, t.description))
            .collect())
    }

    fn assign_task(&mut self) -> Result<()> {
        self.require(
            User::can_manage_projects,
            "only administrators and managers can assign tasks",
        )?;
        let Some(login) = self.pick_user("Collaborator", Some(Role::Collaborator))? else {
            return Ok(());
        };
        let description = self.io.ask("Task description")?;
        self.db
            .users
            .get_mut(&login)
            .and_then(User::collaborator_profile_mut)
            .ok_or_else(|| PmError::not_found("collaborator", &login))?
            .assign_task(&description)?;
        debug!(login = %login, "task assigned");
        self.io.ok(&format!("task assigned to {login}"))
    }

    fn complete_task(&mut self) -> Result<()> {
        let Some(login) = self.task_owner()? else {
            return Ok(());
        };
        let labels = self.task_labels(&login)?;
        if labels.is_empty() {
            return self.io.say("No tasks assigned.");
        }
        let Some(i) = self.io.pick("Task", &labels)? else {
            return Ok(());
        };
        let done = self
            .db
            .users
            .get_mut(&login)
            .and_then(User::collaborator_profile_mut)
            .ok_or_else(|| PmError::not_found("collaborator", &login))?
            .complete_task(i)?
            .description
            .clone();
        debug!(login = %login, task = i + 1, "task completed");
        self.io.ok(&format!("task completed: {done}"))
    }

    fn list_tasks(&mut self) -> Result<()> {
        let Some(login) = self.task_owner()? else {
            return Ok(());
        };
        let labels = self.task_labels(&login)?;
        let status = self
            .db
            .users
            .find_by_login(&login)
            .and_then(User::collaborator_profile)
            .map(|p| p.status_line())
            .unwrap_or_default();
        if labels.is_empty() {
            self.io.say("No tasks assigned.")?;
        }
        self.io.lines(labels.iter().enumerate().map(|(i, l)| format!("{}. {l}", i + 1)))?;
        self.io.say(status)
    }

    // Reports

    fn reports_menu(&mut self) -> Result<()> {
        let items = ["Projects report", "Teams report", "Users report", "Quick stats", "Back"];
        let text = match self.menu("REPORTS", &items)? {
            Some(1) => report::projects_report(&self.db.projects),
            Some(2) => report::teams_report(&self.db.teams),
            Some(3) => report::users_report(&self.db.users),
            Some(4) => report::quick_stats(&self.db).join("\n"),
            Some(5) => return self.back(),
            Some(_) => return self.io.error("invalid option"),
            None => return Ok(()),
        };
        self.io.say(text.trim_end())
    }
}
