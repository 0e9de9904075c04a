//! User accounts and their role-specific data.
//!
//! A `User` holds the account fields every variant shares. What differs between
//! administrators, managers and collaborators lives in `UserKind`. Managers keep
//! no project list of their own: the projects they manage are looked up in the
//! project registry by login, so reassigning a project never leaves a stale copy.

use serde::{Deserialize, Serialize};

use crate::error::{PmError, Result};
use crate::fields::{same_name, Role};

/// Specialty a collaborator starts with; it can perform any kind of task.
pub const GENERAL_SPECIALTY: &str = "General";

/// A registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    name: String,
    tax_id: String,
    email: String,
    login: String,
    #[serde(skip_serializing, default)]
    password: String,
    kind: UserKind,
}

/// Role-specific data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "kebab-case")]
pub enum UserKind {
    Administrator,
    Manager,
    Collaborator(CollaboratorProfile),
}

/// Work assigned to a collaborator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollaboratorProfile {
    pub specialty: String,
    pub tasks: Vec<Assignment>,
}

/// One task handed to a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub description: String,
    pub completed: bool,
}

impl User {
    fn with_kind(name: &str, tax_id: &str, email: &str, login: &str, password: &str, kind: UserKind) -> Self {
        User {
            name: name.to_string(),
            tax_id: tax_id.to_string(),
            email: email.to_string(),
            login: login.to_string(),
            password: password.to_string(),
            kind,
        }
    }

    pub fn administrator(name: &str, tax_id: &str, email: &str, login: &str, password: &str) -> Self {
        Self::with_kind(name, tax_id, email, login, password, UserKind::Administrator)
    }

    pub fn manager(name: &str, tax_id: &str, email: &str, login: &str, password: &str) -> Self {
        Self::with_kind(name, tax_id, email, login, password, UserKind::Manager)
    }

    pub fn collaborator(name: &str, tax_id: &str, email: &str, login: &str, password: &str) -> Self {
        Self::collaborator_with_specialty(name, tax_id, email, login, password, GENERAL_SPECIALTY)
    }

    pub fn collaborator_with_specialty(
        name: &str,
        tax_id: &str,
        email: &str,
        login: &str,
        password: &str,
        specialty: &str,
    ) -> Self {
        let profile = CollaboratorProfile {
            specialty: specialty.to_string(),
            tasks: Vec::new(),
        };
        Self::with_kind(name, tax_id, email, login, password, UserKind::Collaborator(profile))
    }

    /// Build a user of the given role with default role data.
    pub fn new(role: Role, name: &str, tax_id: &str, email: &str, login: &str, password: &str) -> Self {
        match role {
            Role::Administrator => Self::administrator(name, tax_id, email, login, password),
            Role::Manager => Self::manager(name, tax_id, email, login, password),
            Role::Collaborator => Self::collaborator(name, tax_id, email, login, password),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn tax_id(&self) -> &str {
        &self.tax_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn set_email(&mut self, email: &str) {
        self.email = email.to_string();
    }

    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn set_password(&mut self, password: &str) {
        self.password = password.to_string();
    }

    /// Exact, case-sensitive comparison.
    pub fn validate_password(&self, candidate: &str) -> bool {
        self.password == candidate
    }

    pub fn kind(&self) -> &UserKind {
        &self.kind
    }

    pub fn role(&self) -> Role {
        match self.kind {
            UserKind::Administrator => Role::Administrator,
            UserKind::Manager => Role::Manager,
            UserKind::Collaborator(_) => Role::Collaborator,
        }
    }

    pub fn is_administrator(&self) -> bool {
        self.role() == Role::Administrator
    }

    pub fn is_manager(&self) -> bool {
        self.role() == Role::Manager
    }

    /// Administrators and managers may register projects and create teams.
    pub fn can_manage_projects(&self) -> bool {
        matches!(self.role(), Role::Administrator | Role::Manager)
    }

    pub fn collaborator_profile(&self) -> Option<&CollaboratorProfile> {
        match &self.kind {
            UserKind::Collaborator(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn collaborator_profile_mut(&mut self) -> Option<&mut CollaboratorProfile> {
        match &mut self.kind {
            UserKind::Collaborator(profile) => Some(profile),
            _ => None,
        }
    }

    /// Text after the `@` of the email, or the whole email when there is none.
    pub fn email_domain(&self) -> &str {
        match self.email.split_once('@') {
            Some((_, domain)) => domain,
            None => &self.email,
        }
    }

    /// Role-specific profile lines shown after login and on "My profile".
    pub fn profile(&self) -> Vec<String> {
        let mut lines = vec![format!("Profile: {} - {}", self.role(), self.name)];
        match &self.kind {
            UserKind::Administrator => {
                lines.push("Permissions: full system access".to_string());
            }
            UserKind::Manager => {
                lines.push("Permissions: manage projects and teams".to_string());
            }
            UserKind::Collaborator(profile) => {
                lines.push(format!("Specialty: {}", profile.specialty));
                lines.push(format!("Assigned tasks: {}", profile.tasks.len()));
                lines.push("Permissions: view projects and carry out tasks".to_string());
            }
        }
        lines
    }

    /// Account details followed by role details.
    pub fn details(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Name:   {}", self.name),
            format!("CPF:    {}", self.tax_id),
            format!("Email:  {}", self.email),
            format!("Login:  {}", self.login),
            format!("Type:   {}", self.role()),
        ];
        if let Some(profile) = self.collaborator_profile() {
            lines.push(format!("Specialty: {}", profile.specialty));
            lines.push(format!("Total tasks: {}", profile.tasks.len()));
            lines.push(format!("Productivity: {:.1}%", profile.productivity()));
        }
        lines
    }
}

impl PartialEq for User {
    fn eq(&self, other: &Self) -> bool {
        self.login == other.login
    }
}

impl Eq for User {}

impl std::fmt::Display for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.role())
    }
}

impl CollaboratorProfile {
    pub fn assign_task(&mut self, description: &str) -> Result<()> {
        let description = description.trim();
        if description.is_empty() {
            return Err(PmError::invalid_argument("task description cannot be empty"));
        }
        self.tasks.push(Assignment {
            description: description.to_string(),
            completed: false,
        });
        Ok(())
    }

    /// Mark the task at `index` (zero-based) as completed.
    pub fn complete_task(&mut self, index: usize) -> Result<&Assignment> {
        let task = self.task_mut(index)?;
        if task.completed {
            return Err(PmError::AlreadyCompleted(index + 1));
        }
        task.completed = true;
        Ok(task)
    }

    pub fn remove_task(&mut self, index: usize) -> Result<Assignment> {
        self.task_mut(index)?;
        Ok(self.tasks.remove(index))
    }

    /// Complete every pending task, returning how many changed.
    pub fn complete_all(&mut self) -> usize {
        let mut changed = 0;
        for task in self.tasks.iter_mut().filter(|t| !t.completed) {
            task.completed = true;
            changed += 1;
        }
        changed
    }

    pub fn pending_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.completed).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Completed tasks as a percentage of all tasks; 0 with no tasks.
    pub fn productivity(&self) -> f64 {
        if self.tasks.is_empty() {
            return 0.0;
        }
        self.completed_count() as f64 / self.tasks.len() as f64 * 100.0
    }

    pub fn can_perform(&self, kind: &str) -> bool {
        self.specialty == GENERAL_SPECIALTY || same_name(&self.specialty, kind)
    }

    pub fn status_line(&self) -> String {
        format!(
            "Tasks: {} pending, {} completed ({:.1}% productivity)",
            self.pending_count(),
            self.completed_count(),
            self.productivity()
        )
    }

    fn task_mut(&mut self, index: usize) -> Result<&mut Assignment> {
        let len = self.tasks.len();
        self.tasks
            .get_mut(index)
            .ok_or_else(|| PmError::invalid_input(format!("task number {} is out of range (1-{len})", index + 1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maria() -> User {
        User::collaborator("Maria Santos", "222.222.222-22", "maria@automax.com", "maria", "123")
    }

    #[test]
    fn test_equality_is_by_login() {
        let a = User::manager("Joao Silva", "111", "joao@automax.com", "joao", "123");
        let b = User::administrator("Someone Else", "999", "other@automax.com", "joao", "xyz");
        let c = User::manager("Joao Silva", "111", "joao@automax.com", "joao2", "123");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_validate_password_is_exact() {
        let user = maria();
        assert!(user.validate_password("123"));
        assert!(!user.validate_password("1234"));
        assert!(!user.validate_password(" 123"));
    }

    #[test]
    fn test_role_from_kind() {
        assert_eq!(User::new(Role::Administrator, "A", "", "a@x", "a", "p").role(), Role::Administrator);
        assert_eq!(User::new(Role::Manager, "M", "", "m@x", "m", "p").role(), Role::Manager);
        assert_eq!(maria().role(), Role::Collaborator);
        assert!(maria().collaborator_profile().is_some());
        assert!(!maria().can_manage_projects());
    }

    #[test]
    fn test_productivity() {
        let mut user = maria();
        let profile = user.collaborator_profile_mut().unwrap();
        assert_eq!(profile.productivity(), 0.0);

        profile.assign_task("Review contracts").unwrap();
        profile.assign_task("Update stock sheet").unwrap();
        profile.assign_task("Call suppliers").unwrap();
        profile.assign_task("Prepare demo").unwrap();
        profile.complete_task(0).unwrap();
        assert_eq!(profile.productivity(), 25.0);
        assert_eq!(profile.pending_count(), 3);
        assert_eq!(profile.status_line(), "Tasks: 3 pending, 1 completed (25.0% productivity)");

        assert_eq!(profile.complete_all(), 3);
        assert_eq!(profile.productivity(), 100.0);
    }

    #[test]
    fn test_task_errors() {
        let mut user = maria();
        let profile = user.collaborator_profile_mut().unwrap();
        assert!(matches!(profile.assign_task("   "), Err(PmError::InvalidArgument(_))));

        profile.assign_task("Write report").unwrap();
        assert!(matches!(profile.complete_task(3), Err(PmError::InvalidInput(_))));
        profile.complete_task(0).unwrap();
        assert_eq!(profile.complete_task(0), Err(PmError::AlreadyCompleted(1)));

        assert!(profile.remove_task(1).is_err());
        assert_eq!(profile.remove_task(0).unwrap().description, "Write report");
        assert!(profile.tasks.is_empty());
    }

    #[test]
    fn test_can_perform() {
        let mut user = maria();
        assert!(user.collaborator_profile().unwrap().can_perform("anything"));
        user.collaborator_profile_mut().unwrap().specialty = "Sales".to_string();
        assert!(user.collaborator_profile().unwrap().can_perform("sales"));
        assert!(!user.collaborator_profile().unwrap().can_perform("design"));
    }

    #[test]
    fn test_email_domain() {
        assert_eq!(maria().email_domain(), "automax.com");
        let mut user = maria();
        user.set_email("no-at-sign");
        assert_eq!(user.email_domain(), "no-at-sign");
    }

    #[test]
    fn test_password_is_not_serialized() {
        let json = serde_json::to_string(&maria()).unwrap();
        assert!(!json.contains("password"));
        assert!(json.contains("\"role\":\"collaborator\""));
    }
}
