//! In-memory user directory keyed by login.

use tracing::{debug, warn};

use crate::error::{PmError, Result};
use crate::fields::Role;
use crate::user::User;

#[derive(Debug, Default)]
pub struct UserDirectory {
    users: Vec<User>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new user; logins are unique.
    pub fn register(&mut self, user: User) -> Result<&User> {
        if self.find_by_login(user.login()).is_some() {
            warn!(login = user.login(), "login already registered");
            return Err(PmError::duplicate("user", user.login()));
        }
        debug!(login = user.login(), role = %user.role(), "user registered");
        self.users.push(user);
        Ok(&self.users[self.users.len() - 1])
    }

    /// The user with exactly this login and password, if any.
    pub fn authenticate(&self, login: &str, password: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|u| u.login() == login && u.validate_password(password))
    }

    pub fn find_by_login(&self, login: &str) -> Option<&User> {
        self.users.iter().find(|u| u.login() == login)
    }

    pub fn get_mut(&mut self, login: &str) -> Option<&mut User> {
        self.users.iter_mut().find(|u| u.login() == login)
    }

    pub fn find_by_tax_id(&self, tax_id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.tax_id() == tax_id)
    }

    /// Case-insensitive substring match over names.
    pub fn find_by_name(&self, needle: &str) -> Vec<&User> {
        let needle = needle.trim().to_lowercase();
        self.users
            .iter()
            .filter(|u| u.name().to_lowercase().contains(&needle))
            .collect()
    }

    pub fn remove(&mut self, login: &str) -> Result<User> {
        let idx = self
            .users
            .iter()
            .position(|u| u.login() == login)
            .ok_or_else(|| PmError::not_found("user", login))?;
        debug!(login, "user removed");
        Ok(self.users.remove(idx))
    }

    /// Apply the non-blank fields among `email` and `password`.
    pub fn update(&mut self, login: &str, email: Option<&str>, password: Option<&str>) -> Result<&User> {
        let user = self
            .get_mut(login)
            .ok_or_else(|| PmError::not_found("user", login))?;
        if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
            user.set_email(email.trim());
        }
        if let Some(password) = password.filter(|p| !p.is_empty()) {
            user.set_password(password);
        }
        debug!(login, "user updated");
        Ok(&*user)
    }

    pub fn rename(&mut self, login: &str, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(PmError::invalid_argument("name cannot be empty"));
        }
        let user = self
            .get_mut(login)
            .ok_or_else(|| PmError::not_found("user", login))?;
        user.set_name(name.trim());
        Ok(())
    }

    pub fn list(&self) -> &[User] {
        &self.users
    }

    pub fn list_by_role(&self, role: Role) -> Vec<&User> {
        self.users.iter().filter(|u| u.role() == role).collect()
    }

    pub fn has_administrator(&self) -> bool {
        self.users.iter().any(User::is_administrator)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Users per email domain, in first-seen order.
    pub fn count_by_email_domain(&self) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = Vec::new();
        for user in &self.users {
            let domain = user.email_domain();
            match counts.iter_mut().find(|(d, _)| d == domain) {
                Some((_, n)) => *n += 1,
                None => counts.push((domain.to_string(), 1)),
            }
        }
        counts
    }
}
