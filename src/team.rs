//! Teams and their member sets.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{PmError, Result};
use crate::fields::Role;
use crate::user::User;

/// A named group of users. Ids are handed out by `TeamRegistry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    id: u64,
    pub name: String,
    pub description: String,
    members: Vec<Member>,
}

/// Reference to a user in a team; membership is keyed by login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub login: String,
    pub role: Role,
}

/// Members per role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RoleCounts {
    pub administrators: usize,
    pub managers: usize,
    pub collaborators: usize,
}

impl Team {
    pub(crate) fn new(id: u64, name: &str, description: &str) -> Self {
        Team {
            id,
            name: name.trim().to_string(),
            description: description.to_string(),
            members: Vec::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn contains(&self, login: &str) -> bool {
        self.members.iter().any(|m| m.login == login)
    }

    pub fn add_member(&mut self, user: &User) -> Result<()> {
        if self.contains(user.login()) {
            return Err(PmError::duplicate("member", format!("{} in team {}", user.login(), self.name)));
        }
        self.members.push(Member {
            login: user.login().to_string(),
            role: user.role(),
        });
        debug!(team = self.id, login = user.login(), "member added");
        Ok(())
    }

    pub fn remove_member(&mut self, login: &str) -> Result<Member> {
        let idx = self
            .members
            .iter()
            .position(|m| m.login == login)
            .ok_or_else(|| PmError::not_found("member", format!("{login} in team {}", self.name)))?;
        debug!(team = self.id, login, "member removed");
        Ok(self.members.remove(idx))
    }

    pub fn size(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.members.iter().any(|m| m.role == role)
    }

    pub fn members_with_role(&self, role: Role) -> impl Iterator<Item = &Member> {
        self.members.iter().filter(move |m| m.role == role)
    }

    pub fn count_by_role(&self) -> RoleCounts {
        let mut counts = RoleCounts::default();
        for m in &self.members {
            match m.role {
                Role::Administrator => counts.administrators += 1,
                Role::Manager => counts.managers += 1,
                Role::Collaborator => counts.collaborators += 1,
            }
        }
        counts
    }
}

impl PartialEq for Team {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Team {}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Team #{}: {} ({} members)", self.id, self.name, self.size())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn joao() -> User {
        User::manager("Joao Silva", "111.111.111-11", "joao@automax.com", "joao", "123")
    }

    fn maria() -> User {
        User::collaborator("Maria Santos", "222.222.222-22", "maria@automax.com", "maria", "123")
    }

    #[test]
    fn test_add_member_twice_fails() {
        let mut team = Team::new(1, "Sales", "Showroom sales");
        assert!(team.add_member(&joao()).is_ok());
        assert!(matches!(team.add_member(&joao()), Err(PmError::Duplicate { .. })));
        assert_eq!(team.size(), 1);
    }

    #[test]
    fn test_membership_is_by_login() {
        let mut team = Team::new(1, "Sales", "");
        team.add_member(&joao()).unwrap();
        let impostor = User::administrator("Other Name", "x", "x@y", "joao", "pw");
        assert!(team.add_member(&impostor).is_err());
        assert!(team.contains("joao"));
    }

    #[test]
    fn test_remove_member() {
        let mut team = Team::new(1, "Sales", "");
        team.add_member(&maria()).unwrap();
        assert!(matches!(team.remove_member("joao"), Err(PmError::NotFound { .. })));
        assert_eq!(team.remove_member("maria").unwrap().login, "maria");
        assert!(team.is_empty());
    }

    #[test]
    fn test_roles() {
        let mut team = Team::new(1, "Sales", "");
        team.add_member(&joao()).unwrap();
        team.add_member(&maria()).unwrap();
        assert!(team.has_role(Role::Manager));
        assert!(!team.has_role(Role::Administrator));
        assert_eq!(team.members_with_role(Role::Collaborator).count(), 1);
        assert_eq!(
            team.count_by_role(),
            RoleCounts { administrators: 0, managers: 1, collaborators: 1 }
        );
    }
}
