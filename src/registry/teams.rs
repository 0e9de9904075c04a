//! In-memory team registry.

use tracing::{debug, warn};

use crate::error::{PmError, Result};
use crate::fields::{same_name, Role};
use crate::team::{Member, Team};
use crate::user::User;

/// Team size counted as fully staffed when computing efficiency.
pub const IDEAL_TEAM_SIZE: usize = 5;

#[derive(Debug, Default)]
pub struct TeamRegistry {
    teams: Vec<Team>,
    last_id: u64,
}

impl TeamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty team and return its id. A blank description becomes
    /// "Team <name>".
    pub fn create_team(&mut self, name: &str, description: &str) -> Result<u64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PmError::invalid_argument("team name cannot be empty"));
        }
        if self.find_by_name(name).is_some() {
            warn!(name, "team name already registered");
            return Err(PmError::duplicate("team", name));
        }
        let description = match description.trim() {
            "" => format!("Team {name}"),
            d => d.to_string(),
        };
        self.last_id += 1;
        self.teams.push(Team::new(self.last_id, name, &description));
        debug!(id = self.last_id, name, "team created");
        Ok(self.last_id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Team> {
        self.teams.iter().find(|t| same_name(&t.name, name))
    }

    pub fn find_by_id(&self, id: u64) -> Option<&Team> {
        self.teams.iter().find(|t| t.id() == id)
    }

    fn require_by_name(&mut self, name: &str) -> Result<&mut Team> {
        let name = name.trim();
        self.teams
            .iter_mut()
            .find(|t| same_name(&t.name, name))
            .ok_or_else(|| PmError::not_found("team", name))
    }

    pub fn add_member(&mut self, team_name: &str, user: &User) -> Result<()> {
        self.require_by_name(team_name)?
            .add_member(user)
            .inspect_err(|e| warn!(team = team_name, error = %e, "member not added"))
    }

    pub fn remove_member(&mut self, team_name: &str, login: &str) -> Result<Member> {
        self.require_by_name(team_name)?
            .remove_member(login)
            .inspect_err(|e| warn!(team = team_name, error = %e, "member not removed"))
    }

    /// Drop `login` from every team, returning how many teams it left.
    pub fn remove_user_everywhere(&mut self, login: &str) -> usize {
        self.teams
            .iter_mut()
            .filter_map(|t| t.remove_member(login).ok())
            .count()
    }

    pub fn list(&self) -> &[Team] {
        &self.teams
    }

    pub fn list_by_minimum_size(&self, min: usize) -> Vec<&Team> {
        self.teams.iter().filter(|t| t.size() >= min).collect()
    }

    pub fn list_containing_role(&self, role: Role) -> Vec<&Team> {
        self.teams.iter().filter(|t| t.has_role(role)).collect()
    }

    pub fn teams_of(&self, login: &str) -> Vec<&Team> {
        self.teams.iter().filter(|t| t.contains(login)).collect()
    }

    /// Apply the non-blank fields. A new name must not clash with another team.
    pub fn update(&mut self, id: u64, name: Option<&str>, description: Option<&str>) -> Result<()> {
        let name = name.map(str::trim).filter(|n| !n.is_empty());
        if let Some(name) = name {
            if self.find_by_name(name).is_some_and(|t| t.id() != id) {
                return Err(PmError::duplicate("team", name));
            }
        }
        let team = self
            .teams
            .iter_mut()
            .find(|t| t.id() == id)
            .ok_or_else(|| PmError::not_found("team", id))?;
        if let Some(name) = name {
            team.name = name.to_string();
        }
        if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
            team.description = description.trim().to_string();
        }
        debug!(id, "team updated");
        Ok(())
    }

    pub fn remove(&mut self, id: u64) -> Result<Team> {
        let idx = self
            .teams
            .iter()
            .position(|t| t.id() == id)
            .ok_or_else(|| PmError::not_found("team", id))?;
        debug!(id, "team removed");
        Ok(self.teams.remove(idx))
    }

    /// Case-insensitive match in name or description.
    pub fn search(&self, keyword: &str) -> Vec<&Team> {
        let keyword = keyword.trim().to_lowercase();
        self.teams
            .iter()
            .filter(|t| {
                t.name.to_lowercase().contains(&keyword)
                    || t.description.to_lowercase().contains(&keyword)
            })
            .collect()
    }

    pub fn total_members(&self) -> usize {
        self.teams.iter().map(Team::size).sum()
    }

    /// Mean staffing against `IDEAL_TEAM_SIZE`, each team capped at 100%.
    pub fn average_efficiency(&self) -> f64 {
        if self.teams.is_empty() {
            return 0.0;
        }
        let sum: f64 = self
            .teams
            .iter()
            .map(|t| (t.size() as f64 * 100.0 / IDEAL_TEAM_SIZE as f64).min(100.0))
            .sum();
        sum / self.teams.len() as f64
    }

    pub fn len(&self) -> usize {
        self.teams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teams.is_empty()
    }
}
