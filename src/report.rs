//! Plain-text reports and the JSON snapshot.
//!
//! Every report is built as a `String` so callers decide where it goes.

use chrono::{DateTime, Local};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::db::Database;
use crate::fields::{Role, Status};
use crate::project::Project;
use crate::registry::projects::ProjectRegistry;
use crate::registry::teams::TeamRegistry;
use crate::registry::users::UserDirectory;
use crate::team::{RoleCounts, Team};
use crate::user::User;

const RULE_WIDTH: usize = 60;
/// Completed projects highlighted in the projects report.
const COMPLETED_SHOWN: usize = 3;
/// Teams listed in the teams report ranking.
const TOP_TEAMS: usize = 5;

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

fn push_line(out: &mut String, line: impl AsRef<str>) {
    out.push_str(line.as_ref());
    out.push('\n');
}

fn header(out: &mut String, title: &str) {
    push_line(out, title);
    push_line(out, "=".repeat(RULE_WIDTH));
}

fn count_row(out: &mut String, label: &str, count: usize, total: usize) {
    push_line(out, format!("  {:<16} {:>5} {:>7.1}%", label, count, percent(count, total)));
}

pub fn users_report(users: &UserDirectory) -> String {
    let mut out = String::new();
    header(&mut out, "USERS REPORT");
    let total = users.len();
    push_line(&mut out, format!("Total users: {total}"));
    for role in Role::iter() {
        count_row(&mut out, &role.to_string(), users.list_by_role(role).len(), total);
    }

    push_line(&mut out, "\nUsers by email domain:");
    for (domain, count) in users.count_by_email_domain() {
        push_line(&mut out, format!("  {domain}: {count}"));
    }
    out
}

pub fn projects_report(projects: &ProjectRegistry) -> String {
    let mut out = String::new();
    header(&mut out, "PROJECTS REPORT");
    let total = projects.len();
    if total == 0 {
        push_line(&mut out, "No projects registered.");
        return out;
    }

    push_line(&mut out, format!("Total projects: {total}"));
    push_line(&mut out, format!("  {:<16} {:>5} {:>8}", "Status", "Count", "Share"));
    for status in Status::iter() {
        count_row(&mut out, &status.to_string(), projects.list_by_status(status).len(), total);
    }

    push_line(&mut out, "\nProjects per manager:");
    let per_manager = projects.count_by_manager();
    if per_manager.is_empty() {
        push_line(&mut out, "  (no project has a manager)");
    }
    for (login, count) in per_manager {
        push_line(&mut out, format!("  {login}: {count}"));
    }

    let active = projects.list_by_status(Status::InProgress);
    if !active.is_empty() {
        push_line(&mut out, "\nActive projects:");
        for p in active {
            push_line(&mut out, format!("  - {} ({}%)", p.name, p.progress()));
        }
    }
    let completed = projects.list_by_status(Status::Completed);
    if !completed.is_empty() {
        push_line(&mut out, "\nRecently completed:");
        for p in completed.iter().take(COMPLETED_SHOWN) {
            push_line(&mut out, format!("  - {}", p.name));
        }
    }
    out
}

/// Team counts by size bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SizeDistribution {
    pub small: usize,
    pub medium: usize,
    pub large: usize,
    pub empty: usize,
}

impl SizeDistribution {
    pub fn of(teams: &[Team]) -> Self {
        let mut dist = SizeDistribution::default();
        for t in teams {
            match t.size() {
                0 => dist.empty += 1,
                1..=3 => dist.small += 1,
                4..=7 => dist.medium += 1,
                _ => dist.large += 1,
            }
        }
        dist
    }
}

pub fn teams_report(teams: &TeamRegistry) -> String {
    let mut out = String::new();
    header(&mut out, "TEAMS REPORT");
    let total = teams.len();
    if total == 0 {
        push_line(&mut out, "No teams registered.");
        return out;
    }

    let members = teams.total_members();
    let empty = teams.list().iter().filter(|t| t.is_empty()).count();
    push_line(&mut out, format!("Total teams: {total}"));
    push_line(&mut out, format!("Total members: {members}"));
    push_line(&mut out, format!("Average members per team: {:.1}", members as f64 / total as f64));
    push_line(&mut out, format!("Empty teams: {empty}"));
    // Ties go to the earliest team.
    if let Some(largest) = teams.list().iter().reduce(|best, t| if t.size() > best.size() { t } else { best }) {
        push_line(&mut out, format!("Largest team: {} ({} members)", largest.name, largest.size()));
    }

    let dist = SizeDistribution::of(teams.list());
    push_line(&mut out, "\nSize distribution:");
    count_row(&mut out, "Small (1-3)", dist.small, total);
    count_row(&mut out, "Medium (4-7)", dist.medium, total);
    count_row(&mut out, "Large (8+)", dist.large, total);
    count_row(&mut out, "Empty", dist.empty, total);

    let mut ranked: Vec<&Team> = teams.list().iter().collect();
    ranked.sort_by(|a, b| b.size().cmp(&a.size()));
    push_line(&mut out, format!("\nTop {TOP_TEAMS} teams by size:"));
    for (i, t) in ranked.iter().take(TOP_TEAMS).enumerate() {
        push_line(&mut out, format!("  {}. {} - {} members", i + 1, t.name, t.size()));
    }

    let with_manager = teams.list_containing_role(Role::Manager).len();
    let with_admin = teams.list_containing_role(Role::Administrator).len();
    let balanced = teams
        .list()
        .iter()
        .filter(|t| t.has_role(Role::Manager) && t.has_role(Role::Collaborator))
        .count();
    push_line(&mut out, "\nComposition:");
    count_row(&mut out, "With manager", with_manager, total);
    count_row(&mut out, "With admin", with_admin, total);
    count_row(&mut out, "Balanced", balanced, total);
    out
}

pub fn users_quick_stats(users: &UserDirectory) -> String {
    format!(
        "Users: {} | Admins: {} | Managers: {} | Collaborators: {}",
        users.len(),
        users.list_by_role(Role::Administrator).len(),
        users.list_by_role(Role::Manager).len(),
        users.list_by_role(Role::Collaborator).len(),
    )
}

pub fn projects_quick_stats(projects: &ProjectRegistry) -> String {
    format!(
        "Projects: {} | Active: {} | Completed: {} | Average progress: {:.1}%",
        projects.len(),
        projects.list_by_status(Status::InProgress).len(),
        projects.list_by_status(Status::Completed).len(),
        projects.average_progress(),
    )
}

pub fn teams_quick_stats(teams: &TeamRegistry) -> String {
    let average = if teams.is_empty() {
        0.0
    } else {
        teams.total_members() as f64 / teams.len() as f64
    };
    format!(
        "Teams: {} | Members: {} | Average: {:.1} | Efficiency: {:.1}%",
        teams.len(),
        teams.total_members(),
        average,
        teams.average_efficiency(),
    )
}

/// One quick-stats line per registry.
pub fn quick_stats(db: &Database) -> Vec<String> {
    vec![
        users_quick_stats(&db.users),
        projects_quick_stats(&db.projects),
        teams_quick_stats(&db.teams),
    ]
}

/// Every report, separated by blank lines.
pub fn full_report(db: &Database) -> String {
    [
        users_report(&db.users),
        projects_report(&db.projects),
        teams_report(&db.teams),
        quick_stats(db).join("\n"),
    ]
    .join("\n")
}

/// Serializable summary of the whole database.
#[derive(Debug, Serialize)]
pub struct Snapshot<'a> {
    pub generated_at: DateTime<Local>,
    pub users: &'a [User],
    pub projects: Vec<ProjectSummary<'a>>,
    pub teams: Vec<TeamSummary<'a>>,
    pub average_progress: f64,
    pub average_team_efficiency: f64,
}

#[derive(Debug, Serialize)]
pub struct ProjectSummary<'a> {
    #[serde(flatten)]
    pub project: &'a Project,
    pub progress: u8,
    pub overdue: bool,
}

#[derive(Debug, Serialize)]
pub struct TeamSummary<'a> {
    #[serde(flatten)]
    pub team: &'a Team,
    pub roles: RoleCounts,
}

impl<'a> Snapshot<'a> {
    pub fn capture(db: &'a Database, generated_at: DateTime<Local>) -> Self {
        let today = generated_at.date_naive();
        Snapshot {
            generated_at,
            users: db.users.list(),
            projects: db
                .projects
                .list()
                .iter()
                .map(|p| ProjectSummary { project: p, progress: p.progress(), overdue: p.is_overdue(today) })
                .collect(),
            teams: db
                .teams
                .list()
                .iter()
                .map(|t| TeamSummary { team: t, roles: t.count_by_role() })
                .collect(),
            average_progress: db.projects.average_progress(),
            average_team_efficiency: db.teams.average_efficiency(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
