//! Command implementations for the CLI interface.
//!
//! Each subcommand gets a `cmd_*` handler that builds its own seeded database
//! and writes to the given output.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::info;

use crate::console::colors::Palette;
use crate::console::menu::Session;
use crate::db::{project_table, Database};
use crate::error;
use crate::fields::Status;
use crate::project::{NewProject, Project};
use crate::report::{self, Snapshot};

#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive numbered menu (default).
    Menu,

    /// Walk one project through its lifecycle and print each step.
    Demo,

    /// Print every report over the seeded data.
    Report {
        /// Emit a JSON snapshot instead of text.
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Launch the interactive menu over stdin and stdout.
pub fn cmd_menu(with_examples: bool) -> Result<()> {
    let db = Database::seeded(with_examples)?;
    let stdin = io::stdin();
    run_menu(db, stdin.lock(), io::stdout().lock(), Palette::detect())
}

pub fn run_menu<R: BufRead, W: Write>(db: Database, reader: R, writer: W, palette: Palette) -> Result<()> {
    let mut session = Session::new(db, reader, writer, palette);
    session.run()
}

/// Register a project for the example manager and drive it through
/// start, pause, finish and a refused cancel.
pub fn cmd_demo(out: &mut impl Write) -> Result<()> {
    let mut db = Database::seeded(true)?;
    let id = db.register_project(
        NewProject::new("Website", "Dealer website")
            .dates("01/01/2025", "30/06/2025")
            .managed_by("joao"),
    )?;
    let managed = db.projects.list_by_manager("joao").len();
    writeln!(out, "Registered project #{id} for joao ({managed} managed)")?;

    let steps: [(&str, fn(&mut Project) -> error::Result<Status>); 4] = [
        ("start", Project::start),
        ("pause", Project::pause),
        ("finish", Project::finish),
        ("cancel", Project::cancel),
    ];
    for (name, op) in steps {
        let outcome = db.projects.apply(id, op);
        let project = db
            .projects
            .find_by_id(id)
            .context("demo project disappeared")?;
        match outcome {
            Ok(previous) => writeln!(out, "{name}: {previous} -> {}", project.summary())?,
            Err(e) => writeln!(out, "{name}: refused ({e}); still {}", project.summary())?,
        }
    }

    let projects: Vec<&Project> = db.projects.list().iter().collect();
    for row in project_table(&projects) {
        writeln!(out, "{row}")?;
    }
    info!("demo finished");
    Ok(())
}

/// Print the reports, or the JSON snapshot with `json`.
pub fn cmd_report(with_examples: bool, json: bool, out: &mut impl Write) -> Result<()> {
    let db = Database::seeded(with_examples)?;
    if json {
        let snapshot = Snapshot::capture(&db, Local::now());
        writeln!(out, "{}", snapshot.to_json().context("serializing snapshot")?)?;
    } else {
        write!(out, "{}", report::full_report(&db))?;
        writeln!(out)?;
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;
    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_output() {
        let mut out = Vec::new();
        cmd_demo(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Registered project #1 for joao (1 managed)"));
        assert!(out.contains("start: Planned -> Project #1: Website [InProgress] - 50% complete"));
        assert!(out.contains("pause: InProgress -> Project #1: Website [Paused] - 25% complete"));
        assert!(out.contains("finish: Paused -> Project #1: Website [Completed] - 100% complete"));
        assert!(out.contains("cancel: refused (cannot move from Completed to Cancelled)"));
    }

    #[test]
    fn test_report_text() {
        let mut out = Vec::new();
        cmd_report(true, false, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("USERS REPORT"));
        assert!(out.contains("No projects registered."));
        assert!(out.contains("Teams: 0 | Members: 0"));
    }

    #[test]
    fn test_report_json() {
        let mut out = Vec::new();
        cmd_report(false, true, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["users"].as_array().unwrap().len(), 1);
        assert!(value["projects"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_run_menu_quits() {
        let mut out = Vec::new();
        run_menu(Database::seeded(false).unwrap(), "2\n".as_bytes(), &mut out, Palette::plain()).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("Goodbye!"));
    }
}
