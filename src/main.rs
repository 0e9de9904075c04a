//! # PM - Console Project Management
//!
//! An in-memory project management tool driven by a numbered text menu.
//!
//! ## Key Features
//!
//! - **Three kinds of users**: administrators, managers and collaborators, each
//!   with their own permissions and profile
//! - **Guarded project lifecycle**: Planned → InProgress ⇄ Paused → Completed,
//!   with cancellation from any unfinished state
//! - **Teams**: named groups of users with composition and size reports
//! - **Collaborator tasks**: assign, complete and track productivity
//! - **Reports**: per-registry text reports, quick stats and a JSON snapshot
//!
//! ## Quick Start
//!
//! ```bash
//! # Interactive menu (default login: admin / 123456)
//! pm
//!
//! # Walk a project through its lifecycle
//! pm demo
//!
//! # Reports over the seeded data
//! pm report --json
//! ```
//!
//! Nothing is persisted: every run starts from the seeded users. Pass
//! `--no-seed` to start with only the administrator, and `--log-level debug`
//! (or `RUST_LOG`) to see what the registries do on stderr.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod cli;
pub mod cmd;
pub mod db;
pub mod error;
pub mod fields;
pub mod project;
pub mod report;
pub mod team;
pub mod user;
pub mod registry {
    pub mod projects;
    pub mod teams;
    pub mod users;
}
pub mod console {
    pub mod colors;
    pub mod input;
    pub mod menu;
}

use cli::Cli;
use cmd::*;

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());
    let with_examples = !cli.no_seed;

    let result = match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => cmd_menu(with_examples),
        Commands::Demo => cmd_demo(&mut std::io::stdout().lock()),
        Commands::Report { json } => cmd_report(with_examples, json, &mut std::io::stdout().lock()),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "pm failed");
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
