use clap::Parser;

use crate::cmd::Commands;

/// In-memory project management console.
/// Every run starts from the seeded users; nothing is saved on exit.
#[derive(Parser)]
#[command(name = "pm", version, about = "Console project management: users, projects and teams")]
pub struct Cli {
    /// Start with only the default administrator.
    #[arg(long, global = true)]
    pub no_seed: bool,

    /// Log filter such as `debug` or `pm_console=trace`. Overrides RUST_LOG.
    #[arg(long, global = true, value_name = "FILTER")]
    pub log_level: Option<String>,

    /// Defaults to the interactive menu.
    #[command(subcommand)]
    pub command: Option<Commands>,
}
