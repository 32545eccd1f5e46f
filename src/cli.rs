use clap::{Parser, Subcommand};

use crate::commands::{deploy, destroy, status};

#[derive(Parser)]
#[command(name = "agentwt")]
#[command(about = "Provision parallel git worktrees and a tmux layout for coding agents")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create worktrees, branches and the tmux session for each task
    Deploy(deploy::Args),

    /// Kill the session and remove the worktrees (and branches) of each task
    Destroy(destroy::Args),

    /// Show which branches, worktrees and windows currently exist
    Status(status::Args),
}
