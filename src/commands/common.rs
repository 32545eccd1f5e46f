use anyhow::{Context, Result};
use clap::Args as ClapArgs;
use std::path::PathBuf;

use crate::config::{Config, RunConfig, RunOverrides};
use crate::plan::{parse_tasks, WorkspaceDescriptor};

/// Flags shared by every command that works on a task list.
#[derive(ClapArgs, Debug)]
pub struct TargetArgs {
    /// Repo name, used for worktree folder naming
    #[arg(long)]
    pub repo: String,

    /// Comma-separated task list, e.g. "seo,app,landingpages,server"
    #[arg(long)]
    pub tasks: String,

    /// Directory where the main repo lives [default: ..]
    #[arg(long)]
    pub base: Option<PathBuf>,

    /// Worktrees root directory [default: ../_wt]
    #[arg(long)]
    pub wt_root: Option<PathBuf>,

    /// Branch prefix [default: aiagent]
    #[arg(long)]
    pub branch_prefix: Option<String>,

    /// tmux session name [default: repo name]
    #[arg(long)]
    pub session: Option<String>,

    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl TargetArgs {
    /// Load the config file and resolve the run configuration once.
    ///
    /// `customize` fills in the command-specific overrides.
    pub fn resolve(self, customize: impl FnOnce(&mut RunOverrides)) -> Result<RunConfig> {
        let file = Config::load(self.config)?;
        let cwd = std::env::current_dir().context("Failed to read current directory")?;

        let mut overrides = RunOverrides {
            repo: self.repo,
            tasks: parse_tasks(&self.tasks),
            base: self.base,
            wt_root: self.wt_root,
            branch_prefix: self.branch_prefix,
            session: self.session,
            ..Default::default()
        };
        customize(&mut overrides);

        Ok(RunConfig::resolve(&file, overrides, &cwd))
    }
}

pub fn print_plan(config: &RunConfig, plan: &[WorkspaceDescriptor]) {
    println!("Repository:    {}", config.repo_path.display());
    println!("Worktree root: {}", config.worktree_root.display());
    println!("Session:       {}", config.session_name);
    println!();
    for d in plan {
        println!("  [{}] {}", d.agent, d.branch_name);
        println!("      workspace: {}", d.workspace_path.display());
        println!("      window:    {}", d.window_name);
    }
}
