use anyhow::Result;
use clap::Args as ClapArgs;

use super::common::{self, TargetArgs};
use crate::orchestrator::Orchestrator;
use crate::session::WorktreeManager;

#[derive(ClapArgs, Debug)]
pub struct Args {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Auto-run the agent command in the right pane
    #[arg(long)]
    pub start_codex: bool,

    /// Initial prompt sent to the agent (only with --start-codex)
    #[arg(long)]
    pub codex_read_prompt: Option<String>,

    /// Agent command started in the right pane [default: codex]
    #[arg(long)]
    pub agent_cmd: Option<String>,

    /// Review tool started in the left pane [default: lazygit]
    #[arg(long)]
    pub review_tool: Option<String>,

    /// Domain of the per-agent email, e.g. aiagent-a-app@local [default: local]
    #[arg(long)]
    pub email_domain: Option<String>,

    /// Re-create missing worktrees for branches that already exist
    #[arg(long)]
    pub reattach_branches: bool,

    /// Build the session but do not attach to it
    #[arg(long)]
    pub no_attach: bool,

    /// Print the plan without touching git or tmux
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn execute(args: Args) -> Result<()> {
    let config = args.target.resolve(|o| {
        o.start_agent = args.start_codex;
        o.agent_prompt = args.codex_read_prompt;
        o.agent_command = args.agent_cmd;
        o.review_tool = args.review_tool;
        o.email_domain = args.email_domain;
        o.reattach_branches = args.reattach_branches;
        o.no_attach = args.no_attach;
    })?;

    let orchestrator = Orchestrator::new(config);
    let plan = orchestrator.plan()?;

    if args.dry_run {
        common::print_plan(orchestrator.config(), &plan);
        return Ok(());
    }

    let config = orchestrator.config();
    WorktreeManager::new().verify_repo(&config.repo_path).await?;

    println!(
        "Deploying {} agents for {} into {}",
        plan.len(),
        config.project,
        config.worktree_root.display()
    );

    let report = orchestrator.deploy().await?;

    println!("\nWorkspaces:");
    for (d, outcome) in &report.tasks {
        println!("  [{}] {:<32} {}", d.agent, d.branch_name, outcome);
    }
    println!(
        "Session {}: {} windows created, {} kept",
        config.session_name, report.layout.windows_created, report.layout.windows_kept
    );
    if !config.attach {
        println!("Run 'tmux attach -t {}' to view agents", config.session_name);
    }

    Ok(())
}
