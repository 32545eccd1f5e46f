use anyhow::Result;
use clap::Args as ClapArgs;

use super::common::{self, TargetArgs};
use crate::orchestrator::{Orchestrator, StepStatus};

#[derive(ClapArgs, Debug)]
pub struct Args {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Remove worktrees and the session but keep the branches
    #[arg(long)]
    pub keep_branches: bool,

    /// Print the plan without touching git or tmux
    #[arg(long)]
    pub dry_run: bool,
}

pub async fn execute(args: Args) -> Result<()> {
    let config = args.target.resolve(|o| {
        o.keep_branches = args.keep_branches;
    })?;

    let orchestrator = Orchestrator::new(config);

    if args.dry_run {
        let plan = orchestrator.plan()?;
        common::print_plan(orchestrator.config(), &plan);
        return Ok(());
    }

    println!(
        "Tearing down agents for {}...",
        orchestrator.config().project
    );

    let report = orchestrator.destroy().await?;

    println!(
        "\nDone: {} removed, {} already absent, {} kept, {} failed",
        report.count(&StepStatus::Removed),
        report.count(&StepStatus::Absent),
        report.count(&StepStatus::Kept),
        report.failures().count()
    );
    for step in report.failures() {
        if let StepStatus::Failed { error, remediation } = &step.status {
            eprintln!("  {} {}: {}", step.resource, step.name, error);
            eprintln!("    fix: {}", remediation);
        }
    }

    Ok(())
}
