use anyhow::Result;
use clap::Args as ClapArgs;

use super::common::TargetArgs;
use crate::orchestrator::Orchestrator;

#[derive(ClapArgs, Debug)]
pub struct Args {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

fn mark(present: bool) -> &'static str {
    if present {
        "✓"
    } else {
        "·"
    }
}

pub async fn execute(args: Args) -> Result<()> {
    let config = args.target.resolve(|_| {})?;
    let report = Orchestrator::new(config).inspect().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    match &report.session_info {
        Some(info) => {
            println!("Session: {} (running)", report.session);
            if let Some(created) = info.created_at {
                println!("Created: {}", created.to_rfc3339());
            }
        }
        None => println!("Session: {} (not running)", report.session),
    }

    println!("\n     branch workspace window");
    for w in &report.workspaces {
        println!(
            "  [{}]  {}      {}        {}    {}",
            w.agent,
            mark(w.branch_exists),
            mark(w.workspace_exists),
            mark(w.window_exists),
            w.branch
        );
    }

    Ok(())
}
