use anyhow::{Context, Result};
use std::fmt;
use tracing::{info, warn};

use super::layout::LayoutReport;
use super::Orchestrator;
use crate::plan::WorkspaceDescriptor;
use crate::session::{BranchMode, Multiplexer, VersionControl};

/// What the creation path did with one task's branch and workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Created,
    Reattached,
    SkippedBranchExists,
    SkippedWorkspaceExists,
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TaskOutcome::Created => "created",
            TaskOutcome::Reattached => "reattached to existing branch",
            TaskOutcome::SkippedBranchExists => "skipped (branch exists)",
            TaskOutcome::SkippedWorkspaceExists => "skipped (workspace exists)",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone)]
pub struct DeployReport {
    pub tasks: Vec<(WorkspaceDescriptor, TaskOutcome)>,
    pub layout: LayoutReport,
}

impl<V: VersionControl, M: Multiplexer> Orchestrator<V, M> {
    /// Creation path: workspaces for every task, then the session layout,
    /// then (unless disabled) attach.
    ///
    /// The first failing external command aborts the run. Nothing is rolled
    /// back; re-running picks up where this run stopped.
    pub async fn deploy(&self) -> Result<DeployReport> {
        let plan = self.plan()?;

        tokio::fs::create_dir_all(&self.config.worktree_root)
            .await
            .with_context(|| {
                format!(
                    "Failed to create worktree root {:?}",
                    self.config.worktree_root
                )
            })?;

        let mut tasks = Vec::with_capacity(plan.len());
        for descriptor in &plan {
            let outcome = self.provision_workspace(descriptor).await?;
            info!(branch = %descriptor.branch_name, %outcome, "workspace step finished");
            tasks.push((descriptor.clone(), outcome));
        }

        let layout = self.build_layout(&plan).await?;

        if self.config.attach {
            println!("Attaching to session {}...", self.mux.session_name());
            self.mux.attach().await?;
        }

        Ok(DeployReport { tasks, layout })
    }

    async fn provision_workspace(&self, d: &WorkspaceDescriptor) -> Result<TaskOutcome> {
        let repo = &self.config.repo_path;

        let mode = if self.vcs.branch_exists(repo, &d.branch_name).await? {
            if !self.config.reattach_branches || self.vcs.worktree_exists(&d.workspace_path) {
                println!("Branch {} already exists, skipping...", d.branch_name);
                return Ok(TaskOutcome::SkippedBranchExists);
            }
            BranchMode::AttachExisting
        } else if self.vcs.worktree_exists(&d.workspace_path) {
            warn!(
                path = %d.workspace_path.display(),
                branch = %d.branch_name,
                "workspace directory exists without its branch"
            );
            println!(
                "Worktree {} already exists, skipping...",
                d.workspace_path.display()
            );
            return Ok(TaskOutcome::SkippedWorkspaceExists);
        } else {
            BranchMode::CreateNew
        };

        println!(
            "[{}] {} -> {}",
            d.agent,
            d.branch_name,
            d.workspace_path.display()
        );
        self.vcs
            .worktree_add(repo, &d.branch_name, &d.workspace_path, mode)
            .await?;
        self.vcs.submodules_init(&d.workspace_path).await?;
        self.vcs
            .set_local_identity(
                repo,
                &d.workspace_path,
                &d.branch_name,
                &d.identity_email(&self.config.email_domain),
            )
            .await?;

        Ok(match mode {
            BranchMode::CreateNew => TaskOutcome::Created,
            BranchMode::AttachExisting => TaskOutcome::Reattached,
        })
    }
}
