use anyhow::Result;
use serde::Serialize;
use std::path::PathBuf;

use super::Orchestrator;
use crate::session::{read_session_info, Multiplexer, SessionInfo, VersionControl};

#[derive(Debug, Clone, Serialize)]
pub struct WorkspaceStatus {
    pub agent: char,
    pub task: String,
    pub branch: String,
    pub branch_exists: bool,
    pub workspace: PathBuf,
    pub workspace_exists: bool,
    pub window: String,
    pub window_exists: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub session: String,
    pub session_exists: bool,
    pub session_info: Option<SessionInfo>,
    pub workspaces: Vec<WorkspaceStatus>,
}

impl<V: VersionControl, M: Multiplexer> Orchestrator<V, M> {
    /// Query-only view of what each planned resource currently looks like.
    pub async fn inspect(&self) -> Result<StatusReport> {
        let plan = self.plan()?;
        let session_exists = self.mux.session_exists().await?;
        let session_info = if session_exists {
            Some(read_session_info(&self.mux).await?)
        } else {
            None
        };

        let mut workspaces = Vec::with_capacity(plan.len());
        for d in plan {
            let branch_exists = self
                .vcs
                .branch_exists(&self.config.repo_path, &d.branch_name)
                .await?;
            let window_exists = session_exists && self.mux.window_exists(&d.window_name).await?;

            workspaces.push(WorkspaceStatus {
                agent: d.agent,
                branch_exists,
                workspace_exists: self.vcs.worktree_exists(&d.workspace_path),
                window_exists,
                task: d.task,
                branch: d.branch_name,
                workspace: d.workspace_path,
                window: d.window_name,
            });
        }

        Ok(StatusReport {
            session: self.mux.session_name().to_string(),
            session_exists,
            session_info,
            workspaces,
        })
    }
}
