use std::path::{Path, PathBuf};

use super::AgentId;

/// Everything the orchestrator needs to know about one task's workspace.
///
/// Derived from the run inputs alone, so it is recomputed on every invocation
/// instead of being stored anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceDescriptor {
    pub project: String,
    pub branch_prefix: String,
    pub agent: char,
    pub index: usize,
    pub task: String,
    pub branch_name: String,
    pub workspace_path: PathBuf,
    pub window_name: String,
}

impl WorkspaceDescriptor {
    pub fn derive(
        project: &str,
        branch_prefix: &str,
        worktree_root: &Path,
        agent: AgentId,
        task: &str,
    ) -> Self {
        let letter = agent.letter();
        let branch_name = branch_name(branch_prefix, letter, task);
        let workspace_path = worktree_root.join(workspace_dir_name(project, branch_prefix, letter, task));

        Self {
            project: project.to_string(),
            branch_prefix: branch_prefix.to_string(),
            agent: letter,
            index: agent.index(),
            task: task.to_string(),
            window_name: branch_name.clone(),
            branch_name,
            workspace_path,
        }
    }

    /// Email recorded as the workspace's git identity, e.g. `aiagent-a-app@local`.
    pub fn identity_email(&self, email_domain: &str) -> String {
        format!("{}@{}", self.branch_name.replace('/', "-"), email_domain)
    }
}

pub fn branch_name(branch_prefix: &str, letter: char, task: &str) -> String {
    format!("{}/{}/{}", branch_prefix, letter, task)
}

pub fn workspace_dir_name(project: &str, branch_prefix: &str, letter: char, task: &str) -> String {
    format!("{}__{}-{}-{}", project, branch_prefix, letter, task)
}
