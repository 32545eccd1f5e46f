use std::path::{Path, PathBuf};
use std::time::Duration;

use super::Config;
use crate::utils::{absolutize, sanitize_session_name};

/// Values supplied on the command line. `None` falls back to the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub repo: String,
    pub tasks: Vec<String>,
    pub base: Option<PathBuf>,
    pub wt_root: Option<PathBuf>,
    pub branch_prefix: Option<String>,
    pub session: Option<String>,
    pub email_domain: Option<String>,
    pub review_tool: Option<String>,
    pub agent_command: Option<String>,
    pub agent_prompt: Option<String>,
    pub start_agent: bool,
    pub reattach_branches: bool,
    pub keep_branches: bool,
    pub no_attach: bool,
}

/// How the work pane is brought up when agent bootstrap is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentBootstrap {
    pub command: String,
    pub prompt: String,
    pub ready_timeout: Duration,
}

/// Settings for a single invocation, resolved once and handed to every
/// component.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub project: String,
    pub repo_path: PathBuf,
    pub worktree_root: PathBuf,
    pub branch_prefix: String,
    pub session_name: String,
    pub tasks: Vec<String>,
    pub email_domain: String,
    pub review_tool: String,
    pub agent_bootstrap: Option<AgentBootstrap>,
    pub reattach_branches: bool,
    pub keep_branches: bool,
    pub attach: bool,
}

impl RunConfig {
    pub fn resolve(file: &Config, overrides: RunOverrides, cwd: &Path) -> Self {
        let base = absolutize(cwd, overrides.base.as_deref().unwrap_or(&file.base));
        let worktree_root = absolutize(cwd, overrides.wt_root.as_deref().unwrap_or(&file.wt_root));
        let session = overrides
            .session
            .unwrap_or_else(|| overrides.repo.clone());

        let agent_bootstrap = overrides.start_agent.then(|| AgentBootstrap {
            command: overrides
                .agent_command
                .unwrap_or_else(|| file.agent_command.clone()),
            prompt: overrides
                .agent_prompt
                .unwrap_or_else(|| file.agent_prompt.clone()),
            ready_timeout: Duration::from_secs(file.timeouts.agent_ready),
        });

        Self {
            repo_path: base.join(&overrides.repo),
            project: overrides.repo,
            worktree_root,
            branch_prefix: overrides
                .branch_prefix
                .unwrap_or_else(|| file.branch_prefix.clone()),
            session_name: sanitize_session_name(&session),
            tasks: overrides.tasks,
            email_domain: overrides
                .email_domain
                .unwrap_or_else(|| file.email_domain.clone()),
            review_tool: overrides
                .review_tool
                .unwrap_or_else(|| file.review_tool.clone()),
            agent_bootstrap,
            reattach_branches: overrides.reattach_branches,
            keep_branches: overrides.keep_branches,
            attach: !overrides.no_attach,
        }
    }
}
