//! Drives git and tmux to bring a set of agent workspaces up or down.
//!
//! Every run starts from the same inputs, re-derives the plan, and asks the
//! adapters what already exists before changing anything. That is what makes
//! `deploy` and `destroy` safe to repeat.

mod deploy;
mod destroy;
mod layout;
mod status;

pub use destroy::StepStatus;

use crate::config::{ConfigError, RunConfig};
use crate::plan::{build_plan, WorkspaceDescriptor};
use crate::session::{Multiplexer, TmuxManager, VersionControl, WorktreeManager};

pub struct Orchestrator<V: VersionControl = WorktreeManager, M: Multiplexer = TmuxManager> {
    config: RunConfig,
    vcs: V,
    mux: M,
}

impl Orchestrator {
    pub fn new(config: RunConfig) -> Self {
        let mux = TmuxManager::new(config.session_name.clone());
        Self {
            config,
            vcs: WorktreeManager::new(),
            mux,
        }
    }
}

impl<V: VersionControl, M: Multiplexer> Orchestrator<V, M> {
    pub fn with_adapters(config: RunConfig, vcs: V, mux: M) -> Self {
        Self { config, vcs, mux }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn plan(&self) -> Result<Vec<WorkspaceDescriptor>, ConfigError> {
        build_plan(
            &self.config.project,
            &self.config.branch_prefix,
            &self.config.worktree_root,
            &self.config.tasks,
        )
    }
}
