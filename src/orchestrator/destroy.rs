use serde::Serialize;
use std::fmt;
use tracing::warn;

use super::Orchestrator;
use crate::config::ConfigError;
use crate::plan::WorkspaceDescriptor;
use crate::session::{Multiplexer, VersionControl};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Session,
    Workspace,
    Branch,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Session => f.write_str("session"),
            Resource::Workspace => f.write_str("workspace"),
            Resource::Branch => f.write_str("branch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StepStatus {
    Removed,
    Absent,
    Kept,
    Failed { error: String, remediation: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownStep {
    pub resource: Resource,
    pub name: String,
    #[serde(flatten)]
    pub status: StepStatus,
}

impl TeardownStep {
    fn new(resource: Resource, name: impl Into<String>, status: StepStatus) -> Self {
        Self {
            resource,
            name: name.into(),
            status,
        }
    }

    fn print(&self) {
        match &self.status {
            StepStatus::Removed => println!("Removed {} {}", self.resource, self.name),
            StepStatus::Absent => println!("No {} {}, skipping...", self.resource, self.name),
            StepStatus::Kept => println!("Keeping {} {}", self.resource, self.name),
            StepStatus::Failed { error, .. } => {
                eprintln!("Failed to remove {} {}: {}", self.resource, self.name, error)
            }
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DestroyReport {
    pub steps: Vec<TeardownStep>,
}

impl DestroyReport {
    fn push(&mut self, step: TeardownStep) {
        step.print();
        self.steps.push(step);
    }

    pub fn failures(&self) -> impl Iterator<Item = &TeardownStep> {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed { .. }))
    }

    pub fn count(&self, status: &StepStatus) -> usize {
        self.steps.iter().filter(|s| &s.status == status).count()
    }
}

impl<V: VersionControl, M: Multiplexer> Orchestrator<V, M> {
    /// Destruction path. Only plan validation can fail; every teardown step
    /// after that is attempted regardless of earlier failures, which are
    /// collected in the report.
    pub async fn destroy(&self) -> Result<DestroyReport, ConfigError> {
        let plan = self.plan()?;
        let mut report = DestroyReport::default();

        report.push(self.teardown_session().await);

        for d in &plan {
            report.push(self.teardown_workspace(d).await);

            if self.config.keep_branches {
                report.push(TeardownStep::new(
                    Resource::Branch,
                    &d.branch_name,
                    StepStatus::Kept,
                ));
            } else {
                report.push(self.teardown_branch(d).await);
            }
        }

        Ok(report)
    }

    async fn teardown_session(&self) -> TeardownStep {
        let name = self.mux.session_name().to_string();
        let result = match self.mux.session_exists().await {
            Ok(false) => return TeardownStep::new(Resource::Session, name, StepStatus::Absent),
            Ok(true) => self.mux.kill_session().await,
            Err(e) => Err(e),
        };

        let status = match result {
            Ok(()) => StepStatus::Removed,
            Err(e) => {
                warn!(session = %name, "session teardown failed: {:#}", e);
                StepStatus::Failed {
                    error: format!("{:#}", e),
                    remediation: format!("tmux kill-session -t '={}'", name),
                }
            }
        };
        TeardownStep::new(Resource::Session, name, status)
    }

    async fn teardown_workspace(&self, d: &WorkspaceDescriptor) -> TeardownStep {
        let name = d.workspace_path.display().to_string();
        if !self.vcs.worktree_exists(&d.workspace_path) {
            return TeardownStep::new(Resource::Workspace, name, StepStatus::Absent);
        }

        let status = match self
            .vcs
            .worktree_remove(&self.config.repo_path, &d.workspace_path)
            .await
        {
            Ok(()) => StepStatus::Removed,
            Err(e) => {
                warn!(path = %name, "worktree removal failed: {:#}", e);
                StepStatus::Failed {
                    error: format!("{:#}", e),
                    remediation: format!(
                        "remove the directory manually: rm -rf '{}' && git -C '{}' worktree prune",
                        name,
                        self.config.repo_path.display()
                    ),
                }
            }
        };
        TeardownStep::new(Resource::Workspace, name, status)
    }

    async fn teardown_branch(&self, d: &WorkspaceDescriptor) -> TeardownStep {
        let repo = &self.config.repo_path;
        let remediation = format!("git -C '{}' branch -D {}", repo.display(), d.branch_name);

        let status = match self.vcs.branch_exists(repo, &d.branch_name).await {
            Ok(false) => StepStatus::Absent,
            Ok(true) => match self.vcs.branch_delete(repo, &d.branch_name).await {
                Ok(()) => StepStatus::Removed,
                Err(e) => StepStatus::Failed {
                    error: format!("{:#}", e),
                    remediation,
                },
            },
            Err(e) => StepStatus::Failed {
                error: format!("{:#}", e),
                remediation,
            },
        };
        if let StepStatus::Failed { error, .. } = &status {
            warn!(branch = %d.branch_name, "branch removal failed: {}", error);
        }
        TeardownStep::new(Resource::Branch, &d.branch_name, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::test_support::run_config;
    use crate::session::mock::{MockGit, MockTmux};

    #[tokio::test]
    async fn destroy_on_empty_target_makes_no_mutating_calls() {
        let tmp = tempfile::tempdir().unwrap();
        let git = MockGit::new();
        let tmux = MockTmux::new("shop");
        let orch = Orchestrator::with_adapters(
            run_config(tmp.path(), &["alpha", "beta"]),
            git.clone(),
            tmux.clone(),
        );

        let report = orch.destroy().await.unwrap();

        assert!(git.mutating_calls().is_empty());
        assert_eq!(tmux.count("kill_session"), 0);
        assert_eq!(report.failures().count(), 0);
        assert_eq!(report.count(&StepStatus::Absent), 5);
    }

    #[tokio::test]
    async fn destroy_reverses_deploy() {
        let tmp = tempfile::tempdir().unwrap();
        let git = MockGit::new();
        let tmux = MockTmux::new("shop");
        let orch = Orchestrator::with_adapters(
            run_config(tmp.path(), &["alpha", "beta"]),
            git.clone(),
            tmux.clone(),
        );
        orch.deploy().await.unwrap();

        let report = orch.destroy().await.unwrap();

        assert_eq!(report.count(&StepStatus::Removed), 5);
        assert!(!git.has_branch("aiagent/a/alpha"));
        assert!(!git.has_worktree(&tmp.path().join("shop__aiagent-b-beta")));
        assert!(!orch.mux.session_exists().await.unwrap());
    }

    #[tokio::test]
    async fn destroy_kills_session_before_workspaces() {
        let tmp = tempfile::tempdir().unwrap();
        let wt = tmp.path().join("shop__aiagent-a-alpha");
        let git = MockGit::new().with_branch("aiagent/a/alpha").with_worktree(&wt);
        let tmux = MockTmux::new("shop").with_session();
        let orch = Orchestrator::with_adapters(
            run_config(tmp.path(), &["alpha"]),
            git,
            tmux,
        );

        let report = orch.destroy().await.unwrap();

        let order: Vec<Resource> = report.steps.iter().map(|s| s.resource).collect();
        assert_eq!(
            order,
            vec![Resource::Session, Resource::Workspace, Resource::Branch]
        );
    }

    #[tokio::test]
    async fn destroy_keep_branches_never_deletes_branches() {
        let tmp = tempfile::tempdir().unwrap();
        let wt = tmp.path().join("shop__aiagent-a-alpha");
        let git = MockGit::new().with_branch("aiagent/a/alpha").with_worktree(&wt);
        let mut config = run_config(tmp.path(), &["alpha"]);
        config.keep_branches = true;
        let orch = Orchestrator::with_adapters(config, git.clone(), MockTmux::new("shop"));

        let report = orch.destroy().await.unwrap();

        assert!(!git.has_worktree(&wt), "destroy: workspace should still be removed");
        assert!(git.has_branch("aiagent/a/alpha"));
        assert!(git.calls().iter().all(|c| !c.starts_with("branch_delete")));
        assert_eq!(report.count(&StepStatus::Kept), 1);
    }

    #[tokio::test]
    async fn destroy_continues_after_workspace_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let wt_a = tmp.path().join("shop__aiagent-a-alpha");
        let wt_b = tmp.path().join("shop__aiagent-b-beta");
        let git = MockGit::new()
            .with_worktree(&wt_a)
            .with_worktree(&wt_b)
            .with_branch("aiagent/b/beta")
            .failing("worktree_remove");
        let orch = Orchestrator::with_adapters(
            run_config(tmp.path(), &["alpha", "beta"]),
            git.clone(),
            MockTmux::new("shop"),
        );

        let report = orch.destroy().await.unwrap();

        let failures: Vec<&TeardownStep> = report.failures().collect();
        assert_eq!(failures.len(), 2);
        match &failures[0].status {
            StepStatus::Failed { remediation, .. } => assert!(
                remediation.contains("rm -rf"),
                "destroy: workspace failure should suggest manual removal, got {}",
                remediation
            ),
            other => panic!("unexpected status {:?}", other),
        }
        assert!(
            !git.has_branch("aiagent/b/beta"),
            "destroy: later steps should still run after a failure"
        );
    }

    #[tokio::test]
    async fn destroy_records_failed_session_kill_and_continues() {
        let tmp = tempfile::tempdir().unwrap();
        let git = MockGit::new().with_branch("aiagent/a/alpha");
        let tmux = MockTmux::new("shop").with_session().with_failing_kill();
        let orch = Orchestrator::with_adapters(run_config(tmp.path(), &["alpha"]), git.clone(), tmux);

        let report = orch.destroy().await.unwrap();

        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.steps[0].resource, Resource::Session);
        assert!(!git.has_branch("aiagent/a/alpha"));
    }

    #[tokio::test]
    async fn destroy_records_unreachable_tmux_instead_of_absent_session() {
        let tmp = tempfile::tempdir().unwrap();
        let wt = tmp.path().join("shop__aiagent-a-alpha");
        let git = MockGit::new().with_branch("aiagent/a/alpha").with_worktree(&wt);
        let tmux = MockTmux::new("shop").with_failing_query();
        let orch = Orchestrator::with_adapters(run_config(tmp.path(), &["alpha"]), git.clone(), tmux.clone());

        let report = orch.destroy().await.unwrap();

        assert!(
            matches!(report.steps[0].status, StepStatus::Failed { .. }),
            "destroy: a failed session query must not be reported as absent, got {:?}",
            report.steps[0].status
        );
        assert_eq!(tmux.count("kill_session"), 0);
        assert!(!git.has_worktree(&wt), "destroy: workspace teardown should still run");
        assert!(!git.has_branch("aiagent/a/alpha"));
    }

    #[tokio::test]
    async fn destroy_27_tasks_is_config_error_without_calls() {
        let tmp = tempfile::tempdir().unwrap();
        let names: Vec<String> = (0..27).map(|i| format!("t{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let git = MockGit::new();
        let tmux = MockTmux::new("shop");
        let orch = Orchestrator::with_adapters(run_config(tmp.path(), &refs), git.clone(), tmux.clone());

        let err = orch.destroy().await.unwrap_err();

        assert!(matches!(err, ConfigError::CapacityExceeded { .. }));
        assert!(git.calls().is_empty());
        assert!(tmux.calls().is_empty());
    }

    #[test]
    fn teardown_step_serializes_flat() {
        let step = TeardownStep::new(
            Resource::Branch,
            "aiagent/a/app",
            StepStatus::Failed {
                error: "boom".to_string(),
                remediation: "git branch -D aiagent/a/app".to_string(),
            },
        );
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["resource"], "branch");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["remediation"], "git branch -D aiagent/a/app");
    }
}
