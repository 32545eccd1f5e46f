use anyhow::Result;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{info, warn};

use super::Orchestrator;
use crate::config::AgentBootstrap;
use crate::plan::WorkspaceDescriptor;
use crate::session::{write_session_info, Multiplexer, PaneRef, VersionControl};
use crate::utils::shell_single_quote;

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

const SHELL_NAMES: [&str; 6] = ["bash", "zsh", "fish", "sh", "dash", "ksh"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayoutReport {
    pub session_created: bool,
    pub windows_created: usize,
    pub windows_kept: usize,
    pub agents_started: usize,
}

fn is_shell(command: &str) -> bool {
    let lower = command.to_lowercase();
    let basename = std::path::Path::new(&lower)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(&lower)
        .trim_start_matches('-');
    SHELL_NAMES.contains(&basename)
}

impl<V: VersionControl, M: Multiplexer> Orchestrator<V, M> {
    /// One window per task, in task order: review tool on the left, work
    /// pane on the right.
    ///
    /// A fresh session reuses its initial window for the first task. When the
    /// session is already running, windows are only added for tasks that do
    /// not have one yet.
    pub async fn build_layout(&self, plan: &[WorkspaceDescriptor]) -> Result<LayoutReport> {
        let mut report = LayoutReport::default();

        let mut initial = if self.mux.session_exists().await? {
            println!(
                "Session {} already exists, adding missing windows...",
                self.mux.session_name()
            );
            None
        } else {
            let pane = self.mux.new_session(&self.config.worktree_root).await?;
            write_session_info(
                &self.mux,
                &self.config.project,
                &self.config.repo_path,
                plan.len(),
            )
            .await?;
            info!(session = self.mux.session_name(), "session created");
            report.session_created = true;
            Some(pane)
        };

        for d in plan {
            if !self.vcs.worktree_exists(&d.workspace_path) {
                warn!(
                    path = %d.workspace_path.display(),
                    "workspace missing; window will open elsewhere"
                );
            }

            let left = match initial.take() {
                Some(pane) => self.reuse_initial_window(pane, d).await?,
                None => {
                    if self.mux.window_exists(&d.window_name).await? {
                        println!("Window {} already exists, keeping it", d.window_name);
                        report.windows_kept += 1;
                        continue;
                    }
                    self.mux
                        .new_window(&d.window_name, &d.workspace_path)
                        .await?
                }
            };

            if !self.config.review_tool.is_empty() {
                self.mux
                    .send_keys(&left.pane_id, &self.config.review_tool)
                    .await?;
            }

            let right = self
                .mux
                .split_horizontal(&left.pane_id, &d.workspace_path)
                .await?;
            report.windows_created += 1;

            if let Some(bootstrap) = &self.config.agent_bootstrap {
                self.bootstrap_agent(&right, bootstrap).await?;
                report.agents_started += 1;
            }
        }

        Ok(report)
    }

    async fn reuse_initial_window(&self, pane: PaneRef, d: &WorkspaceDescriptor) -> Result<PaneRef> {
        self.mux
            .rename_window(&pane.window_id, &d.window_name)
            .await?;
        let cd = format!(
            "cd {}",
            shell_single_quote(&d.workspace_path.display().to_string())
        );
        self.mux.send_keys(&pane.pane_id, &cd).await?;
        Ok(pane)
    }

    /// Starts the agent in `pane`, then sends it the initial prompt.
    ///
    /// The prompt is sent even when the agent never shows up in the pane;
    /// the operator can retype it.
    async fn bootstrap_agent(&self, pane: &str, bootstrap: &AgentBootstrap) -> Result<()> {
        self.mux.send_keys(pane, &bootstrap.command).await?;

        if !self.wait_for_agent(pane, bootstrap.ready_timeout).await? {
            warn!(
                pane,
                timeout = ?bootstrap.ready_timeout,
                "agent not in foreground yet, sending prompt anyway"
            );
        }

        self.mux.send_keys(pane, &bootstrap.prompt).await?;
        Ok(())
    }

    /// Polls until something other than a shell owns the pane.
    async fn wait_for_agent(&self, pane: &str, timeout: Duration) -> Result<bool> {
        if timeout.is_zero() {
            return Ok(true);
        }

        let start = Instant::now();
        loop {
            if let Some(cmd) = self.mux.pane_current_command(pane).await? {
                if !is_shell(&cmd) {
                    return Ok(true);
                }
            }
            if start.elapsed() >= timeout {
                return Ok(false);
            }
            sleep(READY_POLL_INTERVAL).await;
        }
    }
}
