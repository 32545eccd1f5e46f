use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

use super::command::{probe, run, run_interactive};

pub const ENV_PROJECT: &str = "AGENTWT_PROJECT";
pub const ENV_REPO_PATH: &str = "AGENTWT_REPO_PATH";
pub const ENV_NUM_AGENTS: &str = "AGENTWT_NUM_AGENTS";
pub const ENV_CREATED_AT: &str = "AGENTWT_CREATED_AT";

/// tmux ids of a window and of its first pane (`@3`, `%7`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaneRef {
    pub window_id: String,
    pub pane_id: String,
}

impl PaneRef {
    fn parse(output: &str) -> Result<Self> {
        let mut parts = output.split_whitespace();
        match (parts.next(), parts.next()) {
            (Some(window_id), Some(pane_id)) => Ok(Self {
                window_id: window_id.to_string(),
                pane_id: pane_id.to_string(),
            }),
            _ => anyhow::bail!("Unexpected tmux output: {:?}", output),
        }
    }
}

/// Metadata recorded in the session environment when the session is created.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SessionInfo {
    pub session_name: String,
    pub project: Option<String>,
    pub repo_path: Option<String>,
    pub num_agents: Option<usize>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Terminal multiplexer operations on a single named session.
///
/// Targets are tmux window or pane ids as returned by [`PaneRef`] and
/// [`Multiplexer::split_horizontal`].
#[async_trait]
pub trait Multiplexer: Send + Sync {
    fn session_name(&self) -> &str;

    async fn session_exists(&self) -> Result<bool>;

    /// Creates the session detached, returning its initial window and pane.
    async fn new_session(&self, cwd: &Path) -> Result<PaneRef>;

    async fn kill_session(&self) -> Result<()>;

    async fn rename_window(&self, target: &str, name: &str) -> Result<()>;

    async fn new_window(&self, name: &str, cwd: &Path) -> Result<PaneRef>;

    async fn window_exists(&self, name: &str) -> Result<bool>;

    /// Splits `target` side by side, returning the id of the new right pane.
    async fn split_horizontal(&self, target: &str, cwd: &Path) -> Result<String>;

    /// Types `text` literally into `target`, then presses Enter.
    async fn send_keys(&self, target: &str, text: &str) -> Result<()>;

    async fn pane_current_command(&self, target: &str) -> Result<Option<String>>;

    async fn set_env(&self, key: &str, value: &str) -> Result<()>;

    async fn get_env(&self, key: &str) -> Result<Option<String>>;

    /// Hands the terminal over to the session. Blocks until the operator detaches.
    async fn attach(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct TmuxManager {
    session_name: String,
}

impl TmuxManager {
    pub fn new(session_name: String) -> Self {
        Self { session_name }
    }

    /// Exact-match session target; plain `-t name` would also match prefixes.
    fn session_target(&self) -> String {
        format!("={}", self.session_name)
    }
}

/// Records what the session was created for, so `status` can report it later.
pub async fn write_session_info<M: Multiplexer + ?Sized>(
    mux: &M,
    project: &str,
    repo_path: &Path,
    num_agents: usize,
) -> Result<()> {
    mux.set_env(ENV_PROJECT, project).await?;
    mux.set_env(ENV_REPO_PATH, &repo_path.display().to_string())
        .await?;
    mux.set_env(ENV_NUM_AGENTS, &num_agents.to_string()).await?;
    mux.set_env(ENV_CREATED_AT, &Utc::now().to_rfc3339()).await?;
    Ok(())
}

/// Reads the metadata written by [`write_session_info`].
pub async fn read_session_info<M: Multiplexer + ?Sized>(mux: &M) -> Result<SessionInfo> {
    Ok(SessionInfo {
        session_name: mux.session_name().to_string(),
        project: mux.get_env(ENV_PROJECT).await?,
        repo_path: mux.get_env(ENV_REPO_PATH).await?,
        num_agents: mux
            .get_env(ENV_NUM_AGENTS)
            .await?
            .and_then(|s| s.parse().ok()),
        created_at: mux
            .get_env(ENV_CREATED_AT)
            .await?
            .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
            .map(|dt| dt.with_timezone(&Utc)),
    })
}

fn cwd_str(cwd: &Path) -> Result<&str> {
    cwd.to_str()
        .ok_or_else(|| anyhow::anyhow!("Path contains non-UTF8 characters: {:?}", cwd))
}

#[async_trait]
impl Multiplexer for TmuxManager {
    fn session_name(&self) -> &str {
        &self.session_name
    }

    async fn session_exists(&self) -> Result<bool> {
        let exists = probe("tmux", &["has-session", "-t", &self.session_target()], None)
            .await
            .context("Failed to query tmux sessions")?;
        Ok(exists)
    }

    async fn new_session(&self, cwd: &Path) -> Result<PaneRef> {
        let out = run(
            "tmux",
            &[
                "new-session",
                "-d",
                "-s",
                &self.session_name,
                "-c",
                cwd_str(cwd)?,
                "-P",
                "-F",
                "#{window_id} #{pane_id}",
            ],
            None,
        )
        .await
        .context("Failed to create tmux session")?;
        PaneRef::parse(&out)
    }

    async fn kill_session(&self) -> Result<()> {
        run("tmux", &["kill-session", "-t", &self.session_target()], None)
            .await
            .context("Failed to kill tmux session")?;
        Ok(())
    }

    async fn rename_window(&self, target: &str, name: &str) -> Result<()> {
        run("tmux", &["rename-window", "-t", target, name], None)
            .await
            .with_context(|| format!("Failed to rename window {} to {}", target, name))?;
        Ok(())
    }

    async fn new_window(&self, name: &str, cwd: &Path) -> Result<PaneRef> {
        let session = format!("{}:", self.session_target());
        let out = run(
            "tmux",
            &[
                "new-window",
                "-t",
                &session,
                "-n",
                name,
                "-c",
                cwd_str(cwd)?,
                "-P",
                "-F",
                "#{window_id} #{pane_id}",
            ],
            None,
        )
        .await
        .with_context(|| format!("Failed to create window {}", name))?;
        PaneRef::parse(&out)
    }

    async fn window_exists(&self, name: &str) -> Result<bool> {
        let out = run(
            "tmux",
            &[
                "list-windows",
                "-t",
                &self.session_target(),
                "-F",
                "#{window_name}",
            ],
            None,
        )
        .await
        .context("Failed to list tmux windows")?;
        Ok(out.lines().any(|line| line == name))
    }

    async fn split_horizontal(&self, target: &str, cwd: &Path) -> Result<String> {
        let pane = run(
            "tmux",
            &[
                "split-window",
                "-h",
                "-t",
                target,
                "-c",
                cwd_str(cwd)?,
                "-P",
                "-F",
                "#{pane_id}",
            ],
            None,
        )
        .await
        .with_context(|| format!("Failed to split window {}", target))?;
        Ok(pane)
    }

    async fn send_keys(&self, target: &str, text: &str) -> Result<()> {
        run("tmux", &["send-keys", "-t", target, "-l", text], None)
            .await
            .with_context(|| format!("Failed to send keys to {}", target))?;
        run("tmux", &["send-keys", "-t", target, "Enter"], None)
            .await
            .with_context(|| format!("Failed to send Enter to {}", target))?;
        Ok(())
    }

    async fn pane_current_command(&self, target: &str) -> Result<Option<String>> {
        let out = run(
            "tmux",
            &[
                "display-message",
                "-p",
                "-t",
                target,
                "#{pane_current_command}",
            ],
            None,
        )
        .await
        .with_context(|| format!("Failed to query pane {}", target))?;
        Ok((!out.is_empty()).then_some(out))
    }

    async fn set_env(&self, key: &str, value: &str) -> Result<()> {
        run(
            "tmux",
            &["set-environment", "-t", &self.session_target(), key, value],
            None,
        )
        .await
        .with_context(|| format!("Failed to set env {}", key))?;
        Ok(())
    }

    async fn get_env(&self, key: &str) -> Result<Option<String>> {
        // Unset variables make tmux exit non-zero; treat that as absent.
        let out = match run(
            "tmux",
            &["show-environment", "-t", &self.session_target(), key],
            None,
        )
        .await
        {
            Ok(out) => out,
            Err(_) => return Ok(None),
        };
        Ok(out
            .strip_prefix(&format!("{}=", key))
            .map(|value| value.to_string()))
    }

    async fn attach(&self) -> Result<()> {
        let target = self.session_target();
        let subcommand = if std::env::var_os("TMUX").is_some() {
            "switch-client"
        } else {
            "attach-session"
        };
        run_interactive("tmux", &[subcommand, "-t", &target])
            .await
            .with_context(|| format!("Failed to attach to session {}", self.session_name))?;
        Ok(())
    }
}
