//! In-memory stand-ins for git and tmux that record every call and keep just
//! enough state to answer existence queries the way the real tools would.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::{BranchMode, Multiplexer, PaneRef, VersionControl};

#[derive(Default)]
struct GitState {
    branches: HashSet<String>,
    worktrees: HashSet<PathBuf>,
    calls: Vec<String>,
    fail_ops: HashSet<&'static str>,
    identities: HashMap<PathBuf, (String, String)>,
}

#[derive(Clone, Default)]
pub struct MockGit {
    state: Arc<Mutex<GitState>>,
}

impl MockGit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_branch(self, branch: &str) -> Self {
        self.state.lock().unwrap().branches.insert(branch.to_string());
        self
    }

    pub fn with_worktree(self, path: &Path) -> Self {
        self.state
            .lock()
            .unwrap()
            .worktrees
            .insert(path.to_path_buf());
        self
    }

    /// Make every call to `op` (e.g. "worktree_remove") fail.
    pub fn failing(self, op: &'static str) -> Self {
        self.state.lock().unwrap().fail_ops.insert(op);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Calls that change repository state, i.e. everything but existence checks.
    pub fn mutating_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| !c.starts_with("branch_exists"))
            .collect()
    }

    pub fn has_branch(&self, branch: &str) -> bool {
        self.state.lock().unwrap().branches.contains(branch)
    }

    pub fn has_worktree(&self, path: &Path) -> bool {
        self.state.lock().unwrap().worktrees.contains(path)
    }

    pub fn identity(&self, path: &Path) -> Option<(String, String)> {
        self.state.lock().unwrap().identities.get(path).cloned()
    }

    fn record(&self, op: &'static str, detail: String) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("{} {}", op, detail));
        if state.fail_ops.contains(op) {
            bail!("mock git: {} failed", op);
        }
        Ok(())
    }
}

#[async_trait]
impl VersionControl for MockGit {
    async fn branch_exists(&self, _repo: &Path, branch: &str) -> Result<bool> {
        self.record("branch_exists", branch.to_string())?;
        Ok(self.has_branch(branch))
    }

    fn worktree_exists(&self, path: &Path) -> bool {
        self.has_worktree(path)
    }

    async fn worktree_add(
        &self,
        _repo: &Path,
        branch: &str,
        path: &Path,
        mode: BranchMode,
    ) -> Result<()> {
        self.record("worktree_add", format!("{} {:?}", branch, mode))?;
        let mut state = self.state.lock().unwrap();
        match mode {
            BranchMode::CreateNew if state.branches.contains(branch) => {
                bail!("mock git: branch {} already exists", branch)
            }
            BranchMode::AttachExisting if !state.branches.contains(branch) => {
                bail!("mock git: branch {} not found", branch)
            }
            _ => {}
        }
        state.branches.insert(branch.to_string());
        state.worktrees.insert(path.to_path_buf());
        Ok(())
    }

    async fn worktree_remove(&self, _repo: &Path, path: &Path) -> Result<()> {
        self.record("worktree_remove", path.display().to_string())?;
        self.state.lock().unwrap().worktrees.remove(path);
        Ok(())
    }

    async fn branch_delete(&self, _repo: &Path, branch: &str) -> Result<()> {
        self.record("branch_delete", branch.to_string())?;
        self.state.lock().unwrap().branches.remove(branch);
        Ok(())
    }

    async fn submodules_init(&self, path: &Path) -> Result<()> {
        self.record("submodules_init", path.display().to_string())
    }

    async fn set_local_identity(
        &self,
        _repo: &Path,
        path: &Path,
        name: &str,
        email: &str,
    ) -> Result<()> {
        self.record("set_local_identity", format!("{} {}", name, email))?;
        self.state
            .lock()
            .unwrap()
            .identities
            .insert(path.to_path_buf(), (name.to_string(), email.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWindow {
    pub id: String,
    pub name: String,
    pub panes: Vec<String>,
}

#[derive(Default)]
struct TmuxState {
    session: Option<Vec<MockWindow>>,
    next_id: usize,
    calls: Vec<String>,
    keys: Vec<(String, String)>,
    env: HashMap<String, String>,
    pane_command: Option<String>,
    kill_fails: bool,
    query_fails: bool,
}

#[derive(Clone)]
pub struct MockTmux {
    session_name: String,
    state: Arc<Mutex<TmuxState>>,
}

impl MockTmux {
    pub fn new(session_name: &str) -> Self {
        let state = TmuxState {
            pane_command: Some("codex".to_string()),
            ..Default::default()
        };
        Self {
            session_name: session_name.to_string(),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Start with a live session holding one default window.
    pub fn with_session(self) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let window = MockWindow {
                id: "@0".to_string(),
                name: "bash".to_string(),
                panes: vec!["%0".to_string()],
            };
            state.next_id = 1;
            state.session = Some(vec![window]);
        }
        self
    }

    pub fn with_pane_command(self, cmd: Option<&str>) -> Self {
        self.state.lock().unwrap().pane_command = cmd.map(str::to_string);
        self
    }

    pub fn with_failing_kill(self) -> Self {
        self.state.lock().unwrap().kill_fails = true;
        self
    }

    /// Session queries fail as if the tmux binary could not be run.
    pub fn with_failing_query(self) -> Self {
        self.state.lock().unwrap().query_fails = true;
        self
    }

    pub fn windows(&self) -> Vec<MockWindow> {
        self.state
            .lock()
            .unwrap()
            .session
            .clone()
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn keys(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().keys.clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split_whitespace().next() == Some(op))
            .count()
    }

    fn record(&self, call: String) {
        self.state.lock().unwrap().calls.push(call);
    }
}

impl TmuxState {
    fn alloc(&mut self, prefix: char) -> String {
        let id = format!("{}{}", prefix, self.next_id);
        self.next_id += 1;
        id
    }

    fn windows_mut(&mut self) -> Result<&mut Vec<MockWindow>> {
        match self.session.as_mut() {
            Some(windows) => Ok(windows),
            None => bail!("mock tmux: no session"),
        }
    }
}

#[async_trait]
impl Multiplexer for MockTmux {
    fn session_name(&self) -> &str {
        &self.session_name
    }

    async fn session_exists(&self) -> Result<bool> {
        self.record("session_exists".to_string());
        let state = self.state.lock().unwrap();
        if state.query_fails {
            bail!("mock tmux: failed to run tmux");
        }
        Ok(state.session.is_some())
    }

    async fn new_session(&self, cwd: &Path) -> Result<PaneRef> {
        self.record(format!("new_session {}", cwd.display()));
        let mut state = self.state.lock().unwrap();
        if state.session.is_some() {
            bail!("mock tmux: duplicate session {}", self.session_name);
        }
        let window_id = state.alloc('@');
        let pane_id = state.alloc('%');
        state.session = Some(vec![MockWindow {
            id: window_id.clone(),
            name: "bash".to_string(),
            panes: vec![pane_id.clone()],
        }]);
        Ok(PaneRef { window_id, pane_id })
    }

    async fn kill_session(&self) -> Result<()> {
        self.record("kill_session".to_string());
        let mut state = self.state.lock().unwrap();
        if state.kill_fails {
            bail!("mock tmux: kill-session failed");
        }
        state.session = None;
        Ok(())
    }

    async fn rename_window(&self, target: &str, name: &str) -> Result<()> {
        self.record(format!("rename_window {} {}", target, name));
        let mut state = self.state.lock().unwrap();
        let window = state
            .windows_mut()?
            .iter_mut()
            .find(|w| w.id == target)
            .ok_or_else(|| anyhow::anyhow!("mock tmux: no window {}", target))?;
        window.name = name.to_string();
        Ok(())
    }

    async fn new_window(&self, name: &str, cwd: &Path) -> Result<PaneRef> {
        self.record(format!("new_window {} {}", name, cwd.display()));
        let mut state = self.state.lock().unwrap();
        let window_id = state.alloc('@');
        let pane_id = state.alloc('%');
        state.windows_mut()?.push(MockWindow {
            id: window_id.clone(),
            name: name.to_string(),
            panes: vec![pane_id.clone()],
        });
        Ok(PaneRef { window_id, pane_id })
    }

    async fn window_exists(&self, name: &str) -> Result<bool> {
        self.record(format!("window_exists {}", name));
        let mut state = self.state.lock().unwrap();
        Ok(state.windows_mut()?.iter().any(|w| w.name == name))
    }

    async fn split_horizontal(&self, target: &str, cwd: &Path) -> Result<String> {
        self.record(format!("split_horizontal {} {}", target, cwd.display()));
        let mut state = self.state.lock().unwrap();
        let pane_id = state.alloc('%');
        let window = state
            .windows_mut()?
            .iter_mut()
            .find(|w| w.id == target || w.panes.iter().any(|p| p == target))
            .ok_or_else(|| anyhow::anyhow!("mock tmux: no target {}", target))?;
        window.panes.push(pane_id.clone());
        Ok(pane_id)
    }

    async fn send_keys(&self, target: &str, text: &str) -> Result<()> {
        self.record(format!("send_keys {}", target));
        self.state
            .lock()
            .unwrap()
            .keys
            .push((target.to_string(), text.to_string()));
        Ok(())
    }

    async fn pane_current_command(&self, target: &str) -> Result<Option<String>> {
        self.record(format!("pane_current_command {}", target));
        Ok(self.state.lock().unwrap().pane_command.clone())
    }

    async fn set_env(&self, key: &str, value: &str) -> Result<()> {
        self.record(format!("set_env {}", key));
        self.state
            .lock()
            .unwrap()
            .env
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn get_env(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().env.get(key).cloned())
    }

    async fn attach(&self) -> Result<()> {
        self.record("attach".to_string());
        Ok(())
    }
}
