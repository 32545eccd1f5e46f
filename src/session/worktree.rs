use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

use super::command::{probe, run};

fn path_to_str(path: &Path) -> Result<&str> {
    path.to_str()
        .ok_or_else(|| anyhow::anyhow!("Path contains non-UTF8 characters: {:?}", path))
}

/// True when the worktree at `path` has submodules and nothing else is
/// modified or untracked, i.e. forcing the removal loses no work.
async fn only_submodules_block_removal(path: &Path) -> Result<bool> {
    let staged = run("git", &["ls-files", "--stage"], Some(path)).await?;
    let has_submodules = staged.lines().any(|line| line.starts_with("160000 "));
    if !has_submodules {
        return Ok(false);
    }

    // Porcelain v2: "1 XY <sub> ..." where <sub> starts with 'S' for a submodule.
    let status = run(
        "git",
        &["status", "--porcelain=v2", "--ignore-submodules=none"],
        Some(path),
    )
    .await?;
    Ok(status.lines().all(|line| {
        let mut fields = line.split(' ');
        matches!(fields.next(), Some("1") | Some("2"))
            && fields.nth(1).is_some_and(|sub| sub.starts_with('S'))
    }))
}

/// Whether `worktree_add` creates the branch or checks out one that exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchMode {
    CreateNew,
    AttachExisting,
}

/// Version-control operations the orchestrator needs.
#[async_trait]
pub trait VersionControl: Send + Sync {
    async fn branch_exists(&self, repo: &Path, branch: &str) -> Result<bool>;

    fn worktree_exists(&self, path: &Path) -> bool;

    async fn worktree_add(
        &self,
        repo: &Path,
        branch: &str,
        path: &Path,
        mode: BranchMode,
    ) -> Result<()>;

    async fn worktree_remove(&self, repo: &Path, path: &Path) -> Result<()>;

    /// Force-deletes the branch.
    async fn branch_delete(&self, repo: &Path, branch: &str) -> Result<()>;

    async fn submodules_init(&self, path: &Path) -> Result<()>;

    /// Identity visible only inside the worktree at `path`.
    async fn set_local_identity(
        &self,
        repo: &Path,
        path: &Path,
        name: &str,
        email: &str,
    ) -> Result<()>;
}

/// `git` CLI backed implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorktreeManager;

impl WorktreeManager {
    pub fn new() -> Self {
        Self
    }

    /// Fail early, before anything is created, when `repo` is not a git checkout.
    pub async fn verify_repo(&self, repo: &Path) -> Result<()> {
        if !repo.is_dir() {
            anyhow::bail!("Repository directory {:?} does not exist", repo);
        }
        run("git", &["rev-parse", "--git-dir"], Some(repo))
            .await
            .with_context(|| format!("{:?} is not a git repository", repo))?;
        Ok(())
    }
}

#[async_trait]
impl VersionControl for WorktreeManager {
    async fn branch_exists(&self, repo: &Path, branch: &str) -> Result<bool> {
        let reference = format!("refs/heads/{}", branch);
        let exists = probe(
            "git",
            &["show-ref", "--verify", "--quiet", &reference],
            Some(repo),
        )
        .await?;
        Ok(exists)
    }

    fn worktree_exists(&self, path: &Path) -> bool {
        path.exists()
    }

    async fn worktree_add(
        &self,
        repo: &Path,
        branch: &str,
        path: &Path,
        mode: BranchMode,
    ) -> Result<()> {
        let wt_path = path_to_str(path)?;
        let args: Vec<&str> = match mode {
            BranchMode::CreateNew => vec!["worktree", "add", "-b", branch, wt_path, "HEAD"],
            BranchMode::AttachExisting => vec!["worktree", "add", wt_path, branch],
        };

        run("git", &args, Some(repo))
            .await
            .with_context(|| format!("Failed to add worktree {:?} for {}", path, branch))?;
        Ok(())
    }

    async fn worktree_remove(&self, repo: &Path, path: &Path) -> Result<()> {
        let wt_path = path_to_str(path)?;
        let err = match run("git", &["worktree", "remove", wt_path], Some(repo)).await {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };

        // git refuses any worktree holding initialized submodules, even a clean one.
        if !only_submodules_block_removal(path).await.unwrap_or(false) {
            return Err(err).with_context(|| format!("Failed to remove worktree {:?}", path));
        }

        tracing::info!(path = %path.display(), "worktree has submodules, forcing removal");
        run("git", &["worktree", "remove", "--force", wt_path], Some(repo))
            .await
            .with_context(|| format!("Failed to remove worktree {:?}", path))?;
        Ok(())
    }

    async fn branch_delete(&self, repo: &Path, branch: &str) -> Result<()> {
        run("git", &["branch", "-D", branch], Some(repo))
            .await
            .with_context(|| format!("Failed to delete branch {}", branch))?;
        Ok(())
    }

    async fn submodules_init(&self, path: &Path) -> Result<()> {
        run(
            "git",
            &["submodule", "update", "--init", "--recursive"],
            Some(path),
        )
        .await
        .with_context(|| format!("Failed to initialize submodules in {:?}", path))?;
        Ok(())
    }

    async fn set_local_identity(
        &self,
        repo: &Path,
        path: &Path,
        name: &str,
        email: &str,
    ) -> Result<()> {
        // Without this, `git config` inside a worktree writes the shared repo config.
        run(
            "git",
            &["config", "extensions.worktreeConfig", "true"],
            Some(repo),
        )
        .await
        .context("Failed to enable per-worktree config")?;

        run("git", &["config", "--worktree", "user.name", name], Some(path))
            .await
            .with_context(|| format!("Failed to set user.name in {:?}", path))?;
        run("git", &["config", "--worktree", "user.email", email], Some(path))
            .await
            .with_context(|| format!("Failed to set user.email in {:?}", path))?;
        Ok(())
    }
}
