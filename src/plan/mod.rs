mod identity;
mod naming;

pub use identity::{AgentId, MAX_AGENTS};
pub use naming::WorkspaceDescriptor;

use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::OnceLock;

use crate::config::ConfigError;

fn task_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap())
}

fn prefix_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._]*$").unwrap())
}

/// Sequences the character patterns allow but git refuses in a ref name.
fn is_ref_safe(name: &str) -> bool {
    !name.contains("..") && !name.ends_with('.') && !name.ends_with(".lock")
}

/// Split a comma-separated task list, trimming entries and dropping empty ones.
pub fn parse_tasks(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Derive one descriptor per task, in task order.
///
/// All validation happens here, so a plan that comes back `Ok` can be
/// executed without further configuration checks.
pub fn build_plan(
    project: &str,
    branch_prefix: &str,
    worktree_root: &Path,
    tasks: &[String],
) -> Result<Vec<WorkspaceDescriptor>, ConfigError> {
    if tasks.is_empty() {
        return Err(ConfigError::EmptyTaskList);
    }
    if tasks.len() > MAX_AGENTS {
        return Err(ConfigError::CapacityExceeded {
            requested: tasks.len(),
            max: MAX_AGENTS,
        });
    }
    if project.is_empty() || project == "." || project == ".." || project.contains('/') {
        return Err(ConfigError::InvalidRepoName(project.to_string()));
    }
    if !prefix_pattern().is_match(branch_prefix) || !is_ref_safe(branch_prefix) {
        return Err(ConfigError::InvalidBranchPrefix(branch_prefix.to_string()));
    }

    let mut seen = HashSet::new();
    let mut plan = Vec::with_capacity(tasks.len());

    for (i, task) in tasks.iter().enumerate() {
        if !task_pattern().is_match(task) || !is_ref_safe(task) {
            return Err(ConfigError::InvalidTask(task.clone()));
        }
        if !seen.insert(task.as_str()) {
            return Err(ConfigError::DuplicateTask(task.clone()));
        }

        let agent = AgentId::assign(i)?;
        plan.push(WorkspaceDescriptor::derive(
            project,
            branch_prefix,
            worktree_root,
            agent,
            task,
        ));
    }

    Ok(plan)
}
