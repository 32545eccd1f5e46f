use std::path::{Component, Path, PathBuf};

/// Make `path` absolute against `cwd` and fold `.`/`..` components lexically.
///
/// The worktree root usually does not exist yet, so this cannot rely on
/// `canonicalize`.
pub fn absolutize(cwd: &Path, path: &Path) -> PathBuf {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// tmux silently rewrites `.` and `:` in session names; do it up front so
/// later lookups by name match what tmux actually created.
pub fn sanitize_session_name(name: &str) -> String {
    name.chars()
        .map(|c| if c == '.' || c == ':' { '_' } else { c })
        .collect()
}

pub fn shell_single_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}
