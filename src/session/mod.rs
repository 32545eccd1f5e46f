mod command;
#[cfg(test)]
pub mod mock;
mod tmux;
mod worktree;

pub use command::CommandError;
pub use tmux::{read_session_info, write_session_info, Multiplexer, PaneRef, SessionInfo, TmuxManager};
pub use worktree::{BranchMode, VersionControl, WorktreeManager};
