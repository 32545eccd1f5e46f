use std::path::Path;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::Command;

/// An external program (git or tmux) that could not be run or exited non-zero.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{program} {args}` failed ({}): {stderr}", describe_code(.code))]
    Failed {
        program: String,
        args: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl CommandError {
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Spawn { .. } => None,
            CommandError::Failed { code, .. } => *code,
        }
    }
}

fn build(program: &str, args: &[&str], cwd: Option<&Path>) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    cmd
}

/// Run a command to completion and return its trimmed stdout.
pub async fn run(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<String, CommandError> {
    tracing::debug!(program, ?args, ?cwd, "running");

    let output = build(program, args, cwd)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            args: args.join(" "),
            code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a command only for its exit status; output is discarded.
pub async fn probe(program: &str, args: &[&str], cwd: Option<&Path>) -> Result<bool, CommandError> {
    tracing::debug!(program, ?args, ?cwd, "probing");

    build(program, args, cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })
}

/// Run a command attached to the caller's terminal and wait for it to exit.
pub async fn run_interactive(program: &str, args: &[&str]) -> Result<(), CommandError> {
    tracing::debug!(program, ?args, "running interactively");

    let status = Command::new(program)
        .args(args)
        .status()
        .await
        .map_err(|source| CommandError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if !status.success() {
        return Err(CommandError::Failed {
            program: program.to_string(),
            args: args.join(" "),
            code: status.code(),
            stderr: String::new(),
        });
    }
    Ok(())
}
