//! Subprocess helpers shared by the platform adapters.

use std::process::{Output, Stdio};

use tokio::process::Command;
use tracing::debug;

use crate::ports::CommandError;

/// Run a command to completion and capture its output.
///
/// The child is killed if the returned future is dropped, so callers can
/// abandon it with `tokio::time::timeout`.
pub(crate) async fn output(program: &str, args: &[&str]) -> Result<Output, CommandError> {
    debug!(program = program, args = ?args, "Running command");

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    hide_console(&mut cmd);

    cmd.output().await.map_err(|source| CommandError::Spawn {
        program: program.to_string(),
        source,
    })
}

/// Run a command and return its stdout, failing on a non-zero exit.
pub(crate) async fn stdout(program: &str, args: &[&str]) -> Result<String, CommandError> {
    let output = output(program, args).await?;
    if !output.status.success() {
        return Err(exit_error(program, &output));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

pub(crate) fn exit_error(program: &str, output: &Output) -> CommandError {
    CommandError::Exit {
        program: program.to_string(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    }
}

#[cfg(windows)]
fn hide_console(cmd: &mut Command) {
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console(_cmd: &mut Command) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_stdout_success() {
        let out = stdout("echo", &["hello"]).await.unwrap();
        assert_eq!(out.trim(), "hello");
    }

    #[tokio::test]
    async fn test_non_zero_exit() {
        let err = stdout("false", &[]).await.unwrap_err();
        assert!(matches!(err, CommandError::Exit { .. }));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let err = stdout("devports-no-such-tool", &[]).await.unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
