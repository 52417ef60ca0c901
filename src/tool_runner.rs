//! Runs external tools to completion.
//!
//! Each tool is started as the leader of its own process group. The whole
//! group is killed when the run ends, times out or its future is dropped, so
//! helpers a tool forks (ffmpeg under yt-dlp, for instance) never outlive the
//! call and never write into a directory that is being cleaned up.

use std::io;
use std::process::{Command, Output, Stdio};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ToolRunError {
    #[error("timed out")]
    Timeout,

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Kills the process group led by `pgid` when dropped.
struct ProcessGroupGuard {
    pgid: Option<u32>,
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            if let Some(pgid) = self.pgid {
                // ESRCH (group already gone) is the common case and ignored.
                let killed = unsafe { libc::kill(-(pgid as libc::pid_t), libc::SIGKILL) } == 0;
                if killed {
                    debug!("Killed remaining processes of group {}", pgid);
                }
            }
        }
    }
}

/// Spawns `command` in a new process group and waits for its output for at
/// most `timeout`.
pub async fn run_to_completion(
    mut command: Command,
    timeout: Duration,
) -> Result<Output, ToolRunError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    let mut command = tokio::process::Command::from(command);
    command.kill_on_drop(true);
    let child = command.spawn()?;
    let _group = ProcessGroupGuard { pgid: child.id() };

    match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(output) => Ok(output?),
        Err(_) => Err(ToolRunError::Timeout),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn shell(script: &str) -> Command {
        let mut command = Command::new("sh");
        command.arg("-c").arg(script);
        command
    }

    #[tokio::test]
    async fn test_collects_output() {
        let output = run_to_completion(shell("echo hello; echo oops >&2"), Duration::from_secs(5))
            .await
            .unwrap();

        assert!(output.status.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\n");
        assert_eq!(String::from_utf8_lossy(&output.stderr), "oops\n");
    }

    #[tokio::test]
    async fn test_missing_executable_is_io_error() {
        let result = run_to_completion(
            Command::new("definitely-not-a-real-tool"),
            Duration::from_secs(5),
        )
        .await;

        assert!(matches!(result, Err(ToolRunError::Io(_))));
    }

    #[tokio::test]
    async fn test_timeout_kills_forked_helpers() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join("written-late");
        let script = format!("(sleep 1; touch '{}') & sleep 30", marker.display());

        let result = run_to_completion(shell(&script), Duration::from_millis(200)).await;
        assert!(matches!(result, Err(ToolRunError::Timeout)));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_dropped_run_kills_forked_helpers() {
        let temp_dir = TempDir::new().unwrap();
        let marker = temp_dir.path().join("written-late");
        let script = format!("(sleep 1; touch '{}') & sleep 30", marker.display());

        let cancelled = tokio::time::timeout(
            Duration::from_millis(200),
            run_to_completion(shell(&script), Duration::from_secs(60)),
        )
        .await;
        assert!(cancelled.is_err());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }
}
