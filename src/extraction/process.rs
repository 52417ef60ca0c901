use super::ExtractionError;
use crate::tool_runner::{run_to_completion, ToolRunError};
use std::process::{Command, Output};
use std::time::Duration;

/// Runs `command` to completion within `timeout_sec`, failing on a non-zero
/// exit status.
pub(super) async fn run_tool(
    tool: &str,
    command: Command,
    timeout_sec: u64,
) -> Result<Output, ExtractionError> {
    let output = run_to_completion(command, Duration::from_secs(timeout_sec))
        .await
        .map_err(|e| match e {
            ToolRunError::Timeout => ExtractionError::Timeout(tool.to_string(), timeout_sec),
            ToolRunError::Io(e) => ExtractionError::Io(e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractionError::ToolFailed {
            tool: tool.to_string(),
            message: format!("exit status {}: {}", output.status, stderr.trim()),
        });
    }
    Ok(output)
}
