//! The `/run-log{N}` log collaborator: runs the configured shell command for
//! backing node N and hands back what it printed.

use anyhow::{bail, Context, Result};
use log::{error, info};
use tokio::process::Command;

/// Extracts N from a `run-log{N}` path segment. N must be all digits since it
/// is spliced into a shell command.
pub fn parse_endpoint(segment: &str) -> Option<&str> {
    let n = segment.strip_prefix("run-log")?;
    if n.is_empty() || !n.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(n)
}

/// Runs `command` through `sh -c` and returns stdout.
///
/// A non-zero exit or anything on stderr counts as failure, with stderr (or
/// the exit status) as the message.
pub async fn run(command: &str) -> Result<String> {
    info!("RunLog: Executing `{}`", command);
    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .output()
        .await
        .context("Failed to spawn log command")?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.trim().is_empty() {
        error!("RunLog: Stderr: {}", stderr.trim());
        bail!("{}", stderr.trim());
    }
    if !output.status.success() {
        error!("RunLog: Command exited with {}", output.status);
        bail!("Command exited with {}", output.status);
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
