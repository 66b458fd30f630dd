//! Hook command execution.
//!
//! Commands are executed directly, never through a shell. Output is
//! captured and surfaced only through logs; no timeout is applied, so a
//! hung command blocks its worker until the process is terminated
//! externally.

use crate::models::action::HookCommand;
use anyhow::{bail, Context, Result};
use tokio::process::Command;
use tracing::{debug, error};

/// Execute one hook command and return its combined stdout/stderr.
///
/// Fails on an empty command, a launch failure, or a non-zero exit; the
/// captured output is carried in the error.
pub async fn run(command: &HookCommand) -> Result<String> {
    let argv = command.argv();
    let Some((program, args)) = argv.split_first() else {
        bail!("empty hook command");
    };
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .with_context(|| format!("launch {}", program))?;

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    combined.push_str(&String::from_utf8_lossy(&output.stderr));

    if !output.status.success() {
        bail!(
            "command exited with {}: {}",
            output.status,
            combined.trim_end()
        );
    }
    Ok(combined)
}

/// Run a hook for an action, reporting the outcome through logs.
///
/// Returns whether the hook succeeded; failures never propagate further.
pub async fn run_logged(action: &str, phase: &str, command: &HookCommand) -> bool {
    debug!(action, phase, command = %command, "running hook");
    match run(command).await {
        Ok(output) => {
            if !output.trim().is_empty() {
                debug!(action, phase, output = %output.trim_end(), "hook output");
            }
            true
        }
        Err(e) => {
            error!(action, phase, command = %command, error = %e, "hook failed");
            false
        }
    }
}
