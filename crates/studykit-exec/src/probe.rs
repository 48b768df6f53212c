//! Tool presence and version probes.
//!
//! Probes never fail: a runner error, a non-zero exit or a timeout all read
//! as "not available" / "no version".

use std::time::Duration;

use tracing::debug;

use crate::executor::CommandRunner;
use crate::request::ExecutionRequest;

/// Deadline for a single probe invocation.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Platform command that resolves a program name to a path.
pub fn lookup_program() -> &'static str {
    if cfg!(windows) {
        "where"
    } else {
        "which"
    }
}

/// `true` when `<command> --version` succeeds, or when the platform lookup
/// finds the command on `PATH`.
pub async fn is_command_available<R>(runner: &R, command: &str, timeout: Duration) -> bool
where
    R: CommandRunner + ?Sized,
{
    let version_probe = ExecutionRequest::new(command)
        .arg("--version")
        .timeout(timeout);
    match runner.run(&version_probe).await {
        Ok(result) if result.success => return true,
        Ok(result) => debug!(
            command,
            exit_code = result.exit_code,
            "version probe failed, falling back to path lookup"
        ),
        Err(err) => debug!(command, error = %err, "version probe errored, falling back to path lookup"),
    }

    locate_command(runner, command, timeout).await.is_some()
}

/// First line printed by `which`/`where`, if the lookup succeeds.
pub async fn locate_command<R>(runner: &R, command: &str, timeout: Duration) -> Option<String>
where
    R: CommandRunner + ?Sized,
{
    let lookup = ExecutionRequest::new(lookup_program())
        .arg(command)
        .timeout(timeout);
    let result = runner.run(&lookup).await.ok()?;
    if !result.success {
        return None;
    }
    result
        .stdout
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
}

/// Trimmed stdout of `<command> --version`, or `None` on any failure.
pub async fn command_version<R>(runner: &R, command: &str, timeout: Duration) -> Option<String>
where
    R: CommandRunner + ?Sized,
{
    let request = ExecutionRequest::new(command)
        .arg("--version")
        .timeout(timeout);
    let result = runner.run(&request).await.ok()?;
    if !result.success {
        return None;
    }
    let trimmed = result.stdout.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
