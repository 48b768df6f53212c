//! Process execution with a deadline.
//!
//! The child's exit and the deadline are raced in a single `tokio::select!`;
//! whichever completes first decides the result and the other branch is
//! dropped, so every call settles exactly once.

use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{ExecError, Result};
use crate::request::ExecutionRequest;

/// Exit code reported when the deadline fired (matches coreutils `timeout`).
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// Exit code reported when the program exists but could not be executed.
pub const NOT_EXECUTABLE_EXIT_CODE: i32 = 126;

/// Exit code reported when the program could not be found.
pub const SPAWN_FAILED_EXIT_CODE: i32 = 127;

/// How long output readers may keep draining after settlement.
const OUTPUT_GRACE: Duration = Duration::from_millis(250);

const READ_CHUNK: usize = 8 * 1024;

type SharedBuffer = Arc<Mutex<Vec<u8>>>;

/// Settled outcome of one execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    /// Exit code (synthetic for timeouts and spawn failures).
    pub exit_code: i32,

    /// Captured stdout (empty when not captured).
    pub stdout: String,

    /// Captured stderr (empty when not captured).
    pub stderr: String,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,

    /// `exit_code == 0 && !timed_out`.
    pub success: bool,

    /// The deadline fired before the process exited.
    pub timed_out: bool,
}

impl ExecutionResult {
    /// Result of a process that exited on its own.
    pub fn completed(exit_code: i32, stdout: String, stderr: String, duration_ms: u64) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration_ms,
            success: exit_code == 0,
            timed_out: false,
        }
    }

    /// Result of a process killed at the deadline.
    pub fn timed_out(stdout: String, stderr: String, duration_ms: u64) -> Self {
        Self {
            exit_code: TIMEOUT_EXIT_CODE,
            stdout,
            stderr,
            duration_ms,
            success: false,
            timed_out: true,
        }
    }

    /// Result of a process that never started.
    pub fn spawn_failure(command_line: &str, err: &io::Error, duration_ms: u64) -> Self {
        let exit_code = match err.kind() {
            io::ErrorKind::NotFound => SPAWN_FAILED_EXIT_CODE,
            io::ErrorKind::PermissionDenied => NOT_EXECUTABLE_EXIT_CODE,
            _ => 1,
        };
        Self::completed(
            exit_code,
            String::new(),
            format!("failed to spawn `{command_line}`: {err}"),
            duration_ms,
        )
    }
}

/// Anything that can run an [`ExecutionRequest`].
///
/// [`ProcessExecutor`] is the production implementation; tests substitute
/// scripted runners.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, request: &ExecutionRequest) -> Result<ExecutionResult>;
}

/// Spawns OS processes. Holds no state, so independent calls may run
/// concurrently.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor;

enum Settlement {
    Exited(io::Result<ExitStatus>),
    DeadlineReached,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }

    /// Run a request to completion or until its deadline.
    ///
    /// Only malformed requests and a failing `wait` produce `Err`; a command
    /// that cannot be spawned settles into a result with exit code
    /// [`SPAWN_FAILED_EXIT_CODE`] or [`NOT_EXECUTABLE_EXIT_CODE`].
    pub async fn execute(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        request.validate()?;

        let command_line = request.command_line();
        let start = Instant::now();

        let mut cmd = Command::new(&request.command);
        cmd.args(&request.args);
        cmd.stdin(Stdio::null());
        cmd.stdout(stream_mode(request.capture_output));
        cmd.stderr(stream_mode(request.capture_error));
        cmd.kill_on_drop(true);

        if let Some(dir) = &request.working_directory {
            cmd.current_dir(dir);
        }
        if let Some(env) = &request.environment {
            cmd.envs(env);
        }

        debug!(command = %command_line, timeout_ms = request.timeout.as_millis() as u64, "spawning");

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(err) => {
                warn!(command = %command_line, error = %err, "spawn failed");
                let result = ExecutionResult::spawn_failure(&command_line, &err, elapsed_ms(start));
                emit_finished(&command_line, &result);
                return Ok(result);
            }
        };

        let stdout_buf = SharedBuffer::default();
        let stderr_buf = SharedBuffer::default();
        let stdout_reader = child
            .stdout
            .take()
            .map(|pipe| tokio::spawn(drain(pipe, stdout_buf.clone())));
        let stderr_reader = child
            .stderr
            .take()
            .map(|pipe| tokio::spawn(drain(pipe, stderr_buf.clone())));

        let settlement = tokio::select! {
            status = child.wait() => Settlement::Exited(status),
            _ = tokio::time::sleep(request.timeout) => Settlement::DeadlineReached,
        };

        let exit = match settlement {
            Settlement::Exited(Ok(status)) => Some(exit_code_of(status)),
            Settlement::Exited(Err(source)) => {
                abort_reader(stdout_reader);
                abort_reader(stderr_reader);
                return Err(ExecError::Wait {
                    command: command_line,
                    source,
                });
            }
            Settlement::DeadlineReached => {
                if let Err(err) = child.kill().await {
                    // Already gone: it exited between the deadline and the kill.
                    debug!(command = %command_line, error = %err, "kill after deadline failed");
                }
                None
            }
        };

        join_reader(stdout_reader).await;
        join_reader(stderr_reader).await;

        let stdout = take_string(&stdout_buf).await;
        let stderr = take_string(&stderr_buf).await;
        let duration_ms = elapsed_ms(start);

        let result = match exit {
            Some(code) => ExecutionResult::completed(code, stdout, stderr, duration_ms),
            None => {
                warn!(
                    command = %command_line,
                    timeout_ms = request.timeout.as_millis() as u64,
                    "command timed out"
                );
                ExecutionResult::timed_out(stdout, stderr, duration_ms)
            }
        };

        emit_finished(&command_line, &result);
        Ok(result)
    }

    /// [`execute`](Self::execute) with an explicit timeout and default
    /// capture flags.
    pub async fn execute_with_timeout(
        &self,
        command: &str,
        args: &[&str],
        timeout_ms: u64,
    ) -> Result<ExecutionResult> {
        let request = ExecutionRequest::new(command)
            .args(args.iter().copied())
            .timeout_ms(timeout_ms);
        self.execute(&request).await
    }

    /// See [`crate::probe::is_command_available`].
    pub async fn is_command_available(&self, command: &str) -> bool {
        crate::probe::is_command_available(self, command, crate::probe::PROBE_TIMEOUT).await
    }

    /// See [`crate::probe::command_version`].
    pub async fn command_version(&self, command: &str) -> Option<String> {
        crate::probe::command_version(self, command, crate::probe::PROBE_TIMEOUT).await
    }
}

#[async_trait]
impl CommandRunner for ProcessExecutor {
    async fn run(&self, request: &ExecutionRequest) -> Result<ExecutionResult> {
        self.execute(request).await
    }
}

fn stream_mode(capture: bool) -> Stdio {
    if capture {
        Stdio::piped()
    } else {
        Stdio::null()
    }
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

#[cfg(unix)]
fn exit_code_of(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(-1)
}

#[cfg(not(unix))]
fn exit_code_of(status: ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

async fn drain<R>(mut pipe: R, sink: SharedBuffer)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => sink.lock().await.extend_from_slice(&chunk[..n]),
            Err(err) => {
                debug!(error = %err, "output stream closed with error");
                break;
            }
        }
    }
}

/// Wait briefly for a reader to hit EOF. A grandchild that inherited the
/// pipe can hold it open indefinitely, so the reader is aborted after
/// [`OUTPUT_GRACE`]; whatever it already read stays in the buffer.
async fn join_reader(reader: Option<JoinHandle<()>>) {
    let Some(mut handle) = reader else {
        return;
    };
    if tokio::time::timeout(OUTPUT_GRACE, &mut handle).await.is_err() {
        handle.abort();
    }
}

fn abort_reader(reader: Option<JoinHandle<()>>) {
    if let Some(handle) = reader {
        handle.abort();
    }
}

async fn take_string(buf: &SharedBuffer) -> String {
    let bytes = std::mem::take(&mut *buf.lock().await);
    String::from_utf8_lossy(&bytes).into_owned()
}

fn emit_finished(command_line: &str, result: &ExecutionResult) {
    info!(
        event = "exec.finished",
        command = %command_line,
        exit_code = result.exit_code,
        duration_ms = result.duration_ms,
        timed_out = result.timed_out,
        success = result.success,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_success_follows_exit_code() {
        let ok = ExecutionResult::completed(0, "out".into(), String::new(), 5);
        assert!(ok.success);
        assert!(!ok.timed_out);

        let failed = ExecutionResult::completed(2, String::new(), "boom".into(), 5);
        assert!(!failed.success);
    }

    #[test]
    fn test_timed_out_is_never_success() {
        let result = ExecutionResult::timed_out(String::new(), String::new(), 100);
        assert!(result.timed_out);
        assert!(!result.success);
        assert_eq!(result.exit_code, TIMEOUT_EXIT_CODE);
    }

    #[test]
    fn test_spawn_failure_codes() {
        let missing = io::Error::new(io::ErrorKind::NotFound, "No such file or directory");
        let result = ExecutionResult::spawn_failure("nope --version", &missing, 1);
        assert_eq!(result.exit_code, SPAWN_FAILED_EXIT_CODE);
        assert!(!result.success);
        assert!(result.stderr.contains("nope --version"));

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "Permission denied");
        let result = ExecutionResult::spawn_failure("./locked", &denied, 1);
        assert_eq!(result.exit_code, NOT_EXECUTABLE_EXIT_CODE);
        assert!(result.stderr.contains("Permission denied"));
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let result = ExecutionResult::completed(0, "1.2.3".into(), String::new(), 12);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["exitCode"], 0);
        assert_eq!(json["durationMs"], 12);
        assert_eq!(json["timedOut"], false);
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected_before_spawn() {
        let executor = ProcessExecutor::new();
        let err = executor
            .execute(&ExecutionRequest::new(""))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::EmptyCommand));
    }

    #[tokio::test]
    async fn test_missing_binary_settles_with_synthetic_code() {
        let executor = ProcessExecutor::new();
        let result = executor
            .execute_with_timeout("definitely-not-installed-studykit", &["--version"], 5_000)
            .await
            .unwrap();
        assert!(!result.success);
        assert_ne!(result.exit_code, 0);
        assert!(!result.timed_out);
    }
}
