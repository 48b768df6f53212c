//! Execution request definition.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ExecError, Result};

/// Default deadline for a single execution.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// A single command invocation. Built per call and consumed by the executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionRequest {
    /// Program to run (looked up on `PATH` when not a path).
    pub command: String,

    /// Ordered arguments.
    pub args: Vec<String>,

    /// Working directory for the child (inherits when `None`).
    pub working_directory: Option<PathBuf>,

    /// Extra environment variables layered over the inherited environment.
    pub environment: Option<BTreeMap<String, String>>,

    /// Deadline after which the child is killed.
    pub timeout: Duration,

    /// Capture stdout (discarded otherwise).
    pub capture_output: bool,

    /// Capture stderr (discarded otherwise).
    pub capture_error: bool,
}

impl ExecutionRequest {
    /// Create a request with default timeout and both streams captured.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            working_directory: None,
            environment: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            capture_output: true,
            capture_error: true,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_directory = Some(dir.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout_ms(self, timeout_ms: u64) -> Self {
        self.timeout(Duration::from_millis(timeout_ms))
    }

    pub fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    pub fn capture_error(mut self, capture: bool) -> Self {
        self.capture_error = capture;
        self
    }

    /// Human-readable command line, used in logs and error messages.
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.command.clone()
        } else {
            format!("{} {}", self.command, self.args.join(" "))
        }
    }

    /// Reject requests that can never run.
    pub fn validate(&self) -> Result<()> {
        if self.command.trim().is_empty() {
            return Err(ExecError::EmptyCommand);
        }
        if self.timeout.is_zero() {
            return Err(ExecError::ZeroTimeout {
                command: self.command_line(),
            });
        }
        Ok(())
    }
}
