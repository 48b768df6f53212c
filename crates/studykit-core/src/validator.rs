//! Tool availability validation.
//!
//! [`ToolValidator`] answers "is the agent CLI installed, where, which
//! version" by probing it through a [`CommandRunner`]. The answer is always a
//! [`ValidationOutcome`]; probe failures become outcome kinds, not errors.

use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use studykit_exec::{
    command_version, is_command_available, locate_command, CommandRunner, ExecutionRequest,
    ExecutionResult, ProcessExecutor, TIMEOUT_EXIT_CODE,
};
use thiserror::Error;
use tracing::debug;

use crate::config::IntegrationConfig;

static VERSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+\.\d+\.\d+").expect("version pattern is valid"));

static TIMEOUT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)timeout|timed out").expect("timeout pattern is valid"));

static PERMISSION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)permission denied").expect("permission pattern is valid"));

/// EACCES as reported by some wrappers through their exit status.
const PERMISSION_EXIT_CODE: i32 = 13;

const NOT_FOUND_SUGGESTIONS: &[&str] = &[
    "Install the tool",
    "Add the tool to PATH",
    "Restart your terminal/IDE",
];

const INVALID_SUGGESTIONS: &[&str] = &[
    "Check installation",
    "Verify configuration",
    "Try reinstalling",
];

const PERMISSION_SUGGESTIONS: &[&str] = &[
    "Check file permissions",
    "Run with elevated privileges",
    "Verify user permissions",
];

const TIMEOUT_SUGGESTIONS: &[&str] = &[
    "Increase the timeout",
    "Check system load",
    "Retry the validation",
];

const UNKNOWN_SUGGESTIONS: &[&str] = &[
    "Check the tool installation",
    "Run with --verbose for details",
    "Retry the validation",
];

/// Errors from an availability backend.
#[derive(Debug, Error)]
pub enum ValidatorError {
    #[error("availability check for {tool} failed: {reason}")]
    CheckFailed { tool: String, reason: String },
}

/// Verdict of a validation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationResult {
    Success,
    ToolNotFound,
    ToolInvalid,
    PermissionDenied,
    Timeout,
    UnknownError,
}

impl ValidationResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ToolNotFound => "tool_not_found",
            Self::ToolInvalid => "tool_invalid",
            Self::PermissionDenied => "permission_denied",
            Self::Timeout => "timeout",
            Self::UnknownError => "unknown_error",
        }
    }

    /// Remediation steps shown with this verdict.
    pub fn suggestions(self) -> &'static [&'static str] {
        match self {
            Self::Success => &[],
            Self::ToolNotFound => NOT_FOUND_SUGGESTIONS,
            Self::ToolInvalid => INVALID_SUGGESTIONS,
            Self::PermissionDenied => PERMISSION_SUGGESTIONS,
            Self::Timeout => TIMEOUT_SUGGESTIONS,
            Self::UnknownError => UNKNOWN_SUGGESTIONS,
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of [`AvailabilityCheck::validate_tool`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationOutcome {
    pub result: ValidationResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ValidationOutcome {
    /// Outcome carrying the verdict's standard suggestions.
    pub fn new(result: ValidationResult) -> Self {
        Self {
            result,
            tool_path: None,
            version: None,
            message: None,
            suggestions: result.suggestions().iter().map(|s| s.to_string()).collect(),
            timestamp: Utc::now(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_tool_path(mut self, tool_path: Option<String>) -> Self {
        self.tool_path = tool_path;
        self
    }

    pub fn with_version(mut self, version: Option<String>) -> Self {
        self.version = version;
        self
    }

    pub fn is_success(&self) -> bool {
        self.result == ValidationResult::Success
    }
}

/// Availability backend used by the orchestrator.
#[async_trait]
pub trait AvailabilityCheck: Send + Sync {
    async fn is_tool_available(&self) -> Result<bool, ValidatorError>;

    async fn validate_tool(&self) -> Result<ValidationOutcome, ValidatorError>;
}

/// Probes a CLI tool through a [`CommandRunner`].
#[derive(Debug, Clone)]
pub struct ToolValidator<R = ProcessExecutor> {
    runner: R,
    tool: String,
    timeout: Duration,
}

impl ToolValidator<ProcessExecutor> {
    /// Validator for the tool named by `config` (`cliPath`, else the default tool).
    pub fn from_config(config: &IntegrationConfig) -> Self {
        Self::with_runner(ProcessExecutor::new(), config.tool_command(), config.timeout())
    }
}

impl<R: CommandRunner> ToolValidator<R> {
    pub fn with_runner(runner: R, tool: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            tool: tool.into(),
            timeout,
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Resolved path of the tool, via `which`/`where`.
    pub async fn tool_path(&self) -> Option<String> {
        locate_command(&self.runner, &self.tool, self.timeout).await
    }

    /// Semantic version reported by `<tool> --version`.
    pub async fn tool_version(&self) -> Option<String> {
        let raw = command_version(&self.runner, &self.tool, self.timeout).await?;
        extract_version(&raw)
    }

    pub async fn check_available(&self) -> bool {
        is_command_available(&self.runner, &self.tool, self.timeout).await
    }

    /// Full validation. Never fails; runner errors become
    /// [`ValidationResult::UnknownError`].
    pub async fn validate(&self) -> ValidationOutcome {
        if !self.check_available().await {
            return ValidationOutcome::new(ValidationResult::ToolNotFound)
                .with_message(format!("{} was not found on PATH", self.tool));
        }

        let probe = ExecutionRequest::new(&self.tool)
            .arg("--version")
            .timeout(self.timeout);
        let result = match self.runner.run(&probe).await {
            Ok(result) => result,
            Err(err) => {
                debug!(tool = %self.tool, error = %err, "version probe errored");
                return ValidationOutcome::new(ValidationResult::UnknownError)
                    .with_message(err.to_string());
            }
        };

        let verdict = verdict_for(&result);
        debug!(tool = %self.tool, exit_code = result.exit_code, verdict = %verdict, "version probe settled");

        match verdict {
            ValidationResult::Success => {
                let tool_path = self.tool_path().await;
                let version = self.tool_version().await;
                let message = match &version {
                    Some(version) => format!("{} {} is available", self.tool, version),
                    None => format!("{} is available", self.tool),
                };
                ValidationOutcome::new(verdict)
                    .with_tool_path(tool_path)
                    .with_version(version)
                    .with_message(message)
            }
            ValidationResult::Timeout => ValidationOutcome::new(verdict).with_message(format!(
                "{} --version did not finish within {} ms",
                self.tool,
                self.timeout.as_millis()
            )),
            ValidationResult::PermissionDenied => ValidationOutcome::new(verdict)
                .with_message(format!("permission denied while running {}", self.tool)),
            _ => {
                let detail = first_line(&result.stderr)
                    .or_else(|| first_line(&result.stdout))
                    .unwrap_or("no output");
                ValidationOutcome::new(verdict).with_message(format!(
                    "{} --version exited with code {}: {}",
                    self.tool, result.exit_code, detail
                ))
            }
        }
    }
}

#[async_trait]
impl<R: CommandRunner> AvailabilityCheck for ToolValidator<R> {
    async fn is_tool_available(&self) -> Result<bool, ValidatorError> {
        Ok(self.check_available().await)
    }

    async fn validate_tool(&self) -> Result<ValidationOutcome, ValidatorError> {
        Ok(self.validate().await)
    }
}

/// Verdict for a settled version probe. Timeouts win over permission
/// problems, which win over a plain non-zero exit.
pub fn verdict_for(result: &ExecutionResult) -> ValidationResult {
    if result.success {
        return ValidationResult::Success;
    }
    if result.timed_out
        || result.exit_code == TIMEOUT_EXIT_CODE
        || TIMEOUT_PATTERN.is_match(&result.stderr)
    {
        return ValidationResult::Timeout;
    }
    if result.exit_code == PERMISSION_EXIT_CODE || PERMISSION_PATTERN.is_match(&result.stderr) {
        return ValidationResult::PermissionDenied;
    }
    ValidationResult::ToolInvalid
}

/// First `major.minor.patch` in `text`.
pub fn extract_version(text: &str) -> Option<String> {
    VERSION_PATTERN.find(text).map(|m| m.as_str().to_string())
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}
