//! Error classification.
//!
//! Maps a raw error plus its domain to a [`ClassifiedError`]: a stable code,
//! a tag, ordered remediation suggestions and a recoverability flag.
//! Classification never fails and is deterministic apart from the timestamp.

mod message;
pub mod rules;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use message::user_friendly_message;
pub use rules::ClassificationRule;

/// Area an error originated in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorDomain {
    FileSystem,
    CliExecution,
    Validation,
    Configuration,
}

impl ErrorDomain {
    pub const ALL: [ErrorDomain; 4] = [
        Self::FileSystem,
        Self::CliExecution,
        Self::Validation,
        Self::Configuration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FileSystem => "file-system",
            Self::CliExecution => "cli-execution",
            Self::Validation => "validation",
            Self::Configuration => "configuration",
        }
    }

    pub fn code(self) -> ErrorCode {
        match self {
            Self::FileSystem => ErrorCode::FilesystemError,
            Self::CliExecution => ErrorCode::CliExecutionError,
            Self::Validation => ErrorCode::ValidationError,
            Self::Configuration => ErrorCode::ConfigurationError,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::FileSystem => "File system",
            Self::CliExecution => "CLI execution",
            Self::Validation => "Validation",
            Self::Configuration => "Configuration",
        }
    }
}

impl fmt::Display for ErrorDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorDomain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|domain| domain.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown error domain '{}' (expected one of: file-system, cli-execution, validation, configuration)",
                    s
                )
            })
    }
}

/// Domain-level error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    FilesystemError,
    CliExecutionError,
    ValidationError,
    ConfigurationError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FilesystemError => "FILESYSTEM_ERROR",
            Self::CliExecutionError => "CLI_EXECUTION_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::ConfigurationError => "CONFIGURATION_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Specific error kind within a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorTag {
    // file-system
    Enoent,
    Eacces,
    Enospc,
    Eisdir,
    Enotdir,
    Eexist,
    // cli-execution
    CommandNotFound,
    Timeout,
    ExecutionFailed,
    PermissionDenied,
    // validation
    ValidationFailed,
    // configuration
    ParseError,
    SaveError,
    LoadError,
    ValidationError,
    Unknown,
}

impl ErrorTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enoent => "ENOENT",
            Self::Eacces => "EACCES",
            Self::Enospc => "ENOSPC",
            Self::Eisdir => "EISDIR",
            Self::Enotdir => "ENOTDIR",
            Self::Eexist => "EEXIST",
            Self::CommandNotFound => "COMMAND_NOT_FOUND",
            Self::Timeout => "TIMEOUT",
            Self::ExecutionFailed => "EXECUTION_FAILED",
            Self::PermissionDenied => "PERMISSION_DENIED",
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::ParseError => "PARSE_ERROR",
            Self::SaveError => "SAVE_ERROR",
            Self::LoadError => "LOAD_ERROR",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ErrorTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-kind of a `VALIDATION_FAILED` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationKind {
    Configuration,
    Template,
    Path,
    RequiredField,
    General,
}

/// Where the error happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorContext {
    pub operation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<serde_json::Value>,
}

impl ErrorContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            command: None,
            config: None,
        }
    }

    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Attach a snapshot of the configuration in effect.
    pub fn with_config<T: Serialize>(mut self, config: &T) -> Self {
        self.config = serde_json::to_value(config).ok();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    pub error_type: ErrorTag,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_kind: Option<ValidationKind>,
    pub original_message: String,
}

/// Structured, user-presentable error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedError {
    pub code: ErrorCode,
    pub message: String,
    pub domain: ErrorDomain,
    pub details: ErrorDetails,
    pub context: ErrorContext,
    pub suggestions: Vec<String>,
    pub recoverable: bool,
    pub timestamp: DateTime<Utc>,
}

impl ClassifiedError {
    /// Same error, marked as needing escalation.
    pub fn escalated(mut self) -> Self {
        self.recoverable = false;
        self
    }

    pub fn tag(&self) -> ErrorTag {
        self.details.error_type
    }
}

/// Classify `error` raised in `domain` during `context.operation`.
pub fn classify(error: &dyn fmt::Display, domain: ErrorDomain, context: ErrorContext) -> ClassifiedError {
    let original_message = error.to_string();

    let (tag, suggestions, recoverable, validation_kind) =
        match rules::first_match(rules::rules_for(domain), &original_message) {
            Some(rule) if rule.tag == ErrorTag::ValidationFailed => {
                let kind = rules::validation_kind(&context.operation);
                (rule.tag, rules::validation_suggestions(kind), rule.recoverable, Some(kind))
            }
            Some(rule) => (rule.tag, rule.suggestions, rule.recoverable, None),
            None => (ErrorTag::Unknown, rules::UNKNOWN_SUGGESTIONS, false, None),
        };

    let message = format!(
        "{} error during {}: {}",
        domain.label(),
        context.operation,
        original_message
    );

    ClassifiedError {
        code: domain.code(),
        message,
        domain,
        details: ErrorDetails {
            error_type: tag,
            validation_kind,
            original_message,
        },
        context,
        suggestions: suggestions.iter().map(|s| s.to_string()).collect(),
        recoverable,
        timestamp: Utc::now(),
    }
}
