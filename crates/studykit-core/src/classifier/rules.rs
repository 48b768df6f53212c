//! Static classification tables.
//!
//! Each domain has an ordered list of rules. Rules are checked top to bottom
//! against the lower-cased error message; the first rule with a matching
//! pattern wins.

use super::{ErrorDomain, ErrorTag, ValidationKind};

/// One row of a classification table.
#[derive(Debug, Clone, Copy)]
pub struct ClassificationRule {
    /// Lower-case substrings, any of which selects this rule.
    pub patterns: &'static [&'static str],
    pub tag: ErrorTag,
    pub suggestions: &'static [&'static str],
    pub recoverable: bool,
}

impl ClassificationRule {
    pub fn matches(&self, lowered: &str) -> bool {
        self.patterns.iter().any(|pattern| lowered.contains(pattern))
    }
}

pub static FILE_SYSTEM_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        patterns: &["enoent", "no such file", "not found"],
        tag: ErrorTag::Enoent,
        suggestions: &[
            "Check if the file path is correct",
            "Ensure the parent directory exists",
            "Verify the file has not been moved or deleted",
        ],
        recoverable: true,
    },
    ClassificationRule {
        patterns: &["eacces", "permission denied", "access is denied", "eperm"],
        tag: ErrorTag::Eacces,
        suggestions: &[
            "Check file and directory permissions",
            "Ensure the current user can write to the location",
            "Run with appropriate privileges",
        ],
        recoverable: true,
    },
    ClassificationRule {
        patterns: &["enospc", "no space left"],
        tag: ErrorTag::Enospc,
        suggestions: &[
            "Free up disk space",
            "Choose a different output location",
        ],
        recoverable: true,
    },
    ClassificationRule {
        patterns: &["eisdir", "is a directory"],
        tag: ErrorTag::Eisdir,
        suggestions: &[
            "Provide a file path instead of a directory",
            "Check the configured template path",
        ],
        recoverable: true,
    },
    ClassificationRule {
        patterns: &["enotdir", "not a directory"],
        tag: ErrorTag::Enotdir,
        suggestions: &[
            "Ensure every parent component of the path is a directory",
            "Check the configured template path",
        ],
        recoverable: true,
    },
    ClassificationRule {
        patterns: &["eexist", "already exists"],
        tag: ErrorTag::Eexist,
        suggestions: &[
            "Remove or rename the existing file",
            "Choose a different path",
        ],
        recoverable: true,
    },
];

pub static CLI_EXECUTION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        patterns: &["timeout", "timed out"],
        tag: ErrorTag::Timeout,
        suggestions: &[
            "Increase the timeout",
            "Check system load",
            "Retry the command",
        ],
        recoverable: true,
    },
    ClassificationRule {
        patterns: &["permission denied", "eacces", "not permitted"],
        tag: ErrorTag::PermissionDenied,
        suggestions: &[
            "Check that the tool is executable",
            "Run with elevated privileges",
            "Verify user permissions",
        ],
        recoverable: true,
    },
    ClassificationRule {
        patterns: &["not found", "enoent", "no such file", "not recognized"],
        tag: ErrorTag::CommandNotFound,
        suggestions: &[
            "Install the tool",
            "Add the tool to PATH",
            "Set cliPath to the tool's location",
        ],
        recoverable: true,
    },
    ClassificationRule {
        patterns: &["failed", "exit code", "exited with", "error"],
        tag: ErrorTag::ExecutionFailed,
        suggestions: &[
            "Check the command output for details",
            "Verify the tool installation",
            "Run with --verbose for more information",
        ],
        recoverable: true,
    },
];

pub static VALIDATION_RULES: &[ClassificationRule] = &[ClassificationRule {
    patterns: &[
        "invalid",
        "validation",
        "required",
        "must",
        "missing",
        "not initialized",
        "no configuration",
        "cannot",
    ],
    tag: ErrorTag::ValidationFailed,
    suggestions: GENERAL_VALIDATION_SUGGESTIONS,
    recoverable: true,
}];

pub static CONFIGURATION_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        patterns: &["parse", "syntax", "expected"],
        tag: ErrorTag::ParseError,
        suggestions: &[
            "Check the configuration file for JSON syntax errors",
            "Validate the file with a JSON linter",
            "Restore the configuration from a backup",
        ],
        recoverable: true,
    },
    ClassificationRule {
        patterns: &["save", "write"],
        tag: ErrorTag::SaveError,
        suggestions: &[
            "Check write permissions for the configuration directory",
            "Ensure there is enough disk space",
        ],
        recoverable: true,
    },
    ClassificationRule {
        patterns: &["load", "read", "open"],
        tag: ErrorTag::LoadError,
        suggestions: &[
            "Check that the configuration file exists",
            "Check read permissions for the configuration file",
            "Remove the --config flag to use defaults",
        ],
        recoverable: true,
    },
    ClassificationRule {
        patterns: &["invalid", "must", "required"],
        tag: ErrorTag::ValidationError,
        suggestions: &[
            "Review the configuration values",
            "Compare the configuration with the documented schema",
            "Reset the configuration to defaults",
        ],
        recoverable: true,
    },
];

/// Fallback for messages no rule recognises.
pub const UNKNOWN_SUGGESTIONS: &[&str] = &[
    "Check the error details above",
    "Retry the operation",
    "Run with --verbose for more information",
];

const GENERAL_VALIDATION_SUGGESTIONS: &[&str] = &[
    "Check the input values",
    "Initialize the integration before using it",
    "Review the integration status",
];

pub fn rules_for(domain: ErrorDomain) -> &'static [ClassificationRule] {
    match domain {
        ErrorDomain::FileSystem => FILE_SYSTEM_RULES,
        ErrorDomain::CliExecution => CLI_EXECUTION_RULES,
        ErrorDomain::Validation => VALIDATION_RULES,
        ErrorDomain::Configuration => CONFIGURATION_RULES,
    }
}

/// First rule in `rules` matching `message`, ignoring case.
pub fn first_match(
    rules: &'static [ClassificationRule],
    message: &str,
) -> Option<&'static ClassificationRule> {
    let lowered = message.to_lowercase();
    rules.iter().find(|rule| rule.matches(&lowered))
}

/// Sub-kind of a validation failure, picked from the operation name.
pub fn validation_kind(operation: &str) -> ValidationKind {
    let lowered = operation.to_lowercase();
    if lowered.contains("config") {
        ValidationKind::Configuration
    } else if lowered.contains("template") {
        ValidationKind::Template
    } else if lowered.contains("path") {
        ValidationKind::Path
    } else if lowered.contains("required") || lowered.contains("field") {
        ValidationKind::RequiredField
    } else {
        ValidationKind::General
    }
}

pub fn validation_suggestions(kind: ValidationKind) -> &'static [&'static str] {
    match kind {
        ValidationKind::Configuration => &[
            "Check the configuration values",
            "Run `studykit init` to recreate the configuration",
            "Compare the configuration with the documented schema",
        ],
        ValidationKind::Template => &[
            "Initialize the integration before generating templates",
            "Check the template path",
            "Regenerate the command templates",
        ],
        ValidationKind::Path => &[
            "Check that the path exists",
            "Use an absolute path",
            "Verify the path is accessible",
        ],
        ValidationKind::RequiredField => &[
            "Provide all required fields",
            "Check for empty values",
        ],
        ValidationKind::General => GENERAL_VALIDATION_SUGGESTIONS,
    }
}
