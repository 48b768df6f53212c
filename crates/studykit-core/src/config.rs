//! Integration configuration.
//!
//! Precedence, lowest first: [`IntegrationConfig::default`], a JSON file
//! ([`IntegrationConfig::from_file`]), environment overrides
//! ([`IntegrationConfig::apply_env`]), then whatever the caller sets
//! explicitly. [`IntegrationConfig::validate`] runs last.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tool invoked when `cliPath` is not configured.
pub const DEFAULT_TOOL: &str = "codex";

/// Where command templates are written by default.
pub const DEFAULT_TEMPLATE_PATH: &str = ".studykit/commands";

pub const DEFAULT_TIMEOUT_MS: u64 = studykit_exec::DEFAULT_TIMEOUT_MS;

/// Overrides `cliPath`.
pub const ENV_CLI_PATH: &str = "STUDYKIT_CLI_PATH";

/// Overrides `timeoutMs`.
pub const ENV_TIMEOUT_MS: &str = "STUDYKIT_TIMEOUT_MS";

/// Configuration errors. Load and parse failures keep the offending path.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration from {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {field} {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("invalid configuration: {key}={value} must be a positive integer")]
    InvalidEnv { key: &'static str, value: String },
}

/// Settings for bridging to the external agent CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntegrationConfig {
    /// Master switch for the integration.
    pub enabled: bool,

    /// Explicit tool command or path (defaults to [`DEFAULT_TOOL`]).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cli_path: Option<String>,

    /// Probe the tool during initialization.
    pub validation_enabled: bool,

    /// Use the generated custom commands when the tool is unavailable.
    pub fallback_to_custom: bool,

    /// Directory receiving generated command templates.
    pub template_path: PathBuf,

    /// Deadline for each tool invocation.
    pub timeout_ms: u64,
}

impl Default for IntegrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cli_path: None,
            validation_enabled: true,
            fallback_to_custom: false,
            template_path: PathBuf::from(DEFAULT_TEMPLATE_PATH),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl IntegrationConfig {
    /// Read a JSON configuration file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Load {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup (the environment in
    /// production, a map in tests).
    pub fn apply_env_from<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(cli_path) = lookup(ENV_CLI_PATH) {
            let trimmed = cli_path.trim();
            if !trimmed.is_empty() {
                self.cli_path = Some(trimmed.to_string());
            }
        }

        if let Some(raw) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        key: ENV_TIMEOUT_MS,
                        value: raw,
                    })
                }
            };
        }

        Ok(self)
    }

    /// Schema checks: non-empty `cliPath` when present, non-empty
    /// `templatePath`, positive `timeoutMs`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(cli_path) = &self.cli_path {
            if cli_path.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field: "cliPath",
                    reason: "must not be empty when present".to_string(),
                });
            }
        }

        if self.template_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                field: "templatePath",
                reason: "is required and must not be empty".to_string(),
            });
        }

        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "timeoutMs",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    /// Command used to invoke the tool.
    pub fn tool_command(&self) -> &str {
        self.cli_path.as_deref().unwrap_or(DEFAULT_TOOL)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = IntegrationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tool_command(), "codex");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: IntegrationConfig =
            serde_json::from_str(r#"{"cliPath": "/opt/bin/codex", "timeoutMs": 5000}"#).unwrap();
        assert_eq!(config.tool_command(), "/opt/bin/codex");
        assert_eq!(config.timeout_ms, 5000);
        assert!(config.validation_enabled);
        assert_eq!(config.template_path, PathBuf::from(DEFAULT_TEMPLATE_PATH));
    }

    #[test]
    fn test_serializes_camel_case_without_missing_cli_path() {
        let json = serde_json::to_value(IntegrationConfig::default()).unwrap();
        assert_eq!(json["validationEnabled"], true);
        assert_eq!(json["fallbackToCustom"], false);
        assert!(json.get("cliPath").is_none());
    }

    #[test]
    fn test_validate_rejects_blank_cli_path() {
        let config = IntegrationConfig {
            cli_path: Some("  ".to_string()),
            ..Default::default()
        };
        match config.validate().unwrap_err() {
            ConfigError::Invalid { field, .. } => assert_eq!(field, "cliPath"),
            other => panic!("expected Invalid, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_empty_template_path() {
        let config = IntegrationConfig {
            template_path: PathBuf::new(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("templatePath"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = IntegrationConfig {
            timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().to_string().contains("timeoutMs"));
    }

    #[test]
    fn test_env_overrides() {
        let config = IntegrationConfig::default()
            .apply_env_from(lookup(&[
                (ENV_CLI_PATH, " /usr/local/bin/codex "),
                (ENV_TIMEOUT_MS, "1500"),
            ]))
            .unwrap();
        assert_eq!(config.cli_path.as_deref(), Some("/usr/local/bin/codex"));
        assert_eq!(config.timeout_ms, 1500);
    }

    #[test]
    fn test_env_rejects_bad_timeout() {
        let err = IntegrationConfig::default()
            .apply_env_from(lookup(&[(ENV_TIMEOUT_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { .. }));
    }

    #[test]
    fn test_from_file_errors_keep_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let err = IntegrationConfig::from_file(&missing).unwrap_err();
        assert!(matches!(err, ConfigError::Load { .. }));
        assert!(err.to_string().contains("missing.json"));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        let err = IntegrationConfig::from_file(&broken).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
