//! Integration lifecycle.
//!
//! ```text
//! NotInitialized -> Initializing -> Initialized | Error
//! Initialized | Validated | Error -> Validating -> Validated | Error
//! any -> NotInitialized (reset)
//! ```
//!
//! The orchestrator owns its [`IntegrationStatus`] and mutates it through
//! `&mut self`. Share it across tasks behind `Arc<tokio::sync::Mutex<_>>`.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::config::IntegrationConfig;
use crate::error::{IntegrationError, Result};
use crate::obs;
use crate::templates::{CommandTemplateWriter, TemplateGenerator};
use crate::validator::{AvailabilityCheck, ToolValidator, ValidationOutcome, ValidationResult};

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrationPhase {
    #[default]
    NotInitialized,
    Initializing,
    Initialized,
    Validating,
    Validated,
    Error,
}

impl IntegrationPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotInitialized => "not_initialized",
            Self::Initializing => "initializing",
            Self::Initialized => "initialized",
            Self::Validating => "validating",
            Self::Validated => "validated",
            Self::Error => "error",
        }
    }

    /// Whether the lifecycle permits moving from `self` to `next`.
    ///
    /// Initialization may restart from any phase. Validation needs a phase
    /// reached after initialization.
    pub fn can_transition_to(self, next: IntegrationPhase) -> bool {
        use IntegrationPhase::*;
        match next {
            NotInitialized | Initializing => true,
            Initialized => self == Initializing,
            Validating => matches!(self, Initialized | Validating | Validated | Error),
            Validated => self == Validating,
            Error => matches!(self, Initializing | Validating),
        }
    }
}

impl fmt::Display for IntegrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the orchestrator state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationStatus {
    pub status: IntegrationPhase,
    pub is_initialized: bool,
    pub is_configured: bool,
    pub tool_available: bool,
    pub templates_generated: bool,
    pub error_count: u32,
    pub last_validation: Option<DateTime<Utc>>,
    pub last_outcome: Option<ValidationResult>,
    pub current_configuration: Option<IntegrationConfig>,
}

/// Drives the integration lifecycle over an availability backend and a
/// template generator.
pub struct IntegrationOrchestrator {
    validator: Arc<dyn AvailabilityCheck>,
    templates: Arc<dyn TemplateGenerator>,
    state: IntegrationStatus,
}

impl IntegrationOrchestrator {
    pub fn new(validator: Arc<dyn AvailabilityCheck>, templates: Arc<dyn TemplateGenerator>) -> Self {
        Self {
            validator,
            templates,
            state: IntegrationStatus::default(),
        }
    }

    /// Production wiring: real process probes and the template writer.
    pub fn for_config(config: &IntegrationConfig) -> Self {
        Self::new(
            Arc::new(ToolValidator::from_config(config)),
            Arc::new(CommandTemplateWriter::new()),
        )
    }

    /// Store `config`, probe the tool (if enabled) and generate templates.
    ///
    /// An invalid `config` is rejected before any state changes. A failed
    /// availability probe is counted but does not abort; a template failure
    /// does.
    #[instrument(skip_all, fields(template_path = %config.template_path.display()))]
    pub async fn initialize(&mut self, config: IntegrationConfig) -> Result<()> {
        config.validate()?;

        self.transition(IntegrationPhase::Initializing)?;
        self.state.current_configuration = Some(config.clone());
        self.state.is_configured = true;

        self.state.tool_available = if config.validation_enabled {
            match self.validator.is_tool_available().await {
                Ok(available) => available,
                Err(err) => {
                    self.record_failure("initialize", &err);
                    false
                }
            }
        } else {
            false
        };

        let generated = self.templates.generate_templates(&config).await;
        self.state.is_initialized = true;

        if let Err(err) = generated {
            self.state.templates_generated = false;
            self.record_failure("initialize", &err);
            self.transition(IntegrationPhase::Error)?;
            return Err(err.into());
        }
        self.state.templates_generated = true;

        let settled = if self.state.error_count > 0 {
            IntegrationPhase::Error
        } else {
            IntegrationPhase::Initialized
        };
        self.transition(settled)
    }

    /// Run a full tool validation and record its outcome.
    #[instrument(skip_all)]
    pub async fn validate(&mut self) -> Result<ValidationOutcome> {
        if !self.state.is_initialized {
            return Err(IntegrationError::NotInitialized {
                operation: "validate",
            });
        }

        self.transition(IntegrationPhase::Validating)?;
        match self.validator.validate_tool().await {
            Ok(outcome) => {
                self.state.last_validation = Some(Utc::now());
                self.state.last_outcome = Some(outcome.result);
                self.state.tool_available = outcome.is_success();
                self.transition(IntegrationPhase::Validated)?;
                let tool = self
                    .state
                    .current_configuration
                    .as_ref()
                    .map(IntegrationConfig::tool_command)
                    .unwrap_or_default();
                obs::emit_validated(tool, &outcome);
                Ok(outcome)
            }
            Err(err) => {
                self.record_failure("validate", &err);
                self.transition(IntegrationPhase::Error)?;
                Err(err.into())
            }
        }
    }

    /// Regenerate templates from the stored configuration.
    #[instrument(skip_all)]
    pub async fn generate_command_templates(&mut self) -> Result<()> {
        const OPERATION: &str = "generate command templates";

        if !self.state.is_initialized {
            return Err(IntegrationError::NotInitialized {
                operation: OPERATION,
            });
        }
        let Some(config) = self.state.current_configuration.clone() else {
            return Err(IntegrationError::NotConfigured {
                operation: OPERATION,
            });
        };

        match self.templates.generate_templates(&config).await {
            Ok(()) => {
                self.state.templates_generated = true;
                Ok(())
            }
            Err(err) => {
                self.record_failure(OPERATION, &err);
                Err(err.into())
            }
        }
    }

    pub fn status(&self) -> IntegrationStatus {
        self.state.clone()
    }

    /// Back to the all-defaults snapshot.
    pub fn reset(&mut self) {
        let previous = self.state.status;
        self.state = IntegrationStatus::default();
        obs::emit_transition(previous, IntegrationPhase::NotInitialized);
    }

    fn transition(&mut self, next: IntegrationPhase) -> Result<()> {
        let current = self.state.status;
        if !current.can_transition_to(next) {
            return Err(IntegrationError::InvalidTransition {
                from: current,
                to: next,
            });
        }
        self.state.status = next;
        obs::emit_transition(current, next);
        Ok(())
    }

    fn record_failure(&mut self, operation: &str, error: &dyn fmt::Display) {
        self.state.error_count = self.state.error_count.saturating_add(1);
        obs::emit_failure(operation, self.state.error_count, error);
    }
}

impl fmt::Debug for IntegrationOrchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationOrchestrator")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
