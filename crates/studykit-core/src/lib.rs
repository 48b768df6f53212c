//! studykit-core - agent CLI integration for the research workflow
//!
//! Bridges the studykit research commands to an external agent CLI:
//! - availability validation of the tool (presence, path, version)
//! - classification of failures into codes, suggestions and recoverability
//! - an orchestrated lifecycle (initialize, validate, generate templates)
//! - tracing setup and structured lifecycle events

pub mod classifier;
pub mod config;
pub mod error;
pub mod obs;
pub mod orchestrator;
pub mod telemetry;
pub mod templates;
pub mod validator;

pub use classifier::{
    classify, user_friendly_message, ClassifiedError, ErrorCode, ErrorContext, ErrorDomain,
    ErrorTag, ValidationKind,
};
pub use config::{ConfigError, IntegrationConfig, DEFAULT_TOOL};
pub use error::{IntegrationError, Result};
pub use orchestrator::{IntegrationOrchestrator, IntegrationPhase, IntegrationStatus};
pub use telemetry::{init_tracing, LogFormat};
pub use templates::{CommandTemplateWriter, TemplateError, TemplateGenerator};
pub use validator::{
    AvailabilityCheck, ToolValidator, ValidationOutcome, ValidationResult, ValidatorError,
};

pub use studykit_exec as exec;
