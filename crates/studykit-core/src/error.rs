//! Error types for the integration lifecycle.

use thiserror::Error;

use crate::classifier::{classify, ClassifiedError, ErrorContext, ErrorDomain};
use crate::config::ConfigError;
use crate::orchestrator::IntegrationPhase;
use crate::templates::TemplateError;
use crate::validator::ValidatorError;

/// Errors returned by [`IntegrationOrchestrator`](crate::IntegrationOrchestrator).
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error("cannot {operation}: integration is not initialized")]
    NotInitialized { operation: &'static str },

    #[error("cannot {operation}: no configuration stored")]
    NotConfigured { operation: &'static str },

    #[error("invalid lifecycle transition from {from} to {to}")]
    InvalidTransition {
        from: IntegrationPhase,
        to: IntegrationPhase,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Availability(#[from] ValidatorError),

    #[error(transparent)]
    Templates(#[from] TemplateError),
}

impl IntegrationError {
    /// Classifier domain this error belongs to.
    pub fn domain(&self) -> ErrorDomain {
        match self {
            Self::NotInitialized { .. }
            | Self::NotConfigured { .. }
            | Self::InvalidTransition { .. } => ErrorDomain::Validation,
            Self::Config(_) => ErrorDomain::Configuration,
            Self::Availability(_) => ErrorDomain::CliExecution,
            Self::Templates(_) => ErrorDomain::FileSystem,
        }
    }

    /// Precondition failures leave the orchestrator untouched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::NotInitialized { .. } | Self::NotConfigured { .. }
        )
    }

    /// Classify for presentation. Template failures are escalated.
    pub fn classify(&self, operation: &str) -> ClassifiedError {
        let classified = classify(self, self.domain(), ErrorContext::new(operation));
        match self {
            Self::Templates(_) => classified.escalated(),
            _ => classified,
        }
    }
}

pub type Result<T> = std::result::Result<T, IntegrationError>;
