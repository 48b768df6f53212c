//! Lifecycle tests for IntegrationOrchestrator with scripted collaborators.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use studykit_core::{
    AvailabilityCheck, CommandTemplateWriter, ErrorCode, IntegrationConfig, IntegrationError,
    IntegrationOrchestrator, IntegrationPhase, IntegrationStatus, TemplateError,
    TemplateGenerator, ValidationOutcome, ValidationResult, ValidatorError,
};

/// Availability backend with canned answers.
struct FakeValidator {
    available: std::result::Result<bool, String>,
    outcome: std::result::Result<ValidationResult, String>,
    calls: AtomicUsize,
}

impl FakeValidator {
    fn healthy() -> Self {
        Self {
            available: Ok(true),
            outcome: Ok(ValidationResult::Success),
            calls: AtomicUsize::new(0),
        }
    }

    fn missing() -> Self {
        Self {
            available: Ok(false),
            outcome: Ok(ValidationResult::ToolNotFound),
            calls: AtomicUsize::new(0),
        }
    }

    fn broken(reason: &str) -> Self {
        Self {
            available: Err(reason.to_string()),
            outcome: Err(reason.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    fn fail(reason: &str) -> ValidatorError {
        ValidatorError::CheckFailed {
            tool: "codex".to_string(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl AvailabilityCheck for FakeValidator {
    async fn is_tool_available(&self) -> Result<bool, ValidatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.available.clone().map_err(|r| Self::fail(&r))
    }

    async fn validate_tool(&self) -> Result<ValidationOutcome, ValidatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome
            .clone()
            .map(|result| ValidationOutcome::new(result).with_version(Some("0.21.0".into())))
            .map_err(|r| Self::fail(&r))
    }
}

/// Template generator that counts calls and optionally fails.
#[derive(Default)]
struct FakeTemplates {
    fail: bool,
    calls: AtomicUsize,
}

#[async_trait]
impl TemplateGenerator for FakeTemplates {
    async fn generate_templates(&self, _config: &IntegrationConfig) -> Result<(), TemplateError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(TemplateError::Generator("disk unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

fn orchestrator(
    validator: FakeValidator,
    templates: FakeTemplates,
) -> (IntegrationOrchestrator, Arc<FakeValidator>, Arc<FakeTemplates>) {
    let validator = Arc::new(validator);
    let templates = Arc::new(templates);
    let orchestrator = IntegrationOrchestrator::new(validator.clone(), templates.clone());
    (orchestrator, validator, templates)
}

/// Test: healthy tool and templates settle in Initialized
#[tokio::test]
async fn test_initialize_success() {
    let (mut orch, _, templates) = orchestrator(FakeValidator::healthy(), FakeTemplates::default());

    orch.initialize(IntegrationConfig::default()).await.unwrap();

    let status = orch.status();
    assert_eq!(status.status, IntegrationPhase::Initialized);
    assert!(status.is_initialized);
    assert!(status.is_configured);
    assert!(status.tool_available);
    assert!(status.templates_generated);
    assert_eq!(status.error_count, 0);
    assert_eq!(status.current_configuration, Some(IntegrationConfig::default()));
    assert_eq!(templates.calls.load(Ordering::SeqCst), 1);
}

/// Test: a failing availability check is counted and ends in Error
#[tokio::test]
async fn test_initialize_with_throwing_validator_ends_in_error() {
    let (mut orch, _, templates) =
        orchestrator(FakeValidator::broken("probe crashed"), FakeTemplates::default());

    orch.initialize(IntegrationConfig::default()).await.unwrap();

    let status = orch.status();
    assert_eq!(status.status, IntegrationPhase::Error);
    assert!(status.error_count >= 1);
    assert!(status.is_initialized);
    assert!(!status.tool_available);
    assert!(status.templates_generated);
    assert_eq!(templates.calls.load(Ordering::SeqCst), 1);
}

/// Test: disabling validation skips the probe
#[tokio::test]
async fn test_initialize_without_validation_skips_probe() {
    let (mut orch, validator, _) = orchestrator(FakeValidator::healthy(), FakeTemplates::default());
    let config = IntegrationConfig {
        validation_enabled: false,
        ..Default::default()
    };

    orch.initialize(config).await.unwrap();

    assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
    let status = orch.status();
    assert!(!status.tool_available);
    assert_eq!(status.status, IntegrationPhase::Initialized);
}

/// Test: template failure is returned and leaves the orchestrator in Error
#[tokio::test]
async fn test_initialize_template_failure() {
    let (mut orch, _, _) = orchestrator(
        FakeValidator::healthy(),
        FakeTemplates {
            fail: true,
            ..Default::default()
        },
    );

    let err = orch.initialize(IntegrationConfig::default()).await.unwrap_err();
    assert!(matches!(err, IntegrationError::Templates(_)));

    let classified = err.classify("initialize");
    assert_eq!(classified.code, ErrorCode::FilesystemError);
    assert!(!classified.recoverable);

    let status = orch.status();
    assert_eq!(status.status, IntegrationPhase::Error);
    assert_eq!(status.error_count, 1);
    assert!(status.is_initialized);
    assert!(!status.templates_generated);
}

/// Test: an invalid configuration is rejected without touching state
#[tokio::test]
async fn test_initialize_rejects_invalid_config() {
    let (mut orch, validator, templates) =
        orchestrator(FakeValidator::healthy(), FakeTemplates::default());
    let config = IntegrationConfig {
        timeout_ms: 0,
        ..Default::default()
    };

    let err = orch.initialize(config).await.unwrap_err();
    assert!(matches!(err, IntegrationError::Config(_)));
    assert_eq!(orch.status(), IntegrationStatus::default());
    assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
    assert_eq!(templates.calls.load(Ordering::SeqCst), 0);
}

/// Test: validate records the outcome and settles in Validated
#[tokio::test]
async fn test_validate_records_outcome() {
    let (mut orch, _, _) = orchestrator(FakeValidator::missing(), FakeTemplates::default());
    orch.initialize(IntegrationConfig::default()).await.unwrap();

    let outcome = orch.validate().await.unwrap();
    assert_eq!(outcome.result, ValidationResult::ToolNotFound);

    let status = orch.status();
    assert_eq!(status.status, IntegrationPhase::Validated);
    assert_eq!(status.last_outcome, Some(ValidationResult::ToolNotFound));
    assert!(status.last_validation.is_some());
    assert!(!status.tool_available);
}

/// Test: a validator error during validate is counted and returned
#[tokio::test]
async fn test_validate_error_moves_to_error() {
    let validator = FakeValidator {
        available: Ok(true),
        outcome: Err("backend exploded".to_string()),
        calls: AtomicUsize::new(0),
    };
    let (mut orch, _, _) = orchestrator(validator, FakeTemplates::default());
    orch.initialize(IntegrationConfig::default()).await.unwrap();

    let err = orch.validate().await.unwrap_err();
    assert!(matches!(err, IntegrationError::Availability(_)));

    let status = orch.status();
    assert_eq!(status.status, IntegrationPhase::Error);
    assert_eq!(status.error_count, 1);
    assert!(status.last_validation.is_none());
}

/// Test: validate before initialize is a precondition error with no mutation
#[tokio::test]
async fn test_validate_requires_initialize() {
    let (mut orch, validator, _) = orchestrator(FakeValidator::healthy(), FakeTemplates::default());

    let err = orch.validate().await.unwrap_err();
    assert!(err.is_precondition());
    assert_eq!(orch.status(), IntegrationStatus::default());
    assert_eq!(validator.calls.load(Ordering::SeqCst), 0);
}

/// Test: generating templates before initialize fails and changes nothing
#[tokio::test]
async fn test_generate_templates_requires_initialize() {
    let (mut orch, _, templates) = orchestrator(FakeValidator::healthy(), FakeTemplates::default());

    let err = orch.generate_command_templates().await.unwrap_err();
    assert!(matches!(err, IntegrationError::NotInitialized { .. }));
    assert_eq!(err.classify("generate command templates").code, ErrorCode::ValidationError);
    assert_eq!(orch.status(), IntegrationStatus::default());
    assert_eq!(templates.calls.load(Ordering::SeqCst), 0);
}

/// Test: regeneration after initialize calls the generator again
#[tokio::test]
async fn test_generate_templates_after_initialize() {
    let (mut orch, _, templates) = orchestrator(FakeValidator::healthy(), FakeTemplates::default());
    orch.initialize(IntegrationConfig::default()).await.unwrap();

    orch.generate_command_templates().await.unwrap();

    assert_eq!(templates.calls.load(Ordering::SeqCst), 2);
    assert!(orch.status().templates_generated);
}

/// Test: reset from Error restores the all-defaults snapshot
#[tokio::test]
async fn test_reset_after_error_restores_defaults() {
    let (mut orch, _, _) = orchestrator(FakeValidator::broken("probe crashed"), FakeTemplates::default());
    orch.initialize(IntegrationConfig::default()).await.unwrap();
    assert_eq!(orch.status().status, IntegrationPhase::Error);

    orch.reset();

    assert_eq!(orch.status(), IntegrationStatus::default());
}

/// Test: the orchestrator can be driven from several tasks behind a mutex
#[tokio::test]
async fn test_shared_orchestrator_behind_mutex() {
    let (orch, validator, _) = orchestrator(FakeValidator::healthy(), FakeTemplates::default());
    let shared = Arc::new(tokio::sync::Mutex::new(orch));

    shared
        .lock()
        .await
        .initialize(IntegrationConfig::default())
        .await
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let shared = shared.clone();
            tokio::spawn(async move { shared.lock().await.validate().await })
        })
        .collect();
    for handle in handles {
        let outcome = handle.await.unwrap().unwrap();
        assert!(outcome.is_success());
    }

    let status = shared.lock().await.status();
    assert_eq!(status.status, IntegrationPhase::Validated);
    assert_eq!(status.error_count, 0);
    // one availability probe plus four validations
    assert_eq!(validator.calls.load(Ordering::SeqCst), 5);
}

/// Test: production wiring writes real template files
#[tokio::test]
async fn test_for_config_writes_templates() {
    let tmp = tempfile::tempdir().unwrap();
    let config = IntegrationConfig {
        cli_path: Some("definitely-not-installed-studykit-tool".to_string()),
        template_path: tmp.path().join("commands"),
        timeout_ms: 2_000,
        ..Default::default()
    };
    let mut orch = IntegrationOrchestrator::for_config(&config);

    orch.initialize(config).await.unwrap();

    let status = orch.status();
    assert!(status.templates_generated);
    assert!(!status.tool_available);
    for path in CommandTemplateWriter::planned_paths(&tmp.path().join("commands")) {
        assert!(path.exists(), "missing {}", path.display());
    }
}
