//! End-to-end classification of errors produced by the crate itself.

use std::path::PathBuf;

use studykit_core::{
    classify, user_friendly_message, ConfigError, ErrorCode, ErrorContext, ErrorDomain, ErrorTag,
    IntegrationConfig, IntegrationError, ValidationKind,
};

/// Test: a raw ENOENT message maps to the file-system code and tag
#[test]
fn test_enoent_read_config() {
    let classified = classify(
        &"ENOENT: no such file or directory",
        ErrorDomain::FileSystem,
        ErrorContext::new("read config"),
    );

    assert_eq!(classified.code.as_str(), "FILESYSTEM_ERROR");
    assert_eq!(classified.details.error_type.as_str(), "ENOENT");
    assert!(classified
        .suggestions
        .contains(&"Check if the file path is correct".to_string()));
}

/// Test: configuration errors from the loader classify by failure kind
#[test]
fn test_config_loader_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = IntegrationConfig::from_file(&dir.path().join("studykit.json")).unwrap_err();
    let err = IntegrationError::from(missing);
    assert_eq!(err.domain(), ErrorDomain::Configuration);
    assert_eq!(err.classify("load config").tag(), ErrorTag::LoadError);

    let broken_path = dir.path().join("broken.json");
    std::fs::write(&broken_path, "{\"timeoutMs\": }").unwrap();
    let broken = IntegrationError::from(IntegrationConfig::from_file(&broken_path).unwrap_err());
    assert_eq!(broken.classify("load config").tag(), ErrorTag::ParseError);

    let invalid = IntegrationError::from(ConfigError::Invalid {
        field: "timeoutMs",
        reason: "must be greater than zero".to_string(),
    });
    let classified = invalid.classify("initialize");
    assert_eq!(classified.code, ErrorCode::ConfigurationError);
    assert_eq!(classified.tag(), ErrorTag::ValidationError);
}

/// Test: template path problems surface as escalated file-system errors
#[test]
fn test_template_write_error_rendering() {
    let err = IntegrationError::from(studykit_core::TemplateError::CreateDir {
        path: PathBuf::from("/readonly/commands"),
        source: std::io::Error::from(std::io::ErrorKind::NotFound),
    });
    let classified = err.classify("generate command templates");
    assert_eq!(classified.tag(), ErrorTag::Enoent);
    assert!(!classified.recoverable);

    let rendered = user_friendly_message(&classified);
    assert!(rendered.contains("1. Check if the file path is correct"));
    assert!(rendered.contains("support"));
}

/// Test: validation sub-kinds follow the operation name
#[test]
fn test_validation_sub_kinds() {
    let kinds = [
        ("save config", ValidationKind::Configuration),
        ("generate command templates", ValidationKind::Template),
        ("resolve template path", ValidationKind::Template),
        ("validate", ValidationKind::General),
    ];
    for (operation, expected) in kinds {
        let classified = classify(
            &"invalid value",
            ErrorDomain::Validation,
            ErrorContext::new(operation),
        );
        assert_eq!(classified.details.validation_kind, Some(expected), "{operation}");
    }
}

/// Test: every domain yields UNKNOWN for unrecognised text
#[test]
fn test_unknown_in_every_domain() {
    for domain in ErrorDomain::ALL {
        let classified = classify(&"zzz", domain, ErrorContext::new("op"));
        assert_eq!(classified.tag(), ErrorTag::Unknown, "{domain}");
        assert_eq!(classified.code, domain.code());
        assert!(!classified.recoverable);
        assert!(!classified.suggestions.is_empty());
    }
}
