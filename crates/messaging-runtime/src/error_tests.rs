//! Tests for queue error types.

use super::*;

#[test]
fn test_unsupported_display() {
    let error = QueueError::Unsupported {
        operation: "peek_batch".to_string(),
        queue: "orders".to_string(),
    };

    assert_eq!(
        error.to_string(),
        "Operation 'peek_batch' is not supported by queue 'orders'"
    );
}

#[test]
fn test_config_error_conversion() {
    let error: QueueError = ConfigError::MissingName.into();

    assert!(matches!(
        error,
        QueueError::Config(ConfigError::MissingName)
    ));
    assert!(error.to_string().contains("name is not defined"));
}

#[test]
fn test_invalid_descriptor_display() {
    let error = ConfigError::InvalidDescriptor {
        descriptor: "a:b".to_string(),
    };

    assert!(error.to_string().contains("a:b"));
    assert!(error.to_string().contains("group:type:kind:name:version"));
}

#[test]
fn test_validation_error_conversion() {
    let error: QueueError = ValidationError::Required {
        field: "message_id".to_string(),
    }
    .into();

    assert!(matches!(error, QueueError::Validation(_)));
    assert!(error.to_string().contains("message_id"));
}

#[test]
fn test_serialization_error_conversion() {
    let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
    let error: QueueError = json_error.into();

    assert!(matches!(error, QueueError::Serialization(_)));
    assert!(error.to_string().starts_with("Serialization failed"));
}
