// =========================
// tests/unit/error_tests.rs
// =========================
//! Unit tests for the error module
use axum::body::to_bytes;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use students_backend_lib::error::AppError;
use students_backend_lib::validation::ValidationError;

#[test]
fn test_every_kind_has_a_stable_code() {
    let cases = [
        (AppError::from(ValidationError::EmptyUpdate), StatusCode::BAD_REQUEST, "VAL_001"),
        (AppError::DuplicateEmail, StatusCode::CONFLICT, "STU_001"),
        (AppError::not_found("student s1"), StatusCode::NOT_FOUND, "NF_001"),
        (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED, "AUTH_001"),
        (AppError::InvalidToken, StatusCode::UNAUTHORIZED, "AUTH_002"),
        (AppError::storage("down"), StatusCode::SERVICE_UNAVAILABLE, "STORE_001"),
        (AppError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR, "INT_001"),
    ];

    for (err, status, code) in cases {
        assert_eq!(err.status_code(), status, "{err}");
        assert_eq!(err.error_code(), code, "{err}");
        assert_eq!(err.is_retryable(), code == "STORE_001", "{err}");
    }
}

#[test]
fn test_sanitized_messages_hide_details() {
    let err = AppError::storage("connection to 10.0.0.7:6379 refused");
    assert!(!err.sanitized_message().contains("10.0.0.7"));

    let err = AppError::internal("scrypt failed on input hunter2");
    assert!(!err.sanitized_message().contains("hunter2"));
}

#[test]
fn test_io_errors_are_storage_failures() {
    let err: AppError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
    assert!(matches!(err, AppError::StorageUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_response_envelope() {
    let response = AppError::DuplicateEmail.into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"]["code"], "STU_001");
    assert!(json["error"]["message"].is_string());
}
