// =====================================
// tests/integration/auth_flow_tests.rs
// =====================================
//! End-to-end student and session flows through the use-case layer
use students_backend_lib::auth::AuthService;
use students_backend_lib::error::AppError;
use students_backend_lib::storage::MemoryCache;
use std::sync::Arc;

use crate::test_utils::{credentials, memory_state, new_student, setup_test_env};

#[tokio::test]
async fn test_sign_up_then_duplicate() {
    let (state, _temp_dir) = setup_test_env();
    let students = &state.students;

    let s1 = students.sign_up(new_student("a@x.com", "p1")).await.unwrap();
    assert!(!s1.id.is_empty());

    let err = students.sign_up(new_student("a@x.com", "p2")).await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateEmail));

    // Emails are case-sensitive as stored
    students.sign_up(new_student("A@x.com", "p2")).await.unwrap();
}

#[tokio::test]
async fn test_logout_invalidates_refresh_token() {
    let (state, _temp_dir) = setup_test_env();
    let students = &state.students;

    let s1 = students.sign_up(new_student("a@x.com", "p1")).await.unwrap();
    let pair = students.sign_in(credentials("a@x.com", "p1")).await.unwrap();
    let r1 = pair.refresh_token.clone().unwrap();

    assert_eq!(students.authorize(&pair.access_token).unwrap().sub, s1.id);
    students.refresh(&r1).await.unwrap();

    students.logout(&s1.id).await.unwrap();
    assert!(matches!(
        students.refresh(&r1).await,
        Err(AppError::InvalidToken)
    ));

    // Idempotent
    students.logout(&s1.id).await.unwrap();
}

#[tokio::test]
async fn test_sign_in_failures_are_enumeration_safe() {
    let (state, _temp_dir) = setup_test_env();
    let students = &state.students;
    students.sign_up(new_student("a@x.com", "p1")).await.unwrap();

    let wrong_password = students
        .sign_in(credentials("a@x.com", "wrong"))
        .await
        .unwrap_err();
    let unknown_email = students
        .sign_in(credentials("nobody@x.com", "p1"))
        .await
        .unwrap_err();
    let malformed_email = students
        .sign_in(credentials("not-an-email", "p1"))
        .await
        .unwrap_err();

    for err in [&wrong_password, &unknown_email, &malformed_email] {
        assert!(matches!(err, AppError::InvalidCredentials));
        assert_eq!(err.status_code(), wrong_password.status_code());
        assert_eq!(err.sanitized_message(), wrong_password.sanitized_message());
        assert_eq!(err.to_string(), wrong_password.to_string());
    }
}

#[tokio::test]
async fn test_sessions_survive_restart() {
    let (state, temp_dir) = setup_test_env();
    state.students.sign_up(new_student("a@x.com", "p1")).await.unwrap();
    let pair = state.students.sign_in(credentials("a@x.com", "p1")).await.unwrap();
    let refresh = pair.refresh_token.unwrap();
    drop(state);

    // A second state over the same directory sees the same records and tokens
    let mut settings = crate::test_utils::test_settings();
    settings.storage.path = temp_dir.path().to_path_buf();
    let reopened = students_backend_lib::AppState::from_settings(settings).unwrap();

    let refreshed = reopened.students.refresh(&refresh).await.unwrap();
    let claims = reopened.students.authorize(&refreshed.access_token).unwrap();
    assert_eq!(
        reopened.students.get_student(&claims.sub).await.unwrap().email,
        "a@x.com"
    );
}

#[tokio::test]
async fn test_rotation_replaces_refresh_token() {
    let (state, temp_dir) = setup_test_env();
    drop(state);
    let mut settings = crate::test_utils::test_settings();
    settings.storage.path = temp_dir.path().to_path_buf();
    settings.auth.rotate_refresh_tokens = true;
    let state = students_backend_lib::AppState::from_settings(settings).unwrap();

    state.students.sign_up(new_student("a@x.com", "p1")).await.unwrap();
    let pair = state.students.sign_in(credentials("a@x.com", "p1")).await.unwrap();
    let original = pair.refresh_token.unwrap();

    let rotated = state.students.refresh(&original).await.unwrap();
    let replacement = rotated.refresh_token.unwrap();

    assert!(state.students.refresh(&original).await.is_err());
    state.students.refresh(&replacement).await.unwrap();
}

#[tokio::test]
async fn test_purge_after_logout() {
    let state = memory_state(Arc::new(MemoryCache::new()));
    let s1 = state.students.sign_up(new_student("a@x.com", "p1")).await.unwrap();
    state.students.sign_in(credentials("a@x.com", "p1")).await.unwrap();
    state.students.sign_in(credentials("a@x.com", "p1")).await.unwrap();

    assert_eq!(state.sessions.logout(&s1.id).await.unwrap(), 2);
    assert_eq!(state.sessions.purge_expired().await.unwrap(), 2);
    assert_eq!(state.sessions.purge_expired().await.unwrap(), 0);
}

#[tokio::test]
async fn test_access_token_outlives_logout_until_expiry() {
    let state = memory_state(Arc::new(MemoryCache::new()));
    let s1 = state.students.sign_up(new_student("a@x.com", "p1")).await.unwrap();
    let pair = state.students.sign_in(credentials("a@x.com", "p1")).await.unwrap();

    state.students.logout(&s1.id).await.unwrap();
    assert!(state.students.authorize(&pair.access_token).is_ok());
}
