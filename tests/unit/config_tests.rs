// ==========================
// tests/unit/config_tests.rs
// ==========================
//! Settings loading and application state wiring
use std::io::Write;
use students_backend_lib::config::{LogFormat, Settings, StorageBackend};
use students_backend_lib::AppState;
use tempfile::{NamedTempFile, TempDir};

use crate::test_utils::{test_settings, TEST_SECRET};

#[test]
fn test_defaults() {
    let settings = Settings::default();
    assert_eq!(settings.bind_addr.port(), 3000);
    assert_eq!(settings.log_format, LogFormat::Text);
    assert_eq!(settings.storage.backend, StorageBackend::FlatFile);
    assert_eq!(settings.auth.access_ttl_secs, 3600);
    assert!(!settings.auth.rotate_refresh_tokens);
    assert_eq!(settings.password.scrypt_log_n, 17);

    // No built-in signing secret
    assert!(settings.validate().is_err());
}

#[test]
fn test_load_from_toml() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
log_format = "json"

[storage]
backend = "memory"

[auth]
signing_secret = "{TEST_SECRET}"
access_ttl_secs = 60
rotate_refresh_tokens = true
"#
    )
    .unwrap();

    let settings = Settings::load_from(file.path()).unwrap();
    assert_eq!(settings.log_format, LogFormat::Json);
    assert_eq!(settings.storage.backend, StorageBackend::Memory);
    assert_eq!(settings.auth.access_ttl_secs, 60);
    assert!(settings.auth.rotate_refresh_tokens);
    // Untouched keys keep their defaults
    assert_eq!(settings.auth.issuer, "students-service");
}

#[test]
fn test_secret_never_appears_in_debug_output() {
    let rendered = format!("{:?}", test_settings());
    assert!(!rendered.contains(TEST_SECRET));
}

#[test]
fn test_state_refuses_invalid_settings() {
    let mut settings = test_settings();
    settings.auth.signing_secret = "too-short".to_string();
    assert!(AppState::from_settings(settings).is_err());

    let mut settings = test_settings();
    settings.auth.access_ttl_secs = settings.auth.refresh_ttl_secs;
    assert!(AppState::from_settings(settings).is_err());
}

#[test]
fn test_flat_file_backend_lays_out_directories() {
    let temp_dir = TempDir::new().unwrap();
    let mut settings = test_settings();
    settings.storage.backend = StorageBackend::FlatFile;
    settings.storage.path = temp_dir.path().join("data");

    AppState::from_settings(settings).unwrap();
    assert!(temp_dir.path().join("data").join("students").is_dir());
    assert!(temp_dir.path().join("data").join("refresh_tokens").is_dir());
}
