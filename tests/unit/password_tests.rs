// =========================
// tests/unit/password_tests.rs
// =========================
//! Unit tests for credential hashing
use students_backend_lib::auth::CredentialManager;
use students_backend_lib::config::PasswordSettings;

fn manager() -> CredentialManager {
    CredentialManager::new(&PasswordSettings {
        scrypt_log_n: 4,
        scrypt_r: 8,
        scrypt_p: 1,
    })
    .unwrap()
}

#[test]
fn test_password_hashing_and_verification() {
    let manager = manager();
    let password = "SecureP@ssw0rd";
    let hash = manager.hash(password).unwrap();

    assert_ne!(hash, password);
    assert!(!hash.contains(password));
    assert!(manager.verify(password, &hash));
    assert!(!manager.verify("securep@ssw0rd", &hash));
}

#[test]
fn test_salts_differ_between_hashes() {
    let manager = manager();
    let first = manager.hash("same").unwrap();
    let second = manager.hash("same").unwrap();

    assert_ne!(first, second);
    assert!(manager.verify("same", &first));
    assert!(manager.verify("same", &second));
}

#[test]
fn test_hash_records_its_own_cost() {
    let hash = manager().hash("pw").unwrap();
    assert!(hash.starts_with("$scrypt$ln=4,r=8,p=1$"));

    // A manager with a different cost still verifies older hashes
    let stronger = CredentialManager::new(&PasswordSettings {
        scrypt_log_n: 5,
        scrypt_r: 8,
        scrypt_p: 1,
    })
    .unwrap();
    assert!(stronger.verify("pw", &hash));
}

#[test]
fn test_garbage_hashes_never_verify() {
    let manager = manager();
    for stored in ["", "plaintext", "$scrypt$", "$argon2id$v=19$m=16,t=2,p=1$c2FsdA$aGFzaA"] {
        assert!(!manager.verify("plaintext", stored));
    }
}

#[tokio::test]
async fn test_blocking_pool_variants() {
    let manager = manager();
    let hash = manager.hash_owned("p1".to_string()).await.unwrap();

    assert!(manager.verify_owned("p1".to_string(), Some(hash.clone())).await.unwrap());
    assert!(!manager.verify_owned("p2".to_string(), Some(hash)).await.unwrap());
    assert!(!manager.verify_owned("p1".to_string(), None).await.unwrap());
}

#[test]
fn test_invalid_cost_is_rejected() {
    let result = CredentialManager::new(&PasswordSettings {
        scrypt_log_n: 4,
        scrypt_r: 0,
        scrypt_p: 1,
    });
    assert!(result.is_err());
}
