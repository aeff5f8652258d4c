// ============================
// students-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use scrypt::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Params, Scrypt,
};
use std::sync::Arc;
use zeroize::Zeroize;

use crate::config::PasswordSettings;
use crate::error::AppError;

/// Hashes and verifies passwords with scrypt.
///
/// Hashes are PHC strings carrying their own salt and cost, so a cost change
/// only affects newly hashed passwords. Verification compares digests in
/// constant time.
#[derive(Clone)]
pub struct CredentialManager {
    params: Params,
    /// Hash of a random password, verified against when no account matches
    /// so both sign-in failure paths do the same work
    dummy_hash: Arc<str>,
}

impl std::fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialManager")
            .field("log_n", &self.params.log_n())
            .field("r", &self.params.r())
            .field("p", &self.params.p())
            .finish_non_exhaustive()
    }
}

impl CredentialManager {
    /// Create a manager with the configured scrypt cost
    pub fn new(settings: &PasswordSettings) -> Result<Self, AppError> {
        let params = Params::new(
            settings.scrypt_log_n,
            settings.scrypt_r,
            settings.scrypt_p,
            Params::RECOMMENDED_LEN,
        )
        .map_err(|e| AppError::internal(format!("invalid scrypt parameters: {e}")))?;

        let dummy_hash = hash_with(params, &super::generate_secure_token())?;
        Ok(Self {
            params,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Hash a password with a fresh random salt
    pub fn hash(&self, plain: &str) -> Result<String, AppError> {
        hash_with(self.params, plain)
    }

    /// Verify a password against a stored hash. Malformed hashes never verify.
    pub fn verify(&self, plain: &str, stored_hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(stored_hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
    }

    /// Hash on the blocking pool and zeroize the raw password afterwards
    pub async fn hash_owned(&self, mut plain: String) -> Result<String, AppError> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || {
            let hash = manager.hash(&plain);
            plain.zeroize();
            hash
        })
        .await
        .map_err(|e| AppError::internal(format!("hashing task failed: {e}")))?
    }

    /// Verify on the blocking pool and zeroize the raw password afterwards.
    /// `None` verifies against the dummy hash and always fails.
    pub async fn verify_owned(
        &self,
        mut plain: String,
        stored_hash: Option<String>,
    ) -> Result<bool, AppError> {
        let manager = self.clone();
        tokio::task::spawn_blocking(move || {
            let verified = match &stored_hash {
                Some(hash) => manager.verify(&plain, hash),
                None => {
                    let _ = manager.verify(&plain, &manager.dummy_hash);
                    false
                },
            };
            plain.zeroize();
            verified
        })
        .await
        .map_err(|e| AppError::internal(format!("verification task failed: {e}")))
    }
}

fn hash_with(params: Params, plain: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password_customized(plain.as_bytes(), None, None, params, &salt)
        .map_err(|e| AppError::internal(format!("password hashing failed: {e}")))?
        .to_string();
    Ok(hash)
}
