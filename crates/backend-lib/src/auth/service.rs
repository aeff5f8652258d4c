use async_trait::async_trait;
use students_common::{SignInCredentials, TokenPair};

use super::AccessClaims;
use crate::error::AppError;

/// Session operations exposed to the use-case and HTTP layers
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify credentials and issue an access + refresh token pair.
    /// Unknown email and wrong password both fail with `InvalidCredentials`.
    async fn authenticate(&self, credentials: SignInCredentials) -> Result<TokenPair, AppError>;

    /// Mint a new access token from an active refresh token
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenPair, AppError>;

    /// Revoke every refresh token of a student. Idempotent.
    async fn logout(&self, subject_id: &str) -> Result<usize, AppError>;

    /// Revoke a single refresh token. Idempotent.
    async fn revoke_refresh_token(&self, refresh_token: &str) -> Result<(), AppError>;

    /// Check signature and expiry of an access token; never touches storage
    fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AppError>;
}
