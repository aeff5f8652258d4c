// ============================
// students-backend-lib/src/auth/session.rs
// ============================
//! Session lifecycle: sign-in, refresh, logout.
//!
//! A session starts when credentials verify, lives as long as its refresh
//! token is active, and ends on logout, revocation or refresh token expiry.
//! Access tokens are never looked up, so ending a session only stops new
//! access tokens from being minted.
use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use students_common::{SignInCredentials, StudentId, TokenPair};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use super::{
    generate_secure_token, token_fingerprint, AccessClaims, AuthService, CredentialManager,
    RefreshToken, RefreshTokenStore, TokenSigner,
};
use crate::config::AuthSettings;
use crate::error::AppError;
use crate::metrics as metric_keys;
use crate::validation::validate_credentials;

/// What sign-in needs to know about a student
#[derive(Debug, Clone)]
pub struct LoginRecord {
    pub student_id: StudentId,
    pub password_hash: String,
}

/// Email lookup used by sign-in, implemented by the student store
#[async_trait]
pub trait StudentDirectory: Send + Sync {
    async fn find_login(&self, email: &str) -> Result<Option<LoginRecord>, AppError>;
}

/// Token lifetimes and rotation policy
#[derive(Debug, Clone, Copy)]
pub struct SessionPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub rotate_refresh_tokens: bool,
}

impl From<&AuthSettings> for SessionPolicy {
    fn from(settings: &AuthSettings) -> Self {
        Self {
            access_ttl: settings.access_ttl(),
            refresh_ttl: settings.refresh_ttl(),
            rotate_refresh_tokens: settings.rotate_refresh_tokens,
        }
    }
}

/// Issues, refreshes and revokes sessions
#[derive(Clone)]
pub struct SessionAuthority {
    directory: Arc<dyn StudentDirectory>,
    credentials: CredentialManager,
    signer: TokenSigner,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    policy: SessionPolicy,
}

impl SessionAuthority {
    pub fn new(
        directory: Arc<dyn StudentDirectory>,
        credentials: CredentialManager,
        signer: TokenSigner,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            directory,
            credentials,
            signer,
            refresh_tokens,
            policy,
        }
    }

    /// Remove refresh token records that can no longer be used
    pub async fn purge_expired(&self) -> Result<usize, AppError> {
        let purged = self.refresh_tokens.purge(Utc::now()).await?;
        if purged > 0 {
            counter!(metric_keys::REFRESH_TOKENS_PURGED).increment(purged as u64);
            debug!(purged, "purged refresh tokens");
        }
        Ok(purged)
    }

    /// Spawn the periodic purge task
    pub fn spawn_cleanup(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(err) = self.purge_expired().await {
                    error!(error = %err, "refresh token purge failed");
                }
            }
        })
    }

    async fn issue_refresh_token(&self, subject: &str) -> Result<String, AppError> {
        let value = generate_secure_token();
        let issued_at = Utc::now();
        let expires_at = chrono::Duration::from_std(self.policy.refresh_ttl)
            .ok()
            .and_then(|ttl| issued_at.checked_add_signed(ttl))
            .ok_or_else(|| AppError::internal("refresh token expiry out of range"))?;

        self.refresh_tokens
            .save(RefreshToken {
                token_hash: token_fingerprint(&value),
                subject_id: subject.to_string(),
                issued_at,
                expires_at,
                revoked: false,
            })
            .await?;
        Ok(value)
    }

    fn token_pair(&self, subject: &str, refresh_token: Option<String>) -> Result<TokenPair, AppError> {
        let access = self
            .signer
            .issue(subject, self.policy.access_ttl, Utc::now())?;
        Ok(TokenPair {
            access_token: access.token,
            token_type: "Bearer".to_string(),
            expires_in: self.policy.access_ttl.as_secs(),
            refresh_token,
        })
    }

    fn refresh_rejected(&self, reason: &'static str) -> AppError {
        counter!(metric_keys::REFRESH_FAILURE).increment(1);
        debug!(reason, "refresh rejected");
        AppError::InvalidToken
    }
}

#[async_trait]
impl AuthService for SessionAuthority {
    #[tracing::instrument(skip_all)]
    async fn authenticate(&self, credentials: SignInCredentials) -> Result<TokenPair, AppError> {
        validate_credentials(&credentials)?;
        let SignInCredentials { email, password } = credentials;

        let login = self.directory.find_login(&email).await?;
        // Unknown emails still pay for one verification
        let (subject, stored_hash) = match login {
            Some(login) => (Some(login.student_id), Some(login.password_hash)),
            None => (None, None),
        };
        let verified = self.credentials.verify_owned(password, stored_hash).await?;

        let subject = match subject {
            Some(subject) if verified => subject,
            _ => {
                counter!(metric_keys::SIGN_IN_FAILURE).increment(1);
                info!("sign-in rejected");
                return Err(AppError::InvalidCredentials);
            },
        };

        let refresh_token = self.issue_refresh_token(&subject).await?;
        let pair = self.token_pair(&subject, Some(refresh_token))?;

        counter!(metric_keys::SIGN_IN_SUCCESS).increment(1);
        info!(student_id = %subject, "sign-in succeeded");
        Ok(pair)
    }

    #[tracing::instrument(skip_all)]
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        if refresh_token.is_empty() {
            return Err(self.refresh_rejected("empty"));
        }
        let token_hash = token_fingerprint(refresh_token);

        let Some(record) = self.refresh_tokens.find(&token_hash).await? else {
            return Err(self.refresh_rejected("unknown"));
        };
        if record.revoked {
            return Err(self.refresh_rejected("revoked"));
        }
        if !record.is_active(Utc::now()) {
            return Err(self.refresh_rejected("expired"));
        }

        let rotated = if self.policy.rotate_refresh_tokens {
            // Only one of several concurrent refreshes may consume the token
            if !self.refresh_tokens.revoke(&token_hash).await? {
                return Err(self.refresh_rejected("already rotated"));
            }
            Some(self.issue_refresh_token(&record.subject_id).await?)
        } else {
            None
        };

        let pair = self.token_pair(&record.subject_id, rotated)?;
        counter!(metric_keys::REFRESH_SUCCESS).increment(1);
        debug!(student_id = %record.subject_id, "access token refreshed");
        Ok(pair)
    }

    #[tracing::instrument(skip(self))]
    async fn logout(&self, subject_id: &str) -> Result<usize, AppError> {
        let revoked = self.refresh_tokens.revoke_subject(subject_id).await?;
        counter!(metric_keys::LOGOUT).increment(1);
        info!(revoked, "logged out");
        Ok(revoked)
    }

    #[tracing::instrument(skip_all)]
    async fn revoke_refresh_token(&self, refresh_token: &str) -> Result<(), AppError> {
        self.refresh_tokens
            .revoke(&token_fingerprint(refresh_token))
            .await?;
        Ok(())
    }

    fn validate_access_token(&self, token: &str) -> Result<AccessClaims, AppError> {
        self.signer.verify(token, Utc::now())
    }
}
