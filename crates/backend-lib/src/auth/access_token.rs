// ============================
// students-backend-lib/src/auth/access_token.rs
// ============================
//! Stateless access tokens.
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(mac)`.
//! Validity is decided by the MAC and the expiry alone, without a storage
//! lookup, so a revoked session keeps working until its access token expires.
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;
use students_common::StudentId;

use crate::config::MIN_SIGNING_SECRET_LEN;
use crate::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Fixed JOSE header; tokens with any other header are rejected
const HEADER_JSON: &str = r#"{"alg":"HS256","typ":"JWT"}"#;

/// Access token claims
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Student id
    pub sub: StudentId,
    /// Issuer
    pub iss: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expires at (unix seconds)
    pub exp: i64,
    /// Unique token id
    pub jti: String,
}

/// An issued access token and the claims it carries
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub token: String,
    pub claims: AccessClaims,
}

impl AccessToken {
    pub fn subject_id(&self) -> &str {
        &self.claims.sub
    }
}

/// Signs and verifies access tokens with a key injected at construction
#[derive(Clone)]
pub struct TokenSigner {
    key: Arc<[u8]>,
    issuer: String,
    header: String,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("key", &"<redacted>")
            .field("issuer", &self.issuer)
            .finish()
    }
}

impl TokenSigner {
    pub fn new(secret: &[u8], issuer: impl Into<String>) -> Result<Self, AppError> {
        if secret.len() < MIN_SIGNING_SECRET_LEN {
            return Err(AppError::internal(format!(
                "signing secret must be at least {MIN_SIGNING_SECRET_LEN} bytes"
            )));
        }
        Ok(Self {
            key: Arc::from(secret),
            issuer: issuer.into(),
            header: URL_SAFE_NO_PAD.encode(HEADER_JSON),
        })
    }

    /// Issue a token for `subject` valid for `ttl` from `now`
    pub fn issue(
        &self,
        subject: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<AccessToken, AppError> {
        let ttl = chrono::Duration::from_std(ttl).map_err(AppError::internal)?;
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::internal("access token expiry out of range"))?;
        let claims = AccessClaims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: uuid::Uuid::new_v4().simple().to_string(),
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{}.{}", self.header, payload);
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&signing_input)?.finalize().into_bytes());

        Ok(AccessToken {
            token: format!("{signing_input}.{signature}"),
            claims,
        })
    }

    /// Verify signature, issuer and expiry. Every failure is `InvalidToken`.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<AccessClaims, AppError> {
        let mut parts = token.split('.');
        let (Some(header), Some(payload), Some(signature), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AppError::InvalidToken);
        };
        if header != self.header {
            return Err(AppError::InvalidToken);
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AppError::InvalidToken)?;
        let signing_input = &token[..header.len() + 1 + payload.len()];
        self.mac(signing_input)?
            .verify_slice(&signature)
            .map_err(|_| AppError::InvalidToken)?;

        let claims: AccessClaims = URL_SAFE_NO_PAD
            .decode(payload)
            .ok()
            .and_then(|raw| serde_json::from_slice(&raw).ok())
            .ok_or(AppError::InvalidToken)?;

        if claims.iss != self.issuer || now.timestamp() >= claims.exp {
            return Err(AppError::InvalidToken);
        }
        Ok(claims)
    }

    fn mac(&self, signing_input: &str) -> Result<HmacSha256, AppError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).map_err(AppError::internal)?;
        mac.update(signing_input.as_bytes());
        Ok(mac)
    }
}
