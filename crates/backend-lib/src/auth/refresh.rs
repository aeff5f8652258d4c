// ============================
// students-backend-lib/src/auth/refresh.rs
// ============================
//! Refresh token records and their storage.
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use students_common::StudentId;

use crate::error::AppError;

/// A persisted refresh token.
///
/// Only the SHA-256 fingerprint of the token value is kept. Once `revoked`
/// is set it is never cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    pub token_hash: String,
    pub subject_id: StudentId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshToken {
    /// Usable to mint access tokens at `now`
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        !self.revoked && now < self.expires_at
    }
}

/// Storage for refresh tokens
#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Persist a new token. Fingerprints are unique.
    async fn save(&self, token: RefreshToken) -> Result<(), AppError>;

    async fn find(&self, token_hash: &str) -> Result<Option<RefreshToken>, AppError>;

    /// Revoke one token. Returns `true` only for the call that flipped it
    /// from active to revoked, which makes it usable as a compare-and-set.
    async fn revoke(&self, token_hash: &str) -> Result<bool, AppError>;

    /// Revoke every token of a subject, returning how many were still active
    async fn revoke_subject(&self, subject_id: &str) -> Result<usize, AppError>;

    /// Drop records that can never be used again (expired or revoked)
    async fn purge(&self, now: DateTime<Utc>) -> Result<usize, AppError>;
}

/// In-memory refresh token store
#[derive(Debug, Clone, Default)]
pub struct MemoryRefreshTokenStore {
    tokens: Arc<DashMap<String, RefreshToken>>,
}

impl MemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn save(&self, token: RefreshToken) -> Result<(), AppError> {
        match self.tokens.entry(token.token_hash.clone()) {
            Entry::Occupied(_) => Err(AppError::internal("refresh token fingerprint collision")),
            Entry::Vacant(slot) => {
                slot.insert(token);
                Ok(())
            },
        }
    }

    async fn find(&self, token_hash: &str) -> Result<Option<RefreshToken>, AppError> {
        Ok(self.tokens.get(token_hash).map(|entry| entry.value().clone()))
    }

    async fn revoke(&self, token_hash: &str) -> Result<bool, AppError> {
        Ok(match self.tokens.get_mut(token_hash) {
            Some(mut entry) if !entry.revoked => {
                entry.revoked = true;
                true
            },
            _ => false,
        })
    }

    async fn revoke_subject(&self, subject_id: &str) -> Result<usize, AppError> {
        let mut revoked = 0;
        for mut entry in self.tokens.iter_mut() {
            if entry.subject_id == subject_id && !entry.revoked {
                entry.revoked = true;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn purge(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let before = self.tokens.len();
        self.tokens.retain(|_, token| token.is_active(now));
        Ok(before.saturating_sub(self.tokens.len()))
    }
}
