// ============================
// crates/backend-lib/src/auth/persistent_refresh.rs
// ============================
/** Persistent refresh token storage
Keeps one JSON file per refresh token so sessions survive server restarts
and revocations stay in force after one. Files are named by fingerprint and
replaced atomically. */
use super::refresh::{RefreshToken, RefreshTokenStore};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs as tokio_fs, io::AsyncWriteExt, sync::Mutex};
use tracing::warn;

/// Flat-file refresh token store
#[derive(Debug, Clone)]
pub struct FlatFileRefreshTokenStore {
    /// Directory holding `<fingerprint>.json` files
    dir: PathBuf,
    /// Serializes read-modify-write cycles within this process
    write_lock: Arc<Mutex<()>>,
}

impl FlatFileRefreshTokenStore {
    /** Create a store rooted at `dir`
    # Arguments
    * `dir` - Directory for token files, created if missing */
    pub fn new<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn token_path(&self, token_hash: &str) -> Result<PathBuf, AppError> {
        // Fingerprints are hex; anything else must not reach the filesystem
        if token_hash.is_empty() || !token_hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(AppError::InvalidToken);
        }
        Ok(self.dir.join(format!("{token_hash}.json")))
    }

    async fn read_token(&self, path: &Path) -> Result<Option<RefreshToken>, AppError> {
        match tokio_fs::read_to_string(path).await {
            Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_token(&self, token: &RefreshToken) -> Result<(), AppError> {
        let path = self.token_path(&token.token_hash)?;
        let tmp = self.dir.join(format!(".{}.tmp", token.token_hash));

        let mut file = tokio_fs::File::create(&tmp).await?;
        file.write_all(&serde_json::to_vec(token)?).await?;
        file.sync_all().await?;
        drop(file);

        tokio_fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Every stored token, skipping files that cannot be parsed
    async fn scan(&self) -> Result<Vec<RefreshToken>, AppError> {
        let mut tokens = Vec::new();
        let mut entries = tokio_fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            match self.read_token(&path).await {
                Ok(Some(token)) => tokens.push(token),
                Ok(None) => {},
                Err(err) => warn!(path = %path.display(), error = %err, "skipping unreadable refresh token"),
            }
        }
        Ok(tokens)
    }
}

#[async_trait]
impl RefreshTokenStore for FlatFileRefreshTokenStore {
    async fn save(&self, token: RefreshToken) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let path = self.token_path(&token.token_hash)?;
        if tokio_fs::try_exists(&path).await? {
            return Err(AppError::internal("refresh token fingerprint collision"));
        }
        self.write_token(&token).await
    }

    async fn find(&self, token_hash: &str) -> Result<Option<RefreshToken>, AppError> {
        let path = match self.token_path(token_hash) {
            Ok(path) => path,
            Err(_) => return Ok(None),
        };
        self.read_token(&path).await
    }

    async fn revoke(&self, token_hash: &str) -> Result<bool, AppError> {
        let _guard = self.write_lock.lock().await;
        let Some(mut token) = self.find(token_hash).await? else {
            return Ok(false);
        };
        if token.revoked {
            return Ok(false);
        }
        token.revoked = true;
        self.write_token(&token).await?;
        Ok(true)
    }

    async fn revoke_subject(&self, subject_id: &str) -> Result<usize, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut revoked = 0;
        for mut token in self.scan().await? {
            if token.subject_id == subject_id && !token.revoked {
                token.revoked = true;
                self.write_token(&token).await?;
                revoked += 1;
            }
        }
        Ok(revoked)
    }

    async fn purge(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let _guard = self.write_lock.lock().await;
        let mut purged = 0;
        for token in self.scan().await? {
            if token.is_active(now) {
                continue;
            }
            match tokio_fs::remove_file(self.token_path(&token.token_hash)?).await {
                Ok(()) => purged += 1,
                Err(err) if err.kind() == ErrorKind::NotFound => {},
                Err(err) => return Err(err.into()),
            }
        }
        Ok(purged)
    }
}
