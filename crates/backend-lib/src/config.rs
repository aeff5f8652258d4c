// ============================
// students-backend-lib/src/config.rs
// ============================
//! Configuration management.
//!
//! Settings are layered with figment: built-in defaults, then a TOML file,
//! then `STUDENTS_`-prefixed environment variables (`__` separates nested
//! keys, e.g. `STUDENTS_AUTH__SIGNING_SECRET`).
use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "STUDENTS_";

/// Minimum accepted signing secret length in bytes
pub const MIN_SIGNING_SECRET_LEN: usize = 32;

/// Longest accepted token lifetime (ten years)
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Log level (`trace` ... `error`)
    pub log_level: String,
    /// Log output format
    pub log_format: LogFormat,
    /// Per-request timeout applied by the HTTP layer
    pub request_timeout_secs: u64,
    /// Durable store settings
    pub storage: StorageSettings,
    /// Token settings
    pub auth: AuthSettings,
    /// Password hashing cost
    pub password: PasswordSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local maps; nothing survives a restart
    Memory,
    /// JSON files under `storage.path`
    FlatFile,
}

/// Storage settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Root directory for the flat-file backend
    pub path: PathBuf,
}

/// Token settings
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HMAC key for access tokens. No default: it must be provided.
    pub signing_secret: String,
    /// `iss` claim written into and required from access tokens
    pub issuer: String,
    /// Access token lifetime in seconds
    pub access_ttl_secs: u64,
    /// Refresh token lifetime in seconds
    pub refresh_ttl_secs: u64,
    /// Replace the refresh token on every successful refresh
    pub rotate_refresh_tokens: bool,
    /// Interval of the expired refresh token purge
    pub cleanup_interval_secs: u64,
}

impl std::fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSettings")
            .field("signing_secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("rotate_refresh_tokens", &self.rotate_refresh_tokens)
            .field("cleanup_interval_secs", &self.cleanup_interval_secs)
            .finish()
    }
}

/// scrypt cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordSettings {
    pub scrypt_log_n: u8,
    pub scrypt_r: u32,
    pub scrypt_p: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            request_timeout_secs: 30,
            storage: StorageSettings::default(),
            auth: AuthSettings::default(),
            password: PasswordSettings::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::FlatFile,
            path: PathBuf::from("data"),
        }
    }
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            signing_secret: String::new(),
            issuer: "students-service".to_string(),
            access_ttl_secs: 60 * 60,                // 1 hour
            refresh_ttl_secs: 60 * 60 * 24 * 30,     // 30 days
            rotate_refresh_tokens: false,
            cleanup_interval_secs: 60 * 60,
        }
    }
}

impl Default for PasswordSettings {
    fn default() -> Self {
        // scrypt's recommended interactive-login parameters
        Self {
            scrypt_log_n: 17,
            scrypt_r: 8,
            scrypt_p: 1,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        Self::from_figment(Self::figment().merge(Toml::file("config.toml")))
    }

    /// Load settings from an explicit TOML file and the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            bail!("config file {} does not exist", path.display());
        }
        Self::from_figment(Self::figment().merge(Toml::file(path)))
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            bail!("unknown log level {:?}", self.log_level);
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be positive");
        }
        if self.auth.signing_secret.len() < MIN_SIGNING_SECRET_LEN {
            bail!("auth.signing_secret must be at least {MIN_SIGNING_SECRET_LEN} bytes");
        }
        if self.auth.issuer.is_empty() {
            bail!("auth.issuer must not be empty");
        }
        if self.auth.access_ttl_secs == 0 || self.auth.refresh_ttl_secs == 0 {
            bail!("token lifetimes must be positive");
        }
        if self.auth.access_ttl_secs > MAX_TOKEN_TTL_SECS
            || self.auth.refresh_ttl_secs > MAX_TOKEN_TTL_SECS
        {
            bail!("token lifetimes must not exceed {MAX_TOKEN_TTL_SECS} seconds");
        }
        if self.auth.access_ttl_secs >= self.auth.refresh_ttl_secs {
            bail!("auth.access_ttl_secs must be shorter than auth.refresh_ttl_secs");
        }
        if self.auth.cleanup_interval_secs == 0 {
            bail!("auth.cleanup_interval_secs must be positive");
        }
        if scrypt::Params::new(
            self.password.scrypt_log_n,
            self.password.scrypt_r,
            self.password.scrypt_p,
            scrypt::Params::RECOMMENDED_LEN,
        )
        .is_err()
        {
            bail!("invalid scrypt parameters {:?}", self.password);
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AuthSettings {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }
}
