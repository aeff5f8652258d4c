// ============================
// students-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod access_token;
pub mod password;
pub mod persistent_refresh;
pub mod refresh;
pub mod session;
mod service;
mod token_generator;

pub use access_token::{AccessClaims, AccessToken, TokenSigner};
pub use password::CredentialManager;
pub use persistent_refresh::FlatFileRefreshTokenStore;
pub use refresh::{MemoryRefreshTokenStore, RefreshToken, RefreshTokenStore};
pub use service::AuthService;
pub use session::{LoginRecord, SessionAuthority, SessionPolicy, StudentDirectory};
pub use token_generator::{generate_secure_token, generate_secure_token_with_size, token_fingerprint};
