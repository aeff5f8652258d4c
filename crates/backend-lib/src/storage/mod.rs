// ============================
// students-backend-lib/src/storage/mod.rs
// ============================
//! Storage abstractions: a durable record store and a key-value cache.
//!
//! Both are consumed through trait objects so the student store never
//! depends on a particular engine. Handles are cheap to clone and safe to
//! share between concurrent requests.
use async_trait::async_trait;
use students_common::{ProfileUpdate, Student};

use crate::error::AppError;

pub mod flat_file;
pub mod memory;

pub use flat_file::FlatFileRecordStore;
pub use memory::{MemoryCache, MemoryRecordStore};

/// Durable student record storage.
///
/// Implementations must enforce email uniqueness themselves: `insert` is the
/// only race-safe place to reject a duplicate.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Insert a new record, failing with `DuplicateEmail` if the email is taken
    async fn insert(&self, student: &Student) -> Result<(), AppError>;

    /// Point lookup by id
    async fn find_by_id(&self, id: &str) -> Result<Option<Student>, AppError>;

    /// Point lookup by exact (case-sensitive) email
    async fn find_by_email(&self, email: &str) -> Result<Option<Student>, AppError>;

    /// Whether a record with this exact email exists
    async fn email_exists(&self, email: &str) -> Result<bool, AppError>;

    /// All records enrolled in a course
    async fn find_by_course(&self, course_id: &str) -> Result<Vec<Student>, AppError>;

    /// Apply the profile fields of `update` as a single write.
    /// Returns the updated record, or `None` if no record has this id.
    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Student>, AppError>;

    /// Remove a record, returning it, or `None` if no record has this id
    async fn delete(&self, id: &str) -> Result<Option<Student>, AppError>;
}

/// Key-value cache. A missing key is a miss, not an error.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    /// Store a value with no expiry
    async fn set(&self, key: &str, value: String) -> Result<(), AppError>;

    /// Remove a key; removing an absent key succeeds
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}
