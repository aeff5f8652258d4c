// ============================
// students-backend-lib/src/store.rs
// ============================
//! Cache-aside data access for student records.
//!
//! Reads consult the cache first and fall back to the durable store,
//! populating the cache on the way out. Every successful durable write for a
//! student evicts the cache entries derived from that student before the
//! write returns, so a stale entry can only survive writes that bypass this
//! type.
use async_trait::async_trait;
use metrics::counter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use students_common::{CourseId, ProfileUpdate, Student};
use tracing::{debug, error, warn};

use crate::auth::{LoginRecord, StudentDirectory};
use crate::error::AppError;
use crate::metrics as metric_keys;
use crate::storage::{Cache, RecordStore};

/// Cache key of a single student snapshot
pub fn student_cache_key(id: &str) -> String {
    format!("student:{id}")
}

/// Cache key of a course membership result
pub fn course_cache_key(course_id: &str) -> String {
    format!("course:{course_id}")
}

/// A student record before the store has assigned it an id
#[derive(Debug, Clone)]
pub struct StudentDraft {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub course_ids: BTreeSet<CourseId>,
}

/// Student records with a cache-aside read path
#[derive(Clone)]
pub struct StudentStore {
    records: Arc<dyn RecordStore>,
    cache: Arc<dyn Cache>,
}

impl StudentStore {
    pub fn new(records: Arc<dyn RecordStore>, cache: Arc<dyn Cache>) -> Self {
        Self { records, cache }
    }

    /// Assign an id and persist a new record.
    ///
    /// Uniqueness of the email is enforced by the record store, so concurrent
    /// creates for one email yield exactly one success and `DuplicateEmail`
    /// for the rest.
    #[tracing::instrument(skip_all)]
    pub async fn create(&self, draft: StudentDraft) -> Result<Student, AppError> {
        if draft.password_hash.is_empty() {
            return Err(AppError::internal("refusing to persist an empty password hash"));
        }

        let student = Student {
            id: uuid::Uuid::new_v4().to_string(),
            email: draft.email,
            password_hash: draft.password_hash,
            first_name: draft.first_name,
            last_name: draft.last_name,
            age: draft.age,
            course_ids: draft.course_ids,
        };

        self.records.insert(&student).await?;
        // Course listings that now miss this student must not be served again
        self.evict(student.course_ids.iter().map(|c| course_cache_key(c)))
            .await?;

        counter!(metric_keys::STUDENT_CREATED).increment(1);
        debug!(student_id = %student.id, "student created");
        Ok(student)
    }

    /// Pre-check for sign-up. Not a substitute for the store's unique constraint.
    pub async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        self.records.email_exists(email).await
    }

    /// Cache-aside point read. `Ok(None)` means no such student.
    #[tracing::instrument(skip(self))]
    pub async fn read(&self, id: &str) -> Result<Option<Student>, AppError> {
        let key = student_cache_key(id);
        if let Some(student) = self.cached::<Student>(&key).await {
            return Ok(Some(student));
        }

        let Some(student) = self.records.find_by_id(id).await? else {
            return Ok(None);
        };
        self.populate(&key, &student).await;
        Ok(Some(student))
    }

    /// Cache-aside course membership read. An empty result is the not-found
    /// indicator and is never cached.
    #[tracing::instrument(skip(self))]
    pub async fn read_by_course(&self, course_id: &str) -> Result<Vec<Student>, AppError> {
        let key = course_cache_key(course_id);
        if let Some(students) = self.cached::<Vec<Student>>(&key).await {
            return Ok(students);
        }

        let students = self.records.find_by_course(course_id).await?;
        if !students.is_empty() {
            self.populate(&key, &students).await;
        }
        Ok(students)
    }

    /// Write the mutable profile fields, then evict everything cached for
    /// this student.
    #[tracing::instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: &ProfileUpdate) -> Result<Student, AppError> {
        let student = self
            .records
            .update_profile(id, update)
            .await?
            .ok_or_else(|| AppError::not_found(format!("student {id}")))?;

        self.invalidate(&student).await?;
        counter!(metric_keys::STUDENT_UPDATED).increment(1);
        Ok(student)
    }

    /// Remove the durable record and evict everything cached for it.
    /// Returns the removed record.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Student, AppError> {
        let student = self
            .records
            .delete(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("student {id}")))?;

        self.invalidate(&student).await?;
        counter!(metric_keys::STUDENT_DELETED).increment(1);
        Ok(student)
    }

    async fn invalidate(&self, student: &Student) -> Result<(), AppError> {
        let stale = std::iter::once(student_cache_key(&student.id))
            .chain(student.course_ids.iter().map(|c| course_cache_key(c)));
        self.evict(stale).await
    }

    /// Evict keys after a durable write. Failure here means the staleness
    /// bound cannot be guaranteed, so it is reported rather than swallowed.
    async fn evict(&self, stale: impl Iterator<Item = String>) -> Result<(), AppError> {
        for key in stale {
            if let Err(err) = self.cache.delete(&key).await {
                error!(%key, error = %err, "cache eviction failed after durable write");
                counter!(metric_keys::CACHE_ERROR).increment(1);
                return Err(AppError::StorageUnavailable(format!(
                    "cache eviction failed for {key}: {err}"
                )));
            }
        }
        Ok(())
    }

    /// Cache lookup that treats every failure as a miss
    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    counter!(metric_keys::CACHE_HIT).increment(1);
                    Some(value)
                },
                Err(err) => {
                    warn!(%key, error = %err, "discarding undecodable cache entry");
                    counter!(metric_keys::CACHE_ERROR).increment(1);
                    let _ = self.cache.delete(key).await;
                    None
                },
            },
            Ok(None) => {
                counter!(metric_keys::CACHE_MISS).increment(1);
                None
            },
            Err(err) => {
                warn!(%key, error = %err, "cache read failed, falling back to record store");
                counter!(metric_keys::CACHE_ERROR).increment(1);
                None
            },
        }
    }

    async fn populate<T: Serialize>(&self, key: &str, value: &T) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(%key, error = %err, "could not serialize cache entry");
                return;
            },
        };
        if let Err(err) = self.cache.set(key, raw).await {
            warn!(%key, error = %err, "cache populate failed");
            counter!(metric_keys::CACHE_ERROR).increment(1);
        }
    }
}

#[async_trait]
impl StudentDirectory for StudentStore {
    async fn find_login(&self, email: &str) -> Result<Option<LoginRecord>, AppError> {
        // Login always reads the durable store so a changed password is never
        // checked against a cached hash
        Ok(self
            .records
            .find_by_email(email)
            .await?
            .map(|student| LoginRecord {
                student_id: student.id,
                password_hash: student.password_hash,
            }))
    }
}
