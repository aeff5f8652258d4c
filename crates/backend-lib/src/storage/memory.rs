//! In-process implementations of the storage traits.
use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use std::sync::Arc;
use students_common::{ProfileUpdate, Student, StudentId};

use super::{Cache, RecordStore};
use crate::error::AppError;

/// Record store backed by concurrent maps.
///
/// The email index entry is held locked while the record is inserted, which
/// gives the same guarantee as a unique index in a database.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    records: Arc<DashMap<StudentId, Student>>,
    emails: Arc<DashMap<String, StudentId>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Overwrite a record without going through the student store.
    /// Lets tests simulate writes that bypass cache invalidation.
    pub fn put_raw(&self, student: Student) {
        self.emails.insert(student.email.clone(), student.id.clone());
        self.records.insert(student.id.clone(), student);
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn insert(&self, student: &Student) -> Result<(), AppError> {
        match self.emails.entry(student.email.clone()) {
            Entry::Occupied(_) => Err(AppError::DuplicateEmail),
            Entry::Vacant(slot) => {
                self.records.insert(student.id.clone(), student.clone());
                slot.insert(student.id.clone());
                Ok(())
            },
        }
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Student>, AppError> {
        Ok(self.records.get(id).map(|entry| entry.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Student>, AppError> {
        let id = match self.emails.get(email) {
            Some(entry) => entry.value().clone(),
            None => return Ok(None),
        };
        self.find_by_id(&id).await
    }

    async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        Ok(self.emails.contains_key(email))
    }

    async fn find_by_course(&self, course_id: &str) -> Result<Vec<Student>, AppError> {
        let mut students: Vec<Student> = self
            .records
            .iter()
            .filter(|entry| entry.course_ids.contains(course_id))
            .map(|entry| entry.value().clone())
            .collect();
        students.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(students)
    }

    async fn update_profile(
        &self,
        id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<Student>, AppError> {
        // The shard lock makes the field writes visible all at once
        Ok(self.records.get_mut(id).map(|mut entry| {
            entry.apply(update);
            entry.value().clone()
        }))
    }

    async fn delete(&self, id: &str) -> Result<Option<Student>, AppError> {
        let Some((_, student)) = self.records.remove(id) else {
            return Ok(None);
        };
        self.emails.remove_if(&student.email, |_, owner| owner == id);
        Ok(Some(student))
    }
}

/// Cache backed by a concurrent map. Entries never expire.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), AppError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.entries.remove(key);
        Ok(())
    }
}
