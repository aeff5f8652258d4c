// ================
// common/src/lib.rs
// ================
//! Common types shared between the students service and its clients.
//!
//! This module defines the student record, the request payloads accepted by
//! the service and the token responses it hands back. Every type serializes
//! with camelCase field names.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque student identifier assigned by the store on creation
pub type StudentId = String;

/// Reference to an entity owned by the external course service
pub type CourseId = String;

/// Durable student record.
///
/// `password_hash` is always a PHC-formatted hash, never a raw password.
/// Use [`StudentProfile`] for anything that leaves the service.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    #[serde(default)]
    pub course_ids: BTreeSet<CourseId>,
}

impl Student {
    /// Public view of this record
    pub fn profile(&self) -> StudentProfile {
        StudentProfile::from(self)
    }

    /// Apply the mutable profile fields of `update`, leaving identity fields alone
    pub fn apply(&mut self, update: &ProfileUpdate) {
        if let Some(first_name) = &update.first_name {
            self.first_name = first_name.clone();
        }
        if let Some(last_name) = &update.last_name {
            self.last_name = last_name.clone();
        }
        if let Some(age) = update.age {
            self.age = age;
        }
    }
}

/// Student record as exposed to callers (no password hash)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudentProfile {
    pub id: StudentId,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub course_ids: BTreeSet<CourseId>,
}

impl From<&Student> for StudentProfile {
    fn from(student: &Student) -> Self {
        Self {
            id: student.id.clone(),
            email: student.email.clone(),
            first_name: student.first_name.clone(),
            last_name: student.last_name.clone(),
            age: student.age,
            course_ids: student.course_ids.clone(),
        }
    }
}

/// Sign-up payload
/// # Fields
/// * `email` - Unique login email, stored exactly as given
/// * `password` - Raw password, hashed before anything is persisted
/// * `course_ids` - Courses the student is enrolled in
#[derive(Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub age: u32,
    #[serde(default)]
    pub course_ids: BTreeSet<CourseId>,
}

impl fmt::Debug for NewStudent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewStudent")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("age", &self.age)
            .field("course_ids", &self.course_ids)
            .finish()
    }
}

/// Changes to the mutable part of a student record.
///
/// Email and password are deliberately absent: they cannot change through
/// the profile update path.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none() && self.last_name.is_none() && self.age.is_none()
    }
}

/// Sign-in payload. The password is only held long enough to verify it.
#[derive(Deserialize, Serialize, Clone)]
pub struct SignInCredentials {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for SignInCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignInCredentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Refresh request payload
#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Tokens handed out after a successful sign-in or refresh
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Signed, self-verifying access token
    pub access_token: String,
    /// Always `Bearer`
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: u64,
    /// Opaque refresh token. Absent when a refresh did not rotate it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}
