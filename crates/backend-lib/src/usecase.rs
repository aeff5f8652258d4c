// ============================
// students-backend-lib/src/usecase.rs
// ============================
//! Student use cases.
//!
//! Orchestrates the student store, password hashing and the session
//! authority. The store and the authority never call each other; everything
//! that needs both goes through here.
use std::sync::Arc;
use students_common::{NewStudent, ProfileUpdate, SignInCredentials, StudentProfile, TokenPair};
use tracing::info;

use crate::auth::{AccessClaims, AuthService, CredentialManager};
use crate::error::AppError;
use crate::store::{StudentDraft, StudentStore};
use crate::validation::{
    validate_course_id, validate_new_student, validate_profile_update, validate_student_id,
};

/// Entry point for every student and session operation
#[derive(Clone)]
pub struct StudentService {
    store: StudentStore,
    credentials: CredentialManager,
    auth: Arc<dyn AuthService>,
}

impl StudentService {
    pub fn new(store: StudentStore, credentials: CredentialManager, auth: Arc<dyn AuthService>) -> Self {
        Self {
            store,
            credentials,
            auth,
        }
    }

    /// Register a student. The raw password is hashed before anything is
    /// persisted and dropped afterwards.
    #[tracing::instrument(skip_all)]
    pub async fn sign_up(&self, input: NewStudent) -> Result<StudentProfile, AppError> {
        validate_new_student(&input)?;
        // Cheap early rejection; the store's unique constraint settles races
        if self.store.email_exists(&input.email).await? {
            return Err(AppError::DuplicateEmail);
        }

        let NewStudent {
            email,
            password,
            first_name,
            last_name,
            age,
            course_ids,
        } = input;
        let password_hash = self.credentials.hash_owned(password).await?;

        let student = self
            .store
            .create(StudentDraft {
                email,
                password_hash,
                first_name,
                last_name,
                age,
                course_ids,
            })
            .await?;
        info!(student_id = %student.id, "student registered");
        Ok(student.profile())
    }

    pub async fn get_student(&self, id: &str) -> Result<StudentProfile, AppError> {
        validate_student_id(id)?;
        self.store
            .read(id)
            .await?
            .map(|student| student.profile())
            .ok_or_else(|| AppError::not_found(format!("student {id}")))
    }

    /// Students enrolled in a course; `NotFound` when there are none
    pub async fn students_by_course(&self, course_id: &str) -> Result<Vec<StudentProfile>, AppError> {
        validate_course_id(course_id)?;
        let students = self.store.read_by_course(course_id).await?;
        if students.is_empty() {
            return Err(AppError::not_found(format!("students of course {course_id}")));
        }
        Ok(students.iter().map(StudentProfile::from).collect())
    }

    pub async fn update_student(
        &self,
        id: &str,
        update: ProfileUpdate,
    ) -> Result<StudentProfile, AppError> {
        validate_student_id(id)?;
        validate_profile_update(&update)?;
        let student = self.store.update(id, &update).await?;
        Ok(student.profile())
    }

    /// Remove a student and end all of their sessions.
    ///
    /// Sessions are revoked first: a failure between the two steps leaves a
    /// student without sessions rather than sessions without a student.
    #[tracing::instrument(skip(self))]
    pub async fn delete_student(&self, id: &str) -> Result<(), AppError> {
        validate_student_id(id)?;
        self.auth.logout(id).await?;
        self.store.delete(id).await?;
        info!(student_id = %id, "student deleted");
        Ok(())
    }

    pub async fn sign_in(&self, credentials: SignInCredentials) -> Result<TokenPair, AppError> {
        self.auth.authenticate(credentials).await
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        self.auth.refresh_access_token(refresh_token).await
    }

    /// End every session of `subject_id`
    pub async fn logout(&self, subject_id: &str) -> Result<(), AppError> {
        self.auth.logout(subject_id).await.map(|_| ())
    }

    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AppError> {
        self.auth.revoke_refresh_token(refresh_token).await
    }

    /// Validate a bearer access token
    pub fn authorize(&self, access_token: &str) -> Result<AccessClaims, AppError> {
        self.auth.validate_access_token(access_token)
    }
}
