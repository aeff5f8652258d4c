// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation for student and credential payloads.

use regex::Regex;
use std::sync::LazyLock;
use students_common::{NewStudent, ProfileUpdate, SignInCredentials};
use thiserror::Error;

// Common validation constants
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_NAME_LENGTH: usize = 100;
const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_COURSE_ID_LENGTH: usize = 64;
const MAX_AGE: u32 = 150;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Possible validation errors
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid age: {0}")]
    InvalidAge(u32),

    #[error("Invalid course id: {0}")]
    InvalidCourseId(String),

    #[error("Invalid student id: {0}")]
    InvalidStudentId(String),

    #[error("Empty update")]
    EmptyUpdate,

    #[error("Malformed request body: {0}")]
    MalformedBody(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate an email address
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address format".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a raw password. Strength policy is left to the caller; this only
/// rejects empty input and inputs long enough to make hashing expensive.
pub fn validate_password(password: &str) -> ValidationResult<&str> {
    if password.is_empty() {
        return Err(ValidationError::InvalidPassword(
            "Password cannot be empty".to_string(),
        ));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(password)
}

/// Validate a first or last name
pub fn validate_name(name: &str) -> ValidationResult<&str> {
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName(format!(
            "Name cannot exceed {MAX_NAME_LENGTH} characters"
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(ValidationError::InvalidName(
            "Name contains control characters".to_string(),
        ));
    }

    Ok(name)
}

pub fn validate_age(age: u32) -> ValidationResult<u32> {
    if age > MAX_AGE {
        return Err(ValidationError::InvalidAge(age));
    }
    Ok(age)
}

/// Validate a course reference
pub fn validate_course_id(course_id: &str) -> ValidationResult<&str> {
    if course_id.is_empty() || course_id.len() > MAX_COURSE_ID_LENGTH {
        return Err(ValidationError::InvalidCourseId(format!(
            "Course id must be between 1 and {MAX_COURSE_ID_LENGTH} characters"
        )));
    }
    Ok(course_id)
}

/// Validate a student id as received from a caller
pub fn validate_student_id(id: &str) -> ValidationResult<&str> {
    if id.is_empty() || id.len() > 64 || id.contains(['/', '\\', '.']) {
        return Err(ValidationError::InvalidStudentId(id.to_string()));
    }
    Ok(id)
}

/// Validate a sign-up payload
pub fn validate_new_student(student: &NewStudent) -> ValidationResult<()> {
    validate_email(&student.email)?;
    validate_password(&student.password)?;
    validate_name(&student.first_name)?;
    validate_name(&student.last_name)?;
    validate_age(student.age)?;
    for course_id in &student.course_ids {
        validate_course_id(course_id)?;
    }
    Ok(())
}

/// Validate a profile update
pub fn validate_profile_update(update: &ProfileUpdate) -> ValidationResult<()> {
    if update.is_empty() {
        return Err(ValidationError::EmptyUpdate);
    }
    if let Some(first_name) = &update.first_name {
        validate_name(first_name)?;
    }
    if let Some(last_name) = &update.last_name {
        validate_name(last_name)?;
    }
    if let Some(age) = update.age {
        validate_age(age)?;
    }
    Ok(())
}

/// Validate sign-in input. Only presence is checked so that malformed emails
/// fail the same way as unknown ones.
pub fn validate_credentials(credentials: &SignInCredentials) -> ValidationResult<()> {
    if credentials.email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }
    validate_password(&credentials.password)?;
    Ok(())
}
