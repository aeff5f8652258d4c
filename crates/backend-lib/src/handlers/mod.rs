// ============================
// students-backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers. Request decoding and status mapping only; every decision
//! is made by [`crate::usecase::StudentService`].
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequestParts;
use axum::http::{header::AUTHORIZATION, request::Parts};
use std::sync::Arc;
use students_common::StudentId;

use crate::error::AppError;
use crate::validation::ValidationError;
use crate::AppState;

pub mod auth;
pub mod students;

/// Student authenticated by a `Bearer` access token
#[derive(Debug, Clone)]
pub struct AuthenticatedStudent {
    pub student_id: StudentId,
}

impl FromRequestParts<Arc<AppState>> for AuthenticatedStudent {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or(AppError::InvalidToken)?;

        let claims = state.students.authorize(token.trim())?;
        Ok(Self {
            student_id: claims.sub,
        })
    }
}

/// Map axum's JSON rejection onto the service error envelope
pub(crate) fn malformed_body(rejection: JsonRejection) -> AppError {
    ValidationError::MalformedBody(rejection.body_text()).into()
}
