// ============================
// students-backend-lib/src/handlers/auth.rs
// ============================
//! Sign-in, refresh and logout handlers.
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use students_common::{RefreshRequest, SignInCredentials, TokenPair};

use super::{malformed_body, AuthenticatedStudent};
use crate::error::AppError;
use crate::AppState;

/// `POST /auth/sign-in`
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SignInCredentials>, JsonRejection>,
) -> Result<Json<TokenPair>, AppError> {
    let Json(credentials) = payload.map_err(malformed_body)?;
    Ok(Json(state.students.sign_in(credentials).await?))
}

/// `POST /auth/refresh`
pub async fn refresh(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, AppError> {
    let Json(request) = payload.map_err(malformed_body)?;
    Ok(Json(state.students.refresh(&request.refresh_token).await?))
}

/// `POST /auth/revoke`: revoke a single refresh token
pub async fn revoke(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(request) = payload.map_err(malformed_body)?;
    state.students.revoke(&request.refresh_token).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /auth/logout`: end every session of the bearer
pub async fn logout(
    State(state): State<Arc<AppState>>,
    student: AuthenticatedStudent,
) -> Result<StatusCode, AppError> {
    state.students.logout(&student.student_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
