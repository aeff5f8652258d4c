// ============================
// students-backend-lib/src/handlers/students.rs
// ============================
//! Student CRUD handlers.
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use std::sync::Arc;
use students_common::{NewStudent, ProfileUpdate, StudentProfile};

use super::malformed_body;
use crate::error::AppError;
use crate::AppState;

/// `POST /students` and `POST /auth/sign-up`
pub async fn create_student(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewStudent>, JsonRejection>,
) -> Result<(StatusCode, Json<StudentProfile>), AppError> {
    let Json(input) = payload.map_err(malformed_body)?;
    let profile = state.students.sign_up(input).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

/// `GET /students/{id}`
pub async fn get_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<StudentProfile>, AppError> {
    Ok(Json(state.students.get_student(&id).await?))
}

/// `PUT /students/{id}`
pub async fn update_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ProfileUpdate>, JsonRejection>,
) -> Result<Json<StudentProfile>, AppError> {
    let Json(update) = payload.map_err(malformed_body)?;
    Ok(Json(state.students.update_student(&id, update).await?))
}

/// `DELETE /students/{id}`
pub async fn delete_student(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.students.delete_student(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /courses/{id}/students`
pub async fn students_by_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<Json<Vec<StudentProfile>>, AppError> {
    Ok(Json(state.students.students_by_course(&course_id).await?))
}
