// ============================
// students-backend-lib/src/router.rs
// ============================
//! HTTP router.
use axum::{
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::handlers::{auth, students};
use crate::AppState;

/// Create the service router
pub fn create_router(state: Arc<AppState>) -> Router {
    let timeout = state.settings.request_timeout();

    Router::new()
        .route("/health", get(health))
        .route("/auth/sign-up", post(students::create_student))
        .route("/auth/sign-in", post(auth::sign_in))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/revoke", post(auth::revoke))
        .route("/auth/logout", post(auth::logout))
        .route("/students", post(students::create_student))
        .route(
            "/students/{id}",
            get(students::get_student)
                .put(students::update_student)
                .delete(students::delete_student),
        )
        .route("/courses/{id}/students", get(students::students_by_course))
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
