use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::state::AppState;

pub mod courses;
pub mod educators;
pub mod requests;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/requests", get(requests::list_requests))
        .route(
            "/requests/{request_id}/approve",
            post(requests::approve_request),
        )
        .route(
            "/requests/{request_id}/reject",
            post(requests::reject_request),
        )
        .route("/courses", get(courses::list_courses))
        .route("/courses/{course_id}", delete(courses::delete_course))
        .route("/educators", get(educators::list_educators))
        .route("/educators/{user_id}/ban", post(educators::ban_educator))
}
