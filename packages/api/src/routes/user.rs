use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod enrollments;
pub mod info;
pub mod progress;
pub mod purchase;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/info", get(info::user_info))
        .route("/enrollments", get(enrollments::get_enrollments))
        .route("/purchases", post(purchase::initiate_purchase))
        .route("/progress/{course_id}", get(progress::get_progress))
        .route("/progress/toggle", post(progress::toggle_progress))
}
