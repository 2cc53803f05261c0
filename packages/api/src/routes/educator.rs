use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod apply;
pub mod create_course;
pub mod dashboard;
pub mod get_course;
pub mod get_courses;
pub mod otp;
pub mod outline;
pub mod students;
pub mod update_course;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/apply", post(apply::apply))
        .route("/otp", post(otp::request_otp))
        .route("/otp/verify", post(otp::verify_otp))
        .route(
            "/courses",
            get(get_courses::get_courses).post(create_course::create_course),
        )
        .route(
            "/courses/{course_id}",
            get(get_course::get_course).patch(update_course::update_course),
        )
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/students", get(students::get_students))
        .route("/outline", post(outline::generate_outline))
}
