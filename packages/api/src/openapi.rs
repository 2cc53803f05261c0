use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lectern API",
        description = "Course marketplace backend: catalog, enrollment ledger and progress tracking"
    ),
    paths(
        crate::routes::health::get_db_health,
        crate::routes::course::list_courses::list_courses,
        crate::routes::course::get_course::get_course,
        crate::routes::course::rate_course::rate_course,
        crate::routes::user::purchase::initiate_purchase,
        crate::routes::user::progress::get_progress,
        crate::routes::user::progress::toggle_progress,
    ),
    components(schemas(
        crate::routes::health::DbStateResponse,
        crate::routes::course::CourseSummary,
        crate::routes::course::get_course::CourseDetail,
        crate::routes::course::rate_course::RateParams,
        crate::routes::course::rate_course::RateResponse,
        crate::routes::user::purchase::PurchaseParams,
        crate::routes::user::purchase::PurchaseResponse,
        crate::routes::user::progress::ProgressResponse,
        crate::routes::user::progress::ToggleParams,
        crate::routes::user::progress::ToggleResponse,
        lectern::catalog::Chapter,
        lectern::catalog::Lecture,
    )),
    tags(
        (name = "health", description = "Service health"),
        (name = "courses", description = "Public catalog"),
        (name = "user", description = "Enrollment, purchases and progress")
    )
)]
pub struct ApiDoc;
