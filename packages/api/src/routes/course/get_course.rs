use axum::{
    Extension, Json,
    extract::{Path, State},
};
use lectern::catalog;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    entity::{course, enrollment, lecture},
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
    user_management::is_enrolled,
};

use super::{CourseSummary, load_content, load_ratings, summarize};

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetail {
    pub course: CourseSummary,
    pub chapters: Vec<catalog::Chapter>,
    pub enrolled_count: u64,
    pub viewer_enrolled: bool,
}

#[utoipa::path(
    get,
    path = "/courses/{course_id}",
    tag = "courses",
    params(("course_id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Course detail; locked lecture urls are blanked for non-enrolled viewers", body = CourseDetail),
        (status = 404, description = "Unknown or unpublished course")
    )
)]
#[tracing::instrument(name = "GET /courses/{course_id}", skip(state, user))]
pub async fn get_course(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(course_id): Path<String>,
) -> Result<Json<CourseDetail>, ApiError> {
    let course = course::Entity::find_by_id(&course_id)
        .one(&state.db)
        .await?
        .filter(|c| c.is_published)
        .ok_or(ApiError::NOT_FOUND)?;

    let viewer_enrolled = match user.sub() {
        Ok(sub) => is_enrolled(&state.db, &sub, &course_id).await?,
        Err(_) => false,
    };

    let mut chapters = load_content(&state.db, &course_id).await?;
    if !viewer_enrolled {
        // Privacy rule: locked video sources never leave the server for
        // viewers without a confirmed enrollment.
        catalog::redact_locked_lectures(&mut chapters);
    }

    let enrolled_count = enrollment::Entity::find()
        .filter(enrollment::Column::CourseId.eq(&course_id))
        .count(&state.db)
        .await?;

    let ratings = load_ratings(&state.db, &course_id).await?;
    let lectures = lecture::Entity::find()
        .filter(lecture::Column::CourseId.eq(&course_id))
        .all(&state.db)
        .await?;

    Ok(Json(CourseDetail {
        course: summarize(course, &lectures, &ratings),
        chapters,
        enrolled_count,
        viewer_enrolled,
    }))
}
