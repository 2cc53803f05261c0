use axum::{Extension, Json, extract::State};
use lectern::catalog;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    entity::{course, enrollment, lecture},
    error::ApiError,
    middleware::jwt::AppUser,
    routes::course::{CourseSummary, load_content, load_ratings, summarize},
    state::AppState,
};

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourse {
    pub course: CourseSummary,
    /// Full content tree with video urls, the caller is enrolled
    pub chapters: Vec<catalog::Chapter>,
    pub enrolled_at: chrono::NaiveDateTime,
}

#[tracing::instrument(name = "GET /user/enrollments", skip(state, user))]
pub async fn get_enrollments(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<Vec<EnrolledCourse>>, ApiError> {
    let sub = user.sub()?;

    let enrollments = enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(&sub))
        .all(&state.db)
        .await?;

    let mut result = Vec::with_capacity(enrollments.len());
    for e in enrollments {
        let Some(course) = course::Entity::find_by_id(&e.course_id).one(&state.db).await? else {
            continue;
        };
        let chapters = load_content(&state.db, &e.course_id).await?;
        let ratings = load_ratings(&state.db, &e.course_id).await?;
        let lectures = lecture::Entity::find()
            .filter(lecture::Column::CourseId.eq(&e.course_id))
            .all(&state.db)
            .await?;
        result.push(EnrolledCourse {
            course: summarize(course, &lectures, &ratings),
            chapters,
            enrolled_at: e.created_at,
        });
    }

    Ok(Json(result))
}
