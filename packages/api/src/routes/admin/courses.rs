use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};
use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use serde::Serialize;

use crate::{
    entity::{chapter, course, course_rating, enrollment, lecture, lecture_progress, purchase},
    error::ApiError,
    middleware::jwt::AppUser,
    routes::PaginationParams,
    state::AppState,
};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteCourseResponse {
    pub course_id: String,
}

/// Moderation view over the whole catalog, drafts included.
#[tracing::instrument(name = "GET /admin/courses", skip(state, user))]
pub async fn list_courses(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<Vec<course::Model>>, ApiError> {
    user.require_admin(&state).await?;

    let courses = course::Entity::find()
        .order_by_desc(course::Column::CreatedAt)
        .limit(pagination.limit.unwrap_or(100).min(500))
        .offset(pagination.offset.unwrap_or(0))
        .all(&state.db)
        .await?;

    Ok(Json(courses))
}

/// Hard removal with an explicit cascade over every dependent record, so
/// no progress, rating, enrollment or ledger row is left dangling.
#[tracing::instrument(name = "DELETE /admin/courses/{course_id}", skip(state, user))]
pub async fn delete_course(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(course_id): Path<String>,
) -> Result<Json<DeleteCourseResponse>, ApiError> {
    user.require_admin(&state).await?;

    course::Entity::find_by_id(&course_id)
        .one(&state.db)
        .await?
        .ok_or(ApiError::NOT_FOUND)?;

    let txn_course_id = course_id.clone();
    state
        .db
        .transaction::<_, (), ApiError>(move |txn| {
            Box::pin(async move {
                lecture_progress::Entity::delete_many()
                    .filter(lecture_progress::Column::CourseId.eq(&txn_course_id))
                    .exec(txn)
                    .await?;
                course_rating::Entity::delete_many()
                    .filter(course_rating::Column::CourseId.eq(&txn_course_id))
                    .exec(txn)
                    .await?;
                enrollment::Entity::delete_many()
                    .filter(enrollment::Column::CourseId.eq(&txn_course_id))
                    .exec(txn)
                    .await?;
                purchase::Entity::delete_many()
                    .filter(purchase::Column::CourseId.eq(&txn_course_id))
                    .exec(txn)
                    .await?;
                lecture::Entity::delete_many()
                    .filter(lecture::Column::CourseId.eq(&txn_course_id))
                    .exec(txn)
                    .await?;
                chapter::Entity::delete_many()
                    .filter(chapter::Column::CourseId.eq(&txn_course_id))
                    .exec(txn)
                    .await?;
                course::Entity::delete_by_id(&txn_course_id).exec(txn).await?;
                Ok(())
            })
        })
        .await?;

    tracing::info!(course_id = %course_id, "Course deleted with cascade");

    Ok(Json(DeleteCourseResponse { course_id }))
}
