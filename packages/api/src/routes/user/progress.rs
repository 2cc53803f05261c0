use std::collections::HashSet;

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use lectern::progress;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    sea_query::OnConflict,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::{lecture, lecture_progress},
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
    user_management::is_enrolled,
};

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    pub course_id: String,
    pub completed_lecture_ids: Vec<String>,
    pub completion_percent: u8,
    pub certificate_eligible: bool,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleParams {
    pub course_id: String,
    pub lecture_id: String,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ToggleResponse {
    pub lecture_id: String,
    pub completed: bool,
    pub completion_percent: u8,
    pub certificate_eligible: bool,
}

/// Storage-level set-membership toggle. Deleting an existing row unmarks
/// the lecture; otherwise a conflict-free insert marks it. Either branch is
/// a single atomic statement, so concurrent double-clicks cannot lose
/// sibling updates the way an array read-modify-write would.
pub async fn toggle_lecture<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    course_id: &str,
    lecture_id: &str,
) -> Result<bool, ApiError> {
    let deleted = lecture_progress::Entity::delete_by_id((
        user_id.to_string(),
        course_id.to_string(),
        lecture_id.to_string(),
    ))
    .exec(conn)
    .await?;

    if deleted.rows_affected > 0 {
        return Ok(false);
    }

    let row = lecture_progress::ActiveModel {
        user_id: Set(user_id.to_string()),
        course_id: Set(course_id.to_string()),
        lecture_id: Set(lecture_id.to_string()),
        created_at: Set(Utc::now().naive_utc()),
    };
    lecture_progress::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([
                lecture_progress::Column::UserId,
                lecture_progress::Column::CourseId,
                lecture_progress::Column::LectureId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    Ok(true)
}

async fn completed_set<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    course_id: &str,
) -> Result<HashSet<String>, ApiError> {
    let rows = lecture_progress::Entity::find()
        .filter(lecture_progress::Column::UserId.eq(user_id))
        .filter(lecture_progress::Column::CourseId.eq(course_id))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|r| r.lecture_id).collect())
}

async fn course_lecture_ids<C: ConnectionTrait>(
    conn: &C,
    course_id: &str,
) -> Result<HashSet<String>, ApiError> {
    let rows = lecture::Entity::find()
        .filter(lecture::Column::CourseId.eq(course_id))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(|l| l.id).collect())
}

#[utoipa::path(
    get,
    path = "/user/progress/{course_id}",
    tag = "user",
    params(("course_id" = String, Path, description = "Course id")),
    responses(
        (status = 200, description = "Completed lectures and derived completion state", body = ProgressResponse)
    )
)]
#[tracing::instrument(name = "GET /user/progress/{course_id}", skip(state, user))]
pub async fn get_progress(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(course_id): Path<String>,
) -> Result<Json<ProgressResponse>, ApiError> {
    let sub = user.sub()?;

    // A viewer with no recorded progress gets the neutral empty state, a
    // missing record is not an error.
    let completed = completed_set(&state.db, &sub, &course_id).await?;
    let all_lectures = course_lecture_ids(&state.db, &course_id).await?;

    let completion_percent = progress::completion_percent(&all_lectures, &completed);
    let certificate_eligible = progress::certificate_eligible(&all_lectures, &completed);

    let mut completed_lecture_ids: Vec<String> = completed.into_iter().collect();
    completed_lecture_ids.sort();

    Ok(Json(ProgressResponse {
        course_id,
        completed_lecture_ids,
        completion_percent,
        certificate_eligible,
    }))
}

#[utoipa::path(
    post,
    path = "/user/progress/toggle",
    tag = "user",
    request_body = ToggleParams,
    responses(
        (status = 200, description = "Completion mark toggled", body = ToggleResponse),
        (status = 403, description = "Caller is not enrolled in the course"),
        (status = 404, description = "Lecture does not exist in the course")
    )
)]
#[tracing::instrument(name = "POST /user/progress/toggle", skip(state, user, params))]
pub async fn toggle_progress(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(params): Json<ToggleParams>,
) -> Result<Json<ToggleResponse>, ApiError> {
    let sub = user.sub()?;

    if !is_enrolled(&state.db, &sub, &params.course_id).await? {
        return Err(ApiError::forbidden("Course has not been purchased"));
    }

    // Progress may only reference lectures that exist in this course
    lecture::Entity::find_by_id(&params.lecture_id)
        .filter(lecture::Column::CourseId.eq(&params.course_id))
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Lecture not found in course"))?;

    let completed = toggle_lecture(&state.db, &sub, &params.course_id, &params.lecture_id).await?;

    let completed_ids = completed_set(&state.db, &sub, &params.course_id).await?;
    let all_lectures = course_lecture_ids(&state.db, &params.course_id).await?;

    Ok(Json(ToggleResponse {
        lecture_id: params.lecture_id,
        completed,
        completion_percent: progress::completion_percent(&all_lectures, &completed_ids),
        certificate_eligible: progress::certificate_eligible(&all_lectures, &completed_ids),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    #[tokio::test]
    async fn toggle_marks_then_unmarks() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                // First toggle: nothing to delete, insert marks the lecture
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                // Second toggle: the delete finds the row and unmarks it
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let first = toggle_lecture(&db, "user_1", "course_1", "lecture_1")
            .await
            .unwrap();
        assert!(first);

        let second = toggle_lecture(&db, "user_1", "course_1", "lecture_1")
            .await
            .unwrap();
        assert!(!second, "toggling twice must return to the original state");
    }
}
