use axum::{Extension, Json, extract::State};
use base64::Engine;
use chrono::Utc;
use lectern::catalog::CourseDraft;
use sea_orm::{ActiveValue::Set, EntityTrait, TransactionTrait};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::{chapter, course, lecture},
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
};

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ThumbnailUpload {
    pub content_type: String,
    /// Base64-encoded image bytes
    pub data: String,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseParams {
    pub course: CourseDraft,
    pub thumbnail: Option<ThumbnailUpload>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseResponse {
    pub course_id: String,
}

/// Upload happens before any row is written, so a collaborator failure
/// aborts the whole creation instead of leaving a course that references a
/// missing asset.
pub async fn upload_thumbnail(
    state: &AppState,
    course_id: &str,
    upload: &ThumbnailUpload,
) -> Result<String, ApiError> {
    let host = state
        .asset_host
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Asset uploads are not configured"))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&upload.data)
        .map_err(|_| ApiError::bad_request("Thumbnail is not valid base64"))?;

    let key = format!("courses/{course_id}/thumbnail");
    host.upload_image(&key, bytes, &upload.content_type)
        .await
        .map_err(|e| {
            tracing::error!(course_id = %course_id, error = %e, "Thumbnail upload failed");
            ApiError::service_unavailable("Thumbnail upload failed, retry later")
        })
}

/// Build the chapter and lecture rows for a validated draft.
pub fn content_rows(
    course_id: &str,
    draft: &CourseDraft,
) -> (Vec<chapter::ActiveModel>, Vec<lecture::ActiveModel>) {
    let mut chapters = Vec::new();
    let mut lectures = Vec::new();
    for (chapter_pos, chapter_draft) in draft.chapters.iter().enumerate() {
        let chapter_id = lectern_types::create_id();
        chapters.push(chapter::ActiveModel {
            id: Set(chapter_id.clone()),
            course_id: Set(course_id.to_string()),
            title: Set(chapter_draft.title.clone()),
            position: Set(chapter_pos as i32),
        });
        for (lecture_pos, lecture_draft) in chapter_draft.lectures.iter().enumerate() {
            lectures.push(lecture::ActiveModel {
                id: Set(lectern_types::create_id()),
                chapter_id: Set(chapter_id.clone()),
                course_id: Set(course_id.to_string()),
                title: Set(lecture_draft.title.clone()),
                duration_minutes: Set(lecture_draft.duration_minutes),
                video_url: Set(lecture_draft.video_url.clone()),
                is_preview_free: Set(lecture_draft.is_preview_free),
                position: Set(lecture_pos as i32),
            });
        }
    }
    (chapters, lectures)
}

#[tracing::instrument(name = "POST /educator/courses", skip(state, user, params))]
pub async fn create_course(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(params): Json<CreateCourseParams>,
) -> Result<Json<CreateCourseResponse>, ApiError> {
    let educator = user.require_educator(&state).await?;

    params.course.validate()?;

    let course_id = lectern_types::create_id();

    let thumbnail_url = match &params.thumbnail {
        Some(upload) => Some(upload_thumbnail(&state, &course_id, upload).await?),
        None => None,
    };

    let draft = params.course;
    let educator_id = educator.id.clone();
    let now = Utc::now().naive_utc();
    let (chapters, lectures) = content_rows(&course_id, &draft);

    let new_course = course::ActiveModel {
        id: Set(course_id.clone()),
        educator_id: Set(educator_id),
        title: Set(draft.title.clone()),
        description: Set(draft.description.clone()),
        price_cents: Set(draft.price_cents),
        discount: Set(draft.discount),
        is_published: Set(draft.is_published),
        thumbnail_url: Set(thumbnail_url),
        created_at: Set(now),
        updated_at: Set(now),
    };

    state
        .db
        .transaction::<_, (), ApiError>(move |txn| {
            Box::pin(async move {
                course::Entity::insert(new_course)
                    .exec_without_returning(txn)
                    .await?;
                chapter::Entity::insert_many(chapters)
                    .exec_without_returning(txn)
                    .await?;
                lecture::Entity::insert_many(lectures)
                    .exec_without_returning(txn)
                    .await?;
                Ok(())
            })
        })
        .await?;

    tracing::info!(course_id = %course_id, "Course created");

    Ok(Json(CreateCourseResponse { course_id }))
}
