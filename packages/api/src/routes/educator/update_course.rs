use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use lectern::catalog::{ChapterDraft, CourseDraft};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::{chapter, course, lecture},
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
};

use super::create_course::{ThumbnailUpload, content_rows, upload_thumbnail};

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseParams {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price_cents: Option<i64>,
    pub discount: Option<i32>,
    pub is_published: Option<bool>,
    /// When present, replaces the entire content tree
    pub chapters: Option<Vec<ChapterDraft>>,
    pub thumbnail: Option<ThumbnailUpload>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseResponse {
    pub course_id: String,
}

#[tracing::instrument(name = "PATCH /educator/courses/{course_id}", skip(state, user, params))]
pub async fn update_course(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(course_id): Path<String>,
    Json(params): Json<UpdateCourseParams>,
) -> Result<Json<UpdateCourseResponse>, ApiError> {
    let educator = user.require_educator(&state).await?;

    // Missing and unowned look identical to the caller
    let existing = course::Entity::find()
        .filter(course::Column::Id.eq(&course_id))
        .filter(course::Column::EducatorId.eq(&educator.id))
        .one(&state.db)
        .await?
        .ok_or(ApiError::NOT_FOUND)?;

    let merged = CourseDraft {
        title: params.title.clone().unwrap_or_else(|| existing.title.clone()),
        description: params
            .description
            .clone()
            .unwrap_or_else(|| existing.description.clone()),
        price_cents: params.price_cents.unwrap_or(existing.price_cents),
        discount: params.discount.unwrap_or(existing.discount),
        is_published: params.is_published.unwrap_or(existing.is_published),
        chapters: params.chapters.clone().unwrap_or_default(),
    };
    if params.chapters.is_some() {
        merged.validate()?;
    } else {
        // Content untouched this request, only the scalar fields need checking
        if merged.title.trim().is_empty() {
            return Err(ApiError::bad_request("course title must not be empty"));
        }
        if merged.price_cents < 0 {
            return Err(ApiError::bad_request("course price must not be negative"));
        }
        if !(0..=100).contains(&merged.discount) {
            return Err(ApiError::bad_request("discount must be between 0 and 100"));
        }
    }

    let thumbnail_url = match &params.thumbnail {
        Some(upload) => Some(upload_thumbnail(&state, &course_id, upload).await?),
        None => None,
    };

    let replace_content = params.chapters.is_some();
    let content = params
        .chapters
        .as_ref()
        .map(|_| content_rows(&course_id, &merged));

    let mut active = course::ActiveModel {
        id: Set(course_id.clone()),
        educator_id: Set(educator.id.clone()),
        title: Set(merged.title.clone()),
        description: Set(merged.description.clone()),
        price_cents: Set(merged.price_cents),
        discount: Set(merged.discount),
        is_published: Set(merged.is_published),
        thumbnail_url: Set(existing.thumbnail_url.clone()),
        created_at: Set(existing.created_at),
        updated_at: Set(Utc::now().naive_utc()),
    };
    if let Some(url) = thumbnail_url {
        active.thumbnail_url = Set(Some(url));
    }

    let txn_course_id = course_id.clone();
    state
        .db
        .transaction::<_, (), ApiError>(move |txn| {
            Box::pin(async move {
                course::Entity::update(active).exec(txn).await?;

                if replace_content
                    && let Some((chapters, lectures)) = content
                {
                    lecture::Entity::delete_many()
                        .filter(lecture::Column::CourseId.eq(&txn_course_id))
                        .exec(txn)
                        .await?;
                    chapter::Entity::delete_many()
                        .filter(chapter::Column::CourseId.eq(&txn_course_id))
                        .exec(txn)
                        .await?;
                    chapter::Entity::insert_many(chapters)
                        .exec_without_returning(txn)
                        .await?;
                    lecture::Entity::insert_many(lectures)
                        .exec_without_returning(txn)
                        .await?;
                }
                Ok(())
            })
        })
        .await?;

    tracing::info!(course_id = %course_id, "Course updated");

    Ok(Json(UpdateCourseResponse { course_id }))
}
