use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use lectern::catalog;
use sea_orm::{ActiveValue::Set, EntityTrait, sea_query::OnConflict};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::{course, course_rating},
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
    user_management::is_enrolled,
};

use super::load_ratings;

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct RateParams {
    /// 1-5 stars; 0 removes an existing rating
    pub rating: i16,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    pub course_id: String,
    pub rating: Option<i16>,
    pub average: Option<f64>,
    pub rating_count: usize,
}

#[utoipa::path(
    post,
    path = "/courses/{course_id}/rating",
    tag = "courses",
    params(("course_id" = String, Path, description = "Course id")),
    request_body = RateParams,
    responses(
        (status = 200, description = "Rating upserted or removed", body = RateResponse),
        (status = 403, description = "Caller is not enrolled in the course")
    )
)]
#[tracing::instrument(name = "POST /courses/{course_id}/rating", skip(state, user))]
pub async fn rate_course(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(course_id): Path<String>,
    Json(params): Json<RateParams>,
) -> Result<Json<RateResponse>, ApiError> {
    let sub = user.sub()?;

    course::Entity::find_by_id(&course_id)
        .one(&state.db)
        .await?
        .ok_or(ApiError::NOT_FOUND)?;

    // Enrollment gates rating, regardless of the submitted value
    if !is_enrolled(&state.db, &sub, &course_id).await? {
        return Err(ApiError::forbidden("Course has not been purchased"));
    }

    let rating = match params.rating {
        0 => {
            // "Remove my rating", a no-op when none exists
            course_rating::Entity::delete_by_id((course_id.clone(), sub.clone()))
                .exec(&state.db)
                .await?;
            None
        }
        r @ 1..=5 => {
            let now = Utc::now().naive_utc();
            let row = course_rating::ActiveModel {
                course_id: Set(course_id.clone()),
                user_id: Set(sub.clone()),
                rating: Set(r),
                created_at: Set(now),
                updated_at: Set(now),
            };
            course_rating::Entity::insert(row)
                .on_conflict(
                    OnConflict::columns([
                        course_rating::Column::CourseId,
                        course_rating::Column::UserId,
                    ])
                    .update_columns([
                        course_rating::Column::Rating,
                        course_rating::Column::UpdatedAt,
                    ])
                    .to_owned(),
                )
                .exec_without_returning(&state.db)
                .await?;
            Some(r)
        }
        _ => {
            return Err(ApiError::bad_request("rating must be between 1 and 5"));
        }
    };

    let ratings = load_ratings(&state.db, &course_id).await?;

    Ok(Json(RateResponse {
        course_id,
        rating,
        average: catalog::average_rating(&ratings),
        rating_count: ratings.len(),
    }))
}
