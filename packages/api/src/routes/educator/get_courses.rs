use axum::{Extension, Json, extract::State};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

use crate::{
    entity::course, error::ApiError, middleware::jwt::AppUser, state::AppState,
};

/// The owner sees the raw course rows, drafts included.
#[tracing::instrument(name = "GET /educator/courses", skip(state, user))]
pub async fn get_courses(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<Vec<course::Model>>, ApiError> {
    let educator = user.require_educator(&state).await?;

    let courses = course::Entity::find()
        .filter(course::Column::EducatorId.eq(&educator.id))
        .order_by_desc(course::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(courses))
}
