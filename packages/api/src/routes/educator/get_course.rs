use axum::{
    Extension, Json,
    extract::{Path, State},
};
use lectern::catalog;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::{
    entity::course,
    error::ApiError,
    middleware::jwt::AppUser,
    routes::course::load_content,
    state::AppState,
};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducatorCourse {
    pub course: course::Model,
    pub chapters: Vec<catalog::Chapter>,
}

/// Unredacted course detail for its owner.
#[tracing::instrument(name = "GET /educator/courses/{course_id}", skip(state, user))]
pub async fn get_course(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(course_id): Path<String>,
) -> Result<Json<EducatorCourse>, ApiError> {
    let educator = user.require_educator(&state).await?;

    let course = course::Entity::find()
        .filter(course::Column::Id.eq(&course_id))
        .filter(course::Column::EducatorId.eq(&educator.id))
        .one(&state.db)
        .await?
        .ok_or(ApiError::NOT_FOUND)?;

    let chapters = load_content(&state.db, &course_id).await?;

    Ok(Json(EducatorCourse { course, chapters }))
}
