use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr};
use serde::Serialize;

use crate::{
    entity::{sea_orm_active_enums::UserRole, user},
    error::ApiError,
    middleware::jwt::AppUser,
    routes::user::info::UserInfo,
    state::AppState,
};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BanResponse {
    pub user_id: String,
    pub role: UserRole,
}

#[tracing::instrument(name = "GET /admin/educators", skip(state, user))]
pub async fn list_educators(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<Vec<UserInfo>>, ApiError> {
    user.require_admin(&state).await?;

    let educators = user::Entity::find()
        .filter(user::Column::Role.eq(UserRole::Educator))
        .all(&state.db)
        .await?;

    Ok(Json(
        educators
            .into_iter()
            .map(|u| UserInfo {
                id: u.id,
                name: u.name,
                email: u.email,
                avatar_url: u.avatar_url,
                role: u.role,
                created_at: u.created_at,
            })
            .collect(),
    ))
}

/// Demotes an educator back to student. Their courses stay in the catalog
/// until an admin removes them explicitly.
#[tracing::instrument(name = "POST /admin/educators/{user_id}/ban", skip(state, user))]
pub async fn ban_educator(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(user_id): Path<String>,
) -> Result<Json<BanResponse>, ApiError> {
    user.require_admin(&state).await?;

    let demoted = user::Entity::update_many()
        .col_expr(user::Column::Role, Expr::value(UserRole::Student))
        .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
        .filter(user::Column::Id.eq(&user_id))
        .filter(user::Column::Role.eq(UserRole::Educator))
        .exec(&state.db)
        .await?;

    if demoted.rows_affected == 0 {
        return Err(ApiError::not_found("Educator not found"));
    }

    tracing::info!(user_id = %user_id, "Educator role revoked");

    Ok(Json(BanResponse {
        user_id,
        role: UserRole::Student,
    }))
}
