use axum::{Extension, Json, extract::State};
use serde::Serialize;

use crate::{
    entity::sea_orm_active_enums::UserRole, error::ApiError, middleware::jwt::AppUser,
    state::AppState,
};

/// Public view of the caller's own profile. Payment-collaborator ids stay
/// server-side.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub role: UserRole,
    pub created_at: chrono::NaiveDateTime,
}

#[tracing::instrument(name = "GET /user/info", skip(state, user))]
pub async fn user_info(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<UserInfo>, ApiError> {
    let model = user.get_user(&state).await?;
    Ok(Json(UserInfo {
        id: model.id,
        name: model.name,
        email: model.email,
        avatar_url: model.avatar_url,
        role: model.role,
        created_at: model.created_at,
    }))
}
