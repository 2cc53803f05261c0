use axum::{Extension, Json, extract::State};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
};
use serde::Serialize;

use crate::{
    entity::{
        educator_request,
        sea_orm_active_enums::{RequestStatus, UserRole},
    },
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyResponse {
    pub status: RequestStatus,
    pub message: String,
}

/// POST /educator/apply
///
/// Files (or re-files) an application for the educator role, reviewed by
/// an admin. An approved application whose role was later revoked resets
/// to pending so the user can re-apply.
#[tracing::instrument(name = "POST /educator/apply", skip(state, user))]
pub async fn apply(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<ApplyResponse>, ApiError> {
    let user_model = user.get_user(&state).await?;

    let existing = educator_request::Entity::find()
        .filter(educator_request::Column::UserId.eq(&user_model.id))
        .one(&state.db)
        .await?;

    if let Some(request) = existing {
        match request.status {
            RequestStatus::Pending => {
                return Err(ApiError::conflict("Request already pending"));
            }
            RequestStatus::Approved => {
                if user_model.role == UserRole::Educator {
                    return Err(ApiError::conflict("You are already an educator"));
                }
                // Approved on paper but the role was revoked, allow a fresh review
                let mut active = request.into_active_model();
                active.status = Set(RequestStatus::Pending);
                active.updated_at = Set(Utc::now().naive_utc());
                active.update(&state.db).await?;
                return Ok(Json(ApplyResponse {
                    status: RequestStatus::Pending,
                    message: "Request sent to admin for approval".to_string(),
                }));
            }
            RequestStatus::Rejected => {
                let mut active = request.into_active_model();
                active.status = Set(RequestStatus::Pending);
                active.updated_at = Set(Utc::now().naive_utc());
                active.update(&state.db).await?;
                return Ok(Json(ApplyResponse {
                    status: RequestStatus::Pending,
                    message: "Request sent to admin for approval".to_string(),
                }));
            }
        }
    }

    let now = Utc::now().naive_utc();
    let request = educator_request::ActiveModel {
        id: Set(lectern_types::create_id()),
        user_id: Set(user_model.id.clone()),
        user_name: Set(user_model.name.clone()),
        user_email: Set(user_model.email.clone()),
        status: Set(RequestStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
    };
    request.insert(&state.db).await?;

    tracing::info!(user_id = %user_model.id, "Educator application filed");

    Ok(Json(ApplyResponse {
        status: RequestStatus::Pending,
        message: "Request sent to admin for approval".to_string(),
    }))
}
