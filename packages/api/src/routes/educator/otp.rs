use axum::{Extension, Json, extract::State};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, EntityTrait, QueryFilter,
    sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::{
        educator_request, user,
        sea_orm_active_enums::{RequestStatus, UserRole},
    },
    error::ApiError,
    mail::templates,
    middleware::jwt::AppUser,
    state::AppState,
};

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OtpResponse {
    pub message: String,
}

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct VerifyOtpParams {
    pub code: String,
}

/// POST /educator/otp
///
/// Issues a verification code for the caller and mails it to the platform
/// contact, who relays it after vetting. An alternative to the admin
/// review queue for small deployments.
#[tracing::instrument(name = "POST /educator/otp", skip(state, user))]
pub async fn request_otp(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<OtpResponse>, ApiError> {
    let user_model = user.get_user(&state).await?;

    if user_model.role != UserRole::Student {
        return Err(ApiError::conflict("You are already an educator"));
    }

    let mail_client = state
        .mail_client
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Mail is not configured"))?;

    let code = state.otp_store.issue(&user_model.id).await?;

    let message = templates::educator_otp(
        &state.platform.contact.email,
        &state.platform.name,
        &user_model.name,
        &code,
    );

    if let Err(e) = mail_client.send(message).await {
        tracing::error!(user_id = %user_model.id, error = %e, "Failed to send verification code");
        return Err(ApiError::service_unavailable(
            "Could not deliver the verification code, retry later",
        ));
    }

    tracing::info!(user_id = %user_model.id, "Educator verification code issued");

    Ok(Json(OtpResponse {
        message: "Verification code sent".to_string(),
    }))
}

/// POST /educator/otp/verify
///
/// Promotes the caller to educator when the relayed code checks out.
#[tracing::instrument(name = "POST /educator/otp/verify", skip(state, user, params))]
pub async fn verify_otp(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(params): Json<VerifyOtpParams>,
) -> Result<Json<OtpResponse>, ApiError> {
    let user_model = user.get_user(&state).await?;

    if !state.otp_store.verify(&user_model.id, &params.code).await? {
        return Err(ApiError::forbidden("Invalid or expired code"));
    }

    let now = Utc::now().naive_utc();
    user::Entity::update_many()
        .col_expr(user::Column::Role, Expr::value(UserRole::Educator))
        .col_expr(user::Column::UpdatedAt, Expr::value(now))
        .filter(user::Column::Id.eq(&user_model.id))
        .exec(&state.db)
        .await?;

    // Close out any open application so the review queue stays tidy
    educator_request::Entity::update_many()
        .col_expr(
            educator_request::Column::Status,
            Expr::value(RequestStatus::Approved),
        )
        .col_expr(educator_request::Column::UpdatedAt, Expr::value(now))
        .filter(educator_request::Column::UserId.eq(&user_model.id))
        .filter(educator_request::Column::Status.eq(RequestStatus::Pending))
        .exec(&state.db)
        .await?;

    tracing::info!(user_id = %user_model.id, "User promoted to educator via verification code");

    Ok(Json(OtpResponse {
        message: "You are now approved as an educator".to_string(),
    }))
}
