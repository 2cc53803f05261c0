use axum::{
    Extension, Json,
    extract::{Path, State},
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, IntoActiveModel, QueryFilter,
    TransactionTrait,
    sea_query::Expr,
};
use serde::Serialize;

use crate::{
    entity::{
        educator_request, user,
        sea_orm_active_enums::{RequestStatus, UserRole},
    },
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestActionResponse {
    pub request_id: String,
    pub status: RequestStatus,
}

#[tracing::instrument(name = "GET /admin/requests", skip(state, user))]
pub async fn list_requests(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<Vec<educator_request::Model>>, ApiError> {
    user.require_admin(&state).await?;

    let requests = educator_request::Entity::find()
        .filter(educator_request::Column::Status.eq(RequestStatus::Pending))
        .all(&state.db)
        .await?;

    Ok(Json(requests))
}

/// Approval flips the request and promotes the applicant in one
/// transaction, so the review queue can never disagree with the role.
#[tracing::instrument(name = "POST /admin/requests/{request_id}/approve", skip(state, user))]
pub async fn approve_request(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(request_id): Path<String>,
) -> Result<Json<RequestActionResponse>, ApiError> {
    user.require_admin(&state).await?;

    let request = educator_request::Entity::find_by_id(&request_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Request not found"))?;

    let applicant_id = request.user_id.clone();
    state
        .db
        .transaction::<_, (), ApiError>(move |txn| {
            Box::pin(async move {
                let mut active = request.into_active_model();
                active.status = Set(RequestStatus::Approved);
                active.updated_at = Set(Utc::now().naive_utc());
                active.update(txn).await?;

                let promoted = user::Entity::update_many()
                    .col_expr(user::Column::Role, Expr::value(UserRole::Educator))
                    .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
                    .filter(user::Column::Id.eq(&applicant_id))
                    .exec(txn)
                    .await?;

                if promoted.rows_affected == 0 {
                    tracing::warn!(
                        user_id = %applicant_id,
                        "Approved request for a user that has not been synced yet"
                    );
                }
                Ok(())
            })
        })
        .await?;

    tracing::info!(request_id = %request_id, "Educator request approved");

    Ok(Json(RequestActionResponse {
        request_id,
        status: RequestStatus::Approved,
    }))
}

#[tracing::instrument(name = "POST /admin/requests/{request_id}/reject", skip(state, user))]
pub async fn reject_request(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Path(request_id): Path<String>,
) -> Result<Json<RequestActionResponse>, ApiError> {
    user.require_admin(&state).await?;

    let request = educator_request::Entity::find_by_id(&request_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Request not found"))?;

    let mut active = request.into_active_model();
    active.status = Set(RequestStatus::Rejected);
    active.updated_at = Set(Utc::now().naive_utc());
    active.update(&state.db).await?;

    tracing::info!(request_id = %request_id, "Educator request rejected");

    Ok(Json(RequestActionResponse {
        request_id,
        status: RequestStatus::Rejected,
    }))
}
