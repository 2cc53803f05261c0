use std::time::Duration;

use axum::{Extension, Json, extract::State};
use chrono::Utc;
use lectern::catalog;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, sea_query::Expr,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    entity::{course, purchase, sea_orm_active_enums::PurchaseStatus},
    error::ApiError,
    middleware::jwt::AppUser,
    payment::CheckoutRequest,
    state::AppState,
    user_management::is_enrolled,
};

const CHECKOUT_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Clone, Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseParams {
    pub course_id: String,
    /// Optional success URL override (frontend will append receipt info)
    pub success_url: Option<String>,
    /// Optional cancel URL override
    pub cancel_url: Option<String>,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseResponse {
    pub checkout_url: Option<String>,
    pub already_enrolled: bool,
    pub course_id: String,
}

/// POST /user/purchases
///
/// Creates a pending ledger entry and a checkout session at the payment
/// collaborator. Enrollment itself only ever happens in the webhook, after
/// the collaborator confirms payment.
#[utoipa::path(
    post,
    path = "/user/purchases",
    tag = "user",
    request_body = PurchaseParams,
    responses(
        (status = 200, description = "Checkout session created, or the caller already owns the course", body = PurchaseResponse),
        (status = 404, description = "Unknown or unpublished course"),
        (status = 503, description = "Payment collaborator unavailable, retry later")
    )
)]
#[tracing::instrument(name = "POST /user/purchases", skip(state, user, params))]
pub async fn initiate_purchase(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(params): Json<PurchaseParams>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let user_model = user.get_user(&state).await?;
    let course_id = params.course_id;

    let course = course::Entity::find_by_id(&course_id)
        .one(&state.db)
        .await?
        .filter(|c| c.is_published)
        .ok_or(ApiError::NOT_FOUND)?;

    if is_enrolled(&state.db, &user_model.id, &course_id).await? {
        tracing::info!(
            user_id = %user_model.id,
            course_id = %course_id,
            "User already enrolled, no purchase needed"
        );
        return Ok(Json(PurchaseResponse {
            checkout_url: None,
            already_enrolled: true,
            course_id,
        }));
    }

    let gateway = state
        .payment
        .as_ref()
        .ok_or_else(|| ApiError::service_unavailable("Payments are not configured"))?;

    let amount_cents = catalog::effective_price_cents(course.price_cents, course.discount);
    let currency = state.platform.currency.to_uppercase();
    let now = Utc::now().naive_utc();
    let purchase_id = lectern_types::create_id();

    let pending = purchase::ActiveModel {
        id: Set(purchase_id.clone()),
        user_id: Set(user_model.id.clone()),
        course_id: Set(course_id.clone()),
        amount_cents: Set(amount_cents),
        list_price_cents: Set(course.price_cents),
        discount: Set(course.discount),
        currency: Set(currency.clone()),
        checkout_session_id: Set(None),
        payment_intent_id: Set(None),
        status: Set(PurchaseStatus::Pending),
        completed_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };
    pending.insert(&state.db).await?;

    let frontend_url = state.platform.frontend_url();
    let success_url = params
        .success_url
        .unwrap_or_else(|| format!("{}/loading/my-enrollments", frontend_url));
    let cancel_url = params.cancel_url.unwrap_or_else(|| frontend_url.clone());

    let request = CheckoutRequest {
        purchase_id: purchase_id.clone(),
        course_title: course.title.clone(),
        amount_cents,
        currency,
        success_url,
        cancel_url,
    };

    let session = match tokio::time::timeout(CHECKOUT_TIMEOUT, gateway.create_checkout(request))
        .await
    {
        Ok(Ok(session)) => session,
        Ok(Err(e)) => {
            tracing::error!(purchase_id = %purchase_id, error = %e, "Checkout session creation failed");
            mark_failed(&state, &purchase_id).await?;
            return Err(ApiError::service_unavailable(format!(
                "Checkout session creation failed: {e}"
            )));
        }
        Err(_) => {
            tracing::error!(purchase_id = %purchase_id, "Checkout session creation timed out");
            mark_failed(&state, &purchase_id).await?;
            return Err(ApiError::service_unavailable(
                "Checkout session creation timed out",
            ));
        }
    };

    // Remember the session so support can correlate ledger and collaborator
    purchase::Entity::update_many()
        .col_expr(
            purchase::Column::CheckoutSessionId,
            Expr::value(Some(session.id.clone())),
        )
        .col_expr(
            purchase::Column::UpdatedAt,
            Expr::value(Utc::now().naive_utc()),
        )
        .filter(purchase::Column::Id.eq(&purchase_id))
        .exec(&state.db)
        .await?;

    tracing::info!(
        user_id = %user_model.id,
        course_id = %course_id,
        purchase_id = %purchase_id,
        session_id = %session.id,
        amount = %amount_cents,
        "Created checkout session for course purchase"
    );

    Ok(Json(PurchaseResponse {
        checkout_url: Some(session.url),
        already_enrolled: false,
        course_id,
    }))
}

/// A purchase whose checkout session never materialized has no recovery
/// path, close it out instead of leaving it dangling.
async fn mark_failed(state: &AppState, purchase_id: &str) -> Result<(), ApiError> {
    purchase::Entity::update_many()
        .col_expr(
            purchase::Column::Status,
            Expr::value(PurchaseStatus::Failed),
        )
        .col_expr(
            purchase::Column::UpdatedAt,
            Expr::value(Utc::now().naive_utc()),
        )
        .filter(purchase::Column::Id.eq(purchase_id))
        .filter(purchase::Column::Status.eq(PurchaseStatus::Pending))
        .exec(&state.db)
        .await?;
    Ok(())
}
