use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};
use chrono::Utc;
use hmac::{Hmac, Mac};
use lectern_types::anyhow;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use serde::Deserialize;
use sha2::Sha256;

use crate::{
    entity::{enrollment, payment_event, purchase, sea_orm_active_enums::PurchaseStatus},
    error::ApiError,
    payment::GatewayEvent,
    state::AppState,
    user_management::{IdentityProfile, remove_identity, upsert_identity},
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/payment", post(payment_webhook))
        .route("/identity", post(identity_webhook))
}

#[tracing::instrument(name = "POST /webhook/payment", skip(state, headers, payload))]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let gateway = state
        .payment
        .as_ref()
        .ok_or(anyhow!("Payments not configured"))?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(anyhow!("Missing stripe-signature header"))?;

    let payload_str =
        std::str::from_utf8(&payload).map_err(|_| anyhow!("Invalid UTF-8 in payload"))?;

    let event = gateway
        .verify_event(payload_str, signature)
        .map_err(|e| ApiError::unauthorized(format!("Webhook verification failed: {e}")))?;

    let event_id = event.id().to_string();
    if is_event_processed(&state, &event_id).await? {
        tracing::info!(event_id = %event_id, "Duplicate event, skipping");
        return Ok(StatusCode::OK);
    }

    match handle_gateway_event(&state, &event).await {
        Ok(_) => {
            mark_event_processed(&state, &event_id, event.type_name()).await?;
            Ok(StatusCode::OK)
        }
        Err(e) => {
            tracing::error!(event_id = %event_id, "Failed to process webhook");
            Err(e)
        }
    }
}

async fn is_event_processed(state: &AppState, event_id: &str) -> Result<bool, ApiError> {
    let existing = payment_event::Entity::find_by_id(event_id)
        .one(&state.db)
        .await?;
    Ok(existing.is_some())
}

async fn mark_event_processed(
    state: &AppState,
    event_id: &str,
    event_type: &str,
) -> Result<(), ApiError> {
    let new_event = payment_event::ActiveModel {
        id: Set(event_id.to_string()),
        event_type: Set(event_type.to_string()),
        processed_at: Set(Utc::now().naive_utc()),
    };

    new_event.insert(&state.db).await?;
    Ok(())
}

async fn handle_gateway_event(state: &AppState, event: &GatewayEvent) -> Result<(), ApiError> {
    match event {
        GatewayEvent::CheckoutCompleted {
            purchase_id,
            payment_intent_id,
            ..
        } => {
            let purchase_id = purchase_id.clone();
            let payment_intent_id = payment_intent_id.clone();
            let outcome = state
                .db
                .transaction::<_, ConfirmOutcome, ApiError>(move |txn| {
                    Box::pin(async move {
                        confirm_purchase(txn, &purchase_id, payment_intent_id).await
                    })
                })
                .await?;
            tracing::info!(outcome = ?outcome, "Processed checkout completion");
        }
        GatewayEvent::CheckoutExpired { purchase_id, .. } => {
            fail_purchase(&state.db, purchase_id).await?;
        }
        GatewayEvent::Other { event_type, .. } => {
            tracing::debug!(event_type = %event_type, "Unhandled event type");
        }
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// Transitioned Pending -> Completed and granted enrollment
    Confirmed,
    /// Purchase was already completed, nothing to do
    AlreadyCompleted,
    /// Unknown or terminally failed purchase, logged and skipped
    Ignored,
}

/// Idempotent confirmation. The collaborator delivers at-least-once and
/// possibly concurrently, so the transition is a conditional update on the
/// Pending status and the enrollment insert tolerates an existing row.
/// Both run inside the caller's transaction.
pub async fn confirm_purchase<C: ConnectionTrait>(
    conn: &C,
    purchase_id: &str,
    payment_intent_id: Option<String>,
) -> Result<ConfirmOutcome, ApiError> {
    let Some(purchase) = purchase::Entity::find_by_id(purchase_id).one(conn).await? else {
        tracing::warn!(purchase_id = %purchase_id, "Purchase not found for checkout session");
        return Ok(ConfirmOutcome::Ignored);
    };

    match purchase.status {
        PurchaseStatus::Completed => {
            tracing::info!(purchase_id = %purchase_id, "Purchase already completed (idempotent)");
            return Ok(ConfirmOutcome::AlreadyCompleted);
        }
        PurchaseStatus::Failed => {
            tracing::error!(
                purchase_id = %purchase_id,
                "Completion callback for a failed purchase, ignoring"
            );
            return Ok(ConfirmOutcome::Ignored);
        }
        PurchaseStatus::Pending => {}
    }

    let now = Utc::now().naive_utc();
    let updated = purchase::Entity::update_many()
        .col_expr(
            purchase::Column::Status,
            Expr::value(PurchaseStatus::Completed),
        )
        .col_expr(purchase::Column::CompletedAt, Expr::value(Some(now)))
        .col_expr(
            purchase::Column::PaymentIntentId,
            Expr::value(payment_intent_id),
        )
        .col_expr(purchase::Column::UpdatedAt, Expr::value(now))
        .filter(purchase::Column::Id.eq(purchase_id))
        .filter(purchase::Column::Status.eq(PurchaseStatus::Pending))
        .exec(conn)
        .await?;

    if updated.rows_affected == 0 {
        // A concurrent delivery won the transition
        tracing::info!(purchase_id = %purchase_id, "Purchase already completed (idempotent)");
        return Ok(ConfirmOutcome::AlreadyCompleted);
    }

    let row = enrollment::ActiveModel {
        id: Set(lectern_types::create_id()),
        user_id: Set(purchase.user_id.clone()),
        course_id: Set(purchase.course_id.clone()),
        joined_via: Set(Some(format!("purchase:{}", purchase.id))),
        created_at: Set(now),
    };
    enrollment::Entity::insert(row)
        .on_conflict(
            OnConflict::columns([enrollment::Column::UserId, enrollment::Column::CourseId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;

    tracing::info!(
        purchase_id = %purchase.id,
        user_id = %purchase.user_id,
        course_id = %purchase.course_id,
        amount = %purchase.amount_cents,
        "Purchase completed, enrollment granted"
    );

    Ok(ConfirmOutcome::Confirmed)
}

/// Pending -> Failed on checkout expiry. Terminal states stay untouched.
pub async fn fail_purchase<C: ConnectionTrait>(
    conn: &C,
    purchase_id: &str,
) -> Result<(), ApiError> {
    let updated = purchase::Entity::update_many()
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
        .exec(conn)
        .await?;

    if updated.rows_affected > 0 {
        tracing::info!(purchase_id = %purchase_id, "Purchase marked failed after expired checkout");
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct IdentityEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: IdentityEventData,
}

#[derive(Debug, Deserialize)]
struct IdentityEventData {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    avatar_url: Option<String>,
}

/// Constant-time HMAC-SHA256 check over the raw body. The identity
/// collaborator signs every delivery with the shared secret.
pub fn verify_identity_signature(payload: &[u8], signature_hex: &str, secret: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex) else {
        return false;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}

#[tracing::instrument(name = "POST /webhook/identity", skip(state, headers, payload))]
pub async fn identity_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let secret = std::env::var("IDENTITY_WEBHOOK_SECRET")
        .map_err(|_| anyhow!("IDENTITY_WEBHOOK_SECRET must be set"))?;

    let signature = headers
        .get("x-identity-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing x-identity-signature header"))?;

    if !verify_identity_signature(&payload, signature, &secret) {
        return Err(ApiError::unauthorized("Invalid webhook signature"));
    }

    let event: IdentityEvent = lectern_types::json::from_slice(&payload)
        .map_err(|e| ApiError::bad_request(format!("Invalid identity event: {e}")))?;

    match event.event_type.as_str() {
        "user.created" | "user.updated" => {
            let profile = IdentityProfile {
                id: event.data.id.clone(),
                name: event.data.name.unwrap_or_default(),
                email: event.data.email.unwrap_or_default(),
                avatar_url: event.data.avatar_url,
            };
            upsert_identity(&state.db, profile).await?;
            tracing::info!(user_id = %event.data.id, "Identity synced");
        }
        "user.deleted" => {
            remove_identity(&state.db, &event.data.id).await?;
            tracing::info!(user_id = %event.data.id, "Identity removed");
        }
        other => {
            tracing::debug!(event_type = %other, "Unhandled identity event");
        }
    }

    Ok(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn pending_purchase(id: &str) -> purchase::Model {
        purchase::Model {
            id: id.to_string(),
            user_id: "user_1".to_string(),
            course_id: "course_1".to_string(),
            amount_cents: 8000,
            list_price_cents: 10000,
            discount: 20,
            currency: "USD".to_string(),
            checkout_session_id: Some("cs_123".to_string()),
            payment_intent_id: None,
            status: PurchaseStatus::Pending,
            completed_at: None,
            created_at: Utc::now().naive_utc(),
            updated_at: Utc::now().naive_utc(),
        }
    }

    #[tokio::test]
    async fn confirm_transitions_pending_and_enrolls_once() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending_purchase("p_1")]])
            .append_exec_results([
                // Conditional status transition
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                // Enrollment insert
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let outcome = confirm_purchase(&db, "p_1", Some("pi_1".to_string()))
            .await
            .unwrap();
        assert_eq!(outcome, ConfirmOutcome::Confirmed);
    }

    #[tokio::test]
    async fn confirm_is_a_noop_for_completed_purchases() {
        let mut completed = pending_purchase("p_1");
        completed.status = PurchaseStatus::Completed;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![completed]])
            .into_connection();

        let outcome = confirm_purchase(&db, "p_1", None).await.unwrap();
        assert_eq!(outcome, ConfirmOutcome::AlreadyCompleted);
    }

    #[tokio::test]
    async fn confirm_loses_the_race_gracefully() {
        // The row read Pending, but a concurrent delivery completed it
        // before our conditional update ran.
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending_purchase("p_1")]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let outcome = confirm_purchase(&db, "p_1", None).await.unwrap();
        assert_eq!(outcome, ConfirmOutcome::AlreadyCompleted);
    }

    #[tokio::test]
    async fn unknown_purchase_is_ignored() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<purchase::Model>::new()])
            .into_connection();

        let outcome = confirm_purchase(&db, "missing", None).await.unwrap();
        assert_eq!(outcome, ConfirmOutcome::Ignored);
    }

    #[test]
    fn identity_signature_round_trip() {
        let secret = "whsec_test";
        let payload = br#"{"type":"user.created","data":{"id":"user_1"}}"#;

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload);
        let signature = hex::encode(mac.finalize().into_bytes());

        assert!(verify_identity_signature(payload, &signature, secret));
        assert!(!verify_identity_signature(payload, &signature, "other"));
        assert!(!verify_identity_signature(b"tampered", &signature, secret));
        assert!(!verify_identity_signature(payload, "not-hex", secret));
    }
}
