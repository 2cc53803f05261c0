use std::time::Duration;

use chrono::Utc;
use lectern_api::entity::{purchase, sea_orm_active_enums::PurchaseStatus};
use lectern_api::sea_orm::{ColumnTrait, DbErr, EntityTrait, QueryFilter, sea_query::Expr};
use lectern_api::state::AppState;

const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

/// Periodic sweep closing out pending purchases whose checkout never
/// confirmed. The collaborator's sessions expire on their own; this keeps
/// the ledger in agreement without waiting for a webhook that may never
/// arrive.
pub fn spawn(state: AppState, ttl: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match sweep(&state, ttl).await {
                Ok(0) => {}
                Ok(count) => {
                    tracing::info!(count = count, "Marked stale pending purchases as failed")
                }
                Err(e) => tracing::warn!("Pending purchase sweep failed: {e}"),
            }
        }
    });
}

async fn sweep(state: &AppState, ttl: Duration) -> Result<u64, DbErr> {
    let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::hours(24));
    let cutoff = Utc::now().naive_utc() - ttl;

    let result = purchase::Entity::update_many()
        .col_expr(
            purchase::Column::Status,
            Expr::value(PurchaseStatus::Failed),
        )
        .col_expr(
            purchase::Column::UpdatedAt,
            Expr::value(Utc::now().naive_utc()),
        )
        .filter(purchase::Column::Status.eq(PurchaseStatus::Pending))
        .filter(purchase::Column::CreatedAt.lt(cutoff))
        .exec(&state.db)
        .await?;

    Ok(result.rows_affected)
}
