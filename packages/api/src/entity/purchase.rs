//! `SeaORM` Entity for the purchase ledger

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One checkout attempt. Retries create new rows; at most one row per
/// (user, course) ever reaches `Completed`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "Purchase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    #[sea_orm(column_name = "userId", column_type = "Text")]
    pub user_id: String,
    #[sea_orm(column_name = "courseId", column_type = "Text")]
    pub course_id: String,
    /// Discounted amount charged, in cents
    #[sea_orm(column_name = "amountCents")]
    pub amount_cents: i64,
    /// List price before discount (in cents)
    #[sea_orm(column_name = "listPriceCents")]
    pub list_price_cents: i64,
    /// Percentage discount captured at checkout time
    pub discount: i32,
    /// Currency code (e.g., "EUR", "USD")
    #[sea_orm(column_type = "Text")]
    pub currency: String,
    /// Checkout session at the payment collaborator
    #[sea_orm(column_name = "checkoutSessionId", column_type = "Text", nullable)]
    pub checkout_session_id: Option<String>,
    #[sea_orm(column_name = "paymentIntentId", column_type = "Text", nullable)]
    pub payment_intent_id: Option<String>,
    /// Pending until the payment callback confirms or fails it, terminal after
    pub status: super::sea_orm_active_enums::PurchaseStatus,
    #[sea_orm(column_name = "completedAt", nullable)]
    pub completed_at: Option<DateTime>,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::course::Entity",
        from = "Column::CourseId",
        to = "super::course::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Course,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
