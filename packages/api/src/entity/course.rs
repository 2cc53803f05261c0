//! `SeaORM` Entity for courses, the sellable catalog unit

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "Course")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,
    /// External subject of the owning educator
    #[sea_orm(column_name = "educatorId", column_type = "Text")]
    pub educator_id: String,
    #[sea_orm(column_type = "Text")]
    pub title: String,
    /// HTML description authored in the frontend editor
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// List price in cents
    #[sea_orm(column_name = "priceCents")]
    pub price_cents: i64,
    /// Percentage discount, 0-100
    pub discount: i32,
    #[sea_orm(column_name = "isPublished")]
    pub is_published: bool,
    /// Public URL of the hosted thumbnail, empty until an upload succeeds
    #[sea_orm(column_name = "thumbnailUrl", column_type = "Text", nullable)]
    pub thumbnail_url: Option<String>,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
    #[sea_orm(column_name = "updatedAt")]
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::EducatorId",
        to = "super::user::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Educator,
    #[sea_orm(has_many = "super::chapter::Entity")]
    Chapter,
    #[sea_orm(has_many = "super::lecture::Entity")]
    Lecture,
    #[sea_orm(has_many = "super::enrollment::Entity")]
    Enrollment,
    #[sea_orm(has_many = "super::purchase::Entity")]
    Purchase,
    #[sea_orm(has_many = "super::course_rating::Entity")]
    CourseRating,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Educator.def()
    }
}

impl Related<super::chapter::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chapter.def()
    }
}

impl Related<super::enrollment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Enrollment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
