//! `SeaORM` Entity for course ratings

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// At most one rating per (course, user), enforced by the composite key so
/// concurrent upserts cannot produce duplicates.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "CourseRating")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "courseId", column_type = "Text")]
    pub course_id: String,
    #[sea_orm(primary_key, auto_increment = false, column_name = "userId", column_type = "Text")]
    pub user_id: String,
    /// 1-5 stars
    pub rating: i16,
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
