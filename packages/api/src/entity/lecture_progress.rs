//! `SeaORM` Entity for per-lecture completion marks

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per completed lecture. The composite key turns "completed set
/// membership" into plain row existence, so toggling is an atomic
/// insert/delete instead of a read-modify-write on an array.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(schema_name = "public", table_name = "LectureProgress")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_name = "userId", column_type = "Text")]
    pub user_id: String,
    #[sea_orm(primary_key, auto_increment = false, column_name = "courseId", column_type = "Text")]
    pub course_id: String,
    #[sea_orm(primary_key, auto_increment = false, column_name = "lectureId", column_type = "Text")]
    pub lecture_id: String,
    #[sea_orm(column_name = "createdAt")]
    pub created_at: DateTime,
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
    #[sea_orm(
        belongs_to = "super::lecture::Entity",
        from = "Column::LectureId",
        to = "super::lecture::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Lecture,
}

impl Related<super::course::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl Related<super::lecture::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lecture.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
