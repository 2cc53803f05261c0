use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    sea_query::OnConflict,
};

use crate::{
    entity::{enrollment, sea_orm_active_enums::UserRole, user},
    error::ApiError,
};

/// Confirmed-enrollment lookup, the gate for ratings, progress writes and
/// lecture-url visibility.
pub async fn is_enrolled<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    course_id: &str,
) -> Result<bool, ApiError> {
    let existing = enrollment::Entity::find()
        .filter(enrollment::Column::UserId.eq(user_id))
        .filter(enrollment::Column::CourseId.eq(course_id))
        .one(conn)
        .await?;
    Ok(existing.is_some())
}

#[derive(Debug, Clone)]
pub struct IdentityProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: Option<String>,
}

/// Create or refresh the local user row from an identity-provider event.
/// Profile fields follow the provider; the locally managed role does not.
pub async fn upsert_identity<C: ConnectionTrait>(
    conn: &C,
    profile: IdentityProfile,
) -> Result<(), ApiError> {
    let now = Utc::now().naive_utc();
    let row = user::ActiveModel {
        id: Set(profile.id),
        name: Set(profile.name),
        email: Set(profile.email),
        avatar_url: Set(profile.avatar_url),
        role: Set(UserRole::Student),
        stripe_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    user::Entity::insert(row)
        .on_conflict(
            OnConflict::column(user::Column::Id)
                .update_columns([
                    user::Column::Name,
                    user::Column::Email,
                    user::Column::AvatarUrl,
                    user::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

pub async fn remove_identity<C: ConnectionTrait>(conn: &C, user_id: &str) -> Result<(), ApiError> {
    user::Entity::delete_by_id(user_id).exec(conn).await?;
    Ok(())
}
