use std::collections::HashMap;

use axum::{Extension, Json, extract::State};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;

use crate::{
    entity::{course, purchase, sea_orm_active_enums::PurchaseStatus, user},
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
};

use super::dashboard::StudentSummary;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPurchase {
    pub student: StudentSummary,
    pub course_title: String,
    pub purchased_at: chrono::NaiveDateTime,
}

/// Who bought what, newest first. Only completed purchases count.
#[tracing::instrument(name = "GET /educator/students", skip(state, user))]
pub async fn get_students(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<Vec<StudentPurchase>>, ApiError> {
    let educator = user.require_educator(&state).await?;

    let courses = course::Entity::find()
        .filter(course::Column::EducatorId.eq(&educator.id))
        .all(&state.db)
        .await?;

    let course_ids: Vec<String> = courses.iter().map(|c| c.id.clone()).collect();
    let titles: HashMap<String, String> = courses
        .iter()
        .map(|c| (c.id.clone(), c.title.clone()))
        .collect();

    let purchases = purchase::Entity::find()
        .filter(purchase::Column::CourseId.is_in(course_ids))
        .filter(purchase::Column::Status.eq(PurchaseStatus::Completed))
        .order_by_desc(purchase::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let student_ids: Vec<String> = purchases.iter().map(|p| p.user_id.clone()).collect();
    let students: HashMap<String, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(student_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();

    let result = purchases
        .iter()
        .filter_map(|p| {
            let student = students.get(&p.user_id)?;
            Some(StudentPurchase {
                student: StudentSummary {
                    id: student.id.clone(),
                    name: student.name.clone(),
                    avatar_url: student.avatar_url.clone(),
                },
                course_title: titles.get(&p.course_id).cloned().unwrap_or_default(),
                purchased_at: p.created_at,
            })
        })
        .collect();

    Ok(Json(result))
}
