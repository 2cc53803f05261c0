use std::collections::HashMap;

use axum::{Extension, Json, extract::State};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Serialize;

use crate::{
    entity::{course, enrollment, purchase, sea_orm_active_enums::PurchaseStatus, user},
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSummary {
    pub id: String,
    pub name: String,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledStudent {
    pub course_title: String,
    pub student: StudentSummary,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    /// Sum over completed purchases, in cents
    pub total_earnings_cents: i64,
    pub total_courses: usize,
    pub enrolled_students: Vec<EnrolledStudent>,
}

#[tracing::instrument(name = "GET /educator/dashboard", skip(state, user))]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
) -> Result<Json<DashboardResponse>, ApiError> {
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

    let total_earnings_cents: i64 = purchase::Entity::find()
        .filter(purchase::Column::CourseId.is_in(course_ids.clone()))
        .filter(purchase::Column::Status.eq(PurchaseStatus::Completed))
        .all(&state.db)
        .await?
        .iter()
        .map(|p| p.amount_cents)
        .sum();

    let enrollments = enrollment::Entity::find()
        .filter(enrollment::Column::CourseId.is_in(course_ids))
        .all(&state.db)
        .await?;

    let student_ids: Vec<String> = enrollments.iter().map(|e| e.user_id.clone()).collect();
    let students: HashMap<String, user::Model> = user::Entity::find()
        .filter(user::Column::Id.is_in(student_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();

    let enrolled_students = enrollments
        .iter()
        .filter_map(|e| {
            let student = students.get(&e.user_id)?;
            Some(EnrolledStudent {
                course_title: titles.get(&e.course_id).cloned().unwrap_or_default(),
                student: StudentSummary {
                    id: student.id.clone(),
                    name: student.name.clone(),
                    avatar_url: student.avatar_url.clone(),
                },
            })
        })
        .collect();

    Ok(Json(DashboardResponse {
        total_earnings_cents,
        total_courses: courses.len(),
        enrolled_students,
    }))
}
