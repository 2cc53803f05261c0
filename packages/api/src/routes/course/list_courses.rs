use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, State},
};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

use crate::{
    entity::{course, course_rating, lecture},
    error::ApiError,
    routes::PaginationParams,
    state::AppState,
};

use super::{CourseSummary, summarize};

#[utoipa::path(
    get,
    path = "/courses",
    tag = "courses",
    responses(
        (status = 200, description = "Published course summaries", body = [CourseSummary])
    )
)]
#[tracing::instrument(name = "GET /courses", skip(state))]
pub async fn list_courses(
    State(state): State<AppState>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<Vec<CourseSummary>>, ApiError> {
    let limit = pagination.limit.unwrap_or(50).min(100);
    let offset = pagination.offset.unwrap_or(0);

    let courses = course::Entity::find()
        .filter(course::Column::IsPublished.eq(true))
        .order_by_desc(course::Column::CreatedAt)
        .limit(limit)
        .offset(offset)
        .all(&state.db)
        .await?;

    let course_ids: Vec<String> = courses.iter().map(|c| c.id.clone()).collect();

    let mut lectures_by_course: HashMap<String, Vec<lecture::Model>> = HashMap::new();
    for l in lecture::Entity::find()
        .filter(lecture::Column::CourseId.is_in(course_ids.clone()))
        .all(&state.db)
        .await?
    {
        lectures_by_course
            .entry(l.course_id.clone())
            .or_default()
            .push(l);
    }

    let mut ratings_by_course: HashMap<String, Vec<i16>> = HashMap::new();
    for r in course_rating::Entity::find()
        .filter(course_rating::Column::CourseId.is_in(course_ids))
        .all(&state.db)
        .await?
    {
        ratings_by_course
            .entry(r.course_id.clone())
            .or_default()
            .push(r.rating);
    }

    let summaries = courses
        .into_iter()
        .map(|c| {
            let lectures = lectures_by_course.remove(&c.id).unwrap_or_default();
            let ratings = ratings_by_course.remove(&c.id).unwrap_or_default();
            summarize(c, &lectures, &ratings)
        })
        .collect();

    Ok(Json(summaries))
}
