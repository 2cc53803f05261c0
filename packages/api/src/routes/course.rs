use std::collections::HashMap;

use axum::{
    Router,
    routing::{get, post},
};
use lectern::catalog;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    entity::{chapter, course, course_rating, lecture},
    error::ApiError,
    state::AppState,
};

pub mod get_course;
pub mod list_courses;
pub mod rate_course;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_courses::list_courses))
        .route("/{course_id}", get(get_course::get_course))
        .route("/{course_id}/rating", post(rate_course::rate_course))
}

/// Catalog listing entry. Content and enrollment data are deliberately
/// absent; the derived numbers are computed per request, never stored.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub educator_id: String,
    pub thumbnail_url: Option<String>,
    pub price_cents: i64,
    pub discount: i32,
    pub effective_price_cents: i64,
    pub rating: Option<f64>,
    pub rating_count: usize,
    pub lecture_count: usize,
    pub duration_minutes: f64,
    pub created_at: chrono::NaiveDateTime,
}

pub fn summarize(course: course::Model, lectures: &[lecture::Model], ratings: &[i16]) -> CourseSummary {
    CourseSummary {
        effective_price_cents: catalog::effective_price_cents(course.price_cents, course.discount),
        rating: catalog::average_rating(ratings),
        rating_count: ratings.len(),
        lecture_count: lectures.len(),
        duration_minutes: lectures.iter().map(|l| l.duration_minutes).sum(),
        id: course.id,
        title: course.title,
        description: course.description,
        educator_id: course.educator_id,
        thumbnail_url: course.thumbnail_url,
        price_cents: course.price_cents,
        discount: course.discount,
        created_at: course.created_at,
    }
}

/// Chapter/lecture tree for one course, ordered by position. Callers are
/// responsible for redacting locked video urls before sending this to a
/// non-enrolled viewer.
pub async fn load_content<C: ConnectionTrait>(
    conn: &C,
    course_id: &str,
) -> Result<Vec<catalog::Chapter>, ApiError> {
    let chapters = chapter::Entity::find()
        .filter(chapter::Column::CourseId.eq(course_id))
        .order_by_asc(chapter::Column::Position)
        .all(conn)
        .await?;

    let lectures = lecture::Entity::find()
        .filter(lecture::Column::CourseId.eq(course_id))
        .order_by_asc(lecture::Column::Position)
        .all(conn)
        .await?;

    let mut grouped: HashMap<String, Vec<catalog::Lecture>> = HashMap::new();
    for l in lectures {
        grouped
            .entry(l.chapter_id.clone())
            .or_default()
            .push(catalog::Lecture {
                id: l.id,
                title: l.title,
                duration_minutes: l.duration_minutes,
                video_url: l.video_url,
                is_preview_free: l.is_preview_free,
                position: l.position,
            });
    }

    Ok(chapters
        .into_iter()
        .map(|c| {
            let lectures = grouped.remove(&c.id).unwrap_or_default();
            catalog::Chapter {
                id: c.id,
                title: c.title,
                position: c.position,
                lectures,
            }
        })
        .collect())
}

pub async fn load_ratings<C: ConnectionTrait>(
    conn: &C,
    course_id: &str,
) -> Result<Vec<i16>, ApiError> {
    let ratings = course_rating::Entity::find()
        .filter(course_rating::Column::CourseId.eq(course_id))
        .all(conn)
        .await?;
    Ok(ratings.into_iter().map(|r| r.rating).collect())
}
