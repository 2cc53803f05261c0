use std::time::Duration;

use axum::{Extension, Json, extract::State};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    error::ApiError,
    middleware::jwt::AppUser,
    state::AppState,
    textgen::{CourseOutline, sample_outline},
};

const GENERATION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct OutlineParams {
    pub topic: String,
}

/// POST /educator/outline
///
/// Drafts a course outline with the text-generation collaborator. A failure
/// here is never fatal to authoring: the frontend falls back to manual
/// input, and an unconfigured generator serves the sample outline so the
/// flow stays demoable.
#[tracing::instrument(name = "POST /educator/outline", skip(state, user, params))]
pub async fn generate_outline(
    State(state): State<AppState>,
    Extension(user): Extension<AppUser>,
    Json(params): Json<OutlineParams>,
) -> Result<Json<CourseOutline>, ApiError> {
    user.require_educator(&state).await?;

    let topic = params.topic.trim();
    if topic.is_empty() {
        return Err(ApiError::bad_request("topic must not be empty"));
    }

    let Some(generator) = state.outline_generator.as_ref() else {
        return Ok(Json(sample_outline(topic)));
    };

    match tokio::time::timeout(GENERATION_TIMEOUT, generator.generate(topic)).await {
        Ok(Ok(outline)) => Ok(Json(outline)),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "Outline generation failed");
            Err(ApiError::service_unavailable(
                "Outline generation failed, write the outline manually or retry",
            ))
        }
        Err(_) => {
            tracing::warn!("Outline generation timed out");
            Err(ApiError::service_unavailable(
                "Outline generation timed out, write the outline manually or retry",
            ))
        }
    }
}
