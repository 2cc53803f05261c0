use std::sync::Arc;

use axum::{Json, Router, middleware::from_fn_with_state, routing::get};
use error::ApiError;
use middleware::jwt::jwt_middleware;
use state::{AppState, State};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, decompression::RequestDecompressionLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod entity;
mod middleware;
mod routes;

pub mod assets;
pub mod error;
pub mod mail;
pub mod openapi;
pub mod otp;
pub mod payment;
pub mod state;
pub mod textgen;
pub mod user_management;

pub use axum;
pub mod auth {
    pub use crate::middleware::jwt::AppUser;
}

pub use sea_orm;

pub fn construct_router(state: Arc<State>) -> Router {
    let router = Router::new()
        .route("/", get(platform_info))
        .nest("/health", routes::health::routes())
        .nest("/courses", routes::course::routes())
        .nest("/user", routes::user::routes())
        .nest("/educator", routes::educator::routes())
        .nest("/admin", routes::admin::routes())
        .nest("/webhook", routes::webhook::routes())
        .with_state(state.clone())
        .layer(from_fn_with_state(state.clone(), jwt_middleware))
        .layer(CorsLayer::permissive())
        .layer(
            ServiceBuilder::new()
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new()),
        );

    Router::new()
        .nest("/api/v1", router)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

/// Public deployment descriptor. Secrets live in the environment, never in
/// the platform config, so serving it back is safe.
#[tracing::instrument(name = "GET /", skip(state))]
async fn platform_info(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<Json<lectern_types::Value>, ApiError> {
    let value = serde_json::to_value(&state.platform)?;
    Ok(Json(value))
}
