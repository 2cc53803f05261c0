use crate::{
    entity::{sea_orm_active_enums::UserRole, user},
    error::{ApiError, AuthorizationError},
    state::{AppState, CachedAuth},
};
use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use sea_orm::EntityTrait;

#[derive(Debug, Clone)]
pub struct OpenIDUser {
    pub sub: String,
    pub access_token: String,
}

/// Caller identity attached to every request by `jwt_middleware`.
#[derive(Debug, Clone)]
pub enum AppUser {
    OpenID(OpenIDUser),
    Unauthorized,
}

impl AppUser {
    pub fn sub(&self) -> Result<String, AuthorizationError> {
        match self {
            AppUser::OpenID(user) => Ok(user.sub.clone()),
            AppUser::Unauthorized => {
                Err(AuthorizationError::unauthorized("Authentication required"))
            }
        }
    }

    pub async fn get_user(&self, state: &AppState) -> Result<user::Model, ApiError> {
        let sub = self.sub()?;
        user::Entity::find_by_id(&sub)
            .one(&state.db)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))
    }

    /// Role capability check. Admins pass every check; educators pass
    /// educator checks; everyone passes student checks.
    pub async fn require_role(
        &self,
        state: &AppState,
        role: UserRole,
    ) -> Result<user::Model, ApiError> {
        let user = self.get_user(state).await?;
        let allowed = match role {
            UserRole::Admin => user.role == UserRole::Admin,
            UserRole::Educator => matches!(user.role, UserRole::Educator | UserRole::Admin),
            UserRole::Student => true,
        };
        if allowed {
            Ok(user)
        } else {
            Err(ApiError::FORBIDDEN)
        }
    }

    pub async fn require_admin(&self, state: &AppState) -> Result<user::Model, ApiError> {
        self.require_role(state, UserRole::Admin).await
    }

    pub async fn require_educator(&self, state: &AppState) -> Result<user::Model, ApiError> {
        self.require_role(state, UserRole::Educator).await
    }
}

fn token_hash(token: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_hex().to_string()
}

pub async fn jwt_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response<Body>, AuthorizationError> {
    let mut request = request;

    if let Some(auth_header) = request.headers().get(AUTHORIZATION)
        && let Ok(token) = auth_header.to_str()
    {
        let token = token.strip_prefix("Bearer ").unwrap_or(token).trim();
        let hash = token_hash(token);

        let cached = state.auth_cache.get(&hash);
        let sub = match cached {
            Some(CachedAuth::Valid { sub }) => sub,
            Some(CachedAuth::Invalid) => {
                return Err(AuthorizationError::unauthorized("Invalid token"));
            }
            None => match state.validate_token(token) {
                Ok(claims) => {
                    let sub = claims
                        .get("sub")
                        .and_then(|v| v.as_str())
                        .ok_or_else(|| AuthorizationError::unauthorized("sub claim missing"))?
                        .to_string();
                    state
                        .auth_cache
                        .insert(hash, CachedAuth::Valid { sub: sub.clone() });
                    sub
                }
                Err(e) => {
                    state.auth_cache.insert(hash, CachedAuth::Invalid);
                    return Err(AuthorizationError::unauthorized(format!(
                        "Invalid token: {e}"
                    )));
                }
            },
        };

        let user = AppUser::OpenID(OpenIDUser {
            sub,
            access_token: token.to_string(),
        });
        request.extensions_mut().insert::<AppUser>(user);
        return Ok(next.run(request).await);
    }

    request
        .extensions_mut()
        .insert::<AppUser>(AppUser::Unauthorized);
    Ok(next.run(request).await)
}
