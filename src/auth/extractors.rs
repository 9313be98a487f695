use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use crate::{auth::jwt::JwtKeys, auth::repo::User, error::ApiError, state::AppState};

/// Identity attached to a request after a verified token and an active
/// account lookup.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Single verification core shared by both middleware variants: header →
/// token → claims → active user. Each call site decides what a failure
/// means.
async fn authenticate(parts: &Parts, state: &AppState) -> Result<CurrentUser, ApiError> {
    let token = bearer_token(parts).ok_or(ApiError::TokenInvalid)?;
    let keys = JwtKeys::from_ref(state);
    let claims = keys.verify(token)?;

    match User::find_by_id(&state.db, claims.sub).await? {
        Some(user) if user.is_active => Ok(CurrentUser {
            id: user.id,
            username: user.username,
            email: user.email,
        }),
        _ => Err(ApiError::InactiveAccount),
    }
}

/// Mandatory variant: never proceeds without a verified, active identity.
pub struct AuthUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match authenticate(parts, state).await {
            Ok(user) => Ok(AuthUser(user)),
            Err(e) => {
                warn!(error = %e, "request rejected by auth");
                Err(e)
            }
        }
    }
}

/// Optional variant: any auth problem degrades to an anonymous request
/// instead of rejecting, so downstream logic can skip the history write.
pub struct MaybeAuthUser(pub Option<CurrentUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(authenticate(parts, state).await.ok()))
    }
}
