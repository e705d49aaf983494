use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::{middleware::INVALID_TOKEN, repo_types::User};
use crate::error::ApiError;

/// The principal attached by `authenticate`; handlers take it as an argument.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only reachable without a principal when a route skipped `authenticate`.
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Unauthorized(INVALID_TOKEN))
    }
}
