use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};

use crate::{
    auth::{extractors::AuthUser, repo_types::User},
    error::ApiError,
    state::AppState,
};

pub const INVALID_TOKEN: &str = "Invalid token";
pub const INVALID_USER: &str = "Invalid user";

/// Token following a `Bearer` scheme marker, trimmed. Missing and malformed
/// headers are not told apart.
pub(crate) fn bearer_token(header: Option<&HeaderValue>) -> Option<&str> {
    let value = header?.to_str().ok()?.trim_start();
    let scheme = value.get(..6)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let rest = &value[6..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}

/// Verifies the bearer token and re-loads its subject, so tokens of deleted
/// users stop working.
pub async fn resolve_principal(state: &AppState, header: Option<&HeaderValue>) -> Result<User, ApiError> {
    let token = bearer_token(header).ok_or(ApiError::Unauthorized(INVALID_TOKEN))?;

    let user_id = state.tokens.verify(token).map_err(|e| {
        warn!(error = %e, "token rejected");
        ApiError::Unauthorized(INVALID_TOKEN)
    })?;

    match state.users.find_by_id(user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => {
            warn!(%user_id, "token subject no longer exists");
            Err(ApiError::Unauthorized(INVALID_USER))
        }
        Err(e) => {
            error!(error = %e, %user_id, "find_by_id failed");
            Err(ApiError::internal("server", "There is a problem while processing the request", e))
        }
    }
}

/// First guard stage: attaches the authenticated principal or short-circuits with 401.
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = resolve_principal(&state, req.headers().get(AUTHORIZATION)).await?;
    req.extensions_mut().insert(AuthUser(user));
    Ok(next.run(req).await)
}
