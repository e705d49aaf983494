use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{error, warn};
use uuid::Uuid;

use crate::{auth::extractors::AuthUser, error::ApiError, posts::repo::PostStore, state::AppState};

pub const UNAUTHORIZED_ACCESS: &str = "Unauthorized access";

/// Passes only when the post exists and belongs to `principal_id`. A bad id, a
/// missing post and a foreign post produce the same rejection.
pub async fn ensure_owner(posts: &dyn PostStore, principal_id: Uuid, raw_id: &str) -> Result<(), ApiError> {
    let Ok(post_id) = raw_id.parse::<Uuid>() else {
        warn!(post_id = %raw_id, "unparsable post id");
        return Err(ApiError::Unauthorized(UNAUTHORIZED_ACCESS));
    };
    match posts.find(post_id).await {
        Ok(Some(found)) if found.post.user_id == principal_id => Ok(()),
        Ok(_) => {
            warn!(%post_id, user_id = %principal_id, "post ownership check failed");
            Err(ApiError::Unauthorized(UNAUTHORIZED_ACCESS))
        }
        Err(e) => {
            error!(error = %e, %post_id, "post lookup failed");
            Err(ApiError::internal("post", "There is a problem while loading the post", e))
        }
    }
}

/// Second guard stage for mutating post routes; must sit behind `authenticate`.
pub async fn require_post_owner(
    State(state): State<AppState>,
    Path(params): Path<HashMap<String, String>>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let principal_id = req
        .extensions()
        .get::<AuthUser>()
        .map(|AuthUser(user)| user.id)
        .ok_or(ApiError::Unauthorized(UNAUTHORIZED_ACCESS))?;
    let raw_id = params.get("post_id").map(String::as_str).unwrap_or_default();
    ensure_owner(state.posts.as_ref(), principal_id, raw_id).await?;
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn owner_passes_others_are_rejected_like_missing_posts() {
        let (state, _): (AppState, Arc<MemoryStore>) = AppState::fake();
        let ann = state.auth.register("a@x.com", "secret1", "Ann").await.expect("ann");
        let bob = state.auth.register("b@x.com", "secret1", "Bob").await.expect("bob");
        let post = state
            .posts
            .create(ann.id, "Hello".into(), "first".into())
            .await
            .expect("post");

        ensure_owner(state.posts.as_ref(), ann.id, &post.id.to_string())
            .await
            .expect("owner allowed");

        let foreign = ensure_owner(state.posts.as_ref(), bob.id, &post.id.to_string())
            .await
            .unwrap_err();
        let missing = ensure_owner(state.posts.as_ref(), bob.id, &Uuid::new_v4().to_string())
            .await
            .unwrap_err();
        let garbage = ensure_owner(state.posts.as_ref(), bob.id, "not-a-uuid").await.unwrap_err();

        for err in [foreign, missing, garbage] {
            assert!(matches!(err, ApiError::Unauthorized(UNAUTHORIZED_ACCESS)));
        }
    }
}
