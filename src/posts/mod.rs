use axum::{
    middleware::from_fn_with_state,
    routing::{get, put},
    Router,
};

use crate::{auth::middleware::authenticate, state::AppState};

mod dto;
pub mod guard;
pub mod handlers;
pub mod repo;
pub mod repo_types;

/// Every post route requires a principal; update and delete also require ownership.
pub fn router(state: AppState) -> Router<AppState> {
    let owner_only = put(handlers::update_post)
        .delete(handlers::delete_post)
        .route_layer(from_fn_with_state(state.clone(), guard::require_post_owner));

    Router::new()
        .route("/posts", get(handlers::list_posts).post(handlers::create_post))
        .route("/posts/:post_id", get(handlers::show_post).merge(owner_only))
        .route_layer(from_fn_with_state(state, authenticate))
}
