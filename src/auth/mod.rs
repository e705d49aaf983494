use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

/// `/auth/login` and `/auth/register` are public; `/auth/user` needs a bearer token.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/auth/user",
            get(handlers::get_user)
                .route_layer(from_fn_with_state(state, middleware::authenticate)),
        )
        .route("/auth/register", post(handlers::register))
        .route("/auth/login", post(handlers::login))
}
