use axum::{extract::State, http::StatusCode, Json};
use tracing::{debug, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, LoginResponse, RegisterRequest},
        extractors::AuthUser,
        repo_types::User,
    },
    error::{ApiError, ApiJson},
    response::DataResponse,
    state::AppState,
};

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (access_token, user) = state.auth.login(&payload.email, &payload.password).await?;
    Ok(Json(LoginResponse { access_token, user }))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<DataResponse<User>>), ApiError> {
    let user = state
        .auth
        .register(&payload.email, &payload.password, &payload.name)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(StatusCode::CREATED, user)),
    ))
}

pub async fn get_user(AuthUser(user): AuthUser) -> Json<DataResponse<User>> {
    debug!(user_id = %user.id, "current user");
    Json(DataResponse::new(StatusCode::OK, user))
}
