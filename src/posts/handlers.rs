use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::{error, info, instrument};
use uuid::Uuid;

use super::dto::{CreatePostRequest, Pagination, UpdatePostRequest};
use crate::{
    auth::{extractors::AuthUser, services::check_length},
    error::{ApiError, ApiJson, ValidationErrors},
    posts::{
        repo::PostChanges,
        repo_types::{PageRequest, Paginator, PostWithUser},
    },
    response::{DataResponse, PageResponse},
    state::AppState,
    store::StoreError,
};

type PostResult = Result<(StatusCode, Json<DataResponse<PostWithUser>>), ApiError>;

fn ok(status: StatusCode, post: PostWithUser) -> PostResult {
    Ok((status, Json(DataResponse::new(status, post))))
}

fn not_found(raw_id: &str) -> ApiError {
    ApiError::NotFound {
        field: "post_id",
        message: format!(
            "The requested post {} is removed or move to somewhere else.",
            raw_id
        ),
    }
}

fn internal(e: StoreError) -> ApiError {
    ApiError::internal("post", "There is a problem while processing the post", e)
}

fn check_title(errors: &mut ValidationErrors, title: &str) {
    check_length(errors, "title", title, 3, 255);
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<PageResponse<PostWithUser, Paginator>>, ApiError> {
    let (posts, meta) = state
        .posts
        .list(PageRequest::new(p.page, p.per_page))
        .await
        .map_err(|e| {
            ApiError::internal("user", "There is a problem while loading the relationship user", e)
        })?;
    Ok(Json(PageResponse::new(StatusCode::OK, posts, meta)))
}

#[instrument(skip(state, user, body), fields(user_id = %user.0.id))]
pub async fn create_post(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(body): ApiJson<CreatePostRequest>,
) -> PostResult {
    let AuthUser(user) = user;
    let mut errors = ValidationErrors::new();
    check_title(&mut errors, &body.title);
    errors.into_result().map_err(ApiError::Validation)?;

    let post = state
        .posts
        .create(user.id, body.title, body.description)
        .await
        .map_err(internal)?;
    info!(post_id = %post.id, "post created");
    ok(StatusCode::CREATED, PostWithUser { post, user })
}

#[instrument(skip(state))]
pub async fn show_post(State(state): State<AppState>, Path(post_id): Path<String>) -> PostResult {
    let Ok(id) = post_id.parse::<Uuid>() else {
        return Err(not_found(&post_id));
    };
    match state.posts.find(id).await {
        Ok(Some(post)) => ok(StatusCode::OK, post),
        Ok(None) => Err(not_found(&post_id)),
        Err(e) => {
            error!(error = %e, %id, "show_post failed");
            Err(internal(e))
        }
    }
}

/// Runs behind `require_post_owner`, so the post exists and belongs to `user`.
#[instrument(skip(state, user, body), fields(user_id = %user.0.id))]
pub async fn update_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<Uuid>,
    body: Option<ApiJson<UpdatePostRequest>>,
) -> PostResult {
    let AuthUser(user) = user;
    let Some(ApiJson(body)) = body.filter(|ApiJson(b)| !b.is_empty()) else {
        return Err(ApiError::InvalidInput {
            field: "body",
            message: "The request body cannot be empty".into(),
        });
    };

    let mut errors = ValidationErrors::new();
    if let Some(title) = &body.title {
        check_title(&mut errors, title);
    }
    errors.into_result().map_err(ApiError::Validation)?;

    let changes = PostChanges {
        title: body.title,
        description: body.description,
    };
    match state.posts.update(post_id, changes).await.map_err(internal)? {
        Some(post) => {
            info!(%post_id, "post updated");
            ok(StatusCode::OK, PostWithUser { post, user })
        }
        None => Err(not_found(&post_id.to_string())),
    }
}

/// Runs behind `require_post_owner`.
#[instrument(skip(state, user), fields(user_id = %user.0.id))]
pub async fn delete_post(
    State(state): State<AppState>,
    user: AuthUser,
    Path(post_id): Path<Uuid>,
) -> PostResult {
    let AuthUser(user) = user;
    match state.posts.delete(post_id).await {
        Ok(Some(post)) => {
            info!(%post_id, "post deleted");
            ok(StatusCode::OK, PostWithUser { post, user })
        }
        Ok(None) => Err(not_found(&post_id.to_string())),
        Err(e) => {
            error!(error = %e, %post_id, "delete_post failed");
            Err(ApiError::internal(
                "post",
                "Unable to delete the post",
                e,
            ))
        }
    }
}
