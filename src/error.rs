use std::collections::BTreeMap;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, warn};

/// Field-tagged validation failures; every check adds to it, nothing short-circuits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn has_any(&self) -> bool {
        !self.0.is_empty()
    }

    #[cfg(test)]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when empty, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.has_any() {
            Err(self)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("validation failed")]
    Validation(ValidationErrors),
    #[error("{message}")]
    InvalidInput { field: &'static str, message: String },
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{message}")]
    NotFound { field: &'static str, message: String },
    /// The cause is logged, never rendered.
    #[error("{message}")]
    Internal {
        field: &'static str,
        message: &'static str,
        cause: String,
    },
}

impl ApiError {
    pub fn internal(field: &'static str, message: &'static str, cause: impl std::fmt::Display) -> Self {
        ApiError::Internal {
            field,
            message,
            cause: cause.to_string(),
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidInput { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<ValidationErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<BTreeMap<&'static str, String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = ErrorBody {
            code: status.as_u16().to_string(),
            message: None,
            errors: None,
            error: None,
        };
        match self {
            ApiError::Validation(errors) => body.errors = Some(errors),
            ApiError::Unauthorized(message) => body.message = Some(message.to_string()),
            ApiError::InvalidInput { field, message } | ApiError::NotFound { field, message } => {
                body.error = Some(BTreeMap::from([(field, message)]));
            }
            ApiError::Internal { field, message, cause } => {
                error!(%field, %cause, "internal error");
                body.error = Some(BTreeMap::from([(field, message.to_string())]));
            }
        }
        (status, Json(body)).into_response()
    }
}

/// `Json` body extractor whose rejections (missing content type, syntax or
/// type errors) render as a 422 `errors.body` envelope instead of plain text.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                warn!(status = %rejection.status(), reason = %rejection.body_text(), "request body rejected");
                let mut errors = ValidationErrors::new();
                errors.add("body", rejection.body_text());
                Err(ApiError::Validation(errors))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json"))
    }

    #[test]
    fn validation_errors_accumulate_per_field() {
        let mut errs = ValidationErrors::new();
        assert!(errs.clone().into_result().is_ok());
        errs.add("email", "one");
        errs.add("email", "two");
        errs.add("name", "three");
        assert_eq!(errs.get("email").map(|e| e.len()), Some(2));
        assert!(errs.into_result().is_err());
    }

    #[tokio::test]
    async fn validation_renders_as_422_with_errors() {
        let mut errs = ValidationErrors::new();
        errs.add("email", "bad");
        let (status, body) = render(ApiError::Validation(errs)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["code"], "422");
        assert_eq!(body["errors"]["email"][0], "bad");
        assert!(body.get("message").is_none());
    }

    #[tokio::test]
    async fn unauthorized_renders_message() {
        let (status, body) = render(ApiError::Unauthorized("Invalid token")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, serde_json::json!({"code": "401", "message": "Invalid token"}));
    }

    #[tokio::test]
    async fn internal_hides_cause() {
        let err = ApiError::internal("user", "try again later", "connection refused on 10.0.0.3");
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["user"], "try again later");
        assert!(!body.to_string().contains("10.0.0.3"));
    }
}
