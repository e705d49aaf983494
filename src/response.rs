use axum::http::StatusCode;
use serde::Serialize;

/// `{code, data}` envelope used by the success responses.
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub code: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self {
            code: status.as_u16().to_string(),
            data,
        }
    }
}

/// Collection envelope with pagination metadata.
#[derive(Debug, Serialize)]
pub struct PageResponse<T, M> {
    pub code: String,
    pub data: Vec<T>,
    pub meta: M,
}

impl<T, M> PageResponse<T, M> {
    pub fn new(status: StatusCode, data: Vec<T>, meta: M) -> Self {
        Self {
            code: status.as_u16().to_string(),
            data,
            meta,
        }
    }
}
