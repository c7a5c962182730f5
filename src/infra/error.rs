//! Types for reporting errors that happened during a request.
//!
//! If your function interacts with the database or parses user input,
//! you likely want to return a [`ApiResult`].

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    response::IntoResponse,
    Json,
};
use http::StatusCode;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tower_http::catch_panic::ResponseForPanic;
use utoipa::ToSchema;

/// A standard error response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    /// A description of the error.
    #[schema(example = "Item not found")]
    detail: String,
    /// When the error happened.
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    timestamp: OffsetDateTime,
}

impl ErrorBody {
    pub(crate) fn new(detail: String) -> Self {
        Self {
            detail,
            timestamp: OffsetDateTime::now_utc(),
        }
    }

    /// The error detail.
    pub fn detail(&self) -> &str {
        self.detail.as_ref()
    }
}

/// An error from our API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// An error caused by the client.
    #[error("{0}")]
    ClientError(#[from] ClientError),
    /// An internal error.
    #[error("{0}")]
    InternalError(#[from] InternalError),
}

impl ApiError {
    /// Reports storage failures as the client's fault.
    ///
    /// Used by the endpoints that write client-supplied values, where a failing
    /// statement or commit answers with 400 rather than 500.
    pub fn storage_as_bad_request(self) -> ApiError {
        match self {
            ApiError::InternalError(InternalError::SqlxError(e)) => {
                tracing::warn!("storage error: {}", e);
                ClientError::BadRequest(format!("storage error: {e}")).into()
            }
            e => e,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::ClientError(e) => e.into_response(),
            ApiError::InternalError(e) => {
                tracing::error!("internal error: {}", e);
                e.into_response()
            }
        }
    }
}

/// The result of calling API-related functions.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => ApiError::ClientError(ClientError::NotFound),
            e => ApiError::InternalError(InternalError::SqlxError(e)),
        }
    }
}

/// Errors caused by the client.
/// The client can do something to fix these.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Malformed or missing input.
    #[error("{0}")]
    BadRequest(String),
    /// Unsupported media type.
    #[error("unsupported media type")]
    UnsupportedMediaType,
    /// The resource was not found.
    #[error("Item not found")]
    NotFound,
    /// Custom error.
    #[error("{1}")]
    Custom(StatusCode, String),
}

impl Default for ClientError {
    fn default() -> Self {
        Self::BadRequest("Bad Request".to_string())
    }
}

impl From<JsonRejection> for ClientError {
    fn from(value: JsonRejection) -> Self {
        match value {
            JsonRejection::JsonDataError(e) => ClientError::BadRequest(e.body_text()),
            JsonRejection::JsonSyntaxError(e) => ClientError::BadRequest(e.body_text()),
            JsonRejection::MissingJsonContentType(_) => ClientError::UnsupportedMediaType,
            e => ClientError::Custom(e.status(), e.body_text()),
        }
    }
}

impl From<QueryRejection> for ClientError {
    fn from(value: QueryRejection) -> Self {
        ClientError::BadRequest(value.body_text())
    }
}

impl From<PathRejection> for ClientError {
    fn from(value: PathRejection) -> Self {
        ClientError::Custom(value.status(), value.body_text())
    }
}

impl IntoResponse for ClientError {
    fn into_response(self) -> axum::response::Response {
        let msg = self.to_string();
        let status = match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Custom(status, _) => status,
        };
        (status, Json(ErrorBody::new(msg))).into_response()
    }
}

/// An internal error.
/// The client cannot do anything about this.
#[derive(Debug, thiserror::Error)]
pub enum InternalError {
    /// An [`sqlx`] error.
    #[error("{0}")]
    SqlxError(#[from] sqlx::Error),
    /// The database could not be reached.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(sqlx::Error),
    /// Other miscellaneous errors.
    #[error("{0}")]
    Other(String),
}

impl IntoResponse for InternalError {
    fn into_response(self) -> axum::response::Response {
        let detail = match &self {
            Self::ConnectionFailed(_) => self.to_string(),
            _ => "internal error".to_string(),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::new(detail))).into_response()
    }
}

/// A handler for converting panics into proper responses for the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PanicHandler;

impl ResponseForPanic for PanicHandler {
    type ResponseBody = axum::body::Body;

    fn response_for_panic(
        &mut self,
        _: Box<dyn std::any::Any + Send + 'static>,
    ) -> http::Response<Self::ResponseBody> {
        ApiError::InternalError(InternalError::Other("Panic".to_string())).into_response()
    }
}
