//! The landing endpoint.

use crate::infra::{extract::Json, state::AppState};
use axum::{routing::get, Router};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The home endpoint.
pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(root))
}

/// A status message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Status {
    /// Tells that the service is up and where its documentation lives.
    #[schema(example = "item-service is running. Go to /docs for API documentation.")]
    pub message: String,
}

/// Tells that the service is running.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Ok", body = Status),
    )
)]
pub async fn root() -> Json<Status> {
    Json(Status {
        message: format!(
            "{} is running. Go to /docs for API documentation.",
            env!("CARGO_PKG_NAME")
        ),
    })
}
