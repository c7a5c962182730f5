//! Checks that the database can be reached.

use crate::infra::{
    database::{self, DbPool, ServerVersion},
    error::{ApiResult, ErrorBody, InternalError},
    extract::Json,
    state::AppState,
};
use axum::{extract::State, routing::get, Router};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

/// The health endpoints.
pub fn routes() -> Router<AppState> {
    Router::new().route("/db-test/", get(db_test))
}

/// The outcome of a successful connectivity check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DbStatus {
    /// Always `"success"`.
    #[schema(example = "success")]
    pub status: String,
    #[schema(example = "Database connection successful.")]
    pub message: String,
    /// The database server version, if it could be determined.
    #[schema(example = "24.3")]
    pub server_version: Option<String>,
}

/// Runs a trivial query against the database.
#[utoipa::path(
    get,
    path = "/db-test/",
    responses(
        (status = 200, description = "Ok", body = DbStatus),
        (status = 500, description = "Database unreachable", body = ErrorBody),
    )
)]
#[instrument(skip_all)]
pub async fn db_test(
    State(db): State<DbPool>,
    State(version_override): State<Option<ServerVersion>>,
) -> ApiResult<Json<DbStatus>> {
    let mut conn = db.acquire().await.map_err(InternalError::ConnectionFailed)?;
    database::ping(&mut conn)
        .await
        .map_err(InternalError::ConnectionFailed)?;
    let version = database::server_version(&mut conn, version_override)
        .await
        .map_err(InternalError::ConnectionFailed)?;
    Ok(Json(DbStatus {
        status: "success".to_string(),
        message: "Database connection successful.".to_string(),
        server_version: version.map(|v| v.to_string()),
    }))
}
