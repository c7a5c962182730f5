//! The HTTP application.
//!
//! # Examples
//!
//! Create an item.
//!
//! ```rust,no_run
//! # use item_service::feature::item::item_repository::{Item, NewItem};
//! # tokio_test::block_on(async {
//! # let config = item_service::infra::config::load_config().unwrap();
//! # let db = item_service::infra::database::init_db(&config.database).unwrap();
//! # item_service::infra::database::ensure_schema(&db).await.unwrap();
//! let url = item_service::app::spawn_app_with_db(db).await;
//! let client = reqwest::Client::new();
//! let new_item = NewItem { name: "Foo".to_string(), description: None };
//! let response = client.post(format!("{url}/items/")).json(&new_item).send().await.unwrap();
//! assert_eq!(201, response.status());
//! let item = response.json::<Item>().await.unwrap();
//! assert_eq!("Foo", item.name);
//! # });
//! ```

use crate::{
    feature::{health::health_api, home::home_api, item::item_api},
    infra::{
        config::ServerConfig,
        database::DbPool,
        error::PanicHandler,
        middleware::MakeRequestIdSpan,
        openapi::ApiDoc,
        shutdown::shutdown_signal,
        state::AppState,
    },
};
use axum::Router;
use tokio::net::TcpListener;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};
use utoipa_swagger_ui::SwaggerUi;

/// Constructs the full axum application.
pub fn app(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .merge(home_api::routes())
        .merge(health_api::routes())
        .merge(item_api::routes())
        .with_state(state)
        // Docs
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .merge(Redoc::with_url("/redoc", ApiDoc::openapi()))
        // Layers
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(MakeRequestIdSpan)
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO))
                .on_failure(()),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(ConcurrencyLimitLayer::new(config.concurrency_limit))
        .layer(CatchPanicLayer::custom(PanicHandler))
}

/// Serves the application until a shutdown signal arrives.
pub async fn run_app(
    listener: TcpListener,
    state: AppState,
    config: ServerConfig,
) -> std::io::Result<()> {
    let app = app(state, &config);

    tracing::info!("Starting axum on {}", listener.local_addr()?);
    let exit_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    match &exit_result {
        Ok(_) => tracing::info!("Successfully shut down"),
        Err(e) => tracing::error!("Shutdown failed: {}", e),
    }
    exit_result
}

/// Spawn a server on a random port with a custom database.
///
/// Returns the base url of the server.
pub async fn spawn_app_with_db(db: DbPool) -> String {
    let address = "127.0.0.1";
    let listener = TcpListener::bind(format!("{address}:0")).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let config = ServerConfig {
        address: address.to_string(),
        port,
        request_timeout_secs: 10,
        concurrency_limit: 100,
    };
    tokio::spawn(run_app(listener, AppState::new(db, None), config));
    format!("http://{address}:{port}")
}

/// The application as tests see it.
#[cfg(test)]
pub(crate) fn test_app(db: DbPool) -> Router {
    test_app_with_version(db, None)
}

/// The application with a configured server version.
#[cfg(test)]
pub(crate) fn test_app_with_version(
    db: DbPool,
    version_override: Option<crate::infra::database::ServerVersion>,
) -> Router {
    let config = ServerConfig {
        address: "127.0.0.1".to_string(),
        port: 0,
        request_timeout_secs: 10,
        concurrency_limit: 100,
    };
    app(AppState::new(db, version_override), &config)
}

/// A pool whose every acquire fails quickly.
#[cfg(test)]
pub(crate) fn unreachable_db() -> DbPool {
    sqlx::postgres::PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(1))
        .connect_lazy("postgres://postgres@127.0.0.1:1/unreachable")
        .unwrap()
}
