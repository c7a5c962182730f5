//! Serves the item API.

use color_eyre::eyre::{eyre, WrapErr};
use item_service::{
    app,
    infra::{
        config,
        database::{self, ServerVersion},
        logging,
        state::AppState,
    },
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    let _guard = logging::init_logging();
    let config = config::load_config().wrap_err("failed to load configuration")?;

    let version_override = config
        .database
        .server_version_override
        .as_deref()
        .map(|v| ServerVersion::parse(v).ok_or_else(|| eyre!("invalid server version: {v:?}")))
        .transpose()?;

    // Database
    let db = database::init_db(&config.database).wrap_err("invalid database url")?;
    database::ensure_schema(&db)
        .await
        .wrap_err("failed to create the items table")?;
    let mut conn = db.acquire().await?;
    match database::server_version(&mut conn, version_override).await? {
        Some(version) => tracing::info!("Connected to database server version {}", version),
        None => tracing::warn!("Connected to a database server of unknown version"),
    }
    drop(conn);

    // Server
    let listener =
        TcpListener::bind((config.server.address.as_str(), config.server.port)).await?;
    let state = AppState::new(db.clone(), version_override);
    app::run_app(listener, state, config.server).await?;

    db.close().await;
    tracing::info!("Database pool closed");
    Ok(())
}
