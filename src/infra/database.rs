//! For interacting with the database.

use super::{config::DatabaseConfig, error::ApiResult};
use sqlx::{
    postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions},
    Executor, Postgres, Transaction,
};
use std::{fmt, str::FromStr};
use tracing::instrument;

/// A common transaction type.
/// Use this for the business and persistence layer.
pub type Tx = Transaction<'static, Postgres>;

/// A common database connection type.
pub type DbConnection = PgConnection;

/// A common database pool type.
pub type DbPool = PgPool;

/// Creates the database pool based on some configuration.
///
/// The pool connects lazily, so this only fails on a malformed connection string.
pub fn init_db(config: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    let options = PgConnectOptions::from_str(&config.url)?;
    let db = PgPoolOptions::new()
        .acquire_timeout(config.acquire_timeout())
        .connect_lazy_with(options);
    Ok(db)
}

/// Creates the `items` table and its indexes unless they already exist.
#[instrument(skip(db))]
pub async fn ensure_schema(db: &DbPool) -> Result<(), sqlx::Error> {
    tracing::info!("Ensuring schema");
    db.execute(
        r#"
        CREATE TABLE IF NOT EXISTS items (
            id BIGSERIAL PRIMARY KEY,
            name VARCHAR NOT NULL,
            description VARCHAR
        )
        "#,
    )
    .await?;
    db.execute("CREATE INDEX IF NOT EXISTS ix_items_name ON items (name)")
        .await?;
    db.execute("CREATE INDEX IF NOT EXISTS ix_items_description ON items (description)")
        .await?;
    Ok(())
}

/// Commits the transaction if `result` is a success, rolls it back otherwise.
///
/// A failing commit is reported as the error of the whole operation.
pub async fn commit_or_rollback<T>(tx: Tx, result: ApiResult<T>) -> ApiResult<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback_error) = tx.rollback().await {
                tracing::error!("Rollback failed: {}", rollback_error);
            }
            Err(e)
        }
    }
}

/// Performs a trivial round trip to the database.
#[instrument(skip(conn))]
pub async fn ping(conn: &mut DbConnection) -> Result<(), sqlx::Error> {
    let one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(conn).await?;
    tracing::debug!("Ping returned {}", one);
    Ok(())
}

/// A database server version, reduced to major and minor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServerVersion {
    /// The major version.
    pub major: u32,
    /// The minor version.
    pub minor: u32,
}

impl ServerVersion {
    /// Extracts a version from a free-form version string.
    ///
    /// Accepts both what PostgreSQL reports (`"16.4 (Debian 16.4-1.pgdg120+1)"`,
    /// `"PostgreSQL 16.4 on x86_64..."`) and what CockroachDB reports
    /// (`"CockroachDB CCL v24.3.1 (x86_64-pc-linux-gnu, ...)"`).
    pub fn parse(version: &str) -> Option<ServerVersion> {
        version.split_whitespace().find_map(|word| {
            let word = word.strip_prefix('v').unwrap_or(word);
            let mut parts = word.split('.');
            let major = parts.next()?.parse().ok()?;
            let minor = match parts.next() {
                Some(minor) => minor
                    .chars()
                    .take_while(char::is_ascii_digit)
                    .collect::<String>()
                    .parse()
                    .ok()?,
                None => 0,
            };
            Some(ServerVersion { major, minor })
        })
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Determines the server version.
///
/// A configured override wins. Otherwise the version reported by the server is
/// parsed, and an unrecognized version string yields `None` instead of an error.
#[instrument(skip(conn))]
pub async fn server_version(
    conn: &mut DbConnection,
    version_override: Option<ServerVersion>,
) -> Result<Option<ServerVersion>, sqlx::Error> {
    if let Some(version) = version_override {
        tracing::debug!("Using configured server version {}", version);
        return Ok(Some(version));
    }
    let reported: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(conn)
        .await?;
    let version = ServerVersion::parse(&reported);
    if version.is_none() {
        tracing::warn!("Unrecognized server version: {:?}", reported);
    }
    Ok(version)
}
