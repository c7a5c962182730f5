//! For reading application configuration.

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use serde::Deserialize;
use std::time::Duration;

/// Application configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// Server address.
    pub address: String,
    /// Server http port.
    pub port: u16,
    /// Seconds before an in-flight request is aborted.
    pub request_timeout_secs: u64,
    /// Maximum number of requests served at once.
    pub concurrency_limit: usize,
}

impl ServerConfig {
    /// The request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Database configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    /// The database connection string.
    pub url: String,
    /// Seconds to wait for a pooled connection.
    pub acquire_timeout_secs: u64,
    /// Server version to assume instead of parsing what the server reports,
    /// e.g. `"24.3"`.
    #[serde(default)]
    pub server_version_override: Option<String>,
}

impl DatabaseConfig {
    /// The pool acquire timeout as a [`Duration`].
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }
}

/// Built-in values, overridden by every other source.
fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    config::Config::builder()
        .set_default("server.address", "0.0.0.0")?
        .set_default("server.port", 8000)?
        .set_default("server.request_timeout_secs", 10)?
        .set_default("server.concurrency_limit", 500)?
        .set_default(
            "database.url",
            "postgres://root@localhost:26257/defaultdb?sslmode=disable",
        )?
        .set_default("database.acquire_timeout_secs", 5)
}

/// Retrieve [`Config`] from defaults, the optional `config` file,
/// `APP__`-prefixed environment variables and `DATABASE_URL`.
#[tracing::instrument]
pub fn load_config() -> Result<Config, ConfigError> {
    defaults()?
        .add_source(config::File::with_name("config").required(false))
        .add_source(config::Environment::with_prefix("app").separator("__"))
        .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
        .build()?
        .try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn load_from_str(toml: &str) -> Config {
        defaults()
            .unwrap()
            .add_source(config::File::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn defaults_fill_missing_values() {
        let config = load_from_str("");
        assert_eq!(8000, config.server.port);
        assert_eq!(Duration::from_secs(10), config.server.request_timeout());
        assert_eq!(Duration::from_secs(5), config.database.acquire_timeout());
        assert_eq!(None, config.database.server_version_override);
    }

    #[test]
    fn file_values_override_defaults() {
        let config = load_from_str(
            r#"
            [server]
            port = 9000

            [database]
            url = "postgres://postgres@db/items"
            server_version_override = "24.3"
            "#,
        );
        assert_eq!(9000, config.server.port);
        assert_eq!("0.0.0.0", config.server.address);
        assert_eq!("postgres://postgres@db/items", config.database.url);
        assert_eq!(
            Some("24.3"),
            config.database.server_version_override.as_deref()
        );
    }
}
