// ABOUTME: Parses the TOML configuration file for database connection settings
// ABOUTME: Required keys are resolved lazily, per connection attempt

use crate::error::ConnectError;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Schema selected on every connection unless the settings override it
pub const DEFAULT_SCHEMA: &str = "airline";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database: DatabaseSettings,
}

/// Raw `[database]` table
///
/// Every key is optional at parse time. A missing required key only fails
/// the connection attempt that needs it, see [`DatabaseSettings::resolve`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub sslmode: Option<String>,
}

/// Fully resolved connection parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub schema: String,
    pub sslmode: Option<String>,
}

impl DatabaseSettings {
    /// Resolve the settings into connection parameters
    ///
    /// `host`, `port`, `user` and `password` are required. `database`
    /// defaults to the user name and `schema` to [`DEFAULT_SCHEMA`].
    pub fn resolve(&self) -> std::result::Result<ConnectionParams, ConnectError> {
        let host = self
            .host
            .clone()
            .ok_or(ConnectError::Configuration("host"))?;
        let port = self.port.ok_or(ConnectError::Configuration("port"))?;
        let user = self
            .user
            .clone()
            .ok_or(ConnectError::Configuration("user"))?;
        let password = self
            .password
            .clone()
            .ok_or(ConnectError::Configuration("password"))?;
        let database = self.database.clone().unwrap_or_else(|| user.clone());
        let schema = self
            .schema
            .clone()
            .unwrap_or_else(|| DEFAULT_SCHEMA.to_string());

        Ok(ConnectionParams {
            host,
            port,
            user,
            password,
            database,
            schema,
            sslmode: self.sslmode.clone(),
        })
    }
}

pub fn parse_config(raw: &str) -> Result<AppConfig> {
    toml::from_str(raw).context("Failed to parse TOML configuration")
}

pub fn load_config_from_file(path: &str) -> Result<AppConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path))?;
    let config: AppConfig =
        toml::from_str(&raw).with_context(|| format!("Failed to parse TOML config at {}", path))?;

    tracing::debug!("Loaded configuration from {}", path);

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_sample_config() {
        let mut tmp = NamedTempFile::new().unwrap();
        let contents = r#"
            [database]
            host = "db.internal"
            port = 5433
            user = "fleet"
            password = "secret"
            database = "operations"
        "#;
        use std::io::Write;
        write!(tmp, "{}", contents).unwrap();

        let config = load_config_from_file(tmp.path().to_str().unwrap()).unwrap();
        let params = config.database.resolve().unwrap();
        assert_eq!(params.host, "db.internal");
        assert_eq!(params.port, 5433);
        assert_eq!(params.user, "fleet");
        assert_eq!(params.database, "operations");
        assert_eq!(params.schema, DEFAULT_SCHEMA);
        assert_eq!(params.sslmode, None);
    }

    #[test]
    fn database_name_falls_back_to_user() {
        let config = parse_config(
            r#"
            [database]
            host = "localhost"
            port = 5432
            user = "ops"
            password = "pw"
            "#,
        )
        .unwrap();

        assert_eq!(config.database.resolve().unwrap().database, "ops");
    }

    #[test]
    fn missing_key_fails_only_on_resolve() {
        let config = parse_config(
            r#"
            [database]
            host = "localhost"
            port = 5432
            user = "ops"
            "#,
        )
        .unwrap();

        let err = config.database.resolve().unwrap_err();
        assert!(matches!(err, ConnectError::Configuration("password")));
    }

    #[test]
    fn empty_file_parses_to_unresolvable_settings() {
        let config = parse_config("").unwrap();
        assert!(matches!(
            config.database.resolve(),
            Err(ConnectError::Configuration("host"))
        ));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = load_config_from_file("/nonexistent/fleet-config.toml");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to read config file"));
    }
}
