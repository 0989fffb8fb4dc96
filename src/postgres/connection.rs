// ABOUTME: PostgreSQL connection provider for the fleet record store
// ABOUTME: Resolves settings, sets up TLS and keepalives, selects the schema

use crate::config::{ConnectionParams, DatabaseSettings};
use crate::error::ConnectError;
use crate::utils;
use native_tls::TlsConnector;
use postgres_native_tls::MakeTlsConnector;
use std::time::Duration;
use tokio_postgres::config::SslMode;
use tokio_postgres::{Client, Config};

/// Idle time before the first TCP keepalive probe
const KEEPALIVE_IDLE: Duration = Duration::from_secs(60);

/// Build a driver configuration from resolved connection parameters
///
/// Parameters are set field by field rather than assembled into a URL, so
/// passwords containing `@`, `/` or `?` need no escaping. TCP keepalives are
/// always enabled to survive idle timeouts on load balancers.
///
/// # Errors
///
/// Returns [`ConnectError::Unknown`] if `sslmode` is not one of `disable`,
/// `prefer` or `require`.
pub fn build_pg_config(params: &ConnectionParams) -> Result<Config, ConnectError> {
    let ssl_mode = match params.sslmode.as_deref() {
        None | Some("prefer") => SslMode::Prefer,
        Some("disable") => SslMode::Disable,
        Some("require") => SslMode::Require,
        Some(other) => {
            return Err(ConnectError::Unknown(format!(
                "Unsupported sslmode '{}'. Expected disable, prefer or require",
                utils::sanitize_identifier(other)
            )))
        }
    };

    let mut config = Config::new();
    config
        .host(&params.host)
        .port(params.port)
        .user(&params.user)
        .password(&params.password)
        .dbname(&params.database)
        .application_name("fleet-records")
        .ssl_mode(ssl_mode)
        .keepalives(true)
        .keepalives_idle(KEEPALIVE_IDLE);

    Ok(config)
}

/// Turn a driver connection error into an operator-facing hint
fn connection_hint(error: &tokio_postgres::Error) -> &'static str {
    let error_msg = error.to_string();

    if error_msg.contains("password authentication failed") {
        "Authentication failed: check the user and password settings"
    } else if error_msg.contains("database") && error_msg.contains("does not exist") {
        "Database does not exist: check the database setting"
    } else if error_msg.contains("Connection refused") || error_msg.contains("could not connect")
    {
        "Connection refused: check host, port and that the server is running"
    } else if error_msg.contains("timeout") || error_msg.contains("timed out") {
        "Connection timeout: the database server did not respond in time"
    } else if error_msg.contains("SSL") || error_msg.contains("TLS") {
        "TLS/SSL error: check the sslmode setting"
    } else if error_msg.contains("no pg_hba.conf entry") {
        "Access denied: no pg_hba.conf entry for this host"
    } else {
        "Operational error: check your credentials or network"
    }
}

async fn establish(settings: &DatabaseSettings) -> Result<Client, ConnectError> {
    let params = settings.resolve()?;

    // The schema name is interpolated into SET, so it must be an identifier
    utils::validate_postgres_identifier(&params.schema)
        .map_err(|e| ConnectError::Unknown(format!("Invalid schema name: {}", e)))?;

    let pg_config = build_pg_config(&params)?;

    let tls_connector = TlsConnector::builder()
        .danger_accept_invalid_certs(false)
        .build()
        .map_err(|e| ConnectError::Unknown(format!("Failed to build TLS connector: {}", e)))?;
    let tls = MakeTlsConnector::new(tls_connector);

    let (client, connection) = pg_config.connect(tls).await.map_err(|e| {
        tracing::error!("{}", connection_hint(&e));
        ConnectError::Connectivity(e)
    })?;

    // The driver task finishes once the client is dropped
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Connection error: {}", e);
        }
    });

    let set_schema = format!("SET search_path TO {}", utils::quote_ident(&params.schema));
    client
        .batch_execute(&set_schema)
        .await
        .map_err(|source| ConnectError::SchemaSetup {
            schema: params.schema.clone(),
            source,
        })?;

    tracing::debug!(
        "Connected to {}:{}/{} (schema {})",
        params.host,
        params.port,
        params.database,
        params.schema
    );

    Ok(client)
}

/// Open a connection and select the configured schema
///
/// Every failure is logged here and returned as a [`ConnectError`]; nothing
/// propagates as a panic. Callers decide how to present "unavailable".
///
/// # Errors
///
/// - [`ConnectError::Configuration`] if a required setting is missing
/// - [`ConnectError::Connectivity`] for network or credential failures
/// - [`ConnectError::SchemaSetup`] if `SET search_path` fails
/// - [`ConnectError::Unknown`] for anything else
///
/// # Examples
///
/// ```no_run
/// # use fleet_records::config::load_config_from_file;
/// # use fleet_records::postgres::connect;
/// # async fn example() -> anyhow::Result<()> {
/// let config = load_config_from_file("config.toml")?;
/// let client = connect(&config.database).await?;
/// # Ok(())
/// # }
/// ```
pub async fn connect(settings: &DatabaseSettings) -> Result<Client, ConnectError> {
    let result = establish(settings).await;

    if let Err(ref e) = result {
        match e {
            ConnectError::Configuration(_) => tracing::error!("Configuration error: {}", e),
            ConnectError::Connectivity(_) => tracing::error!(
                "Operational error while connecting to the database: {}",
                e
            ),
            ConnectError::SchemaSetup { .. } => {
                tracing::error!("Schema setup failed: {}", e)
            }
            ConnectError::Unknown(_) => tracing::error!("{}", e),
        }
    }

    result
}
