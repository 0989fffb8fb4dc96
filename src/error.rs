// ABOUTME: Error taxonomy for the fleet record data-access layer
// ABOUTME: Separates connection, validation, query and authentication failures

use thiserror::Error;

/// Why a connection could not be established
///
/// Returned by [`crate::postgres::connect`] instead of a missing client, so
/// callers cannot mistake an unavailable database for an empty result.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// A required `[database]` setting is absent
    #[error("Missing required database setting '{0}'")]
    Configuration(&'static str),

    /// Network or credential failure while connecting
    #[error("Could not connect to the database: {0}")]
    Connectivity(#[source] tokio_postgres::Error),

    /// The connection opened but the schema could not be selected
    #[error("Failed to select schema '{schema}': {source}")]
    SchemaSetup {
        schema: String,
        #[source]
        source: tokio_postgres::Error,
    },

    #[error("Unexpected error while connecting: {0}")]
    Unknown(String),
}

/// Why an authentication attempt failed
///
/// Both variants render the same message so that a caller showing the error
/// to a user does not reveal whether the user id exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AuthFailure {
    #[error("invalid user id or password")]
    UserNotFound,
    #[error("invalid user id or password")]
    InvalidCredentials,
}

/// Errors surfaced by repositories and the query session
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Database unavailable: {0}")]
    Unavailable(#[from] ConnectError),

    /// One message per violated rule, collected rather than fail-fast
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("{entity} with id '{id}' already exists")]
    DuplicateKey { entity: &'static str, id: String },

    #[error("{context}: {source}")]
    Query {
        context: String,
        #[source]
        source: tokio_postgres::Error,
    },

    /// A result column whose type has no record representation
    #[error("Column '{column}' has unsupported type '{type_name}'; cast it in the query")]
    UnsupportedColumn { column: String, type_name: String },

    #[error("Authentication failed: {0}")]
    Authentication(AuthFailure),

    #[error("Password hashing failed: {0}")]
    Credential(#[from] bcrypt::BcryptError),
}

impl DataError {
    pub(crate) fn query(context: impl Into<String>, source: tokio_postgres::Error) -> Self {
        DataError::Query {
            context: context.into(),
            source,
        }
    }

    /// Validation messages, if this is a validation failure
    pub fn violations(&self) -> Option<&[String]> {
        match self {
            DataError::Validation(messages) => Some(messages),
            _ => None,
        }
    }
}
