// ABOUTME: Parameterized query execution over a single owned connection
// ABOUTME: Wraps mutations in commit-on-success / rollback-on-failure transactions

use crate::config::DatabaseSettings;
use crate::error::DataError;
use crate::postgres::connection;
use crate::postgres::materialize::{materialize_all, materialize_one, Record};
use tokio_postgres::types::ToSql;
use tokio_postgres::Client;

/// Positional parameter list, bound by the driver as `$1..$n`
pub type Params<'a> = [&'a (dyn ToSql + Sync)];

/// One connection, used for the statements of a single operation
///
/// Dropping the session closes the connection, so it is released on every
/// exit path including early returns through `?`.
pub struct Session {
    client: Client,
}

impl Session {
    /// Open a connection for one repository operation
    ///
    /// # Errors
    ///
    /// Returns [`DataError::Unavailable`] if the connection provider fails.
    pub async fn open(settings: &DatabaseSettings) -> Result<Self, DataError> {
        let client = connection::connect(settings).await?;
        Ok(Self { client })
    }

    /// Run a read-only statement and materialize every row
    ///
    /// Statements without result columns are executed and produce an empty
    /// vector. No transaction is opened.
    pub async fn fetch_all(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<Vec<Record>, DataError> {
        log_statement(sql, params);

        let statement = self
            .client
            .prepare(sql)
            .await
            .map_err(|e| DataError::query("Failed to prepare statement", e))?;

        if statement.columns().is_empty() {
            self.client
                .execute(&statement, params)
                .await
                .map_err(|e| DataError::query("Failed to execute statement", e))?;
            return Ok(Vec::new());
        }

        let rows = self
            .client
            .query(&statement, params)
            .await
            .map_err(|e| DataError::query("Failed to execute query", e))?;

        materialize_all(&rows)
    }

    /// Run a read-only statement and materialize its first row, if any
    pub async fn fetch_one(
        &self,
        sql: &str,
        params: &Params<'_>,
    ) -> Result<Option<Record>, DataError> {
        log_statement(sql, params);

        let rows = self
            .client
            .query(sql, params)
            .await
            .map_err(|e| DataError::query("Failed to execute query", e))?;

        materialize_one(rows.first())
    }

    /// Run an insert, update or delete inside a transaction
    ///
    /// Commits when the statement succeeds. On failure the transaction is
    /// rolled back and the driver error is returned; a failed rollback is
    /// logged and does not replace the original error.
    ///
    /// # Returns
    ///
    /// Number of rows affected
    pub async fn execute(&mut self, sql: &str, params: &Params<'_>) -> Result<u64, DataError> {
        log_statement(sql, params);

        let transaction = self
            .client
            .transaction()
            .await
            .map_err(|e| DataError::query("Failed to begin transaction", e))?;

        match transaction.execute(sql, params).await {
            Ok(affected) => {
                transaction
                    .commit()
                    .await
                    .map_err(|e| DataError::query("Failed to commit transaction", e))?;
                tracing::debug!("Committed statement affecting {} row(s)", affected);
                Ok(affected)
            }
            Err(e) => {
                if let Err(rollback_err) = transaction.rollback().await {
                    tracing::warn!("Rollback failed: {}", rollback_err);
                }
                tracing::error!("Statement failed and was rolled back: {}", e);
                Err(DataError::query("Failed to execute statement", e))
            }
        }
    }
}

/// Parameter values are never logged; one of them may be a password hash.
fn log_statement(sql: &str, params: &Params<'_>) {
    tracing::debug!(
        "Executing SQL with {} bound parameter(s): {}",
        params.len(),
        sql.split_whitespace().collect::<Vec<_>>().join(" ")
    );
}
