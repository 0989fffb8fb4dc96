// ABOUTME: User repository: CRUD with partial updates, role reports and login
// ABOUTME: Passwords are hashed before storage and never returned to callers

use crate::config::DatabaseSettings;
use crate::credentials::{hash_password, verify_password};
use crate::error::{AuthFailure, DataError};
use crate::filters::{build_equality, build_filter, SqlFilter, SqlValue, UserColumn};
use crate::postgres::{Record, Session};
use once_cell::sync::Lazy;
use tokio_postgres::types::ToSql;

/// Columns returned for user listings; the password hash is left out
const USER_COLUMNS: &str = "userid, firstname, lastname, userroleid";

/// Checked against when the user id is unknown, so every failed login costs
/// one bcrypt verification
static UNKNOWN_USER_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("no such user").ok());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub user_role_id: i64,
    /// Plaintext; hashed before it reaches the database
    pub password: String,
}

/// Fields to change on an existing user; `None` leaves the stored value
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub user_role_id: Option<i64>,
    /// Plaintext; hashed before it reaches the database
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.user_role_id.is_none()
            && self.password.is_none()
    }

    /// Column/value pairs for the supplied fields, password already hashed
    fn assignments(&self) -> Result<Vec<(&'static str, SqlValue)>, DataError> {
        let mut assignments = Vec::new();

        if let Some(ref first_name) = self.first_name {
            assignments.push(("firstname", SqlValue::Text(first_name.clone())));
        }
        if let Some(ref last_name) = self.last_name {
            assignments.push(("lastname", SqlValue::Text(last_name.clone())));
        }
        if let Some(role) = self.user_role_id {
            assignments.push(("userroleid", SqlValue::Integer(role)));
        }
        if let Some(ref password) = self.password {
            assignments.push(("password", SqlValue::Text(hash_password(password)?)));
        }

        Ok(assignments)
    }
}

/// `UPDATE users SET a = $1, b = $2 WHERE userid = $3` for the given columns
fn update_statement(columns: &[&'static str]) -> String {
    let set_items = columns
        .iter()
        .enumerate()
        .map(|(i, column)| format!("{} = ${}", column, i + 1))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "UPDATE users SET {} WHERE userid = ${}",
        set_items,
        columns.len() + 1
    )
}

#[derive(Debug, Clone)]
pub struct UserRepository {
    settings: DatabaseSettings,
}

impl UserRepository {
    pub fn new(settings: DatabaseSettings) -> Self {
        Self { settings }
    }

    pub async fn list(&self) -> Result<Vec<Record>, DataError> {
        let session = Session::open(&self.settings).await?;
        let sql = format!("SELECT {} FROM users ORDER BY userid", USER_COLUMNS);
        session.fetch_all(&sql, &[]).await
    }

    pub async fn list_roles(&self) -> Result<Vec<Record>, DataError> {
        let session = Session::open(&self.settings).await?;
        session
            .fetch_all("SELECT * FROM userroles ORDER BY userroleid", &[])
            .await
    }

    pub async fn get_by_id(&self, user_id: &str) -> Result<Option<Record>, DataError> {
        let session = Session::open(&self.settings).await?;
        let sql = format!("SELECT {} FROM users WHERE userid = $1", USER_COLUMNS);
        session.fetch_one(&sql, &[&user_id]).await
    }

    /// Users whose `attribute` equals `value` exactly
    pub async fn find_by(&self, attribute: &str, value: &str) -> Result<Vec<Record>, DataError> {
        let filter = build_equality::<UserColumn>(attribute, value)?;
        self.select_where(&filter).await
    }

    /// Users matching `attribute operator value`; see [`build_filter`]
    pub async fn search(
        &self,
        attribute: &str,
        operator: &str,
        value: &str,
    ) -> Result<Vec<Record>, DataError> {
        let filter = build_filter::<UserColumn>(attribute, operator, value)?;
        self.select_where(&filter).await
    }

    async fn select_where(&self, filter: &SqlFilter) -> Result<Vec<Record>, DataError> {
        let session = Session::open(&self.settings).await?;
        let sql = format!(
            "SELECT {} FROM users WHERE {} ORDER BY userid",
            USER_COLUMNS,
            filter.clause()
        );
        session.fetch_all(&sql, &[filter.param().as_sql()]).await
    }

    pub async fn add(&self, user: &NewUser) -> Result<(), DataError> {
        let password_hash = hash_password(&user.password)?;

        let mut session = Session::open(&self.settings).await?;
        session
            .execute(
                "INSERT INTO users (userid, firstname, lastname, userroleid, password) \
                 VALUES ($1, $2, $3, $4, $5)",
                &[
                    &user.user_id,
                    &user.first_name,
                    &user.last_name,
                    &user.user_role_id,
                    &password_hash,
                ],
            )
            .await?;

        tracing::info!("Added user {}", user.user_id);
        Ok(())
    }

    /// Change only the supplied fields
    ///
    /// An empty update does not open a connection and returns 0.
    pub async fn update(&self, user_id: &str, update: &UserUpdate) -> Result<u64, DataError> {
        if update.is_empty() {
            tracing::debug!("Nothing to update for user {}", user_id);
            return Ok(0);
        }

        let assignments = update.assignments()?;
        let columns: Vec<&'static str> = assignments.iter().map(|(column, _)| *column).collect();
        let sql = update_statement(&columns);

        let user_id = user_id.to_string();
        let mut params: Vec<&(dyn ToSql + Sync)> =
            assignments.iter().map(|(_, value)| value.as_sql()).collect();
        params.push(&user_id);

        let mut session = Session::open(&self.settings).await?;
        session.execute(&sql, &params).await
    }

    /// Delete by ID; a missing ID affects 0 rows and is not an error
    pub async fn delete(&self, user_id: &str) -> Result<u64, DataError> {
        let mut session = Session::open(&self.settings).await?;
        session
            .execute("DELETE FROM users WHERE userid = $1", &[&user_id])
            .await
    }

    /// Users joined with their role
    ///
    /// `userroleid` appears in both tables; the record keeps the role
    /// table's copy.
    pub async fn list_consolidated(&self) -> Result<Vec<Record>, DataError> {
        let session = Session::open(&self.settings).await?;
        session
            .fetch_all(
                "SELECT users.userid, users.firstname, users.lastname, users.userroleid, \
                        userroles.* \
                 FROM users \
                     JOIN userroles ON (users.userroleid = userroles.userroleid) \
                 ORDER BY users.userid",
                &[],
            )
            .await
    }

    /// Number of users per role, as `userroleid` / `count`
    pub async fn count_by_role(&self) -> Result<Vec<Record>, DataError> {
        let session = Session::open(&self.settings).await?;
        session
            .fetch_all(
                "SELECT userroleid, COUNT(*) AS count \
                 FROM users \
                 GROUP BY userroleid \
                 ORDER BY userroleid ASC",
                &[],
            )
            .await
    }

    /// Check a user id and password
    ///
    /// On success returns the user joined with their role, without the
    /// password hash.
    ///
    /// # Errors
    ///
    /// [`DataError::Authentication`] for an unknown user or a wrong password.
    /// Both variants display identically.
    pub async fn login(&self, user_id: &str, password: &str) -> Result<Record, DataError> {
        let session = Session::open(&self.settings).await?;
        let found = session
            .fetch_one(
                "SELECT * \
                 FROM users \
                     JOIN userroles ON (users.userroleid = userroles.userroleid) \
                 WHERE users.userid = $1",
                &[&user_id],
            )
            .await?;
        drop(session);

        let Some(mut record) = found else {
            if let Some(hash) = UNKNOWN_USER_HASH.as_deref() {
                let _ = verify_password(password, hash);
            }
            tracing::debug!("Login failed: user not found");
            return Err(DataError::Authentication(AuthFailure::UserNotFound));
        };

        let verified = match record.get("password").and_then(|v| v.as_str()) {
            Some(stored_hash) => match verify_password(password, stored_hash) {
                Ok(matches) => matches,
                Err(e) => {
                    tracing::warn!("Stored password hash for a user is unreadable: {}", e);
                    false
                }
            },
            None => {
                tracing::warn!("User record has no password hash");
                false
            }
        };

        if !verified {
            tracing::debug!("Login failed: invalid password");
            return Err(DataError::Authentication(AuthFailure::InvalidCredentials));
        }

        record.remove("password");
        tracing::info!("User {} logged in", user_id);
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_statement_numbers_placeholders_in_order() {
        assert_eq!(
            update_statement(&["firstname"]),
            "UPDATE users SET firstname = $1 WHERE userid = $2"
        );
        assert_eq!(
            update_statement(&["lastname", "userroleid", "password"]),
            "UPDATE users SET lastname = $1, userroleid = $2, password = $3 WHERE userid = $4"
        );
    }

    #[test]
    fn test_partial_update_includes_only_supplied_fields() {
        let update = UserUpdate {
            last_name: Some("Nguyen".to_string()),
            user_role_id: Some(2),
            ..Default::default()
        };

        let assignments = update.assignments().unwrap();
        assert_eq!(
            assignments,
            vec![
                ("lastname", SqlValue::Text("Nguyen".to_string())),
                ("userroleid", SqlValue::Integer(2)),
            ]
        );
    }

    #[test]
    fn test_password_update_is_hashed() {
        let update = UserUpdate {
            password: Some("hunter2".to_string()),
            ..Default::default()
        };

        let assignments = update.assignments().unwrap();
        assert_eq!(assignments.len(), 1);
        let (column, value) = &assignments[0];
        assert_eq!(*column, "password");
        match value {
            SqlValue::Text(hash) => {
                assert_ne!(hash, "hunter2");
                assert!(verify_password("hunter2", hash).unwrap());
            }
            other => panic!("expected hashed text, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_update() {
        assert!(UserUpdate::default().is_empty());
        assert!(!UserUpdate {
            first_name: Some(String::new()),
            ..Default::default()
        }
        .is_empty());
    }

    #[tokio::test]
    async fn test_empty_update_does_not_connect() {
        // Default settings cannot connect, so a connection attempt would error
        let repo = UserRepository::new(DatabaseSettings::default());
        let updated = repo.update("jdoe", &UserUpdate::default()).await.unwrap();
        assert_eq!(updated, 0);
    }

    #[tokio::test]
    async fn test_search_rejects_injection_in_attribute() {
        let repo = UserRepository::new(DatabaseSettings::default());
        let err = repo
            .search("userroleid; DROP TABLE users", "=", "1")
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));
    }

    #[test]
    fn test_unknown_user_hash_runs_a_full_verification() {
        let hash = UNKNOWN_USER_HASH
            .as_deref()
            .expect("placeholder hash is generated");
        // Ok means bcrypt parsed the hash and did the work
        assert!(!verify_password("electra-1937", hash).unwrap());
    }

    #[tokio::test]
    async fn test_login_without_settings_is_unavailable_not_auth_failure() {
        let repo = UserRepository::new(DatabaseSettings::default());
        let err = repo.login("jdoe", "pw").await.unwrap_err();
        assert!(matches!(err, DataError::Unavailable(_)));
    }
}
