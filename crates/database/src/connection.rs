use crate::error::DbError;
use configuration::{OracleSettings, PostgresSettings};
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

/// Establishes a connection pool to the PostgreSQL tenant database.
pub async fn connect(settings: &PostgresSettings) -> Result<PgPool, DbError> {
    let url = settings
        .url
        .as_deref()
        .filter(|u| !u.trim().is_empty())
        .ok_or(DbError::NotConfigured("postgres"))?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .connect(url)
        .await?;

    Ok(pool)
}

/// Everything needed to open an Oracle session. Sessions are opened per call
/// and closed when the call ends.
#[derive(Clone)]
pub struct OracleConnector {
    user: String,
    password: String,
    connect_string: String,
    call_timeout: Duration,
}

impl std::fmt::Debug for OracleConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConnector")
            .field("user", &self.user)
            .field("connect_string", &self.connect_string)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

impl OracleConnector {
    pub fn from_settings(settings: &OracleSettings) -> Result<Self, DbError> {
        let (user, password) = settings
            .credentials()
            .map_err(|e| DbError::ConnectionConfigError(e.to_string()))?;
        let connect_string = settings
            .connect_string()
            .map_err(|e| DbError::ConnectionConfigError(e.to_string()))?;
        Ok(Self {
            user: user.to_string(),
            password: password.to_string(),
            connect_string,
            call_timeout: Duration::from_secs(settings.call_timeout_secs),
        })
    }

    pub fn connect_string(&self) -> &str {
        &self.connect_string
    }

    /// Opens a session. `timeout` overrides the configured call timeout.
    /// Blocking: call from a blocking context.
    pub fn connect(&self, timeout: Option<Duration>) -> Result<oracle::Connection, DbError> {
        let conn = oracle::Connection::connect(&self.user, &self.password, &self.connect_string)?;
        conn.set_call_timeout(Some(timeout.unwrap_or(self.call_timeout)))?;
        Ok(conn)
    }
}
