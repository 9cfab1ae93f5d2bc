use crate::error::ConfigError;
use serde::Deserialize;

/// The largest number of monthly archive tables a historical read may union.
pub const MAX_ARCHIVE_COUNT: u32 = 2;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub postgres: PostgresSettings,
    pub oracle: OracleSettings,
    pub routing: RoutingSettings,
    pub guardrails: GuardrailSettings,
    pub server: ServerSettings,
    pub logging: LoggingSettings,
}

/// Connection settings for the Postgres tenant database.
#[derive(Debug, Clone, Deserialize)]
pub struct PostgresSettings {
    /// A `postgres://` connection URL. Postgres operations fail when unset.
    pub url: Option<String>,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    /// Session statement timeout applied before plain reads.
    pub statement_timeout_ms: u64,
    /// Session statement timeout applied before routed (historical) reads.
    pub routed_statement_timeout_ms: u64,
}

/// Connection settings for the Oracle configuration database.
#[derive(Debug, Clone, Deserialize)]
pub struct OracleSettings {
    pub user: Option<String>,
    pub password: Option<String>,
    /// A full connect descriptor. Takes precedence over host/port/service.
    pub dsn: Option<String>,
    pub host: Option<String>,
    pub port: u16,
    pub service: Option<String>,
    /// Round-trip timeout for every Oracle call.
    pub call_timeout_secs: u64,
    /// Schema-qualified table that maps client ids to database links.
    pub client_table: String,
}

impl OracleSettings {
    /// The connect string handed to the Oracle client.
    pub fn connect_string(&self) -> Result<String, ConfigError> {
        if let Some(dsn) = self.dsn.as_deref().filter(|d| !d.trim().is_empty()) {
            return Ok(dsn.trim().to_string());
        }
        match (self.host.as_deref(), self.service.as_deref()) {
            (Some(host), Some(service)) if !host.is_empty() && !service.is_empty() => {
                Ok(format!("//{host}:{}/{service}", self.port))
            }
            _ => Err(ConfigError::ValidationError(
                "Missing Oracle config: oracle.host/oracle.service or oracle.dsn".to_string(),
            )),
        }
    }

    pub fn credentials(&self) -> Result<(&str, &str), ConfigError> {
        match (self.user.as_deref(), self.password.as_deref()) {
            (Some(user), Some(password)) if !user.is_empty() && !password.is_empty() => {
                Ok((user, password))
            }
            _ => Err(ConfigError::ValidationError(
                "Missing Oracle config: oracle.user/oracle.password".to_string(),
            )),
        }
    }
}

/// How database links are classified and how far back historical reads go.
#[derive(Debug, Clone, Deserialize)]
pub struct RoutingSettings {
    /// Links containing this substring (case-insensitive) are Postgres.
    pub postgres_marker: String,
    /// Monthly archive tables unioned into transaction reads, 0 to 2.
    pub archive_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GuardrailSettings {
    /// Replace sensitive column values in every returned row.
    pub redact_results: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Socket address the HTTP transport binds to.
    pub addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Default `EnvFilter` directive; `RUST_LOG` overrides it.
    pub filter: String,
}

impl Settings {
    /// Checks cross-field rules and normalizes values that may be clamped.
    pub fn validate(mut self) -> Result<Self, ConfigError> {
        if self.routing.archive_count > MAX_ARCHIVE_COUNT {
            tracing::warn!(
                requested = self.routing.archive_count,
                max = MAX_ARCHIVE_COUNT,
                "routing.archive_count out of range, clamping"
            );
            self.routing.archive_count = MAX_ARCHIVE_COUNT;
        }

        // Interpolated into SQL as an identifier.
        let table = self.oracle.client_table.trim();
        let valid_identifier = !table.is_empty()
            && table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '$');
        if !valid_identifier {
            return Err(ConfigError::ValidationError(format!(
                "oracle.client_table is not a valid table name: '{table}'"
            )));
        }
        self.oracle.client_table = table.to_string();

        if self.postgres.max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "postgres.max_connections must be at least 1".to_string(),
            ));
        }
        Ok(self)
    }
}
