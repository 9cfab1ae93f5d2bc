use crate::error::ConfigError;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{
    GuardrailSettings, LoggingSettings, MAX_ARCHIVE_COUNT, OracleSettings, PostgresSettings,
    RoutingSettings, ServerSettings, Settings,
};

/// Base name of the optional configuration file (`contact-gateway.toml`).
pub const CONFIG_FILE: &str = "contact-gateway";

/// Prefix of environment overrides, e.g. `CONTACT_POSTGRES__URL`.
pub const ENV_PREFIX: &str = "CONTACT";

fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(config::Config::builder()
        .set_default("postgres.max_connections", 10_i64)?
        .set_default("postgres.acquire_timeout_secs", 5_i64)?
        .set_default("postgres.statement_timeout_ms", 10_000_i64)?
        .set_default("postgres.routed_statement_timeout_ms", 30_000_i64)?
        .set_default("oracle.port", 1521_i64)?
        .set_default("oracle.call_timeout_secs", 30_i64)?
        .set_default("oracle.client_table", "lvousr.client")?
        .set_default("routing.postgres_marker", "postgres")?
        .set_default("routing.archive_count", 2_i64)?
        .set_default("guardrails.redact_results", true)?
        .set_default("server.addr", "0.0.0.0:3000")?
        .set_default("logging.filter", "info")?)
}

/// Loads the application settings.
///
/// Layers, lowest first: built-in defaults, the TOML file at `path` (or an
/// optional `contact-gateway.toml` in the working directory), then
/// `CONTACT_*` environment variables with `__` separating nested keys.
/// A `.env` file, when present, is loaded into the environment first.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    dotenvy::dotenv().ok();

    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(CONFIG_FILE).required(false),
    };

    let settings = with_defaults()?
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize::<Settings>()?;

    settings.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<Settings, ConfigError> {
        let settings = with_defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize::<Settings>()?;
        settings.validate()
    }

    #[test]
    fn defaults_fill_every_section() {
        let settings = from_toml("").unwrap();
        assert_eq!(settings.postgres.statement_timeout_ms, 10_000);
        assert_eq!(settings.postgres.routed_statement_timeout_ms, 30_000);
        assert_eq!(settings.oracle.port, 1521);
        assert_eq!(settings.oracle.client_table, "lvousr.client");
        assert_eq!(settings.routing.postgres_marker, "postgres");
        assert_eq!(settings.routing.archive_count, 2);
        assert!(settings.guardrails.redact_results);
        assert!(settings.postgres.url.is_none());
    }

    #[test]
    fn archive_count_is_clamped() {
        let settings = from_toml("[routing]\narchive_count = 7\n").unwrap();
        assert_eq!(settings.routing.archive_count, MAX_ARCHIVE_COUNT);

        let settings = from_toml("[routing]\narchive_count = 0\n").unwrap();
        assert_eq!(settings.routing.archive_count, 0);
    }

    #[test]
    fn unsafe_client_tables_are_rejected() {
        let result = from_toml("[oracle]\nclient_table = \"lvousr.client; drop\"\n");
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn oracle_connect_string_prefers_dsn() {
        let settings = from_toml(
            "[oracle]\nhost = \"db.internal\"\nservice = \"CFG\"\nuser = \"app\"\npassword = \"pw\"\n",
        )
        .unwrap();
        assert_eq!(settings.oracle.connect_string().unwrap(), "//db.internal:1521/CFG");
        assert_eq!(settings.oracle.credentials().unwrap(), ("app", "pw"));

        let settings = from_toml("[oracle]\ndsn = \"cfg-db/CFG\"\nhost = \"ignored\"\n").unwrap();
        assert_eq!(settings.oracle.connect_string().unwrap(), "cfg-db/CFG");
    }

    #[test]
    fn missing_oracle_connection_details_fail() {
        let settings = from_toml("").unwrap();
        assert!(settings.oracle.connect_string().is_err());
        assert!(settings.oracle.credentials().is_err());
    }
}
