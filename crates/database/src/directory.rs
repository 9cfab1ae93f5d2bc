use crate::backend::{Backend, json_to_i64};
use crate::error::DbError;
use async_trait::async_trait;
use core_types::{BuiltQuery, Params, SqlValue};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::debug;

/// A client's database links, as stored in the configuration database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientLinks {
    pub dialing_db: String,
    pub reporting_db: Option<String>,
}

/// Routing lookups against the configuration database.
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    /// `Ok(None)` when no client row exists.
    async fn lookup_client_links(&self, client_id: i64) -> Result<Option<ClientLinks>, DbError>;

    /// Skill ids linked to the client, in the order the database returns them.
    async fn lookup_skills(&self, client_id: i64) -> Result<Vec<i64>, DbError>;
}

/// A `ClientDirectory` backed by the Oracle configuration database.
pub struct BackendClientDirectory {
    backend: Arc<dyn Backend>,
    client_table: String,
}

impl BackendClientDirectory {
    pub fn new(backend: Arc<dyn Backend>, client_table: impl Into<String>) -> Self {
        Self {
            backend,
            client_table: client_table.into(),
        }
    }

    fn by_client(sql: String, client_id: i64) -> BuiltQuery {
        BuiltQuery::new(
            sql,
            Params::Named(vec![("client_id".to_string(), SqlValue::Int(client_id))]),
        )
    }
}

fn text(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl ClientDirectory for BackendClientDirectory {
    async fn lookup_client_links(&self, client_id: i64) -> Result<Option<ClientLinks>, DbError> {
        let query = Self::by_client(
            format!(
                "SELECT dialing_db, reporting_db FROM {} WHERE client_id = :client_id",
                self.client_table
            ),
            client_id,
        );
        let rows = self.backend.fetch_all(&query, None).await?;
        let Some(row) = rows.first() else {
            return Ok(None);
        };
        // A client row without a dialing link cannot be routed.
        let links = text(row.get("dialing_db")).map(|dialing_db| ClientLinks {
            dialing_db,
            reporting_db: text(row.get("reporting_db")),
        });
        debug!(client_id, ?links, "client links resolved");
        Ok(links)
    }

    async fn lookup_skills(&self, client_id: i64) -> Result<Vec<i64>, DbError> {
        let query = Self::by_client(
            "SELECT skill_id FROM lvousr.skillxclient WHERE client_id = :client_id".to_string(),
            client_id,
        );
        let rows = self.backend.fetch_all(&query, None).await?;
        Ok(rows
            .iter()
            .filter_map(|row| row.get("skill_id").and_then(json_to_i64))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{DatabaseType, GeneratedKey, Row};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Answers every read with a canned row set and records the statements.
    struct CannedBackend {
        rows: Vec<Row>,
        seen: Mutex<Vec<BuiltQuery>>,
    }

    impl CannedBackend {
        fn new(rows: Vec<JsonValue>) -> Arc<Self> {
            Arc::new(Self {
                rows: rows.into_iter().filter_map(|r| r.as_object().cloned()).collect(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Backend for CannedBackend {
        fn database_type(&self) -> DatabaseType {
            DatabaseType::Oracle
        }

        async fn fetch_all(&self, query: &BuiltQuery, _: Option<Duration>) -> Result<Vec<Row>, DbError> {
            self.seen.lock().unwrap().push(query.clone());
            Ok(self.rows.clone())
        }

        async fn execute(&self, _: &BuiltQuery) -> Result<u64, DbError> {
            unreachable!("directory lookups never write")
        }

        async fn insert_returning_key(&self, _: &BuiltQuery, _: &GeneratedKey) -> Result<i64, DbError> {
            unreachable!("directory lookups never write")
        }
    }

    #[tokio::test]
    async fn client_links_come_from_the_configured_table() {
        let backend = CannedBackend::new(vec![json!({"dialing_db": "DIAL01", "reporting_db": "REP01"})]);
        let directory = BackendClientDirectory::new(backend.clone(), "lvousr.client");

        let links = directory.lookup_client_links(42).await.unwrap().unwrap();
        assert_eq!(links.dialing_db, "DIAL01");
        assert_eq!(links.reporting_db.as_deref(), Some("REP01"));

        let seen = backend.seen.lock().unwrap();
        assert_eq!(
            seen[0].sql,
            "SELECT dialing_db, reporting_db FROM lvousr.client WHERE client_id = :client_id"
        );
        assert_eq!(seen[0].params.get("client_id"), Some(&SqlValue::Int(42)));
    }

    #[tokio::test]
    async fn missing_client_and_blank_reporting_link() {
        let directory = BackendClientDirectory::new(CannedBackend::new(vec![]), "lvousr.client");
        assert_eq!(directory.lookup_client_links(7).await.unwrap(), None);

        let backend = CannedBackend::new(vec![json!({"dialing_db": "DIAL01", "reporting_db": null})]);
        let directory = BackendClientDirectory::new(backend, "lvousr.client");
        let links = directory.lookup_client_links(7).await.unwrap().unwrap();
        assert_eq!(links.reporting_db, None);
    }

    #[tokio::test]
    async fn skills_keep_database_order() {
        let backend = CannedBackend::new(vec![
            json!({"skill_id": 150747}),
            json!({"skill_id": "150748"}),
            json!({"skill_id": null}),
        ]);
        let directory = BackendClientDirectory::new(backend, "lvousr.client");
        assert_eq!(directory.lookup_skills(9).await.unwrap(), vec![150747, 150748]);
    }
}
