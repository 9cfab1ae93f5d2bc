//! In-memory backend and directory that record what the gateway sends.

use async_trait::async_trait;
use core_types::{BuiltQuery, DatabaseType, GeneratedKey, Row};
use database::{Backend, ClientDirectory, ClientLinks, DbError};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

pub(crate) struct FakeBackend {
    database_type: DatabaseType,
    reads: Mutex<VecDeque<Vec<Row>>>,
    statements: Mutex<Vec<BuiltQuery>>,
    timeouts: Mutex<Vec<Option<Duration>>>,
    key: i64,
    affected: u64,
    fail_execute: bool,
}

impl FakeBackend {
    fn new(database_type: DatabaseType) -> Self {
        Self {
            database_type,
            reads: Mutex::new(VecDeque::new()),
            statements: Mutex::new(Vec::new()),
            timeouts: Mutex::new(Vec::new()),
            key: 1,
            affected: 0,
            fail_execute: false,
        }
    }

    pub(crate) fn oracle() -> Self {
        Self::new(DatabaseType::Oracle)
    }

    pub(crate) fn postgres() -> Self {
        Self::new(DatabaseType::Postgres)
    }

    /// Row sets handed out by successive reads; reads past the end get no rows.
    pub(crate) fn with_reads(self, reads: Vec<Vec<JsonValue>>) -> Self {
        let reads = reads
            .into_iter()
            .map(|rows| rows.into_iter().filter_map(|r| r.as_object().cloned()).collect())
            .collect();
        Self {
            reads: Mutex::new(reads),
            ..self
        }
    }

    pub(crate) fn with_key(self, key: i64) -> Self {
        Self { key, ..self }
    }

    pub(crate) fn with_affected(self, affected: u64) -> Self {
        Self { affected, ..self }
    }

    pub(crate) fn failing_execute(self) -> Self {
        Self {
            fail_execute: true,
            ..self
        }
    }

    pub(crate) fn statements(&self) -> Vec<BuiltQuery> {
        self.statements.lock().unwrap().clone()
    }

    pub(crate) fn timeouts(&self) -> Vec<Option<Duration>> {
        self.timeouts.lock().unwrap().clone()
    }

    fn record(&self, query: &BuiltQuery) {
        self.statements.lock().unwrap().push(query.clone());
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn database_type(&self) -> DatabaseType {
        self.database_type
    }

    async fn fetch_all(&self, query: &BuiltQuery, timeout: Option<Duration>) -> Result<Vec<Row>, DbError> {
        self.record(query);
        self.timeouts.lock().unwrap().push(timeout);
        Ok(self.reads.lock().unwrap().pop_front().unwrap_or_default())
    }

    async fn execute(&self, query: &BuiltQuery) -> Result<u64, DbError> {
        self.record(query);
        if self.fail_execute {
            return Err(DbError::ConnectionConfigError("connection lost".into()));
        }
        Ok(self.affected)
    }

    async fn insert_returning_key(&self, query: &BuiltQuery, _: &GeneratedKey) -> Result<i64, DbError> {
        self.record(query);
        Ok(self.key)
    }
}

#[derive(Default)]
pub(crate) struct FakeDirectory {
    links: HashMap<i64, ClientLinks>,
    skills: HashMap<i64, Vec<i64>>,
    skill_lookups: AtomicUsize,
}

impl FakeDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_client(mut self, client_id: i64, dialing_db: &str, reporting_db: Option<&str>) -> Self {
        self.links.insert(
            client_id,
            ClientLinks {
                dialing_db: dialing_db.to_string(),
                reporting_db: reporting_db.map(str::to_string),
            },
        );
        self
    }

    pub(crate) fn with_skills(mut self, client_id: i64, skills: Vec<i64>) -> Self {
        self.skills.insert(client_id, skills);
        self
    }

    pub(crate) fn skill_lookups(&self) -> usize {
        self.skill_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ClientDirectory for FakeDirectory {
    async fn lookup_client_links(&self, client_id: i64) -> Result<Option<ClientLinks>, DbError> {
        Ok(self.links.get(&client_id).cloned())
    }

    async fn lookup_skills(&self, client_id: i64) -> Result<Vec<i64>, DbError> {
        self.skill_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self.skills.get(&client_id).cloned().unwrap_or_default())
    }
}
