use crate::errors::StoreError;
use crate::models::ScopeKey;
use serde_json::Value;
use std::collections::BTreeMap;
use std::{env, path::PathBuf};
use tokio::fs;
use tracing::{debug, error};

/// Which list of records a key holds within a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Completion,
    Planner,
    Mission,
}

impl RecordKind {
    pub fn prefix(self) -> &'static str {
        match self {
            RecordKind::Completion => "habit-tracker",
            RecordKind::Planner => "planner",
            RecordKind::Mission => "mission-statement",
        }
    }
}

pub fn record_key(scope: &ScopeKey, kind: RecordKind) -> String {
    format!("{}-{}", kind.prefix(), scope)
}

/// Persistent lists of JSON records, partitioned by scope and kind.
pub trait RecordStore {
    /// The stored list, or an empty one when nothing was ever written.
    fn read(&self, scope: &ScopeKey, kind: RecordKind) -> Result<Vec<Value>, StoreError>;

    /// Whether the list was ever written, even if it is now empty.
    fn contains(&self, scope: &ScopeKey, kind: RecordKind) -> bool;

    /// Replaces the whole list. On failure the previous list stays readable.
    fn write(
        &mut self,
        scope: &ScopeKey,
        kind: RecordKind,
        records: Vec<Value>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    lists: BTreeMap<String, Vec<Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn read(&self, scope: &ScopeKey, kind: RecordKind) -> Result<Vec<Value>, StoreError> {
        Ok(self.lists.get(&record_key(scope, kind)).cloned().unwrap_or_default())
    }

    fn contains(&self, scope: &ScopeKey, kind: RecordKind) -> bool {
        self.lists.contains_key(&record_key(scope, kind))
    }

    async fn write(&mut self, scope: &ScopeKey, kind: RecordKind, records: Vec<Value>) -> Result<(), StoreError> {
        self.lists.insert(record_key(scope, kind), records);
        Ok(())
    }
}

/// All lists in one JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lists: BTreeMap<String, Vec<Value>>,
}

impl JsonFileStore {
    pub async fn load(path: PathBuf) -> Self {
        let lists = match fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(lists) => lists,
                Err(err) => {
                    error!("failed to parse data file: {err}");
                    BTreeMap::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                error!("failed to read data file: {err}");
                BTreeMap::new()
            }
        };
        Self { path, lists }
    }
}

impl RecordStore for JsonFileStore {
    fn read(&self, scope: &ScopeKey, kind: RecordKind) -> Result<Vec<Value>, StoreError> {
        Ok(self.lists.get(&record_key(scope, kind)).cloned().unwrap_or_default())
    }

    fn contains(&self, scope: &ScopeKey, kind: RecordKind) -> bool {
        self.lists.contains_key(&record_key(scope, kind))
    }

    async fn write(&mut self, scope: &ScopeKey, kind: RecordKind, records: Vec<Value>) -> Result<(), StoreError> {
        let key = record_key(scope, kind);
        let mut next = self.lists.clone();
        next.insert(key.clone(), records);

        let payload = serde_json::to_vec_pretty(&next)?;
        fs::write(&self.path, payload).await?;
        debug!(key = %key, path = %self.path.display(), "persisted records");

        self.lists = next;
        Ok(())
    }
}

pub fn resolve_data_path() -> PathBuf {
    if let Ok(path) = env::var("APP_DATA_PATH") {
        return PathBuf::from(path);
    }

    PathBuf::from("data/state.json")
}
