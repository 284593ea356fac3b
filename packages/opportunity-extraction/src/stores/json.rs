//! File-backed record store in TinyDB's JSON layout.
//!
//! ```json
//! {"_default": {"1": {...}, "2": {...}}}
//! ```
//!
//! Document ids are decimal strings starting at 1. Other tables in the file
//! are preserved untouched. Each write replaces the file atomically via a
//! sibling temp file and `rename`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::{InsertOutcome, RecordStore};
use crate::types::Opportunity;

/// TinyDB's default table name.
pub const DEFAULT_TABLE: &str = "_default";

/// Opportunity records in a single JSON file.
///
/// Calls on one instance are serialized, so check-then-insert cannot
/// interleave within a process. Separate processes sharing a file can still
/// race.
pub struct JsonRecordStore {
    path: PathBuf,
    table: String,
    lock: Mutex<()>,
}

impl JsonRecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            table: DEFAULT_TABLE.to_string(),
            lock: Mutex::new(()),
        }
    }

    /// Use a table other than `_default`.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whole document; a missing or blank file is empty.
    async fn load(&self) -> StoreResult<Map<String, Value>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Object(doc)) => Ok(doc),
            Ok(_) => Err(self.corrupt("top level is not an object")),
            Err(e) => Err(self.corrupt(e.to_string())),
        }
    }

    /// The configured table, which must be an object if present.
    fn table<'a>(&self, doc: &'a Map<String, Value>) -> StoreResult<Option<&'a Map<String, Value>>> {
        match doc.get(&self.table) {
            None => Ok(None),
            Some(Value::Object(table)) => Ok(Some(table)),
            Some(_) => Err(self.corrupt(format!("table `{}` is not an object", self.table))),
        }
    }

    async fn save(&self, doc: &Map<String, Value>) -> StoreResult<()> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
        }

        let bytes = serde_json::to_vec_pretty(doc)?;
        let tmp = self.temp_path();
        tokio::fs::write(&tmp, &bytes).await.map_err(io_err)?;
        if let Err(source) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(source));
        }

        debug!(path = %self.path.display(), bytes = bytes.len(), "record store written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "records.json".to_string());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", std::process::id()))
    }

    fn corrupt(&self, reason: impl Into<String>) -> StoreError {
        StoreError::Corrupt {
            path: self.path.clone(),
            reason: reason.into(),
        }
    }
}

fn url_of(record: &Value) -> Option<&str> {
    record.get("url").and_then(Value::as_str)
}

fn next_id(table: Option<&Map<String, Value>>) -> u64 {
    table
        .into_iter()
        .flat_map(|t| t.keys())
        .filter_map(|k| k.parse::<u64>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

#[async_trait]
impl RecordStore for JsonRecordStore {
    async fn get_by_url(&self, url: &str) -> StoreResult<Option<Opportunity>> {
        let _guard = self.lock.lock().await;
        let doc = self.load().await?;
        let Some(table) = self.table(&doc)? else {
            return Ok(None);
        };

        match table.values().find(|r| url_of(r) == Some(url)) {
            Some(record) => serde_json::from_value(record.clone())
                .map(Some)
                .map_err(|e| self.corrupt(format!("record for {url}: {e}"))),
            None => Ok(None),
        }
    }

    async fn insert_if_absent(&self, record: &Opportunity) -> StoreResult<InsertOutcome> {
        let _guard = self.lock.lock().await;
        let mut doc = self.load().await?;
        let table = self.table(&doc)?;

        if table.is_some_and(|t| t.values().any(|r| url_of(r) == Some(record.url.as_str()))) {
            info!(
                url = %record.url,
                path = %self.path.display(),
                "URL {} already exists in {}. Skipping.",
                record.url,
                self.path.display()
            );
            return Ok(InsertOutcome::AlreadyExists);
        }

        let id = next_id(table);
        let value = serde_json::to_value(record)?;
        let entry = doc
            .entry(self.table.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(table) = entry {
            table.insert(id.to_string(), value);
        }

        self.save(&doc).await?;
        info!(url = %record.url, id, path = %self.path.display(), "record inserted");
        Ok(InsertOutcome::Inserted(id))
    }

    async fn all(&self) -> StoreResult<Vec<Opportunity>> {
        let _guard = self.lock.lock().await;
        let doc = self.load().await?;
        let Some(table) = self.table(&doc)? else {
            return Ok(Vec::new());
        };

        let mut entries: Vec<(u64, &Value)> = table
            .iter()
            .filter_map(|(k, v)| k.parse::<u64>().ok().map(|id| (id, v)))
            .collect();
        entries.sort_by_key(|(id, _)| *id);

        let mut records = Vec::with_capacity(entries.len());
        for (id, value) in entries {
            match serde_json::from_value::<Opportunity>(value.clone()) {
                Ok(record) => records.push(record),
                Err(e) => warn!(id, error = %e, "skipping record that does not match the schema"),
            }
        }
        Ok(records)
    }

    async fn count(&self) -> StoreResult<usize> {
        let _guard = self.lock.lock().await;
        let doc = self.load().await?;
        Ok(self.table(&doc)?.map_or(0, Map::len))
    }
}
