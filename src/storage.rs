//! Storage port for ledgers and training examples, plus an in-memory adapter.
//!
//! Ledger writes are compare-and-set on `PerformanceLedger::version`: the
//! caller passes the version it read and gets `Conflict` if someone else
//! wrote in between.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::ledger::PerformanceLedger;
use crate::training::TrainingExample;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
  #[error("ledger for {student_id}/{topic_id} was modified concurrently")]
  Conflict { student_id: String, topic_id: String },
  #[error("storage backend error: {0}")]
  Backend(String),
}

#[async_trait]
pub trait Storage: Send + Sync {
  async fn get_ledger(&self, student_id: &str, topic_id: &str) -> Result<Option<PerformanceLedger>, StorageError>;

  /// Write `ledger` if the stored version still equals `expected_version`
  /// (0 for a ledger that does not exist yet). Returns the new version.
  async fn put_ledger(
    &self,
    student_id: &str,
    topic_id: &str,
    ledger: &PerformanceLedger,
    expected_version: u64,
  ) -> Result<u64, StorageError>;

  async fn append_example(&self, topic_id: &str, example: TrainingExample) -> Result<(), StorageError>;

  async fn list_examples(&self, topic_id: &str) -> Result<Vec<TrainingExample>, StorageError>;
}

type LedgerKey = (String, String);

#[derive(Clone, Default)]
pub struct InMemoryStorage {
  ledgers: Arc<RwLock<HashMap<LedgerKey, PerformanceLedger>>>,
  examples: Arc<RwLock<HashMap<String, Vec<TrainingExample>>>>,
}

impl InMemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl Storage for InMemoryStorage {
  async fn get_ledger(&self, student_id: &str, topic_id: &str) -> Result<Option<PerformanceLedger>, StorageError> {
    let ledgers = self.ledgers.read().await;
    Ok(ledgers.get(&(student_id.to_string(), topic_id.to_string())).cloned())
  }

  #[instrument(level = "debug", skip(self, ledger), fields(level = %ledger.level))]
  async fn put_ledger(
    &self,
    student_id: &str,
    topic_id: &str,
    ledger: &PerformanceLedger,
    expected_version: u64,
  ) -> Result<u64, StorageError> {
    let mut ledgers = self.ledgers.write().await;
    let key = (student_id.to_string(), topic_id.to_string());
    let current = ledgers.get(&key).map(|l| l.version).unwrap_or(0);
    if current != expected_version {
      debug!(target: "practice_backend", %student_id, %topic_id, current, expected_version, "Ledger version mismatch");
      return Err(StorageError::Conflict { student_id: key.0, topic_id: key.1 });
    }
    let mut stored = ledger.clone();
    stored.version = expected_version + 1;
    ledgers.insert(key, stored);
    Ok(expected_version + 1)
  }

  async fn append_example(&self, topic_id: &str, example: TrainingExample) -> Result<(), StorageError> {
    self.examples.write().await.entry(topic_id.to_string()).or_default().push(example);
    Ok(())
  }

  async fn list_examples(&self, topic_id: &str) -> Result<Vec<TrainingExample>, StorageError> {
    Ok(self.examples.read().await.get(topic_id).cloned().unwrap_or_default())
  }
}
