//! Shared application state handed to every HTTP and WebSocket handler.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::{load_engine_config_from_env, EngineConfig};
use crate::engine::PracticeEngine;
use crate::storage::{InMemoryStorage, Storage};

pub struct AppState {
  pub engine: PracticeEngine,
}

impl AppState {
  /// Build state from env: load config, wire in-memory storage and the engine.
  #[instrument(level = "info", skip_all)]
  pub fn new() -> Self {
    Self::with_config(load_engine_config_from_env())
  }

  pub fn with_config(config: EngineConfig) -> Self {
    Self::with_storage(config, Arc::new(InMemoryStorage::new()))
  }

  pub fn with_storage(config: EngineConfig, storage: Arc<dyn Storage>) -> Self {
    for topic in &config.topics {
      info!(target: "practice_backend", topic = %topic.id, family = topic.family.as_str(), max_attempts = topic.max_attempts, "Topic configured");
    }
    match config.generation.seed {
      Some(seed) => info!(target: "practice_backend", seed, "Deterministic generation enabled"),
      None => info!(target: "practice_backend", "Generation seeded from OS entropy"),
    }
    Self { engine: PracticeEngine::new(config, storage) }
  }
}

impl Default for AppState {
  fn default() -> Self {
    Self::new()
  }
}
