//! Loading engine configuration (leveling thresholds, generation limits,
//! topic catalogue) from TOML.
//!
//! See `EngineConfig` for the expected schema. Every section is optional;
//! missing values fall back to the defaults below.

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::domain::FamilyId;
use crate::families::DEFAULT_MAX_TRIES;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
  pub leveling: LevelingConfig,
  pub generation: GenerationConfig,
  pub storage: StorageConfig,
  pub topics: Vec<TopicConfig>,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      leveling: LevelingConfig::default(),
      generation: GenerationConfig::default(),
      storage: StorageConfig::default(),
      topics: default_topics(),
    }
  }
}

/// Thresholds for the leveling classifier and its rule-based fallback.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LevelingConfig {
  /// Attempts at the current level before any transition is considered.
  pub min_sample_size: u32,
  /// Training examples required before the classifier is trusted.
  pub min_training_size: usize,
  pub holdout_fraction: f64,
  pub max_tree_depth: usize,
  pub min_samples_split: usize,
  pub promote_streak: u32,
  pub demote_streak: u32,
}

impl Default for LevelingConfig {
  fn default() -> Self {
    Self {
      min_sample_size: 5,
      min_training_size: 10,
      holdout_fraction: 0.2,
      max_tree_depth: 6,
      min_samples_split: 2,
      promote_streak: 3,
      demote_streak: 3,
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
  /// Fixed RNG seed; unset means seeded from OS entropy.
  pub seed: Option<u64>,
  pub max_tries: usize,
  pub distractor_count: usize,
  /// Regenerations allowed when a new instance repeats the parameters of
  /// the previous one for the same student and topic.
  pub repeat_retries: usize,
}

impl Default for GenerationConfig {
  fn default() -> Self {
    Self { seed: None, max_tries: DEFAULT_MAX_TRIES, distractor_count: 3, repeat_retries: 3 }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
  /// Extra ledger write attempts after a compare-and-set conflict.
  pub write_retries: u32,
  /// Resolved instance ids remembered after their record is dropped, so a
  /// late resubmit is told the instance is resolved rather than unknown.
  pub resolved_window: usize,
}

impl Default for StorageConfig {
  fn default() -> Self {
    Self { write_retries: 3, resolved_window: 4096 }
  }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TopicConfig {
  pub id: String,
  pub family: FamilyId,
  #[serde(default = "default_max_attempts")]
  pub max_attempts: u32,
}

fn default_max_attempts() -> u32 {
  1
}

fn default_topics() -> Vec<TopicConfig> {
  [
    ("addition", FamilyId::CarriedAddition),
    ("subtraction", FamilyId::BorrowSubtraction),
    ("logic", FamilyId::TruthTable),
    ("triangles", FamilyId::TriangleCenters),
    ("fractions", FamilyId::FractionSimplification),
  ]
  .into_iter()
  .map(|(id, family)| TopicConfig { id: id.to_string(), family, max_attempts: default_max_attempts() })
  .collect()
}

impl EngineConfig {
  pub fn topic(&self, id: &str) -> Option<&TopicConfig> {
    self.topics.iter().find(|t| t.id == id)
  }
}

/// Parse a TOML document into `EngineConfig`.
pub fn parse(s: &str) -> Result<EngineConfig, toml::de::Error> {
  toml::from_str::<EngineConfig>(s)
}

/// Load `EngineConfig` from ENGINE_CONFIG_PATH, then apply ENGINE_SEED.
/// IO and parse errors are logged and the defaults are used.
pub fn load_engine_config_from_env() -> EngineConfig {
  let mut cfg = match std::env::var("ENGINE_CONFIG_PATH") {
    Ok(path) => match std::fs::read_to_string(&path) {
      Ok(s) => match parse(&s) {
        Ok(cfg) => {
          info!(target: "practice_backend", %path, topics = cfg.topics.len(), "Loaded engine config (TOML)");
          cfg
        }
        Err(e) => {
          error!(target: "practice_backend", %path, error = %e, "Failed to parse TOML config; using defaults");
          EngineConfig::default()
        }
      },
      Err(e) => {
        error!(target: "practice_backend", %path, error = %e, "Failed to read TOML config file; using defaults");
        EngineConfig::default()
      }
    },
    Err(_) => EngineConfig::default(),
  };

  if let Ok(raw) = std::env::var("ENGINE_SEED") {
    match raw.parse::<u64>() {
      Ok(seed) => cfg.generation.seed = Some(seed),
      Err(e) => warn!(target: "practice_backend", %raw, error = %e, "Ignoring invalid ENGINE_SEED"),
    }
  }
  cfg
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_document_gives_defaults() {
    let cfg = parse("").unwrap();
    assert_eq!(cfg.leveling.min_sample_size, 5);
    assert_eq!(cfg.leveling.min_training_size, 10);
    assert_eq!(cfg.generation.distractor_count, 3);
    assert_eq!(cfg.storage.resolved_window, 4096);
    assert_eq!(cfg.topics.len(), 5);
    assert!(cfg.topic("logic").is_some());
  }

  #[test]
  fn partial_sections_keep_other_defaults() {
    let cfg = parse(
      r#"
        [leveling]
        min_sample_size = 8

        [generation]
        seed = 42

        [[topics]]
        id = "sums"
        family = "carried_addition"
        max_attempts = 2
      "#,
    )
    .unwrap();
    assert_eq!(cfg.leveling.min_sample_size, 8);
    assert_eq!(cfg.leveling.promote_streak, 3);
    assert_eq!(cfg.generation.seed, Some(42));
    assert_eq!(cfg.generation.max_tries, DEFAULT_MAX_TRIES);
    assert_eq!(cfg.topics.len(), 1);
    let t = cfg.topic("sums").unwrap();
    assert_eq!(t.family, FamilyId::CarriedAddition);
    assert_eq!(t.max_attempts, 2);
  }

  #[test]
  fn unknown_family_is_a_parse_error() {
    assert!(parse("[[topics]]\nid = \"x\"\nfamily = \"calculus\"\n").is_err());
  }
}
