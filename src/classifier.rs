//! Leveling classifier: a small CART tree over the four ledger features,
//! retrained from scratch on every appended example, with a streak rule as
//! the fallback whenever no tree can be trained.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::config::LevelingConfig;
use crate::domain::Level;
use crate::locks::KeyedLocks;
use crate::random::{stable_hash, RandomSource};
use crate::storage::{Storage, StorageError};
use crate::training::{LedgerFeatures, Outcome, TrainingExample};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TrainingError {
  #[error("not enough training examples: have {have}, need {need}")]
  Insufficient { have: usize, need: usize },
  #[error("training split contains a single label")]
  Degenerate,
  #[error("training split is empty")]
  EmptySplit,
}

#[derive(Clone, Debug)]
enum Node {
  Leaf(Outcome),
  Split { feature: usize, threshold: f64, left: Box<Node>, right: Box<Node> },
}

/// Binary tree; `x[feature] <= threshold` goes left.
#[derive(Clone, Debug)]
pub struct DecisionTree {
  root: Node,
}

type Row = ([f64; LedgerFeatures::WIDTH], Outcome);

impl DecisionTree {
  pub fn fit(examples: &[TrainingExample], max_depth: usize, min_samples_split: usize) -> Self {
    let rows: Vec<Row> = examples.iter().map(|e| (e.features.as_vector(), e.outcome)).collect();
    let root = grow(&rows, 0, max_depth, min_samples_split.max(2));
    Self { root }
  }

  pub fn predict(&self, features: &LedgerFeatures) -> Outcome {
    let x = features.as_vector();
    let mut node = &self.root;
    loop {
      match node {
        Node::Leaf(outcome) => return *outcome,
        Node::Split { feature, threshold, left, right } => {
          node = if x[*feature] <= *threshold { left } else { right };
        }
      }
    }
  }

  pub fn depth(&self) -> usize {
    fn walk(node: &Node) -> usize {
      match node {
        Node::Leaf(_) => 0,
        Node::Split { left, right, .. } => 1 + walk(left).max(walk(right)),
      }
    }
    walk(&self.root)
  }
}

fn label_counts(rows: &[Row]) -> [usize; 3] {
  let mut counts = [0usize; 3];
  for (_, outcome) in rows {
    counts[outcome.index()] += 1;
  }
  counts
}

fn gini(counts: &[usize; 3]) -> f64 {
  let n: usize = counts.iter().sum();
  if n == 0 {
    return 0.0;
  }
  let n = n as f64;
  1.0 - counts.iter().map(|&c| (c as f64 / n).powi(2)).sum::<f64>()
}

/// Most frequent label. Ties go to hold, then promote, then demote.
fn majority(counts: &[usize; 3]) -> Outcome {
  [Outcome::Hold, Outcome::Promote, Outcome::Demote]
    .into_iter()
    .fold(None::<Outcome>, |best, o| match best {
      Some(b) if counts[b.index()] >= counts[o.index()] => Some(b),
      _ => Some(o),
    })
    .unwrap_or(Outcome::Hold)
}

struct SplitChoice {
  feature: usize,
  threshold: f64,
  impurity: f64,
}

fn best_split(rows: &[Row]) -> Option<SplitChoice> {
  let parent = gini(&label_counts(rows));
  let n = rows.len() as f64;
  let mut best: Option<SplitChoice> = None;

  for feature in 0..LedgerFeatures::WIDTH {
    let mut values: Vec<f64> = rows.iter().map(|(x, _)| x[feature]).collect();
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();

    for pair in values.windows(2) {
      let threshold = (pair[0] + pair[1]) / 2.0;
      let mut left = [0usize; 3];
      let mut right = [0usize; 3];
      for (x, outcome) in rows {
        if x[feature] <= threshold {
          left[outcome.index()] += 1;
        } else {
          right[outcome.index()] += 1;
        }
      }
      let nl: usize = left.iter().sum();
      let nr: usize = right.iter().sum();
      let impurity = (nl as f64 / n) * gini(&left) + (nr as f64 / n) * gini(&right);
      if best.as_ref().map_or(true, |b| impurity < b.impurity) {
        best = Some(SplitChoice { feature, threshold, impurity });
      }
    }
  }

  best.filter(|b| b.impurity + 1e-12 < parent)
}

fn grow(rows: &[Row], depth: usize, max_depth: usize, min_samples_split: usize) -> Node {
  let counts = label_counts(rows);
  let pure = counts.iter().filter(|&&c| c > 0).count() <= 1;
  if pure || depth >= max_depth || rows.len() < min_samples_split {
    return Node::Leaf(majority(&counts));
  }
  let Some(choice) = best_split(rows) else {
    return Node::Leaf(majority(&counts));
  };
  let (left, right): (Vec<Row>, Vec<Row>) = rows.iter().copied().partition(|(x, _)| x[choice.feature] <= choice.threshold);
  Node::Split {
    feature: choice.feature,
    threshold: choice.threshold,
    left: Box::new(grow(&left, depth + 1, max_depth, min_samples_split)),
    right: Box::new(grow(&right, depth + 1, max_depth, min_samples_split)),
  }
}

/// A trained tree plus the numbers reported about it.
#[derive(Clone, Debug)]
pub struct ClassifierSnapshot {
  tree: DecisionTree,
  pub training_size: usize,
  pub holdout_size: usize,
  /// None when the holdout split is empty.
  pub holdout_accuracy: Option<f64>,
}

impl ClassifierSnapshot {
  /// Shuffle deterministically (topic name and example count), split off the
  /// holdout, fit on the remainder.
  pub fn train(topic_id: &str, examples: &[TrainingExample], cfg: &LevelingConfig) -> Result<Self, TrainingError> {
    let n = examples.len();
    if n < cfg.min_training_size {
      return Err(TrainingError::Insufficient { have: n, need: cfg.min_training_size });
    }

    let mut shuffled = examples.to_vec();
    let mut rng = RandomSource::seeded(stable_hash(topic_id) ^ n as u64);
    shuffled.shuffle(&mut rng);

    let fraction = cfg.holdout_fraction.clamp(0.0, 1.0);
    let holdout_size = ((n as f64) * fraction).floor() as usize;
    let (holdout, train) = shuffled.split_at(holdout_size.min(n));

    if train.is_empty() {
      return Err(TrainingError::EmptySplit);
    }
    let first = train[0].outcome;
    if train.iter().all(|e| e.outcome == first) {
      return Err(TrainingError::Degenerate);
    }

    let tree = DecisionTree::fit(train, cfg.max_tree_depth, cfg.min_samples_split);
    let holdout_accuracy = if holdout.is_empty() {
      None
    } else {
      let hits = holdout.iter().filter(|e| tree.predict(&e.features) == e.outcome).count();
      Some(hits as f64 / holdout.len() as f64)
    };

    Ok(Self { tree, training_size: train.len(), holdout_size: holdout.len(), holdout_accuracy })
  }

  pub fn predict(&self, features: &LedgerFeatures) -> Outcome {
    self.tree.predict(features)
  }

  pub fn depth(&self) -> usize {
    self.tree.depth()
  }
}

/// Streak thresholds used while no trained tree is available.
pub fn rule_outcome(features: &LedgerFeatures, cfg: &LevelingConfig) -> Outcome {
  if features.correct_count >= cfg.promote_streak && features.level < Level::MAX {
    Outcome::Promote
  } else if features.incorrect_count >= cfg.demote_streak && features.level > Level::MIN {
    Outcome::Demote
  } else {
    Outcome::Hold
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecisionSource {
  Model,
  Rules,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Decision {
  pub outcome: Outcome,
  pub source: DecisionSource,
}

/// Per-topic snapshot cache over the training store.
///
/// A topic with no entry has not been built in this process yet. An entry of
/// `None` means the last build failed and the rules apply.
pub struct ClassifierService {
  storage: Arc<dyn Storage>,
  settings: LevelingConfig,
  snapshots: RwLock<HashMap<String, Option<Arc<ClassifierSnapshot>>>>,
  topic_locks: KeyedLocks<String>,
}

impl ClassifierService {
  pub fn new(storage: Arc<dyn Storage>, settings: LevelingConfig) -> Self {
    Self { storage, settings, snapshots: RwLock::new(HashMap::new()), topic_locks: KeyedLocks::new() }
  }

  pub fn settings(&self) -> &LevelingConfig {
    &self.settings
  }

  /// Decide an outcome for `features`. Never waits on a rebuild in progress.
  pub async fn decide(&self, topic_id: &str, features: &LedgerFeatures) -> Decision {
    match self.snapshot(topic_id).await {
      Some(snapshot) => {
        let outcome = snapshot.predict(features);
        debug!(target: "classifier", %topic_id, outcome = outcome.as_str(), "Model decision");
        Decision { outcome, source: DecisionSource::Model }
      }
      None => {
        let outcome = rule_outcome(features, &self.settings);
        debug!(target: "classifier", %topic_id, outcome = outcome.as_str(), "Rule decision");
        Decision { outcome, source: DecisionSource::Rules }
      }
    }
  }

  /// Current snapshot for the topic, building it from storage on first use.
  pub async fn snapshot(&self, topic_id: &str) -> Option<Arc<ClassifierSnapshot>> {
    let cached = self.snapshots.read().get(topic_id).cloned();
    if let Some(entry) = cached {
      return entry;
    }
    let examples = match self.storage.list_examples(topic_id).await {
      Ok(examples) => examples,
      Err(e) => {
        warn!(target: "classifier", %topic_id, error = %e, "Could not load training examples");
        return None;
      }
    };
    let built = self.train_logged(topic_id, &examples);
    // A concurrent rebuild under the topic lock wins over this lazy build.
    self.snapshots.write().entry(topic_id.to_string()).or_insert(built).clone()
  }

  /// Append one example and retrain the topic from the full example set.
  #[instrument(level = "debug", skip(self, example), fields(outcome = example.outcome.as_str()))]
  pub async fn record(&self, topic_id: &str, example: TrainingExample) -> Result<(), StorageError> {
    let _guard = self.topic_locks.lock(topic_id.to_string()).await;
    self.storage.append_example(topic_id, example).await?;
    match self.storage.list_examples(topic_id).await {
      Ok(examples) => {
        let built = self.train_logged(topic_id, &examples);
        self.snapshots.write().insert(topic_id.to_string(), built);
      }
      Err(e) => {
        warn!(target: "classifier", %topic_id, error = %e, "Retrain skipped; keeping previous snapshot");
      }
    }
    Ok(())
  }

  fn train_logged(&self, topic_id: &str, examples: &[TrainingExample]) -> Option<Arc<ClassifierSnapshot>> {
    match ClassifierSnapshot::train(topic_id, examples, &self.settings) {
      Ok(snapshot) => {
        info!(
          target: "classifier",
          %topic_id,
          training_size = snapshot.training_size,
          holdout_size = snapshot.holdout_size,
          accuracy = ?snapshot.holdout_accuracy,
          depth = snapshot.depth(),
          "Classifier rebuilt"
        );
        Some(Arc::new(snapshot))
      }
      Err(e @ TrainingError::Insufficient { .. }) => {
        debug!(target: "classifier", %topic_id, error = %e, "Classifier not trained; using rules");
        None
      }
      Err(e) => {
        warn!(target: "classifier", %topic_id, error = %e, "Classifier training failed; using rules");
        None
      }
    }
  }

  pub async fn accuracy(&self, topic_id: &str) -> Option<f64> {
    self.snapshot(topic_id).await.and_then(|s| s.holdout_accuracy)
  }

  pub async fn example_count(&self, topic_id: &str) -> Result<usize, StorageError> {
    Ok(self.storage.list_examples(topic_id).await?.len())
  }
}
