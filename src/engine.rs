//! The practice engine: instance creation, grading and leveling.
//!
//! Per submission the ledger read, classifier decision, ledger write and
//! training append run under the (student, topic) lock. The classifier takes
//! the topic lock on its own, after ours.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::attempt::{AttemptState, SubmissionError};
use crate::classifier::ClassifierService;
use crate::config::{EngineConfig, TopicConfig};
use crate::domain::{Instance, Level, Params, Solution, Trace};
use crate::error::EngineError;
use crate::families;
use crate::ledger::{LevelStateMachine, PerformanceLedger};
use crate::locks::KeyedLocks;
use crate::options::{self, AnswerOption};
use crate::random::RandomSource;
use crate::storage::{Storage, StorageError};
use crate::training::TrainingExample;
use crate::util::normalize;

type LedgerKey = (String, String);

struct InstanceRecord {
  instance: Instance,
  solution: Solution,
  options: Vec<AnswerOption>,
  attempt: AttemptState,
  student_id: String,
  topic_id: String,
}

/// Ids of recently resolved instances, oldest evicted first.
struct ResolvedWindow {
  order: VecDeque<Uuid>,
  ids: HashSet<Uuid>,
  capacity: usize,
}

impl ResolvedWindow {
  fn new(capacity: usize) -> Self {
    Self { order: VecDeque::new(), ids: HashSet::new(), capacity }
  }

  fn insert(&mut self, id: Uuid) {
    if self.capacity == 0 || !self.ids.insert(id) {
      return;
    }
    self.order.push_back(id);
    if self.order.len() > self.capacity {
      if let Some(evicted) = self.order.pop_front() {
        self.ids.remove(&evicted);
      }
    }
  }

  fn contains(&self, id: &Uuid) -> bool {
    self.ids.contains(id)
  }
}

/// A freshly generated instance with its shuffled options.
#[derive(Clone, Debug)]
pub struct StartedInstance {
  pub instance: Instance,
  pub options: Vec<AnswerOption>,
}

#[derive(Clone, Debug)]
pub struct SubmitResult {
  pub is_correct: bool,
  pub attempts_remaining: u32,
  pub new_level: Level,
  /// Present when the answer was wrong or the instance is resolved.
  pub trace: Option<Trace>,
}

pub struct PracticeEngine {
  config: EngineConfig,
  storage: Arc<dyn Storage>,
  classifier: Arc<ClassifierService>,
  /// Unresolved instances only; a record is dropped once it resolves.
  instances: RwLock<HashMap<Uuid, InstanceRecord>>,
  resolved: Mutex<ResolvedWindow>,
  /// Parameters of the last instance served per (student, topic).
  last_params: Mutex<HashMap<LedgerKey, Params>>,
  ledger_locks: KeyedLocks<LedgerKey>,
  rng: Mutex<RandomSource>,
}

impl PracticeEngine {
  pub fn new(config: EngineConfig, storage: Arc<dyn Storage>) -> Self {
    let classifier = Arc::new(ClassifierService::new(storage.clone(), config.leveling.clone()));
    Self::with_classifier(config, storage, classifier)
  }

  pub fn with_classifier(config: EngineConfig, storage: Arc<dyn Storage>, classifier: Arc<ClassifierService>) -> Self {
    let rng = match config.generation.seed {
      Some(seed) => RandomSource::seeded(seed),
      None => RandomSource::from_entropy(),
    };
    let resolved = Mutex::new(ResolvedWindow::new(config.storage.resolved_window));
    Self {
      config,
      storage,
      classifier,
      instances: RwLock::new(HashMap::new()),
      resolved,
      last_params: Mutex::new(HashMap::new()),
      ledger_locks: KeyedLocks::new(),
      rng: Mutex::new(rng),
    }
  }

  pub fn config(&self) -> &EngineConfig {
    &self.config
  }

  pub fn classifier(&self) -> &Arc<ClassifierService> {
    &self.classifier
  }

  fn topic(&self, topic_id: &str) -> Result<&TopicConfig, EngineError> {
    self.config.topic(topic_id).ok_or_else(|| EngineError::UnknownTopic(topic_id.to_string()))
  }

  /// Generate an instance at the student's current level for the topic.
  /// Reading the level never creates a ledger.
  #[instrument(level = "info", skip(self), fields(%topic_id, %student_id))]
  pub async fn start_instance(&self, topic_id: &str, student_id: &str) -> Result<StartedInstance, EngineError> {
    let topic = self.topic(topic_id)?;
    let level = self.storage.get_ledger(student_id, topic_id).await?.map(|l| l.level).unwrap_or_default();
    let generation = &self.config.generation;
    let mut rng = self.rng.lock().fork();

    let key = (student_id.to_string(), topic_id.to_string());
    let previous = self.last_params.lock().get(&key).cloned();
    let mut instance = families::generate(topic.family, &mut rng, level, generation.max_tries);
    for retry in 0..generation.repeat_retries {
      if previous.as_ref() != Some(&instance.params) {
        break;
      }
      debug!(target: "generation", %topic_id, retry, "Same parameters as the previous instance; regenerating");
      instance = families::generate(topic.family, &mut rng, level, generation.max_tries);
    }
    self.last_params.lock().insert(key, instance.params.clone());

    let solution = families::solve(&instance.params);
    let distractors = families::distractors(&instance.params, &solution.answer, &mut rng, generation.distractor_count);
    let options = options::build(&solution.answer, &distractors, generation.distractor_count, &mut rng)?;

    info!(
      target: "generation",
      id = %instance.id,
      family = instance.family.as_str(),
      level = %instance.level,
      source = ?instance.source,
      signature = %families::signature(&instance.params),
      "Instance served"
    );

    let record = InstanceRecord {
      instance: instance.clone(),
      solution,
      options: options.clone(),
      attempt: AttemptState::new(topic.max_attempts),
      student_id: student_id.to_string(),
      topic_id: topic_id.to_string(),
    };
    self.instances.write().await.insert(instance.id, record);

    Ok(StartedInstance { instance, options })
  }

  /// Grade one submission and, once enough attempts exist at the level,
  /// let the classifier move the student.
  #[instrument(level = "info", skip(self, selected_value), fields(%instance_id))]
  pub async fn submit(&self, instance_id: Uuid, selected_value: &str, elapsed_seconds: f64) -> Result<SubmitResult, EngineError> {
    if !elapsed_seconds.is_finite() || elapsed_seconds < 0.0 {
      return Err(SubmissionError::Malformed(format!("elapsed seconds must be finite and non-negative, got {elapsed_seconds}")).into());
    }
    let selected = normalize(selected_value);
    if selected.is_empty() {
      return Err(SubmissionError::Malformed("empty selection".into()).into());
    }

    let (outcome, trace, level, student_id, topic_id) = {
      let mut instances = self.instances.write().await;
      let Some(record) = instances.get_mut(&instance_id) else {
        if self.resolved.lock().contains(&instance_id) {
          return Err(SubmissionError::AlreadyResolved.into());
        }
        return Err(SubmissionError::UnknownInstance(instance_id).into());
      };
      let chosen = record
        .options
        .iter()
        .find(|o| normalize(&o.value) == selected)
        .map(|o| o.value.clone())
        .ok_or_else(|| SubmissionError::Malformed("value is not one of the options".into()))?;
      let outcome = record.attempt.submit(&chosen, &record.solution.answer)?;
      let trace = (!outcome.is_correct || outcome.resolved).then(|| record.solution.trace.clone());
      let graded = (outcome, trace, record.instance.level, record.student_id.clone(), record.topic_id.clone());
      if outcome.resolved {
        instances.remove(&instance_id);
        self.resolved.lock().insert(instance_id);
      }
      graded
    };

    info!(
      target: "practice_backend",
      %instance_id,
      correct = outcome.is_correct,
      remaining = outcome.attempts_remaining,
      elapsed_seconds,
      "Submission graded"
    );

    // The attempt is already consumed, so a failed ledger update must not lose the grade.
    let new_level = match self.record_outcome(&student_id, &topic_id, outcome.is_correct).await {
      Ok(level) => level,
      Err(e) => {
        warn!(target: "leveling", %instance_id, %student_id, %topic_id, error = %e, "Ledger update failed; leveling skipped");
        level
      }
    };

    Ok(SubmitResult { is_correct: outcome.is_correct, attempts_remaining: outcome.attempts_remaining, new_level, trace })
  }

  /// Ledger update for one graded attempt. Returns the level after it.
  async fn record_outcome(&self, student_id: &str, topic_id: &str, is_correct: bool) -> Result<Level, StorageError> {
    let _guard = self.ledger_locks.lock((student_id.to_string(), topic_id.to_string())).await;
    let settings = &self.config.leveling;
    let mut conflicts = 0;

    // Each retry re-reads the ledger, so the decision is recomputed from fresh counters.
    loop {
      let current = self.storage.get_ledger(student_id, topic_id).await?.unwrap_or_default();
      let mut ledger = current.clone();
      ledger.record(is_correct);

      let decided = if ledger.total_attempts_at_level >= settings.min_sample_size {
        let features = ledger.features();
        let decision = self.classifier.decide(topic_id, &features).await;
        let transition = LevelStateMachine::apply(&mut ledger, decision.outcome);
        Some((features, decision, transition))
      } else {
        None
      };

      match self.storage.put_ledger(student_id, topic_id, &ledger, current.version).await {
        Ok(_) => {
          if let Some((features, decision, transition)) = decided {
            info!(
              target: "leveling",
              %student_id,
              %topic_id,
              from = %transition.from,
              to = %transition.to,
              intended = transition.intended.as_str(),
              source = ?decision.source,
              "Leveling decision"
            );
            let example = TrainingExample { features, outcome: transition.intended };
            if let Err(e) = self.classifier.record(topic_id, example).await {
              warn!(target: "leveling", %topic_id, error = %e, "Could not append training example");
            }
          }
          return Ok(ledger.level);
        }
        Err(StorageError::Conflict { .. }) if conflicts < self.config.storage.write_retries => {
          conflicts += 1;
          debug!(target: "leveling", %student_id, %topic_id, conflicts, "Ledger write conflict; retrying");
        }
        Err(StorageError::Conflict { .. }) => {
          warn!(target: "leveling", %student_id, %topic_id, conflicts, "Ledger write kept conflicting; leveling skipped");
          return Ok(current.level);
        }
        Err(e) => return Err(e),
      }
    }
  }

  pub async fn classifier_accuracy(&self, topic_id: &str) -> Result<Option<f64>, EngineError> {
    self.topic(topic_id)?;
    Ok(self.classifier.accuracy(topic_id).await)
  }

  pub async fn example_count(&self, topic_id: &str) -> Result<usize, EngineError> {
    self.topic(topic_id)?;
    Ok(self.classifier.example_count(topic_id).await?)
  }

  /// Diagnostic view; a student with no attempts gets a fresh ledger.
  pub async fn ledger(&self, student_id: &str, topic_id: &str) -> Result<PerformanceLedger, EngineError> {
    self.topic(topic_id)?;
    Ok(self.storage.get_ledger(student_id, topic_id).await?.unwrap_or_default())
  }
}
