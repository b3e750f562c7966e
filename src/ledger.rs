//! Per (student, topic) performance counters and the level state machine.

use serde::{Deserialize, Serialize};

use crate::domain::Level;
use crate::training::{LedgerFeatures, Outcome};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceLedger {
  pub level: Level,
  pub consecutive_correct: u32,
  pub consecutive_incorrect: u32,
  pub total_attempts_at_level: u32,
  /// Bumped by storage on every successful write; used for compare-and-set.
  #[serde(default)]
  pub version: u64,
}

impl PerformanceLedger {
  /// Count one graded attempt.
  pub fn record(&mut self, is_correct: bool) {
    self.total_attempts_at_level += 1;
    if is_correct {
      self.consecutive_correct += 1;
      self.consecutive_incorrect = 0;
    } else {
      self.consecutive_incorrect += 1;
      self.consecutive_correct = 0;
    }
  }

  pub fn features(&self) -> LedgerFeatures {
    LedgerFeatures {
      level: self.level,
      correct_count: self.consecutive_correct,
      incorrect_count: self.consecutive_incorrect,
      total_responses: self.total_attempts_at_level,
    }
  }

  fn reset_counters(&mut self) {
    self.consecutive_correct = 0;
    self.consecutive_incorrect = 0;
    self.total_attempts_at_level = 0;
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
  pub from: Level,
  pub to: Level,
  /// Label before clamping; this is what gets recorded for training.
  pub intended: Outcome,
}

impl Transition {
  pub fn changed(&self) -> bool {
    self.from != self.to
  }
}

/// Applies outcomes to a ledger, clamped to `Level::MIN..=Level::MAX`.
pub struct LevelStateMachine;

impl LevelStateMachine {
  pub fn apply(ledger: &mut PerformanceLedger, outcome: Outcome) -> Transition {
    let from = ledger.level;
    let to = match outcome {
      Outcome::Promote => from.promoted(),
      Outcome::Demote => from.demoted(),
      Outcome::Hold => from,
    };
    if to != from {
      ledger.level = to;
      ledger.reset_counters();
    }
    Transition { from, to, intended: outcome }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn ledger(level: u8, cc: u32, ci: u32, total: u32) -> PerformanceLedger {
    PerformanceLedger {
      level: Level::new(level),
      consecutive_correct: cc,
      consecutive_incorrect: ci,
      total_attempts_at_level: total,
      version: 0,
    }
  }

  #[test]
  fn record_tracks_streaks() {
    let mut l = PerformanceLedger::default();
    l.record(true);
    l.record(true);
    assert_eq!((l.consecutive_correct, l.consecutive_incorrect, l.total_attempts_at_level), (2, 0, 2));
    l.record(false);
    assert_eq!((l.consecutive_correct, l.consecutive_incorrect, l.total_attempts_at_level), (0, 1, 3));
  }

  #[test]
  fn promote_resets_counters() {
    let mut l = ledger(1, 3, 0, 5);
    let t = LevelStateMachine::apply(&mut l, Outcome::Promote);
    assert!(t.changed());
    assert_eq!(l, ledger(2, 0, 0, 0));
  }

  #[test]
  fn clamped_promote_keeps_counters_and_label() {
    let mut l = ledger(3, 4, 0, 9);
    let t = LevelStateMachine::apply(&mut l, Outcome::Promote);
    assert!(!t.changed());
    assert_eq!(t.intended, Outcome::Promote);
    assert_eq!(l, ledger(3, 4, 0, 9));
  }

  #[test]
  fn clamped_demote_at_floor() {
    let mut l = ledger(1, 0, 5, 7);
    let t = LevelStateMachine::apply(&mut l, Outcome::Demote);
    assert_eq!(t.to, Level::MIN);
    assert_eq!(t.intended, Outcome::Demote);
  }

  #[test]
  fn hold_changes_nothing() {
    let mut l = ledger(2, 1, 0, 6);
    LevelStateMachine::apply(&mut l, Outcome::Hold);
    assert_eq!(l, ledger(2, 1, 0, 6));
  }
}
