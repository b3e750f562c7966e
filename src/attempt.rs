//! Per-instance attempt state machine: `idle → answered → revealed`.
//!
//! `revealed` is terminal. With `max_attempts == 1` a single submission goes
//! straight from `idle` to `revealed`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
  Idle,
  Answered,
  Revealed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SubmissionError {
  #[error("unknown instance {0}")]
  UnknownInstance(Uuid),
  #[error("instance already resolved")]
  AlreadyResolved,
  #[error("malformed submission: {0}")]
  Malformed(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttemptOutcome {
  pub is_correct: bool,
  pub attempts_remaining: u32,
  /// True once the instance reached `revealed`.
  pub resolved: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptState {
  pub attempts_used: u32,
  pub max_attempts: u32,
  pub status: AttemptStatus,
}

impl AttemptState {
  pub fn new(max_attempts: u32) -> Self {
    Self { attempts_used: 0, max_attempts: max_attempts.max(1), status: AttemptStatus::Idle }
  }

  pub fn attempts_remaining(&self) -> u32 {
    self.max_attempts.saturating_sub(self.attempts_used)
  }

  /// Score one submission against the canonical answer.
  pub fn submit(&mut self, selected: &str, answer: &str) -> Result<AttemptOutcome, SubmissionError> {
    if self.status == AttemptStatus::Revealed {
      return Err(SubmissionError::AlreadyResolved);
    }

    self.attempts_used += 1;
    let is_correct = selected == answer;
    self.status = if is_correct || self.attempts_used >= self.max_attempts {
      AttemptStatus::Revealed
    } else {
      AttemptStatus::Answered
    };

    Ok(AttemptOutcome {
      is_correct,
      attempts_remaining: self.attempts_remaining(),
      resolved: self.status == AttemptStatus::Revealed,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn single_attempt_reveals_immediately() {
    let mut st = AttemptState::new(1);
    let out = st.submit("955", "1065").unwrap();
    assert!(!out.is_correct);
    assert!(out.resolved);
    assert_eq!(out.attempts_remaining, 0);
    assert_eq!(st.submit("1065", "1065"), Err(SubmissionError::AlreadyResolved));
  }

  #[test]
  fn multi_attempt_allows_retry_after_wrong_answer() {
    let mut st = AttemptState::new(3);
    let first = st.submit("a", "b").unwrap();
    assert_eq!(st.status, AttemptStatus::Answered);
    assert_eq!(first.attempts_remaining, 2);
    assert!(!first.resolved);

    let second = st.submit("b", "b").unwrap();
    assert!(second.is_correct);
    assert!(second.resolved);
    assert_eq!(st.status, AttemptStatus::Revealed);
  }

  #[test]
  fn exhausting_attempts_is_terminal() {
    let mut st = AttemptState::new(2);
    st.submit("x", "y").unwrap();
    let last = st.submit("x", "y").unwrap();
    assert!(last.resolved);
    assert_eq!(st.submit("y", "y"), Err(SubmissionError::AlreadyResolved));
    assert_eq!(st.attempts_used, 2);
  }

  #[test]
  fn zero_max_attempts_is_treated_as_one() {
    assert_eq!(AttemptState::new(0).max_attempts, 1);
  }
}
