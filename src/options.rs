//! Option-set assembly: one correct answer plus `k` distinct distractors.
//!
//! The order is shuffled once, at instance creation, and stored with the
//! instance record so re-renders always show the same order.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::random::RandomSource;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOption {
  pub value: String,
  pub is_correct: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
  #[error("only {got} usable distractors, {wanted} required")]
  NotEnoughDistractors { wanted: usize, got: usize },
}

/// Build exactly `k + 1` options. Distractors equal to the answer or to each
/// other are dropped; extra distractors beyond `k` are ignored.
pub fn build(answer: &str, distractors: &[String], k: usize, rng: &mut RandomSource) -> Result<Vec<AnswerOption>, GenerationError> {
  let mut options = Vec::with_capacity(k + 1);
  options.push(AnswerOption { value: answer.to_string(), is_correct: true });

  for d in distractors {
    if options.len() == k + 1 {
      break;
    }
    if options.iter().any(|o| o.value == *d) {
      continue;
    }
    options.push(AnswerOption { value: d.clone(), is_correct: false });
  }

  if options.len() < k + 1 {
    return Err(GenerationError::NotEnoughDistractors { wanted: k, got: options.len() - 1 });
  }

  options.shuffle(rng);
  Ok(options)
}
