//! Leveling labels and the training examples recorded for every decision.

use serde::{Deserialize, Serialize};

use crate::domain::Level;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
  Promote,
  Hold,
  Demote,
}

impl Outcome {
  pub const ALL: [Outcome; 3] = [Outcome::Promote, Outcome::Hold, Outcome::Demote];

  pub fn index(self) -> usize {
    match self {
      Outcome::Promote => 0,
      Outcome::Hold => 1,
      Outcome::Demote => 2,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Outcome::Promote => "promote",
      Outcome::Hold => "hold",
      Outcome::Demote => "demote",
    }
  }
}

/// The four ledger fields the classifier looks at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerFeatures {
  pub level: Level,
  pub correct_count: u32,
  pub incorrect_count: u32,
  pub total_responses: u32,
}

impl LedgerFeatures {
  pub const WIDTH: usize = 4;

  pub fn as_vector(&self) -> [f64; Self::WIDTH] {
    [
      self.level.get() as f64,
      self.correct_count as f64,
      self.incorrect_count as f64,
      self.total_responses as f64,
    ]
  }
}

/// `(level, correctCount, incorrectCount, totalResponses) -> outcome`.
/// Append-only; the label is the intended outcome, before clamping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingExample {
  pub features: LedgerFeatures,
  pub outcome: Outcome,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn outcome_indices_are_dense() {
    for (i, o) in Outcome::ALL.iter().enumerate() {
      assert_eq!(o.index(), i);
    }
  }

  #[test]
  fn example_serializes_camel_case() {
    let ex = TrainingExample {
      features: LedgerFeatures { level: Level::new(2), correct_count: 3, incorrect_count: 0, total_responses: 5 },
      outcome: Outcome::Promote,
    };
    let json = serde_json::to_value(ex).unwrap();
    assert_eq!(json["features"]["correctCount"], 3);
    assert_eq!(json["features"]["level"], 2);
    assert_eq!(json["outcome"], "promote");
  }
}
