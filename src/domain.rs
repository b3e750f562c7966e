//! Domain models: levels, problem families, instances and their derivations.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::families::addition::AdditionParams;
use crate::families::fraction::{self, FractionParams};
use crate::families::subtraction::SubtractionParams;
use crate::families::triangle::{self, CenterKind, TriangleParams};
use crate::families::truth_table::TruthTableParams;

/// Difficulty level, always within `MIN..=MAX`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
  pub const MIN: Level = Level(1);
  pub const MAX: Level = Level(3);

  /// Builds a level, clamping out-of-range values.
  pub fn new(value: u8) -> Self {
    Level(value.clamp(Self::MIN.0, Self::MAX.0))
  }

  pub fn get(self) -> u8 {
    self.0
  }

  pub fn promoted(self) -> Self {
    Level::new(self.0.saturating_add(1))
  }

  pub fn demoted(self) -> Self {
    Level::new(self.0.saturating_sub(1))
  }

  pub fn all() -> [Level; 3] {
    [Level(1), Level(2), Level(3)]
  }
}

impl Default for Level {
  fn default() -> Self {
    Level::MIN
  }
}

impl From<u8> for Level {
  fn from(v: u8) -> Self {
    Level::new(v)
  }
}

impl From<Level> for u8 {
  fn from(l: Level) -> Self {
    l.0
  }
}

impl std::fmt::Display for Level {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Which exercise type produced an instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FamilyId {
  CarriedAddition,
  BorrowSubtraction,
  TruthTable,
  TriangleCenters,
  FractionSimplification,
}

impl FamilyId {
  pub const ALL: [FamilyId; 5] = [
    FamilyId::CarriedAddition,
    FamilyId::BorrowSubtraction,
    FamilyId::TruthTable,
    FamilyId::TriangleCenters,
    FamilyId::FractionSimplification,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      FamilyId::CarriedAddition => "carried_addition",
      FamilyId::BorrowSubtraction => "borrow_subtraction",
      FamilyId::TruthTable => "truth_table",
      FamilyId::TriangleCenters => "triangle_centers",
      FamilyId::FractionSimplification => "fraction_simplification",
    }
  }
}

/// Where did the instance come from?
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum InstanceSource {
  Generated, // accepted by the quality filter
  Fallback,  // rejection sampling exhausted, hand-verified instance served
}

/// Family-specific parameters. One variant per family so solving and
/// distractor building are dispatched exhaustively.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum Params {
  Addition(AdditionParams),
  Subtraction(SubtractionParams),
  TruthTable(TruthTableParams),
  Triangle(TriangleParams),
  Fraction(FractionParams),
}

impl Params {
  pub fn family(&self) -> FamilyId {
    match self {
      Params::Addition(_) => FamilyId::CarriedAddition,
      Params::Subtraction(_) => FamilyId::BorrowSubtraction,
      Params::TruthTable(_) => FamilyId::TruthTable,
      Params::Triangle(_) => FamilyId::TriangleCenters,
      Params::Fraction(_) => FamilyId::FractionSimplification,
    }
  }
}

/// A generated problem. Immutable once built.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Instance {
  pub id: Uuid,
  pub family: FamilyId,
  pub level: Level,
  pub source: InstanceSource,
  pub params: Params,
  /// Prompt shown to the student.
  pub display: String,
}

/// Typed payload of one derivation step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepValue {
  /// Addition column: digit written at `place` and the carry sent left.
  Column { place: u32, written: u8, carry: u8 },
  /// Subtraction column: digit written at `place`, whether a borrow was taken.
  Borrow { place: u32, written: u8, borrowed: bool },
  /// One truth-table row.
  Row { index: usize, value: bool },
  /// One division of Euclid's algorithm: `dividend = quotient × divisor + remainder`.
  Euclid { dividend: u64, divisor: u64, quotient: u64, remainder: u64 },
  Integer { value: i64 },
  Scalar { value: f64 },
  /// Triangle vertex as given in the prompt.
  Vertex { x: f64, y: f64 },
  Point { x: f64, y: f64 },
  /// The requested triangle center.
  Center { target: CenterKind, x: f64, y: f64 },
  Fraction { numerator: u64, denominator: u64 },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TraceStep {
  pub operation: String,
  pub value: StepValue,
}

impl TraceStep {
  pub fn new(operation: impl Into<String>, value: StepValue) -> Self {
    Self { operation: operation.into(), value }
  }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trace {
  pub steps: Vec<TraceStep>,
}

impl Trace {
  pub fn push(&mut self, operation: impl Into<String>, value: StepValue) {
    self.steps.push(TraceStep::new(operation, value));
  }

  /// Recompute the answer from the recorded steps alone.
  ///
  /// Digit steps are summed by place value and rows are concatenated as
  /// `V`/`F`. Euclid and vertex traces are re-derived by their family, which
  /// rejects any step that does not follow from the ones before it.
  pub fn replay(&self) -> Option<String> {
    match self.steps.first().map(|s| &s.value) {
      Some(StepValue::Euclid { .. }) => return fraction::replay(&self.steps),
      Some(StepValue::Vertex { .. }) => return triangle::replay(&self.steps),
      _ => {}
    }

    let mut number: Option<u64> = None;
    let mut code = String::new();
    for step in &self.steps {
      match &step.value {
        StepValue::Column { place, written, .. } | StepValue::Borrow { place, written, .. } => {
          let place_value = 10u64.checked_pow(*place)?;
          *number.get_or_insert(0) += *written as u64 * place_value;
        }
        StepValue::Row { value, .. } => code.push(if *value { 'V' } else { 'F' }),
        _ => return None,
      }
    }

    match number {
      Some(n) => Some(n.to_string()),
      None if !code.is_empty() => Some(code),
      None => None,
    }
  }
}

/// Canonical answer plus the derivation that produced it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solution {
  pub answer: String,
  pub trace: Trace,
}
