//! Problem families: generate / solve / distractors.
//!
//! Each family module provides a sampler, a quality predicate, a fixed
//! fallback and the display prompt through [`ProblemFamily`]; solving and
//! distractor building dispatch on the [`Params`] union.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{debug, warn};
use uuid::{Builder, Uuid};

use crate::domain::{FamilyId, Instance, InstanceSource, Level, Params, Solution};
use crate::random::RandomSource;

pub mod addition;
pub mod arithmetic;
pub mod fraction;
pub mod geometry;
pub mod subtraction;
pub mod triangle;
pub mod truth_table;

/// Default cap on rejection-sampling draws per `generate` call.
pub const DEFAULT_MAX_TRIES: usize = 300;

/// Draws spent on random jitter before deterministic completion kicks in.
const JITTER_TRIES: usize = 48;

/// Generator half of a family. Solving lives on the [`Params`] variant.
pub trait ProblemFamily {
  type Params: Clone;
  const ID: FamilyId;

  /// Draw candidate parameters from the level's range. May be rejected.
  fn sample(rng: &mut RandomSource, level: Level) -> Self::Params;

  /// Quality filter: false for trivial, degenerate or off-band instances.
  fn is_acceptable(params: &Self::Params, level: Level) -> bool;

  /// Hand-verified instance served when sampling is exhausted.
  fn fallback() -> Self::Params;

  fn display(params: &Self::Params) -> String;

  fn wrap(params: Self::Params) -> Params;
}

/// Rejection sampling with a hard cap; never fails.
pub fn generate_with<F: ProblemFamily>(rng: &mut RandomSource, level: Level, max_tries: usize) -> Instance {
  for attempt in 0..max_tries {
    let params = F::sample(rng, level);
    if F::is_acceptable(&params, level) {
      debug!(target: "generation", family = F::ID.as_str(), %level, tries = attempt + 1, "Instance accepted");
      let display = F::display(&params);
      return build_instance(rng, level, InstanceSource::Generated, display, F::wrap(params));
    }
  }

  warn!(target: "generation", family = F::ID.as_str(), %level, max_tries, "Rejection sampling exhausted; serving fallback instance");
  let params = F::fallback();
  let display = F::display(&params);
  build_instance(rng, level, InstanceSource::Fallback, display, F::wrap(params))
}

fn build_instance(rng: &mut RandomSource, level: Level, source: InstanceSource, display: String, params: Params) -> Instance {
  let id: Uuid = Builder::from_random_bytes(rng.gen()).into_uuid();
  Instance { id, family: params.family(), level, source, params, display }
}

pub fn generate(family: FamilyId, rng: &mut RandomSource, level: Level, max_tries: usize) -> Instance {
  match family {
    FamilyId::CarriedAddition => generate_with::<addition::CarriedAddition>(rng, level, max_tries),
    FamilyId::BorrowSubtraction => generate_with::<subtraction::BorrowSubtraction>(rng, level, max_tries),
    FamilyId::TruthTable => generate_with::<truth_table::TruthTable>(rng, level, max_tries),
    FamilyId::TriangleCenters => generate_with::<triangle::TriangleCenters>(rng, level, max_tries),
    FamilyId::FractionSimplification => generate_with::<fraction::FractionSimplification>(rng, level, max_tries),
  }
}

/// Pure re-derivation of the answer and its trace.
pub fn solve(params: &Params) -> Solution {
  match params {
    Params::Addition(p) => addition::solve(p),
    Params::Subtraction(p) => subtraction::solve(p),
    Params::TruthTable(p) => truth_table::solve(p),
    Params::Triangle(p) => triangle::solve(p),
    Params::Fraction(p) => fraction::solve(p),
  }
}

/// `k` wrong answers, none equal to `answer`, pairwise distinct.
pub fn distractors(params: &Params, answer: &str, rng: &mut RandomSource, k: usize) -> Vec<String> {
  match params {
    Params::Addition(p) => addition::distractors(p, answer, rng, k),
    Params::Subtraction(p) => subtraction::distractors(p, answer, rng, k),
    Params::TruthTable(p) => truth_table::distractors(p, answer, rng, k),
    Params::Triangle(p) => triangle::distractors(p, answer, rng, k),
    Params::Fraction(p) => fraction::distractors(p, answer, rng, k),
  }
}

pub fn is_acceptable(params: &Params, level: Level) -> bool {
  match params {
    Params::Addition(p) => addition::CarriedAddition::is_acceptable(p, level),
    Params::Subtraction(p) => subtraction::BorrowSubtraction::is_acceptable(p, level),
    Params::TruthTable(p) => truth_table::TruthTable::is_acceptable(p, level),
    Params::Triangle(p) => triangle::TriangleCenters::is_acceptable(p, level),
    Params::Fraction(p) => fraction::FractionSimplification::is_acceptable(p, level),
  }
}

/// Short difficulty signature, used to avoid serving the same shape twice in a row.
pub fn signature(params: &Params) -> String {
  match params {
    Params::Addition(p) => format!("carries={}", addition::carry_count(p)),
    Params::Subtraction(p) => format!("borrows={}", subtraction::borrow_count(p)),
    Params::TruthTable(p) => format!("nodes={};vars={}", p.expr.node_count(), p.variables.len()),
    Params::Triangle(p) => format!("target={}", p.target.as_str()),
    Params::Fraction(p) => format!("gcd={}", arithmetic::gcd(p.numerator, p.denominator)),
  }
}

/// Accumulates distractor candidates, refusing the answer and duplicates.
pub(crate) struct DistractorSet<'a> {
  answer: &'a str,
  wanted: usize,
  values: Vec<String>,
}

impl<'a> DistractorSet<'a> {
  pub(crate) fn new(answer: &'a str, wanted: usize) -> Self {
    Self { answer, wanted, values: Vec::with_capacity(wanted) }
  }

  pub(crate) fn offer(&mut self, candidate: impl Into<String>) -> bool {
    let candidate = candidate.into();
    if self.is_full() || candidate.is_empty() || candidate == self.answer || self.values.contains(&candidate) {
      return false;
    }
    self.values.push(candidate);
    true
  }

  /// Offer the error-model candidates in a random order.
  pub(crate) fn offer_shuffled(&mut self, mut candidates: Vec<String>, rng: &mut RandomSource) {
    candidates.shuffle(rng);
    for c in candidates {
      self.offer(c);
    }
  }

  pub(crate) fn is_full(&self) -> bool {
    self.values.len() >= self.wanted
  }

  pub(crate) fn into_values(self) -> Vec<String> {
    self.values
  }
}

/// Fill with `answer ± step` jitter; a collision switches the jitter magnitude.
pub(crate) fn fill_numeric(set: &mut DistractorSet<'_>, answer: i64, min: i64, rng: &mut RandomSource) {
  const MAGNITUDES: [i64; 3] = [1, 10, 100];
  let mut magnitude = 0usize;

  for _ in 0..JITTER_TRIES {
    if set.is_full() {
      return;
    }
    let step = rng.gen_range(1..=3) * MAGNITUDES[magnitude];
    let candidate = if rng.gen_bool(0.5) { answer + step } else { answer - step };
    if candidate < min || !set.offer(candidate.to_string()) {
      magnitude = (magnitude + 1) % MAGNITUDES.len();
    }
  }

  let mut offset = 1;
  while !set.is_full() {
    set.offer((answer + offset).to_string());
    if answer - offset >= min {
      set.offer((answer - offset).to_string());
    }
    offset += 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::HashSet;

  const FAMILIES: [FamilyId; 5] = FamilyId::ALL;

  #[test]
  fn every_family_generates_acceptable_instances_at_every_level() {
    let mut rng = RandomSource::seeded(2024);
    for family in FAMILIES {
      for level in Level::all() {
        for _ in 0..20 {
          let inst = generate(family, &mut rng, level, DEFAULT_MAX_TRIES);
          assert_eq!(inst.family, family);
          if inst.source == InstanceSource::Generated {
            assert!(is_acceptable(&inst.params, level), "{:?} at {} rejected: {:?}", family, level, inst.params);
          }
        }
      }
    }
  }

  #[test]
  fn zero_tries_serves_fallback() {
    let mut rng = RandomSource::seeded(1);
    for family in FAMILIES {
      let inst = generate(family, &mut rng, Level::new(2), 0);
      assert_eq!(inst.source, InstanceSource::Fallback);
      assert_eq!(inst.params, crate::seeds::fallback_params(family));
    }
  }

  #[test]
  fn traces_replay_to_answer_for_every_family() {
    let mut rng = RandomSource::seeded(99);
    for family in FAMILIES {
      for level in Level::all() {
        for _ in 0..15 {
          let inst = generate(family, &mut rng, level, DEFAULT_MAX_TRIES);
          let sol = solve(&inst.params);
          assert_eq!(sol.trace.replay().as_deref(), Some(sol.answer.as_str()), "{}", inst.display);
        }
      }
    }
  }

  #[test]
  fn distractors_are_distinct_and_wrong() {
    let mut rng = RandomSource::seeded(5);
    for family in FAMILIES {
      for level in Level::all() {
        for _ in 0..15 {
          let inst = generate(family, &mut rng, level, DEFAULT_MAX_TRIES);
          let answer = solve(&inst.params).answer;
          let ds = distractors(&inst.params, &answer, &mut rng, 3);
          assert_eq!(ds.len(), 3, "{}", inst.display);
          assert!(!ds.contains(&answer));
          let unique: HashSet<&String> = ds.iter().collect();
          assert_eq!(unique.len(), ds.len());
        }
      }
    }
  }

  #[test]
  fn generation_is_deterministic_per_seed() {
    for family in FAMILIES {
      let a = generate(family, &mut RandomSource::seeded(31), Level::new(3), DEFAULT_MAX_TRIES);
      let b = generate(family, &mut RandomSource::seeded(31), Level::new(3), DEFAULT_MAX_TRIES);
      assert_eq!(a.params, b.params);
      assert_eq!(a.id, b.id);
      assert_eq!(solve(&a.params), solve(&b.params));
    }
  }

  #[test]
  fn fallback_signatures() {
    use crate::seeds::fallback_params;
    assert_eq!(signature(&fallback_params(FamilyId::CarriedAddition)), "carries=3");
    assert_eq!(signature(&fallback_params(FamilyId::BorrowSubtraction)), "borrows=2");
    assert_eq!(signature(&fallback_params(FamilyId::FractionSimplification)), "gcd=6");
    assert_eq!(signature(&fallback_params(FamilyId::TriangleCenters)), "target=centroid");
  }

  #[test]
  fn fill_numeric_respects_minimum() {
    let mut rng = RandomSource::seeded(3);
    let mut set = DistractorSet::new("2", 3);
    fill_numeric(&mut set, 2, 1, &mut rng);
    let values = set.into_values();
    assert_eq!(values.len(), 3);
    for v in values {
      assert!(v.parse::<i64>().unwrap() >= 1);
      assert_ne!(v, "2");
    }
  }
}
