//! Column subtraction with borrows.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arithmetic::{digit_at, digit_count, digits_le, lower_bound, place_name};
use super::{fill_numeric, DistractorSet, ProblemFamily};
use crate::domain::{FamilyId, Level, Params, Solution, StepValue, Trace};
use crate::random::RandomSource;
use crate::util::fill_template;

const PROMPT: &str = "Compute {a} − {b}";
const MIN_DIFFERENCE: u64 = 10;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtractionParams {
  pub minuend: u64,
  pub subtrahend: u64,
}

pub struct BorrowSubtraction;

fn operand_digits(level: Level) -> u32 {
  level.get() as u32 + 1
}

fn borrow_band(level: Level) -> (u32, u32) {
  match level.get() {
    1 => (1, 1),
    2 => (2, 2),
    _ => (2, 3),
  }
}

/// One column of the written algorithm.
struct ColumnStep {
  minuend_digit: u8,
  subtrahend_digit: u8,
  lent: bool,
  borrowed: bool,
  top: u8,
  written: u8,
}

fn columns(p: &SubtractionParams) -> Vec<ColumnStep> {
  let m = digits_le(p.minuend);
  let s = digits_le(p.subtrahend);
  let width = m.len().max(s.len());
  let mut out = Vec::with_capacity(width);
  let mut borrow_in = 0i16;

  for place in 0..width {
    let dm = digit_at(&m, place);
    let ds = digit_at(&s, place);
    let available = dm as i16 - borrow_in;
    let borrowed = available < ds as i16;
    let top = if borrowed { available + 10 } else { available };
    out.push(ColumnStep {
      minuend_digit: dm,
      subtrahend_digit: ds,
      lent: borrow_in > 0,
      borrowed,
      top: top as u8,
      written: (top - ds as i16) as u8,
    });
    borrow_in = borrowed as i16;
  }
  out
}

pub fn borrow_count(p: &SubtractionParams) -> u32 {
  if p.minuend < p.subtrahend {
    return 0;
  }
  columns(p).iter().filter(|c| c.borrowed).count() as u32
}

impl ProblemFamily for BorrowSubtraction {
  type Params = SubtractionParams;
  const ID: FamilyId = FamilyId::BorrowSubtraction;

  fn sample(rng: &mut RandomSource, level: Level) -> SubtractionParams {
    let lo = lower_bound(operand_digits(level));
    let hi = lo * 10;
    let x = rng.gen_range(lo..hi);
    let y = rng.gen_range(lo..hi);
    SubtractionParams { minuend: x.max(y), subtrahend: x.min(y) }
  }

  fn is_acceptable(p: &SubtractionParams, level: Level) -> bool {
    let digits = operand_digits(level) as usize;
    if digit_count(p.minuend) != digits || digit_count(p.subtrahend) != digits {
      return false;
    }
    if p.minuend < p.subtrahend || p.minuend - p.subtrahend < MIN_DIFFERENCE {
      return false;
    }
    let (lo, hi) = borrow_band(level);
    let borrows = borrow_count(p);
    borrows >= lo && borrows <= hi
  }

  fn fallback() -> SubtractionParams {
    crate::seeds::fallback_subtraction()
  }

  fn display(p: &SubtractionParams) -> String {
    fill_template(PROMPT, &[("a", &p.minuend.to_string()), ("b", &p.subtrahend.to_string())])
  }

  fn wrap(p: SubtractionParams) -> Params {
    Params::Subtraction(p)
  }
}

pub fn solve(p: &SubtractionParams) -> Solution {
  let mut trace = Trace::default();
  if p.minuend < p.subtrahend {
    trace.push("minuend is smaller than subtrahend", StepValue::Integer { value: p.minuend as i64 - p.subtrahend as i64 });
    return Solution { answer: (p.minuend as i64 - p.subtrahend as i64).to_string(), trace };
  }

  for (place, c) in columns(p).into_iter().enumerate() {
    let mut op = format!("{}: ", place_name(place));
    if c.lent {
      op.push_str(&format!("{} − 1 lent = {}, ", c.minuend_digit, c.minuend_digit as i16 - 1));
    }
    if c.borrowed {
      op.push_str(&format!("borrow 1 to get {}, ", c.top));
    }
    op.push_str(&format!("{} − {} = {}", c.top, c.subtrahend_digit, c.written));
    trace.push(op, StepValue::Borrow { place: place as u32, written: c.written, borrowed: c.borrowed });
  }

  Solution { answer: (p.minuend - p.subtrahend).to_string(), trace }
}

/// Error model: smaller-from-larger, borrow without decrement, added instead.
pub fn distractors(p: &SubtractionParams, answer: &str, rng: &mut RandomSource, k: usize) -> Vec<String> {
  let difference = p.minuend as i64 - p.subtrahend as i64;
  let mut smaller_from_larger = 0i64;
  let mut no_decrement = 0i64;
  for (place, c) in columns(p).iter().enumerate() {
    let scale = 10i64.pow(place as u32);
    let (dm, ds) = (c.minuend_digit as i64, c.subtrahend_digit as i64);
    smaller_from_larger += (dm - ds).abs() * scale;
    let column = if dm < ds { dm + 10 - ds } else { dm - ds };
    no_decrement += column * scale;
  }

  let candidates = vec![
    smaller_from_larger.to_string(),
    no_decrement.to_string(),
    (p.minuend + p.subtrahend).to_string(),
  ];

  let mut set = DistractorSet::new(answer, k);
  set.offer_shuffled(candidates, rng);
  fill_numeric(&mut set, difference, 1, rng);
  set.into_values()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn params(minuend: u64, subtrahend: u64) -> SubtractionParams {
    SubtractionParams { minuend, subtrahend }
  }

  #[test]
  fn borrows_through_two_columns() {
    let sol = solve(&params(723, 458));
    assert_eq!(sol.answer, "265");
    assert_eq!(sol.trace.steps[0].operation, "units: borrow 1 to get 13, 13 − 8 = 5");
    assert_eq!(sol.trace.steps[1].operation, "tens: 2 − 1 lent = 1, borrow 1 to get 11, 11 − 5 = 6");
    assert_eq!(sol.trace.steps[2].operation, "hundreds: 7 − 1 lent = 6, 6 − 4 = 2");
    assert_eq!(sol.trace.replay().as_deref(), Some("265"));
    assert_eq!(borrow_count(&params(723, 458)), 2);
  }

  #[test]
  fn lending_from_zero_wraps_to_nine() {
    let sol = solve(&params(503, 127));
    assert_eq!(sol.answer, "376");
    assert_eq!(sol.trace.replay().as_deref(), Some("376"));
  }

  #[test]
  fn quality_filter_requires_borrows() {
    assert!(!BorrowSubtraction::is_acceptable(&params(57, 23), Level::new(1)));
    assert!(BorrowSubtraction::is_acceptable(&params(52, 27), Level::new(1)));
    assert!(!BorrowSubtraction::is_acceptable(&params(52, 47), Level::new(1)));
  }

  #[test]
  fn error_model_includes_smaller_from_larger() {
    let mut rng = RandomSource::seeded(4);
    let ds = distractors(&params(723, 458), "265", &mut rng, 3);
    assert!(ds.contains(&"335".to_string()));
    assert!(ds.contains(&"1181".to_string()));
  }
}
