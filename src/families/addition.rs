//! Column addition with carries.
//!
//! Level `n` uses operands with `n + 1` digits; the difficulty signature is
//! the number of columns that produce a carry.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arithmetic::{digit_at, digit_count, digits_le, lower_bound, place_name};
use super::{fill_numeric, DistractorSet, ProblemFamily};
use crate::domain::{FamilyId, Level, Params, Solution, StepValue, Trace};
use crate::random::RandomSource;
use crate::util::fill_template;

const PROMPT: &str = "Compute {a} + {b}";
const MIN_SUM: u64 = 20;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionParams {
  pub augend: u64,
  pub addend: u64,
}

pub struct CarriedAddition;

fn operand_digits(level: Level) -> u32 {
  level.get() as u32 + 1
}

fn carry_band(level: Level) -> (u32, u32) {
  match level.get() {
    1 => (1, 1),
    2 => (2, 3),
    _ => (3, 4),
  }
}

/// Number of columns whose total reaches ten.
pub fn carry_count(p: &AdditionParams) -> u32 {
  let a = digits_le(p.augend);
  let b = digits_le(p.addend);
  let width = a.len().max(b.len());
  let mut carry = 0u8;
  let mut count = 0;
  for place in 0..width {
    let total = digit_at(&a, place) + digit_at(&b, place) + carry;
    carry = total / 10;
    if carry > 0 {
      count += 1;
    }
  }
  count
}

impl ProblemFamily for CarriedAddition {
  type Params = AdditionParams;
  const ID: FamilyId = FamilyId::CarriedAddition;

  fn sample(rng: &mut RandomSource, level: Level) -> AdditionParams {
    let digits = operand_digits(level);
    let lo = lower_bound(digits);
    let hi = lo * 10;
    AdditionParams { augend: rng.gen_range(lo..hi), addend: rng.gen_range(lo..hi) }
  }

  fn is_acceptable(p: &AdditionParams, level: Level) -> bool {
    let digits = operand_digits(level) as usize;
    if digit_count(p.augend) != digits || digit_count(p.addend) != digits {
      return false;
    }
    if p.augend + p.addend < MIN_SUM {
      return false;
    }
    let (lo, hi) = carry_band(level);
    let carries = carry_count(p);
    carries >= lo && carries <= hi
  }

  fn fallback() -> AdditionParams {
    crate::seeds::fallback_addition()
  }

  fn display(p: &AdditionParams) -> String {
    fill_template(PROMPT, &[("a", &p.augend.to_string()), ("b", &p.addend.to_string())])
  }

  fn wrap(p: AdditionParams) -> Params {
    Params::Addition(p)
  }
}

pub fn solve(p: &AdditionParams) -> Solution {
  let a = digits_le(p.augend);
  let b = digits_le(p.addend);
  let width = a.len().max(b.len());
  let mut trace = Trace::default();
  let mut carry = 0u8;

  for place in 0..width {
    let (da, db) = (digit_at(&a, place), digit_at(&b, place));
    let total = da + db + carry;
    let written = total % 10;
    let carry_out = total / 10;
    let sum = if carry > 0 {
      format!("{} + {} + {} = {}", da, db, carry, total)
    } else {
      format!("{} + {} = {}", da, db, total)
    };
    let note = if carry_out > 0 {
      format!("write {}, carry {}", written, carry_out)
    } else {
      format!("write {}", written)
    };
    trace.push(
      format!("{}: {} ({})", place_name(place), sum, note),
      StepValue::Column { place: place as u32, written, carry: carry_out },
    );
    carry = carry_out;
  }

  if carry > 0 {
    trace.push(
      format!("{}: carried {} becomes the leading digit", place_name(width), carry),
      StepValue::Column { place: width as u32, written: carry, carry: 0 },
    );
  }

  Solution { answer: (p.augend + p.addend).to_string(), trace }
}

/// Error model: ignore carries, write whole column sums, lose one carry.
pub fn distractors(p: &AdditionParams, answer: &str, rng: &mut RandomSource, k: usize) -> Vec<String> {
  let a = digits_le(p.augend);
  let b = digits_le(p.addend);
  let width = a.len().max(b.len());
  let sum = (p.augend + p.addend) as i64;

  let mut ignore_carry = 0i64;
  let mut column_sums = String::new();
  let mut lost_carries = Vec::new();
  let mut carry = 0u8;
  for place in 0..width {
    let (da, db) = (digit_at(&a, place), digit_at(&b, place));
    ignore_carry += ((da + db) % 10) as i64 * 10i64.pow(place as u32);
    column_sums.insert_str(0, &(da + db).to_string());
    let total = da + db + carry;
    carry = total / 10;
    if carry > 0 {
      lost_carries.push(sum - 10i64.pow(place as u32 + 1));
    }
  }

  let mut candidates = vec![ignore_carry.to_string(), column_sums];
  if let Some(&lost) = lost_carries.get(rng.gen_range(0..lost_carries.len().max(1))) {
    candidates.push(lost.to_string());
  }

  let mut set = DistractorSet::new(answer, k);
  set.offer_shuffled(candidates, rng);
  fill_numeric(&mut set, sum, 1, rng);
  set.into_values()
}
