//! Fraction simplification: reduce `a/b` to lowest terms.
//!
//! Instances are always reducible; the difficulty signature is the gcd.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::arithmetic::{gcd, smallest_prime_factor};
use super::{DistractorSet, ProblemFamily};
use crate::domain::{FamilyId, Level, Params, Solution, StepValue, Trace, TraceStep};
use crate::random::RandomSource;
use crate::util::fill_template;

const PROMPT: &str = "Simplify {n}/{d} to lowest terms";
const JITTER_TRIES: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FractionParams {
  pub numerator: u64,
  pub denominator: u64,
}

pub struct FractionSimplification;

fn max_denominator(level: Level) -> u64 {
  match level.get() {
    1 => 30,
    2 => 80,
    _ => 150,
  }
}

fn gcd_band(level: Level) -> (u64, u64) {
  match level.get() {
    1 => (2, 5),
    2 => (3, 9),
    _ => (4, 15),
  }
}

fn fraction(n: u64, d: u64) -> String {
  format!("{}/{}", n, d)
}

impl ProblemFamily for FractionSimplification {
  type Params = FractionParams;
  const ID: FamilyId = FamilyId::FractionSimplification;

  fn sample(rng: &mut RandomSource, level: Level) -> FractionParams {
    let (lo, hi) = gcd_band(level);
    let factor = rng.gen_range(lo..=hi);
    let max_reduced = (max_denominator(level) / factor).max(3);
    let q = rng.gen_range(3..=max_reduced);
    let p = rng.gen_range(1..q);
    FractionParams { numerator: p * factor, denominator: q * factor }
  }

  fn is_acceptable(p: &FractionParams, level: Level) -> bool {
    if p.numerator == 0 || p.numerator >= p.denominator || p.denominator > max_denominator(level) {
      return false;
    }
    let g = gcd(p.numerator, p.denominator);
    let (lo, hi) = gcd_band(level);
    if g < lo || g > hi {
      return false;
    }
    // 1/2-style answers are too easy to guess.
    p.denominator / g >= 3
  }

  fn fallback() -> FractionParams {
    crate::seeds::fallback_fraction()
  }

  fn display(p: &FractionParams) -> String {
    fill_template(PROMPT, &[("n", &p.numerator.to_string()), ("d", &p.denominator.to_string())])
  }

  fn wrap(p: FractionParams) -> Params {
    Params::Fraction(p)
  }
}

pub fn solve(p: &FractionParams) -> Solution {
  let mut trace = Trace::default();
  if p.denominator == 0 {
    trace.push("denominator is zero", StepValue::Integer { value: 0 });
    return Solution { answer: "undefined".to_string(), trace };
  }

  // Euclid on (denominator, numerator).
  let (mut x, mut y) = (p.denominator, p.numerator);
  while y != 0 {
    let r = x % y;
    let q = x / y;
    trace.push(
      format!("{} = {} × {} + {}", x, q, y, r),
      StepValue::Euclid { dividend: x, divisor: y, quotient: q, remainder: r },
    );
    x = y;
    y = r;
  }
  let g = x;
  trace.push(format!("gcd({}, {}) = {}", p.numerator, p.denominator, g), StepValue::Integer { value: g as i64 });

  let (n, d) = (p.numerator / g, p.denominator / g);
  trace.push(
    format!("{} ÷ {} = {}, {} ÷ {} = {}", p.numerator, g, n, p.denominator, g, d),
    StepValue::Fraction { numerator: n, denominator: d },
  );
  Solution { answer: fraction(n, d), trace }
}

/// Re-derives the reduced fraction from a `solve` trace. The Euclid chain
/// must hand each remainder on as the next divisor and end at zero; the gcd
/// and reduced terms, when recorded, must agree with it.
pub fn replay(steps: &[TraceStep]) -> Option<String> {
  let mut terms: Option<(u64, u64)> = None;
  let mut next: Option<(u64, u64)> = None;
  let mut divisor_found: Option<u64> = None;
  let mut reduced: Option<(u64, u64)> = None;

  for step in steps {
    match step.value {
      StepValue::Euclid { dividend, divisor, quotient, remainder } => {
        if divisor_found.is_some() || next.is_some_and(|pair| pair != (dividend, divisor)) {
          return None;
        }
        if divisor == 0 || remainder >= divisor || quotient.checked_mul(divisor)?.checked_add(remainder)? != dividend {
          return None;
        }
        terms.get_or_insert((dividend, divisor));
        if remainder == 0 {
          divisor_found = Some(divisor);
        } else {
          next = Some((divisor, remainder));
        }
      }
      StepValue::Integer { value } => {
        if divisor_found.map(|g| g as i64) != Some(value) {
          return None;
        }
      }
      StepValue::Fraction { numerator, denominator } => reduced = Some((numerator, denominator)),
      _ => return None,
    }
  }

  let g = divisor_found?;
  let (denominator, numerator) = terms?;
  let answer = (numerator / g, denominator / g);
  if reduced.is_some_and(|r| r != answer) {
    return None;
  }
  Some(fraction(answer.0, answer.1))
}

/// Error model: divide one term only, stop at a partial reduction, invert,
/// subtract the gcd instead of dividing.
pub fn distractors(p: &FractionParams, answer: &str, rng: &mut RandomSource, k: usize) -> Vec<String> {
  let g = gcd(p.numerator, p.denominator).max(1);
  let (n, d) = (p.numerator / g, p.denominator / g);

  let mut candidates = vec![fraction(n, p.denominator), fraction(p.numerator, d), fraction(d, n)];
  if let Some(sp) = smallest_prime_factor(g) {
    if sp < g {
      candidates.push(fraction(p.numerator / sp, p.denominator / sp));
    }
  }
  if p.numerator > g {
    candidates.push(fraction(p.numerator - g, p.denominator - g));
  }

  let mut set = DistractorSet::new(answer, k);
  set.offer_shuffled(candidates, rng);

  const MAGNITUDES: [i64; 3] = [1, 2, 5];
  let mut magnitude = 0usize;
  for _ in 0..JITTER_TRIES {
    if set.is_full() {
      break;
    }
    let step = MAGNITUDES[magnitude] * if rng.gen_bool(0.5) { 1 } else { -1 };
    let (jn, jd) = if rng.gen_bool(0.5) { (n as i64 + step, d as i64) } else { (n as i64, d as i64 + step) };
    if jn < 1 || jd < 1 || !set.offer(fraction(jn as u64, jd as u64)) {
      magnitude = (magnitude + 1) % MAGNITUDES.len();
    }
  }

  let mut bump = 1;
  while !set.is_full() {
    set.offer(fraction(n, d + bump));
    bump += 1;
  }
  set.into_values()
}
