//! Propositional truth tables.
//!
//! The answer is a code of `V`/`F` letters, one per row. Rows run from all
//! variables true to all false, with the first variable most significant:
//! for `p, q` the order is VV, VF, FV, FF.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{DistractorSet, ProblemFamily};
use crate::domain::{FamilyId, Level, Params, Solution, StepValue, Trace};
use crate::random::RandomSource;
use crate::util::fill_template;

const PROMPT: &str = "Truth table of {expr}, rows in order {rows}";
const JITTER_TRIES: usize = 32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Var {
  P,
  Q,
  R,
}

impl Var {
  pub fn symbol(&self) -> &'static str {
    match self {
      Var::P => "p",
      Var::Q => "q",
      Var::R => "r",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connective {
  And,
  Or,
  Implies,
  Iff,
}

impl Connective {
  const ALL: [Connective; 4] = [Connective::And, Connective::Or, Connective::Implies, Connective::Iff];

  fn symbol(&self) -> &'static str {
    match self {
      Connective::And => "∧",
      Connective::Or => "∨",
      Connective::Implies => "→",
      Connective::Iff => "↔",
    }
  }

  fn apply(&self, l: bool, r: bool) -> bool {
    match self {
      Connective::And => l && r,
      Connective::Or => l || r,
      Connective::Implies => !l || r,
      Connective::Iff => l == r,
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expr {
  Var(Var),
  Not(Box<Expr>),
  Binary { op: Connective, left: Box<Expr>, right: Box<Expr> },
}

impl Expr {
  pub fn var(v: Var) -> Self {
    Expr::Var(v)
  }

  pub fn not(e: Expr) -> Self {
    Expr::Not(Box::new(e))
  }

  pub fn binary(op: Connective, left: Expr, right: Expr) -> Self {
    Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
  }

  pub fn node_count(&self) -> usize {
    match self {
      Expr::Var(_) => 1,
      Expr::Not(e) => 1 + e.node_count(),
      Expr::Binary { left, right, .. } => 1 + left.node_count() + right.node_count(),
    }
  }

  pub fn mentions(&self, v: Var) -> bool {
    match self {
      Expr::Var(x) => *x == v,
      Expr::Not(e) => e.mentions(v),
      Expr::Binary { left, right, .. } => left.mentions(v) || right.mentions(v),
    }
  }

  pub fn eval(&self, value_of: &impl Fn(Var) -> bool) -> bool {
    match self {
      Expr::Var(v) => value_of(*v),
      Expr::Not(e) => !e.eval(value_of),
      Expr::Binary { op, left, right } => op.apply(left.eval(value_of), right.eval(value_of)),
    }
  }

  /// Infix rendering; binary nodes are always parenthesized.
  pub fn render(&self) -> String {
    match self {
      Expr::Var(v) => v.symbol().to_string(),
      Expr::Not(e) => format!("¬{}", e.render()),
      Expr::Binary { op, left, right } => format!("({} {} {})", left.render(), op.symbol(), right.render()),
    }
  }

  fn contains(&self, target: Connective) -> bool {
    match self {
      Expr::Var(_) => false,
      Expr::Not(e) => e.contains(target),
      Expr::Binary { op, left, right } => *op == target || left.contains(target) || right.contains(target),
    }
  }

  /// Mistake: reading every `a → b` as `b → a`.
  fn converse(&self) -> Expr {
    match self {
      Expr::Var(v) => Expr::Var(*v),
      Expr::Not(e) => Expr::not(e.converse()),
      Expr::Binary { op: Connective::Implies, left, right } => {
        Expr::binary(Connective::Implies, right.converse(), left.converse())
      }
      Expr::Binary { op, left, right } => Expr::binary(*op, left.converse(), right.converse()),
    }
  }

  /// Mistake: confusing `∧` with `∨`.
  fn swap_and_or(&self) -> Expr {
    match self {
      Expr::Var(v) => Expr::Var(*v),
      Expr::Not(e) => Expr::not(e.swap_and_or()),
      Expr::Binary { op, left, right } => {
        let op = match op {
          Connective::And => Connective::Or,
          Connective::Or => Connective::And,
          other => *other,
        };
        Expr::binary(op, left.swap_and_or(), right.swap_and_or())
      }
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruthTableParams {
  pub variables: Vec<Var>,
  pub expr: Expr,
}

pub struct TruthTable;

fn level_shape(level: Level) -> (Vec<Var>, usize, usize) {
  match level.get() {
    1 => (vec![Var::P, Var::Q], 3, 3),
    2 => (vec![Var::P, Var::Q], 4, 5),
    _ => (vec![Var::P, Var::Q, Var::R], 6, 9),
  }
}

/// Value of `variables[j]` in row `index`: true while bit `n-1-j` is clear.
fn row_value(variables: &[Var], index: usize, v: Var) -> bool {
  let n = variables.len();
  variables
    .iter()
    .position(|x| *x == v)
    .map(|j| (index >> (n - 1 - j)) & 1 == 0)
    .unwrap_or(false)
}

fn letter(b: bool) -> char {
  if b { 'V' } else { 'F' }
}

fn table_code(variables: &[Var], expr: &Expr) -> String {
  (0..1usize << variables.len())
    .map(|i| letter(expr.eval(&|v| row_value(variables, i, v))))
    .collect()
}

fn row_labels(variables: &[Var]) -> String {
  (0..1usize << variables.len())
    .map(|i| variables.iter().map(|v| letter(row_value(variables, i, *v))).collect::<String>())
    .collect::<Vec<_>>()
    .join(", ")
}

/// True when flipping `v` changes the result in at least one row.
fn depends_on(variables: &[Var], expr: &Expr, v: Var) -> bool {
  (0..1usize << variables.len()).any(|i| {
    let base = expr.eval(&|x| row_value(variables, i, x));
    let flipped = expr.eval(&|x| if x == v { !row_value(variables, i, x) } else { row_value(variables, i, x) });
    base != flipped
  })
}

fn random_expr(rng: &mut RandomSource, variables: &[Var], nodes: usize) -> Expr {
  let leaf = |rng: &mut RandomSource| Expr::var(*variables.choose(rng).unwrap_or(&Var::P));
  match nodes {
    0 | 1 => leaf(rng),
    2 => Expr::not(leaf(rng)),
    _ => {
      if rng.gen_bool(0.2) {
        Expr::not(random_expr(rng, variables, nodes - 1))
      } else {
        let left = rng.gen_range(1..=nodes - 2);
        let op = *Connective::ALL.choose(rng).unwrap_or(&Connective::And);
        Expr::binary(op, random_expr(rng, variables, left), random_expr(rng, variables, nodes - 1 - left))
      }
    }
  }
}

impl ProblemFamily for TruthTable {
  type Params = TruthTableParams;
  const ID: FamilyId = FamilyId::TruthTable;

  fn sample(rng: &mut RandomSource, level: Level) -> TruthTableParams {
    let (variables, lo, hi) = level_shape(level);
    let nodes = rng.gen_range(lo..=hi);
    let expr = random_expr(rng, &variables, nodes);
    TruthTableParams { variables, expr }
  }

  /// Rejects bare variables, tautologies, contradictions, expressions that
  /// ignore one of the level's variables, and off-band node counts.
  fn is_acceptable(p: &TruthTableParams, level: Level) -> bool {
    let (variables, lo, hi) = level_shape(level);
    if p.variables != variables {
      return false;
    }
    let nodes = p.expr.node_count();
    if nodes < lo || nodes > hi || matches!(p.expr, Expr::Var(_)) {
      return false;
    }
    let code = table_code(&p.variables, &p.expr);
    if !code.contains('V') || !code.contains('F') {
      return false;
    }
    p.variables.iter().all(|v| p.expr.mentions(*v) && depends_on(&p.variables, &p.expr, *v))
  }

  fn fallback() -> TruthTableParams {
    crate::seeds::fallback_truth_table()
  }

  fn display(p: &TruthTableParams) -> String {
    fill_template(PROMPT, &[("expr", &p.expr.render()), ("rows", &row_labels(&p.variables))])
  }

  fn wrap(p: TruthTableParams) -> Params {
    Params::TruthTable(p)
  }
}

pub fn solve(p: &TruthTableParams) -> Solution {
  let mut trace = Trace::default();
  let mut answer = String::new();
  for index in 0..1usize << p.variables.len() {
    let value = p.expr.eval(&|v| row_value(&p.variables, index, v));
    let assignment = p
      .variables
      .iter()
      .map(|v| format!("{}={}", v.symbol(), letter(row_value(&p.variables, index, *v))))
      .collect::<Vec<_>>()
      .join(", ");
    trace.push(
      format!("row {}: {} gives {} = {}", index + 1, assignment, p.expr.render(), letter(value)),
      StepValue::Row { index, value },
    );
    answer.push(letter(value));
  }
  Solution { answer, trace }
}

fn flip(code: &str, positions: &[usize]) -> String {
  code
    .chars()
    .enumerate()
    .map(|(i, c)| if positions.contains(&i) { if c == 'V' { 'F' } else { 'V' } } else { c })
    .collect()
}

/// Error model: converse conditional, and/or confusion, full complement, then
/// bit flips whose count changes after every collision.
pub fn distractors(p: &TruthTableParams, answer: &str, rng: &mut RandomSource, k: usize) -> Vec<String> {
  let mut candidates = Vec::new();
  if p.expr.contains(Connective::Implies) {
    candidates.push(table_code(&p.variables, &p.expr.converse()));
  }
  if p.expr.contains(Connective::And) || p.expr.contains(Connective::Or) {
    candidates.push(table_code(&p.variables, &p.expr.swap_and_or()));
  }
  candidates.push(flip(answer, &(0..answer.len()).collect::<Vec<_>>()));

  let mut set = DistractorSet::new(answer, k);
  set.offer_shuffled(candidates, rng);

  let len = answer.len();
  let mut flips = 1usize;
  for _ in 0..JITTER_TRIES {
    if set.is_full() || len == 0 {
      break;
    }
    let positions: Vec<usize> = rand::seq::index::sample(rng, len, flips.min(len)).into_vec();
    if !set.offer(flip(answer, &positions)) {
      flips = if flips >= 2 { 1 } else { 2 };
    }
  }

  for i in 0..len {
    if set.is_full() {
      break;
    }
    set.offer(flip(answer, &[i]));
  }
  for i in 0..len {
    for j in i + 1..len {
      if set.is_full() {
        return set.into_values();
      }
      set.offer(flip(answer, &[i, j]));
    }
  }
  set.into_values()
}
