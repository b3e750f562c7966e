//! Hand-verified fallback instances, one per family.
//!
//! Served when rejection sampling exhausts its retry cap, so `generate`
//! always has something correct to return.

use crate::domain::{FamilyId, Params};
use crate::families::addition::AdditionParams;
use crate::families::fraction::FractionParams;
use crate::families::subtraction::SubtractionParams;
use crate::families::triangle::{CenterKind, GridPoint, TriangleParams};
use crate::families::truth_table::{Connective, Expr, TruthTableParams, Var};

/// 586 + 479 = 1065, three carries.
pub fn fallback_addition() -> AdditionParams {
  AdditionParams { augend: 586, addend: 479 }
}

/// 723 − 458 = 265, two borrows.
pub fn fallback_subtraction() -> SubtractionParams {
  SubtractionParams { minuend: 723, subtrahend: 458 }
}

/// (p → q) = VFVV.
pub fn fallback_truth_table() -> TruthTableParams {
  TruthTableParams {
    variables: vec![Var::P, Var::Q],
    expr: Expr::binary(Connective::Implies, Expr::var(Var::P), Expr::var(Var::Q)),
  }
}

/// Centroid of (0,0), (6,0), (1,4) = (2.33, 1.33).
pub fn fallback_triangle() -> TriangleParams {
  TriangleParams {
    vertices: [GridPoint::new(0, 0), GridPoint::new(6, 0), GridPoint::new(1, 4)],
    target: CenterKind::Centroid,
  }
}

/// 12/18 = 2/3.
pub fn fallback_fraction() -> FractionParams {
  FractionParams { numerator: 12, denominator: 18 }
}

pub fn fallback_params(family: FamilyId) -> Params {
  match family {
    FamilyId::CarriedAddition => Params::Addition(fallback_addition()),
    FamilyId::BorrowSubtraction => Params::Subtraction(fallback_subtraction()),
    FamilyId::TruthTable => Params::TruthTable(fallback_truth_table()),
    FamilyId::TriangleCenters => Params::Triangle(fallback_triangle()),
    FamilyId::FractionSimplification => Params::Fraction(fallback_fraction()),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::families::solve;

  #[test]
  fn fallbacks_have_documented_answers() {
    let cases = [
      (FamilyId::CarriedAddition, "1065"),
      (FamilyId::BorrowSubtraction, "265"),
      (FamilyId::TruthTable, "VFVV"),
      (FamilyId::TriangleCenters, "(2.33, 1.33)"),
      (FamilyId::FractionSimplification, "2/3"),
    ];
    for (family, answer) in cases {
      let sol = solve(&fallback_params(family));
      assert_eq!(sol.answer, answer);
      assert_eq!(sol.trace.replay().as_deref(), Some(answer));
    }
  }
}
