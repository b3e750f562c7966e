//! Triangle notable-point identification.
//!
//! The student is shown a triangle with integer vertices and asked for the
//! coordinates of one center. Distractors are the other centers, so the
//! quality filter insists that all four are well separated.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::geometry::{self, format_point, Line, Vec2};
use super::{DistractorSet, ProblemFamily};
use crate::domain::{FamilyId, Level, Params, Solution, StepValue, Trace, TraceStep};
use crate::random::RandomSource;
use crate::util::fill_template;

const PROMPT: &str = "Triangle A{a}, B{b}, C{c}: give the coordinates of its {target}";
const MIN_AREA: f64 = 3.0;
const MAX_ANGLE_DEG: f64 = 150.0;
const MIN_SEPARATION: f64 = 0.4;
const JITTER_TRIES: usize = 32;
const UNDEFINED: &str = "undefined";
/// Slack when checking a recorded step against its recomputation.
const REPLAY_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPoint {
  pub x: i32,
  pub y: i32,
}

impl GridPoint {
  pub fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }

  fn vec(self) -> Vec2 {
    Vec2::new(self.x as f64, self.y as f64)
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CenterKind {
  Centroid,
  Incenter,
  Circumcenter,
  Orthocenter,
}

impl CenterKind {
  pub const ALL: [CenterKind; 4] =
    [CenterKind::Centroid, CenterKind::Incenter, CenterKind::Circumcenter, CenterKind::Orthocenter];

  pub fn as_str(&self) -> &'static str {
    match self {
      CenterKind::Centroid => "centroid",
      CenterKind::Incenter => "incenter",
      CenterKind::Circumcenter => "circumcenter",
      CenterKind::Orthocenter => "orthocenter",
    }
  }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriangleParams {
  pub vertices: [GridPoint; 3],
  pub target: CenterKind,
}

impl TriangleParams {
  fn corners(&self) -> (Vec2, Vec2, Vec2) {
    (self.vertices[0].vec(), self.vertices[1].vec(), self.vertices[2].vec())
  }
}

pub struct TriangleCenters;

fn coordinate_range(level: Level) -> i32 {
  match level.get() {
    1 => 6,
    2 => 9,
    _ => 12,
  }
}

fn targets(level: Level) -> &'static [CenterKind] {
  match level.get() {
    1 => &[CenterKind::Centroid],
    2 => &[CenterKind::Centroid, CenterKind::Circumcenter],
    _ => &CenterKind::ALL,
  }
}

fn center_of(kind: CenterKind, a: Vec2, b: Vec2, c: Vec2) -> Option<Vec2> {
  match kind {
    CenterKind::Centroid => Some(geometry::centroid(a, b, c)),
    CenterKind::Incenter => geometry::incenter(a, b, c),
    CenterKind::Circumcenter => geometry::circumcenter(a, b, c),
    CenterKind::Orthocenter => geometry::orthocenter(a, b, c),
  }
}

impl ProblemFamily for TriangleCenters {
  type Params = TriangleParams;
  const ID: FamilyId = FamilyId::TriangleCenters;

  fn sample(rng: &mut RandomSource, level: Level) -> TriangleParams {
    let r = coordinate_range(level);
    let mut point = || GridPoint::new(rng.gen_range(-r..=r), rng.gen_range(-r..=r));
    let vertices = [point(), point(), point()];
    let target = *targets(level).choose(rng).unwrap_or(&CenterKind::Centroid);
    TriangleParams { vertices, target }
  }

  /// Rejects thin or obtuse-to-flat triangles and any triangle whose centers
  /// sit too close together or too far outside the drawing area.
  fn is_acceptable(p: &TriangleParams, level: Level) -> bool {
    if !targets(level).contains(&p.target) {
      return false;
    }
    let r = coordinate_range(level);
    if p.vertices.iter().any(|v| v.x.abs() > r || v.y.abs() > r) {
      return false;
    }
    let (a, b, c) = p.corners();
    if geometry::signed_area(a, b, c).abs() < MIN_AREA {
      return false;
    }
    let angles = [geometry::angle_deg(a, b, c), geometry::angle_deg(b, c, a), geometry::angle_deg(c, a, b)];
    if angles.iter().any(|&deg| deg >= MAX_ANGLE_DEG) {
      return false;
    }

    let mut centers = Vec::with_capacity(4);
    for kind in CenterKind::ALL {
      match center_of(kind, a, b, c) {
        Some(pt) => centers.push(pt),
        None => return false,
      }
    }
    let bound = 2.0 * r as f64;
    if centers.iter().any(|pt| pt.x.abs() > bound || pt.y.abs() > bound) {
      return false;
    }
    for i in 0..centers.len() {
      for j in i + 1..centers.len() {
        if centers[i].distance(centers[j]) < MIN_SEPARATION {
          return false;
        }
      }
    }
    true
  }

  fn fallback() -> TriangleParams {
    crate::seeds::fallback_triangle()
  }

  fn display(p: &TriangleParams) -> String {
    let fmt = |v: GridPoint| format!("({}, {})", v.x, v.y);
    fill_template(
      PROMPT,
      &[
        ("a", &fmt(p.vertices[0])),
        ("b", &fmt(p.vertices[1])),
        ("c", &fmt(p.vertices[2])),
        ("target", p.target.as_str()),
      ],
    )
  }

  fn wrap(p: TriangleParams) -> Params {
    Params::Triangle(p)
  }
}

fn point_step(trace: &mut Trace, operation: impl Into<String>, p: Vec2) {
  trace.push(operation, StepValue::Point { x: p.x, y: p.y });
}

fn undefined(mut trace: Trace, reason: &str) -> Solution {
  trace.push(reason, StepValue::Scalar { value: 0.0 });
  Solution { answer: UNDEFINED.to_string(), trace }
}

pub fn solve(p: &TriangleParams) -> Solution {
  let (a, b, c) = p.corners();
  let mut trace = Trace::default();
  for (label, v) in [("A", a), ("B", b), ("C", c)] {
    trace.push(label, StepValue::Vertex { x: v.x, y: v.y });
  }

  let result = match p.target {
    CenterKind::Centroid => {
      let sum = a + b + c;
      point_step(&mut trace, "A + B + C", sum);
      sum * (1.0 / 3.0)
    }
    CenterKind::Incenter => {
      let (la, lb, lc) = (b.distance(c), c.distance(a), a.distance(b));
      trace.push("a = |BC|", StepValue::Scalar { value: la });
      trace.push("b = |CA|", StepValue::Scalar { value: lb });
      trace.push("c = |AB|", StepValue::Scalar { value: lc });
      let perimeter = la + lb + lc;
      trace.push("a + b + c", StepValue::Scalar { value: perimeter });
      let weighted = a * la + b * lb + c * lc;
      point_step(&mut trace, "a·A + b·B + c·C", weighted);
      match geometry::incenter(a, b, c) {
        Some(i) => i,
        None => return undefined(trace, "perimeter is zero"),
      }
    }
    CenterKind::Circumcenter => {
      point_step(&mut trace, "midpoint of AB", a.midpoint(b));
      point_step(&mut trace, "midpoint of AC", a.midpoint(c));
      match geometry::circumcenter(a, b, c) {
        Some(o) => o,
        None => return undefined(trace, "bisectors are parallel: vertices are collinear"),
      }
    }
    CenterKind::Orthocenter => {
      point_step(&mut trace, "foot of the altitude from A on BC", geometry::foot(a, b, c));
      point_step(&mut trace, "foot of the altitude from B on CA", geometry::foot(b, c, a));
      match geometry::orthocenter(a, b, c) {
        Some(h) => h,
        None => return undefined(trace, "altitudes are parallel: vertices are collinear"),
      }
    }
  };

  let operation = match p.target {
    CenterKind::Centroid => "divide the vertex sum by 3",
    CenterKind::Incenter => "divide the weighted sum by a + b + c",
    CenterKind::Circumcenter => "intersect the perpendicular bisectors of AB and AC",
    CenterKind::Orthocenter => "intersect the altitudes from A and B",
  };
  trace.push(operation, StepValue::Center { target: p.target, x: result.x, y: result.y });
  Solution { answer: format_point(result.x, result.y), trace }
}

fn near(u: Vec2, v: Vec2) -> bool {
  u.distance(v) < REPLAY_TOLERANCE
}

/// Re-derives the center from a `solve` trace. Every intermediate value is
/// checked against the recorded vertices, then the center is rebuilt from the
/// intermediates with the construction `solve` used.
pub fn replay(steps: &[TraceStep]) -> Option<String> {
  let mut vertices: Vec<Vec2> = Vec::with_capacity(3);
  let mut points: Vec<Vec2> = Vec::new();
  let mut scalars: Vec<f64> = Vec::new();
  let mut center: Option<(CenterKind, Vec2)> = None;
  for step in steps {
    match step.value {
      StepValue::Vertex { x, y } if center.is_none() => vertices.push(Vec2::new(x, y)),
      StepValue::Point { x, y } if center.is_none() => points.push(Vec2::new(x, y)),
      StepValue::Scalar { value } if center.is_none() => scalars.push(value),
      StepValue::Center { target, x, y } if center.is_none() => center = Some((target, Vec2::new(x, y))),
      _ => return None,
    }
  }
  let &[a, b, c] = &vertices[..] else {
    return None;
  };
  let (target, recorded) = center?;

  let derived = match (target, &points[..], &scalars[..]) {
    (CenterKind::Centroid, &[sum], []) => {
      if !near(sum, a + b + c) {
        return None;
      }
      sum * (1.0 / 3.0)
    }
    (CenterKind::Incenter, &[weighted], &[la, lb, lc, perimeter]) => {
      let sides_match = [(la, b.distance(c)), (lb, c.distance(a)), (lc, a.distance(b)), (perimeter, la + lb + lc)]
        .iter()
        .all(|(got, want)| (got - want).abs() < REPLAY_TOLERANCE);
      if !sides_match || !near(weighted, a * la + b * lb + c * lc) || perimeter <= 0.0 {
        return None;
      }
      weighted * (1.0 / perimeter)
    }
    (CenterKind::Circumcenter, &[mid_ab, mid_ac], []) => {
      if !near(mid_ab, a.midpoint(b)) || !near(mid_ac, a.midpoint(c)) {
        return None;
      }
      let bisector_ab = Line { point: mid_ab, direction: (b - a).perp() };
      bisector_ab.intersect(&Line { point: mid_ac, direction: (c - a).perp() })?
    }
    (CenterKind::Orthocenter, &[foot_a, foot_b], []) => {
      if !near(foot_a, geometry::foot(a, b, c)) || !near(foot_b, geometry::foot(b, c, a)) {
        return None;
      }
      Line::through(a, foot_a).intersect(&Line::through(b, foot_b))?
    }
    _ => return None,
  };

  let answer = format_point(derived.x, derived.y);
  (answer == format_point(recorded.x, recorded.y)).then_some(answer)
}

/// Error model: the other three centers ("confuse incenter with centroid"
/// and friends), the midpoint of the longest side, then positional jitter.
pub fn distractors(p: &TriangleParams, answer: &str, rng: &mut RandomSource, k: usize) -> Vec<String> {
  let (a, b, c) = p.corners();
  let mut candidates: Vec<String> = CenterKind::ALL
    .iter()
    .filter(|kind| **kind != p.target)
    .filter_map(|kind| center_of(*kind, a, b, c))
    .map(|pt| format_point(pt.x, pt.y))
    .collect();

  let sides = [(a, b), (b, c), (c, a)];
  if let Some((u, v)) = sides
    .iter()
    .copied()
    .max_by(|(u1, v1), (u2, v2)| u1.distance(*v1).total_cmp(&u2.distance(*v2)))
  {
    let m = u.midpoint(v);
    candidates.push(format_point(m.x, m.y));
  }

  let mut set = DistractorSet::new(answer, k);
  set.offer_shuffled(candidates, rng);

  let target = center_of(p.target, a, b, c).unwrap_or_else(|| geometry::centroid(a, b, c));
  const MAGNITUDES: [f64; 3] = [1.0, 2.0, 0.5];
  let mut magnitude = 0usize;
  for _ in 0..JITTER_TRIES {
    if set.is_full() {
      break;
    }
    let step = MAGNITUDES[magnitude];
    let dx = step * rng.gen_range(-2..=2) as f64;
    let dy = step * rng.gen_range(-2..=2) as f64;
    if !set.offer(format_point(target.x + dx, target.y + dy)) {
      magnitude = (magnitude + 1) % MAGNITUDES.len();
    }
  }

  let mut shift = 1.0;
  while !set.is_full() {
    set.offer(format_point(target.x + shift, target.y));
    shift += 0.75;
  }
  set.into_values()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn reference(target: CenterKind) -> TriangleParams {
    TriangleParams { vertices: [GridPoint::new(0, 0), GridPoint::new(6, 0), GridPoint::new(1, 4)], target }
  }

  #[test]
  fn centroid_of_reference_triangle() {
    let sol = solve(&reference(CenterKind::Centroid));
    assert_eq!(sol.answer, "(2.33, 1.33)");
    assert_eq!(sol.trace.replay().as_deref(), Some("(2.33, 1.33)"));
  }

  #[test]
  fn orthocenter_trace_ends_at_answer() {
    let sol = solve(&reference(CenterKind::Orthocenter));
    assert_eq!(sol.answer, "(1.00, 1.25)");
    assert_eq!(sol.trace.steps.len(), 6);
    assert_eq!(sol.trace.replay(), Some(sol.answer.clone()));
  }

  #[test]
  fn every_center_replays_from_its_construction() {
    for kind in CenterKind::ALL {
      let sol = solve(&reference(kind));
      assert_eq!(sol.trace.replay(), Some(sol.answer.clone()), "{}", kind.as_str());
    }
  }

  #[test]
  fn replay_rejects_tampered_steps() {
    let centroid = solve(&reference(CenterKind::Centroid)).trace;
    let mut sum = centroid.clone();
    sum.steps[3].value = StepValue::Point { x: 9.0, y: 4.0 };
    assert_eq!(sum.replay(), None);
    let mut vertex = centroid.clone();
    vertex.steps[1].value = StepValue::Vertex { x: 5.0, y: 0.0 };
    assert_eq!(vertex.replay(), None);
    let mut answer = centroid;
    answer.steps[4].value = StepValue::Center { target: CenterKind::Centroid, x: 3.0, y: 1.0 };
    assert_eq!(answer.replay(), None);

    let mut side = solve(&reference(CenterKind::Incenter)).trace;
    side.steps[3].value = StepValue::Scalar { value: 4.0 };
    assert_eq!(side.replay(), None);

    let mut midpoint = solve(&reference(CenterKind::Circumcenter)).trace;
    midpoint.steps[4].value = StepValue::Point { x: 0.5, y: 1.0 };
    assert_eq!(midpoint.replay(), None);

    let mut foot = solve(&reference(CenterKind::Orthocenter)).trace;
    foot.steps[3].value = StepValue::Point { x: 2.0, y: 2.0 };
    assert_eq!(foot.replay(), None);
  }

  #[test]
  fn undefined_centers_do_not_replay() {
    let p = TriangleParams {
      vertices: [GridPoint::new(0, 0), GridPoint::new(2, 2), GridPoint::new(4, 4)],
      target: CenterKind::Orthocenter,
    };
    let sol = solve(&p);
    assert_eq!(sol.answer, "undefined");
    assert_eq!(sol.trace.replay(), None);
  }

  #[test]
  fn other_centers_are_offered_as_distractors() {
    let mut rng = RandomSource::seeded(12);
    let ds = distractors(&reference(CenterKind::Centroid), "(2.33, 1.33)", &mut rng, 3);
    assert_eq!(ds.len(), 3);
    assert!(!ds.contains(&"(2.33, 1.33)".to_string()));

    // Three of the four error-model candidates fill the set before any jitter.
    let expected: Vec<String> = [CenterKind::Incenter, CenterKind::Circumcenter, CenterKind::Orthocenter]
      .iter()
      .map(|kind| solve(&reference(*kind)).answer)
      .chain(std::iter::once("(3.50, 2.00)".to_string()))
      .collect();
    assert!(ds.iter().all(|d| expected.contains(d)), "{:?}", ds);
  }

  #[test]
  fn quality_filter_rejects_collinear_and_isoceles_like_shapes() {
    let collinear = TriangleParams {
      vertices: [GridPoint::new(0, 0), GridPoint::new(2, 2), GridPoint::new(4, 4)],
      target: CenterKind::Centroid,
    };
    assert!(!TriangleCenters::is_acceptable(&collinear, Level::new(1)));
    // Equilateral-ish: every center nearly coincides.
    let near_equilateral = TriangleParams {
      vertices: [GridPoint::new(-4, 0), GridPoint::new(4, 0), GridPoint::new(0, 7)],
      target: CenterKind::Centroid,
    };
    assert!(!TriangleCenters::is_acceptable(&near_equilateral, Level::new(1)));
    assert!(TriangleCenters::is_acceptable(&reference(CenterKind::Centroid), Level::new(1)));
    assert!(!TriangleCenters::is_acceptable(&reference(CenterKind::Incenter), Level::new(1)));
  }

  fn closest_centers(p: &TriangleParams) -> f64 {
    let (a, b, c) = p.corners();
    let centers: Vec<Vec2> = CenterKind::ALL.iter().filter_map(|kind| center_of(*kind, a, b, c)).collect();
    let mut closest = f64::INFINITY;
    for i in 0..centers.len() {
      for j in i + 1..centers.len() {
        closest = closest.min(centers[i].distance(centers[j]));
      }
    }
    closest
  }

  #[test]
  fn separation_threshold_sits_between_near_and_tight_triangles() {
    // Centroid and incenter of the reference triangle are 0.49 apart.
    let near = reference(CenterKind::Centroid);
    let gap = closest_centers(&near);
    assert!(gap > MIN_SEPARATION && gap < 0.5, "{gap}");
    assert!(TriangleCenters::is_acceptable(&near, Level::new(1)));

    // Right triangle: centroid and incenter 0.37 apart.
    let tight = TriangleParams {
      vertices: [GridPoint::new(0, 0), GridPoint::new(4, 0), GridPoint::new(0, 5)],
      target: CenterKind::Centroid,
    };
    let gap = closest_centers(&tight);
    assert!(gap > 0.3 && gap < MIN_SEPARATION, "{gap}");
    assert!(!TriangleCenters::is_acceptable(&tight, Level::new(1)));
  }

  #[test]
  fn collinear_vertices_have_no_circumcenter() {
    let p = TriangleParams {
      vertices: [GridPoint::new(0, 0), GridPoint::new(2, 2), GridPoint::new(4, 4)],
      target: CenterKind::Circumcenter,
    };
    assert_eq!(solve(&p).answer, "undefined");
  }
}
