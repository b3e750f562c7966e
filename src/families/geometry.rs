//! Plane vector arithmetic and the four classical triangle centers.

use std::ops::{Add, Mul, Sub};

const EPS: f64 = 1e-9;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec2 {
  pub x: f64,
  pub y: f64,
}

impl Vec2 {
  pub fn new(x: f64, y: f64) -> Self {
    Self { x, y }
  }

  pub fn dot(self, o: Vec2) -> f64 {
    self.x * o.x + self.y * o.y
  }

  /// z-component of the 3D cross product.
  pub fn cross(self, o: Vec2) -> f64 {
    self.x * o.y - self.y * o.x
  }

  pub fn length(self) -> f64 {
    self.dot(self).sqrt()
  }

  /// Rotated a quarter turn counter-clockwise.
  pub fn perp(self) -> Vec2 {
    Vec2::new(-self.y, self.x)
  }

  pub fn distance(self, o: Vec2) -> f64 {
    (self - o).length()
  }

  pub fn midpoint(self, o: Vec2) -> Vec2 {
    (self + o) * 0.5
  }
}

impl Add for Vec2 {
  type Output = Vec2;
  fn add(self, o: Vec2) -> Vec2 {
    Vec2::new(self.x + o.x, self.y + o.y)
  }
}

impl Sub for Vec2 {
  type Output = Vec2;
  fn sub(self, o: Vec2) -> Vec2 {
    Vec2::new(self.x - o.x, self.y - o.y)
  }
}

impl Mul<f64> for Vec2 {
  type Output = Vec2;
  fn mul(self, k: f64) -> Vec2 {
    Vec2::new(self.x * k, self.y * k)
  }
}

/// Parametric line `point + t * direction`.
#[derive(Clone, Copy, Debug)]
pub struct Line {
  pub point: Vec2,
  pub direction: Vec2,
}

impl Line {
  pub fn through(a: Vec2, b: Vec2) -> Self {
    Self { point: a, direction: b - a }
  }

  /// Perpendicular bisector of segment `ab`.
  pub fn bisector(a: Vec2, b: Vec2) -> Self {
    Self { point: a.midpoint(b), direction: (b - a).perp() }
  }

  /// None for parallel lines.
  pub fn intersect(&self, other: &Line) -> Option<Vec2> {
    let denom = self.direction.cross(other.direction);
    if denom.abs() < EPS {
      return None;
    }
    let t = (other.point - self.point).cross(other.direction) / denom;
    Some(self.point + self.direction * t)
  }
}

/// Orthogonal projection of `p` onto the line through `a` and `b`.
pub fn foot(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
  let d = b - a;
  let len2 = d.dot(d);
  if len2 < EPS {
    return a;
  }
  a + d * ((p - a).dot(d) / len2)
}

pub fn signed_area(a: Vec2, b: Vec2, c: Vec2) -> f64 {
  (b - a).cross(c - a) / 2.0
}

/// Interior angle at `at`, in degrees.
pub fn angle_deg(at: Vec2, b: Vec2, c: Vec2) -> f64 {
  let (u, v) = (b - at, c - at);
  let denom = u.length() * v.length();
  if denom < EPS {
    return 0.0;
  }
  (u.dot(v) / denom).clamp(-1.0, 1.0).acos().to_degrees()
}

pub fn centroid(a: Vec2, b: Vec2, c: Vec2) -> Vec2 {
  (a + b + c) * (1.0 / 3.0)
}

/// Vertices weighted by the length of the opposite side.
pub fn incenter(a: Vec2, b: Vec2, c: Vec2) -> Option<Vec2> {
  let (la, lb, lc) = (b.distance(c), c.distance(a), a.distance(b));
  let perimeter = la + lb + lc;
  if perimeter < EPS {
    return None;
  }
  Some((a * la + b * lb + c * lc) * (1.0 / perimeter))
}

pub fn circumcenter(a: Vec2, b: Vec2, c: Vec2) -> Option<Vec2> {
  Line::bisector(a, b).intersect(&Line::bisector(a, c))
}

/// Intersection of the altitudes from `a` and `b`, each drawn to its foot.
pub fn orthocenter(a: Vec2, b: Vec2, c: Vec2) -> Option<Vec2> {
  Line::through(a, foot(a, b, c)).intersect(&Line::through(b, foot(b, c, a)))
}

fn clean(v: f64) -> f64 {
  let r = (v * 100.0).round() / 100.0;
  if r == 0.0 { 0.0 } else { r }
}

/// Canonical `(x, y)` rendering with two decimals; `-0.00` prints as `0.00`.
pub fn format_point(x: f64, y: f64) -> String {
  format!("({:.2}, {:.2})", clean(x), clean(y))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tri() -> (Vec2, Vec2, Vec2) {
    (Vec2::new(0.0, 0.0), Vec2::new(6.0, 0.0), Vec2::new(1.0, 4.0))
  }

  #[test]
  fn centers_of_reference_triangle() {
    let (a, b, c) = tri();
    let g = centroid(a, b, c);
    assert_eq!(format_point(g.x, g.y), "(2.33, 1.33)");
    let o = circumcenter(a, b, c).unwrap();
    assert!(o.distance(Vec2::new(3.0, 1.375)) < 1e-9);
    let h = orthocenter(a, b, c).unwrap();
    assert_eq!(format_point(h.x, h.y), "(1.00, 1.25)");
    let i = incenter(a, b, c).unwrap();
    assert!((i.x - 1.86).abs() < 0.01 && (i.y - 1.45).abs() < 0.01);
  }

  #[test]
  fn euler_line_relation_holds() {
    let (a, b, c) = (Vec2::new(-3.0, 1.0), Vec2::new(5.0, -2.0), Vec2::new(2.0, 7.0));
    let g = centroid(a, b, c);
    let o = circumcenter(a, b, c).unwrap();
    let h = orthocenter(a, b, c).unwrap();
    // H = 3G - 2O
    let expected = g * 3.0 - o * 2.0;
    assert!(h.distance(expected) < 1e-9);
  }

  #[test]
  fn parallel_lines_do_not_intersect() {
    let l1 = Line::through(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0));
    let l2 = Line::through(Vec2::new(0.0, 1.0), Vec2::new(1.0, 2.0));
    assert!(l1.intersect(&l2).is_none());
    assert!(circumcenter(Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)).is_none());
  }

  #[test]
  fn negative_zero_is_normalized() {
    assert_eq!(format_point(-0.001, 2.0), "(0.00, 2.00)");
  }
}
