//! Geometry primitives shared by the triangulation and the motion models.
//!
//! ## Conventions
//!
//! Angles are in radians. Rotations follow the usual counter-clockwise matrix
//! convention in a Y-up frame; drawn on a Y-down canvas they appear clockwise,
//! which changes nothing for the morph since both drawings share the frame.
//!
//! Crossing tests are strict: segments that only touch at an endpoint, or that
//! are parallel or collinear, do not cross.

use std::f64::consts::TAU;

use super::types::Point;

/// Parameters `(s, r)` at which two open segments strictly cross
///
/// The crossing point is `p1 + s (p2 - p1) == p3 + r (p4 - p3)` with both
/// parameters strictly inside `(0, 1)`. Parallel and collinear segments yield
/// `None`.
pub fn crossing_parameters(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<(f64, f64)> {
    let d1 = p2 - p1;
    let d2 = p4 - p3;
    let mut area = d1.cross(d2);
    if area == 0.0 {
        return None;
    }
    let w = p3 - p1;
    let mut u = w.cross(d2);
    let mut v = w.cross(d1);
    if area < 0.0 {
        area = -area;
        u = -u;
        v = -v;
    }
    if 0.0 < u && u < area && 0.0 < v && v < area {
        Some((u / area, v / area))
    } else {
        None
    }
}

/// True iff the open segments `p1-p2` and `p3-p4` strictly intersect
pub fn segments_cross(p1: Point, p2: Point, p3: Point, p4: Point) -> bool {
    crossing_parameters(p1, p2, p3, p4).is_some()
}

/// Unsigned angle `a - center - b` in `[0, pi]`
///
/// Returns `NaN` when either arm has zero length.
pub fn angle_at(center: Point, a: Point, b: Point) -> f64 {
    let u = a - center;
    let v = b - center;
    let lengths = u.length() * v.length();
    if lengths == 0.0 {
        return f64::NAN;
    }
    (u.dot(v) / lengths).clamp(-1.0, 1.0).acos()
}

/// Angle-sum point-in-triangle test
///
/// `p` is inside (or on an edge of) triangle `abc` when the three angles it
/// subtends sum to a full turn. A point on a corner is never inside.
pub fn inside_triangle(p: Point, a: Point, b: Point, c: Point, tolerance: f64) -> bool {
    let sum = angle_at(p, a, b) + angle_at(p, b, c) + angle_at(p, c, a);
    (sum - TAU).abs() <= tolerance
}

/// True when `p` lies on the open segment `a-b`
///
/// `tolerance` bounds the sine of the angle between `p - a` and `b - a`, so the
/// test does not depend on the drawing's scale. The end points themselves are
/// not on the segment.
pub fn on_segment(p: Point, a: Point, b: Point, tolerance: f64) -> bool {
    let d = b - a;
    let w = p - a;
    let along = w.dot(d);
    if along <= 0.0 || along >= d.dot(d) {
        return false;
    }
    d.cross(w).abs() <= tolerance * d.length() * w.length()
}

/// Twice the signed area of a closed polygon, positive when counter-clockwise
pub fn signed_area2(points: &[Point]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| points[i].cross(points[(i + 1) % n]))
        .sum()
}

/// True when the closed polygon turns the same way at every corner, with no
/// straight or degenerate corner, and winds exactly once
pub fn is_strictly_convex(points: &[Point]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0;
    let mut turning = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let c = points[(i + 2) % n];
        let incoming = b - a;
        let outgoing = c - b;
        let turn = incoming.cross(outgoing);
        if turn == 0.0 || incoming.length() == 0.0 || outgoing.length() == 0.0 {
            return false;
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return false;
        }
        turning += turn.atan2(incoming.dot(outgoing));
    }
    (turning.abs() - TAU).abs() < 1e-6
}

/// A 2x2 matrix, row-major
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat2 {
    pub a11: f64,
    pub a12: f64,
    pub a21: f64,
    pub a22: f64,
}

impl Mat2 {
    pub const IDENTITY: Mat2 = Mat2::new(1.0, 0.0, 0.0, 1.0);

    pub const fn new(a11: f64, a12: f64, a21: f64, a22: f64) -> Self {
        Self { a11, a12, a21, a22 }
    }

    /// Counter-clockwise rotation by `theta`
    pub fn rotation(theta: f64) -> Self {
        let (sin, cos) = theta.sin_cos();
        Mat2::new(cos, -sin, sin, cos)
    }

    pub fn determinant(&self) -> f64 {
        self.a11 * self.a22 - self.a12 * self.a21
    }

    pub fn mul(&self, other: &Mat2) -> Mat2 {
        Mat2::new(
            self.a11 * other.a11 + self.a12 * other.a21,
            self.a11 * other.a12 + self.a12 * other.a22,
            self.a21 * other.a11 + self.a22 * other.a21,
            self.a21 * other.a12 + self.a22 * other.a22,
        )
    }

    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.a11 * p.x + self.a12 * p.y,
            self.a21 * p.x + self.a22 * p.y,
        )
    }

    /// Entry-wise blend from `self` (t = 0) to `other` (t = 1)
    pub fn lerp(&self, other: &Mat2, t: f64) -> Mat2 {
        let mix = |a: f64, b: f64| a + (b - a) * t;
        Mat2::new(
            mix(self.a11, other.a11),
            mix(self.a12, other.a12),
            mix(self.a21, other.a21),
            mix(self.a22, other.a22),
        )
    }
}

/// Split a linear map into a rotation angle and a residual stretch
///
/// Returns `(theta, S)` with `rotation(theta) * S == a`. For a reflection
/// (negative determinant) the residual carries the sign. A vanishing matrix
/// gets `theta = 0`.
pub fn polar_decompose(a: &Mat2) -> (f64, Mat2) {
    let sign = if a.determinant() < 0.0 { -1.0 } else { 1.0 };
    let q11 = a.a11 + sign * a.a22;
    let q12 = a.a12 - sign * a.a21;
    let q21 = a.a21 - sign * a.a12;
    let norm = q11.hypot(q12);
    let theta = if norm <= f64::EPSILON {
        0.0
    } else {
        (q21 / norm).atan2(q11 / norm)
    };
    let stretch = Mat2::rotation(-theta).mul(a);
    (theta, stretch)
}
