//! Clip-or-split polygon triangulation
//!
//! The polygon is a cyclic list of slots into a point arena. Each step looks at
//! the leftmost slot `v` and its ring neighbours. If no other slot lies inside
//! the triangle `(next, v, prev)` or on one of its sides, the corner is clipped
//! and the diagonal `(next, prev)` is recorded. Otherwise the leftmost slot `w`
//! found there splits the polygon along `(v, w)` and both halves are
//! triangulated on their own.
//!
//! The angle-sum test loses points that sit exactly on a side, where one angle
//! is a straight angle and `acos` is least precise, so sides are checked
//! separately.
//!
//! A node that a face visits twice gives two slots at the same point. Only the
//! slot whose interior corner opens towards `v` may take the split.
//!
//! The topology is decided from one drawing and replayed over the same slots
//! in the other.

use std::f64::consts::TAU;

use super::geometry::{inside_triangle, on_segment, signed_area2};
use super::types::{Point, Triangle};

/// A diagonal between two slots of the polygon's point arena
pub type Diagonal = (usize, usize);

/// Diagonals and triangles of one polygon, both over arena slots
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PolygonTriangulation {
    pub diagonals: Vec<Diagonal>,
    /// Triangles in the winding direction of the input ring
    pub triangles: Vec<Triangle>,
}

impl PolygonTriangulation {
    /// True when every triangle has the same non-zero winding in `from` and `to`
    pub fn preserves_orientation(&self, from: &[Point], to: &[Point]) -> bool {
        self.triangles.iter().all(|&[a, b, c]| {
            let before = (from[b] - from[a]).cross(from[c] - from[a]);
            let after = (to[b] - to[a]).cross(to[c] - to[a]);
            before != 0.0 && after != 0.0 && before.signum() == after.signum()
        })
    }
}

/// Triangulate a simple polygon into `n - 3` diagonals and `n - 2` triangles
///
/// `ring` holds indices into `points`, in boundary order. Rings of three or
/// fewer slots produce no diagonals.
pub fn triangulate_polygon(ring: &[usize], points: &[Point], tolerance: f64) -> PolygonTriangulation {
    let mut out = PolygonTriangulation {
        diagonals: Vec::with_capacity(ring.len().saturating_sub(3)),
        triangles: Vec::with_capacity(ring.len().saturating_sub(2)),
    };
    let outline: Vec<Point> = ring.iter().map(|&slot| points[slot]).collect();
    let counter_clockwise = signed_area2(&outline) >= 0.0;
    clip_or_split(ring.to_vec(), points, tolerance, counter_clockwise, &mut out);
    out
}

/// Whether `target` lies strictly inside the interior corner at `apex`
fn opens_towards(apex: Point, next: Point, prev: Point, target: Point, counter_clockwise: bool) -> bool {
    let (from, to) = if counter_clockwise {
        (next - apex, prev - apex)
    } else {
        (prev - apex, next - apex)
    };
    let toward = target - apex;
    if from.length() == 0.0 || to.length() == 0.0 || toward.length() == 0.0 {
        return true;
    }
    let sweep = |v: Point| from.cross(v).atan2(from.dot(v)).rem_euclid(TAU);
    let span = match sweep(to) {
        s if s == 0.0 => TAU,
        s => s,
    };
    let angle = sweep(toward);
    angle > 0.0 && angle < span
}

fn clip_or_split(
    mut ring: Vec<usize>,
    points: &[Point],
    tolerance: f64,
    counter_clockwise: bool,
    out: &mut PolygonTriangulation,
) {
    while ring.len() > 3 {
        let n = ring.len();
        let k = leftmost(&ring, points);
        let v = ring[k];
        let prev = ring[(k + n - 1) % n];
        let next = ring[(k + 1) % n];

        let blocker = ring
            .iter()
            .enumerate()
            .filter(|&(_, &w)| w != v && w != prev && w != next)
            .filter(|&(_, &w)| in_ear(points[w], [points[next], points[v], points[prev]], tolerance))
            .filter(|&(j, &w)| {
                let w_prev = ring[(j + n - 1) % n];
                let w_next = ring[(j + 1) % n];
                opens_towards(
                    points[w],
                    points[w_next],
                    points[w_prev],
                    points[v],
                    counter_clockwise,
                )
            })
            .min_by(|a, b| points[*a.1].x.total_cmp(&points[*b.1].x));

        match blocker {
            None => {
                out.diagonals.push((next, prev));
                out.triangles.push([prev, v, next]);
                ring.remove(k);
            }
            Some((j, &w)) => {
                out.diagonals.push((v, w));
                let (first, second) = split_ring(&ring, k, j);
                clip_or_split(first, points, tolerance, counter_clockwise, out);
                clip_or_split(second, points, tolerance, counter_clockwise, out);
                return;
            }
        }
    }
    if let &[a, b, c] = ring.as_slice() {
        out.triangles.push([a, b, c]);
    }
}

/// Whether `p` is inside the ear triangle or on one of its sides
fn in_ear(p: Point, [a, b, c]: [Point; 3], tolerance: f64) -> bool {
    inside_triangle(p, a, b, c, tolerance)
        || on_segment(p, a, b, tolerance)
        || on_segment(p, b, c, tolerance)
        || on_segment(p, c, a, tolerance)
}

/// Position of the slot with minimum x, first in ring order on ties
fn leftmost(ring: &[usize], points: &[Point]) -> usize {
    let mut best = 0;
    for (i, &slot) in ring.iter().enumerate().skip(1) {
        if points[slot].x < points[ring[best]].x {
            best = i;
        }
    }
    best
}

/// The two boundary arcs `a..=b` and `b..=a` of a cyclic ring
fn split_ring(ring: &[usize], a: usize, b: usize) -> (Vec<usize>, Vec<usize>) {
    let n = ring.len();
    let arc = |from: usize, to: usize| {
        let len = (to + n - from) % n + 1;
        (0..len).map(|step| ring[(from + step) % n]).collect::<Vec<_>>()
    };
    (arc(a, b), arc(b, a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::morph::geometry::segments_cross;

    fn points(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn key(d: Diagonal) -> (usize, usize) {
        (d.0.min(d.1), d.0.max(d.1))
    }

    fn assert_valid_triangulation(ring: &[usize], pts: &[Point], result: &PolygonTriangulation) {
        let diagonals = &result.diagonals;
        assert_eq!(diagonals.len(), ring.len() - 3);
        assert_eq!(result.triangles.len(), ring.len() - 2);
        // every triangle winds like the ring
        let ring_pts: Vec<Point> = ring.iter().map(|&i| pts[i]).collect();
        let winding = crate::morph::geometry::signed_area2(&ring_pts).signum();
        for &[a, b, c] in &result.triangles {
            let area = (pts[b] - pts[a]).cross(pts[c] - pts[a]);
            assert_eq!(area.signum(), winding);
        }
        let n = ring.len();
        let sides: Vec<(usize, usize)> = (0..n).map(|i| (ring[i], ring[(i + 1) % n])).collect();
        for &(a, b) in diagonals {
            assert!(!sides.iter().any(|&s| key(s) == key((a, b))), "diagonal is a side");
            for &(c, d) in sides.iter().chain(diagonals.iter()) {
                if [a, b].contains(&c) || [a, b].contains(&d) {
                    continue;
                }
                assert!(
                    !segments_cross(pts[a], pts[b], pts[c], pts[d]),
                    "diagonal {}-{} crosses {}-{}",
                    a,
                    b,
                    c,
                    d
                );
            }
        }
    }

    #[test]
    fn test_triangle_has_no_diagonals() {
        let pts = points(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]);
        let result = triangulate_polygon(&[0, 1, 2], &pts, 1e-9);
        assert!(result.diagonals.is_empty());
        assert_eq!(result.triangles, vec![[0, 1, 2]]);
    }

    #[test]
    fn test_square_clips_leftmost_ear() {
        let pts = points(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let result = triangulate_polygon(&[0, 1, 2, 3], &pts, 1e-9);
        assert_eq!(result.diagonals, vec![(1, 3)]);
        assert_eq!(result.triangles, vec![[3, 0, 1], [1, 2, 3]]);
    }

    #[test]
    fn test_split_on_vertex_inside_ear() {
        // slot 2 sits inside the triangle at the leftmost corner
        let pts = points(&[(0.0, 0.0), (6.0, -3.0), (2.0, 0.0), (6.0, 3.0)]);
        let result = triangulate_polygon(&[0, 1, 2, 3], &pts, 1e-9);
        assert_eq!(result.diagonals, vec![(0, 2)]);
        assert_eq!(result.triangles, vec![[0, 1, 2], [2, 3, 0]]);
    }

    #[test]
    fn test_split_on_vertex_on_ear_side() {
        // slot 3 sits exactly on the diagonal (1, 5) of the leftmost ear
        let pts = points(&[
            (0.0, 0.0),
            (10.0, -10.0),
            (20.0, -10.0),
            (10.0, 0.0),
            (20.0, 10.0),
            (10.0, 10.0),
        ]);
        let ring: Vec<usize> = (0..pts.len()).collect();
        let result = triangulate_polygon(&ring, &pts, 1e-9);
        assert_eq!(result.diagonals, vec![(0, 3), (1, 3), (3, 5)]);
        assert_valid_triangulation(&ring, &pts, &result);
        for &(a, b) in &result.diagonals {
            assert!(!ring.iter().any(|&s| on_segment(pts[s], pts[a], pts[b], 1e-9)));
        }
    }

    #[test]
    fn test_diagonal_never_runs_through_slot() {
        // tilted drawing where the slot on the diagonal is off the axes
        let pts = points(&[
            (0.0, 10.0),
            (5.0, 5.0),
            (20.0, 0.0),
            (10.0, 10.0),
            (30.0, 15.0),
            (30.0, 30.0),
        ]);
        let ring: Vec<usize> = (0..pts.len()).collect();
        let result = triangulate_polygon(&ring, &pts, 1e-9);
        assert!(!result.diagonals.contains(&(1, 5)));
        assert_valid_triangulation(&ring, &pts, &result);
        for &(a, b) in &result.diagonals {
            assert!(!ring.iter().any(|&s| on_segment(pts[s], pts[a], pts[b], 1e-9)));
        }
    }

    #[test]
    fn test_reflex_polygon() {
        let pts = points(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (6.0, 10.0),
            (6.0, 3.0),
            (4.0, 3.0),
            (4.0, 10.0),
            (0.0, 10.0),
        ]);
        let ring: Vec<usize> = (0..pts.len()).collect();
        let result = triangulate_polygon(&ring, &pts, 1e-9);
        assert_valid_triangulation(&ring, &pts, &result);
    }

    #[test]
    fn test_split_picks_the_copy_facing_the_corner() {
        // square frame around a triangle hole, joined by a slit from slot 1
        let pts = points(&[
            (0.0, 0.0),
            (-20.0, -20.0),
            (30.0, -20.0),
            (30.0, 30.0),
            (-20.0, 30.0),
            (-20.0, -20.0),
            (0.0, 0.0),
            (5.0, 10.0),
            (10.0, 0.0),
        ]);
        let ring: Vec<usize> = (0..pts.len()).collect();
        let result = triangulate_polygon(&ring, &pts, 1e-9);
        assert_eq!(result.diagonals.len(), 6);
        assert!(result.diagonals.contains(&(4, 6)));
        assert!(!result.diagonals.contains(&(4, 0)));
    }

    #[test]
    fn test_ring_over_sparse_arena() {
        let pts = points(&[
            (50.0, 50.0),
            (0.0, 0.0),
            (9.0, 9.0),
            (4.0, 0.0),
            (4.0, 4.0),
            (2.0, 6.0),
            (0.0, 4.0),
        ]);
        let ring = [1, 3, 4, 5, 6];
        let result = triangulate_polygon(&ring, &pts, 1e-9);
        assert_valid_triangulation(&ring, &pts, &result);
        assert!(result.diagonals.iter().all(|&(a, b)| ring.contains(&a) && ring.contains(&b)));
    }
}
