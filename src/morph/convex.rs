//! Convex-combination interpolation (Tutte embedding with Floater weights)
//!
//! Every interior node is written as a convex combination of its neighbours,
//! once per endpoint drawing. At fraction `t` the two weight sets are blended,
//! the boundary ring is placed by interpolating radius and angle about its
//! centroid, and the interior is solved for one axis at a time.

use std::f64::consts::TAU;

use log::debug;

use super::error::MorphError;
use super::geometry::{angle_at, signed_area2};
use super::types::{BoundaryRing, GraphPair, Point};

/// Normalised shape-preserving weights of `center`'s neighbours
///
/// Neighbours are taken in angular order. The weight of neighbour `j` is
/// `(tan(a_prev / 2) + tan(a_next / 2)) / |p_j - p_center|`, where `a_prev` and
/// `a_next` are the angles to its angular predecessor and successor. Falls back
/// to uniform weights when the formula degenerates.
pub fn floater_weights(center: usize, neighbors: &[usize], positions: &[Point]) -> Vec<(usize, f64)> {
    let origin = positions[center];
    let mut ring: Vec<usize> = neighbors.to_vec();
    ring.sort_by(|&a, &b| {
        let da = positions[a] - origin;
        let db = positions[b] - origin;
        da.y.atan2(da.x).total_cmp(&db.y.atan2(db.x))
    });
    let degree = ring.len();
    if degree == 0 {
        return Vec::new();
    }

    let uniform = || ring.iter().map(|&j| (j, 1.0 / degree as f64)).collect::<Vec<_>>();
    if degree == 1 {
        return uniform();
    }

    let gaps: Vec<f64> = (0..degree)
        .map(|k| angle_at(origin, positions[ring[k]], positions[ring[(k + 1) % degree]]))
        .collect();
    let raw: Vec<f64> = (0..degree)
        .map(|k| {
            let before = gaps[(k + degree - 1) % degree];
            let after = gaps[k];
            let distance = origin.distance(positions[ring[k]]);
            ((before / 2.0).tan() + (after / 2.0).tan()) / distance
        })
        .collect();

    let total: f64 = raw.iter().sum();
    if !total.is_finite() || total <= 0.0 || raw.iter().any(|w| !w.is_finite() || *w < 0.0) {
        return uniform();
    }
    ring.into_iter().zip(raw).map(|(j, w)| (j, w / total)).collect()
}

/// Solve `matrix * x = rhs` by Gaussian elimination without row exchanges
pub fn solve_linear_system(
    mut matrix: Vec<Vec<f64>>,
    mut rhs: Vec<f64>,
    pivot_epsilon: f64,
) -> Result<Vec<f64>, MorphError> {
    let n = rhs.len();
    if n == 0 {
        return Err(MorphError::linear_system("the system has no unknowns"));
    }
    if matrix.len() != n || matrix.iter().any(|row| row.len() != n) {
        return Err(MorphError::linear_system(format!(
            "matrix shape does not match {} unknowns",
            n
        )));
    }

    for k in 0..n {
        let pivot = matrix[k][k];
        if !pivot.is_finite() || pivot.abs() < pivot_epsilon {
            return Err(MorphError::linear_system(format!(
                "pivot {} is {:e}",
                k, pivot
            )));
        }
        for i in k + 1..n {
            let factor = matrix[i][k] / pivot;
            if factor == 0.0 {
                continue;
            }
            for j in k..n {
                matrix[i][j] -= factor * matrix[k][j];
            }
            rhs[i] -= factor * rhs[k];
        }
    }

    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let tail: f64 = (i + 1..n).map(|j| matrix[i][j] * x[j]).sum();
        x[i] = (rhs[i] - tail) / matrix[i][i];
    }
    Ok(x)
}

/// Radius/angle placement of the boundary in one drawing
#[derive(Debug, Clone, PartialEq)]
struct PolarBoundary {
    center: Point,
    radii: Vec<f64>,
    angles: Vec<f64>,
}

impl PolarBoundary {
    fn new(points: &[Point]) -> Self {
        let center = Point::centroid(points.iter().copied()).unwrap_or_default();
        let counter_clockwise = signed_area2(points) >= 0.0;
        let radii = points.iter().map(|&p| center.distance(p)).collect();

        let mut angles: Vec<f64> = Vec::with_capacity(points.len());
        for &p in points {
            let d = p - center;
            let raw = d.y.atan2(d.x);
            let unwrapped = match angles.last() {
                None => raw,
                Some(&previous) if counter_clockwise => previous + (raw - previous).rem_euclid(TAU),
                Some(&previous) => previous - (previous - raw).rem_euclid(TAU),
            };
            angles.push(unwrapped);
        }
        Self {
            center,
            radii,
            angles,
        }
    }

    /// Shift every angle by whole turns so the first lands within `pi` of `reference`
    fn align_to(&mut self, reference: f64) {
        let Some(&first) = self.angles.first() else {
            return;
        };
        let turns = ((reference - first) / TAU).round();
        if turns != 0.0 {
            for angle in &mut self.angles {
                *angle += turns * TAU;
            }
        }
    }
}

/// Precomputed convex-combination motion over a triangulated pair
#[derive(Debug, Clone)]
pub struct ConvexModel {
    weights: [Vec<Vec<f64>>; 2],
    boundary: Vec<usize>,
    interior: Vec<usize>,
    polar: [PolarBoundary; 2],
    node_count: usize,
    pivot_epsilon: f64,
}

impl ConvexModel {
    /// Precompute both weight matrices and the polar boundary of a pair
    ///
    /// The ring nodes are interpolated directly; every other node is solved for.
    /// A `boundary_count` other than the ring length is rejected.
    pub fn new(
        pair: &GraphPair,
        ring: &BoundaryRing,
        boundary_count: Option<usize>,
        pivot_epsilon: f64,
    ) -> Result<Self, MorphError> {
        let n = pair.node_count();
        let boundary = ring.select(boundary_count)?.to_vec();
        let interior: Vec<usize> = (0..n).filter(|i| !boundary.contains(i)).collect();
        let adjacency = pair.adjacency();

        let drawings = [pair.initial().positions(), pair.target().positions()];
        let weights = drawings.clone().map(|positions| {
            let mut matrix = vec![vec![0.0; n]; n];
            for &i in &interior {
                for (j, w) in floater_weights(i, &adjacency[i], &positions) {
                    matrix[i][j] = w;
                }
            }
            matrix
        });

        let boundary_points = |positions: &[Point]| -> Vec<Point> {
            boundary.iter().map(|&b| positions[b]).collect()
        };
        let start = PolarBoundary::new(&boundary_points(&drawings[0]));
        let mut end = PolarBoundary::new(&boundary_points(&drawings[1]));
        if let Some(&reference) = start.angles.first() {
            end.align_to(reference);
        }

        debug!(
            "convex model over {} nodes ({} boundary, {} interior)",
            n,
            boundary.len(),
            interior.len()
        );
        Ok(Self {
            weights,
            boundary,
            interior,
            polar: [start, end],
            node_count: n,
            pivot_epsilon,
        })
    }

    pub fn boundary(&self) -> &[usize] {
        &self.boundary
    }

    pub fn interior(&self) -> &[usize] {
        &self.interior
    }

    /// Dense weight matrix of one endpoint drawing (0 = initial, 1 = final)
    pub fn weights(&self, drawing: usize) -> &[Vec<f64>] {
        &self.weights[drawing]
    }

    /// Boundary position at fraction `t`, by polar interpolation
    fn boundary_position(&self, slot: usize, t: f64) -> Point {
        let [start, end] = &self.polar;
        let center = start.center.lerp(end.center, t);
        let radius = start.radii[slot] + (end.radii[slot] - start.radii[slot]) * t;
        let angle = start.angles[slot] + (end.angles[slot] - start.angles[slot]) * t;
        center + Point::new(angle.cos(), angle.sin()) * radius
    }

    /// Positions of every node at fraction `t`
    pub fn positions(&self, t: f64) -> Result<Vec<Point>, MorphError> {
        if self.boundary.len() < 3 {
            return Err(MorphError::linear_system(format!(
                "a convex boundary needs at least 3 nodes, found {}",
                self.boundary.len()
            )));
        }
        let mut positions = vec![Point::default(); self.node_count];
        for (slot, &b) in self.boundary.iter().enumerate() {
            positions[b] = self.boundary_position(slot, t);
        }
        if self.interior.is_empty() {
            return Ok(positions);
        }

        let mut row_of = vec![usize::MAX; self.node_count];
        for (row, &i) in self.interior.iter().enumerate() {
            row_of[i] = row;
        }
        let m = self.interior.len();
        let mut matrix = vec![vec![0.0; m]; m];
        let mut rhs_x = vec![0.0; m];
        let mut rhs_y = vec![0.0; m];
        for (row, &i) in self.interior.iter().enumerate() {
            matrix[row][row] = 1.0;
            let mut total = 0.0;
            for j in 0..self.node_count {
                let w = (1.0 - t) * self.weights[0][i][j] + t * self.weights[1][i][j];
                if w == 0.0 {
                    continue;
                }
                total += w;
                if row_of[j] == usize::MAX {
                    rhs_x[row] += w * positions[j].x;
                    rhs_y[row] += w * positions[j].y;
                } else {
                    matrix[row][row_of[j]] -= w;
                }
            }
            if total == 0.0 {
                return Err(MorphError::linear_system(format!(
                    "interior node {} has no neighbours",
                    i
                )));
            }
        }

        let xs = solve_linear_system(matrix.clone(), rhs_x, self.pivot_epsilon)?;
        let ys = solve_linear_system(matrix, rhs_y, self.pivot_epsilon)?;
        for (row, &i) in self.interior.iter().enumerate() {
            positions[i] = Point::new(xs[row], ys[row]);
        }
        Ok(positions)
    }
}
