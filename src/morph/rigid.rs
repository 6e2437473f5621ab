//! Two-phase rigid alignment between the drawings.
//!
//! ## Fit
//!
//! The best affine map `q ~ A (p - c) + a + c` from the initial to the final
//! drawing is found by least squares, where `c` is the initial centroid. Both
//! drawings are first expressed relative to `c` and divided by the initial RMS
//! radius so the singularity threshold does not depend on the drawing's scale.
//! The normal equations are 3x3 (two linear coefficients plus one translation
//! per output row) and are solved with Cramer's rule.
//!
//! ## Motion
//!
//! `A` is split into a rotation `R(theta)` and a stretch `S` (see
//! [`polar_decompose`]). Phase one turns by `t * theta` while blending the
//! stretch from identity to `S` and sliding by `t * a`, all about `c`. Phase two
//! blends the phase-one endpoint straight into the final drawing.

use super::error::MorphError;
use super::geometry::{polar_decompose, Mat2};
use super::types::Point;

/// Smallest normal-equation determinant accepted for the fit
const SINGULAR_DETERMINANT: f64 = 1e-9;

/// Precomputed rigid motion between two point sets
#[derive(Debug, Clone, PartialEq)]
pub struct RigidModel {
    center: Point,
    linear: Mat2,
    translation: Point,
    rotation: f64,
    stretch: Mat2,
}

impl RigidModel {
    /// Fit the affine map taking `from[i]` to `to[i]`
    pub fn fit(from: &[Point], to: &[Point]) -> Result<Self, MorphError> {
        let count = from.len().min(to.len());
        let (from, to) = (&from[..count], &to[..count]);
        let Some(center) = Point::centroid(from.iter().copied()) else {
            return Err(MorphError::SingularAlignment { determinant: 0.0 });
        };
        let scale = (from.iter().map(|&p| (p - center).dot(p - center)).sum::<f64>() / count as f64).sqrt();
        if scale == 0.0 || !scale.is_finite() {
            return Err(MorphError::SingularAlignment { determinant: 0.0 });
        }

        let (mut sxx, mut sxy, mut syy, mut sx, mut sy) = (0.0, 0.0, 0.0, 0.0, 0.0);
        let (mut rhs_x, mut rhs_y) = ([0.0; 3], [0.0; 3]);
        for (&p, &q) in from.iter().zip(to) {
            let u = (p - center) * (1.0 / scale);
            let v = (q - center) * (1.0 / scale);
            sxx += u.x * u.x;
            sxy += u.x * u.y;
            syy += u.y * u.y;
            sx += u.x;
            sy += u.y;
            rhs_x[0] += u.x * v.x;
            rhs_x[1] += u.y * v.x;
            rhs_x[2] += v.x;
            rhs_y[0] += u.x * v.y;
            rhs_y[1] += u.y * v.y;
            rhs_y[2] += v.y;
        }
        let normal = [[sxx, sxy, sx], [sxy, syy, sy], [sx, sy, count as f64]];
        let determinant = det3(&normal);
        if determinant.abs() <= SINGULAR_DETERMINANT {
            return Err(MorphError::SingularAlignment { determinant });
        }

        let [a11, a12, b1] = cramer(&normal, rhs_x, determinant);
        let [a21, a22, b2] = cramer(&normal, rhs_y, determinant);
        let linear = Mat2::new(a11, a12, a21, a22);
        let (rotation, stretch) = polar_decompose(&linear);

        Ok(Self {
            center,
            linear,
            translation: Point::new(b1, b2) * scale,
            rotation,
            stretch,
        })
    }

    /// Centroid of the initial drawing
    pub fn center(&self) -> Point {
        self.center
    }

    /// Linear part of the best-fit affine map
    pub fn linear(&self) -> Mat2 {
        self.linear
    }

    pub fn translation(&self) -> Point {
        self.translation
    }

    /// Rotation angle of the polar decomposition, radians
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    pub fn stretch(&self) -> Mat2 {
        self.stretch
    }

    /// Position of `p` after phase one at fraction `t`
    pub fn phase_one(&self, p: Point, t: f64) -> Point {
        let blend = Mat2::IDENTITY.lerp(&self.stretch, t);
        let turned = Mat2::rotation(t * self.rotation).mul(&blend);
        turned.apply(p - self.center) + self.translation * t + self.center
    }

    /// Where phase one leaves `p`
    pub fn endpoint(&self, p: Point) -> Point {
        self.phase_one(p, 1.0)
    }

    /// Position of `p` after phase two at fraction `t`, ending at `q`
    pub fn phase_two(&self, p: Point, q: Point, t: f64) -> Point {
        self.endpoint(p).lerp(q, t)
    }

    /// Both phases over the whole motion, split at `t = 1/2`
    pub fn positions(&self, from: &[Point], to: &[Point], t: f64) -> Vec<Point> {
        if t <= 0.5 {
            from.iter().map(|&p| self.phase_one(p, 2.0 * t)).collect()
        } else {
            from.iter()
                .zip(to)
                .map(|(&p, &q)| self.phase_two(p, q, 2.0 * t - 1.0))
                .collect()
        }
    }
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

fn cramer(m: &[[f64; 3]; 3], rhs: [f64; 3], determinant: f64) -> [f64; 3] {
    let mut solution = [0.0; 3];
    for (column, value) in solution.iter_mut().enumerate() {
        let mut replaced = *m;
        for row in 0..3 {
            replaced[row][column] = rhs[row];
        }
        *value = det3(&replaced) / determinant;
    }
    solution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn assert_close(a: Point, b: Point) {
        assert!(a.distance(b) < 1e-9, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_fit_recovers_rotation_and_translation() {
        let from = pts(&[(0.0, 0.0), (4.0, 0.0), (4.0, 2.0), (0.0, 3.0)]);
        let turn = Mat2::rotation(0.5);
        let offset = Point::new(7.0, -3.0);
        let to: Vec<Point> = from.iter().map(|&p| turn.apply(p) + offset).collect();

        let model = RigidModel::fit(&from, &to).unwrap();
        assert!((model.rotation() - 0.5).abs() < 1e-9);
        for (a, b) in [
            (model.stretch().a11, 1.0),
            (model.stretch().a12, 0.0),
            (model.stretch().a21, 0.0),
            (model.stretch().a22, 1.0),
        ] {
            assert!((a - b).abs() < 1e-9);
        }
        for (&p, &q) in from.iter().zip(&to) {
            assert_close(model.endpoint(p), q);
        }
    }

    #[test]
    fn test_phases_meet_at_midpoint_and_ends() {
        let from = pts(&[(0.0, 0.0), (10.0, 0.0), (5.0, 10.0), (3.0, 2.0)]);
        let to = pts(&[(1.0, 1.0), (1.0, 12.0), (-9.0, 6.0), (-2.0, 4.0)]);
        let model = RigidModel::fit(&from, &to).unwrap();

        for (a, b) in model.positions(&from, &to, 0.0).into_iter().zip(&from) {
            assert_close(a, *b);
        }
        let before = model.positions(&from, &to, 0.5);
        let after = model.positions(&from, &to, 0.5 + 1e-12);
        for (a, b) in before.into_iter().zip(after) {
            assert!(a.distance(b) < 1e-6);
        }
        for (a, b) in model.positions(&from, &to, 1.0).into_iter().zip(&to) {
            assert_close(a, *b);
        }
    }

    #[test]
    fn test_collinear_nodes_are_singular() {
        let from = pts(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)]);
        let to = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert!(matches!(
            RigidModel::fit(&from, &to),
            Err(MorphError::SingularAlignment { .. })
        ));
    }

    #[test]
    fn test_too_few_nodes_are_singular() {
        assert!(RigidModel::fit(&[], &[]).is_err());
        let single = pts(&[(3.0, 4.0)]);
        assert!(RigidModel::fit(&single, &single).is_err());
    }
}
