use glam::{Mat3, Vec2, Vec3};

/// Projective mapping from the unit square onto an arbitrary quad, solved
/// with Heckbert's adjugate formulation. Corners are ordered
/// (0,0) → q0, (1,0) → q1, (1,1) → q2, (0,1) → q3.
#[derive(Debug, Clone, Copy)]
pub struct Homography {
    fwd: Mat3,
    inv: Mat3,
}

impl Homography {
    pub fn from_quad(q: [Vec2; 4]) -> Self {
        let fwd = square_to_quad(q);
        let inv = fwd.inverse();
        Self { fwd, inv }
    }

    /// Map a unit-square point into the destination quad.
    pub fn map(&self, p: Vec2) -> Vec2 {
        project(self.fwd, p)
    }

    /// Map a destination point back into the unit square.
    pub fn unmap(&self, p: Vec2) -> Vec2 {
        project(self.inv, p)
    }
}

fn project(m: Mat3, p: Vec2) -> Vec2 {
    let v = m * Vec3::new(p.x, p.y, 1.0);
    if v.z.abs() < 1e-10 {
        Vec2::new(v.x, v.y)
    } else {
        Vec2::new(v.x / v.z, v.y / v.z)
    }
}

/// Build the 3x3 matrix taking the unit square to `q`.
fn square_to_quad(q: [Vec2; 4]) -> Mat3 {
    let s = q[0] - q[1] + q[2] - q[3];

    if s.length_squared() < 1e-12 {
        // Parallelogram: plain affine transform.
        let a = q[1] - q[0];
        let b = q[3] - q[0];
        return Mat3::from_cols(
            Vec3::new(a.x, a.y, 0.0),
            Vec3::new(b.x, b.y, 0.0),
            Vec3::new(q[0].x, q[0].y, 1.0),
        );
    }

    let d1 = q[1] - q[2];
    let d2 = q[3] - q[2];
    let den = d1.x * d2.y - d1.y * d2.x;
    if den.abs() < 1e-12 {
        // Degenerate quad; fall back to affine so map() stays finite.
        let a = q[1] - q[0];
        let b = q[3] - q[0];
        return Mat3::from_cols(
            Vec3::new(a.x, a.y, 0.0),
            Vec3::new(b.x, b.y, 0.0),
            Vec3::new(q[0].x, q[0].y, 1.0),
        );
    }

    let g = (s.x * d2.y - s.y * d2.x) / den;
    let h = (d1.x * s.y - d1.y * s.x) / den;
    let a = q[1] - q[0] + g * q[1];
    let b = q[3] - q[0] + h * q[3];

    Mat3::from_cols(
        Vec3::new(a.x, a.y, g),
        Vec3::new(b.x, b.y, h),
        Vec3::new(q[0].x, q[0].y, 1.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn identity_quad_is_identity() {
        let h = Homography::from_quad([
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ]);
        assert!(close(h.map(Vec2::new(0.5, 0.5)), Vec2::new(0.5, 0.5)));
        assert!(close(h.map(Vec2::new(0.25, 0.75)), Vec2::new(0.25, 0.75)));
    }

    #[test]
    fn corners_map_exactly() {
        let quad = [
            Vec2::new(0.1, 0.2),
            Vec2::new(0.9, 0.1),
            Vec2::new(0.8, 0.95),
            Vec2::new(0.05, 0.8),
        ];
        let h = Homography::from_quad(quad);
        let unit = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        for (u, q) in unit.iter().zip(quad.iter()) {
            assert!(close(h.map(*u), *q), "corner {u:?} mapped to {:?}", h.map(*u));
        }
    }

    #[test]
    fn unmap_inverts_map() {
        let quad = [
            Vec2::new(-0.2, 0.1),
            Vec2::new(1.3, -0.1),
            Vec2::new(1.1, 1.2),
            Vec2::new(0.0, 0.9),
        ];
        let h = Homography::from_quad(quad);
        for p in [
            Vec2::new(0.5, 0.5),
            Vec2::new(0.1, 0.9),
            Vec2::new(0.8, 0.2),
        ] {
            assert!(close(h.unmap(h.map(p)), p));
        }
    }

    #[test]
    fn parallelogram_uses_affine() {
        // Translated unit square (s == 0).
        let quad = [
            Vec2::new(0.2, 0.3),
            Vec2::new(1.2, 0.3),
            Vec2::new(1.2, 1.3),
            Vec2::new(0.2, 1.3),
        ];
        let h = Homography::from_quad(quad);
        assert!(close(h.map(Vec2::new(0.5, 0.5)), Vec2::new(0.7, 0.8)));
    }

    #[test]
    fn degenerate_quad_stays_finite() {
        // All corners collinear.
        let quad = [
            Vec2::new(0.0, 0.0),
            Vec2::new(0.5, 0.5),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.25, 0.25),
        ];
        let h = Homography::from_quad(quad);
        let p = h.map(Vec2::new(0.5, 0.5));
        assert!(p.x.is_finite() && p.y.is_finite());
    }
}
