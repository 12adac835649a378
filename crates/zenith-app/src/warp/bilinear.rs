use glam::Vec2;

/// Control-point grid in unit space. An untouched grid is the identity
/// mapping; dragging interior points bends the surface between them.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlGrid {
    cols: usize,
    rows: usize,
    points: Vec<Vec2>,
}

impl ControlGrid {
    pub const MIN_DIM: usize = 2;
    pub const MAX_DIM: usize = 8;

    /// Uniformly spaced grid (identity mapping).
    pub fn uniform(cols: usize, rows: usize) -> Self {
        let cols = cols.clamp(Self::MIN_DIM, Self::MAX_DIM);
        let rows = rows.clamp(Self::MIN_DIM, Self::MAX_DIM);
        let mut points = Vec::with_capacity(cols * rows);
        for r in 0..rows {
            for c in 0..cols {
                points.push(Vec2::new(
                    c as f32 / (cols - 1) as f32,
                    r as f32 / (rows - 1) as f32,
                ));
            }
        }
        Self { cols, rows, points }
    }

    /// Rebuild from raw points; falls back to uniform when the count is wrong.
    pub fn from_points(cols: usize, rows: usize, points: Vec<Vec2>) -> Self {
        let cols = cols.clamp(Self::MIN_DIM, Self::MAX_DIM);
        let rows = rows.clamp(Self::MIN_DIM, Self::MAX_DIM);
        if points.len() != cols * rows {
            return Self::uniform(cols, rows);
        }
        Self { cols, rows, points }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn points(&self) -> &[Vec2] {
        &self.points
    }

    pub fn point(&self, c: usize, r: usize) -> Vec2 {
        self.points[r * self.cols + c]
    }

    pub fn set_point(&mut self, c: usize, r: usize, p: Vec2) {
        self.points[r * self.cols + c] = p;
    }

    /// Bilinear interpolation of the grid at (u, v) in [0,1]^2.
    pub fn eval(&self, u: f32, v: f32) -> Vec2 {
        let u = u.clamp(0.0, 1.0);
        let v = v.clamp(0.0, 1.0);
        let fx = u * (self.cols - 1) as f32;
        let fy = v * (self.rows - 1) as f32;
        let c0 = (fx as usize).min(self.cols - 2);
        let r0 = (fy as usize).min(self.rows - 2);
        let tx = fx - c0 as f32;
        let ty = fy - r0 as f32;

        let p00 = self.point(c0, r0);
        let p10 = self.point(c0 + 1, r0);
        let p01 = self.point(c0, r0 + 1);
        let p11 = self.point(c0 + 1, r0 + 1);

        let top = p00.lerp(p10, tx);
        let bottom = p01.lerp(p11, tx);
        top.lerp(bottom, ty)
    }

    /// Change the grid resolution, resampling the current surface so the
    /// warp shape is preserved as closely as bilinear sampling allows.
    pub fn set_resolution(&mut self, cols: usize, rows: usize) {
        let cols = cols.clamp(Self::MIN_DIM, Self::MAX_DIM);
        let rows = rows.clamp(Self::MIN_DIM, Self::MAX_DIM);
        if cols == self.cols && rows == self.rows {
            return;
        }
        let mut points = Vec::with_capacity(cols * rows);
        for r in 0..rows {
            for c in 0..cols {
                let u = c as f32 / (cols - 1) as f32;
                let v = r as f32 / (rows - 1) as f32;
                points.push(self.eval(u, v));
            }
        }
        *self = Self { cols, rows, points };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec2, b: Vec2) -> bool {
        (a - b).length() < 1e-5
    }

    #[test]
    fn uniform_grid_is_identity() {
        let g = ControlGrid::uniform(4, 3);
        for (u, v) in [(0.0, 0.0), (1.0, 1.0), (0.5, 0.5), (0.3, 0.7)] {
            assert!(close(g.eval(u, v), Vec2::new(u, v)), "at ({u},{v})");
        }
    }

    #[test]
    fn moved_point_bends_surface() {
        let mut g = ControlGrid::uniform(3, 3);
        g.set_point(1, 1, Vec2::new(0.6, 0.4));
        // Center of the grid now sits at the displaced point.
        assert!(close(g.eval(0.5, 0.5), Vec2::new(0.6, 0.4)));
        // Corners are untouched.
        assert!(close(g.eval(0.0, 0.0), Vec2::ZERO));
        assert!(close(g.eval(1.0, 1.0), Vec2::ONE));
    }

    #[test]
    fn eval_clamps_out_of_range() {
        let g = ControlGrid::uniform(2, 2);
        assert!(close(g.eval(-0.5, 2.0), Vec2::new(0.0, 1.0)));
    }

    #[test]
    fn resolution_change_preserves_shape() {
        let mut g = ControlGrid::uniform(3, 3);
        g.set_point(1, 1, Vec2::new(0.7, 0.3));

        // 5x5 keeps the old grid lines as sample sites, so the displaced
        // center survives exactly.
        let mut odd = g.clone();
        odd.set_resolution(5, 5);
        assert!(close(odd.eval(0.0, 0.0), Vec2::ZERO));
        assert!(close(odd.eval(1.0, 1.0), Vec2::ONE));
        assert!(close(odd.eval(0.5, 0.5), Vec2::new(0.7, 0.3)));

        // 5x4 has no row at v=0.5; the resample flattens the bump a little
        // but corners stay pinned and the center stays nearby.
        g.set_resolution(5, 4);
        assert_eq!(g.cols(), 5);
        assert_eq!(g.rows(), 4);
        assert!(close(g.eval(0.0, 0.0), Vec2::ZERO));
        assert!(close(g.eval(1.0, 1.0), Vec2::ONE));
        assert!((g.eval(0.5, 0.5) - Vec2::new(0.7, 0.3)).length() < 0.2);
    }

    #[test]
    fn resolution_clamped_to_bounds() {
        let mut g = ControlGrid::uniform(3, 3);
        g.set_resolution(100, 1);
        assert_eq!(g.cols(), ControlGrid::MAX_DIM);
        assert_eq!(g.rows(), ControlGrid::MIN_DIM);
    }

    #[test]
    fn bad_point_count_falls_back_to_uniform() {
        let g = ControlGrid::from_points(3, 3, vec![Vec2::ZERO; 5]);
        assert_eq!(g.points().len(), 9);
        assert!(close(g.eval(0.5, 0.5), Vec2::new(0.5, 0.5)));
    }
}
