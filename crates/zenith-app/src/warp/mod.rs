pub mod bilinear;
pub mod editor;
pub mod persist;
pub mod perspective;
pub mod renderer;

use glam::Vec2;

use bilinear::ControlGrid;
use perspective::Homography;

/// Geometric correction family. `Perspective` is the 4-corner homography;
/// `PerspectiveBilinear` adds an interior control-point grid inside the
/// homography frame and is the default for new warps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarpMode {
    Perspective,
    PerspectiveBilinear,
}

/// Normalized source sub-rectangle of the input texture (split-screen).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SrcRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl SrcRect {
    pub const FULL: SrcRect = SrcRect {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    pub fn lerp(&self, u: f32, v: f32) -> Vec2 {
        Vec2::new(
            self.min.x + (self.max.x - self.min.x) * u,
            self.min.y + (self.max.y - self.min.y) * v,
        )
    }
}

/// One warp: a mapping from a source texture region onto a destination
/// screen quad. All coordinates are normalized (0..1 of the window), so a
/// window resize needs no point rescaling.
#[derive(Debug, Clone)]
pub struct Warp {
    pub mode: WarpMode,
    pub corners: [Vec2; 4],
    pub grid: ControlGrid,
    pub brightness: f32,
    pub src_rect: SrcRect,
}

/// Mesh subdivision used when rendering a warp.
pub const MESH_RES_X: u32 = 32;
pub const MESH_RES_Y: u32 = 24;

impl Default for Warp {
    fn default() -> Self {
        Self {
            mode: WarpMode::PerspectiveBilinear,
            corners: [
                Vec2::new(0.0, 0.0),
                Vec2::new(1.0, 0.0),
                Vec2::new(1.0, 1.0),
                Vec2::new(0.0, 1.0),
            ],
            grid: ControlGrid::uniform(4, 4),
            brightness: 1.0,
            src_rect: SrcRect::FULL,
        }
    }
}

impl Warp {
    pub fn homography(&self) -> Homography {
        Homography::from_quad(self.corners)
    }

    /// Map a unit-square point to its destination position (normalized).
    pub fn map_unit(&self, u: f32, v: f32) -> Vec2 {
        let h = self.homography();
        match self.mode {
            WarpMode::Perspective => h.map(Vec2::new(u, v)),
            WarpMode::PerspectiveBilinear => h.map(self.grid.eval(u, v)),
        }
    }

    /// All editable handles in destination space: the 4 perspective corners
    /// first, then (for bilinear warps) every grid point that is not a grid
    /// corner, since those coincide with the perspective handles.
    pub fn handles(&self) -> Vec<Vec2> {
        let mut out: Vec<Vec2> = self.corners.to_vec();
        if self.mode == WarpMode::PerspectiveBilinear {
            let h = self.homography();
            let (cols, rows) = (self.grid.cols(), self.grid.rows());
            for r in 0..rows {
                for c in 0..cols {
                    if (c == 0 || c == cols - 1) && (r == 0 || r == rows - 1) {
                        continue;
                    }
                    out.push(h.map(self.grid.point(c, r)));
                }
            }
        }
        out
    }

    /// Move handle `index` (as enumerated by `handles()`) to `pos`
    /// (normalized destination coordinates).
    pub fn set_handle(&mut self, index: usize, pos: Vec2) {
        if index < 4 {
            self.corners[index] = pos;
            return;
        }
        if self.mode != WarpMode::PerspectiveBilinear {
            return;
        }
        let h = self.homography();
        let (cols, rows) = (self.grid.cols(), self.grid.rows());
        let mut i = 4;
        for r in 0..rows {
            for c in 0..cols {
                if (c == 0 || c == cols - 1) && (r == 0 || r == rows - 1) {
                    continue;
                }
                if i == index {
                    self.grid.set_point(c, r, h.unmap(pos));
                    return;
                }
                i += 1;
            }
        }
    }

    pub fn handle_count(&self) -> usize {
        match self.mode {
            WarpMode::Perspective => 4,
            WarpMode::PerspectiveBilinear => {
                4 + self.grid.cols() * self.grid.rows() - 4
            }
        }
    }

    /// Switching modes keeps the corners; the grid resets to identity so a
    /// plain perspective warp looks unchanged.
    pub fn set_mode(&mut self, mode: WarpMode) {
        if mode != self.mode {
            self.mode = mode;
            self.grid = ControlGrid::uniform(self.grid.cols(), self.grid.rows());
        }
    }
}

/// Which half of the source each warp samples when split-screen is active.
#[derive(Debug, Clone, Copy, Default)]
pub struct SplitState {
    pub vertical: bool,
    pub horizontal: bool,
}

/// Ordered warp list owned by the application.
pub struct WarpList {
    pub warps: Vec<Warp>,
    pub split: SplitState,
    /// Bumped whenever geometry changes so the renderer knows to re-upload.
    pub generation: u64,
}

impl WarpList {
    /// Two default bilinear warps, used when no warps.xml exists.
    pub fn default_pair() -> Self {
        Self {
            warps: vec![Warp::default(), Warp::default()],
            split: SplitState::default(),
            generation: 0,
        }
    }

    pub fn from_warps(warps: Vec<Warp>) -> Self {
        Self {
            warps,
            split: SplitState::default(),
            generation: 0,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    /// Window resized: points are stored normalized, so only derived meshes
    /// need rebuilding.
    pub fn handle_resize(&mut self) {
        self.mark_dirty();
    }

    pub fn toggle_split_vertical(&mut self) {
        self.split.vertical = !self.split.vertical;
        self.apply_split();
    }

    pub fn toggle_split_horizontal(&mut self) {
        self.split.horizontal = !self.split.horizontal;
        self.apply_split();
    }

    pub fn reset_split(&mut self) {
        self.split = SplitState::default();
        self.apply_split();
    }

    /// Assign per-warp source rectangles: even-indexed warps take the
    /// left/top half, odd-indexed the right/bottom, per active split axes.
    pub fn apply_split(&mut self) {
        for (i, warp) in self.warps.iter_mut().enumerate() {
            let first = i % 2 == 0;
            let (x0, x1) = if self.split.vertical {
                if first { (0.0, 0.5) } else { (0.5, 1.0) }
            } else {
                (0.0, 1.0)
            };
            let (y0, y1) = if self.split.horizontal {
                if first { (0.0, 0.5) } else { (0.5, 1.0) }
            } else {
                (0.0, 1.0)
            };
            warp.src_rect = SrcRect {
                min: Vec2::new(x0, y0),
                max: Vec2::new(x1, y1),
            };
        }
        self.mark_dirty();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_warp_is_fullscreen_identity() {
        let w = Warp::default();
        let p = w.map_unit(0.5, 0.5);
        assert!((p - Vec2::new(0.5, 0.5)).length() < 1e-4);
        assert_eq!(w.src_rect, SrcRect::FULL);
    }

    #[test]
    fn handle_count_matches_handles_len() {
        let w = Warp::default();
        assert_eq!(w.handles().len(), w.handle_count());
        assert_eq!(w.handle_count(), 4 + 16 - 4);

        let mut p = Warp::default();
        p.set_mode(WarpMode::Perspective);
        assert_eq!(p.handles().len(), 4);
    }

    #[test]
    fn set_corner_handle_moves_corner() {
        let mut w = Warp::default();
        w.set_handle(2, Vec2::new(0.9, 0.8));
        assert_eq!(w.corners[2], Vec2::new(0.9, 0.8));
    }

    #[test]
    fn set_interior_handle_roundtrips() {
        let mut w = Warp::default();
        let target = Vec2::new(0.4, 0.6);
        // Handle 4 is the first non-corner grid point.
        w.set_handle(4, target);
        let moved = w.handles()[4];
        assert!((moved - target).length() < 1e-4);
    }

    #[test]
    fn split_vertical_assigns_halves() {
        let mut list = WarpList::default_pair();
        list.toggle_split_vertical();
        assert_eq!(list.warps[0].src_rect.max.x, 0.5);
        assert_eq!(list.warps[1].src_rect.min.x, 0.5);
        // Full height preserved.
        assert_eq!(list.warps[0].src_rect.max.y, 1.0);
    }

    #[test]
    fn split_both_assigns_quadrants() {
        let mut list = WarpList::default_pair();
        list.toggle_split_vertical();
        list.toggle_split_horizontal();
        assert_eq!(list.warps[0].src_rect.max, Vec2::new(0.5, 0.5));
        assert_eq!(list.warps[1].src_rect.min, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn reset_split_restores_full() {
        let mut list = WarpList::default_pair();
        list.toggle_split_vertical();
        list.reset_split();
        assert_eq!(list.warps[0].src_rect, SrcRect::FULL);
        assert_eq!(list.warps[1].src_rect, SrcRect::FULL);
    }

    #[test]
    fn resize_bumps_generation_only() {
        let mut list = WarpList::default_pair();
        let corners = list.warps[0].corners;
        let g = list.generation;
        list.handle_resize();
        assert_eq!(list.warps[0].corners, corners);
        assert_ne!(list.generation, g);
    }

    #[test]
    fn mode_switch_resets_grid() {
        let mut w = Warp::default();
        w.set_handle(4, Vec2::new(0.2, 0.2));
        w.set_mode(WarpMode::Perspective);
        w.set_mode(WarpMode::PerspectiveBilinear);
        // Grid is identity again.
        let p = w.map_unit(0.5, 0.5);
        assert!((p - Vec2::new(0.5, 0.5)).length() < 1e-4);
    }
}
