use glam::Vec2;

use super::WarpList;

/// Pick radius around a handle, in physical pixels.
const HIT_RADIUS_PX: f32 = 16.0;

/// Arrow-key nudge distance in pixels (x10 with shift held).
const NUDGE_PX: f32 = 1.0;

/// Keys the editor responds to while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKey {
    Left,
    Right,
    Up,
    Down,
    Tab,
    GridMinus,
    GridPlus,
}

/// Interactive warp editing state. All mouse positions arrive in physical
/// pixels; handles live in normalized window space, so the editor carries
/// the window size for conversion.
pub struct WarpEditor {
    pub enabled: bool,
    /// (warp index, handle index)
    pub selected: Option<(usize, usize)>,
    pub hover: Option<(usize, usize)>,
    dragging: bool,
    window_size: Vec2,
}

impl WarpEditor {
    pub fn new() -> Self {
        Self {
            enabled: false,
            selected: None,
            hover: None,
            dragging: false,
            window_size: Vec2::new(1.0, 1.0),
        }
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
        if !self.enabled {
            self.selected = None;
            self.hover = None;
            self.dragging = false;
        }
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) {
        self.window_size = Vec2::new(width.max(1) as f32, height.max(1) as f32);
    }

    fn to_normalized(&self, px: Vec2) -> Vec2 {
        px / self.window_size
    }

    /// The panel can change a warp's mode or grid resolution out from under
    /// us, shrinking its handle count. Drop any selection or hover that no
    /// longer points at a live handle.
    fn sanitize(&mut self, warps: &WarpList) {
        let stale = |idx: &(usize, usize)| {
            warps
                .warps
                .get(idx.0)
                .is_none_or(|w| idx.1 >= w.handle_count())
        };
        if self.selected.as_ref().is_some_and(stale) {
            self.selected = None;
            self.dragging = false;
        }
        if self.hover.as_ref().is_some_and(stale) {
            self.hover = None;
        }
    }

    fn hit_test(&self, warps: &WarpList, px: Vec2) -> Option<(usize, usize)> {
        let mut best: Option<((usize, usize), f32)> = None;
        for (wi, warp) in warps.warps.iter().enumerate() {
            for (hi, handle) in warp.handles().iter().enumerate() {
                let handle_px = *handle * self.window_size;
                let d = (handle_px - px).length();
                if d <= HIT_RADIUS_PX && best.is_none_or(|(_, bd)| d < bd) {
                    best = Some(((wi, hi), d));
                }
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Returns true when the event was consumed (a handle was grabbed).
    pub fn mouse_down(&mut self, warps: &mut WarpList, px: Vec2) -> bool {
        if !self.enabled {
            return false;
        }
        match self.hit_test(warps, px) {
            Some(idx) => {
                self.selected = Some(idx);
                self.dragging = true;
                true
            }
            None => {
                self.dragging = false;
                false
            }
        }
    }

    /// Returns true while the editor owns the cursor (enabled), so mouse
    /// mirrors in the session do not fight with handle dragging.
    pub fn mouse_moved(&mut self, warps: &mut WarpList, px: Vec2) -> bool {
        if !self.enabled {
            return false;
        }
        self.sanitize(warps);
        if self.dragging {
            if let Some((wi, hi)) = self.selected {
                if let Some(warp) = warps.warps.get_mut(wi) {
                    warp.set_handle(hi, self.to_normalized(px));
                    warps.mark_dirty();
                }
            }
        } else {
            self.hover = self.hit_test(warps, px);
        }
        true
    }

    pub fn mouse_up(&mut self) {
        self.dragging = false;
    }

    /// Returns true when the key was consumed.
    pub fn key_down(&mut self, warps: &mut WarpList, key: EditorKey, shift: bool) -> bool {
        if !self.enabled {
            return false;
        }
        self.sanitize(warps);
        match key {
            EditorKey::Tab => {
                self.select_next(warps);
                true
            }
            EditorKey::Left | EditorKey::Right | EditorKey::Up | EditorKey::Down => {
                let step = if shift { NUDGE_PX * 10.0 } else { NUDGE_PX };
                let delta_px = match key {
                    EditorKey::Left => Vec2::new(-step, 0.0),
                    EditorKey::Right => Vec2::new(step, 0.0),
                    EditorKey::Up => Vec2::new(0.0, -step),
                    EditorKey::Down => Vec2::new(0.0, step),
                    _ => unreachable!(),
                };
                if let Some((wi, hi)) = self.selected {
                    if let Some(warp) = warps.warps.get_mut(wi) {
                        let pos = warp.handles()[hi] + delta_px / self.window_size;
                        warp.set_handle(hi, pos);
                        warps.mark_dirty();
                    }
                    true
                } else {
                    false
                }
            }
            EditorKey::GridMinus | EditorKey::GridPlus => {
                let delta: isize = if key == EditorKey::GridPlus { 1 } else { -1 };
                if let Some((wi, _)) = self.selected {
                    if let Some(warp) = warps.warps.get_mut(wi) {
                        let cols = warp.grid.cols().saturating_add_signed(delta);
                        let rows = warp.grid.rows().saturating_add_signed(delta);
                        warp.grid.set_resolution(cols, rows);
                        // Handle indices shifted with the grid.
                        self.selected = Some((wi, 0));
                        warps.mark_dirty();
                    }
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Cycle selection through every handle of every warp.
    fn select_next(&mut self, warps: &WarpList) {
        if warps.warps.is_empty() {
            return;
        }
        let next = match self.selected {
            None => (0, 0),
            Some((wi, hi)) => {
                let count = warps.warps[wi].handle_count();
                if hi + 1 < count {
                    (wi, hi + 1)
                } else {
                    ((wi + 1) % warps.warps.len(), 0)
                }
            }
        };
        self.selected = Some(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_1080p() -> WarpEditor {
        let mut e = WarpEditor::new();
        e.set_window_size(1920, 1080);
        e.enabled = true;
        e
    }

    #[test]
    fn disabled_editor_ignores_input() {
        let mut e = WarpEditor::new();
        e.set_window_size(1920, 1080);
        let mut warps = WarpList::default_pair();
        assert!(!e.mouse_down(&mut warps, Vec2::new(0.0, 0.0)));
        assert!(!e.mouse_moved(&mut warps, Vec2::new(10.0, 10.0)));
        assert!(!e.key_down(&mut warps, EditorKey::Tab, false));
    }

    #[test]
    fn click_near_corner_selects_it() {
        let mut e = editor_1080p();
        let mut warps = WarpList::default_pair();
        // Top-left corner of warp 0 is at pixel (0,0); click 5px away.
        assert!(e.mouse_down(&mut warps, Vec2::new(5.0, 5.0)));
        assert_eq!(e.selected.map(|(_, hi)| hi), Some(0));
    }

    #[test]
    fn click_far_from_handles_misses() {
        let mut e = editor_1080p();
        let mut warps = WarpList::default_pair();
        assert!(!e.mouse_down(&mut warps, Vec2::new(400.0, 200.0)));
        assert_eq!(e.selected, None);
    }

    #[test]
    fn drag_moves_selected_corner() {
        let mut e = editor_1080p();
        let mut warps = WarpList::default_pair();
        e.mouse_down(&mut warps, Vec2::new(2.0, 2.0));
        e.mouse_moved(&mut warps, Vec2::new(192.0, 108.0));
        e.mouse_up();
        let c = warps.warps[0].corners[0];
        assert!((c - Vec2::new(0.1, 0.1)).length() < 1e-4);
    }

    #[test]
    fn arrow_nudges_selected_handle() {
        let mut e = editor_1080p();
        let mut warps = WarpList::default_pair();
        e.mouse_down(&mut warps, Vec2::new(2.0, 2.0));
        e.mouse_up();
        assert!(e.key_down(&mut warps, EditorKey::Right, false));
        let c = warps.warps[0].corners[0];
        assert!((c.x - 1.0 / 1920.0).abs() < 1e-6);

        assert!(e.key_down(&mut warps, EditorKey::Down, true));
        let c = warps.warps[0].corners[0];
        assert!((c.y - 10.0 / 1080.0).abs() < 1e-6);
    }

    #[test]
    fn tab_cycles_across_warps() {
        let mut e = editor_1080p();
        let mut warps = WarpList::default_pair();
        let per_warp = warps.warps[0].handle_count();
        for _ in 0..=per_warp {
            e.key_down(&mut warps, EditorKey::Tab, false);
        }
        // After stepping past warp 0's handles, selection wraps to warp 1.
        assert_eq!(e.selected.map(|(wi, _)| wi), Some(1));
    }

    #[test]
    fn grid_plus_grows_resolution() {
        let mut e = editor_1080p();
        let mut warps = WarpList::default_pair();
        e.key_down(&mut warps, EditorKey::Tab, false);
        assert!(e.key_down(&mut warps, EditorKey::GridPlus, false));
        assert_eq!(warps.warps[0].grid.cols(), 5);
        assert_eq!(warps.warps[0].grid.rows(), 5);
    }

    #[test]
    fn mode_switch_drops_stale_selection() {
        use crate::warp::WarpMode;

        let mut e = editor_1080p();
        let mut warps = WarpList::default_pair();
        // Select a grid handle (index 4) on the bilinear warp.
        for _ in 0..5 {
            e.key_down(&mut warps, EditorKey::Tab, false);
        }
        assert_eq!(e.selected, Some((0, 4)));

        // Perspective mode only has the four corner handles.
        warps.warps[0].set_mode(WarpMode::Perspective);
        assert!(!e.key_down(&mut warps, EditorKey::Right, false));
        assert_eq!(e.selected, None);
    }

    #[test]
    fn toggle_off_clears_selection() {
        let mut e = editor_1080p();
        let mut warps = WarpList::default_pair();
        e.mouse_down(&mut warps, Vec2::new(2.0, 2.0));
        e.toggle();
        assert!(!e.enabled);
        assert_eq!(e.selected, None);
    }
}
