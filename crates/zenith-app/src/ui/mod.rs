pub mod overlay;
pub mod panels;
pub mod theme;

pub use overlay::EguiOverlay;

use egui::{Color32, Context, Pos2, Shape, Stroke};

use crate::warp::editor::WarpEditor;
use crate::warp::WarpList;

/// Draw warp control-point handles on the egui foreground layer while edit
/// mode is active: warp outlines, then one circle per handle.
pub fn draw_warp_handles(ctx: &Context, warps: &WarpList, editor: &WarpEditor) {
    if !editor.enabled {
        return;
    }

    let screen = ctx.screen_rect();
    let painter = ctx.layer_painter(egui::LayerId::new(
        egui::Order::Foreground,
        egui::Id::new("warp-handles"),
    ));

    let to_screen = |p: glam::Vec2| -> Pos2 {
        Pos2::new(
            screen.left() + p.x * screen.width(),
            screen.top() + p.y * screen.height(),
        )
    };

    for (wi, warp) in warps.warps.iter().enumerate() {
        let outline: Vec<Pos2> = warp.corners.iter().map(|c| to_screen(*c)).collect();
        painter.add(Shape::closed_line(
            outline,
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(0x40, 0xC0, 0xFF, 0xA0)),
        ));

        for (hi, handle) in warp.handles().iter().enumerate() {
            let pos = to_screen(*handle);
            let (radius, fill) = if editor.selected == Some((wi, hi)) {
                (6.0, Color32::from_rgb(0xFF, 0xD0, 0x40))
            } else if editor.hover == Some((wi, hi)) {
                (5.0, Color32::from_rgb(0xE0, 0xE0, 0xE0))
            } else {
                (4.0, Color32::from_rgba_unmultiplied(0x90, 0x90, 0x90, 0xC0))
            };
            painter.circle(pos, radius, fill, Stroke::new(1.0, Color32::BLACK));
        }
    }
}
