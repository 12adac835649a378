use egui::Ui;

use crate::warp::bilinear::ControlGrid;
use crate::warp::{WarpList, WarpMode};

/// Returns true when the user asked to toggle edit mode.
pub fn draw_warp_panel(ui: &mut Ui, warps: &mut WarpList, warp_edit: bool) -> bool {
    let mut toggle_edit = false;

    if ui
        .selectable_label(warp_edit, if warp_edit { "Editing (w)" } else { "Edit (w)" })
        .clicked()
    {
        toggle_edit = true;
    }

    ui.horizontal(|ui| {
        ui.label("Split:");
        if ui
            .selectable_label(warps.split.vertical, "Vertical (v)")
            .clicked()
        {
            warps.toggle_split_vertical();
        }
        if ui
            .selectable_label(warps.split.horizontal, "Horizontal (h)")
            .clicked()
        {
            warps.toggle_split_horizontal();
        }
        if ui.button("Reset (r)").clicked() {
            warps.reset_split();
        }
    });

    let mut dirty = false;
    for i in 0..warps.warps.len() {
        let warp = &mut warps.warps[i];
        egui::CollapsingHeader::new(format!("Warp {}", i + 1))
            .default_open(i == 0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Mode:");
                    let modes = [
                        (WarpMode::Perspective, "Perspective"),
                        (WarpMode::PerspectiveBilinear, "Bilinear"),
                    ];
                    for (mode, label) in modes {
                        if ui.selectable_label(warp.mode == mode, label).clicked()
                            && warp.mode != mode
                        {
                            warp.set_mode(mode);
                            dirty = true;
                        }
                    }
                });

                if warp.mode == WarpMode::PerspectiveBilinear {
                    ui.horizontal(|ui| {
                        ui.label(format!(
                            "Grid: {}x{}",
                            warp.grid.cols(),
                            warp.grid.rows()
                        ));
                        if ui.button("-").clicked() && warp.grid.cols() > ControlGrid::MIN_DIM {
                            warp.grid
                                .set_resolution(warp.grid.cols() - 1, warp.grid.rows() - 1);
                            dirty = true;
                        }
                        if ui.button("+").clicked() && warp.grid.cols() < ControlGrid::MAX_DIM {
                            warp.grid
                                .set_resolution(warp.grid.cols() + 1, warp.grid.rows() + 1);
                            dirty = true;
                        }
                    });
                }

                if ui
                    .add(egui::Slider::new(&mut warp.brightness, 0.0..=1.0).text("brightness"))
                    .changed()
                {
                    dirty = true;
                }
            });
    }

    if dirty {
        warps.mark_dirty();
    }

    toggle_edit
}
