pub mod audio_panel;
pub mod output_panel;
pub mod session_panel;
pub mod status_bar;
pub mod warp_panel;

use egui::Context;

use crate::audio::features::AudioFeatures;
use crate::gpu::mesh::MeshKind;
use crate::osc::OscSystem;
use crate::session::Session;
use crate::warp::WarpList;
use crate::web::WebSystem;

/// Everything the panels read or mutate each frame.
pub struct PanelCtx<'a> {
    pub session: &'a mut Session,
    pub features: &'a AudioFeatures,
    pub audio_device: &'a str,
    pub audio_active: bool,
    pub mesh: MeshKind,
    pub warps: &'a mut WarpList,
    pub warp_edit: bool,
    pub osc: &'a mut OscSystem,
    pub web: &'a mut WebSystem,
    pub keyframe_count: usize,
    pub keyframes_playing: bool,
    pub shader_error: &'a Option<String>,
    pub fps: f32,
    pub render_width: u32,
    pub render_height: u32,
    #[cfg(feature = "ndi")]
    pub ndi: &'a mut crate::ndi::NdiSystem,
}

/// Deferred requests that need resources the panels don't hold (GPU device,
/// keyframe bank, app-level mode switches).
#[derive(Default)]
pub struct UiActions {
    pub select_mesh: Option<MeshKind>,
    pub toggle_warp_edit: bool,
    pub capture_keyframe: bool,
    pub save_keyframes: bool,
    pub toggle_keyframe_playback: bool,
    pub switch_audio_device: Option<String>,
    #[cfg(feature = "ndi")]
    pub ndi_set_enabled: Option<bool>,
    #[cfg(feature = "ndi")]
    pub ndi_restart: bool,
}

/// Draw all UI panels when the overlay is visible.
pub fn draw_panels(ctx: &Context, visible: bool, p: &mut PanelCtx) -> UiActions {
    let mut actions = UiActions::default();

    if !visible {
        return actions;
    }

    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        status_bar::draw_status_bar(
            ui,
            p.fps,
            p.render_width,
            p.render_height,
            p.mesh,
            p.shader_error,
            p.osc.config.enabled,
            p.osc.is_recently_active(),
            p.web.client_count,
            p.features,
        );
    });

    egui::SidePanel::left("left_panel")
        .default_width(280.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Audio");
                ui.separator();
                audio_panel::draw_audio_panel(
                    ui,
                    p.features,
                    p.audio_device,
                    p.audio_active,
                    &mut actions,
                );

                ui.add_space(16.0);
                ui.heading("Output");
                ui.separator();
                output_panel::draw_output_panel(ui, p, &mut actions);
            });
        });

    egui::SidePanel::right("right_panel")
        .default_width(300.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("Scene");
                ui.separator();
                draw_scene_controls(ui, p, &mut actions);

                ui.add_space(12.0);
                ui.heading("Session");
                ui.separator();
                session_panel::draw_session_panel(ui, p.session);

                ui.add_space(12.0);
                ui.heading("Warps");
                ui.separator();
                if warp_panel::draw_warp_panel(ui, p.warps, p.warp_edit) {
                    actions.toggle_warp_edit = true;
                }

                ui.add_space(12.0);
                ui.heading("Keyframes");
                ui.separator();
                ui.label(format!("{} captured", p.keyframe_count));
                ui.horizontal(|ui| {
                    if ui.button("Capture (k)").clicked() {
                        actions.capture_keyframe = true;
                    }
                    if ui.button("Save bank (s)").clicked() {
                        actions.save_keyframes = true;
                    }
                    let play_label = if p.keyframes_playing { "Stop (p)" } else { "Play (p)" };
                    if ui
                        .add_enabled(p.keyframe_count > 0, egui::Button::new(play_label))
                        .clicked()
                    {
                        actions.toggle_keyframe_playback = true;
                    }
                });
            });
        });

    actions
}

fn draw_scene_controls(ui: &mut egui::Ui, p: &PanelCtx, actions: &mut UiActions) {
    ui.horizontal(|ui| {
        ui.label("Mesh:");
        for kind in MeshKind::ALL {
            if ui.selectable_label(p.mesh == *kind, kind.name()).clicked() {
                actions.select_mesh = Some(*kind);
            }
        }
    });
}
