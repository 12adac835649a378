use egui::{Color32, Rect, RichText, Ui, Vec2};

use crate::audio::features::AudioFeatures;
use crate::gpu::mesh::MeshKind;

const METER_BG: Color32 = Color32::from_rgb(0x2A, 0x2A, 0x2A);
const ERROR: Color32 = Color32::from_rgb(0xE0, 0x60, 0x60);
const SUCCESS: Color32 = Color32::from_rgb(0x60, 0xC0, 0x60);
const BEAT: Color32 = Color32::from_rgb(0xFF, 0xD0, 0x40);

#[allow(clippy::too_many_arguments)]
pub fn draw_status_bar(
    ui: &mut Ui,
    fps: f32,
    render_width: u32,
    render_height: u32,
    mesh: MeshKind,
    shader_error: &Option<String>,
    osc_enabled: bool,
    osc_recently_active: bool,
    web_clients: usize,
    features: &AudioFeatures,
) {
    ui.horizontal(|ui| {
        // Left: RMS mini meter
        let rms = features.rms.clamp(0.0, 1.0);
        let (rect, _) =
            ui.allocate_exact_size(Vec2::new(30.0, 10.0), egui::Sense::hover());
        ui.painter().rect_filled(rect, 2.0, METER_BG);
        let fill_rect = Rect::from_min_size(rect.min, Vec2::new(rect.width() * rms, rect.height()));
        let rms_color = if rms > 0.8 {
            ERROR
        } else if rms > 0.5 {
            Color32::from_rgb(0xE0, 0xB0, 0x40)
        } else {
            SUCCESS
        };
        ui.painter().rect_filled(fill_rect, 2.0, rms_color);

        ui.separator();
        ui.label(RichText::new(mesh.name()).small());
        ui.label(RichText::new(format!("{render_width}x{render_height}")).small().weak());

        if let Some(err) = shader_error {
            ui.separator();
            ui.colored_label(ERROR, RichText::new(format!("ERR: {err}")).small());
        }

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            // FPS (rightmost)
            ui.label(RichText::new(format!("{:.0}", fps)).small().weak());

            // OSC dot
            if osc_enabled {
                let color = if osc_recently_active {
                    SUCCESS
                } else {
                    Color32::from_rgb(0x55, 0x55, 0x55)
                };
                let (dot_rect, _) =
                    ui.allocate_exact_size(Vec2::new(8.0, 8.0), egui::Sense::hover());
                ui.painter().circle_filled(dot_rect.center(), 3.0, color);
            }

            // Web clients
            if web_clients > 0 {
                ui.label(
                    RichText::new(format!("{web_clients}w"))
                        .small()
                        .color(Color32::from_rgb(0x80, 0xB0, 0xE0)),
                );
            }

            // BPM + beat dot
            if features.bpm > 1.0 {
                let beat_on = features.beat > 0.5;
                let bpm_color = if beat_on { BEAT } else { Color32::GRAY };
                ui.label(
                    RichText::new(format!("{:.0}", features.bpm))
                        .small()
                        .color(bpm_color)
                        .strong(),
                );
                let dot_color = if beat_on {
                    BEAT
                } else {
                    Color32::from_rgb(0x44, 0x44, 0x44)
                };
                let (dot_rect, _) =
                    ui.allocate_exact_size(Vec2::new(8.0, 8.0), egui::Sense::hover());
                ui.painter().circle_filled(dot_rect.center(), 3.0, dot_color);
            }
        });
    });
}
