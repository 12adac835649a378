use egui::{Color32, Ui, Vec2};

use super::UiActions;
use crate::audio::capture::AudioCapture;
use crate::audio::features::AudioFeatures;

const METER_BG: Color32 = Color32::from_rgb(0x2A, 0x2A, 0x2A);

fn draw_bar(ui: &mut Ui, name: &str, value: f32, color: Color32, available_width: f32) {
    ui.horizontal(|ui| {
        ui.label(format!("{name:>8}"));
        let bar_height = 14.0;
        let (rect, _) = ui.allocate_exact_size(
            Vec2::new((available_width - 120.0).max(1.0), bar_height),
            egui::Sense::hover(),
        );

        ui.painter().rect_filled(rect, 2.0, METER_BG);

        let fill_width = rect.width() * value.clamp(0.0, 1.0);
        let fill_rect = egui::Rect::from_min_size(rect.min, Vec2::new(fill_width, rect.height()));
        ui.painter().rect_filled(fill_rect, 2.0, color);

        ui.label(format!("{value:.2}"));
    });
}

pub fn draw_audio_panel(
    ui: &mut Ui,
    f: &AudioFeatures,
    device_name: &str,
    active: bool,
    actions: &mut UiActions,
) {
    // Device enumeration only runs while the header is open.
    egui::CollapsingHeader::new(format!("Device: {device_name}")).show(ui, |ui| {
        for name in AudioCapture::list_devices() {
            if ui.selectable_label(name == device_name, &name).clicked() && name != device_name {
                actions.switch_audio_device = Some(name);
            }
        }
    });

    if !active {
        ui.colored_label(Color32::from_rgb(0xE0, 0x60, 0x60), "No audio input");
        return;
    }

    ui.add_space(4.0);
    let available_width = ui.available_width();

    let bars: [(&str, f32, Color32); 6] = [
        ("Bass", f.bass, Color32::from_rgb(0xE0, 0x60, 0x50)),
        ("Mid", f.mid, Color32::from_rgb(0xE0, 0xB0, 0x40)),
        ("Treble", f.treble, Color32::from_rgb(0x60, 0xD0, 0x60)),
        ("RMS", f.rms, Color32::from_rgb(0x50, 0xA0, 0xE0)),
        ("Onset", f.onset, Color32::from_rgb(0xB0, 0x70, 0xE0)),
        ("Beat", f.beat_strength, Color32::from_rgb(0xE0, 0x50, 0xA0)),
    ];
    for (name, value, color) in bars {
        draw_bar(ui, name, value, color, available_width);
    }

    if f.bpm > 1.0 {
        ui.add_space(4.0);
        let beat_on = f.beat > 0.5;
        let color = if beat_on {
            Color32::from_rgb(0xFF, 0xD0, 0x40)
        } else {
            Color32::from_rgb(0xE0, 0xA0, 0x40)
        };
        ui.colored_label(color, format!("BPM: {:.0}", f.bpm));
    }
}
