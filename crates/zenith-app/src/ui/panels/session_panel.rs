use egui::{Slider, Ui};

use crate::session::params::meta;
use crate::session::{ParamId, Session};

const GROUPS: &[(&str, &[ParamId])] = &[
    (
        "Color",
        &[
            ParamId::FgR,
            ParamId::FgG,
            ParamId::FgB,
            ParamId::FgA,
            ParamId::BgR,
            ParamId::BgG,
            ParamId::BgB,
            ParamId::BgA,
        ],
    ),
    (
        "Effects",
        &[
            ParamId::Glitch,
            ParamId::Chromatic,
            ParamId::Trixels,
            ParamId::Pixelate,
            ParamId::Vignette,
            ParamId::Invert,
            ParamId::Greyscale,
        ],
    ),
    (
        "Image",
        &[
            ParamId::Exposure,
            ParamId::Zoom,
            ParamId::Crossfade,
            ParamId::Alpha,
            ParamId::Steps,
            ParamId::Ratio,
        ],
    ),
    (
        "Motion & Tempo",
        &[ParamId::RotationSpeed, ParamId::Bpm, ParamId::AudioMult],
    ),
    ("Tessellation", &[ParamId::TessInner, ParamId::TessOuter]),
];

/// Whole-number sliders.
fn is_stepped(id: ParamId) -> bool {
    matches!(id, ParamId::TessInner | ParamId::TessOuter | ParamId::Steps)
}

pub fn draw_session_panel(ui: &mut Ui, session: &mut Session) {
    for (label, ids) in GROUPS {
        egui::CollapsingHeader::new(*label)
            .default_open(true)
            .show(ui, |ui| {
                for id in *ids {
                    draw_param(ui, session, *id);
                }
            });
    }

    ui.add_space(4.0);
    if ui.button("Reset all").clicked() {
        session.reset_all();
    }
}

fn draw_param(ui: &mut Ui, session: &mut Session, id: ParamId) {
    let m = meta(id);

    if id.is_toggle() {
        let mut on = session.is_on(id);
        if ui.checkbox(&mut on, m.name).changed() {
            session.set(id, if on { 1.0 } else { 0.0 });
        }
        return;
    }

    let mut value = session.get(id);
    let mut slider = Slider::new(&mut value, m.min..=m.max).text(m.name);
    if is_stepped(id) {
        slider = slider.step_by(1.0);
    }
    if ui.add(slider).changed() {
        session.set(id, value);
    }
}
