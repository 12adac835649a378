/// Every live-tunable parameter. The discriminant doubles as the index into
/// the session value array and into keyframe snapshots, so new parameters go
/// at the end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(usize)]
pub enum ParamId {
    // Foreground / background color channels
    FgR,
    FgG,
    FgB,
    FgA,
    BgR,
    BgG,
    BgB,
    BgA,
    // Glitch / post toggles and amounts
    Glitch,
    Chromatic,
    Trixels,
    Pixelate,
    Vignette,
    Invert,
    Greyscale,
    // Image controls
    Exposure,
    Zoom,
    Crossfade,
    Alpha,
    Steps,
    Ratio,
    // Motion
    RotationSpeed,
    // Tempo / audio
    Bpm,
    AudioMult,
    // Tessellation levels (scene pass)
    TessInner,
    TessOuter,
    // Mouse mirrors (written by the app, readable by shaders and OSC TX)
    MouseX,
    MouseY,
    MouseClick,
}

pub const PARAM_COUNT: usize = 29;

pub struct ParamMeta {
    pub name: &'static str,
    pub default: f32,
    pub min: f32,
    pub max: f32,
}

const fn m(name: &'static str, default: f32, min: f32, max: f32) -> ParamMeta {
    ParamMeta {
        name,
        default,
        min,
        max,
    }
}

/// Metadata table, indexed by discriminant. Order must match `ParamId`.
static META: [ParamMeta; PARAM_COUNT] = [
    m("fg_r", 1.0, 0.0, 1.0),
    m("fg_g", 0.5, 0.0, 1.0),
    m("fg_b", 0.1, 0.0, 1.0),
    m("fg_a", 1.0, 0.0, 1.0),
    m("bg_r", 0.03, 0.0, 1.0),
    m("bg_g", 0.03, 0.0, 1.0),
    m("bg_b", 0.05, 0.0, 1.0),
    m("bg_a", 1.0, 0.0, 1.0),
    m("glitch", 0.0, 0.0, 1.0),
    m("chromatic", 0.0, 0.0, 2.0),
    m("trixels", 0.0, 0.0, 1.0),
    m("pixelate", 0.0, 0.0, 1.0),
    m("vignette", 0.0, 0.0, 1.0),
    m("invert", 0.0, 0.0, 1.0),
    m("greyscale", 0.0, 0.0, 1.0),
    m("exposure", 1.0, 0.0, 3.0),
    m("zoom", 1.0, 0.1, 3.0),
    // Crossfade fades the scene toward the background color; a fresh
    // session starts fully on the scene.
    m("crossfade", 0.0, 0.0, 1.0),
    m("alpha", 1.0, 0.0, 1.0),
    m("steps", 16.0, 1.0, 128.0),
    m("ratio", 1.0, 0.0, 20.0),
    m("rotation_speed", 0.1, -2.0, 2.0),
    m("bpm", 166.0, 20.0, 240.0),
    m("audio_mult", 1.0, 0.0, 10.0),
    m("tess_inner", 1.0, 1.0, 6.0),
    m("tess_outer", 1.0, 1.0, 6.0),
    m("mouse_x", 0.0, 0.0, 1.0),
    m("mouse_y", 0.0, 0.0, 1.0),
    m("mouse_click", 0.0, 0.0, 1.0),
];

pub fn meta(id: ParamId) -> &'static ParamMeta {
    &META[id as usize]
}

impl ParamId {
    pub const ALL: &[ParamId] = &[
        ParamId::FgR,
        ParamId::FgG,
        ParamId::FgB,
        ParamId::FgA,
        ParamId::BgR,
        ParamId::BgG,
        ParamId::BgB,
        ParamId::BgA,
        ParamId::Glitch,
        ParamId::Chromatic,
        ParamId::Trixels,
        ParamId::Pixelate,
        ParamId::Vignette,
        ParamId::Invert,
        ParamId::Greyscale,
        ParamId::Exposure,
        ParamId::Zoom,
        ParamId::Crossfade,
        ParamId::Alpha,
        ParamId::Steps,
        ParamId::Ratio,
        ParamId::RotationSpeed,
        ParamId::Bpm,
        ParamId::AudioMult,
        ParamId::TessInner,
        ParamId::TessOuter,
        ParamId::MouseX,
        ParamId::MouseY,
        ParamId::MouseClick,
    ];

    pub fn name(self) -> &'static str {
        meta(self).name
    }

    pub fn from_name(name: &str) -> Option<ParamId> {
        Self::ALL
            .iter()
            .copied()
            .find(|id| meta(*id).name == name)
    }

    /// Parameters that represent on/off toggles (range exactly 0..1 and
    /// default on a bound). Used by the UI to draw checkboxes.
    pub fn is_toggle(self) -> bool {
        matches!(
            self,
            ParamId::Glitch
                | ParamId::Vignette
                | ParamId::Invert
                | ParamId::Greyscale
                | ParamId::MouseClick
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_enum() {
        assert_eq!(ParamId::ALL.len(), PARAM_COUNT);
        for (i, id) in ParamId::ALL.iter().enumerate() {
            assert_eq!(*id as usize, i, "discriminant mismatch for {id:?}");
        }
    }

    #[test]
    fn names_are_unique() {
        for a in ParamId::ALL {
            for b in ParamId::ALL {
                if a != b {
                    assert_ne!(meta(*a).name, meta(*b).name);
                }
            }
        }
    }

    #[test]
    fn crossfade_starts_on_scene() {
        assert_eq!(meta(ParamId::Crossfade).default, 0.0);
    }

    #[test]
    fn defaults_within_range() {
        for id in ParamId::ALL {
            let m = meta(*id);
            assert!(
                m.default >= m.min && m.default <= m.max,
                "{} default out of range",
                m.name
            );
        }
    }
}
