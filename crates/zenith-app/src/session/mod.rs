pub mod params;

pub use params::{ParamId, PARAM_COUNT};

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use params::meta;

/// The live parameter bag: every tunable the mix pass, scene pass, and
/// control surfaces read or write. Constructed once at startup, mutated
/// continuously by UI/audio/network events, serialized on shutdown.
pub struct Session {
    values: [f32; PARAM_COUNT],
    pub changed: bool,
}

/// On-disk form: name → value, so the file survives parameter reordering.
#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    version: u32,
    params: HashMap<String, f32>,
}

impl Session {
    pub fn new() -> Self {
        let mut values = [0.0f32; PARAM_COUNT];
        for id in ParamId::ALL {
            values[*id as usize] = meta(*id).default;
        }
        Self {
            values,
            changed: false,
        }
    }

    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id as usize]
    }

    /// Set a parameter, clamped to its declared range.
    pub fn set(&mut self, id: ParamId, value: f32) {
        let m = meta(id);
        let v = value.clamp(m.min, m.max);
        if self.values[id as usize] != v {
            self.values[id as usize] = v;
            self.changed = true;
        }
    }

    /// Set from a normalized 0..1 value, scaled to the parameter range.
    /// Used by the OSC and WebSocket control planes.
    pub fn set_normalized(&mut self, id: ParamId, normalized: f32) {
        let m = meta(id);
        let t = normalized.clamp(0.0, 1.0);
        self.set(id, m.min + (m.max - m.min) * t);
    }

    /// Boolean view of 0/1 toggle parameters.
    pub fn is_on(&self, id: ParamId) -> bool {
        self.values[id as usize] > 0.5
    }

    pub fn toggle(&mut self, id: ParamId) {
        let v = if self.is_on(id) { 0.0 } else { 1.0 };
        self.set(id, v);
    }

    /// Mirror the normalized cursor position into the session. Horizontal
    /// position doubles as a chromatic-aberration performance axis on every
    /// move, clicked or not.
    pub fn mirror_mouse(&mut self, nx: f32, ny: f32) {
        self.set(ParamId::MouseX, nx);
        self.set(ParamId::MouseY, ny);
        self.set_normalized(ParamId::Chromatic, nx);
    }

    /// Nudge a parameter by `delta`, clamped to range.
    pub fn adjust(&mut self, id: ParamId, delta: f32) {
        self.set(id, self.get(id) + delta);
    }

    pub fn reset(&mut self, id: ParamId) {
        self.set(id, meta(id).default);
    }

    pub fn reset_all(&mut self) {
        for id in ParamId::ALL {
            self.values[*id as usize] = meta(*id).default;
        }
        self.changed = true;
    }

    /// Full snapshot of current values, in id order. Used by keyframes.
    pub fn snapshot(&self) -> Vec<f32> {
        self.values.to_vec()
    }

    /// Apply a snapshot (shorter snapshots leave trailing params untouched).
    pub fn apply_snapshot(&mut self, values: &[f32]) {
        for (i, v) in values.iter().enumerate().take(PARAM_COUNT) {
            let id = ParamId::ALL[i];
            self.set(id, *v);
        }
    }

    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("zenith").join("session.json")
    }

    pub fn load() -> Self {
        let mut session = Self::new();
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<SessionFile>(&contents) {
                Ok(file) => {
                    for id in ParamId::ALL {
                        if let Some(v) = file.params.get(meta(*id).name) {
                            session.set(*id, *v);
                        }
                    }
                    session.changed = false;
                    log::info!("Loaded session from {}", path.display());
                }
                Err(e) => log::warn!("Failed to parse session file: {e}"),
            },
            Err(_) => log::info!("No session file found, using defaults"),
        }
        session
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create config dir: {e}");
                return;
            }
        }
        let file = SessionFile {
            version: 1,
            params: ParamId::ALL
                .iter()
                .map(|id| (meta(*id).name.to_string(), self.get(*id)))
                .collect(),
        };
        match serde_json::to_string_pretty(&file) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    log::error!("Failed to write session file: {e}");
                }
            }
            Err(e) => log::error!("Failed to serialize session: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_has_defaults() {
        let s = Session::new();
        assert_eq!(s.get(ParamId::Zoom), 1.0);
        assert_eq!(s.get(ParamId::TessInner), 1.0);
        assert_eq!(s.get(ParamId::FgA), 1.0);
        assert!(!s.changed);
    }

    #[test]
    fn set_clamps_to_range() {
        let mut s = Session::new();
        s.set(ParamId::Zoom, 100.0);
        assert_eq!(s.get(ParamId::Zoom), meta(ParamId::Zoom).max);
        s.set(ParamId::Zoom, -100.0);
        assert_eq!(s.get(ParamId::Zoom), meta(ParamId::Zoom).min);
    }

    #[test]
    fn set_marks_changed() {
        let mut s = Session::new();
        assert!(!s.changed);
        s.set(ParamId::Exposure, 2.0);
        assert!(s.changed);
    }

    #[test]
    fn set_same_value_does_not_mark_changed() {
        let mut s = Session::new();
        let v = s.get(ParamId::Exposure);
        s.set(ParamId::Exposure, v);
        assert!(!s.changed);
    }

    #[test]
    fn set_normalized_scales_to_range() {
        let mut s = Session::new();
        s.set_normalized(ParamId::Bpm, 0.0);
        assert_eq!(s.get(ParamId::Bpm), meta(ParamId::Bpm).min);
        s.set_normalized(ParamId::Bpm, 1.0);
        assert_eq!(s.get(ParamId::Bpm), meta(ParamId::Bpm).max);
        s.set_normalized(ParamId::Bpm, 0.5);
        let m = meta(ParamId::Bpm);
        assert!((s.get(ParamId::Bpm) - (m.min + m.max) / 2.0).abs() < 1e-4);
    }

    #[test]
    fn toggle_flips_boolean_params() {
        let mut s = Session::new();
        assert!(!s.is_on(ParamId::Invert));
        s.toggle(ParamId::Invert);
        assert!(s.is_on(ParamId::Invert));
        s.toggle(ParamId::Invert);
        assert!(!s.is_on(ParamId::Invert));
    }

    #[test]
    fn mouse_move_sweeps_chromatic_without_click() {
        let mut s = Session::new();
        assert!(!s.is_on(ParamId::MouseClick));
        s.mirror_mouse(0.5, 0.25);
        assert_eq!(s.get(ParamId::MouseX), 0.5);
        assert_eq!(s.get(ParamId::MouseY), 0.25);
        let m = meta(ParamId::Chromatic);
        let expected = m.min + (m.max - m.min) * 0.5;
        assert!((s.get(ParamId::Chromatic) - expected).abs() < 1e-5);
    }

    #[test]
    fn snapshot_roundtrip() {
        let mut s = Session::new();
        s.set(ParamId::Zoom, 2.0);
        s.set(ParamId::Glitch, 1.0);
        let snap = s.snapshot();

        let mut s2 = Session::new();
        s2.apply_snapshot(&snap);
        assert_eq!(s2.get(ParamId::Zoom), 2.0);
        assert!(s2.is_on(ParamId::Glitch));
    }

    #[test]
    fn apply_short_snapshot_leaves_rest() {
        let mut s = Session::new();
        s.set(ParamId::Exposure, 2.5);
        let exposure = s.get(ParamId::Exposure);
        // Snapshot covering only the first two params.
        s.apply_snapshot(&[0.9, 0.8]);
        assert_eq!(s.get(ParamId::Exposure), exposure);
    }

    #[test]
    fn lookup_by_name() {
        assert_eq!(ParamId::from_name("zoom"), Some(ParamId::Zoom));
        assert_eq!(ParamId::from_name("bg_g"), Some(ParamId::BgG));
        assert_eq!(ParamId::from_name("nope"), None);
    }
}
