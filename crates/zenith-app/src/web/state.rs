use serde::Serialize;

use crate::audio::features::AudioFeatures;
use crate::gpu::mesh::MeshKind;
use crate::session::params::meta;
use crate::session::{ParamId, Session};
use crate::warp::SplitState;

/// Full state snapshot sent on WebSocket connect and rebroadcast at 10Hz.
#[derive(Serialize)]
pub struct FullState {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub params: Vec<ParamInfo>,
    pub meshes: Vec<MeshInfo>,
    pub mesh: &'static str,
    pub warp_edit: bool,
    pub split_vertical: bool,
    pub split_horizontal: bool,
    pub audio_device: String,
}

#[derive(Serialize)]
pub struct ParamInfo {
    pub name: &'static str,
    /// Normalized 0-1 position within the parameter's range.
    pub value: f32,
    pub raw: f32,
    pub min: f32,
    pub max: f32,
    pub toggle: bool,
}

#[derive(Serialize)]
pub struct MeshInfo {
    pub index: usize,
    pub name: &'static str,
}

/// Audio snapshot broadcast at 10Hz.
#[derive(Serialize)]
pub struct AudioSnapshot {
    #[serde(rename = "type")]
    pub msg_type: &'static str,
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub rms: f32,
    pub onset: f32,
    pub beat: f32,
    pub beat_phase: f32,
    pub bpm: f32,
}

// -- Builders --

pub fn build_full_state(
    session: &Session,
    mesh: MeshKind,
    warp_edit: bool,
    split: SplitState,
    audio_device: &str,
) -> String {
    let params: Vec<ParamInfo> = ParamId::ALL
        .iter()
        .map(|id| {
            let m = meta(*id);
            let raw = session.get(*id);
            let range = m.max - m.min;
            let normalized = if range > 0.0 { (raw - m.min) / range } else { 0.0 };
            ParamInfo {
                name: m.name,
                value: normalized,
                raw,
                min: m.min,
                max: m.max,
                toggle: id.is_toggle(),
            }
        })
        .collect();

    let meshes: Vec<MeshInfo> = MeshKind::ALL
        .iter()
        .enumerate()
        .map(|(i, k)| MeshInfo {
            index: i,
            name: k.name(),
        })
        .collect();

    let state = FullState {
        msg_type: "state",
        params,
        meshes,
        mesh: mesh.name(),
        warp_edit,
        split_vertical: split.vertical,
        split_horizontal: split.horizontal,
        audio_device: audio_device.to_string(),
    };

    serde_json::to_string(&state).unwrap_or_default()
}

pub fn build_audio_snapshot(f: &AudioFeatures) -> String {
    let snap = AudioSnapshot {
        msg_type: "audio",
        bass: f.bass,
        mid: f.mid,
        treble: f.treble,
        rms: f.rms,
        onset: f.onset,
        beat: f.beat,
        beat_phase: f.beat_phase,
        bpm: f.bpm,
    };
    serde_json::to_string(&snap).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_snapshot_contains_type() {
        let f = AudioFeatures::default();
        let json = build_audio_snapshot(&f);
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["type"], "audio");
    }

    #[test]
    fn full_state_json_shape() {
        let mut s = Session::new();
        s.set(ParamId::Zoom, 2.0);
        let json = build_full_state(&s, MeshKind::Sphere, true, SplitState::default(), "Loopback");
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["type"], "state");
        assert_eq!(v["mesh"], "sphere");
        assert!(v["warp_edit"].as_bool().unwrap());
        assert!(!v["split_vertical"].as_bool().unwrap());
        assert_eq!(v["audio_device"], "Loopback");
        assert_eq!(
            v["params"].as_array().unwrap().len(),
            crate::session::PARAM_COUNT
        );
        assert_eq!(v["meshes"].as_array().unwrap().len(), MeshKind::ALL.len());
    }

    #[test]
    fn full_state_params_normalized() {
        let mut s = Session::new();
        s.set(ParamId::Bpm, meta(ParamId::Bpm).max);
        let json = build_full_state(
            &s,
            MeshKind::Cube,
            false,
            SplitState::default(),
            "None",
        );
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        let params = v["params"].as_array().unwrap();
        let bpm = params
            .iter()
            .find(|p| p["name"] == "bpm")
            .expect("bpm param present");
        assert!((bpm["value"].as_f64().unwrap() - 1.0).abs() < 1e-4);
        assert!((bpm["raw"].as_f64().unwrap() - f64::from(meta(ParamId::Bpm).max)).abs() < 1e-3);
    }
}
