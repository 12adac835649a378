use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::session::Session;

/// One captured parameter snapshot, timestamped in seconds since app start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keyframe {
    pub time: f64,
    pub values: Vec<f32>,
}

/// Ordered bank of keyframes, persisted as JSON in the config dir.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyframeBank {
    #[serde(default)]
    pub keyframes: Vec<Keyframe>,
    /// Replay state; not persisted.
    #[serde(skip)]
    pub playing: bool,
}

impl KeyframeBank {
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("zenith").join("keyframes.json")
    }

    pub fn load() -> Self {
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<KeyframeBank>(&contents) {
                Ok(mut bank) => {
                    bank.sort();
                    log::info!(
                        "Loaded {} keyframes from {}",
                        bank.keyframes.len(),
                        path.display()
                    );
                    bank
                }
                Err(e) => {
                    log::warn!("Failed to parse keyframe bank: {e}");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create config dir: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    log::error!("Failed to write keyframe bank: {e}");
                } else {
                    log::info!("Saved {} keyframes to {}", self.keyframes.len(), path.display());
                }
            }
            Err(e) => log::error!("Failed to serialize keyframe bank: {e}"),
        }
    }

    /// Capture the current session values at `time`, keeping the bank sorted.
    pub fn capture(&mut self, time: f64, session: &Session) {
        self.keyframes.push(Keyframe {
            time,
            values: session.snapshot(),
        });
        self.sort();
        log::info!("Captured keyframe {} at t={time:.2}s", self.keyframes.len());
    }

    pub fn clear(&mut self) {
        self.keyframes.clear();
        self.playing = false;
    }

    /// Start or stop replay. An empty bank has nothing to play.
    pub fn toggle_playback(&mut self) {
        if self.keyframes.is_empty() {
            self.playing = false;
            return;
        }
        self.playing = !self.playing;
        log::info!(
            "Keyframe playback {}",
            if self.playing { "started" } else { "stopped" }
        );
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keyframes.len()
    }

    /// Sampled parameter set at `time`: linear interpolation between the two
    /// adjacent keyframes, clamped to the first/last outside the bank's span.
    pub fn sample(&self, time: f64) -> Option<Vec<f32>> {
        let first = self.keyframes.first()?;
        if time <= first.time || self.keyframes.len() == 1 {
            return Some(first.values.clone());
        }
        let last = self.keyframes.last()?;
        if time >= last.time {
            return Some(last.values.clone());
        }

        // Invariant from capture()/load(): keyframes sorted by time.
        let next_idx = self
            .keyframes
            .iter()
            .position(|k| k.time >= time)
            .unwrap_or(self.keyframes.len() - 1);
        let a = &self.keyframes[next_idx - 1];
        let b = &self.keyframes[next_idx];

        let span = b.time - a.time;
        let t = if span > 0.0 {
            ((time - a.time) / span) as f32
        } else {
            0.0
        };

        let n = a.values.len().min(b.values.len());
        let values = (0..n)
            .map(|i| a.values[i] + (b.values[i] - a.values[i]) * t)
            .collect();
        Some(values)
    }

    fn sort(&mut self) {
        self.keyframes
            .sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(std::cmp::Ordering::Equal));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::ParamId;

    fn kf(time: f64, v: f32) -> Keyframe {
        Keyframe {
            time,
            values: vec![v; crate::session::PARAM_COUNT],
        }
    }

    #[test]
    fn sample_empty_bank_is_none() {
        let bank = KeyframeBank::default();
        assert!(bank.sample(1.0).is_none());
    }

    #[test]
    fn sample_clamps_outside_span() {
        let bank = KeyframeBank {
            keyframes: vec![kf(1.0, 0.0), kf(3.0, 1.0)],
            ..Default::default()
        };
        assert_eq!(bank.sample(0.0).unwrap()[0], 0.0);
        assert_eq!(bank.sample(10.0).unwrap()[0], 1.0);
    }

    #[test]
    fn sample_interpolates_between_neighbors() {
        let bank = KeyframeBank {
            keyframes: vec![kf(0.0, 0.0), kf(2.0, 1.0), kf(4.0, 0.5)],
            ..Default::default()
        };
        let mid = bank.sample(1.0).unwrap();
        assert!((mid[0] - 0.5).abs() < 1e-6);
        let second = bank.sample(3.0).unwrap();
        assert!((second[0] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn capture_keeps_bank_sorted() {
        let mut bank = KeyframeBank::default();
        let mut s = Session::new();
        s.set(ParamId::Zoom, 2.0);
        bank.capture(5.0, &s);
        s.set(ParamId::Zoom, 0.5);
        bank.capture(2.0, &s);
        assert_eq!(bank.len(), 2);
        assert!(bank.keyframes[0].time < bank.keyframes[1].time);
        assert_eq!(bank.keyframes[0].values[ParamId::Zoom as usize], 0.5);
    }

    #[test]
    fn sampled_values_apply_to_session() {
        let mut bank = KeyframeBank::default();
        let mut s = Session::new();
        s.set(ParamId::Exposure, 0.0);
        bank.capture(0.0, &s);
        s.set(ParamId::Exposure, 2.0);
        bank.capture(2.0, &s);

        let mid = bank.sample(1.0).unwrap();
        let mut replay = Session::new();
        replay.apply_snapshot(&mid);
        assert!((replay.get(ParamId::Exposure) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn playback_toggle_requires_keyframes() {
        let mut bank = KeyframeBank::default();
        bank.toggle_playback();
        assert!(!bank.playing);

        bank.capture(0.0, &Session::new());
        bank.toggle_playback();
        assert!(bank.playing);

        bank.clear();
        assert!(!bank.playing);
    }

    #[test]
    fn serde_roundtrip() {
        let bank = KeyframeBank {
            keyframes: vec![kf(0.0, 0.25), kf(1.5, 0.75)],
            ..Default::default()
        };
        let json = serde_json::to_string(&bank).unwrap();
        let back: KeyframeBank = serde_json::from_str(&json).unwrap();
        assert_eq!(back.keyframes.len(), 2);
        assert_eq!(back.keyframes[1].time, 1.5);
        assert_eq!(back.keyframes[1].values[0], 0.75);
    }
}
