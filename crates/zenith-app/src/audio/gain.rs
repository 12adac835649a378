use super::features::{AudioFeatures, BEAT_FIELDS_START};

/// Spans narrower than this are treated as silence.
const MIN_SPAN: f32 = 0.01;

/// Tracked level window for one feature.
#[derive(Clone, Copy)]
struct Band {
    floor: f32,
    ceil: f32,
}

impl Band {
    /// Fold a new value into the window and return it rescaled to 0..1.
    /// Both bounds drift toward the signal and snap outward immediately, so
    /// the window tightens slowly but never clips a new extreme.
    fn track(&mut self, v: f32, drift: f32) -> f32 {
        self.floor = (self.floor + drift * (v - self.floor)).min(v);
        self.ceil = (self.ceil + drift * (v - self.ceil)).max(v);
        let span = self.ceil - self.floor;
        if span > MIN_SPAN {
            ((v - self.floor) / span).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

/// Auto-leveling for the spectral features: each is rescaled into its recent
/// min/max window so quiet and loud sources drive the visuals the same way.
/// Beat fields arrive pre-scaled from the detector and are left alone.
pub struct AutoGain {
    bands: [Band; BEAT_FIELDS_START],
    drift: f32,
}

impl AutoGain {
    pub fn new() -> Self {
        Self {
            bands: [Band {
                floor: 0.0,
                ceil: MIN_SPAN,
            }; BEAT_FIELDS_START],
            drift: 0.005,
        }
    }

    /// Rescale the spectral features in place.
    pub fn apply(&mut self, features: &mut AudioFeatures) {
        let values = features.as_slice_mut();
        for (band, v) in self.bands.iter_mut().zip(&mut values[..BEAT_FIELDS_START]) {
            *v = band.track(*v, self.drift);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loud_feature_fills_window() {
        let mut gain = AutoGain::new();
        let mut f = AudioFeatures::default();
        f.bass = 0.8;
        gain.apply(&mut f);
        assert!((f.bass - 1.0).abs() < 1e-4);
    }

    #[test]
    fn beat_fields_untouched() {
        let mut gain = AutoGain::new();
        let mut f = AudioFeatures::default();
        f.beat = 1.0;
        f.bpm = 128.0;
        f.beat_phase = 0.4;
        gain.apply(&mut f);
        assert_eq!(f.beat, 1.0);
        assert_eq!(f.bpm, 128.0);
        assert_eq!(f.beat_phase, 0.4);
    }

    #[test]
    fn near_silence_maps_to_zero() {
        let mut gain = AutoGain::new();
        let mut f = AudioFeatures::default();
        f.mid = 0.001;
        gain.apply(&mut f);
        assert_eq!(f.mid, 0.0);
    }

    #[test]
    fn window_tracks_dynamic_range() {
        let mut gain = AutoGain::new();
        // Alternate loud and mid-level input; the mid level should settle
        // inside the window rather than pegging at the extremes.
        let mut last = 0.0;
        for _ in 0..50 {
            let mut f = AudioFeatures::default();
            f.rms = 1.0;
            gain.apply(&mut f);
            let mut f = AudioFeatures::default();
            f.rms = 0.5;
            gain.apply(&mut f);
            last = f.rms;
        }
        assert!(last > 0.0 && last < 1.0);
    }
}
