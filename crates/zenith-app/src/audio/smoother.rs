use super::features::{AudioFeatures, BEAT_FIELDS_START};

/// Per-feature attack/release time constants (seconds).
struct SmoothParams {
    attack: f32,
    release: f32,
}

/// Asymmetric attack/release EMA smoother for the spectral features. Beat
/// fields pass through unsmoothed so the beat pulse stays a single frame.
pub struct FeatureSmoother {
    state: [f32; BEAT_FIELDS_START],
    params: [SmoothParams; BEAT_FIELDS_START],
}

impl FeatureSmoother {
    pub fn new() -> Self {
        let params = [
            SmoothParams { attack: 0.02, release: 0.15 },  // bass
            SmoothParams { attack: 0.01, release: 0.10 },  // mid
            SmoothParams { attack: 0.005, release: 0.08 }, // treble
            SmoothParams { attack: 0.01, release: 0.12 },  // rms
            SmoothParams { attack: 0.005, release: 0.10 }, // peak
            SmoothParams { attack: 0.001, release: 0.05 }, // onset (very fast attack)
            SmoothParams { attack: 0.03, release: 0.15 },  // centroid
            SmoothParams { attack: 0.005, release: 0.06 }, // flux
        ];

        Self {
            state: [0.0; BEAT_FIELDS_START],
            params,
        }
    }

    /// Smooth raw features with asymmetric EMA. `dt` is seconds since the
    /// previous call.
    pub fn smooth(&mut self, raw: &AudioFeatures, dt: f32) -> AudioFeatures {
        let raw_slice = raw.as_slice();
        let mut out = *raw;
        let out_slice = out.as_slice_mut();

        for i in 0..BEAT_FIELDS_START {
            let target = raw_slice[i];
            let rising = target > self.state[i];
            let tau = if rising {
                self.params[i].attack
            } else {
                self.params[i].release
            };
            // EMA coefficient: alpha = 1 - exp(-dt/tau)
            let alpha = 1.0 - (-dt / tau.max(0.001)).exp();
            self.state[i] += alpha * (target - self.state[i]);
            out_slice[i] = self.state[i];
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_is_faster_than_release() {
        let mut s = FeatureSmoother::new();
        let mut up = AudioFeatures::default();
        up.bass = 1.0;
        let rose = s.smooth(&up, 0.05).bass;

        let down = AudioFeatures::default();
        let fell = s.smooth(&down, 0.05).bass;
        // Rose most of the way in one step, fell only partially.
        assert!(rose > 0.8, "rose {rose}");
        assert!(fell > 0.3, "fell {fell}");
    }

    #[test]
    fn beat_fields_are_untouched() {
        let mut s = FeatureSmoother::new();
        let mut f = AudioFeatures::default();
        f.beat = 1.0;
        f.beat_phase = 0.7;
        let out = s.smooth(&f, 0.016);
        assert_eq!(out.beat, 1.0);
        assert_eq!(out.beat_phase, 0.7);
    }

    #[test]
    fn converges_to_steady_input() {
        let mut s = FeatureSmoother::new();
        let mut f = AudioFeatures::default();
        f.rms = 0.6;
        let mut out = AudioFeatures::default();
        for _ in 0..200 {
            out = s.smooth(&f, 0.016);
        }
        assert!((out.rms - 0.6).abs() < 1e-3);
    }
}
