//! Onset-interval beat tracking. Spectral flux crossing an adaptive
//! threshold marks an onset; the median interval between recent onsets
//! gives the tempo, and beat phase is elapsed time over that period.

/// Onsets closer together than this are one event (s).
const REFRACTORY_S: f64 = 0.25;
/// How many onset intervals the tempo median looks at.
const INTERVAL_HISTORY: usize = 8;
const MIN_BPM: f32 = 60.0;
const MAX_BPM: f32 = 200.0;

#[derive(Clone, Copy)]
pub struct BeatResult {
    pub onset_strength: f32,
    pub beat: f32,
    pub beat_phase: f32,
    pub bpm: f32,
    pub beat_strength: f32,
}

pub struct BeatDetector {
    flux_mean: f32,
    flux_var: f32,
    intervals: Vec<f64>,
    last_onset_time: f64,
    bpm: f32,
    held_onset: f32,
    last_timestamp: f64,
}

impl BeatDetector {
    pub fn new() -> Self {
        Self {
            flux_mean: 0.0,
            flux_var: 0.0,
            intervals: Vec::with_capacity(INTERVAL_HISTORY),
            last_onset_time: 0.0,
            bpm: 0.0,
            held_onset: 0.0,
            last_timestamp: 0.0,
        }
    }

    /// Feed one analysis frame: raw spectral flux, current RMS, and the
    /// frame timestamp in seconds.
    pub fn process(&mut self, flux: f32, rms: f32, timestamp: f64) -> BeatResult {
        let dt = if self.last_timestamp > 0.0 {
            (timestamp - self.last_timestamp).max(0.0) as f32
        } else {
            0.0
        };
        self.last_timestamp = timestamp;

        // Running mean/variance of flux for the adaptive threshold.
        let alpha = 0.03;
        self.flux_mean += alpha * (flux - self.flux_mean);
        let dev = flux - self.flux_mean;
        self.flux_var += alpha * (dev * dev - self.flux_var);
        let threshold = self.flux_mean + 1.5 * self.flux_var.sqrt();

        let silent = rms < 1e-3;
        let since_onset = timestamp - self.last_onset_time;
        let is_onset =
            !silent && flux > threshold && flux > 1e-4 && since_onset >= REFRACTORY_S;

        let mut beat = 0.0;
        let mut beat_strength = 0.0;
        if is_onset {
            if self.last_onset_time > 0.0 {
                let interval = since_onset;
                let candidate_bpm = 60.0 / interval;
                if (f64::from(MIN_BPM)..=f64::from(MAX_BPM)).contains(&candidate_bpm) {
                    if self.intervals.len() == INTERVAL_HISTORY {
                        self.intervals.remove(0);
                    }
                    self.intervals.push(interval);
                    self.bpm = self.median_bpm();
                }
            }
            self.last_onset_time = timestamp;
            beat = 1.0;
            let spread = self.flux_var.sqrt().max(1e-6);
            beat_strength = ((flux - self.flux_mean) / (3.0 * spread)).clamp(0.0, 1.0);
            self.held_onset = 1.0;
        } else if dt > 0.0 {
            // Instant attack, exponential release.
            self.held_onset *= (-dt / 0.2).exp();
        }

        let beat_phase = if self.bpm > 0.0 && self.last_onset_time > 0.0 && !silent {
            let period = 60.0 / f64::from(self.bpm);
            (((timestamp - self.last_onset_time) / period) % 1.0) as f32
        } else {
            0.0
        };

        BeatResult {
            onset_strength: self.held_onset,
            beat,
            beat_phase,
            bpm: self.bpm,
            beat_strength,
        }
    }

    fn median_bpm(&self) -> f32 {
        if self.intervals.is_empty() {
            return 0.0;
        }
        let mut sorted = self.intervals.clone();
        sorted.sort_unstable_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };
        (60.0 / median as f32).clamp(MIN_BPM, MAX_BPM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Run the detector over a synthetic flux train: a spike every
    /// `interval` seconds, quiet frames in between, 100 Hz frame rate.
    fn run_train(interval: f64, seconds: f64) -> (f32, u32) {
        let mut d = BeatDetector::new();
        let mut beats = 0;
        let mut bpm = 0.0;
        let frame_dt = 0.01;
        let mut t = 0.0;
        let mut next_spike = 0.5;
        while t < seconds {
            let flux = if (t - next_spike).abs() < frame_dt / 2.0 {
                next_spike += interval;
                1.0
            } else {
                0.01
            };
            let r = d.process(flux, 0.3, t);
            if r.beat > 0.5 {
                beats += 1;
            }
            bpm = r.bpm;
            t += frame_dt;
        }
        (bpm, beats)
    }

    #[test]
    fn steady_pulse_yields_its_bpm() {
        // 0.5s interval = 120 BPM.
        let (bpm, beats) = run_train(0.5, 10.0);
        assert!(beats > 10, "beats {beats}");
        assert!((bpm - 120.0).abs() < 5.0, "bpm {bpm}");
    }

    #[test]
    fn slower_pulse_yields_lower_bpm() {
        // 0.75s interval = 80 BPM.
        let (bpm, _) = run_train(0.75, 12.0);
        assert!((bpm - 80.0).abs() < 5.0, "bpm {bpm}");
    }

    #[test]
    fn silence_reports_no_beats() {
        let mut d = BeatDetector::new();
        for i in 0..500 {
            let r = d.process(0.5, 0.0, i as f64 * 0.01);
            assert_eq!(r.beat, 0.0);
        }
    }

    #[test]
    fn refractory_merges_double_triggers() {
        let mut d = BeatDetector::new();
        // Warm up the threshold with quiet frames.
        for i in 0..100 {
            d.process(0.01, 0.3, i as f64 * 0.01);
        }
        let a = d.process(1.0, 0.3, 1.0);
        let b = d.process(1.0, 0.3, 1.05);
        assert_eq!(a.beat, 1.0);
        assert_eq!(b.beat, 0.0);
    }

    #[test]
    fn onset_strength_decays_between_beats() {
        let mut d = BeatDetector::new();
        for i in 0..100 {
            d.process(0.01, 0.3, i as f64 * 0.01);
        }
        let hit = d.process(1.0, 0.3, 1.0);
        assert!(hit.onset_strength > 0.9);
        let mut later = hit;
        for i in 1..50 {
            later = d.process(0.01, 0.3, 1.0 + i as f64 * 0.01);
        }
        assert!(later.onset_strength < hit.onset_strength * 0.5);
    }
}
