use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::features::AudioFeatures;

const FFT_SIZE: usize = 2048;

/// FFT-based spectral feature extractor: band energies, RMS/peak level,
/// spectral centroid, and half-wave-rectified flux for onset detection.
pub struct FftAnalyzer {
    fft: std::sync::Arc<dyn rustfft::Fft<f32>>,
    window: Vec<f32>,
    time_domain: Vec<f32>,
    fft_buffer: Vec<Complex<f32>>,
    magnitude: Vec<f32>,
    prev_magnitude: Vec<f32>,
    num_bins: usize,
    bin_hz: f32,
    sample_rate: f32,
}

impl FftAnalyzer {
    pub fn new(sample_rate: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(FFT_SIZE);

        let num_bins = FFT_SIZE / 2 + 1;
        let bin_hz = sample_rate / FFT_SIZE as f32;

        // Hann window
        let window: Vec<f32> = (0..FFT_SIZE)
            .map(|i| {
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (FFT_SIZE - 1) as f32).cos())
            })
            .collect();

        log::info!("FFT analyzer: {FFT_SIZE}-point, {bin_hz:.1} Hz/bin, {num_bins} bins");

        Self {
            fft,
            window,
            time_domain: vec![0.0; FFT_SIZE],
            fft_buffer: vec![Complex::new(0.0, 0.0); FFT_SIZE],
            magnitude: vec![0.0; num_bins],
            prev_magnitude: vec![0.0; num_bins],
            num_bins,
            bin_hz,
            sample_rate,
        }
    }

    /// Feed new samples and compute one feature frame.
    pub fn analyze(&mut self, samples: &[f32]) -> AudioFeatures {
        // Shift time-domain buffer left, append new samples
        let shift = samples.len().min(FFT_SIZE);
        if shift < FFT_SIZE {
            self.time_domain.copy_within(shift.., 0);
        }
        let src_offset = samples.len().saturating_sub(FFT_SIZE);
        self.time_domain[FFT_SIZE - shift..]
            .copy_from_slice(&samples[src_offset..src_offset + shift]);

        self.compute_fft();
        self.extract_features()
    }

    fn compute_fft(&mut self) {
        for i in 0..FFT_SIZE {
            self.fft_buffer[i] = Complex::new(self.time_domain[i] * self.window[i], 0.0);
        }

        self.fft.process(&mut self.fft_buffer);

        std::mem::swap(&mut self.magnitude, &mut self.prev_magnitude);

        let scale = 2.0 / FFT_SIZE as f32;
        for i in 0..self.num_bins {
            self.magnitude[i] = self.fft_buffer[i].norm() * scale;
        }
    }

    fn extract_features(&self) -> AudioFeatures {
        let mut out = AudioFeatures::default();

        // Band boundaries in bins
        let bass_hi = (250.0 / self.bin_hz) as usize;
        let mid_hi = (4000.0 / self.bin_hz) as usize;

        out.bass = self.band_energy(0, bass_hi);
        out.mid = self.band_energy(bass_hi, mid_hi);
        out.treble = self.band_energy(mid_hi, self.num_bins);

        let sum_sq: f32 = self.time_domain.iter().map(|s| s * s).sum();
        out.rms = (sum_sq / FFT_SIZE as f32).sqrt();
        out.peak = self
            .time_domain
            .iter()
            .fold(0.0f32, |acc, s| acc.max(s.abs()));

        // Half-wave-rectified flux feeds both the onset feature and the
        // beat detector downstream.
        let flux = self.spectral_flux();
        out.flux = flux;
        out.onset = flux;

        out.centroid = self.spectral_centroid() / (self.sample_rate * 0.5);

        out
    }

    fn band_energy(&self, bin_low: usize, bin_high: usize) -> f32 {
        let bin_high = bin_high.min(self.num_bins);
        let count = bin_high.saturating_sub(bin_low).max(1);
        let sum: f32 = self.magnitude[bin_low..bin_high].iter().map(|m| m * m).sum();
        (sum / count as f32).sqrt()
    }

    fn spectral_flux(&self) -> f32 {
        let mut flux = 0.0f32;
        for i in 0..self.num_bins {
            let diff = self.magnitude[i] - self.prev_magnitude[i];
            if diff > 0.0 {
                flux += diff;
            }
        }
        flux
    }

    fn spectral_centroid(&self) -> f32 {
        let mut weighted_sum = 0.0f32;
        let mut mag_sum = 0.0f32;
        for i in 0..self.num_bins {
            weighted_sum += i as f32 * self.bin_hz * self.magnitude[i];
            mag_sum += self.magnitude[i];
        }
        if mag_sum > 1e-10 {
            weighted_sum / mag_sum
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn low_tone_lands_in_bass_band() {
        let mut a = FftAnalyzer::new(44100.0);
        let f = a.analyze(&sine(80.0, 44100.0, FFT_SIZE));
        assert!(f.bass > f.treble, "bass {} vs treble {}", f.bass, f.treble);
    }

    #[test]
    fn high_tone_raises_centroid() {
        let mut a = FftAnalyzer::new(44100.0);
        let low = a.analyze(&sine(100.0, 44100.0, FFT_SIZE)).centroid;
        let mut b = FftAnalyzer::new(44100.0);
        let high = b.analyze(&sine(8000.0, 44100.0, FFT_SIZE)).centroid;
        assert!(high > low);
    }

    #[test]
    fn silence_has_no_level() {
        let mut a = FftAnalyzer::new(44100.0);
        let f = a.analyze(&vec![0.0; FFT_SIZE]);
        assert!(f.rms < 1e-6);
        assert!(f.peak < 1e-6);
    }

    #[test]
    fn sudden_tone_spikes_flux() {
        let mut a = FftAnalyzer::new(44100.0);
        a.analyze(&vec![0.0; FFT_SIZE]);
        let f = a.analyze(&sine(440.0, 44100.0, FFT_SIZE));
        assert!(f.flux > 0.01, "flux {}", f.flux);
    }
}
