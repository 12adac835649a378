pub mod analyzer;
pub mod beat;
pub mod capture;
pub mod features;
pub mod gain;
pub mod smoother;

pub use features::AudioFeatures;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};

use self::analyzer::FftAnalyzer;
use self::beat::BeatDetector;
use self::capture::AudioCapture;
use self::gain::AutoGain;
use self::smoother::FeatureSmoother;

/// Manages the audio pipeline: capture -> FFT -> auto-gain -> beat detect ->
/// smooth -> send to main thread. The worker can be torn down and reopened
/// on a different input device at runtime.
pub struct AudioSystem {
    sender: Sender<AudioFeatures>,
    receiver: Receiver<AudioFeatures>,
    latest: Option<AudioFeatures>,
    shutdown: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
    pub device_name: String,
    pub active: bool,
}

impl AudioSystem {
    pub fn new(preferred: Option<&str>) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(4);
        let mut system = Self {
            sender: tx,
            receiver: rx,
            latest: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            worker: None,
            device_name: "None".to_string(),
            active: false,
        };
        system.start(preferred);
        system
    }

    fn start(&mut self, preferred: Option<&str>) {
        let capture = match AudioCapture::open(preferred) {
            Ok(capture) => capture,
            Err(e) => {
                log::warn!("Audio capture unavailable: {e}");
                return;
            }
        };

        self.device_name = capture.device_name.clone();
        let sample_rate = capture.sample_rate as f32;
        let tx = self.sender.clone();
        let shutdown = Arc::new(AtomicBool::new(false));
        self.shutdown = shutdown.clone();

        match thread::Builder::new()
            .name("zenith-audio".into())
            .spawn(move || audio_thread(capture, sample_rate, tx, shutdown))
        {
            Ok(handle) => {
                self.worker = Some(handle);
                self.active = true;
            }
            Err(e) => log::error!("Failed to spawn audio thread: {e}"),
        }
    }

    fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
        self.active = false;
    }

    /// Tear down the current capture and reopen on the named device.
    pub fn switch_device(&mut self, name: &str) {
        log::info!("Switching audio capture to '{name}'");
        self.stop();
        self.start(Some(name));
    }

    /// Drain the channel and return the most recent features.
    pub fn latest_features(&mut self) -> Option<AudioFeatures> {
        while let Ok(features) = self.receiver.try_recv() {
            self.latest = Some(features);
        }
        self.latest
    }
}

impl Drop for AudioSystem {
    fn drop(&mut self) {
        self.stop();
    }
}

fn audio_thread(
    capture: AudioCapture,
    sample_rate: f32,
    tx: Sender<AudioFeatures>,
    shutdown: Arc<AtomicBool>,
) {
    let mut analyzer = FftAnalyzer::new(sample_rate);
    let mut gain = AutoGain::new();
    let mut beat_detector = BeatDetector::new();
    let mut smoother = FeatureSmoother::new();
    let mut read_buf = vec![0.0f32; 4096];
    let mut last_time = Instant::now();
    let start_time = Instant::now();

    while !shutdown.load(Ordering::Relaxed) {
        thread::sleep(Duration::from_millis(10));

        if capture.ring.len() == 0 {
            continue;
        }
        let read = capture.ring.pop(&mut read_buf);
        if read == 0 {
            continue;
        }

        let now = Instant::now();
        let dt = now.duration_since(last_time).as_secs_f32();
        let timestamp = now.duration_since(start_time).as_secs_f64();
        last_time = now;

        let mut raw = analyzer.analyze(&read_buf[..read]);

        // Beat detection runs on the raw (pre-gain) flux.
        let beat = beat_detector.process(raw.flux, raw.rms, timestamp);

        gain.apply(&mut raw);
        raw.onset = beat.onset_strength;
        raw.beat = beat.beat;
        raw.beat_phase = beat.beat_phase;
        raw.bpm = beat.bpm;
        raw.beat_strength = beat.beat_strength;

        let smoothed = smoother.smooth(&raw, dt);

        // Non-blocking send; drop if main thread is behind
        let _ = tx.try_send(smoothed);
    }
}
