use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Stream;

/// Ring capacity in samples; power of two so indices wrap with a mask.
const RING_CAPACITY: usize = 1 << 14;

/// Lock-free single-producer single-consumer ring carrying mono samples from
/// the cpal callback to the analysis thread. Samples are stored as raw f32
/// bits in atomics, so every access stays in safe code.
pub struct SampleRing {
    slots: Box<[AtomicU32]>,
    /// Next write position (producer side, monotonically increasing).
    head: AtomicUsize,
    /// Next read position (consumer side).
    tail: AtomicUsize,
}

impl SampleRing {
    pub fn new() -> Self {
        Self {
            slots: (0..RING_CAPACITY).map(|_| AtomicU32::new(0)).collect(),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    fn slot(i: usize) -> usize {
        i & (RING_CAPACITY - 1)
    }

    /// Producer side; only the capture callback writes.
    pub fn write(&self, samples: &[f32]) {
        let mut head = self.head.load(Ordering::Relaxed);
        for &s in samples {
            self.slots[Self::slot(head)].store(s.to_bits(), Ordering::Relaxed);
            head = head.wrapping_add(1);
        }
        self.head.store(head, Ordering::Release);
    }

    /// Consumer side. Copies up to `dst.len()` pending samples and returns
    /// how many were taken.
    pub fn pop(&self, dst: &mut [f32]) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Relaxed);
        let n = head.wrapping_sub(tail).min(dst.len());
        for (i, out) in dst.iter_mut().enumerate().take(n) {
            let bits = self.slots[Self::slot(tail.wrapping_add(i))].load(Ordering::Relaxed);
            *out = f32::from_bits(bits);
        }
        self.tail.store(tail.wrapping_add(n), Ordering::Release);
        n
    }

    /// Pending sample count.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Relaxed);
        head.wrapping_sub(tail)
    }
}

/// Case-insensitive match, exact or substring, so a saved name like
/// "usb audio" still finds "USB Audio CODEC" after a reconnect.
fn name_matches(wanted: &str, name: &str) -> bool {
    let w = wanted.to_ascii_lowercase();
    name.to_ascii_lowercase().contains(&w)
}

fn pick_input_device(host: &cpal::Host, preferred: Option<&str>) -> Result<cpal::Device> {
    if let Some(wanted) = preferred {
        let found = host.input_devices()?.find(|d| {
            d.description()
                .is_ok_and(|desc| name_matches(wanted, desc.name()))
        });
        match found {
            Some(device) => return Ok(device),
            None => log::warn!("Audio device '{wanted}' not found, falling back to default"),
        }
    }
    host.default_input_device()
        .ok_or_else(|| anyhow::anyhow!("No audio input device found"))
}

pub struct AudioCapture {
    _stream: Stream,
    pub ring: Arc<SampleRing>,
    pub sample_rate: u32,
    pub device_name: String,
}

impl AudioCapture {
    /// Open an input stream, preferring the named device when given.
    pub fn open(preferred: Option<&str>) -> Result<Self> {
        let host = cpal::default_host();
        let device = pick_input_device(&host, preferred)?;

        let device_name = device
            .description()
            .map(|d| d.name().to_string())
            .unwrap_or_else(|_| "Unknown".into());
        log::info!("Audio capture device: {device_name}");

        let config = device.default_input_config()?;
        let sample_rate = config.sample_rate();
        let channels = config.channels() as usize;
        log::info!(
            "Audio config: {sample_rate}Hz, {channels}ch, {:?}",
            config.sample_format()
        );

        let ring = Arc::new(SampleRing::new());
        let ring_tx = ring.clone();
        // Scratch buffer for the downmix, reused so the realtime callback
        // stops allocating once it reaches steady state.
        let mut mono: Vec<f32> = Vec::new();

        let stream = device.build_input_stream(
            &config.into(),
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                if channels == 1 {
                    ring_tx.write(data);
                } else {
                    mono.clear();
                    mono.extend(
                        data.chunks(channels)
                            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
                    );
                    ring_tx.write(&mono);
                }
            },
            |err| {
                log::error!("Audio stream error: {err}");
            },
            None,
        )?;

        stream.play()?;
        log::info!("Audio capture started");

        Ok(Self {
            _stream: stream,
            ring,
            sample_rate,
            device_name,
        })
    }

    pub fn list_devices() -> Vec<String> {
        let host = cpal::default_host();
        host.input_devices()
            .map(|devices| {
                devices
                    .filter_map(|d| d.description().ok().map(|desc| desc.name().to_string()))
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_delivers_in_order() {
        let ring = SampleRing::new();
        ring.write(&[1.0, 2.0, 3.0]);
        assert_eq!(ring.len(), 3);
        let mut out = [0.0f32; 8];
        assert_eq!(ring.pop(&mut out), 3);
        assert_eq!(&out[..3], &[1.0, 2.0, 3.0]);
        assert_eq!(ring.len(), 0);
    }

    #[test]
    fn sustained_flow_wraps() {
        let ring = SampleRing::new();
        let chunk = vec![0.5f32; 1000];
        let mut sink = vec![0.0f32; 1000];
        // Push/pop far more than RING_CAPACITY total.
        for _ in 0..100 {
            ring.write(&chunk);
            assert_eq!(ring.pop(&mut sink), 1000);
        }
        assert_eq!(ring.len(), 0);
    }

    #[test]
    fn device_name_matching_is_lenient() {
        assert!(name_matches("usb audio", "USB Audio CODEC"));
        assert!(name_matches("Scarlett 2i2", "Scarlett 2i2 USB"));
        assert!(!name_matches("scarlett", "Built-in Microphone"));
    }
}
