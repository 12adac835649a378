pub mod capture;
pub mod ffi;
pub mod sender;
pub mod types;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::Sender;
use wgpu::{CommandEncoder, Device};

use self::capture::NdiCapture;
use self::sender::{spawn_sender_thread, FramePacket};
use self::types::NdiConfig;
use crate::gpu::RenderTarget;

/// Central NDI output system: owns capture target, sender thread, config.
pub struct NdiSystem {
    pub config: NdiConfig,
    pub capture: Option<NdiCapture>,
    frame_tx: Option<Sender<FramePacket>>,
    shutdown: Option<Arc<AtomicBool>>,
    sender_handle: Option<JoinHandle<()>>,
    pub frame_counter: Arc<AtomicU64>,
}

impl NdiSystem {
    pub fn new(device: &Device, render_w: u32, render_h: u32) -> Self {
        let config = NdiConfig::load();
        let frame_counter = Arc::new(AtomicU64::new(0));

        let mut sys = Self {
            config,
            capture: None,
            frame_tx: None,
            shutdown: None,
            sender_handle: None,
            frame_counter,
        };

        if sys.config.enabled {
            sys.start(device, render_w, render_h);
        }

        sys
    }

    /// Start NDI output: create capture target + sender thread.
    pub fn start(&mut self, device: &Device, render_w: u32, render_h: u32) {
        self.stop();

        let (w, h) = self.config.resolution.dimensions(render_w, render_h);
        self.capture = Some(NdiCapture::new(device, w, h));

        let (tx, rx) = crossbeam_channel::bounded(2);
        let shutdown = Arc::new(AtomicBool::new(false));
        self.frame_counter.store(0, Ordering::Relaxed);

        let handle = match spawn_sender_thread(
            self.config.source_name.clone(),
            rx,
            shutdown.clone(),
            self.frame_counter.clone(),
        ) {
            Ok(handle) => handle,
            Err(e) => {
                log::error!("Failed to spawn NDI sender thread: {e}");
                self.capture = None;
                return;
            }
        };

        self.frame_tx = Some(tx);
        self.shutdown = Some(shutdown);
        self.sender_handle = Some(handle);
        self.config.enabled = true;

        log::info!("NDI output started: {}x{}", w, h);
    }

    /// Stop NDI output: shutdown sender thread and release capture resources.
    pub fn stop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            shutdown.store(true, Ordering::Relaxed);
        }
        // Drop the channel sender so the recv side disconnects.
        self.frame_tx = None;
        if let Some(handle) = self.sender_handle.take() {
            let _ = handle.join();
        }
        self.capture = None;
        self.config.enabled = false;
    }

    pub fn set_enabled(&mut self, enabled: bool, device: &Device, render_w: u32, render_h: u32) {
        if enabled && !self.is_running() {
            self.start(device, render_w, render_h);
        } else if !enabled && self.is_running() {
            self.stop();
        }
        self.config.enabled = enabled;
        self.config.save();
    }

    /// Restart with new config (source name or resolution changed).
    pub fn restart(&mut self, device: &Device, render_w: u32, render_h: u32) {
        if self.is_running() {
            self.stop();
            self.config.enabled = true; // stop() sets it false
            self.start(device, render_w, render_h);
        }
    }

    pub fn is_running(&self) -> bool {
        self.sender_handle.is_some()
    }

    /// Run the NDI capture pipeline:
    /// 1. Read previously-mapped staging data (non-blocking, 1-frame latency).
    /// 2. Blit the mix output to the BGRA capture texture.
    /// 3. Copy capture texture → staging buffer.
    /// 4. Map is requested after queue.submit() — see `post_submit()`.
    /// 5. Send the previous frame's data to the NDI thread.
    pub fn capture_frame(
        &mut self,
        device: &Device,
        encoder: &mut CommandEncoder,
        source: &RenderTarget,
    ) {
        let capture = match self.capture.as_mut() {
            Some(c) => c,
            None => return,
        };

        let prev_data = capture.take_mapped_data(device);

        // If the previous map is still outstanding, skip this frame to avoid
        // submitting commands that reference a still-mapped buffer.
        if capture.is_map_pending() {
            return;
        }

        capture.blit_from(device, encoder, &source.view);
        capture.copy_to_staging(encoder);

        if let (Some(data), Some(tx)) = (prev_data, &self.frame_tx) {
            let frame = FramePacket {
                pixels: data,
                width: capture.width,
                height: capture.height,
            };
            // try_send: drop frame if the NDI thread is behind.
            let _ = tx.try_send(frame);
        }
    }

    /// Called after queue.submit() — request async map on the staging buffer.
    pub fn post_submit(&mut self) {
        if let Some(ref mut capture) = self.capture {
            capture.request_map();
        }
    }

    pub fn frames_sent(&self) -> u64 {
        self.frame_counter.load(Ordering::Relaxed)
    }
}

impl Drop for NdiSystem {
    fn drop(&mut self) {
        self.stop();
    }
}
