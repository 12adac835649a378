use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use super::ffi::NdiSender;

/// One BGRA frame handed from the render thread to the sender thread.
pub struct FramePacket {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Spawn the worker that owns the NDI source and pushes frames until
/// shutdown. The source itself is opened on the worker so a slow or missing
/// NDI runtime never stalls the render thread.
pub fn spawn_sender_thread(
    source_name: String,
    frames: Receiver<FramePacket>,
    shutdown: Arc<AtomicBool>,
    sent: Arc<AtomicU64>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("zenith-ndi".into())
        .spawn(move || {
            let sender = match NdiSender::new(&source_name) {
                Ok(sender) => sender,
                Err(e) => {
                    log::error!("NDI source '{source_name}' failed to open: {e}");
                    return;
                }
            };

            while !shutdown.load(Ordering::Relaxed) {
                match frames.recv_timeout(Duration::from_millis(100)) {
                    Ok(frame) => {
                        sender.send_video(&frame.pixels, frame.width, frame.height);
                        sent.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            log::info!("NDI sender thread exiting");
        })
}
