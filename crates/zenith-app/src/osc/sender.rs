use std::net::UdpSocket;

use rosc::{OscMessage, OscPacket, OscType};

use crate::audio::features::AudioFeatures;

/// Fire-and-forget OSC sender over UDP.
pub struct OscSender {
    socket: Option<UdpSocket>,
    target: String,
}

impl OscSender {
    pub fn new() -> Self {
        Self {
            socket: None,
            target: String::new(),
        }
    }

    /// Configure the sender to target host:port. Binds an ephemeral local port.
    pub fn configure(&mut self, host: &str, port: u16) {
        self.target = format!("{host}:{port}");
        match UdpSocket::bind("0.0.0.0:0") {
            Ok(sock) => {
                let _ = sock.set_nonblocking(true);
                self.socket = Some(sock);
                log::info!("OSC sender configured: target {}", self.target);
            }
            Err(e) => {
                log::error!("Failed to bind OSC sender socket: {e}");
                self.socket = None;
            }
        }
    }

    pub fn disable(&mut self) {
        self.socket = None;
    }

    /// Send the analyzed audio frame as OSC messages.
    pub fn send_audio(&self, f: &AudioFeatures) {
        self.send_float("/zenith/audio/bass", f.bass);
        self.send_float("/zenith/audio/mid", f.mid);
        self.send_float("/zenith/audio/treble", f.treble);
        self.send_float("/zenith/audio/rms", f.rms);
        self.send_float("/zenith/audio/onset", f.onset);
        self.send_float("/zenith/audio/beat", f.beat);
        self.send_float("/zenith/audio/beat_phase", f.beat_phase);
        self.send_float("/zenith/audio/bpm", f.bpm);
    }

    /// Send current render state.
    pub fn send_state(&self, mesh_name: &str, warp_edit: bool) {
        self.send_string("/zenith/state/mesh", mesh_name);
        self.send_int("/zenith/state/warp_edit", warp_edit as i32);
    }

    fn send_float(&self, addr: &str, value: f32) {
        self.send_packet(addr, vec![OscType::Float(value)]);
    }

    fn send_int(&self, addr: &str, value: i32) {
        self.send_packet(addr, vec![OscType::Int(value)]);
    }

    fn send_string(&self, addr: &str, value: &str) {
        self.send_packet(addr, vec![OscType::String(value.to_string())]);
    }

    fn send_packet(&self, addr: &str, args: Vec<OscType>) {
        let Some(ref socket) = self.socket else {
            return;
        };
        let packet = OscPacket::Message(OscMessage {
            addr: addr.to_string(),
            args,
        });
        match rosc::encoder::encode(&packet) {
            Ok(bytes) => {
                let _ = socket.send_to(&bytes, &self.target);
            }
            Err(e) => {
                log::debug!("OSC encode error: {e}");
            }
        }
    }
}
