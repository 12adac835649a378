pub mod client;
pub mod server;
pub mod state;
pub mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::{Receiver, Sender};

use self::types::{WebConfig, WebFrameResult, WsInMessage};
use crate::audio::features::AudioFeatures;
use crate::session::{ParamId, Session};

/// Central WebSocket system: owns accept thread, client channels, config.
pub struct WebSystem {
    inbound_rx: Option<Receiver<WsInMessage>>,
    inbound_tx: Sender<WsInMessage>,
    clients: Arc<Mutex<Vec<Sender<String>>>>,
    shutdown: Option<Arc<AtomicBool>>,
    accept_handle: Option<JoinHandle<()>>,
    latest_state: Arc<Mutex<String>>,
    pub config: WebConfig,
    pub client_count: usize,
    pub last_activity: Option<Instant>,
    last_audio_broadcast: Instant,
    last_state_broadcast: Instant,
}

impl WebSystem {
    pub fn new() -> Self {
        let config = WebConfig::load();
        let (inbound_tx, inbound_rx) = crossbeam_channel::bounded(64);

        let mut sys = Self {
            inbound_rx: Some(inbound_rx),
            inbound_tx,
            clients: Arc::new(Mutex::new(Vec::new())),
            shutdown: None,
            accept_handle: None,
            latest_state: Arc::new(Mutex::new(String::new())),
            config,
            client_count: 0,
            last_activity: None,
            last_audio_broadcast: Instant::now(),
            last_state_broadcast: Instant::now(),
        };

        if sys.config.enabled {
            sys.start_server();
        }

        sys
    }

    pub fn start_server(&mut self) {
        self.stop_server();
        let shutdown = Arc::new(AtomicBool::new(false));
        let clients = Arc::new(Mutex::new(Vec::new()));
        let (tx, rx) = crossbeam_channel::bounded(64);

        match server::spawn_accept_loop(
            self.config.port,
            tx.clone(),
            clients.clone(),
            self.latest_state.clone(),
            shutdown.clone(),
        ) {
            Ok(handle) => {
                self.inbound_tx = tx;
                self.inbound_rx = Some(rx);
                self.clients = clients;
                self.shutdown = Some(shutdown);
                self.accept_handle = Some(handle);
            }
            Err(e) => {
                log::error!("Failed to start web server on port {}: {e}", self.config.port);
            }
        }
    }

    pub fn stop_server(&mut self) {
        if let Some(ref shutdown) = self.shutdown {
            shutdown.store(true, Ordering::Relaxed);
        }
        if let Some(handle) = self.accept_handle.take() {
            let _ = handle.join();
        }
        self.shutdown = None;
        if let Ok(mut clients) = self.clients.lock() {
            clients.clear();
        }
        self.client_count = 0;
    }

    /// Restart server (e.g., after port change).
    pub fn restart_server(&mut self) {
        self.stop_server();
        if self.config.enabled {
            self.start_server();
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        if enabled {
            self.start_server();
        } else {
            self.stop_server();
        }
        self.config.save();
    }

    pub fn is_running(&self) -> bool {
        self.shutdown
            .as_ref()
            .map_or(false, |s| !s.load(Ordering::Relaxed))
    }

    /// Main per-frame update. Drains WS messages, applies param sets to the
    /// session, and returns the triggers for the app to act on.
    pub fn update(&mut self, session: &mut Session) -> WebFrameResult {
        let mut result = WebFrameResult::empty();

        self.refresh_client_count();

        let Some(ref rx) = self.inbound_rx else {
            return result;
        };

        let messages: Vec<WsInMessage> = rx.try_iter().collect();
        if messages.is_empty() {
            return result;
        }

        self.last_activity = Some(Instant::now());

        for msg in messages {
            match msg {
                WsInMessage::SetParam { name, value } => {
                    if let Some(id) = ParamId::from_name(&name) {
                        session.set_normalized(id, value);
                    } else {
                        log::debug!("WS set for unknown param '{name}'");
                    }
                }
                WsInMessage::Trigger(action) => {
                    result.triggers.push(action);
                }
            }
        }

        result
    }

    /// Broadcast a JSON string to all connected clients. Prunes disconnected senders.
    pub fn broadcast_json(&self, json: &str) {
        if let Ok(mut clients) = self.clients.lock() {
            clients.retain(|tx| match tx.try_send(json.to_string()) {
                Ok(_) => true,
                Err(crossbeam_channel::TrySendError::Full(_)) => true, // backpressure, keep
                Err(crossbeam_channel::TrySendError::Disconnected(_)) => false, // dead
            });
        }
    }

    /// Broadcast audio features at 10Hz.
    pub fn broadcast_audio(&mut self, features: &AudioFeatures) {
        if self.client_count == 0 {
            return;
        }
        if self.last_audio_broadcast.elapsed().as_millis() < 100 {
            return;
        }
        self.last_audio_broadcast = Instant::now();

        let json = state::build_audio_snapshot(features);
        self.broadcast_json(&json);
    }

    /// Store the latest full state for initial sync on new connections, and
    /// rebroadcast it at 10Hz so OSC/keyboard/egui changes reach web clients.
    pub fn update_latest_state(&mut self, state_json: &str) {
        if let Ok(mut state) = self.latest_state.lock() {
            *state = state_json.to_string();
        }
        if self.client_count > 0 && self.last_state_broadcast.elapsed().as_millis() >= 100 {
            self.last_state_broadcast = Instant::now();
            self.broadcast_json(state_json);
        }
    }

    fn refresh_client_count(&mut self) {
        if let Ok(clients) = self.clients.lock() {
            self.client_count = clients.len();
        }
    }
}

impl Drop for WebSystem {
    fn drop(&mut self) {
        self.stop_server();
    }
}
