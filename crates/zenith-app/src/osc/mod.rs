pub mod receiver;
pub mod sender;
pub mod types;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use crossbeam_channel::Receiver;

use self::sender::OscSender;
use self::types::{OscConfig, OscInMessage, OscLearnTarget, OscMapping, TriggerAction};
use crate::audio::features::AudioFeatures;
use crate::session::{ParamId, Session};

/// Result of a single OscSystem::update() call.
pub struct OscFrameResult {
    pub triggers: Vec<TriggerAction>,
}

impl OscFrameResult {
    fn empty() -> Self {
        Self {
            triggers: Vec::new(),
        }
    }
}

/// Central OSC system: owns receiver thread, sender, config, learn state.
pub struct OscSystem {
    receiver: Option<Receiver<OscInMessage>>,
    shutdown: Option<Arc<AtomicBool>>,
    thread_handle: Option<JoinHandle<()>>,
    pub sender: OscSender,
    pub config: OscConfig,
    pub learn_target: Option<OscLearnTarget>,
    pub last_activity: Option<Instant>,
    pub last_address: Option<String>,
    last_tx_time: Instant,
}

impl OscSystem {
    pub fn new() -> Self {
        let config = OscConfig::load();
        let mut sys = Self {
            receiver: None,
            shutdown: None,
            thread_handle: None,
            sender: OscSender::new(),
            config,
            learn_target: None,
            last_activity: None,
            last_address: None,
            last_tx_time: Instant::now(),
        };

        if sys.config.enabled {
            sys.start_receiver();
        }
        if sys.config.tx_enabled {
            sys.sender.configure(&sys.config.tx_host, sys.config.tx_port);
        }

        sys
    }

    pub fn start_receiver(&mut self) {
        self.stop_receiver();
        let (tx, rx) = crossbeam_channel::bounded(64);
        match receiver::spawn_receiver(self.config.rx_port, tx) {
            Ok((shutdown, handle)) => {
                self.receiver = Some(rx);
                self.shutdown = Some(shutdown);
                self.thread_handle = Some(handle);
            }
            Err(e) => {
                log::error!(
                    "Failed to start OSC receiver on port {}: {e}",
                    self.config.rx_port
                );
            }
        }
    }

    pub fn stop_receiver(&mut self) {
        if let Some(ref shutdown) = self.shutdown {
            shutdown.store(true, Ordering::Relaxed);
        }
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
        self.receiver = None;
        self.shutdown = None;
        self.last_address = None;
    }

    /// Restart receiver (e.g., after port change).
    pub fn restart_receiver(&mut self) {
        self.stop_receiver();
        if self.config.enabled {
            self.start_receiver();
        }
    }

    /// Whether we've received OSC activity within the last 300ms.
    pub fn is_recently_active(&self) -> bool {
        self.last_activity
            .map(|t| t.elapsed().as_millis() < 300)
            .unwrap_or(false)
    }

    pub fn start_learn(&mut self, target: OscLearnTarget) {
        self.learn_target = Some(target);
    }

    pub fn cancel_learn(&mut self) {
        self.learn_target = None;
    }

    pub fn clear_param_mapping(&mut self, name: &str) {
        self.config.params.remove(name);
        self.config.save();
    }

    pub fn clear_trigger_mapping(&mut self, action: TriggerAction) {
        self.config.triggers.remove(&action);
        self.config.save();
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.config.enabled = enabled;
        if enabled {
            self.start_receiver();
        } else {
            self.stop_receiver();
        }
        self.config.save();
    }

    pub fn set_tx_enabled(&mut self, enabled: bool) {
        self.config.tx_enabled = enabled;
        if enabled {
            self.sender.configure(&self.config.tx_host, self.config.tx_port);
        } else {
            self.sender.disable();
        }
        self.config.save();
    }

    /// Main per-frame update: drain inbound messages, apply parameter sets
    /// to the session (0-1 values scaled to each param's range), and return
    /// the triggers for the app to act on.
    pub fn update(&mut self, session: &mut Session) -> OscFrameResult {
        let mut result = OscFrameResult::empty();

        let Some(ref rx) = self.receiver else {
            return result;
        };

        let messages: Vec<OscInMessage> = rx.try_iter().collect();
        if messages.is_empty() {
            return result;
        }

        self.last_activity = Some(Instant::now());

        if !self.config.enabled {
            if let Some(msg) = messages.last() {
                self.last_address = Some(msg_address(msg));
            }
            return result;
        }

        for msg in messages {
            let address = msg_address(&msg);
            self.last_address = Some(address.clone());

            // OSC learn mode
            if let Some(ref target) = self.learn_target.clone() {
                let mapping = OscMapping {
                    address: address.clone(),
                };
                match target {
                    OscLearnTarget::Param(name) => {
                        self.config.params.insert(name.clone(), mapping);
                    }
                    OscLearnTarget::Trigger(action) => {
                        self.config.triggers.insert(*action, mapping);
                    }
                }
                self.learn_target = None;
                self.config.save();
                log::info!("OSC learned: {address} -> {target:?}");
                continue;
            }

            match msg {
                OscInMessage::Param { name, value } => {
                    apply_param(session, &name, value);
                }
                OscInMessage::Trigger(action) => {
                    result.triggers.push(action);
                }
                OscInMessage::Raw { ref address, value } => {
                    if let Some(name) = self.config.find_param(address) {
                        let name = name.to_string();
                        apply_param(session, &name, value);
                    } else if let Some(action) = self.config.find_trigger(address) {
                        if value > 0.5 {
                            result.triggers.push(action);
                        }
                    }
                }
            }
        }

        result
    }

    /// Send outbound state if TX is enabled and rate-limited.
    pub fn send_state(&mut self, features: &AudioFeatures, mesh_name: &str, warp_edit: bool) {
        if !self.config.tx_enabled {
            return;
        }
        let interval_ms = 1000 / self.config.tx_rate_hz.max(1);
        if self.last_tx_time.elapsed().as_millis() < u128::from(interval_ms) {
            return;
        }
        self.last_tx_time = Instant::now();
        self.sender.send_audio(features);
        self.sender.send_state(mesh_name, warp_edit);
    }
}

impl Drop for OscSystem {
    fn drop(&mut self) {
        self.stop_receiver();
    }
}

/// Extract address string from any OscInMessage variant.
fn msg_address(msg: &OscInMessage) -> String {
    match msg {
        OscInMessage::Param { name, .. } => format!("/zenith/param/{name}"),
        OscInMessage::Trigger(action) => format!("/zenith/trigger/{}", action.slug()),
        OscInMessage::Raw { address, .. } => address.clone(),
    }
}

fn apply_param(session: &mut Session, name: &str, value: f32) {
    if let Some(id) = ParamId::from_name(name) {
        session.set_normalized(id, value);
    } else {
        log::debug!("OSC set for unknown param '{name}'");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::params::meta;

    #[test]
    fn msg_address_variants() {
        let p = OscInMessage::Param {
            name: "zoom".into(),
            value: 0.5,
        };
        assert_eq!(msg_address(&p), "/zenith/param/zoom");

        let t = OscInMessage::Trigger(TriggerAction::SaveKeyframe);
        assert_eq!(msg_address(&t), "/zenith/trigger/save_keyframe");

        let r = OscInMessage::Raw {
            address: "/pad/3".into(),
            value: 1.0,
        };
        assert_eq!(msg_address(&r), "/pad/3");
    }

    #[test]
    fn apply_param_scales_normalized_value() {
        let mut s = Session::new();
        apply_param(&mut s, "bpm", 1.0);
        assert_eq!(s.get(ParamId::Bpm), meta(ParamId::Bpm).max);
        apply_param(&mut s, "bpm", 0.0);
        assert_eq!(s.get(ParamId::Bpm), meta(ParamId::Bpm).min);
    }

    #[test]
    fn apply_param_ignores_unknown_names() {
        let mut s = Session::new();
        let before = s.snapshot();
        apply_param(&mut s, "not_a_param", 0.9);
        assert_eq!(s.snapshot(), before);
    }
}
