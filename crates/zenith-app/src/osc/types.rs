use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Discrete actions a control surface can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerAction {
    NextMesh,
    PrevMesh,
    ToggleWarpEdit,
    ToggleOverlay,
    SaveKeyframe,
    ToggleSplitVertical,
    ToggleSplitHorizontal,
    ResetSplit,
    TogglePlayback,
}

impl TriggerAction {
    pub fn slug(self) -> &'static str {
        match self {
            TriggerAction::NextMesh => "next_mesh",
            TriggerAction::PrevMesh => "prev_mesh",
            TriggerAction::ToggleWarpEdit => "toggle_warp_edit",
            TriggerAction::ToggleOverlay => "toggle_overlay",
            TriggerAction::SaveKeyframe => "save_keyframe",
            TriggerAction::ToggleSplitVertical => "toggle_split_v",
            TriggerAction::ToggleSplitHorizontal => "toggle_split_h",
            TriggerAction::ResetSplit => "reset_split",
            TriggerAction::TogglePlayback => "toggle_playback",
        }
    }

    pub fn from_slug(slug: &str) -> Option<TriggerAction> {
        match slug {
            "next_mesh" => Some(TriggerAction::NextMesh),
            "prev_mesh" => Some(TriggerAction::PrevMesh),
            "toggle_warp_edit" => Some(TriggerAction::ToggleWarpEdit),
            "toggle_overlay" => Some(TriggerAction::ToggleOverlay),
            "save_keyframe" => Some(TriggerAction::SaveKeyframe),
            "toggle_split_v" => Some(TriggerAction::ToggleSplitVertical),
            "toggle_split_h" => Some(TriggerAction::ToggleSplitHorizontal),
            "reset_split" => Some(TriggerAction::ResetSplit),
            "toggle_playback" => Some(TriggerAction::TogglePlayback),
            _ => None,
        }
    }
}

/// Parsed inbound OSC message.
#[derive(Debug, Clone)]
pub enum OscInMessage {
    /// Set a session parameter (0-1 normalized): /zenith/param/{name}
    Param { name: String, value: f32 },
    /// Fire a trigger: /zenith/trigger/{action_name}
    Trigger(TriggerAction),
    /// Unrecognized address (captured for learn mode)
    Raw { address: String, value: f32 },
}

/// What we're learning an OSC mapping for.
#[derive(Debug, Clone, PartialEq)]
pub enum OscLearnTarget {
    Param(String),
    Trigger(TriggerAction),
}

/// A single OSC address → parameter or trigger mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OscMapping {
    pub address: String,
}

/// Persisted OSC configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OscConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_rx_port")]
    pub rx_port: u16,
    #[serde(default = "default_tx_port")]
    pub tx_port: u16,
    #[serde(default = "default_tx_host")]
    pub tx_host: String,
    #[serde(default)]
    pub tx_enabled: bool,
    #[serde(default = "default_tx_rate")]
    pub tx_rate_hz: u32,
    #[serde(default)]
    pub params: HashMap<String, OscMapping>,
    #[serde(default)]
    pub triggers: HashMap<TriggerAction, OscMapping>,
}

fn default_version() -> u32 { 1 }
fn default_true() -> bool { true }
fn default_rx_port() -> u16 { 9000 }
fn default_tx_port() -> u16 { 9001 }
fn default_tx_host() -> String { "127.0.0.1".to_string() }
fn default_tx_rate() -> u32 { 10 }

impl Default for OscConfig {
    fn default() -> Self {
        Self {
            version: 1,
            enabled: true,
            rx_port: 9000,
            tx_port: 9001,
            tx_host: "127.0.0.1".to_string(),
            tx_enabled: false,
            tx_rate_hz: 10,
            params: HashMap::new(),
            triggers: HashMap::new(),
        }
    }
}

impl OscConfig {
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("zenith").join("osc.json")
    }

    pub fn load() -> Self {
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded OSC config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse OSC config: {e}");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No OSC config found, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                log::error!("Failed to create config dir: {e}");
                return;
            }
        }
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    log::error!("Failed to write OSC config: {e}");
                }
            }
            Err(e) => log::error!("Failed to serialize OSC config: {e}"),
        }
    }

    /// Find which param name is mapped to the given OSC address.
    pub fn find_param(&self, address: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(_, m)| m.address == address)
            .map(|(name, _)| name.as_str())
    }

    /// Find which trigger action is mapped to the given OSC address.
    pub fn find_trigger(&self, address: &str) -> Option<TriggerAction> {
        self.triggers
            .iter()
            .find(|(_, m)| m.address == address)
            .map(|(action, _)| *action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osc_config_defaults() {
        let c = OscConfig::default();
        assert_eq!(c.rx_port, 9000);
        assert_eq!(c.tx_port, 9001);
        assert!(!c.tx_enabled);
        assert!(c.enabled);
        assert_eq!(c.tx_rate_hz, 10);
    }

    #[test]
    fn osc_config_partial_json_defaults() {
        let json = r#"{"rx_port": 8000}"#;
        let c: OscConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.rx_port, 8000);
        assert_eq!(c.tx_port, 9001);
        assert!(c.enabled);
    }

    #[test]
    fn trigger_slug_roundtrip() {
        for action in [
            TriggerAction::NextMesh,
            TriggerAction::PrevMesh,
            TriggerAction::ToggleWarpEdit,
            TriggerAction::ToggleOverlay,
            TriggerAction::SaveKeyframe,
            TriggerAction::ToggleSplitVertical,
            TriggerAction::ToggleSplitHorizontal,
            TriggerAction::ResetSplit,
            TriggerAction::TogglePlayback,
        ] {
            assert_eq!(TriggerAction::from_slug(action.slug()), Some(action));
        }
        assert_eq!(TriggerAction::from_slug("nope"), None);
    }

    #[test]
    fn find_param_and_trigger() {
        let mut c = OscConfig::default();
        c.params.insert(
            "zoom".into(),
            OscMapping { address: "/fader/1".into() },
        );
        c.triggers.insert(
            TriggerAction::NextMesh,
            OscMapping { address: "/pad/1".into() },
        );
        assert_eq!(c.find_param("/fader/1"), Some("zoom"));
        assert_eq!(c.find_param("/fader/2"), None);
        assert_eq!(c.find_trigger("/pad/1"), Some(TriggerAction::NextMesh));
        assert_eq!(c.find_trigger("/pad/2"), None);
    }
}
