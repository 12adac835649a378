use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::osc::types::TriggerAction;

/// Inbound message from a WebSocket client.
#[derive(Debug, Clone)]
pub enum WsInMessage {
    /// Set a session parameter (normalized 0-1).
    SetParam { name: String, value: f32 },
    /// Fire a trigger action.
    Trigger(TriggerAction),
}

/// Result of WebSystem::update() — mirrors OscFrameResult.
pub struct WebFrameResult {
    pub triggers: Vec<TriggerAction>,
}

impl WebFrameResult {
    pub fn empty() -> Self {
        Self {
            triggers: Vec::new(),
        }
    }
}

/// Persisted WebSocket server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_version() -> u32 { 1 }
fn default_true() -> bool { true }
fn default_port() -> u16 { 9321 }

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            version: 1,
            enabled: true,
            port: 9321,
        }
    }
}

impl WebConfig {
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("zenith").join("web.json")
    }

    pub fn load() -> Self {
        let path = Self::config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded web config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse web config: {e}");
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("No web config found, using defaults");
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
                    log::error!("Failed to write web config: {e}");
                }
            }
            Err(e) => log::error!("Failed to serialize web config: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn web_config_defaults() {
        let c = WebConfig::default();
        assert!(c.enabled);
        assert_eq!(c.port, 9321);
    }

    #[test]
    fn web_config_partial_json_defaults() {
        let json = r#"{"port": 8080}"#;
        let c: WebConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.port, 8080);
        assert!(c.enabled);
        assert_eq!(c.version, 1);
    }

    #[test]
    fn web_frame_result_empty() {
        let r = WebFrameResult::empty();
        assert!(r.triggers.is_empty());
    }
}
