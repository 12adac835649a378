use serde::{Deserialize, Serialize};

use crate::ui::theme::ThemeMode;

/// App-level settings: render resolution, theme, audio device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsConfig {
    pub version: u32,
    #[serde(default = "default_render_width")]
    pub render_width: u32,
    #[serde(default = "default_render_height")]
    pub render_height: u32,
    pub theme: ThemeMode,
    #[serde(default)]
    pub audio_device: Option<String>,
}

fn default_render_width() -> u32 { 1280 }
fn default_render_height() -> u32 { 720 }

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            version: 1,
            render_width: 1280,
            render_height: 720,
            theme: ThemeMode::Dark,
            audio_device: None,
        }
    }
}

impl SettingsConfig {
    pub fn load() -> Self {
        let Some(config_dir) = dirs::config_dir() else {
            return Self::first_run();
        };
        let path = config_dir.join("zenith").join("settings.json");
        match std::fs::read_to_string(&path) {
            Ok(json) => serde_json::from_str(&json).unwrap_or_default(),
            Err(_) => Self::first_run(),
        }
    }

    /// No settings file yet: follow the OS light/dark preference.
    fn first_run() -> Self {
        Self {
            theme: ThemeMode::from_system(),
            ..Self::default()
        }
    }

    pub fn save(&self) {
        let Some(config_dir) = dirs::config_dir() else {
            return;
        };
        let dir = config_dir.join("zenith");
        let _ = std::fs::create_dir_all(&dir);
        let path = dir.join("settings.json");
        if let Ok(json) = serde_json::to_string_pretty(self) {
            let _ = std::fs::write(path, json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = SettingsConfig::default();
        assert_eq!(s.render_width, 1280);
        assert_eq!(s.render_height, 720);
        assert!(s.audio_device.is_none());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let json = r#"{"version":1,"theme":"Dark"}"#;
        let s: SettingsConfig = serde_json::from_str(json).unwrap();
        assert_eq!(s.render_width, 1280);
        assert!(s.audio_device.is_none());
    }
}
