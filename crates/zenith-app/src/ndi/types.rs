use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Output resolution for the NDI feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum OutputResolution {
    /// Follow the mix render target.
    #[default]
    FollowRender,
    Hd720,
    Hd1080,
    Uhd4k,
}

impl OutputResolution {
    pub const ALL: &[OutputResolution] = &[
        OutputResolution::FollowRender,
        OutputResolution::Hd720,
        OutputResolution::Hd1080,
        OutputResolution::Uhd4k,
    ];

    pub fn dimensions(self, render_w: u32, render_h: u32) -> (u32, u32) {
        match self {
            OutputResolution::FollowRender => (render_w, render_h),
            OutputResolution::Hd720 => (1280, 720),
            OutputResolution::Hd1080 => (1920, 1080),
            OutputResolution::Uhd4k => (3840, 2160),
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            OutputResolution::FollowRender => "Match Render",
            OutputResolution::Hd720 => "720p",
            OutputResolution::Hd1080 => "1080p",
            OutputResolution::Uhd4k => "4K",
        }
    }
}

/// Persisted NDI output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NdiConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_source_name")]
    pub source_name: String,
    #[serde(default)]
    pub resolution: OutputResolution,
}

fn default_source_name() -> String {
    "Zenith".to_string()
}

impl Default for NdiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            source_name: default_source_name(),
            resolution: OutputResolution::default(),
        }
    }
}

impl NdiConfig {
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        config_dir.join("zenith").join("ndi.json")
    }

    pub fn load() -> Self {
        let path = Self::config_path();
        std::fs::read_to_string(&path)
            .ok()
            .and_then(|contents| match serde_json::from_str(&contents) {
                Ok(config) => {
                    log::info!("Loaded NDI config from {}", path.display());
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse NDI config: {e}");
                    None
                }
            })
            .unwrap_or_default()
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
                    log::error!("Failed to write NDI config: {e}");
                }
            }
            Err(e) => log::error!("Failed to serialize NDI config: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follow_render_passes_through() {
        assert_eq!(
            OutputResolution::FollowRender.dimensions(800, 600),
            (800, 600)
        );
        assert_eq!(
            OutputResolution::FollowRender.dimensions(1280, 720),
            (1280, 720)
        );
    }

    #[test]
    fn fixed_presets_ignore_render_size() {
        assert_eq!(OutputResolution::Hd720.dimensions(800, 600), (1280, 720));
        assert_eq!(OutputResolution::Hd1080.dimensions(800, 600), (1920, 1080));
        assert_eq!(OutputResolution::Uhd4k.dimensions(800, 600), (3840, 2160));
    }

    #[test]
    fn ndi_config_defaults() {
        let c = NdiConfig::default();
        assert!(!c.enabled);
        assert_eq!(c.source_name, "Zenith");
        assert_eq!(c.resolution, OutputResolution::FollowRender);
    }

    #[test]
    fn ndi_config_serde_roundtrip() {
        let c = NdiConfig {
            enabled: true,
            source_name: "Main Out".into(),
            resolution: OutputResolution::Hd1080,
        };
        let json = serde_json::to_string(&c).unwrap();
        let c2: NdiConfig = serde_json::from_str(&json).unwrap();
        assert!(c2.enabled);
        assert_eq!(c2.source_name, "Main Out");
        assert_eq!(c2.resolution, OutputResolution::Hd1080);
    }
}
