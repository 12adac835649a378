use egui::Visuals;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

impl ThemeMode {
    pub const ALL: &[ThemeMode] = &[ThemeMode::Dark, ThemeMode::Light];

    pub fn display_name(&self) -> &'static str {
        match self {
            ThemeMode::Dark => "Dark",
            ThemeMode::Light => "Light",
        }
    }

    pub fn visuals(&self) -> Visuals {
        match self {
            ThemeMode::Dark => Visuals::dark(),
            ThemeMode::Light => Visuals::light(),
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    /// Pick a theme from the OS preference, defaulting to dark.
    pub fn from_system() -> Self {
        match dark_light::detect() {
            Ok(dark_light::Mode::Light) => ThemeMode::Light,
            _ => ThemeMode::Dark,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips() {
        assert_eq!(ThemeMode::Dark.toggle(), ThemeMode::Light);
        assert_eq!(ThemeMode::Light.toggle(), ThemeMode::Dark);
    }

    #[test]
    fn system_detection_yields_known_mode() {
        assert!(ThemeMode::ALL.contains(&ThemeMode::from_system()));
    }

    #[test]
    fn serde_roundtrip() {
        let json = serde_json::to_string(&ThemeMode::Light).unwrap();
        let back: ThemeMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ThemeMode::Light);
    }
}
