pub mod watcher;

pub use watcher::ShaderWatcher;

use std::path::Path;

/// Embedded fallbacks so the app renders even without an assets directory.
pub const SCENE_SHADER_FALLBACK: &str = include_str!("../../../../assets/shaders/scene.wgsl");
pub const MIX_SHADER_FALLBACK: &str = include_str!("../../../../assets/shaders/mix.wgsl");

/// Load a shader from assets/shaders, falling back to the embedded source.
pub fn load_shader_source(file_name: &str, fallback: &'static str) -> String {
    let path = crate::assets::assets_dir().join("shaders").join(file_name);
    load_from(&path, fallback)
}

fn load_from(path: &Path, fallback: &'static str) -> String {
    match std::fs::read_to_string(path) {
        Ok(source) => {
            log::info!("Loaded shader {}", path.display());
            source
        }
        Err(e) => {
            log::warn!("Shader {} unavailable ({e}), using embedded fallback", path.display());
            fallback.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_uses_fallback() {
        let src = load_from(Path::new("/nonexistent/zenith/mix.wgsl"), MIX_SHADER_FALLBACK);
        assert_eq!(src, MIX_SHADER_FALLBACK);
    }

    #[test]
    fn existing_file_is_preferred() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mix.wgsl");
        std::fs::write(&path, "// custom").unwrap();
        let src = load_from(&path, MIX_SHADER_FALLBACK);
        assert_eq!(src, "// custom");
    }

    #[test]
    fn fallbacks_are_nonempty() {
        assert!(SCENE_SHADER_FALLBACK.contains("fn vs_main"));
        assert!(MIX_SHADER_FALLBACK.contains("fn fs_main"));
    }
}
