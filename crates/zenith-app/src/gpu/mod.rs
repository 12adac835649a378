pub mod context;
pub mod fullscreen_quad;
pub mod mesh;
pub mod mix;
pub mod render_target;
pub mod scene;
pub mod uniforms;

pub use context::GpuContext;
pub use render_target::RenderTarget;
