use bytemuck::{Pod, Zeroable};
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, BindGroupLayout, BindingResource, Buffer,
    Device, Queue, Sampler, TextureView,
};

/// Uniforms for the mix (composite) pass, packed for GPU consumption
/// (256 bytes). Must be kept in sync with the WGSL `MixUniforms` struct.
#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct MixUniforms {
    pub time: f32,
    pub delta_time: f32,
    pub resolution: [f32; 2],
    // 16 bytes

    // Mouse mirrors (normalized)
    pub mouse_x: f32,
    pub mouse_y: f32,
    pub mouse_click: f32,
    pub _pad0: f32,
    // 16 bytes (32 total)

    // Audio features
    pub bass: f32,
    pub mid: f32,
    pub treble: f32,
    pub rms: f32,
    pub peak: f32,
    pub onset: f32,
    pub centroid: f32,
    pub beat: f32,
    pub beat_phase: f32,
    pub bpm: f32,
    pub _pad1: [f32; 2],
    // 48 bytes (80 total)

    pub fg_color: [f32; 4],
    pub bg_color: [f32; 4],
    // 32 bytes (112 total)

    // Session-driven effect params
    pub glitch: f32,
    pub chromatic: f32,
    pub trixels: f32,
    pub pixelate: f32,
    pub vignette: f32,
    pub invert: f32,
    pub greyscale: f32,
    pub exposure: f32,
    pub zoom: f32,
    pub crossfade: f32,
    pub alpha: f32,
    pub steps: f32,
    pub ratio: f32,
    pub _pad2: [f32; 3],
    // 64 bytes (176 total)

    // Padding to 256 bytes
    pub _pad3: [f32; 20],
}

pub struct UniformBuffer {
    pub buffer: Buffer,
}

impl UniformBuffer {
    pub fn new(device: &Device) -> Self {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("mix-uniforms"),
            size: std::mem::size_of::<MixUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { buffer }
    }

    pub fn update(&self, queue: &Queue, uniforms: &MixUniforms) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Bind group with the uniforms plus the scene texture the mix pass reads.
    pub fn create_bind_group(
        &self,
        device: &Device,
        layout: &BindGroupLayout,
        scene_view: &TextureView,
        scene_sampler: &Sampler,
    ) -> BindGroup {
        device.create_bind_group(&BindGroupDescriptor {
            label: Some("mix-bind-group"),
            layout,
            entries: &[
                BindGroupEntry {
                    binding: 0,
                    resource: self.buffer.as_entire_binding(),
                },
                BindGroupEntry {
                    binding: 1,
                    resource: BindingResource::TextureView(scene_view),
                },
                BindGroupEntry {
                    binding: 2,
                    resource: BindingResource::Sampler(scene_sampler),
                },
            ],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_uniforms_size_256() {
        assert_eq!(std::mem::size_of::<MixUniforms>(), 256);
    }

    #[test]
    fn mix_uniforms_zeroed() {
        let u: MixUniforms = bytemuck::Zeroable::zeroed();
        assert_eq!(u.time, 0.0);
        assert_eq!(u.resolution, [0.0, 0.0]);
        assert_eq!(u.bass, 0.0);
        assert_eq!(u.fg_color, [0.0; 4]);
        assert_eq!(u.zoom, 0.0);
    }
}
