use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use wgpu::{
    Buffer, BufferDescriptor, BufferUsages, CommandEncoder, Device, Extent3d, Texture,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
};

use crate::gpu::fullscreen_quad::FULLSCREEN_TRIANGLE_VS_WITH_UV;

const BLIT_FS: &str = r#"
@group(0) @binding(0) var src_tex: texture_2d<f32>;
@group(0) @binding(1) var src_sampler: sampler;

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4f {
    return textureSample(src_tex, src_sampler, in.uv);
}
"#;

/// Samples the mix target into the BGRA capture texture, rescaling when the
/// output preset differs from the render resolution.
struct BlitPass {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl BlitPass {
    fn new(device: &Device, format: TextureFormat) -> Self {
        let source = format!("{FULLSCREEN_TRIANGLE_VS_WITH_UV}\n{BLIT_FS}");
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("ndi-blit-shader"),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("ndi-blit-bgl"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("ndi-blit-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("ndi-blit-pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ndi-blit-sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        Self {
            pipeline,
            bind_group_layout,
            sampler,
        }
    }

    fn render(
        &self,
        device: &Device,
        encoder: &mut CommandEncoder,
        src_view: &TextureView,
        dst_view: &TextureView,
    ) {
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("ndi-blit-bind-group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(src_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("ndi-blit-pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: dst_view,
                depth_slice: None,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}

/// GPU capture target with double-buffered staging for CPU readback.
pub struct NdiCapture {
    texture: Texture,
    view: TextureView,
    pub width: u32,
    pub height: u32,
    blit: BlitPass,
    staging: [Buffer; 2],
    /// Bytes per row, padded to wgpu's COPY_BYTES_PER_ROW_ALIGNMENT (256).
    padded_bytes_per_row: u32,
    unpadded_bytes_per_row: u32,
    current: usize,
    /// Whether a map has been requested on the "previous" buffer.
    map_pending: bool,
    /// Set by the map_async callback when the map completes.
    map_ready: Arc<AtomicBool>,
}

impl NdiCapture {
    pub fn new(device: &Device, width: u32, height: u32) -> Self {
        // NDI consumes BGRA, so the capture texture is always BGRA regardless
        // of the mix target format; the blit converts.
        let format = TextureFormat::Bgra8Unorm;

        let texture = device.create_texture(&TextureDescriptor {
            label: Some("ndi-capture"),
            size: Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: TextureDimension::D2,
            format,
            usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let unpadded_bytes_per_row = width * 4;
        let padded_bytes_per_row =
            align_to(unpadded_bytes_per_row, wgpu::COPY_BYTES_PER_ROW_ALIGNMENT);
        let buffer_size = u64::from(padded_bytes_per_row) * u64::from(height);

        let staging = [
            device.create_buffer(&BufferDescriptor {
                label: Some("ndi-staging-0"),
                size: buffer_size,
                usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
                mapped_at_creation: false,
            }),
            device.create_buffer(&BufferDescriptor {
                label: Some("ndi-staging-1"),
                size: buffer_size,
                usage: BufferUsages::COPY_DST | BufferUsages::MAP_READ,
                mapped_at_creation: false,
            }),
        ];

        Self {
            texture,
            view,
            width,
            height,
            blit: BlitPass::new(device, format),
            staging,
            padded_bytes_per_row,
            unpadded_bytes_per_row,
            current: 0,
            map_pending: false,
            map_ready: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Scale/convert the mix output into the capture texture.
    pub fn blit_from(
        &self,
        device: &Device,
        encoder: &mut CommandEncoder,
        src_view: &TextureView,
    ) {
        self.blit.render(device, encoder, src_view, &self.view);
    }

    /// Copy the capture texture to the current staging buffer.
    pub fn copy_to_staging(&self, encoder: &mut CommandEncoder) {
        encoder.copy_texture_to_buffer(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::TexelCopyBufferInfo {
                buffer: &self.staging[self.current],
                layout: wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Whether a map is still outstanding (caller skips capture if true).
    pub fn is_map_pending(&self) -> bool {
        self.map_pending
    }

    /// Request async map on the current staging buffer, then flip buffers.
    pub fn request_map(&mut self) {
        if self.map_pending {
            return;
        }
        let ready = Arc::new(AtomicBool::new(false));
        let ready_clone = ready.clone();
        let buf = &self.staging[self.current];
        buf.slice(..).map_async(wgpu::MapMode::Read, move |result| {
            if result.is_ok() {
                ready_clone.store(true, Ordering::Release);
            }
        });
        self.map_ready = ready;
        self.map_pending = true;
        self.current = 1 - self.current;
    }

    /// Non-blocking: try to read the previously-mapped staging buffer.
    /// Returns frame data (tightly packed BGRA rows) if ready.
    pub fn take_mapped_data(&mut self, device: &Device) -> Option<Vec<u8>> {
        if !self.map_pending {
            return None;
        }

        // Poll to drive the map callback. Non-blocking.
        let _ = device.poll(wgpu::PollType::Poll);

        if !self.map_ready.load(Ordering::Acquire) {
            return None; // Not ready yet, retry next frame.
        }

        // The "previous" buffer is the one we mapped (1 - current after flip).
        let prev = 1 - self.current;
        let buf = &self.staging[prev];

        let slice = buf.slice(..);
        let mapped = slice.get_mapped_range();

        let data = if self.padded_bytes_per_row == self.unpadded_bytes_per_row {
            mapped.to_vec()
        } else {
            // Strip row padding.
            let mut out =
                Vec::with_capacity((self.unpadded_bytes_per_row * self.height) as usize);
            for row in 0..self.height {
                let start = (row * self.padded_bytes_per_row) as usize;
                let end = start + self.unpadded_bytes_per_row as usize;
                out.extend_from_slice(&mapped[start..end]);
            }
            out
        };

        drop(mapped);
        buf.unmap();
        self.map_pending = false;

        Some(data)
    }

}

/// Align `value` up to the next multiple of `alignment`.
fn align_to(value: u32, alignment: u32) -> u32 {
    (value + alignment - 1) & !(alignment - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_to_copy_alignment() {
        assert_eq!(align_to(1280 * 4, 256), 5120);
        assert_eq!(align_to(1279 * 4, 256), 5120);
        assert_eq!(align_to(1, 256), 256);
        assert_eq!(align_to(256, 256), 256);
    }
}
