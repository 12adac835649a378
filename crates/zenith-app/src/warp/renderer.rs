//! Draws each warp as a subdivided textured mesh onto the surface. The mesh
//! bakes the full warp mapping (homography plus bilinear grid) into vertex
//! positions, so the fragment stage is a plain textured draw with a
//! per-warp brightness multiplier.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use wgpu::{Device, Queue, RenderPass, Sampler, TextureFormat, TextureView};

use super::{Warp, WarpList, MESH_RES_X, MESH_RES_Y};

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct WarpVertex {
    pos: [f32; 2],
    uv: [f32; 2],
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct WarpUniforms {
    brightness: f32,
    _pad: [f32; 3],
}

const WARP_SHADER: &str = r#"
struct WarpUniforms {
    brightness: f32,
}

@group(0) @binding(0) var<uniform> u: WarpUniforms;
@group(0) @binding(1) var src_tex: texture_2d<f32>;
@group(0) @binding(2) var src_samp: sampler;

struct VertexOutput {
    @builtin(position) position: vec4f,
    @location(0) uv: vec2f,
}

@vertex
fn vs_main(@location(0) pos: vec2f, @location(1) uv: vec2f) -> VertexOutput {
    var out: VertexOutput;
    // Normalized window coords (0..1, y-down) to clip space.
    out.position = vec4f(pos.x * 2.0 - 1.0, 1.0 - pos.y * 2.0, 0.0, 1.0);
    out.uv = uv;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4f {
    let c = textureSample(src_tex, src_samp, in.uv);
    return vec4f(c.rgb * u.brightness, c.a);
}
"#;

/// Per-warp GPU resources, rebuilt when the warp geometry generation moves.
struct WarpGpu {
    vertex_buffer: wgpu::Buffer,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

pub struct WarpRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    warps: Vec<WarpGpu>,
    uploaded_generation: Option<u64>,
}

impl WarpRenderer {
    pub fn new(device: &Device, surface_format: TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("warp-shader"),
            source: wgpu::ShaderSource::Wgsl(WARP_SHADER.into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("warp-bind-group-layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Buffer {
                            ty: wgpu::BufferBindingType::Uniform,
                            has_dynamic_offset: false,
                            min_binding_size: None,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 2,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("warp-pipeline-layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let vertex_layout = wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<WarpVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2],
        };

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("warp-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[vertex_layout],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("warp-index-buffer"),
            contents: bytemuck::cast_slice(&grid_indices()),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            pipeline,
            bind_group_layout,
            index_buffer,
            index_count: (MESH_RES_X * MESH_RES_Y * 6),
            warps: Vec::new(),
            uploaded_generation: None,
        }
    }


    /// Upload vertex data and bind groups for the current warp list. Cheap
    /// when nothing changed since the last call.
    pub fn prepare(
        &mut self,
        device: &Device,
        queue: &Queue,
        warps: &WarpList,
        src_view: &TextureView,
        src_sampler: &Sampler,
    ) {
        let dirty = self.uploaded_generation != Some(warps.generation)
            || self.warps.len() != warps.warps.len();
        if !dirty {
            return;
        }

        self.warps.clear();
        for (i, warp) in warps.warps.iter().enumerate() {
            let vertices = warp_mesh(warp);
            let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("warp-{i}-vertices")),
                contents: bytemuck::cast_slice(&vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
            let uniforms = WarpUniforms {
                brightness: warp.brightness,
                _pad: [0.0; 3],
            };
            let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("warp-{i}-uniforms")),
                contents: bytemuck::bytes_of(&uniforms),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
            let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("warp-{i}-bind-group")),
                layout: &self.bind_group_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(src_view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 2,
                        resource: wgpu::BindingResource::Sampler(src_sampler),
                    },
                ],
            });
            self.warps.push(WarpGpu {
                vertex_buffer,
                uniform_buffer,
                bind_group,
            });
        }
        // Brightness can change without a geometry rebuild.
        for (gpu, warp) in self.warps.iter().zip(warps.warps.iter()) {
            let uniforms = WarpUniforms {
                brightness: warp.brightness,
                _pad: [0.0; 3],
            };
            queue.write_buffer(&gpu.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));
        }
        self.uploaded_generation = Some(warps.generation);
    }

    pub fn draw(&self, pass: &mut RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
        for gpu in &self.warps {
            pass.set_bind_group(0, &gpu.bind_group, &[]);
            pass.set_vertex_buffer(0, gpu.vertex_buffer.slice(..));
            pass.draw_indexed(0..self.index_count, 0, 0..1);
        }
    }
}

/// Tessellate one warp into a (MESH_RES_X+1) x (MESH_RES_Y+1) vertex grid.
/// Positions are the warped destination points, UVs sample the warp's
/// source sub-rectangle.
fn warp_mesh(warp: &Warp) -> Vec<WarpVertex> {
    let mut vertices = Vec::with_capacity(((MESH_RES_X + 1) * (MESH_RES_Y + 1)) as usize);
    for y in 0..=MESH_RES_Y {
        for x in 0..=MESH_RES_X {
            let u = x as f32 / MESH_RES_X as f32;
            let v = y as f32 / MESH_RES_Y as f32;
            let pos = warp.map_unit(u, v);
            let uv = warp.src_rect.lerp(u, v);
            vertices.push(WarpVertex {
                pos: [pos.x, pos.y],
                uv: [uv.x, uv.y],
            });
        }
    }
    vertices
}

/// Shared index buffer for the vertex grid (two triangles per cell).
fn grid_indices() -> Vec<u16> {
    let stride = MESH_RES_X + 1;
    let mut indices = Vec::with_capacity((MESH_RES_X * MESH_RES_Y * 6) as usize);
    for y in 0..MESH_RES_Y {
        for x in 0..MESH_RES_X {
            let i0 = (y * stride + x) as u16;
            let i1 = i0 + 1;
            let i2 = i0 + stride as u16;
            let i3 = i2 + 1;
            indices.extend_from_slice(&[i0, i2, i1, i1, i2, i3]);
        }
    }
    indices
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    #[test]
    fn mesh_has_expected_vertex_count() {
        let verts = warp_mesh(&Warp::default());
        assert_eq!(
            verts.len(),
            ((MESH_RES_X + 1) * (MESH_RES_Y + 1)) as usize
        );
    }

    #[test]
    fn identity_warp_mesh_spans_unit_square() {
        let verts = warp_mesh(&Warp::default());
        let first = verts.first().unwrap();
        let last = verts.last().unwrap();
        assert!((Vec2::from(first.pos) - Vec2::ZERO).length() < 1e-5);
        assert!((Vec2::from(last.pos) - Vec2::ONE).length() < 1e-5);
    }

    #[test]
    fn split_rect_shapes_uvs() {
        let mut warp = Warp::default();
        warp.src_rect = super::super::SrcRect {
            min: Vec2::new(0.5, 0.0),
            max: Vec2::new(1.0, 1.0),
        };
        let verts = warp_mesh(&warp);
        assert!((verts.first().unwrap().uv[0] - 0.5).abs() < 1e-6);
        assert!((verts.last().unwrap().uv[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn indices_stay_in_bounds() {
        let indices = grid_indices();
        let vertex_count = ((MESH_RES_X + 1) * (MESH_RES_Y + 1)) as u16;
        assert_eq!(indices.len(), (MESH_RES_X * MESH_RES_Y * 6) as usize);
        assert!(indices.iter().all(|i| *i < vertex_count));
    }
}
