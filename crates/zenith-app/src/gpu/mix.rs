//! Mix pass: a fullscreen fragment shader that composites the scene texture
//! with the session's color and effect parameters. The fragment source is
//! hot-reloadable; a failed reload keeps the previous working pipeline.

use anyhow::Result;
use wgpu::{
    BindGroupLayout, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType,
    BufferBindingType, ColorTargetState, Device, FragmentState, MultisampleState,
    PipelineCompilationOptions, PipelineLayoutDescriptor, PrimitiveState, RenderPipeline,
    SamplerBindingType, ShaderModule, ShaderStages, TextureFormat, TextureSampleType,
    TextureViewDimension, VertexState,
};

use super::fullscreen_quad::FULLSCREEN_TRIANGLE_VS_WITH_UV;

pub struct MixPipeline {
    pub pipeline: RenderPipeline,
    pub bind_group_layout: BindGroupLayout,
    format: TextureFormat,
}

impl MixPipeline {
    pub fn new(device: &Device, format: TextureFormat, fragment_source: &str) -> Result<Self> {
        let bind_group_layout = Self::create_bind_group_layout(device);

        let module = Self::create_module(device, fragment_source);
        let pipeline = Self::create_pipeline(device, format, &bind_group_layout, &module);

        Ok(Self {
            pipeline,
            bind_group_layout,
            format,
        })
    }

    /// Swap in new fragment source. Validation runs inside an error scope so
    /// a broken shader reports its error and leaves the old pipeline active.
    pub fn reload(&mut self, device: &Device, fragment_source: &str) -> Result<(), String> {
        device.push_error_scope(wgpu::ErrorFilter::Validation);
        let module = Self::create_module(device, fragment_source);
        let pipeline =
            Self::create_pipeline(device, self.format, &self.bind_group_layout, &module);
        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(error.to_string());
        }
        self.pipeline = pipeline;
        Ok(())
    }

    fn create_module(device: &Device, fragment_source: &str) -> ShaderModule {
        // Combine vertex + fragment into one module
        let full_source = format!("{}\n{}", FULLSCREEN_TRIANGLE_VS_WITH_UV, fragment_source);
        device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mix-shader"),
            source: wgpu::ShaderSource::Wgsl(full_source.into()),
        })
    }

    fn create_bind_group_layout(device: &Device) -> BindGroupLayout {
        device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("mix-bind-group-layout"),
            entries: &[
                BindGroupLayoutEntry {
                    binding: 0,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Buffer {
                        ty: BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 1,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Texture {
                        sample_type: TextureSampleType::Float { filterable: true },
                        view_dimension: TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                BindGroupLayoutEntry {
                    binding: 2,
                    visibility: ShaderStages::FRAGMENT,
                    ty: BindingType::Sampler(SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        })
    }

    fn create_pipeline(
        device: &Device,
        format: TextureFormat,
        bind_group_layout: &BindGroupLayout,
        module: &ShaderModule,
    ) -> RenderPipeline {
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("mix-pipeline-layout"),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("mix-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module,
                entry_point: Some("vs_main"),
                buffers: &[],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: PrimitiveState::default(),
            depth_stencil: None,
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        })
    }
}
