use wgpu::{
    DepthBiasState, Device, MultisampleState, PipelineCompilationOptions, RenderPassDescriptor,
    ShaderSource, StencilState,
};

use crate::rendering::{
    render_model::{INSTANCE_VBL, MODEL_PRIMITIVE_STATE, RENDER_MODEL_VBL},
    shader_loader::{PipelineCache, PipelineCacheBuilder, PipelineId, ShaderDefinition},
    texture::DepthTexture,
};

const STANDARD_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Standard Shader",
    path: "standard.wgsl",
};

/// Bind groups the standard shader reads, in slot order.
pub struct SceneBindGroupLayouts<'a> {
    pub camera: &'a wgpu::BindGroupLayout,
    pub lights: &'a wgpu::BindGroupLayout,
    pub material: &'a wgpu::BindGroupLayout,
}

pub struct SceneTextureViews<'a> {
    pub color: &'a wgpu::TextureView,
    pub depth: &'a wgpu::TextureView,
}

/// Forward pass drawing every mesh with the lit standard material.
pub struct ScenePass {
    pipeline_id: PipelineId,
}

impl ScenePass {
    pub fn create(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        layouts: SceneBindGroupLayouts,
        cache_builder: &mut PipelineCacheBuilder,
    ) -> Self {
        let render_pipeline_layout =
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Standard shader render pipeline layout"),
                bind_group_layouts: &[layouts.camera, layouts.lights, layouts.material],
                push_constant_ranges: &[],
            });

        let pipeline_id = cache_builder.add_shader(
            STANDARD_SHADER,
            Box::new(
                move |device: &Device, shader_def: &ShaderDefinition, source: &str| {
                    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                        label: Some(shader_def.name),
                        source: ShaderSource::Wgsl(source.into()),
                    });

                    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                        label: Some("Standard shader render pipeline"),
                        layout: Some(&render_pipeline_layout),
                        vertex: wgpu::VertexState {
                            module: &shader,
                            entry_point: Some("vs_main"),
                            buffers: &[RENDER_MODEL_VBL, INSTANCE_VBL],
                            compilation_options: PipelineCompilationOptions::default(),
                        },
                        fragment: Some(wgpu::FragmentState {
                            module: &shader,
                            entry_point: Some("fs_main"),
                            targets: &[Some(wgpu::ColorTargetState {
                                format: surface_format,
                                blend: Some(wgpu::BlendState::REPLACE),
                                write_mask: wgpu::ColorWrites::ALL,
                            })],
                            compilation_options: PipelineCompilationOptions::default(),
                        }),
                        primitive: MODEL_PRIMITIVE_STATE,
                        depth_stencil: Some(wgpu::DepthStencilState {
                            format: DepthTexture::DEPTH_FORMAT,
                            depth_write_enabled: true,
                            depth_compare: wgpu::CompareFunction::Less,
                            stencil: StencilState::default(),
                            bias: DepthBiasState::default(),
                        }),
                        multisample: MultisampleState::default(),
                        multiview: None,
                        cache: None,
                    });

                    Ok(pipeline)
                },
            ),
        );

        ScenePass { pipeline_id }
    }

    /// Clears color and depth, binds the pipeline, then lets `draw` issue draw calls.
    /// Skips drawing while the pipeline is missing.
    pub fn render(
        &self,
        texture_views: &SceneTextureViews,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        clear_color: wgpu::Color,
        draw: impl FnOnce(&mut wgpu::RenderPass),
    ) {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Scene Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: texture_views.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_color),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: texture_views.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let Some(pipeline) = pipeline_cache.get(self.pipeline_id) else {
            return;
        };

        render_pass.set_pipeline(pipeline);
        draw(&mut render_pass);
    }
}
