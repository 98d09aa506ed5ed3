use std::{collections::HashMap, sync::Arc};

use anyhow::Context;
use wgpu::CommandEncoderDescriptor;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    demo::DemoState,
    geometry::GeometryId,
    rendering::{
        config::RenderConfig,
        imgui_renderer::ImguiRendererState,
        lights_uniform::{LightsUniform, LightsUniformState},
        material_uniform::RenderMaterials,
        passes::scene_pass::{SceneBindGroupLayouts, ScenePass, SceneTextureViews},
        render_camera::RenderCamera,
        render_common::RenderCommon,
        render_model::{gather_instances, RenderModel},
        shader_loader::{PipelineCacheBuilder, ShaderLoader},
        texture::DepthTexture,
    },
};

/// A frame whose scene is recorded but not yet submitted.
pub struct Frame {
    output: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,
    config: RenderConfig,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: RenderCommon,
    depth_texture: DepthTexture,
    render_models: HashMap<GeometryId, RenderModel>,
    materials: RenderMaterials,

    camera: RenderCamera,
    lights: LightsUniform,

    shader_loader: ShaderLoader,
    scene_pass: ScenePass,
    imgui_renderer: ImguiRendererState,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        demo_state: &DemoState,
        imgui_context: &mut imgui::Context,
        config: RenderConfig,
    ) -> anyhow::Result<Renderer> {
        // Rendering resolution, not the window's: the pixel ratio is capped
        let size = demo_state.viewport.render_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable GPU adapter found")?;

        log::info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to request GPU device")?;

        let common = RenderCommon::new(&device, &adapter, &surface, size, &config)?;
        let surface_format = common.surface_format()?;

        let depth_texture = DepthTexture::new(&device, size, "Depth Texture");

        let camera = RenderCamera::new(&device, &demo_state.camera);
        let lights = LightsUniform::new(&device);
        let materials = RenderMaterials::new(&device);

        let mut cache_builder = PipelineCacheBuilder::new();

        let scene_pass = ScenePass::create(
            &device,
            surface_format,
            SceneBindGroupLayouts {
                camera: &camera.bind_group_layout,
                lights: &lights.bind_group_layout,
                material: materials.bind_group_layout(),
            },
            &mut cache_builder,
        );

        let shader_loader = ShaderLoader::new(device.clone(), cache_builder)
            .context("Failed to load shaders")?;

        let imgui_renderer =
            ImguiRendererState::new(&device, &queue, surface_format, imgui_context);

        Ok(Self {
            window,
            size,
            config,
            surface,
            device,
            queue,
            common,
            depth_texture,
            render_models: HashMap::new(),
            materials,
            camera,
            lights,
            shader_loader,
            scene_pass,
            imgui_renderer,
        })
    }

    /// Uploads every geometry in the scene. Call once the scene is built.
    pub fn load_models(&mut self, demo_state: &DemoState) {
        for (id, geometry) in demo_state.scene.geometries.iter() {
            let render_model = RenderModel::from_geometry(&self.device, geometry);
            self.render_models.insert(id, render_model);
            log::info!(
                "Loaded geometry {} with {} triangles",
                geometry.name,
                geometry.triangle_count()
            );
        }

        self.materials
            .sync(&self.device, &self.queue, &demo_state.scene);
    }

    /// Zero-area sizes (minimized windows) are ignored.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        let Ok(mut config) = self.common.output_surface_config.write() else {
            log::error!("Surface config lock poisoned, skipping resize");
            return;
        };

        self.size = new_size;
        config.width = new_size.width;
        config.height = new_size.height;
        self.surface.configure(&self.device, &config);
        self.depth_texture.resize(&self.device, new_size);
    }

    pub fn render(&mut self, demo_state: &DemoState) -> Result<Frame, wgpu::SurfaceError> {
        self.shader_loader.load_pending_shaders();

        let scene = &demo_state.scene;
        self.camera.update(&self.queue, &demo_state.camera);
        self.lights
            .update(&self.queue, &LightsUniformState::from_scene(scene));
        self.materials.sync(&self.device, &self.queue, scene);
        gather_instances(scene, &self.device, &self.queue, &mut self.render_models);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.scene_pass.render(
            &SceneTextureViews {
                color: &view,
                depth: self.depth_texture.view(),
            },
            &mut encoder,
            &self.shader_loader.cache,
            self.config.clear_color,
            |render_pass| {
                render_pass.set_bind_group(0, &self.camera.bind_group, &[]);
                render_pass.set_bind_group(1, &self.lights.bind_group, &[]);

                for render_model in self.render_models.values() {
                    if !render_model.should_render() {
                        continue;
                    }

                    render_pass.set_vertex_buffer(0, render_model.vertex_buffer.slice(..));
                    render_pass.set_vertex_buffer(1, render_model.instance_buffer().slice(..));
                    render_pass.set_index_buffer(
                        render_model.index_buffer.slice(..),
                        wgpu::IndexFormat::Uint32,
                    );

                    for batch in &render_model.batches {
                        let Some(material) = self.materials.bind_group(batch.material) else {
                            continue;
                        };

                        render_pass.set_bind_group(2, material, &[]);
                        render_pass.draw_indexed(
                            0..render_model.num_indices,
                            0,
                            batch.instances.clone(),
                        );
                    }
                }
            },
        );

        Ok(Frame {
            output,
            view,
            encoder,
        })
    }

    /// Draws the debug panel over the scene, then submits and presents.
    pub fn finish_frame(
        &mut self,
        frame: Frame,
        imgui_context: &mut imgui::Context,
    ) -> anyhow::Result<()> {
        let Frame {
            output,
            view,
            mut encoder,
        } = frame;

        self.imgui_renderer.render(
            &view,
            imgui_context,
            &self.device,
            &self.queue,
            &mut encoder,
        )?;

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }
}
