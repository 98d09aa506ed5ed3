use std::sync::RwLock;

use anyhow::Context;
use wgpu::SurfaceConfiguration;
use winit::dpi::PhysicalSize;

use crate::rendering::config::RenderConfig;

/// State shared between the renderer and pipeline factories.
pub struct RenderCommon {
    pub output_surface_config: RwLock<SurfaceConfiguration>,
}

impl RenderCommon {
    pub fn new(
        device: &wgpu::Device,
        adapter: &wgpu::Adapter,
        surface: &wgpu::Surface,
        size: PhysicalSize<u32>,
        config: &RenderConfig,
    ) -> anyhow::Result<Self> {
        let surface_caps = surface.get_capabilities(adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("Surface reports no supported formats")?;

        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let output_surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: config.present_mode(),
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };

        surface.configure(device, &output_surface_config);
        log::info!(
            "Surface configured: {:?}, {:?}",
            surface_format,
            output_surface_config.present_mode
        );

        Ok(Self {
            output_surface_config: RwLock::new(output_surface_config),
        })
    }

    pub fn surface_format(&self) -> anyhow::Result<wgpu::TextureFormat> {
        let config = self
            .output_surface_config
            .read()
            .map_err(|_| anyhow::anyhow!("Surface config lock poisoned"))?;
        Ok(config.format)
    }
}
