use winit::dpi::PhysicalSize;

/// Depth buffer that follows the surface size.
pub struct DepthTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
    label: String,
}

impl DepthTexture {
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    pub fn new(device: &wgpu::Device, size: PhysicalSize<u32>, label: impl Into<String>) -> Self {
        let label: String = label.into();
        let texture = Self::create_wgpu_texture(device, size, &label);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            _texture: texture,
            view,
            label,
        }
    }

    fn create_wgpu_texture(
        device: &wgpu::Device,
        size: PhysicalSize<u32>,
        label: &str,
    ) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: size.width.max(1),
                height: size.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, size: PhysicalSize<u32>) {
        *self = Self::new(device, size, std::mem::take(&mut self.label));
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }
}
