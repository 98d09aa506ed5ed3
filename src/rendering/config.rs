#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub clear_color: wgpu::Color,
    pub vsync: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: wgpu::Color::BLACK,
            vsync: true,
        }
    }
}

impl RenderConfig {
    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}
