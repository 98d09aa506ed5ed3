use winit::dpi::LogicalSize;

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub window_title: &'static str,
    pub initial_size: LogicalSize<u32>,
    pub debug_panel_width: f32,
    pub debug_font_size: f32,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            window_title: "Light showcase",
            initial_size: LogicalSize::new(1280, 720),
            debug_panel_width: 300.0,
            debug_font_size: 14.0,
        }
    }
}
