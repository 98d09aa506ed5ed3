use winit::dpi::{LogicalSize, PhysicalSize};

/// Upper bound on rendered pixels per logical pixel.
pub const MAX_PIXEL_RATIO: f64 = 2.0;

/// Size of the drawable area. Width and height are logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub scale_factor: f64,
}

impl Viewport {
    pub fn from_physical(size: PhysicalSize<u32>, scale_factor: f64) -> Self {
        let logical: LogicalSize<f32> = size.to_logical(scale_factor);
        Self {
            width: logical.width,
            height: logical.height,
            scale_factor,
        }
    }

    /// Ignores zero-area sizes, which minimized windows report. Returns whether the size changed.
    pub fn resize(&mut self, size: PhysicalSize<u32>, scale_factor: f64) -> bool {
        if size.width == 0 || size.height == 0 {
            return false;
        }

        let resized = Self::from_physical(size, scale_factor);
        let changed = resized != *self;
        *self = resized;
        changed
    }

    pub fn size(&self) -> (f32, f32) {
        (self.width, self.height)
    }

    pub fn aspect(&self) -> f32 {
        self.width / self.height
    }

    pub fn physical_size(&self) -> PhysicalSize<u32> {
        LogicalSize::new(self.width, self.height).to_physical(self.scale_factor)
    }

    pub fn pixel_ratio(&self) -> f64 {
        self.scale_factor.min(MAX_PIXEL_RATIO)
    }

    /// Size of the surface and depth buffer: logical size times the capped pixel ratio.
    pub fn render_size(&self) -> PhysicalSize<u32> {
        let size: PhysicalSize<u32> =
            LogicalSize::new(self.width, self.height).to_physical(self.pixel_ratio());
        PhysicalSize::new(size.width.max(1), size.height.max(1))
    }
}
