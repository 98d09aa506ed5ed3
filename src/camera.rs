use glam::{Mat4, Vec3, Vec4};
use wgpu::util::DeviceExt;

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            eye: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y,
            aspect,
            near,
            far,
        }
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn get_vp_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
    // w is unused
    eye: Vec4,
}

impl CameraUniform {
    pub fn update(&mut self, camera: &Camera) {
        self.view_proj = camera.get_vp_matrix();
        self.eye = camera.eye.extend(1.0);
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_projects_to_screen_center() {
        let mut camera = Camera::perspective(75.0, 16.0 / 9.0, 0.1, 100.0);
        camera.eye = Vec3::new(1.0, 1.0, 2.0);

        let clip = camera.get_vp_matrix() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;

        assert!(ndc.x.abs() < 1e-5);
        assert!(ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }

    #[test]
    fn degenerate_sizes_keep_previous_aspect() {
        let mut camera = Camera::perspective(75.0, 1.5, 0.1, 100.0);
        camera.set_aspect(800.0, 0.0);
        assert_eq!(camera.aspect, 1.5);

        camera.set_aspect(800.0, 600.0);
        assert_eq!(camera.aspect, 800.0 / 600.0);
    }
}
