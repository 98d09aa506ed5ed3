use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::util::DeviceExt;

use crate::{
    color::Color,
    scene_graph::{light::Light, scene::Scene},
};

/// Must match `MAX_LIGHTS` in `assets/shaders/shared/lighting.wgsl`.
pub const MAX_LIGHTS: usize = 16;

pub const LIGHT_AMBIENT: u32 = 0;
pub const LIGHT_DIRECTIONAL: u32 = 1;
pub const LIGHT_HEMISPHERE: u32 = 2;
pub const LIGHT_POINT: u32 = 3;
pub const LIGHT_RECT_AREA: u32 = 4;
pub const LIGHT_SPOT: u32 = 5;

/// Field meaning depends on `params.x`, the light kind:
///
/// | kind        | position.w | direction                  | secondary                         |
/// |-------------|------------|----------------------------|-----------------------------------|
/// | directional |            | travel direction           |                                   |
/// | hemisphere  |            | sky direction              | ground color                      |
/// | point       | distance   | w = decay                  |                                   |
/// | rect area   |            | facing                     | xyz = half-width axis, w = half-height |
/// | spot        | distance   | travel direction, w = decay| x = cone cos, y = penumbra cos    |
///
/// Colors are linear and premultiplied by intensity.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, Pod, Zeroable)]
pub struct GpuLight {
    pub position: [f32; 4],
    pub direction: [f32; 4],
    pub color: [f32; 4],
    pub secondary: [f32; 4],
    pub params: [u32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct LightsUniformState {
    pub count: u32,
    _padding: [u32; 3],
    pub lights: [GpuLight; MAX_LIGHTS],
}

impl LightsUniformState {
    pub fn from_scene(scene: &Scene) -> Self {
        let mut state = Self::zeroed();
        let mut skipped = 0;

        for (object, light) in scene.lights() {
            if state.count as usize == MAX_LIGHTS {
                skipped += 1;
                continue;
            }

            let world = *object.transform.get_world_matrix();
            let position = world.w_axis.truncate();

            state.lights[state.count as usize] = pack_light(light, position, |axis| {
                world.transform_vector3(axis).normalize_or_zero()
            });
            state.count += 1;
        }

        if skipped > 0 {
            log::warn!("Scene has {} lights over the limit of {}", skipped, MAX_LIGHTS);
        }

        state
    }

    pub fn lights(&self) -> &[GpuLight] {
        &self.lights[..self.count as usize]
    }
}

fn pack_light(light: &Light, position: Vec3, world_axis: impl Fn(Vec3) -> Vec3) -> GpuLight {
    let mut gpu = GpuLight {
        position: position.extend(0.0).to_array(),
        ..Default::default()
    };

    let premultiplied = |color: Color, intensity: f32| {
        (color.to_linear() * intensity).extend(1.0).to_array()
    };

    let direction_to = |target: Vec3| {
        let direction = (target - position).normalize_or_zero();
        if direction == Vec3::ZERO {
            Vec3::NEG_Y
        } else {
            direction
        }
    };

    match light {
        Light::Ambient(ambient) => {
            gpu.params[0] = LIGHT_AMBIENT;
            gpu.color = premultiplied(ambient.color, ambient.intensity);
        }
        Light::Directional(directional) => {
            gpu.params[0] = LIGHT_DIRECTIONAL;
            gpu.color = premultiplied(directional.color, directional.intensity);
            gpu.direction = direction_to(directional.target).extend(0.0).to_array();
        }
        Light::Hemisphere(hemisphere) => {
            gpu.params[0] = LIGHT_HEMISPHERE;
            gpu.color = premultiplied(hemisphere.sky_color, hemisphere.intensity);
            gpu.secondary = premultiplied(hemisphere.ground_color, hemisphere.intensity);
            let sky = position.normalize_or_zero();
            let sky = if sky == Vec3::ZERO { Vec3::Y } else { sky };
            gpu.direction = sky.extend(0.0).to_array();
        }
        Light::Point(point) => {
            gpu.params[0] = LIGHT_POINT;
            gpu.color = premultiplied(point.color, point.intensity);
            gpu.position[3] = point.distance;
            gpu.direction[3] = point.decay;
        }
        Light::RectArea(rect) => {
            gpu.params[0] = LIGHT_RECT_AREA;
            gpu.color = premultiplied(rect.color, rect.intensity);
            gpu.direction = world_axis(Vec3::NEG_Z).extend(0.0).to_array();
            gpu.secondary = (world_axis(Vec3::X) * rect.width * 0.5)
                .extend(rect.height * 0.5)
                .to_array();
        }
        Light::Spot(spot) => {
            gpu.params[0] = LIGHT_SPOT;
            gpu.color = premultiplied(spot.color, spot.intensity);
            gpu.position[3] = spot.distance;
            gpu.direction = direction_to(spot.target).extend(spot.decay).to_array();
            gpu.secondary = [spot.cone_cos(), spot.penumbra_cos(), 0.0, 0.0];
        }
    }

    gpu
}

pub struct LightsUniform {
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightsUniform {
    pub fn new(device: &wgpu::Device) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Lights uniform buffer"),
            contents: bytemuck::bytes_of(&LightsUniformState::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Lights bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Lights bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, state: &LightsUniformState) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::DemoConfig, demo::DemoState, scene_graph::light::AmbientLight};

    #[test]
    fn demo_rig_packs_every_light_kind() {
        let state = DemoState::new(&DemoConfig::default()).unwrap();
        let packed = LightsUniformState::from_scene(&state.scene);

        let kinds: Vec<u32> = packed.lights().iter().map(|light| light.params[0]).collect();
        assert_eq!(
            kinds,
            [
                LIGHT_AMBIENT,
                LIGHT_DIRECTIONAL,
                LIGHT_HEMISPHERE,
                LIGHT_POINT,
                LIGHT_RECT_AREA,
                LIGHT_SPOT
            ]
        );

        let point = packed.lights()[3];
        assert_eq!(point.position, [1.0, -0.5, 1.0, 10.0]);
        assert_eq!(point.direction[3], 2.0);

        let spot = packed.lights()[5];
        let to_origin = Vec3::new(0.0, -2.0, -3.0).normalize();
        assert!(Vec3::from_slice(&spot.direction[..3]).abs_diff_eq(to_origin, 1e-6));
        assert_eq!(spot.direction[3], 1.0);
        assert!(spot.secondary[1] > spot.secondary[0]);

        let rect = packed.lights()[4];
        assert!((Vec3::from_slice(&rect.secondary[..3]).length() - 0.5).abs() < 1e-5);
        assert_eq!(rect.secondary[3], 0.5);
    }

    #[test]
    fn colors_are_premultiplied_by_intensity() {
        let mut scene = Scene::new();
        scene.add_light(
            "Ambient",
            Light::Ambient(AmbientLight {
                color: Color::WHITE,
                intensity: 0.5,
            }),
            Vec3::ZERO,
        );
        scene.late_update();

        let packed = LightsUniformState::from_scene(&scene);
        let color = glam::Vec4::from_array(packed.lights()[0].color);
        assert!(color.abs_diff_eq(glam::Vec4::new(0.5, 0.5, 0.5, 1.0), 1e-6));
    }

    #[test]
    fn lights_over_the_limit_are_dropped() {
        let mut scene = Scene::new();
        for i in 0..MAX_LIGHTS + 4 {
            scene.add_light(
                format!("Ambient {}", i),
                Light::Ambient(AmbientLight {
                    color: Color::WHITE,
                    intensity: 0.1,
                }),
                Vec3::ZERO,
            );
        }
        scene.late_update();

        let packed = LightsUniformState::from_scene(&scene);
        assert_eq!(packed.count as usize, MAX_LIGHTS);
    }

    #[test]
    fn layout_matches_the_shader_struct() {
        assert_eq!(std::mem::size_of::<GpuLight>(), 80);
        assert_eq!(std::mem::size_of::<LightsUniformState>(), 16 + 80 * MAX_LIGHTS);
    }
}
