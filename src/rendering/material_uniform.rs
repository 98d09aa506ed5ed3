use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use crate::{
    material::{MaterialId, StandardMaterial},
    scene_graph::scene::Scene,
};

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniformState {
    /// Linear base color, alpha unused.
    pub color: [f32; 4],
    pub roughness: f32,
    pub metalness: f32,
    _padding: [f32; 2],
}

impl From<&StandardMaterial> for MaterialUniformState {
    fn from(material: &StandardMaterial) -> Self {
        Self {
            color: material.color.to_linear().extend(1.0).to_array(),
            // Fully smooth surfaces turn the specular lobe into a singularity
            roughness: material.roughness.clamp(0.04, 1.0),
            metalness: material.metalness.clamp(0.0, 1.0),
            _padding: [0.0; 2],
        }
    }
}

struct RenderMaterial {
    state: MaterialUniformState,
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// One uniform buffer and bind group per scene material, bound at slot 2.
pub struct RenderMaterials {
    bind_group_layout: wgpu::BindGroupLayout,
    materials: HashMap<MaterialId, RenderMaterial>,
}

impl RenderMaterials {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Material bind group layout"),
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

        Self {
            bind_group_layout,
            materials: HashMap::new(),
        }
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self, id: MaterialId) -> Option<&wgpu::BindGroup> {
        self.materials.get(&id).map(|material| &material.bind_group)
    }

    /// Creates buffers for new materials and rewrites the ones that changed.
    pub fn sync(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        for (id, material) in scene.materials.iter() {
            let state = MaterialUniformState::from(material);

            match self.materials.get_mut(&id) {
                Some(existing) if existing.state == state => {}
                Some(existing) => {
                    queue.write_buffer(&existing.buffer, 0, bytemuck::bytes_of(&state));
                    existing.state = state;
                }
                None => {
                    let material = self.create_material(device, state);
                    self.materials.insert(id, material);
                }
            }
        }
    }

    fn create_material(&self, device: &wgpu::Device, state: MaterialUniformState) -> RenderMaterial {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Material uniform buffer"),
            contents: bytemuck::bytes_of(&state),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Material bind group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        RenderMaterial {
            state,
            buffer,
            bind_group,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    #[test]
    fn uniform_uses_linear_color_and_clamped_roughness() {
        let material = StandardMaterial {
            color: Color::from_hex(0xffffff),
            roughness: 0.0,
            metalness: 2.0,
        };

        let state = MaterialUniformState::from(&material);
        assert!(glam::Vec4::from_array(state.color).abs_diff_eq(glam::Vec4::ONE, 1e-6));
        assert_eq!(state.roughness, 0.04);
        assert_eq!(state.metalness, 1.0);
        assert_eq!(std::mem::size_of::<MaterialUniformState>(), 32);
    }
}
