use std::{collections::HashMap, mem::offset_of, ops::Range};

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::util::DeviceExt;

use crate::{
    geometry::{Geometry, GeometryId, Vertex},
    material::MaterialId,
    scene_graph::scene::Scene,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub struct Instance {
    pub model: Mat4,
    pub normal: Mat4,
}

/// A batch of instances sharing one material.
#[derive(Debug, Clone, PartialEq)]
pub struct InstanceBatch {
    pub material: MaterialId,
    pub instances: Range<u32>,
}

pub struct RenderModel {
    pub name: String,
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub num_indices: u32,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
    pub batches: Vec<InstanceBatch>,
}

impl RenderModel {
    pub fn from_geometry(device: &wgpu::Device, geometry: &Geometry) -> Self {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Vertex buffer ({})", geometry.name)),
            contents: bytemuck::cast_slice(&geometry.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("Index buffer ({})", geometry.name)),
            contents: bytemuck::cast_slice(&geometry.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        let instance_capacity = 4;

        Self {
            name: geometry.name.clone(),
            vertex_buffer,
            index_buffer,
            num_indices: geometry.indices.len() as u32,
            instance_buffer: create_instance_buffer(device, &geometry.name, instance_capacity),
            instance_capacity,
            batches: Vec::new(),
        }
    }

    pub fn should_render(&self) -> bool {
        !self.batches.is_empty()
    }

    pub fn instance_buffer(&self) -> &wgpu::Buffer {
        &self.instance_buffer
    }

    fn upload_instances(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &[Instance]) {
        if data.len() > self.instance_capacity {
            self.instance_capacity = data.len().next_power_of_two();
            self.instance_buffer = create_instance_buffer(device, &self.name, self.instance_capacity);
            log::debug!(
                "Grew instance buffer of {} to {} instances",
                self.name,
                self.instance_capacity
            );
        }

        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(data));
    }
}

fn create_instance_buffer(device: &wgpu::Device, name: &str, capacity: usize) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(&format!("Instance buffer ({})", name)),
        size: (capacity * size_of::<Instance>()) as wgpu::BufferAddress,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Instances of one geometry, sorted by material so each material is one draw.
pub fn batch_instances(scene: &Scene, geometry: GeometryId) -> (Vec<Instance>, Vec<InstanceBatch>) {
    let mut objects: Vec<_> = scene
        .meshes()
        .filter(|(_, _, mesh)| mesh.geometry == geometry)
        .map(|(_, object, mesh)| (mesh.material, object))
        .collect();
    objects.sort_by_key(|(material, _)| material.index());

    let mut instances = Vec::with_capacity(objects.len());
    let mut batches: Vec<InstanceBatch> = Vec::new();

    for (material, object) in objects {
        let index = instances.len() as u32;
        instances.push(Instance {
            model: *object.transform.get_world_matrix(),
            normal: *object.transform.get_inverse_transpose_world_matrix(),
        });

        match batches.last_mut() {
            Some(batch) if batch.material == material => batch.instances.end = index + 1,
            _ => batches.push(InstanceBatch {
                material,
                instances: index..index + 1,
            }),
        }
    }

    (instances, batches)
}

/// Re-uploads instance data for models whose objects moved since the last frame.
pub fn gather_instances(
    scene: &Scene,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    render_models: &mut HashMap<GeometryId, RenderModel>,
) {
    for (&geometry, render_model) in render_models.iter_mut() {
        let changed = scene
            .meshes()
            .any(|(_, object, mesh)| mesh.geometry == geometry && object.transform.has_changed());

        if !changed && render_model.should_render() {
            continue;
        }

        let (instances, batches) = batch_instances(scene, geometry);
        render_model.upload_instances(device, queue, &instances);
        render_model.batches = batches;
    }
}

pub const RENDER_MODEL_VBL: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: size_of::<Vertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, normal) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(Vertex, tex_coords) as wgpu::BufferAddress,
            shader_location: 2,
            format: wgpu::VertexFormat::Float32x2,
        },
    ],
};

const fn mat4_column(column: u64, shader_location: u32) -> wgpu::VertexAttribute {
    wgpu::VertexAttribute {
        offset: column * size_of::<[f32; 4]>() as wgpu::BufferAddress,
        shader_location,
        format: wgpu::VertexFormat::Float32x4,
    }
}

pub const INSTANCE_VBL: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: size_of::<Instance>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Instance,
    attributes: &[
        mat4_column(0, 3),
        mat4_column(1, 4),
        mat4_column(2, 5),
        mat4_column(3, 6),
        mat4_column(4, 7),
        mat4_column(5, 8),
        mat4_column(6, 9),
        mat4_column(7, 10),
    ],
};

pub const MODEL_PRIMITIVE_STATE: wgpu::PrimitiveState = wgpu::PrimitiveState {
    topology: wgpu::PrimitiveTopology::TriangleList,
    strip_index_format: None,
    front_face: wgpu::FrontFace::Ccw,
    cull_mode: Some(wgpu::Face::Back),
    polygon_mode: wgpu::PolygonMode::Fill,
    unclipped_depth: false,
    conservative: false,
};

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::material::StandardMaterial;

    #[test]
    fn instances_are_grouped_by_material() {
        let mut scene = Scene::new();
        let geometry = scene.add_geometry(Geometry::cuboid(1.0, 1.0, 1.0));
        let other_geometry = scene.add_geometry(Geometry::plane(1.0, 1.0));
        let red = scene.add_material(StandardMaterial::default());
        let blue = scene.add_material(StandardMaterial::default());

        scene.add_mesh("a", geometry, blue);
        scene.add_mesh("b", geometry, red);
        let c = scene.add_mesh("c", geometry, blue);
        scene.add_mesh("floor", other_geometry, red);
        scene.set_object_translation(c, Vec3::new(0.0, 2.0, 0.0));
        scene.late_update();

        let (instances, batches) = batch_instances(&scene, geometry);

        assert_eq!(instances.len(), 3);
        assert_eq!(
            batches,
            vec![
                InstanceBatch {
                    material: red,
                    instances: 0..1
                },
                InstanceBatch {
                    material: blue,
                    instances: 1..3
                },
            ]
        );
        assert!(instances
            .iter()
            .any(|instance| instance.model.w_axis.truncate() == Vec3::new(0.0, 2.0, 0.0)));
    }

    #[test]
    fn instance_layout_covers_both_matrices() {
        assert_eq!(size_of::<Instance>(), 128);
        assert_eq!(INSTANCE_VBL.attributes.len(), 8);
        assert_eq!(INSTANCE_VBL.attributes[7].offset, 112);
    }
}
