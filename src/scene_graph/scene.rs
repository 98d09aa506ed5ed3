use glam::{Mat4, Vec3};
use id_arena::Arena;

use crate::geometry::{Geometry, GeometryId};
use crate::material::{MaterialId, StandardMaterial};
use crate::scene_graph::light::Light;
use crate::scene_graph::object3d::{Mesh, NodeContent, Object3D, ObjectId};

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub geometries: Arena<Geometry>,
    pub materials: Arena<StandardMaterial>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            geometries: Arena::new(),
            materials: Arena::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn add_geometry(&mut self, geometry: Geometry) -> GeometryId {
        self.geometries.alloc(geometry)
    }

    pub fn add_material(&mut self, material: StandardMaterial) -> MaterialId {
        self.materials.alloc(material)
    }

    pub fn add_mesh(
        &mut self,
        name: impl Into<String>,
        geometry: GeometryId,
        material: MaterialId,
    ) -> ObjectId {
        self.add_object(Object3D::new(
            name,
            NodeContent::Mesh(Mesh { geometry, material }),
        ))
    }

    /// An empty node other objects can be parented to.
    pub fn add_group(&mut self, name: impl Into<String>) -> ObjectId {
        self.add_object(Object3D::new(name, NodeContent::Group))
    }

    pub fn add_light(&mut self, name: impl Into<String>, light: Light, position: Vec3) -> ObjectId {
        self.add_object(Object3D::new(name, NodeContent::Light(light)).with_translation(position))
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    pub fn light(&self, id: ObjectId) -> Option<&Light> {
        self.objects.get(id).and_then(Object3D::light)
    }

    pub fn light_mut(&mut self, id: ObjectId) -> Option<&mut Light> {
        match &mut self.objects.get_mut(id)?.content {
            NodeContent::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn lights(&self) -> impl Iterator<Item = (&Object3D, &Light)> {
        self.objects
            .iter()
            .filter_map(|(_, object)| object.light().map(|light| (object, light)))
    }

    pub fn meshes(&self) -> impl Iterator<Item = (ObjectId, &Object3D, Mesh)> {
        self.objects
            .iter()
            .filter_map(|(id, object)| object.mesh().map(|mesh| (id, object, mesh)))
    }

    /// Updates all object transforms in hierarchical order
    fn update_transforms(&self) {
        let root_objects = self
            .objects
            .iter()
            .filter(|(_, object)| object.parent_id.is_none())
            .map(|(id, _)| id);

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.objects.get(object_id) {
            // get_local_matrix may mark the world matrix dirty, so it has to run first
            let local_matrix = *object.transform.get_local_matrix();

            if object.transform.is_world_dirty() {
                object
                    .transform
                    .set_world_matrix(parent_world_matrix * local_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(old_parent_id) = self.objects.get(child_id).and_then(|c| c.parent_id) {
            if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_translation(&mut self, object_id: ObjectId, translation: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_translation(translation);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn set_object_rotation_euler(&mut self, object_id: ObjectId, x: f32, y: f32, z: f32) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_rotation_euler(x, y, z);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    pub fn early_update(&mut self) {
        for (_, object) in self.objects.iter() {
            object.transform.reset_flags();
        }
    }

    pub fn late_update(&mut self) {
        self.update_transforms();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::scene_graph::light::AmbientLight;

    #[test]
    fn children_inherit_parent_translation() {
        let mut scene = Scene::new();
        let parent = scene.add_object(Object3D::new("parent", NodeContent::Group));
        let child = scene.add_object(
            Object3D::new("child", NodeContent::Group).with_translation(Vec3::new(0.0, 1.0, 0.0)),
        );
        scene.set_object_parent(child, Some(parent));
        scene.late_update();

        scene.set_object_translation(parent, Vec3::new(2.0, 0.0, 0.0));
        scene.late_update();

        let child_world = scene.get_object(child).unwrap().transform.world_position();
        assert_eq!(child_world, Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn reparenting_removes_child_from_old_parent() {
        let mut scene = Scene::new();
        let a = scene.add_object(Object3D::new("a", NodeContent::Group));
        let b = scene.add_object(Object3D::new("b", NodeContent::Group));
        let child = scene.add_object(Object3D::new("child", NodeContent::Group));

        scene.set_object_parent(child, Some(a));
        scene.set_object_parent(child, Some(b));

        assert!(scene.get_object(a).unwrap().child_ids.is_empty());
        assert_eq!(scene.get_object(b).unwrap().child_ids, vec![child]);
    }

    #[test]
    fn early_update_resets_change_tracking() {
        let mut scene = Scene::new();
        let id = scene.add_object(Object3D::new("node", NodeContent::Group));
        scene.late_update();
        assert!(scene.get_object(id).unwrap().transform.has_changed());

        scene.early_update();
        scene.late_update();
        assert!(!scene.get_object(id).unwrap().transform.has_changed());

        scene.set_object_rotation_euler(id, 0.1, 0.0, 0.0);
        scene.late_update();
        assert!(scene.get_object(id).unwrap().transform.has_changed());
    }

    #[test]
    fn lights_are_found_by_id() {
        let mut scene = Scene::new();
        let id = scene.add_light(
            "Ambient",
            Light::Ambient(AmbientLight {
                color: Color::WHITE,
                intensity: 0.5,
            }),
            Vec3::ZERO,
        );

        assert_eq!(scene.get_object(id).map(|object| object.name.as_str()), Some("Ambient"));
        assert_eq!(scene.light(id).map(Light::intensity), Some(0.5));
        assert_eq!(scene.lights().count(), 1);
        assert_eq!(scene.meshes().count(), 0);
    }
}
