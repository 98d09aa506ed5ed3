use glam::Vec3;
use id_arena::Id;

use crate::geometry::GeometryId;
use crate::material::MaterialId;
use crate::scene_graph::light::Light;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

#[derive(Debug, Clone, Copy)]
pub struct Mesh {
    pub geometry: GeometryId,
    pub material: MaterialId,
}

pub enum NodeContent {
    Group,
    Mesh(Mesh),
    Light(Light),
}

pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub content: NodeContent,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
}

impl Object3D {
    pub fn new(name: impl Into<String>, content: NodeContent) -> Self {
        Self {
            name: name.into(),
            content,
            ..Default::default()
        }
    }

    pub fn with_translation(mut self, translation: Vec3) -> Self {
        self.transform.set_translation(translation);
        self
    }

    pub fn light(&self) -> Option<&Light> {
        match &self.content {
            NodeContent::Light(light) => Some(light),
            _ => None,
        }
    }

    pub fn mesh(&self) -> Option<Mesh> {
        match self.content {
            NodeContent::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::from_translation(Vec3::ZERO),
            content: NodeContent::Group,
            parent_id: None,
            child_ids: Vec::new(),
        }
    }
}
