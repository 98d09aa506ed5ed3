use id_arena::Id;

use crate::color::Color;

pub type MaterialId = Id<StandardMaterial>;

/// Metallic-roughness material.
#[derive(Debug, Clone)]
pub struct StandardMaterial {
    pub color: Color,
    pub roughness: f32,
    pub metalness: f32,
}

impl Default for StandardMaterial {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            roughness: 1.0,
            metalness: 0.0,
        }
    }
}
