pub mod light;
pub mod object3d;
pub mod scene;
pub mod transform;
