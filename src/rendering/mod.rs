pub mod config;
pub mod imgui_renderer;
pub mod lights_uniform;
pub mod material_uniform;
pub mod passes;
pub mod render_camera;
pub mod render_common;
pub mod render_model;
pub mod renderer;
pub mod shader_loader;
pub mod texture;
