use anyhow::Result;

mod camera;
mod color;
mod config;
mod controls;
mod debug_panel;
mod demo;
mod engine;
mod geometry;
mod material;
mod rendering;
mod scene_graph;
mod viewport;
mod window;

fn main() -> Result<()> {
    pretty_env_logger::init();

    window::run(config::DemoConfig::default(), rendering::config::RenderConfig::default())?;

    Ok(())
}
