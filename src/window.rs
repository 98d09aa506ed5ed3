use std::{sync::Arc, time::Instant};

use anyhow::Context;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    event::{Event, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    config::DemoConfig,
    controls::PointerInput,
    demo::DemoState,
    engine,
    rendering::{config::RenderConfig, renderer::Renderer},
};

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

struct App {
    config: DemoConfig,
    render_config: RenderConfig,
    renderer: Option<Renderer>,
    demo_state: DemoState,
    imgui: Option<ImguiState>,
    last_frame: Instant,
}

impl App {
    fn new(config: DemoConfig, render_config: RenderConfig, demo_state: DemoState) -> Self {
        Self {
            config,
            render_config,
            renderer: None,
            demo_state,
            imgui: None,
            last_frame: Instant::now(),
        }
    }

    fn setup_imgui(&self, window: &Window) -> ImguiState {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: self.config.debug_font_size,
                ..Default::default()
            }),
        }]);

        // INI support is broken in the published version of imgui
        context.set_ini_filename(None);

        ImguiState { context, platform }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes()
            .with_title(self.config.window_title)
            .with_inner_size(self.config.initial_size);
        let window = event_loop
            .create_window(window_attributes)
            .context("Failed to create window")?;

        self.demo_state
            .resize(window.inner_size(), window.scale_factor());

        let mut imgui = self.setup_imgui(&window);

        let mut renderer = pollster::block_on(Renderer::new(
            Arc::new(window),
            &self.demo_state,
            &mut imgui.context,
            self.render_config.clone(),
        ))
        .context("Failed to create renderer")?;
        renderer.load_models(&self.demo_state);

        renderer.window.request_redraw();

        self.imgui = Some(imgui);
        self.renderer = Some(renderer);

        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let (Some(imgui), Some(renderer)) = (self.imgui.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };

        let now = Instant::now();
        imgui
            .context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        renderer.window.request_redraw();

        imgui
            .platform
            .prepare_frame(imgui.context.io_mut(), &renderer.window)
            .context("Failed to prepare Imgui frame")?;

        // The surface may be smaller than the window, scissor rects must follow it
        let pixel_ratio = self.demo_state.viewport.pixel_ratio() as f32;
        imgui.context.io_mut().display_framebuffer_scale = [pixel_ratio, pixel_ratio];

        let ui = imgui.context.new_frame();
        engine::update(&mut self.demo_state, ui);
        imgui.platform.prepare_render(ui, &renderer.window);

        match renderer.render(&self.demo_state) {
            Ok(frame) => renderer.finish_frame(frame, &mut imgui.context)?,
            Err(error) => {
                // End the Imgui frame even though nothing gets drawn
                imgui.context.render();

                match error {
                    wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                        renderer.resize(renderer.size);
                    }
                    wgpu::SurfaceError::OutOfMemory => {
                        log::error!("Out of memory");
                        event_loop.exit();
                    }
                    wgpu::SurfaceError::Timeout => {
                        log::warn!("Timeout");
                    }
                    other => {
                        log::error!("Unexpected error: {:?}", other);
                    }
                }
            }
        }

        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        if let Err(e) = self.init(event_loop) {
            log::error!("{:?}", e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    let scale_factor = renderer.window.scale_factor();
                    if self.demo_state.resize(*new_size, scale_factor) {
                        renderer.resize(self.demo_state.viewport.render_size());
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw(event_loop) {
                    log::error!("Error while rendering frame: {:?}", e);
                    event_loop.exit();
                }
            }
            _ => {
                if let Some(input) = PointerInput::from_window_event(&event) {
                    let ui_captured = self
                        .imgui
                        .as_ref()
                        .is_some_and(|imgui| imgui.context.io().want_capture_mouse);

                    let viewport_height = self.demo_state.viewport.physical_size().height as f32;
                    self.demo_state.controls.handle_pointer(
                        input,
                        &self.demo_state.camera,
                        viewport_height,
                        ui_captured,
                    );
                }
            }
        }

        if let (Some(imgui), Some(renderer)) = (self.imgui.as_mut(), self.renderer.as_ref()) {
            imgui.platform.handle_event::<()>(
                imgui.context.io_mut(),
                &renderer.window,
                &Event::WindowEvent { window_id, event },
            );
        }
    }
}

pub fn run(config: DemoConfig, render_config: RenderConfig) -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let demo_state = DemoState::new(&config).context("Failed to create demo state")?;
    let mut app = App::new(config, render_config, demo_state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
