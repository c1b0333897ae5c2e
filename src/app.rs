use std::{sync::Arc, time::Instant};

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes, WindowId},
};

use crate::{
    config::ViewerConfig,
    gfx::{
        camera::{CameraController, OrbitCamera},
        rendering::RenderEngine,
        scene::Scene,
    },
};

pub struct ViewerApp {
    event_loop: Option<EventLoop<()>>,
    app_state: AppState,
}

struct AppState {
    config: ViewerConfig,
    window: Option<Arc<Window>>,
    render_engine: Option<RenderEngine>,
    scene: Option<Scene>,
    camera: OrbitCamera,
    controller: CameraController,
    started: Instant,
    last_frame: Instant,
}

impl ViewerApp {
    pub fn new(config: ViewerConfig) -> anyhow::Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;

        let camera = OrbitCamera::new(
            config.camera_distance,
            config.width as f32 / config.height.max(1) as f32,
        );
        let controller = CameraController::new(config.orbit_speed);
        let now = Instant::now();

        Ok(Self {
            event_loop: Some(event_loop),
            app_state: AppState {
                config,
                window: None,
                render_engine: None,
                scene: None,
                camera,
                controller,
                started: now,
                last_frame: now,
            },
        })
    }

    /// Runs the event loop until the window is closed
    pub fn run(mut self) -> anyhow::Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .context("event loop already consumed")?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.app_state)
            .context("event loop terminated with an error")
    }
}

impl AppState {
    fn init_graphics(&mut self, window: Arc<Window>) -> anyhow::Result<()> {
        let (width, height): (u32, u32) = window.inner_size().into();
        let renderer = pollster::block_on(RenderEngine::new(
            window.clone(),
            width,
            height,
            self.config.clear_color,
        ))?;

        self.camera.resize_projection(width, height);
        self.scene = Some(Scene::build(
            renderer.device(),
            renderer.backend(),
            &self.config,
        )?);
        self.render_engine = Some(renderer);
        self.window = Some(window);
        Ok(())
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        let (Some(render_engine), Some(scene)) = (self.render_engine.as_mut(), self.scene.as_ref())
        else {
            return Ok(());
        };

        let now = Instant::now();
        let dt = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.controller.update(dt, &mut self.camera);

        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix();
        let time = now.duration_since(self.started).as_secs_f32();
        let backend = render_engine.backend().clone();

        render_engine.render_frame(|pass| scene.draw(pass, &backend, view, projection, time))
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = WindowAttributes::default()
            .with_title(self.config.title.clone())
            .with_inner_size(LogicalSize::new(self.config.width, self.config.height));
        let window = match event_loop.create_window(attributes) {
            Ok(window) => Arc::new(window),
            Err(e) => {
                log::error!("failed to create window: {e}");
                event_loop.exit();
                return;
            }
        };

        if let Err(e) = self.init_graphics(window) {
            log::error!("failed to initialise graphics: {e:#}");
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            }
            | WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::KeyboardInput { event, .. } => {
                self.controller
                    .process_keyed_events(&event, &mut self.camera);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                self.camera.resize_projection(width, height);
                if let Some(render_engine) = self.render_engine.as_mut() {
                    render_engine.resize(width, height);
                }
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    log::error!("render failed: {e:#}");
                    event_loop.exit();
                }
            }
            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(scene) = self.scene.as_mut() {
            scene.release();
        }
        log::info!("shader programs released; exiting");
    }
}
