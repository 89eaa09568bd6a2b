use std::collections::HashSet;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::asset::{ImageLoader, ObjImporter, load_scene};
use crate::config::RendererConfig;
use crate::device::Gpu;
use crate::render::{
    FrameOutcome, OrbitCamera, Renderer, RendererSettings, ShaderHotReload, WgpuBackend,
};
use crate::time::FrameClock;

/// Radians per second for A/D and Q/E.
const ORBIT_SPEED: f32 = 1.5;
/// Distance multiplier per second while W is held; S applies the inverse.
const ZOOM_PER_SECOND: f32 = 0.4;

/// Entry point: opens the window, loads the scene and renders until the window
/// closes or the device fails for good.
pub struct Runtime;

impl Runtime {
    pub fn run(config: RendererConfig) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut app = ViewerApp::new(config);

        event_loop
            .run_app(&mut app)
            .context("winit event loop terminated with error")?;

        match app.failure.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

/// Everything that exists once setup has succeeded.
struct Session {
    window: Arc<Window>,
    renderer: Renderer<WgpuBackend>,
    camera: OrbitCamera,
    clock: FrameClock,
    held: HashSet<KeyCode>,
}

impl Session {
    fn create(event_loop: &ActiveEventLoop, config: &RendererConfig) -> Result<Self> {
        let display = &config.display;
        let attrs = Window::default_attributes()
            .with_title(display.title.clone())
            .with_inner_size(PhysicalSize::new(display.width, display.height))
            .with_resizable(false);

        let window = Arc::new(
            event_loop
                .create_window(attrs)
                .context("failed to create window")?,
        );

        let gpu = pollster::block_on(Gpu::new(window.clone(), config.present_request()))
            .context("GPU initialization failed")?;
        let size = gpu.size();

        let backend = WgpuBackend::new(gpu, &config.shader.path).with_context(|| {
            format!("failed to build shader {}", config.shader.path.display())
        })?;

        let scene = load_scene(
            &config.assets.scene,
            &ObjImporter,
            &mut ImageLoader::new(),
            &config.assets.default_textures,
        )
        .with_context(|| format!("failed to load scene {}", config.assets.scene.display()))?;

        let settings = RendererSettings {
            clear: config.clear_values(),
            projection: config.projection(),
            lost_backoff: config.lost_backoff(),
        };
        let mut renderer =
            Renderer::new(backend, &scene, settings).context("renderer setup failed")?;
        if size.height > 0 {
            renderer.set_aspect(size.width as f32 / size.height as f32);
        }

        if config.shader.hot_reload {
            match ShaderHotReload::for_file(&config.shader.path) {
                Ok(reload) => renderer.set_shader_reload(reload),
                Err(e) => log::warn!("shader hot reload disabled: {e}"),
            }
        }

        Ok(Self {
            window,
            renderer,
            camera: OrbitCamera::framing(scene.packed.bounds()),
            clock: FrameClock::new(),
            held: HashSet::new(),
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.renderer.backend_mut().resize(size);
        if size.width > 0 && size.height > 0 {
            self.renderer.set_aspect(size.width as f32 / size.height as f32);
        }
        self.window.request_redraw();
    }

    fn apply_held_keys(&mut self, dt: f32) {
        let axis = |neg: KeyCode, pos: KeyCode| {
            self.held.contains(&pos) as i32 as f32 - self.held.contains(&neg) as i32 as f32
        };
        let yaw = axis(KeyCode::KeyA, KeyCode::KeyD);
        let pitch = axis(KeyCode::KeyE, KeyCode::KeyQ);
        let zoom = axis(KeyCode::KeyS, KeyCode::KeyW);

        if yaw != 0.0 || pitch != 0.0 {
            self.camera.orbit(yaw * ORBIT_SPEED * dt, pitch * ORBIT_SPEED * dt);
        }
        if zoom != 0.0 {
            self.camera.zoom(ZOOM_PER_SECOND.powf(zoom * dt));
        }
    }
}

struct ViewerApp {
    config: RendererConfig,
    session: Option<Session>,
    failure: Option<anyhow::Error>,
}

impl ViewerApp {
    fn new(config: RendererConfig) -> Self {
        Self {
            config,
            session: None,
            failure: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        log::error!("{error:#}");
        self.failure = Some(error);
        event_loop.exit();
    }

    fn on_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        if code == KeyCode::Escape && event.state == ElementState::Pressed {
            event_loop.exit();
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        match event.state {
            ElementState::Pressed => session.held.insert(code),
            ElementState::Released => session.held.remove(&code),
        };
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let time = session.clock.tick();
        session.apply_held_keys(time.dt);

        match session.renderer.render_frame(&session.camera) {
            FrameOutcome::Presented { .. } => {}
            FrameOutcome::Skipped(state) => log::debug!("frame skipped, device {state}"),
            FrameOutcome::Halted => {
                let message = session
                    .renderer
                    .backend()
                    .fatal_message()
                    .unwrap_or("graphics device failed")
                    .to_string();
                self.fail(event_loop, anyhow!(message));
            }
        }
    }
}

impl ApplicationHandler for ViewerApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }

        match Session::create(event_loop, &self.config) {
            Ok(session) => {
                session.window.request_redraw();
                self.session = Some(session);
            }
            Err(e) => self.fail(event_loop, e),
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        // Continuous redraw.
        if let Some(session) = &self.session {
            session.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                log::info!("window closed");
                event_loop.exit();
            }

            WindowEvent::Resized(size) => {
                if let Some(session) = self.session.as_mut() {
                    session.resize(size);
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(session) = self.session.as_mut() {
                    let size = session.window.inner_size();
                    session.resize(size);
                }
            }

            WindowEvent::Focused(false) => {
                if let Some(session) = self.session.as_mut() {
                    session.held.clear();
                }
            }

            WindowEvent::KeyboardInput { event, .. } => self.on_key(event_loop, &event),

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }
    }
}
