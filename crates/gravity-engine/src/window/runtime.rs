use std::time::Instant;

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use crate::coords::PixelSize;
use crate::device::{GpuInit, WgpuBackend};
use crate::geometry::StripMesh;
use crate::motion::SharedGravity;
use crate::sensor::SensorWorker;
use crate::surface::{FrameError, RenderSurface, SurfaceConfig};
use crate::time::refresh_period_from_millihertz;

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "Gravity".to_string(),
            initial_size: LogicalSize::new(480.0, 720.0),
        }
    }
}

/// Everything the runtime drives: the surface setup, the model and the
/// gravity pipeline feeding it.
pub struct GravityApp {
    pub surface: SurfaceConfig,
    pub mesh: StripMesh,
    pub gravity: SharedGravity,
    /// `None` runs on the fallback orientation only.
    pub sensor: Option<SensorWorker>,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the window and runs until it is closed or a frame fails fatally.
    pub fn run(config: RuntimeConfig, gpu_init: GpuInit, app: GravityApp) -> Result<()> {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.fatal.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[not_covariant]
    surface: RenderSurface<WgpuBackend<'this>>,
}

/// Keyboard commands.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum KeyAction {
    ToggleAnimation,
    IncreaseInterval,
    DecreaseInterval,
    Exit,
}

fn key_action(event: &KeyEvent) -> Option<KeyAction> {
    if event.state != ElementState::Pressed {
        return None;
    }
    let PhysicalKey::Code(code) = event.physical_key else {
        return None;
    };
    match code {
        KeyCode::Space if !event.repeat => Some(KeyAction::ToggleAnimation),
        KeyCode::ArrowUp => Some(KeyAction::IncreaseInterval),
        KeyCode::ArrowDown => Some(KeyAction::DecreaseInterval),
        KeyCode::Escape => Some(KeyAction::Exit),
        _ => None,
    }
}

/// What a `RedrawRequested` does.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Redraw {
    /// Present the rebuilt framebuffer now, whatever the timing source says.
    Still,
    /// Let the timing source decide.
    Tick,
    Idle,
}

fn redraw_kind(framebuffer_rebuilt: bool, animating: bool) -> Redraw {
    if framebuffer_rebuilt {
        Redraw::Still
    } else if animating {
        Redraw::Tick
    } else {
        Redraw::Idle
    }
}

struct AppState {
    config: RuntimeConfig,
    gpu_init: GpuInit,
    surface_config: SurfaceConfig,
    mesh: StripMesh,
    gravity: SharedGravity,
    sensor: Option<SensorWorker>,

    entry: Option<WindowEntry>,
    /// Window is on screen: created, not occluded, not minimized.
    visible: bool,
    /// The framebuffer was rebuilt; present it on the next redraw.
    still_frame_pending: bool,

    exit_requested: bool,
    fatal: Option<anyhow::Error>,
}

impl AppState {
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: GravityApp) -> Self {
        let GravityApp {
            surface,
            mesh,
            gravity,
            sensor,
        } = app;

        Self {
            config,
            gpu_init,
            surface_config: surface,
            mesh,
            gravity,
            sensor,
            entry: None,
            visible: false,
            still_frame_pending: false,
            exit_requested: false,
            fatal: None,
        }
    }

    fn request_exit(&mut self, event_loop: &ActiveEventLoop) {
        self.exit_requested = true;
        event_loop.exit();
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        log::error!("{err:#}");
        self.fatal.get_or_insert(err);
        self.request_exit(event_loop);
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();
        let mut surface_config = self.surface_config.clone();
        if surface_config.refresh_period.is_none() {
            surface_config.refresh_period = window
                .current_monitor()
                .and_then(|m| m.refresh_rate_millihertz())
                .and_then(refresh_period_from_millihertz);
        }
        log::debug!("display refresh period: {:?}", surface_config.refresh_period);
        let mesh = &self.mesh;
        let gravity = self.gravity.clone();

        let entry = WindowEntryTryBuilder {
            window,
            surface_builder: |w| {
                let backend = WgpuBackend::new(w, gpu_init)?;
                RenderSurface::new(backend, surface_config, mesh, gravity)
            },
        }
        .try_build()
        .context("failed to initialize rendering for the window")?;

        self.entry = Some(entry);
        Ok(())
    }

    /// Starts animation and sensor updates. No-op when already visible.
    fn appear(&mut self) {
        if self.visible {
            return;
        }
        let Some(entry) = self.entry.as_mut() else {
            return;
        };
        self.visible = true;

        entry.with_surface_mut(|s| s.start_animation());
        entry.with_window(|w| w.request_redraw());

        if let Some(sensor) = self.sensor.as_mut() {
            if let Err(e) = sensor.start() {
                log::error!("cannot start sensor updates: {e}");
            }
        }
        log::debug!("window visible; animation started");
    }

    /// Stops animation and sensor updates. No-op when already hidden.
    fn disappear(&mut self) {
        if !self.visible {
            return;
        }
        self.visible = false;

        if let Some(entry) = self.entry.as_mut() {
            entry.with_surface_mut(|s| s.stop_animation());
        }
        if let Some(sensor) = self.sensor.as_mut() {
            sensor.stop();
        }
        log::debug!("window hidden; animation stopped");
    }

    fn layout_changed(&mut self, size: PixelSize) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        if size.is_empty() {
            // Minimized.
            self.disappear();
            return;
        }

        self.still_frame_pending |= entry.with_surface_mut(|s| s.layout_changed(size));
        entry.with_window(|w| w.request_redraw());
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, action: KeyAction) {
        if action == KeyAction::Exit {
            self.request_exit(event_loop);
            return;
        }
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        entry.with_surface_mut(|s| match action {
            KeyAction::ToggleAnimation => {
                if s.is_animating() {
                    s.stop_animation();
                    log::info!("animation paused");
                } else {
                    s.start_animation();
                    log::info!("animation resumed");
                }
            }
            KeyAction::IncreaseInterval | KeyAction::DecreaseInterval => {
                let current = s.animation_frame_interval();
                let next = if action == KeyAction::IncreaseInterval {
                    current.saturating_add(1)
                } else {
                    current.saturating_sub(1)
                };
                if s.set_animation_frame_interval(next) {
                    log::info!("drawing every {next} display tick(s)");
                }
            }
            KeyAction::Exit => {}
        });
        entry.with_window(|w| w.request_redraw());
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(entry) = self.entry.as_mut() else {
            return;
        };

        let still = std::mem::take(&mut self.still_frame_pending);
        let result: Result<(), FrameError> = entry.with_surface_mut(|s| {
            match redraw_kind(still, s.is_animating()) {
                Redraw::Still => s.draw_frame().map(|_| ()),
                Redraw::Tick => s.on_display_tick(Instant::now()).map(|_| ()),
                Redraw::Idle => Ok(()),
            }
        });

        if let Err(e) = result {
            self.fail(event_loop, anyhow::Error::new(e).context("rendering failed"));
        }
    }

    fn shutdown(&mut self) {
        self.disappear();
        // Surface before window: the surface borrows it.
        self.entry = None;
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_none() {
            if let Err(e) = self.create_window_entry(event_loop) {
                self.fail(event_loop, e);
                return;
            }
        }
        self.appear();
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        self.disappear();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let Some(entry) = self.entry.as_ref() else {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        };

        let (animating, deadline) = entry.with_surface(|s| (s.is_animating(), s.next_deadline()));
        if !self.visible || !animating {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        }

        // No deadline: the next draw is paced by FIFO presentation blocking
        // on vblank, so redraw continuously.
        match deadline {
            Some(at) if at > Instant::now() => {
                event_loop.set_control_flow(ControlFlow::WaitUntil(at));
            }
            _ => {
                event_loop.set_control_flow(ControlFlow::Wait);
                entry.with_window(|w| w.request_redraw());
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match event {
            WindowEvent::CloseRequested => {
                self.shutdown();
                self.request_exit(event_loop);
            }

            WindowEvent::Destroyed => self.shutdown(),

            WindowEvent::Occluded(true) => self.disappear(),
            WindowEvent::Occluded(false) => self.appear(),

            WindowEvent::Resized(new_size) => {
                let size = PixelSize::from(new_size);
                self.layout_changed(size);
                if !size.is_empty() {
                    self.appear();
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self
                    .entry
                    .as_ref()
                    .map(|e| e.with_window(|w| PixelSize::from(w.inner_size())))
                {
                    self.layout_changed(size);
                }
            }

            WindowEvent::KeyboardInput { ref event, .. } => {
                if let Some(action) = key_action(event) {
                    self.handle_key(event_loop, action);
                }
            }

            WindowEvent::RedrawRequested => self.redraw(event_loop),

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        self.shutdown();
    }
}
