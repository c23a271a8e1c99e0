use std::time::{Duration, Instant};

use crate::coords::PixelSize;
use crate::geometry::StripMesh;
use crate::motion::{OrientationFallbackPolicy, OrientationTracker, SharedGravity};
use crate::time::{FrameInterval, TimingSource, TimingSourceKind};

use super::driver::AnimationDriver;
use super::{
    ContextError, FrameError, FrameOutcome, FrameParams, Framebuffer, FramebufferError,
    GraphicsBackend, SceneSetup,
};

/// Lifecycle state of a `RenderSurface`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceState {
    /// Constructed, static state not yet uploaded. Only seen during `new`.
    Uninitialized,
    /// Static state uploaded; animation never started.
    Configured,
    Running,
    Stopped,
    /// Released; every further call is ignored.
    Destroyed,
}

/// Surface construction parameters.
#[derive(Debug, Clone, Default)]
pub struct SurfaceConfig {
    pub scene: SceneSetup,
    pub fallback: OrientationFallbackPolicy,
    pub timing: TimingSourceKind,
    pub frame_interval: FrameInterval,
    /// Display refresh period for display-synced timing; `None` assumes 60 Hz.
    pub refresh_period: Option<Duration>,
}

/// Drawable surface whose model follows the shared gravity estimate.
///
/// Owns the framebuffer bundle and the animation driver. The framebuffer is
/// held as one `Option`: a resize drops the old bundle and stores the new one
/// whole, so a draw sees either a complete bundle or none.
pub struct RenderSurface<B: GraphicsBackend> {
    backend: B,
    state: SurfaceState,
    scene: SceneSetup,
    framebuffer: Option<B::Framebuffer>,
    requested_size: PixelSize,
    driver: AnimationDriver,
    gravity: SharedGravity,
    orientation: OrientationTracker,
    frames_presented: u64,
}

impl<B: GraphicsBackend> RenderSurface<B> {
    /// Creates a surface using the timing source named in `config`.
    pub fn new(
        backend: B,
        config: SurfaceConfig,
        mesh: &StripMesh,
        gravity: SharedGravity,
    ) -> Result<Self, ContextError> {
        let timing = config.timing.create(config.refresh_period);
        Self::with_timing_source(backend, config, mesh, gravity, timing)
    }

    /// Creates a surface driven by an explicit timing source.
    ///
    /// Uploads static state and builds the first framebuffer from the backend's
    /// current backing size. Fails only if the rendering context is unusable;
    /// a framebuffer failure leaves the surface configured but undrawable.
    pub fn with_timing_source(
        backend: B,
        config: SurfaceConfig,
        mesh: &StripMesh,
        gravity: SharedGravity,
        timing: Box<dyn TimingSource>,
    ) -> Result<Self, ContextError> {
        let mut surface = Self {
            backend,
            state: SurfaceState::Uninitialized,
            scene: config.scene,
            framebuffer: None,
            requested_size: PixelSize::default(),
            driver: AnimationDriver::new(timing, config.frame_interval),
            gravity,
            orientation: OrientationTracker::new(config.fallback),
            frames_presented: 0,
        };

        surface.backend.make_current()?;
        surface.backend.configure(&surface.scene, mesh)?;
        surface.state = SurfaceState::Configured;

        let initial = surface.backend.backing_size();
        surface.layout_changed(initial);

        log::info!(
            "render surface configured ({:?} timing, {:?} fallback)",
            surface.driver.timing_kind(),
            surface.orientation.policy()
        );
        Ok(surface)
    }

    #[inline]
    pub fn state(&self) -> SurfaceState {
        self.state
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.driver.is_running()
    }

    /// Whether a complete framebuffer exists.
    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.framebuffer.is_some()
    }

    /// Size most recently passed to `layout_changed`.
    #[inline]
    pub fn requested_size(&self) -> PixelSize {
        self.requested_size
    }

    #[inline]
    pub fn framebuffer(&self) -> Option<&B::Framebuffer> {
        self.framebuffer.as_ref()
    }

    #[inline]
    pub fn frames_presented(&self) -> u64 {
        self.frames_presented
    }

    #[inline]
    pub fn animation_frame_interval(&self) -> u32 {
        self.driver.frame_interval().get()
    }

    #[inline]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    #[inline]
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Starts per-tick drawing. No-op when already running.
    pub fn start_animation(&mut self) {
        if !self.is_live() {
            return;
        }
        self.driver.start(Instant::now());
        self.state = SurfaceState::Running;
    }

    /// Stops per-tick drawing. No-op when not running.
    ///
    /// After this returns `on_display_tick` draws nothing until restarted.
    pub fn stop_animation(&mut self) {
        if !self.is_live() || !self.driver.is_running() {
            return;
        }
        self.driver.stop();
        self.state = SurfaceState::Stopped;
    }

    /// Sets the number of display ticks between draws.
    ///
    /// Values below 1 are rejected and the previous interval is kept. Returns
    /// whether the value was accepted.
    pub fn set_animation_frame_interval(&mut self, ticks: u32) -> bool {
        if !self.is_live() {
            return false;
        }
        self.driver.set_frame_interval(ticks, Instant::now())
    }

    /// Rebuilds the framebuffer for a new layout size.
    ///
    /// The old bundle is released before the new one is created. On failure
    /// the surface stays undrawable until the next successful call.
    pub fn layout_changed(&mut self, requested: PixelSize) -> bool {
        if !self.is_live() {
            return false;
        }
        self.requested_size = requested;
        self.destroy_framebuffer();
        self.create_framebuffer()
    }

    /// Display-tick entry point.
    ///
    /// Draws when animation is running and the timing source has a due frame.
    /// Returns `Ok(None)` when no draw was due.
    pub fn on_display_tick(&mut self, now: Instant) -> Result<Option<FrameOutcome>, FrameError> {
        if !self.driver.tick(now) {
            return Ok(None);
        }
        self.draw_frame().map(Some)
    }

    /// Wake-up time for timer-driven animation; `None` when display-paced or stopped.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.driver.next_deadline()
    }

    /// Draws and presents one frame.
    ///
    /// The rotation is recomputed from the current gravity estimate on every
    /// call.
    pub fn draw_frame(&mut self) -> Result<FrameOutcome, FrameError> {
        if !self.is_live() {
            return Ok(FrameOutcome::Undrawable);
        }

        self.backend.make_current()?;

        let Some(framebuffer) = self.framebuffer.as_ref() else {
            return Ok(FrameOutcome::Undrawable);
        };

        let gravity = self.gravity.snapshot();
        let orientation = self.orientation.resolve(gravity);

        let params = FrameParams {
            projection: self.scene.projection.matrix(framebuffer.color_size()),
            model_view: self.scene.model_view(&orientation),
            clear_color: self.scene.clear_color,
        };

        let outcome = self.backend.draw_frame(framebuffer, &params)?;
        if outcome == FrameOutcome::Presented {
            self.frames_presented += 1;
            if self.frames_presented == 1 {
                log::debug!(
                    "first frame presented at {} ({})",
                    framebuffer.color_size(),
                    if orientation.is_tracked() { "tracking gravity" } else { "fallback" }
                );
            }
        }
        Ok(outcome)
    }

    /// Stops animation and releases the framebuffer. Idempotent.
    pub fn destroy(&mut self) {
        if self.state == SurfaceState::Destroyed {
            return;
        }
        self.driver.stop();
        self.destroy_framebuffer();
        self.state = SurfaceState::Destroyed;
        log::debug!("render surface destroyed after {} frame(s)", self.frames_presented);
    }

    fn is_live(&self) -> bool {
        if self.state == SurfaceState::Destroyed {
            log::debug!("ignoring call on a destroyed render surface");
            return false;
        }
        true
    }

    fn create_framebuffer(&mut self) -> bool {
        if let Err(e) = self.backend.make_current() {
            log::error!("cannot build framebuffer: {e}");
            return false;
        }

        let framebuffer = match self.backend.create_framebuffer(self.requested_size) {
            Ok(fb) => fb,
            Err(FramebufferError::ZeroSize(size)) => {
                log::debug!("deferring framebuffer creation for empty drawable {size}");
                return false;
            }
            Err(e) => {
                log::error!("failed to make complete framebuffer: {e}");
                return false;
            }
        };

        let (color, depth) = (framebuffer.color_size(), framebuffer.depth_size());
        if color != depth || color.is_empty() {
            log::error!(
                "failed to make complete framebuffer: {}",
                FramebufferError::Incomplete { color, depth }
            );
            return false;
        }

        if color != self.requested_size {
            log::warn!(
                "drawable requested at {} was allocated at {color}",
                self.requested_size
            );
        }

        log::debug!("framebuffer created at {color}");
        self.framebuffer = Some(framebuffer);
        true
    }

    fn destroy_framebuffer(&mut self) {
        self.framebuffer = None;
    }
}

impl<B: GraphicsBackend> Drop for RenderSurface<B> {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::{Mat4, Vec3};

    use super::*;
    use crate::geometry::gravity_arrow;
    use crate::motion::{GravityFilter, GravitySample};
    use crate::surface::testing::{CountingSource, MockBackend, MockState, SourceCounts};

    struct Fixture {
        surface: RenderSurface<MockBackend>,
        backend: Rc<RefCell<MockState>>,
        timing: SourceCounts,
        gravity: SharedGravity,
    }

    fn fixture_with(fallback: OrientationFallbackPolicy) -> Fixture {
        let (backend, state) = MockBackend::new();
        let (source, timing) = CountingSource::new();
        let gravity = SharedGravity::new(GravityFilter::new(0.5).unwrap());
        let config = SurfaceConfig {
            fallback,
            ..SurfaceConfig::default()
        };
        let surface = RenderSurface::with_timing_source(
            backend,
            config,
            &gravity_arrow().unwrap(),
            gravity.clone(),
            Box::new(source),
        )
        .unwrap();

        Fixture {
            surface,
            backend: state,
            timing,
            gravity,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(OrientationFallbackPolicy::Identity)
    }

    fn assert_bundle_matches(surface: &RenderSurface<MockBackend>, size: PixelSize) {
        let fb = surface.framebuffer().expect("framebuffer");
        assert_eq!(fb.color_size(), fb.depth_size());
        assert_eq!(fb.color_size(), size);
    }

    #[test]
    fn construction_configures_once_and_builds_first_framebuffer() {
        let f = fixture();
        assert_eq!(f.surface.state(), SurfaceState::Configured);
        assert_eq!(f.backend.borrow().configure_calls, 1);
        assert!(f.backend.borrow().make_current_calls >= 2);
        assert_bundle_matches(&f.surface, PixelSize::new(640, 480));
        assert!(!f.surface.is_animating());
    }

    #[test]
    fn lost_context_at_construction_is_fatal() {
        let (backend, state) = MockBackend::new();
        state.borrow_mut().context_lost = true;
        let result = RenderSurface::new(
            backend,
            SurfaceConfig::default(),
            &gravity_arrow().unwrap(),
            SharedGravity::default(),
        );
        assert!(matches!(result, Err(ContextError::Lost(_))));
        assert_eq!(state.borrow().configure_calls, 0);
    }

    #[test]
    fn resizes_always_leave_matching_buffers_at_latest_size() {
        let mut f = fixture();
        for (w, h) in [(800, 600), (1, 1), (1920, 1080), (333, 777)] {
            assert!(f.surface.layout_changed(PixelSize::new(w, h)));
            assert_bundle_matches(&f.surface, PixelSize::new(w, h));
            f.surface.draw_frame().unwrap();
        }

        let state = f.backend.borrow();
        assert_eq!(state.created.last(), Some(&PixelSize::new(333, 777)));
        let drawn: Vec<PixelSize> = state.draws.iter().map(|(size, _)| *size).collect();
        assert_eq!(
            drawn,
            vec![
                PixelSize::new(800, 600),
                PixelSize::new(1, 1),
                PixelSize::new(1920, 1080),
                PixelSize::new(333, 777),
            ]
        );
    }

    #[test]
    fn oversized_request_is_clamped_to_device_limit() {
        let mut f = fixture();
        f.backend.borrow_mut().max_side = 2048;
        assert!(f.surface.layout_changed(PixelSize::new(5000, 1000)));
        assert_bundle_matches(&f.surface, PixelSize::new(2048, 1000));
    }

    #[test]
    fn failed_creation_leaves_surface_undrawable_until_next_resize() {
        let mut f = fixture();
        f.backend.borrow_mut().fail_creation = true;
        assert!(!f.surface.layout_changed(PixelSize::new(800, 600)));
        assert!(!f.surface.is_drawable());
        assert_eq!(f.surface.draw_frame(), Ok(FrameOutcome::Undrawable));
        assert!(f.backend.borrow().draws.is_empty());

        f.backend.borrow_mut().fail_creation = false;
        assert!(f.surface.layout_changed(PixelSize::new(800, 600)));
        assert_eq!(f.surface.draw_frame(), Ok(FrameOutcome::Presented));
    }

    #[test]
    fn mismatched_depth_buffer_is_rejected() {
        let mut f = fixture();
        f.backend.borrow_mut().mismatch_depth = true;
        assert!(!f.surface.layout_changed(PixelSize::new(800, 600)));
        assert!(f.surface.framebuffer().is_none());
    }

    #[test]
    fn zero_size_layout_is_undrawable() {
        let mut f = fixture();
        assert!(!f.surface.layout_changed(PixelSize::new(0, 600)));
        assert!(!f.surface.is_drawable());
        assert_eq!(f.surface.requested_size(), PixelSize::new(0, 600));
    }

    #[test]
    fn start_twice_subscribes_once() {
        let mut f = fixture();
        f.surface.start_animation();
        f.surface.start_animation();
        assert_eq!(f.surface.state(), SurfaceState::Running);
        assert_eq!(f.timing.adds(), 1);
        assert_eq!(f.timing.active(), 1);

        // One draw per tick, not two.
        f.surface.on_display_tick(Instant::now()).unwrap();
        assert_eq!(f.backend.borrow().draws.len(), 1);
    }

    #[test]
    fn stop_before_start_keeps_configured_state() {
        let mut f = fixture();
        f.surface.stop_animation();
        assert_eq!(f.surface.state(), SurfaceState::Configured);
        assert_eq!(f.timing.invalidates(), 0);
    }

    #[test]
    fn no_draws_after_stop() {
        let mut f = fixture();
        f.surface.start_animation();
        assert_eq!(
            f.surface.on_display_tick(Instant::now()),
            Ok(Some(FrameOutcome::Presented))
        );

        f.surface.stop_animation();
        assert_eq!(f.surface.state(), SurfaceState::Stopped);
        for _ in 0..5 {
            assert_eq!(f.surface.on_display_tick(Instant::now()), Ok(None));
        }
        assert_eq!(f.backend.borrow().draws.len(), 1);
        assert_eq!(f.surface.frames_presented(), 1);
    }

    #[test]
    fn display_sync_interval_paces_skipped_ticks() {
        let (backend, state) = MockBackend::new();
        let gravity = SharedGravity::new(GravityFilter::new(0.5).unwrap());
        let period = Duration::from_millis(10);
        let config = SurfaceConfig {
            frame_interval: FrameInterval::new(4).unwrap(),
            refresh_period: Some(period),
            ..SurfaceConfig::default()
        };
        let mut surface =
            RenderSurface::new(backend, config, &gravity_arrow().unwrap(), gravity).unwrap();
        surface.start_animation();

        let t0 = Instant::now();
        for _ in 0..8 {
            surface.on_display_tick(t0).unwrap();
        }
        assert_eq!(state.borrow().draws.len(), 1);
        assert_eq!(surface.next_deadline(), Some(t0 + period));

        let mut now = t0;
        let mut drawn_at = vec![t0];
        while drawn_at.len() < 3 {
            now = surface.next_deadline().unwrap_or(now);
            if surface.on_display_tick(now).unwrap().is_some() {
                drawn_at.push(now);
            }
        }
        assert_eq!(drawn_at, [t0, t0 + period * 4, t0 + period * 8]);
        assert_eq!(surface.frames_presented(), 3);
    }

    #[test]
    fn resize_while_running_can_present_immediately() {
        let mut f = fixture();
        f.surface.start_animation();
        f.surface.on_display_tick(Instant::now()).unwrap();

        assert!(f.surface.layout_changed(PixelSize::new(800, 600)));
        assert_eq!(f.surface.draw_frame(), Ok(FrameOutcome::Presented));
        assert!(f.surface.is_animating());
        assert_eq!(f.backend.borrow().draws[1].0, PixelSize::new(800, 600));
    }

    #[test]
    fn frame_interval_rules() {
        let mut f = fixture();

        assert!(!f.surface.set_animation_frame_interval(0));
        assert_eq!(f.surface.animation_frame_interval(), 1);

        assert!(f.surface.set_animation_frame_interval(2));
        assert_eq!(f.surface.animation_frame_interval(), 2);
        assert_eq!(f.timing.adds(), 0);

        f.surface.start_animation();
        assert!(f.surface.set_animation_frame_interval(3));
        assert_eq!(f.timing.adds(), 2);
        assert_eq!(f.timing.active(), 1);
        assert_eq!(f.timing.last_interval(), Some(3));
        assert!(f.surface.is_animating());
    }

    #[test]
    fn draw_uses_latest_gravity_each_frame() {
        let mut f = fixture();

        f.surface.draw_frame().unwrap();
        for _ in 0..30 {
            f.gravity.push(GravitySample::new(0.0, 0.0, -1.0));
        }
        f.surface.draw_frame().unwrap();

        let state = f.backend.borrow();
        let (_, fallback) = state.draws[0];
        let (_, tracked) = state.draws[1];

        let placement = Mat4::from_translation(Vec3::new(0.0, -0.1, -1.0))
            * Mat4::from_scale(Vec3::splat(3.0));
        assert!(fallback.model_view.abs_diff_eq(placement, 1e-6));

        // The arrow (model -Y) now points along gravity, i.e. away from the viewer.
        let tip = tracked.model_view.transform_vector3(Vec3::NEG_Y);
        assert!((tip.normalize() - Vec3::NEG_Z).length() < 1e-3);
    }

    #[test]
    fn projection_follows_drawable_aspect_ratio() {
        let mut f = fixture();
        f.surface.layout_changed(PixelSize::new(1000, 500));
        f.surface.draw_frame().unwrap();

        let expected = SceneSetup::default()
            .projection
            .matrix(PixelSize::new(1000, 500));
        assert_eq!(f.backend.borrow().draws[0].1.projection, expected);
    }

    #[test]
    fn spin_fallback_advances_once_per_frame() {
        let mut f = fixture_with(OrientationFallbackPolicy::AnimatedSpin);
        f.surface.draw_frame().unwrap();
        f.surface.draw_frame().unwrap();
        f.surface.draw_frame().unwrap();

        let state = f.backend.borrow();
        assert_ne!(state.draws[0].1.model_view, state.draws[1].1.model_view);
        assert_ne!(state.draws[1].1.model_view, state.draws[2].1.model_view);
    }

    #[test]
    fn lost_context_during_draw_is_reported() {
        let mut f = fixture();
        f.backend.borrow_mut().context_lost = true;
        assert!(matches!(
            f.surface.draw_frame(),
            Err(FrameError::Context(ContextError::Lost(_)))
        ));
    }

    #[test]
    fn skipped_frames_are_not_counted() {
        let mut f = fixture();
        f.backend.borrow_mut().outcome = FrameOutcome::Skipped;
        assert_eq!(f.surface.draw_frame(), Ok(FrameOutcome::Skipped));
        assert_eq!(f.surface.frames_presented(), 0);
    }

    #[test]
    fn destroy_stops_animation_and_ignores_later_calls() {
        let mut f = fixture();
        f.surface.start_animation();
        f.surface.destroy();

        assert_eq!(f.surface.state(), SurfaceState::Destroyed);
        assert!(!f.surface.is_drawable());
        assert_eq!(f.timing.active(), 0);

        f.surface.start_animation();
        assert_eq!(f.timing.adds(), 1);
        assert!(!f.surface.layout_changed(PixelSize::new(10, 10)));
        assert_eq!(f.surface.draw_frame(), Ok(FrameOutcome::Undrawable));
    }
}
