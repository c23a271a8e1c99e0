//! Test doubles for the surface: a recording backend and a counting timing source.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use crate::coords::PixelSize;
use crate::geometry::StripMesh;
use crate::time::{FrameInterval, TimingSource, TimingSourceKind};

use super::{
    ContextError, FrameError, FrameOutcome, FrameParams, Framebuffer, FramebufferError,
    GraphicsBackend, SceneSetup,
};

// ── timing source ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct SourceLog {
    adds: usize,
    invalidates: usize,
    subscribed: bool,
    last_interval: Option<u32>,
}

/// Shared view of a `CountingSource`'s call log.
#[derive(Debug, Clone)]
pub(crate) struct SourceCounts(Rc<RefCell<SourceLog>>);

impl SourceCounts {
    pub(crate) fn adds(&self) -> usize {
        self.0.borrow().adds
    }

    pub(crate) fn invalidates(&self) -> usize {
        self.0.borrow().invalidates
    }

    /// Subscriptions that were added and not yet invalidated.
    pub(crate) fn active(&self) -> usize {
        let log = self.0.borrow();
        log.adds - log.invalidates
    }

    pub(crate) fn last_interval(&self) -> Option<u32> {
        self.0.borrow().last_interval
    }
}

/// Timing source that fires on every tick while subscribed and logs calls.
pub(crate) struct CountingSource(Rc<RefCell<SourceLog>>);

impl CountingSource {
    pub(crate) fn new() -> (Self, SourceCounts) {
        let log = Rc::new(RefCell::new(SourceLog::default()));
        (Self(log.clone()), SourceCounts(log))
    }
}

impl TimingSource for CountingSource {
    fn kind(&self) -> TimingSourceKind {
        TimingSourceKind::DisplaySync
    }

    fn add(&mut self, interval: FrameInterval, _now: Instant) {
        let mut log = self.0.borrow_mut();
        log.adds += 1;
        log.subscribed = true;
        log.last_interval = Some(interval.get());
    }

    fn invalidate(&mut self) {
        let mut log = self.0.borrow_mut();
        log.invalidates += 1;
        log.subscribed = false;
    }

    fn is_subscribed(&self) -> bool {
        self.0.borrow().subscribed
    }

    fn tick(&mut self, _now: Instant) -> bool {
        self.0.borrow().subscribed
    }
}

// ── backend ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MockFramebuffer {
    pub(crate) color: PixelSize,
    pub(crate) depth: PixelSize,
}

impl Framebuffer for MockFramebuffer {
    fn color_size(&self) -> PixelSize {
        self.color
    }

    fn depth_size(&self) -> PixelSize {
        self.depth
    }
}

#[derive(Debug)]
pub(crate) struct MockState {
    pub(crate) backing: PixelSize,
    /// Largest side the fake device accepts; larger requests are clamped.
    pub(crate) max_side: u32,
    pub(crate) context_lost: bool,
    pub(crate) fail_creation: bool,
    /// Allocate a depth target that does not match the color target.
    pub(crate) mismatch_depth: bool,
    pub(crate) outcome: FrameOutcome,

    pub(crate) configure_calls: usize,
    pub(crate) make_current_calls: usize,
    pub(crate) created: Vec<PixelSize>,
    pub(crate) draws: Vec<(PixelSize, FrameParams)>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            backing: PixelSize::new(640, 480),
            max_side: 4096,
            context_lost: false,
            fail_creation: false,
            mismatch_depth: false,
            outcome: FrameOutcome::Presented,
            configure_calls: 0,
            make_current_calls: 0,
            created: Vec::new(),
            draws: Vec::new(),
        }
    }
}

/// Backend recording every call into a shared `MockState`.
pub(crate) struct MockBackend {
    pub(crate) state: Rc<RefCell<MockState>>,
}

impl MockBackend {
    pub(crate) fn new() -> (Self, Rc<RefCell<MockState>>) {
        let state = Rc::new(RefCell::new(MockState::default()));
        (Self { state: state.clone() }, state)
    }
}

impl GraphicsBackend for MockBackend {
    type Framebuffer = MockFramebuffer;

    fn make_current(&mut self) -> Result<(), ContextError> {
        let mut s = self.state.borrow_mut();
        s.make_current_calls += 1;
        if s.context_lost {
            Err(ContextError::Lost("mock".into()))
        } else {
            Ok(())
        }
    }

    fn configure(&mut self, _scene: &SceneSetup, _mesh: &StripMesh) -> Result<(), ContextError> {
        self.state.borrow_mut().configure_calls += 1;
        Ok(())
    }

    fn backing_size(&self) -> PixelSize {
        self.state.borrow().backing
    }

    fn create_framebuffer(
        &mut self,
        requested: PixelSize,
    ) -> Result<MockFramebuffer, FramebufferError> {
        let mut s = self.state.borrow_mut();
        if requested.is_empty() {
            return Err(FramebufferError::ZeroSize(requested));
        }

        let color = requested.clamp_to(s.max_side);
        let depth = if s.mismatch_depth {
            PixelSize::new(color.width / 2, color.height)
        } else {
            color
        };
        if s.fail_creation {
            return Err(FramebufferError::Incomplete { color, depth });
        }

        s.created.push(color);
        Ok(MockFramebuffer { color, depth })
    }

    fn draw_frame(
        &mut self,
        framebuffer: &MockFramebuffer,
        params: &FrameParams,
    ) -> Result<FrameOutcome, FrameError> {
        let mut s = self.state.borrow_mut();
        s.draws.push((framebuffer.color, *params));
        Ok(s.outcome)
    }
}
