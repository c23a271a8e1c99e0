use crate::surface::{FrameError, FrameOutcome};

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

impl SurfaceErrorAction {
    /// Maps the action onto the outcome of the frame that hit the error.
    pub fn into_frame_result(self, err: &wgpu::SurfaceError) -> Result<FrameOutcome, FrameError> {
        match self {
            SurfaceErrorAction::Reconfigured | SurfaceErrorAction::SkipFrame => {
                log::debug!("skipping frame: {err}");
                Ok(FrameOutcome::Skipped)
            }
            SurfaceErrorAction::Fatal => Err(FrameError::Fatal(err.to_string())),
        }
    }
}
