use thiserror::Error;

/// Configuration errors raised by the motion subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MotionError {
    /// The smoothing factor must lie strictly between 0 and 1.
    #[error("filtering factor {0} is outside (0, 1)")]
    InvalidFilteringFactor(f32),
}
