//! Display timing.
//!
//! A `TimingSource` decides which display ticks produce a draw. Two sources are
//! provided and selected by configuration:
//! - `DisplayLink`: counts vsync-paced redraws and fires every N-th one,
//!   pacing the skipped ones by the monitor's refresh period
//! - `IntervalTimer`: fires on wall-clock deadlines of N/60 s, for platforms
//!   where redraws are not paced by the display

mod display_link;
mod interval;
mod interval_timer;
mod source;

pub use display_link::{refresh_period_from_millihertz, DisplayLink, DEFAULT_REFRESH_PERIOD};
pub use interval::FrameInterval;
pub use interval_timer::IntervalTimer;
pub use source::{TimingSource, TimingSourceKind};
