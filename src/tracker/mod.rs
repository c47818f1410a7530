//! Video watch tracking

pub mod driver;
pub mod playback;
pub mod session;

pub use driver::WatchTracker;
pub use playback::{PlaybackError, PlaybackSource, PlaybackState, SimulatedPlayer};
pub use session::{StopReason, TrackingSummary, WatchSession};
