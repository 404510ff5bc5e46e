//! Tempo and timeline synchronization core for a rhythm-game chart
//! editor and player: beat/time conversion under tempo changes, timeline
//! pixel geometry, grid snapping, layer visibility masking, a transport-
//! synchronized playback clock, and hold-note judgment.

pub mod edit;
pub mod model;
pub mod play;
pub mod util;

pub use edit::TimelineController;
pub use model::chart::Chart;
pub use play::{PlaybackClock, PlaySession};
