// Chart data models: tempo, meter, notes, and the visibility mask.

pub mod chart;
pub mod meter;
pub mod note;
pub mod tempo;
pub mod visibility;

pub use chart::{Chart, ChartError};
pub use meter::{MeasurePosition, MeterBreakpoint, MeterError, MeterMap};
pub use note::{LANE_COUNT, MIN_HOLD_DURATION_MS, Note, NoteKind};
pub use tempo::{SpeedChange, TempoBreakpoint, TempoError, TempoMap, beat_duration_ms};
pub use visibility::{VisibilityInterval, VisibilityMask, VisibilityMode};
