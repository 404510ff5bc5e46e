pub mod clock;
pub mod judge;
pub mod session;
pub mod transport;

pub use clock::{ClockMode, DriveMode, PlaybackClock, SYNC_INTERVAL_MS, TICK_INTERVAL_MS};
pub use judge::{JudgeTier, JudgeWindows};
pub use session::{NoteState, PlaySession, Score};
pub use transport::MediaTransport;
