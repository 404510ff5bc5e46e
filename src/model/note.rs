use serde::{Deserialize, Serialize};

/// Number of play lanes.
pub const LANE_COUNT: usize = 4;

/// Holds shorter than this are normalized down to taps.
pub const MIN_HOLD_DURATION_MS: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteKind {
    Tap,
    Hold,
}

/// A chart note. `duration_ms == 0` iff the note is a tap; a hold always
/// spans at least [`MIN_HOLD_DURATION_MS`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: u32,
    pub lane: usize,
    pub time_ms: f64,
    pub duration_ms: f64,
    pub kind: NoteKind,
    /// Set by the judgment FSM during play; reset on session start.
    #[serde(default)]
    pub hit: bool,
}

impl Note {
    /// Create a note, normalizing degenerate holds to taps and clamping
    /// the start time to zero.
    pub fn new(id: u32, lane: usize, time_ms: f64, duration_ms: f64) -> Self {
        let time_ms = time_ms.max(0.0);
        let duration_ms = duration_ms.max(0.0);
        if duration_ms < MIN_HOLD_DURATION_MS {
            Self {
                id,
                lane,
                time_ms,
                duration_ms: 0.0,
                kind: NoteKind::Tap,
                hit: false,
            }
        } else {
            Self {
                id,
                lane,
                time_ms,
                duration_ms,
                kind: NoteKind::Hold,
                hit: false,
            }
        }
    }

    pub fn end_time_ms(&self) -> f64 {
        self.time_ms + self.duration_ms
    }

    pub fn is_hold(&self) -> bool {
        self.kind == NoteKind::Hold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tap_has_zero_duration() {
        let note = Note::new(1, 0, 1000.0, 0.0);
        assert_eq!(note.kind, NoteKind::Tap);
        assert_eq!(note.end_time_ms(), 1000.0);
    }

    #[test]
    fn short_hold_normalizes_to_tap() {
        let note = Note::new(1, 2, 1000.0, 49.9);
        assert_eq!(note.kind, NoteKind::Tap);
        assert_eq!(note.duration_ms, 0.0);
    }

    #[test]
    fn hold_keeps_duration() {
        let note = Note::new(1, 3, 1000.0, 50.0);
        assert_eq!(note.kind, NoteKind::Hold);
        assert_eq!(note.end_time_ms(), 1050.0);
    }

    #[test]
    fn negative_time_clamped() {
        let note = Note::new(1, 0, -20.0, 0.0);
        assert_eq!(note.time_ms, 0.0);
    }
}
