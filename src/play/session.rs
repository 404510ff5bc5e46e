use tracing::debug;

use crate::model::note::{LANE_COUNT, Note, NoteKind};

use super::judge::{JudgeTier, JudgeWindows};

/// Per-note judgment lifecycle. Taps go straight from `Pending` to
/// `Judged`; holds pass through `Held` between press and release.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NoteState {
    Pending,
    Held { pressed_at_ms: f64 },
    Judged(JudgeTier),
}

#[derive(Debug, Clone)]
struct TrackedNote {
    note: Note,
    state: NoteState,
}

/// Running score tallies for a play session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Score {
    pub perfect: u32,
    pub great: u32,
    pub good: u32,
    pub miss: u32,
    pub combo: u32,
    pub max_combo: u32,
    pub total_score: u32,
}

impl Score {
    fn record(&mut self, tier: JudgeTier) {
        match tier {
            JudgeTier::Perfect => self.perfect += 1,
            JudgeTier::Great => self.great += 1,
            JudgeTier::Good => self.good += 1,
            JudgeTier::Miss => self.miss += 1,
        }
        if tier.is_miss() {
            self.combo = 0;
        } else {
            self.combo += 1;
            self.max_combo = self.max_combo.max(self.combo);
        }
        self.total_score += tier.score();
    }
}

/// A single play-through: owns the notes being judged, their states, and
/// the score. Constructed at session start (which resets every note's
/// `hit` flag) and dropped at session end.
pub struct PlaySession {
    notes: Vec<TrackedNote>,
    lanes: Vec<Vec<usize>>,
    windows: JudgeWindows,
    release_windows: JudgeWindows,
    score: Score,
    current_time_ms: f64,
}

impl PlaySession {
    pub fn new(notes: impl IntoIterator<Item = Note>) -> Self {
        Self::with_windows(notes, JudgeWindows::normal(), JudgeWindows::hold_release())
    }

    pub fn with_windows(
        notes: impl IntoIterator<Item = Note>,
        windows: JudgeWindows,
        release_windows: JudgeWindows,
    ) -> Self {
        let mut tracked: Vec<TrackedNote> = notes
            .into_iter()
            .map(|mut note| {
                note.hit = false;
                TrackedNote {
                    note,
                    state: NoteState::Pending,
                }
            })
            .collect();
        tracked.sort_by(|a, b| a.note.time_ms.total_cmp(&b.note.time_ms));

        let mut lanes: Vec<Vec<usize>> = vec![Vec::new(); LANE_COUNT];
        for (idx, t) in tracked.iter().enumerate() {
            if t.note.lane < LANE_COUNT {
                lanes[t.note.lane].push(idx);
            }
        }

        Self {
            notes: tracked,
            lanes,
            windows,
            release_windows,
            score: Score::default(),
            current_time_ms: 0.0,
        }
    }

    pub fn score(&self) -> &Score {
        &self.score
    }

    pub fn notes(&self) -> impl Iterator<Item = &Note> {
        self.notes.iter().map(|t| &t.note)
    }

    pub fn note_state(&self, note_id: u32) -> Option<NoteState> {
        self.notes
            .iter()
            .find(|t| t.note.id == note_id)
            .map(|t| t.state)
    }

    /// All notes judged (the session has nothing left to wait for).
    pub fn is_complete(&self) -> bool {
        self.notes
            .iter()
            .all(|t| matches!(t.state, NoteState::Judged(_)))
    }

    /// Advance the session clock and sweep notes whose windows have
    /// closed: pending notes past the miss tolerance become misses, and
    /// holds still held past the release window are completed as Good.
    pub fn update(&mut self, now_ms: f64) {
        self.current_time_ms = now_ms;
        let miss_tolerance = self.windows.miss_tolerance();
        let release_window = self.release_windows.good_window;

        for idx in 0..self.notes.len() {
            match self.notes[idx].state {
                NoteState::Pending => {
                    if now_ms > self.notes[idx].note.time_ms + miss_tolerance {
                        self.judge(idx, JudgeTier::Miss);
                    }
                }
                NoteState::Held { .. } => {
                    if now_ms > self.notes[idx].note.end_time_ms() + release_window {
                        // Held to completion but never released in time;
                        // the hold itself succeeded.
                        self.judge(idx, JudgeTier::Good);
                    }
                }
                NoteState::Judged(_) => {}
            }
        }
    }

    /// Handle an input press on a lane. Returns the judgment applied to a
    /// tap, or `None` when nothing was in range (stray presses are not
    /// penalized) or a hold began.
    pub fn key_press(&mut self, lane: usize, time_ms: f64) -> Option<JudgeTier> {
        self.current_time_ms = time_ms;
        let idx = self.nearest_pending(lane, time_ms)?;

        match self.notes[idx].note.kind {
            NoteKind::Tap => {
                let offset = self.notes[idx].note.time_ms - time_ms;
                let tier = self.windows.judge(offset);
                self.judge(idx, tier);
                Some(tier)
            }
            NoteKind::Hold => {
                self.notes[idx].state = NoteState::Held {
                    pressed_at_ms: time_ms,
                };
                debug!(note_id = self.notes[idx].note.id, "hold engaged");
                None
            }
        }
    }

    /// Handle an input release on a lane, completing any engaged hold
    /// there. Returns the judgment applied, if any.
    pub fn key_release(&mut self, lane: usize, time_ms: f64) -> Option<JudgeTier> {
        self.current_time_ms = time_ms;
        let idx = self
            .lanes
            .get(lane)?
            .iter()
            .copied()
            .find(|&idx| matches!(self.notes[idx].state, NoteState::Held { .. }))?;

        let end = self.notes[idx].note.end_time_ms();
        let offset = end - time_ms;
        let tier = if self.release_windows.is_in_window(offset) {
            self.release_windows.judge(offset)
        } else if time_ms < end {
            // Let go before reaching the release window.
            JudgeTier::Miss
        } else {
            // Past the window; the sweep in update() normally gets here
            // first, but a late release event must not be lost.
            JudgeTier::Good
        };
        self.judge(idx, tier);
        Some(tier)
    }

    /// Nearest unjudged note on the lane within the search range.
    fn nearest_pending(&self, lane: usize, time_ms: f64) -> Option<usize> {
        let range = self.windows.search_range();
        self.lanes
            .get(lane)?
            .iter()
            .copied()
            .filter(|&idx| self.notes[idx].state == NoteState::Pending)
            .map(|idx| (idx, (self.notes[idx].note.time_ms - time_ms).abs()))
            .filter(|&(_, diff)| diff <= range)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(idx, _)| idx)
    }

    /// Apply a judgment exactly once; repeat calls for an already-judged
    /// note are no-ops.
    fn judge(&mut self, idx: usize, tier: JudgeTier) {
        if matches!(self.notes[idx].state, NoteState::Judged(_)) {
            return;
        }
        self.notes[idx].state = NoteState::Judged(tier);
        self.notes[idx].note.hit = !tier.is_miss();
        self.score.record(tier);
        debug!(
            note_id = self.notes[idx].note.id,
            ?tier,
            combo = self.score.combo,
            "note judged"
        );
    }
}
