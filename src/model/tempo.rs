use serde::{Deserialize, Serialize};

/// Duration of one beat in milliseconds at the given bpm.
pub fn beat_duration_ms(bpm: f64) -> f64 {
    if bpm <= 0.0 || !bpm.is_finite() {
        return 0.0;
    }
    60_000.0 / bpm
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TempoError {
    #[error("invalid bpm {0}: must be finite and positive")]
    InvalidBpm(f64),
}

/// A point at which the bpm changes, anchored to an integer beat index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TempoBreakpoint {
    pub beat_index: u32,
    pub bpm: f64,
}

/// Editor-facing view of a tempo segment keyed by absolute time.
/// `end_time_ms = None` means "until the next change or end of chart".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeedChange {
    pub id: u32,
    pub start_time_ms: f64,
    pub end_time_ms: Option<f64>,
    pub bpm: f64,
}

/// Piecewise-constant tempo over the chart: a base bpm plus breakpoints
/// sorted by strictly increasing beat index. The beat-indexed breakpoint
/// list is the single source of truth; time-indexed views are derived.
#[derive(Debug, Clone, PartialEq)]
pub struct TempoMap {
    base_bpm: f64,
    breakpoints: Vec<TempoBreakpoint>,
}

impl TempoMap {
    pub fn new(base_bpm: f64) -> Result<Self, TempoError> {
        if !(base_bpm.is_finite() && base_bpm > 0.0) {
            return Err(TempoError::InvalidBpm(base_bpm));
        }
        Ok(Self {
            base_bpm,
            breakpoints: Vec::new(),
        })
    }

    /// Build from an unsorted breakpoint list. Breakpoints at a duplicate
    /// beat index replace the earlier one, matching editor update-in-place.
    pub fn with_breakpoints(
        base_bpm: f64,
        breakpoints: impl IntoIterator<Item = TempoBreakpoint>,
    ) -> Result<Self, TempoError> {
        let mut map = Self::new(base_bpm)?;
        for bp in breakpoints {
            map.insert(bp)?;
        }
        Ok(map)
    }

    pub fn base_bpm(&self) -> f64 {
        self.base_bpm
    }

    pub fn breakpoints(&self) -> &[TempoBreakpoint] {
        &self.breakpoints
    }

    /// Insert a breakpoint, replacing any existing one at the same beat
    /// index. Non-positive or non-finite bpm is rejected here so the
    /// conversion math below never sees it.
    pub fn insert(&mut self, bp: TempoBreakpoint) -> Result<(), TempoError> {
        if !(bp.bpm.is_finite() && bp.bpm > 0.0) {
            return Err(TempoError::InvalidBpm(bp.bpm));
        }
        match self
            .breakpoints
            .binary_search_by_key(&bp.beat_index, |b| b.beat_index)
        {
            Ok(idx) => self.breakpoints[idx] = bp,
            Err(idx) => self.breakpoints.insert(idx, bp),
        }
        Ok(())
    }

    /// Remove the breakpoint at the given beat index. Returns whether one
    /// existed.
    pub fn remove(&mut self, beat_index: u32) -> bool {
        match self
            .breakpoints
            .binary_search_by_key(&beat_index, |b| b.beat_index)
        {
            Ok(idx) => {
                self.breakpoints.remove(idx);
                true
            }
            Err(_) => false,
        }
    }

    /// Convert a (possibly fractional) beat index to absolute milliseconds,
    /// accumulating each constant-bpm segment in order.
    pub fn beat_index_to_time_ms(&self, beat_index: f64) -> f64 {
        let mut time_ms = 0.0;
        let mut current_bpm = self.base_bpm;
        let mut current_beat = 0.0;

        for bp in &self.breakpoints {
            let bp_beat = f64::from(bp.beat_index);
            if bp_beat >= beat_index {
                break;
            }
            time_ms += (bp_beat - current_beat) * beat_duration_ms(current_bpm);
            current_beat = bp_beat;
            current_bpm = bp.bpm;
        }

        time_ms + (beat_index - current_beat) * beat_duration_ms(current_bpm)
    }

    /// Inverse of [`beat_index_to_time_ms`](Self::beat_index_to_time_ms):
    /// walk segments until the one containing `time_ms`, then resolve the
    /// remainder at that segment's bpm.
    pub fn time_ms_to_beat_index(&self, time_ms: f64) -> f64 {
        let mut elapsed_ms = 0.0;
        let mut current_bpm = self.base_bpm;
        let mut current_beat = 0.0;

        for bp in &self.breakpoints {
            let bp_beat = f64::from(bp.beat_index);
            let segment_ms = (bp_beat - current_beat) * beat_duration_ms(current_bpm);
            if elapsed_ms + segment_ms >= time_ms {
                return current_beat + (time_ms - elapsed_ms) * current_bpm / 60_000.0;
            }
            elapsed_ms += segment_ms;
            current_beat = bp_beat;
            current_bpm = bp.bpm;
        }

        current_beat + (time_ms - elapsed_ms) * current_bpm / 60_000.0
    }

    /// The bpm in effect at a beat index: the last breakpoint at or before
    /// it, or the base bpm if none.
    pub fn bpm_at_beat_index(&self, beat_index: f64) -> f64 {
        let mut bpm = self.base_bpm;
        for bp in &self.breakpoints {
            if f64::from(bp.beat_index) > beat_index {
                break;
            }
            bpm = bp.bpm;
        }
        bpm
    }

    pub fn bpm_at_time_ms(&self, time_ms: f64) -> f64 {
        self.bpm_at_beat_index(self.time_ms_to_beat_index(time_ms))
    }

    /// Number of beats contained in `[0, duration_ms]`.
    pub fn total_beats(&self, duration_ms: f64) -> f64 {
        self.time_ms_to_beat_index(duration_ms.max(0.0))
    }

    /// Derive the editor-facing time-indexed view. Each breakpoint becomes
    /// a segment starting at its absolute time and ending where the next
    /// breakpoint begins (open-ended for the last one).
    pub fn speed_change_view(&self) -> Vec<SpeedChange> {
        self.breakpoints
            .iter()
            .enumerate()
            .map(|(i, bp)| SpeedChange {
                id: i as u32,
                start_time_ms: self.beat_index_to_time_ms(f64::from(bp.beat_index)),
                end_time_ms: self
                    .breakpoints
                    .get(i + 1)
                    .map(|next| self.beat_index_to_time_ms(f64::from(next.beat_index))),
                bpm: bp.bpm,
            })
            .collect()
    }

    /// Convert a legacy time-indexed speed-change list into breakpoints.
    /// Each change's start time is mapped through the map built so far, so
    /// later changes land on beats computed under earlier changes. Changes
    /// with invalid bpm are rejected; `end_time_ms` is ignored (a segment
    /// runs until the next change, which is the only behavior the player
    /// ever exercised).
    pub fn from_speed_changes(
        base_bpm: f64,
        changes: &[SpeedChange],
    ) -> Result<Self, TempoError> {
        let mut map = Self::new(base_bpm)?;
        let mut sorted: Vec<&SpeedChange> = changes.iter().collect();
        sorted.sort_by(|a, b| a.start_time_ms.total_cmp(&b.start_time_ms));
        for change in sorted {
            let beat = map.time_ms_to_beat_index(change.start_time_ms.max(0.0));
            map.insert(TempoBreakpoint {
                beat_index: beat.round().max(0.0) as u32,
                bpm: change.bpm,
            })?;
        }
        Ok(map)
    }
}

/// The bpm in effect at `time_ms` according to a time-indexed speed-change
/// list: the last segment containing the time wins, falling back to
/// `base_bpm` outside every segment.
pub fn effective_bpm_at(time_ms: f64, base_bpm: f64, changes: &[SpeedChange]) -> f64 {
    let mut sorted: Vec<&SpeedChange> = changes.iter().collect();
    sorted.sort_by(|a, b| a.start_time_ms.total_cmp(&b.start_time_ms));

    let mut bpm = base_bpm;
    for change in sorted {
        if time_ms < change.start_time_ms {
            break;
        }
        match change.end_time_ms {
            Some(end) if time_ms >= end => {}
            _ => bpm = change.bpm,
        }
    }
    bpm
}

/// How much faster than the base tempo the chart scrolls at `time_ms`
/// (>1 faster, <1 slower).
pub fn scroll_speed_multiplier(time_ms: f64, base_bpm: f64, changes: &[SpeedChange]) -> f64 {
    if base_bpm <= 0.0 {
        return 1.0;
    }
    effective_bpm_at(time_ms, base_bpm, changes) / base_bpm
}

/// Scale a note's fall duration by the tempo in effect at its judge time.
pub fn note_fall_duration_ms(
    note_time_ms: f64,
    base_bpm: f64,
    changes: &[SpeedChange],
    base_fall_duration_ms: f64,
) -> f64 {
    if base_bpm <= 0.0 || base_fall_duration_ms <= 0.0 {
        return base_fall_duration_ms;
    }
    let effective = effective_bpm_at(note_time_ms, base_bpm, changes);
    if effective <= 0.0 {
        return base_fall_duration_ms;
    }
    base_fall_duration_ms * base_bpm / effective
}
