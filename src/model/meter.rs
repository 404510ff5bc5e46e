use serde::{Deserialize, Serialize};

/// Beats per measure when no meter breakpoint applies.
pub const DEFAULT_BEATS_PER_MEASURE: u32 = 4;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MeterError {
    #[error("invalid meter {0}: beats per measure must be at least 1")]
    InvalidMeter(u32),
}

/// A point at which the time signature changes, anchored to a beat index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterBreakpoint {
    pub beat_index: u32,
    pub beats_per_measure: u32,
}

/// 1-based measure/beat display position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurePosition {
    pub measure: u32,
    pub beat: f64,
}

/// Piecewise time-signature map, independent of the tempo map and keyed by
/// the same beat-index axis.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeterMap {
    breakpoints: Vec<MeterBreakpoint>,
}

impl MeterMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_breakpoints(
        breakpoints: impl IntoIterator<Item = MeterBreakpoint>,
    ) -> Result<Self, MeterError> {
        let mut map = Self::new();
        for bp in breakpoints {
            map.insert(bp)?;
        }
        Ok(map)
    }

    pub fn breakpoints(&self) -> &[MeterBreakpoint] {
        &self.breakpoints
    }

    /// Insert a breakpoint, replacing any existing one at the same beat
    /// index.
    pub fn insert(&mut self, bp: MeterBreakpoint) -> Result<(), MeterError> {
        if bp.beats_per_measure < 1 {
            return Err(MeterError::InvalidMeter(bp.beats_per_measure));
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

    /// Step function: beats per measure in effect at a beat index.
    pub fn beats_per_measure_at(&self, beat_index: f64) -> u32 {
        let mut beats = DEFAULT_BEATS_PER_MEASURE;
        for bp in &self.breakpoints {
            if f64::from(bp.beat_index) > beat_index {
                break;
            }
            beats = bp.beats_per_measure;
        }
        beats
    }

    /// Convert a beat index to a 1-based measure/beat display position,
    /// accumulating whole measures per meter segment.
    pub fn beat_to_measure(&self, beat_index: f64) -> MeasurePosition {
        let beat_index = beat_index.max(0.0);
        let mut measure = 0u32;
        let mut segment_start = 0.0;
        let mut beats_per_measure = DEFAULT_BEATS_PER_MEASURE;

        for bp in &self.breakpoints {
            let bp_beat = f64::from(bp.beat_index);
            if bp_beat > beat_index {
                break;
            }
            // A breakpoint mid-measure cuts that measure short; the
            // partial measure still counts, so the new meter starts a
            // fresh measure at the breakpoint.
            measure += ((bp_beat - segment_start) / f64::from(beats_per_measure)).ceil() as u32;
            segment_start = bp_beat;
            beats_per_measure = bp.beats_per_measure;
        }

        let beats_into_segment = beat_index - segment_start;
        let per = f64::from(beats_per_measure);
        measure += (beats_into_segment / per).floor() as u32;
        let beat = beats_into_segment % per;
        MeasurePosition {
            measure: measure + 1,
            beat: beat + 1.0,
        }
    }

    /// Inverse of [`beat_to_measure`](Self::beat_to_measure) for 1-based
    /// display coordinates.
    pub fn measure_to_beat(&self, measure: u32, beat: f64) -> f64 {
        let target_measure = measure.saturating_sub(1);
        let mut measures_so_far = 0u32;
        let mut segment_start = 0.0;
        let mut beats_per_measure = DEFAULT_BEATS_PER_MEASURE;

        for bp in &self.breakpoints {
            let bp_beat = f64::from(bp.beat_index);
            let segment_measures =
                ((bp_beat - segment_start) / f64::from(beats_per_measure)).ceil() as u32;
            if measures_so_far + segment_measures > target_measure {
                break;
            }
            measures_so_far += segment_measures;
            segment_start = bp_beat;
            beats_per_measure = bp.beats_per_measure;
        }

        segment_start
            + f64::from(target_measure - measures_so_far) * f64::from(beats_per_measure)
            + (beat - 1.0)
    }
}
