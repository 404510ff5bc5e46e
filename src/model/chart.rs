use serde::{Deserialize, Serialize};

use super::meter::{MeterBreakpoint, MeterError, MeterMap};
use super::note::Note;
use super::tempo::{SpeedChange, TempoBreakpoint, TempoError, TempoMap};
use super::visibility::{VisibilityInterval, VisibilityMask};

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("chart tempo data is invalid: {0}")]
    Tempo(#[from] TempoError),
    #[error("chart meter data is invalid: {0}")]
    Meter(#[from] MeterError),
    #[error("chart is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Persisted chart fields consumed by the synchronization core. Field names
/// follow the chart JSON format (camelCase).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub bpm: f64,
    #[serde(default)]
    pub bpm_changes: Vec<TempoBreakpoint>,
    #[serde(default)]
    pub time_signatures: Vec<MeterBreakpoint>,
    #[serde(default)]
    pub time_signature_offset_ms: f64,
    /// Legacy time-indexed tempo segments; converted into `bpm_changes`
    /// when building the tempo map. The beat-indexed list is canonical.
    #[serde(default)]
    pub speed_changes: Vec<SpeedChange>,
    #[serde(default)]
    pub bga_visibility_intervals: Vec<VisibilityInterval>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

impl Chart {
    pub fn from_json(json: &str) -> Result<Self, ChartError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ChartError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Build the canonical tempo map. Beat-indexed breakpoints win; a chart
    /// carrying only the legacy time-indexed form is converted.
    pub fn tempo_map(&self) -> Result<TempoMap, TempoError> {
        if self.bpm_changes.is_empty() && !self.speed_changes.is_empty() {
            return TempoMap::from_speed_changes(self.bpm, &self.speed_changes);
        }
        TempoMap::with_breakpoints(self.bpm, self.bpm_changes.iter().copied())
    }

    pub fn meter_map(&self) -> Result<MeterMap, MeterError> {
        MeterMap::with_breakpoints(self.time_signatures.iter().copied())
    }

    /// Build the visibility mask, normalizing restored intervals.
    pub fn visibility_mask(&self) -> VisibilityMask {
        VisibilityMask::from_intervals(self.bga_visibility_intervals.iter().copied())
    }

    /// End time of the latest-ending note, or 0 for an empty chart.
    pub fn last_note_end_ms(&self) -> f64 {
        self.notes
            .iter()
            .map(Note::end_time_ms)
            .fold(0.0, f64::max)
    }
}
