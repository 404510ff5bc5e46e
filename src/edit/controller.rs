use tracing::debug;

use crate::model::chart::{Chart, ChartError};
use crate::model::meter::{MeasurePosition, MeterBreakpoint, MeterError, MeterMap};
use crate::model::note::Note;
use crate::model::tempo::{SpeedChange, TempoBreakpoint, TempoError, TempoMap, beat_duration_ms};
use crate::model::visibility::{VisibilityInterval, VisibilityMask};
use crate::play::clock::PlaybackClock;
use crate::play::transport::MediaTransport;

use super::geometry::TimelineGeometry;
use super::snap;

/// Default grid subdivision (quarter-beat lines).
pub const DEFAULT_GRID_DIVISION: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScrubState {
    Idle,
    Dragging,
}

/// Single owner of the editor's timeline state: tempo and meter maps,
/// geometry, visibility mask, playback clock, grid division, and the note
/// list. The UI layer calls in; nothing here calls out.
pub struct TimelineController {
    tempo: TempoMap,
    meter: MeterMap,
    time_signature_offset_ms: f64,
    geometry: TimelineGeometry,
    mask: VisibilityMask,
    clock: PlaybackClock,
    grid_division: u32,
    notes: Vec<Note>,
    next_note_id: u32,
    extra_tail_ms: f64,
    scrub: ScrubState,
}

impl TimelineController {
    pub fn new(base_bpm: f64, zoom: f64, origin_y: f64) -> Result<Self, TempoError> {
        let geometry = TimelineGeometry::new(zoom, origin_y);
        let clock = PlaybackClock::new(geometry.duration_ms());
        Ok(Self {
            tempo: TempoMap::new(base_bpm)?,
            meter: MeterMap::new(),
            time_signature_offset_ms: 0.0,
            geometry,
            mask: VisibilityMask::new(),
            clock,
            grid_division: DEFAULT_GRID_DIVISION,
            notes: Vec::new(),
            next_note_id: 0,
            extra_tail_ms: 0.0,
            scrub: ScrubState::Idle,
        })
    }

    /// Load a persisted chart into a fresh controller.
    pub fn from_chart(chart: &Chart, zoom: f64, origin_y: f64) -> Result<Self, ChartError> {
        let mut controller = Self::new(chart.bpm, zoom, origin_y)?;
        controller.tempo = chart.tempo_map()?;
        controller.meter = chart.meter_map()?;
        controller.time_signature_offset_ms = chart.time_signature_offset_ms;
        controller.mask = chart.visibility_mask();
        controller.notes = chart.notes.clone();
        controller.notes.sort_by(|a, b| a.time_ms.total_cmp(&b.time_ms));
        controller.next_note_id = chart
            .notes
            .iter()
            .map(|n| n.id.saturating_add(1))
            .max()
            .unwrap_or(0);
        controller.refresh_duration();
        Ok(controller)
    }

    /// Persist the controller state back into chart form.
    pub fn to_chart(&self) -> Chart {
        Chart {
            bpm: self.tempo.base_bpm(),
            bpm_changes: self.tempo.breakpoints().to_vec(),
            time_signatures: self.meter.breakpoints().to_vec(),
            time_signature_offset_ms: self.time_signature_offset_ms,
            speed_changes: Vec::new(),
            bga_visibility_intervals: self.mask.intervals().to_vec(),
            notes: self.notes.clone(),
        }
    }

    // ----- geometry -----

    pub fn time_to_y(&self, time_ms: f64) -> f64 {
        self.geometry.time_to_y(time_ms)
    }

    pub fn y_to_time(&self, y: f64) -> f64 {
        self.geometry.y_to_time(y)
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.geometry.set_zoom(zoom);
    }

    pub fn set_origin_y(&mut self, origin_y: f64) {
        self.geometry.set_origin_y(origin_y);
    }

    pub fn duration_ms(&self) -> f64 {
        self.geometry.duration_ms()
    }

    /// Extra tail the user appended past the computed timeline end.
    pub fn set_extra_tail_ms(&mut self, extra_ms: f64) {
        self.extra_tail_ms = extra_ms.max(0.0);
        self.refresh_duration();
    }

    fn last_note_end_ms(&self) -> f64 {
        self.notes.iter().map(Note::end_time_ms).fold(0.0, f64::max)
    }

    fn refresh_duration(&mut self) {
        self.geometry.update_duration(
            self.last_note_end_ms(),
            self.clock.current_time_ms(),
            self.extra_tail_ms,
        );
        self.clock.set_duration_ms(self.geometry.duration_ms());
    }

    // ----- playback -----

    pub fn current_time_ms(&self) -> f64 {
        self.clock.current_time_ms()
    }

    pub fn current_beat_index(&self) -> f64 {
        self.tempo.time_ms_to_beat_index(self.clock.current_time_ms())
    }

    /// 1-based measure/beat position of the playhead for the status bar.
    /// The meter offset shifts where measure one begins.
    pub fn current_measure(&self) -> MeasurePosition {
        let shifted = (self.clock.current_time_ms() - self.time_signature_offset_ms).max(0.0);
        self.meter
            .beat_to_measure(self.tempo.time_ms_to_beat_index(shifted))
    }

    pub fn is_playing(&self) -> bool {
        self.clock.is_playing()
    }

    pub fn playback_rate(&self) -> f64 {
        self.clock.playback_rate()
    }

    pub fn play(&mut self) {
        self.clock.play();
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn seek(&mut self, time_ms: f64) {
        self.clock.seek(time_ms);
    }

    pub fn set_rate(&mut self, rate: f64) {
        self.clock.set_rate(rate);
    }

    pub fn bind_transport(&mut self, transport: Box<dyn MediaTransport>) {
        self.clock.bind_transport(transport);
    }

    pub fn detach_transport(&mut self) {
        self.clock.detach();
    }

    /// One frame of the host loop: advance the clock and keep the timeline
    /// long enough for the playhead.
    pub fn tick(&mut self, delta_ms: f64) {
        self.clock.tick(delta_ms);
        self.refresh_duration();
    }

    // ----- scrubbing -----

    /// Start dragging the playhead from a pixel position.
    pub fn begin_scrub(&mut self, pixel_y: f64) {
        if self.scrub == ScrubState::Dragging {
            return;
        }
        self.scrub = ScrubState::Dragging;
        self.clock.begin_scrub();
        self.clock.scrub_to(self.geometry.y_to_time(pixel_y));
    }

    pub fn update_scrub(&mut self, pixel_y: f64) {
        if self.scrub != ScrubState::Dragging {
            return;
        }
        self.clock.scrub_to(self.geometry.y_to_time(pixel_y));
    }

    /// Release the drag: one transport seek, playback resumes if it was
    /// running when the drag began.
    pub fn end_scrub(&mut self) {
        if self.scrub != ScrubState::Dragging {
            return;
        }
        self.scrub = ScrubState::Idle;
        self.clock.end_scrub();
    }

    // ----- grid -----

    pub fn grid_division(&self) -> u32 {
        self.grid_division
    }

    pub fn set_grid_division(&mut self, division: u32) {
        self.grid_division = division.max(1);
    }

    /// Snap a raw time to the grid, using the tempo in effect at that
    /// time.
    pub fn snap(&self, time_ms: f64) -> f64 {
        let bpm = self.tempo.bpm_at_time_ms(time_ms);
        snap::snap(time_ms, beat_duration_ms(bpm), self.grid_division)
    }

    // ----- notes -----

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Place a note, snapping its start to the grid. Returns the new id.
    pub fn add_note(&mut self, lane: usize, time_ms: f64, duration_ms: f64) -> u32 {
        let id = self.next_note_id;
        self.next_note_id = self.next_note_id.saturating_add(1);
        let note = Note::new(id, lane, self.snap(time_ms), duration_ms);
        let pos = self
            .notes
            .partition_point(|n| n.time_ms <= note.time_ms);
        self.notes.insert(pos, note);
        debug!(id, lane, time_ms = note.time_ms, "note added");
        self.refresh_duration();
        id
    }

    pub fn remove_note(&mut self, id: u32) -> bool {
        let before = self.notes.len();
        self.notes.retain(|n| n.id != id);
        let removed = self.notes.len() != before;
        if removed {
            self.refresh_duration();
        }
        removed
    }

    /// Move a note to a new (snapped) start time. Returns false if no such
    /// note exists.
    pub fn move_note(&mut self, id: u32, time_ms: f64) -> bool {
        let Some(pos) = self.notes.iter().position(|n| n.id == id) else {
            return false;
        };
        let mut note = self.notes.remove(pos);
        note.time_ms = self.snap(time_ms);
        let pos = self.notes.partition_point(|n| n.time_ms <= note.time_ms);
        self.notes.insert(pos, note);
        self.refresh_duration();
        true
    }

    // ----- tempo and meter -----

    pub fn tempo_map(&self) -> &TempoMap {
        &self.tempo
    }

    pub fn speed_change_view(&self) -> Vec<SpeedChange> {
        self.tempo.speed_change_view()
    }

    pub fn set_base_bpm(&mut self, bpm: f64) -> Result<(), TempoError> {
        self.tempo = TempoMap::with_breakpoints(bpm, self.tempo.breakpoints().iter().copied())?;
        Ok(())
    }

    pub fn add_tempo_change(&mut self, beat_index: u32, bpm: f64) -> Result<(), TempoError> {
        self.tempo.insert(TempoBreakpoint { beat_index, bpm })
    }

    pub fn remove_tempo_change(&mut self, beat_index: u32) -> bool {
        self.tempo.remove(beat_index)
    }

    pub fn meter_map(&self) -> &MeterMap {
        &self.meter
    }

    pub fn add_meter_change(
        &mut self,
        beat_index: u32,
        beats_per_measure: u32,
    ) -> Result<(), MeterError> {
        self.meter.insert(MeterBreakpoint {
            beat_index,
            beats_per_measure,
        })
    }

    pub fn remove_meter_change(&mut self, beat_index: u32) -> bool {
        self.meter.remove(beat_index)
    }

    pub fn set_time_signature_offset_ms(&mut self, offset_ms: f64) {
        self.time_signature_offset_ms = offset_ms;
    }

    // ----- visibility mask -----

    pub fn intervals(&self) -> &[VisibilityInterval] {
        self.mask.intervals()
    }

    pub fn opacity_at(&self, time_ms: f64) -> f64 {
        self.mask.opacity_at(time_ms)
    }

    pub fn current_opacity(&self) -> f64 {
        self.mask.opacity_at(self.clock.current_time_ms())
    }

    /// Add a default interval at the playhead. Returns its id.
    pub fn add_interval(&mut self) -> u32 {
        self.mask.add_at(self.clock.current_time_ms())
    }

    pub fn update_interval(&mut self, id: u32, edit: impl FnOnce(&mut VisibilityInterval)) -> bool {
        self.mask.update(id, edit)
    }

    pub fn remove_interval(&mut self, id: u32) -> bool {
        self.mask.remove(id)
    }
}
