use serde::{Deserialize, Serialize};

/// Default span of a freshly added interval (ms).
pub const DEFAULT_INTERVAL_SPAN_MS: f64 = 5000.0;

/// Default fade-in/fade-out of a freshly added interval (ms).
pub const DEFAULT_FADE_MS: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisibilityMode {
    /// The layer fades toward hidden inside the interval.
    #[default]
    Hidden,
    /// The layer fades toward visible inside the interval.
    Visible,
}

/// A time range during which a visual layer is faded to hidden or visible,
/// with independent fade-in and fade-out ramps.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityInterval {
    pub id: u32,
    pub start_time_ms: f64,
    pub end_time_ms: f64,
    pub mode: VisibilityMode,
    #[serde(default)]
    pub fade_in_ms: f64,
    #[serde(default)]
    pub fade_out_ms: f64,
}

impl VisibilityInterval {
    /// Editor drags can transiently invert or collapse an interval, so
    /// malformed input is repaired rather than rejected: start clamped to
    /// zero, end forced past start, fades clamped non-negative.
    fn normalized(mut self) -> Self {
        if !self.start_time_ms.is_finite() {
            self.start_time_ms = 0.0;
        }
        if !self.end_time_ms.is_finite() {
            self.end_time_ms = self.start_time_ms;
        }
        let start = self.start_time_ms.min(self.end_time_ms).max(0.0);
        let end = self.start_time_ms.max(self.end_time_ms).max(start + 1.0);
        self.start_time_ms = start;
        self.end_time_ms = end;
        self.fade_in_ms = self.fade_in_ms.max(0.0);
        self.fade_out_ms = self.fade_out_ms.max(0.0);
        self
    }
}

/// Mask opacity over a set of possibly-overlapping visibility intervals.
/// Intervals are kept sorted by start time; when several are active at
/// once, the most-hidden contribution wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilityMask {
    intervals: Vec<VisibilityInterval>,
    next_id: u32,
}

impl VisibilityMask {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore intervals from persisted data, normalizing each entry.
    pub fn from_intervals(intervals: impl IntoIterator<Item = VisibilityInterval>) -> Self {
        let mut mask = Self::new();
        for interval in intervals {
            mask.insert(interval);
        }
        mask
    }

    pub fn intervals(&self) -> &[VisibilityInterval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Add a default hidden interval at the playhead. Returns its id.
    pub fn add_at(&mut self, current_time_ms: f64) -> u32 {
        let id = self.next_id;
        self.insert(VisibilityInterval {
            id,
            start_time_ms: current_time_ms,
            end_time_ms: current_time_ms + DEFAULT_INTERVAL_SPAN_MS,
            mode: VisibilityMode::Hidden,
            fade_in_ms: DEFAULT_FADE_MS,
            fade_out_ms: DEFAULT_FADE_MS,
        })
    }

    /// Insert a normalized copy of `interval`, keeping the list sorted by
    /// start time. Returns the id actually used (fresh ids are assigned
    /// past any restored ones).
    pub fn insert(&mut self, interval: VisibilityInterval) -> u32 {
        let interval = interval.normalized();
        self.next_id = self.next_id.max(interval.id.saturating_add(1));
        let pos = self
            .intervals
            .partition_point(|i| i.start_time_ms <= interval.start_time_ms);
        self.intervals.insert(pos, interval);
        interval.id
    }

    /// Apply an edit to the interval with the given id, then renormalize
    /// and resort. Returns false if no such interval exists.
    pub fn update(&mut self, id: u32, edit: impl FnOnce(&mut VisibilityInterval)) -> bool {
        let Some(pos) = self.intervals.iter().position(|i| i.id == id) else {
            return false;
        };
        let mut interval = self.intervals.remove(pos);
        edit(&mut interval);
        interval.id = id;
        let interval = interval.normalized();
        let pos = self
            .intervals
            .partition_point(|i| i.start_time_ms <= interval.start_time_ms);
        self.intervals.insert(pos, interval);
        true
    }

    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.intervals.len();
        self.intervals.retain(|i| i.id != id);
        self.intervals.len() != before
    }

    pub fn clear(&mut self) {
        self.intervals.clear();
        self.next_id = 0;
    }

    /// Mask opacity in `[0, 1]` at the given chart time. For each active
    /// interval the hidden-ness ramps linearly through the fade-in window,
    /// holds at the steady-state value, and ramps back through the
    /// fade-out window; the maximum contribution across intervals wins.
    pub fn opacity_at(&self, time_ms: f64) -> f64 {
        let mut max_opacity: f64 = 0.0;

        for interval in &self.intervals {
            if interval.start_time_ms > time_ms {
                break;
            }
            if time_ms > interval.end_time_ms {
                continue;
            }
            let to_hidden = interval.mode == VisibilityMode::Hidden;

            if interval.fade_in_ms > 0.0 && time_ms < interval.start_time_ms + interval.fade_in_ms
            {
                let t = (time_ms - interval.start_time_ms) / interval.fade_in_ms.max(1.0);
                let opacity = if to_hidden { t } else { 1.0 - t };
                max_opacity = max_opacity.max(opacity);
                continue;
            }

            if interval.fade_out_ms > 0.0 && time_ms > interval.end_time_ms - interval.fade_out_ms
            {
                let t = (interval.end_time_ms - time_ms) / interval.fade_out_ms.max(1.0);
                let clamped = t.clamp(0.0, 1.0);
                let opacity = if to_hidden { clamped } else { 1.0 - clamped };
                max_opacity = max_opacity.max(opacity);
                continue;
            }

            let opacity = if to_hidden { 1.0 } else { 0.0 };
            max_opacity = max_opacity.max(opacity);
        }

        max_opacity.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hidden(id: u32, start: f64, end: f64, fade_in: f64, fade_out: f64) -> VisibilityInterval {
        VisibilityInterval {
            id,
            start_time_ms: start,
            end_time_ms: end,
            mode: VisibilityMode::Hidden,
            fade_in_ms: fade_in,
            fade_out_ms: fade_out,
        }
    }

    #[test]
    fn fade_ramps_are_symmetric() {
        let mask = VisibilityMask::from_intervals([hidden(0, 1000.0, 3000.0, 500.0, 500.0)]);

        assert_eq!(mask.opacity_at(999.0), 0.0);
        assert_eq!(mask.opacity_at(1000.0), 0.0);
        assert!((mask.opacity_at(1250.0) - 0.5).abs() < 1e-9);
        assert_eq!(mask.opacity_at(2000.0), 1.0);
        assert!((mask.opacity_at(2750.0) - 0.5).abs() < 1e-9);
        assert_eq!(mask.opacity_at(3000.0), 0.0);
        assert_eq!(mask.opacity_at(3001.0), 0.0);
    }

    #[test]
    fn zero_fades_form_a_step() {
        let mask = VisibilityMask::from_intervals([hidden(0, 1000.0, 2000.0, 0.0, 0.0)]);

        assert_eq!(mask.opacity_at(999.999), 0.0);
        assert_eq!(mask.opacity_at(1000.0), 1.0);
        assert_eq!(mask.opacity_at(2000.0), 1.0);
        assert_eq!(mask.opacity_at(2000.001), 0.0);
    }

    #[test]
    fn visible_mode_inverts_the_ramp() {
        let mut interval = hidden(0, 1000.0, 3000.0, 500.0, 500.0);
        interval.mode = VisibilityMode::Visible;
        let mask = VisibilityMask::from_intervals([interval]);

        // Hidden-ness of a Visible interval starts at 1 and ramps down.
        assert_eq!(mask.opacity_at(1000.0), 1.0);
        assert!((mask.opacity_at(1250.0) - 0.5).abs() < 1e-9);
        assert_eq!(mask.opacity_at(2000.0), 0.0);
    }

    #[test]
    fn overlapping_intervals_take_the_maximum() {
        let mask = VisibilityMask::from_intervals([
            hidden(0, 1000.0, 3000.0, 500.0, 500.0),
            hidden(1, 2500.0, 4000.0, 0.0, 0.0),
        ]);

        // First interval alone would be fading out at 2750; the second
        // holds the mask fully hidden.
        assert_eq!(mask.opacity_at(2750.0), 1.0);
    }

    #[test]
    fn scan_stops_at_later_intervals() {
        let mask = VisibilityMask::from_intervals([
            hidden(0, 5000.0, 6000.0, 0.0, 0.0),
            hidden(1, 8000.0, 9000.0, 0.0, 0.0),
        ]);
        assert_eq!(mask.opacity_at(100.0), 0.0);
        assert_eq!(mask.opacity_at(7000.0), 0.0);
    }

    #[test]
    fn malformed_interval_is_repaired() {
        let mut mask = VisibilityMask::new();
        mask.insert(hidden(0, 2000.0, 1000.0, -5.0, 0.0));

        let interval = mask.intervals()[0];
        assert_eq!(interval.start_time_ms, 1000.0);
        assert_eq!(interval.end_time_ms, 2000.0);
        assert_eq!(interval.fade_in_ms, 0.0);
    }

    #[test]
    fn collapsed_interval_gets_minimal_width() {
        let mut mask = VisibilityMask::new();
        mask.insert(hidden(0, 1000.0, 1000.0, 0.0, 0.0));

        let interval = mask.intervals()[0];
        assert_eq!(interval.end_time_ms, 1001.0);
    }

    #[test]
    fn update_resorts_by_start_time() {
        let mut mask = VisibilityMask::from_intervals([
            hidden(0, 1000.0, 2000.0, 0.0, 0.0),
            hidden(1, 3000.0, 4000.0, 0.0, 0.0),
        ]);

        assert!(mask.update(0, |i| {
            i.start_time_ms = 5000.0;
            i.end_time_ms = 6000.0;
        }));
        assert_eq!(mask.intervals()[0].id, 1);
        assert_eq!(mask.intervals()[1].id, 0);
        assert!(!mask.update(99, |_| {}));
    }

    #[test]
    fn add_at_assigns_fresh_ids() {
        let mut mask = VisibilityMask::new();
        let a = mask.add_at(0.0);
        let b = mask.add_at(10_000.0);
        assert_ne!(a, b);
        assert_eq!(mask.intervals().len(), 2);
        assert_eq!(mask.intervals()[0].fade_in_ms, DEFAULT_FADE_MS);
    }

    #[test]
    fn max_restored_id_does_not_overflow_the_watermark() {
        let mut mask = VisibilityMask::from_intervals([hidden(u32::MAX, 0.0, 100.0, 0.0, 0.0)]);
        let id = mask.add_at(200.0);
        assert_eq!(id, u32::MAX);
        assert_eq!(mask.intervals().len(), 2);
    }

    #[test]
    fn remove_by_id() {
        let mut mask = VisibilityMask::from_intervals([hidden(7, 0.0, 100.0, 0.0, 0.0)]);
        assert!(mask.remove(7));
        assert!(!mask.remove(7));
        assert!(mask.is_empty());
    }
}
