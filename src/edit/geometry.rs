/// Timeline scale at zoom 1.0.
pub const PIXELS_PER_SECOND: f64 = 200.0;

/// Padding kept past the last note / playhead (ms).
pub const TIMELINE_TAIL_MS: f64 = 4000.0;

/// Shortest timeline the editor will show (ms).
pub const MIN_TIMELINE_DURATION_MS: f64 = 30_000.0;

/// Maps chart time to a vertical pixel coordinate on a downward-scrolling
/// timeline and back. Pure: every query is a function of the zoom-derived
/// scale, the pixel origin of time zero, and the timeline duration, so
/// rendering and pointer hit-testing always agree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimelineGeometry {
    pixels_per_ms: f64,
    origin_y: f64,
    duration_ms: f64,
}

impl TimelineGeometry {
    /// `origin_y` is the pixel coordinate of time 0, at the bottom of the
    /// timeline. Non-positive zoom falls back to 1.0.
    pub fn new(zoom: f64, origin_y: f64) -> Self {
        let mut geometry = Self {
            pixels_per_ms: 0.0,
            origin_y,
            duration_ms: MIN_TIMELINE_DURATION_MS,
        };
        geometry.set_zoom(zoom);
        geometry
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        let zoom = if zoom.is_finite() && zoom > 0.0 {
            zoom
        } else {
            1.0
        };
        self.pixels_per_ms = PIXELS_PER_SECOND * zoom / 1000.0;
    }

    pub fn set_origin_y(&mut self, origin_y: f64) {
        self.origin_y = origin_y;
    }

    pub fn pixels_per_ms(&self) -> f64 {
        self.pixels_per_ms
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// Recompute the timeline duration. Called whenever notes change, the
    /// playhead moves, or the user adjusts the extra tail length.
    pub fn update_duration(&mut self, last_note_end_ms: f64, current_time_ms: f64, extra_ms: f64) {
        self.duration_ms = (last_note_end_ms + TIMELINE_TAIL_MS)
            .max(current_time_ms + TIMELINE_TAIL_MS)
            .max(MIN_TIMELINE_DURATION_MS)
            + extra_ms.max(0.0);
    }

    pub fn time_to_y(&self, time_ms: f64) -> f64 {
        self.origin_y - time_ms * self.pixels_per_ms
    }

    /// Inverse of [`time_to_y`](Self::time_to_y), clamped to the timeline.
    pub fn y_to_time(&self, y: f64) -> f64 {
        let time_ms = (self.origin_y - y) / self.pixels_per_ms;
        time_ms.clamp(0.0, self.duration_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_maps_to_time_zero() {
        let geometry = TimelineGeometry::new(1.0, 800.0);
        assert_eq!(geometry.time_to_y(0.0), 800.0);
        assert_eq!(geometry.y_to_time(800.0), 0.0);
    }

    #[test]
    fn time_increases_upward() {
        let geometry = TimelineGeometry::new(1.0, 800.0);
        // 1 second at zoom 1.0 is 200 pixels up.
        assert_eq!(geometry.time_to_y(1000.0), 600.0);
    }

    #[test]
    fn zoom_scales_the_mapping() {
        let geometry = TimelineGeometry::new(2.0, 800.0);
        assert_eq!(geometry.time_to_y(1000.0), 400.0);
    }

    #[test]
    fn mutual_inverse_within_a_pixel() {
        let geometry = TimelineGeometry::new(1.5, 640.0);
        for time_ms in [0.0, 33.3, 999.9, 12_345.6, 29_999.0] {
            let y = geometry.time_to_y(time_ms);
            let back = geometry.y_to_time(y);
            assert!(
                (geometry.time_to_y(back) - y).abs() <= 1.0,
                "inverse drifted at {time_ms}"
            );
        }
    }

    #[test]
    fn y_to_time_clamps_to_timeline() {
        let geometry = TimelineGeometry::new(1.0, 800.0);
        // Below the origin is before time zero.
        assert_eq!(geometry.y_to_time(10_000.0), 0.0);
        assert_eq!(geometry.y_to_time(f64::NEG_INFINITY), geometry.duration_ms());
    }

    #[test]
    fn duration_tracks_notes_playhead_and_floor() {
        let mut geometry = TimelineGeometry::new(1.0, 800.0);

        geometry.update_duration(0.0, 0.0, 0.0);
        assert_eq!(geometry.duration_ms(), MIN_TIMELINE_DURATION_MS);

        geometry.update_duration(50_000.0, 0.0, 0.0);
        assert_eq!(geometry.duration_ms(), 54_000.0);

        geometry.update_duration(50_000.0, 60_000.0, 0.0);
        assert_eq!(geometry.duration_ms(), 64_000.0);

        geometry.update_duration(50_000.0, 0.0, 10_000.0);
        assert_eq!(geometry.duration_ms(), 64_000.0);
    }

    #[test]
    fn invalid_zoom_falls_back() {
        let geometry = TimelineGeometry::new(0.0, 800.0);
        assert_eq!(geometry.pixels_per_ms(), PIXELS_PER_SECOND / 1000.0);
    }
}
