/// Round a raw time to the nearest grid line: the beat split into
/// `division` equal cells. Falls back to whole-millisecond rounding when
/// the beat duration is degenerate, and never returns a negative time.
pub fn snap(time_ms: f64, beat_duration_ms: f64, division: u32) -> f64 {
    if !beat_duration_ms.is_finite() || beat_duration_ms <= 0.0 {
        return time_ms.round().max(0.0);
    }
    let grid_unit = beat_duration_ms / f64::from(division.max(1));
    ((time_ms / grid_unit).round() * grid_unit).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_to_nearest_subdivision() {
        // 120 bpm, 1/4 grid: 125ms cells.
        assert_eq!(snap(130.0, 500.0, 4), 125.0);
        assert_eq!(snap(190.0, 500.0, 4), 187.5);
        assert_eq!(snap(0.0, 500.0, 4), 0.0);
    }

    #[test]
    fn division_floor_is_one() {
        assert_eq!(snap(700.0, 500.0, 0), 500.0);
    }

    #[test]
    fn idempotent() {
        for time_ms in [0.0, 13.7, 444.4, 10_000.01] {
            let once = snap(time_ms, 500.0, 8);
            assert_eq!(snap(once, 500.0, 8), once);
        }
    }

    #[test]
    fn negative_times_floor_at_zero() {
        assert_eq!(snap(-300.0, 500.0, 4), 0.0);
    }

    #[test]
    fn degenerate_beat_duration_rounds_milliseconds() {
        assert_eq!(snap(123.4, 0.0, 4), 123.0);
        assert_eq!(snap(123.6, f64::NAN, 4), 124.0);
        assert_eq!(snap(-5.0, -1.0, 4), 0.0);
    }
}
