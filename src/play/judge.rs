/// Accuracy classification of an input relative to a note's ideal instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JudgeTier {
    Perfect,
    Great,
    Good,
    Miss,
}

impl JudgeTier {
    pub fn score(self) -> u32 {
        match self {
            Self::Perfect => 100,
            Self::Great => 80,
            Self::Good => 50,
            Self::Miss => 0,
        }
    }

    pub fn is_miss(self) -> bool {
        self == Self::Miss
    }
}

/// Timing windows in milliseconds. Boundaries are inclusive: an offset of
/// exactly `perfect_window` is still Perfect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JudgeWindows {
    pub perfect_window: f64,
    pub great_window: f64,
    pub good_window: f64,
}

/// Hold releases are judged 1.25x more leniently than taps.
const HOLD_RELEASE_SCALE: f64 = 1.25;

impl JudgeWindows {
    /// Tap windows: +/-40 / 80 / 120 ms.
    pub fn normal() -> Self {
        Self {
            perfect_window: 40.0,
            great_window: 80.0,
            good_window: 120.0,
        }
    }

    /// Release windows for hold-note ends: +/-50 / 100 / 150 ms.
    pub fn hold_release() -> Self {
        Self::normal().scaled(HOLD_RELEASE_SCALE)
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            perfect_window: self.perfect_window * factor,
            great_window: self.great_window * factor,
            good_window: self.good_window * factor,
        }
    }

    pub fn judge(&self, offset_ms: f64) -> JudgeTier {
        let abs = offset_ms.abs();
        if abs <= self.perfect_window {
            JudgeTier::Perfect
        } else if abs <= self.great_window {
            JudgeTier::Great
        } else if abs <= self.good_window {
            JudgeTier::Good
        } else {
            JudgeTier::Miss
        }
    }

    pub fn is_in_window(&self, offset_ms: f64) -> bool {
        offset_ms.abs() <= self.good_window
    }

    /// How far past a note's ideal instant the clock may run before the
    /// note is missed outright.
    pub fn miss_tolerance(&self) -> f64 {
        self.good_window
    }

    /// Maximum time difference considered when matching an input to a
    /// note.
    pub fn search_range(&self) -> f64 {
        self.good_window
    }
}

impl Default for JudgeWindows {
    fn default() -> Self {
        Self::normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_boundaries_are_inclusive() {
        let windows = JudgeWindows::normal();
        assert_eq!(windows.judge(0.0), JudgeTier::Perfect);
        assert_eq!(windows.judge(40.0), JudgeTier::Perfect);
        assert_eq!(windows.judge(-40.0), JudgeTier::Perfect);
        assert_eq!(windows.judge(40.001), JudgeTier::Great);
        assert_eq!(windows.judge(80.0), JudgeTier::Great);
        assert_eq!(windows.judge(120.0), JudgeTier::Good);
        assert_eq!(windows.judge(120.001), JudgeTier::Miss);
    }

    #[test]
    fn hold_release_windows_are_wider() {
        let release = JudgeWindows::hold_release();
        assert_eq!(release.perfect_window, 50.0);
        assert_eq!(release.great_window, 100.0);
        assert_eq!(release.good_window, 150.0);
        assert_eq!(release.judge(150.0), JudgeTier::Good);
    }

    #[test]
    fn tier_scores() {
        assert_eq!(JudgeTier::Perfect.score(), 100);
        assert_eq!(JudgeTier::Great.score(), 80);
        assert_eq!(JudgeTier::Good.score(), 50);
        assert_eq!(JudgeTier::Miss.score(), 0);
    }
}
