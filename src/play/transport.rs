use anyhow::Result;

/// Capability contract of the external media player (video/audio) the
/// playback clock synchronizes against. Every call is best-effort: the
/// clock treats failures as transient and keeps advancing from its own
/// estimate.
pub trait MediaTransport {
    /// Current playback position of the transport.
    fn position_seconds(&mut self) -> Result<f64>;

    /// Request a seek. May complete asynchronously on the real player.
    fn seek_to(&mut self, seconds: f64) -> Result<()>;

    fn play(&mut self) -> Result<()>;

    fn pause(&mut self) -> Result<()>;

    fn set_playback_rate(&mut self, rate: f64) -> Result<()>;

    /// Rates the transport supports, or `None` when any rate is accepted.
    fn available_rates(&self) -> Option<Vec<f64>> {
        None
    }
}

/// Pick the supported rate closest to the requested one. An empty list
/// behaves like "any rate accepted".
pub fn snap_rate(rate: f64, supported: &[f64]) -> f64 {
    supported
        .iter()
        .copied()
        .min_by(|a, b| (a - rate).abs().total_cmp(&(b - rate).abs()))
        .unwrap_or(rate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snaps_to_nearest_supported_rate() {
        let rates = [0.25, 0.5, 1.0, 1.5, 2.0];
        assert_eq!(snap_rate(0.9, &rates), 1.0);
        assert_eq!(snap_rate(1.3, &rates), 1.5);
        assert_eq!(snap_rate(5.0, &rates), 2.0);
    }

    #[test]
    fn empty_rate_list_accepts_anything() {
        assert_eq!(snap_rate(1.37, &[]), 1.37);
    }
}
