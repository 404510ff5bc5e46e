use tracing::{debug, warn};

use super::transport::{MediaTransport, snap_rate};

/// Nominal interval at which the host drives [`PlaybackClock::tick`].
pub const TICK_INTERVAL_MS: f64 = 16.0;

/// Accumulated tick time between reconciliations against the external
/// transport. The internal estimate drifts, so correctness depends on
/// overwriting it from the transport at this cadence.
pub const SYNC_INTERVAL_MS: f64 = 33.0;

/// Clock state machine modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    Stopped,
    Playing,
    /// The user is dragging the playhead; ticking and reconciliation are
    /// suspended and the pointer drives the time directly.
    Scrubbing,
}

/// What advances the logical time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveMode {
    /// Free-running: time accumulates from tick deltas.
    Internal,
    /// A transport is bound: ticks advance a local estimate that is
    /// periodically overwritten from the transport's reported position.
    External,
}

/// Owner of the authoritative playback position. All other components read
/// `logical_time_ms` and never write it.
pub struct PlaybackClock {
    logical_time_ms: f64,
    duration_ms: f64,
    playback_rate: f64,
    mode: ClockMode,
    resume_after_scrub: bool,
    transport: Option<Box<dyn MediaTransport>>,
    sync_elapsed_ms: f64,
}

impl PlaybackClock {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            logical_time_ms: 0.0,
            duration_ms: duration_ms.max(0.0),
            playback_rate: 1.0,
            mode: ClockMode::Stopped,
            resume_after_scrub: false,
            transport: None,
            sync_elapsed_ms: 0.0,
        }
    }

    pub fn current_time_ms(&self) -> f64 {
        self.logical_time_ms
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.mode == ClockMode::Playing
    }

    pub fn is_scrubbing(&self) -> bool {
        self.mode == ClockMode::Scrubbing
    }

    pub fn playback_rate(&self) -> f64 {
        self.playback_rate
    }

    pub fn drive_mode(&self) -> DriveMode {
        if self.transport.is_some() {
            DriveMode::External
        } else {
            DriveMode::Internal
        }
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    /// Update the clamp bound. The logical time is pulled back into range
    /// if the timeline shrank underneath it.
    pub fn set_duration_ms(&mut self, duration_ms: f64) {
        self.duration_ms = duration_ms.max(0.0);
        self.logical_time_ms = self.logical_time_ms.clamp(0.0, self.duration_ms);
    }

    /// Bind an external transport, replacing any previous binding.
    pub fn bind_transport(&mut self, transport: Box<dyn MediaTransport>) {
        self.transport = Some(transport);
        self.sync_elapsed_ms = 0.0;
    }

    /// Release the transport binding and cancel pending reconciliation.
    /// Safe to call repeatedly.
    pub fn detach(&mut self) {
        self.transport = None;
        self.sync_elapsed_ms = 0.0;
    }

    pub fn play(&mut self) {
        if self.mode != ClockMode::Stopped {
            return;
        }
        self.mode = ClockMode::Playing;
        self.sync_elapsed_ms = 0.0;
        if let Some(transport) = self.transport.as_mut()
            && let Err(err) = transport.play()
        {
            warn!("transport play failed: {err:#}");
        }
    }

    pub fn pause(&mut self) {
        if self.mode != ClockMode::Playing {
            return;
        }
        self.mode = ClockMode::Stopped;
        if let Some(transport) = self.transport.as_mut()
            && let Err(err) = transport.pause()
        {
            warn!("transport pause failed: {err:#}");
        }
    }

    /// Programmatic seek: pauses playback, clamps the target into the
    /// timeline, and forwards it to the transport when one is bound.
    pub fn seek(&mut self, time_ms: f64) {
        if self.mode == ClockMode::Playing {
            self.pause();
        }
        self.logical_time_ms = time_ms.clamp(0.0, self.duration_ms);
        if let Some(transport) = self.transport.as_mut()
            && let Err(err) = transport.seek_to(self.logical_time_ms / 1000.0)
        {
            warn!("transport seek failed: {err:#}");
        }
    }

    /// Change the playback rate without resetting the position. When the
    /// transport advertises a rate list, the nearest supported rate is
    /// used for both the transport and the internal estimate so the two
    /// stay in step.
    pub fn set_rate(&mut self, rate: f64) {
        if !(rate.is_finite() && rate > 0.0) {
            warn!("ignoring invalid playback rate {rate}");
            return;
        }
        let rate = match self.transport.as_ref().and_then(|t| t.available_rates()) {
            Some(rates) if !rates.is_empty() => snap_rate(rate, &rates),
            _ => rate,
        };
        self.playback_rate = rate;
        if let Some(transport) = self.transport.as_mut()
            && let Err(err) = transport.set_playback_rate(rate)
        {
            warn!("transport rate change failed: {err:#}");
        }
    }

    /// Advance the clock by one cooperative tick of `delta_ms` real time.
    /// Only the Playing mode advances; scrubbing and stopped states ignore
    /// ticks entirely, which is what suspends reconciliation during a drag.
    pub fn tick(&mut self, delta_ms: f64) {
        if self.mode != ClockMode::Playing || !(delta_ms.is_finite() && delta_ms > 0.0) {
            return;
        }

        self.logical_time_ms =
            (self.logical_time_ms + delta_ms * self.playback_rate).min(self.duration_ms);

        if self.transport.is_none() {
            return;
        }
        self.sync_elapsed_ms += delta_ms;
        if self.sync_elapsed_ms < SYNC_INTERVAL_MS {
            return;
        }
        self.sync_elapsed_ms = 0.0;
        self.reconcile();
    }

    /// Overwrite the estimate with the transport's reported position. A
    /// failed poll leaves the estimate in place; sync loss shows as brief
    /// drift and self-corrects on the next successful poll.
    fn reconcile(&mut self) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        match transport.position_seconds() {
            Ok(position) => {
                let reported_ms = (position * 1000.0).clamp(0.0, self.duration_ms);
                let drift = reported_ms - self.logical_time_ms;
                if drift.abs() > 1.0 {
                    debug!("reconciled clock drift of {drift:.1}ms");
                }
                self.logical_time_ms = reported_ms;
            }
            Err(err) => {
                warn!("transport position poll failed, keeping internal estimate: {err:#}");
            }
        }
    }

    /// Enter scrubbing. Remembers whether playback should resume on
    /// release. The transport is left alone until the scrub ends.
    pub fn begin_scrub(&mut self) {
        if self.mode == ClockMode::Scrubbing {
            return;
        }
        self.resume_after_scrub = self.mode == ClockMode::Playing;
        self.mode = ClockMode::Scrubbing;
        self.sync_elapsed_ms = 0.0;
    }

    /// Drive the time directly from the pointer. Intermediate positions
    /// are not forwarded to the transport, to avoid seek thrashing.
    pub fn scrub_to(&mut self, time_ms: f64) {
        if self.mode != ClockMode::Scrubbing {
            return;
        }
        self.logical_time_ms = time_ms.clamp(0.0, self.duration_ms);
    }

    /// Leave scrubbing: issue exactly one transport seek to the released
    /// position, then resume playback iff the clock was playing when the
    /// scrub began.
    pub fn end_scrub(&mut self) {
        if self.mode != ClockMode::Scrubbing {
            return;
        }
        if let Some(transport) = self.transport.as_mut()
            && let Err(err) = transport.seek_to(self.logical_time_ms / 1000.0)
        {
            warn!("transport seek on scrub release failed: {err:#}");
        }
        if self.resume_after_scrub {
            self.mode = ClockMode::Playing;
            if let Some(transport) = self.transport.as_mut()
                && let Err(err) = transport.play()
            {
                warn!("transport resume after scrub failed: {err:#}");
            }
        } else {
            self.mode = ClockMode::Stopped;
        }
        self.resume_after_scrub = false;
    }
}
