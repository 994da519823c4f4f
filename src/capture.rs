// Start/stop state and tick cadence for the capture-display loop

use crate::camera::FrameSource;
use crate::models::Frame;
use std::time::{Duration, Instant};

/// Tick interval while the camera runs (~33 fps ceiling)
pub const TICK_INTERVAL: Duration = Duration::from_millis(30);

/// Owns the camera handle and its tick schedule.
///
/// Invariant: the handle exists exactly while the tick is armed; both
/// together are what "running" means.
pub struct CaptureLoop<S> {
    source: Option<S>,
    interval: Duration,
    next_tick: Option<Instant>,
}

impl<S: FrameSource> CaptureLoop<S> {
    /// Creates an idle loop with the given tick interval
    pub fn new(interval: Duration) -> Self {
        Self {
            source: None,
            interval,
            next_tick: None,
        }
    }

    /// True while a camera handle is held and the tick is armed
    pub fn is_running(&self) -> bool {
        self.source.is_some()
    }

    /// Takes ownership of an opened source and arms the tick.
    /// The first tick is due immediately.
    pub fn start(&mut self, source: S, now: Instant) {
        self.source = Some(source);
        self.next_tick = Some(now);
    }

    /// Disarms the tick and hands the camera handle back to the caller for
    /// release. Stopping an idle loop is a no-op returning None.
    pub fn stop(&mut self) -> Option<S> {
        self.next_tick = None;
        self.source.take()
    }

    /// Runs one tick if the interval has elapsed, returning the mirrored
    /// frame. Returns None when idle, when the tick is not yet due, or when
    /// the read failed (the tick is skipped, the schedule keeps going).
    pub fn poll(&mut self, now: Instant) -> Option<Frame> {
        let due = self.next_tick?;
        if now < due {
            return None;
        }
        self.next_tick = Some(now + self.interval);

        let source = self.source.as_mut()?;
        match source.read_frame() {
            Ok(frame) => Some(frame.mirrored()),
            Err(e) => {
                tracing::debug!("Skipping tick, frame read failed: {}", e);
                None
            }
        }
    }

    /// Time remaining until the next tick is due (zero if overdue or idle)
    pub fn time_until_tick(&self, now: Instant) -> Duration {
        self.next_tick
            .map(|due| due.saturating_duration_since(now))
            .unwrap_or(Duration::ZERO)
    }
}
