use std::time::Instant;

const DEFAULT_SPEED_MS: f64 = 1000.0;

/// Ticks at a custom rate towards a single finish.
///
/// Progress runs from 0 to 1 over `speed` milliseconds. The caller supplies
/// the current time to every method, and polls the timer to learn when it
/// has finished.
#[derive(Clone, Debug)]
pub struct Timer {
    /// Progress saved when the timer was last paused.
    last_progress: f64,
    /// When the timer last started ticking, `None` while paused.
    started_at: Option<Instant>,
    /// Milliseconds from no progress to finished, at least 1.
    speed: f64,
}

impl Timer {
    /// Creates a paused timer. A speed of zero (or NaN) means the default
    /// of one second.
    pub fn new(speed: f64) -> Self {
        let speed = if speed.is_nan() || speed == 0.0 {
            DEFAULT_SPEED_MS
        } else {
            speed
        };
        Self {
            last_progress: 0.0,
            started_at: None,
            speed: speed.max(1.0),
        }
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Changes the speed, keeping the progress made so far.
    pub fn set_speed(&mut self, speed: f64, now: Instant) {
        let was_ticking = self.pause(now);
        // anything finer than a millisecond can't be driven reliably
        self.speed = if speed.is_nan() { 1.0 } else { speed.max(1.0) };
        if was_ticking {
            self.tick(now);
        }
    }

    /// Sets the progress, clamped to `[0, 1]`.
    pub fn set_progress(&mut self, progress: f64, now: Instant) {
        let was_ticking = self.pause(now);
        self.last_progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        if was_ticking {
            self.tick(now);
        }
    }

    /// Resets the progress to 0 and starts ticking.
    ///
    /// Returns true if it started ticking.
    pub fn restart(&mut self, now: Instant) -> bool {
        self.set_progress(0.0, now);
        self.tick(now)
    }

    /// Starts ticking from the saved progress.
    ///
    /// Returns false if already ticking or already done.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.started_at.is_some() || self.last_progress >= 1.0 {
            return false;
        }
        self.started_at = Some(now);
        true
    }

    /// Returns false if the timer was not ticking.
    pub fn pause(&mut self, now: Instant) -> bool {
        if self.started_at.is_none() {
            return false;
        }
        self.last_progress = self.progress(now);
        self.started_at = None;
        true
    }

    /// How far the timer is, in `[0, 1]`.
    pub fn progress(&self, now: Instant) -> f64 {
        match self.started_at {
            None => self.last_progress,
            Some(started_at) => {
                let elapsed_ms = now.saturating_duration_since(started_at).as_secs_f64() * 1000.0;
                (self.last_progress + elapsed_ms / self.speed).min(1.0)
            }
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.started_at.is_some()
    }

    /// Starts ticking if paused, pauses if ticking.
    ///
    /// Returns true if the timer is now paused.
    pub fn invert_ticking(&mut self, now: Instant) -> bool {
        if self.pause(now) {
            true
        } else {
            self.tick(now);
            false
        }
    }

    pub fn is_done(&self) -> bool {
        self.last_progress >= 1.0
    }

    /// Returns true exactly once when a ticking timer reaches the end, after
    /// which it is paused and done.
    pub fn poll(&mut self, now: Instant) -> bool {
        if self.is_ticking() && self.progress(now) >= 1.0 {
            self.pause(now);
            true
        } else {
            false
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Timer::new(DEFAULT_SPEED_MS)
    }
}
