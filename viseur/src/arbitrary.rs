use std::time::{Duration, Instant};

use crate::{TimeManager, Timer};

/// One thing done to a [`Timer`].
#[derive(Clone, Debug)]
pub enum TimerOp {
    Tick,
    Pause,
    Invert,
    Restart,
    Poll,
    SetSpeed(f64),
    SetProgress(f64),
    /// Lets this many milliseconds pass.
    Wait(u16),
}

impl TimerOp {
    /// Applies the operation, returning the time after it.
    pub fn apply(&self, timer: &mut Timer, now: Instant) -> Instant {
        match *self {
            TimerOp::Tick => {
                timer.tick(now);
            }
            TimerOp::Pause => {
                timer.pause(now);
            }
            TimerOp::Invert => {
                timer.invert_ticking(now);
            }
            TimerOp::Restart => {
                timer.restart(now);
            }
            TimerOp::Poll => {
                timer.poll(now);
            }
            TimerOp::SetSpeed(speed) => timer.set_speed(speed, now),
            TimerOp::SetProgress(progress) => timer.set_progress(progress, now),
            TimerOp::Wait(ms) => return now + Duration::from_millis(u64::from(ms)),
        }
        now
    }
}

impl quickcheck::Arbitrary for TimerOp {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        match u8::arbitrary(g) % 8 {
            0 => TimerOp::Tick,
            1 => TimerOp::Pause,
            2 => TimerOp::Invert,
            3 => TimerOp::Restart,
            4 => TimerOp::Poll,
            5 => TimerOp::SetSpeed(f64::arbitrary(g)),
            6 => TimerOp::SetProgress(f64::arbitrary(g)),
            _ => TimerOp::Wait(u16::arbitrary(g) % 500),
        }
    }
}

/// One thing the user or the clock does to a [`TimeManager`].
#[derive(Clone, Debug)]
pub enum TimelineOp {
    Play,
    Pause,
    PlayPause,
    Next,
    Back,
    /// Slides to a point, given as a fraction of the timeline so that it
    /// usually lands inside it.
    Slide(f64),
    Wait(u16),
    SetSpeed(f64),
}

impl TimelineOp {
    pub fn apply(&self, time_manager: &mut TimeManager, now: Instant) -> Instant {
        match *self {
            TimelineOp::Play => time_manager.play(now),
            TimelineOp::Pause => time_manager.pause(now),
            TimelineOp::PlayPause => time_manager.play_pause(now),
            TimelineOp::Next => time_manager.next(now),
            TimelineOp::Back => time_manager.back(now),
            TimelineOp::Slide(fraction) => {
                let value = fraction * time_manager.number_of_deltas() as f64;
                time_manager.playback_slide(value, now);
            }
            TimelineOp::Wait(ms) => return now + Duration::from_millis(u64::from(ms)),
            TimelineOp::SetSpeed(speed) => time_manager.set_speed(speed, now),
        }
        now
    }
}

impl quickcheck::Arbitrary for TimelineOp {
    fn arbitrary(g: &mut quickcheck::Gen) -> Self {
        match u8::arbitrary(g) % 8 {
            0 => TimelineOp::Play,
            1 => TimelineOp::Pause,
            2 => TimelineOp::PlayPause,
            3 => TimelineOp::Next,
            4 => TimelineOp::Back,
            5 => TimelineOp::Slide(f64::from(u8::arbitrary(g)) / 200.0 - 0.1),
            6 => TimelineOp::Wait(u16::arbitrary(g) % 200),
            _ => TimelineOp::SetSpeed(f64::from(u16::arbitrary(g) % 300)),
        }
    }
}
