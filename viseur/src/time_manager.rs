use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::history::{next_turn_index, previous_turn_index};
use crate::{Timer, UnknownPlaybackMode};

/// Whether playback steps one delta or one whole turn at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackMode {
    #[default]
    Deltas,
    Turns,
}

impl FromStr for PlaybackMode {
    type Err = UnknownPlaybackMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deltas" => Ok(PlaybackMode::Deltas),
            "turns" => Ok(PlaybackMode::Turns),
            _ => Err(UnknownPlaybackMode(String::from(s))),
        }
    }
}

impl std::fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackMode::Deltas => write!(f, "deltas"),
            PlaybackMode::Turns => write!(f, "turns"),
        }
    }
}

/// A point on the timeline.
///
/// `dt` is how far along the transition from state `index` to state
/// `index + 1` playback is, in `[0, 1)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CurrentTime {
    pub index: usize,
    pub dt: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeEvent {
    Playing,
    Paused,
    /// Playback reached the last state.
    Ended,
    /// The index changed, and this is where it stopped.
    NewIndex(usize),
    /// The index passed through this one on its way to a later `NewIndex`.
    StepIndex(usize),
}

/// The playback timeline: an index into the states plus the timer that
/// drives the transition to the next one.
#[derive(Clone, Debug)]
pub struct TimeManager {
    current_index: usize,
    timer: Timer,
    mode: PlaybackMode,
    number_of_deltas: usize,
    turn_starts: Vec<usize>,
    is_ready: bool,
    /// Set when playback ran into the last state, so that newly streamed
    /// deltas pick up where it stopped.
    ended_while_playing: bool,
    events: Vec<TimeEvent>,
}

impl TimeManager {
    pub fn new(speed: f64, mode: PlaybackMode) -> Self {
        Self {
            current_index: 0,
            timer: Timer::new(speed),
            mode,
            number_of_deltas: 0,
            turn_starts: Vec::new(),
            is_ready: false,
            ended_while_playing: false,
            events: Vec::new(),
        }
    }

    /// Starts the timeline at the first state of a freshly loaded gamelog.
    pub fn ready(&mut self, number_of_deltas: usize, turn_starts: Vec<usize>, now: Instant) {
        self.number_of_deltas = number_of_deltas;
        self.turn_starts = turn_starts;
        self.current_index = 0;
        self.timer.pause(now);
        self.timer.set_progress(0.0, now);
        self.is_ready = true;
        self.ended_while_playing = false;
        self.events.push(TimeEvent::NewIndex(0));
        debug!(deltas = number_of_deltas, mode = %self.mode, "Timeline ready");
    }

    pub fn is_ready(&self) -> bool {
        self.is_ready
    }

    /// Updates the timeline after deltas were streamed in.
    pub fn set_number_of_deltas(&mut self, number_of_deltas: usize, turn_starts: Vec<usize>, now: Instant) {
        let grew = number_of_deltas > self.number_of_deltas;
        self.number_of_deltas = number_of_deltas;
        self.turn_starts = turn_starts;
        if grew && self.ended_while_playing {
            self.ended_while_playing = false;
            if self.timer.restart(now) {
                self.events.push(TimeEvent::Playing);
            }
        }
    }

    pub fn number_of_deltas(&self) -> usize {
        self.number_of_deltas
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    pub fn speed(&self) -> f64 {
        self.timer.speed()
    }

    pub fn set_speed(&mut self, speed: f64, now: Instant) {
        self.finish_transition(now);
        self.timer.set_speed(speed, now);
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_ticking()
    }

    fn last_index(&self) -> usize {
        self.number_of_deltas.saturating_sub(1)
    }

    fn is_at_end(&self) -> bool {
        self.current_index >= self.last_index()
    }

    pub fn current_time(&self, now: Instant) -> CurrentTime {
        let dt = if self.is_at_end() {
            0.0
        } else {
            self.timer.progress(now)
        };
        CurrentTime {
            index: self.current_index,
            dt,
        }
    }

    pub fn play(&mut self, now: Instant) {
        if !self.is_ready {
            return;
        }
        self.finish_transition(now);
        self.ended_while_playing = false;
        if self.is_at_end() {
            self.move_to(0);
            self.timer.set_progress(0.0, now);
        }
        if self.timer.tick(now) {
            self.events.push(TimeEvent::Playing);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        self.finish_transition(now);
        self.ended_while_playing = false;
        if self.timer.pause(now) {
            self.events.push(TimeEvent::Paused);
        }
    }

    pub fn play_pause(&mut self, now: Instant) {
        self.finish_transition(now);
        if self.timer.is_ticking() {
            self.pause(now);
        } else {
            self.play(now);
        }
    }

    /// Pauses and skips ahead to the start of the next delta or turn.
    pub fn next(&mut self, now: Instant) {
        if !self.is_ready {
            return;
        }
        self.pause(now);
        if self.is_at_end() {
            return;
        }
        let next = self.next_index();
        self.step_to(next);
        self.timer.set_progress(0.0, now);
    }

    /// Pauses and goes back to the start of the current transition, or to
    /// the previous delta or turn if already there.
    pub fn back(&mut self, now: Instant) {
        if !self.is_ready {
            return;
        }
        self.pause(now);
        if self.current_time(now).dt > 0.0 {
            self.timer.set_progress(0.0, now);
            return;
        }
        let previous = match self.mode {
            PlaybackMode::Deltas => self.current_index.saturating_sub(1),
            PlaybackMode::Turns => previous_turn_index(&self.turn_starts, self.current_index),
        };
        self.move_to(previous);
        self.timer.set_progress(0.0, now);
    }

    /// Pauses and jumps to a point on the timeline, `value` being
    /// `index + dt`.
    pub fn playback_slide(&mut self, value: f64, now: Instant) {
        if !self.is_ready {
            return;
        }
        self.pause(now);
        let value = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, self.last_index() as f64)
        };
        let index = value.floor() as usize;
        self.move_to(index);
        self.timer.set_progress(value.fract(), now);
    }

    /// Advances the timeline, returning everything that happened since the
    /// last call.
    pub fn update(&mut self, now: Instant) -> Vec<TimeEvent> {
        self.finish_transition(now);
        self.drain_events()
    }

    /// Moves on to the next index if the running transition has finished.
    fn finish_transition(&mut self, now: Instant) {
        if !self.is_ready || !self.timer.poll(now) {
            return;
        }
        trace!(index = self.current_index, "Transition finished");
        let next = self.next_index();
        self.step_to(next);
        self.timer.set_progress(0.0, now);
        if self.is_at_end() {
            self.ended_while_playing = true;
            self.events.push(TimeEvent::Ended);
            self.events.push(TimeEvent::Paused);
        } else {
            self.timer.tick(now);
        }
    }

    pub fn drain_events(&mut self) -> Vec<TimeEvent> {
        std::mem::take(&mut self.events)
    }

    fn next_index(&self) -> usize {
        match self.mode {
            PlaybackMode::Deltas => (self.current_index + 1).min(self.last_index()),
            PlaybackMode::Turns => {
                next_turn_index(&self.turn_starts, self.current_index, self.number_of_deltas)
            }
        }
    }

    /// Moves forward to `index`, reporting every state passed on the way.
    fn step_to(&mut self, index: usize) {
        for skipped in self.current_index + 1..index {
            self.events.push(TimeEvent::StepIndex(skipped));
        }
        self.move_to(index);
    }

    fn move_to(&mut self, index: usize) {
        if index != self.current_index {
            self.current_index = index;
            self.events.push(TimeEvent::NewIndex(index));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use quickcheck::quickcheck;

    use super::*;
    use crate::arbitrary::TimelineOp;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn ready_manager(mode: PlaybackMode, n: usize, turn_starts: Vec<usize>, t0: Instant) -> TimeManager {
        let mut tm = TimeManager::new(100.0, mode);
        tm.ready(n, turn_starts, t0);
        assert_eq!(tm.drain_events(), vec![TimeEvent::NewIndex(0)]);
        tm
    }

    #[test]
    fn parse_mode() {
        assert_eq!("Turns".parse::<PlaybackMode>(), Ok(PlaybackMode::Turns));
        assert_eq!("deltas".parse::<PlaybackMode>(), Ok(PlaybackMode::Deltas));
        assert_eq!(
            "moves".parse::<PlaybackMode>(),
            Err(UnknownPlaybackMode(String::from("moves")))
        );
        assert_eq!(PlaybackMode::Turns.to_string(), "turns");
    }

    #[test]
    fn not_ready_ignores_input() {
        let t0 = Instant::now();
        let mut tm = TimeManager::new(100.0, PlaybackMode::Deltas);
        tm.play(t0);
        tm.next(t0);
        assert!(!tm.is_playing());
        assert!(tm.update(t0 + ms(500)).is_empty());
    }

    #[test]
    fn plays_to_the_end() {
        let t0 = Instant::now();
        let mut tm = ready_manager(PlaybackMode::Deltas, 3, vec![], t0);
        tm.play(t0);
        assert_eq!(tm.drain_events(), vec![TimeEvent::Playing]);

        let time = tm.current_time(t0 + ms(50));
        assert_eq!(time.index, 0);
        assert!((time.dt - 0.5).abs() < 1e-9);

        assert_eq!(tm.update(t0 + ms(100)), vec![TimeEvent::NewIndex(1)]);
        assert!(tm.is_playing());
        assert_eq!(
            tm.update(t0 + ms(200)),
            vec![TimeEvent::NewIndex(2), TimeEvent::Ended, TimeEvent::Paused]
        );
        assert!(!tm.is_playing());
        assert_eq!(tm.current_time(t0 + ms(500)), CurrentTime { index: 2, dt: 0.0 });

        // playing again at the end starts over
        tm.play_pause(t0 + ms(500));
        assert_eq!(
            tm.drain_events(),
            vec![TimeEvent::NewIndex(0), TimeEvent::Playing]
        );
    }

    #[test]
    fn next_and_back() {
        let t0 = Instant::now();
        let mut tm = ready_manager(PlaybackMode::Deltas, 4, vec![], t0);
        tm.back(t0);
        assert_eq!(tm.current_time(t0), CurrentTime { index: 0, dt: 0.0 });

        tm.next(t0);
        tm.next(t0);
        assert_eq!(tm.current_time(t0).index, 2);

        tm.play(t0);
        tm.back(t0 + ms(30));
        // first back only rewinds the transition
        assert_eq!(tm.current_time(t0 + ms(30)), CurrentTime { index: 2, dt: 0.0 });
        tm.back(t0 + ms(30));
        assert_eq!(tm.current_time(t0 + ms(30)).index, 1);

        tm.next(t0);
        tm.next(t0);
        tm.next(t0);
        assert_eq!(tm.current_time(t0).index, 3);
    }

    #[test]
    fn turns_mode_skips_deltas() {
        let t0 = Instant::now();
        let mut tm = ready_manager(PlaybackMode::Turns, 7, vec![3, 5], t0);
        tm.next(t0);
        assert_eq!(
            tm.drain_events(),
            vec![
                TimeEvent::StepIndex(1),
                TimeEvent::StepIndex(2),
                TimeEvent::NewIndex(3)
            ]
        );
        tm.play(t0);
        tm.drain_events();
        assert_eq!(
            tm.update(t0 + ms(100)),
            vec![TimeEvent::StepIndex(4), TimeEvent::NewIndex(5)]
        );
        tm.back(t0 + ms(100));
        tm.drain_events();
        assert_eq!(tm.current_time(t0 + ms(100)).index, 3);
    }

    #[test]
    fn slide() {
        let t0 = Instant::now();
        let mut tm = ready_manager(PlaybackMode::Deltas, 5, vec![], t0);
        tm.playback_slide(2.25, t0);
        let time = tm.current_time(t0);
        assert_eq!(time.index, 2);
        assert!((time.dt - 0.25).abs() < 1e-9);
        assert_eq!(tm.drain_events(), vec![TimeEvent::NewIndex(2)]);

        tm.playback_slide(5.0 - 1e-10, t0);
        assert_eq!(tm.current_time(t0).index, 4);
        tm.playback_slide(-3.0, t0);
        assert_eq!(tm.current_time(t0), CurrentTime { index: 0, dt: 0.0 });
    }

    #[test]
    fn streamed_deltas_resume_playback() {
        let t0 = Instant::now();
        let mut tm = ready_manager(PlaybackMode::Deltas, 2, vec![], t0);
        tm.play(t0);
        tm.drain_events();
        assert_eq!(
            tm.update(t0 + ms(100)),
            vec![TimeEvent::NewIndex(1), TimeEvent::Ended, TimeEvent::Paused]
        );
        tm.set_number_of_deltas(3, vec![], t0 + ms(150));
        assert_eq!(tm.drain_events(), vec![TimeEvent::Playing]);
        assert_eq!(
            tm.update(t0 + ms(250)),
            vec![TimeEvent::NewIndex(2), TimeEvent::Ended, TimeEvent::Paused]
        );
    }

    quickcheck! {
        fn index_stays_in_range(n: usize, mode: bool, ops: Vec<TimelineOp>) -> bool {
            let n = n % 50 + 1;
            let mode = if mode { PlaybackMode::Turns } else { PlaybackMode::Deltas };
            let t0 = Instant::now();
            let mut now = t0;
            let mut tm = TimeManager::new(40.0, mode);
            tm.ready(n, (1..n).step_by(3).collect(), t0);
            for op in ops {
                now = op.apply(&mut tm, now);
                tm.update(now);
                let time = tm.current_time(now);
                if time.index >= n || !(0.0..1.0).contains(&time.dt) {
                    return false;
                }
            }
            true
        }
    }
}
