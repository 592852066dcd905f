use tracing::debug;

use crate::gui::button::{Button, Slider};
use crate::{CurrentTime, PlaybackMode};

/// Fastest and slowest ends of the speed slider. The slider is negated so
/// that sliding right plays faster.
const SPEED_SLIDER_MIN: f64 = -10.0;
const SPEED_SLIDER_MAX: f64 = -0.1;

/// How far below the number of deltas the playback slider stops, so that its
/// maximum still floors to the last index.
const SLIDER_EPSILON: f64 = 1e-10;

/// Something the user asked for through the playback pane.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PlaybackAction {
    PlayPause,
    Back,
    Next,
    /// Jump to `index + dt`.
    Slide(f64),
    /// A new playback speed, in milliseconds per delta.
    Speed(f64),
    SetMode(PlaybackMode),
    ToggleFullscreen,
}

/// Speed slider values follow `speed = 100·x²`.
pub fn speed_from_slider(value: f64) -> f64 {
    100.0 * value * value
}

/// The inverse of [`speed_from_slider`], on the negated side of the slider.
pub fn slider_from_speed(speed: f64) -> f64 {
    -(speed.max(0.0) / 100.0).sqrt()
}

/// The scrubber, the transport buttons and the speed controls.
#[derive(Clone, Debug)]
pub struct PlaybackPane {
    pub play_pause_button: Button,
    pub back_button: Button,
    pub next_button: Button,
    pub deltas_button: Button,
    pub turns_button: Button,
    pub fullscreen_button: Button,
    pub playback_slider: Slider,
    pub speed_slider: Slider,
    number_of_deltas: usize,
    current: CurrentTime,
    mode: PlaybackMode,
    playing: bool,
    disabled: bool,
}

impl PlaybackPane {
    /// A pane that stays disabled until a gamelog is ready.
    pub fn new(speed: f64, mode: PlaybackMode) -> Self {
        let mut pane = Self {
            play_pause_button: Button::new("Play"),
            back_button: Button::new("Back"),
            next_button: Button::new("Next"),
            deltas_button: Button::new("Deltas"),
            turns_button: Button::new("Turns"),
            fullscreen_button: Button::new("Fullscreen"),
            playback_slider: Slider::new(0.0, 0.0),
            speed_slider: Slider::new(SPEED_SLIDER_MIN, SPEED_SLIDER_MAX),
            number_of_deltas: 0,
            current: CurrentTime::default(),
            mode,
            playing: false,
            disabled: false,
        };
        pane.update_speed_slider(speed);
        pane.disable();
        pane
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    /// A gamelog was loaded. While it is still streaming only the speed can
    /// be changed.
    pub fn ready(&mut self, number_of_deltas: usize, streaming: bool) {
        self.number_of_deltas = number_of_deltas;
        if streaming {
            self.speed_slider.enable();
        } else {
            self.enable();
        }
        self.playback_slider.set_value(0.0);
        self.update_playback_slider();
        self.time_updated(CurrentTime::default());
    }

    pub fn update_number_of_deltas(&mut self, number_of_deltas: usize) {
        self.number_of_deltas = number_of_deltas;
        self.update_playback_slider();
    }

    /// The streamed gamelog is complete.
    pub fn finalize(&mut self, number_of_deltas: usize) {
        self.number_of_deltas = number_of_deltas;
        self.update_playback_slider();
        self.enable();
        self.time_updated(self.current);
    }

    pub fn number_of_deltas(&self) -> usize {
        self.number_of_deltas
    }

    fn update_playback_slider(&mut self) {
        self.playback_slider
            .set_max((self.number_of_deltas as f64 - SLIDER_EPSILON).max(0.0));
    }

    pub fn current_time(&self) -> CurrentTime {
        self.current
    }

    /// The index shown next to the slider, and the last index.
    pub fn index_display(&self) -> (usize, usize) {
        (self.current.index, self.number_of_deltas.saturating_sub(1))
    }

    pub fn time_updated(&mut self, time: CurrentTime) {
        self.current = time;
        self.playback_slider.set_value(time.index as f64 + time.dt);
        if self.is_enabled() {
            self.back_button
                .set_enabled(!(time.index == 0 && time.dt == 0.0));
            self.next_button
                .set_enabled(time.index + 1 < self.number_of_deltas);
        }
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
        self.play_pause_button
            .set_label(if playing { "Pause" } else { "Play" });
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Shows which playback mode is active.
    pub fn update_playback_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    pub fn speed(&self) -> f64 {
        speed_from_slider(self.speed_slider.value())
    }

    /// Moves the speed slider to match a speed set elsewhere.
    pub fn update_speed_slider(&mut self, speed: f64) {
        self.speed_slider.set_value(slider_from_speed(speed));
    }

    pub fn click_play_pause(&self) -> Option<PlaybackAction> {
        self.play_pause_button
            .click()
            .then_some(PlaybackAction::PlayPause)
    }

    pub fn click_back(&self) -> Option<PlaybackAction> {
        self.back_button.click().then_some(PlaybackAction::Back)
    }

    pub fn click_next(&self) -> Option<PlaybackAction> {
        self.next_button.click().then_some(PlaybackAction::Next)
    }

    pub fn click_fullscreen(&self) -> Option<PlaybackAction> {
        self.fullscreen_button
            .click()
            .then_some(PlaybackAction::ToggleFullscreen)
    }

    /// Switching to the mode that is already active does nothing.
    pub fn click_mode(&self, mode: PlaybackMode) -> Option<PlaybackAction> {
        let button = match mode {
            PlaybackMode::Deltas => &self.deltas_button,
            PlaybackMode::Turns => &self.turns_button,
        };
        (button.click() && mode != self.mode).then_some(PlaybackAction::SetMode(mode))
    }

    pub fn slide(&mut self, value: f64) -> Option<PlaybackAction> {
        self.playback_slider.change(value).map(PlaybackAction::Slide)
    }

    /// The speed slider was moved to `value`.
    pub fn slide_speed(&mut self, value: f64) -> Option<PlaybackAction> {
        let value = self.speed_slider.change(value)?;
        let speed = speed_from_slider(-value);
        debug!(speed, "Speed slider moved");
        Some(PlaybackAction::Speed(speed))
    }

    fn enable(&mut self) {
        self.disabled = false;
        for button in self.buttons_mut() {
            button.enable();
        }
        self.playback_slider.enable();
        self.speed_slider.enable();
    }

    fn disable(&mut self) {
        self.disabled = true;
        for button in self.buttons_mut() {
            button.disable();
        }
        self.playback_slider.disable();
        self.speed_slider.disable();
    }

    fn buttons_mut(&mut self) -> [&mut Button; 6] {
        [
            &mut self.play_pause_button,
            &mut self.back_button,
            &mut self.next_button,
            &mut self.deltas_button,
            &mut self.turns_button,
            &mut self.fullscreen_button,
        ]
    }
}
