use tracing::{debug, info};

use crate::{Gamelog, Settings};

pub mod button;
pub mod info_pane;
pub mod playback_pane;
pub mod tabular;

pub use button::{Button, Slider};
pub use info_pane::{InfoPane, Orientation, Side, MINIMUM_LENGTH};
pub use playback_pane::{PlaybackAction, PlaybackPane};
pub use tabular::{Tab, TabKind, Tabular};

/// Height of the playback pane until the front end measures it.
const DEFAULT_PLAYBACK_HEIGHT: f64 = 64.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }
}

/// Where the parts of the visualizer go, in pixels of the window.
///
/// The visualizer pane is the window minus the info pane. From top to
/// bottom it holds the renderer, the game pane and the playback pane.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct VisualizerLayout {
    pub visualizer_pane: Rect,
    pub renderer: Rect,
    pub game_pane: Rect,
    pub playback: Rect,
    /// The renderer's height, what is left after the playback and game
    /// panes.
    pub remaining_height: f64,
}

/// A message covering the whole screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Modal {
    pub message: String,
    pub is_error: bool,
}

/// The layout and controls around the game.
#[derive(Clone, Debug)]
pub struct Gui {
    window: (f64, f64),
    fullscreen: bool,
    modal: Option<Modal>,
    playback_height: f64,
    game_pane_height: f64,
    layout: VisualizerLayout,
    title: String,
    pub info_pane: InfoPane,
    pub playback_pane: PlaybackPane,
}

impl Gui {
    pub fn new(settings: &Settings) -> Self {
        Self {
            window: (0.0, 0.0),
            fullscreen: false,
            modal: None,
            playback_height: DEFAULT_PLAYBACK_HEIGHT,
            game_pane_height: 0.0,
            layout: VisualizerLayout::default(),
            title: String::from("Viseur"),
            info_pane: InfoPane::new(settings.info_pane_side, settings.info_pane_length),
            playback_pane: PlaybackPane::new(settings.playback_speed, settings.playback_mode),
        }
    }

    pub fn layout(&self) -> VisualizerLayout {
        self.layout
    }

    pub fn window_size(&self) -> (f64, f64) {
        self.window
    }

    /// The window changed size.
    pub fn resize_window(&mut self, width: f64, height: f64) -> VisualizerLayout {
        self.window = (width.max(0.0), height.max(0.0));
        self.resize()
    }

    /// Lays everything out again for the current info pane.
    pub fn resize(&mut self) -> VisualizerLayout {
        let (width, height) = self.info_pane.extent(self.fullscreen);
        self.resize_visualizer(width, height)
    }

    /// Fits the visualizer next to an info pane of `width × height`.
    pub fn resize_visualizer(&mut self, width: f64, height: f64) -> VisualizerLayout {
        let (mut new_width, mut new_height) = self.window;
        let mut top = 0.0;
        let mut left = 0.0;

        match self.info_pane.orientation() {
            Orientation::Horizontal => {
                new_height -= height;
                if self.info_pane.side() == Side::Top {
                    top = height;
                }
            }
            Orientation::Vertical => {
                new_width -= width;
                if self.info_pane.side() == Side::Left {
                    left = width;
                }
            }
        }
        let new_width = new_width.max(0.0);
        let new_height = new_height.max(0.0);

        let playback_height = self.playback_height.min(new_height);
        let game_pane_height = self.game_pane_height.min(new_height - playback_height);
        let remaining_height = new_height - playback_height - game_pane_height;

        self.layout = VisualizerLayout {
            visualizer_pane: Rect::new(left, top, new_width, new_height),
            renderer: Rect::new(left, top, new_width, remaining_height),
            game_pane: Rect::new(left, top + remaining_height, new_width, game_pane_height),
            playback: Rect::new(
                left,
                top + new_height - playback_height,
                new_width,
                playback_height,
            ),
            remaining_height,
        };
        debug!(
            width = new_width,
            height = new_height,
            remaining_height,
            "Visualizer resized"
        );
        self.layout
    }

    pub fn set_playback_height(&mut self, height: f64) {
        self.playback_height = height.max(0.0);
        self.resize();
    }

    /// Games may show a pane of their own between the renderer and the
    /// playback pane.
    pub fn set_game_pane_height(&mut self, height: f64) {
        self.game_pane_height = height.max(0.0);
        self.resize();
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    pub fn go_fullscreen(&mut self) -> VisualizerLayout {
        self.fullscreen = true;
        self.resize_visualizer(0.0, 0.0)
    }

    pub fn exit_fullscreen(&mut self) -> VisualizerLayout {
        self.fullscreen = false;
        self.resize()
    }

    pub fn toggle_fullscreen(&mut self) -> VisualizerLayout {
        if self.fullscreen {
            self.exit_fullscreen()
        } else {
            self.go_fullscreen()
        }
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn modal_message(&mut self, message: impl Into<String>) {
        self.modal = Some(Modal {
            message: message.into(),
            is_error: false,
        });
    }

    pub fn modal_error(&mut self, message: impl Into<String>) {
        self.modal = Some(Modal {
            message: message.into(),
            is_error: true,
        });
    }

    pub fn hide_modal(&mut self) {
        self.modal = None;
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Names the window after a freshly loaded gamelog.
    pub fn gamelog_ready(&mut self, gamelog: &Gamelog) {
        self.title = title(gamelog);
        info!(title = %self.title, "Gamelog ready");
    }
}

/// `"<game> - <session> - <date> | Viseur"`, the date being "Live" while the
/// gamelog is streamed.
pub fn title(gamelog: &Gamelog) -> String {
    let date = if gamelog.streaming {
        String::from("Live")
    } else {
        match gamelog.epoch {
            Some(epoch) => format_epoch(epoch),
            None => String::from("Unknown date"),
        }
    };
    format!(
        "{} - {} - {} | Viseur",
        gamelog.game_name, gamelog.game_session, date
    )
}

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Formats milliseconds since the unix epoch like
/// "November 6th, 2019, 8:08:58:000 PM UTC".
pub fn format_epoch(epoch_ms: i64) -> String {
    let days = epoch_ms.div_euclid(86_400_000);
    let ms_of_day = epoch_ms.rem_euclid(86_400_000);
    let (year, month, day) = civil_from_days(days);

    let hours = ms_of_day / 3_600_000;
    let minutes = ms_of_day / 60_000 % 60;
    let seconds = ms_of_day / 1000 % 60;
    let millis = ms_of_day % 1000;
    let (hour12, meridiem) = match hours {
        0 => (12, "AM"),
        1..=11 => (hours, "AM"),
        12 => (12, "PM"),
        _ => (hours - 12, "PM"),
    };
    format!(
        "{} {}{}, {}, {}:{:02}:{:02}:{:03} {} UTC",
        MONTHS[(month - 1) as usize],
        day,
        ordinal_suffix(day),
        year,
        hour12,
        minutes,
        seconds,
        millis,
        meridiem
    )
}

fn ordinal_suffix(day: i64) -> &'static str {
    match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Year, month (1-12) and day (1-31) of a day count since 1970-01-01, in
/// the proleptic gregorian calendar.
fn civil_from_days(days: i64) -> (i64, i64, i64) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
