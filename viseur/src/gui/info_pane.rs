use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::gui::tabular::Tabular;
use crate::{InvalidSide, SettingsManager};

/// The shortest the info pane can be resized to, in pixels.
pub const MINIMUM_LENGTH: f64 = 200.0;

/// The side of the screen the info pane is snapped to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Top,
    Left,
    Bottom,
    #[default]
    Right,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Top, Side::Left, Side::Bottom, Side::Right];

    pub fn orientation(self) -> Orientation {
        match self {
            Side::Left | Side::Right => Orientation::Vertical,
            Side::Top | Side::Bottom => Orientation::Horizontal,
        }
    }

    /// The next side, clockwise.
    pub fn next(self) -> Side {
        match self {
            Side::Top => Side::Right,
            Side::Right => Side::Bottom,
            Side::Bottom => Side::Left,
            Side::Left => Side::Top,
        }
    }
}

impl FromStr for Side {
    type Err = InvalidSide;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let side = s.to_lowercase();
        match side.as_str() {
            "top" => Ok(Side::Top),
            "left" => Ok(Side::Left),
            "bottom" => Ok(Side::Bottom),
            "right" => Ok(Side::Right),
            _ => Err(InvalidSide(side)),
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Top => write!(f, "top"),
            Side::Left => write!(f, "left"),
            Side::Bottom => write!(f, "bottom"),
            Side::Right => write!(f, "right"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orientation {
    /// Spans the width of the screen, on the top or bottom.
    Horizontal,
    /// Spans the height of the screen, on the left or right.
    Vertical,
}

/// The dockable pane with the tabs.
#[derive(Clone, Debug)]
pub struct InfoPane {
    side: Side,
    length: f64,
    /// Length while being dragged, not yet clamped to the minimum.
    drag_length: Option<f64>,
    pub tabular: Tabular,
}

impl InfoPane {
    pub fn new(side: Side, length: f64) -> Self {
        Self {
            side,
            length: length.max(MINIMUM_LENGTH),
            drag_length: None,
            tabular: Tabular::default(),
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn orientation(&self) -> Orientation {
        self.side.orientation()
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn snap_to(&mut self, side: Side) {
        debug!(%side, "Snapping info pane");
        self.side = side;
    }

    /// Sets a new length, at least [`MINIMUM_LENGTH`], and saves it in the
    /// settings. `None` keeps the current length.
    pub fn resize(&mut self, new_length: Option<f64>, settings: &mut SettingsManager) {
        if let Some(length) = new_length.filter(|l| l.is_finite()) {
            self.length = length.max(MINIMUM_LENGTH);
            settings.set_info_pane_length(self.length);
        }
    }

    /// The width and height taken away from the visualizer.
    pub fn extent(&self, fullscreen: bool) -> (f64, f64) {
        if fullscreen {
            return (0.0, 0.0);
        }
        match self.orientation() {
            Orientation::Vertical => (self.length, 0.0),
            Orientation::Horizontal => (0.0, self.length),
        }
    }

    pub fn is_resizing(&self) -> bool {
        self.drag_length.is_some()
    }

    pub fn drag_start(&mut self) {
        self.drag_length = Some(self.length);
    }

    /// The resizer was dragged from one point to another.
    ///
    /// Dragging towards the middle of the screen grows the pane.
    pub fn drag(&mut self, from: (f64, f64), to: (f64, f64), settings: &mut SettingsManager) {
        let start = self.drag_length.unwrap_or(self.length);
        let delta = match self.side {
            Side::Top => to.1 - from.1,
            Side::Bottom => from.1 - to.1,
            Side::Left => to.0 - from.0,
            Side::Right => from.0 - to.0,
        };
        if delta != 0.0 {
            let length = start + delta;
            self.drag_length = Some(length);
            self.resize(Some(length), settings);
        }
    }

    pub fn drag_end(&mut self) {
        self.drag_length = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_side() {
        assert_eq!("LEFT".parse::<Side>(), Ok(Side::Left));
        let err = "middle".parse::<Side>().unwrap_err();
        assert_eq!(err.to_string(), "invalid side to snap to: 'middle'");
        assert_eq!(Side::Bottom.orientation(), Orientation::Horizontal);
        assert_eq!(Side::Right.orientation(), Orientation::Vertical);
    }

    #[test]
    fn minimum_length() {
        let mut settings = SettingsManager::default();
        let mut pane = InfoPane::new(Side::Right, 50.0);
        assert_eq!(pane.length(), MINIMUM_LENGTH);
        pane.resize(Some(500.0), &mut settings);
        assert_eq!(pane.length(), 500.0);
        assert_eq!(settings.get().info_pane_length, 500.0);
        pane.resize(None, &mut settings);
        assert_eq!(pane.length(), 500.0);
        pane.resize(Some(10.0), &mut settings);
        assert_eq!(settings.get().info_pane_length, MINIMUM_LENGTH);
    }

    #[test]
    fn extent_follows_orientation() {
        let mut pane = InfoPane::new(Side::Right, 300.0);
        assert_eq!(pane.extent(false), (300.0, 0.0));
        pane.snap_to(Side::Top);
        assert_eq!(pane.extent(false), (0.0, 300.0));
        assert_eq!(pane.extent(true), (0.0, 0.0));
    }

    #[test]
    fn dragging() {
        let mut settings = SettingsManager::default();
        let mut pane = InfoPane::new(Side::Right, 400.0);
        pane.drag_start();
        assert!(pane.is_resizing());
        // right pane grows when dragged left
        pane.drag((500.0, 0.0), (450.0, 0.0), &mut settings);
        assert_eq!(pane.length(), 450.0);
        pane.drag_end();

        pane.snap_to(Side::Top);
        pane.drag_start();
        pane.drag((0.0, 300.0), (0.0, 100.0), &mut settings);
        assert_eq!(pane.length(), 250.0);
        // the drag keeps going below the minimum, the length does not
        pane.drag((0.0, 300.0), (0.0, -300.0), &mut settings);
        assert_eq!(pane.length(), MINIMUM_LENGTH);
        pane.drag_end();
        assert!(!pane.is_resizing());
    }
}
