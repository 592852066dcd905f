use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::utils::unstringify;
use crate::{Color, ConfigError, PlaybackMode, SettingOverrideError, Side};

/// User preferences that persist between sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Milliseconds per delta.
    pub playback_speed: f64,
    pub playback_mode: PlaybackMode,
    pub info_pane_side: Side,
    pub info_pane_length: f64,
    pub show_grid: bool,
    pub resolution_scale: f64,
    /// Whether `player_colors` override the game's own player colors.
    pub custom_player_colors: bool,
    pub player_colors: Vec<Color>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            playback_speed: 1000.0,
            playback_mode: PlaybackMode::Deltas,
            info_pane_side: Side::Right,
            info_pane_length: 420.0,
            show_grid: false,
            resolution_scale: 1.0,
            custom_player_colors: true,
            player_colors: Vec::new(),
        }
    }
}

/// Names a single setting, used to report which settings changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingKey {
    PlaybackSpeed,
    PlaybackMode,
    InfoPaneSide,
    InfoPaneLength,
    ShowGrid,
    ResolutionScale,
    CustomPlayerColors,
    PlayerColor(usize),
}

impl SettingKey {
    pub fn name(self) -> String {
        match self {
            SettingKey::PlaybackSpeed => String::from("playback-speed"),
            SettingKey::PlaybackMode => String::from("playback-mode"),
            SettingKey::InfoPaneSide => String::from("info-pane-side"),
            SettingKey::InfoPaneLength => String::from("info-pane-length"),
            SettingKey::ShowGrid => String::from("show-grid"),
            SettingKey::ResolutionScale => String::from("resolution-scale"),
            SettingKey::CustomPlayerColors => String::from("custom-player-colors"),
            SettingKey::PlayerColor(i) => format!("player-color-{}", i),
        }
    }
}

impl FromStr for SettingKey {
    type Err = SettingOverrideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "playback-speed" => SettingKey::PlaybackSpeed,
            "playback-mode" => SettingKey::PlaybackMode,
            "info-pane-side" => SettingKey::InfoPaneSide,
            "info-pane-length" => SettingKey::InfoPaneLength,
            "show-grid" => SettingKey::ShowGrid,
            "resolution-scale" => SettingKey::ResolutionScale,
            "custom-player-colors" => SettingKey::CustomPlayerColors,
            _ => {
                let index = s
                    .strip_prefix("player-color-")
                    .and_then(|i| i.parse::<usize>().ok())
                    .ok_or_else(|| SettingOverrideError::UnknownKey(String::from(s)))?;
                SettingKey::PlayerColor(index)
            }
        })
    }
}

impl std::fmt::Display for SettingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Owns the [`Settings`] and records which of them changed.
#[derive(Clone, Debug, Default)]
pub struct SettingsManager {
    settings: Settings,
    path: Option<PathBuf>,
    changes: Vec<SettingKey>,
}

fn set_field<T: PartialEq>(field: &mut T, value: T, key: SettingKey, changes: &mut Vec<SettingKey>) {
    if *field != value {
        *field = value;
        changes.push(key);
    }
}

impl SettingsManager {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            path: None,
            changes: Vec::new(),
        }
    }

    /// Loads the settings file, falling back to the defaults when there is
    /// none yet. The settings are saved back to the same file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings = match File::open(path) {
            Ok(file) => serde_json::from_reader(BufReader::new(file))?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(path = %path.display(), "No settings file yet, using the defaults");
                Settings::default()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            settings,
            path: Some(path.to_path_buf()),
            changes: Vec::new(),
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &self.settings)?;
        debug!(path = %path.display(), "Saved settings");
        Ok(())
    }

    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Every setting that changed since the last call, in order.
    pub fn drain_changes(&mut self) -> Vec<SettingKey> {
        std::mem::take(&mut self.changes)
    }

    pub fn set_playback_speed(&mut self, speed: f64) {
        let speed = if speed.is_finite() { speed.max(1.0) } else { 1.0 };
        set_field(&mut self.settings.playback_speed, speed, SettingKey::PlaybackSpeed, &mut self.changes);
    }

    pub fn set_playback_mode(&mut self, mode: PlaybackMode) {
        set_field(&mut self.settings.playback_mode, mode, SettingKey::PlaybackMode, &mut self.changes);
    }

    pub fn set_info_pane_side(&mut self, side: Side) {
        set_field(&mut self.settings.info_pane_side, side, SettingKey::InfoPaneSide, &mut self.changes);
    }

    pub fn set_info_pane_length(&mut self, length: f64) {
        set_field(&mut self.settings.info_pane_length, length, SettingKey::InfoPaneLength, &mut self.changes);
    }

    pub fn set_show_grid(&mut self, show_grid: bool) {
        set_field(&mut self.settings.show_grid, show_grid, SettingKey::ShowGrid, &mut self.changes);
    }

    pub fn set_resolution_scale(&mut self, scale: f64) {
        let scale = if scale.is_finite() && scale > 0.0 { scale } else { 1.0 };
        set_field(&mut self.settings.resolution_scale, scale, SettingKey::ResolutionScale, &mut self.changes);
    }

    pub fn set_custom_player_colors(&mut self, custom: bool) {
        set_field(
            &mut self.settings.custom_player_colors,
            custom,
            SettingKey::CustomPlayerColors,
            &mut self.changes,
        );
    }

    pub fn player_color(&self, index: usize) -> Option<Color> {
        self.settings.player_colors.get(index).copied()
    }

    /// Sets the custom color of a player, giving the players before it
    /// `fallback` colors if they have none yet.
    pub fn set_player_color(&mut self, index: usize, color: Color, fallback: impl Fn(usize) -> Color) {
        let colors = &mut self.settings.player_colors;
        while colors.len() <= index {
            colors.push(fallback(colors.len()));
            self.changes.push(SettingKey::PlayerColor(colors.len() - 1));
        }
        set_field(&mut colors[index], color, SettingKey::PlayerColor(index), &mut self.changes);
    }

    /// Applies a `key=value` override given on the command line.
    pub fn apply_override(&mut self, assignment: &str) -> Result<(), SettingOverrideError> {
        let (key, raw) = assignment
            .split_once('=')
            .ok_or_else(|| SettingOverrideError::MissingEquals(String::from(assignment)))?;
        let key: SettingKey = key.trim().parse()?;
        let raw = raw.trim();
        let invalid = || SettingOverrideError::InvalidValue {
            key: key.name(),
            value: String::from(raw),
        };
        let value = unstringify(raw);
        match key {
            SettingKey::PlaybackSpeed => self.set_playback_speed(value.as_f64().ok_or_else(invalid)?),
            SettingKey::InfoPaneLength => self.set_info_pane_length(value.as_f64().ok_or_else(invalid)?),
            SettingKey::ResolutionScale => self.set_resolution_scale(value.as_f64().ok_or_else(invalid)?),
            SettingKey::ShowGrid => self.set_show_grid(value.as_bool().ok_or_else(invalid)?),
            SettingKey::CustomPlayerColors => {
                self.set_custom_player_colors(value.as_bool().ok_or_else(invalid)?)
            }
            SettingKey::PlaybackMode => {
                self.set_playback_mode(as_string(&value).parse().map_err(|_| invalid())?)
            }
            SettingKey::InfoPaneSide => {
                self.set_info_pane_side(as_string(&value).parse().map_err(|_| invalid())?)
            }
            SettingKey::PlayerColor(index) => {
                let color: Color = as_string(&value).parse().map_err(|_| invalid())?;
                self.set_player_color(index, color, |_| color);
            }
        }
        debug!(%key, value = raw, "Applied setting override");
        Ok(())
    }
}

fn as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
