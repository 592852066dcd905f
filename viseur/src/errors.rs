/// The error type for loading a [gamelog](crate::Gamelog).
#[derive(Debug)]
pub enum GamelogError {
    Io(std::io::Error),
    Json(serde_json::Error),
    NoDeltas,
    GameDiffNotAnObject { delta_idx: usize },
}

impl std::error::Error for GamelogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            GamelogError::Io(err) => Some(err),
            GamelogError::Json(err) => Some(err),
            _ => None,
        }
    }
}

impl std::fmt::Display for GamelogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GamelogError::Io(_) => write!(f, "Could not read the gamelog"),
            GamelogError::Json(_) => write!(f, "The gamelog is not valid JSON"),
            GamelogError::NoDeltas => write!(f, "The gamelog does not contain any deltas"),
            GamelogError::GameDiffNotAnObject { delta_idx } => write!(
                f,
                "The game diff of delta {} is neither an object nor absent",
                delta_idx
            ),
        }
    }
}

impl From<std::io::Error> for GamelogError {
    fn from(err: std::io::Error) -> Self {
        GamelogError::Io(err)
    }
}

impl From<serde_json::Error> for GamelogError {
    fn from(err: serde_json::Error) -> Self {
        GamelogError::Json(err)
    }
}

/// The error type for loading the [`Config`](crate::Config) and the
/// [`Settings`](crate::Settings).
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Json(serde_json::Error),
    Malformed,
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Json(err) => Some(err),
            ConfigError::Malformed => None,
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(_) => write!(f, "Could not access the configuration file"),
            ConfigError::Json(_) => write!(f, "The configuration file is not valid JSON"),
            ConfigError::Malformed => write!(f, "config.json malformed!"),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err)
    }
}

/// A side of the screen that the info pane cannot snap to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidSide(pub String);

impl std::error::Error for InvalidSide {}

impl std::fmt::Display for InvalidSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid side to snap to: '{}'", self.0)
    }
}

/// A gamelog was recorded for a game that has no renderer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownGame(pub String);

impl std::error::Error for UnknownGame {}

impl std::fmt::Display for UnknownGame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "There is no visualizer for the game '{}'", self.0)
    }
}

/// A name that does not correspond to a [`PlaybackMode`](crate::PlaybackMode).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownPlaybackMode(pub String);

impl std::error::Error for UnknownPlaybackMode {}

impl std::fmt::Display for UnknownPlaybackMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unknown playback mode '{}', expected 'deltas' or 'turns'",
            self.0
        )
    }
}

/// A name that does not correspond to an [`Easing`](crate::Easing).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownEasing(pub String);

impl std::error::Error for UnknownEasing {}

impl std::fmt::Display for UnknownEasing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Easing '{}' does not exist!", self.0)
    }
}

/// A string that could not be parsed as a [`Color`](crate::Color).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvalidColor(pub String);

impl std::error::Error for InvalidColor {}

impl std::fmt::Display for InvalidColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' is not a color", self.0)
    }
}

/// A player color was requested for a game object that is not a player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NotAPlayer {
    pub id: String,
}

impl std::error::Error for NotAPlayer {}

impl std::fmt::Display for NotAPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Game object '{}' is not a player to get a color for!", self.id)
    }
}

/// A key along a path through a JSON document was missing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyNotFound {
    pub key: String,
}

impl std::error::Error for KeyNotFound {}

impl std::fmt::Display for KeyNotFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Key '{}' not found in object to traverse", self.key)
    }
}

/// The error type for applying a `key=value` settings override.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SettingOverrideError {
    MissingEquals(String),
    UnknownKey(String),
    InvalidValue { key: String, value: String },
}

impl std::error::Error for SettingOverrideError {}

impl std::fmt::Display for SettingOverrideError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingOverrideError::MissingEquals(s) => {
                write!(f, "Setting override '{}' is not of the form key=value", s)
            }
            SettingOverrideError::UnknownKey(key) => write!(f, "There is no setting '{}'", key),
            SettingOverrideError::InvalidValue { key, value } => {
                write!(f, "'{}' is not a valid value for setting '{}'", value, key)
            }
        }
    }
}

/// The error type for adding sprites to a [`Scene`](crate::Scene).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SceneError {
    UnknownResource(String),
    UnknownLayer(String),
}

impl std::error::Error for SceneError {}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneError::UnknownResource(key) => write!(f, "There is no resource '{}'", key),
            SceneError::UnknownLayer(name) => write!(f, "There is no layer '{}'", name),
        }
    }
}
