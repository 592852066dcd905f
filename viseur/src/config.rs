use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::warn;

use crate::utils::validate_url;
use crate::ConfigError;

/// Deployment configuration, read from `config.json`.
///
/// Keys that are missing, or whose JSON type differs from the default's,
/// keep their default.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// The game to show when no gamelog names one.
    pub game: String,
    pub human_name: String,
    pub arena_server: String,
    pub game_server: String,
    pub tournament_server: String,
    pub port: i64,
    pub session: String,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        Self::from_value(&value)
    }

    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let Value::Object(map) = value else {
            return Err(ConfigError::Malformed);
        };
        let defaults = Config::default();
        let config = Config {
            game: string_or(map, "game", defaults.game),
            human_name: string_or(map, "humanName", defaults.human_name),
            arena_server: string_or(map, "arenaServer", defaults.arena_server),
            game_server: string_or(map, "gameServer", defaults.game_server),
            tournament_server: string_or(map, "tournamentServer", defaults.tournament_server),
            port: match map.get("port") {
                None => defaults.port,
                Some(v) => v.as_i64().unwrap_or_else(|| {
                    warn!(key = "port", "Config value has the wrong type, using the default");
                    defaults.port
                }),
            },
            session: string_or(map, "session", defaults.session),
        };
        for (key, server) in [
            ("arenaServer", &config.arena_server),
            ("tournamentServer", &config.tournament_server),
        ] {
            if !server.is_empty() && !validate_url(server) {
                warn!(key, %server, "Config server does not look like a url");
            }
        }
        Ok(config)
    }
}

fn string_or(map: &Map<String, Value>, key: &str, default: String) -> String {
    match map.get(key) {
        None => default,
        Some(Value::String(s)) => s.clone(),
        Some(_) => {
            warn!(key, "Config value has the wrong type, using the default");
            default
        }
    }
}
