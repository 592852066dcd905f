use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::traverse;
use crate::GamelogError;

/// A recorded game, as written by the game server.
///
/// Every delta carries a diff of the game state, see
/// [`StateHistory`](crate::StateHistory) for how the diffs are merged into
/// complete states.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gamelog {
    pub game_name: String,
    #[serde(default)]
    pub game_session: String,
    #[serde(default)]
    pub constants: GamelogConstants,
    pub deltas: Vec<Delta>,
    /// Milliseconds since the unix epoch at which the game was played.
    #[serde(default)]
    pub epoch: Option<i64>,
    #[serde(default)]
    pub random_seed: String,
    #[serde(default)]
    pub winners: Vec<PlayerResult>,
    #[serde(default)]
    pub losers: Vec<PlayerResult>,
    /// Set while the game is still being played and deltas keep arriving.
    #[serde(default)]
    pub streaming: bool,
}

/// The special values used inside game diffs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct GamelogConstants {
    /// Key holding the new length of a list that is being diffed.
    #[serde(default = "default_delta_list_length")]
    pub delta_list_length: String,
    /// Value marking a key that was removed.
    #[serde(default = "default_delta_removed")]
    pub delta_removed: String,
}

fn default_delta_list_length() -> String {
    String::from("&LEN")
}

fn default_delta_removed() -> String {
    String::from("&RM")
}

impl Default for GamelogConstants {
    fn default() -> Self {
        Self {
            delta_list_length: default_delta_list_length(),
            delta_removed: default_delta_removed(),
        }
    }
}

/// What happened between two consecutive states.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(rename = "type")]
    pub kind: DeltaKind,
    /// Data about why the delta occurred, its shape depends on the kind.
    #[serde(default)]
    pub data: Value,
    /// The changes to the game state.
    #[serde(default)]
    pub game: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeltaKind {
    Start,
    Ran,
    Order,
    Finished,
    Over,
    Disconnect,
    Timeout,
    Other(String),
}

impl From<String> for DeltaKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "start" => DeltaKind::Start,
            "ran" => DeltaKind::Ran,
            "order" => DeltaKind::Order,
            "finished" => DeltaKind::Finished,
            "over" => DeltaKind::Over,
            "disconnect" => DeltaKind::Disconnect,
            "timeout" => DeltaKind::Timeout,
            _ => DeltaKind::Other(s),
        }
    }
}

impl From<DeltaKind> for String {
    fn from(kind: DeltaKind) -> Self {
        match kind {
            DeltaKind::Start => String::from("start"),
            DeltaKind::Ran => String::from("ran"),
            DeltaKind::Order => String::from("order"),
            DeltaKind::Finished => String::from("finished"),
            DeltaKind::Over => String::from("over"),
            DeltaKind::Disconnect => String::from("disconnect"),
            DeltaKind::Timeout => String::from("timeout"),
            DeltaKind::Other(s) => s,
        }
    }
}

impl std::fmt::Display for DeltaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from(self.clone()))
    }
}

/// How a player ended the game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub disconnected: bool,
    #[serde(default)]
    pub timed_out: bool,
}

impl Delta {
    pub fn is_finished(&self) -> bool {
        self.kind == DeltaKind::Finished
    }

    /// The value a finished order or ran function returned.
    pub fn returned(&self) -> Option<&Value> {
        self.data.get("returned").filter(|v| !v.is_null())
    }

    pub fn returned_str(&self) -> Option<&str> {
        self.returned().and_then(Value::as_str)
    }

    /// The name of the order sent to, or the function ran by, the player.
    pub fn order_name(&self) -> Option<&str> {
        traverse(&self.data, &["order", "name"])
            .or_else(|_| traverse(&self.data, &["run", "functionName"]))
            .ok()
            .and_then(Value::as_str)
    }

    /// The id of the player this delta is about, if any.
    pub fn player_id(&self) -> Option<&str> {
        traverse(&self.data, &["player", "id"])
            .ok()
            .and_then(Value::as_str)
    }
}

impl FromStr for Gamelog {
    type Err = GamelogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let gamelog: Gamelog = serde_json::from_str(s)?;
        gamelog.validate()?;
        Ok(gamelog)
    }
}

impl Gamelog {
    pub fn from_reader(reader: impl Read) -> Result<Self, GamelogError> {
        let gamelog: Gamelog = serde_json::from_reader(reader)?;
        gamelog.validate()?;
        Ok(gamelog)
    }

    pub fn load(path: &Path) -> Result<Self, GamelogError> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    fn validate(&self) -> Result<(), GamelogError> {
        if self.deltas.is_empty() {
            return Err(GamelogError::NoDeltas);
        }
        for (delta_idx, delta) in self.deltas.iter().enumerate() {
            validate_delta(delta_idx, delta)?;
        }
        Ok(())
    }

    pub fn number_of_deltas(&self) -> usize {
        self.deltas.len()
    }

    /// Adds a delta that arrived while the game is still running.
    pub fn append_delta(&mut self, delta: Delta) -> Result<(), GamelogError> {
        validate_delta(self.deltas.len(), &delta)?;
        self.deltas.push(delta);
        Ok(())
    }

    /// Marks a streamed gamelog as complete.
    pub fn finalize(&mut self) {
        self.streaming = false;
    }
}

fn validate_delta(delta_idx: usize, delta: &Delta) -> Result<(), GamelogError> {
    if delta.game.is_object() || delta.game.is_null() {
        Ok(())
    } else {
        Err(GamelogError::GameDiffNotAnObject { delta_idx })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const GAMELOG: &str = r#"{
        "gameName": "ConnectFour",
        "gameSession": "42",
        "epoch": 1573070938000,
        "randomSeed": "abc",
        "constants": { "DELTA_LIST_LENGTH": "&LEN", "DELTA_REMOVED": "&RM" },
        "winners": [{ "index": 0, "id": "1", "name": "Red Bot", "reason": "Connected four" }],
        "losers": [{ "index": 1, "id": "2", "name": "Yellow Bot", "reason": "Lost", "timedOut": true }],
        "deltas": [
            { "type": "start", "game": { "repString": "7/7/7/7/7/7 r" } },
            { "type": "order", "data": { "player": { "id": "1" }, "order": { "name": "makeMove", "index": 0, "args": {} } }, "game": {} },
            { "type": "finished", "data": { "player": { "id": "1" }, "order": { "name": "makeMove", "index": 0, "args": {} }, "returned": "3" }, "game": { "repString": "3r3/7/7/7/7/7 y" } },
            { "type": "end-of-the-world" }
        ]
    }"#;

    #[test]
    fn parse_gamelog() {
        let gamelog: Gamelog = GAMELOG.parse().unwrap();
        assert_eq!(gamelog.game_name, "ConnectFour");
        assert_eq!(gamelog.number_of_deltas(), 4);
        assert_eq!(gamelog.epoch, Some(1573070938000));
        assert!(!gamelog.streaming);
        assert!(gamelog.losers[0].timed_out);
        assert_eq!(gamelog.deltas[0].kind, DeltaKind::Start);
        assert_eq!(
            gamelog.deltas[3].kind,
            DeltaKind::Other(String::from("end-of-the-world"))
        );
        assert_eq!(gamelog.deltas[3].game, Value::Null);
    }

    #[test]
    fn delta_accessors() {
        let gamelog: Gamelog = GAMELOG.parse().unwrap();
        let finished = &gamelog.deltas[2];
        assert!(finished.is_finished());
        assert_eq!(finished.returned_str(), Some("3"));
        assert_eq!(finished.order_name(), Some("makeMove"));
        assert_eq!(finished.player_id(), Some("1"));

        let order = &gamelog.deltas[1];
        assert_eq!(order.returned(), None);
        assert_eq!(order.order_name(), Some("makeMove"));

        let ran = Delta {
            kind: DeltaKind::Ran,
            data: json!({ "run": { "functionName": "log", "caller": { "id": "0" } }, "returned": null }),
            game: json!({}),
        };
        assert_eq!(ran.order_name(), Some("log"));
        assert_eq!(ran.returned(), None);
        assert_eq!(ran.player_id(), None);
    }

    #[test]
    fn constants_default() {
        let gamelog: Gamelog =
            r#"{ "gameName": "Amazons", "deltas": [{ "type": "start", "game": {} }] }"#
                .parse()
                .unwrap();
        assert_eq!(gamelog.constants, GamelogConstants::default());
        assert_eq!(gamelog.constants.delta_removed, "&RM");
    }

    #[test]
    fn invalid_gamelogs() {
        let no_deltas = r#"{ "gameName": "Amazons", "deltas": [] }"#.parse::<Gamelog>();
        assert!(matches!(no_deltas, Err(GamelogError::NoDeltas)));

        let bad_diff =
            r#"{ "gameName": "Amazons", "deltas": [{ "type": "start", "game": [1, 2] }] }"#
                .parse::<Gamelog>();
        assert!(matches!(
            bad_diff,
            Err(GamelogError::GameDiffNotAnObject { delta_idx: 0 })
        ));

        let not_json = "{ gameName".parse::<Gamelog>();
        assert!(matches!(not_json, Err(GamelogError::Json(_))));
    }

    #[test]
    fn streaming_append() {
        let mut gamelog: Gamelog = GAMELOG.parse().unwrap();
        gamelog.streaming = true;
        gamelog
            .append_delta(Delta {
                kind: DeltaKind::Over,
                data: Value::Null,
                game: json!({ "over": true }),
            })
            .unwrap();
        assert_eq!(gamelog.number_of_deltas(), 5);
        assert!(gamelog
            .append_delta(Delta {
                kind: DeltaKind::Over,
                data: Value::Null,
                game: json!("nope"),
            })
            .is_err());
        gamelog.finalize();
        assert!(!gamelog.streaming);
    }
}
