use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{Delta, DeltaKind, Gamelog, GamelogConstants, GamelogError};

/// Every game state of a gamelog, reconstructed from its diffs.
///
/// State `i` is the result of merging the diffs of deltas `0..=i` into an
/// empty object.
#[derive(Clone, Debug)]
pub struct StateHistory {
    constants: GamelogConstants,
    states: Vec<Value>,
    deltas: Vec<Delta>,
    /// Indices of the states that begin a new turn, sorted.
    turn_starts: Vec<usize>,
    /// Whether any state so far carries `currentTurn`.
    has_current_turn: bool,
}

/// Lists longer than this are cut short when merged.
pub const MAX_LIST_LENGTH: usize = 1 << 16;

/// The states and deltas around one point of the timeline.
///
/// `delta` is the delta that produced `game`, `next_delta` is the one that
/// turns `game` into `next_game`.
#[derive(Clone, Copy, Debug)]
pub struct ViseurGameState<'a> {
    pub index: usize,
    pub game: &'a Value,
    pub next_game: Option<&'a Value>,
    pub delta: &'a Delta,
    pub next_delta: Option<&'a Delta>,
}

impl StateHistory {
    pub fn build(gamelog: &Gamelog) -> Result<Self, GamelogError> {
        if gamelog.deltas.is_empty() {
            return Err(GamelogError::NoDeltas);
        }
        let mut history = Self {
            constants: gamelog.constants.clone(),
            states: Vec::with_capacity(gamelog.deltas.len()),
            deltas: Vec::with_capacity(gamelog.deltas.len()),
            turn_starts: Vec::new(),
            has_current_turn: false,
        };
        for delta in &gamelog.deltas {
            history.push(delta.clone());
        }
        debug!(
            game = %gamelog.game_name,
            states = history.len(),
            turns = history.turn_starts.len(),
            "Built state history"
        );
        Ok(history)
    }

    /// Appends the state produced by one more delta.
    pub fn push(&mut self, delta: Delta) {
        let mut state = self
            .states
            .last()
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        if !delta.game.is_null() {
            merge_delta(&mut state, &delta.game, &self.constants);
        }
        let has_current_turn = state.get("currentTurn").is_some();
        self.states.push(state);
        self.deltas.push(delta);

        if has_current_turn && !self.has_current_turn {
            // the earlier boundaries came from finished deltas
            self.has_current_turn = true;
            self.turn_starts = self.all_turn_starts();
        } else {
            let index = self.states.len() - 1;
            if index > 0 && self.starts_turn(index) {
                self.turn_starts.push(index);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, index: usize) -> Option<&Value> {
        self.states.get(index)
    }

    pub fn delta(&self, index: usize) -> Option<&Delta> {
        self.deltas.get(index)
    }

    /// The states around `index`, clamped to the last state.
    pub fn state_at(&self, index: usize) -> ViseurGameState<'_> {
        let index = index.min(self.states.len().saturating_sub(1));
        ViseurGameState {
            index,
            game: &self.states[index],
            next_game: self.states.get(index + 1),
            delta: &self.deltas[index],
            next_delta: self.deltas.get(index + 1),
        }
    }

    pub fn turn_starts(&self) -> &[usize] {
        &self.turn_starts
    }

    /// Whether state `index` begins a turn. Needs `index > 0`.
    fn starts_turn(&self, index: usize) -> bool {
        if self.has_current_turn {
            self.states[index].get("currentTurn") != self.states[index - 1].get("currentTurn")
        } else {
            // Without turn numbers, every finished order is one turn.
            self.deltas[index].kind == DeltaKind::Finished
        }
    }

    fn all_turn_starts(&self) -> Vec<usize> {
        (1..self.states.len())
            .filter(|&i| self.starts_turn(i))
            .collect()
    }
}

/// The first turn start after `index`, or the last index.
pub fn next_turn_index(turn_starts: &[usize], index: usize, number_of_deltas: usize) -> usize {
    let last = number_of_deltas.saturating_sub(1);
    turn_starts
        .iter()
        .copied()
        .find(|&start| start > index)
        .unwrap_or(last)
        .min(last)
}

/// The last turn start before `index`, or 0.
pub fn previous_turn_index(turn_starts: &[usize], index: usize) -> usize {
    turn_starts
        .iter()
        .rev()
        .copied()
        .find(|&start| start < index)
        .unwrap_or(0)
}

/// Merges a game diff into a state.
///
/// Objects merge key by key, the removed marker deletes a key, and an object
/// carrying the list length marker describes a list whose elements are keyed
/// by their index. Anything else replaces the old value.
pub fn merge_delta(state: &mut Value, diff: &Value, constants: &GamelogConstants) {
    let Value::Object(diff_map) = diff else {
        *state = diff.clone();
        return;
    };

    if state.is_array() || diff_map.contains_key(&constants.delta_list_length) {
        merge_list(state, diff_map, constants);
        return;
    }

    if !state.is_object() {
        *state = Value::Object(Map::new());
    }
    if let Value::Object(map) = state {
        for (key, value) in diff_map {
            if is_removed(value, constants) {
                map.remove(key);
            } else if value.is_object() {
                merge_delta(map.entry(key.clone()).or_insert(Value::Null), value, constants);
            } else {
                map.insert(key.clone(), value.clone());
            }
        }
    }
}

fn merge_list(state: &mut Value, diff_map: &Map<String, Value>, constants: &GamelogConstants) {
    if !state.is_array() {
        *state = Value::Array(Vec::new());
    }
    let Value::Array(list) = state else {
        return;
    };
    if let Some(len) = diff_map
        .get(&constants.delta_list_length)
        .and_then(Value::as_u64)
    {
        let len = usize::try_from(len).unwrap_or(usize::MAX);
        if len > MAX_LIST_LENGTH {
            warn!(len, max = MAX_LIST_LENGTH, "List diff is too long, cutting it short");
        }
        list.resize(len.min(MAX_LIST_LENGTH), Value::Null);
    }
    for (key, value) in diff_map {
        if *key == constants.delta_list_length {
            continue;
        }
        let Ok(idx) = key.parse::<usize>() else {
            warn!(%key, "Ignoring non-numeric key in a list diff");
            continue;
        };
        if idx >= MAX_LIST_LENGTH {
            warn!(idx, max = MAX_LIST_LENGTH, "Ignoring a list index past the longest list");
            continue;
        }
        if idx >= list.len() {
            list.resize(idx + 1, Value::Null);
        }
        if is_removed(value, constants) {
            list[idx] = Value::Null;
        } else if value.is_object() {
            merge_delta(&mut list[idx], value, constants);
        } else {
            list[idx] = value.clone();
        }
    }
}

fn is_removed(value: &Value, constants: &GamelogConstants) -> bool {
    value.as_str() == Some(constants.delta_removed.as_str())
}

/// All game objects of a state, by id.
pub fn game_objects(state: &Value) -> impl Iterator<Item = (&str, &Value)> {
    state
        .get("gameObjects")
        .and_then(Value::as_object)
        .into_iter()
        .flat_map(|map| map.iter().map(|(id, obj)| (id.as_str(), obj)))
}

/// All game objects of a state with the given class name, by id.
pub fn game_objects_named<'a>(
    state: &'a Value,
    name: &'a str,
) -> impl Iterator<Item = (&'a str, &'a Value)> {
    game_objects(state)
        .filter(move |(_, obj)| obj.get("gameObjectName").and_then(Value::as_str) == Some(name))
}

pub fn game_object<'a>(state: &'a Value, id: &str) -> Option<&'a Value> {
    state.get("gameObjects").and_then(|objs| objs.get(id))
}

/// Follows a `{ "id": ... }` reference to the game object it points to.
pub fn resolve_reference<'a>(state: &'a Value, reference: &Value) -> Option<&'a Value> {
    let id = reference.get("id").and_then(Value::as_str)?;
    game_object(state, id)
}

/// The ids of the players of a state, in player order.
pub fn player_ids(state: &Value) -> Vec<String> {
    state
        .get("players")
        .and_then(Value::as_array)
        .map(|players| {
            players
                .iter()
                .filter_map(|p| p.get("id").and_then(Value::as_str).map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use quickcheck::quickcheck;
    use serde_json::json;

    use super::*;

    fn delta(kind: DeltaKind, game: Value) -> Delta {
        Delta {
            kind,
            data: Value::Null,
            game,
        }
    }

    fn gamelog(deltas: Vec<Delta>) -> Gamelog {
        Gamelog {
            game_name: String::from("Checkers"),
            game_session: String::new(),
            constants: GamelogConstants::default(),
            deltas,
            epoch: None,
            random_seed: String::new(),
            winners: Vec::new(),
            losers: Vec::new(),
            streaming: false,
        }
    }

    #[test]
    fn merge_objects_and_removals() {
        let constants = GamelogConstants::default();
        let mut state = json!({ "a": 1, "b": { "c": 2, "d": 3 } });
        merge_delta(
            &mut state,
            &json!({ "a": "&RM", "b": { "c": 5 }, "e": "new" }),
            &constants,
        );
        assert_eq!(state, json!({ "b": { "c": 5, "d": 3 }, "e": "new" }));
    }

    #[test]
    fn merge_lists() {
        let constants = GamelogConstants::default();
        let mut state = json!({});
        merge_delta(
            &mut state,
            &json!({ "players": { "&LEN": 2, "0": { "id": "1" }, "1": { "id": "2" } } }),
            &constants,
        );
        assert_eq!(state, json!({ "players": [{ "id": "1" }, { "id": "2" }] }));

        merge_delta(
            &mut state,
            &json!({ "players": { "&LEN": 1 } }),
            &constants,
        );
        assert_eq!(state, json!({ "players": [{ "id": "1" }] }));

        merge_delta(
            &mut state,
            &json!({ "players": { "0": { "name": "Bot" } } }),
            &constants,
        );
        assert_eq!(state, json!({ "players": [{ "id": "1", "name": "Bot" }] }));
    }

    #[test]
    fn scalars_replace() {
        let constants = GamelogConstants::default();
        let mut state = json!({ "repString": "7/7 r" });
        merge_delta(&mut state, &json!({ "repString": "7/3r3 y" }), &constants);
        assert_eq!(state["repString"], json!("7/3r3 y"));
    }

    #[test]
    fn history_states() {
        let log = gamelog(vec![
            delta(DeltaKind::Start, json!({ "currentTurn": 0, "gameObjects": { "0": { "id": "0", "gameObjectName": "Player" } }, "players": { "&LEN": 1, "0": { "id": "0" } } })),
            delta(DeltaKind::Order, json!({})),
            delta(DeltaKind::Finished, json!({ "currentTurn": 1 })),
            delta(DeltaKind::Other(String::from("over")), Value::Null),
        ]);
        let history = StateHistory::build(&log).unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history.state(1).unwrap()["currentTurn"], json!(0));
        assert_eq!(history.state(3).unwrap()["currentTurn"], json!(1));
        assert_eq!(history.turn_starts(), &[2]);
        assert_eq!(player_ids(history.state(0).unwrap()), vec![String::from("0")]);

        let around = history.state_at(1);
        assert_eq!(around.index, 1);
        assert_eq!(around.delta.kind, DeltaKind::Order);
        assert_eq!(around.next_delta.unwrap().kind, DeltaKind::Finished);

        let last = history.state_at(17);
        assert_eq!(last.index, 3);
        assert!(last.next_game.is_none());
        assert!(last.next_delta.is_none());
    }

    #[test]
    fn turns_from_finished_deltas() {
        let log = gamelog(vec![
            delta(DeltaKind::Start, json!({})),
            delta(DeltaKind::Order, json!({})),
            delta(DeltaKind::Finished, json!({})),
            delta(DeltaKind::Order, json!({})),
            delta(DeltaKind::Finished, json!({})),
            delta(DeltaKind::Over, json!({})),
        ]);
        let history = StateHistory::build(&log).unwrap();
        assert_eq!(history.turn_starts(), &[2, 4]);
        assert_eq!(next_turn_index(history.turn_starts(), 0, 6), 2);
        assert_eq!(next_turn_index(history.turn_starts(), 2, 6), 4);
        assert_eq!(next_turn_index(history.turn_starts(), 4, 6), 5);
        assert_eq!(previous_turn_index(history.turn_starts(), 5), 4);
        assert_eq!(previous_turn_index(history.turn_starts(), 4), 2);
        assert_eq!(previous_turn_index(history.turn_starts(), 2), 0);
    }

    #[test]
    fn references() {
        let state = json!({
            "gameObjects": {
                "1": { "id": "1", "gameObjectName": "Checker", "owner": { "id": "0" } },
                "0": { "id": "0", "gameObjectName": "Player", "name": "Bot" },
            }
        });
        let checker = game_object(&state, "1").unwrap();
        let owner = resolve_reference(&state, &checker["owner"]).unwrap();
        assert_eq!(owner["name"], json!("Bot"));
        assert_eq!(game_objects_named(&state, "Checker").count(), 1);
        assert_eq!(game_objects(&state).count(), 2);
        assert!(resolve_reference(&state, &json!({ "id": "9" })).is_none());
    }

    /// Turn starts worked out from the whole history at once.
    fn turn_starts_of(history: &StateHistory) -> Vec<usize> {
        let states: Vec<&Value> = (0..history.len()).filter_map(|i| history.state(i)).collect();
        if states.iter().any(|s| s.get("currentTurn").is_some()) {
            (1..states.len())
                .filter(|&i| states[i].get("currentTurn") != states[i - 1].get("currentTurn"))
                .collect()
        } else {
            (1..history.len())
                .filter(|&i| history.delta(i).unwrap().kind == DeltaKind::Finished)
                .collect()
        }
    }

    #[test]
    fn turn_numbers_appearing_late() {
        let log = gamelog(vec![
            delta(DeltaKind::Start, json!({})),
            delta(DeltaKind::Finished, json!({})),
            delta(DeltaKind::Order, json!({})),
            delta(DeltaKind::Finished, json!({ "currentTurn": 1 })),
            delta(DeltaKind::Finished, json!({})),
            delta(DeltaKind::Finished, json!({ "currentTurn": 2 })),
        ]);
        let history = StateHistory::build(&log).unwrap();
        assert_eq!(history.turn_starts(), &[3, 5]);
        assert_eq!(history.turn_starts(), turn_starts_of(&history).as_slice());
    }

    #[test]
    fn long_lists_are_cut_short() {
        let constants = GamelogConstants::default();
        let mut state = json!({});
        merge_delta(
            &mut state,
            &json!({ "tiles": { "&LEN": 1_000_000_000_000u64, "99999999999": 1, "2": 5 } }),
            &constants,
        );
        let tiles = state["tiles"].as_array().unwrap();
        assert_eq!(tiles.len(), MAX_LIST_LENGTH);
        assert_eq!(tiles[2], json!(5));
    }

    quickcheck! {
        fn pushed_turn_starts_match_the_whole_history(steps: Vec<(bool, Option<u8>)>) -> bool {
            let mut history = StateHistory::build(&gamelog(vec![delta(DeltaKind::Start, json!({}))])).unwrap();
            for (finished, turn) in steps {
                let kind = if finished { DeltaKind::Finished } else { DeltaKind::Order };
                let game = match turn {
                    Some(turn) => json!({ "currentTurn": turn % 4 }),
                    None => json!({}),
                };
                history.push(delta(kind, game));
                if history.turn_starts() != turn_starts_of(&history).as_slice() {
                    return false;
                }
            }
            true
        }

        fn merging_a_state_into_itself_is_identity(keys: Vec<(String, i32)>) -> bool {
            let constants = GamelogConstants::default();
            let map: Map<String, Value> = keys
                .into_iter()
                .filter(|(k, _)| k.as_str() != constants.delta_list_length)
                .map(|(k, v)| (k, json!(v)))
                .collect();
            let mut state = Value::Object(map.clone());
            merge_delta(&mut state, &Value::Object(map.clone()), &constants);
            state == Value::Object(map)
        }

        fn next_turn_is_after_and_in_range(starts: Vec<usize>, index: usize, n: usize) -> bool {
            let n = n % 500 + 1;
            let index = index % n;
            let mut starts: Vec<usize> = starts.into_iter().map(|s| s % n).collect();
            starts.sort_unstable();
            starts.dedup();
            let next = next_turn_index(&starts, index, n);
            let prev = previous_turn_index(&starts, index);
            next < n && (next > index || next == n - 1) && prev <= index
        }
    }
}
