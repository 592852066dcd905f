//! The renderers of every supported game.

use serde_json::Value;

mod amazons;
mod catastrophe;
mod checkers;
mod connect_four;
mod ultimate_tic_tac_toe;

pub use amazons::Amazons;
pub use catastrophe::Catastrophe;
pub use checkers::Checkers;
pub use connect_four::ConnectFour;
pub use ultimate_tic_tac_toe::UltimateTicTacToe;

/// The `repString` of a state, empty if it has none.
fn rep_string(state: &Value) -> &str {
    state
        .get("repString")
        .and_then(Value::as_str)
        .unwrap_or_default()
}

/// The id a `{ "id": ... }` reference points to.
fn reference_id(reference: Option<&Value>) -> Option<&str> {
    reference?.get("id").and_then(Value::as_str)
}

/// `x` and `y` of a game object.
fn object_position(object: &Value) -> Option<(f64, f64)> {
    let x = object.get("x").and_then(Value::as_f64)?;
    let y = object.get("y").and_then(Value::as_f64)?;
    Some((x, y))
}
