use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use tracing::{debug, trace};

use crate::games::{Amazons, Catastrophe, Checkers, ConnectFour, UltimateTicTacToe};
use crate::history::{game_objects, player_ids};
use crate::renderer::{RendererSize, Resources, Scene, SpriteId, SpriteOptions};
use crate::{Color, Delta, NotAPlayer, SceneError, Settings, UnknownGame, ViseurGameState};

pub mod rep_string;

/// Player colors used when a game brings none of its own.
pub const DEFAULT_PLAYER_COLORS: [Color; 2] = [Color::rgb(0xcc, 0x33, 0x33), Color::rgb(0x33, 0x33, 0xcc)];

pub const DEFAULT_LAYER_ORDER: &[&str] = &["background", "game", "ui"];

/// The states a game draws from. `current` and `next` stand in for each
/// other when one of them is missing.
#[derive(Clone, Copy, Debug)]
pub struct StateFrame<'a> {
    pub current: &'a Value,
    pub next: &'a Value,
    /// The delta that produced `current`.
    pub delta: Option<&'a Delta>,
    /// The delta that turns `current` into `next`.
    pub next_delta: Option<&'a Delta>,
}

/// A player, by their index or by the id of their game object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerRef<'a> {
    Index(usize),
    Id(&'a str),
}

/// Resolves player colors, preferring the user's custom colors when that
/// setting is on.
#[derive(Clone, Debug, Default)]
pub struct PlayerColors {
    defaults: Vec<Color>,
    custom: bool,
    custom_colors: Vec<Color>,
    /// Player ids, by player index.
    players: Vec<String>,
    /// The class name of every game object seen so far, by id.
    objects: BTreeMap<String, String>,
}

impl PlayerColors {
    pub fn new(defaults: Vec<Color>, settings: &Settings) -> Self {
        Self {
            defaults,
            custom: settings.custom_player_colors,
            custom_colors: settings.player_colors.clone(),
            players: Vec::new(),
            objects: BTreeMap::new(),
        }
    }

    pub fn update_settings(&mut self, settings: &Settings) {
        self.custom = settings.custom_player_colors;
        self.custom_colors = settings.player_colors.clone();
    }

    pub fn default_color(&self, index: usize) -> Color {
        if self.defaults.is_empty() {
            return DEFAULT_PLAYER_COLORS[index % DEFAULT_PLAYER_COLORS.len()];
        }
        self.defaults[index % self.defaults.len()]
    }

    pub fn color(&self, player: PlayerRef<'_>) -> Result<Color, NotAPlayer> {
        let index = match player {
            PlayerRef::Index(index) => index,
            PlayerRef::Id(id) => self.player_index(id)?,
        };
        let custom = self
            .custom
            .then(|| self.custom_colors.get(index).copied())
            .flatten();
        Ok(custom.unwrap_or_else(|| self.default_color(index)))
    }

    fn player_index(&self, id: &str) -> Result<usize, NotAPlayer> {
        let not_a_player = || NotAPlayer { id: String::from(id) };
        if self.objects.get(id).map(String::as_str) != Some("Player") {
            return Err(not_a_player());
        }
        self.players
            .iter()
            .position(|p| p == id)
            .ok_or_else(not_a_player)
    }

    /// Remembers the players and game objects of a state, returning the ids
    /// of objects that were not known before.
    fn observe(&mut self, state: &Value) -> Vec<String> {
        let players = player_ids(state);
        if !players.is_empty() {
            self.players = players;
        }
        let mut new_ids = Vec::new();
        for (id, object) in game_objects(state) {
            if self.objects.contains_key(id) {
                continue;
            }
            let name = object
                .get("gameObjectName")
                .and_then(Value::as_str)
                .unwrap_or_default();
            self.objects.insert(String::from(id), String::from(name));
            new_ids.push(String::from(id));
        }
        new_ids
    }

    pub fn known_objects(&self) -> impl Iterator<Item = (&str, &str)> {
        self.objects.iter().map(|(id, name)| (id.as_str(), name.as_str()))
    }
}

/// What a game gets to work with while drawing.
pub struct GameContext<'a> {
    pub scene: &'a mut Scene,
    pub resources: &'static Resources,
    /// Seeded from the gamelog, so a gamelog always looks the same.
    pub rng: &'a mut StdRng,
    pub colors: &'a PlayerColors,
}

impl GameContext<'_> {
    pub fn sprite(
        &mut self,
        layer: &str,
        key: &str,
        options: SpriteOptions,
    ) -> Result<SpriteId, SceneError> {
        self.resources.new_sprite(self.scene, layer, key, options)
    }

    pub fn player_color(&self, player: PlayerRef<'_>) -> Result<Color, NotAPlayer> {
        self.colors.color(player)
    }
}

/// Draws one game.
///
/// Every hook but the sizing ones has an empty default, so games only
/// implement what they draw.
pub trait GameRenderer {
    fn name(&self) -> &'static str;

    fn number_of_players(&self) -> usize {
        2
    }

    fn default_player_colors(&self) -> Vec<Color> {
        DEFAULT_PLAYER_COLORS.to_vec()
    }

    fn layer_order(&self) -> &'static [&'static str] {
        DEFAULT_LAYER_ORDER
    }

    fn resources(&self) -> &'static Resources;

    /// The size of the game in game units, read from the first state.
    fn size(&self, state: &Value) -> RendererSize;

    /// Creates the sprites the game keeps around.
    fn start(&mut self, _ctx: &mut GameContext<'_>, _state: &Value) -> anyhow::Result<()> {
        Ok(())
    }

    fn create_background(&mut self, _ctx: &mut GameContext<'_>, _state: &Value) -> anyhow::Result<()> {
        Ok(())
    }

    /// Draws the board at `dt` of the way from `frame.current` to
    /// `frame.next`.
    fn render_background(
        &mut self,
        _ctx: &mut GameContext<'_>,
        _dt: f64,
        _frame: &StateFrame<'_>,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Draws the game objects, after the background.
    fn render(&mut self, _ctx: &mut GameContext<'_>, _dt: f64, _frame: &StateFrame<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// The current state changed.
    fn state_updated(&mut self, _ctx: &mut GameContext<'_>, _frame: &StateFrame<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// The player colors changed.
    fn recolor(&mut self, _ctx: &mut GameContext<'_>) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Drives a [`GameRenderer`]: keeps the states around the current index and
/// hands them to the game once it has started.
pub struct BaseGame {
    game: Box<dyn GameRenderer>,
    rng: StdRng,
    colors: PlayerColors,
    started: bool,
    current: Option<Value>,
    next: Option<Value>,
    delta: Option<Delta>,
    next_delta: Option<Delta>,
}

/// Borrows the parts of a [`BaseGame`] that a [`GameContext`] needs, leaving
/// the game itself free to be borrowed mutably.
macro_rules! context {
    ($self:ident, $scene:expr) => {
        GameContext {
            scene: $scene,
            resources: $self.game.resources(),
            rng: &mut $self.rng,
            colors: &$self.colors,
        }
    };
}

macro_rules! frame {
    ($self:ident) => {
        match $self.current.as_ref().or($self.next.as_ref()) {
            None => None,
            Some(current) => Some(StateFrame {
                current,
                next: $self.next.as_ref().unwrap_or(current),
                delta: $self.delta.as_ref(),
                next_delta: $self.next_delta.as_ref(),
            }),
        }
    };
}

impl BaseGame {
    pub fn new(game: Box<dyn GameRenderer>, random_seed: &str, settings: &Settings) -> Self {
        let colors = PlayerColors::new(game.default_player_colors(), settings);
        Self {
            game,
            rng: StdRng::seed_from_u64(seed_from_str(random_seed)),
            colors,
            started: false,
            current: None,
            next: None,
            delta: None,
            next_delta: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.game.name()
    }

    pub fn number_of_players(&self) -> usize {
        self.game.number_of_players()
    }

    pub fn layer_order(&self) -> &'static [&'static str] {
        self.game.layer_order()
    }

    pub fn size(&self, state: &Value) -> RendererSize {
        self.game.size(state)
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn colors(&self) -> &PlayerColors {
        &self.colors
    }

    pub fn player_color(&self, player: PlayerRef<'_>) -> Result<Color, NotAPlayer> {
        self.colors.color(player)
    }

    pub fn current_state(&self) -> Option<&Value> {
        self.current.as_ref().or(self.next.as_ref())
    }

    /// Starts drawing at `state`, creating the game's sprites and
    /// background.
    pub fn start(&mut self, scene: &mut Scene, state: ViseurGameState<'_>) -> anyhow::Result<()> {
        self.started = true;
        self.store(state);
        debug!(game = self.game.name(), index = state.index, "Starting game");
        {
            let mut ctx = context!(self, &mut *scene);
            self.game.start(&mut ctx, state.game)?;
            self.game.create_background(&mut ctx, state.game)?;
        }
        self.state_updated(scene)
    }

    /// The current state changed. Ignored until the game has started.
    pub fn update(&mut self, scene: &mut Scene, state: ViseurGameState<'_>) -> anyhow::Result<()> {
        if !self.started {
            return Ok(());
        }
        self.store(state);
        self.state_updated(scene)
    }

    fn store(&mut self, state: ViseurGameState<'_>) {
        self.current = Some(state.game.clone());
        self.next = state.next_game.cloned();
        self.delta = Some(state.delta.clone());
        self.next_delta = state.next_delta.cloned();
    }

    fn state_updated(&mut self, scene: &mut Scene) -> anyhow::Result<()> {
        let mut new_ids = Vec::new();
        for state in [self.current.as_ref(), self.next.as_ref()].into_iter().flatten() {
            new_ids.extend(self.colors.observe(state));
        }
        if !new_ids.is_empty() {
            trace!(count = new_ids.len(), "New game objects");
        }
        let Some(frame) = frame!(self) else {
            return Ok(());
        };
        let mut ctx = context!(self, scene);
        self.game.state_updated(&mut ctx, &frame)?;
        if !new_ids.is_empty() {
            self.game.recolor(&mut ctx)?;
        }
        Ok(())
    }

    /// Draws the transition from the current to the next state, `dt` of the
    /// way through.
    pub fn render(&mut self, scene: &mut Scene, index: usize, dt: f64) -> anyhow::Result<()> {
        if !self.started {
            return Ok(());
        }
        let Some(frame) = frame!(self) else {
            return Ok(());
        };
        trace!(index, dt, "Rendering");
        let mut ctx = context!(self, scene);
        self.game.render_background(&mut ctx, dt, &frame)?;
        self.game.render(&mut ctx, dt, &frame)
    }

    /// Picks up changed player color settings.
    pub fn recolor(&mut self, scene: &mut Scene, settings: &Settings) -> anyhow::Result<()> {
        self.colors.update_settings(settings);
        if !self.started {
            return Ok(());
        }
        let mut ctx = context!(self, scene);
        self.game.recolor(&mut ctx)
    }
}

/// FNV-1a, so the same seed string gives the same rng on every platform.
fn seed_from_str(seed: &str) -> u64 {
    seed.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

/// Finds the renderer for a game. Case and punctuation are ignored, so
/// "Connect Four" and "connect-four" both find [`ConnectFour`].
pub fn game_for_name(name: &str) -> Result<Box<dyn GameRenderer>, UnknownGame> {
    let normalized: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let game: Box<dyn GameRenderer> = match normalized.as_str() {
        "amazons" => Box::new(Amazons::new()),
        "catastrophe" => Box::new(Catastrophe::new()),
        "checkers" => Box::new(Checkers::new()),
        "connectfour" => Box::new(ConnectFour::new()),
        "ultimatetictactoe" => Box::new(UltimateTicTacToe::new()),
        _ => return Err(UnknownGame(String::from(name))),
    };
    Ok(game)
}

/// The names [`game_for_name`] knows.
pub const GAME_NAMES: [&str; 5] = [
    "Amazons",
    "Catastrophe",
    "Checkers",
    "ConnectFour",
    "UltimateTicTacToe",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::Resource;
    use crate::{Gamelog, StateHistory};

    static RESOURCES: Resources = Resources::new(&[Resource::glyph("piece", '●', Color::WHITE)]);

    /// Counts the calls it receives.
    #[derive(Default)]
    struct Probe {
        started: usize,
        updates: usize,
        renders: Vec<f64>,
        recolors: usize,
    }

    impl GameRenderer for Probe {
        fn name(&self) -> &'static str {
            "Probe"
        }

        fn resources(&self) -> &'static Resources {
            &RESOURCES
        }

        fn size(&self, _state: &Value) -> RendererSize {
            RendererSize::new(3.0, 3.0)
        }

        fn start(&mut self, ctx: &mut GameContext<'_>, _state: &Value) -> anyhow::Result<()> {
            self.started += 1;
            ctx.sprite("game", "piece", SpriteOptions::default())?;
            Ok(())
        }

        fn render_background(
            &mut self,
            _ctx: &mut GameContext<'_>,
            dt: f64,
            _frame: &StateFrame<'_>,
        ) -> anyhow::Result<()> {
            self.renders.push(dt);
            Ok(())
        }

        fn state_updated(&mut self, _ctx: &mut GameContext<'_>, _frame: &StateFrame<'_>) -> anyhow::Result<()> {
            self.updates += 1;
            Ok(())
        }

        fn recolor(&mut self, _ctx: &mut GameContext<'_>) -> anyhow::Result<()> {
            self.recolors += 1;
            Ok(())
        }
    }

    fn history() -> StateHistory {
        let gamelog: Gamelog = r#"{
            "gameName": "Probe",
            "deltas": [
                { "type": "start", "game": {
                    "players": { "&LEN": 2, "0": { "id": "1" }, "1": { "id": "2" } },
                    "gameObjects": {
                        "1": { "id": "1", "gameObjectName": "Player" },
                        "2": { "id": "2", "gameObjectName": "Player" },
                        "3": { "id": "3", "gameObjectName": "Checker" }
                    }
                } },
                { "type": "finished", "game": { "currentTurn": 1 } }
            ]
        }"#
        .parse()
        .unwrap();
        StateHistory::build(&gamelog).unwrap()
    }

    #[test]
    fn updates_are_ignored_until_started() {
        let history = history();
        let mut scene = Scene::default();
        let mut game = BaseGame::new(Box::new(Probe::default()), "seed", &Settings::default());
        game.update(&mut scene, history.state_at(1)).unwrap();
        game.render(&mut scene, 1, 0.5).unwrap();
        assert!(!game.is_started());
        assert!(scene.is_empty());

        game.start(&mut scene, history.state_at(0)).unwrap();
        assert!(game.is_started());
        assert_eq!(scene.len(), 1);
        game.render(&mut scene, 0, 0.25).unwrap();
        assert_eq!(
            game.current_state().and_then(|s| s.get("currentTurn")),
            None
        );
    }

    #[test]
    fn player_colors() {
        let history = history();
        let mut scene = Scene::default();
        let mut settings = Settings::default();
        let mut game = BaseGame::new(Box::new(Probe::default()), "", &settings);
        game.start(&mut scene, history.state_at(0)).unwrap();

        assert_eq!(game.player_color(PlayerRef::Index(1)), Ok(DEFAULT_PLAYER_COLORS[1]));
        assert_eq!(game.player_color(PlayerRef::Id("1")), Ok(DEFAULT_PLAYER_COLORS[0]));
        assert_eq!(
            game.player_color(PlayerRef::Id("3")),
            Err(NotAPlayer { id: String::from("3") })
        );
        assert!(game.player_color(PlayerRef::Id("404")).is_err());

        settings.player_colors = vec![Color::BLACK];
        game.recolor(&mut scene, &settings).unwrap();
        assert_eq!(game.player_color(PlayerRef::Id("1")), Ok(Color::BLACK));
        assert_eq!(game.player_color(PlayerRef::Index(1)), Ok(DEFAULT_PLAYER_COLORS[1]));

        settings.custom_player_colors = false;
        game.recolor(&mut scene, &settings).unwrap();
        assert_eq!(game.player_color(PlayerRef::Index(0)), Ok(DEFAULT_PLAYER_COLORS[0]));
    }

    #[test]
    fn same_seed_same_rng() {
        use rand::Rng;
        let seeded = |seed: &str| StdRng::seed_from_u64(seed_from_str(seed)).gen::<u64>();
        assert_eq!(seeded("abc"), seeded("abc"));
        assert_ne!(seeded("abc"), seeded("abd"));
    }

    #[test]
    fn game_names() {
        for name in GAME_NAMES {
            assert_eq!(game_for_name(name).map(|g| g.name()), Ok(name));
        }
        assert_eq!(game_for_name("connect-four").map(|g| g.name()), Ok("ConnectFour"));
        assert_eq!(
            game_for_name("Chess").map(|g| g.name()),
            Err(UnknownGame(String::from("Chess")))
        );
    }
}
