use rand::Rng;
use serde_json::Value;

use crate::easing::{ease, Easing};
use crate::game::rep_string::parse_ranks;
use crate::game::{GameContext, GameRenderer, PlayerRef, StateFrame};
use crate::games::rep_string;
use crate::renderer::{RendererSize, Resource, Resources, SpriteId, SpriteOptions};
use crate::{Color, DeltaKind};

const BOARD: usize = 10;
const INITIAL_REP_STRING: &str = "3q2q3/10/10/q8q/10/10/Q8Q/10/10/3Q2Q3 Q";

static RESOURCES: Resources = Resources::new(&[
    Resource::tile("grass_plain", Color::rgb(0x5d, 0x9b, 0x3a)),
    Resource::tile("grass_flipped", Color::rgb(0x56, 0x93, 0x35)),
    Resource::tile("earth_cracky", Color::rgb(0x8b, 0x65, 0x3e)),
    Resource::tile("earth_pebbly", Color::rgb(0x86, 0x62, 0x3f)),
    Resource::tile("earth_plain1", Color::rgb(0x91, 0x6b, 0x43)),
    Resource::tile("earth_plain2", Color::rgb(0x8e, 0x68, 0x40)),
    Resource::tile("earth_weedy", Color::rgb(0x7f, 0x6a, 0x3a)),
    Resource::tile("earth_rocky", Color::rgb(0x83, 0x60, 0x45)),
    Resource::glyph("valkyrie", '♛', Color::WHITE),
    Resource::glyph("legionary", '♚', Color::WHITE),
    Resource::arrow("arrow", Color::rgb(0xe8, 0xe0, 0xc8)),
    Resource::glyph("x", '✖', Color::rgb(0xc0, 0x1c, 0x1c)),
]);

const GRASS: [&str; 2] = ["grass_plain", "grass_flipped"];
const EARTH: [&str; 6] = [
    "earth_cracky",
    "earth_pebbly",
    "earth_plain1",
    "earth_plain2",
    "earth_weedy",
    "earth_rocky",
];

/// A finished move, as screen positions of the squares.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AmazonsMove {
    pub from: (f64, f64),
    pub to: (f64, f64),
    pub arrow: (f64, f64),
}

/// Parses a move like `d1d7g7`, the square moved from, the square moved to
/// and the square the arrow burns. Ranks may be more than one digit.
pub fn parse_move(s: &str) -> Option<AmazonsMove> {
    let mut squares = Vec::with_capacity(3);
    let mut chars = s.trim().chars().peekable();
    while let Some(file) = chars.next() {
        let column = "abcdefghij".find(file)?;
        let mut rank = 0usize;
        let mut digits = 0;
        while let Some(digit) = chars.peek().and_then(|c| c.to_digit(10)) {
            rank = rank.checked_mul(10)?.checked_add(digit as usize)?;
            digits += 1;
            chars.next();
        }
        if digits == 0 || rank == 0 || rank > BOARD {
            return None;
        }
        squares.push(square_position(column, BOARD - rank));
    }
    match squares[..] {
        [from, to, arrow] => Some(AmazonsMove { from, to, arrow }),
        _ => None,
    }
}

/// Rank 10 is the top row, row 0 of the rep string.
fn square_position(column: usize, row: usize) -> (f64, f64) {
    ((column + 1) as f64, (row + 1) as f64)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PieceKind {
    Valkyrie,
    Legionary,
    Burned,
}

fn piece_list(rep: &str) -> Vec<(PieceKind, (f64, f64))> {
    let rep = if rep.is_empty() { INITIAL_REP_STRING } else { rep };
    let mut pieces = Vec::new();
    for (row, rank) in parse_ranks(rep).iter().enumerate() {
        for (column, square) in rank.iter().enumerate() {
            let kind = match square {
                Some('Q') => PieceKind::Valkyrie,
                Some('q') => PieceKind::Legionary,
                Some('X') => PieceKind::Burned,
                _ => continue,
            };
            pieces.push((kind, square_position(column, row)));
        }
    }
    pieces
}

/// Queens move and shoot arrows on a 10 by 10 board, burning the square the
/// arrow lands on.
pub struct Amazons {
    valkyries: Vec<SpriteId>,
    legionaries: Vec<SpriteId>,
    arrow: Option<SpriteId>,
    burned: Vec<SpriteId>,
}

impl Amazons {
    pub fn new() -> Self {
        Self {
            valkyries: Vec::with_capacity(4),
            legionaries: Vec::with_capacity(4),
            arrow: None,
            burned: Vec::new(),
        }
    }

    /// Shows a burned square, reusing a sprite from the pool if there is one.
    fn burn(&mut self, ctx: &mut GameContext<'_>, index: usize, (x, y): (f64, f64)) -> anyhow::Result<()> {
        match self.burned.get(index) {
            Some(&sprite) => {
                ctx.scene.set_position(sprite, x, y);
                ctx.scene.set_visible(sprite, true);
            }
            None => {
                let sprite = ctx.sprite("game", "x", SpriteOptions::at(x, y))?;
                self.burned.push(sprite);
            }
        }
        Ok(())
    }
}

impl Default for Amazons {
    fn default() -> Self {
        Self::new()
    }
}

/// Moves each sprite onto its piece, easing the one that moves.
fn place_pieces(
    ctx: &mut GameContext<'_>,
    sprites: &[SpriteId],
    positions: &[(f64, f64)],
    movement: Option<AmazonsMove>,
    dt: f64,
) {
    for (index, &sprite) in sprites.iter().enumerate() {
        let Some(&(x, y)) = positions.get(index) else {
            ctx.scene.set_visible(sprite, false);
            continue;
        };
        let (x, y) = match movement {
            Some(m) if m.from == (x, y) => {
                let t = (dt * 2.0).min(1.0);
                (
                    ease(m.from.0, m.to.0, t, Easing::CubicInOut),
                    ease(m.from.1, m.to.1, t, Easing::CubicInOut),
                )
            }
            _ => (x, y),
        };
        ctx.scene.set_position(sprite, x, y);
        ctx.scene.set_visible(sprite, true);
    }
}

impl GameRenderer for Amazons {
    fn name(&self) -> &'static str {
        "Amazons"
    }

    fn default_player_colors(&self) -> Vec<Color> {
        vec![Color::WHITE, Color::WHITE]
    }

    fn resources(&self) -> &'static Resources {
        &RESOURCES
    }

    fn size(&self, _state: &Value) -> RendererSize {
        RendererSize::new(12.0, 12.0)
    }

    fn start(&mut self, ctx: &mut GameContext<'_>, state: &Value) -> anyhow::Result<()> {
        let valkyrie = ctx.player_color(PlayerRef::Index(0))?;
        let legionary = ctx.player_color(PlayerRef::Index(1))?;
        for (kind, (x, y)) in piece_list(rep_string(state)) {
            match kind {
                PieceKind::Valkyrie => self.valkyries.push(ctx.sprite(
                    "game",
                    "valkyrie",
                    SpriteOptions::at(x, y).tint(valkyrie),
                )?),
                PieceKind::Legionary => self.legionaries.push(ctx.sprite(
                    "game",
                    "legionary",
                    SpriteOptions::at(x, y).tint(legionary),
                )?),
                PieceKind::Burned => {}
            }
        }
        self.arrow = Some(ctx.sprite(
            "game",
            "arrow",
            SpriteOptions::at(0.0, 0.0)
                .anchor(0.5, 0.5)
                .scaled(0.5)
                .hidden(),
        )?);
        Ok(())
    }

    fn create_background(&mut self, ctx: &mut GameContext<'_>, _state: &Value) -> anyhow::Result<()> {
        for i in 0..BOARD {
            for j in 0..BOARD {
                let tile = if i % 2 == j % 2 {
                    GRASS[ctx.rng.gen_range(0..GRASS.len())]
                } else {
                    EARTH[ctx.rng.gen_range(0..EARTH.len())]
                };
                ctx.sprite(
                    "background",
                    tile,
                    SpriteOptions::at((i + 1) as f64, (j + 1) as f64),
                )?;
            }
        }
        Ok(())
    }

    fn render_background(
        &mut self,
        ctx: &mut GameContext<'_>,
        dt: f64,
        frame: &StateFrame<'_>,
    ) -> anyhow::Result<()> {
        let movement = frame
            .next_delta
            .filter(|d| d.kind == DeltaKind::Finished)
            .and_then(|d| d.returned_str())
            .and_then(parse_move);

        let pieces = piece_list(rep_string(frame.current));
        let positions_of = |kind: PieceKind| -> Vec<(f64, f64)> {
            pieces
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|&(_, position)| position)
                .collect()
        };
        place_pieces(ctx, &self.valkyries, &positions_of(PieceKind::Valkyrie), movement, dt);
        place_pieces(ctx, &self.legionaries, &positions_of(PieceKind::Legionary), movement, dt);

        let burned = positions_of(PieceKind::Burned);
        for (index, &position) in burned.iter().enumerate() {
            self.burn(ctx, index, position)?;
        }
        let mut shown = burned.len();

        if let (Some(arrow), Some(m)) = (self.arrow, movement) {
            if dt > 0.5 {
                let t = (dt - 0.5) * 2.0;
                let x = ease(m.to.0 + 0.5, m.arrow.0 + 0.5, t, Easing::CubicInOut);
                let y = ease(m.to.1 + 0.5, m.arrow.1 + 0.5, t, Easing::CubicInOut);
                ctx.scene.set_position(arrow, x, y);
                if let Some(sprite) = ctx.scene.get_mut(arrow) {
                    sprite.rotation = (m.arrow.1 - m.to.1).atan2(m.arrow.0 - m.to.0);
                }
                ctx.scene.set_visible(arrow, true);
            } else {
                ctx.scene.set_visible(arrow, false);
            }
            if dt > 0.9 {
                self.burn(ctx, shown, m.arrow)?;
                shown += 1;
            }
        } else if let Some(arrow) = self.arrow {
            ctx.scene.set_visible(arrow, false);
        }

        for &sprite in self.burned.iter().skip(shown) {
            ctx.scene.set_visible(sprite, false);
        }
        Ok(())
    }

    fn recolor(&mut self, ctx: &mut GameContext<'_>) -> anyhow::Result<()> {
        let valkyrie = ctx.player_color(PlayerRef::Index(0))?;
        let legionary = ctx.player_color(PlayerRef::Index(1))?;
        for &sprite in &self.valkyries {
            ctx.scene.set_tint(sprite, valkyrie);
        }
        for &sprite in &self.legionaries {
            ctx.scene.set_tint(sprite, legionary);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::test_utils::Harness;

    const GAMELOG: &str = r#"{
        "gameName": "Amazons",
        "randomSeed": "amazons",
        "deltas": [
            { "type": "start", "game": { "repString": "3q2q3/10/10/q8q/10/10/Q8Q/10/10/3Q2Q3 Q" } },
            { "type": "finished", "data": { "returned": "d1d7g7" },
              "game": { "repString": "3q2q3/10/10/q2Q2X2q/10/10/Q8Q/10/10/6Q3 q" } }
        ]
    }"#;

    #[test]
    fn moves() {
        assert_eq!(
            parse_move("d1d7g7"),
            Some(AmazonsMove {
                from: (4.0, 10.0),
                to: (4.0, 4.0),
                arrow: (7.0, 4.0),
            })
        );
        assert_eq!(
            parse_move("a10j1b2").map(|m| (m.from, m.to, m.arrow)),
            Some(((1.0, 1.0), (10.0, 10.0), (2.0, 9.0)))
        );
        assert_eq!(parse_move("d1d7"), None);
        assert_eq!(parse_move("k1d7g7"), None);
        assert_eq!(parse_move("d11d7g7"), None);
        assert_eq!(parse_move("d99999999999999999999999d7g7"), None);
    }

    #[test]
    fn start_position() {
        let pieces = piece_list("");
        assert_eq!(pieces.len(), 8);
        assert!(pieces.contains(&(PieceKind::Valkyrie, (4.0, 10.0))));
        assert!(pieces.contains(&(PieceKind::Legionary, (1.0, 4.0))));
    }

    #[test]
    fn queen_moves_then_arrow_flies() {
        let mut harness = Harness::new(GAMELOG);
        assert_eq!(harness.visible("valkyrie").len(), 4);
        assert_eq!(harness.scene.layers()[0].sprites().len(), 100);

        harness.render(0, 0.25);
        let moving: Vec<_> = harness
            .visible("valkyrie")
            .iter()
            .map(|s| s.position)
            .filter(|&(x, _)| x == 4.0)
            .collect();
        assert_eq!(moving, vec![(4.0, 7.0)]);
        assert!(harness.visible("arrow").is_empty());
        assert!(harness.visible("x").is_empty());

        harness.render(0, 0.95);
        let arrow = harness.visible("arrow");
        assert_eq!(arrow.len(), 1);
        assert_eq!(arrow[0].glyph(), '→');
        assert_eq!(harness.visible("x").len(), 1);

        // the burned square is part of the next state
        harness.render(1, 0.0);
        let burned = harness.visible("x");
        assert_eq!(burned.len(), 1);
        assert_eq!(burned[0].position, (7.0, 4.0));
        assert!(harness.visible("arrow").is_empty());
    }

    #[test]
    fn background_follows_the_seed() {
        let tiles = |harness: &Harness| -> Vec<&'static str> {
            harness
                .scene
                .draw_order()
                .filter(|s| s.resource.key.starts_with("grass") || s.resource.key.starts_with("earth"))
                .map(|s| s.resource.key)
                .collect()
        };
        let a = Harness::new(GAMELOG);
        let b = Harness::new(GAMELOG);
        assert_eq!(tiles(&a), tiles(&b));
    }
}
