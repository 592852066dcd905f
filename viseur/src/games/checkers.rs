use std::collections::BTreeMap;

use rand::Rng;
use serde_json::Value;

use crate::easing::lerp;
use crate::game::{GameContext, GameRenderer, PlayerRef, StateFrame};
use crate::games::{object_position, reference_id};
use crate::history::{game_object, game_objects_named};
use crate::renderer::{RendererSize, Resource, Resources, SpriteId, SpriteOptions};
use crate::utils::{get_bool, get_f64};
use crate::Color;

static RESOURCES: Resources = Resources::new(&[
    Resource::tile("tile_black", Color::BLACK),
    Resource::tile("tile_red", Color::rgb(0xff, 0, 0)),
    Resource::glyph("checker", '●', Color::WHITE),
    Resource::glyph("crown", '♔', Color::rgb(0xff, 0xd7, 0x00)),
]);

const DEFAULT_BOARD: f64 = 8.0;

#[derive(Clone, Debug)]
struct CheckerSprites {
    body: SpriteId,
    crown: SpriteId,
    owner: Option<String>,
}

/// Checkers are game objects that slide between squares and get crowned.
pub struct Checkers {
    checkers: BTreeMap<String, CheckerSprites>,
}

impl Checkers {
    pub fn new() -> Self {
        Self {
            checkers: BTreeMap::new(),
        }
    }
}

impl Default for Checkers {
    fn default() -> Self {
        Self::new()
    }
}

fn board_size(state: &Value) -> (usize, usize) {
    let dimension = |key| get_f64(state, key).unwrap_or(DEFAULT_BOARD).max(1.0) as usize;
    (dimension("boardWidth"), dimension("boardHeight"))
}

/// The tile colors pulled towards a hue picked by the seeded rng.
pub fn background_tint(hue: f64, black: bool) -> Color {
    let random_color = Color::from_hsl(hue, 60.0, 40.0).whiten(1.5);
    let base = if black { Color::BLACK } else { Color::rgb(0xff, 0, 0) };
    base.mix(random_color, 0.85)
}

fn owner_color(ctx: &GameContext<'_>, owner: Option<&str>) -> anyhow::Result<Color> {
    match owner {
        Some(owner) => Ok(ctx.player_color(PlayerRef::Id(owner))?),
        None => Ok(Color::WHITE),
    }
}

impl GameRenderer for Checkers {
    fn name(&self) -> &'static str {
        "Checkers"
    }

    fn default_player_colors(&self) -> Vec<Color> {
        vec![Color::rgb(0xc9, 0x2b, 0x10), Color::rgb(0x3a, 0x3a, 0x3a)]
    }

    fn resources(&self) -> &'static Resources {
        &RESOURCES
    }

    fn size(&self, state: &Value) -> RendererSize {
        let (width, height) = board_size(state);
        RendererSize::new(width as f64, height as f64)
    }

    fn create_background(&mut self, ctx: &mut GameContext<'_>, state: &Value) -> anyhow::Result<()> {
        let hue = ctx.rng.gen::<f64>() * 360.0;
        let (width, height) = board_size(state);
        for x in 0..width {
            for y in 0..height {
                let black = (x + y) % 2 == 1;
                ctx.sprite(
                    "background",
                    if black { "tile_black" } else { "tile_red" },
                    SpriteOptions::at(x as f64, y as f64).tint(background_tint(hue, black)),
                )?;
            }
        }
        Ok(())
    }

    fn state_updated(&mut self, ctx: &mut GameContext<'_>, frame: &StateFrame<'_>) -> anyhow::Result<()> {
        for state in [frame.current, frame.next] {
            for (id, checker) in game_objects_named(state, "Checker") {
                if self.checkers.contains_key(id) {
                    continue;
                }
                let (x, y) = object_position(checker).unwrap_or_default();
                let owner = reference_id(checker.get("owner"));
                let tint = owner_color(ctx, owner)?;
                let body = ctx.sprite("game", "checker", SpriteOptions::at(x, y).tint(tint))?;
                let crown = ctx.sprite("ui", "crown", SpriteOptions::at(x, y).hidden())?;
                self.checkers.insert(
                    String::from(id),
                    CheckerSprites {
                        body,
                        crown,
                        owner: owner.map(String::from),
                    },
                );
            }
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut GameContext<'_>, dt: f64, frame: &StateFrame<'_>) -> anyhow::Result<()> {
        for (id, sprites) in &self.checkers {
            let current = game_object(frame.current, id);
            let next = game_object(frame.next, id);
            let (Some(current), next) = (current.or(next), next) else {
                ctx.scene.set_visible(sprites.body, false);
                ctx.scene.set_visible(sprites.crown, false);
                continue;
            };
            let from = object_position(current).unwrap_or_default();
            let to = next.and_then(object_position).unwrap_or(from);
            let (x, y) = (lerp(from.0, to.0, dt), lerp(from.1, to.1, dt));
            // captured checkers fade out on their way off the board
            let alpha = if next.is_none() { 1.0 - dt } else { 1.0 };
            let kinged = get_bool(current, "kinged").unwrap_or(false);

            for (sprite, visible) in [(sprites.body, true), (sprites.crown, kinged)] {
                ctx.scene.set_position(sprite, x, y);
                ctx.scene.set_visible(sprite, visible);
                if let Some(sprite) = ctx.scene.get_mut(sprite) {
                    sprite.alpha = alpha;
                }
            }
        }
        Ok(())
    }

    fn recolor(&mut self, ctx: &mut GameContext<'_>) -> anyhow::Result<()> {
        for sprites in self.checkers.values() {
            let tint = owner_color(ctx, sprites.owner.as_deref())?;
            ctx.scene.set_tint(sprites.body, tint);
        }
        Ok(())
    }
}
