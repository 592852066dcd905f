use std::collections::BTreeMap;

use serde_json::Value;

use crate::easing::{ease, Easing};
use crate::game::{GameContext, GameRenderer, PlayerRef, StateFrame};
use crate::games::{object_position, reference_id};
use crate::history::{game_object, game_objects_named};
use crate::renderer::{RendererSize, Resource, Resources, SpriteId, SpriteOptions};
use crate::utils::{get_bool, get_f64};
use crate::Color;

const DEFAULT_MAP: f64 = 10.0;
const UNOWNED: Color = Color::rgb(0x80, 0x80, 0x80);

static RESOURCES: Resources = Resources::new(&[
    Resource::tile("ground", Color::rgb(0xc2, 0xb2, 0x80)),
    Resource::glyph("food", '♣', Color::rgb(0x2e, 0x8b, 0x57)),
    Resource::glyph("structure", '■', Color::WHITE),
    Resource::glyph("unit", '☻', Color::WHITE),
]);

#[derive(Clone, Copy, Debug)]
struct TileSprites {
    food: SpriteId,
    structure: SpriteId,
}

#[derive(Clone, Debug)]
struct UnitSprite {
    sprite: SpriteId,
    owner: Option<String>,
}

/// Units walking a map of tiles, some of which grow food or hold
/// structures.
pub struct Catastrophe {
    tiles: BTreeMap<String, TileSprites>,
    /// The owner of the structure last shown on a tile, by tile id.
    structure_owners: BTreeMap<String, Option<String>>,
    units: BTreeMap<String, UnitSprite>,
}

impl Catastrophe {
    pub fn new() -> Self {
        Self {
            tiles: BTreeMap::new(),
            structure_owners: BTreeMap::new(),
            units: BTreeMap::new(),
        }
    }
}

impl Default for Catastrophe {
    fn default() -> Self {
        Self::new()
    }
}

fn owner_color(ctx: &GameContext<'_>, owner: Option<&str>) -> anyhow::Result<Color> {
    match owner {
        Some(owner) => Ok(ctx.player_color(PlayerRef::Id(owner))?),
        None => Ok(UNOWNED),
    }
}

/// Where a unit stands, following its tile reference.
fn unit_position(state: &Value, unit: &Value) -> Option<(f64, f64)> {
    let tile = reference_id(unit.get("tile"))?;
    game_object(state, tile).and_then(object_position)
}

fn is_alive(unit: &Value) -> bool {
    !get_bool(unit, "dead").unwrap_or(false)
}

impl GameRenderer for Catastrophe {
    fn name(&self) -> &'static str {
        "Catastrophe"
    }

    fn resources(&self) -> &'static Resources {
        &RESOURCES
    }

    fn size(&self, state: &Value) -> RendererSize {
        RendererSize::new(
            get_f64(state, "mapWidth").unwrap_or(DEFAULT_MAP),
            get_f64(state, "mapHeight").unwrap_or(DEFAULT_MAP),
        )
    }

    fn state_updated(&mut self, ctx: &mut GameContext<'_>, frame: &StateFrame<'_>) -> anyhow::Result<()> {
        for state in [frame.current, frame.next] {
            for (id, tile) in game_objects_named(state, "Tile") {
                if self.tiles.contains_key(id) {
                    continue;
                }
                let Some((x, y)) = object_position(tile) else {
                    continue;
                };
                ctx.sprite("background", "ground", SpriteOptions::at(x, y))?;
                let food = ctx.sprite("background", "food", SpriteOptions::at(x, y).hidden())?;
                let structure =
                    ctx.sprite("game", "structure", SpriteOptions::at(x, y).hidden())?;
                self.tiles
                    .insert(String::from(id), TileSprites { food, structure });
            }

            for (id, unit) in game_objects_named(state, "Unit") {
                if self.units.contains_key(id) {
                    continue;
                }
                let owner = reference_id(unit.get("owner")).map(String::from);
                let tint = owner_color(ctx, owner.as_deref())?;
                let sprite = ctx.sprite("game", "unit", SpriteOptions::default().hidden().tint(tint))?;
                self.units
                    .insert(String::from(id), UnitSprite { sprite, owner });
            }
        }

        for (id, sprites) in &self.tiles {
            let tile = game_object(frame.current, id);
            let harvest_rate = tile.and_then(|t| get_f64(t, "harvestRate")).unwrap_or(0.0);
            ctx.scene.set_visible(sprites.food, harvest_rate > 0.0);

            let structure = tile
                .and_then(|t| reference_id(t.get("structure")))
                .and_then(|structure| game_object(frame.current, structure));
            let Some(structure) = structure else {
                ctx.scene.set_visible(sprites.structure, false);
                self.structure_owners.remove(id);
                continue;
            };
            let owner = reference_id(structure.get("owner"));
            let tint = owner_color(ctx, owner)?;
            ctx.scene.set_visible(sprites.structure, true);
            ctx.scene.set_tint(sprites.structure, tint);
            self.structure_owners
                .insert(id.clone(), owner.map(String::from));
        }
        Ok(())
    }

    fn render(&mut self, ctx: &mut GameContext<'_>, dt: f64, frame: &StateFrame<'_>) -> anyhow::Result<()> {
        for (id, unit) in &self.units {
            let current = game_object(frame.current, id).filter(|u| is_alive(u));
            let from = current.and_then(|u| unit_position(frame.current, u));
            let Some(from) = from else {
                ctx.scene.set_visible(unit.sprite, false);
                continue;
            };
            let to = game_object(frame.next, id)
                .and_then(|u| unit_position(frame.next, u))
                .unwrap_or(from);
            let x = ease(from.0, to.0, dt, Easing::CubicInOut);
            let y = ease(from.1, to.1, dt, Easing::CubicInOut);
            ctx.scene.set_position(unit.sprite, x, y);
            ctx.scene.set_visible(unit.sprite, true);
        }
        Ok(())
    }

    fn recolor(&mut self, ctx: &mut GameContext<'_>) -> anyhow::Result<()> {
        for unit in self.units.values() {
            let tint = owner_color(ctx, unit.owner.as_deref())?;
            ctx.scene.set_tint(unit.sprite, tint);
        }
        for (id, owner) in &self.structure_owners {
            if let Some(sprites) = self.tiles.get(id) {
                let tint = owner_color(ctx, owner.as_deref())?;
                ctx.scene.set_tint(sprites.structure, tint);
            }
        }
        Ok(())
    }
}
