use std::f64::consts::PI;

use serde_json::Value;

use crate::game::rep_string::{parse_ranks, side_to_move};
use crate::game::{GameContext, GameRenderer, PlayerRef, StateFrame};
use crate::games::rep_string;
use crate::renderer::{RendererSize, Resource, Resources, SpriteId, SpriteOptions};
use crate::{Color, DeltaKind};

const ROWS: usize = 6;
const COLUMNS: usize = 7;

const DAMPING: f64 = 30.0;
const BOUNCES: f64 = 3.0;

static RESOURCES: Resources = Resources::new(&[
    Resource::tile("board", Color::rgb(0x1e, 0x4f, 0xc8)),
    Resource::outline("mask", '○', Color::rgb(0x10, 0x2c, 0x78)),
    Resource::glyph("piece", '●', Color::WHITE),
]);

#[derive(Clone, Copy, Debug)]
struct Piece {
    sprite: SpriteId,
    side: char,
}

/// Pieces drop into a 7 wide and 6 high board, bouncing as they land.
///
/// Rank 0 of the rep string is the bottom row.
pub struct ConnectFour {
    board: Vec<Vec<Option<Piece>>>,
}

impl ConnectFour {
    pub fn new() -> Self {
        Self {
            board: vec![vec![None; COLUMNS]; ROWS],
        }
    }
}

impl Default for ConnectFour {
    fn default() -> Self {
        Self::new()
    }
}

fn screen_position(row: usize, column: usize) -> (f64, f64) {
    ((column + 1) as f64, (ROWS - row) as f64)
}

fn side_color(ctx: &GameContext<'_>, side: char) -> anyhow::Result<Color> {
    let index = if side == 'y' { 1 } else { 0 };
    Ok(ctx.player_color(PlayerRef::Index(index))?)
}

/// The column a finished delta dropped a piece into.
fn dropped_column(returned: &Value) -> Option<usize> {
    let column = returned
        .as_u64()
        .or_else(|| returned.as_str().and_then(|s| s.trim().parse().ok()))?;
    usize::try_from(column).ok().filter(|&c| c < COLUMNS)
}

/// How high above its resting place a dropped piece is, `dt` into the fall.
pub fn bounce(from: f64, to: f64, dt: f64) -> f64 {
    (from - to) * (dt * PI * (BOUNCES + 0.5)).cos().abs() / (1.0 + DAMPING * dt) + to
}

impl ConnectFour {
    fn place(
        &mut self,
        ctx: &mut GameContext<'_>,
        row: usize,
        column: usize,
        side: char,
        position: (f64, f64),
    ) -> anyhow::Result<SpriteId> {
        let tint = side_color(ctx, side)?;
        if let Some(piece) = &mut self.board[row][column] {
            piece.side = side;
            ctx.scene.set_tint(piece.sprite, tint);
            return Ok(piece.sprite);
        }
        let sprite = ctx.sprite(
            "game",
            "piece",
            SpriteOptions::at(position.0, position.1).tint(tint),
        )?;
        self.board[row][column] = Some(Piece { sprite, side });
        Ok(sprite)
    }
}

impl GameRenderer for ConnectFour {
    fn name(&self) -> &'static str {
        "ConnectFour"
    }

    fn default_player_colors(&self) -> Vec<Color> {
        vec![Color::rgb(0xd8, 0x22, 0x22), Color::rgb(0xf0, 0xc8, 0x1a)]
    }

    fn layer_order(&self) -> &'static [&'static str] {
        &["background", "game", "mask", "ui"]
    }

    fn resources(&self) -> &'static Resources {
        &RESOURCES
    }

    fn size(&self, _state: &Value) -> RendererSize {
        RendererSize::new(9.0, 8.0)
    }

    fn create_background(&mut self, ctx: &mut GameContext<'_>, _state: &Value) -> anyhow::Result<()> {
        for row in 1..=ROWS {
            for column in 1..=COLUMNS {
                let at = SpriteOptions::at(column as f64, row as f64);
                ctx.sprite("background", "board", at.clone())?;
                ctx.sprite("mask", "mask", at)?;
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
        let current = rep_string(frame.current);
        let ranks = parse_ranks(current);

        // pieces of the current state, created as they are first seen
        for row in 0..ROWS {
            for column in 0..COLUMNS {
                let square = ranks.get(row).and_then(|r| r.get(column)).copied().flatten();
                let (x, y) = screen_position(row, column);
                match square {
                    Some(side) => {
                        let sprite = self.place(ctx, row, column, side, (x, y))?;
                        ctx.scene.set_position(sprite, x, y);
                        ctx.scene.set_visible(sprite, true);
                    }
                    None => {
                        if let Some(piece) = self.board[row][column] {
                            ctx.scene.set_visible(piece.sprite, false);
                        }
                    }
                }
            }
        }

        let Some(next_delta) = frame.next_delta.filter(|d| d.kind == DeltaKind::Finished) else {
            return Ok(());
        };
        let Some(column) = next_delta.returned().and_then(dropped_column) else {
            return Ok(());
        };
        let Some(row) = (0..ROWS).find(|&row| {
            ranks.get(row).and_then(|r| r.get(column)).copied().flatten().is_none()
        }) else {
            return Ok(());
        };

        let side = side_to_move(current).unwrap_or('r');
        let (x, to) = screen_position(row, column);
        let from = 0.0;
        let sprite = self.place(ctx, row, column, side, (x, from))?;
        if dt == 0.0 {
            ctx.scene.set_visible(sprite, false);
        } else {
            ctx.scene.set_visible(sprite, true);
            ctx.scene.set_position(sprite, x, bounce(from, to, dt));
        }
        Ok(())
    }

    fn recolor(&mut self, ctx: &mut GameContext<'_>) -> anyhow::Result<()> {
        for piece in self.board.iter().flatten().flatten() {
            let tint = side_color(ctx, piece.side)?;
            ctx.scene.set_tint(piece.sprite, tint);
        }
        Ok(())
    }
}
