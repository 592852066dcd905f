use serde_json::Value;

use crate::game::rep_string::parse_ranks;
use crate::game::{GameContext, GameRenderer, PlayerRef, StateFrame};
use crate::games::rep_string;
use crate::renderer::{RendererSize, Resource, Resources, SpriteId, SpriteOptions};
use crate::Color;

const CELLS: usize = 9;

static RESOURCES: Resources = Resources::new(&[
    Resource::tile("tile", Color::rgb(0xf4, 0xf4, 0xf4)),
    Resource::glyph("x", '✕', Color::WHITE),
    Resource::glyph("o", '◯', Color::WHITE),
    Resource::outline("border", '#', Color::BLACK),
]);

const LINES: [[(usize, usize); 3]; 8] = [
    [(0, 0), (0, 1), (0, 2)],
    [(1, 0), (1, 1), (1, 2)],
    [(2, 0), (2, 1), (2, 2)],
    [(0, 0), (1, 0), (2, 0)],
    [(0, 1), (1, 1), (2, 1)],
    [(0, 2), (1, 2), (2, 2)],
    [(0, 0), (1, 1), (2, 2)],
    [(0, 2), (1, 1), (2, 0)],
];

/// Nine tic-tac-toe boards in a 3 by 3 grid. A sub-board's border takes the
/// color of the player who got three in a row on it.
pub struct UltimateTicTacToe {
    xs: Vec<SpriteId>,
    os: Vec<SpriteId>,
    /// By `3 * board_row + board_column`.
    borders: Vec<SpriteId>,
    winners: [Option<char>; 9],
}

impl UltimateTicTacToe {
    pub fn new() -> Self {
        Self {
            xs: Vec::with_capacity(CELLS * CELLS),
            os: Vec::with_capacity(CELLS * CELLS),
            borders: Vec::with_capacity(9),
            winners: [None; 9],
        }
    }
}

impl Default for UltimateTicTacToe {
    fn default() -> Self {
        Self::new()
    }
}

/// Who has three in a row on the sub-board at `(board_row, board_column)`.
pub fn sub_board_winner(
    ranks: &[Vec<Option<char>>],
    board_row: usize,
    board_column: usize,
) -> Option<char> {
    let square = |(r, c): (usize, usize)| {
        ranks
            .get(3 * board_row + r)
            .and_then(|rank| rank.get(3 * board_column + c))
            .copied()
            .flatten()
    };
    LINES.iter().find_map(|line| {
        let first = square(line[0])?;
        (first != ' ' && line.iter().all(|&cell| square(cell) == Some(first))).then_some(first)
    })
}

fn mark_color(ctx: &GameContext<'_>, mark: char) -> anyhow::Result<Color> {
    let index = if mark == 'o' { 1 } else { 0 };
    Ok(ctx.player_color(PlayerRef::Index(index))?)
}

impl UltimateTicTacToe {
    fn tint_borders(&self, ctx: &mut GameContext<'_>) -> anyhow::Result<()> {
        for (border, winner) in self.borders.iter().zip(self.winners) {
            let tint = match winner {
                Some(mark) => mark_color(ctx, mark)?,
                None => Color::BLACK,
            };
            ctx.scene.set_tint(*border, tint);
        }
        Ok(())
    }
}

impl GameRenderer for UltimateTicTacToe {
    fn name(&self) -> &'static str {
        "UltimateTicTacToe"
    }

    fn resources(&self) -> &'static Resources {
        &RESOURCES
    }

    fn size(&self, _state: &Value) -> RendererSize {
        RendererSize::new(11.0, 11.0)
    }

    fn create_background(&mut self, ctx: &mut GameContext<'_>, _state: &Value) -> anyhow::Result<()> {
        for row in 0..CELLS {
            for column in 0..CELLS {
                ctx.sprite(
                    "background",
                    "tile",
                    SpriteOptions::at((column + 1) as f64, (row + 1) as f64),
                )?;
            }
        }

        for board_row in 0..3 {
            for board_column in 0..3 {
                let border = ctx.sprite(
                    "ui",
                    "border",
                    SpriteOptions::at((3 * board_column + 1) as f64, (3 * board_row + 1) as f64)
                        .scaled(3.0)
                        .tint(Color::BLACK),
                )?;
                self.borders.push(border);
            }
        }

        let x_color = mark_color(ctx, 'x')?;
        let o_color = mark_color(ctx, 'o')?;
        for row in 0..CELLS {
            for column in 0..CELLS {
                let at = SpriteOptions::at((column + 1) as f64, (row + 1) as f64).hidden();
                self.xs.push(ctx.sprite("game", "x", at.clone().tint(x_color))?);
                self.os.push(ctx.sprite("game", "o", at.tint(o_color))?);
            }
        }
        Ok(())
    }

    fn state_updated(&mut self, ctx: &mut GameContext<'_>, frame: &StateFrame<'_>) -> anyhow::Result<()> {
        let ranks = parse_ranks(rep_string(frame.current));
        for row in 0..CELLS {
            for column in 0..CELLS {
                let square = ranks.get(row).and_then(|r| r.get(column)).copied().flatten();
                let index = CELLS * row + column;
                if let (Some(&x), Some(&o)) = (self.xs.get(index), self.os.get(index)) {
                    ctx.scene.set_visible(x, square == Some('x'));
                    ctx.scene.set_visible(o, square == Some('o'));
                }
            }
        }

        for board_row in 0..3 {
            for board_column in 0..3 {
                self.winners[3 * board_row + board_column] =
                    sub_board_winner(&ranks, board_row, board_column);
            }
        }
        self.tint_borders(ctx)
    }

    fn recolor(&mut self, ctx: &mut GameContext<'_>) -> anyhow::Result<()> {
        let x_color = mark_color(ctx, 'x')?;
        let o_color = mark_color(ctx, 'o')?;
        for &x in &self.xs {
            ctx.scene.set_tint(x, x_color);
        }
        for &o in &self.os {
            ctx.scene.set_tint(o, o_color);
        }
        self.tint_borders(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::DEFAULT_PLAYER_COLORS;
    use crate::games::test_utils::Harness;

    const GAMELOG: &str = r#"{
        "gameName": "UltimateTicTacToe",
        "deltas": [
            { "type": "start", "game": { "repString": "9/9/9/9/9/9/9/9/9 x" } },
            { "type": "finished", "game": { "repString": "x8/1x7/2x6/9/9/9/9/9/3o5 o" } }
        ]
    }"#;

    #[test]
    fn marks_and_won_boards() {
        let mut harness = Harness::new(GAMELOG);
        assert!(harness.visible("x").is_empty());

        harness.render(1, 0.0);
        assert_eq!(harness.visible("x").len(), 3);
        let os = harness.visible("o");
        assert_eq!(os.len(), 1);
        assert_eq!(os[0].position, (4.0, 9.0));

        let borders = harness.visible("border");
        assert_eq!(borders.len(), 9);
        assert_eq!(borders[0].tint, Some(DEFAULT_PLAYER_COLORS[0]));
        assert!(borders[1..].iter().all(|b| b.tint == Some(Color::BLACK)));

        // back to the start, nobody has won
        harness.render(0, 0.0);
        assert!(harness.visible("border").iter().all(|b| b.tint == Some(Color::BLACK)));
    }

    #[test]
    fn three_in_a_row() {
        let ranks = parse_ranks("3ooo3/3x5/3x5/9/9/9/9/9/9 x");
        assert_eq!(sub_board_winner(&ranks, 0, 1), Some('o'));
        assert_eq!(sub_board_winner(&ranks, 0, 0), None);
        let ranks = parse_ranks("3xo4/4x4/3o1x3/9/9/9/9/9/9 x");
        assert_eq!(sub_board_winner(&ranks, 0, 1), Some('x'));
    }
}
