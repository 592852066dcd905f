use std::time::Instant;

use ratatui::{prelude::*, widgets::*};
use viseur::gui::{Gui, Modal, PlaybackPane, Side, TabKind};
use viseur::history::resolve_reference;
use viseur::utils::{capitalize_first_letter, get_str};
use viseur::renderer::{DrawMode, Renderer};
use viseur::{Settings, Viseur};

use crate::input::HELP;

/// A terminal cell counts as this many pixels of the layout, so that the
/// 1:2 cells of most terminal fonts keep a game's aspect ratio.
pub const CELL_WIDTH: f64 = 8.0;
pub const CELL_HEIGHT: f64 = 16.0;

/// The window size in layout pixels.
pub fn window_pixels(area: Rect) -> (f64, f64) {
    (
        f64::from(area.width) * CELL_WIDTH,
        f64::from(area.height) * CELL_HEIGHT,
    )
}

/// The cells covering a rectangle of layout pixels, clipped to `bounds`.
fn cells(rect: viseur::gui::Rect, bounds: Rect) -> Rect {
    let left = (rect.left / CELL_WIDTH).round().max(0.0) as u16;
    let top = (rect.top / CELL_HEIGHT).round().max(0.0) as u16;
    let right = ((rect.left + rect.width) / CELL_WIDTH).round().max(0.0) as u16;
    let bottom = ((rect.top + rect.height) / CELL_HEIGHT).round().max(0.0) as u16;
    Rect::new(
        bounds.x.saturating_add(left),
        bounds.y.saturating_add(top),
        right.saturating_sub(left),
        bottom.saturating_sub(top),
    )
    .intersection(bounds)
}

fn color(color: viseur::Color) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

/// Paints a sprite's color over the background, faded by its alpha.
fn faded(c: viseur::Color, alpha: f64) -> Color {
    color(viseur::Color::BLACK.mix(c, alpha))
}

pub fn draw(frame: &mut Frame, viseur: &Viseur, now: Instant) {
    let area = frame.size();
    let gui = viseur.gui();
    let layout = gui.layout();

    frame.render_widget(
        BoardWidget {
            renderer: viseur.renderer(),
        },
        cells(layout.renderer, area),
    );
    frame.render_widget(
        PlaybackWidget {
            pane: &gui.playback_pane,
        },
        cells(layout.playback, area),
    );
    if !gui.is_fullscreen() {
        frame.render_widget(
            InfoPaneWidget { viseur, now },
            info_pane_area(gui, area),
        );
    }
    if let Some(modal) = gui.modal() {
        frame.render_widget(ModalWidget { modal }, area);
    }
}

/// The part of the window the visualizer leaves to the info pane.
fn info_pane_area(gui: &Gui, area: Rect) -> Rect {
    let visualizer = cells(gui.layout().visualizer_pane, area);
    let (x, y, width, height) = match gui.info_pane.side() {
        Side::Top => (area.x, area.y, area.width, visualizer.y - area.y),
        Side::Bottom => {
            let top = visualizer.bottom();
            (area.x, top, area.width, area.bottom().saturating_sub(top))
        }
        Side::Left => (area.x, area.y, visualizer.x - area.x, area.height),
        Side::Right => {
            let left = visualizer.right();
            (left, area.y, area.right().saturating_sub(left), area.height)
        }
    };
    Rect::new(x, y, width, height).intersection(area)
}

/// Paints the sprites of the scene, back to front.
struct BoardWidget<'a> {
    renderer: &'a Renderer,
}

impl Widget for BoardWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let to_cell = |x: f64, y: f64| {
            let (px, py) = self.renderer.to_pixels(x, y);
            (px / CELL_WIDTH, py / CELL_HEIGHT)
        };
        let cell_at = |cx: f64, cy: f64| -> Option<(u16, u16)> {
            let inside = (0.0..f64::from(area.width)).contains(&cx)
                && (0.0..f64::from(area.height)).contains(&cy);
            inside.then(|| (area.x + cx as u16, area.y + cy as u16))
        };

        for sprite in self.renderer.scene.draw_order() {
            let (left, top, right, bottom) = sprite.bounds();
            let (cl, ct) = to_cell(left, top);
            let (cr, cb) = to_cell(right, bottom);
            let fill = faded(sprite.color(), sprite.alpha);
            match sprite.resource.mode {
                DrawMode::Tile => {
                    let mut cy = ct.floor().max(0.0);
                    while cy < cb.min(f64::from(area.height)) {
                        let mut cx = cl.floor().max(0.0);
                        while cx < cr.min(f64::from(area.width)) {
                            if let Some(pos) = cell_at(cx, cy) {
                                buf.get_mut(pos.0, pos.1).set_char(' ').set_bg(fill);
                            }
                            cx += 1.0;
                        }
                        cy += 1.0;
                    }
                }
                DrawMode::Glyph => {
                    let (x, y) = sprite.center();
                    let (cx, cy) = to_cell(x, y);
                    if let Some(pos) = cell_at(cx, cy) {
                        buf.get_mut(pos.0, pos.1)
                            .set_char(sprite.glyph())
                            .set_fg(fill);
                    }
                }
                DrawMode::Outline => {
                    let rect = Rect::new(
                        area.x.saturating_add(cl.max(0.0) as u16),
                        area.y.saturating_add(ct.max(0.0) as u16),
                        (cr - cl).round().max(1.0) as u16,
                        (cb - ct).round().max(1.0) as u16,
                    )
                    .intersection(area);
                    Block::bordered()
                        .border_type(BorderType::Rounded)
                        .border_style(Style::new().fg(fill))
                        .render(rect, buf);
                }
                DrawMode::Text => {
                    if let (Some(text), Some(pos)) = (&sprite.text, cell_at(cl, ct)) {
                        let width = area.right() - pos.0;
                        buf.set_stringn(pos.0, pos.1, text, width as usize, Style::new().fg(fill));
                    }
                }
            }
        }

        for line in self.renderer.grid_lines() {
            let (x0, y0) = (line.from.0 / CELL_WIDTH, line.from.1 / CELL_HEIGHT);
            let (x1, y1) = (line.to.0 / CELL_WIDTH, line.to.1 / CELL_HEIGHT);
            let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil() as usize;
            for step in 0..=steps {
                let t = if steps == 0 { 0.0 } else { step as f64 / steps as f64 };
                if let Some(pos) = cell_at(x0 + (x1 - x0) * t, y0 + (y1 - y0) * t) {
                    buf.get_mut(pos.0, pos.1).set_fg(Color::DarkGray).set_char('·');
                }
            }
        }
    }
}

struct PlaybackWidget<'a> {
    pane: &'a PlaybackPane,
}

impl Widget for PlaybackWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered().title(" Playback ");
        let inner = block.inner(area);
        block.render(area, buf);
        if inner.height == 0 {
            return;
        }
        let pane = self.pane;
        let (index, last) = pane.index_display();
        let slider_style = if pane.playback_slider.is_enabled() {
            Style::new().fg(Color::Cyan)
        } else {
            Style::new().fg(Color::DarkGray)
        };
        LineGauge::default()
            .ratio(pane.playback_slider.fraction().clamp(0.0, 1.0))
            .label(format!("{:>4} / {}", index, last))
            .gauge_style(slider_style)
            .render(Rect { height: 1, ..inner }, buf);

        if inner.height < 2 {
            return;
        }
        let button = |b: &viseur::gui::Button| {
            let style = if b.is_enabled() {
                Style::new().bold()
            } else {
                Style::new().fg(Color::DarkGray)
            };
            Span::styled(format!("[{}]", b.label()), style)
        };
        let mode = match pane.mode() {
            viseur::PlaybackMode::Deltas => &pane.deltas_button,
            viseur::PlaybackMode::Turns => &pane.turns_button,
        };
        let line = Line::from(vec![
            button(&pane.back_button),
            Span::raw(" "),
            button(&pane.play_pause_button),
            Span::raw(" "),
            button(&pane.next_button),
            Span::raw("  mode "),
            button(mode).reversed(),
            Span::raw(format!("  speed {:.0} ms/delta ", pane.speed())),
            button(&pane.fullscreen_button),
        ]);
        buf.set_line(inner.x, inner.y + 1, &line, inner.width);
    }
}

struct InfoPaneWidget<'a> {
    viseur: &'a Viseur,
    now: Instant,
}

impl Widget for InfoPaneWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        let tabular = &self.viseur.gui().info_pane.tabular;
        let block = Block::bordered().title(format!(" {} ", self.viseur.gui().title()));
        let inner = block.inner(area);
        block.render(area, buf);

        let [tabs_area, content] =
            Layout::vertical([Constraint::Length(2), Constraint::Min(0)]).areas(inner);
        Tabs::new(tabular.tabs().iter().map(|t| t.title.clone()))
            .select(tabular.active_index())
            .highlight_style(Style::new().reversed())
            .render(tabs_area, buf);

        let lines = match tabular.active().map(|t| t.kind) {
            Some(TabKind::Info) | None => self.info(),
            Some(TabKind::Inspect) => self.inspect(),
            Some(TabKind::Settings) => settings_lines(self.viseur.settings().get()),
            Some(TabKind::Help) => HELP
                .iter()
                .map(|(key, what)| Line::from(vec![Span::raw(format!("{:>7}  ", key)).bold(), Span::raw(*what)]))
                .collect(),
        };
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .render(content, buf);
    }
}

impl InfoPaneWidget<'_> {
    /// The players, and how the game ended for them.
    fn info(&self) -> Vec<Line<'static>> {
        let Some(gamelog) = self.viseur.gamelog() else {
            return vec![Line::raw("No gamelog loaded.")];
        };
        let mut lines = vec![Line::from(vec![
            Span::raw(gamelog.game_name.clone()).bold(),
            Span::raw(format!(" - session {}", gamelog.game_session)),
        ])];
        let names: Vec<String> = self
            .viseur
            .current_state(self.now)
            .and_then(|state| {
                let players = state.game.get("players")?.as_array()?;
                Some(
                    players
                        .iter()
                        .map(|reference| {
                            resolve_reference(state.game, reference)
                                .and_then(|player| get_str(player, "name"))
                                .unwrap_or("Player")
                                .to_owned()
                        })
                        .collect(),
                )
            })
            .unwrap_or_default();
        let game = self.viseur.game();
        for (index, name) in names.iter().enumerate() {
            let style = game
                .and_then(|g| g.player_color(viseur::game::PlayerRef::Index(index)).ok())
                .map(|c| Style::new().fg(color(c)))
                .unwrap_or_default();
            lines.push(Line::from(vec![
                Span::styled("■ ", style),
                Span::raw(format!("{} {}", index, name)),
            ]));
        }
        for (title, results) in [("Winners", &gamelog.winners), ("Losers", &gamelog.losers)] {
            if results.is_empty() {
                continue;
            }
            lines.push(Line::raw(""));
            lines.push(Line::raw(title).bold());
            for result in results {
                lines.push(Line::raw(format!("{}: {}", result.name, result.reason)));
            }
        }
        lines
    }

    /// The delta that led to the current state.
    fn inspect(&self) -> Vec<Line<'static>> {
        let time = self.viseur.current_time(self.now);
        let mut lines = vec![Line::raw(format!("index {}  dt {:.2}", time.index, time.dt))];
        let Some(state) = self.viseur.current_state(self.now) else {
            return lines;
        };
        let delta = state.delta;
        lines.push(Line::raw(format!("delta: {}", delta.kind)));
        if let Some(order) = delta.order_name() {
            lines.push(Line::raw(format!("order: {}", order)));
        }
        if let Some(player) = delta.player_id() {
            lines.push(Line::raw(format!("player: #{}", player)));
        }
        if let Some(returned) = delta.returned() {
            lines.push(Line::raw(format!("returned: {}", returned)));
        }
        if let Ok(game) = serde_json::to_string_pretty(&delta.game) {
            lines.push(Line::raw(""));
            lines.extend(game.lines().map(|l| Line::raw(l.to_owned())));
        }
        lines
    }
}

fn settings_lines(settings: &Settings) -> Vec<Line<'static>> {
    let colors = settings
        .player_colors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    [
        ("playback speed", format!("{} ms", settings.playback_speed)),
        ("playback mode", settings.playback_mode.to_string()),
        ("info pane", format!("{} ({})", settings.info_pane_side, settings.info_pane_length)),
        ("grid", settings.show_grid.to_string()),
        ("resolution scale", settings.resolution_scale.to_string()),
        ("custom colors", settings.custom_player_colors.to_string()),
        ("player colors", colors),
    ]
    .into_iter()
    .map(|(name, value)| Line::raw(format!("{}: {}", capitalize_first_letter(name), value)))
    .collect()
}

struct ModalWidget<'a> {
    modal: &'a Modal,
}

impl Widget for ModalWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let width = (self.modal.message.chars().count() as u16 + 4).min(area.width);
        let [_, row, _] = Layout::vertical([
            Constraint::Min(0),
            Constraint::Length(3),
            Constraint::Min(0),
        ])
        .areas(area);
        let [_, modal, _] = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(width),
            Constraint::Min(0),
        ])
        .areas(row);
        let style = if self.modal.is_error {
            Style::new().fg(Color::Red)
        } else {
            Style::new()
        };
        Clear.render(modal, buf);
        Paragraph::new(self.modal.message.as_str())
            .style(style)
            .block(Block::bordered().border_style(style))
            .render(modal, buf);
    }
}
