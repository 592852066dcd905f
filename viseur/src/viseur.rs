use std::time::Instant;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::game::{game_for_name, BaseGame};
use crate::gui::{Gui, PlaybackAction, Rect, Side};
use crate::renderer::{Renderer, Scene};
use crate::{
    Config, CurrentTime, Delta, EventQueue, Gamelog, PlaybackMode, SettingKey, SettingsManager,
    StateHistory, TimeEvent, TimeManager, ViseurEvent, ViseurGameState,
};

/// Something the user did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    PlayPause,
    Next,
    Back,
    /// The playback slider moved to `index + dt`.
    Slide(f64),
    /// The speed slider moved to this slider value.
    SpeedSlider(f64),
    SetMode(PlaybackMode),
    ToggleFullscreen,
    ExitFullscreen,
    SnapInfoPane(Side),
    ResizeInfoPane(f64),
    SelectTab(usize),
    NextTab,
    ToggleGrid,
    /// The window is now this many pixels wide and high.
    ResizeWindow(f64, f64),
}

/// Everything needed to watch one gamelog: the playback timeline, the GUI
/// model, the renderer and the game drawing into it.
///
/// The front end feeds in the time and the user's actions, and draws what
/// it finds in [`Viseur::renderer`] and [`Viseur::gui`].
pub struct Viseur {
    settings: SettingsManager,
    config: Config,
    gui: Gui,
    renderer: Renderer,
    time_manager: TimeManager,
    gamelog: Option<Gamelog>,
    history: Option<StateHistory>,
    game: Option<BaseGame>,
    events: EventQueue,
}

impl Viseur {
    pub fn new(settings: SettingsManager, config: Config) -> Self {
        let current = settings.get();
        let gui = Gui::new(current);
        let renderer = Renderer::new(current.resolution_scale, current.show_grid);
        let time_manager = TimeManager::new(current.playback_speed, current.playback_mode);
        Self {
            settings,
            config,
            gui,
            renderer,
            time_manager,
            gamelog: None,
            history: None,
            game: None,
            events: EventQueue::new(),
        }
    }

    pub fn settings(&self) -> &SettingsManager {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut SettingsManager {
        &mut self.settings
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn gui(&self) -> &Gui {
        &self.gui
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn gamelog(&self) -> Option<&Gamelog> {
        self.gamelog.as_ref()
    }

    pub fn history(&self) -> Option<&StateHistory> {
        self.history.as_ref()
    }

    pub fn game(&self) -> Option<&BaseGame> {
        self.game.as_ref()
    }

    pub fn is_ready(&self) -> bool {
        self.time_manager.is_ready()
    }

    pub fn current_time(&self, now: Instant) -> CurrentTime {
        self.time_manager.current_time(now)
    }

    /// The states around the current index.
    pub fn current_state(&self, now: Instant) -> Option<ViseurGameState<'_>> {
        let index = self.current_time(now).index;
        self.history.as_ref().map(|history| history.state_at(index))
    }

    /// Starts showing a gamelog. Failures are also shown in an error modal.
    pub fn load_gamelog(&mut self, gamelog: Gamelog, now: Instant) -> anyhow::Result<()> {
        self.gui.modal_message("Initializing Visualizer.");
        let result = self.start_gamelog(gamelog, now);
        match &result {
            Ok(()) => self.gui.hide_modal(),
            Err(err) => {
                warn!(error = %err, "Could not load the gamelog");
                self.gui.modal_error(format!("{:#}", err));
            }
        }
        result
    }

    fn start_gamelog(&mut self, mut gamelog: Gamelog, now: Instant) -> anyhow::Result<()> {
        if gamelog.game_name.is_empty() {
            gamelog.game_name = self.config.game.clone();
        }
        let renderer = game_for_name(&gamelog.game_name)?;
        let history = StateHistory::build(&gamelog)?;
        let mut game = BaseGame::new(renderer, &gamelog.random_seed, self.settings.get());
        info!(
            game = game.name(),
            session = %gamelog.game_session,
            deltas = history.len(),
            streaming = gamelog.streaming,
            "Loading gamelog"
        );
        self.events.push(ViseurEvent::GamelogLoaded);

        let first = history.state_at(0);
        self.renderer.set_size(game.size(first.game));
        self.renderer.scene = Scene::new(game.layer_order());
        game.start(&mut self.renderer.scene, first)
            .with_context(|| format!("Could not start {}", game.name()))?;

        self.time_manager
            .ready(history.len(), history.turn_starts().to_vec(), now);
        // a live game is followed as it is played
        if gamelog.streaming {
            self.time_manager.play(now);
        }
        self.gui.playback_pane.ready(history.len(), gamelog.streaming);
        self.gui.gamelog_ready(&gamelog);
        self.relayout_with(None);

        self.gamelog = Some(gamelog);
        self.history = Some(history);
        self.game = Some(game);
        self.events.push(ViseurEvent::Ready);
        Ok(())
    }

    /// Appends a delta to a gamelog that is still being played.
    pub fn stream_delta(&mut self, delta: Delta, now: Instant) -> anyhow::Result<()> {
        let (Some(gamelog), Some(history)) = (self.gamelog.as_mut(), self.history.as_mut()) else {
            anyhow::bail!("no gamelog to stream into");
        };
        gamelog.append_delta(delta.clone())?;
        history.push(delta);
        let number_of_deltas = history.len();
        debug!(deltas = number_of_deltas, "Delta streamed");

        self.time_manager.set_number_of_deltas(
            number_of_deltas,
            history.turn_starts().to_vec(),
            now,
        );
        self.gui.playback_pane.update_number_of_deltas(number_of_deltas);

        // the game needs to learn the next state once there is one
        let index = self.time_manager.current_time(now).index;
        if index + 2 == number_of_deltas {
            if let Some(game) = self.game.as_mut() {
                if let Err(err) = game.update(&mut self.renderer.scene, history.state_at(index)) {
                    warn!(error = %err, index, "Game could not take the streamed state");
                }
            }
        }
        self.events.push(ViseurEvent::GamelogUpdated);
        Ok(())
    }

    /// The streamed gamelog is complete.
    pub fn finalize_gamelog(&mut self) {
        let Some(gamelog) = self.gamelog.as_mut() else {
            return;
        };
        gamelog.finalize();
        self.gui
            .playback_pane
            .finalize(gamelog.number_of_deltas());
        self.gui.gamelog_ready(gamelog);
        info!(deltas = gamelog.number_of_deltas(), "Gamelog finalized");
        self.events.push(ViseurEvent::GamelogFinalized);
    }

    /// The stream of a live gamelog broke off. What arrived so far stays
    /// watchable, and the reason is shown in an error modal.
    pub fn abort_stream(&mut self, reason: &str) {
        warn!(%reason, "Gamelog stream broke off");
        if self.gamelog.as_ref().is_some_and(|gamelog| gamelog.streaming) {
            self.finalize_gamelog();
        }
        self.gui
            .modal_error(format!("The gamelog stream broke off: {}", reason));
    }

    /// Applies changed settings and steps the timeline. Call once per frame.
    pub fn update(&mut self, now: Instant) -> anyhow::Result<()> {
        self.apply_setting_changes(now)?;
        for event in self.time_manager.update(now) {
            self.time_event(event)?;
        }
        let time = self.time_manager.current_time(now);
        self.gui.playback_pane.time_updated(time);
        self.events.push(ViseurEvent::TimeUpdated(time));
        Ok(())
    }

    fn time_event(&mut self, event: TimeEvent) -> anyhow::Result<()> {
        match event {
            TimeEvent::Playing => {
                self.gui.playback_pane.set_playing(true);
                self.events.push(ViseurEvent::Playing);
            }
            TimeEvent::Paused => {
                self.gui.playback_pane.set_playing(false);
                self.events.push(ViseurEvent::Paused);
            }
            TimeEvent::Ended => debug!("Playback ended"),
            TimeEvent::NewIndex(index) => {
                if let (Some(game), Some(history)) = (self.game.as_mut(), self.history.as_ref()) {
                    game.update(&mut self.renderer.scene, history.state_at(index))?;
                }
                self.events.push(ViseurEvent::StateChanged(index));
            }
            TimeEvent::StepIndex(index) => {
                self.events.push(ViseurEvent::StateChangedStep(index));
            }
        }
        Ok(())
    }

    /// Draws the current point of the timeline into the scene.
    pub fn render(&mut self, now: Instant) -> anyhow::Result<()> {
        let time = self.time_manager.current_time(now);
        match self.game.as_mut() {
            Some(game) => game.render(&mut self.renderer.scene, time.index, time.dt),
            None => Ok(()),
        }
    }

    /// Handles a user action. Actions on disabled controls do nothing.
    pub fn handle(&mut self, action: Action, now: Instant) -> anyhow::Result<()> {
        let pane = &mut self.gui.playback_pane;
        let playback = match action {
            Action::PlayPause => pane.click_play_pause(),
            Action::Next => pane.click_next(),
            Action::Back => pane.click_back(),
            Action::Slide(value) => pane.slide(value),
            Action::SpeedSlider(value) => pane.slide_speed(value),
            Action::SetMode(mode) => pane.click_mode(mode),
            Action::ToggleFullscreen => pane.click_fullscreen(),
            Action::ExitFullscreen => {
                if self.gui.is_fullscreen() {
                    let layout = self.gui.exit_fullscreen();
                    self.relayout_with(Some(layout.renderer));
                }
                None
            }
            Action::SnapInfoPane(side) => {
                self.settings.set_info_pane_side(side);
                None
            }
            Action::ResizeInfoPane(length) => {
                self.gui.info_pane.resize(Some(length), &mut self.settings);
                None
            }
            Action::SelectTab(index) => {
                if let Some(tab) = self.gui.info_pane.tabular.select(index) {
                    debug!(tab = %tab.title, "Tab selected");
                }
                None
            }
            Action::NextTab => {
                if let Some(tab) = self.gui.info_pane.tabular.select_next() {
                    debug!(tab = %tab.title, "Tab selected");
                }
                None
            }
            Action::ToggleGrid => {
                let show_grid = !self.settings.get().show_grid;
                self.settings.set_show_grid(show_grid);
                None
            }
            Action::ResizeWindow(width, height) => {
                let layout = self.gui.resize_window(width, height);
                self.relayout_with(Some(layout.renderer));
                None
            }
        };

        if let Some(playback) = playback {
            self.playback_action(playback, now);
        }
        self.apply_setting_changes(now)?;
        for event in self.time_manager.drain_events() {
            self.time_event(event)?;
        }
        let time = self.time_manager.current_time(now);
        self.gui.playback_pane.time_updated(time);
        Ok(())
    }

    fn playback_action(&mut self, action: PlaybackAction, now: Instant) {
        debug!(?action, "Playback action");
        match action {
            PlaybackAction::PlayPause => self.time_manager.play_pause(now),
            PlaybackAction::Back => self.time_manager.back(now),
            PlaybackAction::Next => self.time_manager.next(now),
            PlaybackAction::Slide(value) => self.time_manager.playback_slide(value, now),
            PlaybackAction::Speed(speed) => self.settings.set_playback_speed(speed),
            PlaybackAction::SetMode(mode) => self.settings.set_playback_mode(mode),
            PlaybackAction::ToggleFullscreen => {
                let layout = self.gui.toggle_fullscreen();
                self.relayout_with(Some(layout.renderer));
            }
        }
    }

    /// Pushes every setting that changed since the last call to the parts
    /// that depend on it.
    fn apply_setting_changes(&mut self, now: Instant) -> anyhow::Result<()> {
        let changes = self.settings.drain_changes();
        if changes.is_empty() {
            return Ok(());
        }
        let mut recolor = false;
        let mut relayout = false;
        for key in changes {
            debug!(%key, "Setting changed");
            let settings = self.settings.get();
            match key {
                SettingKey::PlaybackSpeed => {
                    self.time_manager.set_speed(settings.playback_speed, now);
                    self.gui
                        .playback_pane
                        .update_speed_slider(settings.playback_speed);
                }
                SettingKey::PlaybackMode => {
                    self.time_manager.set_mode(settings.playback_mode);
                    self.gui
                        .playback_pane
                        .update_playback_mode(settings.playback_mode);
                }
                SettingKey::InfoPaneSide => {
                    self.gui.info_pane.snap_to(settings.info_pane_side);
                    relayout = true;
                }
                SettingKey::InfoPaneLength => {
                    if self.gui.info_pane.length() != settings.info_pane_length {
                        let length = settings.info_pane_length;
                        self.gui.info_pane.resize(Some(length), &mut self.settings);
                    }
                    relayout = true;
                }
                SettingKey::ShowGrid => self.renderer.set_show_grid(settings.show_grid),
                SettingKey::ResolutionScale => {
                    self.renderer
                        .set_resolution_scale(settings.resolution_scale)
                }
                SettingKey::CustomPlayerColors | SettingKey::PlayerColor(_) => recolor = true,
            }
        }
        if relayout {
            self.relayout_with(None);
        }
        if recolor {
            if let Some(game) = self.game.as_mut() {
                game.recolor(&mut self.renderer.scene, self.settings.get())?;
            }
        }
        Ok(())
    }

    /// Fits the renderer into its part of the layout, laying the GUI out
    /// again first when no layout is given.
    fn relayout_with(&mut self, renderer_area: Option<Rect>) {
        let area = renderer_area.unwrap_or_else(|| self.gui.resize().renderer);
        self.renderer.resize(Some((area.width, area.height)));
    }

    /// Everything that happened since the last call.
    pub fn drain_events(&mut self) -> Vec<ViseurEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::gui::Orientation;

    const GAMELOG: &str = r#"{
        "gameName": "ConnectFour",
        "gameSession": "7",
        "epoch": 1573070938000,
        "deltas": [
            { "type": "start", "game": { "repString": "7/7/7/7/7/7 r" } },
            { "type": "finished", "data": { "returned": 0 }, "game": { "repString": "r6/7/7/7/7/7 y" } },
            { "type": "finished", "data": { "returned": 0 }, "game": { "repString": "r6/y6/7/7/7/7 r" } }
        ]
    }"#;

    fn ms(start: Instant, ms: u64) -> Instant {
        start + Duration::from_millis(ms)
    }

    fn loaded(gamelog: &str) -> (Viseur, Instant) {
        let mut viseur = Viseur::new(SettingsManager::default(), Config::default());
        let now = Instant::now();
        viseur.load_gamelog(gamelog.parse().unwrap(), now).unwrap();
        (viseur, now)
    }

    #[test]
    fn loading_a_gamelog() {
        let (mut viseur, now) = loaded(GAMELOG);
        assert!(viseur.is_ready());
        assert!(viseur.gui().modal().is_none());
        assert_eq!(
            viseur.gui().title(),
            "ConnectFour - 7 - November 6th, 2019, 8:08:58:000 PM UTC | Viseur"
        );
        assert!(viseur.gui().playback_pane.is_enabled());
        assert_eq!(viseur.game().map(|g| g.name()), Some("ConnectFour"));

        let events = viseur.drain_events();
        assert_eq!(events, vec![ViseurEvent::GamelogLoaded, ViseurEvent::Ready]);

        viseur.update(now).unwrap();
        assert!(viseur.drain_events().contains(&ViseurEvent::StateChanged(0)));
    }

    #[test]
    fn unknown_games_show_an_error() {
        let mut viseur = Viseur::new(SettingsManager::default(), Config::default());
        let gamelog: Gamelog = r#"{ "gameName": "Chess", "deltas": [{ "type": "start" }] }"#
            .parse()
            .unwrap();
        assert!(viseur.load_gamelog(gamelog, Instant::now()).is_err());
        assert!(viseur.gui().modal().is_some_and(|m| m.is_error));
        assert!(!viseur.is_ready());
    }

    #[test]
    fn absurd_rep_strings_still_render() {
        let (mut viseur, now) = loaded(
            r#"{
            "gameName": "ConnectFour",
            "deltas": [
                { "type": "start", "game": { "repString": "7/7/7/7/7/7 r" } },
                { "type": "finished", "game": { "repString": "99999999999999999999/7/7/7/7/7 y" } },
                { "type": "over", "game": {} }
            ]
        }"#,
        );
        viseur.handle(Action::Next, now).unwrap();
        viseur.render(now).unwrap();
        viseur.render(ms(now, 2000)).unwrap();
    }

    #[test]
    fn actions_before_loading_are_ignored() {
        let mut viseur = Viseur::new(SettingsManager::default(), Config::default());
        let now = Instant::now();
        viseur.handle(Action::PlayPause, now).unwrap();
        viseur.handle(Action::SpeedSlider(-1.0), now).unwrap();
        viseur.update(ms(now, 5000)).unwrap();
        assert_eq!(viseur.current_time(now), CurrentTime::default());
        assert_eq!(viseur.settings().get().playback_speed, 1000.0);
    }

    #[test]
    fn playing_through() {
        let (mut viseur, now) = loaded(GAMELOG);
        viseur.handle(Action::PlayPause, now).unwrap();
        assert!(viseur.gui().playback_pane.is_playing());
        assert_eq!(viseur.gui().playback_pane.play_pause_button.label(), "Pause");

        viseur.update(ms(now, 500)).unwrap();
        let time = viseur.current_time(ms(now, 500));
        assert_eq!(time.index, 0);
        assert!((time.dt - 0.5).abs() < 1e-9);
        viseur.render(ms(now, 500)).unwrap();

        viseur.update(ms(now, 1000)).unwrap();
        assert_eq!(viseur.current_time(ms(now, 1000)).index, 1);
        viseur.update(ms(now, 2000)).unwrap();
        assert_eq!(viseur.current_time(ms(now, 2000)).index, 2);
        let events = viseur.drain_events();
        assert!(events.contains(&ViseurEvent::StateChanged(2)));
        assert!(events.contains(&ViseurEvent::Paused));
        assert!(!viseur.gui().playback_pane.is_playing());
        assert!(!viseur.gui().playback_pane.next_button.is_enabled());
    }

    #[test]
    fn stepping_and_sliding() {
        let (mut viseur, now) = loaded(GAMELOG);
        viseur.handle(Action::Next, now).unwrap();
        assert_eq!(viseur.current_time(now).index, 1);
        assert!(viseur.drain_events().contains(&ViseurEvent::StateChanged(1)));

        viseur.handle(Action::Slide(1.25), now).unwrap();
        assert_eq!(viseur.current_time(now), CurrentTime { index: 1, dt: 0.25 });
        viseur.handle(Action::Back, now).unwrap();
        assert_eq!(viseur.current_time(now), CurrentTime { index: 1, dt: 0.0 });
        viseur.handle(Action::Back, now).unwrap();
        assert_eq!(viseur.current_time(now).index, 0);
    }

    #[test]
    fn speed_and_mode_are_saved() {
        let (mut viseur, now) = loaded(GAMELOG);
        viseur.handle(Action::SpeedSlider(-2.0), now).unwrap();
        assert_eq!(viseur.settings().get().playback_speed, 400.0);
        assert_eq!(viseur.time_manager.speed(), 400.0);

        viseur.handle(Action::SetMode(PlaybackMode::Turns), now).unwrap();
        assert_eq!(viseur.settings().get().playback_mode, PlaybackMode::Turns);
        assert_eq!(viseur.gui().playback_pane.mode(), PlaybackMode::Turns);
    }

    #[test]
    fn layout_follows_the_info_pane() {
        let (mut viseur, now) = loaded(GAMELOG);
        viseur.handle(Action::ResizeWindow(1200.0, 800.0), now).unwrap();
        let layout = viseur.gui().layout();
        assert_eq!(layout.visualizer_pane.width, 1200.0 - 420.0);

        viseur.handle(Action::SnapInfoPane(Side::Top), now).unwrap();
        assert_eq!(viseur.gui().info_pane.orientation(), Orientation::Horizontal);
        let layout = viseur.gui().layout();
        assert_eq!(layout.visualizer_pane.top, 420.0);
        assert_eq!(layout.visualizer_pane.width, 1200.0);

        viseur.handle(Action::ResizeInfoPane(10.0), now).unwrap();
        assert_eq!(viseur.settings().get().info_pane_length, 200.0);

        viseur.handle(Action::ToggleFullscreen, now).unwrap();
        assert_eq!(viseur.gui().layout().visualizer_pane.height, 800.0);
        viseur.handle(Action::ExitFullscreen, now).unwrap();
        assert_eq!(viseur.gui().layout().visualizer_pane.height, 600.0);
    }

    #[test]
    fn grid_and_tabs() {
        let (mut viseur, now) = loaded(GAMELOG);
        viseur.handle(Action::ToggleGrid, now).unwrap();
        assert!(viseur.settings().get().show_grid);
        assert!(!viseur.renderer().grid_lines().is_empty());

        viseur.handle(Action::SelectTab(3), now).unwrap();
        assert_eq!(viseur.gui().info_pane.tabular.active_index(), 3);
        viseur.handle(Action::NextTab, now).unwrap();
        assert_eq!(viseur.gui().info_pane.tabular.active_index(), 0);
    }

    #[test]
    fn streaming() {
        let streaming = r#"{
            "gameName": "ConnectFour",
            "streaming": true,
            "deltas": [
                { "type": "start", "game": { "repString": "7/7/7/7/7/7 r" } }
            ]
        }"#;
        let (mut viseur, now) = loaded(streaming);
        assert_eq!(viseur.gui().title(), "ConnectFour -  - Live | Viseur");
        assert!(!viseur.gui().playback_pane.is_enabled());
        assert!(viseur.gui().playback_pane.speed_slider.is_enabled());

        // only the speed can be changed
        viseur.handle(Action::Slide(0.0), now).unwrap();
        viseur.handle(Action::SpeedSlider(-1.0), now).unwrap();
        assert_eq!(viseur.settings().get().playback_speed, 100.0);

        let delta: Delta = serde_json::from_str(
            r#"{ "type": "finished", "data": { "returned": 3 }, "game": { "repString": "3r3/7/7/7/7/7 y" } }"#,
        )
        .unwrap();
        viseur.stream_delta(delta, ms(now, 10)).unwrap();
        assert_eq!(viseur.history().map(StateHistory::len), Some(2));
        assert!(viseur.drain_events().contains(&ViseurEvent::GamelogUpdated));

        viseur.finalize_gamelog();
        assert!(viseur.gui().playback_pane.is_enabled());
        assert!(viseur.gui().title().ends_with("Unknown date | Viseur"));
        assert!(viseur.drain_events().contains(&ViseurEvent::GamelogFinalized));
    }

    #[test]
    fn broken_streams_finalize_with_an_error() {
        let streaming = r#"{
            "gameName": "ConnectFour",
            "streaming": true,
            "deltas": [
                { "type": "start", "game": { "repString": "7/7/7/7/7/7 r" } }
            ]
        }"#;
        let (mut viseur, now) = loaded(streaming);
        let bad: Delta = serde_json::from_str(r#"{ "type": "finished", "game": [1, 2] }"#).unwrap();
        assert!(viseur.stream_delta(bad, now).is_err());
        assert_eq!(viseur.history().map(StateHistory::len), Some(1));

        viseur.abort_stream("delta 1 is not an object");
        assert!(viseur.gui().modal().is_some_and(|m| m.is_error));
        assert!(viseur.gui().playback_pane.is_enabled());
        assert!(!viseur.gui().title().contains("Live"));
        assert!(viseur.drain_events().contains(&ViseurEvent::GamelogFinalized));
    }

    #[test]
    fn player_color_changes_recolor_the_game() {
        let (mut viseur, now) = loaded(GAMELOG);
        viseur.handle(Action::Next, now).unwrap();
        viseur.render(now).unwrap();

        let red = crate::Color::rgb(0xff, 0, 0);
        viseur.settings_mut().set_player_color(0, red, |_| red);
        viseur.update(now).unwrap();
        viseur.render(now).unwrap();
        let piece = viseur
            .renderer()
            .scene
            .draw_order()
            .find(|s| s.resource.key == "piece")
            .unwrap();
        assert_eq!(piece.tint, Some(red));
    }
}
