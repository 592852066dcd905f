use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use viseur::{Action, PlaybackMode, Viseur};

/// How far one key press moves the speed slider.
const SPEED_STEP: f64 = 0.5;
/// How much one key press grows or shrinks the info pane, in pixels.
const INFO_PANE_STEP: f64 = 40.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    Quit,
    Action(Action),
}

/// What a key press asks for, given the current state of the controls.
pub fn command(key: KeyEvent, viseur: &Viseur) -> Option<Command> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    let gui = viseur.gui();
    let action = match key.code {
        KeyCode::Char('q') => return Some(Command::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(Command::Quit)
        }
        KeyCode::Char(' ') => Action::PlayPause,
        KeyCode::Left => Action::Back,
        KeyCode::Right => Action::Next,
        KeyCode::Char('+') | KeyCode::Char('=') => {
            Action::SpeedSlider(gui.playback_pane.speed_slider.value() + SPEED_STEP)
        }
        KeyCode::Char('-') => {
            Action::SpeedSlider(gui.playback_pane.speed_slider.value() - SPEED_STEP)
        }
        KeyCode::Char('d') => Action::SetMode(PlaybackMode::Deltas),
        KeyCode::Char('t') => Action::SetMode(PlaybackMode::Turns),
        KeyCode::Char('f') => Action::ToggleFullscreen,
        KeyCode::Esc => Action::ExitFullscreen,
        KeyCode::Char('g') => Action::ToggleGrid,
        KeyCode::Char('[') => Action::ResizeInfoPane(gui.info_pane.length() - INFO_PANE_STEP),
        KeyCode::Char(']') => Action::ResizeInfoPane(gui.info_pane.length() + INFO_PANE_STEP),
        KeyCode::Char('s') => Action::SnapInfoPane(gui.info_pane.side().next()),
        KeyCode::Tab => Action::NextTab,
        KeyCode::Char(c @ '1'..='4') => Action::SelectTab(c as usize - '1' as usize),
        _ => return None,
    };
    Some(Command::Action(action))
}

/// The key map, as shown in the help tab.
pub const HELP: [(&str, &str); 13] = [
    ("space", "play / pause"),
    ("← →", "back / next"),
    ("+ -", "faster / slower"),
    ("d t", "step by deltas / turns"),
    ("f", "fullscreen"),
    ("esc", "exit fullscreen"),
    ("g", "toggle the grid"),
    ("[ ]", "shrink / grow the info pane"),
    ("s", "move the info pane"),
    ("tab", "next tab"),
    ("1-4", "select a tab"),
    ("q", "quit"),
    ("ctrl-c", "quit"),
];

#[cfg(test)]
mod tests {
    use viseur::{Config, Side, SettingsManager};

    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn key_map() {
        let viseur = Viseur::new(SettingsManager::default(), Config::default());
        assert_eq!(command(press(KeyCode::Char('q')), &viseur), Some(Command::Quit));
        assert_eq!(
            command(press(KeyCode::Char(' ')), &viseur),
            Some(Command::Action(Action::PlayPause))
        );
        assert_eq!(
            command(press(KeyCode::Char('s')), &viseur),
            Some(Command::Action(Action::SnapInfoPane(Side::Bottom)))
        );
        assert_eq!(
            command(press(KeyCode::Char(']')), &viseur),
            Some(Command::Action(Action::ResizeInfoPane(460.0)))
        );
        assert_eq!(
            command(press(KeyCode::Char('3')), &viseur),
            Some(Command::Action(Action::SelectTab(2)))
        );
        assert_eq!(command(press(KeyCode::Char('x')), &viseur), None);
    }

    #[test]
    fn speed_keys_move_the_slider() {
        let viseur = Viseur::new(SettingsManager::default(), Config::default());
        // 1000 ms per delta sits at -√10 on the slider
        let value = viseur.gui().playback_pane.speed_slider.value();
        assert_eq!(
            command(press(KeyCode::Char('+')), &viseur),
            Some(Command::Action(Action::SpeedSlider(value + SPEED_STEP)))
        );
    }

    #[test]
    fn releases_are_ignored() {
        let viseur = Viseur::new(SettingsManager::default(), Config::default());
        let mut key = press(KeyCode::Char('q'));
        key.kind = KeyEventKind::Release;
        assert_eq!(command(key, &viseur), None);
    }
}
