//! Key bindings: normal and vim-style.

use crate::game::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Game(Command),
    /// Start over from the high-score screen.
    Restart,
    Quit,
    None,
}

/// Map key event to an action. Supports both normal (arrows, space) and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    let command = match code {
        KeyCode::Char('q') | KeyCode::Esc => return Action::Quit,
        KeyCode::Char('r') => return Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Command::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Command::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Command::Rotate,
        KeyCode::Down | KeyCode::Char('j') | KeyCode::Enter | KeyCode::Char(' ') => Command::Drop,
        KeyCode::Char('p') | KeyCode::Char('P') => Command::TogglePause,
        KeyCode::Char('s') | KeyCode::Char('S') => Command::ToggleSound,
        KeyCode::Char('e') | KeyCode::Char('E') => Command::Forfeit,
        _ => return Action::None,
    };
    Action::Game(command)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_arrows_and_vim_agree() {
        assert_eq!(key_to_action(key(KeyCode::Left)), key_to_action(key(KeyCode::Char('h'))));
        assert_eq!(key_to_action(key(KeyCode::Up)), Action::Game(Command::Rotate));
        assert_eq!(key_to_action(key(KeyCode::Char(' '))), Action::Game(Command::Drop));
    }

    #[test]
    fn test_game_keys() {
        assert_eq!(key_to_action(key(KeyCode::Char('e'))), Action::Game(Command::Forfeit));
        assert_eq!(key_to_action(key(KeyCode::Char('s'))), Action::Game(Command::ToggleSound));
        assert_eq!(key_to_action(key(KeyCode::Char('p'))), Action::Game(Command::TogglePause));
        assert_eq!(key_to_action(key(KeyCode::Esc)), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Char('r'))), Action::Restart);
    }

    #[test]
    fn test_modifiers() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(ctrl_c), Action::Quit);
        let alt_h = KeyEvent::new(KeyCode::Char('h'), KeyModifiers::ALT);
        assert_eq!(key_to_action(alt_h), Action::None);
        let shift_e = KeyEvent::new(KeyCode::Char('E'), KeyModifiers::SHIFT);
        assert_eq!(key_to_action(shift_e), Action::Game(Command::Forfeit));
    }
}
