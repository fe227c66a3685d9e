//! Key bindings: arrows plus vim-style hjkl.

use crate::game::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
    Confirm,
    Pause,
    Quit,
    /// A digit key, for the numbered menus.
    Choice(u8),
    None,
}

impl Action {
    /// The board command for gameplay actions.
    pub fn command(self) -> Option<Command> {
        match self {
            Self::MoveLeft => Some(Command::MoveLeft),
            Self::MoveRight => Some(Command::MoveRight),
            Self::Rotate => Some(Command::Rotate),
            Self::SoftDrop => Some(Command::SoftDrop),
            _ => None,
        }
    }
}

/// Map key event to action.
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p') => Action::Pause,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Action::Rotate,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        KeyCode::Enter => Action::Confirm,
        KeyCode::Char(c) if c.is_ascii_digit() => Action::Choice(c as u8 - b'0'),
        _ => Action::None,
    }
}
