//! Key -> Action translation.
//!
//! Stateless: every binding is a single key. Alt-modified keys are left to
//! the terminal; Ctrl only matters for Ctrl-C.

use crate::Action;
use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_model::LayoutTemplate;

pub fn translate_key(key: &KeyEvent) -> Option<Action> {
    if key.mods.contains(KeyModifiers::ALT) {
        return None;
    }
    if key.mods.contains(KeyModifiers::CTRL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => Some(Action::Quit),
        KeyCode::Char('l') => Some(Action::NextLayout),
        KeyCode::Char(c @ '1'..='8') => {
            let idx = c as usize - '1' as usize;
            LayoutTemplate::ALL.get(idx).copied().map(Action::SwitchLayout)
        }
        KeyCode::Tab | KeyCode::Right | KeyCode::Down => Some(Action::FocusNext),
        KeyCode::BackTab | KeyCode::Left | KeyCode::Up => Some(Action::FocusPrev),
        KeyCode::Char('w') | KeyCode::Enter => Some(Action::CycleWidget),
        KeyCode::Char('x') | KeyCode::Backspace => Some(Action::ClearWidget),
        KeyCode::Char('r') => Some(Action::ResetLayout),
        KeyCode::Char('p') => Some(Action::NextPreset),
        KeyCode::Char('u') => Some(Action::RunPrimaryTask),
        _ => None,
    }
}
