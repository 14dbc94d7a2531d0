//! Async input service: crossterm's `EventStream` normalized into
//! `core_events::Event`.

mod async_service;
pub use async_service::AsyncInputShutdown;

use async_service::spawn_async_event_task;

use core_events::{Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use crossterm::event::{
    KeyCode as CKeyCode, KeyEvent as CKeyEvent, KeyModifiers as CMods, MouseButton as CButton,
    MouseEvent as CMouseEvent, MouseEventKind as CMouseKind,
};
use tokio::task::JoinHandle;

/// Spawn the async input service backed by `crossterm::EventStream`.
///
/// Returns the `JoinHandle` for the background task alongside a shutdown handle
/// that can be used to request immediate termination.
pub fn spawn_async_input(
    sender: tokio::sync::mpsc::Sender<Event>,
) -> (JoinHandle<()>, AsyncInputShutdown) {
    spawn_async_event_task(sender)
}

pub(crate) fn map_mods(m: CMods) -> KeyModifiers {
    let mut out = KeyModifiers::empty();
    if m.contains(CMods::CONTROL) {
        out |= KeyModifiers::CTRL;
    }
    if m.contains(CMods::ALT) {
        out |= KeyModifiers::ALT;
    }
    if m.contains(CMods::SHIFT) {
        out |= KeyModifiers::SHIFT;
    }
    out
}

/// Keys the dashboard has no binding for map to `None` and are dropped.
pub(crate) fn map_key(key: &CKeyEvent) -> Option<KeyEvent> {
    let code = match key.code {
        CKeyCode::Char(c) => KeyCode::Char(c),
        CKeyCode::Enter => KeyCode::Enter,
        CKeyCode::Esc => KeyCode::Esc,
        CKeyCode::Backspace => KeyCode::Backspace,
        CKeyCode::Tab => KeyCode::Tab,
        CKeyCode::BackTab => KeyCode::BackTab,
        CKeyCode::Up => KeyCode::Up,
        CKeyCode::Down => KeyCode::Down,
        CKeyCode::Left => KeyCode::Left,
        CKeyCode::Right => KeyCode::Right,
        _ => return None,
    };
    let mut mods = map_mods(key.modifiers);
    // shift is already folded into the character / BackTab
    if matches!(code, KeyCode::Char(_) | KeyCode::BackTab) {
        mods.remove(KeyModifiers::SHIFT);
    }
    Some(KeyEvent { code, mods })
}

/// Plain pointer motion (no button held) maps to `None`; nothing consumes it.
pub(crate) fn map_mouse(ev: &CMouseEvent) -> Option<MouseEvent> {
    let button = |b: CButton| match b {
        CButton::Left => MouseButton::Left,
        CButton::Middle => MouseButton::Middle,
        CButton::Right => MouseButton::Right,
    };
    let kind = match ev.kind {
        CMouseKind::Down(b) => MouseEventKind::Down(button(b)),
        CMouseKind::Up(b) => MouseEventKind::Up(button(b)),
        CMouseKind::Drag(b) => MouseEventKind::Drag(button(b)),
        CMouseKind::ScrollUp => MouseEventKind::ScrollUp,
        CMouseKind::ScrollDown => MouseEventKind::ScrollDown,
        CMouseKind::Moved | CMouseKind::ScrollLeft | CMouseKind::ScrollRight => return None,
    };
    Some(MouseEvent {
        kind,
        column: ev.column,
        row: ev.row,
        mods: map_mods(ev.modifiers),
    })
}
