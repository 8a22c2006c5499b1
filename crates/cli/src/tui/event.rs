//! Event handling for the TUI.

use std::time::Duration;

use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton,
    MouseEvent, MouseEventKind,
};
use viewer_core::{Key, Point};

/// Application events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Quit the application
    Quit,
    /// Force quit the application (Ctrl+C)
    ForceQuit,
    /// Viewer key, with whether a modifier was held
    Key(Key, bool),
    /// Pointer moved to a cell
    MouseMove(Point),
    /// Left click on a cell
    Click(Point),
    /// Show or hide engine analysis
    ToggleAnalysis,
}

/// Polls for an event with a timeout.
pub fn poll_event(timeout: Duration) -> std::io::Result<Option<Event>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }

    match event::read()? {
        CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(map_key_event(key)),
        CrosstermEvent::Mouse(mouse) => Ok(map_mouse_event(mouse)),
        _ => Ok(None),
    }
}

/// Maps a key press to an application event.
fn map_key_event(key: KeyEvent) -> Option<Event> {
    // Check for Ctrl+C
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        return Some(Event::ForceQuit);
    }
    let modifier_held = key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT);

    let key = match key.code {
        KeyCode::Char('q') => return Some(Event::Quit),
        KeyCode::Char('a') => return Some(Event::ToggleAnalysis),

        KeyCode::Up => Key::Up,
        KeyCode::Down => Key::Down,
        KeyCode::Left => Key::Left,
        KeyCode::Right => Key::Right,
        KeyCode::Enter => Key::Enter,
        KeyCode::Esc => Key::Escape,
        KeyCode::Home => Key::Home,
        KeyCode::End => Key::End,

        // Vim style
        KeyCode::Char('k') => Key::Up,
        KeyCode::Char('j') => Key::Down,
        KeyCode::Char('h') => Key::Left,
        KeyCode::Char('l') => Key::Right,

        // Open the variation menu without a modifier chord
        KeyCode::Char('v') => return Some(Event::Key(Key::Right, true)),

        KeyCode::Char(c) => Key::Char(c),
        _ => return None,
    };
    Some(Event::Key(key, modifier_held))
}

/// Maps a mouse event to an application event.
fn map_mouse_event(mouse: MouseEvent) -> Option<Event> {
    let point = Point::new(i32::from(mouse.column), i32::from(mouse.row));
    match mouse.kind {
        MouseEventKind::Moved => Some(Event::MouseMove(point)),
        MouseEventKind::Down(MouseButton::Left) => Some(Event::Click(point)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventState;

    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn test_map_key_event() {
        assert_eq!(
            map_key_event(press(KeyCode::Right, KeyModifiers::NONE)),
            Some(Event::Key(Key::Right, false))
        );
        assert_eq!(
            map_key_event(press(KeyCode::Right, KeyModifiers::CONTROL)),
            Some(Event::Key(Key::Right, true))
        );
        assert_eq!(
            map_key_event(press(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Event::ForceQuit)
        );
        assert_eq!(
            map_key_event(press(KeyCode::Char('a'), KeyModifiers::NONE)),
            Some(Event::ToggleAnalysis)
        );
        assert_eq!(map_key_event(press(KeyCode::F(1), KeyModifiers::NONE)), None);
    }

    #[test]
    fn test_map_mouse_event() {
        let mouse = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 70,
            row: 12,
            modifiers: KeyModifiers::NONE,
        };
        assert_eq!(map_mouse_event(mouse), Some(Event::Click(Point::new(70, 12))));

        let mouse = MouseEvent {
            kind: MouseEventKind::Moved,
            ..mouse
        };
        assert_eq!(map_mouse_event(mouse), Some(Event::MouseMove(Point::new(70, 12))));

        let mouse = MouseEvent {
            kind: MouseEventKind::ScrollUp,
            ..mouse
        };
        assert_eq!(map_mouse_event(mouse), None);
    }
}
