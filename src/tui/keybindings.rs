//! Key bindings: maps key events to application actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::interaction::NavKey;

/// Application-level actions triggered by key events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Quit the application.
    Quit,
    /// Toggle play/stop.
    TogglePlayback,
    /// Restart the plugin on a blank canvas.
    Restart,
    /// Cycle the playback speed multiplier.
    CycleSpeed,
    /// Switch to the next plugin in the catalog.
    NextPlugin,
    /// Switch to the previous plugin in the catalog.
    PrevPlugin,
    /// Move parameter focus up one row.
    FocusUp,
    /// Move parameter focus down one row.
    FocusDown,
    /// Cycle the focused handle (min, current, max).
    CycleHandle,
    /// Step the focused handle.
    Step(NavKey),
    /// Cycle the modulation speed of the focused parameter.
    CycleModulation,
    /// Reset every parameter to its default.
    ResetParameters,
    /// Show or hide the share payload.
    ToggleShare,
    /// Clear the canvas without restarting.
    ClearCanvas,
    /// Start typing a value for the focused parameter.
    BeginEdit,
    /// Insert a character into the value being typed.
    EditInsert(char),
    /// Delete the last typed character.
    EditBackspace,
    /// Commit the typed value.
    EditCommit,
    /// Abandon the typed value.
    EditCancel,
    /// Close overlays.
    Escape,
}

/// Map a key event to an action. `editing` is true while a value is being typed.
pub fn map_key(key: KeyEvent, editing: bool) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    if ctrl {
        return match key.code {
            KeyCode::Char('c') | KeyCode::Char('q') => Some(Action::Quit),
            _ => None,
        };
    }

    // Value entry intercepts everything else
    if editing {
        return match key.code {
            KeyCode::Enter => Some(Action::EditCommit),
            KeyCode::Esc => Some(Action::EditCancel),
            KeyCode::Backspace => Some(Action::EditBackspace),
            KeyCode::Char(c) if is_numeric_char(c) => Some(Action::EditInsert(c)),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char(' ') => Some(Action::TogglePlayback),
        KeyCode::Char('r') => Some(Action::Restart),
        KeyCode::Char('s') => Some(Action::CycleSpeed),
        KeyCode::Char('n') => Some(Action::NextPlugin),
        KeyCode::Char('p') => Some(Action::PrevPlugin),
        KeyCode::Up | KeyCode::Char('k') => Some(Action::FocusUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Action::FocusDown),
        KeyCode::Tab => Some(Action::CycleHandle),
        KeyCode::Left if shift => Some(Action::Step(NavKey::PageDown)),
        KeyCode::Right if shift => Some(Action::Step(NavKey::PageUp)),
        KeyCode::Left | KeyCode::Char('h') => Some(Action::Step(NavKey::Left)),
        KeyCode::Right | KeyCode::Char('l') => Some(Action::Step(NavKey::Right)),
        KeyCode::PageUp => Some(Action::Step(NavKey::PageUp)),
        KeyCode::PageDown => Some(Action::Step(NavKey::PageDown)),
        KeyCode::Home => Some(Action::Step(NavKey::Home)),
        KeyCode::End => Some(Action::Step(NavKey::End)),
        KeyCode::Char('f') => Some(Action::CycleModulation),
        KeyCode::Char('x') => Some(Action::ResetParameters),
        KeyCode::Char('y') => Some(Action::ToggleShare),
        KeyCode::Char('c') => Some(Action::ClearCanvas),
        KeyCode::Enter | KeyCode::Char('e') => Some(Action::BeginEdit),
        KeyCode::Esc => Some(Action::Escape),
        _ => None,
    }
}

fn is_numeric_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')
}
