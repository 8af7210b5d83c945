use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    DismissError,
    Refresh,
    OpenBrowser,
    None,
}

/// Captures the UI state needed to interpret a key press.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputContext {
    pub has_error: bool,
    pub is_loading: bool,
    pub is_finished: bool,
}

pub fn map_key(key: KeyEvent, ctx: &InputContext) -> Action {
    if key.kind != KeyEventKind::Press {
        return Action::None;
    }

    // Ctrl+C always quits
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    match key.code {
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => {
            if ctx.has_error {
                Action::DismissError
            } else {
                Action::Quit
            }
        }
        KeyCode::Char('r') if !ctx.is_loading && !ctx.is_finished => Action::Refresh,
        KeyCode::Char('o') => Action::OpenBrowser,
        _ => Action::None,
    }
}
