use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Down,
    Up,
    PageDown,
    PageUp,
    Top,
    Bottom,
    ToggleHelp,
    Refresh,
    EnterRow,
    ShowDetails,
    ToggleCollapse,
    CollapseAll,
    ExpandAll,
    NextNamespace,
    PrevNamespace,
    AllNamespaces,
    CloseOverlay,
}

pub fn map_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::PageDown)
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::PageUp),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::Top),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::Char('?') => Some(Action::ToggleHelp),
        KeyCode::Char('r') | KeyCode::F(5) => Some(Action::Refresh),
        KeyCode::Enter => Some(Action::EnterRow),
        KeyCode::Char('d') if key.modifiers.is_empty() => Some(Action::ShowDetails),
        KeyCode::Char(' ') => Some(Action::ToggleCollapse),
        KeyCode::Char('-') => Some(Action::CollapseAll),
        KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::ExpandAll),
        KeyCode::Char('n') | KeyCode::Tab => Some(Action::NextNamespace),
        KeyCode::Char('N') | KeyCode::BackTab => Some(Action::PrevNamespace),
        KeyCode::Char('a') | KeyCode::Char('A') => Some(Action::AllNamespaces),
        KeyCode::Esc => Some(Action::CloseOverlay),
        _ => None,
    }
}
