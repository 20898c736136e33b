use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Kind of widget that has focus, which decides how plain keys read.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum KeyContext {
    Selector,
    TextInput,
    Table,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToSelector,
    PrevPage,
    NextPage,
    FocusPrev,
    FocusNext,
    GrowPane,
    ShrinkPane,
    HardRefresh,
    RefreshForce,
    RefreshCached,
    Extend,
    ExtendLegacy,
    Submit,
    Cancel,
    Complete,
    Backspace,
    Delete,
    InputChar(char),
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Top,
    Bottom,
    NextMatch,
    PrevMatch,
    Toggle,
}

pub fn map_key(context: KeyContext, key: KeyEvent) -> Option<Action> {
    if let Some(action) = map_global_key(key) {
        return Some(action);
    }
    match context {
        KeyContext::Selector => map_selector_key(key),
        KeyContext::TextInput => map_text_input_key(key),
        KeyContext::Table => map_table_key(key),
        KeyContext::Text => map_text_key(key),
    }
}

fn map_global_key(key: KeyEvent) -> Option<Action> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    match key.code {
        KeyCode::Char('c') if ctrl => Some(Action::Quit),
        KeyCode::Char('h') if ctrl => Some(Action::PrevPage),
        KeyCode::Char('l') if ctrl => Some(Action::NextPage),
        KeyCode::Char('j') if ctrl => Some(Action::FocusPrev),
        KeyCode::Char('k') if ctrl => Some(Action::FocusNext),
        KeyCode::Char('r') if ctrl => Some(Action::RefreshForce),
        KeyCode::Char('n') if ctrl => Some(Action::Extend),
        KeyCode::Char('m') if ctrl => Some(Action::ExtendLegacy),
        KeyCode::Up if alt => Some(Action::GrowPane),
        KeyCode::Down if alt => Some(Action::ShrinkPane),
        KeyCode::F(5) => Some(Action::HardRefresh),
        _ => None,
    }
}

fn map_selector_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Tab => Some(Action::Complete),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Up => Some(Action::Up),
        _ => map_editing_key(key),
    }
}

fn map_text_input_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Enter => Some(Action::Submit),
        _ => map_editing_key(key),
    }
}

fn map_editing_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Delete => Some(Action::Delete),
        KeyCode::Left => Some(Action::CursorLeft),
        KeyCode::Right => Some(Action::CursorRight),
        KeyCode::Home => Some(Action::CursorHome),
        KeyCode::End => Some(Action::CursorEnd),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

fn map_table_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Esc => Some(Action::ToSelector),
        KeyCode::Enter => Some(Action::Submit),
        KeyCode::Char('r') if key.modifiers.is_empty() => Some(Action::RefreshCached),
        KeyCode::Char('n') if key.modifiers.is_empty() => Some(Action::NextMatch),
        KeyCode::Char('N') => Some(Action::PrevMatch),
        KeyCode::Char(' ') => Some(Action::Toggle),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::Char('h') | KeyCode::Left => Some(Action::Left),
        KeyCode::Char('l') | KeyCode::Right => Some(Action::Right),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Home | KeyCode::Char('g') => Some(Action::Top),
        KeyCode::End | KeyCode::Char('G') => Some(Action::Bottom),
        _ => None,
    }
}

fn map_text_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') => Some(Action::Quit),
        KeyCode::Esc => Some(Action::ToSelector),
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::PageDown => Some(Action::PageDown),
        KeyCode::PageUp => Some(Action::PageUp),
        KeyCode::Home | KeyCode::Char('g') => Some(Action::Top),
        KeyCode::End | KeyCode::Char('G') => Some(Action::Bottom),
        _ => None,
    }
}
